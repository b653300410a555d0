use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::Location;

pub const DEFAULT_MAX_DEPTH: usize = 10;

pub const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Knobs that shape validator behavior.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Maximum condition nesting depth; the root condition is depth 1.
    pub max_depth: usize,
    /// Promote warnings to errors. No check emits warnings yet, so this has
    /// no effect today.
    pub strict: bool,
    /// Accepted `mpl_version` values.
    pub supported_versions: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
            supported_versions: SUPPORTED_VERSIONS.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl ValidatorConfig {
    /// Load from YAML. Absent keys take their defaults.
    pub fn from_yaml(input: &str) -> Result<Self, Error> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(input).map_err(|e| {
            Error::syntax(
                format!("invalid validator configuration: {}", e),
                Location::default(),
            )
        })
    }

    pub fn is_supported_version(&self, version: &str) -> bool {
        self.supported_versions.iter().any(|v| v == version)
    }
}
