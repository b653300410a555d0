//! Pass orchestration: structural, then semantic and action.
//!
//! Returns **all** diagnostics, not just the first. Validation never
//! modifies the policy.

use tracing::{debug, debug_span};

use crate::actions::check_actions;
use crate::config::ValidatorConfig;
use crate::error::{ErrorKind, ErrorList};
use crate::schema::{self, SchemaRegistry};
use crate::semantic::check_semantics;
use crate::structural::check_structure;
use crate::types::Policy;

/// Runs the three passes over a policy.
///
/// Holds no per-call state: every [`Validator::validate`] call builds and
/// returns its own [`ErrorList`], so one instance may be shared across
/// threads.
#[derive(Clone, Debug)]
pub struct Validator {
    config: ValidatorConfig,
    registry: &'static SchemaRegistry,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Validator {
            config,
            registry: schema::registry(),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &'static SchemaRegistry {
        self.registry
    }

    /// Validate a policy.
    ///
    /// Any structural error suppresses the semantic and action passes, since
    /// their checks assume a well-formed tree.
    pub fn validate(&self, policy: &Policy) -> ErrorList {
        let span = debug_span!("validate", policy = %policy.name, strict = self.config.strict);
        let _guard = span.enter();

        let mut errors = check_structure(policy, &self.config);
        if errors.has_kind(ErrorKind::Structural) {
            debug!(
                errors = errors.count(),
                "structural errors found; skipping semantic and action passes"
            );
            return errors;
        }

        errors.extend(check_semantics(policy, self.registry));
        errors.extend(check_actions(policy));

        debug!(errors = errors.count(), "validation complete");
        errors
    }
}

/// Validate with the default configuration.
pub fn validate(policy: &Policy) -> ErrorList {
    Validator::default().validate(policy)
}
