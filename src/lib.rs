//! Multi-pass validator for MPL, a declarative policy language governing LLM
//! request/response traffic.
//!
//! A policy is a named, versioned set of rules. Each rule pairs a condition
//! tree over `request.*`, `response.*`, `processing.*`, and `context.*` fields
//! with actions such as `deny`, `redact`, or `rate_limit`. This crate proves
//! a policy well-formed; it does not enforce it.
//!
//! ```text
//! parse(yaml) → Policy → structural ─┬─ semantic ─┬→ ErrorList
//!                                    └─ actions  ─┘
//! ```
//!
//! Structural errors gate out the later passes, so a malformed tree does not
//! cascade into spurious field errors. Within a pass every problem is
//! reported, not just the first.
//!
//! # Quick Start
//!
//! ```rust
//! let yaml = r#"
//! mpl_version: "1.0"
//! name: block-gpt4
//! version: "1.0.0"
//! rules:
//!   - name: r1
//!     conditions:
//!       field: request.model
//!       operator: "=="
//!       value: "gpt-4"
//!     actions:
//!       - type: deny
//!         message: blocked
//! "#;
//!
//! let policy = mpl::load(yaml, "policy.yaml").expect("valid policy");
//! assert_eq!(policy.rules.len(), 1);
//! ```

pub mod actions;
pub mod builtins;
pub mod config;
pub mod diagnostic;
pub mod enums;
pub mod error;
pub mod parse;
pub mod schema;
pub mod semantic;
pub mod structural;
pub mod types;
pub mod validate;

pub use config::ValidatorConfig;
pub use diagnostic::{SourceMap, SourceProvider};
pub use error::*;
pub use types::*;

// Re-export entry-point functions at the crate root for convenience.
pub use parse::parse;
pub use validate::{Validator, validate};

/// Convenience entry point composing parse → validate with default settings.
///
/// Every returned diagnostic carries source context from `input`.
///
/// # Errors
///
/// Returns the syntax error if parsing fails, or every diagnostic the
/// validator found.
///
/// # Example
///
/// ```rust
/// let yaml = r#"
/// mpl_version: "1.0"
/// name: limits
/// version: "1.0.0"
/// rules:
///   - name: per-user
///     conditions:
///       field: context.user.id
///       operator: "!="
///       value: ""
///     actions:
///       - type: rate_limit
///         key: user
///         limit: 100
///         window: 60
/// "#;
///
/// match mpl::load(yaml, "limits.yaml") {
///     Ok(policy) => println!("{} is valid", policy.name),
///     Err(errors) => eprintln!("{}", errors),
/// }
/// ```
pub fn load(input: &str, file: &str) -> Result<Policy, ErrorList> {
    load_with(&Validator::default(), input, file)
}

/// [`load`] with an explicit validator.
pub fn load_with(validator: &Validator, input: &str, file: &str) -> Result<Policy, ErrorList> {
    let source = SourceMap::single(file, input);
    let policy = parse::parse(input, file).map_err(|e| ErrorList::from(e.with_context(&source)))?;

    validator
        .validate(&policy)
        .with_context(&source)
        .into_result()?;
    Ok(policy)
}
