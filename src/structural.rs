//! Structural pass: the policy's own shape, independent of field semantics.
//!
//! Every check here emits [`ErrorKind::Structural`]. A structural failure
//! gates out the semantic and action passes.
//!
//! [`ErrorKind::Structural`]: crate::enums::ErrorKind::Structural

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, trace};

use crate::config::ValidatorConfig;
use crate::diagnostic::suggest;
use crate::enums::{ActionType, ValueType};
use crate::error::{Error, ErrorList};
use crate::types::*;

// ─── Cached regexes ─────────────────────────────────────────────────────────

static POLICY_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").unwrap());

static SEMVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\d+\.\d+\.\d+(-[0-9A-Za-z-]+(\.[0-9A-Za-z-]+)*)?(\+[0-9A-Za-z-]+(\.[0-9A-Za-z-]+)*)?$",
    )
    .unwrap()
});

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

pub fn is_valid_policy_name(name: &str) -> bool {
    POLICY_NAME_RE.is_match(name)
}

pub fn is_valid_semver(version: &str) -> bool {
    SEMVER_RE.is_match(version)
}

pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// Run the structural pass. Returns a fresh list on every call.
pub fn check_structure(policy: &Policy, config: &ValidatorConfig) -> ErrorList {
    let mut errors = ErrorList::new();

    check_mpl_version(policy, config, &mut errors);
    check_policy_name(policy, &mut errors);
    check_policy_version(policy, &mut errors);
    check_variables(policy, &mut errors);
    check_rules(policy, config, &mut errors);

    debug!(
        policy = %policy.name,
        errors = errors.count(),
        "structural pass complete"
    );
    errors
}

// ─── Header ─────────────────────────────────────────────────────────────────

fn check_mpl_version(policy: &Policy, config: &ValidatorConfig, errors: &mut ErrorList) {
    if policy.mpl_version.is_empty() {
        errors.push(
            Error::structural(
                "Unsupported MPL version '' (MPL version is required)",
                &policy.location,
            )
            .with_suggestion(format!(
                "Add 'mpl_version: \"{}\"' at the top of the policy",
                config.supported_versions.first().map(String::as_str).unwrap_or("1.0")
            )),
        );
    } else if !config.is_supported_version(&policy.mpl_version) {
        errors.push(
            Error::structural(
                format!("Unsupported MPL version '{}'", policy.mpl_version),
                &policy.location,
            )
            .with_suggestion(format!(
                "Supported versions: {}",
                config.supported_versions.join(", ")
            )),
        );
    }
}

fn check_policy_name(policy: &Policy, errors: &mut ErrorList) {
    if policy.name.is_empty() {
        errors.push(
            Error::structural("Policy name is required", &policy.location)
                .with_suggestion("Add a lowercase kebab-case name, e.g. 'block-gpt4'"),
        );
    } else if !is_valid_policy_name(&policy.name) {
        let mut error = Error::structural(
            format!(
                "Invalid policy name '{}': must start with a lowercase letter and contain only lowercase letters, digits, and hyphens",
                policy.name
            ),
            &policy.location,
        );
        let kebab = to_kebab_case(&policy.name);
        if is_valid_policy_name(&kebab) {
            error = error.with_suggestion(format!("Use '{}'", kebab));
        }
        errors.push(error);
    }
}

/// Best-effort kebab-case rendering of an arbitrary name.
fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_start_matches(|c: char| !c.is_ascii_lowercase())
        .trim_end_matches('-')
        .to_string()
}

fn check_policy_version(policy: &Policy, errors: &mut ErrorList) {
    if policy.version.is_empty() {
        errors.push(
            Error::structural("Policy version is required", &policy.location)
                .with_suggestion("Use semantic versioning, e.g. '1.0.0'"),
        );
    } else if !is_valid_semver(&policy.version) {
        errors.push(
            Error::structural(
                format!(
                    "Invalid policy version '{}': must follow semantic versioning",
                    policy.version
                ),
                &policy.location,
            )
            .with_suggestion("Use semantic versioning, e.g. '1.0.0'"),
        );
    }
}

// ─── Variables ──────────────────────────────────────────────────────────────

fn check_variables(policy: &Policy, errors: &mut ErrorList) {
    for (name, variable) in &policy.variables {
        if !is_valid_identifier(name) {
            errors.push(
                Error::structural(
                    format!("Invalid variable name '{}'", name),
                    &variable.location,
                )
                .with_suggestion(
                    "Variable names must start with a letter or underscore and contain only letters, digits, and underscores",
                ),
            );
        }

        if variable.value.is_null() {
            errors.push(Error::structural(
                format!("Variable '{}' has no value", name),
                &variable.location,
            ));
            continue;
        }

        if variable.var_type.is_empty() {
            continue;
        }
        match ValueType::from_declared(&variable.var_type) {
            None => errors.push(
                Error::structural(
                    format!(
                        "Variable '{}' declares unknown type '{}'",
                        name, variable.var_type
                    ),
                    &variable.location,
                )
                .with_optional_suggestion(suggest(
                    &variable.var_type,
                    ValueType::DECLARABLE,
                    "types",
                )),
            ),
            Some(declared) => {
                if let Some(actual) = variable.value.value_type()
                    && actual != declared
                {
                    errors.push(Error::structural(
                        format!(
                            "Variable '{}' is declared as {} but its value is {}",
                            name, declared, actual
                        ),
                        &variable.location,
                    ));
                }
            }
        }
    }
}

// ─── Rules ──────────────────────────────────────────────────────────────────

fn check_rules(policy: &Policy, config: &ValidatorConfig, errors: &mut ErrorList) {
    if policy.rules.is_empty() {
        errors.push(
            Error::structural("Policy must define at least one rule", &policy.location)
                .with_suggestion("Add a 'rules' list with at least one rule"),
        );
        return;
    }

    let mut seen = HashSet::new();
    for (i, rule) in policy.rules.iter().enumerate() {
        let label = if rule.name.is_empty() {
            errors.push(
                Error::structural(format!("Rule #{} has no name", i + 1), &rule.location)
                    .with_suggestion("Give every rule a unique 'name'"),
            );
            format!("#{}", i + 1)
        } else {
            if !seen.insert(rule.name.as_str()) {
                errors.push(
                    Error::structural(
                        format!("Duplicate rule name '{}'", rule.name),
                        &rule.location,
                    )
                    .with_suggestion("Rule names must be unique within a policy"),
                );
            }
            format!("'{}'", rule.name)
        };

        match &rule.conditions {
            None => errors.push(
                Error::structural(format!("Rule {} has no conditions", label), &rule.location)
                    .with_suggestion("Add a 'conditions' block"),
            ),
            Some(condition) => check_condition(condition, 1, &label, rule, config, errors),
        }

        if rule.actions.is_empty() {
            errors.push(
                Error::structural(format!("Rule {} has no actions", label), &rule.location)
                    .with_suggestion("Add at least one action, e.g. '- type: deny'"),
            );
        }
        for (j, action) in rule.actions.iter().enumerate() {
            check_action_type(action, j, &label, errors);
        }
    }
}

fn check_condition(
    condition: &Condition,
    depth: usize,
    label: &str,
    rule: &Rule,
    config: &ValidatorConfig,
    errors: &mut ErrorList,
) {
    if depth > config.max_depth {
        errors.push(
            Error::structural(
                format!(
                    "Condition nesting in rule {} exceeds maximum depth of {}",
                    label, config.max_depth
                ),
                &rule.location,
            )
            .with_suggestion("Flatten the condition or split it across rules"),
        );
        return;
    }
    trace!(rule = label, depth, "checking condition shape");

    match condition {
        Condition::Simple {
            field,
            operator,
            value,
        } => {
            if field.is_empty() {
                errors.push(Error::structural(
                    format!("Condition in rule {} is missing a field", label),
                    &rule.location,
                ));
            }
            if operator.is_empty() {
                errors.push(Error::structural(
                    format!("Condition in rule {} is missing an operator", label),
                    &rule.location,
                ));
            }
            if value.is_null() {
                errors.push(Error::structural(
                    format!("Condition in rule {} is missing a value", label),
                    &rule.location,
                ));
            }
        }
        Condition::All(children) | Condition::Any(children) => {
            if children.is_empty() {
                let keyword = if matches!(condition, Condition::All(_)) {
                    "all"
                } else {
                    "any"
                };
                errors.push(Error::structural(
                    format!(
                        "'{}' condition in rule {} must have at least one child",
                        keyword, label
                    ),
                    &rule.location,
                ));
            }
            for child in children {
                check_condition(child, depth + 1, label, rule, config, errors);
            }
        }
        Condition::Not(children) => {
            if children.len() != 1 {
                errors.push(Error::structural(
                    format!(
                        "'not' condition in rule {} must have exactly one child, found {}",
                        label,
                        children.len()
                    ),
                    &rule.location,
                ));
            }
            for child in children {
                check_condition(child, depth + 1, label, rule, config, errors);
            }
        }
        Condition::Function { name, .. } => {
            if name.is_empty() {
                errors.push(Error::structural(
                    format!("Function condition in rule {} has no function name", label),
                    &rule.location,
                ));
            }
        }
    }
}

fn check_action_type(action: &Action, index: usize, label: &str, errors: &mut ErrorList) {
    if action.action_type.is_empty() {
        errors.push(
            Error::structural(
                format!("Action #{} in rule {} has no type", index + 1, label),
                &action.location,
            )
            .with_suggestion(format!("Valid action types: {}", ActionType::names().join(", "))),
        );
    } else if ActionType::from_name(&action.action_type).is_none() {
        errors.push(
            Error::structural(
                format!(
                    "Unknown action type '{}' in rule {}",
                    action.action_type, label
                ),
                &action.location,
            )
            .with_optional_suggestion(suggest(
                &action.action_type,
                ActionType::names().as_slice(),
                "action types",
            )),
        );
    }
}
