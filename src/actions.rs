//! Action pass: per-type parameter contracts and cross-action conflicts.
//!
//! Every check here emits [`ErrorKind::Validation`]. Actions whose type is
//! not recognized were already reported by the structural pass and are
//! skipped.
//!
//! [`ErrorKind::Validation`]: crate::enums::ErrorKind::Validation

use tracing::{debug, trace};

use crate::diagnostic::suggest;
use crate::enums::{ActionType, ValueType};
use crate::error::{Error, ErrorList};
use crate::types::*;

pub const LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error"];
pub const REDACT_STRATEGIES: &[&str] = &["mask", "remove", "replace"];
pub const ALERT_SEVERITIES: &[&str] = &["low", "medium", "high", "critical"];
pub const BUDGET_TYPES: &[&str] = &["tokens", "cost"];
pub const BUDGET_WINDOWS: &[&str] = &["hourly", "daily", "weekly", "monthly"];

/// Accepted shape of a parameter value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Expect {
    String,
    StringOrVariable,
    NumberOrVariable,
    ArrayOrVariable,
    Any,
}

impl Expect {
    fn accepts(&self, value: &Value) -> bool {
        let is_var = value.as_variable_ref().is_some();
        match self {
            Expect::String => value.value_type() == Some(ValueType::String),
            Expect::StringOrVariable => is_var || value.value_type() == Some(ValueType::String),
            Expect::NumberOrVariable => is_var || value.value_type() == Some(ValueType::Number),
            Expect::ArrayOrVariable => is_var || value.value_type() == Some(ValueType::Array),
            Expect::Any => !value.is_null(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Expect::String => "a string",
            Expect::StringOrVariable => "a string or variable",
            Expect::NumberOrVariable => "a number or variable",
            Expect::ArrayOrVariable => "an array or variable",
            Expect::Any => "a value",
        }
    }
}

/// Shared context for the checks on one action.
struct ActionCheck<'a> {
    rule: &'a Rule,
    action: &'a Action,
    kind: ActionType,
}

impl ActionCheck<'_> {
    fn error(&self, message: String) -> Error {
        Error::validation(message, &self.action.location)
    }

    fn missing(&self, name: &str, expect: Expect) -> Error {
        self.error(format!(
            "Missing required parameter '{}' for {} action in rule '{}'",
            name, self.kind, self.rule.name
        ))
        .with_suggestion(format!("Add '{}' ({})", name, expect.describe()))
    }

    fn check_type(&self, name: &str, value: &Value, expect: Expect, errors: &mut ErrorList) {
        if expect.accepts(value) {
            return;
        }
        errors.push(self.error(format!(
            "Parameter '{}' of {} action in rule '{}' must be {}, got {}",
            name,
            self.kind,
            self.rule.name,
            expect.describe(),
            value.type_name()
        )));
    }

    fn require(&self, name: &str, expect: Expect, errors: &mut ErrorList) {
        match self.action.param(name) {
            None => errors.push(self.missing(name, expect)),
            Some(value) => self.check_type(name, value, expect, errors),
        }
    }

    fn optional(&self, name: &str, expect: Expect, errors: &mut ErrorList) {
        if let Some(value) = self.action.param(name) {
            self.check_type(name, value, expect, errors);
        }
    }

    /// A string drawn from a fixed set. Returns the value when it is valid.
    fn choice(&self, name: &str, allowed: &[&str], required: bool, errors: &mut ErrorList) -> Option<&str> {
        let Some(value) = self.action.param(name) else {
            if required {
                errors.push(
                    self.missing(name, Expect::String)
                        .with_suggestion(format!("Use one of: {}", allowed.join(", "))),
                );
            }
            return None;
        };
        let s = value.as_str();
        match s {
            Some(s) if allowed.contains(&s) => Some(s),
            _ => {
                let shown = s.map(str::to_string).unwrap_or_else(|| value.type_name().to_string());
                errors.push(
                    self.error(format!(
                        "Invalid value '{}' for parameter '{}' of {} action in rule '{}'; expected one of: {}",
                        shown,
                        name,
                        self.kind,
                        self.rule.name,
                        allowed.join(", ")
                    ))
                    .with_optional_suggestion(s.and_then(|s| suggest(s, allowed, "values"))),
                );
                None
            }
        }
    }

    /// Literal numbers must be positive; variables are not resolved here.
    fn positive(&self, name: &str, errors: &mut ErrorList) {
        if let Some(Value::Number(n)) = self.action.param(name)
            && *n <= 0.0
        {
            errors.push(self.error(format!(
                "Parameter '{}' of {} action in rule '{}' must be positive, got {}",
                name, self.kind, self.rule.name, n
            )));
        }
    }
}

/// Run the action pass. Returns a fresh list on every call.
pub fn check_actions(policy: &Policy) -> ErrorList {
    let mut errors = ErrorList::new();

    for rule in &policy.rules {
        for action in &rule.actions {
            let Some(kind) = ActionType::from_name(&action.action_type) else {
                continue;
            };
            trace!(rule = %rule.name, action = %kind, "checking action parameters");
            check_action(&ActionCheck { rule, action, kind }, &mut errors);
        }
        check_allow_deny_conflict(rule, &mut errors);
    }

    debug!(
        policy = %policy.name,
        errors = errors.count(),
        "action pass complete"
    );
    errors
}

fn check_action(check: &ActionCheck<'_>, errors: &mut ErrorList) {
    match check.kind {
        ActionType::Allow => {
            for name in check.action.params.keys() {
                errors.push(
                    check
                        .error(format!(
                            "Unexpected parameter '{}' for allow action in rule '{}'",
                            name, check.rule.name
                        ))
                        .with_suggestion("The allow action takes no parameters"),
                );
            }
        }
        ActionType::Deny => {
            check.require("message", Expect::StringOrVariable, errors);
            check.optional("code", Expect::StringOrVariable, errors);
        }
        ActionType::Log => {
            check.require("message", Expect::String, errors);
            check.choice("level", LOG_LEVELS, false, errors);
        }
        ActionType::Redact => {
            check.require("fields", Expect::ArrayOrVariable, errors);
            if check.choice("strategy", REDACT_STRATEGIES, false, errors) == Some("replace") {
                check.require("replacement", Expect::String, errors);
            }
        }
        ActionType::Modify => {
            check.require("field", Expect::String, errors);
            check.require("value", Expect::Any, errors);
        }
        ActionType::Route => {
            let provider = check.action.param("provider");
            let model = check.action.param("model");
            if provider.is_none() && model.is_none() {
                errors.push(
                    check
                        .error(format!(
                            "route action in rule '{}' requires at least one of 'provider' or 'model'",
                            check.rule.name
                        ))
                        .with_suggestion("Add 'provider' or 'model'"),
                );
            }
            check.optional("provider", Expect::StringOrVariable, errors);
            check.optional("model", Expect::StringOrVariable, errors);
        }
        ActionType::Alert => {
            check.require("webhook", Expect::String, errors);
            check.choice("severity", ALERT_SEVERITIES, false, errors);
        }
        ActionType::RateLimit => {
            check.require("key", Expect::StringOrVariable, errors);
            check.require("limit", Expect::NumberOrVariable, errors);
            check.require("window", Expect::NumberOrVariable, errors);
            check.positive("limit", errors);
            check.positive("window", errors);
        }
        ActionType::Budget => {
            check.choice("type", BUDGET_TYPES, true, errors);
            check.require("limit", Expect::NumberOrVariable, errors);
            check.positive("limit", errors);
            check.choice("window", BUDGET_WINDOWS, false, errors);
        }
    }
}

fn check_allow_deny_conflict(rule: &Rule, errors: &mut ErrorList) {
    let has = |kind: ActionType| {
        rule.actions
            .iter()
            .any(|a| ActionType::from_name(&a.action_type) == Some(kind))
    };
    if has(ActionType::Allow) && has(ActionType::Deny) {
        errors.push(
            Error::validation(
                format!("Rule '{}' contains both allow and deny actions", rule.name),
                &rule.location,
            )
            .with_suggestion("Keep either the allow or the deny action, or split them into separate rules"),
        );
    }
}
