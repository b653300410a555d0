//! Closed enumerations used throughout the MPL type system.
//!
//! The AST keeps action types and operators as raw strings so that a policy
//! with an unknown action or operator can still be represented and reported
//! on. These enums are the recognized sets those strings are checked against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a schema field, variable, or literal value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl ValueType {
    /// Type names accepted in a variable's `type` declaration.
    pub const DECLARABLE: &'static [&'static str] = &["string", "number", "boolean", "array", "object"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::Null => "null",
        }
    }

    /// Parse a declared type name. `null` is not declarable.
    pub fn from_declared(name: &str) -> Option<ValueType> {
        match name {
            "string" => Some(ValueType::String),
            "number" => Some(ValueType::Number),
            "boolean" => Some(ValueType::Boolean),
            "array" => Some(ValueType::Array),
            "object" => Some(ValueType::Object),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The nine action types a rule may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionType {
    Allow,
    Deny,
    Log,
    Redact,
    Modify,
    Route,
    Alert,
    RateLimit,
    Budget,
}

impl ActionType {
    pub const ALL: [ActionType; 9] = [
        ActionType::Allow,
        ActionType::Deny,
        ActionType::Log,
        ActionType::Redact,
        ActionType::Modify,
        ActionType::Route,
        ActionType::Alert,
        ActionType::RateLimit,
        ActionType::Budget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Allow => "allow",
            ActionType::Deny => "deny",
            ActionType::Log => "log",
            ActionType::Redact => "redact",
            ActionType::Modify => "modify",
            ActionType::Route => "route",
            ActionType::Alert => "alert",
            ActionType::RateLimit => "rate_limit",
            ActionType::Budget => "budget",
        }
    }

    pub fn from_name(name: &str) -> Option<ActionType> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Names of every action type, in declaration order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(ActionType::as_str).collect()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operators usable in a simple condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
    NotContains,
    Matches,
    StartsWith,
    EndsWith,
    In,
    NotIn,
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
        Operator::Contains,
        Operator::NotContains,
        Operator::Matches,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::In,
        Operator::NotIn,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::Matches => "matches",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::In => "in",
            Operator::NotIn => "not_in",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Membership operators take an array literal regardless of field type.
    pub fn is_membership(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    pub fn is_containment(&self) -> bool {
        matches!(self, Operator::Contains | Operator::NotContains)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed source; produced only by the ingestion layer.
    Syntax,
    /// The policy's own shape is wrong.
    Structural,
    /// Undefined or incompatible reference.
    Semantic,
    /// Action parameter contract violation.
    Validation,
    /// File access; reported by callers that read policies from disk.
    #[serde(rename = "IO")]
    Io,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "Syntax",
            ErrorKind::Structural => "Structural",
            ErrorKind::Semantic => "Semantic",
            ErrorKind::Validation => "Validation",
            ErrorKind::Io => "IO",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
