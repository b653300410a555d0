//! Policy AST, built by [`crate::parse`] or by hand.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use crate::enums::ValueType;

static VARIABLE_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{([A-Za-z_][A-Za-z0-9_]*)\}$").unwrap());

// ─── Location ───────────────────────────────────────────────────────────────

/// Source position of an AST node. Not part of node identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Location {
            file: file.into(),
            line,
            column,
        }
    }

    /// A zero line means the position is unknown.
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ─── Policy ─────────────────────────────────────────────────────────────────

/// The top-level validated unit.
#[derive(Clone, Debug, Default)]
pub struct Policy {
    pub mpl_version: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub variables: BTreeMap<String, Variable>,
    pub rules: Vec<Rule>,
    pub location: Location,
}

// ─── Rule ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct Rule {
    pub name: String,
    pub conditions: Option<Condition>,
    pub actions: Vec<Action>,
    pub location: Location,
}

// ─── Condition ──────────────────────────────────────────────────────────────

/// A boolean-valued condition tree node.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// `field operator value`.
    Simple {
        field: String,
        operator: String,
        value: Value,
    },
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Vec<Condition>),
    /// Built-in function call.
    Function { name: String, args: Vec<Value> },
}

impl Condition {
    pub fn simple(field: impl Into<String>, operator: impl Into<String>, value: Value) -> Self {
        Condition::Simple {
            field: field.into(),
            operator: operator.into(),
            value,
        }
    }

    pub fn function(name: impl Into<String>, args: Vec<Value>) -> Self {
        Condition::Function {
            name: name.into(),
            args,
        }
    }

    /// `Not` carries its child in a vector so that an ill-formed arity can
    /// still be represented and reported on.
    pub fn not(child: Condition) -> Self {
        Condition::Not(vec![child])
    }
}

// ─── Action ─────────────────────────────────────────────────────────────────

/// An effect applied when a rule's condition holds.
///
/// `action_type` is kept as written so unknown types survive ingestion.
#[derive(Clone, Debug, Default)]
pub struct Action {
    pub action_type: String,
    pub params: BTreeMap<String, Value>,
    pub location: Location,
}

impl Action {
    pub fn new(action_type: impl Into<String>) -> Self {
        Action {
            action_type: action_type.into(),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}

// ─── Variable ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct Variable {
    pub name: String,
    pub value: Value,
    /// Declared type name as written; may be empty.
    pub var_type: String,
    pub location: Location,
}

// ─── Value ──────────────────────────────────────────────────────────────────

/// A literal or a reference to a policy variable.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    #[default]
    Null,
    /// Resolved by name against the policy's variables at validation time.
    VariableRef(String),
}

impl Value {
    /// Type of a literal. `None` for variable references, whose type is only
    /// known after resolution.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::String(_) => Some(ValueType::String),
            Value::Number(_) => Some(ValueType::Number),
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::Array(_) => Some(ValueType::Array),
            Value::Object(_) => Some(ValueType::Object),
            Value::Null => Some(ValueType::Null),
            Value::VariableRef(_) => None,
        }
    }

    /// Human-readable type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self.value_type() {
            Some(t) => t.as_str(),
            None => "variable",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_variable_ref(&self) -> Option<&str> {
        match self {
            Value::VariableRef(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Value::VariableRef(name.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Convert a JSON value. Strings of the exact form `${name}` become
    /// variable references.
    pub fn from_json(value: serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => match VARIABLE_REF_RE.captures(&s) {
                Some(caps) => Value::VariableRef(caps[1].to_string()),
                None => Value::String(s),
            },
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
