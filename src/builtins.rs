//! Built-in functions and operator/type compatibility, as compile-time tables.

use crate::enums::{Operator, ValueType};

/// Signature of a built-in condition function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: &'static str,
    pub description: &'static str,
    pub min_args: usize,
    pub max_args: usize,
}

impl FunctionSignature {
    pub fn accepts(&self, arg_count: usize) -> bool {
        (self.min_args..=self.max_args).contains(&arg_count)
    }

    /// `1`, or `0-2` for a range.
    pub fn arity(&self) -> String {
        if self.min_args == self.max_args {
            self.min_args.to_string()
        } else {
            format!("{}-{}", self.min_args, self.max_args)
        }
    }
}

pub static FUNCTION_REGISTRY: &[FunctionSignature] = &[
    FunctionSignature {
        name: "has_pii",
        description: "True when PII was detected, optionally of a given type",
        min_args: 0,
        max_args: 1,
    },
    FunctionSignature {
        name: "has_injection",
        description: "True when a prompt injection was detected, optionally above a threshold",
        min_args: 0,
        max_args: 1,
    },
    FunctionSignature {
        name: "has_sensitive",
        description: "True when sensitive data was detected, optionally of a category and threshold",
        min_args: 0,
        max_args: 2,
    },
    FunctionSignature {
        name: "len",
        description: "Length of a string or array",
        min_args: 1,
        max_args: 1,
    },
    FunctionSignature {
        name: "lower",
        description: "Lowercase a string",
        min_args: 1,
        max_args: 1,
    },
    FunctionSignature {
        name: "upper",
        description: "Uppercase a string",
        min_args: 1,
        max_args: 1,
    },
    FunctionSignature {
        name: "contains",
        description: "True when the first argument contains the second",
        min_args: 2,
        max_args: 2,
    },
];

pub fn lookup_function(name: &str) -> Option<&'static FunctionSignature> {
    FUNCTION_REGISTRY.iter().find(|f| f.name == name)
}

pub fn function_names() -> Vec<&'static str> {
    FUNCTION_REGISTRY.iter().map(|f| f.name).collect()
}

// ─── Operator compatibility ─────────────────────────────────────────────────

/// Operators permitted against fields of each declared type.
pub static OPERATOR_TABLE: &[(ValueType, &[Operator])] = &[
    (
        ValueType::String,
        &[
            Operator::Eq,
            Operator::Ne,
            Operator::Contains,
            Operator::NotContains,
            Operator::Matches,
            Operator::StartsWith,
            Operator::EndsWith,
            Operator::In,
            Operator::NotIn,
        ],
    ),
    (
        ValueType::Number,
        &[
            Operator::Eq,
            Operator::Ne,
            Operator::Gt,
            Operator::Lt,
            Operator::Gte,
            Operator::Lte,
            Operator::In,
            Operator::NotIn,
        ],
    ),
    (ValueType::Boolean, &[Operator::Eq, Operator::Ne]),
    (
        ValueType::Array,
        &[
            Operator::Contains,
            Operator::NotContains,
            Operator::In,
            Operator::NotIn,
        ],
    ),
    (ValueType::Object, &[Operator::Eq, Operator::Ne]),
];

pub fn allowed_operators(field_type: ValueType) -> &'static [Operator] {
    OPERATOR_TABLE
        .iter()
        .find(|(t, _)| *t == field_type)
        .map(|(_, ops)| *ops)
        .unwrap_or(&[])
}

pub fn is_operator_allowed(field_type: ValueType, op: Operator) -> bool {
    allowed_operators(field_type).contains(&op)
}

pub fn operator_symbols() -> Vec<&'static str> {
    Operator::ALL.iter().map(Operator::symbol).collect()
}
