//! YAML → [`Policy`] ingestion.
//!
//! Performs deserialization and type mapping only. Missing keys become empty
//! values so that the structural pass, not the parser, reports them. Source
//! locations are recovered on a best-effort basis by scanning the text for
//! the lines that introduce each rule, action, and variable.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

use crate::diagnostic::char_column;
use crate::error::Error;
use crate::types::*;

const TOP_LEVEL_KEYS: &[&str] = &["mpl_version", "name", "version", "description", "variables", "rules"];

#[derive(Deserialize)]
struct RawPolicy {
    #[serde(default, deserialize_with = "scalar_string")]
    mpl_version: String,
    #[serde(default, deserialize_with = "scalar_string")]
    name: String,
    #[serde(default, deserialize_with = "scalar_string")]
    version: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    variables: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Deserialize)]
struct RawRule {
    #[serde(default, deserialize_with = "scalar_string")]
    name: String,
    #[serde(default, alias = "condition")]
    conditions: Option<serde_json::Value>,
    #[serde(default)]
    actions: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Accept any scalar where a string is expected: `version: 1.0` is a float
/// to YAML but a version string to us. Null becomes empty.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar, got {}",
            other
        ))),
    }
}

fn json_scalar_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse MPL source text into an unvalidated [`Policy`].
///
/// `file` is the identifier recorded in every [`Location`].
pub fn parse(input: &str, file: &str) -> Result<Policy, Error> {
    let at_file = || Location::new(file, 0, 0);

    if input.trim().is_empty() {
        return Err(Error::syntax("empty input", at_file()));
    }

    let value: serde_json::Value = serde_saphyr::from_str(input)
        .map_err(|e| Error::syntax(format!("invalid YAML: {}", e), at_file()))?;

    let Some(obj) = value.as_object() else {
        return Err(Error::syntax("policy root must be a YAML mapping", at_file()));
    };
    for key in obj.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            return Err(Error::syntax(format!("unknown top-level field: {}", key), at_file()));
        }
    }

    let raw: RawPolicy = serde_json::from_value(value)
        .map_err(|e| Error::syntax(format!("invalid policy: {}", e), at_file()))?;

    let locator = Locator::new(input, file);
    build_policy(raw, &locator)
}

fn build_policy(raw: RawPolicy, locator: &Locator<'_>) -> Result<Policy, Error> {
    let variables_line = locator.find_from(0, "variables", None).map(|(l, _)| l).unwrap_or(0);
    let variables = raw
        .variables
        .into_iter()
        .map(|(name, value)| {
            let location = locator.location(locator.find_from(variables_line, &name, None));
            let variable = build_variable(&name, value, location);
            (name, variable)
        })
        .collect();

    let mut cursor = locator.find_from(0, "rules", None).map(|(l, _)| l).unwrap_or(0);
    let mut rules = Vec::with_capacity(raw.rules.len());
    for (i, raw_rule) in raw.rules.into_iter().enumerate() {
        let found = if raw_rule.name.is_empty() {
            None
        } else {
            locator.find_from(cursor, "name", Some(&raw_rule.name))
        };
        if let Some((line, _)) = found {
            cursor = line + 1;
        }

        let conditions = match raw_rule.conditions {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(build_condition(&value, &format!("rules[{}].conditions", i), locator)?),
        };

        let mut actions = Vec::with_capacity(raw_rule.actions.len());
        for raw_action in raw_rule.actions {
            let action = build_action(raw_action, &mut cursor, locator);
            actions.push(action);
        }

        rules.push(Rule {
            name: raw_rule.name,
            conditions,
            actions,
            location: locator.location(found),
        });
    }

    Ok(Policy {
        mpl_version: raw.mpl_version,
        name: raw.name,
        version: raw.version,
        description: raw.description,
        variables,
        rules,
        location: Location::new(locator.file, 1, 1),
    })
}

/// A variable is either `{type, value}` or a bare value.
fn build_variable(name: &str, value: serde_json::Value, location: Location) -> Variable {
    let (value, var_type) = match value {
        serde_json::Value::Object(mut map) if map.contains_key("value") => {
            let var_type = map.get("type").map(json_scalar_string).unwrap_or_default();
            let value = map.remove("value").unwrap_or(serde_json::Value::Null);
            (value, var_type)
        }
        other => (other, String::new()),
    };
    Variable {
        name: name.to_string(),
        value: Value::from_json(value),
        var_type,
        location,
    }
}

fn build_condition(value: &serde_json::Value, path: &str, locator: &Locator<'_>) -> Result<Condition, Error> {
    let at_file = || Location::new(locator.file, 0, 0);

    // A bare list is shorthand for `all`.
    if let Some(items) = value.as_array() {
        return Ok(Condition::All(build_children(items, path, locator)?));
    }
    let Some(obj) = value.as_object() else {
        return Err(Error::syntax(
            format!("condition at {} must be a mapping or a list", path),
            at_file(),
        ));
    };

    for keyword in ["all", "any"] {
        if let Some(children) = obj.get(keyword) {
            let items = children.as_array().ok_or_else(|| {
                Error::syntax(format!("'{}' at {} must be a list", keyword, path), at_file())
            })?;
            let children = build_children(items, &format!("{}.{}", path, keyword), locator)?;
            return Ok(if keyword == "all" {
                Condition::All(children)
            } else {
                Condition::Any(children)
            });
        }
    }

    if let Some(inner) = obj.get("not") {
        let inner_path = format!("{}.not", path);
        return Ok(Condition::Not(match inner.as_array() {
            Some(items) => build_children(items, &inner_path, locator)?,
            None => vec![build_condition(inner, &inner_path, locator)?],
        }));
    }

    if let Some(name) = obj.get("function") {
        let args = match obj.get("args") {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(items)) => items.iter().cloned().map(Value::from_json).collect(),
            Some(single) => vec![Value::from_json(single.clone())],
        };
        return Ok(Condition::Function {
            name: json_scalar_string(name),
            args,
        });
    }

    Ok(Condition::Simple {
        field: obj.get("field").map(json_scalar_string).unwrap_or_default(),
        operator: obj.get("operator").map(json_scalar_string).unwrap_or_default(),
        value: obj.get("value").cloned().map(Value::from_json).unwrap_or_default(),
    })
}

fn build_children(items: &[serde_json::Value], path: &str, locator: &Locator<'_>) -> Result<Vec<Condition>, Error> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| build_condition(item, &format!("{}[{}]", path, i), locator))
        .collect()
}

/// Parameters are either the keys beside `type` or a nested `params`
/// mapping; the nested form is needed for budget's own `type` parameter.
fn build_action(
    mut raw: serde_json::Map<String, serde_json::Value>,
    cursor: &mut usize,
    locator: &Locator<'_>,
) -> Action {
    let action_type = raw.remove("type").map(|v| json_scalar_string(&v)).unwrap_or_default();
    let nested = raw.remove("params");

    let mut params: BTreeMap<String, Value> = raw
        .into_iter()
        .map(|(k, v)| (k, Value::from_json(v)))
        .collect();
    if let Some(serde_json::Value::Object(map)) = nested {
        params.extend(map.into_iter().map(|(k, v)| (k, Value::from_json(v))));
    }

    let found = if action_type.is_empty() {
        None
    } else {
        locator.find_from(*cursor, "type", Some(&action_type))
    };
    if let Some((line, _)) = found {
        *cursor = line + 1;
    }

    Action {
        action_type,
        params,
        location: locator.location(found),
    }
}

// ─── Line locator ───────────────────────────────────────────────────────────

struct Locator<'a> {
    file: &'a str,
    lines: Vec<&'a str>,
}

impl<'a> Locator<'a> {
    fn new(input: &'a str, file: &'a str) -> Self {
        Locator {
            file,
            lines: input.lines().collect(),
        }
    }

    /// First line at or after `start` (0-based) introducing `key:`, optionally
    /// with the given scalar value. Returns the line index and 1-based
    /// character column of the key.
    fn find_from(&self, start: usize, key: &str, value: Option<&str>) -> Option<(usize, usize)> {
        self.lines
            .iter()
            .enumerate()
            .skip(start)
            .find_map(|(i, line)| {
                let mut rest = line.trim_start();
                if let Some(stripped) = rest.strip_prefix("- ") {
                    rest = stripped.trim_start();
                }
                let column = char_column(line, line.len() - rest.len());
                let after = rest.strip_prefix(key)?.strip_prefix(':')?;
                match value {
                    None => Some((i, column)),
                    Some(expected) => {
                        let found = after.split(" #").next().unwrap_or("").trim();
                        let found = found.trim_matches(|c: char| c == '"' || c == '\'');
                        (found == expected).then_some((i, column))
                    }
                }
            })
    }

    fn location(&self, found: Option<(usize, usize)>) -> Location {
        match found {
            Some((line, column)) => Location::new(self.file, line + 1, column),
            None => Location::new(self.file, 0, 0),
        }
    }
}
