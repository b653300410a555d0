//! Semantic pass: cross-reference checking against the schema registry and
//! the policy's own variable and function namespaces.
//!
//! Assumes the structural pass succeeded; condition depth and node shape are
//! not re-checked here.

use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

use crate::builtins::{allowed_operators, function_names, lookup_function, operator_symbols};
use crate::diagnostic::{SUGGESTION_THRESHOLD, closest_match, suggest};
use crate::enums::{Operator, ValueType};
use crate::error::{Error, ErrorList};
use crate::schema::SchemaRegistry;
use crate::types::*;

/// Run the semantic pass. Returns a fresh list on every call.
pub fn check_semantics(policy: &Policy, registry: &SchemaRegistry) -> ErrorList {
    let mut errors = ErrorList::new();

    check_variable_references(policy, &mut errors);
    check_variable_cycles(policy, &mut errors);
    for rule in &policy.rules {
        if let Some(condition) = &rule.conditions {
            check_condition(condition, rule, policy, registry, &mut errors);
        }
        check_action_variables(rule, policy, &mut errors);
    }

    debug!(
        policy = %policy.name,
        errors = errors.count(),
        "semantic pass complete"
    );
    errors
}

// ─── Variables ──────────────────────────────────────────────────────────────

/// Variable names referenced directly by `value`.
///
/// Only a top-level reference counts; references nested inside array or
/// object literals are not extracted.
fn direct_references(value: &Value) -> Vec<&str> {
    value.as_variable_ref().into_iter().collect()
}

fn undefined_variable(name: &str, policy: &Policy, location: &Location, message: String) -> Error {
    let suggestion = match closest_match(name, policy.variables.keys().map(String::as_str)) {
        Some((candidate, distance)) if distance < SUGGESTION_THRESHOLD => {
            format!("Did you mean '{}'?", candidate)
        }
        _ => format!("Define '{}' in the policy's variables section", name),
    };
    Error::semantic(message, location).with_suggestion(suggestion)
}

fn check_variable_references(policy: &Policy, errors: &mut ErrorList) {
    for (name, variable) in &policy.variables {
        for target in direct_references(&variable.value) {
            if !policy.variables.contains_key(target) {
                errors.push(undefined_variable(
                    target,
                    policy,
                    &variable.location,
                    format!(
                        "Variable '{}' references undefined variable '{}'",
                        name, target
                    ),
                ));
            }
        }
    }
}

/// Report every directed cycle in the variable reference graph once.
///
/// Iterative DFS from each unvisited node in name order, tracking the nodes
/// currently on the stack. Reaching an on-stack node closes a cycle; the
/// rest of that node's edges are not examined.
fn check_variable_cycles(policy: &Policy, errors: &mut ErrorList) {
    let graph: BTreeMap<&str, Vec<&str>> = policy
        .variables
        .iter()
        .map(|(name, var)| {
            let edges = direct_references(&var.value)
                .into_iter()
                .filter(|target| policy.variables.contains_key(*target))
                .collect();
            (name.as_str(), edges)
        })
        .collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();

    for &start in graph.keys() {
        if visited.contains(start) {
            continue;
        }

        // (node, index of the next edge to follow)
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        on_stack.insert(start);

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let edges = graph.get(node).map(Vec::as_slice).unwrap_or(&[]);
            if frame.1 >= edges.len() {
                stack.pop();
                on_stack.remove(node);
                visited.insert(node);
                continue;
            }
            let target = edges[frame.1];
            frame.1 += 1;

            if on_stack.contains(target) {
                let entry = stack.iter().position(|(n, _)| *n == target).unwrap_or(0);
                let mut cycle: Vec<&str> = stack[entry..].iter().map(|(n, _)| *n).collect();
                cycle.push(target);
                trace!(cycle = ?cycle, "variable cycle detected");

                let location = policy
                    .variables
                    .get(target)
                    .map(|v| v.location.clone())
                    .unwrap_or_default();
                errors.push(
                    Error::semantic(
                        format!("Circular variable reference: {}", cycle.join(" -> ")),
                        &location,
                    )
                    .with_suggestion("Break the cycle by giving one of these variables a literal value"),
                );
                if let Some(top) = stack.last_mut() {
                    top.1 = usize::MAX;
                }
            } else if !visited.contains(target) {
                stack.push((target, 0));
                on_stack.insert(target);
            }
        }
    }
}

fn check_action_variables(rule: &Rule, policy: &Policy, errors: &mut ErrorList) {
    for action in &rule.actions {
        for (param, value) in &action.params {
            for target in direct_references(value) {
                if !policy.variables.contains_key(target) {
                    errors.push(undefined_variable(
                        target,
                        policy,
                        &action.location,
                        format!(
                            "Undefined variable '{}' in parameter '{}' of {} action in rule '{}'",
                            target, param, action.action_type, rule.name
                        ),
                    ));
                }
            }
        }
    }
}

// ─── Conditions ─────────────────────────────────────────────────────────────

fn check_condition(
    condition: &Condition,
    rule: &Rule,
    policy: &Policy,
    registry: &SchemaRegistry,
    errors: &mut ErrorList,
) {
    match condition {
        Condition::Simple {
            field,
            operator,
            value,
        } => check_simple(field, operator, value, rule, policy, registry, errors),
        Condition::All(children) | Condition::Any(children) | Condition::Not(children) => {
            for child in children {
                check_condition(child, rule, policy, registry, errors);
            }
        }
        Condition::Function { name, args } => check_function(name, args, rule, policy, errors),
    }
}

fn check_simple(
    field: &str,
    operator: &str,
    value: &Value,
    rule: &Rule,
    policy: &Policy,
    registry: &SchemaRegistry,
    errors: &mut ErrorList,
) {
    trace!(rule = %rule.name, field, operator, "checking simple condition");

    if let Some(name) = value.as_variable_ref()
        && !policy.variables.contains_key(name)
    {
        errors.push(undefined_variable(
            name,
            policy,
            &rule.location,
            format!("Undefined variable '{}' in rule '{}'", name, rule.name),
        ));
    }

    let Some(info) = registry.lookup(field) else {
        errors.push(
            Error::semantic(
                format!("Unknown field '{}' in rule '{}'", field, rule.name),
                &rule.location,
            )
            .with_optional_suggestion(suggest(field, registry.all_paths(), "fields")),
        );
        return;
    };

    let Some(op) = Operator::from_symbol(operator) else {
        errors.push(
            Error::semantic(
                format!("Unknown operator '{}' in rule '{}'", operator, rule.name),
                &rule.location,
            )
            .with_optional_suggestion(suggest(operator, operator_symbols().as_slice(), "operators")),
        );
        return;
    };

    let allowed = allowed_operators(info.field_type);
    if !allowed.contains(&op) {
        let symbols: Vec<&str> = allowed.iter().map(Operator::symbol).collect();
        errors.push(
            Error::semantic(
                format!(
                    "Operator '{}' is not valid for {} field '{}'",
                    op, info.field_type, field
                ),
                &rule.location,
            )
            .with_suggestion(format!(
                "Valid operators for {} fields: {}",
                info.field_type,
                symbols.join(", ")
            )),
        );
        return;
    }

    // Resolved variable values are not type-checked.
    let Some(literal_type) = value.value_type() else {
        return;
    };

    if op.is_membership() {
        if literal_type != ValueType::Array {
            errors.push(
                Error::semantic(
                    format!(
                        "Operator '{}' on field '{}' requires an array value, got {}",
                        op, field, literal_type
                    ),
                    &rule.location,
                )
                .with_suggestion(format!("Use a list, e.g. {} [\"a\", \"b\"]", op)),
            );
        }
    } else if op.is_containment() && info.field_type == ValueType::Array {
        // Any element type may be searched for.
    } else if literal_type != info.field_type {
        errors.push(
            Error::semantic(
                format!(
                    "Type mismatch for field '{}': expected {}, got {}",
                    field, info.field_type, literal_type
                ),
                &rule.location,
            )
            .with_suggestion(format!("Compare '{}' against a {} value", field, info.field_type)),
        );
    }
}

fn check_function(name: &str, args: &[Value], rule: &Rule, policy: &Policy, errors: &mut ErrorList) {
    match lookup_function(name) {
        None => errors.push(
            Error::semantic(
                format!("Unknown function '{}' in rule '{}'", name, rule.name),
                &rule.location,
            )
            .with_optional_suggestion(suggest(name, function_names().as_slice(), "functions")),
        ),
        Some(signature) if !signature.accepts(args.len()) => errors.push(
            Error::semantic(
                format!(
                    "Function '{}' expects {} argument(s), got {}",
                    name,
                    signature.arity(),
                    args.len()
                ),
                &rule.location,
            )
            .with_suggestion(format!("{}: {}", signature.name, signature.description)),
        ),
        Some(_) => {}
    }

    for arg in args {
        if let Some(var) = arg.as_variable_ref()
            && !policy.variables.contains_key(var)
        {
            errors.push(undefined_variable(
                var,
                policy,
                &rule.location,
                format!(
                    "Undefined variable '{}' in arguments of '{}' in rule '{}'",
                    var, name, rule.name
                ),
            ));
        }
    }
}
