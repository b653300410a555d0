use mpl::error::ErrorKind;
use mpl::parse;
use mpl::types::*;

fn parse_ok(input: &str) -> Policy {
    parse(input, "p.yaml").unwrap_or_else(|e| panic!("parse failed: {}", e))
}

fn parse_err(input: &str) -> String {
    let err = parse(input, "p.yaml").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.location.file, "p.yaml");
    err.message
}

fn first_condition(policy: &Policy) -> &Condition {
    policy.rules[0].conditions.as_ref().expect("rule has conditions")
}

const HEADER: &str = "mpl_version: \"1.0\"\nname: p\nversion: \"1.0.0\"\n";

fn with_rules(rules: &str) -> String {
    format!("{}rules:\n{}", HEADER, rules)
}

// ─── Rejections ─────────────────────────────────────────────────────────────

#[test]
fn empty_input_is_rejected() {
    assert_eq!(parse_err(""), "empty input");
    assert_eq!(parse_err("   \n\n"), "empty input");
}

#[test]
fn malformed_yaml_is_rejected() {
    assert!(parse_err("name: [unclosed").starts_with("invalid YAML"));
}

#[test]
fn non_mapping_root_is_rejected() {
    assert_eq!(parse_err("- a\n- b\n"), "policy root must be a YAML mapping");
}

#[test]
fn unknown_top_level_field_is_rejected() {
    let input = format!("{}extra: 1\n", HEADER);
    assert_eq!(parse_err(&input), "unknown top-level field: extra");
}

#[test]
fn all_and_any_must_be_lists() {
    let input = with_rules(
        "  - name: r\n    conditions:\n      all:\n        field: request.model\n    actions:\n      - type: allow\n",
    );
    assert_eq!(parse_err(&input), "'all' at rules[0].conditions must be a list");
}

#[test]
fn scalar_condition_is_rejected() {
    let input = with_rules("  - name: r\n    conditions: yes-please\n    actions:\n      - type: allow\n");
    assert!(parse_err(&input).starts_with("condition at rules[0].conditions"));
}

// ─── Header ─────────────────────────────────────────────────────────────────

#[test]
fn header_fields_are_read() {
    let policy = parse_ok(&format!("{}description: guards\nrules: []\n", HEADER));
    assert_eq!(policy.mpl_version, "1.0");
    assert_eq!(policy.name, "p");
    assert_eq!(policy.version, "1.0.0");
    assert_eq!(policy.description.as_deref(), Some("guards"));
    assert!(policy.rules.is_empty());
    assert_eq!(policy.location, Location::new("p.yaml", 1, 1));
}

#[test]
fn unquoted_numeric_scalars_are_stringified() {
    let policy = parse_ok("mpl_version: 1.0\nname: p\nversion: 2\n");
    assert_eq!(policy.mpl_version, "1.0");
    assert_eq!(policy.version, "2");
}

#[test]
fn missing_keys_become_empty() {
    let policy = parse_ok("name: only-a-name\n");
    assert!(policy.mpl_version.is_empty());
    assert!(policy.version.is_empty());
    assert!(policy.rules.is_empty());
    assert!(policy.variables.is_empty());
}

// ─── Variables ──────────────────────────────────────────────────────────────

#[test]
fn variables_in_both_forms() {
    let input = format!(
        "{}variables:\n  models:\n    type: array\n    value: [\"gpt-4\"]\n  greeting: hello\n  next: \"${{greeting}}\"\nrules: []\n",
        HEADER
    );
    let policy = parse_ok(&input);

    let models = &policy.variables["models"];
    assert_eq!(models.var_type, "array");
    assert_eq!(models.value, Value::Array(vec![Value::string("gpt-4")]));
    assert_eq!(models.location, Location::new("p.yaml", 5, 3));

    let greeting = &policy.variables["greeting"];
    assert!(greeting.var_type.is_empty());
    assert_eq!(greeting.value, Value::string("hello"));

    assert_eq!(policy.variables["next"].value, Value::var("greeting"));
}

#[test]
fn only_exact_reference_syntax_is_a_variable() {
    let input = format!(
        "{}variables:\n  a: \"prefix ${{b}}\"\n  b: \"${{not valid}}\"\nrules: []\n",
        HEADER
    );
    let policy = parse_ok(&input);
    assert_eq!(policy.variables["a"].value, Value::string("prefix ${b}"));
    assert_eq!(policy.variables["b"].value, Value::string("${not valid}"));
}

// ─── Conditions ─────────────────────────────────────────────────────────────

#[test]
fn simple_condition() {
    let input = with_rules(
        "  - name: r\n    conditions:\n      field: request.max_tokens\n      operator: \">\"\n      value: 1000\n    actions:\n      - type: allow\n",
    );
    let policy = parse_ok(&input);
    assert_eq!(
        first_condition(&policy),
        &Condition::simple("request.max_tokens", ">", Value::from(1000.0))
    );
}

#[test]
fn singular_condition_key_is_accepted() {
    let input = with_rules(
        "  - name: r\n    condition:\n      field: request.model\n      operator: \"==\"\n      value: x\n    actions:\n      - type: allow\n",
    );
    let policy = parse_ok(&input);
    assert_eq!(
        first_condition(&policy),
        &Condition::simple("request.model", "==", Value::string("x"))
    );
}

#[test]
fn bare_list_is_all() {
    let input = with_rules(
        "  - name: r\n    conditions:\n      - field: request.stream\n        operator: \"==\"\n        value: true\n      - function: has_pii\n    actions:\n      - type: allow\n",
    );
    let policy = parse_ok(&input);
    assert_eq!(
        first_condition(&policy),
        &Condition::All(vec![
            Condition::simple("request.stream", "==", Value::from(true)),
            Condition::function("has_pii", vec![]),
        ])
    );
}

#[test]
fn nested_logical_conditions() {
    let input = with_rules(
        "  - name: r\n    conditions:\n      any:\n        - not:\n            field: request.model\n            operator: \"==\"\n            value: a\n        - all:\n            - function: has_injection\n              args: [0.9]\n            - function: has_pii\n              args: email\n    actions:\n      - type: allow\n",
    );
    let policy = parse_ok(&input);
    assert_eq!(
        first_condition(&policy),
        &Condition::Any(vec![
            Condition::not(Condition::simple("request.model", "==", Value::string("a"))),
            Condition::All(vec![
                Condition::function("has_injection", vec![Value::from(0.9)]),
                Condition::function("has_pii", vec![Value::string("email")]),
            ]),
        ])
    );
}

#[test]
fn not_with_a_list_keeps_every_child() {
    let input = with_rules(
        "  - name: r\n    conditions:\n      not:\n        - function: has_pii\n        - function: has_injection\n    actions:\n      - type: allow\n",
    );
    let policy = parse_ok(&input);
    match first_condition(&policy) {
        Condition::Not(children) => assert_eq!(children.len(), 2),
        other => panic!("expected not, got {:?}", other),
    }
}

#[test]
fn incomplete_simple_condition_keeps_defaults() {
    let input = with_rules("  - name: r\n    conditions:\n      field: request.model\n    actions:\n      - type: allow\n");
    let policy = parse_ok(&input);
    assert_eq!(
        first_condition(&policy),
        &Condition::simple("request.model", "", Value::Null)
    );
}

#[test]
fn missing_conditions_is_none() {
    let policy = parse_ok(&with_rules("  - name: r\n    actions:\n      - type: allow\n"));
    assert!(policy.rules[0].conditions.is_none());
}

// ─── Actions ────────────────────────────────────────────────────────────────

#[test]
fn inline_and_nested_action_params() {
    let input = with_rules(
        "  - name: r\n    conditions:\n      function: has_pii\n    actions:\n      - type: deny\n        message: denied\n      - type: budget\n        params:\n          type: cost\n          limit: 25.5\n",
    );
    let policy = parse_ok(&input);
    let actions = &policy.rules[0].actions;

    assert_eq!(actions[0].action_type, "deny");
    assert_eq!(actions[0].param("message"), Some(&Value::string("denied")));

    assert_eq!(actions[1].action_type, "budget");
    assert_eq!(actions[1].param("type"), Some(&Value::string("cost")));
    assert_eq!(actions[1].param("limit"), Some(&Value::from(25.5)));
    assert!(actions[1].param("params").is_none());
}

// ─── Locations ──────────────────────────────────────────────────────────────

#[test]
fn rules_and_actions_are_located_at_their_lines() {
    let input = with_rules(
        "  - name: first\n    conditions:\n      function: has_pii\n    actions:\n      - type: log\n        message: a\n      - type: deny\n        message: b\n  - name: second\n    conditions:\n      function: has_pii\n    actions:\n      - type: deny\n        message: c\n",
    );
    let policy = parse_ok(&input);

    assert_eq!(policy.rules[0].location, Location::new("p.yaml", 5, 5));
    assert_eq!(policy.rules[0].actions[0].location, Location::new("p.yaml", 9, 9));
    assert_eq!(policy.rules[0].actions[1].location, Location::new("p.yaml", 11, 9));
    assert_eq!(policy.rules[1].location, Location::new("p.yaml", 13, 5));
    assert_eq!(policy.rules[1].actions[0].location, Location::new("p.yaml", 17, 9));
}

#[test]
fn unlocatable_items_get_an_invalid_location() {
    let input = with_rules("  - conditions:\n      function: has_pii\n    actions:\n      - message: hi\n");
    let policy = parse_ok(&input);
    assert!(!policy.rules[0].location.is_valid());
    assert!(!policy.rules[0].actions[0].location.is_valid());
    assert_eq!(policy.rules[0].location.file, "p.yaml");
}

#[test]
fn documented_surface_format_keeps_inline_params() {
    let input = with_rules(
        "  - name: r1\n    conditions:\n      field: request.model\n      operator: \"==\"\n      value: \"gpt-4\"\n    actions:\n      - type: deny\n        message: blocked\n",
    );
    let policy = parse_ok(&input);
    assert_eq!(
        first_condition(&policy),
        &Condition::simple("request.model", "==", Value::string("gpt-4"))
    );
    let deny = &policy.rules[0].actions[0];
    assert_eq!(deny.param("message"), Some(&Value::string("blocked")));
    assert!(mpl::validate(&policy).is_empty());
}
