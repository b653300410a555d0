use mpl::types::*;
use mpl::{Validator, validate};
use proptest::prelude::*;

fn arb_field() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("request.model".to_string()),
        Just("request.max_tokens".to_string()),
        Just("request.modle".to_string()),
        Just("processing.pii.detected".to_string()),
        Just("context.user.groups".to_string()),
        "[a-z]{1,8}\\.[a-z]{1,8}",
    ]
}

fn arb_operator() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("==".to_string()),
        Just(">".to_string()),
        Just("in".to_string()),
        Just("contains".to_string()),
        Just("===".to_string()),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z]{0,6}".prop_map(Value::String),
        (-100.0f64..100.0).prop_map(Value::Number),
        any::<bool>().prop_map(Value::Boolean),
        "[a-c]".prop_map(Value::VariableRef),
        Just(Value::Array(vec![Value::string("x")])),
    ]
}

fn arb_condition() -> impl Strategy<Value = Condition> {
    let leaf = prop_oneof![
        (arb_field(), arb_operator(), arb_value())
            .prop_map(|(f, o, v)| Condition::simple(f, o, v)),
        prop_oneof![Just("has_pii"), Just("len"), Just("has_pi")]
            .prop_map(|name| Condition::function(name, vec![])),
    ];
    leaf.prop_recursive(4, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Condition::All),
            prop::collection::vec(inner.clone(), 0..3).prop_map(Condition::Any),
            prop::collection::vec(inner, 0..3).prop_map(Condition::Not),
        ]
    })
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::new("allow")),
        Just(Action::new("deny")),
        Just(Action::new("deny").with_param("message", Value::string("no"))),
        Just(Action::new("rate_limit").with_param("key", Value::string("k"))),
        Just(Action::new("route")),
        Just(Action::new("dny")),
    ]
}

fn arb_policy() -> impl Strategy<Value = Policy> {
    let variables = prop::collection::btree_map("[a-c]", arb_value(), 0..3);
    let rules = prop::collection::vec(
        (
            "[a-z]{0,4}",
            prop::option::of(arb_condition()),
            prop::collection::vec(arb_action(), 0..3),
        ),
        0..3,
    );
    (prop_oneof![Just("1.0"), Just("2.0")], variables, rules).prop_map(|(mpl_version, variables, rules)| {
        Policy {
            mpl_version: mpl_version.to_string(),
            name: "generated".to_string(),
            version: "1.0.0".to_string(),
            variables: variables
                .into_iter()
                .map(|(name, value)| {
                    let variable = Variable {
                        name: name.clone(),
                        value,
                        var_type: String::new(),
                        location: Location::default(),
                    };
                    (name, variable)
                })
                .collect(),
            rules: rules
                .into_iter()
                .map(|(name, conditions, actions)| Rule {
                    name,
                    conditions,
                    actions,
                    location: Location::default(),
                })
                .collect(),
            ..Default::default()
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // Fresh validators agree on kinds, messages, and order.
    #[test]
    fn validation_is_idempotent(policy in arb_policy()) {
        let first = Validator::default().validate(&policy);
        let second = Validator::default().validate(&policy);
        prop_assert_eq!(first.as_slice(), second.as_slice());
        let third = validate(&policy);
        prop_assert_eq!(third.as_slice(), first.as_slice());
    }

    // Any structural error means no other kind is reported.
    #[test]
    fn structural_errors_are_exclusive(policy in arb_policy()) {
        let errors = validate(&policy);
        if errors.has_kind(mpl::ErrorKind::Structural) {
            prop_assert!(errors.iter().all(|e| e.kind == mpl::ErrorKind::Structural));
        }
    }
}
