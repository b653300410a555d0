use mpl::ValidatorConfig;
use mpl::error::ErrorKind;
use mpl::structural::check_structure;
use mpl::types::*;
use proptest::prelude::*;

/// `depth` levels of alternating `not`/`all` around one leaf.
fn chain(depth: usize) -> Condition {
    let mut condition = Condition::simple("request.model", "==", Value::string("gpt-4"));
    for level in 1..depth {
        condition = if level % 2 == 0 {
            Condition::All(vec![condition])
        } else {
            Condition::not(condition)
        };
    }
    condition
}

fn policy(condition: Condition) -> Policy {
    Policy {
        mpl_version: "1.0".to_string(),
        name: "depth".to_string(),
        version: "1.0.0".to_string(),
        rules: vec![Rule {
            name: "r".to_string(),
            conditions: Some(condition),
            actions: vec![Action::new("allow")],
            location: Location::default(),
        }],
        ..Default::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // A chain is rejected exactly when it is deeper than the limit, with one error.
    #[test]
    fn depth_error_iff_over_limit(depth in 1usize..40, max_depth in 1usize..20) {
        let config = ValidatorConfig { max_depth, ..ValidatorConfig::default() };
        let errors = check_structure(&policy(chain(depth)), &config);
        let depth_errors = errors
            .iter()
            .filter(|e| e.kind == ErrorKind::Structural && e.message.contains("exceeds maximum depth"))
            .count();
        prop_assert_eq!(depth_errors, usize::from(depth > max_depth));
        prop_assert_eq!(errors.count(), depth_errors);
    }
}
