use mpl::diagnostic::{SUGGESTION_THRESHOLD, closest_match, edit_distance, suggest};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // d(a, a) == 0 and d(a, b) == d(b, a)
    #[test]
    fn identity_and_symmetry(a in "[a-z._]{0,20}", b in "[a-z._]{0,20}") {
        prop_assert_eq!(edit_distance(&a, &a), 0);
        prop_assert_eq!(edit_distance(&a, &b), edit_distance(&b, &a));
    }

    // d(a, c) <= d(a, b) + d(b, c)
    #[test]
    fn triangle_inequality(
        a in "[a-c]{0,8}",
        b in "[a-c]{0,8}",
        c in "[a-c]{0,8}",
    ) {
        let ac = edit_distance(&a, &c);
        let ab = edit_distance(&a, &b);
        let bc = edit_distance(&b, &c);
        prop_assert!(ac <= ab + bc, "d({:?},{:?})={} > {} + {}", a, c, ac, ab, bc);
    }

    // |len(a) - len(b)| <= d(a, b) <= max(len(a), len(b))
    #[test]
    fn bounded_by_lengths(a in "[a-z]{0,16}", b in "[a-z]{0,16}") {
        let d = edit_distance(&a, &b);
        let (la, lb) = (a.chars().count(), b.chars().count());
        prop_assert!(d >= la.abs_diff(lb));
        prop_assert!(d <= la.max(lb));
    }

    // The chosen candidate is never farther than any other.
    #[test]
    fn closest_match_is_minimal(
        target in "[a-z]{1,10}",
        candidates in prop::collection::vec("[a-z]{1,10}", 1..8),
    ) {
        let (best, distance) = closest_match(&target, candidates.iter().map(String::as_str)).unwrap();
        prop_assert_eq!(distance, edit_distance(&target, best));
        for candidate in &candidates {
            prop_assert!(distance <= edit_distance(&target, candidate));
        }
        let first = candidates
            .iter()
            .find(|c| edit_distance(&target, c) == distance)
            .unwrap();
        prop_assert_eq!(best, first.as_str());
    }

    // Either a single "did you mean" under the threshold, or a listing.
    #[test]
    fn suggestion_form_follows_threshold(
        target in "[a-z]{1,12}",
        candidates in prop::collection::vec("[a-z]{1,12}", 1..10),
    ) {
        let suggestion = suggest(&target, candidates.as_slice(), "names").unwrap();
        let (best, distance) = closest_match(&target, candidates.iter().map(String::as_str)).unwrap();
        if distance < SUGGESTION_THRESHOLD {
            prop_assert_eq!(suggestion, format!("Did you mean '{}'?", best));
        } else {
            prop_assert!(suggestion.starts_with("Valid names include: "));
            let listed = suggestion.trim_start_matches("Valid names include: ").split(", ").count();
            prop_assert_eq!(listed, candidates.len().min(5));
        }
    }
}
