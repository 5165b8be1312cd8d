//! Ordering properties of the priority resolver

use proptest::prelude::*;
use remirror_core::Error;
use remirror_core::priority::Priority;
use remirror_core::resolver::{OrderEntry, resolve_order};

fn names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("ext{i}")).collect()
}

fn entries<'a>(names: &'a [String], priorities: &[i32]) -> Vec<OrderEntry<'a>> {
    names
        .iter()
        .zip(priorities)
        .map(|(name, p)| OrderEntry::new(name, Priority(*p)))
        .collect()
}

proptest! {
    #[test]
    fn test_order_is_deterministic(priorities in prop::collection::vec(0i32..5, 0..24)) {
        let names = names(priorities.len());
        let entries = entries(&names, &priorities);
        let first = resolve_order(&entries).unwrap();
        let second = resolve_order(&entries).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_order_sorts_by_priority_and_keeps_ties_stable(
        priorities in prop::collection::vec(0i32..5, 0..24)
    ) {
        let names = names(priorities.len());
        let order = resolve_order(&entries(&names, &priorities)).unwrap();

        prop_assert_eq!(order.len(), priorities.len());
        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert!(priorities[a] <= priorities[b]);
            if priorities[a] == priorities[b] {
                prop_assert!(a < b, "equal priorities must keep declaration order");
            }
        }
    }

    #[test]
    fn test_reinserting_equal_priority_appends(
        priorities in prop::collection::vec(0i32..3, 1..16),
        pick in any::<prop::sample::Index>(),
    ) {
        // Move one entry to the end of the declaration list
        let index = pick.index(priorities.len());
        let names = names(priorities.len());
        let mut reordered: Vec<usize> = (0..priorities.len()).filter(|i| *i != index).collect();
        reordered.push(index);
        let moved_names: Vec<String> = reordered.iter().map(|i| names[*i].clone()).collect();
        let moved_priorities: Vec<i32> = reordered.iter().map(|i| priorities[*i]).collect();

        let order = resolve_order(&entries(&moved_names, &moved_priorities)).unwrap();
        let resolved: Vec<&str> = order.iter().map(|i| moved_names[*i].as_str()).collect();
        let position = resolved.iter().position(|n| *n == names[index]).unwrap();

        // It is last among the entries sharing its priority
        let same = resolved
            .iter()
            .enumerate()
            .filter(|(_, n)| {
                let original = names.iter().position(|m| m == *n).unwrap();
                priorities[original] == priorities[index]
            })
            .map(|(i, _)| i)
            .max();
        prop_assert_eq!(Some(position), same);
    }
}

#[test]
fn test_relation_against_priority_is_rejected() {
    let after = vec!["paragraph".to_string()];
    let entries = [
        OrderEntry {
            after: &after,
            ..OrderEntry::new("heading", Priority::HIGH)
        },
        OrderEntry::new("paragraph", Priority::DEFAULT),
    ];
    let err = resolve_order(&entries).unwrap_err();
    assert!(matches!(
        err,
        Error::OrderingViolation { ref extension, relation: "after", ref other }
            if extension == "heading" && other == "paragraph"
    ));
}
