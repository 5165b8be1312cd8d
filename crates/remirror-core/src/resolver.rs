//! Deterministic extension ordering.
//!
//! Extensions are stable-sorted by priority: lower values come first and
//! equal priorities keep declaration order. Explicit `after`/`before`
//! relations are then checked against that order. They never reorder
//! anything; a relation the priorities do not already satisfy is a
//! configuration error.
//!
//! # Example
//!
//! ```
//! use remirror_core::priority::Priority;
//! use remirror_core::resolver::{OrderEntry, resolve_order};
//!
//! let entries = [
//!     OrderEntry::new("bold", Priority::DEFAULT),
//!     OrderEntry::new("gapCursor", Priority::HIGH),
//! ];
//! let order = resolve_order(&entries).unwrap();
//! assert_eq!(order, vec![1, 0]);
//! ```

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::priority::Priority;

/// Ordering-relevant view of one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry<'a> {
    pub name: &'a str,
    pub priority: Priority,
    pub after: &'a [String],
    pub before: &'a [String],
    pub requires: &'a [String],
}

impl<'a> OrderEntry<'a> {
    /// An entry without relations
    pub fn new(name: &'a str, priority: Priority) -> Self {
        Self {
            name,
            priority,
            after: &[],
            before: &[],
            requires: &[],
        }
    }
}

/// Resolve the total order of `entries`, returned as indices into `entries`.
///
/// # Errors
///
/// - [`Error::DuplicateExtension`] when two entries share a name, naming both
///   declaration indices
/// - [`Error::MissingDependency`] when a relation names an absent extension
/// - [`Error::OrderingViolation`] when priorities contradict a relation
pub fn resolve_order(entries: &[OrderEntry<'_>]) -> Result<Vec<usize>> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        if let Some(&first) = first_seen.get(entry.name) {
            return Err(Error::DuplicateExtension {
                name: entry.name.to_string(),
                first,
                second: index,
            });
        }
        first_seen.insert(entry.name, index);
    }

    for entry in entries {
        let related = entry.after.iter().chain(entry.before).chain(entry.requires);
        if let Some(missing) = related.into_iter().find(|n| !first_seen.contains_key(n.as_str())) {
            return Err(Error::MissingDependency {
                extension: entry.name.to_string(),
                dependency: missing.clone(),
            });
        }
    }

    let mut order: Vec<usize> = (0..entries.len()).collect();
    // `sort_by_key` is stable, so equal priorities keep declaration order
    order.sort_by_key(|&i| entries[i].priority);

    let position: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(pos, &i)| (entries[i].name, pos))
        .collect();

    for entry in entries {
        let own = position[entry.name];
        for other in entry.after {
            if position[other.as_str()] > own {
                return Err(violation(entry.name, "after", other));
            }
        }
        for other in entry.before {
            if position[other.as_str()] < own {
                return Err(violation(entry.name, "before", other));
            }
        }
    }

    tracing::debug!(
        order = ?order.iter().map(|&i| entries[i].name).collect::<Vec<_>>(),
        "Resolved extension order"
    );
    Ok(order)
}

fn violation(extension: &str, relation: &'static str, other: &str) -> Error {
    Error::OrderingViolation {
        extension: extension.to_string(),
        relation,
        other: other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names<'a>(entries: &[OrderEntry<'a>], order: &[usize]) -> Vec<&'a str> {
        order.iter().map(|&i| entries[i].name).collect()
    }

    #[test]
    fn test_sorts_by_priority_then_declaration() {
        let entries = [
            OrderEntry::new("paragraph", Priority::DEFAULT),
            OrderEntry::new("bold", Priority::LOW),
            OrderEntry::new("gapCursor", Priority::HIGH),
            OrderEntry::new("italic", Priority::DEFAULT),
        ];
        let order = resolve_order(&entries).unwrap();
        assert_eq!(
            names(&entries, &order),
            vec!["gapCursor", "paragraph", "italic", "bold"]
        );
    }

    #[test]
    fn test_duplicate_names_report_both_indices() {
        let entries = [
            OrderEntry::new("bold", Priority::DEFAULT),
            OrderEntry::new("italic", Priority::DEFAULT),
            OrderEntry::new("bold", Priority::LOW),
        ];
        let err = resolve_order(&entries).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateExtension { ref name, first: 0, second: 2 } if name == "bold"
        ));
    }

    #[test]
    fn test_missing_dependency() {
        let requires = vec!["paragraph".to_string()];
        let entries = [OrderEntry {
            requires: &requires,
            ..OrderEntry::new("heading", Priority::DEFAULT)
        }];
        let err = resolve_order(&entries).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingDependency { ref extension, ref dependency }
                if extension == "heading" && dependency == "paragraph"
        ));
    }

    #[test]
    fn test_relation_satisfied_by_priorities() {
        let after = vec!["paragraph".to_string()];
        let entries = [
            OrderEntry {
                after: &after,
                ..OrderEntry::new("heading", Priority::LOW)
            },
            OrderEntry::new("paragraph", Priority::HIGH),
        ];
        let order = resolve_order(&entries).unwrap();
        assert_eq!(names(&entries, &order), vec!["paragraph", "heading"]);
    }

    #[test]
    fn test_relation_contradicted_by_priorities() {
        let before = vec!["bold".to_string()];
        let entries = [
            OrderEntry::new("bold", Priority::HIGH),
            OrderEntry {
                before: &before,
                ..OrderEntry::new("italic", Priority::LOW)
            },
        ];
        let err = resolve_order(&entries).unwrap_err();
        assert!(matches!(
            err,
            Error::OrderingViolation { relation: "before", ref other, .. } if other == "bold"
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve_order(&[]).unwrap().is_empty());
    }
}
