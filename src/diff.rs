//! Reconciliation between the current store state and a desired document.
//!
//! Both sides arrive as flat address → value maps; the output is the minimal
//! set of typed changes that makes the store match the document. Pure
//! function, no I/O; ordering for display is imposed later by the renderer.

use std::collections::BTreeMap;

use tracing::debug;

/// One proposed store mutation. Created fresh per reconciliation run and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Add {
        key: String,
        new: String,
    },
    Remove {
        key: String,
        old: String,
    },
    Update {
        key: String,
        old: String,
        new: String,
    },
}

impl Change {
    pub fn key(&self) -> &str {
        match self {
            Change::Add { key, .. } | Change::Remove { key, .. } | Change::Update { key, .. } => {
                key
            }
        }
    }
}

/// An ordered collection of changes. Empty means the store already matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet(Vec<Change>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.0.push(change);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.0.iter()
    }

    /// Sort ascending by key (byte order) for deterministic display.
    pub fn sort_by_key(&mut self) {
        self.0.sort_by(|a, b| a.key().cmp(b.key()));
    }
}

impl From<Vec<Change>> for ChangeSet {
    fn from(changes: Vec<Change>) -> Self {
        Self(changes)
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Compute the changes that turn `current` into `desired`.
///
/// - A key only in `current` is removed; a key only in `desired` is added;
///   a key in both with a different value is updated. Equality is exact
///   string comparison.
/// - A non-empty `ignore` value suppresses additions and updates whose *new*
///   value equals it, leaving the key alone for an external owner. Removals
///   are never suppressed: a key dropped from the document is still proposed
///   for removal.
/// - A non-empty `key_filter` restricts the result to that exact key.
pub fn diff(
    current: &BTreeMap<String, String>,
    desired: &BTreeMap<String, String>,
    key_filter: &str,
    ignore: &str,
) -> ChangeSet {
    let mut changes = ChangeSet::new();

    for (key, old) in current {
        if !desired.contains_key(key) {
            changes.push(Change::Remove {
                key: key.clone(),
                old: old.clone(),
            });
        }
    }

    for (key, new) in desired {
        if !ignore.is_empty() && new == ignore {
            continue;
        }
        match current.get(key) {
            None => changes.push(Change::Add {
                key: key.clone(),
                new: new.clone(),
            }),
            Some(old) if old != new => changes.push(Change::Update {
                key: key.clone(),
                old: old.clone(),
                new: new.clone(),
            }),
            Some(_) => {}
        }
    }

    if !key_filter.is_empty() {
        changes = ChangeSet(
            changes
                .into_iter()
                .filter(|c| c.key() == key_filter)
                .collect(),
        );
    }

    debug!(
        current = current.len(),
        desired = desired.len(),
        changes = changes.len(),
        "computed changeset"
    );
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn identical_maps_yield_no_changes() {
        let m = map(&[("a", "1"), ("b/c", "2")]);
        assert!(diff(&m, &m, "", "").is_empty());
    }

    #[test]
    fn empty_maps_yield_no_changes() {
        assert!(diff(&map(&[]), &map(&[]), "", "").is_empty());
    }

    #[test]
    fn disjoint_maps_remove_and_add() {
        let cs = diff(&map(&[("a", "1")]), &map(&[("b", "2")]), "", "");
        assert_eq!(cs.len(), 2);
        assert!(cs.iter().any(|c| matches!(
            c,
            Change::Remove { key, old } if key == "a" && old == "1"
        )));
        assert!(cs.iter().any(|c| matches!(
            c,
            Change::Add { key, new } if key == "b" && new == "2"
        )));
    }

    #[test]
    fn changed_value_is_an_update() {
        let cs = diff(&map(&[("a", "x")]), &map(&[("a", "y")]), "", "");
        assert_eq!(
            cs,
            ChangeSet::from(vec![Change::Update {
                key: "a".into(),
                old: "x".into(),
                new: "y".into(),
            }])
        );
    }

    #[test]
    fn comparison_is_exact_no_trimming() {
        let cs = diff(&map(&[("a", "x")]), &map(&[("a", "x ")]), "", "");
        assert_eq!(cs.len(), 1);
    }

    #[test]
    fn ignore_sentinel_suppresses_add_and_update() {
        let current = map(&[("a", "x")]);
        let desired = map(&[("a", "_ignore"), ("b", "_ignore")]);
        assert!(diff(&current, &desired, "", "_ignore").is_empty());
    }

    #[test]
    fn ignore_sentinel_does_not_suppress_removal() {
        // "a" is gone from the document; its current value matching the
        // sentinel is irrelevant.
        let cs = diff(&map(&[("a", "_ignore")]), &map(&[]), "", "_ignore");
        assert_eq!(cs.len(), 1);
        assert!(matches!(cs.iter().next().unwrap(), Change::Remove { key, .. } if key == "a"));
    }

    #[test]
    fn empty_ignore_disables_the_filter() {
        let cs = diff(&map(&[]), &map(&[("a", "_ignore")]), "", "");
        assert_eq!(cs.len(), 1);
    }

    #[test]
    fn key_filter_is_exact_match() {
        let current = map(&[("a", "1"), ("b", "2")]);
        let desired = map(&[("a", "9"), ("b", "2")]);
        let cs = diff(&current, &desired, "a", "");
        assert_eq!(cs.len(), 1);
        assert_eq!(cs.iter().next().unwrap().key(), "a");
    }

    #[test]
    fn key_filter_is_not_a_prefix_match() {
        let current = map(&[]);
        let desired = map(&[("app/db", "1"), ("app", "2")]);
        let cs = diff(&current, &desired, "app", "");
        assert_eq!(cs.len(), 1);
        assert_eq!(cs.iter().next().unwrap().key(), "app");
    }

    #[test]
    fn key_filter_applies_to_removals_too() {
        let cs = diff(&map(&[("a", "1"), ("b", "2")]), &map(&[]), "b", "");
        assert_eq!(cs.len(), 1);
        assert!(matches!(cs.iter().next().unwrap(), Change::Remove { key, .. } if key == "b"));
    }

    #[test]
    fn sort_orders_by_key_bytes() {
        let mut cs = ChangeSet::from(vec![
            Change::Add {
                key: "b".into(),
                new: "2".into(),
            },
            Change::Remove {
                key: "a".into(),
                old: "1".into(),
            },
            Change::Add {
                key: "B".into(),
                new: "3".into(),
            },
        ]);
        cs.sort_by_key();
        let keys: Vec<&str> = cs.iter().map(Change::key).collect();
        assert_eq!(keys, vec!["B", "a", "b"]);
    }
}
