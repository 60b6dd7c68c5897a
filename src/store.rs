//! Abstract hierarchical KV store and the change applicator.
//!
//! The store seam is deliberately tiny: list the current flat pairs, set one
//! key, delete one key. A network-backed store plugs in here; the crate
//! ships an in-memory backend for tests and dry runs.

use std::collections::BTreeMap;

use tracing::debug;

use crate::diff::{Change, ChangeSet};
use crate::error::{BackendError, ConfsyncError};
use crate::nested::FlatPair;

/// A hierarchical key/value store. Implementations perform the actual I/O;
/// confsync never retries — a failed call propagates immediately.
pub trait KvBackend {
    fn list(&self) -> Result<Vec<FlatPair>, BackendError>;
    fn put(&mut self, key: &str, value: &str) -> Result<(), BackendError>;
    fn delete(&mut self, key: &str) -> Result<(), BackendError>;
}

/// Apply a changeset to a store, one mutation per change, in the order given.
///
/// There is no transaction: the first failure aborts the rest and is
/// returned, and mutations already applied stay applied. Callers must treat
/// an error as "some changes may have applied".
pub fn apply(cs: &ChangeSet, backend: &mut dyn KvBackend) -> Result<(), ConfsyncError> {
    for change in cs {
        match change {
            Change::Add { key, new } | Change::Update { key, new, .. } => {
                debug!(key = %key, "put");
                backend
                    .put(key, new)
                    .map_err(|source| ConfsyncError::StorePut {
                        key: key.clone(),
                        source,
                    })?;
            }
            Change::Remove { key, .. } => {
                debug!(key = %key, "delete");
                backend
                    .delete(key)
                    .map_err(|source| ConfsyncError::StoreDelete {
                        key: key.clone(),
                        source,
                    })?;
            }
        }
    }
    Ok(())
}

/// In-memory KV backend.
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    entries: BTreeMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvBackend for MemoryKv {
    fn list(&self) -> Result<Vec<FlatPair>, BackendError> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| FlatPair::new(k.clone(), v.clone()))
            .collect())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), BackendError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(key: &str, new: &str) -> Change {
        Change::Add {
            key: key.into(),
            new: new.into(),
        }
    }

    #[test]
    fn apply_add_update_remove() {
        let mut kv = MemoryKv::from_pairs(&[("stale", "x"), ("keep", "1"), ("bump", "old")]);
        let cs = ChangeSet::from(vec![
            add("fresh", "new"),
            Change::Update {
                key: "bump".into(),
                old: "old".into(),
                new: "new".into(),
            },
            Change::Remove {
                key: "stale".into(),
                old: "x".into(),
            },
        ]);

        apply(&cs, &mut kv).unwrap();

        assert_eq!(kv.get("fresh"), Some("new"));
        assert_eq!(kv.get("bump"), Some("new"));
        assert_eq!(kv.get("keep"), Some("1"));
        assert_eq!(kv.get("stale"), None);
    }

    #[test]
    fn empty_changeset_is_a_noop() {
        let mut kv = MemoryKv::from_pairs(&[("a", "1")]);
        apply(&ChangeSet::new(), &mut kv).unwrap();
        assert_eq!(kv.len(), 1);
    }

    /// Backend that rejects writes to one poisoned key.
    struct Tripwire {
        inner: MemoryKv,
        poisoned: String,
    }

    impl KvBackend for Tripwire {
        fn list(&self) -> Result<Vec<FlatPair>, BackendError> {
            self.inner.list()
        }

        fn put(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
            if key == self.poisoned {
                return Err("store unavailable".into());
            }
            self.inner.put(key, value)
        }

        fn delete(&mut self, key: &str) -> Result<(), BackendError> {
            self.inner.delete(key)
        }
    }

    #[test]
    fn first_failure_aborts_and_keeps_earlier_mutations() {
        let mut kv = Tripwire {
            inner: MemoryKv::new(),
            poisoned: "b".into(),
        };
        let cs = ChangeSet::from(vec![add("a", "1"), add("b", "2"), add("c", "3")]);

        let err = apply(&cs, &mut kv).unwrap_err();
        match err {
            ConfsyncError::StorePut { key, .. } => assert_eq!(key, "b"),
            other => panic!("expected StorePut, got {other:?}"),
        }

        // "a" was applied before the failure, "c" never attempted.
        assert_eq!(kv.inner.get("a"), Some("1"));
        assert_eq!(kv.inner.get("c"), None);
    }

    #[test]
    fn memory_kv_lists_all_pairs() {
        let kv = MemoryKv::from_pairs(&[("a", "1"), ("b/c", "2")]);
        let pairs = kv.list().unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&FlatPair::new("b/c", "2")));
    }
}
