//! Keep stored configuration in sync with a rendered template.
//!
//! Confsync renders a configuration template against a merged set of value
//! sources, then reconciles the result with what a storage backend currently
//! holds — a flat file or a hierarchical key/value store — presenting and
//! optionally applying the minimal set of changes.
//!
//! ```ignore
//! let registry = StorageRegistry::with_defaults();
//! let mut storage = registry.open("file://service.json")?;
//! let cs = storage.changes(&rendered, "yaml", "", "_ignore")?;
//! println!("{}", render(&cs, true));
//! storage.apply(&cs)?;
//! ```
//!
//! # The flat address space
//!
//! A hierarchical store addresses values by slash-delimited keys
//! (`app/db/host`). A document maps onto that space by flattening:
//! nested objects become key prefixes, scalars become values. One address
//! can hold a value *and* be a folder for deeper addresses; documents write
//! that as the reserved `_value` field, and store listings mark it with a
//! trailing separator. The [`nested`] and [`flatten`] modules own this
//! mapping in both directions.
//!
//! # Reconciliation
//!
//! [`diff::diff`] compares the flattened current and desired states and
//! produces a [`diff::ChangeSet`] of additions, updates, and removals.
//! Two filters shape the result:
//!
//! - the **ignore sentinel**: a desired value equal to the configured
//!   sentinel (default `_ignore`) means "this key is owned elsewhere, leave
//!   it alone". It suppresses additions and updates, never removals.
//! - the **key filter**: restrict the run to one exact key.
//!
//! [`render::render`] turns a changeset into sorted `+key=value` /
//! `-key=value` lines, plainly or with terminal colors and an inline
//! character diff for updated values.
//!
//! # Applying changes
//!
//! [`store::apply`] walks the changeset in order and issues one put or
//! delete per change against a [`store::KvBackend`]. There is no
//! transaction: the first failure stops the run and already-applied
//! mutations stay applied. Operators must read an apply error as "some
//! changes may have applied".
//!
//! # Storage backends
//!
//! The [`storage`] module wraps backends behind one [`storage::Storage`]
//! trait: [`storage::KvStorage`] does per-key reconciliation over any
//! [`store::KvBackend`]; [`storage::FileStorage`] treats the stored content
//! as one opaque blob. Backends are chosen through an explicit
//! [`storage::StorageRegistry`] built at startup.
//!
//! # CLI
//!
//! The `cli` feature (on by default) adds the `confsync` binary with
//! `build`, `diff`, `push`, and `fetch` subcommands, plus an optional TOML
//! config file ([`config`]) supplying flag defaults. The core modules have
//! no dependency on any CLI framework.

pub mod config;
pub mod diff;
pub mod error;
pub mod flatten;
pub mod nested;
pub mod render;
pub mod source;
pub mod storage;
pub mod store;
pub mod template;
pub mod textdiff;

#[cfg(feature = "cli")]
pub mod cli;

pub use diff::{Change, ChangeSet, diff};
pub use error::ConfsyncError;
pub use flatten::{Format, flatten};
pub use nested::{DisplayFormat, FlatPair, Node, to_nested};
pub use render::render;
pub use storage::{FileStorage, KvStorage, Storage, StorageRegistry};
pub use store::{KvBackend, MemoryKv, apply};
