//! Nested document model for hierarchical key/value content.
//!
//! A store addresses values by slash-delimited keys (`app/db/host`). A key may
//! simultaneously hold a value and act as a folder for deeper keys; the store
//! marks such entries with a trailing separator (`app/db/`), and documents
//! express the same thing with the reserved `_value` field. This module owns
//! that mapping: the [`Node`] tree, re-nesting of raw store pairs, and the
//! textual rendering used by `fetch`.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Separator between key segments in a flat store address.
pub const KEY_SEPARATOR: char = '/';

/// Reserved document field holding the value of a key that is also a folder.
/// Structural marker only: it never appears as a literal segment in flat keys.
pub const FOLDER_VALUE: &str = "_value";

/// One entry as read from or written to a store listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatPair {
    pub key: String,
    pub value: String,
}

impl FlatPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A parsed configuration document. Closed over exactly the shapes the
/// flattening contract supports; anything else is rejected at decode time.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(String),
    Number(f64),
    Bool(bool),
    Object(BTreeMap<String, Node>),
}

impl Node {
    /// The scalar rendering used for store values: strings pass through,
    /// numbers use the shortest round-trip decimal form, bools are
    /// `true`/`false`. `None` for objects.
    pub fn scalar_string(&self) -> Option<String> {
        match self {
            Node::Scalar(s) => Some(s.clone()),
            Node::Number(n) => Some(format_number(*n)),
            Node::Bool(b) => Some(b.to_string()),
            Node::Object(_) => None,
        }
    }
}

/// Shortest round-trip decimal form: `42.0` prints as `42`, `0.1` as `0.1`,
/// never scientific notation.
pub(crate) fn format_number(n: f64) -> String {
    // f64 Display is shortest-round-trip and never uses an exponent.
    format!("{n}")
}

/// Rebuild a nested document from raw store pairs.
///
/// Pair order is irrelevant: any permutation of the same pairs produces a
/// structurally identical tree. A raw key with a trailing separator is a
/// folder value and lands under [`FOLDER_VALUE`]; setting the same address
/// twice is a plain overwrite (last write wins).
pub fn to_nested(pairs: &[FlatPair]) -> Node {
    let mut root = BTreeMap::new();
    for pair in pairs {
        let is_folder = pair.key.ends_with(KEY_SEPARATOR);
        let path = pair.key.trim_end_matches(KEY_SEPARATOR);
        insert(&mut root, path, &pair.value, is_folder);
    }
    Node::Object(root)
}

fn insert(map: &mut BTreeMap<String, Node>, path: &str, value: &str, is_folder: bool) {
    match path.split_once(KEY_SEPARATOR) {
        Some((segment, rest)) => {
            // Descend, converting a scalar already at this segment into a
            // folder that keeps it as its direct value.
            let mut children = match map.remove(segment) {
                Some(Node::Object(children)) => children,
                Some(existing) => {
                    let mut children = BTreeMap::new();
                    if let Some(s) = existing.scalar_string() {
                        children.insert(FOLDER_VALUE.to_string(), Node::Scalar(s));
                    }
                    children
                }
                None => BTreeMap::new(),
            };
            insert(&mut children, rest, value, is_folder);
            map.insert(segment.to_string(), Node::Object(children));
        }
        None => {
            if let Some(Node::Object(children)) = map.get_mut(path) {
                children.insert(FOLDER_VALUE.to_string(), Node::Scalar(value.to_string()));
                return;
            }
            if is_folder {
                let mut children = BTreeMap::new();
                children.insert(FOLDER_VALUE.to_string(), Node::Scalar(value.to_string()));
                map.insert(path.to_string(), Node::Object(children));
            } else {
                map.insert(path.to_string(), Node::Scalar(value.to_string()));
            }
        }
    }
}

/// Output format for rendering store content back to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayFormat {
    /// Indented JSON.
    Json,
    /// Compact JSON.
    JsonRaw,
    /// YAML. Also the fallback for unrecognized format names.
    Yaml,
}

impl DisplayFormat {
    /// Unrecognized names fall back to YAML, the store's default rendering.
    pub fn parse_or_default(name: &str) -> Self {
        match name {
            "json" => DisplayFormat::Json,
            "jsonraw" => DisplayFormat::JsonRaw,
            _ => DisplayFormat::Yaml,
        }
    }
}

impl fmt::Display for DisplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayFormat::Json => write!(f, "json"),
            DisplayFormat::JsonRaw => write!(f, "jsonraw"),
            DisplayFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Render a nested document for display.
pub fn to_display_string(node: &Node, format: DisplayFormat) -> String {
    match format {
        DisplayFormat::Json => {
            serde_json::to_string_pretty(node).unwrap_or_else(|_| String::new())
        }
        DisplayFormat::JsonRaw => serde_json::to_string(node).unwrap_or_else(|_| String::new()),
        DisplayFormat::Yaml => serde_yaml::to_string(node).unwrap_or_else(|_| String::new()),
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Scalar(s) => serializer.serialize_str(s),
            Node::Number(n) => serializer.serialize_f64(*n),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Object(children) => {
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for (key, value) in children {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}
