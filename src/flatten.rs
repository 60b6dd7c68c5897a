//! Flatten a JSON/YAML document into flat store addresses.
//!
//! `{"app": {"db": {"host": "x"}}}` → `[("app/db/host", "x")]`. The reserved
//! `_value` field is emitted at its parent's address with a trailing
//! separator, so a folder's own value and its children coexist in the flat
//! space. Scalars are stringified the way the store holds them; anything that
//! is not a string, number, bool, or map is a fatal error naming the key.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::ConfsyncError;
use crate::nested::{FOLDER_VALUE, KEY_SEPARATOR, Node, format_number};

/// Declared format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl FromStr for Format {
    type Err = ConfsyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(ConfsyncError::UnknownFormat(other.to_string())),
        }
    }
}

/// Decode a document and flatten it to a map from flat address to string
/// value. Either the whole mapping is produced or an error is returned;
/// there is no partial result.
pub fn flatten(doc: &[u8], format: Format) -> Result<BTreeMap<String, String>, ConfsyncError> {
    let root = decode(doc, format)?;
    let mut out = BTreeMap::new();
    flatten_object(&root, "", &mut out);
    Ok(out)
}

/// Decode a document into the nested node model. The root must be an object.
pub fn decode(doc: &[u8], format: Format) -> Result<BTreeMap<String, Node>, ConfsyncError> {
    match format {
        Format::Json => {
            let map: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(doc)?;
            let mut root = BTreeMap::new();
            for (key, value) in map {
                let node = from_json(value, &key)?;
                root.insert(key, node);
            }
            Ok(root)
        }
        Format::Yaml => {
            let map: serde_yaml::Mapping = serde_yaml::from_slice(doc)?;
            yaml_object(map, "")
        }
    }
}

fn from_json(value: serde_json::Value, path: &str) -> Result<Node, ConfsyncError> {
    match value {
        serde_json::Value::String(s) => Ok(Node::Scalar(s)),
        serde_json::Value::Bool(b) => Ok(Node::Bool(b)),
        serde_json::Value::Number(n) => {
            n.as_f64()
                .map(Node::Number)
                .ok_or_else(|| ConfsyncError::UnsupportedValue {
                    key: path.to_string(),
                })
        }
        serde_json::Value::Object(map) => {
            let mut children = BTreeMap::new();
            for (key, value) in map {
                let child_path = join(path, &key);
                let node = from_json(value, &child_path)?;
                children.insert(key, node);
            }
            Ok(Node::Object(children))
        }
        serde_json::Value::Null | serde_json::Value::Array(_) => {
            Err(ConfsyncError::UnsupportedValue {
                key: path.to_string(),
            })
        }
    }
}

fn yaml_object(map: serde_yaml::Mapping, path: &str) -> Result<BTreeMap<String, Node>, ConfsyncError> {
    let mut children = BTreeMap::new();
    for (key, value) in map {
        let serde_yaml::Value::String(key) = key else {
            return Err(ConfsyncError::NonStringKey {
                path: path.to_string(),
            });
        };
        let child_path = join(path, &key);
        let node = from_yaml(value, &child_path)?;
        children.insert(key, node);
    }
    Ok(children)
}

fn from_yaml(value: serde_yaml::Value, path: &str) -> Result<Node, ConfsyncError> {
    match value {
        serde_yaml::Value::String(s) => Ok(Node::Scalar(s)),
        serde_yaml::Value::Bool(b) => Ok(Node::Bool(b)),
        serde_yaml::Value::Number(n) => {
            n.as_f64()
                .map(Node::Number)
                .ok_or_else(|| ConfsyncError::UnsupportedValue {
                    key: path.to_string(),
                })
        }
        serde_yaml::Value::Mapping(map) => Ok(Node::Object(yaml_object(map, path)?)),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Tagged(_) => Err(ConfsyncError::UnsupportedValue {
            key: path.to_string(),
        }),
    }
}

fn flatten_object(children: &BTreeMap<String, Node>, prefix: &str, out: &mut BTreeMap<String, String>) {
    for (key, node) in children {
        match node {
            Node::Object(grandchildren) => {
                flatten_object(grandchildren, &join(prefix, key), out);
            }
            Node::Scalar(s) => emit(prefix, key, s.clone(), out),
            Node::Number(n) => emit(prefix, key, format_number(*n), out),
            Node::Bool(b) => emit(prefix, key, b.to_string(), out),
        }
    }
}

fn emit(prefix: &str, key: &str, value: String, out: &mut BTreeMap<String, String>) {
    // A folder's own value lives at the parent address, marked with a
    // trailing separator the way the store lists folder entries.
    let flat_key = if key == FOLDER_VALUE {
        join(prefix, "")
    } else {
        join(prefix, key)
    };
    out.insert(flat_key, value);
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{KEY_SEPARATOR}{key}")
    }
}
