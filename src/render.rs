//! Textual rendering of a changeset.
//!
//! Plain mode is the stable, scriptable form: one `+key=value` or
//! `-key=value` line per mutation, sorted by key, updates shown as a removal
//! followed by an addition. Pretty mode carries the same keys and values with
//! terminal colors and an inline character diff for updated values.

use std::fmt::Write;

use crossterm::style::Stylize;

use crate::diff::{Change, ChangeSet};
use crate::textdiff::{self, Segment};

/// Render a changeset, sorted ascending by key. An empty changeset renders
/// as the empty string; the caller owns any "No changes" message.
pub fn render(cs: &ChangeSet, pretty: bool) -> String {
    let mut changes: Vec<&Change> = cs.iter().collect();
    changes.sort_by_key(|c| c.key());

    let mut out = String::new();
    for change in changes {
        if pretty {
            out.push_str(&pretty_line(change));
        } else {
            out.push_str(&plain_line(change));
        }
        out.push('\n');
    }
    out
}

fn plain_line(change: &Change) -> String {
    match change {
        Change::Add { key, new } => format!("+{key}={}", quoted(new)),
        Change::Remove { key, old } => format!("-{key}={old}"),
        Change::Update { key, old, new } => {
            format!("-{key}={old}\n+{key}={}", quoted(new))
        }
    }
}

fn pretty_line(change: &Change) -> String {
    match change {
        Change::Add { key, new } => {
            format!("{}={}", key.as_str().green(), quoted(new).green())
        }
        Change::Remove { key, old } => {
            format!("{}={}", key.as_str().red(), old.as_str().red())
        }
        Change::Update { key, old, new } => {
            let mut line = format!("{}=", key.as_str().yellow());
            for segment in textdiff::diff_chars(old, new) {
                match segment {
                    Segment::Equal(text) => line.push_str(&text),
                    Segment::Insert(text) => {
                        let _ = write!(line, "{}", text.green());
                    }
                    Segment::Delete(text) => {
                        let _ = write!(line, "{}", text.red());
                    }
                }
            }
            line
        }
    }
}

/// An empty new value prints as `""` so the line visibly sets an empty
/// string rather than looking truncated.
fn quoted(value: &str) -> String {
    if value.is_empty() {
        "\"\"".to_string()
    } else {
        value.to_string()
    }
}
