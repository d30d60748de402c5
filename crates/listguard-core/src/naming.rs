//! Canonical list naming.
//!
//! A list is identified in the registry by its spool and its name joined
//! into a single path-like string. Every component that touches the registry
//! goes through [`list_dir`] so the same list always maps to the same key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Join a spool directory and a list name into the registry key.
///
/// The joined path is cleaned lexically: repeated separators collapse, `.`
/// segments are dropped, `..` removes the previous segment and trailing
/// separators are stripped. `"/srv/"` + `"./a/"` and `"/srv"` + `"a"` both
/// yield `"/srv/a"`. The result is otherwise opaque and case-sensitive.
/// Empty parts are ignored; two empty parts yield an empty key.
pub fn list_dir(spool: &str, name: &str) -> String {
    match (spool.is_empty(), name.is_empty()) {
        (true, true) => String::new(),
        (true, false) => clean_path(name),
        (false, true) => clean_path(spool),
        (false, false) => clean_path(&format!("{spool}/{name}")),
    }
}

/// Lexically normalize a slash-separated path.
///
/// `..` never climbs above the root of an absolute path; in a relative path
/// leading `..` segments are kept. An empty relative result is `"."`.
fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let body = segments.join("/");
    if rooted {
        format!("/{body}")
    } else if body.is_empty() {
        ".".to_string()
    } else {
        body
    }
}

/// A list addressed by spool and name.
///
/// Handed to the executor so it can locate the list without re-deriving the
/// registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListRef {
    pub spool: String,
    pub name: String,
}

impl ListRef {
    pub fn new(spool: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            spool: spool.into(),
            name: name.into(),
        }
    }

    /// The registry key for this list.
    pub fn key(&self) -> String {
        list_dir(&self.spool, &self.name)
    }
}

impl fmt::Display for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
