//! Per-value provenance recording.
//!
//! Every leaf produced during a merge gets a chain of [`ProvenanceEntry`]
//! values addressed by its path in the resolved tree (`vars.tags.Team`,
//! `vars.zones[1]`). Chains are ordered base-most contribution first; the
//! last entry is the one that set the final value.
//!
//! Recording is O(1) amortized per merge operation: the merge descent keeps
//! a single [`PathCursor`] whose buffer grows and shrinks with the walk, so
//! paths are never re-scanned or re-joined.

use crate::types::{LayerKind, Value};
use indexmap::IndexMap;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// One contribution to a resolved value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvenanceEntry {
    /// Manifest that contributed the value, if known.
    pub file: Option<String>,

    /// Line in the manifest (1-based).
    pub line: usize,

    /// Column in the manifest (1-based).
    pub column: usize,

    /// Which precedence tier the contribution came from.
    pub layer: LayerKind,

    /// Short content hash of the contributed value.
    pub fingerprint: String,
}

/// Provenance chains for one resolve pass, addressed by value path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProvenanceMap {
    chains: IndexMap<String, Vec<ProvenanceEntry>>,
}

impl ProvenanceMap {
    /// Create an empty provenance map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a contribution to the chain at `path`.
    pub fn record(&mut self, path: &str, entry: ProvenanceEntry) {
        self.chains.entry(path.to_string()).or_default().push(entry);
    }

    /// The chain recorded at `path`, base-most contribution first.
    pub fn chain(&self, path: &str) -> Option<&[ProvenanceEntry]> {
        self.chains.get(path).map(Vec::as_slice)
    }

    /// Iterate all recorded paths, in recording order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }

    /// Number of recorded paths.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Check whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Replace the fingerprint of the final entry at `path`.
    ///
    /// Used after deferred expression evaluation: the contributing file and
    /// layer stay the same, the content hash reflects the evaluated value.
    pub fn refresh_fingerprint(&mut self, path: &str, fingerprint: String) {
        if let Some(entry) = self.chains.get_mut(path).and_then(|c| c.last_mut()) {
            entry.fingerprint = fingerprint;
        }
    }
}

/// A path being built during a merge descent.
///
/// Push and pop mirror entering and leaving map keys and list indices; the
/// rendered path is always available without joining.
#[derive(Debug, Default)]
pub struct PathCursor {
    buf: String,
    marks: Vec<usize>,
}

impl PathCursor {
    /// Create a cursor at the root (empty path).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a map key.
    pub fn push_key(&mut self, key: &str) {
        self.marks.push(self.buf.len());
        if !self.buf.is_empty() {
            self.buf.push('.');
        }
        self.buf.push_str(key);
    }

    /// Enter a list index.
    pub fn push_index(&mut self, index: usize) {
        self.marks.push(self.buf.len());
        self.buf.push('[');
        self.buf.push_str(&index.to_string());
        self.buf.push(']');
    }

    /// Leave the innermost segment.
    pub fn pop(&mut self) {
        if let Some(mark) = self.marks.pop() {
            self.buf.truncate(mark);
        }
    }

    /// The rendered path.
    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

/// Compute the short content hash of a value.
///
/// The hash covers a canonical rendering of the value tree, so two equal
/// values always fingerprint identically regardless of source location.
pub fn fingerprint(value: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(value, &mut canonical);

    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(&digest[..6])
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push('~'),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => out.push_str(&i.to_string()),
        Value::Float(f) => out.push_str(&f.to_string()),
        Value::String(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        Value::Expression(s) => {
            out.push_str("expr:");
            out.push_str(s);
        }
        Value::List(items) => {
            out.push('[');
            for item in items {
                write_canonical(&item.value, out);
                out.push(',');
            }
            out.push(']');
        }
        Value::Map(entries) => {
            out.push('{');
            for (key, item) in entries {
                out.push_str(key);
                out.push(':');
                write_canonical(&item.value, out);
                out.push(',');
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(file: &str, layer: LayerKind) -> ProvenanceEntry {
        ProvenanceEntry {
            file: Some(file.to_string()),
            line: 1,
            column: 1,
            layer,
            fingerprint: "000000000000".into(),
        }
    }

    #[test]
    fn test_chain_ordering() {
        let mut map = ProvenanceMap::new();
        map.record("vars.stage", entry("catalog.yaml", LayerKind::Ancestor));
        map.record("vars.stage", entry("stack.yaml", LayerKind::Component));

        let chain = map.chain("vars.stage").unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].file.as_deref(), Some("catalog.yaml"));
        assert_eq!(chain[1].file.as_deref(), Some("stack.yaml"));
    }

    #[test]
    fn test_path_cursor() {
        let mut cursor = PathCursor::new();
        assert_eq!(cursor.as_str(), "");

        cursor.push_key("vars");
        cursor.push_key("zones");
        cursor.push_index(1);
        assert_eq!(cursor.as_str(), "vars.zones[1]");

        cursor.pop();
        assert_eq!(cursor.as_str(), "vars.zones");
        cursor.pop();
        cursor.pop();
        assert_eq!(cursor.as_str(), "");
    }

    #[test]
    fn test_fingerprint_stability() {
        let a = Value::String("prod".into());
        let b = Value::String("prod".into());
        let c = Value::String("dev".into());

        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&c));
        assert_eq!(fingerprint(&a).len(), 12);
    }

    #[test]
    fn test_fingerprint_distinguishes_expression() {
        let s = Value::String("{{ .a }}".into());
        let e = Value::Expression("{{ .a }}".into());
        assert_ne!(fingerprint(&s), fingerprint(&e));
    }

    #[test]
    fn test_refresh_fingerprint() {
        let mut map = ProvenanceMap::new();
        map.record("vars.bucket", entry("stack.yaml", LayerKind::Component));
        map.refresh_fingerprint("vars.bucket", "abcdefabcdef".into());

        let chain = map.chain("vars.bucket").unwrap();
        assert_eq!(chain.last().unwrap().fingerprint, "abcdefabcdef");
    }
}
