//! Merge context: file attribution and provenance for one resolve pass.

use crate::provenance::{ProvenanceEntry, ProvenanceMap};

/// Tracks the current file, the import chain leading to it, and the
/// provenance map for one resolve pass.
///
/// A fresh context is created per resolution; nothing here is shared or
/// global. Error paths use the import chain for attribution ("imported via
/// a -> b"); the merge engine records provenance through it when enabled.
#[derive(Debug, Default)]
pub struct MergeContext {
    /// Files currently being processed, outermost first.
    import_chain: Vec<String>,

    /// Provenance map, present only when tracking was requested.
    provenance: Option<ProvenanceMap>,
}

impl MergeContext {
    /// Create a new context without provenance tracking.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable provenance recording for this pass.
    pub fn track_provenance(&mut self) {
        if self.provenance.is_none() {
            self.provenance = Some(ProvenanceMap::new());
        }
    }

    /// Check whether provenance recording is enabled.
    pub fn provenance_enabled(&self) -> bool {
        self.provenance.is_some()
    }

    /// Record a provenance entry, if tracking is enabled.
    pub fn record(&mut self, path: &str, entry: ProvenanceEntry) {
        if let Some(provenance) = &mut self.provenance {
            provenance.record(path, entry);
        }
    }

    /// Access the provenance map, if tracking is enabled.
    pub fn provenance(&self) -> Option<&ProvenanceMap> {
        self.provenance.as_ref()
    }

    /// Mutable access to the provenance map, if tracking is enabled.
    pub fn provenance_mut(&mut self) -> Option<&mut ProvenanceMap> {
        self.provenance.as_mut()
    }

    /// Take the provenance map out of the context.
    pub fn into_provenance(self) -> Option<ProvenanceMap> {
        self.provenance
    }

    /// Push a file onto the import chain (entering an import).
    pub fn enter_file(&mut self, file: impl Into<String>) {
        self.import_chain.push(file.into());
    }

    /// Pop the innermost file (leaving an import).
    pub fn leave_file(&mut self) {
        self.import_chain.pop();
    }

    /// The file currently being processed, if any.
    pub fn current_file(&self) -> Option<&str> {
        self.import_chain.last().map(String::as_str)
    }

    /// The active import chain, outermost file first.
    pub fn import_chain(&self) -> &[String] {
        &self.import_chain
    }

    /// Describe the current file with its import chain, for error messages.
    pub fn describe_current(&self) -> String {
        match self.import_chain.split_last() {
            None => "<no file>".to_string(),
            Some((current, [])) => format!("'{}'", current),
            Some((current, rest)) => {
                format!("'{}' (imported via {})", current, rest.join(" -> "))
            }
        }
    }
}
