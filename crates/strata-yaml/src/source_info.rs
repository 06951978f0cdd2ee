//! Source location information for YAML nodes.

use serde::{Deserialize, Serialize};

/// Source location of a YAML node in its manifest file.
///
/// Line and column are 1-based; the offset is a 0-based byte offset into the
/// file content. The location survives deep merges unchanged, so a resolved
/// value can always be traced back to the manifest that set it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Stack-relative path of the manifest, if known.
    pub file: Option<String>,

    /// Byte offset from the start of the source (0-based).
    pub offset: usize,

    /// Line number (1-based).
    pub line: usize,

    /// Column number (1-based).
    pub col: usize,

    /// Length in bytes.
    pub len: usize,
}

impl SourceInfo {
    /// Create a new SourceInfo with all fields specified.
    pub fn new(file: Option<String>, offset: usize, line: usize, col: usize, len: usize) -> Self {
        Self {
            file,
            offset,
            line,
            col,
            len,
        }
    }

    /// Create a SourceInfo from a yaml-rust2 `Marker`.
    ///
    /// The marker provides the starting position; the length is computed
    /// separately from the content.
    pub fn from_marker(marker: &yaml_rust2::scanner::Marker, len: usize) -> Self {
        Self {
            file: None,
            offset: marker.index(),
            line: marker.line() + 1, // yaml-rust2 uses 0-based, we use 1-based
            col: marker.col() + 1,
            len,
        }
    }

    /// Set the filename for this source location.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Get the end offset (exclusive) of this location.
    pub fn end_offset(&self) -> usize {
        self.offset + self.len
    }

    /// Render as `file:line:col` for error messages.
    ///
    /// Falls back to `<unknown>` when no filename was attached.
    pub fn display(&self) -> String {
        match &self.file {
            Some(file) => format!("{}:{}:{}", file, self.line, self.col),
            None => format!("<unknown>:{}:{}", self.line, self.col),
        }
    }
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self {
            file: None,
            offset: 0,
            line: 1,
            col: 1,
            len: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_info_creation() {
        let info = SourceInfo::new(Some("stack.yaml".into()), 10, 2, 5, 8);
        assert_eq!(info.file, Some("stack.yaml".into()));
        assert_eq!(info.offset, 10);
        assert_eq!(info.line, 2);
        assert_eq!(info.col, 5);
        assert_eq!(info.end_offset(), 18);
    }

    #[test]
    fn test_display_with_file() {
        let info = SourceInfo::new(Some("stack.yaml".into()), 0, 3, 7, 0);
        assert_eq!(info.display(), "stack.yaml:3:7");
    }

    #[test]
    fn test_display_without_file() {
        let info = SourceInfo::default();
        assert_eq!(info.display(), "<unknown>:1:1");
    }

    #[test]
    fn test_default() {
        let info = SourceInfo::default();
        assert_eq!(info.file, None);
        assert_eq!(info.line, 1);
        assert_eq!(info.col, 1);
    }
}
