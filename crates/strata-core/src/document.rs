/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parsed manifest documents.

use std::path::PathBuf;
use strata_yaml::YamlNode;

/// One parsed manifest file.
///
/// Created by the import loader and discarded once the stack view is
/// assembled; the node tree keeps per-node source positions for merge
/// attribution and provenance.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    /// Absolute path on disk.
    pub path: PathBuf,

    /// Stack-relative path, used as the `file` of every source location.
    pub relative_path: String,

    /// The document's root node.
    pub root: YamlNode,
}

impl ConfigDocument {
    /// Create a document from its paths and parsed root.
    pub fn new(path: PathBuf, relative_path: impl Into<String>, root: YamlNode) -> Self {
        Self {
            path,
            relative_path: relative_path.into(),
            root,
        }
    }
}

/// Derive the stack name from a stack-relative manifest path.
///
/// Strips the `.yaml`/`.yml` extension; directories stay part of the name,
/// so `orgs/acme/prod.yaml` names the stack `orgs/acme/prod`.
pub fn stack_name_from_path(relative_path: &str) -> String {
    relative_path
        .strip_suffix(".yaml")
        .or_else(|| relative_path.strip_suffix(".yml"))
        .unwrap_or(relative_path)
        .to_string()
}
