/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for stack resolution.

use strata_config::MergeError;
use strata_template::TemplateError;
use thiserror::Error;

/// Errors produced while loading manifests and their imports.
#[derive(Debug, Error)]
pub enum ImportError {
    /// An import chain returned to a file already being imported.
    #[error("import cycle detected: {}", .chain.join(" -> "))]
    Cycle {
        /// The import chain, outermost file first, ending at the repeat.
        chain: Vec<String>,
    },

    /// An imported manifest does not exist.
    #[error("imported manifest '{path}' not found{}", .from.as_ref().map(|f| format!(" (imported from '{f}')")).unwrap_or_default())]
    NotFound {
        /// Stack-relative path of the missing manifest.
        path: String,
        /// The importing manifest, if any.
        from: Option<String>,
    },

    /// Reading a manifest failed for a reason other than absence.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An `import:` entry has the wrong shape.
    #[error("invalid import entry in '{file}': {message}")]
    InvalidEntry { file: String, message: String },

    /// Template rendering of an imported manifest failed.
    #[error("template rendering failed in '{file}': {source}")]
    Template {
        file: String,
        #[source]
        source: TemplateError,
    },

    /// An imported manifest is not valid YAML.
    #[error("parse error in '{file}': {source}")]
    Parse {
        file: String,
        #[source]
        source: strata_yaml::Error,
    },
}

/// Errors produced while resolving a component configuration.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A requested component or inheritance target is not defined in the stack.
    #[error("component '{component}' is not defined in stack '{stack}'")]
    ComponentNotFound { stack: String, component: String },

    /// The inheritance graph contains a cycle.
    #[error("inheritance cycle detected for '{component}': {}", .chain.join(" -> "))]
    InheritanceCycle {
        component: String,
        chain: Vec<String>,
    },

    /// No C3 linearization exists for the declared inheritance.
    #[error(
        "inconsistent inheritance hierarchy for '{component}': cannot order candidates [{}]",
        .candidates.join(", ")
    )]
    InconsistentHierarchy {
        component: String,
        candidates: Vec<String>,
    },

    /// A component section has the wrong structural shape.
    #[error("invalid '{section}' section for component '{component}': {message}")]
    InvalidSection {
        component: String,
        section: String,
        message: String,
    },

    /// A stack-level section has the wrong structural shape.
    #[error("invalid stack manifest '{file}': {message}")]
    InvalidManifest { file: String, message: String },

    /// A deferred expression failed to evaluate.
    #[error("expression at '{path}' ({location}) failed: {source}")]
    Expression {
        /// Path of the expression in the resolved tree.
        path: String,
        /// Source location of the expression value.
        location: String,
        #[source]
        source: TemplateError,
    },

    /// Loading the stack or one of its imports failed.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Merging the layer stack failed.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// A batch resolution was cancelled cooperatively.
    #[error("resolution cancelled")]
    Cancelled,
}

/// Result type alias for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
