/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template parsing and evaluation.

use thiserror::Error;

/// Errors that can occur during template operations.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    /// Error parsing the template syntax.
    #[error("template parse error at {line}:{col}: {message}")]
    Parse {
        message: String,
        line: usize,
        col: usize,
    },

    /// An expression could not be resolved against the context.
    #[error("cannot resolve '{path}' at {line}:{col}")]
    UnresolvedVariable {
        path: String,
        line: usize,
        col: usize,
    },

    /// An expression resolved to a list or map, which cannot be rendered
    /// into scalar output.
    #[error("'{path}' at {line}:{col} is a {kind} and cannot be rendered as text")]
    NotAScalar {
        path: String,
        kind: &'static str,
        line: usize,
        col: usize,
    },

    /// Expression syntax survived into rendered output.
    #[error("unrendered expression syntax at {line}:{col}")]
    UnrenderedExpression { line: usize, col: usize },
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
