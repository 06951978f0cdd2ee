/*
 * cancellation.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Cooperative cancellation for batch resolution.
//!
//! A single component resolution is sequential and short; only batches
//! (resolving every component of a stack) check for cancellation, between
//! components. The token wraps `tokio_util::sync::CancellationToken` so a
//! parent deadline or signal handler can be threaded straight through.

/// A cooperative cancellation token.
#[derive(Clone, Default)]
pub struct Cancellation {
    inner: tokio_util::sync::CancellationToken,
}

impl Cancellation {
    /// Create a new cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.inner.cancel();
    }
}

impl From<tokio_util::sync::CancellationToken> for Cancellation {
    fn from(token: tokio_util::sync::CancellationToken) -> Self {
        Self { inner: token }
    }
}
