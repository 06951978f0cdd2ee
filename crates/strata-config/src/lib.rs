//! Configuration merging with source tracking for stack components.
//!
//! This crate provides the value model and merge engine used to combine an
//! ordered stack of configuration layers (global sections, component-type
//! defaults, linearized ancestors, the component itself, overrides) into one
//! resolved tree, while preserving source location information for error
//! reporting and per-value provenance.
//!
//! # Key Features
//!
//! - **Source location preservation**: every value carries its [`SourceInfo`]
//! - **Structural merge semantics**: maps union recursively, scalars replace,
//!   lists are wholly replaced, embedded expressions merge opaquely
//! - **Provenance**: the full override chain of every leaf, addressed by its
//!   path, recorded during the merge itself
//!
//! # Architecture
//!
//! - [`Value`] / [`ConfigValue`]: tagged configuration tree nodes, including
//!   unevaluated [`Value::Expression`] leaves
//! - [`Layer`] / [`merge_layers`]: the merge engine over an ordered layer
//!   stack, lowest precedence first
//! - [`MergeContext`]: current file, import chain and the provenance map for
//!   one resolve pass
//! - [`ProvenanceMap`]: per-path chains of [`ProvenanceEntry`] contributions
//!
//! # Example
//!
//! ```rust
//! use strata_config::{config_value_from_yaml, merge_layers, Layer, LayerKind, MergeContext};
//!
//! let base = config_value_from_yaml(&strata_yaml::parse("vars:\n  stage: dev").unwrap());
//! let over = config_value_from_yaml(&strata_yaml::parse("vars:\n  stage: prod").unwrap());
//!
//! let mut ctx = MergeContext::new();
//! let merged = merge_layers(
//!     vec![Layer::new(LayerKind::Global, base), Layer::new(LayerKind::Component, over)],
//!     &mut ctx,
//! )
//! .unwrap();
//!
//! let stage = merged.get_path(&["vars", "stage"]).unwrap();
//! assert_eq!(stage.value.as_str(), Some("prod"));
//! ```

mod context;
mod convert;
mod merge;
mod provenance;
mod types;

pub use context::MergeContext;
pub use convert::{config_value_from_yaml, is_expression_str};
pub use merge::{merge_layers, Layer, MergeError};
pub use provenance::{fingerprint, PathCursor, ProvenanceEntry, ProvenanceMap};
pub use types::{ConfigValue, LayerKind, Value};

// Re-export for convenience
pub use strata_yaml::SourceInfo;
