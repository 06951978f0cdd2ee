//! Deep-merge engine over an ordered stack of configuration layers.
//!
//! Layers are combined lowest precedence first. Merge rules by value kind:
//!
//! - **map**: recursive union, conflicting keys resolved by the
//!   higher-precedence layer;
//! - **scalar**: the higher-precedence layer replaces the lower;
//! - **list**: the higher-precedence layer's list wholly replaces the lower
//!   layer's list, never an element-wise append or merge;
//! - **expression**: merged as an opaque leaf, so a higher layer fully
//!   overrides a lower layer's expression without partial evaluation;
//! - **null**: replaces like a scalar, and may itself be replaced by any
//!   kind, including a map.
//!
//! A map and a non-map (other than null or an expression) at the same
//! position is a type conflict and fails with both contributing locations.

use crate::context::MergeContext;
use crate::provenance::{fingerprint, PathCursor, ProvenanceEntry};
use crate::types::{ConfigValue, LayerKind, Value};
use strata_yaml::SourceInfo;
use thiserror::Error;

/// One layer of the merge stack.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Which precedence tier this layer belongs to.
    pub kind: LayerKind,

    /// The layer's configuration tree.
    pub value: ConfigValue,
}

impl Layer {
    /// Create a new layer.
    pub fn new(kind: LayerKind, value: ConfigValue) -> Self {
        Self { kind, value }
    }
}

/// Errors produced by the merge engine.
#[derive(Debug, Clone, Error)]
pub enum MergeError {
    /// Two layers disagree on the structural kind of a position.
    #[error(
        "type conflict at '{path}': {existing_kind} defined at {} conflicts with {incoming_kind} defined at {}",
        .existing.display(),
        .incoming.display()
    )]
    TypeConflict {
        /// Path of the conflicting position in the merged tree.
        path: String,
        /// Kind contributed by the lower-precedence layer.
        existing_kind: &'static str,
        /// Kind contributed by the higher-precedence layer.
        incoming_kind: &'static str,
        /// Location of the lower-precedence contribution.
        existing: SourceInfo,
        /// Location of the higher-precedence contribution.
        incoming: SourceInfo,
    },
}

/// Merge an ordered layer stack into one resolved tree.
///
/// Layers are ordered lowest precedence first. When provenance tracking is
/// enabled on `ctx`, every leaf contribution is recorded against its path in
/// the resolved tree, base-most contribution first.
///
/// # Errors
///
/// Returns [`MergeError::TypeConflict`] when layers disagree on a position's
/// structural kind.
pub fn merge_layers(layers: Vec<Layer>, ctx: &mut MergeContext) -> Result<ConfigValue, MergeError> {
    let mut iter = layers.into_iter();

    let Some(first) = iter.next() else {
        return Ok(ConfigValue::empty_map(SourceInfo::default()));
    };

    let mut path = PathCursor::new();
    let acc = first.value;
    record_subtree(ctx, &mut path, &acc, first.kind);

    let mut acc = acc;
    for layer in iter {
        merge_value(&mut acc, layer.value, layer.kind, ctx, &mut path)?;
    }

    Ok(acc)
}

/// Merge one incoming value into the accumulator at the current path.
fn merge_value(
    acc: &mut ConfigValue,
    incoming: ConfigValue,
    kind: LayerKind,
    ctx: &mut MergeContext,
    path: &mut PathCursor,
) -> Result<(), MergeError> {
    match (acc.is_map(), incoming.is_map()) {
        (true, true) => {
            let Value::Map(incoming_entries) = incoming.value else {
                unreachable!("checked is_map");
            };
            let Value::Map(acc_entries) = &mut acc.value else {
                unreachable!("checked is_map");
            };

            for (key, value) in incoming_entries {
                path.push_key(&key);
                match acc_entries.get_mut(&key) {
                    Some(existing) => merge_value(existing, value, kind, ctx, path)?,
                    None => {
                        record_subtree(ctx, path, &value, kind);
                        acc_entries.insert(key, value);
                    }
                }
                path.pop();
            }
            Ok(())
        }

        (false, true) if acc.is_null() || acc.is_expression() => {
            record_subtree(ctx, path, &incoming, kind);
            *acc = incoming;
            Ok(())
        }

        (true, false) if incoming.is_null() || incoming.is_expression() => {
            record_subtree(ctx, path, &incoming, kind);
            *acc = incoming;
            Ok(())
        }

        (false, false) => {
            record_subtree(ctx, path, &incoming, kind);
            *acc = incoming;
            Ok(())
        }

        _ => Err(MergeError::TypeConflict {
            path: path.as_str().to_string(),
            existing_kind: acc.value.kind_name(),
            incoming_kind: incoming.value.kind_name(),
            existing: acc.source.clone(),
            incoming: incoming.source,
        }),
    }
}

/// Record provenance for every leaf of a contributed subtree.
fn record_subtree(ctx: &mut MergeContext, path: &mut PathCursor, value: &ConfigValue, kind: LayerKind) {
    if !ctx.provenance_enabled() {
        return;
    }

    match &value.value {
        Value::Map(entries) => {
            for (key, child) in entries {
                path.push_key(key);
                record_subtree(ctx, path, child, kind);
                path.pop();
            }
        }
        Value::List(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push_index(index);
                record_subtree(ctx, path, item, kind);
                path.pop();
            }
        }
        leaf => {
            ctx.record(
                path.as_str(),
                ProvenanceEntry {
                    file: value.source.file.clone(),
                    line: value.source.line,
                    column: value.source.col,
                    layer: kind,
                    fingerprint: fingerprint(leaf),
                },
            );
        }
    }
}
