/*
 * metadata.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Metadata inheritance policy.
//!
//! `metadata` does not follow the generic merge rule. Per-field policy:
//!
//! | field | inheritance |
//! |---|---|
//! | `component` | never inherited |
//! | `inherits` | never inherited (read only) |
//! | `type` | inherited, except `abstract` never propagates |
//! | `enabled`, `locked`, `workspace`, `workspace_pattern`, `name` | inherited |
//! | `custom` | never inherited |
//!
//! The policy is applied by filtering each ancestor's metadata before it
//! enters the layer stack; the filtered maps then merge with the ordinary
//! map rules. A global toggle disables metadata inheritance entirely, in
//! which case ancestors contribute no metadata at all; `inherits` is still
//! always read, because the chain must be known regardless.

use strata_config::ConfigValue;

/// `metadata.type` value marking a template-only component.
pub const TYPE_ABSTRACT: &str = "abstract";

/// Metadata fields that never flow to derived components.
const NEVER_INHERITED: &[&str] = &["component", "inherits", "custom"];

/// Filter an ancestor's metadata down to the inheritable subset.
///
/// Returns None when inheritance is disabled, the metadata is absent or not
/// a map, or nothing survives the filter. The abstract-type exclusion is
/// always-on, independent of the toggle.
pub fn inheritable_metadata(metadata: Option<&ConfigValue>, inherit_enabled: bool) -> Option<ConfigValue> {
    if !inherit_enabled {
        return None;
    }

    let metadata = metadata?;
    let entries = metadata.as_map()?;

    let mut filtered = indexmap::IndexMap::new();
    for (key, value) in entries {
        if NEVER_INHERITED.contains(&key.as_str()) {
            continue;
        }
        if key == "type" && value.value.as_str() == Some(TYPE_ABSTRACT) {
            continue;
        }
        filtered.insert(key.clone(), value.clone());
    }

    if filtered.is_empty() {
        None
    } else {
        Some(ConfigValue::map(filtered, metadata.source.clone()))
    }
}
