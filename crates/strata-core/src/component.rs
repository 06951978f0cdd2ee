/*
 * component.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Component definitions and their metadata.

use crate::error::{ResolveError, Result};
use indexmap::IndexMap;
use strata_config::{ConfigValue, Value};
use strata_yaml::SourceInfo;

/// Well-known section names in stack manifests.
pub mod sections {
    pub const VARS: &str = "vars";
    pub const SETTINGS: &str = "settings";
    pub const ENV: &str = "env";
    pub const HOOKS: &str = "hooks";
    pub const AUTH: &str = "auth";
    pub const PROVIDERS: &str = "providers";
    pub const BACKEND: &str = "backend";
    pub const BACKEND_TYPE: &str = "backend_type";
    pub const COMMAND: &str = "command";
    pub const METADATA: &str = "metadata";
    pub const OVERRIDES: &str = "overrides";
    pub const COMPONENTS: &str = "components";
    pub const COMPONENT: &str = "component";
    pub const IMPORT: &str = "import";
    pub const INHERITS: &str = "inherits";
    pub const INHERITANCE: &str = "inheritance";

    /// Stack-root sections that form the global merge layer.
    pub const GLOBAL: &[&str] = &[VARS, SETTINGS, ENV, HOOKS, AUTH];

    /// Sections that must be mappings when present in a component body.
    pub const MAP_SECTIONS: &[&str] = &[VARS, SETTINGS, ENV, HOOKS, AUTH, PROVIDERS, BACKEND];
}

/// Whether a component is deployable or template-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentKind {
    /// A deployable component.
    #[default]
    Real,

    /// A template-only base (`metadata.type: abstract`); cannot itself be
    /// deployed, and its abstractness never propagates to derived
    /// components.
    Abstract,
}

impl ComponentKind {
    /// The `metadata.type` value for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Real => "real",
            ComponentKind::Abstract => "abstract",
        }
    }
}

/// Typed view of a component's `metadata` section.
///
/// The raw metadata map is kept alongside the typed fields: the merge
/// pipeline works on the raw tree (preserving source positions), while the
/// typed view drives inheritance and policy decisions.
#[derive(Debug, Clone, Default)]
pub struct ComponentMetadata {
    /// Deployable or abstract (`metadata.type`).
    pub kind: ComponentKind,

    /// Physical component path (`metadata.component`); never inherited.
    pub component: Option<String>,

    /// Declared inheritance bases, in declaration order.
    pub inherits: Vec<String>,

    /// Logical name override (`metadata.name`).
    pub name: Option<String>,

    /// Whether the component is enabled (default true).
    pub enabled: bool,

    /// Whether the component is locked against changes.
    pub locked: bool,

    /// Workspace name override.
    pub workspace: Option<String>,

    /// Workspace naming pattern.
    pub workspace_pattern: Option<String>,

    /// Free-form `metadata.custom` map; never inherited.
    pub custom: Option<ConfigValue>,

    /// The raw metadata map with source positions.
    pub raw: Option<ConfigValue>,
}

impl ComponentMetadata {
    /// Extract typed metadata from a component's `metadata` section.
    pub fn from_config(metadata: &ConfigValue, component: &str) -> Result<Self> {
        let invalid = |message: String| ResolveError::InvalidSection {
            component: component.to_string(),
            section: sections::METADATA.to_string(),
            message,
        };

        let Some(entries) = metadata.as_map() else {
            return Err(invalid(format!("expected a map, found {}", metadata.value.kind_name())));
        };

        let mut parsed = ComponentMetadata {
            enabled: true,
            raw: Some(metadata.clone()),
            ..ComponentMetadata::default()
        };

        for (key, value) in entries {
            match key.as_str() {
                "type" => {
                    parsed.kind = match value.value.as_str() {
                        Some("abstract") => ComponentKind::Abstract,
                        Some("real") | None => ComponentKind::Real,
                        Some(other) => {
                            return Err(invalid(format!("unknown component type '{other}'")));
                        }
                    };
                }
                sections::COMPONENT => {
                    parsed.component = value.value.as_str().map(str::to_string);
                }
                sections::INHERITS => {
                    let Some(items) = value.as_list() else {
                        return Err(invalid("'inherits' must be a list of component names".into()));
                    };
                    for item in items {
                        match item.value.as_str() {
                            Some(name) => parsed.inherits.push(name.to_string()),
                            None => {
                                return Err(invalid(format!(
                                    "'inherits' entries must be strings, found {}",
                                    item.value.kind_name()
                                )));
                            }
                        }
                    }
                }
                "name" => parsed.name = value.value.as_str().map(str::to_string),
                "enabled" => parsed.enabled = value.value.as_bool().unwrap_or(true),
                "locked" => parsed.locked = value.value.as_bool().unwrap_or(false),
                "workspace" => parsed.workspace = value.value.as_str().map(str::to_string),
                "workspace_pattern" => {
                    parsed.workspace_pattern = value.value.as_str().map(str::to_string);
                }
                "custom" => parsed.custom = Some(value.clone()),
                // Unknown metadata keys are carried through the raw map
                // untouched.
                _ => {}
            }
        }

        Ok(parsed)
    }
}

/// A component's declaration inside a stack or catalog manifest.
///
/// Identified by (stack, component type, name). Holds the typed metadata,
/// the inline configuration sections that form the component's own merge
/// layer, and the `overrides` block.
#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    /// Component name within its type.
    pub name: String,

    /// Component type (`terraform`, `helmfile`, ...).
    pub component_type: String,

    /// Typed metadata view.
    pub metadata: ComponentMetadata,

    /// Inline sections (vars, settings, env, ...), metadata and overrides
    /// excluded.
    pub sections: ConfigValue,

    /// The component's `overrides` block, if any.
    pub overrides: Option<ConfigValue>,

    /// Location of the component's declaration.
    pub source: SourceInfo,
}

impl ComponentDefinition {
    /// Extract a component definition from its manifest body.
    pub fn from_config(name: &str, component_type: &str, body: &ConfigValue) -> Result<Self> {
        let invalid = |section: &str, message: String| ResolveError::InvalidSection {
            component: name.to_string(),
            section: section.to_string(),
            message,
        };

        let Some(entries) = body.as_map() else {
            return Err(invalid(
                sections::COMPONENTS,
                format!("component body must be a map, found {}", body.value.kind_name()),
            ));
        };

        let mut metadata = match entries.get(sections::METADATA) {
            Some(meta) => ComponentMetadata::from_config(meta, name)?,
            None => ComponentMetadata {
                enabled: true,
                ..ComponentMetadata::default()
            },
        };

        // Legacy form: a top-level `component` attribute names the physical
        // component path when metadata.component is absent.
        if metadata.component.is_none() {
            if let Some(legacy) = entries.get(sections::COMPONENT) {
                match legacy.value.as_str() {
                    Some(path) => metadata.component = Some(path.to_string()),
                    None => {
                        return Err(invalid(
                            sections::COMPONENT,
                            format!("expected a string, found {}", legacy.value.kind_name()),
                        ));
                    }
                }
            }
        }

        let overrides = match entries.get(sections::OVERRIDES) {
            Some(block) if !block.is_map() => {
                return Err(invalid(
                    sections::OVERRIDES,
                    format!("expected a map, found {}", block.value.kind_name()),
                ));
            }
            Some(block) => Some(block.clone()),
            None => None,
        };

        let mut body_sections = IndexMap::new();
        for (key, value) in entries {
            if matches!(key.as_str(), sections::METADATA | sections::OVERRIDES | sections::COMPONENT) {
                continue;
            }

            if sections::MAP_SECTIONS.contains(&key.as_str()) && !value.is_map() && !value.is_null() {
                return Err(invalid(
                    key,
                    format!("expected a map, found {}", value.value.kind_name()),
                ));
            }

            if key == sections::BACKEND_TYPE || key == sections::COMMAND {
                if value.value.as_str().is_none() {
                    return Err(invalid(
                        key,
                        format!("expected a string, found {}", value.value.kind_name()),
                    ));
                }
            }

            body_sections.insert(key.clone(), value.clone());
        }

        Ok(ComponentDefinition {
            name: name.to_string(),
            component_type: component_type.to_string(),
            metadata,
            sections: ConfigValue::map(body_sections, body.source.clone()),
            overrides,
            source: body.source.clone(),
        })
    }

    /// Physical component path: own `metadata.component`, else the name.
    pub fn component_path(&self) -> &str {
        self.metadata.component.as_deref().unwrap_or(&self.name)
    }
}
