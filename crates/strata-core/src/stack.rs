/*
 * stack.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The assembled view of one stack.
//!
//! A stack is named by its entry manifest and composed from that manifest
//! plus everything it imports. Assembly deep-merges the ordered document
//! list into a single tree (later documents win), then splits out the parts
//! the resolver works with: global sections, component-type defaults,
//! stack- and type-scoped overrides, and the component registry.

use crate::component::{sections, ComponentDefinition};
use crate::document::{stack_name_from_path, ConfigDocument};
use crate::error::{ResolveError, Result};
use crate::import::{ImportLoader, ImportOptions};
use crate::inheritance::InheritanceGraph;
use indexmap::IndexMap;
use strata_config::{config_value_from_yaml, merge_layers, ConfigValue, Layer, LayerKind, MergeContext};

/// One stack's assembled configuration.
#[derive(Debug, Clone)]
pub struct StackConfig {
    name: String,
    globals: ConfigValue,
    type_defaults: IndexMap<String, ConfigValue>,
    type_overrides: IndexMap<String, ConfigValue>,
    stack_overrides: Option<ConfigValue>,
    components: IndexMap<String, IndexMap<String, ComponentDefinition>>,
}

impl StackConfig {
    /// Load a stack from its entry manifest, resolving all imports.
    pub fn load(base_path: impl Into<std::path::PathBuf>, entry: &str) -> Result<Self> {
        Self::load_with(base_path, entry, ImportOptions::default())
    }

    /// Load a stack with explicit import options.
    pub fn load_with(
        base_path: impl Into<std::path::PathBuf>,
        entry: &str,
        options: ImportOptions,
    ) -> Result<Self> {
        let loader = ImportLoader::new(base_path).with_options(options);
        let documents = loader.load(entry)?;
        Self::from_documents(stack_name_from_path(entry), &documents)
    }

    /// Assemble a stack from an ordered document list.
    ///
    /// Documents are merged lowest precedence first, the order the import
    /// loader produces.
    pub fn from_documents(name: impl Into<String>, documents: &[ConfigDocument]) -> Result<Self> {
        let name = name.into();

        let layers = documents
            .iter()
            .map(|doc| Layer::new(LayerKind::Import, config_value_from_yaml(&doc.root)))
            .collect();
        let root = merge_layers(layers, &mut MergeContext::new())?;

        let invalid = |message: String| ResolveError::InvalidManifest {
            file: name.clone(),
            message,
        };

        let Some(root_entries) = root.as_map() else {
            return Err(invalid(format!(
                "stack root must be a map, found {}",
                root.value.kind_name()
            )));
        };

        // Global sections form the lowest merge layer for every component.
        let mut globals = IndexMap::new();
        for section in sections::GLOBAL {
            if let Some(value) = root_entries.get(*section) {
                if !value.is_map() {
                    return Err(invalid(format!(
                        "global '{section}' section must be a map, found {}",
                        value.value.kind_name()
                    )));
                }
                globals.insert(section.to_string(), value.clone());
            }
        }

        let stack_overrides = match root_entries.get(sections::OVERRIDES) {
            Some(value) if !value.is_map() => {
                return Err(invalid(format!(
                    "'overrides' section must be a map, found {}",
                    value.value.kind_name()
                )));
            }
            Some(value) => Some(value.clone()),
            None => None,
        };

        // Component registry: components.<type>.<name>.
        let mut components: IndexMap<String, IndexMap<String, ComponentDefinition>> =
            IndexMap::new();
        if let Some(section) = root_entries.get(sections::COMPONENTS) {
            let Some(types) = section.as_map() else {
                return Err(invalid(format!(
                    "'components' section must be a map, found {}",
                    section.value.kind_name()
                )));
            };

            for (component_type, members) in types {
                let Some(members) = members.as_map() else {
                    return Err(invalid(format!(
                        "'components.{component_type}' must be a map, found {}",
                        members.value.kind_name()
                    )));
                };

                let mut definitions = IndexMap::with_capacity(members.len());
                for (component_name, body) in members {
                    definitions.insert(
                        component_name.clone(),
                        ComponentDefinition::from_config(component_name, component_type, body)?,
                    );
                }
                components.insert(component_type.clone(), definitions);
            }
        }

        // Type-level sections: defaults and the type-scoped overrides block.
        let mut type_defaults = IndexMap::new();
        let mut type_overrides = IndexMap::new();
        for component_type in components.keys() {
            let Some(section) = root_entries.get(component_type) else {
                continue;
            };
            let Some(entries) = section.as_map() else {
                return Err(invalid(format!(
                    "'{component_type}' section must be a map, found {}",
                    section.value.kind_name()
                )));
            };

            let mut defaults = IndexMap::new();
            for (key, value) in entries {
                if key == sections::OVERRIDES {
                    type_overrides.insert(component_type.clone(), value.clone());
                } else {
                    defaults.insert(key.clone(), value.clone());
                }
            }
            if !defaults.is_empty() {
                type_defaults.insert(
                    component_type.clone(),
                    ConfigValue::map(defaults, section.source.clone()),
                );
            }
        }

        Ok(StackConfig {
            name,
            globals: ConfigValue::map(globals, root.source.clone()),
            type_defaults,
            type_overrides,
            stack_overrides,
            components,
        })
    }

    /// The stack name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a component definition.
    pub fn component(&self, component_type: &str, name: &str) -> Option<&ComponentDefinition> {
        self.components.get(component_type)?.get(name)
    }

    /// Component types present in the stack.
    pub fn component_types(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// All components of a type.
    pub fn components_of_type(
        &self,
        component_type: &str,
    ) -> Option<&IndexMap<String, ComponentDefinition>> {
        self.components.get(component_type)
    }

    /// Build the inheritance graph for one component type.
    pub fn inheritance_graph(&self, component_type: &str) -> InheritanceGraph {
        let mut graph = InheritanceGraph::new(&self.name);
        if let Some(members) = self.components.get(component_type) {
            for (name, definition) in members {
                graph.add_component(name.clone(), &definition.metadata.inherits);
            }
        }
        graph
    }

    /// The global sections layer.
    pub(crate) fn globals(&self) -> &ConfigValue {
        &self.globals
    }

    /// The type-level defaults layer, if the type section exists.
    pub(crate) fn type_defaults(&self, component_type: &str) -> Option<&ConfigValue> {
        self.type_defaults.get(component_type)
    }

    /// The type-scoped overrides block.
    pub(crate) fn type_overrides(&self, component_type: &str) -> Option<&ConfigValue> {
        self.type_overrides.get(component_type)
    }

    /// The stack-root overrides block.
    pub(crate) fn stack_overrides(&self) -> Option<&ConfigValue> {
        self.stack_overrides.as_ref()
    }
}
