/*
 * resolve.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Component configuration resolution.
//!
//! For one (stack, component) the pipeline is: locate the component,
//! compute its C3 inheritance chain, assemble the layer stack (global →
//! type defaults → ancestors in chain order → the component itself →
//! overrides), deep-merge it, apply the metadata policy, and finally
//! evaluate deferred expressions. Ancestor extraction is memoized in the
//! resolver's cache, except when provenance is tracked: provenance
//! accumulates per resolve pass and cannot be shared across cache
//! consumers.

use crate::cache::ResolutionCache;
use crate::cancellation::Cancellation;
use crate::component::{sections, ComponentDefinition};
use crate::error::{ResolveError, Result};
use crate::expressions::evaluate_deferred;
use crate::inheritance::InheritanceChain;
use crate::metadata::{inheritable_metadata, TYPE_ABSTRACT};
use crate::stack::StackConfig;
use strata_config::{
    fingerprint, merge_layers, ConfigValue, Layer, LayerKind, MergeContext, ProvenanceEntry,
    ProvenanceMap,
};

/// Resolver behavior switches.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Whether ancestors contribute metadata at all.
    ///
    /// When disabled, `metadata` is component-local only; `inherits` is
    /// still always read, since the chain must be known regardless.
    pub inherit_metadata: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            inherit_metadata: true,
        }
    }
}

/// One resolution request.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Component name.
    pub component: String,

    /// Component type (`terraform`, `helmfile`, ...).
    pub component_type: String,

    /// Record per-value provenance for this resolution.
    pub track_provenance: bool,
}

impl ResolveRequest {
    /// Create a request for a component of a type.
    pub fn new(component: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            component_type: component_type.into(),
            track_provenance: false,
        }
    }

    /// Request provenance tracking.
    pub fn with_provenance(mut self) -> Self {
        self.track_provenance = true;
        self
    }
}

/// A fully resolved component configuration.
#[derive(Debug, Clone)]
pub struct ResolvedComponent {
    /// The stack the component was resolved in.
    pub stack: String,

    /// Component name.
    pub component: String,

    /// Component type.
    pub component_type: String,

    /// The resolved configuration tree.
    pub config: ConfigValue,

    /// Inheritance chain, most-specific ancestor first.
    pub inheritance: Vec<String>,

    /// Per-value provenance, when requested.
    pub provenance: Option<ProvenanceMap>,
}

impl ResolvedComponent {
    /// A top-level section of the resolved tree.
    pub fn section(&self, name: &str) -> Option<&ConfigValue> {
        self.config.get(name)
    }

    /// The final, already-scoped `hooks` section.
    pub fn hooks(&self) -> Option<&ConfigValue> {
        self.section(sections::HOOKS)
    }

    /// The resolved `auth` section, merged like any other opaque section.
    pub fn auth(&self) -> Option<&ConfigValue> {
        self.section(sections::AUTH)
    }

    /// The resolved `metadata` section.
    pub fn metadata(&self) -> Option<&ConfigValue> {
        self.section(sections::METADATA)
    }

    /// The resolved backend type, if any.
    pub fn backend_type(&self) -> Option<&str> {
        self.section(sections::BACKEND_TYPE)?.value.as_str()
    }

    /// The backend configuration for the resolved backend type.
    pub fn backend(&self) -> Option<&ConfigValue> {
        self.section(sections::BACKEND)?.get(self.backend_type()?)
    }

    /// Whether the resolved metadata still marks the component abstract.
    ///
    /// Enforcement (refusing to deploy an abstract component) is the
    /// consumer's responsibility; this core only surfaces the value.
    pub fn is_abstract(&self) -> bool {
        self.metadata()
            .and_then(|m| m.get("type"))
            .and_then(|t| t.value.as_str())
            == Some(TYPE_ABSTRACT)
    }
}

/// Resolves component configurations against a stack.
///
/// The resolver is `Sync`: resolving many independent components may share
/// one resolver (and thus one cache) across threads.
#[derive(Debug, Default)]
pub struct Resolver {
    options: ResolveOptions,
    cache: ResolutionCache,
}

impl Resolver {
    /// Create a resolver with default options and a fresh cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with explicit options.
    pub fn with_options(options: ResolveOptions) -> Self {
        Self {
            options,
            cache: ResolutionCache::new(),
        }
    }

    /// The resolver's cache.
    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolve one component configuration.
    pub fn resolve(&self, stack: &StackConfig, request: &ResolveRequest) -> Result<ResolvedComponent> {
        let definition = stack
            .component(&request.component_type, &request.component)
            .ok_or_else(|| ResolveError::ComponentNotFound {
                stack: stack.name().to_string(),
                component: request.component.clone(),
            })?;

        tracing::debug!(
            stack = %stack.name(),
            component = %request.component,
            component_type = %request.component_type,
            provenance = request.track_provenance,
            "Resolving component"
        );

        let graph = stack.inheritance_graph(&request.component_type);
        let chain = graph.linearize(&request.component)?;

        let mut ctx = MergeContext::new();
        if request.track_provenance {
            ctx.track_provenance();
        }

        let layers = self.assemble_layers(stack, request, definition, &chain)?;
        let mut merged = merge_layers(layers, &mut ctx)?;

        self.finalize(definition, &chain, &mut merged, &mut ctx)?;

        Ok(ResolvedComponent {
            stack: stack.name().to_string(),
            component: request.component.clone(),
            component_type: request.component_type.clone(),
            config: merged,
            inheritance: chain.ancestors.iter().rev().cloned().collect(),
            provenance: ctx.into_provenance(),
        })
    }

    /// Resolve every component of every type in the stack.
    ///
    /// Components resolve in deterministic (type, name) order. The
    /// cancellation token is checked between components; there are no
    /// finer-grained cancellation points.
    pub fn resolve_all(
        &self,
        stack: &StackConfig,
        track_provenance: bool,
        cancellation: &Cancellation,
    ) -> Result<Vec<ResolvedComponent>> {
        let mut targets: Vec<(String, String)> = stack
            .component_types()
            .filter_map(|component_type| {
                stack
                    .components_of_type(component_type)
                    .map(|members| (component_type, members))
            })
            .flat_map(|(component_type, members)| {
                members
                    .keys()
                    .map(move |name| (component_type.to_string(), name.clone()))
            })
            .collect();
        targets.sort();

        let mut resolved = Vec::with_capacity(targets.len());
        for (component_type, component) in targets {
            if cancellation.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }

            let mut request = ResolveRequest::new(component, component_type);
            request.track_provenance = track_provenance;
            resolved.push(self.resolve(stack, &request)?);
        }

        Ok(resolved)
    }

    /// Assemble the ordered layer stack, lowest precedence first.
    fn assemble_layers(
        &self,
        stack: &StackConfig,
        request: &ResolveRequest,
        definition: &ComponentDefinition,
        chain: &InheritanceChain,
    ) -> Result<Vec<Layer>> {
        let mut layers = Vec::with_capacity(chain.ancestors.len() + 5);

        layers.push(Layer::new(LayerKind::Global, stack.globals().clone()));

        if let Some(defaults) = stack.type_defaults(&request.component_type) {
            layers.push(Layer::new(LayerKind::TypeDefaults, defaults.clone()));
        }

        for ancestor in &chain.ancestors {
            // Provenance accumulates per resolve pass, so tracked passes
            // bypass the cache entirely.
            let value = if request.track_provenance {
                self.ancestor_layer(stack, &request.component_type, ancestor)?
            } else {
                let key = ResolutionCache::key(stack.name(), &request.component, ancestor);
                let cached = self.cache.get_or_try_insert_with(key, || {
                    self.ancestor_layer(stack, &request.component_type, ancestor)
                })?;
                (*cached).clone()
            };
            layers.push(Layer::new(LayerKind::Ancestor, value));
        }

        let mut own = definition.sections.clone();
        if let Some(raw_metadata) = definition.metadata.raw.clone() {
            if let Some(entries) = own.as_map_mut() {
                entries.insert(sections::METADATA.to_string(), raw_metadata);
            }
        }
        layers.push(Layer::new(LayerKind::Component, own));

        // Overrides, increasing precedence: stack root, type section,
        // component block.
        if let Some(overrides) = stack.stack_overrides() {
            layers.push(Layer::new(LayerKind::Overrides, overrides.clone()));
        }
        if let Some(overrides) = stack.type_overrides(&request.component_type) {
            layers.push(Layer::new(LayerKind::Overrides, overrides.clone()));
        }
        if let Some(overrides) = &definition.overrides {
            layers.push(Layer::new(LayerKind::Overrides, overrides.clone()));
        }

        Ok(layers)
    }

    /// Extract one ancestor's merge layer: its inline sections plus the
    /// inheritable subset of its metadata.
    fn ancestor_layer(
        &self,
        stack: &StackConfig,
        component_type: &str,
        ancestor: &str,
    ) -> Result<ConfigValue> {
        let definition = stack.component(component_type, ancestor).ok_or_else(|| {
            ResolveError::ComponentNotFound {
                stack: stack.name().to_string(),
                component: ancestor.to_string(),
            }
        })?;

        let mut layer = definition.sections.clone();
        if let Some(filtered) =
            inheritable_metadata(definition.metadata.raw.as_ref(), self.options.inherit_metadata)
        {
            if let Some(entries) = layer.as_map_mut() {
                entries.insert(sections::METADATA.to_string(), filtered);
            }
        }

        Ok(layer)
    }

    /// Post-merge steps: derived keys, backend defaulting, deferred
    /// expression evaluation.
    fn finalize(
        &self,
        definition: &ComponentDefinition,
        chain: &InheritanceChain,
        merged: &mut ConfigValue,
        ctx: &mut MergeContext,
    ) -> Result<()> {
        let component_path = definition.component_path().to_string();

        if let Some(entries) = merged.as_map_mut() {
            let path_value = ConfigValue::string(&component_path, definition.source.clone());
            record_synthesized(ctx, sections::COMPONENT, &path_value);
            entries.insert(sections::COMPONENT.to_string(), path_value);

            let chain_values: Vec<ConfigValue> = chain
                .ancestors
                .iter()
                .rev()
                .enumerate()
                .map(|(index, ancestor)| {
                    let value = ConfigValue::string(ancestor, definition.source.clone());
                    record_synthesized(ctx, &format!("{}[{index}]", sections::INHERITANCE), &value);
                    value
                })
                .collect();
            entries.insert(
                sections::INHERITANCE.to_string(),
                ConfigValue::list(chain_values, definition.source.clone()),
            );
        }

        self.default_backend_keys(&component_path, merged, ctx);

        evaluate_deferred(merged, ctx)
    }

    /// Backend defaulting: the s3 backend derives `workspace_key_prefix`
    /// from the physical component path when not set explicitly.
    fn default_backend_keys(
        &self,
        component_path: &str,
        merged: &mut ConfigValue,
        ctx: &mut MergeContext,
    ) {
        let is_s3 = merged
            .get(sections::BACKEND_TYPE)
            .and_then(|t| t.value.as_str())
            == Some("s3");
        if !is_s3 {
            return;
        }

        let source = merged.source.clone();
        let Some(s3) = merged
            .as_map_mut()
            .and_then(|entries| entries.get_mut(sections::BACKEND))
            .and_then(|backend| backend.as_map_mut())
            .and_then(|backends| backends.get_mut("s3"))
            .and_then(|s3| s3.as_map_mut())
        else {
            return;
        };

        if !s3.contains_key("workspace_key_prefix") {
            let prefix = ConfigValue::string(component_path.replace('/', "-"), source);
            record_synthesized(ctx, "backend.s3.workspace_key_prefix", &prefix);
            s3.insert("workspace_key_prefix".to_string(), prefix);
        }
    }
}

/// Record provenance for a value synthesized by the resolver itself.
///
/// Synthesized values are attributed to the component's declaration site at
/// component precedence.
fn record_synthesized(ctx: &mut MergeContext, path: &str, value: &ConfigValue) {
    if !ctx.provenance_enabled() {
        return;
    }

    ctx.record(
        path,
        ProvenanceEntry {
            file: value.source.file.clone(),
            line: value.source.line,
            column: value.source.col,
            layer: LayerKind::Component,
            fingerprint: fingerprint(&value.value),
        },
    );
}
