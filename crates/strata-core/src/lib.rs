/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Stack component configuration resolution.
//!
//! A **stack** is a named deployment context composed from imported
//! manifests; a **component** is a deployable unit referenced within it.
//! This crate resolves the full configuration a component will use (vars,
//! settings, env, backend, providers, hooks, auth and metadata) by
//! combining partial sources under a deterministic precedence and
//! inheritance model:
//!
//! 1. [`ImportLoader`] resolves `import:` directives into an ordered,
//!    position-annotated document list (cycles detected);
//! 2. [`StackConfig`] assembles the documents into one stack view;
//! 3. [`InheritanceGraph`] computes the component's C3-linearized ancestor
//!    chain from `metadata.inherits`;
//! 4. [`Resolver`] merges the layer stack (global sections, type defaults,
//!    ancestors in chain order, the component itself, overrides), applies
//!    the metadata inheritance policy, evaluates deferred expressions, and
//!    returns a [`ResolvedComponent`] with optional per-value provenance.
//!
//! Isolation between unrelated components is structural: every resolution
//! builds its own layer stack, so configuration never leaks between
//! components that do not inherit from each other.
//!
//! # Example
//!
//! ```rust,no_run
//! use strata_core::{ResolveRequest, Resolver, StackConfig};
//!
//! let stack = StackConfig::load("stacks", "orgs/acme/prod.yaml")?;
//! let resolver = Resolver::new();
//!
//! let vpc = resolver.resolve(&stack, &ResolveRequest::new("vpc", "terraform").with_provenance())?;
//! println!("nat: {:?}", vpc.config.get_path(&["vars", "nat_gateway_enabled"]));
//! # Ok::<(), strata_core::ResolveError>(())
//! ```

mod cache;
mod cancellation;
mod component;
mod document;
mod error;
mod expressions;
mod import;
mod inheritance;
mod metadata;
mod resolve;
mod stack;

pub use cache::ResolutionCache;
pub use cancellation::Cancellation;
pub use component::{sections, ComponentDefinition, ComponentKind, ComponentMetadata};
pub use document::{stack_name_from_path, ConfigDocument};
pub use error::{ImportError, ResolveError, Result};
pub use import::{ImportDirective, ImportLoader, ImportOptions};
pub use inheritance::{InheritanceChain, InheritanceGraph};
pub use metadata::{inheritable_metadata, TYPE_ABSTRACT};
pub use resolve::{ResolveOptions, ResolveRequest, ResolvedComponent, Resolver};
pub use stack::StackConfig;

// Re-exports for downstream convenience
pub use strata_config::{ConfigValue, LayerKind, ProvenanceEntry, ProvenanceMap, Value};
pub use strata_yaml::SourceInfo;
