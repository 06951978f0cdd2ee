/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Expression engine for stack manifest templating.
//!
//! This crate serves two callers:
//!
//! - the import loader, which renders whole manifest files selected by
//!   [`should_process_as_template`] against an import-supplied context;
//! - the resolution pipeline, which evaluates expressions embedded in
//!   configuration values after all merge layers are combined.
//!
//! Supported syntax is `{{ .dotted.path }}` interpolation with an optional
//! default: `{{ .vars.stage | default "dev" }}`. An expression that cannot
//! be resolved is a hard error carrying the expression's line and column;
//! rendered output is additionally checked so no expression syntax ever
//! leaks past the preprocessor.
//!
//! # Architecture
//!
//! The engine is **independent of the configuration value types**. It
//! defines its own [`TemplateValue`] and [`TemplateContext`]; conversion
//! from resolved configuration happens in the consuming layer.
//!
//! # Example
//!
//! ```rust
//! use strata_template::{Template, TemplateContext, TemplateValue};
//!
//! let template = Template::compile("bucket: {{ .vars.stage }}-state").unwrap();
//!
//! let mut vars = TemplateContext::new();
//! vars.insert("vars", TemplateValue::from_entries([("stage", TemplateValue::String("prod".into()))]));
//!
//! assert_eq!(template.render(&vars).unwrap(), "bucket: prod-state");
//! ```

mod context;
mod detect;
mod error;
mod evaluator;
mod parser;

pub use context::{TemplateContext, TemplateValue};
pub use detect::{is_template_file, should_process_as_template};
pub use error::{TemplateError, TemplateResult};
pub use evaluator::ensure_fully_rendered;
pub use parser::{Interpolation, Template, TemplateNode};
