/*
 * import.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Import resolution for stack manifests.
//!
//! A manifest's `import:` section lists other manifests whose configuration
//! merges underneath it. Entries are either plain paths or structs:
//!
//! ```yaml
//! import:
//!   - mixins/region/us-east-2
//!   - ./_defaults
//!   - path: catalog/vpc.yaml.tmpl
//!     context:
//!       stage: prod
//!     skip_if_missing: true
//! ```
//!
//! Imports resolve depth-first: imported documents come before the
//! importing document in the result, so later documents win when the stack
//! view is assembled. The active import chain doubles as the cycle
//! detector. Reads are plain local filesystem reads; nothing here touches
//! the network.

use crate::document::ConfigDocument;
use crate::error::ImportError;
use crate::expressions::template_value_from_yaml;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use strata_config::MergeContext;
use strata_template::{
    ensure_fully_rendered, should_process_as_template, Template, TemplateContext,
};
use strata_yaml::{parse_file, YamlNode};

/// Loader behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Treat any missing manifest as empty instead of failing.
    ///
    /// Used when resolving against a revision where a newly added manifest
    /// does not exist yet.
    pub ignore_missing_files: bool,
}

/// One parsed `import:` entry.
#[derive(Debug, Clone, Default)]
pub struct ImportDirective {
    /// Stack-relative or `./`-relative manifest path.
    pub path: String,

    /// Template context attached to this import.
    pub context: Option<TemplateContext>,

    /// Skip template rendering for this import.
    pub skip_templates: bool,

    /// Silently skip the import when the manifest does not exist.
    pub skip_if_missing: bool,
}

/// Resolves import directives into an ordered document list.
#[derive(Debug, Clone)]
pub struct ImportLoader {
    base_path: PathBuf,
    options: ImportOptions,
}

impl ImportLoader {
    /// Create a loader rooted at the stacks base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            options: ImportOptions::default(),
        }
    }

    /// Set loader options.
    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Load a manifest and, depth-first, everything it imports.
    ///
    /// `entry` is relative to the base path. Every returned document keeps
    /// per-node source positions; imported documents precede importers.
    pub fn load(&self, entry: &str) -> Result<Vec<ConfigDocument>, ImportError> {
        let mut documents = Vec::new();
        let mut ctx = MergeContext::new();
        self.load_file(entry, None, false, false, &mut ctx, &mut documents)?;
        Ok(documents)
    }

    fn load_file(
        &self,
        relative: &str,
        context: Option<&TemplateContext>,
        skip_templates: bool,
        skip_if_missing: bool,
        ctx: &mut MergeContext,
        documents: &mut Vec<ConfigDocument>,
    ) -> Result<(), ImportError> {
        if ctx.import_chain().iter().any(|file| file == relative) {
            let mut cycle = ctx.import_chain().to_vec();
            cycle.push(relative.to_string());
            return Err(ImportError::Cycle { chain: cycle });
        }

        let full_path = self.base_path.join(relative);
        let content = match fs::read_to_string(&full_path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                if skip_if_missing || self.options.ignore_missing_files {
                    tracing::debug!(file = %relative, "Skipping missing manifest");
                    return Ok(());
                }
                return Err(ImportError::NotFound {
                    path: relative.to_string(),
                    from: ctx.current_file().map(str::to_string),
                });
            }
            Err(error) => {
                return Err(ImportError::Io {
                    path: relative.to_string(),
                    source: error,
                });
            }
        };

        tracing::debug!(file = %relative, depth = ctx.import_chain().len(), "Loading stack manifest");

        let rendered = if should_process_as_template(Path::new(relative), context, skip_templates) {
            self.render_template(relative, &content, context)?
        } else {
            content
        };

        let root = parse_file(&rendered, relative).map_err(|source| ImportError::Parse {
            file: relative.to_string(),
            source,
        })?;

        ctx.enter_file(relative);
        for directive in parse_import_section(&root, relative)? {
            let child = resolve_import_path(relative, &directive.path);
            self.load_file(
                &child,
                directive.context.as_ref(),
                directive.skip_templates,
                directive.skip_if_missing,
                ctx,
                documents,
            )?;
        }
        ctx.leave_file();

        documents.push(ConfigDocument::new(full_path, relative, root));
        Ok(())
    }

    /// Render a manifest selected for templating.
    ///
    /// Rendering failures and surviving expression syntax are both hard
    /// errors; template leakage must never reach the merge stage.
    fn render_template(
        &self,
        relative: &str,
        content: &str,
        context: Option<&TemplateContext>,
    ) -> Result<String, ImportError> {
        let template_error = |source| ImportError::Template {
            file: relative.to_string(),
            source,
        };

        let template = Template::compile(content).map_err(template_error)?;

        let empty = TemplateContext::new();
        let context = context.unwrap_or(&empty);
        let output = template.render(context).map_err(template_error)?;

        ensure_fully_rendered(&output).map_err(template_error)?;
        Ok(output)
    }
}

/// Parse the `import:` section of a manifest.
fn parse_import_section(root: &YamlNode, file: &str) -> Result<Vec<ImportDirective>, ImportError> {
    let invalid = |message: String| ImportError::InvalidEntry {
        file: file.to_string(),
        message,
    };

    let Some(import) = root.get("import") else {
        return Ok(Vec::new());
    };

    let Some(entries) = import.as_sequence() else {
        return Err(invalid("'import' must be a list".into()));
    };

    let mut directives = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(path) = entry.yaml.as_str() {
            if path.is_empty() {
                return Err(invalid("import path must not be empty".into()));
            }
            directives.push(ImportDirective {
                path: path.to_string(),
                ..ImportDirective::default()
            });
            continue;
        }

        if entry.is_mapping() {
            directives.push(parse_import_struct(entry, &invalid)?);
            continue;
        }

        return Err(invalid("import entries must be paths or maps".into()));
    }

    Ok(directives)
}

/// Parse the struct form of an import entry.
fn parse_import_struct(
    entry: &YamlNode,
    invalid: &impl Fn(String) -> ImportError,
) -> Result<ImportDirective, ImportError> {
    let path = entry
        .get("path")
        .and_then(|p| p.yaml.as_str())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| invalid("import entry is missing a 'path'".into()))?
        .to_string();

    let context = match entry.get("context") {
        None => None,
        Some(node) => {
            let Some(pairs) = node.as_mapping() else {
                return Err(invalid(format!("import context for '{path}' must be a map")));
            };
            let mut context = TemplateContext::new();
            for pair in pairs {
                let Some(key) = pair.key.yaml.as_str() else {
                    return Err(invalid(format!(
                        "import context keys for '{path}' must be strings"
                    )));
                };
                context.insert(key, template_value_from_yaml(&pair.value));
            }
            Some(context)
        }
    };

    let flag = |name: &str| {
        entry
            .get(name)
            .and_then(|n| n.yaml.as_bool())
            .unwrap_or(false)
    };

    Ok(ImportDirective {
        path,
        context,
        skip_templates: flag("skip_templates_processing"),
        skip_if_missing: flag("skip_if_missing"),
    })
}

/// Resolve an import path against the importing manifest.
///
/// `./`- and `../`-prefixed paths are relative to the importing file; other
/// paths are relative to the stacks base directory. A missing extension
/// defaults to `.yaml`.
fn resolve_import_path(current: &str, import: &str) -> String {
    let resolved = if import.starts_with("./") || import.starts_with("../") {
        let parent = match current.rfind('/') {
            Some(idx) => &current[..idx],
            None => "",
        };
        normalize_segments(&format!("{parent}/{import}"))
    } else {
        import.to_string()
    };

    if Path::new(&resolved).extension().is_none() {
        format!("{resolved}.yaml")
    } else {
        resolved
    }
}

/// Collapse `.` and `..` segments in a `/`-separated relative path.
fn normalize_segments(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
