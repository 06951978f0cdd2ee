/*
 * detect.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Decides which manifest files go through template rendering.

use crate::context::TemplateContext;
use std::path::Path;

/// Check whether the file extension marks a manifest as a template.
///
/// Covers `.tmpl` and the double extensions `.yaml.tmpl` / `.yml.tmpl`.
pub fn is_template_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("tmpl")
}

/// Decide whether a manifest should be rendered as a template.
///
/// Returns true when the extension marks it as a template, or when a
/// non-empty context was supplied for the import, regardless of extension.
/// The latter preserves the legacy behavior where a plain manifest becomes a
/// template the moment a context is attached to its import. An explicit
/// skip flag forces false.
pub fn should_process_as_template(path: &Path, context: Option<&TemplateContext>, skip: bool) -> bool {
    if skip {
        return false;
    }

    is_template_file(path) || context.is_some_and(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TemplateValue;

    fn context() -> TemplateContext {
        let mut ctx = TemplateContext::new();
        ctx.insert("stage", TemplateValue::String("prod".into()));
        ctx
    }

    #[test]
    fn test_template_extensions() {
        assert!(is_template_file(Path::new("catalog/vpc.yaml.tmpl")));
        assert!(is_template_file(Path::new("catalog/vpc.tmpl")));
        assert!(!is_template_file(Path::new("catalog/vpc.yaml")));
    }

    #[test]
    fn test_extension_selects() {
        assert!(should_process_as_template(Path::new("a.yaml.tmpl"), None, false));
    }

    #[test]
    fn test_context_selects_plain_file() {
        let ctx = context();
        assert!(should_process_as_template(Path::new("a.yaml"), Some(&ctx), false));
    }

    #[test]
    fn test_empty_context_does_not_select() {
        let ctx = TemplateContext::new();
        assert!(!should_process_as_template(Path::new("a.yaml"), Some(&ctx), false));
    }

    #[test]
    fn test_skip_forces_false() {
        let ctx = context();
        assert!(!should_process_as_template(Path::new("a.yaml.tmpl"), Some(&ctx), true));
    }

    #[test]
    fn test_plain_file_without_context() {
        assert!(!should_process_as_template(Path::new("a.yaml"), None, false));
    }
}
