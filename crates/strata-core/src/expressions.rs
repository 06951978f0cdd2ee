/*
 * expressions.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Deferred expression evaluation and template value conversion.
//!
//! Embedded expressions merge as opaque [`Value::Expression`] leaves; this
//! module implements phase two of the pipeline: after the layer stack is
//! combined, the merged tree is walked once and every remaining expression
//! is evaluated exactly once against a context built from the merged tree
//! itself. The evaluated scalar replaces the node in place, and the final
//! provenance fingerprint is refreshed to match.

use crate::error::{ResolveError, Result};
use strata_config::{fingerprint, ConfigValue, MergeContext, PathCursor, Value};
use strata_template::{Template, TemplateContext, TemplateValue};
use strata_yaml::YamlNode;
use yaml_rust2::Yaml;

/// Convert a parsed YAML node into a template value.
///
/// Used for `import:` context maps.
pub(crate) fn template_value_from_yaml(node: &YamlNode) -> TemplateValue {
    if let Some(entries) = node.as_mapping() {
        let map = entries
            .iter()
            .filter_map(|entry| {
                entry
                    .key
                    .yaml
                    .as_str()
                    .map(|key| (key.to_string(), template_value_from_yaml(&entry.value)))
            })
            .collect();
        return TemplateValue::Map(map);
    }

    if let Some(items) = node.as_sequence() {
        return TemplateValue::List(items.iter().map(template_value_from_yaml).collect());
    }

    match &node.yaml {
        Yaml::String(s) => TemplateValue::String(s.clone()),
        Yaml::Integer(i) => TemplateValue::Int(*i),
        Yaml::Real(r) => r
            .parse::<f64>()
            .map(TemplateValue::Float)
            .unwrap_or_else(|_| TemplateValue::String(r.clone())),
        Yaml::Boolean(b) => TemplateValue::Bool(*b),
        _ => TemplateValue::Null,
    }
}

/// Convert a configuration value into a template value.
///
/// Unevaluated expressions map to null: an expression referencing another
/// expression's result is unresolvable in a single evaluation pass.
pub(crate) fn template_value_from_config(value: &ConfigValue) -> TemplateValue {
    match &value.value {
        Value::Null | Value::Expression(_) => TemplateValue::Null,
        Value::Bool(b) => TemplateValue::Bool(*b),
        Value::Int(i) => TemplateValue::Int(*i),
        Value::Float(f) => TemplateValue::Float(*f),
        Value::String(s) => TemplateValue::String(s.clone()),
        Value::List(items) => {
            TemplateValue::List(items.iter().map(template_value_from_config).collect())
        }
        Value::Map(entries) => TemplateValue::Map(
            entries
                .iter()
                .map(|(key, child)| (key.clone(), template_value_from_config(child)))
                .collect(),
        ),
    }
}

/// Build the evaluation context from a merged component tree.
///
/// Top-level sections become root bindings, so expressions address merged
/// configuration as `.vars.stage`, `.settings.version`, `.env.REGION`.
pub(crate) fn template_context_from_config(config: &ConfigValue) -> TemplateContext {
    let mut context = TemplateContext::new();
    if let Some(entries) = config.as_map() {
        for (key, value) in entries {
            context.insert(key, template_value_from_config(value));
        }
    }
    context
}

/// Evaluate every remaining expression in a merged tree, in place.
///
/// Each expression is evaluated exactly once; the rendered text is parsed
/// back into a typed scalar. When provenance is tracked, the final entry's
/// fingerprint at the expression's path is refreshed to the evaluated
/// value.
pub(crate) fn evaluate_deferred(config: &mut ConfigValue, ctx: &mut MergeContext) -> Result<()> {
    let context = template_context_from_config(config);
    let mut path = PathCursor::new();
    walk(config, &context, ctx, &mut path)
}

fn walk(
    value: &mut ConfigValue,
    context: &TemplateContext,
    ctx: &mut MergeContext,
    path: &mut PathCursor,
) -> Result<()> {
    if let Value::Expression(raw) = &value.value {
        let expression_error = |source| ResolveError::Expression {
            path: path.as_str().to_string(),
            location: value.source.display(),
            source,
        };

        let rendered = Template::compile(raw)
            .and_then(|template| template.render(context))
            .map_err(expression_error)?;

        let evaluated = Value::from_scalar_str(&rendered);
        if let Some(provenance) = ctx.provenance_mut() {
            provenance.refresh_fingerprint(path.as_str(), fingerprint(&evaluated));
        }
        value.value = evaluated;
        return Ok(());
    }

    match &mut value.value {
        Value::Map(entries) => {
            for (key, child) in entries.iter_mut() {
                path.push_key(key);
                walk(child, context, ctx, path)?;
                path.pop();
            }
        }
        Value::List(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                path.push_index(index);
                walk(item, context, ctx, path)?;
                path.pop();
            }
        }
        _ => {}
    }

    Ok(())
}
