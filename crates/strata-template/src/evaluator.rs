/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template evaluation against a context.

use crate::context::{TemplateContext, TemplateValue};
use crate::error::{TemplateError, TemplateResult};
use crate::parser::{Interpolation, Template, TemplateNode};

impl Template {
    /// Render the template against a context.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnresolvedVariable`] when an expression has
    /// no binding and no default, and [`TemplateError::NotAScalar`] when it
    /// resolves to a list or map.
    pub fn render(&self, ctx: &TemplateContext) -> TemplateResult<String> {
        let mut output = String::new();

        for node in self.nodes() {
            match node {
                TemplateNode::Text(text) => output.push_str(text),
                TemplateNode::Interpolation(interp) => {
                    output.push_str(&evaluate(interp, ctx)?);
                }
            }
        }

        Ok(output)
    }
}

/// Evaluate a single interpolation to its scalar text.
fn evaluate(interp: &Interpolation, ctx: &TemplateContext) -> TemplateResult<String> {
    let segments: Vec<&str> = interp.path.iter().map(String::as_str).collect();

    match ctx.get_path(&segments) {
        Some(TemplateValue::String(s)) => Ok(s.clone()),
        Some(TemplateValue::Bool(b)) => Ok(b.to_string()),
        Some(TemplateValue::Int(i)) => Ok(i.to_string()),
        Some(TemplateValue::Float(f)) => Ok(f.to_string()),
        Some(structured @ (TemplateValue::List(_) | TemplateValue::Map(_))) => {
            Err(TemplateError::NotAScalar {
                path: interp.path.join("."),
                kind: structured.kind_name(),
                line: interp.line,
                col: interp.col,
            })
        }
        Some(TemplateValue::Null) | None => match &interp.default {
            Some(default) => Ok(default.clone()),
            None => Err(TemplateError::UnresolvedVariable {
                path: interp.path.join("."),
                line: interp.line,
                col: interp.col,
            }),
        },
    }
}

/// Check that rendered output carries no surviving expression syntax.
///
/// Template leakage must never reach the merge stage: a rendered manifest
/// still containing `{{` fails hard, with the position of the first
/// occurrence.
pub fn ensure_fully_rendered(output: &str) -> TemplateResult<()> {
    let mut line = 1;
    let mut col = 1;
    let mut previous = '\0';

    for c in output.chars() {
        if previous == '{' && c == '{' {
            return Err(TemplateError::UnrenderedExpression { line, col: col - 1 });
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
        previous = c;
    }

    Ok(())
}
