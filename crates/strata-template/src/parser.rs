/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template compilation into an interpolation node list.

use crate::error::{TemplateError, TemplateResult};

/// A compiled template.
///
/// Compilation splits the source into literal text runs and `{{ ... }}`
/// interpolations, each carrying the position of its opening delimiter for
/// error reporting.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<TemplateNode>,
}

/// One node of a compiled template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Literal text, emitted verbatim.
    Text(String),

    /// A `{{ ... }}` expression.
    Interpolation(Interpolation),
}

/// A parsed `{{ .dotted.path | default "value" }}` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation {
    /// Dotted path segments, without the leading dot.
    pub path: Vec<String>,

    /// Fallback value when the path does not resolve.
    pub default: Option<String>,

    /// Line of the opening `{{` (1-based).
    pub line: usize,

    /// Column of the opening `{{` (1-based).
    pub col: usize,
}

impl Template {
    /// Compile a template source.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Parse`] for unterminated delimiters and
    /// malformed expressions, with the position of the offending `{{`.
    pub fn compile(source: &str) -> TemplateResult<Template> {
        let mut scanner = Scanner::new(source);
        let mut nodes = Vec::new();
        let mut text = String::new();

        while let Some(c) = scanner.peek() {
            if c == '{' && scanner.peek_second() == Some('{') {
                if !text.is_empty() {
                    nodes.push(TemplateNode::Text(std::mem::take(&mut text)));
                }
                nodes.push(TemplateNode::Interpolation(scanner.expression()?));
            } else {
                text.push(c);
                scanner.bump();
            }
        }

        if !text.is_empty() {
            nodes.push(TemplateNode::Text(text));
        }

        Ok(Template { nodes })
    }

    /// The compiled node list.
    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }

    /// Check whether the template contains any interpolation.
    pub fn has_expressions(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| matches!(n, TemplateNode::Interpolation(_)))
    }
}

/// Character scanner with 1-based line/column tracking.
struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&mut self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>, line: usize, col: usize) -> TemplateError {
        TemplateError::Parse {
            message: message.into(),
            line,
            col,
        }
    }

    /// Parse one `{{ ... }}` expression; the scanner is positioned at `{{`.
    fn expression(&mut self) -> TemplateResult<Interpolation> {
        let line = self.line;
        let col = self.col;

        self.bump();
        self.bump();

        let mut body = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated '{{'", line, col)),
                Some('}') if self.peek_second() == Some('}') => {
                    self.bump();
                    self.bump();
                    break;
                }
                Some(c) => {
                    body.push(c);
                    self.bump();
                }
            }
        }

        parse_expression_body(&body, line, col)
    }
}

/// Parse the text between the delimiters: `.path.to.value [| default X]`.
fn parse_expression_body(body: &str, line: usize, col: usize) -> TemplateResult<Interpolation> {
    let parse_err = |message: String| TemplateError::Parse { message, line, col };

    let (path_part, default) = match body.split_once('|') {
        Some((path, filter)) => (path.trim(), Some(parse_default_filter(filter, line, col)?)),
        None => (body.trim(), None),
    };

    let Some(dotted) = path_part.strip_prefix('.') else {
        return Err(parse_err(format!(
            "expected a '.'-rooted path, found '{}'",
            path_part
        )));
    };

    let segments: Vec<String> = dotted.split('.').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(parse_err(format!("empty path segment in '{}'", path_part)));
    }

    Ok(Interpolation {
        path: segments,
        default,
        line,
        col,
    })
}

/// Parse the `default "value"` filter form.
fn parse_default_filter(filter: &str, line: usize, col: usize) -> TemplateResult<String> {
    let parse_err = |message: String| TemplateError::Parse { message, line, col };

    let rest = filter
        .trim()
        .strip_prefix("default")
        .ok_or_else(|| parse_err(format!("unknown filter '{}'", filter.trim())))?
        .trim();

    let value = if let Some(quoted) = rest.strip_prefix('"') {
        quoted
            .strip_suffix('"')
            .ok_or_else(|| parse_err("unterminated string in default".to_string()))?
    } else if !rest.is_empty() && !rest.contains(char::is_whitespace) {
        rest
    } else {
        return Err(parse_err(format!("invalid default value '{}'", rest)));
    };

    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let template = Template::compile("no expressions here").unwrap();
        assert_eq!(template.nodes().len(), 1);
        assert!(!template.has_expressions());
    }

    #[test]
    fn test_single_interpolation() {
        let template = Template::compile("stage: {{ .vars.stage }}").unwrap();
        assert_eq!(template.nodes().len(), 2);

        let TemplateNode::Interpolation(interp) = &template.nodes()[1] else {
            panic!("expected interpolation");
        };
        assert_eq!(interp.path, vec!["vars", "stage"]);
        assert_eq!(interp.default, None);
    }

    #[test]
    fn test_default_filter() {
        let template = Template::compile("{{ .vars.stage | default \"dev\" }}").unwrap();
        let TemplateNode::Interpolation(interp) = &template.nodes()[0] else {
            panic!("expected interpolation");
        };
        assert_eq!(interp.default.as_deref(), Some("dev"));
    }

    #[test]
    fn test_position_tracking() {
        let template = Template::compile("line one\nname: {{ .name }}").unwrap();
        let TemplateNode::Interpolation(interp) = &template.nodes()[1] else {
            panic!("expected interpolation");
        };
        assert_eq!(interp.line, 2);
        assert_eq!(interp.col, 7);
    }

    #[test]
    fn test_unterminated_expression() {
        let err = Template::compile("broken: {{ .vars.stage").unwrap_err();
        assert!(matches!(err, TemplateError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_path_must_be_dotted() {
        let err = Template::compile("{{ vars.stage }}").unwrap_err();
        assert!(matches!(err, TemplateError::Parse { .. }));
    }

    #[test]
    fn test_empty_segment_rejected() {
        let err = Template::compile("{{ .vars..stage }}").unwrap_err();
        assert!(matches!(err, TemplateError::Parse { .. }));
    }

    #[test]
    fn test_unknown_filter_rejected() {
        let err = Template::compile("{{ .vars.stage | upper }}").unwrap_err();
        assert!(matches!(err, TemplateError::Parse { .. }));
    }
}
