use serde::Serialize;

use crate::lexer::TokenKind;
use crate::EhirError;

/// Byte range `start..end` into the parsed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Maps byte offsets to 1-based line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self { line_starts }
    }

    pub fn position(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Position {
            line: line + 1,
            column: offset - self.line_starts[line] + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    LexError,
    SyntaxError,
    UnsupportedConstruct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticLabel {
    pub message: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub kind: DiagnosticKind,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Vec<TokenKind>>,
    pub labels: Vec<DiagnosticLabel>,
}

impl Diagnostic {
    pub fn error(code: &str, kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            code: code.to_string(),
            kind,
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            span,
            expected: None,
            labels: Vec::new(),
        }
    }

    pub fn warning(
        code: &str,
        kind: DiagnosticKind,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            ..Self::error(code, kind, message, span)
        }
    }

    pub fn with_expected(mut self, expected: Vec<TokenKind>) -> Self {
        self.expected = Some(expected);
        self
    }

    pub fn with_label(mut self, message: impl Into<String>, span: Span) -> Self {
        self.labels.push(DiagnosticLabel {
            message: message.into(),
            span,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

pub fn diagnostics_have_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Serializes diagnostics as pretty-printed JSON for editors and test goldens.
pub fn diagnostics_to_json(diagnostics: &[Diagnostic]) -> Result<String, EhirError> {
    Ok(serde_json::to_string_pretty(diagnostics)?)
}

pub fn render_diagnostics(path: &str, source: &str, diagnostics: &[Diagnostic]) -> String {
    let index = LineIndex::new(source);
    let mut output = String::new();
    for (i, diagnostic) in diagnostics.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&render_diagnostic(path, &index, diagnostic));
    }
    output
}

pub fn render_diagnostic(path: &str, index: &LineIndex, diagnostic: &Diagnostic) -> String {
    let mut output = String::new();
    let start = index.position(diagnostic.span.start);
    let severity = match diagnostic.severity {
        DiagnosticSeverity::Error => "error",
        DiagnosticSeverity::Warning => "warning",
    };
    output.push_str(&format!(
        "{severity}[{}] {}:{}:{} {}\n",
        diagnostic.code, path, start.line, start.column, diagnostic.message
    ));
    if let Some(expected) = &diagnostic.expected {
        let names: Vec<String> = expected.iter().map(|kind| kind.to_string()).collect();
        output.push_str(&format!("  expected: {}\n", names.join(", ")));
    }
    for label in &diagnostic.labels {
        let pos = index.position(label.span.start);
        output.push_str(&format!(
            "  note: {} at {}:{}:{}\n",
            label.message, path, pos.line, pos.column
        ));
    }
    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_index_maps_offsets_to_one_based_positions() {
        let index = LineIndex::new("ab\ncd\n\nx");
        assert_eq!(index.position(0), Position { line: 1, column: 1 });
        assert_eq!(index.position(4), Position { line: 2, column: 2 });
        assert_eq!(index.position(6), Position { line: 3, column: 1 });
        assert_eq!(index.position(7), Position { line: 4, column: 1 });
    }

    #[test]
    fn render_includes_severity_location_and_expected_tokens() {
        let source = "Foo {\n";
        let diag = Diagnostic::error(
            "E1502",
            DiagnosticKind::SyntaxError,
            "unterminated field list",
            Span::empty(6),
        )
        .with_expected(vec![TokenKind::RBrace]);
        let rendered = render_diagnostics("test.ehir", source, &[diag]);
        assert_eq!(
            rendered,
            "error[E1502] test.ehir:2:1 unterminated field list\n  expected: `}`"
        );
    }
}
