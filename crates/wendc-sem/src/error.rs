//! Semantic diagnostics.

use wendc_util::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Span};

/// A semantic diagnostic, rendered eagerly to `"Linea L, columna C: msg"`
/// when position is known, else the bare message — kept in Spanish, the
/// original diagnostic wording this language's tooling has always used.
/// Built through `wendc_util::Diagnostic` so every semantic error carries
/// one of the `E_SEM_*` codes.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticError {
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub code: DiagnosticCode,
}

impl SemanticError {
    pub fn positioned(line: u32, column: u32, code: DiagnosticCode, msg: impl Into<String>) -> Self {
        let diag = DiagnosticBuilder::error(msg)
            .span(Span::point(line, column))
            .code(code)
            .build();
        SemanticError::from_diagnostic(diag)
    }

    pub fn bare(code: DiagnosticCode, msg: impl Into<String>) -> Self {
        let diag = DiagnosticBuilder::error(msg).code(code).build();
        SemanticError::from_diagnostic(diag)
    }

    fn from_diagnostic(diag: Diagnostic) -> Self {
        let (line, column) = if diag.span.line > 0 || diag.span.column > 0 {
            (Some(diag.span.line), Some(diag.span.column))
        } else {
            (None, None)
        };
        SemanticError {
            message: diag.render(),
            line,
            column,
            code: diag.code.unwrap_or("E_SEM_UNKNOWN"),
        }
    }
}
