//! Diagnostics shared across all four pipeline stages.
//!
//! Two APIs coexist, same as in the rest of this codebase's lineage: a
//! simple one (`Handler::error`/`Handler::warning`) for call sites that just
//! want to record a message and move on, and a fluent builder
//! (`DiagnosticBuilder`) for call sites that want to attach notes/help text.
//! Both end up as a [`Diagnostic`] pushed onto a [`Handler`].

use crate::span::Span;
use std::fmt;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
            Level::Help => "help",
        };
        write!(f, "{word}")
    }
}

/// A stable short code identifying a diagnostic's kind, e.g. `E_LEX_UNRECOGNIZED_CHAR`.
///
/// Kept as a plain `&'static str` rather than an enum: new stages/call sites
/// add codes far more often than anything matches on them exhaustively.
pub type DiagnosticCode = &'static str;

pub const E_LEX_UNRECOGNIZED_CHAR: DiagnosticCode = "E_LEX_UNRECOGNIZED_CHAR";
pub const E_LEX_MISPLACED_DECIMAL: DiagnosticCode = "E_LEX_MISPLACED_DECIMAL";
pub const E_LEX_UNTERMINATED_COMMENT: DiagnosticCode = "E_LEX_UNTERMINATED_COMMENT";

pub const E_PARSE_EXPECTED_TOKEN: DiagnosticCode = "E_PARSE_EXPECTED_TOKEN";
pub const E_PARSE_UNEXPECTED_EOF: DiagnosticCode = "E_PARSE_UNEXPECTED_EOF";

pub const E_SEM_UNDECLARED: DiagnosticCode = "E_SEM_UNDECLARED";
pub const E_SEM_DUPLICATE_DECL: DiagnosticCode = "E_SEM_DUPLICATE_DECL";
pub const E_SEM_TYPE_MISMATCH: DiagnosticCode = "E_SEM_TYPE_MISMATCH";
pub const E_SEM_NON_BOOL_CONDITION: DiagnosticCode = "E_SEM_NON_BOOL_CONDITION";
pub const E_SEM_BAD_OPERAND: DiagnosticCode = "E_SEM_BAD_OPERAND";
pub const E_SEM_DIV_BY_ZERO: DiagnosticCode = "E_SEM_DIV_BY_ZERO";

pub const E_RUNTIME_DIV_BY_ZERO: DiagnosticCode = "E_RUNTIME_DIV_BY_ZERO";
pub const E_RUNTIME_BAD_OPERAND: DiagnosticCode = "E_RUNTIME_BAD_OPERAND";

/// A single diagnostic message attached to a source span.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Span,
    pub code: Option<DiagnosticCode>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            level,
            message: message.into(),
            span,
            code: None,
            notes: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic::new(Level::Error, message, span)
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Diagnostic::new(Level::Warning, message, span)
    }

    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Renders the message the way every stage's diagnostic list is
    /// expected to present it: `"Linea L, columna C: msg"` when the span
    /// carries real position information, the bare message otherwise.
    pub fn render(&self) -> String {
        if self.span.line > 0 || self.span.column > 0 {
            format!(
                "Linea {}, columna {}: {}",
                self.span.line, self.span.column, self.message
            )
        } else {
            self.message.clone()
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Fluent builder for a [`Diagnostic`]; call `.emit(handler)` to record it.
pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    pub fn error(message: impl Into<String>) -> Self {
        DiagnosticBuilder {
            diagnostic: Diagnostic::new(Level::Error, message, Span::DUMMY),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        DiagnosticBuilder {
            diagnostic: Diagnostic::new(Level::Warning, message, Span::DUMMY),
        }
    }

    pub fn span(mut self, span: Span) -> Self {
        self.diagnostic.span = span;
        self
    }

    pub fn code(mut self, code: DiagnosticCode) -> Self {
        self.diagnostic.code = Some(code);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic.notes.push(note.into());
        self
    }

    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }

    pub fn emit(self, handler: &mut Handler) {
        handler.emit(self.diagnostic);
    }
}

/// Accumulates diagnostics for one compile pass of one stage.
#[derive(Debug, Default)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
}

impl Handler {
    pub fn new() -> Self {
        Handler::default()
    }

    pub fn emit(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    /// Simple-API shorthand, used by call sites with nothing to attach.
    pub fn error(&mut self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::error(message, span));
    }

    pub fn warning(&mut self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::warning(message, span));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == Level::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
