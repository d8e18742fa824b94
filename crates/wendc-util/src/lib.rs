//! Shared primitives used by every stage of the wendc pipeline: source
//! spans, diagnostics, and a typed-index vector.

pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod types;

pub use diagnostic::{
    Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level, E_LEX_MISPLACED_DECIMAL,
    E_LEX_UNRECOGNIZED_CHAR, E_LEX_UNTERMINATED_COMMENT, E_PARSE_EXPECTED_TOKEN,
    E_PARSE_UNEXPECTED_EOF, E_RUNTIME_BAD_OPERAND, E_RUNTIME_DIV_BY_ZERO, E_SEM_BAD_OPERAND,
    E_SEM_DIV_BY_ZERO, E_SEM_DUPLICATE_DECL, E_SEM_NON_BOOL_CONDITION, E_SEM_TYPE_MISMATCH,
    E_SEM_UNDECLARED,
};
pub use error::{InternalError, InternalResult};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, Span};
pub use types::{SemType, SemValue};

pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
