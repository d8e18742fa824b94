//! Internal-invariant errors.
//!
//! These are distinct from the four per-stage diagnostic lists (lex/syntax/
//! semantic/runtime) described in the pipeline design: they represent a bug
//! in the pipeline itself (an AST shape a stage was not prepared to handle),
//! not a problem with the user's program, and are the one class of error
//! that is allowed to propagate via `Result` instead of being appended to a
//! diagnostic list.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InternalError {
    #[error("unreachable AST shape in {stage}: {detail}")]
    UnreachableShape { stage: &'static str, detail: String },

    #[error("index {index} out of bounds for {what} (len {len})")]
    IndexOutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

pub type InternalResult<T> = std::result::Result<T, InternalError>;
