//! Errors at the session/CLI boundary (file I/O, empty input) — distinct
//! from the four per-stage diagnostic lists the pipeline itself produces.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("failed to read source file {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source file {0} is empty")]
    EmptySource(PathBuf),
}

pub type CompileResult<T> = Result<T, CompileError>;
