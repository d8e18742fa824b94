//! Session configuration.

use std::path::PathBuf;

/// Which stage's output the caller wants rendered. The pipeline itself
/// always runs to completion (each stage is total and cheap); `Stage`
/// only selects what gets displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Tokens,
    Ast,
    Sem,
    Tac,
    Run,
}

impl Stage {
    pub fn from_name(name: &str) -> Option<Stage> {
        Some(match name {
            "tokens" => Stage::Tokens,
            "ast" => Stage::Ast,
            "sem" => Stage::Sem,
            "tac" => Stage::Tac,
            "run" => Stage::Run,
            _ => return None,
        })
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Run
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub stage: Stage,
    pub verbose: bool,
    /// Pre-supplied answers for `cin`, consumed in order; read from
    /// `--input` when set, otherwise prompted interactively.
    pub input_path: Option<PathBuf>,
}
