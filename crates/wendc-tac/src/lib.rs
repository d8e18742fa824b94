mod generator;
mod interpreter;
mod ir;

pub use generator::{generate_tac, TacGenerator};
pub use interpreter::{execute, ExecOptions, ExecResult, RuntimeError};
pub use ir::{format_tac, TacArg, TacInstruction, TacOp};
