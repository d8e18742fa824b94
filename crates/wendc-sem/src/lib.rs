mod analyzer;
mod error;
mod scope;

pub use analyzer::{analyze_semantics, render_annotated_tree, SemanticAnalyzer};
pub use error::SemanticError;
pub use scope::{SymbolTable, SymbolTableEntry};
