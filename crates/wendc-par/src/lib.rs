mod ast;
mod parser;

pub use ast::{
    AssignStmt, BinOp, Block, DoUntilStmt, Expr, ExprKind, Ident, IfStmt, InStmt, Item, OutItem,
    OutStmt, Program, Stmt, TypeKeyword, UnOp, VarDecl, WhileStmt,
};
pub use parser::{parse, Parser, SyntaxError};
