//! Scanner for the wendc teaching language: source text -> (tokens, lex errors).

mod cursor;
mod lexer;
mod token;

pub use cursor::Cursor;
pub use lexer::{render_error_table, render_token_table, scan, LexError, LexErrorKind, Lexer};
pub use token::{Keyword, Token, TokenKind};
