//! The scanner: source text -> (tokens, lex errors).

use crate::cursor::Cursor;
use crate::token::{Keyword, Token, TokenKind};
use wendc_util::{DiagnosticBuilder, DiagnosticCode, Span};

/// The fixed set of things the scanner can complain about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    UnrecognizedChar,
    MisplacedDecimal,
    UnterminatedComment,
}

impl LexErrorKind {
    fn code(self) -> DiagnosticCode {
        match self {
            LexErrorKind::UnrecognizedChar => wendc_util::E_LEX_UNRECOGNIZED_CHAR,
            LexErrorKind::MisplacedDecimal => wendc_util::E_LEX_MISPLACED_DECIMAL,
            LexErrorKind::UnterminatedComment => wendc_util::E_LEX_UNTERMINATED_COMMENT,
        }
    }
}

/// A lexical diagnostic: `{line, column, lexeme, description}`.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: u32,
    pub column: u32,
    pub lexeme: String,
    pub description: String,
    pub code: DiagnosticCode,
}

impl LexError {
    fn new(
        kind: LexErrorKind,
        line: u32,
        column: u32,
        lexeme: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let diag = DiagnosticBuilder::error(description)
            .span(Span::point(line, column))
            .code(kind.code())
            .build();
        LexError {
            kind,
            line,
            column,
            lexeme: lexeme.into(),
            description: diag.message,
            code: diag.code.unwrap_or(kind.code()),
        }
    }
}

const TWO_CHAR_OPS: &[(&str, TokenKind)] = &[
    ("==", TokenKind::RelOp),
    ("!=", TokenKind::RelOp),
    ("<=", TokenKind::RelOp),
    (">=", TokenKind::RelOp),
    ("&&", TokenKind::LogicOp),
    ("||", TokenKind::LogicOp),
    ("++", TokenKind::Assign),
    ("--", TokenKind::Assign),
    ("<<", TokenKind::IoOp),
    (">>", TokenKind::IoOp),
];

fn one_char_kind(c: char) -> Option<TokenKind> {
    match c {
        '+' | '-' | '*' | '/' | '%' | '^' => Some(TokenKind::ArithOp),
        '<' | '>' => Some(TokenKind::RelOp),
        '!' => Some(TokenKind::LogicOp),
        '=' => Some(TokenKind::Assign),
        '(' | ')' | '{' | '}' | ',' | ';' => Some(TokenKind::Delimiter),
        _ => None,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Scans one token at a time; mirrors an `Iterator<Item = Token>` ending at
/// EOF so callers may either drive it manually or `collect()` it.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    errors: Vec<LexError>,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            cursor: Cursor::new(source),
            errors: Vec::new(),
            done: false,
        }
    }

    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<LexError> {
        self.errors
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.cursor.current_char(), ' ' | '\t' | '\r' | '\n') {
            self.cursor.advance();
        }
    }

    fn lex_line_comment(&mut self, line: u32, column: u32) -> Token {
        let mut lexeme = String::new();
        while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
            lexeme.push(self.cursor.advance());
        }
        Token::new(lexeme, TokenKind::Comment, line, column)
    }

    fn lex_block_comment(&mut self, line: u32, column: u32) -> Token {
        let mut lexeme = String::new();
        lexeme.push(self.cursor.advance());
        lexeme.push(self.cursor.advance());
        loop {
            if self.cursor.is_at_end() {
                self.errors.push(LexError::new(
                    LexErrorKind::UnterminatedComment,
                    line,
                    column,
                    "/*",
                    "unterminated block comment",
                ));
                return Token::new(lexeme, TokenKind::Comment, line, column);
            }
            if self.cursor.current_char() == '*' && self.cursor.peek_char(1) == '/' {
                lexeme.push(self.cursor.advance());
                lexeme.push(self.cursor.advance());
                return Token::new(lexeme, TokenKind::Comment, line, column);
            }
            lexeme.push(self.cursor.advance());
        }
    }

    /// Produces the next token, or `Token::Eof`-equivalent signalled by
    /// returning `None` from the `Iterator` impl. Comments are emitted as
    /// real `Comment` tokens rather than swallowed here; callers that
    /// don't want them filter on `TokenKind::is_trivia`.
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();

        if self.cursor.is_at_end() {
            return None;
        }

        let line = self.cursor.line();
        let column = self.cursor.column();
        let c = self.cursor.current_char();

        if c == '/' && self.cursor.peek_char(1) == '/' {
            return Some(self.lex_line_comment(line, column));
        }
        if c == '/' && self.cursor.peek_char(1) == '*' {
            return Some(self.lex_block_comment(line, column));
        }

        if c.is_ascii_digit() {
            return Some(self.lex_number(line, column));
        }
        if is_ident_start(c) {
            return Some(self.lex_identifier(line, column));
        }

        for (op, kind) in TWO_CHAR_OPS {
            let mut chars = op.chars();
            let first = chars.next().unwrap();
            let second = chars.next().unwrap();
            if c == first && self.cursor.peek_char(1) == second {
                self.cursor.advance();
                self.cursor.advance();
                return Some(Token::new(*op, *kind, line, column));
            }
        }

        if let Some(kind) = one_char_kind(c) {
            self.cursor.advance();
            return Some(Token::new(c.to_string(), kind, line, column));
        }

        if c == '"' {
            return Some(self.lex_string(line, column));
        }

        self.cursor.advance();
        self.errors.push(LexError::new(
            LexErrorKind::UnrecognizedChar,
            line,
            column,
            c.to_string(),
            format!("unrecognized character '{c}'"),
        ));
        Some(Token::new(c.to_string(), TokenKind::Error, line, column))
    }

    fn lex_number(&mut self, line: u32, column: u32) -> Token {
        let mut lexeme = String::new();
        while self.cursor.current_char().is_ascii_digit() {
            lexeme.push(self.cursor.advance());
        }

        if self.cursor.current_char() == '.' {
            if self.cursor.peek_char(1).is_ascii_digit() {
                lexeme.push(self.cursor.advance());
                while self.cursor.current_char().is_ascii_digit() {
                    lexeme.push(self.cursor.advance());
                }
                return Token::new(lexeme, TokenKind::FloatLit, line, column);
            } else {
                let dot_line = self.cursor.line();
                let dot_col = self.cursor.column();
                let dot = self.cursor.advance();
                self.errors.push(LexError::new(
                    LexErrorKind::MisplacedDecimal,
                    dot_line,
                    dot_col,
                    dot.to_string(),
                    format!("misplaced decimal point: '{dot}'"),
                ));
                return Token::new(lexeme, TokenKind::IntLit, line, column);
            }
        }

        Token::new(lexeme, TokenKind::IntLit, line, column)
    }

    fn lex_identifier(&mut self, line: u32, column: u32) -> Token {
        let mut lexeme = String::new();
        while is_ident_continue(self.cursor.current_char()) {
            lexeme.push(self.cursor.advance());
        }

        let kind = match Keyword::from_lexeme(&lexeme) {
            Some(kw) => TokenKind::Reserved(kw),
            None => TokenKind::Identifier,
        };
        Token::new(lexeme, kind, line, column)
    }

    fn lex_string(&mut self, line: u32, column: u32) -> Token {
        self.cursor.advance();
        let mut lexeme = String::new();
        while !self.cursor.is_at_end() && self.cursor.current_char() != '"' {
            lexeme.push(self.cursor.advance());
        }
        if self.cursor.current_char() == '"' {
            self.cursor.advance();
        }
        Token::new(lexeme, TokenKind::StringLit, line, column)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Some(tok) => Some(tok),
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// Scans `source` to completion, returning every token plus the
/// accumulated lex-error list.
pub fn scan(source: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(source);
    let tokens: Vec<Token> = lexer.by_ref().collect();
    (tokens, lexer.into_errors())
}

/// Tab-separated token table, grounded on `lexical.py`'s
/// `generar_tabla_tokens` (here without that original's always-true filter
/// bug). Renders every token the scanner produced, including `Comment` and
/// `Error` kinds, since trivia filtering is the parser's job, not this
/// table's.
pub fn render_token_table(tokens: &[Token]) -> String {
    let mut out = String::from("lexeme\tkind\tline\tcolumn\n");
    for t in tokens {
        out.push_str(&format!(
            "{}\t{:?}\t{}\t{}\n",
            t.lexeme, t.kind, t.line, t.column
        ));
    }
    out
}

/// Tab-separated error table, grounded on `lexical.py`'s
/// `generar_tabla_errores`.
pub fn render_error_table(errors: &[LexError]) -> String {
    let mut out = String::from("line\tcolumn\tlexeme\tdescription\n");
    for e in errors {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            e.line, e.column, e.lexeme, e.description
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_scan_keywords_and_braces() {
        let (tokens, errors) = scan("main { int x; }");
        assert!(errors.is_empty());
        assert!(tokens[0].is_keyword(Keyword::Main));
        assert_eq!(tokens[1].kind, TokenKind::Delimiter);
        assert!(tokens[2].is_keyword(Keyword::Int));
    }

    #[test]
    fn test_scan_two_char_before_one_char() {
        let (tokens, _) = scan("a <= b");
        assert_eq!(tokens[1].kind, TokenKind::RelOp);
        assert_eq!(tokens[1].lexeme, "<=");
    }

    #[test]
    fn test_scan_io_ops() {
        let (tokens, _) = scan("cin >> x; cout << x;");
        assert_eq!(tokens[1].kind, TokenKind::IoOp);
        assert_eq!(tokens[1].lexeme, ">>");
        let cout_shift = tokens.iter().find(|t| t.lexeme == "<<").unwrap();
        assert_eq!(cout_shift.kind, TokenKind::IoOp);
    }

    #[test]
    fn test_scan_increment_decrement() {
        let (tokens, _) = scan("x++; y--;");
        assert_eq!(tokens[1].kind, TokenKind::Assign);
        assert_eq!(tokens[1].lexeme, "++");
        assert_eq!(tokens[4].lexeme, "--");
    }

    #[test]
    fn test_scan_float_literal() {
        let (tokens, errors) = scan("3.14");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::FloatLit);
        assert_eq!(tokens[0].lexeme, "3.14");
    }

    #[test]
    fn test_scan_misplaced_decimal() {
        let (tokens, errors) = scan("3. ");
        assert_eq!(tokens[0].kind, TokenKind::IntLit);
        assert_eq!(tokens[0].lexeme, "3");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::MisplacedDecimal);
    }

    #[test]
    fn test_scan_line_comment_emits_comment_token() {
        let (tokens, _) = scan("x // trailing\ny");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].lexeme, "x");
        assert_eq!(tokens[1].kind, TokenKind::Comment);
        assert_eq!(tokens[1].lexeme, "// trailing");
        assert_eq!(tokens[2].lexeme, "y");
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn test_scan_unterminated_block_comment() {
        let (_, errors) = scan("/* never closed");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::UnterminatedComment);
    }

    #[test]
    fn test_scan_block_comment_tracks_lines() {
        let (tokens, errors) = scan("/* line1\nline2 */ x");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_scan_unrecognized_char_still_emits_token() {
        let (tokens, errors) = scan("x @ y");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::UnrecognizedChar);
        assert_eq!(kinds(&tokens), vec![
            TokenKind::Identifier,
            TokenKind::Error,
            TokenKind::Identifier
        ]);
    }

    #[test]
    fn test_scan_string_literal() {
        let (tokens, _) = scan("cout << \"hi\";");
        let s = tokens.iter().find(|t| t.kind == TokenKind::StringLit).unwrap();
        assert_eq!(s.lexeme, "hi");
    }

    #[test]
    fn test_render_token_table_includes_error_tokens() {
        let (tokens, _) = scan("x @");
        let table = render_token_table(&tokens);
        assert!(table.contains("Error"));
    }
}
