//! Recursive-descent, one-token-lookahead parser with panic-mode recovery.

use crate::ast::*;
use wendc_lex::{Keyword, Token, TokenKind};
use wendc_util::{DiagnosticBuilder, DiagnosticCode, Span};

/// A syntax diagnostic, already rendered to a human-readable line
/// (expected/found plus position). Built through
/// `wendc_util::DiagnosticBuilder` so every syntax error carries one of the
/// `E_PARSE_*` codes, but keeps its own message format (which embeds
/// "at line L, column C") rather than `Diagnostic::render()`'s.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub code: DiagnosticCode,
}

const SYNCHRONIZERS: &[&str] = &[
    ";", "}", "end", "while", "do", "if", "else", "cin", "cout", "then", "main", "int", "float",
    "bool", "until",
];

fn token_span(tok: &Token) -> Span {
    Span::new(0, 0, tok.line, tok.column)
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self.current(), Some(t) if t.is_keyword(kw))
    }

    fn is_delim(&self, lexeme: &str) -> bool {
        matches!(self.current(), Some(t) if t.kind == TokenKind::Delimiter && t.lexeme == lexeme)
    }

    fn is_lexeme(&self, lexeme: &str) -> bool {
        matches!(self.current(), Some(t) if t.lexeme == lexeme)
    }

    fn last_span(&self) -> Span {
        if self.pos == 0 {
            return Span::point(1, 1);
        }
        match self.tokens.get(self.pos - 1) {
            Some(t) => token_span(t),
            None => Span::point(1, 1),
        }
    }

    fn report_expected(&mut self, expected: &str) {
        match self.current() {
            Some(t) => {
                let message = format!(
                    "expected '{expected}' but found '{}' ({:?}) at line {}, column {}",
                    t.lexeme, t.kind, t.line, t.column
                );
                let diag = DiagnosticBuilder::error(message)
                    .span(Span::point(t.line, t.column))
                    .code(wendc_util::E_PARSE_EXPECTED_TOKEN)
                    .build();
                self.errors.push(SyntaxError {
                    message: diag.message,
                    line: t.line,
                    column: t.column,
                    code: diag.code.unwrap_or(wendc_util::E_PARSE_EXPECTED_TOKEN),
                });
            }
            None => {
                let span = self.last_span();
                let message = format!("unexpected end of input, expected '{expected}'");
                let diag = DiagnosticBuilder::error(message)
                    .span(span)
                    .code(wendc_util::E_PARSE_UNEXPECTED_EOF)
                    .build();
                self.errors.push(SyntaxError {
                    message: diag.message,
                    line: span.line,
                    column: span.column,
                    code: diag.code.unwrap_or(wendc_util::E_PARSE_UNEXPECTED_EOF),
                });
            }
        }
    }

    /// Panic-mode recovery: advance until a synchronizer lexeme is found
    /// (consuming it), or until EOF (stop without consuming).
    fn recover(&mut self) {
        while let Some(t) = self.current() {
            if SYNCHRONIZERS.contains(&t.lexeme.as_str()) {
                self.advance();
                return;
            }
            self.advance();
        }
    }

    /// Matches the current token against a keyword; on mismatch, reports
    /// and recovers. Returns the token's span either way (best-effort).
    fn eat_keyword(&mut self, kw: Keyword) -> Option<Token> {
        if self.is_keyword(kw) {
            self.advance()
        } else {
            self.report_expected(kw.as_str());
            self.recover();
            None
        }
    }

    fn eat_delim(&mut self, lexeme: &str) -> Option<Token> {
        if self.is_delim(lexeme) {
            self.advance()
        } else {
            self.report_expected(lexeme);
            self.recover();
            None
        }
    }

    fn eat_lexeme(&mut self, lexeme: &str) -> Option<Token> {
        if self.is_lexeme(lexeme) {
            self.advance()
        } else {
            self.report_expected(lexeme);
            self.recover();
            None
        }
    }

    fn eat_identifier(&mut self) -> Option<Ident> {
        match self.current() {
            Some(t) if t.kind == TokenKind::Identifier => {
                let tok = self.advance().unwrap();
                Some(Ident {
                    name: tok.lexeme,
                    span: Span::new(0, 0, tok.line, tok.column),
                })
            }
            _ => {
                self.report_expected("identifier");
                self.recover();
                None
            }
        }
    }

    pub fn into_errors(self) -> Vec<SyntaxError> {
        self.errors
    }

    // ---- grammar ----------------------------------------------------

    pub fn parse_program(&mut self) -> Program {
        self.eat_keyword(Keyword::Main);
        self.eat_delim("{");
        let block = self.parse_block(|p| p.is_delim("}") || p.current().is_none());
        self.eat_delim("}");
        Program { block }
    }

    fn is_block_end(&self) -> bool {
        self.is_lexeme("end") || self.is_lexeme("else") || self.is_lexeme("until") || self.is_delim("}")
    }

    fn parse_block(&mut self, stop: impl Fn(&Self) -> bool) -> Block {
        let start = self.last_span();
        let mut items = Vec::new();
        while self.current().is_some() && !stop(self) {
            let is_decl = matches!(
                self.current(),
                Some(t) if t.is_keyword(Keyword::Int)
                    || t.is_keyword(Keyword::Float)
                    || t.is_keyword(Keyword::Bool)
            );
            if is_decl {
                items.push(Item::Decl(self.parse_var_decl()));
            } else {
                match self.parse_stmt() {
                    Some(stmt) => items.push(Item::Stmt(stmt)),
                    None => break,
                }
            }
        }
        Block { items, span: start }
    }

    fn parse_var_decl(&mut self) -> VarDecl {
        let start = self.last_span();
        let ty = match self.current() {
            Some(t) if t.is_keyword(Keyword::Int) => TypeKeyword::Int,
            Some(t) if t.is_keyword(Keyword::Float) => TypeKeyword::Float,
            Some(t) if t.is_keyword(Keyword::Bool) => TypeKeyword::Bool,
            _ => TypeKeyword::Int,
        };
        self.advance();

        let mut names = Vec::new();
        if let Some(id) = self.eat_identifier() {
            names.push(id);
        }
        while self.is_delim(",") {
            self.advance();
            if let Some(id) = self.eat_identifier() {
                names.push(id);
            }
        }
        self.eat_delim(";");
        VarDecl { ty, names, span: start }
    }

    fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.current() {
            Some(t) if t.kind == TokenKind::Identifier => self.parse_assign().map(Stmt::Assign),
            Some(t) if t.is_keyword(Keyword::If) => Some(Stmt::If(self.parse_if())),
            Some(t) if t.is_keyword(Keyword::While) => Some(Stmt::While(self.parse_while())),
            Some(t) if t.is_keyword(Keyword::Do) => Some(Stmt::DoUntil(self.parse_do_until())),
            Some(t) if t.is_keyword(Keyword::Cin) => Some(Stmt::In(self.parse_in())),
            Some(t) if t.is_keyword(Keyword::Cout) => Some(Stmt::Out(self.parse_out())),
            Some(_) => {
                self.report_expected("statement");
                self.recover();
                None
            }
            None => None,
        }
    }

    fn parse_assign(&mut self) -> Option<AssignStmt> {
        let target = self.eat_identifier()?;
        let start = target.span;

        match self.current() {
            Some(t) if t.kind == TokenKind::Assign && (t.lexeme == "++" || t.lexeme == "--") => {
                let op = if t.lexeme == "++" { BinOp::Add } else { BinOp::Sub };
                self.advance();
                self.eat_delim(";");
                let value = Expr::new(
                    ExprKind::Binary {
                        op,
                        left: Box::new(Expr::new(ExprKind::Ident(target.name.clone()), start)),
                        right: Box::new(Expr::new(ExprKind::IntLit(1), start)),
                    },
                    start,
                );
                Some(AssignStmt { target, value, span: start })
            }
            Some(t) if t.kind == TokenKind::Assign && t.lexeme == "=" => {
                self.advance();
                let value = self.parse_expr();
                self.eat_delim(";");
                Some(AssignStmt { target, value, span: start })
            }
            _ => {
                self.report_expected("=");
                self.recover();
                None
            }
        }
    }

    fn parse_if(&mut self) -> IfStmt {
        let start = self.last_span();
        self.eat_keyword(Keyword::If);
        let cond = self.parse_expr();
        self.eat_keyword(Keyword::Then);
        let then_block = self.parse_block(|p| p.is_block_end());
        let else_block = if self.is_lexeme("else") {
            self.advance();
            Some(self.parse_block(|p| p.is_block_end()))
        } else {
            None
        };
        self.eat_keyword(Keyword::End);
        IfStmt { cond, then_block, else_block, span: start }
    }

    fn parse_while(&mut self) -> WhileStmt {
        let start = self.last_span();
        self.eat_keyword(Keyword::While);
        let cond = self.parse_expr();
        let body = self.parse_block(|p| p.is_block_end());
        self.eat_keyword(Keyword::End);
        WhileStmt { cond, body, span: start }
    }

    fn parse_do_until(&mut self) -> DoUntilStmt {
        let start = self.last_span();
        self.eat_keyword(Keyword::Do);
        let body = self.parse_block(|p| p.is_block_end());
        self.eat_keyword(Keyword::Until);
        let cond = self.parse_expr();
        DoUntilStmt { body, cond, span: start }
    }

    fn parse_in(&mut self) -> InStmt {
        let start = self.last_span();
        self.eat_keyword(Keyword::Cin);
        self.eat_lexeme(">>");
        let target = self.eat_identifier().unwrap_or(Ident {
            name: String::new(),
            span: start,
        });
        self.eat_delim(";");
        InStmt { target, span: start }
    }

    fn parse_out(&mut self) -> OutStmt {
        let start = self.last_span();
        self.eat_keyword(Keyword::Cout);
        let mut items = Vec::new();
        let mut saw_one = false;
        while self.is_lexeme("<<") {
            saw_one = true;
            self.advance();
            match self.current() {
                Some(t) if t.kind == TokenKind::StringLit => {
                    let tok = self.advance().unwrap();
                    items.push(OutItem::Str(tok.lexeme));
                }
                _ => {
                    items.push(OutItem::Expr(self.parse_expr()));
                }
            }
        }
        if !saw_one {
            self.report_expected("<<");
        }
        self.eat_delim(";");
        OutStmt { items, span: start }
    }

    // ---- expressions (precedence climbing) ---------------------------

    fn parse_expr(&mut self) -> Expr {
        let mut left = self.parse_expr_rel();
        while let Some(t) = self.current() {
            if t.kind != TokenKind::LogicOp || t.lexeme == "!" {
                break;
            }
            let op = if t.lexeme == "&&" { BinOp::And } else { BinOp::Or };
            let span = token_span(t);
            self.advance();
            let right = self.parse_expr_rel();
            left = Expr::new(
                ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                span,
            );
        }
        left
    }

    fn parse_expr_rel(&mut self) -> Expr {
        let left = self.parse_expr_add();
        if let Some(t) = self.current() {
            if t.kind == TokenKind::RelOp {
                let op = rel_op_from_lexeme(&t.lexeme);
                let span = token_span(t);
                self.advance();
                let right = self.parse_expr_add();
                return Expr::new(
                    ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                    span,
                );
            }
        }
        left
    }

    fn parse_expr_add(&mut self) -> Expr {
        let mut left = self.parse_term();
        loop {
            let matched = match self.current() {
                Some(t) if t.kind == TokenKind::ArithOp && (t.lexeme == "+" || t.lexeme == "-") => {
                    Some((if t.lexeme == "+" { BinOp::Add } else { BinOp::Sub }, token_span(t)))
                }
                _ => None,
            };
            let (op, span) = match matched {
                Some(v) => v,
                None => break,
            };
            self.advance();
            let right = self.parse_term();
            left = Expr::new(
                ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                span,
            );
        }
        left
    }

    fn parse_term(&mut self) -> Expr {
        let mut left = self.parse_factor();
        loop {
            let matched = match self.current() {
                Some(t) if t.kind == TokenKind::ArithOp && matches!(t.lexeme.as_str(), "*" | "/" | "%") => {
                    let op = match t.lexeme.as_str() {
                        "*" => BinOp::Mul,
                        "/" => BinOp::Div,
                        _ => BinOp::Mod,
                    };
                    Some((op, token_span(t)))
                }
                _ => None,
            };
            let (op, span) = match matched {
                Some(v) => v,
                None => break,
            };
            self.advance();
            let right = self.parse_factor();
            left = Expr::new(
                ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                span,
            );
        }
        left
    }

    /// `^` binds right-associatively, implemented as right-recursion
    /// rather than a left-accumulating loop.
    fn parse_factor(&mut self) -> Expr {
        let left = self.parse_component();
        match self.current() {
            Some(t) if t.kind == TokenKind::ArithOp && t.lexeme == "^" => {
                let span = token_span(t);
                self.advance();
                let right = self.parse_factor();
                Expr::new(
                    ExprKind::Binary { op: BinOp::Pow, left: Box::new(left), right: Box::new(right) },
                    span,
                )
            }
            _ => left,
        }
    }

    fn parse_component(&mut self) -> Expr {
        match self.current().cloned() {
            Some(t) if t.kind == TokenKind::Delimiter && t.lexeme == "(" => {
                self.advance();
                let inner = self.parse_expr();
                self.eat_delim(")");
                inner
            }
            Some(t) if t.kind == TokenKind::IntLit => {
                self.advance();
                let span = token_span(&t);
                let value = t.lexeme.parse::<i64>().unwrap_or(0);
                Expr::new(ExprKind::IntLit(value), span)
            }
            Some(t) if t.kind == TokenKind::FloatLit => {
                self.advance();
                let span = token_span(&t);
                let value = t.lexeme.parse::<f64>().unwrap_or(0.0);
                Expr::new(ExprKind::FloatLit(value), span)
            }
            Some(t) if t.kind == TokenKind::Identifier && t.lexeme == "true" => {
                self.advance();
                Expr::new(ExprKind::BoolLit(true), token_span(&t))
            }
            Some(t) if t.kind == TokenKind::Identifier && t.lexeme == "false" => {
                self.advance();
                Expr::new(ExprKind::BoolLit(false), token_span(&t))
            }
            Some(t) if t.kind == TokenKind::Identifier => {
                self.advance();
                Expr::new(ExprKind::Ident(t.lexeme.clone()), token_span(&t))
            }
            Some(t) if t.kind == TokenKind::LogicOp && t.lexeme == "!" => {
                self.advance();
                let span = token_span(&t);
                let operand = self.parse_component();
                Expr::new(ExprKind::Unary { op: UnOp::Not, operand: Box::new(operand) }, span)
            }
            _ => {
                self.report_expected("expression");
                let span = self.last_span();
                Expr::new(ExprKind::IntLit(0), span)
            }
        }
    }
}

fn rel_op_from_lexeme(lexeme: &str) -> BinOp {
    match lexeme {
        "<" => BinOp::Lt,
        "<=" => BinOp::Le,
        ">" => BinOp::Gt,
        ">=" => BinOp::Ge,
        "==" => BinOp::Eq,
        _ => BinOp::Ne,
    }
}

/// Filters `Comment`/`Error` tokens exactly once, then parses. The parser
/// is total: it always returns a `Program`, possibly with partial blocks,
/// plus the syntax-error list.
pub fn parse(tokens: Vec<Token>) -> (Program, Vec<SyntaxError>) {
    let filtered: Vec<Token> = tokens.into_iter().filter(|t| !t.kind.is_trivia()).collect();
    let mut parser = Parser::new(filtered);
    let program = parser.parse_program();
    (program, parser.into_errors())
}
