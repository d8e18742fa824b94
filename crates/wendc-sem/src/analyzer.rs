//! Scope-aware type checker and constant folder.

use wendc_par::{
    AssignStmt, BinOp, Block, DoUntilStmt, Expr, ExprKind, IfStmt, InStmt, Item, OutItem, OutStmt,
    Program, Stmt, UnOp, VarDecl, WhileStmt,
};
use wendc_util::{SemType, SemValue};

use crate::error::SemanticError;
use crate::scope::SymbolTable;

pub struct SemanticAnalyzer {
    table: SymbolTable,
    errors: Vec<SemanticError>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        SemanticAnalyzer {
            table: SymbolTable::new(),
            errors: Vec::new(),
        }
    }

    pub fn analyze(&mut self, program: &mut Program) {
        self.analyze_block(&mut program.block);
    }

    pub fn into_parts(self) -> (SymbolTable, Vec<SemanticError>) {
        (self.table, self.errors)
    }

    fn analyze_block(&mut self, block: &mut Block) {
        for item in &mut block.items {
            match item {
                Item::Decl(decl) => self.analyze_var_decl(decl),
                Item::Stmt(stmt) => self.analyze_stmt(stmt),
            }
        }
    }

    fn analyze_var_decl(&mut self, decl: &VarDecl) {
        let ty = decl.ty.to_sem_type();
        for id in &decl.names {
            if let Err(e) = self.table.declare(&id.name, ty, id.span.line, id.span.column) {
                self.errors.push(e);
            }
        }
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Assign(a) => self.analyze_assign(a),
            Stmt::If(s) => self.analyze_if(s),
            Stmt::While(s) => self.analyze_while(s),
            Stmt::DoUntil(s) => self.analyze_do_until(s),
            Stmt::In(s) => self.analyze_in(s),
            Stmt::Out(s) => self.analyze_out(s),
        }
    }

    fn analyze_assign(&mut self, a: &mut AssignStmt) {
        let rhs_ty = self.analyze_expr(&mut a.value);

        let idx = match self.table.lookup(&a.target.name) {
            Some(idx) => idx,
            None => {
                self.errors.push(SemanticError::positioned(
                    a.target.span.line,
                    a.target.span.column,
                    wendc_util::E_SEM_UNDECLARED,
                    format!("undeclared identifier '{}'", a.target.name),
                ));
                return;
            }
        };
        let target_ty = self.table.entry(idx).ty;

        let Some(rhs_ty) = rhs_ty else {
            self.table.record_use(idx, a.target.span.line, None);
            return;
        };

        if !SemType::assignment_compatible(target_ty, rhs_ty) {
            self.errors.push(SemanticError::positioned(
                a.target.span.line,
                a.target.span.column,
                wendc_util::E_SEM_TYPE_MISMATCH,
                format!(
                    "cannot assign value of type '{rhs_ty}' to '{}' of type '{target_ty}'",
                    a.target.name
                ),
            ));
            self.table.record_use(idx, a.target.span.line, None);
            return;
        }

        let widened = a.value.sem_value.clone().map(|v| widen(v, target_ty));
        self.table.record_use(idx, a.target.span.line, widened);
    }

    fn analyze_if(&mut self, s: &mut IfStmt) {
        self.analyze_expr(&mut s.cond);
        self.check_condition(&s.cond, "if");

        self.table.enter("if_then");
        self.analyze_block(&mut s.then_block);
        self.table.exit();

        if let Some(else_block) = &mut s.else_block {
            self.table.enter("if_else");
            self.analyze_block(else_block);
            self.table.exit();
        }
    }

    fn analyze_while(&mut self, s: &mut WhileStmt) {
        self.analyze_expr(&mut s.cond);
        self.check_condition(&s.cond, "while");

        self.table.enter("while_body");
        self.analyze_block(&mut s.body);
        self.table.exit();
    }

    fn analyze_do_until(&mut self, s: &mut DoUntilStmt) {
        self.table.enter("do_body");
        self.analyze_block(&mut s.body);
        self.table.exit();

        self.analyze_expr(&mut s.cond);
        self.check_condition(&s.cond, "until");
    }

    fn analyze_in(&mut self, s: &InStmt) {
        match self.table.lookup(&s.target.name) {
            Some(idx) => self.table.record_use(idx, s.target.span.line, None),
            None => self.errors.push(SemanticError::positioned(
                s.target.span.line,
                s.target.span.column,
                wendc_util::E_SEM_UNDECLARED,
                format!("undeclared identifier '{}'", s.target.name),
            )),
        }
    }

    fn analyze_out(&mut self, s: &mut OutStmt) {
        for item in &mut s.items {
            if let OutItem::Expr(e) = item {
                self.analyze_expr(e);
            }
        }
    }

    fn check_condition(&mut self, cond: &Expr, context: &str) {
        match cond.sem_type {
            Some(SemType::Bool) => {}
            Some(other) => self.errors.push(SemanticError::positioned(
                cond.span.line,
                cond.span.column,
                wendc_util::E_SEM_NON_BOOL_CONDITION,
                format!("{context} condition must be of type 'bool', found '{other}'"),
            )),
            None => {}
        }
    }

    /// Types (and where possible, folds) an expression node in place,
    /// returning its inferred type if one could be determined.
    fn analyze_expr(&mut self, e: &mut Expr) -> Option<SemType> {
        let (ty, value) = match &mut e.kind {
            ExprKind::IntLit(v) => (Some(SemType::Int), Some(SemValue::Int(*v))),
            ExprKind::FloatLit(v) => (Some(SemType::Float), Some(SemValue::Float(*v))),
            ExprKind::BoolLit(v) => (Some(SemType::Bool), Some(SemValue::Bool(*v))),
            ExprKind::Ident(name) => {
                let line = e.span.line;
                let column = e.span.column;
                match self.table.lookup(name) {
                    Some(idx) => {
                        let entry = self.table.entry(idx);
                        let ty = Some(entry.ty);
                        let value = entry.value.clone();
                        self.table.record_use(idx, line, None);
                        (ty, value)
                    }
                    None => {
                        self.errors.push(SemanticError::positioned(
                            line,
                            column,
                            wendc_util::E_SEM_UNDECLARED,
                            format!("undeclared identifier '{name}'"),
                        ));
                        (None, None)
                    }
                }
            }
            ExprKind::Unary { op, operand } => {
                let operand_ty = self.analyze_expr(operand);
                match op {
                    UnOp::Not => {
                        if !matches!(operand_ty, Some(SemType::Bool)) {
                            self.errors.push(SemanticError::positioned(
                                e.span.line,
                                e.span.column,
                                wendc_util::E_SEM_BAD_OPERAND,
                                "operator '!' requires a 'bool' operand".to_string(),
                            ));
                        }
                        let value = operand
                            .sem_value
                            .as_ref()
                            .map(|v| SemValue::Bool(!v.is_truthy()));
                        (Some(SemType::Bool), value)
                    }
                }
            }
            ExprKind::Binary { op, left, right } => {
                let lty = self.analyze_expr(left);
                let rty = self.analyze_expr(right);
                self.analyze_binary(*op, e.span.line, e.span.column, lty, rty, left, right)
            }
        };
        e.sem_type = ty;
        e.sem_value = value;
        ty
    }

    fn analyze_binary(
        &mut self,
        op: BinOp,
        line: u32,
        column: u32,
        lty: Option<SemType>,
        rty: Option<SemType>,
        left: &Expr,
        right: &Expr,
    ) -> (Option<SemType>, Option<SemValue>) {
        if op.is_arithmetic() {
            return self.analyze_arithmetic(op, line, column, lty, rty, left, right);
        }
        if op.is_relational() {
            return self.analyze_relational(op, line, column, lty, rty, left, right);
        }
        if op.is_logical() {
            return self.analyze_logical(op, line, column, lty, rty, left, right);
        }
        unreachable!("BinOp must be arithmetic, relational, or logical")
    }

    fn analyze_arithmetic(
        &mut self,
        op: BinOp,
        line: u32,
        column: u32,
        lty: Option<SemType>,
        rty: Option<SemType>,
        left: &Expr,
        right: &Expr,
    ) -> (Option<SemType>, Option<SemValue>) {
        let (Some(lty), Some(rty)) = (lty, rty) else {
            return (None, None);
        };

        if op == BinOp::Mod {
            if lty != SemType::Int || rty != SemType::Int {
                self.errors.push(SemanticError::positioned(
                    line,
                    column,
                    wendc_util::E_SEM_BAD_OPERAND,
                    "'%' requires both operands to be 'int'".to_string(),
                ));
                return (None, None);
            }
        } else if !lty.is_numeric() || !rty.is_numeric() {
            self.errors.push(SemanticError::positioned(
                line,
                column,
                wendc_util::E_SEM_BAD_OPERAND,
                format!("operator '{}' requires numeric operands", op.as_str()),
            ));
            return (None, None);
        }

        let result_ty = if lty == SemType::Float || rty == SemType::Float {
            SemType::Float
        } else {
            SemType::Int
        };

        let value = match (&left.sem_value, &right.sem_value) {
            (Some(l), Some(r)) => self.fold_arithmetic(op, result_ty, line, column, l, r),
            _ => None,
        };

        (Some(result_ty), value)
    }

    fn fold_arithmetic(
        &mut self,
        op: BinOp,
        result_ty: SemType,
        line: u32,
        column: u32,
        l: &SemValue,
        r: &SemValue,
    ) -> Option<SemValue> {
        if result_ty == SemType::Int {
            let (a, b) = (as_i64(l)?, as_i64(r)?);
            let result = match op {
                BinOp::Add => a.checked_add(b)?,
                BinOp::Sub => a.checked_sub(b)?,
                BinOp::Mul => a.checked_mul(b)?,
                BinOp::Div => {
                    if b == 0 {
                        self.errors.push(SemanticError::positioned(
                            line,
                            column,
                            wendc_util::E_SEM_DIV_BY_ZERO,
                            "division by zero".to_string(),
                        ));
                        return None;
                    }
                    // Truncation toward zero, matching Rust's integer `/`.
                    a / b
                }
                BinOp::Mod => {
                    if b == 0 {
                        self.errors.push(SemanticError::positioned(
                            line,
                            column,
                            wendc_util::E_SEM_DIV_BY_ZERO,
                            "division by zero".to_string(),
                        ));
                        return None;
                    }
                    a % b
                }
                BinOp::Pow => {
                    if b >= 0 {
                        a.checked_pow(b as u32)?
                    } else {
                        ((a as f64).powf(b as f64)) as i64
                    }
                }
                _ => unreachable!("non-arithmetic op reached fold_arithmetic"),
            };
            Some(SemValue::Int(result))
        } else {
            let (a, b) = (l.as_f64()?, r.as_f64()?);
            let result = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => {
                    if b == 0.0 {
                        self.errors.push(SemanticError::positioned(
                            line,
                            column,
                            wendc_util::E_SEM_DIV_BY_ZERO,
                            "division by zero".to_string(),
                        ));
                        return None;
                    }
                    a / b
                }
                BinOp::Pow => a.powf(b),
                BinOp::Mod => unreachable!("'%' is int-only"),
                _ => unreachable!("non-arithmetic op reached fold_arithmetic"),
            };
            Some(SemValue::Float(result))
        }
    }

    fn analyze_relational(
        &mut self,
        op: BinOp,
        line: u32,
        column: u32,
        lty: Option<SemType>,
        rty: Option<SemType>,
        left: &Expr,
        right: &Expr,
    ) -> (Option<SemType>, Option<SemValue>) {
        let (Some(lty), Some(rty)) = (lty, rty) else {
            return (Some(SemType::Bool), None);
        };

        let ok = if op == BinOp::Eq || op == BinOp::Ne {
            lty == rty || (lty.is_numeric() && rty.is_numeric())
        } else {
            lty.is_numeric() && rty.is_numeric()
        };
        if !ok {
            self.errors.push(SemanticError::positioned(
                line,
                column,
                wendc_util::E_SEM_BAD_OPERAND,
                format!(
                    "operator '{}' is not defined for '{lty}' and '{rty}'",
                    op.as_str()
                ),
            ));
            return (Some(SemType::Bool), None);
        }

        let value = match (&left.sem_value, &right.sem_value) {
            (Some(l), Some(r)) => fold_relational(op, l, r),
            _ => None,
        };
        (Some(SemType::Bool), value)
    }

    fn analyze_logical(
        &mut self,
        op: BinOp,
        line: u32,
        column: u32,
        lty: Option<SemType>,
        rty: Option<SemType>,
        left: &Expr,
        right: &Expr,
    ) -> (Option<SemType>, Option<SemValue>) {
        if lty != Some(SemType::Bool) || rty != Some(SemType::Bool) {
            self.errors.push(SemanticError::positioned(
                line,
                column,
                wendc_util::E_SEM_BAD_OPERAND,
                format!("operator '{}' requires 'bool' operands", op.as_str()),
            ));
            return (Some(SemType::Bool), None);
        }
        let value = match (&left.sem_value, &right.sem_value) {
            (Some(l), Some(r)) => {
                let (a, b) = (l.is_truthy(), r.is_truthy());
                Some(SemValue::Bool(if op == BinOp::And { a && b } else { a || b }))
            }
            _ => None,
        };
        (Some(SemType::Bool), value)
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn as_i64(v: &SemValue) -> Option<i64> {
    match v {
        SemValue::Int(i) => Some(*i),
        _ => None,
    }
}

fn widen(value: SemValue, target: SemType) -> SemValue {
    match (target, &value) {
        (SemType::Float, SemValue::Int(v)) => SemValue::Float(*v as f64),
        _ => value,
    }
}

fn fold_relational(op: BinOp, l: &SemValue, r: &SemValue) -> Option<SemValue> {
    if op == BinOp::Eq || op == BinOp::Ne {
        let equal = if l.type_of() == r.type_of() {
            l == r
        } else {
            l.as_f64()? == r.as_f64()?
        };
        return Some(SemValue::Bool(if op == BinOp::Eq { equal } else { !equal }));
    }
    let (a, b) = (l.as_f64()?, r.as_f64()?);
    let result = match op {
        BinOp::Lt => a < b,
        BinOp::Le => a <= b,
        BinOp::Gt => a > b,
        BinOp::Ge => a >= b,
        _ => unreachable!("non-relational op reached fold_relational"),
    };
    Some(SemValue::Bool(result))
}

/// Entry point: `analyzeSemantics(ast)`. Mutates the AST in place with
/// type/value annotations and returns the populated symbol table plus the
/// semantic-error list.
pub fn analyze_semantics(program: &mut Program) -> (SymbolTable, Vec<SemanticError>) {
    let mut analyzer = SemanticAnalyzer::new();
    analyzer.analyze(program);
    analyzer.into_parts()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_src(src: &str) -> (Program, SymbolTable, Vec<SemanticError>) {
        let (tokens, lex_errors) = wendc_lex::scan(src);
        assert!(lex_errors.is_empty());
        let (mut program, syntax_errors) = wendc_par::parse(tokens);
        assert!(syntax_errors.is_empty(), "unexpected syntax errors: {syntax_errors:?}");
        let (table, errors) = analyze_semantics(&mut program);
        (program, table, errors)
    }

    #[test]
    fn declaration_and_assignment_folds_constant() {
        let (program, table, errors) = analyze_src("main { int x; x = 3 + 4; cout << x; }");
        assert!(errors.is_empty());
        let idx = table.lookup("x").unwrap();
        assert_eq!(table.entry(idx).value, Some(SemValue::Int(7)));
        let _ = program;
    }

    #[test]
    fn if_else_branches_use_distinct_scopes() {
        let (_, table, errors) = analyze_src(
            "main { int a; a = 1; if a < 2 then int b; b = 1; else int b; b = 2; end }",
        );
        assert!(errors.is_empty());
        let scopes: Vec<&str> = table
            .entries()
            .iter()
            .filter(|e| e.name == "b")
            .map(|e| e.scope.as_str())
            .collect();
        assert_eq!(scopes.len(), 2);
        assert_ne!(scopes[0], scopes[1]);
    }

    #[test]
    fn type_mismatch_on_assignment_is_reported() {
        let (_, _, errors) = analyze_src("main { bool b; b = 1 + 2; }");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn duplicate_declaration_in_same_scope_reports_one_error() {
        let (_, _, errors) = analyze_src("main { int x; int x; }");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn undeclared_identifier_is_reported() {
        let (_, _, errors) = analyze_src("main { x = 1; }");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn widening_assignment_converts_int_to_float() {
        let (_, table, errors) = analyze_src("main { float f; f = 3; }");
        assert!(errors.is_empty());
        let idx = table.lookup("f").unwrap();
        assert_eq!(table.entry(idx).value, Some(SemValue::Float(3.0)));
    }

    #[test]
    fn integer_division_truncates_toward_zero() {
        let (_, table, errors) = analyze_src("main { int a; a = 7 / 2; }");
        assert!(errors.is_empty());
        let idx = table.lookup("a").unwrap();
        assert_eq!(table.entry(idx).value, Some(SemValue::Int(3)));
    }

    #[test]
    fn division_by_zero_reports_error_and_clears_value() {
        let (_, table, errors) = analyze_src("main { int a; a = 1 / 0; }");
        assert_eq!(errors.len(), 1);
        let idx = table.lookup("a").unwrap();
        assert_eq!(table.entry(idx).value, None);
    }

    #[test]
    fn non_bool_condition_is_reported() {
        let (_, _, errors) = analyze_src("main { int a; a = 1; if a then a = 2; end }");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn modulo_requires_int_operands() {
        let (_, _, errors) = analyze_src("main { float f; f = 1.5 % 2; }");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn logical_and_folds_when_both_operands_known() {
        let (_, table, errors) = analyze_src("main { bool b; b = true && false; }");
        assert!(errors.is_empty());
        let idx = table.lookup("b").unwrap();
        assert_eq!(table.entry(idx).value, Some(SemValue::Bool(false)));
    }

    #[test]
    fn render_annotated_tree_does_not_panic_on_valid_program() {
        let (program, _, _) = analyze_src("main { int a; a = 1 + 2; cout << a; }");
        let rendered = render_annotated_tree(&program);
        assert!(rendered.contains("bin_op"));
    }
}

/// Recursive pretty-printer of the annotated AST: `kind (value) [ty=.., value=..]`
/// per line, indented by nesting depth.
pub fn render_annotated_tree(program: &Program) -> String {
    let mut out = String::new();
    render_block(&program.block, 0, &mut out);
    out
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn render_block(block: &Block, depth: usize, out: &mut String) {
    for item in &block.items {
        match item {
            Item::Decl(d) => {
                indent(depth, out);
                let names: Vec<&str> = d.names.iter().map(|i| i.name.as_str()).collect();
                out.push_str(&format!("decl {} [{}]\n", d.ty.to_sem_type(), names.join(", ")));
            }
            Item::Stmt(s) => render_stmt(s, depth, out),
        }
    }
}

fn render_stmt(stmt: &Stmt, depth: usize, out: &mut String) {
    indent(depth, out);
    match stmt {
        Stmt::Assign(a) => {
            out.push_str(&format!("assign {} =\n", a.target.name));
            render_expr(&a.value, depth + 1, out);
        }
        Stmt::If(s) => {
            out.push_str("if\n");
            render_expr(&s.cond, depth + 1, out);
            indent(depth, out);
            out.push_str("then\n");
            render_block(&s.then_block, depth + 1, out);
            if let Some(else_block) = &s.else_block {
                indent(depth, out);
                out.push_str("else\n");
                render_block(else_block, depth + 1, out);
            }
        }
        Stmt::While(s) => {
            out.push_str("while\n");
            render_expr(&s.cond, depth + 1, out);
            render_block(&s.body, depth + 1, out);
        }
        Stmt::DoUntil(s) => {
            out.push_str("do\n");
            render_block(&s.body, depth + 1, out);
            indent(depth, out);
            out.push_str("until\n");
            render_expr(&s.cond, depth + 1, out);
        }
        Stmt::In(s) => out.push_str(&format!("cin >> {}\n", s.target.name)),
        Stmt::Out(s) => {
            out.push_str("cout\n");
            for item in &s.items {
                match item {
                    OutItem::Str(text) => {
                        indent(depth + 1, out);
                        out.push_str(&format!("\"{text}\"\n"));
                    }
                    OutItem::Expr(e) => render_expr(e, depth + 1, out),
                }
            }
        }
    }
}

fn render_expr(e: &Expr, depth: usize, out: &mut String) {
    indent(depth, out);
    let ty = e.sem_type.map(|t| t.to_string()).unwrap_or_else(|| "?".to_string());
    let value = e
        .sem_value
        .as_ref()
        .map(|v| v.display_string())
        .unwrap_or_else(|| "?".to_string());
    match &e.kind {
        ExprKind::IntLit(v) => out.push_str(&format!("num_entero({v}) [ty={ty}, value={value}]\n")),
        ExprKind::FloatLit(v) => {
            out.push_str(&format!("num_flotante({v}) [ty={ty}, value={value}]\n"))
        }
        ExprKind::BoolLit(v) => out.push_str(&format!("bool_val({v}) [ty={ty}, value={value}]\n")),
        ExprKind::Ident(name) => out.push_str(&format!("id({name}) [ty={ty}, value={value}]\n")),
        ExprKind::Binary { op, left, right } => {
            out.push_str(&format!("bin_op({}) [ty={ty}, value={value}]\n", op.as_str()));
            render_expr(left, depth + 1, out);
            render_expr(right, depth + 1, out);
        }
        ExprKind::Unary { op, operand } => {
            let sym = match op {
                UnOp::Not => "!",
            };
            out.push_str(&format!("un_op({sym}) [ty={ty}, value={value}]\n"));
            render_expr(operand, depth + 1, out);
        }
    }
}
