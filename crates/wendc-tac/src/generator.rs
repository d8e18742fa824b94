//! Lowers an annotated AST to a flat TAC instruction sequence.

use wendc_par::{AssignStmt, Block, DoUntilStmt, Expr, ExprKind, IfStmt, InStmt, Item, OutItem, OutStmt, Program, Stmt, VarDecl, WhileStmt};
use wendc_util::SemValue;

use crate::ir::{TacArg, TacInstruction, TacOp};

pub struct TacGenerator {
    instrs: Vec<TacInstruction>,
    temp_counter: u32,
    label_counter: u32,
}

impl TacGenerator {
    pub fn new() -> Self {
        TacGenerator {
            instrs: Vec::new(),
            temp_counter: 0,
            label_counter: 0,
        }
    }

    pub fn into_instructions(self) -> Vec<TacInstruction> {
        self.instrs
    }

    fn fresh_temp(&mut self) -> String {
        self.temp_counter += 1;
        format!("_t{}", self.temp_counter)
    }

    fn fresh_label(&mut self, hint: &str) -> String {
        self.label_counter += 1;
        format!("{hint}{}", self.label_counter)
    }

    fn emit(&mut self, op: TacOp, arg1: Option<TacArg>, arg2: Option<TacArg>, result: Option<TacArg>) {
        self.instrs.push(TacInstruction { op, arg1, arg2, result });
    }

    pub fn lower_program(&mut self, program: &Program) {
        self.lower_block(&program.block);
    }

    fn lower_block(&mut self, block: &Block) {
        for item in &block.items {
            match item {
                Item::Decl(decl) => self.lower_var_decl(decl),
                Item::Stmt(stmt) => self.lower_stmt(stmt),
            }
        }
    }

    fn lower_var_decl(&mut self, decl: &VarDecl) {
        let ty_name = decl.ty.to_sem_type().to_string();
        for id in &decl.names {
            self.emit(
                TacOp::Declare,
                Some(TacArg::Name(ty_name.clone())),
                None,
                Some(TacArg::Name(id.name.clone())),
            );
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign(a) => self.lower_assign(a),
            Stmt::If(s) => self.lower_if(s),
            Stmt::While(s) => self.lower_while(s),
            Stmt::DoUntil(s) => self.lower_do_until(s),
            Stmt::In(s) => self.lower_in(s),
            Stmt::Out(s) => self.lower_out(s),
        }
    }

    fn lower_assign(&mut self, a: &AssignStmt) {
        let arg = self.lower_expr(&a.value);
        self.emit(TacOp::Assign, Some(arg), None, Some(TacArg::Name(a.target.name.clone())));
    }

    fn lower_if(&mut self, s: &IfStmt) {
        let cond = self.lower_expr(&s.cond);
        let l_else = self.fresh_label("Lelse");
        self.emit(TacOp::IfFalse, Some(cond), None, Some(TacArg::Name(l_else.clone())));
        self.lower_block(&s.then_block);

        match &s.else_block {
            None => {
                self.emit(TacOp::Label, None, None, Some(TacArg::Name(l_else)));
            }
            Some(else_block) => {
                let l_endif = self.fresh_label("Lendif");
                self.emit(TacOp::Goto, None, None, Some(TacArg::Name(l_endif.clone())));
                self.emit(TacOp::Label, None, None, Some(TacArg::Name(l_else)));
                self.lower_block(else_block);
                self.emit(TacOp::Label, None, None, Some(TacArg::Name(l_endif)));
            }
        }
    }

    fn lower_while(&mut self, s: &WhileStmt) {
        let l_while = self.fresh_label("Lwhile");
        self.emit(TacOp::Label, None, None, Some(TacArg::Name(l_while.clone())));
        let cond = self.lower_expr(&s.cond);
        let l_wend = self.fresh_label("Lwend");
        self.emit(TacOp::IfFalse, Some(cond), None, Some(TacArg::Name(l_wend.clone())));
        self.lower_block(&s.body);
        self.emit(TacOp::Goto, None, None, Some(TacArg::Name(l_while)));
        self.emit(TacOp::Label, None, None, Some(TacArg::Name(l_wend)));
    }

    fn lower_do_until(&mut self, s: &DoUntilStmt) {
        let l_do = self.fresh_label("Ldo");
        self.emit(TacOp::Label, None, None, Some(TacArg::Name(l_do.clone())));
        self.lower_block(&s.body);
        let cond = self.lower_expr(&s.cond);
        self.emit(TacOp::IfFalse, Some(cond), None, Some(TacArg::Name(l_do)));
    }

    fn lower_in(&mut self, s: &InStmt) {
        self.emit(TacOp::Input, None, None, Some(TacArg::Name(s.target.name.clone())));
    }

    fn lower_out(&mut self, s: &OutStmt) {
        for item in &s.items {
            let arg = match item {
                OutItem::Str(text) => TacArg::Literal(SemValue::Str(text.clone())),
                OutItem::Expr(e) => self.lower_expr(e),
            };
            self.emit(TacOp::Print, Some(arg), None, None);
        }
        self.emit(TacOp::PrintNl, None, None, None);
    }

    /// Lowers an expression, emitting a fresh temp for each non-trivial
    /// subexpression; literals and identifiers pass through directly.
    fn lower_expr(&mut self, e: &Expr) -> TacArg {
        match &e.kind {
            ExprKind::IntLit(v) => TacArg::Literal(SemValue::Int(*v)),
            ExprKind::FloatLit(v) => TacArg::Literal(SemValue::Float(*v)),
            ExprKind::BoolLit(v) => TacArg::Literal(SemValue::Bool(*v)),
            ExprKind::Ident(name) => TacArg::Name(name.clone()),
            ExprKind::Binary { op, left, right } => {
                let l = self.lower_expr(left);
                let r = self.lower_expr(right);
                let result = self.fresh_temp();
                self.emit(TacOp::from_binop(*op), Some(l), Some(r), Some(TacArg::Name(result.clone())));
                TacArg::Name(result)
            }
            ExprKind::Unary { operand, .. } => {
                let o = self.lower_expr(operand);
                let result = self.fresh_temp();
                self.emit(TacOp::Not, Some(o), None, Some(TacArg::Name(result.clone())));
                TacArg::Name(result)
            }
        }
    }
}

impl Default for TacGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry point: `generateTAC(ast)`.
pub fn generate_tac(program: &Program) -> Vec<TacInstruction> {
    let mut generator = TacGenerator::new();
    generator.lower_program(program);
    generator.into_instructions()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::format_tac;

    fn generate_src(src: &str) -> Vec<TacInstruction> {
        let (tokens, _) = wendc_lex::scan(src);
        let (mut program, _) = wendc_par::parse(tokens);
        wendc_sem::analyze_semantics(&mut program);
        generate_tac(&program)
    }

    #[test]
    fn declaration_and_assignment_scenario() {
        let instrs = generate_src("main { int x; x = 3 + 4; cout << x; }");
        let rendered = format_tac(&instrs);
        assert!(rendered.contains("declare int x"));
        assert!(rendered.contains("_t1 = 3 + 4"));
        assert!(rendered.contains("x = _t1"));
        assert!(rendered.contains("print x"));
        assert!(rendered.contains("print_nl"));
    }

    #[test]
    fn if_else_emits_both_branches_and_shared_endif_label() {
        let instrs = generate_src("main { int a; a = 1; if a < 2 then a = 10; else a = 20; end }");
        let labels: Vec<String> = instrs
            .iter()
            .filter(|i| i.op == crate::ir::TacOp::Label)
            .filter_map(|i| i.result.as_ref().map(|a| a.render()))
            .collect();
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn while_loop_emits_back_edge_to_its_own_label() {
        let instrs = generate_src("main { int i; i = 0; while i < 3 i = i + 1; end }");
        let gotos: Vec<String> = instrs
            .iter()
            .filter(|i| i.op == crate::ir::TacOp::Goto)
            .filter_map(|i| i.result.as_ref().map(|a| a.render()))
            .collect();
        let labels: Vec<String> = instrs
            .iter()
            .filter(|i| i.op == crate::ir::TacOp::Label)
            .filter_map(|i| i.result.as_ref().map(|a| a.render()))
            .collect();
        assert_eq!(gotos.len(), 1);
        assert!(labels.contains(&gotos[0]));
    }

    #[test]
    fn do_until_body_precedes_condition_check() {
        let instrs = generate_src("main { int i; i = 0; do i = i + 1; until i == 2 }");
        let first_op = instrs
            .iter()
            .find(|i| i.op == crate::ir::TacOp::Label)
            .unwrap();
        let label_name = first_op.result.as_ref().unwrap().render();
        let if_false_pos = instrs
            .iter()
            .position(|i| i.op == crate::ir::TacOp::IfFalse && i.result.as_ref().unwrap().render() == label_name)
            .unwrap();
        let label_pos = instrs.iter().position(|i| i.op == crate::ir::TacOp::Label).unwrap();
        assert!(if_false_pos > label_pos);
    }

    #[test]
    fn every_jump_target_label_appears_exactly_once() {
        let instrs = generate_src(
            "main { int a; a = 1; if a < 2 then a = 10; else a = 20; end while a < 5 a = a + 1; end }",
        );
        let mut targets = Vec::new();
        for i in &instrs {
            if i.op == crate::ir::TacOp::Goto || i.op == crate::ir::TacOp::IfFalse {
                targets.push(i.result.as_ref().unwrap().render());
            }
        }
        for target in targets {
            let count = instrs
                .iter()
                .filter(|i| i.op == crate::ir::TacOp::Label && i.result.as_ref().unwrap().render() == target)
                .count();
            assert_eq!(count, 1, "label {target} should appear exactly once");
        }
    }
}
