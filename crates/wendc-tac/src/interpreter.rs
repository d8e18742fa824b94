//! A small register machine that executes a TAC instruction vector.

use wendc_util::{DiagnosticBuilder, DiagnosticCode, FxHashMap, SemValue, Span};

use crate::ir::{TacArg, TacInstruction, TacOp};

/// A runtime diagnostic: arithmetic failure or a type-mismatched
/// comparison captured from the host rather than aborting execution.
/// Carries no source span — by the time execution reaches this point the
/// TAC listing no longer tracks it.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub message: String,
    pub code: DiagnosticCode,
}

impl RuntimeError {
    fn new(msg: impl Into<String>) -> Self {
        RuntimeError::coded(wendc_util::E_RUNTIME_BAD_OPERAND, msg)
    }

    fn coded(code: DiagnosticCode, msg: impl Into<String>) -> Self {
        let diag = DiagnosticBuilder::error(msg)
            .span(Span::DUMMY)
            .code(code)
            .build();
        RuntimeError {
            message: diag.message,
            code: diag.code.unwrap_or(code),
        }
    }
}

type OnInput = Box<dyn FnMut() -> Option<String>>;
type OnOutput = Box<dyn FnMut(&str)>;

/// Inputs and callbacks threaded through a single `execute` call.
#[derive(Default)]
pub struct ExecOptions {
    pub inputs: Vec<String>,
    pub on_input: Option<OnInput>,
    pub on_output: Option<OnOutput>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecResult {
    pub output: String,
    pub variables: FxHashMap<String, Option<SemValue>>,
    pub errors: Vec<RuntimeError>,
}

fn truthy(v: &Option<SemValue>) -> bool {
    v.as_ref().map(|v| v.is_truthy()).unwrap_or(false)
}

fn cast_input(raw: &str) -> SemValue {
    match raw.to_ascii_lowercase().as_str() {
        "true" => return SemValue::Bool(true),
        "false" => return SemValue::Bool(false),
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return SemValue::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return SemValue::Float(f);
    }
    SemValue::Str(raw.to_string())
}

struct Interpreter<'a> {
    instrs: &'a [TacInstruction],
    labels: FxHashMap<String, usize>,
    env: FxHashMap<String, Option<SemValue>>,
    pc: usize,
    output: String,
    errors: Vec<RuntimeError>,
    inputs: std::collections::VecDeque<String>,
    on_input: Option<OnInput>,
    on_output: Option<OnOutput>,
}

impl<'a> Interpreter<'a> {
    fn new(instrs: &'a [TacInstruction], opts: ExecOptions) -> Self {
        let mut labels = FxHashMap::default();
        for (i, instr) in instrs.iter().enumerate() {
            if instr.op == TacOp::Label {
                if let Some(TacArg::Name(name)) = &instr.result {
                    labels.insert(name.clone(), i);
                }
            }
        }
        Interpreter {
            instrs,
            labels,
            env: FxHashMap::default(),
            pc: 0,
            output: String::new(),
            errors: Vec::new(),
            inputs: opts.inputs.into(),
            on_input: opts.on_input,
            on_output: opts.on_output,
        }
    }

    fn resolve(&self, arg: &Option<TacArg>) -> Option<SemValue> {
        match arg {
            None => None,
            Some(TacArg::Literal(v)) => Some(v.clone()),
            Some(TacArg::Name(n)) => match self.env.get(n) {
                Some(Some(v)) => Some(v.clone()),
                Some(None) => None,
                None => Some(SemValue::Str(n.clone())),
            },
        }
    }

    fn jump_or_fallthrough(&mut self, label: &str) {
        match self.labels.get(label) {
            Some(&target) => self.pc = target,
            None => self.pc += 1,
        }
    }

    fn emit_output(&mut self, text: &str) {
        self.output.push_str(text);
        if let Some(cb) = &mut self.on_output {
            cb(text);
        }
    }

    fn run(&mut self) {
        while self.pc < self.instrs.len() {
            let instr = self.instrs[self.pc].clone();
            self.step(&instr);
        }
    }

    fn step(&mut self, instr: &TacInstruction) {
        match instr.op {
            TacOp::Declare => {
                if let Some(TacArg::Name(name)) = &instr.result {
                    self.env.entry(name.clone()).or_insert(None);
                }
                self.pc += 1;
            }
            TacOp::Assign => {
                let value = self.resolve(&instr.arg1);
                if let Some(TacArg::Name(name)) = &instr.result {
                    self.env.insert(name.clone(), value);
                }
                self.pc += 1;
            }
            TacOp::Add | TacOp::Sub | TacOp::Mul | TacOp::Div | TacOp::Mod | TacOp::Pow => {
                self.step_arithmetic(instr);
                self.pc += 1;
            }
            TacOp::Lt | TacOp::Le | TacOp::Gt | TacOp::Ge | TacOp::Eq | TacOp::Ne => {
                self.step_relational(instr);
                self.pc += 1;
            }
            TacOp::And | TacOp::Or => {
                let a = self.resolve(&instr.arg1);
                let b = self.resolve(&instr.arg2);
                let result = if instr.op == TacOp::And {
                    truthy(&a) && truthy(&b)
                } else {
                    truthy(&a) || truthy(&b)
                };
                self.store_result(instr, Some(SemValue::Bool(result)));
                self.pc += 1;
            }
            TacOp::Not => {
                let a = self.resolve(&instr.arg1);
                self.store_result(instr, Some(SemValue::Bool(!truthy(&a))));
                self.pc += 1;
            }
            TacOp::Label => {
                self.pc += 1;
            }
            TacOp::Goto => {
                let label = instr.result.as_ref().map(TacArg::render).unwrap_or_default();
                self.jump_or_fallthrough(&label);
            }
            TacOp::IfFalse => {
                let cond = self.resolve(&instr.arg1);
                if !truthy(&cond) {
                    let label = instr.result.as_ref().map(TacArg::render).unwrap_or_default();
                    self.jump_or_fallthrough(&label);
                } else {
                    self.pc += 1;
                }
            }
            TacOp::Input => {
                let raw = self
                    .inputs
                    .pop_front()
                    .or_else(|| self.on_input.as_mut().and_then(|cb| cb()));
                let value = raw.map(|r| cast_input(&r));
                if value.is_none() {
                    self.errors.push(RuntimeError::new("no input available"));
                }
                if let Some(TacArg::Name(name)) = &instr.result {
                    self.env.insert(name.clone(), value);
                }
                self.pc += 1;
            }
            TacOp::Print => {
                let value = self.resolve(&instr.arg1);
                let text = value.map(|v| v.display_string()).unwrap_or_default();
                self.emit_output(&text);
                self.pc += 1;
            }
            TacOp::PrintNl => {
                self.emit_output("\n");
                self.pc += 1;
            }
        }
    }

    fn store_result(&mut self, instr: &TacInstruction, value: Option<SemValue>) {
        if let Some(TacArg::Name(name)) = &instr.result {
            self.env.insert(name.clone(), value);
        }
    }

    fn step_arithmetic(&mut self, instr: &TacInstruction) {
        let a = self.resolve(&instr.arg1);
        let b = self.resolve(&instr.arg2);
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                self.errors.push(RuntimeError::new(format!(
                    "operand for '{}' could not be resolved",
                    instr.op.symbol()
                )));
                self.store_result(instr, None);
                return;
            }
        };

        let both_int = matches!((&a, &b), (SemValue::Int(_), SemValue::Int(_)));
        let result = if both_int || instr.op == TacOp::Mod {
            self.eval_int_arithmetic(instr.op, &a, &b)
        } else {
            self.eval_float_arithmetic(instr.op, &a, &b)
        };
        self.store_result(instr, result);
    }

    /// `int / int` truncates toward zero and `%` is int-only — the same
    /// rule the semantic analyzer applies at fold time, kept consistent
    /// here rather than always widening to float at runtime.
    fn eval_int_arithmetic(&mut self, op: TacOp, a: &SemValue, b: &SemValue) -> Option<SemValue> {
        let (Some(a), Some(b)) = (as_i64(a), as_i64(b)) else {
            self.errors.push(RuntimeError::new("'%' requires integer operands"));
            return None;
        };
        let result = match op {
            TacOp::Add => a.checked_add(b),
            TacOp::Sub => a.checked_sub(b),
            TacOp::Mul => a.checked_mul(b),
            TacOp::Div => {
                if b == 0 {
                    self.errors.push(RuntimeError::coded(
                        wendc_util::E_RUNTIME_DIV_BY_ZERO,
                        "division by zero",
                    ));
                    return None;
                }
                Some(a / b)
            }
            TacOp::Mod => {
                if b == 0 {
                    self.errors.push(RuntimeError::coded(
                        wendc_util::E_RUNTIME_DIV_BY_ZERO,
                        "division by zero",
                    ));
                    return None;
                }
                Some(a % b)
            }
            TacOp::Pow => {
                if b >= 0 {
                    a.checked_pow(b as u32)
                } else {
                    Some(((a as f64).powf(b as f64)) as i64)
                }
            }
            _ => unreachable!("non-arithmetic op reached eval_int_arithmetic"),
        };
        match result {
            Some(v) => Some(SemValue::Int(v)),
            None => {
                self.errors.push(RuntimeError::new("integer overflow"));
                None
            }
        }
    }

    fn eval_float_arithmetic(&mut self, op: TacOp, a: &SemValue, b: &SemValue) -> Option<SemValue> {
        let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) else {
            self.errors.push(RuntimeError::new(format!(
                "operator '{}' requires numeric operands",
                op.symbol()
            )));
            return None;
        };
        let result = match op {
            TacOp::Add => a + b,
            TacOp::Sub => a - b,
            TacOp::Mul => a * b,
            TacOp::Div => {
                if b == 0.0 {
                    self.errors.push(RuntimeError::coded(
                        wendc_util::E_RUNTIME_DIV_BY_ZERO,
                        "division by zero",
                    ));
                    return None;
                }
                a / b
            }
            TacOp::Pow => a.powf(b),
            _ => unreachable!("non-arithmetic op reached eval_float_arithmetic"),
        };
        Some(SemValue::Float(result))
    }

    fn step_relational(&mut self, instr: &TacInstruction) {
        let a = self.resolve(&instr.arg1);
        let b = self.resolve(&instr.arg2);
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                self.errors.push(RuntimeError::new(format!(
                    "operand for '{}' could not be resolved",
                    instr.op.symbol()
                )));
                self.store_result(instr, None);
                return;
            }
        };

        if instr.op == TacOp::Eq || instr.op == TacOp::Ne {
            let equal = if a.type_of() == b.type_of() {
                a == b
            } else {
                match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => x == y,
                    _ => {
                        self.errors.push(RuntimeError::new("type-mismatched comparison"));
                        self.store_result(instr, None);
                        return;
                    }
                }
            };
            let result = if instr.op == TacOp::Eq { equal } else { !equal };
            self.store_result(instr, Some(SemValue::Bool(result)));
            return;
        }

        let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
            self.errors.push(RuntimeError::new("type-mismatched comparison"));
            self.store_result(instr, None);
            return;
        };
        let result = match instr.op {
            TacOp::Lt => x < y,
            TacOp::Le => x <= y,
            TacOp::Gt => x > y,
            TacOp::Ge => x >= y,
            _ => unreachable!("non-relational op reached step_relational"),
        };
        self.store_result(instr, Some(SemValue::Bool(result)));
    }
}

fn as_i64(v: &SemValue) -> Option<i64> {
    match v {
        SemValue::Int(i) => Some(*i),
        _ => None,
    }
}

/// Entry point: `execute(instructions, inputs?, onInput?, onOutput?)`.
pub fn execute(instrs: &[TacInstruction], opts: ExecOptions) -> ExecResult {
    let mut interp = Interpreter::new(instrs, opts);
    interp.run();
    ExecResult {
        output: interp.output,
        variables: interp.env,
        errors: interp.errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_src(src: &str) -> ExecResult {
        let (tokens, _) = wendc_lex::scan(src);
        let (mut program, _) = wendc_par::parse(tokens);
        wendc_sem::analyze_semantics(&mut program);
        let instrs = crate::generator::generate_tac(&program);
        execute(&instrs, ExecOptions::default())
    }

    #[test]
    fn declaration_and_assignment_scenario() {
        let result = run_src("main { int x; x = 3 + 4; cout << x; }");
        assert_eq!(result.output, "7\n");
        assert_eq!(result.variables.get("x"), Some(&Some(SemValue::Int(7))));
        assert!(result.errors.is_empty());
    }

    #[test]
    fn if_else_scenario_executes_then_branch() {
        let result = run_src("main { int a; a = 1; if a < 2 then a = 10; else a = 20; end }");
        assert_eq!(result.variables.get("a"), Some(&Some(SemValue::Int(10))));
    }

    #[test]
    fn while_scenario_runs_three_times() {
        let result = run_src("main { int i; i = 0; while i < 3 i = i + 1; end }");
        assert_eq!(result.variables.get("i"), Some(&Some(SemValue::Int(3))));
    }

    #[test]
    fn do_until_scenario_runs_twice() {
        let result = run_src("main { int i; i = 0; do i = i + 1; until i == 2 }");
        assert_eq!(result.variables.get("i"), Some(&Some(SemValue::Int(2))));
    }

    #[test]
    fn division_by_zero_is_captured_not_fatal() {
        let result = run_src("main { int a; a = 1 / 0; cout << \"done\"; }");
        assert!(!result.errors.is_empty());
        assert_eq!(result.output, "done\n");
    }

    #[test]
    fn runtime_int_division_truncates_same_as_fold_time() {
        let result = run_src("main { int a; a = 7 / 2; }");
        assert_eq!(result.variables.get("a"), Some(&Some(SemValue::Int(3))));
    }

    #[test]
    fn cin_reads_from_preloaded_input_queue() {
        let (tokens, _) = wendc_lex::scan("main { int a; cin >> a; cout << a; }");
        let (mut program, _) = wendc_par::parse(tokens);
        wendc_sem::analyze_semantics(&mut program);
        let instrs = crate::generator::generate_tac(&program);
        let opts = ExecOptions {
            inputs: vec!["42".to_string()],
            ..Default::default()
        };
        let result = execute(&instrs, opts);
        assert_eq!(result.output, "42\n");
    }

    #[test]
    fn boolean_printed_lowercase() {
        let result = run_src("main { bool b; b = true; cout << b; }");
        assert_eq!(result.output, "true\n");
    }
}
