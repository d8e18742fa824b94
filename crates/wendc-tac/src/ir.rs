//! The three-address code instruction format.

use wendc_par::BinOp;
use wendc_util::SemValue;

/// The fixed three-address-code opcode set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TacOp {
    Declare,
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Not,
    Label,
    Goto,
    IfFalse,
    Input,
    Print,
    PrintNl,
}

impl TacOp {
    pub fn symbol(self) -> &'static str {
        match self {
            TacOp::Declare => "declare",
            TacOp::Assign => "=",
            TacOp::Add => "+",
            TacOp::Sub => "-",
            TacOp::Mul => "*",
            TacOp::Div => "/",
            TacOp::Mod => "%",
            TacOp::Pow => "^",
            TacOp::Lt => "<",
            TacOp::Le => "<=",
            TacOp::Gt => ">",
            TacOp::Ge => ">=",
            TacOp::Eq => "==",
            TacOp::Ne => "!=",
            TacOp::And => "&&",
            TacOp::Or => "||",
            TacOp::Not => "!",
            TacOp::Label => "label",
            TacOp::Goto => "goto",
            TacOp::IfFalse => "if_false",
            TacOp::Input => "input",
            TacOp::Print => "print",
            TacOp::PrintNl => "print_nl",
        }
    }

    pub fn from_binop(op: BinOp) -> TacOp {
        match op {
            BinOp::Add => TacOp::Add,
            BinOp::Sub => TacOp::Sub,
            BinOp::Mul => TacOp::Mul,
            BinOp::Div => TacOp::Div,
            BinOp::Mod => TacOp::Mod,
            BinOp::Pow => TacOp::Pow,
            BinOp::Lt => TacOp::Lt,
            BinOp::Le => TacOp::Le,
            BinOp::Gt => TacOp::Gt,
            BinOp::Ge => TacOp::Ge,
            BinOp::Eq => TacOp::Eq,
            BinOp::Ne => TacOp::Ne,
            BinOp::And => TacOp::And,
            BinOp::Or => TacOp::Or,
        }
    }
}

/// A TAC operand, resolved to one of two shapes at construction time
/// instead of re-derived from text shape at interpretation time: a `Name`
/// (identifier, temporary, or label) or an already-typed `Literal`.
#[derive(Debug, Clone, PartialEq)]
pub enum TacArg {
    Name(String),
    Literal(SemValue),
}

impl TacArg {
    pub fn render(&self) -> String {
        match self {
            TacArg::Name(n) => n.clone(),
            TacArg::Literal(SemValue::Str(s)) => format!("\"{s}\""),
            TacArg::Literal(v) => v.display_string(),
        }
    }
}

/// A single quadruple. Fields unused by `op` are left `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct TacInstruction {
    pub op: TacOp,
    pub arg1: Option<TacArg>,
    pub arg2: Option<TacArg>,
    pub result: Option<TacArg>,
}

impl TacInstruction {
    fn render(&self) -> String {
        match self.op {
            TacOp::Declare => format!(
                "declare {} {}",
                self.arg1.as_ref().map(TacArg::render).unwrap_or_default(),
                self.result.as_ref().map(TacArg::render).unwrap_or_default()
            ),
            TacOp::Assign => format!(
                "{} = {}",
                self.result.as_ref().map(TacArg::render).unwrap_or_default(),
                self.arg1.as_ref().map(TacArg::render).unwrap_or_default()
            ),
            TacOp::Not => format!(
                "{} = !{}",
                self.result.as_ref().map(TacArg::render).unwrap_or_default(),
                self.arg1.as_ref().map(TacArg::render).unwrap_or_default()
            ),
            TacOp::Label => format!("{}:", self.result.as_ref().map(TacArg::render).unwrap_or_default()),
            TacOp::Goto => format!("goto {}", self.result.as_ref().map(TacArg::render).unwrap_or_default()),
            TacOp::IfFalse => format!(
                "if_false {} goto {}",
                self.arg1.as_ref().map(TacArg::render).unwrap_or_default(),
                self.result.as_ref().map(TacArg::render).unwrap_or_default()
            ),
            TacOp::Input => format!("input {}", self.result.as_ref().map(TacArg::render).unwrap_or_default()),
            TacOp::Print => format!("print {}", self.arg1.as_ref().map(TacArg::render).unwrap_or_default()),
            TacOp::PrintNl => "print_nl".to_string(),
            _ => format!(
                "{} = {} {} {}",
                self.result.as_ref().map(TacArg::render).unwrap_or_default(),
                self.arg1.as_ref().map(TacArg::render).unwrap_or_default(),
                self.op.symbol(),
                self.arg2.as_ref().map(TacArg::render).unwrap_or_default()
            ),
        }
    }
}

/// Renders a TAC listing: each non-`label` instruction is prefixed
/// `NNN: ` (three-digit zero-padded position); `label` lines render bare
/// as `name:`. An empty listing renders a fixed placeholder.
pub fn format_tac(instrs: &[TacInstruction]) -> String {
    if instrs.is_empty() {
        return "(no intermediate code generated)".to_string();
    }
    let mut out = String::new();
    for (i, instr) in instrs.iter().enumerate() {
        if instr.op == TacOp::Label {
            out.push_str(&instr.render());
        } else {
            out.push_str(&format!("{:03}: {}", i + 1, instr.render()));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_renders_placeholder() {
        assert_eq!(format_tac(&[]), "(no intermediate code generated)");
    }

    #[test]
    fn declare_renders_type_and_name() {
        let instrs = vec![TacInstruction {
            op: TacOp::Declare,
            arg1: Some(TacArg::Name("int".to_string())),
            arg2: None,
            result: Some(TacArg::Name("x".to_string())),
        }];
        assert_eq!(format_tac(&instrs), "001: declare int x\n");
    }

    #[test]
    fn label_renders_without_index_prefix() {
        let instrs = vec![TacInstruction {
            op: TacOp::Label,
            arg1: None,
            arg2: None,
            result: Some(TacArg::Name("Lelse1".to_string())),
        }];
        assert_eq!(format_tac(&instrs), "Lelse1:\n");
    }

    #[test]
    fn arithmetic_renders_infix() {
        let instrs = vec![TacInstruction {
            op: TacOp::Add,
            arg1: Some(TacArg::Literal(SemValue::Int(3))),
            arg2: Some(TacArg::Literal(SemValue::Int(4))),
            result: Some(TacArg::Name("_t1".to_string())),
        }];
        assert_eq!(format_tac(&instrs), "001: _t1 = 3 + 4\n");
    }

    #[test]
    fn string_literal_renders_quoted() {
        let arg = TacArg::Literal(SemValue::Str("hi".to_string()));
        assert_eq!(arg.render(), "\"hi\"");
    }
}
