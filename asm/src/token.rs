use arch::{inst::Inst, op::Opcode, reg};

use crate::number::is_literal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenKind {
    /// Blank line.
    #[default]
    Empty,
    Comment,
    /// A label with no instruction after it.
    Label,
    Instruction,
}

/// The parse result of one source line.
#[derive(Debug, Clone, Default)]
pub struct Token {
    /// 1-based source line number.
    pub line: usize,
    /// Code text before any comment, trimmed.
    pub original: String,
    pub label: Option<String>,
    pub operands: Vec<String>,
    pub op: Option<Opcode>,
    pub kind: TokenKind,
    /// Byte address assigned during the main pass.
    pub address: u32,
    /// Set by the finalizer, patched by address fixup.
    pub inst: Option<Inst>,
}

impl Token {
    pub fn new(line: usize, address: u32) -> Self {
        Token {
            line,
            address,
            ..Default::default()
        }
    }

    pub fn has_label(&self) -> bool {
        self.label.is_some()
    }

    pub fn num_params(&self) -> usize {
        self.operands.len()
    }

    pub fn operand(&self, idx: usize) -> &str {
        self.operands.get(idx).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// Operands that name a label or variable, with their slot index.
    pub fn symbols(&self) -> impl Iterator<Item = (usize, &str)> {
        self.operands
            .iter()
            .enumerate()
            .filter(|(_, s)| is_symbol(s))
            .map(|(idx, s)| (idx, s.as_str()))
    }
}

/// True for operands that are neither registers nor literals.
pub fn is_symbol(s: &str) -> bool {
    !s.is_empty() && !reg::is_reg(s) && !is_literal(s)
}
