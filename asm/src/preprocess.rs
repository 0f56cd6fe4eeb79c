use arch::{
    op::{Opcode, Shape},
    reg::Reg,
};
use tracing::{debug, trace};

use crate::{
    error::{Diag, Error},
    lexer::tokenize,
    token::{is_symbol, Token, TokenKind},
};

/// One line of the preprocessed program and the source line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreLine {
    pub line: usize,
    pub text: String,
}

const SCRATCH: [Reg; 3] = [Reg::T0, Reg::T1, Reg::T2];

/// Rewrite every instruction so that its register slots only hold registers.
///
/// Expansions that overwrite a register the line also reads are reported as warnings.
pub fn preprocess(source: &str) -> (Vec<PreLine>, Vec<Diag>) {
    let mut out = vec![];
    let mut diags = vec![];
    let mut count = 0;
    for (idx, raw) in source.lines().enumerate() {
        count += 1;
        let (lines, warnings) = expand_line(raw);
        if lines.len() > 1 {
            trace!(line = idx + 1, from = raw.trim(), to = ?lines, "expanded");
        }
        diags.extend(
            warnings
                .into_iter()
                .map(|warn| Diag::warn(warn, idx + 1, raw.trim_end())),
        );
        out.extend(lines.into_iter().map(|text| PreLine {
            line: idx + 1,
            text,
        }));
    }
    debug!(source_lines = count, emitted = out.len(), "preprocessed");
    (out, diags)
}

/// Expand one source line into its replacement lines.
pub fn preprocess_line(raw: &str) -> Vec<String> {
    expand_line(raw).0
}

/// Expand one source line, with any scratch register conflicts.
///
/// Blank and comment-only lines vanish. Lines the tokenizer rejects pass
/// through so the main pass reports them.
pub fn expand_line(raw: &str) -> (Vec<String>, Vec<Error>) {
    let (token, errors) = tokenize(raw, 0, 0);
    if !errors.is_empty() {
        return (keep(&token), vec![]);
    }
    match (token.kind, token.op) {
        (TokenKind::Empty | TokenKind::Comment, _) => (vec![], vec![]),
        (TokenKind::Instruction, Some(op)) => expand(&token, op),
        _ => (keep(&token), vec![]),
    }
}

/// Write the intermediate file contents, one line per instruction.
pub fn to_text(lines: &[PreLine]) -> String {
    lines.iter().map(|l| format!("{}\n", l.text)).collect()
}

fn keep(token: &Token) -> Vec<String> {
    if token.is_empty() {
        vec![]
    } else {
        vec![token.original.clone()]
    }
}

// ----------------------------------------------------------------------------
// Expansion

/// Output lines of one expansion. The label goes on the first one.
struct Expansion<'a> {
    label: Option<&'a str>,
    lines: Vec<String>,
    loaded: Vec<Reg>,
    clobbered: Vec<Reg>,
}

impl<'a> Expansion<'a> {
    fn new(token: &'a Token) -> Self {
        Expansion {
            label: token.label.as_deref(),
            lines: vec![],
            loaded: vec![],
            clobbered: vec![],
        }
    }

    fn push(&mut self, text: String) {
        match self.label.take() {
            Some(label) => self.lines.push(format!("{label}: {text}")),
            None => self.lines.push(text),
        }
    }

    fn load(&mut self, reg: Reg, name: &str) {
        self.loaded.push(reg);
        self.push(format!("lw {reg}, {name}"));
    }

    /// The instruction reads `operand`; note it when a load above replaced it.
    fn reads(&mut self, operand: &str) {
        if let Ok(reg) = Reg::parse(operand) {
            if self.loaded.contains(&reg) && !self.clobbered.contains(&reg) {
                self.clobbered.push(reg);
            }
        }
    }

    fn store(&mut self, reg: Reg, name: &str) {
        self.push(format!("sw {reg}, {name}"));
    }
}

fn expand(token: &Token, op: Opcode) -> (Vec<String>, Vec<Error>) {
    let expanded = match op.shape() {
        Shape::ThreeReg => expand_registers(token, op, 3, true),
        Shape::TwoRegValue => expand_registers(token, op, 2, op == Opcode::ADDI),
        Shape::RegOffsetReg => expand_memory(token, op),
        Shape::TwoReg => expand_jump(token),
        Shape::SingleReg => expand_single(token, op),
        Shape::NoArg => None,
    };
    match expanded {
        Some(exp) => (
            exp.lines,
            exp.clobbered.into_iter().map(Error::ScratchClobbered).collect(),
        ),
        None => (keep(token), vec![]),
    }
}

/// Swap symbolic operands among the first `slots` for scratch registers.
/// When `writes_back` is set and the destination was symbolic, store it afterwards.
fn expand_registers<'a>(
    token: &'a Token,
    op: Opcode,
    slots: usize,
    writes_back: bool,
) -> Option<Expansion<'a>> {
    let mut ops = token.operands.clone();
    let mut exp = Expansion::new(token);
    for (idx, scratch) in SCRATCH.iter().enumerate().take(slots.min(ops.len())) {
        if is_symbol(&ops[idx]) {
            exp.load(*scratch, &ops[idx]);
            ops[idx] = scratch.to_string();
        }
    }
    if exp.lines.is_empty() {
        return None;
    }
    // Slot 0 is a source only for `beq`.
    for (idx, operand) in token.operands.iter().enumerate() {
        if !is_symbol(operand) && (idx > 0 || op == Opcode::BEQ) {
            exp.reads(operand);
        }
    }
    exp.push(format!("{} {}", op, ops.join(", ")));
    let dest = token.operand(0);
    if writes_back && is_symbol(dest) {
        exp.store(Reg::T0, dest);
    }
    Some(exp)
}

/// `lw x, m` loads into `$t0` then stores to `x`; `sw x, m` loads `x` first.
fn expand_memory(token: &Token, op: Opcode) -> Option<Expansion<'_>> {
    let var = token.operand(0);
    if !is_symbol(var) || token.num_params() < 2 {
        return None;
    }
    let mem = match token.num_params() {
        3 => format!("{}({})", token.operand(1), token.operand(2)),
        _ => token.operand(1).to_string(),
    };
    let mut exp = Expansion::new(token);
    match op {
        Opcode::LW => {
            exp.push(format!("lw {}, {}", Reg::T0, mem));
            exp.store(Reg::T0, var);
        }
        _ => {
            exp.load(Reg::T0, var);
            exp.reads(token.operand(2));
            exp.push(format!("sw {}, {}", Reg::T0, mem));
        }
    }
    Some(exp)
}

/// `jalr x` jumps through a variable, with the link register defaulting to `$ra`.
fn expand_jump(token: &Token) -> Option<Expansion<'_>> {
    if token.num_params() == 0 || (token.num_params() >= 2 && !is_symbol(token.operand(0))) {
        return None;
    }
    let mut exp = Expansion::new(token);
    let target = match token.operand(0) {
        name if is_symbol(name) => {
            exp.load(Reg::K0, name);
            Reg::K0.to_string()
        }
        reg => reg.to_string(),
    };
    let link = match token.num_params() {
        1 => Reg::RA.to_string(),
        _ => token.operand(1).to_string(),
    };
    exp.push(format!("jalr {target}, {link}"));
    Some(exp)
}

/// `in x` / `out x` go through `$t0`; `in` writes the value back.
fn expand_single(token: &Token, op: Opcode) -> Option<Expansion<'_>> {
    let var = token.operand(0);
    if !is_symbol(var) {
        return None;
    }
    let mut exp = Expansion::new(token);
    exp.load(Reg::T0, var);
    exp.push(format!("{} {}", op, Reg::T0));
    if op == Opcode::IN {
        exp.store(Reg::T0, var);
    }
    Some(exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_moves_to_first_line() {
        assert_eq!(
            preprocess_line("top: in x"),
            vec!["top: lw $t0, x", "in $t0", "sw $t0, x"]
        );
    }

    #[test]
    fn unchanged_lines() {
        assert_eq!(preprocess_line("add $a0, $a1, $a2 ; sum"), vec!["add $a0, $a1, $a2"]);
        assert_eq!(preprocess_line("lw $t0, x"), vec!["lw $t0, x"]);
        assert_eq!(preprocess_line("halt"), vec!["halt"]);
        assert_eq!(preprocess_line("done:"), vec!["done:"]);
        assert!(preprocess_line("   ; comment").is_empty());
        assert!(preprocess_line("").is_empty());
    }

    #[test]
    fn rejected_lines_pass_through() {
        assert_eq!(preprocess_line("mul x, y, z"), vec!["mul x, y, z"]);
    }

    #[test]
    fn addi_writes_back() {
        assert_eq!(
            preprocess_line("addi n, n, -1"),
            vec!["lw $t0, n", "lw $t1, n", "addi $t0, $t1, -1", "sw $t0, n"]
        );
    }

    #[test]
    fn beq_does_not_write_back() {
        assert_eq!(
            preprocess_line("beq x, $zero, done"),
            vec!["lw $t0, x", "beq $t0, $zero, done"]
        );
    }

    #[test]
    fn memory_destination() {
        assert_eq!(
            preprocess_line("lw x, 4($sp)"),
            vec!["lw $t0, 4($sp)", "sw $t0, x"]
        );
        assert_eq!(preprocess_line("sw x, y"), vec!["lw $t0, x", "sw $t0, y"]);
    }

    #[test]
    fn scratch_overwrites_are_reported() {
        let (lines, warnings) = expand_line("add $a0, $t2, x");
        assert_eq!(lines, vec!["lw $t2, x", "add $a0, $t2, $t2"]);
        assert!(matches!(&warnings[..], [Error::ScratchClobbered(Reg::T2)]));

        let (_, warnings) = expand_line("beq x, $t0, done");
        assert!(matches!(&warnings[..], [Error::ScratchClobbered(Reg::T0)]));

        let (_, warnings) = expand_line("sw x, 4($t0)");
        assert!(matches!(&warnings[..], [Error::ScratchClobbered(Reg::T0)]));

        let (_, warnings) = expand_line("addi x, $t0, 1");
        assert!(matches!(&warnings[..], [Error::ScratchClobbered(Reg::T0)]));
    }

    #[test]
    fn scratch_writes_are_fine() {
        assert!(expand_line("add $t1, x, y").1.is_empty());
        assert!(expand_line("add $a0, $t0, x").1.is_empty());
        assert!(expand_line("lw x, 4($t0)").1.is_empty());
    }

    #[test]
    fn warnings_carry_source_line() {
        let (_, diags) = preprocess("halt\nnand $a0, x, $t1\n");
        let found: Vec<_> = diags.iter().map(|d| (d.level, d.line, d.raw.as_str())).collect();
        assert_eq!(found, vec![(crate::Level::Warn, 2, "nand $a0, x, $t1")]);
    }

    #[test]
    fn jump_defaults() {
        assert_eq!(preprocess_line("jalr $a0"), vec!["jalr $a0, $ra"]);
        assert_eq!(preprocess_line("jalr $a0, $s0"), vec!["jalr $a0, $s0"]);
        assert_eq!(preprocess_line("jalr f, $s0"), vec!["lw $k0, f", "jalr $k0, $s0"]);
    }

    #[test]
    fn source_lines_are_tracked() {
        let (pre, diags) = preprocess("; header\n\nout x\nhalt\n");
        assert!(diags.is_empty());
        let lines: Vec<_> = pre.iter().map(|l| (l.line, l.text.as_str())).collect();
        assert_eq!(lines, vec![(3, "lw $t0, x"), (3, "out $t0"), (4, "halt")]);
        assert_eq!(to_text(&pre), "lw $t0, x\nout $t0\nhalt\n");
    }
}
