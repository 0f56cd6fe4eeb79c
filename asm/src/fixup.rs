use arch::{inst::Inst, reg::Reg, WORD_SIZE};
use tracing::{debug, trace};

use crate::{
    error::{Diag, Error},
    finalize::imm,
    symbol::{SymbolKind, SymbolTable},
    token::{is_symbol, Token},
};

/// Second pass: give every variable a storage word after the code, then patch
/// each symbolic memory reference and branch target.
///
/// Returns the program image (code words, then one zero word per variable).
pub fn fixup(tokens: &mut [Token], symbols: &mut SymbolTable) -> (Vec<u32>, Vec<Diag>) {
    let code_len = tokens.iter().filter(|t| t.op.is_some()).count();
    let base = code_len as u32 * WORD_SIZE;
    let data_len = symbols.place_variables(base, WORD_SIZE);

    let mut diags = vec![];
    let mut patched = 0;
    for token in tokens.iter_mut() {
        match patch(token, symbols) {
            Ok(true) => patched += 1,
            Ok(false) => {}
            Err(err) => diags.push(Diag::error(err, token.line, &token.original)),
        }
    }
    debug!(code_len, data_len, patched, "fixup");

    let image = tokens
        .iter()
        .filter(|t| t.op.is_some())
        .map(|t| t.inst.map(|i| i.to_bin()).unwrap_or(0))
        .chain(std::iter::repeat(0).take(data_len))
        .collect();
    (image, diags)
}

/// Patch one instruction. Returns whether anything was rewritten.
fn patch(token: &mut Token, symbols: &SymbolTable) -> Result<bool, Error> {
    let Some(inst) = token.inst else {
        return Ok(false);
    };
    let patched = match inst {
        Inst::LW(rx, _, _) | Inst::SW(rx, _, _) => {
            let name = token.operand(1);
            if !is_symbol(name) {
                return Ok(false);
            }
            let offset = imm(address_of(symbols, name)? as i64)?;
            match inst {
                Inst::LW(..) => Inst::LW(rx, Reg::FP, offset),
                _ => Inst::SW(rx, Reg::FP, offset),
            }
        }
        Inst::BEQ(rx, ry, _) => {
            let name = token.operand(2);
            if !is_symbol(name) {
                return Ok(false);
            }
            let sym = symbols
                .get(name)
                .ok_or_else(|| Error::UndefinedSymbol(name.to_string()))?;
            let target = match (sym.kind, sym.address) {
                (SymbolKind::Label, Some(addr)) => addr,
                _ => return Err(Error::UndefinedLabel(name.to_string())),
            };
            let next = token.address + WORD_SIZE;
            Inst::BEQ(rx, ry, imm(target as i64 - next as i64)?)
        }
        _ => return Ok(false),
    };
    trace!(line = token.line, address = token.address, ?patched, "patched");
    token.inst = Some(patched);
    Ok(true)
}

fn address_of(symbols: &SymbolTable, name: &str) -> Result<u32, Error> {
    symbols
        .get(name)
        .and_then(|sym| sym.address)
        .ok_or_else(|| Error::UndefinedSymbol(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{finalize::finalize_token, lexer::tokenize};

    fn build(lines: &[&str]) -> (Vec<Token>, SymbolTable) {
        let mut tokens = vec![];
        let mut symbols = SymbolTable::new();
        let mut pc = 0;
        for (idx, line) in lines.iter().enumerate() {
            let (mut token, errors) = tokenize(line, idx + 1, pc);
            assert!(errors.is_empty(), "{errors:?}");
            if let Some(label) = token.label.clone() {
                symbols.insert_label(&label, pc, idx + 1);
            }
            for (_, name) in token.symbols() {
                symbols.insert_variable(name, idx + 1);
            }
            assert!(finalize_token(&mut token).is_ok());
            pc += WORD_SIZE;
            tokens.push(token);
        }
        (tokens, symbols)
    }

    #[test]
    fn memory_reference() {
        let (mut tokens, mut symbols) = build(&["lw $t0, x", "sw $t0, y", "halt"]);
        let (image, diags) = fixup(&mut tokens, &mut symbols);
        assert!(diags.is_empty());
        assert_eq!(tokens[0].inst, Some(Inst::LW(Reg::T0, Reg::FP, 12)));
        assert_eq!(tokens[1].inst, Some(Inst::SW(Reg::T0, Reg::FP, 16)));
        assert_eq!(image.len(), 5);
        assert_eq!(&image[3..], &[0, 0]);
    }

    #[test]
    fn branch_offsets() {
        let (mut tokens, mut symbols) = build(&[
            "top: beq $a0, $zero, done",
            "addi $a0, $a0, -1",
            "beq $zero, $zero, top",
            "done: halt",
        ]);
        let (_, diags) = fixup(&mut tokens, &mut symbols);
        assert!(diags.is_empty());
        assert_eq!(tokens[0].inst, Some(Inst::BEQ(Reg::A0, Reg::ZERO, 8)));
        assert_eq!(tokens[2].inst, Some(Inst::BEQ(Reg::ZERO, Reg::ZERO, -12)));
    }

    #[test]
    fn literal_operands_are_untouched() {
        let (mut tokens, mut symbols) = build(&["lw $t0, 4($sp)", "beq $a0, $a1, -8"]);
        let (_, diags) = fixup(&mut tokens, &mut symbols);
        assert!(diags.is_empty());
        assert_eq!(tokens[0].inst, Some(Inst::LW(Reg::T0, Reg::SP, 4)));
        assert_eq!(tokens[1].inst, Some(Inst::BEQ(Reg::A0, Reg::A1, -8)));
    }

    #[test]
    fn branch_to_variable() {
        let (mut tokens, mut symbols) = build(&["beq $a0, $a1, nowhere"]);
        let (image, diags) = fixup(&mut tokens, &mut symbols);
        assert!(matches!(&diags[..], [d] if matches!(&d.error, Error::UndefinedLabel(n) if n == "nowhere")));
        assert_eq!(image.len(), 2);
    }

    #[test]
    fn out_of_range() {
        let (mut tokens, mut symbols) = build(&["beq $a0, $a1, far", "lw $t0, x", "halt"]);
        symbols.insert_label("far", 0x8_0004, 4);
        symbols.place_variables(0x8_0000, WORD_SIZE);

        let (image, diags) = fixup(&mut tokens, &mut symbols);
        let found: Vec<_> = diags.iter().map(|d| (d.line, &d.error)).collect();
        assert!(matches!(
            &found[..],
            [(1, Error::ImmediateOutOfRange(0x8_0000)), (2, Error::ImmediateOutOfRange(0x8_0000))]
        ));
        assert_eq!(&image[..2], &[0x5340_0000, 0x3600_0000]);
    }
}
