use arch::{
    format::fits_imm,
    inst::Inst,
    op::Opcode,
    reg::{self, Reg},
};

use crate::{error::Error, number::parse_number, token::is_symbol, token::Token};

/// Fill in the instruction fields of a tokenized line.
///
/// Symbolic memory references (`lw`/`sw` offset, `beq` target) encode as 0
/// here and are patched by address fixup.
pub fn finalize(op: Opcode, operands: &[String]) -> Result<Inst, Error> {
    let found = operands.len();
    let arity = op.arity();
    if found > *arity.end() {
        return Err(Error::TooManyOperands(op));
    }
    if found < *arity.start() || operands.iter().any(|s| s.is_empty()) {
        let expected = if arity.start() == arity.end() {
            arity.start().to_string()
        } else {
            format!("{} or {}", arity.start(), arity.end())
        };
        return Err(Error::MissingOperand {
            op,
            expected,
            found: operands.iter().filter(|s| !s.is_empty()).count(),
        });
    }

    // Get operand by index and resolve it as a field.
    let arg = |idx: usize| operands[idx].as_str();

    Ok(match op {
        Opcode::ADD => Inst::ADD(register(arg(0))?, register(arg(1))?, register(arg(2))?),
        Opcode::NAND => Inst::NAND(register(arg(0))?, register(arg(1))?, register(arg(2))?),
        Opcode::ADDI => Inst::ADDI(register(arg(0))?, register(arg(1))?, literal(arg(2))?),
        Opcode::BEQ => Inst::BEQ(register(arg(0))?, register(arg(1))?, reference(arg(2))?),
        Opcode::LW | Opcode::SW => {
            let rx = register(arg(0))?;
            let base = match found {
                3 => register(arg(2))?,
                _ => Reg::ZERO,
            };
            let offset = reference(arg(1))?;
            match op {
                Opcode::LW => Inst::LW(rx, base, offset),
                _ => Inst::SW(rx, base, offset),
            }
        }
        Opcode::JALR => Inst::JALR(register(arg(0))?, register(arg(1))?),
        Opcode::IN => Inst::IN(register(arg(0))?),
        Opcode::OUT => Inst::OUT(register(arg(0))?),
        Opcode::HALT => Inst::HALT(),
    })
}

/// Finalize in place. Comments and blank lines are left alone.
pub fn finalize_token(token: &mut Token) -> Result<(), Error> {
    if let Some(op) = token.op {
        token.inst = Some(finalize(op, &token.operands)?);
    }
    Ok(())
}

fn register(s: &str) -> Result<Reg, Error> {
    if !reg::is_reg(s) {
        return Err(Error::ExpectedRegister(s.to_string()));
    }
    Reg::parse(s).map_err(|_| Error::UnknownRegister(s.to_string()))
}

fn literal(s: &str) -> Result<i32, Error> {
    if is_symbol(s) {
        return Err(Error::SymbolicImmediate(s.to_string()));
    }
    imm(parse_number(s)?)
}

fn reference(s: &str) -> Result<i32, Error> {
    if is_symbol(s) {
        Ok(0)
    } else {
        imm(parse_number(s)?)
    }
}

pub fn imm(value: i64) -> Result<i32, Error> {
    if fits_imm(value) {
        Ok(value as i32)
    } else {
        Err(Error::ImmediateOutOfRange(value))
    }
}
