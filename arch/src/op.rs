use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TryFromPrimitive,
    IntoPrimitive,
    EnumString,
    EnumIter,
    Display,
)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Opcode {
    ADD,
    NAND,
    ADDI,
    LW,
    SW,
    BEQ,
    JALR,
    HALT,
    IN,
    OUT,
}

impl Opcode {
    /// Look up a mnemonic. Mnemonics are case-sensitive lowercase.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.parse::<Self>() {
            Ok(op) => Ok(op),
            Err(_) => Err(format!("Undefined Op: {s}")),
        }
    }
}

/// How the operand list of an instruction is written in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `op rx, ry, rz`
    ThreeReg,
    /// `op rx, ry, value`
    TwoRegValue,
    /// `op rx, value(ry)` or `op rx, name`
    RegOffsetReg,
    /// `op rx, ry`
    TwoReg,
    /// `op rx`
    SingleReg,
    /// `op`
    NoArg,
}

impl Opcode {
    pub fn shape(&self) -> Shape {
        use Opcode::*;
        match self {
            ADD | NAND => Shape::ThreeReg,
            ADDI | BEQ => Shape::TwoRegValue,
            LW | SW => Shape::RegOffsetReg,
            JALR => Shape::TwoReg,
            IN | OUT => Shape::SingleReg,
            HALT => Shape::NoArg,
        }
    }

    /// Operand counts accepted after preprocessing.
    pub fn arity(&self) -> RangeInclusive<usize> {
        match self.shape() {
            Shape::ThreeReg | Shape::TwoRegValue => 3..=3,
            Shape::RegOffsetReg => 2..=3,
            Shape::TwoReg => 2..=2,
            Shape::SingleReg => 1..=1,
            Shape::NoArg => 0..=0,
        }
    }

    /// Maximum number of operand slots the tokenizer fills.
    pub fn max_operands(&self) -> usize {
        *self.arity().end()
    }
}
