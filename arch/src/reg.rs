use bimap::BiMap;
use num_enum::{FromPrimitive, IntoPrimitive};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use strum::EnumIter;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    FromPrimitive,
    IntoPrimitive,
    EnumIter,
)]
#[repr(u8)]
pub enum Reg {
    #[default]
    ZERO,
    AT,
    V0,
    A0,
    A1,
    A2,
    T0,
    T1,
    T2,
    S0,
    S1,
    S2,
    K0,
    SP,
    FP,
    RA,
}

/// Prefix that marks an operand as a register.
pub const SIGIL: char = '$';

static REG_MAP: Lazy<BiMap<&'static str, Reg>> = Lazy::new(|| {
    let mut map: BiMap<&'static str, Reg> = BiMap::new();
    map.insert("zero", Reg::ZERO);
    map.insert("at", Reg::AT);
    map.insert("v0", Reg::V0);
    map.insert("a0", Reg::A0);
    map.insert("a1", Reg::A1);
    map.insert("a2", Reg::A2);
    map.insert("t0", Reg::T0);
    map.insert("t1", Reg::T1);
    map.insert("t2", Reg::T2);
    map.insert("s0", Reg::S0);
    map.insert("s1", Reg::S1);
    map.insert("s2", Reg::S2);
    map.insert("k0", Reg::K0);
    map.insert("sp", Reg::SP);
    map.insert("fp", Reg::FP);
    map.insert("ra", Reg::RA);
    map
});

impl Reg {
    /// Parse a sigil-prefixed register name such as `$t0`.
    pub fn parse(s: &str) -> Result<Reg, String> {
        let name = s
            .strip_prefix(SIGIL)
            .ok_or_else(|| format!("Missing `{SIGIL}` before register name: `{s}`"))?;
        match REG_MAP.get_by_left(name) {
            Some(reg) => Ok(*reg),
            None => Err(format!("Unknown Register Name: `{s}`")),
        }
    }

    pub fn code(&self) -> u8 {
        (*self).into()
    }

    pub fn name(&self) -> &'static str {
        REG_MAP.get_by_right(self).copied().unwrap_or("?")
    }
}

/// True when the operand is written as a register, whether or not the name is valid.
pub fn is_reg(s: &str) -> bool {
    s.starts_with(SIGIL)
}

impl Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&format!("{}{}", SIGIL, self.name()))
    }
}
