use crate::{format::*, op::Opcode, reg::Reg};

use color_print::cformat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inst {
    ADD(Reg, Reg, Reg),
    NAND(Reg, Reg, Reg),
    ADDI(Reg, Reg, i32),
    LW(Reg, Reg, i32),
    SW(Reg, Reg, i32),
    BEQ(Reg, Reg, i32),
    JALR(Reg, Reg),
    HALT(),
    IN(Reg),
    OUT(Reg),
}

impl Inst {
    pub fn opcode(&self) -> Opcode {
        match self {
            Inst::ADD(..) => Opcode::ADD,
            Inst::NAND(..) => Opcode::NAND,
            Inst::ADDI(..) => Opcode::ADDI,
            Inst::LW(..) => Opcode::LW,
            Inst::SW(..) => Opcode::SW,
            Inst::BEQ(..) => Opcode::BEQ,
            Inst::JALR(..) => Opcode::JALR,
            Inst::HALT() => Opcode::HALT,
            Inst::IN(..) => Opcode::IN,
            Inst::OUT(..) => Opcode::OUT,
        }
    }

    pub fn to_bin(&self) -> u32 {
        let op: u8 = self.opcode().into();
        match *self {
            Inst::ADD(rx, ry, rz) | Inst::NAND(rx, ry, rz) => {
                enc_r(op, rx.code(), ry.code(), rz.code())
            }
            Inst::ADDI(rx, ry, imm)
            | Inst::LW(rx, ry, imm)
            | Inst::SW(rx, ry, imm)
            | Inst::BEQ(rx, ry, imm) => enc_i(op, rx.code(), ry.code(), imm),
            Inst::JALR(rx, ry) => enc_i(op, rx.code(), ry.code(), 0),
            Inst::IN(rx) | Inst::OUT(rx) => enc_x(op, rx.code()),
            Inst::HALT() => enc_x(op, 0),
        }
    }

    pub fn from_bin(bin: u32) -> Result<Inst, String> {
        let op = Opcode::try_from(dec_op(bin))
            .map_err(|_| format!("Undefined opcode in word {:08X}", bin))?;
        let rx = Reg::from(dec_x(bin));
        let ry = Reg::from(dec_y(bin));
        let rz = Reg::from(dec_z(bin));
        let imm = dec_imm(bin);
        Ok(match op {
            Opcode::ADD => Inst::ADD(rx, ry, rz),
            Opcode::NAND => Inst::NAND(rx, ry, rz),
            Opcode::ADDI => Inst::ADDI(rx, ry, imm),
            Opcode::LW => Inst::LW(rx, ry, imm),
            Opcode::SW => Inst::SW(rx, ry, imm),
            Opcode::BEQ => Inst::BEQ(rx, ry, imm),
            Opcode::JALR => Inst::JALR(rx, ry),
            Opcode::HALT => Inst::HALT(),
            Opcode::IN => Inst::IN(rx),
            Opcode::OUT => Inst::OUT(rx),
        })
    }
}

impl Inst {
    pub fn cformat(&self) -> String {
        macro_rules! rrr {
            ($name:expr, $rx:expr, $ry:expr, $rz:expr) => {
                cformat!("<r>{:<5}</><b>{:<5} {:<5} {:<8}</>", $name, $rx, $ry, $rz)
            };
        }

        macro_rules! rri {
            ($name:expr, $rx:expr, $ry:expr, $imm:expr) => {
                cformat!(
                    "<r>{:<5}</><b>{:<5} {:<5} <y>{:<8}</></>",
                    $name,
                    $rx,
                    $ry,
                    $imm
                )
            };
        }

        match self {
            Inst::ADD(rx, ry, rz) => rrr!("add", rx, ry, rz),
            Inst::NAND(rx, ry, rz) => rrr!("nand", rx, ry, rz),
            Inst::ADDI(rx, ry, imm) => rri!("addi", rx, ry, imm),
            Inst::LW(rx, ry, imm) => rri!("lw", rx, ry, imm),
            Inst::SW(rx, ry, imm) => rri!("sw", rx, ry, imm),
            Inst::BEQ(rx, ry, imm) => rri!("beq", rx, ry, imm),
            Inst::JALR(rx, ry) => rrr!("jalr", rx, ry, ""),
            Inst::HALT() => rrr!("halt", "", "", ""),
            Inst::IN(rx) => rrr!("in", rx, "", ""),
            Inst::OUT(rx) => rrr!("out", rx, "", ""),
        }
    }
}
