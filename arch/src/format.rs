// Bit layout of a 32-bit instruction word.
//
//   31    28 27    24 23    20 19                     4 3     0
//  +--------+--------+--------+------------------------+-------+
//  |   op   |   x    |   y    |          imm (20 bit, signed)  |
//  +--------+--------+--------+------------------------+-------+
//                                                      |   z   |
//
// R-type uses z, I-type uses imm, the rest use only op/x (and y for jalr).

pub const IMM_BITS: u32 = 20;
pub const IMM_MIN: i64 = -(1 << (IMM_BITS - 1));
pub const IMM_MAX: i64 = (1 << (IMM_BITS - 1)) - 1;

const IMM_MASK: u32 = (1 << IMM_BITS) - 1;

pub fn fits_imm(value: i64) -> bool {
    (IMM_MIN..=IMM_MAX).contains(&value)
}

pub fn enc_r(op: u8, x: u8, y: u8, z: u8) -> u32 {
    enc_format(op, x, y) | (z as u32 & 0xF)
}

pub fn enc_i(op: u8, x: u8, y: u8, imm: i32) -> u32 {
    enc_format(op, x, y) | (imm as u32 & IMM_MASK)
}

pub fn enc_x(op: u8, x: u8) -> u32 {
    enc_format(op, x, 0)
}

fn enc_format(op: u8, x: u8, y: u8) -> u32 {
    ((op as u32 & 0xF) << 28) | ((x as u32 & 0xF) << 24) | ((y as u32 & 0xF) << 20)
}

pub fn dec_op(bin: u32) -> u8 {
    ((bin >> 28) & 0xF) as u8
}

pub fn dec_x(bin: u32) -> u8 {
    ((bin >> 24) & 0xF) as u8
}

pub fn dec_y(bin: u32) -> u8 {
    ((bin >> 20) & 0xF) as u8
}

pub fn dec_z(bin: u32) -> u8 {
    (bin & 0xF) as u8
}

/// Sign-extend the low 20 bits.
pub fn dec_imm(bin: u32) -> i32 {
    ((bin << (32 - IMM_BITS)) as i32) >> (32 - IMM_BITS)
}
