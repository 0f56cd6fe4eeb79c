pub mod format;
pub mod inst;
pub mod op;
pub mod reg;

/// Size of one instruction or data word, in bytes.
pub const WORD_SIZE: u32 = 4;
