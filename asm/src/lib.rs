pub mod assembler;
pub mod emit;
pub mod error;
pub mod finalize;
pub mod fixup;
pub mod lexer;
pub mod number;
pub mod preprocess;
pub mod symbol;
pub mod token;

pub use assembler::{assemble, Assembly};
pub use error::{Diag, Error, Level};
