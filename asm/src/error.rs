use arch::{op::Opcode, reg::Reg};
use color_print::cprintln;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown operation: `{0}`")]
    UnknownMnemonic(String),

    #[error("Unknown register: `{0}`")]
    UnknownRegister(String),

    #[error("Expected a register, found `{0}`")]
    ExpectedRegister(String),

    #[error("Cannot parse `{0}` as a number")]
    ParseNumber(String),

    #[error("Value {0} does not fit in a 20-bit signed field")]
    ImmediateOutOfRange(i64),

    #[error("`{op}` takes {expected} operand(s), found {found}")]
    MissingOperand {
        op: Opcode,
        expected: String,
        found: usize,
    },

    #[error("Too many operands for `{0}`")]
    TooManyOperands(Opcode),

    #[error("Syntax Error: `{0}` has a separator with no operand after it")]
    EmptyOperand(Opcode),

    #[error("`{0}` cannot be used as an immediate here, write a literal")]
    SymbolicImmediate(String),

    #[error("Syntax Error: unexpected character `{0}`")]
    UnexpectedChar(char),

    #[error("Syntax Error: more than one label on a line")]
    DuplicateLabelOnLine,

    #[error("`{0}` is loaded with a variable here, so the value this line reads from it is lost")]
    ScratchClobbered(Reg),

    #[error("Undefined symbol: `{0}`")]
    UndefinedSymbol(String),

    #[error("Undefined label: `{0}`")]
    UndefinedLabel(String),

    #[error("Re-defined label: `{0}`")]
    RedefinedLabel(String),

    #[error("`{0}` was defined here first; the later address wins")]
    PreviousDefinition(String),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to read file: {0}")]
    FileRead(String, #[source] std::io::Error),

    #[error("Failed to create file: {0}")]
    FileCreate(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),

    #[error("Failed to serialize symbol map")]
    SymbolMap(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warn,
    Note,
}

/// A problem found while assembling, tied to a line of the source file.
#[derive(Debug)]
pub struct Diag {
    pub level: Level,
    /// 1-based source line number.
    pub line: usize,
    pub raw: String,
    pub error: Error,
}

impl Diag {
    pub fn error(error: Error, line: usize, raw: &str) -> Self {
        Diag {
            level: Level::Error,
            line,
            raw: raw.to_string(),
            error,
        }
    }

    pub fn warn(error: Error, line: usize, raw: &str) -> Self {
        Diag {
            level: Level::Warn,
            line,
            raw: raw.to_string(),
            error,
        }
    }

    pub fn note(error: Error, line: usize, raw: &str) -> Self {
        Diag {
            level: Level::Note,
            line,
            raw: raw.to_string(),
            error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }

    /// Print with file location and line content.
    pub fn print(&self, file: &str) {
        match self.level {
            Level::Error => cprintln!("<red,bold>error</>: {}", self.error),
            Level::Warn => cprintln!("<yellow,bold>warn</>: {}", self.error),
            Level::Note => cprintln!("<green,bold>note</>: {}", self.error),
        }
        cprintln!("     <blue>--></> <underline>{}:{}</>", file, self.line);
        cprintln!("      <blue>|</>");
        cprintln!(" <blue>{:>4} |</> {}", self.line, self.raw);
        cprintln!("      <blue>|</>");
    }
}

impl Error {
    /// Print a fatal error that has no source location.
    pub fn print_fatal(&self) {
        cprintln!("<red,bold>error</>: {}", self);
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            cprintln!("  <blue>caused by</>: {}", cause);
            source = std::error::Error::source(cause);
        }
    }
}
