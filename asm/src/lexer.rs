use arch::op::{Opcode, Shape};
use std::iter::Peekable;
use std::str::CharIndices;
use tracing::trace;

use crate::{
    error::Error,
    token::{Token, TokenKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Whitespace,
    Alpha,
    Label,
    Comment,
    Params,
    Halt,
}

/// Tokenize one source line.
pub fn tokenize(line: &str, line_no: usize, address: u32) -> (Token, Vec<Error>) {
    LineLexer::new(line, line_no, address).parse()
}

pub struct LineLexer<'a> {
    iter: Peekable<CharIndices<'a>>,
    state: State,
    token: Token,
    /// Identifier run buffered by ALPHA before it is classified.
    word: String,
    slot: usize,
    comment: bool,
    errors: Vec<Error>,
}

impl<'a> LineLexer<'a> {
    pub fn new(line: &'a str, line_no: usize, address: u32) -> Self {
        let code = line.split(';').next().unwrap_or_default();
        let mut token = Token::new(line_no, address);
        token.original = code.trim().to_string();
        Self {
            iter: line.char_indices().peekable(),
            state: State::Start,
            token,
            word: String::new(),
            slot: 0,
            comment: false,
            errors: vec![],
        }
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn is_eol(c: char) -> bool {
    c == '\r' || c == '\n'
}

impl<'a> LineLexer<'a> {
    fn peek(&mut self) -> Option<char> {
        self.iter.peek().map(|&(_, c)| c)
    }

    fn consume(&mut self) -> Option<char> {
        self.iter.next().map(|(_, c)| c)
    }

    fn skip_blanks(&mut self) {
        while self.iter.next_if(|&(_, c)| is_blank(c)).is_some() {}
    }
}

// ----------------------------------------------------------------------------
// State machine
// ----------------------------------------------------------------------------

impl<'a> LineLexer<'a> {
    pub fn parse(mut self) -> (Token, Vec<Error>) {
        while self.state != State::Halt {
            self.state = match self.state {
                State::Start => self.start(),
                State::Whitespace => self.whitespace(),
                State::Alpha => self.alpha(),
                State::Label => self.label(),
                State::Comment => self.comment(),
                State::Params => self.params(),
                State::Halt => State::Halt,
            };
        }

        self.token.kind = if self.token.op.is_some() || !self.word.is_empty() {
            TokenKind::Instruction
        } else if self.token.has_label() {
            TokenKind::Label
        } else if self.comment && self.token.is_empty() {
            TokenKind::Comment
        } else {
            TokenKind::Empty
        };

        trace!(
            line = self.token.line,
            op = ?self.token.op,
            label = ?self.token.label,
            operands = ?self.token.operands,
            "tokenized"
        );
        (self.token, self.errors)
    }

    fn start(&mut self) -> State {
        match self.peek() {
            None => State::Halt,
            Some(c) if is_blank(c) => State::Whitespace,
            Some(c) if c.is_ascii_alphabetic() || c == '_' => State::Alpha,
            Some(';') => State::Comment,
            Some(c) if is_eol(c) => State::Halt,
            Some(c) => {
                self.errors.push(Error::UnexpectedChar(c));
                State::Halt
            }
        }
    }

    fn whitespace(&mut self) -> State {
        self.skip_blanks();
        State::Start
    }

    fn alpha(&mut self) -> State {
        self.word.clear();
        while let Some((_, c)) = self.iter.next_if(|&(_, c)| is_ident(c)) {
            self.word.push(c);
        }
        self.skip_blanks();

        if self.peek() == Some(':') {
            self.consume();
            return State::Label;
        }

        match Opcode::parse(&self.word) {
            Ok(op) => {
                self.token.op = Some(op);
                State::Params
            }
            Err(_) => {
                self.errors.push(Error::UnknownMnemonic(self.word.clone()));
                State::Halt
            }
        }
    }

    fn label(&mut self) -> State {
        if self.token.has_label() {
            self.errors.push(Error::DuplicateLabelOnLine);
            return State::Halt;
        }
        self.token.label = Some(std::mem::take(&mut self.word));
        State::Start
    }

    fn comment(&mut self) -> State {
        self.comment = true;
        while self.consume().is_some() {}
        State::Halt
    }

    fn params(&mut self) -> State {
        let Some(op) = self.token.op else {
            return State::Halt;
        };
        let next = match op.shape() {
            Shape::ThreeReg | Shape::TwoRegValue | Shape::TwoReg | Shape::SingleReg => {
                self.list_params(op)
            }
            Shape::RegOffsetReg => self.offset_params(op),
            Shape::NoArg => self.no_params(op),
        };
        // A `,` or `(` opened a slot that nothing filled.
        if self.errors.is_empty() && self.slot > 0 && self.token.operands.len() <= self.slot {
            self.errors.push(Error::EmptyOperand(op));
            return State::Halt;
        }
        next
    }
}

// ----------------------------------------------------------------------------
// Operand shapes
// ----------------------------------------------------------------------------

impl<'a> LineLexer<'a> {
    /// `op a, b, c`
    fn list_params(&mut self, op: Opcode) -> State {
        while let Some(c) = self.peek() {
            match c {
                ';' => return State::Comment,
                c if is_eol(c) => return State::Halt,
                ',' => {
                    self.consume();
                    self.slot += 1;
                }
                c if is_blank(c) => {
                    self.consume();
                }
                c => {
                    self.consume();
                    if !self.push_char(op, c) {
                        return State::Halt;
                    }
                }
            }
        }
        State::Halt
    }

    /// `op a, value(b)` or `op a, name`
    fn offset_params(&mut self, op: Opcode) -> State {
        while let Some(c) = self.peek() {
            match c {
                ';' => return State::Comment,
                c if is_eol(c) => return State::Halt,
                ',' | '(' => {
                    self.consume();
                    self.slot += 1;
                }
                ')' => {
                    self.consume();
                }
                c if is_blank(c) => {
                    self.consume();
                }
                c => {
                    self.consume();
                    if !self.push_char(op, c) {
                        return State::Halt;
                    }
                }
            }
        }
        State::Halt
    }

    /// `op`
    fn no_params(&mut self, op: Opcode) -> State {
        self.skip_blanks();
        match self.peek() {
            None => State::Halt,
            Some(';') => State::Comment,
            Some(c) if is_eol(c) => State::Halt,
            Some(_) => {
                self.errors.push(Error::TooManyOperands(op));
                State::Halt
            }
        }
    }

    /// Append to the current slot. Returns false once the opcode's slots are exhausted.
    fn push_char(&mut self, op: Opcode, c: char) -> bool {
        if self.slot >= op.max_operands() {
            self.errors.push(Error::TooManyOperands(op));
            return false;
        }
        while self.token.operands.len() <= self.slot {
            self.token.operands.push(String::new());
        }
        self.token.operands[self.slot].push(c);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(line: &str) -> Token {
        let (token, errors) = tokenize(line, 1, 0);
        assert!(errors.is_empty(), "{line}: {errors:?}");
        token
    }

    #[test]
    fn three_registers() {
        let token = lex("add $a0, $a1, $a2");
        assert_eq!(token.op, Some(Opcode::ADD));
        assert_eq!(token.operands, vec!["$a0", "$a1", "$a2"]);
        assert_eq!(token.kind, TokenKind::Instruction);
    }

    #[test]
    fn memory_form() {
        let token = lex("lw $t0, -4($sp)");
        assert_eq!(token.op, Some(Opcode::LW));
        assert_eq!(token.operands, vec!["$t0", "-4", "$sp"]);

        let token = lex("sw $t0, x");
        assert_eq!(token.operands, vec!["$t0", "x"]);
    }

    #[test]
    fn label_and_comment() {
        let token = lex("  loop: beq $a0, $zero, done ; exit");
        assert_eq!(token.label.as_deref(), Some("loop"));
        assert_eq!(token.op, Some(Opcode::BEQ));
        assert_eq!(token.operands, vec!["$a0", "$zero", "done"]);
        assert_eq!(token.original, "loop: beq $a0, $zero, done");
    }

    #[test]
    fn label_only() {
        let token = lex("end :");
        assert_eq!(token.label.as_deref(), Some("end"));
        assert_eq!(token.op, None);
        assert_eq!(token.kind, TokenKind::Label);
    }

    #[test]
    fn blank_and_comment_lines() {
        let token = lex("   \t ");
        assert!(token.is_empty());
        assert_eq!(token.kind, TokenKind::Empty);

        let token = lex("; just a note");
        assert!(token.is_empty());
        assert_eq!(token.kind, TokenKind::Comment);
    }

    #[test]
    fn crlf() {
        let token = lex("halt\r");
        assert_eq!(token.op, Some(Opcode::HALT));
        assert!(token.operands.is_empty());
        assert_eq!(token.original, "halt");
    }

    #[test]
    fn unknown_mnemonic() {
        let (token, errors) = tokenize("mul $a0, $a1, $a2", 3, 0);
        assert_eq!(token.op, None);
        assert!(matches!(&errors[..], [Error::UnknownMnemonic(w)] if w == "mul"));
    }

    #[test]
    fn too_many_operands() {
        let (_, errors) = tokenize("out $a0, $a1", 1, 0);
        assert!(matches!(&errors[..], [Error::TooManyOperands(Opcode::OUT)]));
        let (_, errors) = tokenize("halt $a0", 1, 0);
        assert!(matches!(&errors[..], [Error::TooManyOperands(Opcode::HALT)]));
    }

    #[test]
    fn trailing_separator() {
        let (_, errors) = tokenize("add $a0, $a1, $a2,", 1, 0);
        assert!(matches!(&errors[..], [Error::EmptyOperand(Opcode::ADD)]));
        let (_, errors) = tokenize("out $a0, ; note", 1, 0);
        assert!(matches!(&errors[..], [Error::EmptyOperand(Opcode::OUT)]));
        let (_, errors) = tokenize("lw $t0, 4(", 1, 0);
        assert!(matches!(&errors[..], [Error::EmptyOperand(Opcode::LW)]));

        // Inner gaps are left to the finalizer.
        let (token, errors) = tokenize("add $a0,, $a2", 1, 0);
        assert!(errors.is_empty());
        assert_eq!(token.operands, vec!["$a0", "", "$a2"]);
    }

    #[test]
    fn unexpected_char() {
        let (_, errors) = tokenize("$a0 add", 1, 0);
        assert!(matches!(&errors[..], [Error::UnexpectedChar('$')]));
    }

    #[test]
    fn two_labels() {
        let (_, errors) = tokenize("a: b: halt", 1, 0);
        assert!(matches!(&errors[..], [Error::DuplicateLabelOnLine]));
    }
}
