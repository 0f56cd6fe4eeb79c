use arch::WORD_SIZE;
use tracing::debug;

use crate::{
    emit::to_hex,
    error::{Diag, Error},
    finalize::finalize_token,
    fixup::fixup,
    lexer::tokenize,
    preprocess::{preprocess, PreLine},
    symbol::SymbolTable,
    token::Token,
};

/// Everything produced by one run.
#[derive(Debug)]
pub struct Assembly {
    /// Intermediate program after expansion.
    pub pre: Vec<PreLine>,
    /// Instructions in address order.
    pub tokens: Vec<Token>,
    pub symbols: SymbolTable,
    /// Code words followed by one zero word per variable.
    pub image: Vec<u32>,
    pub diags: Vec<Diag>,
}

impl Assembly {
    pub fn has_error(&self) -> bool {
        self.diags.iter().any(|d| d.is_error())
    }

    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.diags.iter().filter(|d| d.is_error()).map(|d| &d.error)
    }

    pub fn hex(&self) -> String {
        to_hex(&self.image)
    }
}

/// Preprocess, collect symbols, fix up addresses.
pub fn assemble(source: &str) -> Assembly {
    let (pre, mut diags) = preprocess(source);
    let (mut tokens, mut symbols, collect_diags) = collect(&pre);
    diags.extend(collect_diags);
    let (image, fixup_diags) = fixup(&mut tokens, &mut symbols);
    diags.extend(fixup_diags);

    // Point every diagnostic at the line the user wrote.
    let lines: Vec<&str> = source.lines().collect();
    for diag in diags.iter_mut() {
        if let Some(raw) = diag.line.checked_sub(1).and_then(|idx| lines.get(idx)) {
            diag.raw = raw.trim_end().to_string();
        }
    }

    debug!(
        words = image.len(),
        symbols = symbols.len(),
        diags = diags.len(),
        "assembled"
    );
    Assembly {
        pre,
        tokens,
        symbols,
        image,
        diags,
    }
}

/// Main pass: tokenize and finalize the expanded program, assign addresses
/// and build the symbol table.
fn collect(pre: &[PreLine]) -> (Vec<Token>, SymbolTable, Vec<Diag>) {
    let mut tokens = vec![];
    let mut symbols = SymbolTable::new();
    let mut diags = vec![];
    let mut pending: Vec<(String, usize)> = vec![];
    let mut pc: u32 = 0;

    for line in pre {
        let (mut token, errors) = tokenize(&line.text, line.line, pc);
        let clean = errors.is_empty();
        for err in errors {
            diags.push(Diag::error(err, line.line, &line.text));
        }

        if let Some(label) = &token.label {
            pending.push((label.clone(), line.line));
        }

        // Unknown mnemonics and bare labels take no address.
        if token.op.is_none() {
            continue;
        }

        for (name, at) in pending.drain(..) {
            define_label(&mut symbols, &mut diags, &name, pc, at);
        }
        for (_, name) in token.symbols() {
            symbols.insert_variable(name, line.line);
        }
        if clean {
            if let Err(err) = finalize_token(&mut token) {
                diags.push(Diag::error(err, line.line, &line.text));
            }
        }

        pc += WORD_SIZE;
        tokens.push(token);
    }

    // Labels after the last instruction mark the end of code.
    for (name, at) in pending.drain(..) {
        define_label(&mut symbols, &mut diags, &name, pc, at);
    }

    debug!(
        instructions = tokens.len(),
        symbols = symbols.len(),
        "collected symbols"
    );
    (tokens, symbols, diags)
}

fn define_label(symbols: &mut SymbolTable, diags: &mut Vec<Diag>, name: &str, pc: u32, line: usize) {
    if let Some(prev) = symbols.insert_label(name, pc, line) {
        diags.push(Diag::warn(Error::RedefinedLabel(name.to_string()), line, ""));
        diags.push(Diag::note(Error::PreviousDefinition(name.to_string()), prev.line, ""));
    }
}
