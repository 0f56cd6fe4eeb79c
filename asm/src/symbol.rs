use indexmap::IndexMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Address of an instruction.
    Label,
    /// Data word placed after the code.
    Variable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// `None` until the variable is given storage.
    pub address: Option<u32>,
    /// 1-based line where the label was defined, or where the variable was first used.
    pub line: usize,
}

/// Symbols in first-seen order. Names are unique regardless of kind.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: IndexMap::new(),
        }
    }

    /// Bind `name` to an instruction address.
    ///
    /// A name first seen as an operand becomes a label in place. When the
    /// label already existed, its address is overwritten and the previous
    /// definition is returned.
    pub fn insert_label(&mut self, name: &str, address: u32, line: usize) -> Option<Symbol> {
        trace!(name, address, "label");
        match self.symbols.get_mut(name) {
            Some(sym) if sym.kind == SymbolKind::Label => {
                let prev = sym.clone();
                sym.address = Some(address);
                sym.line = line;
                Some(prev)
            }
            Some(sym) => {
                sym.kind = SymbolKind::Label;
                sym.address = Some(address);
                sym.line = line;
                None
            }
            None => {
                self.symbols.insert(
                    name.to_string(),
                    Symbol {
                        name: name.to_string(),
                        kind: SymbolKind::Label,
                        address: Some(address),
                        line,
                    },
                );
                None
            }
        }
    }

    /// Record an operand reference. An existing entry of either kind is returned as is.
    pub fn insert_variable(&mut self, name: &str, line: usize) -> &Symbol {
        self.symbols
            .entry(name.to_string())
            .or_insert_with(|| Symbol {
                name: name.to_string(),
                kind: SymbolKind::Variable,
                address: None,
                line,
            })
    }

    /// Give storage to every unplaced variable, one word each from `base`.
    /// Returns the number of words reserved.
    pub fn place_variables(&mut self, base: u32, word: u32) -> usize {
        let mut next = base;
        let mut count = 0;
        for sym in self.symbols.values_mut() {
            if sym.kind == SymbolKind::Variable && sym.address.is_none() {
                trace!(name = sym.name.as_str(), address = next, "variable");
                sym.address = Some(next);
                next += word;
                count += 1;
            }
        }
        count
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn labels(&self) -> impl Iterator<Item = &Symbol> {
        self.iter().filter(|s| s.kind == SymbolKind::Label)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Symbol> {
        self.iter().filter(|s| s.kind == SymbolKind::Variable)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
