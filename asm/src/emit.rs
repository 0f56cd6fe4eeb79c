use arch::{inst::Inst, WORD_SIZE};
use color_print::cformat;
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;

use crate::{
    error::Error,
    symbol::{Symbol, SymbolTable},
    token::Token,
};

/// One word per line, 8 uppercase hex digits.
pub fn to_hex(image: &[u32]) -> String {
    image.iter().map(|word| format!("{:08X}\n", word)).collect()
}

pub fn write_hex<W: Write>(out: &mut W, image: &[u32]) -> std::io::Result<()> {
    for word in image {
        writeln!(out, "{:08X}", word)?;
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Listing

const RULE: &str = "+------+----------+----------+---------------------------+---------------------";

/// Width of the decoded instruction column.
const DECODED_WIDTH: usize = 25;

/// Colored listing of the image: source line, address, word, decoded instruction, source text.
pub fn listing(tokens: &[Token], image: &[u32]) -> String {
    let mut out = vec![RULE.to_string()];
    let mut words = image.iter().enumerate();

    for token in tokens.iter().filter(|t| t.op.is_some()) {
        let Some((_, word)) = words.next() else {
            break;
        };
        out.push(format!(
            "| {:>4} | {} | {:08X} | {} | {}",
            token.line,
            cformat!("<green>{:08X}</>", token.address),
            word,
            decode(*word),
            token.original
        ));
    }
    for (idx, word) in words {
        out.push(format!(
            "|      | {} | {:08X} | {:<width$} |",
            cformat!("<green>{:08X}</>", idx as u32 * WORD_SIZE),
            word,
            ".word",
            width = DECODED_WIDTH
        ));
    }
    out.push(RULE.to_string());
    out.join("\n")
}

fn decode(word: u32) -> String {
    match Inst::from_bin(word) {
        Ok(inst) => inst.cformat(),
        Err(_) => cformat!("<red>{}</>", format!("{:<width$}", "???", width = DECODED_WIDTH)),
    }
}

// ----------------------------------------------------------------------------
// Symbol map

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SymbolMap {
    pub labels: IndexMap<String, u32>,
    pub variables: IndexMap<String, u32>,
}

impl SymbolMap {
    pub fn generate(symbols: &SymbolTable) -> Self {
        let placed = |sym: &Symbol| sym.address.map(|addr| (sym.name.clone(), addr));
        SymbolMap {
            labels: symbols.labels().filter_map(placed).collect(),
            variables: symbols.variables().filter_map(placed).collect(),
        }
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_lines() {
        let image = [0x0670_0008, 0x7000_0000, 0, 0xABCD_EF01];
        assert_eq!(to_hex(&image), "06700008\n70000000\n00000000\nABCDEF01\n");

        let mut buf = vec![];
        assert!(write_hex(&mut buf, &image).is_ok());
        assert_eq!(String::from_utf8(buf).ok(), Some(to_hex(&image)));
    }

    #[test]
    fn empty_image() {
        assert_eq!(to_hex(&[]), "");
    }

    #[test]
    fn symbol_map_yaml() {
        let mut table = SymbolTable::new();
        table.insert_label("main", 0, 1);
        table.insert_variable("x", 1);
        table.insert_variable("pending", 2);
        table.place_variables(8, WORD_SIZE);

        let map = SymbolMap::generate(&table);
        assert_eq!(map.labels.get("main"), Some(&0));
        assert_eq!(map.variables.get("x"), Some(&8));
        assert_eq!(map.variables.get("pending"), Some(&12));

        let yaml = map.to_yaml().unwrap();
        assert!(yaml.contains("labels:"));
        assert!(yaml.contains("x: 8"));
    }

    /// Drop the terminal color codes.
    fn plain(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn listing_rows() {
        let asm = crate::assemble("top: out x\nbeq $zero, $zero, top\nhalt\n");
        assert!(!asm.has_error());
        let text = plain(&listing(&asm.tokens, &asm.image));
        let rows: Vec<_> = text.lines().collect();

        assert_eq!(rows.len(), 7);
        assert_eq!(rows[1], "|    1 | 00000000 | 36E00010 | lw   $t0   $fp   16       | top: lw $t0, x");
        assert_eq!(rows[3], "|    2 | 00000008 | 500FFFF4 | beq  $zero $zero -12      | beq $zero, $zero, top");
        assert_eq!(rows[5], "|      | 00000010 | 00000000 | .word                     |");
        assert_eq!(rows[1].matches("top:").count(), 1);

        // Decoded column lines up on every row.
        let bar = |row: &str| row.match_indices('|').map(|(idx, _)| idx).nth(4);
        assert!(rows[1..6].iter().all(|row| bar(row) == bar(rows[1])));
    }
}
