//! One-line disassembly of instruction words.

use super::{
    EntryOrigin, InstructionCatalog, InstructionClass, ADDRESS_FIELD, FLAG_BIT, SECTOR_BIT,
    TAG_BIT,
};
use crate::execute::shift::shift_count;

/// Sector bits of a 15-bit address.
const SECTOR_MASK: u16 = 0x7E00;

impl InstructionCatalog {
    /// Renders `word`, fetched from `addr`, as assembler text.
    ///
    /// Memory-reference words show `*` for indirect, `,1` for indexing and,
    /// when `ea` is known, the resolved effective address.
    #[must_use]
    pub fn disassemble(&self, addr: u16, word: u16, ea: Option<u16>) -> String {
        let entry = self.entry(word);
        match (entry.origin, entry.class) {
            (EntryOrigin::Undefined | EntryOrigin::Fallback, _) => {
                format!("{} '{word:06o}", entry.mnemonic)
            }
            (_, InstructionClass::MemoryReference) => {
                let mut text = entry.mnemonic.clone();
                if word & FLAG_BIT != 0 {
                    text.push('*');
                }
                let target = if word & SECTOR_BIT != 0 {
                    (addr & SECTOR_MASK) | (word & ADDRESS_FIELD)
                } else {
                    word & ADDRESS_FIELD
                };
                text.push_str(&format!(" '{target:04o}"));
                if word & TAG_BIT != 0 && !entry.tag_in_opcode {
                    text.push_str(",1");
                }
                if let Some(ea) = ea {
                    text.push_str(&format!(" ='{ea:06o}"));
                }
                text
            }
            (_, InstructionClass::Io) => format!("{} '{:04o}", entry.mnemonic, word & 0o1777),
            (_, InstructionClass::Shift) => format!("{} {}", entry.mnemonic, shift_count(word)),
            _ => entry.mnemonic.clone(),
        }
    }
}
