//! Effective-address resolution.

use super::Processor;
use crate::catalog::{ADDRESS_FIELD, FLAG_BIT, SECTOR_BIT, TAG_BIT};
use crate::memory::{BASIC_ADDRESS_MASK, EXTENDED_ADDRESS_MASK};
use crate::timing::{half_cycles, CycleCostKind};

/// Sector bits of a 15-bit address.
const SECTOR_MASK: u16 = 0x7E00;
/// Top address bit outside extend mode, kept from the fetch address.
const HIGH_PAGE_BIT: u16 = 0x4000;

impl Processor {
    /// Resolves the operand address of a memory-reference word and leaves
    /// it in Y.
    ///
    /// The sector bit picks the current sector (from Y, the fetch address)
    /// or the base sector in J. Indexing applies on the first pass when
    /// `indexable` and the tag bit are set, and on later passes only
    /// outside extend mode. Each indirection costs 2 half-cycles; a word
    /// with the flag bit clear touches neither memory nor the clock.
    pub(crate) fn effective_address(&mut self, instr: u16, indexable: bool) -> u16 {
        let mask = self.state.address_mask();
        let extend = self.state.regs.extend;
        let fetch_addr = self.state.regs.y;

        let sector = if instr & SECTOR_BIT != 0 {
            fetch_addr & SECTOR_MASK
        } else {
            self.state.regs.j & !ADDRESS_FIELD
        };
        let mut ea = (instr & ADDRESS_FIELD) | sector;
        let mut word = instr;
        let mut first = true;
        loop {
            let index = word & TAG_BIT != 0 && if first { indexable } else { !extend };
            if index {
                ea = ea.wrapping_add(self.state.x());
            }
            let wrapped = if extend {
                ea & EXTENDED_ADDRESS_MASK
            } else {
                (ea & BASIC_ADDRESS_MASK) | (fetch_addr & HIGH_PAGE_BIT)
            };
            ea = wrapped & mask;
            if word & FLAG_BIT == 0 {
                break;
            }
            word = self.state.read(ea);
            self.state.advance(half_cycles(CycleCostKind::Indirect));
            ea = word & if extend { EXTENDED_ADDRESS_MASK } else { BASIC_ADDRESS_MASK };
            first = false;
        }
        self.state.regs.y = ea;
        ea
    }
}
