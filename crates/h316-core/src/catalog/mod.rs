//! Instruction catalog: declarative definitions expanded into a dense
//! 65536-entry dispatch table.
//!
//! Construction happens in three passes over an empty table:
//! 1. every definition claims the words its class expands to (two
//!    definitions claiming one word is a build error);
//! 2. every alias group is resolved against its single populated member;
//! 3. words still undefined inside a fallback range get that range's
//!    generic executor.
//!
//! The result is immutable and meant to be shared behind an `Arc`.

mod disasm;
mod table;

pub use table::{standard_aliases, standard_definitions, standard_fallbacks};

use tracing::{event, Level};

use crate::execute::Executor;
use crate::CatalogError;

/// Number of distinct instruction words.
pub const WORD_SPACE: usize = 1 << 16;

/// Indirect (flag) bit of a memory-reference word.
pub const FLAG_BIT: u16 = 0o100000;
/// Index (tag) bit of a memory-reference word.
pub const TAG_BIT: u16 = 0o040000;
/// Sector bit: set means the current sector, clear means the base sector.
pub const SECTOR_BIT: u16 = 0o001000;
/// Address field of a memory-reference word.
pub const ADDRESS_FIELD: u16 = 0o000777;

/// Device address selected by `SMK` and `OTK`; plain `OTA` never reaches it.
pub const SMK_DEVICE: u16 = 0o20;

/// Decode class of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionClass {
    /// No executor.
    Undefined,
    /// Control group (`HLT`, `IAB`, `ENB`, ...).
    GenericB,
    /// Shift group; the low six bits are the count.
    Shift,
    /// Skip group.
    Skip,
    /// Accumulator group (`CRA`, `TCA`, ...).
    GenericA,
    /// Memory reference with indirect, index and sector bits.
    MemoryReference,
    /// Device I/O with function and device fields.
    Io,
    /// I/O word to device '20 that acts as a control instruction.
    IoAsGeneric,
}

/// How a dispatch entry came to occupy its words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryOrigin {
    /// Never populated.
    Undefined,
    /// Expanded from a definition.
    Defined,
    /// Synthesized for an alias group member.
    Alias,
    /// Generic executor filling a known opcode range.
    Fallback,
}

/// One instruction definition of the catalog.
#[derive(Debug, Clone, Copy)]
pub struct InstructionDef {
    /// Assembler mnemonic.
    pub mnemonic: &'static str,
    /// Decode class; determines which words the definition expands to.
    pub class: InstructionClass,
    /// Canonical encoding with every variable field zero.
    pub opcode: u16,
    /// One-line description.
    pub description: &'static str,
    /// Executor shared by every expanded word.
    pub executor: Executor,
    /// Memory reference only: the tag position is part of the opcode
    /// (`STX`, `LDX`), so it is not expanded and never indexes.
    pub tag_in_opcode: bool,
    /// I/O only: skip device '20, which belongs to `SMK`/`OTK`.
    pub reserves_smk_device: bool,
}

impl InstructionDef {
    /// Creates a definition with no special expansion flags.
    #[must_use]
    pub const fn new(
        mnemonic: &'static str,
        class: InstructionClass,
        opcode: u16,
        description: &'static str,
        executor: Executor,
    ) -> Self {
        Self {
            mnemonic,
            class,
            opcode,
            description,
            executor,
            tag_in_opcode: false,
            reserves_smk_device: false,
        }
    }

    /// Marks the tag position as part of the opcode.
    #[must_use]
    pub const fn with_tag_in_opcode(mut self) -> Self {
        self.tag_in_opcode = true;
        self
    }

    /// Leaves device '20 out of the I/O expansion.
    #[must_use]
    pub const fn reserving_smk_device(mut self) -> Self {
        self.reserves_smk_device = true;
        self
    }

    /// Every instruction word this definition occupies.
    #[must_use]
    pub fn words(&self) -> Vec<u16> {
        let opcode = self.opcode;
        match self.class {
            InstructionClass::Undefined => Vec::new(),
            InstructionClass::GenericB
            | InstructionClass::GenericA
            | InstructionClass::Skip
            | InstructionClass::IoAsGeneric => vec![opcode],
            InstructionClass::Shift => (0..0o100).map(|count| opcode | count).collect(),
            InstructionClass::MemoryReference => {
                let tags: &[u16] = if self.tag_in_opcode { &[0] } else { &[0, TAG_BIT] };
                [0, FLAG_BIT]
                    .into_iter()
                    .flat_map(|flag| tags.iter().map(move |tag| flag | tag))
                    .flat_map(|high| [0, SECTOR_BIT].into_iter().map(move |sector| high | sector))
                    .flat_map(|high| (0..=ADDRESS_FIELD).map(move |addr| opcode | high | addr))
                    .collect()
            }
            InstructionClass::Io => (0..0o20_u16)
                .flat_map(|function| (0..0o100_u16).map(move |device| (function, device)))
                .filter(|(_, device)| !(self.reserves_smk_device && *device == SMK_DEVICE))
                .map(|(function, device)| opcode | (function << 6) | device)
                .collect(),
        }
    }
}

/// Generic executor covering the undefined words of an opcode range.
#[derive(Debug, Clone, Copy)]
pub struct FallbackRange {
    /// First word of the range.
    pub first: u16,
    /// Last word of the range, inclusive.
    pub last: u16,
    /// Class given to the filled words.
    pub class: InstructionClass,
    /// Mnemonic shown when disassembling filled words.
    pub mnemonic: &'static str,
    /// Description of the generic behavior.
    pub description: &'static str,
    /// Executor that decodes the raw word.
    pub executor: Executor,
}

/// A populated slot of the dispatch table.
#[derive(Debug, Clone)]
pub struct DispatchEntry {
    /// Decode class.
    pub class: InstructionClass,
    /// Canonical opcode of the defining instruction.
    pub opcode: u16,
    /// Mnemonic; aliases are shown in parentheses.
    pub mnemonic: String,
    /// Description; aliases are prefixed with `(Alternative)`.
    pub description: String,
    /// Executor, absent for undefined words.
    pub executor: Option<Executor>,
    /// How the entry was produced.
    pub origin: EntryOrigin,
    /// Copied from the definition for disassembly.
    pub tag_in_opcode: bool,
}

impl DispatchEntry {
    fn undefined() -> Self {
        Self {
            class: InstructionClass::Undefined,
            opcode: 0,
            mnemonic: "???".to_owned(),
            description: "Undefined instruction".to_owned(),
            executor: None,
            origin: EntryOrigin::Undefined,
            tag_in_opcode: false,
        }
    }

    fn defined(def: &InstructionDef) -> Self {
        Self {
            class: def.class,
            opcode: def.opcode,
            mnemonic: def.mnemonic.to_owned(),
            description: def.description.to_owned(),
            executor: Some(def.executor),
            origin: EntryOrigin::Defined,
            tag_in_opcode: def.tag_in_opcode,
        }
    }

    fn alias_of(proper: &Self) -> Self {
        Self {
            mnemonic: format!("({})", proper.mnemonic),
            description: format!("(Alternative) {}", proper.description),
            origin: EntryOrigin::Alias,
            ..proper.clone()
        }
    }

    fn fallback(range: &FallbackRange) -> Self {
        Self {
            class: range.class,
            opcode: range.first,
            mnemonic: range.mnemonic.to_owned(),
            description: range.description.to_owned(),
            executor: Some(range.executor),
            origin: EntryOrigin::Fallback,
            tag_in_opcode: false,
        }
    }

    /// Returns `true` when both entries dispatch to the same executor.
    #[must_use]
    pub fn shares_executor_with(&self, other: &Self) -> bool {
        match (self.executor, other.executor) {
            (Some(mine), Some(theirs)) => mine as usize == theirs as usize,
            (None, None) => true,
            _ => false,
        }
    }
}

/// Per-origin slot counts of a built table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    /// Words populated by definitions.
    pub defined: usize,
    /// Words populated by alias resolution.
    pub aliased: usize,
    /// Words populated by fallback ranges.
    pub fallback: usize,
    /// Words left without an executor.
    pub undefined: usize,
}

const UNDEFINED_SLOT: u32 = 0;

/// Dense dispatch table plus the definitions it was built from.
#[derive(Debug, Clone)]
pub struct InstructionCatalog {
    entries: Vec<DispatchEntry>,
    slots: Box<[u32]>,
    alias_groups: Vec<Vec<u16>>,
}

impl InstructionCatalog {
    /// Builds the table for the standard instruction set.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the standard declarations are
    /// inconsistent.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::build(&standard_definitions(), &standard_aliases(), &standard_fallbacks())
    }

    /// Builds a table from explicit declarations.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::OverlappingDefinition`] when two definitions
    /// expand onto one word, and [`CatalogError::AliasWithoutProper`] or
    /// [`CatalogError::AmbiguousAlias`] when an alias group does not have
    /// exactly one populated member.
    pub fn build(
        definitions: &[InstructionDef],
        alias_groups: &[Vec<u16>],
        fallbacks: &[FallbackRange],
    ) -> Result<Self, CatalogError> {
        let mut entries = vec![DispatchEntry::undefined()];
        let mut slots = vec![UNDEFINED_SLOT; WORD_SPACE].into_boxed_slice();

        for def in definitions {
            let index = next_index(&entries);
            entries.push(DispatchEntry::defined(def));
            for word in def.words() {
                let slot = &mut slots[usize::from(word)];
                if *slot != UNDEFINED_SLOT {
                    return Err(CatalogError::OverlappingDefinition {
                        word,
                        first: entries[*slot as usize].mnemonic.clone(),
                        second: def.mnemonic.to_owned(),
                    });
                }
                *slot = index;
            }
        }

        for group in alias_groups {
            let proper: Vec<u16> = group
                .iter()
                .copied()
                .filter(|word| slots[usize::from(*word)] != UNDEFINED_SLOT)
                .collect();
            let canonical = match proper.as_slice() {
                [] => return Err(CatalogError::AliasWithoutProper { group: group.clone() }),
                [single] => *single,
                _ => {
                    return Err(CatalogError::AmbiguousAlias { group: group.clone(), proper });
                }
            };
            let alias = DispatchEntry::alias_of(&entries[slots[usize::from(canonical)] as usize]);
            let index = next_index(&entries);
            entries.push(alias);
            for word in group.iter().filter(|word| **word != canonical) {
                slots[usize::from(*word)] = index;
            }
        }

        for range in fallbacks {
            let index = next_index(&entries);
            entries.push(DispatchEntry::fallback(range));
            for word in range.first..=range.last {
                let slot = &mut slots[usize::from(word)];
                if *slot == UNDEFINED_SLOT {
                    *slot = index;
                }
            }
        }

        let catalog = Self { entries, slots, alias_groups: alias_groups.to_vec() };
        let stats = catalog.stats();
        event!(
            Level::DEBUG,
            defined = stats.defined,
            aliased = stats.aliased,
            fallback = stats.fallback,
            undefined = stats.undefined,
            "instruction catalog built"
        );
        Ok(catalog)
    }

    /// Dispatch entry for an instruction word. Total over all words.
    #[must_use]
    pub fn entry(&self, word: u16) -> &DispatchEntry {
        &self.entries[self.slots[usize::from(word)] as usize]
    }

    /// Looks up a defined (non-alias) instruction by mnemonic.
    #[must_use]
    pub fn find(&self, mnemonic: &str) -> Option<&DispatchEntry> {
        self.entries
            .iter()
            .find(|entry| entry.origin == EntryOrigin::Defined && entry.mnemonic == mnemonic)
    }

    /// Alias groups the table was built with.
    #[must_use]
    pub fn alias_groups(&self) -> &[Vec<u16>] {
        &self.alias_groups
    }

    /// Counts table slots by origin.
    #[must_use]
    pub fn stats(&self) -> CatalogStats {
        self.slots.iter().fold(CatalogStats::default(), |mut stats, slot| {
            match self.entries[*slot as usize].origin {
                EntryOrigin::Undefined => stats.undefined += 1,
                EntryOrigin::Defined => stats.defined += 1,
                EntryOrigin::Alias => stats.aliased += 1,
                EntryOrigin::Fallback => stats.fallback += 1,
            }
            stats
        })
    }
}

fn next_index(entries: &[DispatchEntry]) -> u32 {
    u32::try_from(entries.len()).unwrap_or(u32::MAX)
}
