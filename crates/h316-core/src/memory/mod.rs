//! Core memory store and its diagnostic "modified" bitmap.

/// Number of words of fitted core memory.
pub const MEMORY_WORDS: usize = 32_768;

/// Address mask with the extended-addressing option (15 bits).
pub const EXTENDED_ADDRESS_MASK: u16 = 0x7FFF;

/// Address mask without the extended-addressing option (14 bits).
pub const BASIC_ADDRESS_MASK: u16 = 0x3FFF;

/// Word-addressed core memory.
///
/// Addresses are masked to 15 bits before indexing; callers narrow further
/// when the extended-addressing option is absent. The modified bitmap only
/// feeds diagnostic dumps and never influences execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreMemory {
    words: Box<[u16]>,
    modified: Box<[bool]>,
}

impl Default for CoreMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreMemory {
    /// Allocates a zeroed, unmodified memory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: vec![0; MEMORY_WORDS].into_boxed_slice(),
            modified: vec![false; MEMORY_WORDS].into_boxed_slice(),
        }
    }

    fn index(addr: u16) -> usize {
        usize::from(addr & EXTENDED_ADDRESS_MASK)
    }

    /// Reads the word at `addr`.
    #[must_use]
    pub fn read(&self, addr: u16) -> u16 {
        self.words[Self::index(addr)]
    }

    /// Writes the word at `addr` and marks it modified.
    pub fn write(&mut self, addr: u16, value: u16) {
        let index = Self::index(addr);
        self.words[index] = value;
        self.modified[index] = true;
    }

    /// Returns `true` once `addr` has been written since the last clear.
    #[must_use]
    pub fn is_modified(&self, addr: u16) -> bool {
        self.modified[Self::index(addr)]
    }

    /// Clears the modified bitmap without touching contents.
    pub fn clear_modified(&mut self) {
        self.modified.fill(false);
    }

    /// Iterates `(address, word)` pairs for every modified location in
    /// ascending address order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn modified_words(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.modified
            .iter()
            .zip(self.words.iter())
            .enumerate()
            .filter(|(_, (modified, _))| **modified)
            .map(|(addr, (_, word))| (addr as u16, *word))
    }
}
