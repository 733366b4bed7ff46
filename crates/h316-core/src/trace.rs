//! Fixed-capacity circular record of executed steps.

use std::collections::VecDeque;

use crate::BreakKind;

/// Machine state captured after one executed instruction or break cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TraceRecord {
    /// Master clock after execution, in half-cycles.
    pub time: u64,
    /// A register.
    pub a: u16,
    /// B register.
    pub b: u16,
    /// Index register.
    pub x: u16,
    /// Carry flag.
    pub c: bool,
    /// Address the instruction was fetched from, or P at the break.
    pub p: u16,
    /// Instruction word; zero for break cycles.
    pub word: u16,
    /// Break cycle that ran instead of an instruction.
    pub break_kind: Option<BreakKind>,
}

/// Ring of the most recent [`TraceRecord`]s; the oldest is dropped once
/// the capacity is reached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceBuffer {
    records: VecDeque<TraceRecord>,
    capacity: usize,
}

impl TraceBuffer {
    /// Creates an empty ring holding at most `capacity` records. A zero
    /// capacity disables tracing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { records: VecDeque::with_capacity(capacity), capacity }
    }

    /// Appends a record, evicting the oldest when full.
    pub fn push(&mut self, record: TraceRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Records from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter()
    }

    /// Most recent record.
    #[must_use]
    pub fn last(&self) -> Option<&TraceRecord> {
        self.records.back()
    }

    /// Number of records held.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forgets every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
