/// Machine activities that have a fixed half-cycle cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleCostKind {
    /// Instruction fetch or break-cycle selection at a step boundary.
    Fetch,
    /// One level of indirect address resolution.
    Indirect,
    /// Operand read or write of a memory-reference instruction.
    Operand,
    /// Second operand word of a double-precision access.
    SecondWord,
    /// Read-modify-write of `IRS`, `IMA` and the clock break.
    ReadModifyWrite,
    /// Return-address store of `JST` and the implied break jumps.
    JumpStore,
    /// Device exchange of an I/O instruction.
    Io,
    /// One step of the shift counter.
    ShiftStep,
    /// One step of `NRM`.
    NormalizeStep,
    /// Fixed overhead of multiply before its iterations are charged.
    MultiplySetup,
    /// One DMA micro-cycle.
    DmaMicroCycle,
}

/// Single source-of-truth table of fixed half-cycle costs.
pub const CYCLE_COST_TABLE: &[(CycleCostKind, u16)] = &[
    (CycleCostKind::Fetch, 2),
    (CycleCostKind::Indirect, 2),
    (CycleCostKind::Operand, 2),
    (CycleCostKind::SecondWord, 2),
    (CycleCostKind::ReadModifyWrite, 4),
    (CycleCostKind::JumpStore, 2),
    (CycleCostKind::Io, 2),
    (CycleCostKind::ShiftStep, 1),
    (CycleCostKind::NormalizeStep, 1),
    (CycleCostKind::MultiplySetup, 1),
    (CycleCostKind::DmaMicroCycle, 0),
];

/// Looks up the half-cycle cost for a cost kind.
#[must_use]
pub fn cycle_cost(kind: CycleCostKind) -> Option<u16> {
    CYCLE_COST_TABLE
        .iter()
        .find_map(|(entry_kind, cycles)| (*entry_kind == kind).then_some(*cycles))
}

/// Half-cycle cost of `kind` as a clock increment.
#[must_use]
pub fn half_cycles(kind: CycleCostKind) -> u64 {
    u64::from(cycle_cost(kind).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{cycle_cost, half_cycles, CycleCostKind, CYCLE_COST_TABLE};

    #[test]
    fn table_contains_unique_kinds() {
        let kinds: HashSet<_> = CYCLE_COST_TABLE.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds.len(), CYCLE_COST_TABLE.len());
    }

    #[test]
    fn memory_cycles_cost_two_half_cycles() {
        assert_eq!(cycle_cost(CycleCostKind::Fetch), Some(2));
        assert_eq!(cycle_cost(CycleCostKind::Indirect), Some(2));
        assert_eq!(cycle_cost(CycleCostKind::Operand), Some(2));
        assert_eq!(cycle_cost(CycleCostKind::ReadModifyWrite), Some(4));
        assert_eq!(half_cycles(CycleCostKind::ShiftStep), 1);
    }

    #[test]
    fn every_table_entry_resolves_via_lookup() {
        for (kind, expected_cycles) in CYCLE_COST_TABLE {
            assert_eq!(cycle_cost(*kind), Some(*expected_cycles));
        }
    }
}
