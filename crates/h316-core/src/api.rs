//! Public host-facing configuration and outcome types.

use crate::memory::{BASIC_ADDRESS_MASK, EXTENDED_ADDRESS_MASK};

/// Default capacity of the circular execution trace.
pub const DEFAULT_TRACE_CAPACITY: usize = 64;

/// Default limit on events drained at a single timestamp.
pub const DEFAULT_EVENT_WATCHDOG: usize = 10_000;

/// CPU model; selects the memory cycle time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CpuModel {
    /// Honeywell 316, 1.6 µs memory cycle.
    #[default]
    H316,
    /// DDP-516, 0.96 µs memory cycle.
    Ddp516,
}

impl CpuModel {
    /// Length of one half-cycle in nanoseconds.
    #[must_use]
    pub const fn half_cycle_ns(self) -> u64 {
        match self {
            Self::H316 => 800,
            Self::Ddp516 => 480,
        }
    }

    /// Converts a device delay in microseconds to half-cycles, rounding up
    /// so a delay never fires early.
    #[must_use]
    pub const fn half_cycles_for_us(self, microseconds: u64) -> u64 {
        microseconds.saturating_mul(1000).div_ceil(self.half_cycle_ns())
    }
}

/// Top-level configuration for a processor instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Model whose cycle time converts microsecond delays.
    pub model: CpuModel,
    /// Whether the extended-addressing option (32K, 15-bit addresses) is fitted.
    pub extended_memory: bool,
    /// Capacity of the circular execution trace.
    pub trace_capacity: usize,
    /// Maximum events drained at one timestamp before the run is declared
    /// divergent.
    pub event_watchdog: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            model: CpuModel::H316,
            extended_memory: true,
            trace_capacity: DEFAULT_TRACE_CAPACITY,
            event_watchdog: DEFAULT_EVENT_WATCHDOG,
        }
    }
}

impl CoreConfig {
    /// Mask applied to every memory address.
    #[must_use]
    pub const fn address_mask(&self) -> u16 {
        if self.extended_memory {
            EXTENDED_ADDRESS_MASK
        } else {
            BASIC_ADDRESS_MASK
        }
    }
}

/// Break cycles that can preempt an instruction fetch, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BreakKind {
    /// Real-time clock tick: implied `IRS '61`.
    RealTimeClock,
    /// Direct memory channel service.
    Dma {
        /// Channel being serviced.
        channel: u8,
    },
    /// Priority interrupt: implied `JST* '63`.
    Interrupt,
    /// Memory-protect trap: implied `JST* '62`.
    MemoryProtect,
}

/// What one call to `step` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepOutcome {
    /// Only an instruction fetch happened; nothing was pending yet.
    Fetched,
    /// An instruction executed.
    Executed {
        /// Address the instruction was fetched from.
        addr: u16,
        /// Instruction word.
        word: u16,
    },
    /// A break cycle (or one DMA micro-cycle) executed.
    Break(BreakKind),
    /// The run flag dropped during this step.
    Halted,
}

/// Why a batched run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunOutcome {
    /// The run flag dropped after `steps` steps.
    Halted {
        /// Steps performed.
        steps: u64,
    },
    /// The step limit was reached with the machine still running.
    StepLimit {
        /// Steps performed.
        steps: u64,
    },
}

impl RunOutcome {
    /// Steps performed before returning.
    #[must_use]
    pub const fn steps(self) -> u64 {
        match self {
            Self::Halted { steps } | Self::StepLimit { steps } => steps,
        }
    }
}
