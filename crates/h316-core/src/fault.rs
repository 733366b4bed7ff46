use thiserror::Error;

/// Fault classes used for diagnostics aggregation and post-mortem reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Instruction word had no executor.
    Dispatch,
    /// A device rejected an I/O primitive.
    Io,
    /// Direct memory channel servicing failed.
    Dma,
    /// The event queue stopped making progress in simulated time.
    Timing,
}

/// Runtime faults raised by the processor.
///
/// None of these has a software-visible recovery path on the modeled
/// machine: the processor stops, logs its post-mortem and hands the fault
/// back to the host, which is expected to end the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Dispatch reached a word with neither a defined nor a fallback executor.
    #[error("undefined instruction '{word:06o} at '{addr:05o}")]
    UndefinedInstruction {
        /// Raw instruction word.
        word: u16,
        /// Address the word was fetched from.
        addr: u16,
    },
    /// A device does not recognize the function field of an I/O instruction.
    #[error("device '{device:02o} does not implement '{instr:06o}")]
    UnsupportedIo {
        /// 6-bit device address.
        device: u8,
        /// Raw I/O instruction word.
        instr: u16,
    },
    /// I/O instruction addressed an unpopulated device slot.
    #[error("no device at address '{device:02o} for '{instr:06o}")]
    NoDevice {
        /// 6-bit device address.
        device: u8,
        /// Raw I/O instruction word.
        instr: u16,
    },
    /// A DMA exchange reached a device without a direct memory channel.
    #[error("device '{device:02o} is not DMA capable")]
    NotDmaCapable {
        /// 6-bit device address.
        device: u8,
    },
    /// A DMA request was raised for a channel no device serves.
    #[error("no device serves DMA channel {channel}")]
    NoDmaDevice {
        /// Channel number (0-15).
        channel: u8,
    },
    /// More events became due at one timestamp than the watchdog allows.
    #[error("more than {limit} events due at half-cycle {time}; device scheduling diverged")]
    SimulationDivergence {
        /// Configured per-timestamp watchdog limit.
        limit: usize,
        /// Master clock value at which the limit was hit.
        time: u64,
    },
}

impl Fault {
    /// Returns the diagnostics class for this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::UndefinedInstruction { .. } => FaultClass::Dispatch,
            Self::UnsupportedIo { .. } | Self::NoDevice { .. } => FaultClass::Io,
            Self::NotDmaCapable { .. } | Self::NoDmaDevice { .. } => FaultClass::Dma,
            Self::SimulationDivergence { .. } => FaultClass::Timing,
        }
    }

    /// Every runtime fault aborts the run.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        true
    }
}

/// Consistency defects detected while building the dispatch table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum CatalogError {
    /// An alias group contains no populated member.
    #[error("alias group {group:?} has no proper instruction")]
    AliasWithoutProper {
        /// Opcode values of the group.
        group: Vec<u16>,
    },
    /// An alias group contains more than one populated member.
    #[error("alias group {group:?} has {} proper instructions", .proper.len())]
    AmbiguousAlias {
        /// Opcode values of the group.
        group: Vec<u16>,
        /// Members that were already populated.
        proper: Vec<u16>,
    },
    /// Two primary definitions expand onto the same instruction word.
    #[error("'{word:06o} claimed by both {first} and {second}")]
    OverlappingDefinition {
        /// Contested instruction word.
        word: u16,
        /// Mnemonic that populated the word first.
        first: String,
        /// Mnemonic that tried to populate it again.
        second: String,
    },
}
