//! Cycle-accurate instruction engine for the Honeywell 316 / DDP-516.

/// Core memory store and address masks.
pub mod memory;
pub use memory::{CoreMemory, BASIC_ADDRESS_MASK, EXTENDED_ADDRESS_MASK, MEMORY_WORDS};

/// Host-facing configuration and step/run outcome types.
pub mod api;
pub use api::{
    BreakKind, CoreConfig, CpuModel, RunOutcome, StepOutcome, DEFAULT_EVENT_WATCHDOG,
    DEFAULT_TRACE_CAPACITY,
};

/// Fault and catalog error taxonomy.
pub mod fault;
pub use fault::{CatalogError, Fault, FaultClass};

/// Half-cycle cost table.
pub mod timing;
pub use timing::{cycle_cost, half_cycles, CycleCostKind, CYCLE_COST_TABLE};

/// Discrete-event queue of device callbacks.
pub mod event_queue;
pub use event_queue::{Event, EventQueue};

/// Registers, memory, clock and request lines shared with devices.
pub mod state;
pub use state::{
    ActiveDma, CoreState, DmaCycle, DmaState, InterruptState, Registers, SC_MASK,
    SENSE_SWITCH_COUNT, SIGN_BIT,
};

/// Peripheral contract and device registry.
pub mod device;
pub use device::{
    AbsentDevice, Device, DeviceError, DeviceRegistry, DEVICE_SLOTS, REASON_MASTER_CLEAR,
    REASON_RTC_OVERFLOW, RTC_DEVICE,
};

/// Instruction catalog, dispatch table and disassembler.
pub mod catalog;
pub use catalog::{
    CatalogStats, DispatchEntry, EntryOrigin, FallbackRange, InstructionCatalog,
    InstructionClass, InstructionDef,
};

/// Instruction executors and arithmetic microcode.
pub mod execute;
pub use execute::{skip::skip_taken, shift::shift_count, Executor};

/// Circular execution trace.
pub mod trace;
pub use trace::{TraceBuffer, TraceRecord};

/// Fetch/break/execute state machine.
pub mod processor;
pub use processor::{
    Processor, DMA_CHANNEL_BASE, INTERRUPT_VECTOR, MEMORY_PROTECT_VECTOR, RTC_COUNTER,
};

#[cfg(test)]
use proptest as _;
