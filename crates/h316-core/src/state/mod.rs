//! Processor state visible to devices: registers, memory, clock, event
//! queue and the interrupt, DMA and clock request lines.

/// Architectural register file.
pub mod registers;

pub use registers::{Registers, SC_MASK, SENSE_SWITCH_COUNT, SIGN_BIT};

use tracing::{event, Level};

use crate::{CoreConfig, CoreMemory, EventQueue};

/// DMA micro-cycles of one channel service, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DmaCycle {
    /// Read the channel's current-address word.
    ReadAddress,
    /// Read the end-address word and compare.
    TestEnd,
    /// Exchange one word with the device.
    Transfer,
    /// Store the advanced address back to the channel pair.
    WriteBack,
}

/// A channel service in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ActiveDma {
    /// Channel being serviced.
    pub channel: u8,
    /// Next micro-cycle to execute.
    pub cycle: DmaCycle,
    /// Current-address word as read in the first micro-cycle.
    pub control: u16,
    /// Whether the transfer reached the end address.
    pub end_of_record: bool,
}

/// Direct memory channel request lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DmaState {
    /// One request bit per channel; bit *n* is channel *n*.
    pub requests: u16,
    /// Service in progress, if any.
    pub active: Option<ActiveDma>,
}

/// Priority-interrupt lines and enables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InterruptState {
    /// Request bits raised by devices.
    pub requests: u16,
    /// Priority interrupts enabled.
    pub enabled: bool,
    /// `ENB` executed; interrupts enable after the next instruction.
    pub enable_pending: bool,
    /// Last mask broadcast by `SMK`.
    pub mask: u16,
    /// Front-panel start button pressed while enabled.
    pub start_button: bool,
}

/// Everything the processor owns except its devices and dispatch table.
///
/// Devices receive `&mut CoreState` in every callback, which is the only
/// path through which they touch memory, the clock or request lines.
#[derive(Debug, Clone)]
pub struct CoreState {
    /// Architectural registers other than X.
    pub regs: Registers,
    x: u16,
    memory: CoreMemory,
    clock: u64,
    events: EventQueue,
    /// Interrupt request lines.
    pub interrupts: InterruptState,
    /// DMA request lines and the channel in service.
    pub dma: DmaState,
    /// Real-time clock tick pending.
    pub rtc_request: bool,
    /// Memory-protect trap pending.
    pub mp_fault: bool,
    running: bool,
    config: CoreConfig,
}

impl CoreState {
    /// Creates a cleared, halted machine.
    #[must_use]
    pub fn new(config: CoreConfig) -> Self {
        Self {
            regs: Registers::default(),
            x: 0,
            memory: CoreMemory::new(),
            clock: 0,
            events: EventQueue::new(),
            interrupts: InterruptState::default(),
            dma: DmaState::default(),
            rtc_request: false,
            mp_fault: false,
            running: false,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Mask applied to every memory address.
    #[must_use]
    pub const fn address_mask(&self) -> u16 {
        self.config.address_mask()
    }

    /// Memory location that holds the live X register.
    #[must_use]
    pub const fn x_location(&self) -> u16 {
        self.regs.j & self.config.address_mask()
    }

    /// Reads the word at `addr`.
    #[must_use]
    pub fn read(&self, addr: u16) -> u16 {
        self.memory.read(addr & self.address_mask())
    }

    /// Writes `value` at `addr`; writing X's location also loads X.
    pub fn write(&mut self, addr: u16, value: u16) {
        let addr = addr & self.address_mask();
        if addr == self.x_location() {
            self.x = value;
        }
        self.memory.write(addr, value);
    }

    /// Index register.
    #[must_use]
    pub const fn x(&self) -> u16 {
        self.x
    }

    /// Loads X and mirrors it into its memory location.
    pub fn set_x(&mut self, value: u16) {
        self.x = value;
        let location = self.x_location();
        self.memory.write(location, value);
    }

    /// Moves the base sector; X follows its new location.
    pub fn set_j(&mut self, value: u16) {
        self.regs.j = value & self.address_mask();
        self.x = self.memory.read(self.x_location());
    }

    /// Sets P and Y together, as the front panel does.
    pub const fn set_p_and_y(&mut self, value: u16) {
        let value = value & self.config.address_mask();
        self.regs.p = value;
        self.regs.y = value;
    }

    /// Read-only view of memory for dumps.
    #[must_use]
    pub const fn memory(&self) -> &CoreMemory {
        &self.memory
    }

    /// Clears the dump bitmap.
    pub fn clear_modified(&mut self) {
        self.memory.clear_modified();
    }

    /// Master clock in half-cycles.
    #[must_use]
    pub const fn half_cycles(&self) -> u64 {
        self.clock
    }

    /// Advances the master clock; wraps at 2^64.
    pub const fn advance(&mut self, half_cycles: u64) {
        self.clock = self.clock.wrapping_add(half_cycles);
    }

    pub(crate) const fn set_clock(&mut self, time: u64) {
        self.clock = time;
    }

    /// Schedules `device`'s event handler `delay` half-cycles from now.
    pub fn schedule(&mut self, delay: u64, device: u8, reason: i32) {
        let due = self.clock.wrapping_add(delay);
        self.events.schedule(due, device & 0o77, reason);
    }

    /// Schedules `device`'s event handler `microseconds` from now using the
    /// configured model's cycle time.
    pub fn schedule_us(&mut self, microseconds: u64, device: u8, reason: i32) {
        let delay = self.config.model.half_cycles_for_us(microseconds);
        self.schedule(delay, device, reason);
    }

    /// Pending device callbacks.
    #[must_use]
    pub const fn events(&self) -> &EventQueue {
        &self.events
    }

    pub(crate) const fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Raises interrupt request bits.
    pub fn set_interrupt(&mut self, bits: u16) {
        if self.interrupts.requests & bits != bits {
            event!(Level::DEBUG, bits, "interrupt raised");
        }
        self.interrupts.requests |= bits;
    }

    /// Drops interrupt request bits.
    pub const fn clear_interrupt(&mut self, bits: u16) {
        self.interrupts.requests &= !bits;
    }

    /// Raises DMA request bits; bit *n* requests channel *n*.
    pub const fn set_dma_request(&mut self, channel_bits: u16) {
        self.dma.requests |= channel_bits;
    }

    /// Raises the real-time clock request.
    pub const fn set_rtc_request(&mut self) {
        self.rtc_request = true;
    }

    /// Presses the front-panel start button; taken as an interrupt once
    /// interrupts are enabled.
    pub const fn request_start_interrupt(&mut self) {
        self.interrupts.start_button = true;
    }

    /// Reads sense switch `n` (1-4).
    #[must_use]
    pub fn sense_switch(&self, n: usize) -> bool {
        self.regs.sense_switch(n)
    }

    /// Sets sense switch `n` (1-4); other values are ignored.
    pub fn set_sense_switch(&mut self, n: usize, on: bool) {
        if let Some(switch) = n.checked_sub(1).and_then(|index| self.regs.sense.get_mut(index)) {
            *switch = on;
        }
    }

    /// Run flag.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Sets the run flag.
    pub const fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Reports a memory-protect violation. In restrict mode a trap is
    /// queued; otherwise the machine halts.
    pub fn memory_protect_violation(&mut self) {
        if self.regs.restrict {
            self.mp_fault = true;
        } else {
            event!(
                Level::WARN,
                p = self.regs.p,
                "memory protect violation outside restrict mode; halting"
            );
            self.running = false;
        }
    }

    /// Clears registers, flags and request lines and drops every pending
    /// event. Memory, X, P, Y and J survive.
    pub fn master_clear(&mut self) {
        self.regs.master_clear();
        self.interrupts = InterruptState::default();
        self.dma = DmaState::default();
        self.rtc_request = false;
        self.mp_fault = false;
        self.running = false;
        self.events.discard_all();
    }
}
