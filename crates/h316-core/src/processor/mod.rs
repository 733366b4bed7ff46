//! Fetch/break/execute state machine.
//!
//! Each [`Processor::step`] executes what the previous step left pending,
//! selects the next break or fetches the next instruction, charges the
//! fetch and fires the device callbacks that became due.

mod address;
mod dump;

use std::sync::Arc;

use tracing::{event, Level};

use crate::device::{REASON_RTC_OVERFLOW, RTC_DEVICE};
use crate::execute::memory_reference::jump_and_store;
use crate::state::{ActiveDma, DmaCycle, Registers};
use crate::timing::{half_cycles, CycleCostKind};
use crate::trace::{TraceBuffer, TraceRecord};
use crate::{
    BreakKind, CoreConfig, CoreState, Device, DeviceRegistry, Fault, InstructionCatalog,
    RunOutcome, StepOutcome,
};

/// Counter incremented by every real-time-clock break.
pub const RTC_COUNTER: u16 = 0o61;
/// Indirect vector of the memory-protect break.
pub const MEMORY_PROTECT_VECTOR: u16 = 0o62;
/// Indirect vector of the priority-interrupt break.
pub const INTERRUPT_VECTOR: u16 = 0o63;
/// First word of the channel 0 address pair; channel *n* uses
/// `DMA_CHANNEL_BASE + 2n` and the word after it.
pub const DMA_CHANNEL_BASE: u16 = 0o20;

/// Control-word bit selecting device-to-memory transfers.
const DMA_INPUT: u16 = 0x8000;
const DMA_ADDRESS: u16 = 0x7FFF;

/// Work selected at the end of one step and carried out by the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Instruction,
    Break(BreakKind),
}

/// The CPU: state, devices and the shared dispatch table.
#[derive(Debug)]
pub struct Processor {
    pub(crate) state: CoreState,
    pub(crate) devices: DeviceRegistry,
    catalog: Arc<InstructionCatalog>,
    trace: TraceBuffer,
    pending: Option<Pending>,
}

impl Processor {
    /// Creates a halted processor with cleared memory and no devices.
    #[must_use]
    pub fn new(catalog: Arc<InstructionCatalog>, config: CoreConfig) -> Self {
        let trace = TraceBuffer::with_capacity(config.trace_capacity);
        Self {
            state: CoreState::new(config),
            devices: DeviceRegistry::new(),
            catalog,
            trace,
            pending: None,
        }
    }

    /// Installs `device` at `address`, returning the previous occupant.
    pub fn attach(&mut self, address: u8, device: Box<dyn Device>) -> Option<Box<dyn Device>> {
        self.devices.attach(address, device)
    }

    /// Device registry.
    #[must_use]
    pub const fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    /// Dispatch table in use.
    #[must_use]
    pub fn catalog(&self) -> &InstructionCatalog {
        &self.catalog
    }

    /// Processor state.
    #[must_use]
    pub const fn state(&self) -> &CoreState {
        &self.state
    }

    /// Mutable processor state, for front-panel style manipulation.
    pub const fn state_mut(&mut self) -> &mut CoreState {
        &mut self.state
    }

    /// Register file.
    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.state.regs
    }

    /// Mutable register file.
    pub const fn registers_mut(&mut self) -> &mut Registers {
        &mut self.state.regs
    }

    /// Copies `words` into memory starting at `addr`.
    pub fn load(&mut self, addr: u16, words: &[u16]) {
        let mut target = addr;
        for word in words {
            self.state.write(target, *word);
            target = target.wrapping_add(1);
        }
    }

    /// Reads memory.
    #[must_use]
    pub fn read(&self, addr: u16) -> u16 {
        self.state.read(addr)
    }

    /// Writes memory, loading X when the word is X's location.
    pub fn write(&mut self, addr: u16, value: u16) {
        self.state.write(addr, value);
    }

    /// A register.
    #[must_use]
    pub const fn a(&self) -> u16 {
        self.state.regs.a
    }

    /// Loads A.
    pub const fn set_a(&mut self, value: u16) {
        self.state.regs.a = value;
    }

    /// B register.
    #[must_use]
    pub const fn b(&self) -> u16 {
        self.state.regs.b
    }

    /// Loads B.
    pub const fn set_b(&mut self, value: u16) {
        self.state.regs.b = value;
    }

    /// Index register.
    #[must_use]
    pub const fn x(&self) -> u16 {
        self.state.x()
    }

    /// Loads X and its memory location.
    pub fn set_x(&mut self, value: u16) {
        self.state.set_x(value);
    }

    /// Program counter.
    #[must_use]
    pub const fn p(&self) -> u16 {
        self.state.regs.p
    }

    /// Sets P and Y together and drops any pending work, so the next step
    /// fetches from the new address.
    pub fn set_p(&mut self, value: u16) {
        self.state.set_p_and_y(value);
        self.pending = None;
    }

    /// Memory buffer register.
    #[must_use]
    pub const fn m(&self) -> u16 {
        self.state.regs.m
    }

    /// Last effective or fetch address.
    #[must_use]
    pub const fn y(&self) -> u16 {
        self.state.regs.y
    }

    /// Base-sector register.
    #[must_use]
    pub const fn j(&self) -> u16 {
        self.state.regs.j
    }

    /// Moves the base sector.
    pub fn set_j(&mut self, value: u16) {
        self.state.set_j(value);
    }

    /// Shift counter.
    #[must_use]
    pub const fn sc(&self) -> u16 {
        self.state.regs.sc
    }

    /// Carry flag.
    #[must_use]
    pub const fn carry(&self) -> bool {
        self.state.regs.c
    }

    /// Master clock in half-cycles.
    #[must_use]
    pub const fn half_cycles(&self) -> u64 {
        self.state.half_cycles()
    }

    /// Sets the run flag.
    pub const fn start(&mut self) {
        self.state.set_running(true);
    }

    /// Clears the run flag.
    pub const fn stop(&mut self) {
        self.state.set_running(false);
    }

    /// Run flag.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Presses the start button; serviced as an interrupt once enabled.
    pub const fn request_start_interrupt(&mut self) {
        self.state.request_start_interrupt();
    }

    /// Raises the real-time-clock request.
    pub const fn set_rtc_request(&mut self) {
        self.state.set_rtc_request();
    }

    /// Execution trace.
    #[must_use]
    pub const fn trace(&self) -> &TraceBuffer {
        &self.trace
    }

    /// Resets registers, flags and request lines, discards every pending
    /// event and sends every device a master-clear event. Memory survives.
    pub fn master_clear(&mut self) {
        event!(Level::INFO, p = self.state.regs.p, "master clear");
        self.state.master_clear();
        self.devices.master_clear_all(&mut self.state);
        self.pending = None;
    }

    /// Runs one step of the state machine.
    ///
    /// # Errors
    ///
    /// Every [`Fault`] is fatal: the run flag is cleared, the post-mortem
    /// is logged at `ERROR` and the fault is returned.
    pub fn step(&mut self) -> Result<StepOutcome, Fault> {
        self.advance_one().inspect_err(|fault| {
            self.state.set_running(false);
            event!(Level::ERROR, %fault, class = ?fault.class(), "processor fault");
            event!(Level::ERROR, "{}", self.post_mortem());
        })
    }

    /// Steps until the run flag drops or `max_steps` steps have run.
    ///
    /// # Errors
    ///
    /// Propagates the first [`Fault`] raised by [`Processor::step`].
    pub fn run(&mut self, max_steps: u64) -> Result<RunOutcome, Fault> {
        let mut steps = 0;
        while steps < max_steps {
            if !self.state.is_running() {
                return Ok(RunOutcome::Halted { steps });
            }
            self.step()?;
            steps += 1;
        }
        Ok(if self.state.is_running() {
            RunOutcome::StepLimit { steps }
        } else {
            RunOutcome::Halted { steps }
        })
    }

    fn advance_one(&mut self) -> Result<StepOutcome, Fault> {
        let was_running = self.state.is_running();

        let outcome = match self.pending.take() {
            None => StepOutcome::Fetched,
            Some(Pending::Instruction) => {
                let (addr, word) = self.execute_instruction()?;
                self.record(addr, word, None);
                StepOutcome::Executed { addr, word }
            }
            Some(Pending::Break(kind)) => {
                self.execute_break(kind)?;
                self.record(self.state.regs.p, 0, Some(kind));
                StepOutcome::Break(kind)
            }
        };

        let fetched = match self.select_break() {
            Some(kind) => {
                self.pending = Some(Pending::Break(kind));
                false
            }
            None => {
                let p = self.state.regs.p;
                self.state.regs.y = p;
                self.state.regs.m = self.state.read(p);
                self.pending = Some(Pending::Instruction);
                true
            }
        };

        self.state.advance(half_cycles(CycleCostKind::Fetch));
        if fetched {
            self.fire_due_events()?;
        }

        let interrupts = &mut self.state.interrupts;
        if interrupts.enable_pending && self.state.dma.active.is_none() {
            interrupts.enabled = true;
            interrupts.enable_pending = false;
        }

        Ok(if was_running && !self.state.is_running() { StepOutcome::Halted } else { outcome })
    }

    fn execute_instruction(&mut self) -> Result<(u16, u16), Fault> {
        let addr = self.state.regs.p;
        let word = self.state.regs.m;
        self.state.regs.p = addr.wrapping_add(1) & self.state.address_mask();
        event!(Level::TRACE, addr, word, "execute");
        let executor = self
            .catalog
            .entry(word)
            .executor
            .ok_or(Fault::UndefinedInstruction { word, addr })?;
        executor(self, word)?;
        Ok((addr, word))
    }

    /// Picks the break to run next, highest priority first, and consumes
    /// the request that caused it.
    fn select_break(&mut self) -> Option<BreakKind> {
        let state = &mut self.state;
        if let Some(active) = state.dma.active {
            return Some(BreakKind::Dma { channel: active.channel });
        }
        if state.rtc_request {
            state.rtc_request = false;
            return Some(BreakKind::RealTimeClock);
        }
        if state.dma.requests != 0 {
            #[allow(clippy::cast_possible_truncation)]
            let channel = state.dma.requests.trailing_zeros() as u8;
            state.dma.requests &= !(1 << channel);
            state.dma.active = Some(ActiveDma {
                channel,
                cycle: DmaCycle::ReadAddress,
                control: 0,
                end_of_record: false,
            });
            return Some(BreakKind::Dma { channel });
        }
        let interrupts = &mut state.interrupts;
        if interrupts.enabled && (interrupts.requests != 0 || interrupts.start_button) {
            interrupts.enabled = false;
            interrupts.start_button = false;
            state.regs.extend = true;
            state.regs.extend_disable_pending = false;
            return Some(BreakKind::Interrupt);
        }
        if state.mp_fault {
            state.mp_fault = false;
            return Some(BreakKind::MemoryProtect);
        }
        None
    }

    fn execute_break(&mut self, kind: BreakKind) -> Result<(), Fault> {
        match kind {
            BreakKind::RealTimeClock => {
                let count = self.state.read(RTC_COUNTER).wrapping_add(1);
                self.state.write(RTC_COUNTER, count);
                self.state.advance(half_cycles(CycleCostKind::ReadModifyWrite));
                if count == 0 {
                    self.devices.event(&mut self.state, RTC_DEVICE, REASON_RTC_OVERFLOW);
                }
            }
            BreakKind::Interrupt => {
                event!(Level::DEBUG, p = self.state.regs.p, "interrupt break");
                self.vectored_jump(INTERRUPT_VECTOR);
            }
            BreakKind::MemoryProtect => {
                event!(Level::DEBUG, p = self.state.regs.p, "memory protect break");
                self.state.regs.restrict = false;
                self.vectored_jump(MEMORY_PROTECT_VECTOR);
            }
            BreakKind::Dma { .. } => self.dma_cycle()?,
        }
        Ok(())
    }

    /// Implied `JST*` through a low-core vector.
    fn vectored_jump(&mut self, vector: u16) {
        let target = self.state.read(vector) & self.state.address_mask();
        self.state.advance(half_cycles(CycleCostKind::Indirect));
        jump_and_store(self, target);
    }

    /// Runs the next micro-cycle of the channel in service.
    fn dma_cycle(&mut self) -> Result<(), Fault> {
        let Some(mut active) = self.state.dma.active else {
            return Ok(());
        };
        let pair = DMA_CHANNEL_BASE + 2 * u16::from(active.channel);
        self.state.advance(half_cycles(CycleCostKind::DmaMicroCycle));
        match active.cycle {
            DmaCycle::ReadAddress => {
                active.control = self.state.read(pair);
                active.cycle = DmaCycle::TestEnd;
            }
            DmaCycle::TestEnd => {
                let end = self.state.read(pair + 1);
                active.end_of_record = active.control & DMA_ADDRESS == end & DMA_ADDRESS;
                active.cycle = DmaCycle::Transfer;
            }
            DmaCycle::Transfer => {
                let addr = active.control & DMA_ADDRESS;
                let (channel, eor) = (active.channel, active.end_of_record);
                if active.control & DMA_INPUT != 0 {
                    let data = self.devices.dmc(&mut self.state, channel, 0, eor)?;
                    self.state.write(addr, data);
                } else {
                    let data = self.state.read(addr);
                    self.devices.dmc(&mut self.state, channel, data, eor)?;
                }
                active.cycle = DmaCycle::WriteBack;
            }
            DmaCycle::WriteBack => {
                let next = active.control.wrapping_add(1) & DMA_ADDRESS;
                self.state.write(pair, (active.control & DMA_INPUT) | next);
                event!(
                    Level::TRACE,
                    channel = active.channel,
                    end_of_record = active.end_of_record,
                    "dma word transferred"
                );
                self.state.dma.active = None;
                return Ok(());
            }
        }
        self.state.dma.active = Some(active);
        Ok(())
    }

    /// Fires every callback due now. While halted, fires everything that
    /// was queued, moving the clock forward to each event's due time.
    fn fire_due_events(&mut self) -> Result<(), Fault> {
        let running = self.state.is_running();
        let horizon = if running {
            self.state.half_cycles()
        } else {
            match self.state.events().peek_last_time() {
                Some(last) => last,
                None => return Ok(()),
            }
        };
        let limit = self.state.config().event_watchdog;
        let mut timestamp = None;
        let mut fired_at_timestamp = 0;
        while let Some(due) = self.state.events_mut().pop_due(horizon) {
            if timestamp == Some(due.due) {
                fired_at_timestamp += 1;
            } else {
                timestamp = Some(due.due);
                fired_at_timestamp = 1;
            }
            if fired_at_timestamp > limit {
                return Err(Fault::SimulationDivergence { limit, time: due.due });
            }
            if !running && due.due > self.state.half_cycles() {
                self.state.set_clock(due.due);
            }
            self.devices.event(&mut self.state, due.device, due.reason);
        }
        Ok(())
    }

    fn record(&mut self, p: u16, word: u16, break_kind: Option<BreakKind>) {
        let regs = &self.state.regs;
        self.trace.push(TraceRecord {
            time: self.state.half_cycles(),
            a: regs.a,
            b: regs.b,
            x: self.state.x(),
            c: regs.c,
            p,
            word,
            break_kind,
        });
    }
}
