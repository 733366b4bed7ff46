//! Shared fixtures: a processor factory and a scriptable test device.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use h316_core::{CoreConfig, CoreState, Device, DeviceError, InstructionCatalog, Processor};

/// Everything a [`TestDevice`] observed, shared with the test body.
#[derive(Debug, Default)]
pub struct Log {
    /// `(half-cycle time, reason)` of every event callback.
    pub events: Vec<(u64, i32)>,
    /// Masks received through `SMK`.
    pub masks: Vec<u16>,
    /// Words accepted through `OTA`.
    pub outputs: Vec<u16>,
    /// `(data, end_of_record)` of every DMA exchange.
    pub dma: Vec<(u16, bool)>,
}

pub type SharedLog = Rc<RefCell<Log>>;

/// Function codes understood by [`TestDevice`].
pub const OCP_SCHEDULE: u16 = 0;
pub const OCP_RAISE_INTERRUPT: u16 = 1;
pub const OCP_CLEAR_INTERRUPT: u16 = 2;

/// Device whose behavior is set up per test.
pub struct TestDevice {
    pub address: u8,
    pub log: SharedLog,
    /// Word returned by `INA` and by input DMA exchanges.
    pub input: u16,
    /// DMA channel served, if any.
    pub channel: Option<u8>,
    /// Delay used by `OCP` function 0.
    pub delay: u64,
    /// Reschedule every event after this many half-cycles.
    pub reschedule: Option<u64>,
    /// Interrupt request bit raised by `OCP` function 1.
    pub interrupt_bit: u16,
}

impl TestDevice {
    pub fn new(address: u8) -> (Self, SharedLog) {
        let log = SharedLog::default();
        let device = Self {
            address,
            log: Rc::clone(&log),
            input: 0,
            channel: None,
            delay: 100,
            reschedule: None,
            interrupt_bit: 1,
        };
        (device, log)
    }
}

const fn function(instr: u16) -> u16 {
    (instr >> 6) & 0o17
}

impl Device for TestDevice {
    fn name(&self) -> &str {
        "test"
    }

    fn ina(&mut self, _state: &mut CoreState, instr: u16) -> Result<Option<u16>, DeviceError> {
        match function(instr) {
            0 | 0o10 => Ok(Some(self.input)),
            1 => Ok(None),
            _ => Err(DeviceError::Unsupported),
        }
    }

    fn ocp(&mut self, state: &mut CoreState, instr: u16) -> Result<(), DeviceError> {
        match function(instr) {
            OCP_SCHEDULE => state.schedule(self.delay, self.address, 1),
            OCP_RAISE_INTERRUPT => state.set_interrupt(self.interrupt_bit),
            OCP_CLEAR_INTERRUPT => state.clear_interrupt(self.interrupt_bit),
            _ => return Err(DeviceError::Unsupported),
        }
        Ok(())
    }

    fn sks(&mut self, _state: &mut CoreState, instr: u16) -> Result<bool, DeviceError> {
        Ok(function(instr) == 0)
    }

    fn ota(&mut self, _state: &mut CoreState, _instr: u16, data: u16) -> Result<bool, DeviceError> {
        self.log.borrow_mut().outputs.push(data);
        Ok(true)
    }

    fn smk(&mut self, _state: &mut CoreState, mask: u16) {
        self.log.borrow_mut().masks.push(mask);
    }

    fn event(&mut self, state: &mut CoreState, reason: i32) {
        self.log.borrow_mut().events.push((state.half_cycles(), reason));
        if let (Some(delay), true) = (self.reschedule, reason >= 0) {
            state.schedule(delay, self.address, reason);
        }
    }

    fn dmc(
        &mut self,
        _state: &mut CoreState,
        data: u16,
        end_of_record: bool,
    ) -> Result<u16, DeviceError> {
        self.log.borrow_mut().dma.push((data, end_of_record));
        if self.channel.is_some() {
            Ok(self.input)
        } else {
            Err(DeviceError::NotDmaCapable)
        }
    }

    fn dma_channel(&self) -> Option<u8> {
        self.channel
    }
}

pub fn catalog() -> Arc<InstructionCatalog> {
    Arc::new(InstructionCatalog::standard().expect("standard catalog builds"))
}

pub fn processor() -> Processor {
    Processor::new(catalog(), CoreConfig::default())
}

/// Loads `program` at `origin`, points P at it and sets the run flag.
pub fn running_at(origin: u16, program: &[u16]) -> Processor {
    let mut cpu = processor();
    cpu.load(origin, program);
    cpu.set_p(origin);
    cpu.start();
    cpu
}

/// Attaches a fresh [`TestDevice`] and returns its log.
pub fn attach(cpu: &mut Processor, device: TestDevice) -> SharedLog {
    let log = Rc::clone(&device.log);
    let address = device.address;
    cpu.attach(address, Box::new(device));
    log
}
