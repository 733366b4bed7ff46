//! Peripheral contract and the 64-slot device registry.

use std::fmt;

use thiserror::Error;
use tracing::{event, Level};

use crate::{CoreState, Fault};

/// Number of device addresses (6-bit field).
pub const DEVICE_SLOTS: usize = 64;

/// Reason code sent to every device on master clear.
pub const REASON_MASTER_CLEAR: i32 = -1;

/// Reason code sent to the clock device when the real-time-clock counter
/// wraps to zero.
pub const REASON_RTC_OVERFLOW: i32 = -2;

/// Device address that receives [`REASON_RTC_OVERFLOW`].
pub const RTC_DEVICE: u8 = 0o20;

/// Why a device refused an operation. The registry widens these into
/// [`Fault`]s carrying the device address and instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum DeviceError {
    /// The function field names no operation of this device.
    #[error("unsupported function")]
    Unsupported,
    /// No device is fitted at this address.
    #[error("no device")]
    Absent,
    /// `dmc` reached a device without a direct memory channel.
    #[error("not DMA capable")]
    NotDmaCapable,
}

/// Capability set every peripheral implements.
///
/// The processor calls these at instruction and event boundaries and passes
/// its own state so a device can schedule callbacks, move request lines or
/// touch memory.
pub trait Device {
    /// Short human-readable name for dumps.
    fn name(&self) -> &str;

    /// `INA`: returns the input word when the device is ready.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unsupported`] for unknown function codes.
    fn ina(&mut self, state: &mut CoreState, instr: u16) -> Result<Option<u16>, DeviceError>;

    /// `OCP`: output control pulse.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unsupported`] for unknown function codes.
    fn ocp(&mut self, state: &mut CoreState, instr: u16) -> Result<(), DeviceError>;

    /// `SKS`: returns `true` when the tested condition holds.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unsupported`] for unknown function codes.
    fn sks(&mut self, state: &mut CoreState, instr: u16) -> Result<bool, DeviceError>;

    /// `OTA`: offers `data`; returns `true` when the device accepted it.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unsupported`] for unknown function codes.
    fn ota(&mut self, state: &mut CoreState, instr: u16, data: u16) -> Result<bool, DeviceError>;

    /// `SMK`: the interrupt mask broadcast to every device.
    fn smk(&mut self, _state: &mut CoreState, _mask: u16) {}

    /// A scheduled callback became due, or [`REASON_MASTER_CLEAR`].
    fn event(&mut self, state: &mut CoreState, reason: i32);

    /// DMA micro-cycle exchange. Input devices return the word to store;
    /// output devices receive the word read from memory.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NotDmaCapable`] unless overridden.
    fn dmc(
        &mut self,
        _state: &mut CoreState,
        _data: u16,
        _end_of_record: bool,
    ) -> Result<u16, DeviceError> {
        Err(DeviceError::NotDmaCapable)
    }

    /// Channel this device serves, if it is DMA capable.
    fn dma_channel(&self) -> Option<u8> {
        None
    }
}

/// Slot filler for unpopulated addresses: every I/O primitive fails,
/// master clear and mask broadcasts are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsentDevice;

impl Device for AbsentDevice {
    fn name(&self) -> &str {
        "none"
    }

    fn ina(&mut self, _state: &mut CoreState, _instr: u16) -> Result<Option<u16>, DeviceError> {
        Err(DeviceError::Absent)
    }

    fn ocp(&mut self, _state: &mut CoreState, _instr: u16) -> Result<(), DeviceError> {
        Err(DeviceError::Absent)
    }

    fn sks(&mut self, _state: &mut CoreState, _instr: u16) -> Result<bool, DeviceError> {
        Err(DeviceError::Absent)
    }

    fn ota(&mut self, _state: &mut CoreState, _instr: u16, _data: u16) -> Result<bool, DeviceError> {
        Err(DeviceError::Absent)
    }

    fn event(&mut self, _state: &mut CoreState, _reason: i32) {}
}

const fn io_fault(error: DeviceError, device: u8, instr: u16) -> Fault {
    match error {
        DeviceError::Unsupported => Fault::UnsupportedIo { device, instr },
        DeviceError::Absent => Fault::NoDevice { device, instr },
        DeviceError::NotDmaCapable => Fault::NotDmaCapable { device },
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn device_of(instr: u16) -> u8 {
    (instr & 0o77) as u8
}

/// Owns one device per 6-bit address.
pub struct DeviceRegistry {
    slots: Vec<Box<dyn Device>>,
    present: [bool; DEVICE_SLOTS],
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.slots
                    .iter()
                    .enumerate()
                    .filter(|(address, _)| self.present[*address])
                    .map(|(address, device)| (address, device.name())),
            )
            .finish()
    }
}

impl DeviceRegistry {
    /// Creates a registry with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: (0..DEVICE_SLOTS)
                .map(|_| Box::new(AbsentDevice) as Box<dyn Device>)
                .collect(),
            present: [false; DEVICE_SLOTS],
        }
    }

    /// Installs `device` at `address` (masked to 6 bits) and returns the
    /// previous occupant if there was one.
    pub fn attach(&mut self, address: u8, device: Box<dyn Device>) -> Option<Box<dyn Device>> {
        let index = usize::from(address & 0o77);
        event!(Level::DEBUG, address, name = device.name(), "device attached");
        let previous = std::mem::replace(&mut self.slots[index], device);
        std::mem::replace(&mut self.present[index], true).then_some(previous)
    }

    /// Returns `true` when a real device occupies `address`.
    #[must_use]
    pub fn is_present(&self, address: u8) -> bool {
        self.present[usize::from(address & 0o77)]
    }

    /// Name of the device at `address`.
    #[must_use]
    pub fn name(&self, address: u8) -> &str {
        self.slots[usize::from(address & 0o77)].name()
    }

    fn slot(&mut self, address: u8) -> &mut Box<dyn Device> {
        &mut self.slots[usize::from(address & 0o77)]
    }

    /// Forwards `INA` to the device addressed by `instr`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::NoDevice`] or [`Fault::UnsupportedIo`].
    pub fn ina(&mut self, state: &mut CoreState, instr: u16) -> Result<Option<u16>, Fault> {
        let device = device_of(instr);
        self.slot(device).ina(state, instr).map_err(|error| io_fault(error, device, instr))
    }

    /// Forwards `OCP` to the device addressed by `instr`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::NoDevice`] or [`Fault::UnsupportedIo`].
    pub fn ocp(&mut self, state: &mut CoreState, instr: u16) -> Result<(), Fault> {
        let device = device_of(instr);
        self.slot(device).ocp(state, instr).map_err(|error| io_fault(error, device, instr))
    }

    /// Forwards `SKS` to the device addressed by `instr`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::NoDevice`] or [`Fault::UnsupportedIo`].
    pub fn sks(&mut self, state: &mut CoreState, instr: u16) -> Result<bool, Fault> {
        let device = device_of(instr);
        self.slot(device).sks(state, instr).map_err(|error| io_fault(error, device, instr))
    }

    /// Forwards `OTA` to the device addressed by `instr`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::NoDevice`] or [`Fault::UnsupportedIo`].
    pub fn ota(&mut self, state: &mut CoreState, instr: u16, data: u16) -> Result<bool, Fault> {
        let device = device_of(instr);
        self.slot(device)
            .ota(state, instr, data)
            .map_err(|error| io_fault(error, device, instr))
    }

    /// Runs the event handler of the device at `address`.
    pub fn event(&mut self, state: &mut CoreState, address: u8, reason: i32) {
        self.slot(address).event(state, reason);
    }

    /// Exchanges one DMA word with the device serving `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::NoDmaDevice`] when no device serves the channel and
    /// [`Fault::NotDmaCapable`] when the device refuses the exchange.
    pub fn dmc(
        &mut self,
        state: &mut CoreState,
        channel: u8,
        data: u16,
        end_of_record: bool,
    ) -> Result<u16, Fault> {
        let address = self
            .slots
            .iter()
            .position(|device| device.dma_channel() == Some(channel))
            .ok_or(Fault::NoDmaDevice { channel })?;
        #[allow(clippy::cast_possible_truncation)]
        let device = address as u8;
        self.slot(device)
            .dmc(state, data, end_of_record)
            .map_err(|error| io_fault(error, device, 0))
    }

    /// Sends [`REASON_MASTER_CLEAR`] to every slot.
    pub fn master_clear_all(&mut self, state: &mut CoreState) {
        for device in &mut self.slots {
            device.event(state, REASON_MASTER_CLEAR);
        }
    }

    /// Broadcasts an `SMK` mask to every slot.
    pub fn set_interrupt_mask_all(&mut self, state: &mut CoreState, mask: u16) {
        for device in &mut self.slots {
            device.smk(state, mask);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{Device, DeviceError, DeviceRegistry, REASON_MASTER_CLEAR};
    use crate::{CoreConfig, CoreState, Fault};

    struct Probe {
        events: Rc<RefCell<Vec<i32>>>,
        masks: Rc<RefCell<Vec<u16>>>,
        channel: Option<u8>,
    }

    impl Device for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn ina(&mut self, _state: &mut CoreState, instr: u16) -> Result<Option<u16>, DeviceError> {
            match (instr >> 6) & 0o17 {
                0 => Ok(Some(0o101)),
                1 => Ok(None),
                _ => Err(DeviceError::Unsupported),
            }
        }

        fn ocp(&mut self, state: &mut CoreState, _instr: u16) -> Result<(), DeviceError> {
            state.schedule(10, 0o4, 3);
            Ok(())
        }

        fn sks(&mut self, _state: &mut CoreState, _instr: u16) -> Result<bool, DeviceError> {
            Ok(true)
        }

        fn ota(&mut self, _state: &mut CoreState, _instr: u16, _data: u16) -> Result<bool, DeviceError> {
            Err(DeviceError::Unsupported)
        }

        fn smk(&mut self, _state: &mut CoreState, mask: u16) {
            self.masks.borrow_mut().push(mask);
        }

        fn event(&mut self, _state: &mut CoreState, reason: i32) {
            self.events.borrow_mut().push(reason);
        }

        fn dma_channel(&self) -> Option<u8> {
            self.channel
        }
    }

    fn probe(channel: Option<u8>) -> (Box<Probe>, Rc<RefCell<Vec<i32>>>, Rc<RefCell<Vec<u16>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let masks = Rc::new(RefCell::new(Vec::new()));
        let device = Probe { events: Rc::clone(&events), masks: Rc::clone(&masks), channel };
        (Box::new(device), events, masks)
    }

    #[test]
    fn absent_slots_fault_with_device_address() {
        let mut registry = DeviceRegistry::new();
        let mut state = CoreState::new(CoreConfig::default());
        assert_eq!(
            registry.ocp(&mut state, 0o030077),
            Err(Fault::NoDevice { device: 0o77, instr: 0o030077 })
        );
        registry.master_clear_all(&mut state);
    }

    #[test]
    fn unsupported_functions_widen_to_faults() {
        let mut registry = DeviceRegistry::new();
        let mut state = CoreState::new(CoreConfig::default());
        let (device, _, _) = probe(None);
        assert!(registry.attach(0o4, device).is_none());

        assert_eq!(registry.ina(&mut state, 0o130004), Ok(Some(0o101)));
        assert_eq!(registry.ina(&mut state, 0o130104), Ok(None));
        assert_eq!(
            registry.ina(&mut state, 0o131704),
            Err(Fault::UnsupportedIo { device: 0o4, instr: 0o131704 })
        );
        assert_eq!(
            registry.dmc(&mut state, 2, 0, false),
            Err(Fault::NoDmaDevice { channel: 2 })
        );
    }

    #[test]
    fn devices_schedule_through_core_state() {
        let mut registry = DeviceRegistry::new();
        let mut state = CoreState::new(CoreConfig::default());
        let (device, _, _) = probe(None);
        registry.attach(0o4, device);
        registry.ocp(&mut state, 0o030004).expect("ocp accepted");
        assert_eq!(state.events().peek_next_time(), Some(10));
    }

    #[test]
    fn broadcasts_reach_every_attached_device_once() {
        let mut registry = DeviceRegistry::new();
        let mut state = CoreState::new(CoreConfig::default());
        let (first, first_events, first_masks) = probe(None);
        let (second, second_events, _) = probe(Some(1));
        registry.attach(0o1, first);
        registry.attach(0o12, second);

        registry.master_clear_all(&mut state);
        registry.set_interrupt_mask_all(&mut state, 0o177);

        assert_eq!(*first_events.borrow(), vec![REASON_MASTER_CLEAR]);
        assert_eq!(*second_events.borrow(), vec![REASON_MASTER_CLEAR]);
        assert_eq!(*first_masks.borrow(), vec![0o177]);
        assert_eq!(
            registry.dmc(&mut state, 1, 5, false),
            Err(Fault::NotDmaCapable { device: 0o12 })
        );
    }

    #[test]
    fn attach_returns_previous_occupant_only() {
        let mut registry = DeviceRegistry::new();
        let (first, _, _) = probe(None);
        let (second, _, _) = probe(None);
        assert!(registry.attach(0o44, first).is_none());
        assert!(registry.is_present(0o44));
        assert_eq!(registry.attach(0o44, second).map(|d| d.name().to_owned()), Some("probe".to_owned()));
        assert_eq!(registry.name(0o3), "none");
    }
}
