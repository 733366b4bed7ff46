/// Sign bit of a machine word.
pub const SIGN_BIT: u16 = 0x8000;

/// Mask of the 6-bit shift counter.
pub const SC_MASK: u16 = 0o77;

/// Number of front-panel sense switches.
pub const SENSE_SWITCH_COUNT: usize = 4;

/// Architectural registers and mode flags, excluding X.
///
/// X is held by [`crate::CoreState`] because every change to it must be
/// mirrored into memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct Registers {
    /// Accumulator.
    pub a: u16,
    /// Low-order extension of the accumulator.
    pub b: u16,
    /// Memory buffer: last fetched instruction or operand.
    pub m: u16,
    /// Program counter.
    pub p: u16,
    /// Last effective address, shown on the front panel.
    pub y: u16,
    /// Base-sector relocation register.
    pub j: u16,
    /// Shift counter (6 bits).
    pub sc: u16,
    /// Carry/overflow flag.
    pub c: bool,
    /// Double-precision mode.
    pub double_precision: bool,
    /// Extended (15-bit) addressing mode.
    pub extend: bool,
    /// Set by `DXA`; extend mode drops at the next jump.
    pub extend_disable_pending: bool,
    /// Memory-protect restrict mode.
    pub restrict: bool,
    /// Latched memory parity error.
    pub parity_error: bool,
    /// Front-panel sense switches 1-4.
    pub sense: [bool; SENSE_SWITCH_COUNT],
}

impl Registers {
    /// Clears everything a master clear clears: A, B, M, SC and the mode
    /// flags. P, Y, J and the sense switches are front-panel state and
    /// survive.
    pub fn master_clear(&mut self) {
        *self = Self {
            p: self.p,
            y: self.y,
            j: self.j,
            sense: self.sense,
            ..Self::default()
        };
    }

    /// Value read by `INK`: C, double-precision and extend in the top three
    /// bits over the shift counter.
    #[must_use]
    pub fn keys(&self) -> u16 {
        (u16::from(self.c) << 15)
            | (u16::from(self.double_precision) << 14)
            | (u16::from(self.extend) << 13)
            | (self.sc & SC_MASK)
    }

    /// Loads C, double-precision, extend and SC from an `OTK` word.
    pub const fn set_keys(&mut self, value: u16) {
        self.c = value & 0x8000 != 0;
        self.double_precision = value & 0x4000 != 0;
        self.extend = value & 0x2000 != 0;
        self.sc = value & SC_MASK;
    }

    /// Reads sense switch `n` (1-4).
    #[must_use]
    pub fn sense_switch(&self, n: usize) -> bool {
        n.checked_sub(1)
            .and_then(|index| self.sense.get(index))
            .copied()
            .unwrap_or(false)
    }
}
