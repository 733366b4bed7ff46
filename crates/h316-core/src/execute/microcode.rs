//! Multiply and divide as the arithmetic unit sequences them.
//!
//! Both routines step through the same register transfers as the hardware
//! (two-bit recoded multiply, non-restoring divide) instead of using host
//! arithmetic, so intermediate register contents such as the divide's
//! leftover SC match the machine.

use crate::timing::{half_cycles, CycleCostKind};
use crate::SC_MASK;

/// Result of a multiply sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    /// High-order word (sign and bits 30..15 of the product).
    pub a: u16,
    /// Low-order 15 bits; the sign position is zero.
    pub b: u16,
    /// The product does not fit in 31 bits (`-1.0 * -1.0`).
    pub overflow: bool,
    /// Half-cycles spent in the sequence.
    pub half_cycles: u64,
}

impl Product {
    /// The 31-bit product as a signed integer.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn value(self) -> i64 {
        (i64::from(self.a as i16) << 15) | i64::from(self.b & 0x7FFF)
    }
}

/// Result of a divide sequence that did not overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quotient {
    /// Quotient, loaded into A.
    pub quotient: u16,
    /// Remainder with the dividend's sign, loaded into B.
    pub remainder: u16,
    /// Low six bits of the partial remainder after the last step.
    pub sc: u16,
    /// Sequencer cycles taken; 18, or 19 when the remainder needed a
    /// second correction.
    pub iterations: u32,
}

const MULTIPLY_ITERATIONS: usize = 8;
/// SC preset for sixteen divide steps: the count in two's complement.
const DIVIDE_COUNT: u16 = (64 - 16) & SC_MASK;

const fn recode(pair: u16) -> i64 {
    match pair {
        1 | 2 => 1,
        3 => 2,
        4 => -2,
        5 | 6 => -1,
        _ => 0,
    }
}

/// Multiplies `a` by `m`, both signed 16-bit fractions.
///
/// Eight iterations each retire two multiplier bits from the low half of the
/// product register, adding 0, ±1 or ±2 times the multiplicand into the
/// high half before shifting the pair right by two.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
pub fn multiply(a: u16, m: u16) -> Product {
    let multiplicand = i64::from(m as i16);
    let mut high: i64 = 0;
    let mut low = a;
    let mut previous = 0_u16;
    let mut cost = half_cycles(CycleCostKind::MultiplySetup);

    for _ in 0..MULTIPLY_ITERATIONS {
        let pair = ((low & 3) << 1) | previous;
        high += recode(pair) * multiplicand;
        previous = (low >> 1) & 1;
        low = (low >> 2) | (((high & 3) as u16) << 14);
        high >>= 2;
        cost += 1;
    }

    let product = high * 65_536 + i64::from(low);
    Product {
        a: ((product >> 15) & 0xFFFF) as u16,
        b: (product & 0x7FFF) as u16,
        overflow: !(-(1_i64 << 30)..(1_i64 << 30)).contains(&product),
        half_cycles: cost,
    }
}

/// Control states of the divide sequencer. Every pass through the
/// sequencer loop is one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DividePhase {
    /// Dividend and divisor into the working registers, SC preset.
    Load,
    /// One shift and add/subtract, SC counting up to zero.
    Step,
    /// Quotient assembly and the remainder sign fix.
    Quotient,
    /// One more add/subtract after a failed remainder OK test.
    Correct,
    Done,
}

/// Working registers of the divide sequence.
struct Divider {
    divisor: i64,
    dividend_negative: bool,
    remainder: i64,
    low: u16,
    quotient_bits: u16,
    quotient: i64,
    sc: u16,
    shift_before_step: bool,
}

impl Divider {
    const fn add_or_subtract(&mut self) -> u16 {
        if (self.remainder >= 0) == (self.divisor >= 0) {
            self.remainder -= self.divisor;
            1
        } else {
            self.remainder += self.divisor;
            0
        }
    }

    const fn correct(&mut self) {
        if (self.remainder < 0) == (self.divisor < 0) {
            self.remainder -= self.divisor;
            self.quotient += 1;
        } else {
            self.remainder += self.divisor;
            self.quotient -= 1;
        }
    }

    /// Remainder OK: a remainder equal in magnitude to the divisor needs
    /// another correction cycle.
    const fn remainder_ok(&self) -> DividePhase {
        if self.remainder != 0 && self.remainder.abs() == self.divisor.abs() {
            DividePhase::Correct
        } else {
            DividePhase::Done
        }
    }
}

/// Divides the 31-bit dividend `a:b` by `divisor`.
///
/// Operands are fractions, so the quotient only fits when the dividend is
/// smaller in magnitude than the divisor. Returns `None` otherwise, and for
/// a zero divisor.
///
/// The sequencer runs one load cycle, sixteen add/subtract steps counted
/// out by SC, a quotient cycle and as many correction cycles as the
/// remainder OK test demands.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
pub fn divide(a: u16, b: u16, divisor: u16) -> Option<Quotient> {
    let divisor = i64::from(divisor as i16);
    let high = i64::from(a as i16);
    let dividend = (high << 15) + i64::from(b & 0x7FFF);
    if divisor == 0 || dividend.abs() >= divisor.abs() << 15 {
        return None;
    }

    let mut unit = Divider {
        divisor,
        dividend_negative: dividend < 0,
        remainder: 0,
        low: 0,
        quotient_bits: 0,
        quotient: 0,
        sc: 0,
        shift_before_step: false,
    };
    let mut phase = DividePhase::Load;
    let mut iterations = 0;

    while phase != DividePhase::Done {
        iterations += 1;
        phase = match phase {
            DividePhase::Load => {
                unit.remainder = high;
                unit.low = (b & 0x7FFF) << 1;
                unit.sc = DIVIDE_COUNT;
                DividePhase::Step
            }
            DividePhase::Step => {
                if unit.shift_before_step {
                    unit.remainder = (unit.remainder << 1) | i64::from(unit.low >> 15);
                    unit.low <<= 1;
                }
                unit.shift_before_step = true;
                let bit = unit.add_or_subtract();
                unit.quotient_bits = (unit.quotient_bits << 1) | bit;
                unit.sc = (unit.sc + 1) & SC_MASK;
                if unit.sc == 0 {
                    DividePhase::Quotient
                } else {
                    DividePhase::Step
                }
            }
            DividePhase::Quotient => {
                unit.sc = (unit.remainder & i64::from(SC_MASK)) as u16;
                unit.quotient = 2 * i64::from(unit.quotient_bits) - 0xFFFF;
                if unit.remainder != 0 && (unit.remainder < 0) != unit.dividend_negative {
                    unit.correct();
                }
                unit.remainder_ok()
            }
            DividePhase::Correct => {
                unit.correct();
                unit.remainder_ok()
            }
            DividePhase::Done => DividePhase::Done,
        };
    }

    Some(Quotient {
        quotient: (unit.quotient & 0xFFFF) as u16,
        remainder: (unit.remainder & 0xFFFF) as u16,
        sc: unit.sc,
        iterations,
    })
}
