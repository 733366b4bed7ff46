//! Instruction executors invoked through the dispatch table.
//!
//! Every executor runs after P has been advanced past the instruction and
//! charges its own half-cycles beyond the fetch. Skips advance P once more.

// Executors share the `Executor` signature even when they cannot fail.
#![allow(clippy::unnecessary_wraps)]

pub(crate) mod generic_a;
pub(crate) mod generic_b;
pub(crate) mod io;
pub(crate) mod memory_reference;
/// Multiply and divide sequences of the arithmetic unit.
pub mod microcode;
pub(crate) mod shift;
pub(crate) mod skip;

pub use microcode::{divide, multiply, Product, Quotient};

use crate::timing::{half_cycles, CycleCostKind};
use crate::{Fault, Processor};

/// Executor signature stored in dispatch entries.
pub type Executor = fn(&mut Processor, u16) -> Result<(), Fault>;

/// Advances P over the next word.
pub(crate) fn skip_next(cpu: &mut Processor) {
    let mask = cpu.state.address_mask();
    cpu.state.regs.p = cpu.state.regs.p.wrapping_add(1) & mask;
}

pub(crate) fn charge(cpu: &mut Processor, kind: CycleCostKind) {
    cpu.state.advance(half_cycles(kind));
}

/// In restrict mode a privileged instruction traps instead of executing.
/// Returns `true` when the caller must not execute.
pub(crate) fn trapped_by_restrict(cpu: &mut Processor) -> bool {
    if cpu.state.regs.restrict {
        cpu.state.memory_protect_violation();
        true
    } else {
        false
    }
}

/// 16-bit adder. Overflow compares the sign-extended sum with the
/// truncated one.
#[must_use]
#[allow(clippy::cast_lossless, clippy::cast_possible_wrap)]
pub const fn add_words(x: u16, y: u16, carry_in: u16) -> (u16, bool) {
    let full = x as i16 as i32 + y as i16 as i32 + carry_in as i32;
    let sum = x.wrapping_add(y).wrapping_add(carry_in);
    (sum, sum as i16 as i32 != full)
}

/// Joins a double-precision pair: 16 bits of `high`, 15 of `low`.
#[must_use]
#[allow(clippy::cast_lossless, clippy::cast_possible_wrap)]
pub const fn join_double(high: u16, low: u16) -> i64 {
    ((high as i16 as i64) << 15) | (low & 0x7FFF) as i64
}

/// Splits a 31-bit value back into the A:B layout; B's sign position is
/// left clear.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const fn split_double(value: i64) -> (u16, u16) {
    (((value >> 15) & 0xFFFF) as u16, (value & 0x7FFF) as u16)
}

/// Returns `true` when `value` is representable in 31 signed bits.
#[must_use]
pub const fn fits_double(value: i64) -> bool {
    value >= -(1 << 30) && value < (1 << 30)
}
