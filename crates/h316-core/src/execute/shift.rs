//! Shift group. The low six bits hold the two's complement of the count;
//! SC counts up from that field to zero, one half-cycle per step.

use super::charge;
use crate::timing::CycleCostKind;
use crate::{Fault, Processor};

const LEFT: u16 = 0o1000;
const SINGLE: u16 = 0o400;
const ROTATE: u16 = 0o200;
const ARITHMETIC: u16 = 0o100;

/// Number of places a shift word moves.
#[must_use]
#[allow(clippy::cast_lossless)]
pub const fn shift_count(instr: u16) -> u32 {
    (64 - (instr & 0o77) as u32) & 0o77
}

fn finish(cpu: &mut Processor, count: u32) {
    cpu.state.regs.sc = 0;
    for _ in 0..count {
        charge(cpu, CycleCostKind::ShiftStep);
    }
}

fn single_op(cpu: &mut Processor, instr: u16, op: fn(u16, u32) -> (u16, bool)) {
    let count = shift_count(instr);
    if count > 0 {
        let (a, c) = op(cpu.state.regs.a, count);
        cpu.state.regs.a = a;
        cpu.state.regs.c = c;
    }
    finish(cpu, count);
}

#[allow(clippy::cast_possible_truncation)]
fn long_op(cpu: &mut Processor, instr: u16, op: fn(u32, u32) -> (u32, bool)) {
    let count = shift_count(instr);
    if count > 0 {
        let pair = (u32::from(cpu.state.regs.a) << 16) | u32::from(cpu.state.regs.b);
        let (pair, c) = op(pair, count);
        cpu.state.regs.a = (pair >> 16) as u16;
        cpu.state.regs.b = pair as u16;
        cpu.state.regs.c = c;
    }
    finish(cpu, count);
}

const fn bit_of(value: u32, position: u32) -> bool {
    position < 32 && (value >> position) & 1 != 0
}

/// `LGR`: logical right, A only.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn lgr(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    single_op(cpu, instr, |a, n| {
        let a = u32::from(a);
        let shifted = if n >= 16 { 0 } else { a >> n };
        (shifted as u16, bit_of(a, n - 1))
    });
    Ok(())
}

/// `ARS`: arithmetic right, A only.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
pub(crate) fn ars(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    single_op(cpu, instr, |a, n| {
        let signed = i32::from(a as i16);
        ((signed >> n.min(31)) as u16, (signed >> (n - 1).min(31)) & 1 != 0)
    });
    Ok(())
}

/// `ARR`: rotate right, A only.
pub(crate) fn arr(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    single_op(cpu, instr, |a, n| {
        let rotated = a.rotate_right(n % 16);
        (rotated, rotated & 0x8000 != 0)
    });
    Ok(())
}

/// `LGL`: logical left, A only.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn lgl(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    single_op(cpu, instr, |a, n| {
        let a = u32::from(a);
        let shifted = if n >= 16 { 0 } else { a << n };
        (shifted as u16, n <= 16 && bit_of(a, 16 - n))
    });
    Ok(())
}

/// `ALS`: arithmetic left, A only. C reports any change of sign on the
/// way, which is the same as the result not fitting.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
pub(crate) fn als(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let count = shift_count(instr);
    let wide = i128::from(cpu.state.regs.a as i16) << count;
    cpu.state.regs.c = i128::from(wide as i16) != wide;
    cpu.state.regs.a = wide as u16;
    finish(cpu, count);
    Ok(())
}

/// `ALR`: rotate left, A only.
pub(crate) fn alr(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    single_op(cpu, instr, |a, n| {
        let rotated = a.rotate_left(n % 16);
        (rotated, rotated & 1 != 0)
    });
    Ok(())
}

/// `LRL`: logical right, A:B as 32 bits.
pub(crate) fn lrl(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    long_op(cpu, instr, |pair, n| {
        let shifted = if n >= 32 { 0 } else { pair >> n };
        (shifted, bit_of(pair, n - 1))
    });
    Ok(())
}

/// `LRR`: rotate right, A:B as 32 bits.
pub(crate) fn lrr(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    long_op(cpu, instr, |pair, n| {
        let rotated = pair.rotate_right(n % 32);
        (rotated, rotated & 0x8000_0000 != 0)
    });
    Ok(())
}

/// `LLL`: logical left, A:B as 32 bits.
pub(crate) fn lll(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    long_op(cpu, instr, |pair, n| {
        let shifted = if n >= 32 { 0 } else { pair << n };
        (shifted, n <= 32 && bit_of(pair, 32 - n))
    });
    Ok(())
}

/// `LLR`: rotate left, A:B as 32 bits.
pub(crate) fn llr(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    long_op(cpu, instr, |pair, n| {
        let rotated = pair.rotate_left(n % 32);
        (rotated, rotated & 1 != 0)
    });
    Ok(())
}

/// `LRS`: arithmetic right over the 31-bit A:B; B's sign stays put.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
pub(crate) fn lrs(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let count = shift_count(instr);
    if count > 0 {
        let b = cpu.state.regs.b;
        let value = (i64::from(cpu.state.regs.a as i16) << 15) | i64::from(b & 0x7FFF);
        let shifted = value >> count.min(40);
        cpu.state.regs.c = (value >> (count - 1).min(40)) & 1 != 0;
        cpu.state.regs.a = (shifted >> 15) as u16;
        cpu.state.regs.b = (b & 0x8000) | (shifted & 0x7FFF) as u16;
    }
    finish(cpu, count);
    Ok(())
}

/// `LLS`: arithmetic left over the 31-bit A:B; B's sign stays put and C
/// reports overflow.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
pub(crate) fn lls(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let count = shift_count(instr);
    let b = cpu.state.regs.b;
    let value = (i128::from(cpu.state.regs.a as i16) << 15) | i128::from(b & 0x7FFF);
    let wide = value << count;
    cpu.state.regs.c = !(-(1_i128 << 30)..(1_i128 << 30)).contains(&wide);
    cpu.state.regs.a = (wide >> 15) as u16;
    cpu.state.regs.b = (b & 0x8000) | (wide & 0x7FFF) as u16;
    finish(cpu, count);
    Ok(())
}

/// Executes any shift-group word one step at a time, as the shift counter
/// drives it.
///
/// Bit 9 selects left, bit 8 A only, bit 7 rotate, bit 6 arithmetic. The
/// fill into the vacated end wire-ORs the rotate feedback with the sign.
/// Arithmetic left shifts clear C first and set it on any sign change;
/// everything else leaves the last bit out in C.
pub(crate) fn generic_shift(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let left = instr & LEFT != 0;
    let single = instr & SINGLE != 0;
    let rotate = instr & ROTATE != 0;
    let arithmetic = instr & ARITHMETIC != 0;

    let regs = &mut cpu.state.regs;
    let (mut a, mut b, mut c) = (regs.a, regs.b, regs.c);
    let mut sc = instr & 0o77;
    let mut steps = 0;
    if left && arithmetic {
        c = false;
    }

    while sc != 0 {
        sc = (sc + 1) & 0o77;
        steps += 1;
        if left {
            let out = a >> 15;
            let fill = if rotate { out } else { 0 };
            let bring = if single {
                fill
            } else if arithmetic {
                let bring = (b >> 14) & 1;
                b = (b & 0x8000) | ((b << 1) & 0x7FFF) | fill;
                bring
            } else {
                let bring = b >> 15;
                b = (b << 1) | fill;
                bring
            };
            let shifted = (a << 1) | bring;
            if arithmetic {
                c |= shifted >> 15 != out;
            } else {
                c = out != 0;
            }
            a = shifted;
        } else {
            let out = if single { a & 1 } else { b & 1 };
            let fill = (if rotate { out } else { 0 }) | (if arithmetic { a >> 15 } else { 0 });
            if !single {
                b = if arithmetic {
                    (b & 0x8000) | ((b & 0x7FFF) >> 1) | ((a & 1) << 14)
                } else {
                    (b >> 1) | ((a & 1) << 15)
                };
            }
            a = (a >> 1) | (fill << 15);
            c = out != 0;
        }
    }

    regs.a = a;
    regs.b = b;
    regs.c = c;
    regs.sc = sc;
    for _ in 0..steps {
        charge(cpu, CycleCostKind::ShiftStep);
    }
    Ok(())
}
