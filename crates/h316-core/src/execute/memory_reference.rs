//! Memory-reference instructions.

use tracing::{event, Level};

use super::microcode::{divide, multiply};
use super::{add_words, charge, fits_double, join_double, skip_next, split_double};
use crate::timing::CycleCostKind;
use crate::{Fault, Processor};

fn operand_address(cpu: &mut Processor, instr: u16) -> u16 {
    cpu.effective_address(instr, true)
}

fn read_operand(cpu: &mut Processor, ea: u16) -> u16 {
    let value = cpu.state.read(ea);
    cpu.state.regs.m = value;
    charge(cpu, CycleCostKind::Operand);
    value
}

fn write_operand(cpu: &mut Processor, ea: u16, value: u16) {
    cpu.state.regs.m = value;
    cpu.state.write(ea, value);
    charge(cpu, CycleCostKind::Operand);
}

fn next_address(cpu: &Processor, ea: u16) -> u16 {
    ea.wrapping_add(1) & cpu.state.address_mask()
}

fn read_double(cpu: &mut Processor, ea: u16) -> (u16, u16) {
    let high = read_operand(cpu, ea);
    let low = cpu.state.read(next_address(cpu, ea));
    charge(cpu, CycleCostKind::SecondWord);
    (high, low)
}

/// Drops extend mode when a `DXA` is waiting for the next jump.
fn complete_extend_disable(cpu: &mut Processor) {
    if cpu.state.regs.extend_disable_pending {
        cpu.state.regs.extend_disable_pending = false;
        cpu.state.regs.extend = false;
    }
}

/// Stores the return address at `ea` and continues at `ea + 1`.
///
/// Outside extend mode the top two bits of the old word survive; in extend
/// mode only the top bit does. The break cycles reuse this for their
/// implied `JST*`.
pub(crate) fn jump_and_store(cpu: &mut Processor, ea: u16) {
    let keep = if cpu.state.regs.extend { 0x8000 } else { 0xC000 };
    let old = cpu.state.read(ea);
    let link = (old & keep) | (cpu.state.regs.p & !keep);
    cpu.state.write(ea, link);
    cpu.state.regs.p = next_address(cpu, ea);
    charge(cpu, CycleCostKind::JumpStore);
    complete_extend_disable(cpu);
}

/// `JMP`: unconditional jump.
pub(crate) fn jmp(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = operand_address(cpu, instr);
    cpu.state.regs.p = ea;
    complete_extend_disable(cpu);
    Ok(())
}

/// `LDA` (or `DLD` in double-precision mode).
pub(crate) fn lda(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = operand_address(cpu, instr);
    if cpu.state.regs.double_precision {
        let (high, low) = read_double(cpu, ea);
        cpu.state.regs.a = high;
        cpu.state.regs.b = low;
    } else {
        cpu.state.regs.a = read_operand(cpu, ea);
    }
    Ok(())
}

/// `ANA`: logical and.
pub(crate) fn ana(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = operand_address(cpu, instr);
    cpu.state.regs.a &= read_operand(cpu, ea);
    Ok(())
}

/// `STA` (or `DST` in double-precision mode).
pub(crate) fn sta(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = operand_address(cpu, instr);
    let a = cpu.state.regs.a;
    write_operand(cpu, ea, a);
    if cpu.state.regs.double_precision {
        let b = cpu.state.regs.b;
        let second = next_address(cpu, ea);
        cpu.state.write(second, b);
        charge(cpu, CycleCostKind::SecondWord);
    }
    Ok(())
}

/// `ERA`: exclusive or.
pub(crate) fn era(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = operand_address(cpu, instr);
    cpu.state.regs.a ^= read_operand(cpu, ea);
    Ok(())
}

fn add_or_subtract(cpu: &mut Processor, instr: u16, subtract: bool) {
    let ea = operand_address(cpu, instr);
    if cpu.state.regs.double_precision {
        let (high, low) = read_double(cpu, ea);
        let accumulator = join_double(cpu.state.regs.a, cpu.state.regs.b);
        let operand = join_double(high, low);
        let result = if subtract { accumulator - operand } else { accumulator + operand };
        let (a, b) = split_double(result);
        cpu.state.regs.a = a;
        cpu.state.regs.b = b;
        cpu.state.regs.c = !fits_double(result);
    } else {
        let operand = read_operand(cpu, ea);
        let (sum, overflow) = if subtract {
            add_words(cpu.state.regs.a, !operand, 1)
        } else {
            add_words(cpu.state.regs.a, operand, 0)
        };
        cpu.state.regs.a = sum;
        cpu.state.regs.c = overflow;
    }
}

/// `ADD` (or `DAD`): C reports adder overflow.
pub(crate) fn add(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    add_or_subtract(cpu, instr, false);
    Ok(())
}

/// `SUB` (or `DSB`): C reports adder overflow.
pub(crate) fn sub(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    add_or_subtract(cpu, instr, true);
    Ok(())
}

/// `JST`: jump and store return address.
pub(crate) fn jst(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = operand_address(cpu, instr);
    jump_and_store(cpu, ea);
    Ok(())
}

/// `CAS`: signed compare; skip one when equal, two when A is less.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn cas(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = operand_address(cpu, instr);
    let operand = read_operand(cpu, ea) as i16;
    let a = cpu.state.regs.a as i16;
    if a == operand {
        skip_next(cpu);
    } else if a < operand {
        skip_next(cpu);
        skip_next(cpu);
    }
    Ok(())
}

/// `IRS`: increment memory, skip when the result is zero.
pub(crate) fn irs(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = operand_address(cpu, instr);
    let value = cpu.state.read(ea).wrapping_add(1);
    cpu.state.regs.m = value;
    cpu.state.write(ea, value);
    charge(cpu, CycleCostKind::ReadModifyWrite);
    if value == 0 {
        skip_next(cpu);
    }
    Ok(())
}

/// `IMA`: exchange A with memory.
pub(crate) fn ima(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = operand_address(cpu, instr);
    let value = cpu.state.read(ea);
    let a = cpu.state.regs.a;
    cpu.state.write(ea, a);
    cpu.state.regs.a = value;
    cpu.state.regs.m = value;
    charge(cpu, CycleCostKind::ReadModifyWrite);
    Ok(())
}

/// `STX`: store index. The tag position belongs to the opcode.
pub(crate) fn stx(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = cpu.effective_address(instr, false);
    let x = cpu.state.x();
    write_operand(cpu, ea, x);
    Ok(())
}

/// `LDX`: load index. The tag position belongs to the opcode.
pub(crate) fn ldx(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = cpu.effective_address(instr, false);
    let value = read_operand(cpu, ea);
    cpu.state.set_x(value);
    Ok(())
}

/// `MPY`: A times memory into A:B; C flags the one overflowing product.
pub(crate) fn mpy(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = operand_address(cpu, instr);
    let multiplier = read_operand(cpu, ea);
    let product = multiply(cpu.state.regs.a, multiplier);
    cpu.state.regs.a = product.a;
    cpu.state.regs.b = product.b;
    cpu.state.regs.c = product.overflow;
    cpu.state.advance(product.half_cycles);
    Ok(())
}

/// `DIV`: A:B divided by memory; quotient in A, remainder in B.
///
/// An overflowing divide sets C and leaves A and B untouched.
pub(crate) fn div(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    let ea = operand_address(cpu, instr);
    let divisor = read_operand(cpu, ea);
    match divide(cpu.state.regs.a, cpu.state.regs.b, divisor) {
        Some(result) => {
            cpu.state.regs.a = result.quotient;
            cpu.state.regs.b = result.remainder;
            cpu.state.regs.sc = result.sc;
            cpu.state.regs.c = false;
            cpu.state.advance(u64::from(result.iterations));
        }
        None => {
            event!(Level::TRACE, divisor, a = cpu.state.regs.a, "divide overflow");
            cpu.state.regs.c = true;
        }
    }
    Ok(())
}
