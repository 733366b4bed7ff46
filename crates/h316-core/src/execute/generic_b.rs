//! Generic group B: control and mode instructions.

use tracing::{event, Level};

use super::{charge, trapped_by_restrict};
use crate::timing::CycleCostKind;
use crate::{Fault, Processor};

/// Longest shift `NRM` performs before giving up on a zero operand.
pub(crate) const NORMALIZE_LIMIT: u16 = 32;

/// `HLT`: clear the run flag.
pub(crate) fn hlt(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    if trapped_by_restrict(cpu) {
        return Ok(());
    }
    event!(Level::INFO, p = cpu.state.regs.p, "halt");
    cpu.state.set_running(false);
    Ok(())
}

/// `SGL`: single-precision mode.
pub(crate) fn sgl(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    cpu.state.regs.double_precision = false;
    Ok(())
}

/// `DBL`: double-precision mode.
pub(crate) fn dbl(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    cpu.state.regs.double_precision = true;
    Ok(())
}

/// `DXA`: leave extend mode at the next jump.
pub(crate) fn dxa(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    if trapped_by_restrict(cpu) {
        return Ok(());
    }
    cpu.state.regs.extend_disable_pending = true;
    Ok(())
}

/// `EXA`: enter extend mode.
pub(crate) fn exa(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    if trapped_by_restrict(cpu) {
        return Ok(());
    }
    cpu.state.regs.extend = true;
    cpu.state.regs.extend_disable_pending = false;
    Ok(())
}

/// `RMP`: reset the memory parity error latch.
pub(crate) fn rmp(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    cpu.state.regs.parity_error = false;
    Ok(())
}

/// `SCA`: shift counter to A.
pub(crate) fn sca(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    cpu.state.regs.a = cpu.state.regs.sc & crate::SC_MASK;
    Ok(())
}

/// `INK`: keys to A.
pub(crate) fn ink(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    cpu.state.regs.a = cpu.state.regs.keys();
    Ok(())
}

/// `OTK`: A to keys.
pub(crate) fn otk(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    if trapped_by_restrict(cpu) {
        return Ok(());
    }
    let a = cpu.state.regs.a;
    cpu.state.regs.set_keys(a);
    Ok(())
}

/// `NRM`: shift A:B left until A's top two bits differ; SC counts shifts.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn nrm(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    let mut a = cpu.state.regs.a;
    let mut b = cpu.state.regs.b;
    let mut count = 0;
    while count < NORMALIZE_LIMIT && (a ^ (a << 1)) & 0x8000 == 0 {
        let magnitude = (u32::from(a & 0x7FFF) << 15) | u32::from(b & 0x7FFF);
        let shifted = (magnitude << 1) & 0x3FFF_FFFF;
        a = (a & 0x8000) | (shifted >> 15) as u16;
        b = (b & 0x8000) | (shifted & 0x7FFF) as u16;
        count += 1;
        charge(cpu, CycleCostKind::NormalizeStep);
    }
    cpu.state.regs.a = a;
    cpu.state.regs.b = b;
    cpu.state.regs.sc = count;
    Ok(())
}

/// `IAB`: exchange A and B.
pub(crate) fn iab(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    let regs = &mut cpu.state.regs;
    std::mem::swap(&mut regs.a, &mut regs.b);
    Ok(())
}

/// `ENB`: enable interrupts after the next instruction.
pub(crate) fn enb(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    if trapped_by_restrict(cpu) {
        return Ok(());
    }
    cpu.state.interrupts.enable_pending = true;
    Ok(())
}

/// `INH`: inhibit interrupts, cancelling a pending enable.
pub(crate) fn inh(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    if trapped_by_restrict(cpu) {
        return Ok(());
    }
    cpu.state.interrupts.enabled = false;
    cpu.state.interrupts.enable_pending = false;
    Ok(())
}

/// `ERM`: enter restrict mode.
pub(crate) fn erm(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    if trapped_by_restrict(cpu) {
        return Ok(());
    }
    cpu.state.regs.restrict = true;
    Ok(())
}
