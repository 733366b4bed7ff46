//! Input/output group: the four device primitives plus `SMK`, which is an
//! `OTA` to device '20.

use tracing::{event, Level};

use super::{charge, skip_next, trapped_by_restrict};
use crate::timing::CycleCostKind;
use crate::{Fault, Processor};

/// `INA` function bit that clears A before the input is merged.
const CLEAR_FIRST: u16 = 0o1000;

/// `OCP`: control pulse to a device.
pub(crate) fn ocp(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    if trapped_by_restrict(cpu) {
        return Ok(());
    }
    charge(cpu, CycleCostKind::Io);
    cpu.devices.ocp(&mut cpu.state, instr)
}

/// `SKS`: skip if the device condition holds.
pub(crate) fn sks(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    if trapped_by_restrict(cpu) {
        return Ok(());
    }
    charge(cpu, CycleCostKind::Io);
    if cpu.devices.sks(&mut cpu.state, instr)? {
        skip_next(cpu);
    }
    Ok(())
}

/// `INA`: input to A and skip when the device was ready.
pub(crate) fn ina(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    if trapped_by_restrict(cpu) {
        return Ok(());
    }
    charge(cpu, CycleCostKind::Io);
    if let Some(data) = cpu.devices.ina(&mut cpu.state, instr)? {
        if instr & CLEAR_FIRST != 0 {
            cpu.state.regs.a = data;
        } else {
            cpu.state.regs.a |= data;
        }
        skip_next(cpu);
    }
    Ok(())
}

/// `OTA`: output A and skip when the device accepted it.
pub(crate) fn ota(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    if trapped_by_restrict(cpu) {
        return Ok(());
    }
    charge(cpu, CycleCostKind::Io);
    let a = cpu.state.regs.a;
    if cpu.devices.ota(&mut cpu.state, instr, a)? {
        skip_next(cpu);
    }
    Ok(())
}

/// `SMK`: latch A as the interrupt mask and broadcast it. Never skips.
pub(crate) fn smk(cpu: &mut Processor, _instr: u16) -> Result<(), Fault> {
    if trapped_by_restrict(cpu) {
        return Ok(());
    }
    charge(cpu, CycleCostKind::Io);
    let mask = cpu.state.regs.a;
    event!(Level::DEBUG, mask, "interrupt mask set");
    cpu.state.interrupts.mask = mask;
    cpu.devices.set_interrupt_mask_all(&mut cpu.state, mask);
    Ok(())
}
