//! Deterministic run fingerprint used for cross-host comparison.
//!
//! Runs a fixed program with a clock-driven device and hashes the final
//! registers, clock, trace and modified memory.

use std::sync::Arc;

use h316_core::{
    CoreConfig, CoreState, Device, DeviceError, InstructionCatalog, Processor, RunOutcome,
};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const TICKER: u8 = 0o4;
const TICK_DELAY: u64 = 37;

/// Raises its interrupt line every `TICK_DELAY` half-cycles once started by
/// `OCP '0004`; `OCP '0104` acknowledges.
#[derive(Default)]
struct Ticker;

impl Device for Ticker {
    fn name(&self) -> &str {
        "ticker"
    }

    fn ina(&mut self, _state: &mut CoreState, _instr: u16) -> Result<Option<u16>, DeviceError> {
        Err(DeviceError::Unsupported)
    }

    fn ocp(&mut self, state: &mut CoreState, instr: u16) -> Result<(), DeviceError> {
        match (instr >> 6) & 0o17 {
            0 => state.schedule(TICK_DELAY, TICKER, 0),
            1 => state.clear_interrupt(1),
            _ => return Err(DeviceError::Unsupported),
        }
        Ok(())
    }

    fn sks(&mut self, _state: &mut CoreState, _instr: u16) -> Result<bool, DeviceError> {
        Err(DeviceError::Unsupported)
    }

    fn ota(&mut self, _state: &mut CoreState, _instr: u16, _data: u16) -> Result<bool, DeviceError> {
        Err(DeviceError::Unsupported)
    }

    fn event(&mut self, state: &mut CoreState, reason: i32) {
        if reason >= 0 {
            state.set_interrupt(1);
            state.schedule(TICK_DELAY, TICKER, reason + 1);
        }
    }
}

/// Main loop counts in A while the interrupt handler at '2000 counts ticks
/// in '2100 and stops after 64 of them.
const PROGRAM: &[(u16, &[u16])] = &[
    (0o63, &[0o2000]),
    (
        0o1000,
        &[
            0o030004, // OCP '0004
            0o000401, // ENB
            0o141206, // AOA
            0o003002, // JMP '1002
        ],
    ),
    (
        0o2000,
        &[
            0,        // return address
            0o030104, // OCP '0104
            0o025100, // IRS '2100
            0o003005, // JMP '2005
            0o000000, // HLT
            0o000401, // ENB
            0o103000, // JMP* '2000
        ],
    ),
    (0o2100, &[0o177700]),
];

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint() -> Result<String, String> {
    let catalog = InstructionCatalog::standard().map_err(|error| error.to_string())?;
    let mut cpu = Processor::new(Arc::new(catalog), CoreConfig::default());
    cpu.attach(TICKER, Box::new(Ticker));
    for (origin, words) in PROGRAM {
        cpu.load(*origin, words);
    }
    cpu.set_p(0o1000);
    cpu.start();

    let outcome = cpu.run(1_000_000).map_err(|fault| fault.to_string())?;

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    match outcome {
        RunOutcome::Halted { steps } => {
            hash_bytes(&mut hash, &[0x10]);
            hash_bytes(&mut hash, &steps.to_le_bytes());
        }
        RunOutcome::StepLimit { steps } => {
            hash_bytes(&mut hash, &[0x11]);
            hash_bytes(&mut hash, &steps.to_le_bytes());
        }
    }

    let regs = cpu.registers();
    for word in [regs.a, regs.b, cpu.x(), regs.p, regs.y, regs.m, regs.sc] {
        hash_bytes(&mut hash, &word.to_le_bytes());
    }
    hash_bytes(&mut hash, &cpu.half_cycles().to_le_bytes());
    hash_bytes(&mut hash, cpu.trace_dump().as_bytes());
    hash_bytes(&mut hash, cpu.memory_init_image(None).as_bytes());

    Ok(format!("{hash:016x}"))
}

fn main() {
    match fingerprint() {
        Ok(fingerprint) => println!("{fingerprint}"),
        Err(error) => {
            eprintln!("fingerprint run failed: {error}");
            std::process::exit(1);
        }
    }
}
