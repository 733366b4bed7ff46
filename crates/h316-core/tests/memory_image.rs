//! Index-register aliasing and the text dumps of memory and trace.

#![allow(clippy::pedantic, clippy::nursery)]

mod common;

use common::{processor, running_at};
use h316_core::RunOutcome;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const HLT: u16 = 0o000000;

#[test]
fn x_follows_its_memory_location() {
    let mut cpu = processor();
    cpu.write(0, 0o1234);
    assert_eq!(cpu.x(), 0o1234);

    cpu.set_x(0o777);
    assert_eq!(cpu.read(0), 0o777);

    cpu.write(1, 0o55);
    assert_eq!(cpu.x(), 0o777);
}

#[test]
fn relocated_x_is_written_through_base_sector_store() {
    // LDX '1100, STX '1101, LDA '1102, STA '0 (base sector), HLT
    let mut cpu = running_at(0o1000, &[0o073100, 0o033101, 0o005102, 0o010000, HLT]);
    cpu.load(0o1100, &[0o42, 0, 7]);
    cpu.set_j(0o2000);

    let outcome = cpu.run(20).expect("program runs");

    assert_eq!(outcome, RunOutcome::Halted { steps: 6 });
    assert_eq!(cpu.read(0o1101), 0o42);
    assert_eq!(cpu.x(), 7);
    assert_eq!(cpu.read(0o2000), 7);
    assert_eq!(cpu.read(0), 0);
}

#[test]
fn moving_the_base_sector_reloads_x() {
    let mut cpu = processor();
    cpu.set_x(1);
    cpu.write(0o4000, 0o314);

    cpu.set_j(0o4000);

    assert_eq!(cpu.x(), 0o314);
    cpu.set_j(0);
    assert_eq!(cpu.x(), 1);
}

#[test]
fn trace_dump_lists_executed_instructions_in_order() {
    let mut cpu = running_at(0o1000, &[0o140040, 0o141206, HLT]);
    cpu.set_a(0o77);

    cpu.run(10).expect("program runs");

    let dump = cpu.trace_dump();
    let lines: Vec<&str> = dump.lines().collect();
    assert_eq!(
        lines,
        vec![
            "           2 A=000000 B=000000 X=000000 C=0 01000  140040  CRA",
            "           4 A=000001 B=000000 X=000000 C=0 01001  141206  AOA",
            "           6 A=000001 B=000000 X=000000 C=0 01002  000000  HLT",
        ]
    );
    assert_eq!(cpu.trace().last().map(|record| record.p), Some(0o1002));
}

#[test]
fn trace_keeps_only_the_most_recent_steps() {
    let config = h316_core::CoreConfig { trace_capacity: 2, ..Default::default() };
    let mut cpu = h316_core::Processor::new(common::catalog(), config);
    cpu.load(0o1000, &[0o141206, 0o141206, 0o141206, HLT]);
    cpu.set_p(0o1000);
    cpu.start();

    cpu.run(10).expect("program runs");

    let addresses: Vec<u16> = cpu.trace().iter().map(|record| record.p).collect();
    assert_eq!(addresses, vec![0o1002, 0o1003]);
}

#[test]
fn post_mortem_has_trace_registers_and_memory() {
    let mut cpu = running_at(0o1000, &[0o141206, HLT]);
    cpu.run(10).expect("program runs");

    let report = cpu.post_mortem();

    assert!(report.starts_with("--- trace ---\n"));
    assert!(report.contains("--- registers ---\nA=000001 B=000000 X=000000 P=01002"));
    assert!(report.contains("--- memory (2 of 32768 words modified) ---"));
    assert!(report.ends_with("01001 000000 (0x0000) ; HLT\n"));
}

#[test]
fn init_image_with_entry_boots_into_the_program() {
    let mut cpu = processor();
    cpu.load(0o1000, &[0o140040, HLT]);

    let image = cpu.memory_init_image(Some(0o1000));

    assert_eq!(image, "@0000\n0000,8402,0200\n@0200\nC020,0000\n");
}
