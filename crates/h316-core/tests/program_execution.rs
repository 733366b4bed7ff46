//! Small programs run through the full fetch/execute loop.

#![allow(clippy::pedantic, clippy::nursery)]

mod common;

use common::{attach, processor, running_at, TestDevice};
use h316_core::{Fault, FaultClass, RunOutcome, StepOutcome};
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const HLT: u16 = 0o000000;
const NOP: u16 = 0o101000;
const CRA: u16 = 0o140040;
const DXA: u16 = 0o000011;
const EXA: u16 = 0o000013;
const SCA: u16 = 0o000041;
const NRM: u16 = 0o000101;
const IAB: u16 = 0o000201;

#[test]
fn add_and_store_then_halt() {
    // LDA '1100, ADD '1101, STA '1102, HLT in the current sector.
    let mut cpu = running_at(0o1000, &[0o005100, 0o015101, 0o011102, HLT]);
    cpu.load(0o1100, &[5, 7]);

    let outcome = cpu.run(100).expect("program runs");

    assert_eq!(outcome, RunOutcome::Halted { steps: 5 });
    assert_eq!(cpu.read(0o1102), 12);
    assert!(!cpu.carry());
    assert!(!cpu.is_running());
}

#[rstest]
#[case::positive_overflow(0x7FFF, 1, 0x8000, true)]
#[case::negative_overflow(0x8000, 0xFFFF, 0x7FFF, true)]
#[case::wraps_without_overflow(0xFFFF, 1, 0, false)]
#[case::plain(3, 4, 7, false)]
fn add_sets_carry_from_adder_overflow(
    #[case] a: u16,
    #[case] operand: u16,
    #[case] sum: u16,
    #[case] carry: bool,
) {
    let mut cpu = running_at(0o1000, &[0o015100, HLT]);
    cpu.load(0o1100, &[operand]);
    cpu.set_a(a);
    cpu.run(10).expect("program runs");
    assert_eq!((cpu.a(), cpu.carry()), (sum, carry));
}

#[test]
fn subroutine_call_returns_through_indirect_jump() {
    // 1000: JST '1100 ; 1001: HLT ; 1100: return slot ; 1101: AOA ; 1102: JMP* '1100
    let mut cpu = running_at(0o1000, &[0o021100, HLT]);
    cpu.load(0o1100, &[0, 0o141206, 0o103100]);

    cpu.run(20).expect("program runs");

    assert_eq!(cpu.a(), 1);
    assert_eq!(cpu.read(0o1100), 0o1001);
    assert_eq!(cpu.p(), 0o1002);
}

#[test]
fn indexed_loop_counts_with_irs() {
    // Adds 1 to A three times: X counts up from -3 via IRS on location 0.
    let mut cpu = running_at(
        0o1000,
        &[
            0o141206, // AOA
            0o024000, // IRS '0 (X)
            0o003000, // JMP '1000
            HLT,
        ],
    );
    cpu.set_x(0xFFFD);

    cpu.run(100).expect("program runs");

    assert_eq!(cpu.a(), 3);
    assert_eq!(cpu.x(), 0);
}

#[test]
fn double_precision_load_add_store() {
    // DBL, LDA (DLD) '1100, ADD (DAD) '1102, STA (DST) '1104, SGL, HLT
    let mut cpu = running_at(0o1000, &[0o000007, 0o005100, 0o015102, 0o011104, 0o000005, HLT]);
    cpu.load(0o1100, &[0, 0x7FFF, 0, 1]);

    cpu.run(20).expect("program runs");

    assert_eq!(cpu.read(0o1104), 1);
    assert_eq!(cpu.read(0o1105), 0);
    assert!(!cpu.carry());
    assert!(!cpu.registers().double_precision);
}

#[test]
fn multiply_and_divide_instructions() {
    // LDA '1100, MPY '1101, DIV '1102, HLT
    let mut cpu = running_at(0o1000, &[0o005100, 0o035101, 0o037102, HLT]);
    cpu.load(0o1100, &[300, 0xFFF9, 300]);

    cpu.run(20).expect("program runs");

    // 300 * -7 = -2100, then -2100 / 300 = -7 remainder 0.
    assert_eq!(cpu.a(), (-7_i16) as u16);
    assert_eq!(cpu.b(), 0);
    assert!(!cpu.carry());
}

#[test]
fn divide_overflow_sets_carry_and_keeps_accumulator() {
    let mut cpu = running_at(0o1000, &[0o037100, HLT]);
    cpu.load(0o1100, &[3]);
    cpu.set_a(5);
    cpu.set_b(9);

    cpu.run(10).expect("program runs");

    assert!(cpu.carry());
    assert_eq!((cpu.a(), cpu.b()), (5, 9));
}

#[rstest]
#[case::positive(0, 100, 7, 14, 2, 0o73)]
#[case::negative_dividend(0o177777, 0o077760, 3, 0o177773, 0o177777, 0o77)]
#[case::high_word_at_divisor_magnitude(0o177775, 0o077777, 3, 0o125253, 0o177776, 0o76)]
fn divide_leaves_partial_remainder_in_sc(
    #[case] a: u16,
    #[case] b: u16,
    #[case] divisor: u16,
    #[case] quotient: u16,
    #[case] remainder: u16,
    #[case] sc: u16,
) {
    // DIV '1100, IAB, SCA, HLT
    let mut cpu = running_at(0o1000, &[0o037100, IAB, SCA, HLT]);
    cpu.load(0o1100, &[divisor]);
    cpu.set_a(a);
    cpu.set_b(b);

    cpu.step().expect("fetch");
    cpu.step().expect("divide");
    assert_eq!((cpu.a(), cpu.b(), cpu.sc()), (quotient, remainder, sc));
    assert!(!cpu.carry());

    cpu.run(10).expect("program runs");
    assert_eq!((cpu.a(), cpu.b()), (sc, quotient));
}

#[rstest]
#[case::small_positive(0o000001, 0o000000, 0o040000, 0o000000, 14)]
#[case::carries_from_b(0o000000, 0o140000, 0o040000, 0o100000, 15)]
#[case::negative_keeps_b_sign(0o177777, 0o120000, 0o120000, 0o100000, 15)]
#[case::negative_to_full_scale(0o170000, 0o000000, 0o100000, 0o000000, 3)]
#[case::already_normal(0o040000, 0o000123, 0o040000, 0o000123, 0)]
#[case::zero_gives_up(0o000000, 0o000000, 0o000000, 0o000000, 32)]
fn normalize_shifts_until_sign_and_top_bit_differ(
    #[case] a: u16,
    #[case] b: u16,
    #[case] normal_a: u16,
    #[case] normal_b: u16,
    #[case] shifts: u16,
) {
    let mut cpu = running_at(0o1000, &[NRM, HLT]);
    cpu.set_a(a);
    cpu.set_b(b);

    cpu.step().expect("fetch");
    cpu.step().expect("normalize");

    assert_eq!((cpu.a(), cpu.b(), cpu.sc()), (normal_a, normal_b, shifts));
    // Fetch, one half-cycle per shift, next fetch.
    assert_eq!(cpu.half_cycles(), 2 + u64::from(shifts) + 2);
}

#[rstest]
#[case::jump(0o003004, 0o1004)]
#[case::jump_and_store(0o021004, 0o1005)]
fn extend_mode_drops_at_the_jump_after_dxa(#[case] jump: u16, #[case] landing: u16) {
    // EXA, DXA, NOP, jump to '1004; '1004 and '1005 both halt.
    let mut cpu = running_at(0o1000, &[EXA, DXA, NOP, jump, HLT, HLT]);

    for _ in 0..4 {
        cpu.step().expect("step");
    }
    assert!(cpu.registers().extend);
    assert!(cpu.registers().extend_disable_pending);

    cpu.step().expect("jump");
    assert!(!cpu.registers().extend);
    assert!(!cpu.registers().extend_disable_pending);

    cpu.run(10).expect("program runs");
    assert_eq!(cpu.p(), landing + 1);
}

#[rstest]
#[case::basic_keeps_fetch_page(NOP, 0o222)]
#[case::extended_uses_full_pointer(EXA, 0o111)]
fn indirect_pointer_resolves_by_addressing_mode(#[case] mode: u16, #[case] loaded: u16) {
    // In the upper 16K: mode word, LDA* '1100, HLT. The pointer holds '1200.
    let mut cpu = running_at(0o41000, &[mode, 0o105100, HLT]);
    cpu.load(0o41100, &[0o001200]);
    cpu.write(0o001200, 0o111);
    cpu.write(0o041200, 0o222);

    cpu.run(10).expect("program runs");

    assert_eq!(cpu.a(), loaded);
    assert_eq!(cpu.p(), 0o41003);
}

#[test]
fn undocumented_group_a_word_runs_generic_decoder() {
    // '140207 complements A, adds one and loads C with the overflow.
    let mut cpu = running_at(0o1000, &[0o140207, HLT]);
    cpu.set_a(5);
    cpu.run(10).expect("program runs");
    assert_eq!(cpu.catalog().entry(0o140207).mnemonic, "GENA");
    assert_eq!(cpu.a(), (-5_i16) as u16);
}

#[test]
fn each_step_charges_fetch_plus_instruction_cost() {
    let mut cpu = running_at(0o1000, &[CRA, 0o005100, 0o105101, HLT]);
    cpu.load(0o1100, &[0, 0o1100]);

    assert_eq!(cpu.step(), Ok(StepOutcome::Fetched));
    assert_eq!(cpu.half_cycles(), 2);
    cpu.step().expect("CRA");
    assert_eq!(cpu.half_cycles(), 4);
    cpu.step().expect("LDA");
    assert_eq!(cpu.half_cycles(), 8);
    cpu.step().expect("LDA*");
    assert_eq!(cpu.half_cycles(), 14);
}

#[test]
fn undefined_instruction_faults_and_halts() {
    let mut cpu = running_at(0o1000, &[0o000003]);

    let fault = cpu.run(10).expect_err("undefined word");

    assert_eq!(fault, Fault::UndefinedInstruction { word: 0o000003, addr: 0o1000 });
    assert_eq!(fault.class(), FaultClass::Dispatch);
    assert!(!cpu.is_running());
}

#[test]
fn io_to_empty_slot_faults() {
    let mut cpu = running_at(0o1000, &[0o030007]);
    assert_eq!(
        cpu.run(10),
        Err(Fault::NoDevice { device: 0o7, instr: 0o030007 })
    );
}

#[test]
fn io_function_unknown_to_device_faults() {
    let mut cpu = running_at(0o1000, &[0o030704, HLT]);
    let (device, _log) = TestDevice::new(0o4);
    attach(&mut cpu, device);
    assert_eq!(
        cpu.run(10),
        Err(Fault::UnsupportedIo { device: 0o4, instr: 0o030704 })
    );
}

#[test]
fn input_and_output_skip_when_ready() {
    // INA '1004 (clear first), skip taken past HLT; OTA '0004, skip past HLT.
    let mut cpu = running_at(0o1000, &[0o131004, HLT, 0o170004, HLT, NOP, HLT]);
    let (mut device, log) = TestDevice::new(0o4);
    device.input = 0o777;
    attach(&mut cpu, device);
    cpu.set_a(0o70000);

    cpu.run(20).expect("program runs");

    assert_eq!(cpu.a(), 0o777);
    assert_eq!(log.borrow().outputs, vec![0o777]);
    assert_eq!(cpu.p(), 0o1006);
}

#[test]
fn set_mask_broadcasts_to_every_device() {
    // SMK '20 with A as the mask, then an alias of SMK.
    let mut cpu = running_at(0o1000, &[0o170020, 0o170520, HLT]);
    let (first, first_log) = TestDevice::new(0o4);
    let (second, second_log) = TestDevice::new(0o5);
    attach(&mut cpu, first);
    attach(&mut cpu, second);
    cpu.set_a(0o123);

    cpu.run(10).expect("program runs");

    assert_eq!(first_log.borrow().masks, vec![0o123, 0o123]);
    assert_eq!(second_log.borrow().masks, vec![0o123, 0o123]);
    assert_eq!(cpu.state().interrupts.mask, 0o123);
}

#[test]
fn sense_switch_skip_follows_front_panel() {
    // SS2: skip if sense switch 2 set; A counts which path ran.
    let program = [0o101010, 0o141206, HLT];
    let mut off = running_at(0o1000, &program);
    off.run(10).expect("program runs");
    assert_eq!(off.a(), 1);

    let mut on = running_at(0o1000, &program);
    on.state_mut().set_sense_switch(2, true);
    on.run(10).expect("program runs");
    assert_eq!(on.a(), 0);
}

#[test]
fn step_limit_stops_a_tight_loop() {
    let mut cpu = running_at(0o1000, &[0o003000]);
    assert_eq!(cpu.run(50), Ok(RunOutcome::StepLimit { steps: 50 }));
    assert!(cpu.is_running());
}

#[test]
fn halted_processor_does_not_run() {
    let mut cpu = processor();
    assert_eq!(cpu.run(50), Ok(RunOutcome::Halted { steps: 0 }));
}
