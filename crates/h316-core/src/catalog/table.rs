//! Standard instruction set declarations.

use super::{FallbackRange, InstructionClass, InstructionDef};
use crate::execute::{generic_a, generic_b, io, memory_reference as mr, shift, skip};

use InstructionClass::{GenericA, GenericB, IoAsGeneric, MemoryReference, Shift, Skip};

const fn def(
    mnemonic: &'static str,
    class: InstructionClass,
    opcode: u16,
    description: &'static str,
    executor: crate::Executor,
) -> InstructionDef {
    InstructionDef::new(mnemonic, class, opcode, description, executor)
}

const MEMORY_REFERENCE: [InstructionDef; 15] = [
    def("JMP", MemoryReference, 0o002000, "Unconditional jump", mr::jmp),
    def("LDA", MemoryReference, 0o004000, "Load A (DLD in double precision)", mr::lda),
    def("ANA", MemoryReference, 0o006000, "And to A", mr::ana),
    def("STA", MemoryReference, 0o010000, "Store A (DST in double precision)", mr::sta),
    def("ERA", MemoryReference, 0o012000, "Exclusive or to A", mr::era),
    def("ADD", MemoryReference, 0o014000, "Add (DAD in double precision)", mr::add),
    def("SUB", MemoryReference, 0o016000, "Subtract (DSB in double precision)", mr::sub),
    def("JST", MemoryReference, 0o020000, "Jump and store location", mr::jst),
    def("CAS", MemoryReference, 0o022000, "Compare and skip", mr::cas),
    def("IRS", MemoryReference, 0o024000, "Increment, replace and skip", mr::irs),
    def("IMA", MemoryReference, 0o026000, "Interchange memory and A", mr::ima),
    def("STX", MemoryReference, 0o032000, "Store index", mr::stx).with_tag_in_opcode(),
    def("LDX", MemoryReference, 0o072000, "Load index", mr::ldx).with_tag_in_opcode(),
    def("MPY", MemoryReference, 0o034000, "Multiply", mr::mpy),
    def("DIV", MemoryReference, 0o036000, "Divide", mr::div),
];

const IO: [InstructionDef; 6] = [
    def("OCP", InstructionClass::Io, 0o030000, "Output control pulse", io::ocp),
    def("SKS", InstructionClass::Io, 0o070000, "Skip if ready line set", io::sks),
    def("INA", InstructionClass::Io, 0o130000, "Input to A", io::ina),
    def("OTA", InstructionClass::Io, 0o170000, "Output from A", io::ota).reserving_smk_device(),
    def("SMK", IoAsGeneric, 0o170020, "Set interrupt mask", io::smk),
    def("OTK", IoAsGeneric, 0o171020, "Output keys", generic_b::otk),
];

const GENERIC_B: [InstructionDef; 13] = [
    def("HLT", GenericB, 0o000000, "Halt", generic_b::hlt),
    def("SGL", GenericB, 0o000005, "Enter single precision mode", generic_b::sgl),
    def("DBL", GenericB, 0o000007, "Enter double precision mode", generic_b::dbl),
    def("DXA", GenericB, 0o000011, "Disable extended addressing", generic_b::dxa),
    def("EXA", GenericB, 0o000013, "Enable extended addressing", generic_b::exa),
    def("RMP", GenericB, 0o000021, "Reset memory parity error", generic_b::rmp),
    def("SCA", GenericB, 0o000041, "Shift count to A", generic_b::sca),
    def("INK", GenericB, 0o000043, "Input keys", generic_b::ink),
    def("NRM", GenericB, 0o000101, "Normalize", generic_b::nrm),
    def("IAB", GenericB, 0o000201, "Interchange A and B", generic_b::iab),
    def("ENB", GenericB, 0o000401, "Enable program interrupt", generic_b::enb),
    def("INH", GenericB, 0o001001, "Inhibit program interrupt", generic_b::inh),
    def("ERM", GenericB, 0o001401, "Enter restricted execution mode", generic_b::erm),
];

const GENERIC_A: [InstructionDef; 16] = [
    def("CRA", GenericA, 0o140040, "Clear A", generic_a::cra),
    def("CMA", GenericA, 0o140401, "Complement A", generic_a::cma),
    def("TCA", GenericA, 0o140407, "Two's complement A", generic_a::tca),
    def("AOA", GenericA, 0o141206, "Add one to A", generic_a::aoa),
    def("ACA", GenericA, 0o141216, "Add C to A", generic_a::aca),
    def("SCB", GenericA, 0o140600, "Set C", generic_a::scb),
    def("RCB", GenericA, 0o140200, "Reset C", generic_a::rcb),
    def("CHS", GenericA, 0o140024, "Complement A sign", generic_a::chs),
    def("SSM", GenericA, 0o140500, "Set A sign minus", generic_a::ssm),
    def("SSP", GenericA, 0o140100, "Set A sign plus", generic_a::ssp),
    def("CSA", GenericA, 0o140320, "Copy sign of A to C", generic_a::csa),
    def("CAL", GenericA, 0o141050, "Clear A left half", generic_a::cal),
    def("CAR", GenericA, 0o141044, "Clear A right half", generic_a::car),
    def("ICL", GenericA, 0o141140, "Interchange and clear left half of A", generic_a::icl),
    def("ICR", GenericA, 0o141240, "Interchange and clear right half of A", generic_a::icr),
    def("ICA", GenericA, 0o141340, "Interchange characters in A", generic_a::ica),
];

const SKIP: [InstructionDef; 22] = [
    def("SKP", Skip, 0o100000, "Skip unconditionally", skip::skip),
    def("NOP", Skip, 0o101000, "No operation", skip::skip),
    def("SPL", Skip, 0o100400, "Skip if A plus", skip::skip),
    def("SMI", Skip, 0o101400, "Skip if A minus", skip::skip),
    def("SZE", Skip, 0o100040, "Skip if A zero", skip::skip),
    def("SNZ", Skip, 0o101040, "Skip if A not zero", skip::skip),
    def("SLZ", Skip, 0o100100, "Skip if A bit 16 zero", skip::skip),
    def("SLN", Skip, 0o101100, "Skip if A bit 16 nonzero", skip::skip),
    def("SRC", Skip, 0o100001, "Skip if C reset", skip::skip),
    def("SSC", Skip, 0o101001, "Skip if C set", skip::skip),
    def("SR1", Skip, 0o100020, "Skip if sense switch 1 reset", skip::skip),
    def("SS1", Skip, 0o101020, "Skip if sense switch 1 set", skip::skip),
    def("SR2", Skip, 0o100010, "Skip if sense switch 2 reset", skip::skip),
    def("SS2", Skip, 0o101010, "Skip if sense switch 2 set", skip::skip),
    def("SR3", Skip, 0o100004, "Skip if sense switch 3 reset", skip::skip),
    def("SS3", Skip, 0o101004, "Skip if sense switch 3 set", skip::skip),
    def("SR4", Skip, 0o100002, "Skip if sense switch 4 reset", skip::skip),
    def("SS4", Skip, 0o101002, "Skip if sense switch 4 set", skip::skip),
    def("SSR", Skip, 0o100036, "Skip if no sense switch set", skip::skip),
    def("SSS", Skip, 0o101036, "Skip if any sense switch set", skip::skip),
    def("SPN", Skip, 0o100200, "Skip if no memory parity error", skip::skip),
    def("SPS", Skip, 0o101200, "Skip if memory parity error", skip::skip),
];

const SHIFT: [InstructionDef; 12] = [
    def("LRL", Shift, 0o040000, "Long right logical", shift::lrl),
    def("LRS", Shift, 0o040100, "Long right shift", shift::lrs),
    def("LRR", Shift, 0o040200, "Long right rotate", shift::lrr),
    def("LGR", Shift, 0o040400, "Logical right shift", shift::lgr),
    def("ARS", Shift, 0o040500, "Arithmetic right shift", shift::ars),
    def("ARR", Shift, 0o040600, "Rotate A right", shift::arr),
    def("LLL", Shift, 0o041000, "Long left logical", shift::lll),
    def("LLS", Shift, 0o041100, "Long left shift", shift::lls),
    def("LLR", Shift, 0o041200, "Long left rotate", shift::llr),
    def("LGL", Shift, 0o041400, "Logical left shift", shift::lgl),
    def("ALS", Shift, 0o041500, "Arithmetic left shift", shift::als),
    def("ALR", Shift, 0o041600, "Rotate A left", shift::alr),
];

/// Every documented instruction.
#[must_use]
pub fn standard_definitions() -> Vec<InstructionDef> {
    [&MEMORY_REFERENCE[..], &IO[..], &GENERIC_B[..], &GENERIC_A[..], &SKIP[..], &SHIFT[..]].concat()
}

/// Encodings that decode identically to one documented instruction.
///
/// `SMK` and `OTK` ignore the low three function bits. The single-bit
/// generic-B decodes ignore the strobe in bit 0.
#[must_use]
pub fn standard_aliases() -> Vec<Vec<u16>> {
    let function_variants = |base: u16| (0..8_u16).map(|f| base | (f << 6)).collect::<Vec<_>>();
    let mut groups = vec![function_variants(0o170020), function_variants(0o171020)];
    groups.extend(
        [0o000201_u16, 0o000401, 0o001001, 0o001401, 0o000041, 0o000101]
            .into_iter()
            .map(|proper| vec![proper, proper & !1]),
    );
    groups
}

/// Generic decoders for the undocumented words of the skip, shift and
/// generic-A spaces.
#[must_use]
pub fn standard_fallbacks() -> Vec<FallbackRange> {
    vec![
        FallbackRange {
            first: 0o100000,
            last: 0o101777,
            class: Skip,
            mnemonic: "SKIP",
            description: "Generic skip",
            executor: skip::skip,
        },
        FallbackRange {
            first: 0o040000,
            last: 0o041777,
            class: Shift,
            mnemonic: "SHIFT",
            description: "Generic shift",
            executor: shift::generic_shift,
        },
        FallbackRange {
            first: 0o140000,
            last: 0o141777,
            class: GenericA,
            mnemonic: "GENA",
            description: "Generic group A",
            executor: generic_a::generic_a,
        },
    ]
}
