//! Skip group.

use super::skip_next;
use crate::{CoreState, Fault, Processor};

const REVERSE: u16 = 0o1000;

/// Condition lines of the skip decoder, by selecting bit.
fn conditions(state: &CoreState) -> [(u16, bool); 9] {
    let regs = &state.regs;
    [
        (0o400, regs.a & 0x8000 != 0),
        (0o200, regs.parity_error),
        (0o100, regs.a & 1 != 0),
        (0o040, regs.a != 0),
        (0o020, regs.sense_switch(1)),
        (0o010, regs.sense_switch(2)),
        (0o004, regs.sense_switch(3)),
        (0o002, regs.sense_switch(4)),
        (0o001, regs.c),
    ]
}

/// Whether a skip word skips in the current state.
///
/// Without bit 9 the skip happens when none of the selected conditions
/// holds; with it, when any does. `SKP` selects nothing and always skips,
/// `NOP` selects nothing reversed and never does.
#[must_use]
pub fn skip_taken(state: &CoreState, instr: u16) -> bool {
    let any = conditions(state)
        .iter()
        .any(|(select, holds)| instr & select != 0 && *holds);
    if instr & REVERSE != 0 {
        any
    } else {
        !any
    }
}

/// Executes every word of the skip group, documented or not.
pub(crate) fn skip(cpu: &mut Processor, instr: u16) -> Result<(), Fault> {
    if skip_taken(&cpu.state, instr) {
        skip_next(cpu);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::skip_taken;
    use crate::{CoreConfig, CoreState};

    fn state(a: u16, c: bool) -> CoreState {
        let mut state = CoreState::new(CoreConfig::default());
        state.regs.a = a;
        state.regs.c = c;
        state
    }

    #[rstest]
    #[case::skp(0o100000, 0, false, true)]
    #[case::nop(0o101000, 0o177777, true, false)]
    #[case::sze_zero(0o100040, 0, false, true)]
    #[case::sze_nonzero(0o100040, 5, false, false)]
    #[case::snz(0o101040, 5, false, true)]
    #[case::spl_negative(0o100400, 0x8000, false, false)]
    #[case::smi(0o101400, 0x8000, false, true)]
    #[case::slz_odd(0o100100, 3, false, false)]
    #[case::sln(0o101100, 3, false, true)]
    #[case::src(0o100001, 0, false, true)]
    #[case::ssc(0o101001, 0, true, true)]
    fn documented_skips(
        #[case] word: u16,
        #[case] a: u16,
        #[case] c: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(skip_taken(&state(a, c), word), expected);
    }

    #[test]
    fn sense_switch_tests_follow_the_switches() {
        let mut state = state(0, false);
        assert!(skip_taken(&state, 0o100036));
        assert!(!skip_taken(&state, 0o101036));
        state.set_sense_switch(3, true);
        assert!(skip_taken(&state, 0o101004));
        assert!(!skip_taken(&state, 0o100004));
        assert!(skip_taken(&state, 0o100020));
        assert!(!skip_taken(&state, 0o100036));
    }

    #[test]
    fn combined_conditions_or_together() {
        // Skip if A is zero and C is reset.
        assert!(skip_taken(&state(0, false), 0o100041));
        assert!(!skip_taken(&state(0, true), 0o100041));
        // Reversed: skip if A is minus or odd.
        assert!(skip_taken(&state(1, false), 0o101500));
        assert!(!skip_taken(&state(2, false), 0o101500));
    }
}
