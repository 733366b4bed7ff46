#![no_main]

use std::sync::{Arc, OnceLock};

use h316_core::{CoreConfig, InstructionCatalog, Processor};
use libfuzzer_sys::fuzz_target;

const MAX_STEPS: u64 = 4_096;

fn catalog() -> Option<Arc<InstructionCatalog>> {
    static CATALOG: OnceLock<Option<Arc<InstructionCatalog>>> = OnceLock::new();
    CATALOG.get_or_init(|| InstructionCatalog::standard().ok().map(Arc::new)).clone()
}

fuzz_target!(|data: &[u8]| {
    let Some(catalog) = catalog() else {
        return;
    };
    if data.len() < 4 {
        return;
    }

    let words: Vec<u16> =
        data.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]])).collect();
    let config = CoreConfig { extended_memory: data[0] & 1 == 0, ..CoreConfig::default() };
    let mut cpu = Processor::new(catalog, config);
    cpu.load(0, &words);
    cpu.set_p(words[0]);
    cpu.start();
    cpu.request_start_interrupt();

    for (addr, word) in (0_u16..).zip(words.iter().copied()) {
        let _ = cpu.catalog().disassemble(addr, word, Some(word));
    }

    // Faults are expected: undefined words and I/O to empty slots.
    let _ = cpu.run(MAX_STEPS);
    let _ = cpu.post_mortem();
});
