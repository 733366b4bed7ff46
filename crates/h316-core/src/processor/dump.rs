//! Text dumps for post-mortem analysis and for loading images into other
//! tools.

use super::Processor;
use crate::memory::MEMORY_WORDS;
use crate::TraceRecord;

/// Word synthesized at address 1 when an entry address is supplied:
/// `JMP* '2`.
const BOOT_JUMP: u16 = 0o102002;
/// Last word of the boot-loader area replaced by the synthesized entry.
const BOOT_AREA_END: u16 = 15;
/// Words per row of a memory-initialization image.
const IMAGE_ROW_WORDS: usize = 8;

impl Processor {
    /// Renders the trace buffer, oldest first, one step per line.
    #[must_use]
    pub fn trace_dump(&self) -> String {
        self.trace.iter().map(|record| self.trace_line(record)).collect()
    }

    fn trace_line(&self, record: &TraceRecord) -> String {
        let action = record.break_kind.map_or_else(
            || {
                let text = self.catalog.disassemble(record.p, record.word, None);
                format!("{:06o}  {text}", record.word)
            },
            |kind| format!("<{kind:?} break>"),
        );
        format!(
            "{:>12} A={:06o} B={:06o} X={:06o} C={} {:05o}  {action}\n",
            record.time,
            record.a,
            record.b,
            record.x,
            u8::from(record.c),
            record.p,
        )
    }

    /// Disassembles memory from `first` to `last` inclusive.
    #[must_use]
    pub fn disassemble_range(&self, first: u16, last: u16) -> String {
        (first..=last)
            .map(|addr| {
                let word = self.state.read(addr);
                format!("{addr:05o}  {word:06o}  {}\n", self.catalog.disassemble(addr, word, None))
            })
            .collect()
    }

    /// Modified words in address order, with the boot area replaced by a
    /// jump to `entry` when one is given.
    fn image_words(&self, entry: Option<u16>) -> Vec<(u16, u16)> {
        let memory = self.state.memory();
        let Some(entry) = entry else {
            return memory.modified_words().collect();
        };
        let mut words = vec![(0, 0), (1, BOOT_JUMP), (2, entry)];
        words.extend(memory.modified_words().filter(|(addr, _)| *addr > BOOT_AREA_END));
        words
    }

    /// Lists every modified word as octal and hex with its disassembly.
    ///
    /// With `entry`, addresses 0-2 hold a synthesized `JMP* '2` to the
    /// entry address and the rest of the boot area is left out.
    #[must_use]
    pub fn memory_listing(&self, entry: Option<u16>) -> String {
        self.image_words(entry)
            .into_iter()
            .map(|(addr, word)| {
                format!(
                    "{addr:05o} {word:06o} (0x{word:04X}) ; {}\n",
                    self.catalog.disassemble(addr, word, None)
                )
            })
            .collect()
    }

    /// Renders modified words as a memory-initialization image: an
    /// `@address` marker (hex) at the start of every contiguous run, then
    /// rows of up to eight comma-separated hex words.
    ///
    /// `entry` is handled as in [`Processor::memory_listing`].
    #[must_use]
    pub fn memory_init_image(&self, entry: Option<u16>) -> String {
        let mut runs: Vec<(u16, Vec<u16>)> = Vec::new();
        for (addr, word) in self.image_words(entry) {
            match runs.last_mut() {
                Some((start, run)) if usize::from(*start) + run.len() == usize::from(addr) => {
                    run.push(word);
                }
                _ => runs.push((addr, vec![word])),
            }
        }

        let mut out = String::new();
        for (start, run) in runs {
            out.push_str(&format!("@{start:04X}\n"));
            for row in run.chunks(IMAGE_ROW_WORDS) {
                let row: Vec<String> = row.iter().map(|word| format!("{word:04X}")).collect();
                out.push_str(&row.join(","));
                out.push('\n');
            }
        }
        out
    }

    /// Trace dump followed by a listing of modified memory and the current
    /// registers.
    #[must_use]
    pub fn post_mortem(&self) -> String {
        let regs = &self.state.regs;
        let mut out = String::from("--- trace ---\n");
        out.push_str(&self.trace_dump());
        out.push_str(&format!(
            "--- registers ---\nA={:06o} B={:06o} X={:06o} P={:05o} Y={:05o} M={:06o} C={} \
             time={}\n",
            regs.a,
            regs.b,
            self.state.x(),
            regs.p,
            regs.y,
            regs.m,
            u8::from(regs.c),
            self.state.half_cycles(),
        ));
        out.push_str(&format!(
            "--- memory ({} of {MEMORY_WORDS} words modified) ---\n",
            self.state.memory().modified_words().count()
        ));
        out.push_str(&self.memory_listing(None));
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{CoreConfig, InstructionCatalog, Processor};

    fn processor() -> Processor {
        let catalog = InstructionCatalog::standard().expect("standard catalog");
        Processor::new(Arc::new(catalog), CoreConfig::default())
    }

    #[test]
    fn listing_shows_only_modified_words() {
        let mut cpu = processor();
        cpu.load(0o1000, &[0o140040, 0o000000]);
        let listing = cpu.memory_listing(None);
        assert_eq!(
            listing,
            "01000 140040 (0xC020) ; CRA\n01001 000000 (0x0000) ; HLT\n"
        );
    }

    #[test]
    fn entry_address_replaces_boot_area() {
        let mut cpu = processor();
        cpu.load(1, &[0o7777; 15]);
        cpu.load(0o1000, &[0o000201]);
        let listing = cpu.memory_listing(Some(0o1000));
        let addresses: Vec<&str> = listing.lines().map(|line| &line[..5]).collect();
        assert_eq!(addresses, vec!["00000", "00001", "00002", "01000"]);
        assert!(listing.contains("00001 102002 (0x8402) ; JMP* '0002"));
        assert!(listing.contains("00002 001000"));
    }

    #[test]
    fn init_image_splits_runs_and_rows() {
        let mut cpu = processor();
        cpu.load(0x100, &(1..=10).collect::<Vec<u16>>());
        cpu.load(0x200, &[0xBEEF]);
        let image = cpu.memory_init_image(None);
        assert_eq!(
            image,
            "@0100\n0001,0002,0003,0004,0005,0006,0007,0008\n0009,000A\n@0200\nBEEF\n"
        );
    }

    #[test]
    fn disassembly_range_is_inclusive() {
        let mut cpu = processor();
        cpu.load(0o100, &[0o041475, 0o002100]);
        let text = cpu.disassemble_range(0o100, 0o101);
        assert_eq!(text, "00100  041475  LGL 3\n00101  002100  JMP '0100\n");
    }
}
