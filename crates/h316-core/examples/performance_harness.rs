//! Throughput harness for the instruction engine.
//!
//! Runs small loops on several threads that share one dispatch table and
//! reports host instructions per second plus the speed relative to a real
//! H316.
//!
//! ```sh
//! cargo run -p h316-core --release --example performance_harness
//! ```

#![allow(clippy::pedantic)]

use h316_core::{CoreConfig, CpuModel, InstructionCatalog, Processor};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

const NUM_THREADS: usize = 4;
const STEPS_PER_BATCH: u64 = 10_000;
const ORIGIN: u16 = 0o1000;

#[derive(Debug, Clone, Copy)]
struct BenchmarkResult {
    name: &'static str,
    instructions_per_second: f64,
    speed_ratio: f64,
}

/// `AOA` / `JMP '1000`.
const REGISTER_LOOP: &[u16] = &[0o141206, 0o003000];

/// `LDA '1100` / `ADD '1101` / `STA '1102` / `IRS '1103` / `JMP '1000` /
/// `JMP '1000`; the second jump catches the skip when the counter wraps.
const MEMORY_LOOP: &[u16] = &[0o005100, 0o015101, 0o011102, 0o025103, 0o003000, 0o003000];

/// `LDA '1100` / `MPY '1101` / `DIV '1101` / `LGL 3` / `JMP '1000`.
const ARITHMETIC_LOOP: &[u16] = &[0o005100, 0o035101, 0o037101, 0o041475, 0o003000];

fn benchmark(
    name: &'static str,
    program: &'static [u16],
    catalog: &Arc<InstructionCatalog>,
    duration: Duration,
) -> BenchmarkResult {
    let (tx, rx) = mpsc::channel();

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let tx = tx.clone();
            let catalog = Arc::clone(catalog);
            thread::spawn(move || {
                let config = CoreConfig { trace_capacity: 0, ..CoreConfig::default() };
                let mut cpu = Processor::new(catalog, config);
                cpu.load(ORIGIN, program);
                cpu.load(0o1100, &[0o123, 0o45, 0, 0]);
                cpu.set_p(ORIGIN);
                cpu.start();

                let mut total_steps = 0_u64;
                let start = Instant::now();
                while start.elapsed() < duration {
                    match cpu.run(STEPS_PER_BATCH) {
                        Ok(outcome) => total_steps += outcome.steps(),
                        Err(_) => break,
                    }
                }

                tx.send((total_steps, cpu.half_cycles())).ok();
            })
        })
        .collect();

    for h in handles {
        h.join().ok();
    }

    drop(tx);

    let mut total_steps = 0_u64;
    let mut total_half_cycles = 0_u64;
    for (steps, half_cycles) in rx {
        total_steps += steps;
        total_half_cycles += half_cycles;
    }

    let elapsed_secs = duration.as_secs_f64();
    let simulated_secs =
        total_half_cycles as f64 * CpuModel::H316.half_cycle_ns() as f64 / 1_000_000_000.0;

    BenchmarkResult {
        name,
        instructions_per_second: total_steps as f64 / elapsed_secs,
        speed_ratio: simulated_secs / (elapsed_secs * NUM_THREADS as f64),
    }
}

fn format_number(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.2}K", n / 1_000.0)
    } else {
        format!("{:.2}", n)
    }
}

fn print_results(results: &[BenchmarkResult]) {
    println!("threads: {NUM_THREADS}, batch: {STEPS_PER_BATCH} steps");
    println!("{:16} {:>14} {:>12}", "benchmark", "steps/sec", "x real H316");
    for result in results {
        println!(
            "{:16} {:>14} {:>12.1}",
            result.name,
            format_number(result.instructions_per_second),
            result.speed_ratio
        );
    }
}

fn main() {
    let catalog = match InstructionCatalog::standard() {
        Ok(catalog) => Arc::new(catalog),
        Err(error) => {
            eprintln!("catalog: {error}");
            std::process::exit(1);
        }
    };
    let duration = Duration::from_secs(2);

    let results = [
        benchmark("register_loop", REGISTER_LOOP, &catalog, duration),
        benchmark("memory_loop", MEMORY_LOOP, &catalog, duration),
        benchmark("arithmetic_loop", ARITHMETIC_LOOP, &catalog, duration),
    ];
    print_results(&results);
}
