//! VM benchmark binary.
//!
//! Measures end-to-end evaluation time (arena allocation, program copy,
//! launch, execution and join) for representative programs.
//! Run with: `cargo run --release --bin flowvm-bench`

use std::time::{Duration, Instant};

use flowvm::types::encoding::Encode;
use flowvm::virtual_machine::evaluate::{EvalRequest, Evaluator};
use flowvm::virtual_machine::instruction::{INSTRUCTION_WORDS, Instruction};
use flowvm::virtual_machine::program::AssemblyProgram;

// ---------------------------------------------------------------------------
// Benchmark harness
// ---------------------------------------------------------------------------

struct BenchResult {
    name: &'static str,
    iterations: u64,
    total: Duration,
    elements: u64,
    /// Instructions executed per run across all processors (None to omit column).
    instructions: Option<u64>,
}

impl BenchResult {
    fn avg(&self) -> Duration {
        self.total / self.iterations as u32
    }

    fn print(&self) {
        let avg = self.avg();
        let ns_per_op = avg.as_nanos();
        let ns_per_instr = self
            .instructions
            .filter(|&n| n > 0)
            .map(|n| format!("{:>8.1}", ns_per_op as f64 / n as f64))
            .unwrap_or_else(|| "       -".to_string());
        println!(
            "  {:<30} {:>7} iters {:>10.3} us/iter {:>12} elems  {} ns/instr",
            self.name,
            self.iterations,
            ns_per_op as f64 / 1000.0,
            self.elements,
            ns_per_instr,
        );
    }
}

/// Runs `f` for at least `min_duration`, returning aggregated results.
fn bench<F>(name: &'static str, min_duration: Duration, mut f: F) -> BenchResult
where
    F: FnMut() -> (u64, u64),
{
    // Warmup
    for _ in 0..3 {
        f();
    }

    let mut iterations = 0u64;
    let mut last = (0u64, 0u64);
    let start = Instant::now();
    while start.elapsed() < min_duration {
        last = f();
        iterations += 1;
    }
    let total = start.elapsed();

    BenchResult {
        name,
        iterations,
        total,
        instructions: Some(last.0),
        elements: last.1,
    }
}

/// Evaluates once, returning (instructions, elements) summed over processors.
fn run(evaluator: &Evaluator, bytes: &[u8], request: &EvalRequest) -> (u64, u64) {
    let exec = evaluator.execute(bytes, request).expect("evaluation failed");
    exec.reports().iter().fold((0, 0), |(i, e), r| {
        (i + r.instructions, e + r.elements)
    })
}

// ---------------------------------------------------------------------------
// Benchmark programs
// ---------------------------------------------------------------------------

/// `n` dependent scalar adds accumulating into one word.
fn scalar_chain(n: usize) -> AssemblyProgram {
    let acc = (n + 1) * INSTRUCTION_WORDS;
    let one = acc + 1;
    let mut instructions = vec![Instruction::add(1, acc as i32, acc as i32, one as i32); n];
    instructions.push(Instruction::stop());
    AssemblyProgram::new(instructions, vec![0, 1], vec![0])
}

/// `n` adds of `lanes`-wide vectors over the zeroed region after the program.
fn wide_vector(n: usize, lanes: u32) -> AssemblyProgram {
    let base = ((n + 2) * INSTRUCTION_WORDS) as i32;
    let width = lanes as i32;
    let mut instructions = vec![Instruction::add(lanes, base, base + width, base + 2 * width); n];
    instructions.push(Instruction::stop());
    AssemblyProgram::new(instructions, vec![], vec![0])
}

/// `processors` independent scalar chains of `n` adds each, one output word per chain.
fn parallel_chains(processors: usize, n: usize) -> AssemblyProgram {
    let records = processors * (n + 1);
    let out = (records * INSTRUCTION_WORDS) as i32;
    let one = out + processors as i32;
    let mut instructions = Vec::with_capacity(records);
    let mut starts = Vec::with_capacity(processors);
    for p in 0..processors {
        starts.push(instructions.len() as i32);
        let acc = out + p as i32;
        instructions.extend(std::iter::repeat_n(Instruction::add(1, acc, acc, one), n));
        instructions.push(Instruction::stop());
    }
    let mut data = vec![0; processors];
    data.push(1);
    AssemblyProgram::new(instructions, data, starts)
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let min = Duration::from_secs(2);
    let evaluator = Evaluator::default();

    println!("VM Benchmarks (each runs for >= 2s)\n");
    println!(
        "  {:<30} {:>7}       {:>14} {:>12}        {:>10}",
        "benchmark", "iters", "avg time", "elems/run", "ns/instr"
    );
    println!("  {}", "-".repeat(88));

    let cases: [(&'static str, AssemblyProgram); 6] = [
        ("scalar_chain(1K)", scalar_chain(1_000)),
        ("scalar_chain(100K)", scalar_chain(100_000)),
        ("wide_vector(16 x 4K)", wide_vector(16, 4_096)),
        ("wide_vector(4 x 256K)", wide_vector(4, 262_144)),
        ("parallel_chains(4 x 25K)", parallel_chains(4, 25_000)),
        ("parallel_chains(16 x 6K)", parallel_chains(16, 6_250)),
    ];

    // Encoding cost excluded from the benchmark
    for (name, prog) in cases {
        let bytes = prog.to_bytes();
        let request = prog.request(0);
        bench(name, min, || run(&evaluator, &bytes, &request)).print();
    }

    println!();
}
