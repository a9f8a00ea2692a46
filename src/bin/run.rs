//! Program runner CLI.
//!
//! Evaluates a raw program file and prints the result word to stdout.
//!
//! # Usage
//! ```text
//! flowvm-run <program.bin> [OPTIONS]
//! ```
//!
//! # Arguments
//! - `program.bin`: Program byte stream (records, data, start table)
//!
//! # Options
//! - `-p, --processors <n>`: Number of processors in the start table (defaults to 1)
//! - `-r, --result <addr>`: Word-index to print after execution (defaults to 0)
//! - `--arena-bytes <bytes>`: Arena capacity (defaults to `FLOWVM_ARENA_BYTES` or 10 MiB)
//! - `-q, --quiet`: Only log errors
//!
//! # Examples
//! ```text
//! flowvm-run add.bin -r 10
//! flowvm-run parallel.bin -p 4 -r 60 --arena-bytes 65536
//! ```

use flowvm::utils::log::{Level, set_min_level};
use flowvm::virtual_machine::config::RuntimeConfig;
use flowvm::virtual_machine::evaluate::{EvalRequest, Evaluator};
use flowvm::{error, info};
use std::env;
use std::fs;
use std::path::Path;
use std::process;
use std::str::FromStr;
use std::time::Instant;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let input_path = &args[1];
    let mut processor_count = 1usize;
    let mut result_address = 0i64;
    let mut config = RuntimeConfig::from_env();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            k @ ("--processors" | "-p") => {
                processor_count = parse_value(&args, &mut i, k);
                if processor_count == 0 {
                    error!("Processor count must be greater than 0");
                    process::exit(1);
                }
            }
            k @ ("--result" | "-r") => {
                result_address = parse_value(&args, &mut i, k);
            }
            k @ "--arena-bytes" => {
                config.arena_bytes = parse_value(&args, &mut i, k);
            }
            "--quiet" | "-q" => {
                set_min_level(Level::Error);
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    if !Path::new(input_path).exists() {
        error!("Input file does not exist: {}", input_path);
        process::exit(1);
    }

    let bytes = match fs::read(input_path) {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read program: {}", e);
            process::exit(1);
        }
    };

    let request = EvalRequest {
        program_size: bytes.len(),
        processor_count,
        result_address,
    };
    info!(
        "Loaded {} ({} bytes), arena {} bytes",
        input_path,
        bytes.len(),
        config.arena_bytes
    );

    let start = Instant::now();
    let execution = Evaluator::new(config)
        .execute(&bytes, &request)
        .unwrap_or_else(|e| {
            error!("Evaluation failed: {e}");
            process::exit(2)
        });
    let elapsed = start.elapsed();

    for report in execution.reports() {
        info!(
            "processor {}: start {} stop {} ({} instructions, {} elements)",
            report.processor,
            report.start,
            report.stopped_at,
            report.instructions,
            report.elements
        );
    }
    info!("Finished in {:.3} ms", elapsed.as_secs_f64() * 1000.0);

    match execution.word(result_address) {
        Ok(value) => println!("{value}"),
        Err(e) => {
            error!("{e}");
            process::exit(2);
        }
    }
}

/// Parses the argument following the flag at `args[*i]` and advances past both.
fn parse_value<T: FromStr>(args: &[String], i: &mut usize, flag: &str) -> T {
    *i += 1;
    let Some(raw) = args.get(*i) else {
        error!("{flag} requires an argument");
        process::exit(1);
    };
    let value = raw.parse::<T>().unwrap_or_else(|_| {
        error!("Invalid value for {flag}: '{raw}' is not a valid number");
        process::exit(1);
    });
    *i += 1;
    value
}

const USAGE: &str = "\
Program Runner

USAGE:
    {program} <program.bin> [OPTIONS]

ARGS:
    <program.bin>    Program byte stream: records, data, start table

OPTIONS:
    -p, --processors <n>     Processors in the start table (defaults to 1)
    -r, --result <addr>      Word-index printed after execution (defaults to 0)
        --arena-bytes <n>    Arena capacity in bytes (defaults to FLOWVM_ARENA_BYTES or 10 MiB)
    -q, --quiet              Only log errors
    -h, --help               Print this help message

EXAMPLES:
    # Run a single-processor program and print word 10
    {program} add.bin -r 10

    # Run four processors in a 64 KiB arena
    {program} parallel.bin -p 4 -r 60 --arena-bytes 65536
";

fn print_usage(program: &str) {
    info!("{}", USAGE.replace("{program}", program));
}
