//! A cycle-accurate simulator of a four-processor snooping cache-coherent multiprocessor.
//!
//! `main.rs` is a thin CLI shell; the simulation itself lives in these modules, leaves-first per
//! the component table: `address` → `block` → `set` → `cache` / `memory` → `protocol` → `bus` →
//! `processor` → `scheduler`, plus the ambient `config`, `cli`, `error`, `trace`, and `stats`.

pub mod address;
pub mod block;
pub mod bus;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod memory;
pub mod processor;
pub mod protocol;
pub mod scheduler;
pub mod set;
pub mod stats;
pub mod trace;

use clap::Parser;

use crate::cli::Cli;
use crate::config::SystemSpec;
use crate::error::SimError;
use crate::scheduler::Scheduler;

/// Parses CLI arguments, loads traces, runs the simulation, and returns the formatted report.
/// Kept separate from `main` so integration tests can drive the whole pipeline without a process
/// boundary.
pub fn run() -> Result<String, SimError> {
    let cli = Cli::parse();
    let spec = SystemSpec::new(
        cli.protocol,
        cli.cache_size,
        cli.associativity,
        cli.block_size,
    )?;
    let traces = trace::read_traces(&cli.file_base)?;
    let scheduler = Scheduler::new(spec, traces);
    let (stats, processors) = scheduler.run();
    Ok(stats::format_report(&stats, &processors))
}
