//! Command-line front end.
//!
//! Replaces the teacher's raw `env::args()` positional indexing in `main()` with a `clap`
//! derive parser, the same way `romnn-gpucachesim/trace` front-ends its own cache simulator.

use clap::Parser;

use crate::config::Protocol;

/// A cycle-accurate simulator of a four-processor snooping cache-coherent multiprocessor.
#[derive(Debug, Parser)]
#[command(name = "coherence-sim", version, about)]
pub struct Cli {
    /// Coherence protocol to simulate: MESI or Dragon.
    pub protocol: Protocol,

    /// Base name of the trace files; the simulator reads `<file_base>_0.data` through
    /// `<file_base>_3.data`, one per processor.
    pub file_base: String,

    /// Total cache capacity in bytes, shared identically by all four processors.
    pub cache_size: u32,

    /// Set associativity.
    pub associativity: u32,

    /// Block (cache line) size in bytes.
    pub block_size: u32,
}
