//! Statistics reporting: formats the section 6 output fields.
//!
//! Grounded on the teacher's `Printer` (a tabular dump of one row per metric, one column per
//! core), but restructured into the flat per-field summary section 6 specifies instead of the
//! teacher's wide table. The miss-rate format keeps the teacher's raw-fraction convention
//! (`"Cache Miss Rate: 0.2."` for 10/50 misses/accesses) rather than multiplying by 100 — see
//! SPEC_FULL.md §10.5.

use std::fmt::Write as _;

use crate::processor::Processor;
use crate::scheduler::SimulationStats;

pub fn format_report(stats: &SimulationStats, processors: &[Processor]) -> String {
    let mut out = String::new();
    writeln!(out, "Total Cycles: {}", stats.total_cycles).unwrap();
    for p in processors {
        writeln!(out, "Processor {}:", p.id).unwrap();
        writeln!(out, "  Compute Cycles: {}", p.stats.compute_cycles).unwrap();
        writeln!(
            out,
            "  Load/Store Instructions: {}",
            p.stats.loads + p.stats.stores
        )
        .unwrap();
        writeln!(out, "  Idle Cycles: {}", p.stats.idle_cycles).unwrap();
        writeln!(out, "  Cache Miss Rate: {:.1}.", p.stats.miss_rate()).unwrap();
    }
    writeln!(out, "Bus Traffic (bytes): {}", stats.bus_traffic_bytes).unwrap();
    writeln!(out, "Private Data Accesses: {}", stats.private_accesses).unwrap();
    writeln!(out, "Public Data Accesses: {}", stats.public_accesses).unwrap();
    out
}
