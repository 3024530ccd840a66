//! End-to-end scenario tests, driving the full `Scheduler` the way `main`'s `run()` does but
//! over in-memory traces instead of files on disk. Mirrors the six numbered scenarios and the
//! monotonicity/round-trip invariants.

use std::collections::VecDeque;

use coherence_sim::address::Addr;
use coherence_sim::config::{Protocol, SystemSpec};
use coherence_sim::processor::TraceEntry;
use coherence_sim::scheduler::Scheduler;

fn traces(per_processor: Vec<Vec<TraceEntry>>) -> Vec<VecDeque<TraceEntry>> {
    per_processor.into_iter().map(VecDeque::from).collect()
}

fn mesi_spec() -> SystemSpec {
    SystemSpec::new(Protocol::Mesi, 1024, 2, 64).unwrap()
}

#[test]
fn scenario_1_single_processor_private_working_set() {
    let t = traces(vec![
        vec![
            TraceEntry::Load(Addr(0x00000000)),
            TraceEntry::Load(Addr(0x00000040)),
            TraceEntry::Load(Addr(0x00000080)),
        ],
        vec![],
        vec![],
        vec![],
    ]);
    let (stats, procs) = Scheduler::new(mesi_spec(), t).run();

    assert_eq!(procs[0].stats.loads, 3);
    assert_eq!(procs[0].stats.misses, 3);
    assert_eq!(procs[0].stats.miss_rate(), 1.0);
    assert_eq!(stats.bus_traffic_bytes, 192);
    assert_eq!(stats.private_accesses, 3);
    assert_eq!(stats.public_accesses, 0);
}

#[test]
fn scenario_2_two_readers_share_a_line() {
    let t = traces(vec![
        vec![TraceEntry::Load(Addr(0x100))],
        vec![TraceEntry::Load(Addr(0x100))],
        vec![],
        vec![],
    ]);
    let (stats, _procs) = Scheduler::new(mesi_spec(), t).run();

    assert_eq!(stats.private_accesses, 1);
    assert_eq!(stats.public_accesses, 1);
    assert_eq!(stats.bus_traffic_bytes, 128);
}

#[test]
fn scenario_3_write_invalidate() {
    let t = traces(vec![
        vec![TraceEntry::Load(Addr(0x100))],
        vec![TraceEntry::Store(Addr(0x100))],
        vec![],
        vec![],
    ]);
    let (_stats, procs) = Scheduler::new(mesi_spec(), t).run();
    assert_eq!(procs[1].stats.stores, 1);
    assert_eq!(procs[1].stats.misses, 1);
}

#[test]
fn scenario_4_dragon_update() {
    let spec = SystemSpec::new(Protocol::Dragon, 1024, 2, 64).unwrap();
    let t = traces(vec![
        vec![TraceEntry::Load(Addr(0x200)), TraceEntry::Store(Addr(0x200))],
        vec![TraceEntry::Load(Addr(0x200))],
        vec![],
        vec![],
    ]);
    let (stats, procs) = Scheduler::new(spec, t).run();

    assert_eq!(procs[0].stats.loads, 1);
    assert_eq!(procs[0].stats.stores, 1);
    assert_eq!(procs[1].stats.loads, 1);
    assert!(stats.bus_traffic_bytes >= 4);
}

#[test]
fn scenario_5_lru_eviction_keeps_the_two_most_recent_blocks() {
    let spec = SystemSpec::new(Protocol::Mesi, 128, 2, 64).unwrap();
    let t = traces(vec![
        vec![
            TraceEntry::Load(Addr(0x00)),
            TraceEntry::Load(Addr(0x40)),
            TraceEntry::Load(Addr(0x80)),
        ],
        vec![],
        vec![],
        vec![],
    ]);
    let (_stats, procs) = Scheduler::new(spec, t).run();
    assert_eq!(procs[0].stats.misses, 3);
}

#[test]
fn scenario_6_idle_accounting_for_a_single_cold_store() {
    let t = traces(vec![
        vec![TraceEntry::Store(Addr(0x100))],
        vec![],
        vec![],
        vec![],
    ]);
    let (stats, procs) = Scheduler::new(mesi_spec(), t).run();
    assert_eq!(procs[0].stats.idle_cycles, 100);
    assert_eq!(procs[0].stats.compute_cycles, 0);
    assert!(stats.total_cycles >= 101);
}

#[test]
fn round_trip_counts_match_trace_contents() {
    let entries = vec![
        TraceEntry::Load(Addr(0x00)),
        TraceEntry::Store(Addr(0x40)),
        TraceEntry::Other(3),
        TraceEntry::Load(Addr(0x80)),
        TraceEntry::Store(Addr(0xc0)),
    ];
    let expected_accesses = entries
        .iter()
        .filter(|e| matches!(e, TraceEntry::Load(_) | TraceEntry::Store(_)))
        .count() as u64;
    let t = traces(vec![entries, vec![], vec![], vec![]]);
    let (_stats, procs) = Scheduler::new(mesi_spec(), t).run();
    assert_eq!(procs[0].stats.loads + procs[0].stats.stores, expected_accesses);
}

#[test]
fn bus_traffic_is_monotonic_across_a_growing_trace() {
    let short = traces(vec![vec![TraceEntry::Load(Addr(0x00))], vec![], vec![], vec![]]);
    let long = traces(vec![
        vec![TraceEntry::Load(Addr(0x00)), TraceEntry::Load(Addr(0x40))],
        vec![],
        vec![],
        vec![],
    ]);
    let (short_stats, _) = Scheduler::new(mesi_spec(), short).run();
    let (long_stats, _) = Scheduler::new(mesi_spec(), long).run();
    assert!(long_stats.bus_traffic_bytes >= short_stats.bus_traffic_bytes);
    assert!(long_stats.total_cycles >= short_stats.total_cycles);
}

#[test]
fn two_processors_missing_at_once_serialize_on_the_bus() {
    let t = traces(vec![
        vec![TraceEntry::Load(Addr(0x000))],
        vec![TraceEntry::Load(Addr(0x400))],
        vec![],
        vec![],
    ]);
    let (_stats, procs) = Scheduler::new(mesi_spec(), t).run();
    assert_eq!(procs[0].stats.misses, 1);
    assert_eq!(procs[1].stats.misses, 1);
    assert!(procs[1].stats.idle_cycles > procs[0].stats.idle_cycles);
}

#[test]
fn public_access_count_never_exceeds_total_accesses() {
    let t = traces(vec![
        vec![TraceEntry::Load(Addr(0x300)), TraceEntry::Store(Addr(0x300))],
        vec![TraceEntry::Load(Addr(0x300))],
        vec![],
        vec![],
    ]);
    let (stats, procs) = Scheduler::new(mesi_spec(), t).run();
    let total_accesses: u64 = procs.iter().map(|p| p.stats.loads + p.stats.stores).sum();
    assert!(stats.private_accesses + stats.public_accesses <= total_accesses);
}
