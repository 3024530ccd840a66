//! The deterministic per-cycle round-robin scheduler: the thing that actually ties the cache,
//! bus, memory, and protocol modules together into a running simulation.
//!
//! Grounded on the teacher's `simulate()` function, which drove the same four collaborators
//! through a `DelayedQ` message queue. Per DESIGN.md's "Cycle scheduler" resolution, that queue
//! is replaced with the plain for-loop-then-elapse form section 9's Design Notes calls for: no
//! deferred messages — a processor's miss is resolved against every peer cache synchronously,
//! within the same scheduler step that discovered it. The bus itself still locks to one
//! transaction at a time (section 4.6), so a processor whose access needs it may have to wait a
//! few cycles in `Ready` before that same synchronous resolution runs — see `try_access`.

use log::trace;
use std::collections::VecDeque;

use crate::bus::Bus;
use crate::cache::Cache;
use crate::config::SystemSpec;
use crate::memory::Memory;
use crate::processor::{ProcState, Processor, TraceEntry};
use crate::protocol::{self, Access};

/// Aggregate statistics accumulated over the whole run — section 3's `SimulationStatistics`.
#[derive(Debug, Default, Clone)]
pub struct SimulationStats {
    pub total_cycles: u64,
    pub bus_traffic_bytes: u64,
    pub private_accesses: u64,
    pub public_accesses: u64,
}

pub struct Scheduler {
    spec: SystemSpec,
    processors: Vec<Processor>,
    caches: Vec<Cache>,
    bus: Bus,
    memory: Memory,
    cycle: u64,
    private_accesses: u64,
    public_accesses: u64,
}

impl Scheduler {
    pub fn new(spec: SystemSpec, traces: Vec<VecDeque<TraceEntry>>) -> Self {
        let caches = (0..traces.len()).map(|_| Cache::new(&spec)).collect();
        let processors = traces
            .into_iter()
            .enumerate()
            .map(|(id, trace)| Processor::new(id, trace))
            .collect();
        Scheduler {
            spec,
            processors,
            caches,
            bus: Bus::new(),
            memory: Memory::new(),
            cycle: 0,
            private_accesses: 0,
            public_accesses: 0,
        }
    }

    /// Runs the simulation to completion and returns the final statistics plus a reference to
    /// each processor's own counters (section 6's per-processor report fields).
    pub fn run(mut self) -> (SimulationStats, Vec<Processor>) {
        while !self.is_finished() {
            self.tick();
        }
        let stats = SimulationStats {
            total_cycles: self.cycle,
            bus_traffic_bytes: self.bus.traffic_bytes(),
            private_accesses: self.private_accesses,
            public_accesses: self.public_accesses,
        };
        (stats, self.processors)
    }

    fn is_finished(&self) -> bool {
        self.processors.iter().all(|p| p.is_finished())
            && !self.memory.is_busy()
            && !self.bus.is_busy()
            && self.caches.iter().all(|c| !c.is_busy())
    }

    /// One full scheduler cycle: step every processor in priority order, then elapse every
    /// timing entity uniformly. Section 4.8's three numbered steps, collapsed into steps 1-2;
    /// step 3 (the cycle counter) is just `self.cycle += 1` at the end.
    fn tick(&mut self) {
        for id in 0..self.processors.len() {
            self.step_processor(id);
        }
        for cache in &mut self.caches {
            cache.elapse();
        }
        self.bus.elapse();
        self.memory.elapse();
        self.cycle += 1;
        trace!("cycle {} complete", self.cycle);
    }

    fn step_processor(&mut self, id: usize) {
        match self.processors[id].state {
            ProcState::Ready => self.dispatch(id),
            ProcState::Computing(remaining) => {
                self.processors[id].stats.compute_cycles += 1;
                let remaining = remaining - 1;
                self.processors[id].state = if remaining == 0 {
                    ProcState::Ready
                } else {
                    ProcState::Computing(remaining)
                };
            }
            ProcState::WaitingForCache => {
                self.processors[id].stats.idle_cycles += 1;
                if !self.caches[id].is_busy() {
                    self.caches[id].commit();
                    self.processors[id].state = ProcState::Ready;
                }
            }
        }
    }

    /// A `Ready` processor looks at its next trace entry, if any, without consuming it yet. A
    /// compute-only entry always dispatches immediately. A load or store only dispatches once any
    /// bus access it would need is actually available — see `try_access`.
    fn dispatch(&mut self, id: usize) {
        let Some(entry) = self.processors[id].peek_entry() else {
            return;
        };
        match entry {
            TraceEntry::Other(n) => {
                self.processors[id].next_entry();
                self.processors[id].state = ProcState::Computing(n);
            }
            TraceEntry::Load(addr) => self.try_access(id, addr, false),
            TraceEntry::Store(addr) => self.try_access(id, addr, true),
        }
    }

    /// Resolves the next load/store for `id`, or — per section 4.6, the bus is a singleton and a
    /// transaction inflight for another processor blocks every other requester — stalls this
    /// processor for the cycle if the access would need the bus and the bus is still held by
    /// someone else's outstanding transaction. A stall leaves the trace entry unconsumed and
    /// credits an idle cycle, exactly as the eventual wait for its own cache would.
    fn try_access(&mut self, id: usize, addr: crate::address::Addr, is_write: bool) {
        let (tag, set_index) = self.caches[id].decode(addr);
        let hit = self.caches[id].has_tag(set_index, tag);

        if hit {
            let needs_bus = is_write && {
                let state = self.caches[id].state(set_index, tag);
                let others_present = self.bus.others_present(&self.caches, id, set_index, tag);
                protocol::on_store_hit(self.spec.protocol, state, others_present)
                    .txn
                    .is_some()
            };
            if needs_bus && self.bus.is_busy() {
                self.processors[id].stats.idle_cycles += 1;
                return;
            }
            self.processors[id].next_entry();
            self.resolve_hit(id, addr, tag, set_index, is_write);
        } else {
            // Every miss needs the bus: there's no way to fetch or invalidate a block without it.
            if self.bus.is_busy() {
                self.processors[id].stats.idle_cycles += 1;
                return;
            }
            self.processors[id].next_entry();
            self.resolve_miss(id, addr, tag, set_index, is_write);
        }
    }

    fn resolve_hit(
        &mut self,
        id: usize,
        addr: crate::address::Addr,
        tag: u32,
        set_index: u32,
        is_write: bool,
    ) {
        {
            let stats = &mut self.processors[id].stats;
            if is_write {
                stats.stores += 1;
            } else {
                stats.loads += 1;
            }
        }

        if is_write {
            let state = self.caches[id].state(set_index, tag);
            let others_present = self.bus.others_present(&self.caches, id, set_index, tag);
            let outcome = protocol::on_store_hit(self.spec.protocol, state, others_present);
            self.caches[id]
                .set_mut(set_index)
                .set_state(tag, outcome.next_state);
            match outcome.access {
                Access::Private => self.private_accesses += 1,
                Access::Public => self.public_accesses += 1,
            }
            if let Some(txn) = outcome.txn {
                self.bus.post(
                    self.spec.protocol,
                    id,
                    addr,
                    set_index,
                    tag,
                    &[txn],
                    &mut self.caches,
                    self.spec.block_size,
                );
                self.bus.acquire(id, 1);
            }
        }

        self.caches[id].begin_access(set_index, tag, 1);
        self.processors[id].state = ProcState::WaitingForCache;
    }

    fn resolve_miss(
        &mut self,
        id: usize,
        addr: crate::address::Addr,
        tag: u32,
        set_index: u32,
        is_write: bool,
    ) {
        {
            let stats = &mut self.processors[id].stats;
            if is_write {
                stats.stores += 1;
            } else {
                stats.loads += 1;
            }
            stats.misses += 1;
        }

        let others_present = self.bus.others_present(&self.caches, id, set_index, tag);
        let outcome = protocol::on_miss(self.spec.protocol, is_write, others_present);

        self.bus.post(
            self.spec.protocol,
            id,
            addr,
            set_index,
            tag,
            &outcome.txns,
            &mut self.caches,
            self.spec.block_size,
        );
        self.bus.acquire(id, crate::memory::LATENCY);
        if outcome.needs_memory {
            self.memory.issue();
        }
        self.caches[id].allocate(set_index, tag, outcome.next_state);

        match outcome.access {
            Access::Private => self.private_accesses += 1,
            Access::Public => self.public_accesses += 1,
        }

        self.caches[id].begin_access(set_index, tag, crate::memory::LATENCY);
        self.processors[id].state = ProcState::WaitingForCache;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Addr;
    use crate::config::Protocol;

    fn spec() -> SystemSpec {
        SystemSpec::new(Protocol::Mesi, 1024, 2, 64).unwrap()
    }

    fn traces(entries: Vec<Vec<TraceEntry>>) -> Vec<VecDeque<TraceEntry>> {
        entries.into_iter().map(VecDeque::from).collect()
    }

    #[test]
    fn single_processor_private_working_set_is_all_misses() {
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
        let scheduler = Scheduler::new(spec(), t);
        let (stats, procs) = scheduler.run();

        assert_eq!(procs[0].stats.loads, 3);
        assert_eq!(procs[0].stats.misses, 3);
        assert_eq!(stats.private_accesses, 3);
        assert_eq!(stats.public_accesses, 0);
        assert_eq!(stats.bus_traffic_bytes, 3 * 64);
    }

    #[test]
    fn two_readers_share_a_line() {
        let t = traces(vec![
            vec![TraceEntry::Load(Addr(0x100))],
            vec![TraceEntry::Load(Addr(0x100))],
            vec![],
            vec![],
        ]);
        let scheduler = Scheduler::new(spec(), t);
        let (stats, procs) = scheduler.run();

        assert_eq!(stats.private_accesses, 1);
        assert_eq!(stats.public_accesses, 1);
        assert_eq!(stats.bus_traffic_bytes, 2 * 64);
        assert_eq!(procs[0].stats.misses, 1);
        assert_eq!(procs[1].stats.misses, 1);
    }

    #[test]
    fn write_invalidates_the_sharer() {
        let t = traces(vec![
            vec![TraceEntry::Load(Addr(0x100))],
            vec![TraceEntry::Store(Addr(0x100))],
            vec![],
            vec![],
        ]);
        let scheduler = Scheduler::new(spec(), t);
        let (_, procs) = scheduler.run();
        assert_eq!(procs[1].stats.misses, 1);
    }

    #[test]
    fn idle_accounting_matches_a_single_cold_store() {
        let t = traces(vec![
            vec![TraceEntry::Store(Addr(0x100))],
            vec![],
            vec![],
            vec![],
        ]);
        let scheduler = Scheduler::new(spec(), t);
        let (stats, procs) = scheduler.run();
        assert_eq!(procs[0].stats.idle_cycles, 100);
        assert_eq!(procs[0].stats.compute_cycles, 0);
        assert!(stats.total_cycles >= 101);
    }

    #[test]
    fn lru_eviction_keeps_the_two_most_recent_blocks() {
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
        let scheduler = Scheduler::new(spec, t);
        let (_, procs) = scheduler.run();
        assert_eq!(procs[0].stats.misses, 3);
    }

    #[test]
    fn round_trip_load_store_counts_match_trace_length() {
        let t = traces(vec![
            vec![
                TraceEntry::Load(Addr(0x00)),
                TraceEntry::Store(Addr(0x40)),
                TraceEntry::Other(5),
                TraceEntry::Load(Addr(0x80)),
            ],
            vec![],
            vec![],
            vec![],
        ]);
        let scheduler = Scheduler::new(spec(), t);
        let (_, procs) = scheduler.run();
        assert_eq!(procs[0].stats.loads + procs[0].stats.stores, 3);
    }

    #[test]
    fn concurrent_misses_serialize_on_the_bus() {
        // P0 misses on cycle 0 and holds the bus for the full 100-cycle latency. P1's miss, one
        // cycle later in program order but dispatched the same scheduler cycle, can't resolve
        // until P0 releases the bus — so P1 accumulates idle cycles waiting for it, on top of the
        // 100 cycles its own eventual miss costs once it gets to run.
        let t = traces(vec![
            vec![TraceEntry::Load(Addr(0x000))],
            vec![TraceEntry::Load(Addr(0x100))],
            vec![],
            vec![],
        ]);
        let scheduler = Scheduler::new(spec(), t);
        let (_, procs) = scheduler.run();
        assert_eq!(procs[0].stats.misses, 1);
        assert_eq!(procs[1].stats.misses, 1);
        assert!(
            procs[1].stats.idle_cycles > procs[0].stats.idle_cycles,
            "P1 should pay extra idle cycles waiting out P0's hold on the bus: P0={}, P1={}",
            procs[0].stats.idle_cycles,
            procs[1].stats.idle_cycles
        );
    }

    #[test]
    fn store_hit_that_upgrades_a_shared_line_counts_as_a_public_access() {
        let t = traces(vec![
            vec![TraceEntry::Load(Addr(0x100)), TraceEntry::Store(Addr(0x100))],
            vec![TraceEntry::Load(Addr(0x100))],
            vec![],
            vec![],
        ]);
        let scheduler = Scheduler::new(spec(), t);
        let (stats, procs) = scheduler.run();
        assert_eq!(procs[0].stats.stores, 1);
        // Two misses (P0's and P1's cold loads) plus P0's store-hit upgrade of the now-shared
        // line: three classified accesses in total, not the two a miss-only count would give.
        assert_eq!(stats.private_accesses + stats.public_accesses, 3);
        assert!(stats.public_accesses >= 2);
    }

    #[test]
    fn dragon_update_sequence_ends_shared_modified_and_shared_clean() {
        let spec = SystemSpec::new(Protocol::Dragon, 1024, 2, 64).unwrap();
        let t = traces(vec![
            vec![TraceEntry::Load(Addr(0x200)), TraceEntry::Store(Addr(0x200))],
            vec![TraceEntry::Load(Addr(0x200))],
            vec![],
            vec![],
        ]);
        let scheduler = Scheduler::new(spec, t);
        let (stats, procs) = scheduler.run();
        assert_eq!(procs[0].stats.misses, 1);
        assert_eq!(procs[1].stats.misses, 1);
        assert!(stats.bus_traffic_bytes >= 4);
    }
}
