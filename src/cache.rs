//! Per-processor private cache: associative sets, the issue/commit two-phase access model,
//! bus-facing snoop queries and mutations, and its own busy counter.
//!
//! By the time `begin_access` is called, the caller (the scheduler, acting as the bus's
//! coordination point) has already resolved the coherence outcome against every other cache —
//! this module only ever mutates *its own* sets, never peers'. Peer mutation goes through the
//! same `set`/`set_mut`/`allocate` surface, just invoked by `Bus::post` on a different `Cache`.

use log::debug;

use crate::address::{Addr, AddressDecoder};
use crate::block::BlockState;
use crate::config::SystemSpec;
use crate::set::CacheSet;

/// Which block to refresh at commit, recorded at issue time. A fresh allocation already carries
/// maximum recency (see `set.rs::allocate`), so this really only matters for a hit — but commit
/// touches it unconditionally, which is harmless for the miss case.
#[derive(Debug, Clone, Copy)]
struct PendingAccess {
    tag: u32,
    set_index: u32,
}

#[derive(Debug)]
pub struct Cache {
    decoder: AddressDecoder,
    sets: Vec<CacheSet>,
    busy_counter: u32,
    pending: Option<PendingAccess>,
}

impl Cache {
    pub fn new(spec: &SystemSpec) -> Self {
        let decoder = AddressDecoder::new(spec.cache_size, spec.associativity, spec.block_size);
        let sets = (0..decoder.num_sets())
            .map(|_| CacheSet::new(spec.associativity as usize))
            .collect();
        Cache {
            decoder,
            sets,
            busy_counter: 0,
            pending: None,
        }
    }

    pub fn decode(&self, addr: Addr) -> (u32, u32) {
        self.decoder.decode(addr)
    }

    pub fn set(&self, set_index: u32) -> &CacheSet {
        &self.sets[set_index as usize]
    }

    pub fn set_mut(&mut self, set_index: u32) -> &mut CacheSet {
        &mut self.sets[set_index as usize]
    }

    pub fn has_tag(&self, set_index: u32, tag: u32) -> bool {
        self.sets[set_index as usize].has_tag(tag)
    }

    pub fn state(&self, set_index: u32, tag: u32) -> BlockState {
        self.sets[set_index as usize].state(tag)
    }

    /// Installs a freshly resolved block, evicting the LRU victim first if the set is full.
    /// Returns the evicted state, if an eviction occurred — a writeback of dirty evicted data is
    /// not separately metered as bus traffic; section 4.5 enumerates exactly four coherence
    /// transactions and an LRU eviction isn't one of them.
    pub fn allocate(&mut self, set_index: u32, tag: u32, state: BlockState) -> Option<BlockState> {
        let set = self.set_mut(set_index);
        let evicted = if set.is_full() {
            Some(set.evict_lru())
        } else {
            None
        };
        if let Some(evicted_state) = evicted {
            if evicted_state.is_dirty() {
                debug!(
                    "set {set_index}: LRU-evicting a dirty block ({evicted_state:?}) to make room for tag {tag}"
                );
            }
        }
        set.allocate(tag, state);
        evicted
    }

    /// Starts the busy countdown for an access whose coherence outcome has already been applied
    /// (own state installed, peers snooped, traffic accounted). `busy_cycles` is 1 for a hit, or
    /// the memory/bus transfer latency for a miss — see `memory::LATENCY`.
    pub fn begin_access(&mut self, set_index: u32, tag: u32, busy_cycles: u32) {
        assert!(
            self.busy_counter == 0,
            "begin_access called while the cache is still busy (ProtocolInvariantViolation)"
        );
        self.busy_counter = busy_cycles;
        self.pending = Some(PendingAccess { tag, set_index });
    }

    pub fn is_busy(&self) -> bool {
        self.busy_counter != 0
    }

    /// Completes the in-flight access once its busy countdown has reached zero: refreshes the
    /// accessed block's LRU recency. Calling this while still busy, or with no pending access,
    /// is a `ProtocolInvariantViolation` per section 7 — both are programming errors in the
    /// scheduler, not user-facing failures, so they panic rather than return a `Result`.
    pub fn commit(&mut self) {
        assert!(
            self.busy_counter == 0,
            "commit called on a cache that is still busy (ProtocolInvariantViolation)"
        );
        let pending = self
            .pending
            .take()
            .expect("commit called with no pending access (ProtocolInvariantViolation)");
        self.sets[pending.set_index as usize].touch(pending.tag);
    }

    pub fn elapse(&mut self) {
        self.busy_counter = self.busy_counter.saturating_sub(1);
    }
}
