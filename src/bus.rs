//! The shared bus: the single point every cache's coherence traffic passes through.
//!
//! Grounded on the teacher's `Bus`/`BusMsg` plumbing. The teacher's multi-cycle lock-queue state
//! machine (`BusState::{Locked,FreeNext,...}`) is collapsed to a single `owner`/`busy_counter`
//! pair: snoop effects and traffic are still applied synchronously within `post` (the simulator
//! has direct access to every cache, so there's no reason to defer that), but per section 4.6 the
//! bus itself is a singleton resource — while one processor's transaction is inflight, the bus
//! stays locked to it, so `acquire` must be called once per granted transaction and a second
//! processor's request has to wait out `is_busy()` before it may even resolve its own outcome.

use log::debug;

use crate::address::Addr;
use crate::cache::Cache;
use crate::config::Protocol;
use crate::protocol::{self, BusTxn};

#[derive(Debug, Default)]
pub struct Bus {
    traffic_bytes: u64,
    owner: Option<usize>,
    busy_counter: u32,
}

impl Bus {
    pub fn new() -> Self {
        Bus::default()
    }

    pub fn traffic_bytes(&self) -> u64 {
        self.traffic_bytes
    }

    /// Whether the bus is currently locked to an inflight transaction. A processor whose access
    /// would need the bus (a miss, or a store hit that emits a coherence transaction) must not
    /// resolve its outcome while this is true — see `Scheduler::try_access`.
    pub fn is_busy(&self) -> bool {
        self.busy_counter != 0
    }

    /// Grants the bus to `owner` for `cycles`, the same duration as the requester's own cache
    /// busy counter for this access (one cycle for a hit-with-txn, `memory::LATENCY` for a miss)
    /// — the bus is occupied for exactly as long as the access it's serving is outstanding.
    pub fn acquire(&mut self, owner: usize, cycles: u32) {
        assert!(
            !self.is_busy(),
            "bus acquired by processor {owner} while still held by {:?} (ProtocolInvariantViolation)",
            self.owner
        );
        self.owner = Some(owner);
        self.busy_counter = cycles;
    }

    /// Decrements the inflight transaction's remaining duration, releasing the bus once it
    /// reaches zero so the next waiting processor's request can be granted.
    pub fn elapse(&mut self) {
        if self.busy_counter > 0 {
            self.busy_counter -= 1;
            if self.busy_counter == 0 {
                self.owner = None;
            }
        }
    }

    /// The bus's `isBlockPresentInOtherCache` query: does any cache other than `requester` hold
    /// the block at `(set_index, tag)`.
    pub fn others_present(
        &self,
        caches: &[Cache],
        requester: usize,
        set_index: u32,
        tag: u32,
    ) -> bool {
        caches
            .iter()
            .enumerate()
            .any(|(id, cache)| id != requester && cache.has_tag(set_index, tag))
    }

    /// Places `txns` on the bus in order, for a requester accessing `addr`. Every cache other
    /// than `requester` snoops each transaction and mutates its own block accordingly; traffic
    /// is metered once per transaction regardless of how many peers snoop it.
    pub fn post(
        &mut self,
        protocol: Protocol,
        requester: usize,
        addr: Addr,
        set_index: u32,
        tag: u32,
        txns: &[BusTxn],
        caches: &mut [Cache],
        block_size: u32,
    ) {
        for &txn in txns {
            let mut flushed_by = None;
            for (id, cache) in caches.iter_mut().enumerate() {
                if id == requester {
                    continue;
                }
                let state = cache.state(set_index, tag);
                if !state.is_valid() {
                    continue;
                }
                let (next, flush) = protocol::on_snoop(protocol, state, txn);
                cache.set_mut(set_index).set_state(tag, next);
                if flush {
                    flushed_by = Some(id);
                }
            }
            self.traffic_bytes += txn.bytes(block_size);
            debug!(
                "bus: {:?} from processor {} for {:?} ({} bytes){}",
                txn,
                requester,
                addr,
                txn.bytes(block_size),
                match flushed_by {
                    Some(id) => format!(", flushed by processor {id}"),
                    None => String::new(),
                }
            );
        }
    }
}
