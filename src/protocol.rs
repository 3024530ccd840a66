//! Pure MESI/Dragon transition functions.
//!
//! Nothing here touches a `Cache`, `Bus`, or `Memory` directly — every function takes the
//! information it needs (current state, whether a peer holds the block) and returns the outcome
//! as data. `bus.rs` is the only caller, and it's the one that turns the outcome into mutations
//! and traffic counters. Keeping the transition logic pure is what lets it be unit-tested without
//! standing up a whole simulation.

use crate::block::BlockState;
use crate::config::Protocol;

/// A bus transaction a cache may place on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusTxn {
    BusRd,
    BusRdX,
    BusUpgrade,
    BusUpdate,
}

impl BusTxn {
    /// Bytes of traffic this transaction contributes, independent of how many caches snoop it.
    pub fn bytes(self, block_size: u32) -> u64 {
        match self {
            BusTxn::BusRd | BusTxn::BusRdX => block_size as u64,
            BusTxn::BusUpgrade => 0,
            BusTxn::BusUpdate => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Private,
    Public,
}

impl Access {
    pub fn classify(others_present: bool) -> Access {
        if others_present {
            Access::Public
        } else {
            Access::Private
        }
    }
}

/// Outcome of resolving a request against a block that was `Invalid` in the requester's cache.
#[derive(Debug, Clone)]
pub struct MissOutcome {
    pub next_state: BlockState,
    /// Transactions placed on the bus, in the order they must be snooped. Usually one; Dragon's
    /// write-allocate-with-sharers case emits a `BusRd` fetch followed by a `BusUpdate`.
    pub txns: Vec<BusTxn>,
    pub access: Access,
    /// Whether this transaction needs an actual memory access (no valid peer to supply the
    /// block) as opposed to a cache-to-cache-only transfer.
    pub needs_memory: bool,
}

/// Outcome of a store that hit a non-`Invalid` block.
#[derive(Debug, Clone, Copy)]
pub struct HitStoreOutcome {
    pub next_state: BlockState,
    pub txn: Option<BusTxn>,
    /// Per section 4.5's transition signature, every resolved access is classified private or
    /// public, not just misses — a store hit that upgrades a shared line is just as much a
    /// visible-to-peers access as the miss that first brought the block in.
    pub access: Access,
}

/// Resolves a load or store against a block this cache does not currently hold.
///
/// `others_present` must reflect whether any *other* cache holds the block (in any valid state)
/// at the moment of the access.
pub fn on_miss(protocol: Protocol, is_write: bool, others_present: bool) -> MissOutcome {
    let access = Access::classify(others_present);
    match protocol {
        Protocol::Mesi => {
            if is_write {
                MissOutcome {
                    next_state: BlockState::Modified,
                    txns: vec![BusTxn::BusRdX],
                    access,
                    needs_memory: true,
                }
            } else if others_present {
                MissOutcome {
                    next_state: BlockState::Shared,
                    txns: vec![BusTxn::BusRd],
                    access,
                    needs_memory: false,
                }
            } else {
                MissOutcome {
                    next_state: BlockState::Exclusive,
                    txns: vec![BusTxn::BusRd],
                    access,
                    needs_memory: true,
                }
            }
        }
        Protocol::Dragon => {
            if is_write {
                if others_present {
                    MissOutcome {
                        next_state: BlockState::SharedModified,
                        txns: vec![BusTxn::BusRd, BusTxn::BusUpdate],
                        access,
                        needs_memory: false,
                    }
                } else {
                    MissOutcome {
                        next_state: BlockState::Modified,
                        txns: vec![BusTxn::BusRd],
                        access,
                        needs_memory: true,
                    }
                }
            } else if others_present {
                MissOutcome {
                    next_state: BlockState::SharedClean,
                    txns: vec![BusTxn::BusRd],
                    access,
                    needs_memory: false,
                }
            } else {
                MissOutcome {
                    next_state: BlockState::Exclusive,
                    txns: vec![BusTxn::BusRd],
                    access,
                    needs_memory: true,
                }
            }
        }
    }
}

/// Resolves a store that hit an already-resident, non-`Invalid` block. Never called for loads —
/// a load hit never changes state or touches the bus, under either protocol.
pub fn on_store_hit(protocol: Protocol, state: BlockState, others_present: bool) -> HitStoreOutcome {
    let access = Access::classify(others_present);
    match protocol {
        Protocol::Mesi => match state {
            BlockState::Shared => HitStoreOutcome {
                next_state: BlockState::Modified,
                txn: Some(BusTxn::BusUpgrade),
                access,
            },
            BlockState::Exclusive | BlockState::Modified => HitStoreOutcome {
                next_state: BlockState::Modified,
                txn: None,
                access,
            },
            BlockState::Invalid | BlockState::SharedClean | BlockState::SharedModified => {
                unreachable!("MESI cache holding a Dragon-only or Invalid state")
            }
        },
        Protocol::Dragon => match state {
            BlockState::SharedClean | BlockState::SharedModified => HitStoreOutcome {
                next_state: if others_present {
                    BlockState::SharedModified
                } else {
                    BlockState::Modified
                },
                txn: Some(BusTxn::BusUpdate),
                access,
            },
            BlockState::Exclusive | BlockState::Modified => HitStoreOutcome {
                next_state: BlockState::Modified,
                txn: None,
                access,
            },
            BlockState::Invalid | BlockState::Shared => {
                unreachable!("Dragon cache holding a MESI-only or Invalid state")
            }
        },
    }
}

/// Resolves how a block held by a *snooping* (non-requesting) cache reacts to a transaction
/// placed on the bus by another cache. Returns the snooper's next state and whether it must
/// flush its data (for traffic/logging purposes only — see DESIGN.md §9a on why a flush doesn't
/// add its own traffic on top of the requester's transfer).
pub fn on_snoop(protocol: Protocol, state: BlockState, txn: BusTxn) -> (BlockState, bool) {
    if !state.is_valid() {
        return (state, false);
    }
    match protocol {
        Protocol::Mesi => match txn {
            BusTxn::BusRd => match state {
                BlockState::Modified => (BlockState::Shared, true),
                BlockState::Exclusive | BlockState::Shared => (BlockState::Shared, false),
                _ => (state, false),
            },
            BusTxn::BusRdX | BusTxn::BusUpgrade => {
                let flush = state == BlockState::Modified;
                (BlockState::Invalid, flush)
            }
            BusTxn::BusUpdate => (state, false),
        },
        Protocol::Dragon => match txn {
            BusTxn::BusRd => match state {
                BlockState::Modified => (BlockState::SharedModified, true),
                BlockState::SharedModified => (BlockState::SharedModified, true),
                BlockState::Exclusive => (BlockState::SharedClean, false),
                BlockState::SharedClean => (BlockState::SharedClean, false),
                _ => (state, false),
            },
            BusTxn::BusUpdate => match state {
                // One-writer invariant: another cache just claimed the writer role for this
                // block, so any existing SharedModified holder demotes to SharedClean.
                BlockState::SharedModified => (BlockState::SharedClean, false),
                _ => (state, false),
            },
            BusTxn::BusRdX | BusTxn::BusUpgrade => (state, false),
        },
    }
}
