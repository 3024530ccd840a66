//! Per-block coherence state shared by both protocols.

/// Coherence state of a single cache block.
///
/// `Shared` only occurs under MESI; `SharedClean`/`SharedModified` only under Dragon. Keeping
/// them in one enum (rather than a protocol-generic parameter) matches how the rest of the crate
/// treats `Protocol` as data, not as a type-level choice — `protocol::on_*` simply never produces
/// the variants that don't belong to the active protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockState {
    Invalid,
    Shared,
    SharedClean,
    SharedModified,
    Exclusive,
    Modified,
}

impl BlockState {
    pub fn is_valid(self) -> bool {
        !matches!(self, BlockState::Invalid)
    }

    /// Would a cache in this state need to write its data back on eviction or invalidation.
    pub fn is_dirty(self) -> bool {
        matches!(self, BlockState::Modified | BlockState::SharedModified)
    }
}

/// A resident line: which address it holds, its coherence state, and the LRU ordinal used by
/// `CacheSet` to pick an eviction victim.
#[derive(Debug, Clone, Copy)]
pub struct CacheBlock {
    pub tag: u32,
    pub state: BlockState,
    pub last_used: u64,
}
