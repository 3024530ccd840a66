//! A single cache set: an associativity-capped bag of blocks with LRU eviction.

use crate::block::{BlockState, CacheBlock};

/// Holds at most `associativity` blocks. No tag appears twice among non-`Invalid` entries —
/// that invariant is maintained by construction, since a block is only ever inserted through
/// `allocate`, which the caller is required to precede with a check that the tag isn't already
/// resident.
#[derive(Debug, Clone)]
pub struct CacheSet {
    associativity: usize,
    blocks: Vec<CacheBlock>,
    clock: u64,
}

impl CacheSet {
    pub fn new(associativity: usize) -> Self {
        CacheSet {
            associativity,
            blocks: Vec::with_capacity(associativity),
            clock: 0,
        }
    }

    fn position(&self, tag: u32) -> Option<usize> {
        self.blocks.iter().position(|b| b.tag == tag)
    }

    pub fn has_tag(&self, tag: u32) -> bool {
        self.position(tag).is_some()
    }

    pub fn state(&self, tag: u32) -> BlockState {
        self.position(tag)
            .map(|i| self.blocks[i].state)
            .unwrap_or(BlockState::Invalid)
    }

    pub fn set_state(&mut self, tag: u32, state: BlockState) {
        match (self.position(tag), state) {
            (Some(i), BlockState::Invalid) => {
                self.blocks.remove(i);
            }
            (Some(i), s) => self.blocks[i].state = s,
            (None, BlockState::Invalid) => {}
            (None, _) => panic!("set_state on a tag not resident in the set"),
        }
    }

    /// Bumps the LRU ordinal for `tag` without touching its state. A no-op if `tag` isn't
    /// resident (harmless: callers touch after confirming residency).
    pub fn touch(&mut self, tag: u32) {
        self.clock += 1;
        if let Some(i) = self.position(tag) {
            self.blocks[i].last_used = self.clock;
        }
    }

    pub fn is_full(&self) -> bool {
        self.blocks.len() >= self.associativity
    }

    /// Removes and returns the state of the least-recently-used block. Only valid to call when
    /// `is_full()`; callers that allocate always check capacity first.
    pub fn evict_lru(&mut self) -> BlockState {
        let victim = self
            .blocks
            .iter()
            .enumerate()
            .min_by_key(|(_, b)| b.last_used)
            .map(|(i, _)| i)
            .expect("evict_lru called on an empty set");
        self.blocks.remove(victim).state
    }

    /// Inserts a new resident block with the given tag and state, at the front of recency.
    /// Panics if the set is already full — callers must evict first.
    pub fn allocate(&mut self, tag: u32, state: BlockState) {
        assert!(!self.is_full(), "allocate called on a full set");
        assert!(!self.has_tag(tag), "allocate called with an already-resident tag");
        self.clock += 1;
        self.blocks.push(CacheBlock {
            tag,
            state,
            last_used: self.clock,
        });
    }
}
