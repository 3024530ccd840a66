//! Address decoding: splitting a byte address into tag / set index / block offset.

/// A byte address in the simulated address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Addr(pub u32);

/// Derives (tag, set index, offset) from a cache's geometry.
///
/// Grounded on `commons.rs::Addr::pos`, which did the same split against a flat `SystemSpec`;
/// here it's its own component per the component list, since several caches with different
/// geometries can coexist in one run (the spec only requires the four processors share one
/// geometry, but nothing stops the decoder itself from being per-cache).
#[derive(Debug, Clone, Copy)]
pub struct AddressDecoder {
    offset_bits: u32,
    index_bits: u32,
    num_sets: u32,
}

impl AddressDecoder {
    pub fn new(cache_size: u32, associativity: u32, block_size: u32) -> Self {
        assert!(block_size.is_power_of_two(), "block size must be a power of two");
        let num_sets = cache_size / (associativity * block_size);
        assert!(num_sets.is_power_of_two(), "number of sets must be a power of two");
        AddressDecoder {
            offset_bits: block_size.trailing_zeros(),
            index_bits: num_sets.trailing_zeros(),
            num_sets,
        }
    }

    pub fn num_sets(&self) -> u32 {
        self.num_sets
    }

    /// Returns `(tag, set_index)`. The block offset itself is never consulted elsewhere in the
    /// simulator — blocks are tracked and transferred whole — so it's not returned.
    pub fn decode(&self, addr: Addr) -> (u32, u32) {
        let a = addr.0 >> self.offset_bits;
        let set_index = a & (self.num_sets - 1);
        let tag = a >> self.index_bits;
        (tag, set_index)
    }
}
