//! System geometry: protocol choice and cache dimensions shared by all four processors.

use crate::error::SimError;

/// Coherence protocol in effect for the whole run. Unlike the teacher's `commons.rs::Protocol`,
/// this carries no behavior of its own — every transition lives in `protocol.rs`'s free
/// functions, which take a `Protocol` as plain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Mesi,
    Dragon,
}

impl std::str::FromStr for Protocol {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MESI" => Ok(Protocol::Mesi),
            "DRAGON" => Ok(Protocol::Dragon),
            other => Err(SimError::Config(format!(
                "unknown protocol '{other}', expected MESI or Dragon"
            ))),
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Mesi => write!(f, "MESI"),
            Protocol::Dragon => write!(f, "Dragon"),
        }
    }
}

/// The geometry shared by every processor's cache: total capacity, associativity, and block
/// size. Grounded on `commons.rs::SystemSpec`, minus the fields (`word_size`, `address_size`,
/// `bus_word_tf_lat`) that only existed to derive the teacher's separate cache-to-cache latency
/// constant — folded away per the single-latency resolution in DESIGN.md.
#[derive(Debug, Clone, Copy)]
pub struct SystemSpec {
    pub protocol: Protocol,
    pub cache_size: u32,
    pub associativity: u32,
    pub block_size: u32,
}

impl SystemSpec {
    pub fn new(
        protocol: Protocol,
        cache_size: u32,
        associativity: u32,
        block_size: u32,
    ) -> Result<Self, SimError> {
        if cache_size == 0 || associativity == 0 || block_size == 0 {
            return Err(SimError::Config(
                "cache size, associativity, and block size must all be positive".into(),
            ));
        }
        if !cache_size.is_power_of_two() {
            return Err(SimError::Config(format!(
                "cache size {cache_size} must be a power of two"
            )));
        }
        if !block_size.is_power_of_two() {
            return Err(SimError::Config("block size must be a power of two".into()));
        }
        if block_size < 4 {
            return Err(SimError::Config(format!(
                "block size {block_size} must be at least 4 bytes"
            )));
        }
        let sets_times_assoc = cache_size / (associativity * block_size);
        if cache_size % (associativity * block_size) != 0 || !sets_times_assoc.is_power_of_two() {
            return Err(SimError::Config(format!(
                "cache size {cache_size} is not evenly divisible into a power-of-two number of \
                 sets of associativity {associativity} and block size {block_size}"
            )));
        }
        Ok(SystemSpec {
            protocol,
            cache_size,
            associativity,
            block_size,
        })
    }

    pub fn num_sets(&self) -> u32 {
        self.cache_size / (self.associativity * self.block_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_power_of_two_geometry() {
        assert!(SystemSpec::new(Protocol::Mesi, 4096, 3, 32).is_err());
    }

    #[test]
    fn accepts_the_spec_default_geometry() {
        let spec = SystemSpec::new(Protocol::Mesi, 4096, 2, 32).unwrap();
        assert_eq!(spec.num_sets(), 64);
    }

    #[test]
    fn rejects_a_cache_size_that_isnt_a_power_of_two_even_if_sets_would_be() {
        // 48 / (3 * 4) == 4 sets, a power of two — but 48 itself isn't, and numSets coming out
        // right is not a substitute for the cache_size domain constraint itself.
        assert!(SystemSpec::new(Protocol::Mesi, 48, 3, 4).is_err());
    }

    #[test]
    fn rejects_a_block_size_below_four_bytes() {
        assert!(SystemSpec::new(Protocol::Mesi, 64, 2, 2).is_err());
    }
}
