//! Minimal perfect hash over the distinct expansion lengths of the shape grammar.
//!
//! BBHash-style construction: each level hashes the keys still unplaced into
//! `gamma * remaining` slots and keeps the slots hit exactly once. The kept slots of
//! all levels are concatenated into one [`BitVector`], and the dense id of a key is
//! the rank of its slot. Keys left over after `max_levels` levels go to a sorted
//! fallback array numbered after the last slot.
//!
//! Only keys presented at construction time have a defined result. Hashing any
//! other key returns an arbitrary id in range.

use crate::bitvec::{BitVecBuilder, BitVector};
use crate::error::{Error, Result};
use crate::persist::{self, Persist};
use std::io::{Read, Write};

const LEVEL_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Construction parameters of the length hash.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashConfig {
    /// Slots per remaining key on each level (`>= 1.0`). Larger is faster to build
    /// and to query, smaller is more compact.
    pub gamma: f64,
    /// Base seed; the same seed and key set always yield the same function.
    pub seed: u64,
    /// Levels tried before the leftover keys go to the fallback array.
    pub max_levels: usize,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            gamma: 2.0,
            seed: 0x5EED_0F_5A_9E0F_1E,
            max_levels: 32,
        }
    }
}

impl HashConfig {
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }
}

/// Maps each registered length to a distinct id in `[0, len())`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LengthHash {
    seed: u64,
    level_sizes: Vec<u64>,
    slots: BitVector,
    fallback: Vec<u64>,
    len: usize,
}

#[inline]
fn mix(key: u64, seed: u64) -> u64 {
    let mut z = key ^ seed;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
fn slot(key: u64, seed: u64, level: usize, size: u64) -> usize {
    let level_seed = seed.wrapping_add((level as u64 + 1).wrapping_mul(LEVEL_SALT));
    ((u128::from(mix(key, level_seed)) * u128::from(size)) >> 64) as usize
}

impl LengthHash {
    /// Builds the function over `keys`, which must be distinct.
    pub(crate) fn build(keys: &[u64], config: &HashConfig) -> Self {
        debug_assert!(
            {
                let mut sorted = keys.to_vec();
                sorted.sort_unstable();
                sorted.windows(2).all(|w| w[0] != w[1])
            },
            "LengthHash::build requires distinct keys"
        );
        let gamma = config.gamma.max(1.0);
        let mut remaining = keys.to_vec();
        let mut level_sizes = Vec::new();
        let mut slots = BitVecBuilder::new();

        for level in 0..config.max_levels {
            if remaining.is_empty() {
                break;
            }
            let size = ((remaining.len() as f64 * gamma).ceil() as u64).max(1);
            let mut hits = vec![0u8; size as usize];
            for &key in &remaining {
                let h = slot(key, config.seed, level, size);
                hits[h] = hits[h].saturating_add(1);
            }
            remaining.retain(|&key| hits[slot(key, config.seed, level, size)] != 1);
            for &count in &hits {
                slots.push(count == 1);
            }
            level_sizes.push(size);
        }

        remaining.sort_unstable();
        Self {
            seed: config.seed,
            level_sizes,
            slots: slots.build(),
            fallback: remaining,
            len: keys.len(),
        }
    }

    /// Number of registered keys.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn num_levels(&self) -> usize {
        self.level_sizes.len()
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.slots.heap_bytes() + (self.level_sizes.len() + self.fallback.len()) * 8
    }

    /// Dense id of a registered key.
    #[inline]
    pub(crate) fn get(&self, key: u64) -> usize {
        let mut offset = 0usize;
        for (level, &size) in self.level_sizes.iter().enumerate() {
            let pos = offset + slot(key, self.seed, level, size);
            if self.slots.get(pos) {
                return self.slots.rank1(pos);
            }
            offset += size as usize;
        }
        let idx = self.fallback.binary_search(&key).unwrap_or_else(|i| i);
        self.slots.count_ones() + idx
    }
}

impl Persist for LengthHash {
    fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        persist::write_u64(w, self.len as u64)?;
        persist::write_u64(w, self.seed)?;
        persist::write_words(w, &self.level_sizes)?;
        self.slots.write_to(w)?;
        persist::write_words(w, &self.fallback)
    }

    fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let len = persist::read_usize(r)?;
        let seed = persist::read_u64(r)?;
        let level_sizes = persist::read_words(r)?;
        let slots = BitVector::read_from(r)?;
        let fallback = persist::read_words(r)?;

        let total: u64 = level_sizes.iter().sum();
        if total != slots.len() as u64 || slots.count_ones() + fallback.len() != len {
            return Err(Error::InvalidEncoding(format!(
                "length hash over {len} keys has inconsistent levels"
            )));
        }
        Ok(Self {
            seed,
            level_sizes,
            slots,
            fallback,
            len,
        })
    }
}
