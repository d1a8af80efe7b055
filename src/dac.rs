//! Directly addressable codes: a variable-length integer array with random access.
//!
//! Every value is cut into `width`-bit chunks, least significant first. Level `l`
//! stores the `l`-th chunk of every value that has one, plus a flag telling whether
//! the value continues on level `l + 1`. The position on the next level is the rank
//! of the flag, so access costs one rank per chunk and small values stay short.

use crate::bitvec::{BitVecBuilder, BitVector};
use crate::error::{Error, Result};
use crate::packed::PackedBits;
use crate::persist::{self, Persist};
use std::io::{Read, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Level {
    chunks: PackedBits,
    more: BitVector,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Dac {
    levels: Vec<Level>,
    width: usize,
    len: usize,
}

impl Dac {
    /// Encodes `values` with the chunk width that minimizes the encoded size.
    pub(crate) fn build(values: &[u64]) -> Self {
        Self::with_width(values, best_width(values))
    }

    pub(crate) fn with_width(values: &[u64], width: usize) -> Self {
        assert!((1..=64).contains(&width), "chunk width {width} out of range");
        let mut levels = Vec::new();
        let mut current = values.to_vec();
        while !current.is_empty() {
            let mut chunks = PackedBits::new();
            let mut more = BitVecBuilder::new();
            let mut next = Vec::new();
            for &value in &current {
                chunks.push(value, width);
                let rest = if width == 64 { 0 } else { value >> width };
                more.push(rest != 0);
                if rest != 0 {
                    next.push(rest);
                }
            }
            levels.push(Level {
                chunks,
                more: more.build(),
            });
            current = next;
        }
        Self {
            levels,
            width,
            len: values.len(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.levels
            .iter()
            .map(|l| l.chunks.heap_bytes() + l.more.heap_bytes())
            .sum()
    }

    #[inline]
    pub(crate) fn get(&self, i: usize) -> u64 {
        debug_assert!(i < self.len, "index {i} out of range for {} values", self.len);
        let mut idx = i;
        let mut value = 0u64;
        let mut shift = 0;
        for level in &self.levels {
            value |= level.chunks.get(idx * self.width, self.width) << shift;
            if !level.more.get(idx) {
                break;
            }
            idx = level.more.rank1(idx);
            shift += self.width;
        }
        value
    }
}

/// Chunk width in `1..=64` minimizing chunk bits plus one flag bit per chunk.
fn best_width(values: &[u64]) -> usize {
    let mut by_bits = [0u64; 65];
    for &value in values {
        by_bits[64 - value.leading_zeros() as usize] += 1;
    }
    (1..=64usize)
        .min_by_key(|&width| {
            by_bits
                .iter()
                .enumerate()
                .map(|(bits, &count)| count * bits.div_ceil(width).max(1) as u64 * (width as u64 + 1))
                .sum::<u64>()
        })
        .unwrap_or(1)
}

impl Persist for Dac {
    fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        persist::write_u64(w, self.len as u64)?;
        persist::write_u64(w, self.width as u64)?;
        persist::write_u64(w, self.levels.len() as u64)?;
        for level in &self.levels {
            level.chunks.write_to(w)?;
            level.more.write_to(w)?;
        }
        Ok(())
    }

    fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let len = persist::read_usize(r)?;
        let width = persist::read_usize(r)?;
        let num_levels = persist::read_usize(r)?;
        if !(1..=64).contains(&width) || num_levels > 64 {
            return Err(Error::InvalidEncoding(format!(
                "code array with chunk width {width} and {num_levels} levels"
            )));
        }

        let mut levels = Vec::with_capacity(num_levels);
        let mut expected = len;
        for _ in 0..num_levels {
            let chunks = PackedBits::read_from(r)?;
            let more = BitVector::read_from(r)?;
            if more.len() != expected || chunks.len() != expected * width {
                return Err(Error::InvalidEncoding(format!(
                    "code array level holds {} values, expected {expected}",
                    more.len()
                )));
            }
            expected = more.count_ones();
            levels.push(Level { chunks, more });
        }
        if expected != 0 {
            return Err(Error::InvalidEncoding(
                "code array ends with continued values".to_string(),
            ));
        }
        Ok(Self { levels, width, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_get_mixed_magnitudes() {
        let values = vec![0, 1, 2, 3, 255, 256, 70_000, 1 << 40, u64::MAX, 7];
        for width in [1, 3, 8, 17, 64] {
            let dac = Dac::with_width(&values, width);
            assert_eq!(dac.len(), values.len());
            for (i, &v) in values.iter().enumerate() {
                assert_eq!(dac.get(i), v, "width {width} index {i}");
            }
        }
    }

    #[test]
    fn test_build_picks_width() {
        let values: Vec<u64> = (0..1000).map(|i| i % 5).collect();
        let dac = Dac::build(&values);
        assert!(dac.width <= 3);
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(dac.get(i), v);
        }
    }

    #[test]
    fn test_best_width_all_zero() {
        assert_eq!(best_width(&[0, 0, 0]), 1);
        assert_eq!(best_width(&[]), 1);
    }

    #[test]
    fn test_small_values_stay_on_first_level() {
        let dac = Dac::with_width(&[1, 2, 3], 4);
        assert_eq!(dac.levels.len(), 1);
        let dac = Dac::with_width(&[1, 2, 300], 4);
        assert_eq!(dac.levels.len(), 3);
        assert_eq!(dac.levels[1].more.len(), 1);
    }

    #[test]
    fn test_empty() {
        let dac = Dac::build(&[]);
        assert_eq!(dac.len(), 0);
        assert_eq!(dac.heap_bytes(), 0);
    }

    #[test]
    fn test_persist_roundtrip() {
        let values: Vec<u64> = (0..2000u64).map(|i| (i * 7919) % 1031).collect();
        let dac = Dac::build(&values);
        let mut buf = Vec::new();
        dac.write_to(&mut buf).unwrap();
        let loaded = Dac::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(loaded, dac);
        assert_eq!(loaded.get(1999), values[1999]);
    }

    #[test]
    fn test_persist_rejects_bad_width() {
        let dac = Dac::build(&[1, 2, 3]);
        let mut buf = Vec::new();
        dac.write_to(&mut buf).unwrap();
        buf[8..16].copy_from_slice(&0u64.to_le_bytes());
        let err = Dac::read_from(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding(_)));
    }
}
