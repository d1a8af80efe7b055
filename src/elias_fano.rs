//! Elias-Fano encoding of non-decreasing integer sequences.
//!
//! Each value is split into `low_width` low bits, stored densely, and a high part
//! stored in unary in a [`BitVector`]: element `i` with high part `h` sets bit `h + i`.
//! Access is a `select1` on the high bits; `rank` (count of elements below a bound)
//! is a `select0` followed by a short scan over elements sharing the high part.

use crate::bitvec::{BitVecBuilder, BitVector};
use crate::error::{Error, Result};
use crate::packed::PackedBits;
use crate::persist::{self, Persist};
use std::io::{Read, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EliasFano {
    upper: BitVector,
    lower: PackedBits,
    low_width: usize,
    len: usize,
}

impl EliasFano {
    /// Encodes `values`, which must be non-decreasing.
    pub(crate) fn build(values: &[u64]) -> Self {
        debug_assert!(
            values.windows(2).all(|w| w[0] <= w[1]),
            "EliasFano::build requires non-decreasing values"
        );
        let len = values.len();
        let max = values.last().copied().unwrap_or(0);
        let universe = max.saturating_add(1);
        let low_width = if len == 0 || universe <= len as u64 {
            0
        } else {
            (63 - (universe / len as u64).leading_zeros()) as usize
        };

        let mut lower = PackedBits::new();
        let mut upper = BitVecBuilder::with_len(len + (max >> low_width) as usize + 1);
        for (i, &value) in values.iter().enumerate() {
            lower.push(value, low_width);
            upper.set((value >> low_width) as usize + i);
        }

        Self {
            upper: upper.build(),
            lower,
            low_width,
            len,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.upper.heap_bytes() + self.lower.heap_bytes()
    }

    /// The `i`-th value; `None` past the end.
    #[inline]
    pub(crate) fn get(&self, i: usize) -> Option<u64> {
        if i >= self.len {
            return None;
        }
        let high = (self.upper.select1(i)? - i) as u64;
        Some((high << self.low_width) | self.low(i))
    }

    /// Number of elements strictly smaller than `bound`.
    pub(crate) fn rank(&self, bound: u64) -> usize {
        let high = (bound >> self.low_width) as usize;
        let low = bound & self.low_mask();
        let (mut pos, mut idx) = if high == 0 {
            (0, 0)
        } else {
            match self.upper.select0(high - 1) {
                Some(zero) => (zero + 1, zero + 1 - high),
                None => return self.len,
            }
        };
        // Elements sharing the high part are consecutive ones after the zero.
        while idx < self.len && self.upper.get(pos) && self.low(idx) < low {
            pos += 1;
            idx += 1;
        }
        idx
    }

    #[inline]
    fn low(&self, i: usize) -> u64 {
        self.lower.get(i * self.low_width, self.low_width)
    }

    fn low_mask(&self) -> u64 {
        if self.low_width == 0 {
            0
        } else {
            (1u64 << self.low_width) - 1
        }
    }
}

impl Persist for EliasFano {
    fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        persist::write_u64(w, self.len as u64)?;
        persist::write_u64(w, self.low_width as u64)?;
        self.lower.write_to(w)?;
        self.upper.write_to(w)
    }

    fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let len = persist::read_usize(r)?;
        let low_width = persist::read_usize(r)?;
        let lower = PackedBits::read_from(r)?;
        let upper = BitVector::read_from(r)?;
        if low_width >= 64
            || lower.len() != len.saturating_mul(low_width)
            || upper.count_ones() != len
        {
            return Err(Error::InvalidEncoding(format!(
                "Elias-Fano sequence of {len} elements has inconsistent parts"
            )));
        }
        Ok(Self {
            upper,
            lower,
            low_width,
            len,
        })
    }
}
