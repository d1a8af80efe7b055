//! Static bit-vector with constant-time rank and sampled select.
//!
//! Rank follows the Rank9 layout: for every 512-bit block one absolute count and one
//! word of seven packed 9-bit cumulative counts for the sub-words of the block.
//! Select keeps the block index of every 512th one (and zero) and finishes with a
//! binary search over block counts plus a broadword scan inside a single word.

use crate::error::{Error, Result};
use crate::persist::{self, Persist};
use std::io::{Read, Write};

const WORD_BITS: usize = 64;
const BLOCK_WORDS: usize = 8;
const BLOCK_BITS: usize = WORD_BITS * BLOCK_WORDS;
const SELECT_SAMPLE: usize = 512;

/// Incremental builder for a [`BitVector`].
#[derive(Debug, Default, Clone)]
pub struct BitVecBuilder {
    words: Vec<u64>,
    len: usize,
}

impl BitVecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder holding `len` zero bits.
    pub fn with_len(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    pub fn push(&mut self, bit: bool) {
        if self.len % WORD_BITS == 0 {
            self.words.push(0);
        }
        if bit {
            self.words[self.len / WORD_BITS] |= 1u64 << (self.len % WORD_BITS);
        }
        self.len += 1;
    }

    pub fn set(&mut self, i: usize) {
        assert!(i < self.len, "bit {i} out of range for length {}", self.len);
        self.words[i / WORD_BITS] |= 1u64 << (i % WORD_BITS);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn build(self) -> BitVector {
        BitVector::from_words(self.words, self.len)
    }
}

/// An immutable bit-vector supporting `rank1`, `rank0`, `select1` and `select0`.
#[derive(Clone, PartialEq, Eq)]
pub struct BitVector {
    words: Vec<u64>,
    len: usize,
    ones: usize,
    /// Absolute rank before each block, plus one trailing total.
    block_ranks: Vec<u64>,
    /// Seven 9-bit cumulative sub-word ranks per block.
    sub_ranks: Vec<u64>,
    select1_hints: Vec<u32>,
    select0_hints: Vec<u32>,
}

impl std::fmt::Debug for BitVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitVector")
            .field("len", &self.len)
            .field("ones", &self.ones)
            .finish()
    }
}

impl BitVector {
    /// Builds the rank/select index over `len` bits stored little-endian in `words`.
    ///
    /// Bits at positions `>= len` are cleared.
    pub fn from_words(mut words: Vec<u64>, len: usize) -> Self {
        words.resize(len.div_ceil(WORD_BITS), 0);
        if len % WORD_BITS != 0 {
            if let Some(last) = words.last_mut() {
                *last &= (1u64 << (len % WORD_BITS)) - 1;
            }
        }

        let num_blocks = words.len().div_ceil(BLOCK_WORDS);
        let mut block_ranks = Vec::with_capacity(num_blocks + 1);
        let mut sub_ranks = Vec::with_capacity(num_blocks);
        let mut total = 0u64;

        for block in 0..num_blocks {
            block_ranks.push(total);
            let mut packed = 0u64;
            let mut within = 0u64;
            for j in 0..BLOCK_WORDS {
                if j > 0 {
                    packed |= within << (9 * (j - 1));
                }
                if let Some(word) = words.get(block * BLOCK_WORDS + j) {
                    within += u64::from(word.count_ones());
                }
            }
            sub_ranks.push(packed);
            total += within;
        }
        block_ranks.push(total);

        let ones = total as usize;
        let (select1_hints, select0_hints) = build_hints(&block_ranks, ones, len);

        Self {
            words,
            len,
            ones,
            block_ranks,
            sub_ranks,
            select1_hints,
            select0_hints,
        }
    }

    /// Collects a bit-vector from an iterator of bits.
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let mut builder = BitVecBuilder::new();
        for bit in bits {
            builder.push(bit);
        }
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.ones
    }

    pub fn count_zeros(&self) -> usize {
        self.len - self.ones
    }

    /// Heap memory used by the bits and the index, in bytes.
    pub fn heap_bytes(&self) -> usize {
        (self.words.len() + self.block_ranks.len() + self.sub_ranks.len()) * 8
            + (self.select1_hints.len() + self.select0_hints.len()) * 4
    }

    /// Returns the bit at `i`, or `false` past the end.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        if i >= self.len {
            return false;
        }
        (self.words[i / WORD_BITS] >> (i % WORD_BITS)) & 1 == 1
    }

    /// Number of set bits in `[0, i)`. Positions past the end are clamped.
    #[inline]
    pub fn rank1(&self, i: usize) -> usize {
        let i = i.min(self.len);
        let block = i / BLOCK_BITS;
        if block + 1 >= self.block_ranks.len() {
            return self.ones;
        }
        let sub = (i % BLOCK_BITS) / WORD_BITS;
        let mut rank = self.block_ranks[block] as usize + self.sub_rank(block, sub);
        let bit = i % WORD_BITS;
        if bit > 0 {
            let word = self.words[block * BLOCK_WORDS + sub];
            rank += (word & ((1u64 << bit) - 1)).count_ones() as usize;
        }
        rank
    }

    /// Number of unset bits in `[0, i)`.
    #[inline]
    pub fn rank0(&self, i: usize) -> usize {
        i.min(self.len) - self.rank1(i)
    }

    /// Position of the `k`-th set bit (0-indexed).
    pub fn select1(&self, k: usize) -> Option<usize> {
        if k >= self.ones {
            return None;
        }
        let (lo, hi) = hint_range(&self.select1_hints, k, self.num_blocks());
        let block = last_block_at_most(lo, hi, k, |b| self.block_ranks[b] as usize);
        let mut remaining = k - self.block_ranks[block] as usize;

        let mut sub = 0;
        for j in 1..BLOCK_WORDS {
            if self.sub_rank(block, j) <= remaining {
                sub = j;
            } else {
                break;
            }
        }
        remaining -= self.sub_rank(block, sub);

        let word = self.words[block * BLOCK_WORDS + sub];
        Some(block * BLOCK_BITS + sub * WORD_BITS + select_in_word(word, remaining))
    }

    /// Position of the `k`-th unset bit (0-indexed).
    pub fn select0(&self, k: usize) -> Option<usize> {
        if k >= self.count_zeros() {
            return None;
        }
        let zeros_before = |b: usize| b * BLOCK_BITS - self.block_ranks[b] as usize;
        let (lo, hi) = hint_range(&self.select0_hints, k, self.num_blocks());
        let block = last_block_at_most(lo, hi, k, zeros_before);
        let mut remaining = k - zeros_before(block);

        let sub_zeros = |j: usize| j * WORD_BITS - self.sub_rank(block, j);
        let mut sub = 0;
        for j in 1..BLOCK_WORDS {
            if sub_zeros(j) <= remaining {
                sub = j;
            } else {
                break;
            }
        }
        remaining -= sub_zeros(sub);

        let word = !self.words[block * BLOCK_WORDS + sub];
        Some(block * BLOCK_BITS + sub * WORD_BITS + select_in_word(word, remaining))
    }

    fn num_blocks(&self) -> usize {
        self.block_ranks.len() - 1
    }

    #[inline]
    fn sub_rank(&self, block: usize, sub: usize) -> usize {
        if sub == 0 {
            0
        } else {
            ((self.sub_ranks[block] >> (9 * (sub - 1))) & 0x1FF) as usize
        }
    }
}

fn build_hints(block_ranks: &[u64], ones: usize, len: usize) -> (Vec<u32>, Vec<u32>) {
    let num_blocks = block_ranks.len() - 1;
    let zeros = len - ones;
    let mut select1_hints = Vec::with_capacity(ones.div_ceil(SELECT_SAMPLE));
    let mut select0_hints = Vec::with_capacity(zeros.div_ceil(SELECT_SAMPLE));
    let mut next_one = 0usize;
    let mut next_zero = 0usize;

    for block in 0..num_blocks {
        let ones_end = block_ranks[block + 1] as usize;
        while next_one < ones_end {
            select1_hints.push(block as u32);
            next_one += SELECT_SAMPLE;
        }
        let zeros_end = ((block + 1) * BLOCK_BITS - ones_end).min(zeros);
        while next_zero < zeros_end {
            select0_hints.push(block as u32);
            next_zero += SELECT_SAMPLE;
        }
    }
    (select1_hints, select0_hints)
}

/// Block range `[lo, hi)` guaranteed to contain the answer for the `k`-th element.
fn hint_range(hints: &[u32], k: usize, num_blocks: usize) -> (usize, usize) {
    let sample = k / SELECT_SAMPLE;
    let lo = hints[sample] as usize;
    let hi = match hints.get(sample + 1) {
        Some(&next) => next as usize + 1,
        None => num_blocks,
    };
    (lo, hi)
}

/// Largest block `b` in `[lo, hi)` with `count(b) <= k`; `count` is monotone.
fn last_block_at_most(mut lo: usize, mut hi: usize, k: usize, count: impl Fn(usize) -> usize) -> usize {
    debug_assert!(count(lo) <= k);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if count(mid) <= k {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Position of the `k`-th set bit inside `word` (0-indexed).
#[inline]
pub(crate) fn select_in_word(word: u64, k: usize) -> usize {
    let mut w = word;
    for _ in 0..k {
        w &= w.wrapping_sub(1);
    }
    debug_assert!(w != 0, "select_in_word: fewer than {} ones", k + 1);
    w.trailing_zeros() as usize
}

impl Persist for BitVector {
    fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        persist::write_u64(w, self.len as u64)?;
        persist::write_words(w, &self.words)?;
        persist::write_words(w, &self.block_ranks)?;
        persist::write_words(w, &self.sub_ranks)?;
        persist::write_u32s(w, &self.select1_hints)?;
        persist::write_u32s(w, &self.select0_hints)
    }

    fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let len = persist::read_usize(r)?;
        let words = persist::read_words(r)?;
        let block_ranks = persist::read_words(r)?;
        let sub_ranks = persist::read_words(r)?;
        let select1_hints = persist::read_u32s(r)?;
        let select0_hints = persist::read_u32s(r)?;

        let num_blocks = words.len().div_ceil(BLOCK_WORDS);
        if words.len() != len.div_ceil(WORD_BITS)
            || block_ranks.len() != num_blocks + 1
            || sub_ranks.len() != num_blocks
        {
            return Err(Error::InvalidEncoding(format!(
                "bit-vector of {len} bits has inconsistent index sizes"
            )));
        }
        let ones = block_ranks[num_blocks] as usize;
        if ones > len
            || select1_hints.len() != ones.div_ceil(SELECT_SAMPLE)
            || select0_hints.len() != (len - ones).div_ceil(SELECT_SAMPLE)
        {
            return Err(Error::InvalidEncoding(format!(
                "bit-vector of {len} bits has inconsistent select samples"
            )));
        }

        Ok(Self {
            words,
            len,
            ones,
            block_ranks,
            sub_ranks,
            select1_hints,
            select0_hints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_rank_basic() {
        let bv = BitVector::from_words(vec![0b1011, 0b1101], 128);
        assert_eq!(bv.rank1(0), 0);
        assert_eq!(bv.rank1(1), 1);
        assert_eq!(bv.rank1(4), 3);
        assert_eq!(bv.rank1(128), 6);
        assert_eq!(bv.rank0(4), 1);
        assert!(bv.get(0));
        assert!(!bv.get(2));
    }

    #[test]
    fn test_select_basic() {
        let bv = BitVector::from_words(vec![0b1011], 64);
        assert_eq!(bv.select1(0), Some(0));
        assert_eq!(bv.select1(1), Some(1));
        assert_eq!(bv.select1(2), Some(3));
        assert_eq!(bv.select1(3), None);

        assert_eq!(bv.select0(0), Some(2));
        assert_eq!(bv.select0(1), Some(4));
        assert_eq!(bv.select0(60), Some(63));
        assert_eq!(bv.select0(61), None);
    }

    #[test]
    fn test_trailing_bits_are_masked() {
        let bv = BitVector::from_words(vec![u64::MAX], 10);
        assert_eq!(bv.count_ones(), 10);
        assert_eq!(bv.count_zeros(), 0);
        assert_eq!(bv.select0(0), None);
    }

    #[test]
    fn test_across_many_blocks() {
        // Every third bit set over several blocks and select samples.
        let bits: Vec<bool> = (0..5000).map(|i| i % 3 == 0).collect();
        let bv = BitVector::from_bits(bits.iter().copied());

        let mut ones = 0;
        let mut zeros = 0;
        for (i, &bit) in bits.iter().enumerate() {
            assert_eq!(bv.rank1(i), ones);
            if bit {
                assert_eq!(bv.select1(ones), Some(i));
                ones += 1;
            } else {
                assert_eq!(bv.select0(zeros), Some(i));
                zeros += 1;
            }
        }
        assert_eq!(bv.rank1(bits.len()), ones);
        assert_eq!(bv.select1(ones), None);
        assert_eq!(bv.select0(zeros), None);
    }

    #[test]
    fn test_empty() {
        let bv = BitVecBuilder::new().build();
        assert!(bv.is_empty());
        assert_eq!(bv.rank1(0), 0);
        assert_eq!(bv.select1(0), None);
        assert_eq!(bv.select0(0), None);
    }

    #[test]
    fn test_builder_set() {
        let mut builder = BitVecBuilder::with_len(700);
        builder.set(0);
        builder.set(699);
        let bv = builder.build();
        assert_eq!(bv.count_ones(), 2);
        assert_eq!(bv.select1(1), Some(699));
    }

    #[test]
    fn test_persist_roundtrip() {
        let bv = BitVector::from_bits((0..1500).map(|i| i % 7 == 2));
        let mut buf = Vec::new();
        bv.write_to(&mut buf).unwrap();
        let loaded = BitVector::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(loaded, bv);
        assert_eq!(loaded.select1(100), bv.select1(100));
    }

    #[test]
    fn test_persist_rejects_inconsistent_sizes() {
        let bv = BitVector::from_bits((0..100).map(|i| i % 2 == 0));
        let mut buf = Vec::new();
        bv.write_to(&mut buf).unwrap();
        // Claim one more bit than the word array holds.
        buf[..8].copy_from_slice(&(1000u64).to_le_bytes());
        let err = BitVector::read_from(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding(_)));
    }
}
