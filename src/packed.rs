//! Append-only bit buffer with random-access reads of up to 64 bits.

use crate::error::{Error, Result};
use crate::persist::{self, Persist};
use std::io::{Read, Write};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct PackedBits {
    words: Vec<u64>,
    len: usize,
}

#[inline]
fn low_mask(width: usize) -> u64 {
    if width == 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

impl PackedBits {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Length in bits.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.words.len() * 8
    }

    /// Appends the low `width` bits of `value`.
    pub(crate) fn push(&mut self, value: u64, width: usize) {
        debug_assert!(width <= 64);
        if width == 0 {
            return;
        }
        let value = value & low_mask(width);
        let offset = self.len % 64;
        if offset == 0 {
            self.words.push(value);
        } else {
            let last = self.words.len() - 1;
            self.words[last] |= value << offset;
            if offset + width > 64 {
                self.words.push(value >> (64 - offset));
            }
        }
        self.len += width;
    }

    /// Reads `width` bits starting at bit `pos`.
    #[inline]
    pub(crate) fn get(&self, pos: usize, width: usize) -> u64 {
        debug_assert!(width <= 64 && pos + width <= self.len);
        if width == 0 {
            return 0;
        }
        let word = pos / 64;
        let offset = pos % 64;
        let mut value = self.words[word] >> offset;
        if offset + width > 64 {
            value |= self.words[word + 1] << (64 - offset);
        }
        value & low_mask(width)
    }
}

impl Persist for PackedBits {
    fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        persist::write_u64(w, self.len as u64)?;
        persist::write_words(w, &self.words)
    }

    fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let len = persist::read_usize(r)?;
        let words = persist::read_words(r)?;
        if words.len() != len.div_ceil(64) {
            return Err(Error::InvalidEncoding(format!(
                "packed buffer of {len} bits stored in {} words",
                words.len()
            )));
        }
        Ok(Self { words, len })
    }
}
