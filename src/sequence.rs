//! Top-level sequence: which element covers a text position.
//!
//! The exclusive end position of every element is kept in an Elias-Fano sequence.
//! The element covering `pos` is the number of ends `<= pos`, and its start is the
//! end of the element before it. Each element also carries the shape and label
//! offsets of its root symbol.

use crate::dac::Dac;
use crate::elias_fano::EliasFano;

/// A derivation-tree node: its expansion length and its offsets in both grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) len: u64,
    pub(crate) shape: u64,
    pub(crate) label: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SequenceIndex {
    ends: EliasFano,
    shape: Dac,
    label: Dac,
}

impl SequenceIndex {
    /// `lens[i]` is the expansion length of element `i`; offsets are per element.
    pub(crate) fn build(lens: &[u64], shape: &[u64], label: &[u64]) -> Self {
        debug_assert!(lens.len() == shape.len() && lens.len() == label.len());
        let ends: Vec<u64> = lens
            .iter()
            .scan(0u64, |sum, &len| {
                *sum += len;
                Some(*sum)
            })
            .collect();
        Self {
            ends: EliasFano::build(&ends),
            shape: Dac::build(shape),
            label: Dac::build(label),
        }
    }

    pub(crate) fn from_parts(ends: EliasFano, shape: Dac, label: Dac) -> Self {
        Self { ends, shape, label }
    }

    pub(crate) fn ends(&self) -> &EliasFano {
        &self.ends
    }

    pub(crate) fn shape_offsets(&self) -> &Dac {
        &self.shape
    }

    pub(crate) fn label_offsets(&self) -> &Dac {
        &self.label
    }

    /// Number of elements.
    pub(crate) fn len(&self) -> usize {
        self.ends.len()
    }

    /// Length of the whole text.
    pub(crate) fn text_len(&self) -> u64 {
        match self.ends.len() {
            0 => 0,
            n => self.ends.get(n - 1).unwrap_or(0),
        }
    }

    /// Start position of element `i`.
    #[inline]
    pub(crate) fn start(&self, i: usize) -> u64 {
        match i {
            0 => 0,
            _ => self.ends.get(i - 1).unwrap_or(0),
        }
    }

    /// Element covering `pos` and the offset of `pos` inside it.
    #[inline]
    pub(crate) fn locate(&self, pos: u64) -> (usize, u64) {
        debug_assert!(pos < self.text_len());
        let element = self.ends.rank(pos + 1);
        (element, pos - self.start(element))
    }

    #[inline]
    pub(crate) fn root(&self, i: usize) -> Node {
        let end = self.ends.get(i).unwrap_or(0);
        Node {
            len: end - self.start(i),
            shape: self.shape.get(i),
            label: self.label.get(i),
        }
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.ends.heap_bytes() + self.shape.heap_bytes() + self.label.heap_bytes()
    }
}
