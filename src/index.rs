//! The shaped SLP index: construction entry points, accessors, checked queries,
//! size statistics and the serialized form.

use crate::dac::Dac;
use crate::elias_fano::EliasFano;
use crate::error::{Error, Result};
use crate::group::GroupIndex;
use crate::iter::TextIter;
use crate::mph::LengthHash;
use crate::persist::{self, Persist};
use crate::rules::RuleTable;
use crate::sequence::SequenceIndex;
use crate::shaping::{self, ShapeOptions};
use crate::slp::SlpSource;
use std::io::{Read, Write};
use tracing::debug;

/// A grammar-compressed string supporting random access and substring extraction.
///
/// The index is immutable once built or loaded, and all queries take `&self`, so
/// one instance can serve any number of threads at once.
///
/// # Example
///
/// ```
/// use shaped_slp::{NaiveSlp, ShapedSlp, Symbol};
///
/// let mut slp = NaiveSlp::new(b"ab".to_vec());
/// let ab = slp.push_rule(Symbol::Leaf(0), Symbol::Leaf(1));
/// let abab = slp.push_rule(Symbol::Rule(ab), Symbol::Rule(ab));
/// slp.push_sequence(Symbol::Rule(abab));
///
/// let index = ShapedSlp::new(&slp);
/// assert_eq!(index.len(), 4);
/// assert_eq!(index.char_at(2), b'a');
/// assert_eq!(index.substr(1, 3), b"bab");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedSlp {
    pub(crate) alphabet: Vec<u8>,
    pub(crate) lengths: LengthHash,
    pub(crate) sequence: SequenceIndex,
    pub(crate) shape: RuleTable,
    pub(crate) label: RuleTable,
    /// Balance code of every shape rule, in shape order.
    pub(crate) balance: Dac,
}

impl ShapedSlp {
    /// Builds the index from a raw grammar with default options.
    pub fn new<S: SlpSource + ?Sized>(slp: &S) -> Self {
        Self::with_options(slp, &ShapeOptions::default())
    }

    pub fn with_options<S: SlpSource + ?Sized>(slp: &S, options: &ShapeOptions) -> Self {
        shaping::shape(slp, options)
    }

    /// Length of the indexed text.
    pub fn len(&self) -> usize {
        self.sequence.text_len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet.len()
    }

    /// Number of elements in the top-level sequence.
    pub fn sequence_len(&self) -> usize {
        self.sequence.len()
    }

    pub fn num_shape_rules(&self) -> usize {
        self.shape.num_rules()
    }

    pub fn num_label_rules(&self) -> usize {
        self.label.num_rules()
    }

    /// Number of distinct expansion lengths among shape rules.
    pub fn num_distinct_lengths(&self) -> usize {
        self.lengths.len()
    }

    /// Checked variant of [`char_at`](Self::char_at).
    pub fn get(&self, pos: usize) -> Option<u8> {
        (pos < self.len()).then(|| self.char_at(pos))
    }

    /// Returns `len` bytes starting at `pos`.
    ///
    /// Same preconditions as [`expand_substr`](Self::expand_substr).
    pub fn substr(&self, pos: usize, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        self.expand_substr(pos, &mut out);
        out
    }

    /// Checked variant of [`substr`](Self::substr). An empty range at or before the
    /// end of the text yields an empty vector.
    pub fn try_substr(&self, pos: usize, len: usize) -> Result<Vec<u8>> {
        let text_len = self.len();
        match pos.checked_add(len) {
            Some(end) if end <= text_len => {}
            _ => return Err(Error::OutOfBounds { pos, len, text_len }),
        }
        if len == 0 {
            return Ok(Vec::new());
        }
        Ok(self.substr(pos, len))
    }

    /// Iterates over the whole text.
    pub fn iter(&self) -> TextIter<'_> {
        TextIter::new(self, 0)
    }

    /// Iterates over the text from `pos` on.
    pub fn iter_from(&self, pos: usize) -> TextIter<'_> {
        TextIter::new(self, pos)
    }

    /// Dimensions and per-component heap sizes.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            text_len: self.len(),
            alphabet_size: self.alphabet_size(),
            sequence_len: self.sequence_len(),
            num_shape_rules: self.num_shape_rules(),
            num_label_rules: self.num_label_rules(),
            num_distinct_lengths: self.num_distinct_lengths(),
            sizes: ComponentSizes {
                alphabet: self.alphabet.len(),
                length_hash: self.lengths.heap_bytes(),
                sequence_ends: self.sequence.ends().heap_bytes(),
                balance: self.balance.heap_bytes(),
                shape_children: self.shape.children().heap_bytes(),
                shape_groups: self.shape.groups().heap_bytes(),
                shape_sequence: self.sequence.shape_offsets().heap_bytes(),
                label_children: self.label.children().heap_bytes(),
                label_groups: self.label.groups().heap_bytes(),
                label_sequence: self.sequence.label_offsets().heap_bytes(),
            },
        }
    }

    /// Writes the serialized index.
    pub fn save<W: Write>(&self, w: &mut W) -> Result<()> {
        persist::write_bytes(w, &self.alphabet)?;
        self.lengths.write_to(w)?;
        self.sequence.ends().write_to(w)?;
        self.shape.groups().write_to(w)?;
        self.label.groups().write_to(w)?;
        self.balance.write_to(w)?;
        self.sequence.shape_offsets().write_to(w)?;
        self.sequence.label_offsets().write_to(w)?;
        self.shape.children().write_to(w)?;
        self.label.children().write_to(w)
    }

    /// Reads an index written by [`save`](Self::save).
    pub fn load<R: Read>(r: &mut R) -> Result<Self> {
        let alphabet = persist::read_bytes(r)?;
        let lengths = LengthHash::read_from(r)?;
        let ends = EliasFano::read_from(r)?;
        let shape_groups = GroupIndex::read_from(r)?;
        let label_groups = GroupIndex::read_from(r)?;
        let balance = Dac::read_from(r)?;
        let seq_shape = Dac::read_from(r)?;
        let seq_label = Dac::read_from(r)?;
        let shape_children = Dac::read_from(r)?;
        let label_children = Dac::read_from(r)?;

        let num_shape = shape_groups.num_rules();
        let num_label = label_groups.num_rules();
        if seq_shape.len() != ends.len() || seq_label.len() != ends.len() {
            return Err(Error::InvalidEncoding(format!(
                "sequence of {} elements has {} shape and {} label offsets",
                ends.len(),
                seq_shape.len(),
                seq_label.len()
            )));
        }
        if balance.len() != num_shape
            || shape_children.len() != 2 * num_shape
            || label_children.len() != 2 * num_label
        {
            return Err(Error::InvalidEncoding(format!(
                "rule tables disagree with {num_shape} shape and {num_label} label rules"
            )));
        }
        if shape_groups.num_groups() != lengths.len() || label_groups.num_groups() != num_shape {
            return Err(Error::InvalidEncoding(format!(
                "{} length groups for {} lengths, {} label groups for {num_shape} shape rules",
                shape_groups.num_groups(),
                lengths.len(),
                label_groups.num_groups()
            )));
        }

        let index = Self {
            alphabet,
            lengths,
            sequence: SequenceIndex::from_parts(ends, seq_shape, seq_label),
            shape: RuleTable::new(shape_children, shape_groups),
            label: RuleTable::new(label_children, label_groups),
            balance,
        };
        debug!(
            text_len = index.len(),
            sequence_len = index.sequence_len(),
            shape_rules = num_shape,
            label_rules = num_label,
            "loaded shaped SLP"
        );
        Ok(index)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        self.save(&mut buf)
            .unwrap_or_else(|e| unreachable!("in-memory write failed: {e}"));
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = bytes;
        let index = Self::load(&mut reader)?;
        if !reader.is_empty() {
            return Err(Error::InvalidEncoding(format!(
                "{} trailing bytes after index",
                reader.len()
            )));
        }
        Ok(index)
    }
}

impl<'a> IntoIterator for &'a ShapedSlp {
    type Item = u8;
    type IntoIter = TextIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Dimensions of an index and the heap bytes of its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub text_len: usize,
    pub alphabet_size: usize,
    pub sequence_len: usize,
    pub num_shape_rules: usize,
    pub num_label_rules: usize,
    pub num_distinct_lengths: usize,
    pub sizes: ComponentSizes,
}

impl IndexStats {
    /// Heap bits per text symbol. Lower is better.
    pub fn bits_per_symbol(&self) -> f64 {
        if self.text_len == 0 {
            0.0
        } else {
            (self.sizes.total_bytes() * 8) as f64 / self.text_len as f64
        }
    }
}

/// Heap bytes of each component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentSizes {
    pub alphabet: usize,
    pub length_hash: usize,
    /// Prefix sums of the top-level sequence
    pub sequence_ends: usize,
    pub balance: usize,
    pub shape_children: usize,
    pub shape_groups: usize,
    /// Shape offsets of the top-level sequence
    pub shape_sequence: usize,
    pub label_children: usize,
    pub label_groups: usize,
    /// Label offsets of the top-level sequence
    pub label_sequence: usize,
}

impl ComponentSizes {
    /// Everything describing the shape of the text.
    pub fn shape_bytes(&self) -> usize {
        self.length_hash
            + self.sequence_ends
            + self.balance
            + self.shape_children
            + self.shape_groups
            + self.shape_sequence
    }

    /// Everything describing the labels of the text.
    pub fn label_bytes(&self) -> usize {
        self.alphabet + self.label_children + self.label_groups + self.label_sequence
    }

    pub fn total_bytes(&self) -> usize {
        self.shape_bytes() + self.label_bytes()
    }
}
