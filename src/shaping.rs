//! Construction: turns a raw straight-line program into a [`ShapedSlp`].
//!
//! 1. Hash-cons every raw rule on the shapes of its children into the shape grammar.
//! 2. Hash the distinct shape lengths to dense ids.
//! 3. Lay shape rules out by (optionally) descending frequency, then by length id.
//! 4. Lay label rules out by (optionally) descending frequency, then by the position
//!    of their shape rule from step 3.
//! 5. Encode balance codes, child offsets and the top-level sequence.

use crate::dac::Dac;
use crate::group::GroupIndex;
use crate::index::ShapedSlp;
use crate::mph::{HashConfig, LengthHash};
use crate::rules::{encode_balance, RuleTable};
use crate::sequence::SequenceIndex;
use crate::slp::{NaiveSlp, SlpSource};
use crate::symbol::Symbol;
use ahash::AHashMap as HashMap;
use std::cmp::Reverse;
use tracing::{debug, info, trace};

/// Label of the single leaf of the shape grammar.
const SHAPE_LEAF: u8 = b'!';

/// Options for building a [`ShapedSlp`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeOptions {
    /// Place frequently referenced rules first within their group, which keeps
    /// their offsets small.
    pub freq_sort: bool,
    /// Parameters of the length hash.
    pub hash: HashConfig,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            freq_sort: true,
            hash: HashConfig::default(),
        }
    }
}

impl ShapeOptions {
    pub fn freq_sort(mut self, freq_sort: bool) -> Self {
        self.freq_sort = freq_sort;
        self
    }

    pub fn hash(mut self, hash: HashConfig) -> Self {
        self.hash = hash;
        self
    }
}

/// Builds the index. The grammar is assumed to be a valid topologically ordered SLP.
pub(crate) fn shape<S: SlpSource + ?Sized>(slp: &S, options: &ShapeOptions) -> ShapedSlp {
    let alphabet: Vec<u8> = (0..slp.alphabet_size())
        .map(|i| slp.alphabet_char(i))
        .collect();

    let (stg, raw_to_shape) = hash_cons(slp);
    let num_shape = stg.num_rules();
    let num_raw = slp.num_rules();
    debug!(
        raw_rules = num_raw,
        shape_rules = num_shape,
        "hash-consed shape grammar"
    );

    let mut shape_lens = vec![0u64; num_shape];
    stg.expansion_lengths(&mut shape_lens);

    let mut distinct = shape_lens.clone();
    distinct.sort_unstable();
    distinct.dedup();
    let lengths = LengthHash::build(&distinct, &options.hash);
    debug!(
        distinct_lengths = distinct.len(),
        levels = lengths.num_levels(),
        "built length hash"
    );

    // Shape rules grouped by length id.
    let length_id: Vec<u64> = shape_lens.iter().map(|&len| lengths.get(len) as u64).collect();
    let mut shape_order: Vec<u32> = (0..num_shape as u32).collect();
    if options.freq_sort {
        sort_by_frequency(&stg, &mut shape_order);
    }
    shape_order.sort_by_key(|&r| length_id[r as usize]);
    let shape_part = GroupIndex::partition(&shape_order, |r| length_id[r as usize]);

    let mut shape_rank = vec![0u64; num_shape];
    for (pos, &rule) in shape_order.iter().enumerate() {
        shape_rank[rule as usize] = pos as u64;
    }

    // Label rules grouped by the position of their shape rule.
    let group_of_raw = |r: u32| shape_rank[raw_to_shape[r as usize] as usize];
    let mut label_order: Vec<u32> = (0..num_raw as u32).collect();
    if options.freq_sort {
        sort_by_frequency(slp, &mut label_order);
    }
    label_order.sort_by_key(|&r| group_of_raw(r));
    let label_part = GroupIndex::partition(&label_order, group_of_raw);
    debug!(
        shape_groups = shape_part.groups.num_groups(),
        label_groups = label_part.groups.num_groups(),
        "grouped rules"
    );

    let shape_child = |s: Symbol| match s {
        Symbol::Leaf(_) => 0,
        Symbol::Rule(id) => shape_part.local_offsets[id as usize],
    };
    let label_child = |s: Symbol| match s {
        Symbol::Leaf(c) => u64::from(c),
        Symbol::Rule(id) => label_part.local_offsets[id as usize],
    };

    let mut balance = Vec::with_capacity(num_shape);
    let mut shape_children = Vec::with_capacity(2 * num_shape);
    for &rule in &shape_order {
        let (left, right) = stg.rules()[rule as usize];
        balance.push(encode_balance(
            shape_lens[rule as usize],
            left.expansion_len(&shape_lens),
        ));
        shape_children.push(shape_child(left));
        shape_children.push(shape_child(right));
    }

    let mut label_children = Vec::with_capacity(2 * num_raw);
    for &rule in &label_order {
        label_children.push(label_child(slp.left(rule as usize)));
        label_children.push(label_child(slp.right(rule as usize)));
    }

    let seq_len = slp.sequence_len();
    let mut seq_lens = Vec::with_capacity(seq_len);
    let mut seq_shape = Vec::with_capacity(seq_len);
    let mut seq_label = Vec::with_capacity(seq_len);
    for i in 0..seq_len {
        let symbol = slp.sequence_at(i);
        let shape_symbol = match symbol {
            Symbol::Leaf(_) => Symbol::Leaf(0),
            Symbol::Rule(id) => Symbol::Rule(raw_to_shape[id as usize]),
        };
        seq_lens.push(shape_symbol.expansion_len(&shape_lens));
        seq_shape.push(shape_child(shape_symbol));
        seq_label.push(label_child(symbol));
    }

    for (name, values) in [
        ("balance", &balance),
        ("shape_children", &shape_children),
        ("label_children", &label_children),
        ("sequence_shape", &seq_shape),
        ("sequence_label", &seq_label),
    ] {
        trace!(
            array = name,
            values = values.len(),
            strict_bits = strict_bit_size(values),
            "encoded offsets"
        );
    }

    let index = ShapedSlp {
        alphabet,
        lengths,
        sequence: SequenceIndex::build(&seq_lens, &seq_shape, &seq_label),
        shape: RuleTable::new(Dac::build(&shape_children), shape_part.groups),
        label: RuleTable::new(Dac::build(&label_children), label_part.groups),
        balance: Dac::build(&balance),
    };
    info!(
        text_len = index.len(),
        sequence_len = seq_len,
        shape_rules = num_shape,
        label_rules = num_raw,
        heap_bytes = index.stats().sizes.total_bytes(),
        "built shaped SLP"
    );
    index
}

/// Collapses raw rules with identically shaped children into one shape rule.
///
/// Returns the shape grammar and the shape rule of every raw rule.
fn hash_cons<S: SlpSource + ?Sized>(slp: &S) -> (NaiveSlp, Vec<u32>) {
    let mut stg = NaiveSlp::new(vec![SHAPE_LEAF]);
    let mut raw_to_shape: Vec<u32> = Vec::with_capacity(slp.num_rules());
    let mut canonical: HashMap<(Symbol, Symbol), u32> = HashMap::default();

    for rule in 0..slp.num_rules() {
        let to_shape = |s: Symbol| match s {
            Symbol::Leaf(_) => Symbol::Leaf(0),
            Symbol::Rule(id) => Symbol::Rule(raw_to_shape[id as usize]),
        };
        let key = (to_shape(slp.left(rule)), to_shape(slp.right(rule)));
        let id = *canonical
            .entry(key)
            .or_insert_with(|| stg.push_rule(key.0, key.1));
        raw_to_shape.push(id);
    }
    (stg, raw_to_shape)
}

/// Stable sort of `order` by descending right-hand-side frequency.
fn sort_by_frequency<S: SlpSource + ?Sized>(grammar: &S, order: &mut [u32]) {
    let mut freq = vec![0u64; grammar.num_rules()];
    grammar.rule_frequencies(&mut freq);
    order.sort_by_key(|&r| Reverse(freq[r as usize]));
}

/// Bits needed to write every value in plain binary without padding.
fn strict_bit_size(values: &[u64]) -> u64 {
    values.iter().map(|&v| u64::from(64 - v.leading_zeros())).sum()
}
