use super::{block_grammar, Layout};
use crate::rules::{decode_balance, encode_balance};
use crate::sequence::Node;
use crate::shaping::ShapeOptions;
use crate::slp::NaiveSlp;
use crate::ShapedSlp;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn layout() -> impl Strategy<Value = Layout> {
    prop_oneof![Just(Layout::Balanced), Just(Layout::Comb)]
}

/// Small alphabets make shared rules and shared shapes likely.
fn text() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"abcd".to_vec()), 0..300)
}

/// Walks every node reachable from the sequence roots, recording the global shape
/// and label position each internal node resolves to, and the text below it.
fn collect_positions(
    index: &ShapedSlp,
    node: Node,
    shapes: &mut HashMap<usize, u64>,
    labels: &mut HashMap<usize, Vec<u8>>,
) {
    if node.len == 1 {
        return;
    }
    let group = index.lengths.get(node.len);
    let shape_id = index.shape.resolve(group, node.shape);
    let label_id = index.label.resolve(shape_id, node.label);

    let mut expanded = vec![0u8; node.len as usize];
    index.expand_prefix(&mut expanded, node);
    if let Some(seen) = labels.insert(label_id, expanded.clone()) {
        assert_eq!(seen, expanded, "label position {label_id} shared by two texts");
        return;
    }
    if let Some(len) = shapes.insert(shape_id, node.len) {
        assert_eq!(len, node.len, "shape position {shape_id} shared by two lengths");
    }

    let (left, right) = index.split(node);
    collect_positions(index, left, shapes, labels);
    collect_positions(index, right, shapes, labels);
}

proptest! {
    /// Every position agrees with the naive expansion of the grammar.
    #[test]
    fn prop_char_at_matches_expansion(input in text(), block in 1usize..40, layout in layout()) {
        let slp = block_grammar(&input, block, layout);
        let index = ShapedSlp::new(&slp);

        prop_assert_eq!(index.len(), input.len());
        for (pos, &byte) in input.iter().enumerate() {
            prop_assert_eq!(index.char_at(pos), byte, "position {}", pos);
        }
    }

    /// Substrings agree with slices of the naive expansion.
    #[test]
    fn prop_substr_matches_expansion(
        input in text(),
        block in 1usize..40,
        layout in layout(),
        cuts in prop::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>()), 1..20),
    ) {
        prop_assume!(!input.is_empty());
        let slp = block_grammar(&input, block, layout);
        let index = ShapedSlp::new(&slp);

        for (start, span) in cuts {
            let pos = start.index(input.len());
            let len = span.index(input.len() - pos) + 1;
            prop_assert_eq!(index.substr(pos, len), &input[pos..pos + len]);
        }
    }

    /// A range over two elements equals the two per-element pieces concatenated.
    #[test]
    fn prop_substr_across_boundary(input in text(), block in 1usize..20, cut in any::<prop::sample::Index>()) {
        let slp = block_grammar(&input, block, Layout::Balanced);
        prop_assume!(slp.sequence().len() >= 2);
        let index = ShapedSlp::new(&slp);

        let boundary = block * (1 + cut.index(slp.sequence().len() - 1));
        let pos = boundary - 1;
        let len = (block + 1).min(input.len() - pos);
        let mut joined = index.substr(pos, 1);
        joined.extend(index.substr(boundary, len - 1));
        prop_assert_eq!(index.substr(pos, len), joined);
    }

    /// Building without the frequency sort changes the layout, not the text.
    #[test]
    fn prop_freq_sort_is_layout_only(input in text(), block in 1usize..40, layout in layout()) {
        let slp = block_grammar(&input, block, layout);
        let sorted = ShapedSlp::new(&slp);
        let unsorted = ShapedSlp::with_options(&slp, &ShapeOptions::default().freq_sort(false));

        prop_assert_eq!(sorted.iter().collect::<Vec<u8>>(), input.clone());
        prop_assert_eq!(unsorted.iter().collect::<Vec<u8>>(), input);
        prop_assert_eq!(sorted.num_shape_rules(), unsorted.num_shape_rules());
    }

    /// Saving and loading preserves the structure and every query.
    #[test]
    fn prop_save_load_roundtrip(input in text(), block in 1usize..40, layout in layout()) {
        let slp = block_grammar(&input, block, layout);
        let index = ShapedSlp::new(&slp);
        let loaded = ShapedSlp::from_bytes(&index.to_bytes()).unwrap();

        prop_assert_eq!(&loaded, &index);
        for pos in 0..input.len() {
            prop_assert_eq!(loaded.char_at(pos), index.char_at(pos));
        }
        prop_assert_eq!(loaded.iter().collect::<Vec<u8>>(), input);
    }

    /// Building twice yields byte-identical serialized output.
    #[test]
    fn prop_construction_deterministic(input in text(), block in 1usize..40, layout in layout()) {
        let slp = block_grammar(&input, block, layout);
        prop_assert_eq!(ShapedSlp::new(&slp).to_bytes(), ShapedSlp::new(&slp).to_bytes());
    }

    /// Group base plus local offset hits every shape and label position exactly once.
    #[test]
    fn prop_group_positions_are_bijective(input in text(), block in 1usize..40, layout in layout()) {
        let slp = block_grammar(&input, block, layout);
        let index = ShapedSlp::new(&slp);

        let mut shapes = HashMap::new();
        let mut labels = HashMap::new();
        for element in 0..index.sequence_len() {
            collect_positions(&index, index.sequence.root(element), &mut shapes, &mut labels);
        }
        // Every rule of the block grammar is reachable.
        let shape_ids: HashSet<usize> = shapes.keys().copied().collect();
        let label_ids: HashSet<usize> = labels.keys().copied().collect();
        prop_assert_eq!(shape_ids, (0..index.num_shape_rules()).collect::<HashSet<_>>());
        prop_assert_eq!(label_ids, (0..index.num_label_rules()).collect::<HashSet<_>>());
    }

    /// Decoding a balance code recovers the left length.
    #[test]
    fn prop_balance_invertible(parent in 2u64..u64::MAX, left in any::<u64>()) {
        let left = 1 + left % (parent - 1);
        prop_assert_eq!(decode_balance(encode_balance(parent, left), parent), left);
    }
}

/// Fuzz test: arbitrary text through a block grammar reads back unchanged.
#[test]
fn fuzz_arbitrary_text() {
    bolero::check!()
        .with_type::<(Vec<u8>, u8)>()
        .for_each(|(input, block)| {
            let block = usize::from(*block).max(1);
            let slp = block_grammar(input, block, Layout::Balanced);
            let index = ShapedSlp::new(&slp);

            assert_eq!(index.len(), input.len());
            let text: Vec<u8> = index.iter().collect();
            assert_eq!(text, *input);
            if let Some(last) = input.len().checked_sub(1) {
                assert_eq!(index.char_at(last), input[last]);
            }
        });
}

/// Fuzz test: balance codes invert for any valid split.
#[test]
fn fuzz_balance_codes() {
    bolero::check!()
        .with_type::<(u64, u64)>()
        .for_each(|&(parent, left)| {
            if parent < 2 {
                return;
            }
            let left = 1 + left % (parent - 1);
            assert_eq!(decode_balance(encode_balance(parent, left), parent), left);
        });
}

#[test]
fn test_abab_scenario() {
    use crate::symbol::Symbol::{Leaf, Rule};

    let mut slp = NaiveSlp::new(b"ab".to_vec());
    let r0 = slp.push_rule(Leaf(0), Leaf(1));
    let r1 = slp.push_rule(Rule(r0), Rule(r0));
    slp.push_sequence(Rule(r1));
    let index = ShapedSlp::new(&slp);

    assert_eq!(index.char_at(0), b'a');
    assert_eq!(index.char_at(2), b'a');
    assert_eq!(index.substr(1, 3), b"bab");
}
