mod properties;

use crate::slp::NaiveSlp;
use crate::symbol::Symbol;
use ahash::AHashMap as HashMap;

/// How each block of text is turned into a derivation tree.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Layout {
    /// Pair adjacent symbols level by level.
    Balanced,
    /// Fold symbols left to right into a left-deep comb.
    Comb,
}

/// Builds an SLP for `text`: one top-level element per `block` bytes, identical
/// pairs shared across all blocks.
pub(crate) fn block_grammar(text: &[u8], block: usize, layout: Layout) -> NaiveSlp {
    let mut alphabet = text.to_vec();
    alphabet.sort_unstable();
    alphabet.dedup();

    let mut slp = NaiveSlp::new(alphabet.clone());
    let mut pairs: HashMap<(Symbol, Symbol), u32> = HashMap::default();
    let mut pair = |slp: &mut NaiveSlp, left: Symbol, right: Symbol| {
        Symbol::Rule(*pairs
            .entry((left, right))
            .or_insert_with(|| slp.push_rule(left, right)))
    };

    for chunk in text.chunks(block.max(1)) {
        let mut level: Vec<Symbol> = chunk
            .iter()
            .map(|c| Symbol::Leaf(alphabet.binary_search(c).unwrap() as u32))
            .collect();
        match layout {
            Layout::Balanced => {
                while level.len() > 1 {
                    let mut next = Vec::with_capacity(level.len().div_ceil(2));
                    for two in level.chunks(2) {
                        next.push(match *two {
                            [left, right] => pair(&mut slp, left, right),
                            [single] => single,
                            _ => unreachable!(),
                        });
                    }
                    level = next;
                }
                slp.push_sequence(level[0]);
            }
            Layout::Comb => {
                let mut acc = level[0];
                for &symbol in &level[1..] {
                    acc = pair(&mut slp, acc, symbol);
                }
                slp.push_sequence(acc);
            }
        }
    }
    slp
}

#[test]
fn test_block_grammar_expands_to_text() {
    let text = b"abracadabra abracadabra";
    for layout in [Layout::Balanced, Layout::Comb] {
        for block in [1, 3, 8, 100] {
            let slp = block_grammar(text, block, layout);
            assert_eq!(slp.expand(), text, "{layout:?} block {block}");
            assert_eq!(slp.sequence().len(), text.len().div_ceil(block));
        }
    }
}
