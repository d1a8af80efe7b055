//! Random access by descent through the implicit derivation tree.
//!
//! A node is known by its expansion length and its local offsets in the shape and
//! label grammars. The length selects the shape group, the shape position selects
//! the label group, and the balance code of the shape rule gives the left child's
//! length. Both grammars are walked in lockstep.

use crate::index::ShapedSlp;
use crate::rules::decode_balance;
use crate::sequence::Node;

impl ShapedSlp {
    /// Returns the byte at `pos`.
    ///
    /// `pos` must be smaller than [`len`](Self::len); this is only checked in debug
    /// builds. Use [`get`](Self::get) for a checked variant.
    pub fn char_at(&self, pos: usize) -> u8 {
        debug_assert!(pos < self.len(), "position {pos} out of bounds for length {}", self.len());
        let (element, mut offset) = self.sequence.locate(pos as u64);
        let mut node = self.sequence.root(element);
        while node.len > 1 {
            let (left, right) = self.split(node);
            if offset < left.len {
                node = left;
            } else {
                offset -= left.len;
                node = right;
            }
        }
        self.leaf(node)
    }

    /// Writes the `out.len()` bytes starting at `pos` into `out`.
    ///
    /// Requires a non-empty `out` and `pos + out.len() <= len()`, checked only in
    /// debug builds. Use [`try_substr`](Self::try_substr) for a checked variant.
    pub fn expand_substr(&self, pos: usize, out: &mut [u8]) {
        debug_assert!(!out.is_empty(), "empty output buffer");
        debug_assert!(
            pos + out.len() <= self.len(),
            "range {pos}+{} out of bounds for length {}",
            out.len(),
            self.len()
        );
        let (mut element, offset) = self.sequence.locate(pos as u64);
        let root = self.sequence.root(element);
        let first = ((root.len - offset) as usize).min(out.len());
        let (head, mut rest) = out.split_at_mut(first);
        self.expand_from(offset, head, root);

        // The range continues into the following elements from their first byte.
        while !rest.is_empty() {
            element += 1;
            let node = self.sequence.root(element);
            let take = (node.len as usize).min(rest.len());
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(take);
            self.expand_prefix(head, node);
            rest = tail;
        }
    }

    /// Expands `out.len()` bytes of `node` starting at `offset` inside it.
    fn expand_from(&self, offset: u64, out: &mut [u8], node: Node) {
        debug_assert!(offset < node.len && out.len() as u64 <= node.len - offset);
        if node.len == 1 {
            out[0] = self.leaf(node);
            return;
        }
        let (left, right) = self.split(node);
        if offset < left.len {
            let in_left = ((left.len - offset) as usize).min(out.len());
            let (head, tail) = out.split_at_mut(in_left);
            self.expand_from(offset, head, left);
            if !tail.is_empty() {
                self.expand_prefix(tail, right);
            }
        } else {
            self.expand_from(offset - left.len, out, right);
        }
    }

    /// Expands the first `out.len()` bytes of `node`.
    pub(crate) fn expand_prefix(&self, out: &mut [u8], node: Node) {
        debug_assert!(!out.is_empty() && out.len() as u64 <= node.len);
        if node.len == 1 {
            out[0] = self.leaf(node);
            return;
        }
        let (left, right) = self.split(node);
        let in_left = (left.len as usize).min(out.len());
        let (head, tail) = out.split_at_mut(in_left);
        self.expand_prefix(head, left);
        if !tail.is_empty() {
            self.expand_prefix(tail, right);
        }
    }

    /// Resolves an internal node to its two children.
    #[inline]
    pub(crate) fn split(&self, node: Node) -> (Node, Node) {
        let group = self.lengths.get(node.len);
        let shape_id = self.shape.resolve(group, node.shape);
        let label_id = self.label.resolve(shape_id, node.label);
        let left_len = decode_balance(self.balance.get(shape_id), node.len);
        debug_assert!(0 < left_len && left_len < node.len, "corrupt balance code");

        let left = Node {
            len: left_len,
            shape: self.shape.left(shape_id),
            label: self.label.left(label_id),
        };
        let right = Node {
            len: node.len - left_len,
            shape: self.shape.right(shape_id),
            label: self.label.right(label_id),
        };
        (left, right)
    }

    #[inline]
    fn leaf(&self, node: Node) -> u8 {
        self.alphabet[node.label as usize]
    }
}

#[cfg(test)]
mod tests {
    use crate::slp::NaiveSlp;
    use crate::symbol::Symbol::{Leaf, Rule};
    use crate::ShapedSlp;

    /// rule0 = ab, rule1 = rule0 rule0, sequence = [rule1].
    fn abab() -> ShapedSlp {
        let mut slp = NaiveSlp::new(b"ab".to_vec());
        let r0 = slp.push_rule(Leaf(0), Leaf(1));
        let r1 = slp.push_rule(Rule(r0), Rule(r0));
        slp.push_sequence(Rule(r1));
        ShapedSlp::new(&slp)
    }

    #[test]
    fn test_abab_char_at() {
        let index = abab();
        assert_eq!(index.len(), 4);
        assert_eq!(index.char_at(0), b'a');
        assert_eq!(index.char_at(1), b'b');
        assert_eq!(index.char_at(2), b'a');
        assert_eq!(index.char_at(3), b'b');
    }

    #[test]
    fn test_abab_expand_substr() {
        let index = abab();
        let mut out = [0u8; 3];
        index.expand_substr(1, &mut out);
        assert_eq!(&out, b"bab");

        let mut all = [0u8; 4];
        index.expand_substr(0, &mut all);
        assert_eq!(&all, b"abab");
    }

    #[test]
    fn test_same_shape_different_labels() {
        // ab and ba share one shape rule but are distinct label rules.
        let mut slp = NaiveSlp::new(b"ab".to_vec());
        let ab = slp.push_rule(Leaf(0), Leaf(1));
        let ba = slp.push_rule(Leaf(1), Leaf(0));
        let abba = slp.push_rule(Rule(ab), Rule(ba));
        let baab = slp.push_rule(Rule(ba), Rule(ab));
        slp.push_sequence(Rule(abba));
        slp.push_sequence(Rule(baab));
        slp.push_sequence(Leaf(0));
        let index = ShapedSlp::new(&slp);

        assert_eq!(index.num_shape_rules(), 2);
        assert_eq!(index.num_label_rules(), 4);
        let text: Vec<u8> = (0..index.len()).map(|i| index.char_at(i)).collect();
        assert_eq!(text, b"abbabaaba");
    }

    #[test]
    fn test_substr_across_elements() {
        let mut slp = NaiveSlp::new(b"xyz".to_vec());
        let xy = slp.push_rule(Leaf(0), Leaf(1));
        let xyz = slp.push_rule(Rule(xy), Leaf(2));
        let zxyz = slp.push_rule(Leaf(2), Rule(xyz));
        slp.push_sequence(Rule(xyz));
        slp.push_sequence(Leaf(1));
        slp.push_sequence(Rule(zxyz));
        slp.push_sequence(Rule(xy));
        let index = ShapedSlp::new(&slp);
        let expected = slp.expand();
        assert_eq!(expected, b"xyzyzxyzxy");

        for pos in 0..expected.len() {
            for len in 1..=expected.len() - pos {
                let mut out = vec![0u8; len];
                index.expand_substr(pos, &mut out);
                assert_eq!(out, &expected[pos..pos + len], "pos {pos} len {len}");
            }
        }
    }

    #[test]
    fn test_unbalanced_chain() {
        // A left-deep comb: ((((a b) b) b) b) ...
        let mut slp = NaiveSlp::new(b"ab".to_vec());
        let mut top = slp.push_rule(Leaf(0), Leaf(1));
        for _ in 0..40 {
            top = slp.push_rule(Rule(top), Leaf(1));
        }
        slp.push_sequence(Rule(top));
        let index = ShapedSlp::new(&slp);

        assert_eq!(index.len(), 42);
        assert_eq!(index.char_at(0), b'a');
        assert!((1..42).all(|i| index.char_at(i) == b'b'));
    }
}
