//! Rule tables of the shape and label grammars, and the balance code.
//!
//! A table stores two child offsets per rule, in group order. A child offset is a
//! leaf id or the local offset of the child rule inside its own group; which group
//! that is follows from the child's length (shape) or the child's shape position
//! (label), both of which the caller knows during descent. Expansion lengths are
//! never stored: the shape grammar keeps one balance code per rule instead, and the
//! left child's length is decoded from the parent's.

use crate::dac::Dac;
use crate::group::GroupIndex;

/// Encodes the split of a rule of length `parent_len` whose left child has length
/// `left_len`, as a zigzag distance from the even split.
///
/// Near-balanced splits give small codes.
#[inline]
pub fn encode_balance(parent_len: u64, left_len: u64) -> u64 {
    let half = parent_len / 2;
    if half <= left_len {
        (left_len - half) << 1
    } else {
        ((half - left_len) << 1) | 1
    }
}

/// Inverse of [`encode_balance`]: the left child's length.
#[inline]
pub fn decode_balance(code: u64, parent_len: u64) -> u64 {
    let half = parent_len / 2;
    if code & 1 == 0 {
        half + (code >> 1)
    } else {
        half - (code >> 1)
    }
}

/// One grammar's rules in group order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RuleTable {
    children: Dac,
    groups: GroupIndex,
}

impl RuleTable {
    /// `children` holds `2 * groups.num_rules()` offsets, left then right, per rule.
    pub(crate) fn new(children: Dac, groups: GroupIndex) -> Self {
        debug_assert_eq!(children.len(), 2 * groups.num_rules());
        Self { children, groups }
    }

    pub(crate) fn num_rules(&self) -> usize {
        self.groups.num_rules()
    }

    pub(crate) fn groups(&self) -> &GroupIndex {
        &self.groups
    }

    pub(crate) fn children(&self) -> &Dac {
        &self.children
    }

    /// Global position of the rule at `local` in `group`.
    #[inline]
    pub(crate) fn resolve(&self, group: usize, local: u64) -> usize {
        self.groups.resolve(group, local)
    }

    #[inline]
    pub(crate) fn left(&self, rule: usize) -> u64 {
        self.children.get(2 * rule)
    }

    #[inline]
    pub(crate) fn right(&self, rule: usize) -> u64 {
        self.children.get(2 * rule + 1)
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.children.heap_bytes() + self.groups.heap_bytes()
    }
}
