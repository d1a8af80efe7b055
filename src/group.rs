//! Contiguous rule groups addressed by (group id, local offset).
//!
//! Rules are laid out sorted by a group key. A boundary bit marks the last rule of
//! every group, so the first position of group `g` is one past the `(g - 1)`-th
//! boundary. A rule's global position is that base plus its local offset.

use crate::bitvec::{BitVecBuilder, BitVector};
use crate::error::Result;
use crate::persist::Persist;
use std::io::{Read, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GroupIndex {
    boundaries: BitVector,
}

/// Result of laying rules out in group order.
#[derive(Debug, Clone)]
pub(crate) struct Partition {
    pub(crate) groups: GroupIndex,
    /// Local offset of every rule, indexed by the rule's original id.
    pub(crate) local_offsets: Vec<u64>,
}

impl GroupIndex {
    /// Partitions rules already arranged in `order` into runs of equal `key`.
    ///
    /// `order` must list every rule exactly once, with equal keys adjacent.
    pub(crate) fn partition(order: &[u32], key: impl Fn(u32) -> u64) -> Partition {
        let mut boundaries = BitVecBuilder::with_len(order.len());
        let mut local_offsets = vec![0u64; order.len()];
        let mut offset = 0;
        for (pos, &rule) in order.iter().enumerate() {
            local_offsets[rule as usize] = offset;
            let last = match order.get(pos + 1) {
                Some(&next) => key(next) != key(rule),
                None => true,
            };
            if last {
                boundaries.set(pos);
                offset = 0;
            } else {
                offset += 1;
            }
        }
        Partition {
            groups: GroupIndex {
                boundaries: boundaries.build(),
            },
            local_offsets,
        }
    }

    /// Number of rules over all groups.
    pub(crate) fn num_rules(&self) -> usize {
        self.boundaries.len()
    }

    pub(crate) fn num_groups(&self) -> usize {
        self.boundaries.count_ones()
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.boundaries.heap_bytes()
    }

    /// Number of rules in the groups before `group`.
    #[inline]
    pub(crate) fn base_offset(&self, group: usize) -> usize {
        if group == 0 {
            return 0;
        }
        debug_assert!(group < self.num_groups(), "group {group} out of range");
        self.boundaries
            .select1(group - 1)
            .map_or(self.boundaries.len(), |prev_last| prev_last + 1)
    }

    /// Global position of the rule at `local` inside `group`.
    #[inline]
    pub(crate) fn resolve(&self, group: usize, local: u64) -> usize {
        let pos = self.base_offset(group) + local as usize;
        debug_assert!(pos < self.num_rules(), "local offset {local} overflows group {group}");
        pos
    }

    /// Group containing global position `pos`.
    #[cfg(test)]
    pub(crate) fn group_of(&self, pos: usize) -> usize {
        self.boundaries.rank1(pos)
    }
}

impl Persist for GroupIndex {
    fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        self.boundaries.write_to(w)
    }

    fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            boundaries: BitVector::read_from(r)?,
        })
    }
}
