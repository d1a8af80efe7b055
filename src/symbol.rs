/// A child reference inside a straight-line program.
///
/// Leaves index the alphabet; rules index the grammar's rule list. A rule may only
/// reference rules with strictly smaller indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// Alphabet entry
    Leaf(u32),
    /// Reference to an earlier rule
    Rule(u32),
}

impl Symbol {
    /// Returns true for alphabet entries.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Symbol::Leaf(_))
    }

    /// Returns the rule index, if this is a rule reference.
    pub fn rule(&self) -> Option<usize> {
        match *self {
            Symbol::Rule(id) => Some(id as usize),
            Symbol::Leaf(_) => None,
        }
    }

    /// Expansion length of this symbol, given the lengths of all rules.
    #[inline]
    pub(crate) fn expansion_len(&self, rule_lens: &[u64]) -> u64 {
        match *self {
            Symbol::Leaf(_) => 1,
            Symbol::Rule(id) => rule_lens[id as usize],
        }
    }
}
