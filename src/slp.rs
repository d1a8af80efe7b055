//! Raw straight-line programs handed over by an upstream grammar builder.
//!
//! The index only reads grammars through [`SlpSource`]. [`NaiveSlp`] is a plain
//! in-memory implementation for callers that already hold the rules as arrays.

use crate::symbol::Symbol;

/// Read-only view of a binary straight-line program.
///
/// Rules must be topologically ordered: the children of rule `i` are leaves or rules
/// with index `< i`. Nothing checks this beyond debug assertions.
pub trait SlpSource {
    /// Number of leaf symbols.
    fn alphabet_size(&self) -> usize;

    /// Byte labelling leaf `i`.
    fn alphabet_char(&self, i: usize) -> u8;

    fn num_rules(&self) -> usize;

    fn left(&self, rule: usize) -> Symbol;

    fn right(&self, rule: usize) -> Symbol;

    /// Number of symbols in the top-level sequence.
    fn sequence_len(&self) -> usize;

    fn sequence_at(&self, i: usize) -> Symbol;

    /// Writes the expansion length of every rule into `out`.
    fn expansion_lengths(&self, out: &mut [u64]) {
        debug_assert_eq!(out.len(), self.num_rules());
        for rule in 0..self.num_rules() {
            let left = self.left(rule);
            let right = self.right(rule);
            debug_assert!(left.rule().map_or(true, |c| c < rule), "rule {rule} is not topological");
            debug_assert!(right.rule().map_or(true, |c| c < rule), "rule {rule} is not topological");
            let len = left.expansion_len(out) + right.expansion_len(out);
            out[rule] = len;
        }
    }

    /// Counts how often each rule occurs on the right-hand side of another rule.
    fn rule_frequencies(&self, out: &mut [u64]) {
        debug_assert_eq!(out.len(), self.num_rules());
        out.fill(0);
        for rule in 0..self.num_rules() {
            for child in [self.left(rule), self.right(rule)] {
                if let Some(id) = child.rule() {
                    out[id] += 1;
                }
            }
        }
    }
}

/// A straight-line program stored as flat arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NaiveSlp {
    alphabet: Vec<u8>,
    rules: Vec<(Symbol, Symbol)>,
    sequence: Vec<Symbol>,
}

impl NaiveSlp {
    /// Creates a grammar over `alphabet` with no rules and an empty sequence.
    pub fn new(alphabet: Vec<u8>) -> Self {
        Self {
            alphabet,
            rules: Vec::new(),
            sequence: Vec::new(),
        }
    }

    /// Appends the rule `left right` and returns its index.
    pub fn push_rule(&mut self, left: Symbol, right: Symbol) -> u32 {
        let id = self.rules.len();
        debug_assert!(self.is_valid_child(left, id), "left child {left:?} of rule {id}");
        debug_assert!(self.is_valid_child(right, id), "right child {right:?} of rule {id}");
        self.rules.push((left, right));
        id as u32
    }

    /// Appends a symbol to the top-level sequence.
    pub fn push_sequence(&mut self, symbol: Symbol) {
        debug_assert!(self.is_valid_child(symbol, self.rules.len()));
        self.sequence.push(symbol);
    }

    pub fn rules(&self) -> &[(Symbol, Symbol)] {
        &self.rules
    }

    pub fn sequence(&self) -> &[Symbol] {
        &self.sequence
    }

    /// Length of the derived text.
    pub fn len(&self) -> u64 {
        let mut lens = vec![0; self.rules.len()];
        self.expansion_lengths(&mut lens);
        self.sequence.iter().map(|s| s.expansion_len(&lens)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fully decompresses the text.
    pub fn expand(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        for &symbol in self.sequence.iter().rev() {
            stack.push(symbol);
            while let Some(top) = stack.pop() {
                match top {
                    Symbol::Leaf(c) => out.push(self.alphabet[c as usize]),
                    Symbol::Rule(id) => {
                        let (left, right) = self.rules[id as usize];
                        stack.push(right);
                        stack.push(left);
                    }
                }
            }
        }
        out
    }

    /// Height of the tallest derivation tree of any sequence element.
    ///
    /// Leaves have height 0.
    pub fn height(&self) -> usize {
        let mut heights = vec![0usize; self.rules.len()];
        let height_of = |s: Symbol, heights: &[usize]| match s {
            Symbol::Leaf(_) => 0,
            Symbol::Rule(id) => heights[id as usize],
        };
        for (i, &(left, right)) in self.rules.iter().enumerate() {
            let h = 1 + height_of(left, &heights).max(height_of(right, &heights));
            heights[i] = h;
        }
        self.sequence
            .iter()
            .map(|&s| height_of(s, &heights))
            .max()
            .unwrap_or(0)
    }

    fn is_valid_child(&self, symbol: Symbol, parent: usize) -> bool {
        match symbol {
            Symbol::Leaf(c) => (c as usize) < self.alphabet.len(),
            Symbol::Rule(id) => (id as usize) < parent,
        }
    }
}

impl SlpSource for NaiveSlp {
    fn alphabet_size(&self) -> usize {
        self.alphabet.len()
    }

    fn alphabet_char(&self, i: usize) -> u8 {
        self.alphabet[i]
    }

    fn num_rules(&self) -> usize {
        self.rules.len()
    }

    fn left(&self, rule: usize) -> Symbol {
        self.rules[rule].0
    }

    fn right(&self, rule: usize) -> Symbol {
        self.rules[rule].1
    }

    fn sequence_len(&self) -> usize {
        self.sequence.len()
    }

    fn sequence_at(&self, i: usize) -> Symbol {
        self.sequence[i]
    }
}
