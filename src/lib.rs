//! # Shaped SLP - Grammar-Compressed Random Access
//!
//! A succinct encoding of a straight-line program (SLP) that answers random access
//! and substring queries without decompressing the text.
//!
//! The grammar is factored into two grammars:
//! 1. **Shape grammar**: the tree topology only. Rules whose children have the same
//!    shapes are merged, and rules are grouped by expansion length.
//! 2. **Label grammar**: the original rules, grouped by the position of their shape
//!    rule.
//!
//! A rule is then addressed by a small offset inside its group. The group itself is
//! implied during descent: the expansion length selects the shape group through a
//! minimal perfect hash, and the shape rule selects the label group.
//!
//! ## Example
//!
//! ```
//! use shaped_slp::{NaiveSlp, ShapedSlp, Symbol};
//!
//! // rule0 = ab, rule1 = rule0 rule0
//! let mut slp = NaiveSlp::new(b"ab".to_vec());
//! let r0 = slp.push_rule(Symbol::Leaf(0), Symbol::Leaf(1));
//! let r1 = slp.push_rule(Symbol::Rule(r0), Symbol::Rule(r0));
//! slp.push_sequence(Symbol::Rule(r1));
//!
//! let index = ShapedSlp::new(&slp);
//! assert_eq!(index.char_at(0), b'a');
//! assert_eq!(index.substr(1, 3), b"bab");
//!
//! let bytes = index.to_bytes();
//! let loaded = ShapedSlp::from_bytes(&bytes).unwrap();
//! assert_eq!(loaded.iter().collect::<Vec<u8>>(), b"abab");
//! ```
//!
//! ## Performance
//!
//! - Queries cost O(height of the derivation tree); the index inherits whatever
//!   balance the input grammar has
//! - Rule references cost about log(group size) bits instead of log(rules)

mod bitvec;
mod dac;
mod elias_fano;
mod error;
mod group;
mod index;
mod iter;
mod mph;
mod navigate;
mod packed;
mod persist;
mod rules;
mod sequence;
mod shaping;
mod slp;
mod symbol;

#[cfg(test)]
mod tests;

pub use bitvec::{BitVecBuilder, BitVector};
pub use error::{Error, Result};
pub use index::{ComponentSizes, IndexStats, ShapedSlp};
pub use iter::TextIter;
pub use mph::HashConfig;
pub use rules::{decode_balance, encode_balance};
pub use shaping::ShapeOptions;
pub use slp::{NaiveSlp, SlpSource};
pub use symbol::Symbol;
