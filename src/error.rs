//! Error types for loading, saving and checked queries.

use thiserror::Error;

/// Errors surfaced by the fallible parts of the index.
///
/// The hot-path queries (`char_at`, `expand_substr`) do not report errors; their
/// preconditions are checked with debug assertions only.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing the serialized form failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The serialized stream decoded to an impossible structure.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A checked query asked for a range outside the text.
    #[error("range {pos}..{pos}+{len} out of bounds for text of length {text_len}")]
    OutOfBounds {
        pos: usize,
        len: usize,
        text_len: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
