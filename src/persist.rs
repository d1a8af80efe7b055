//! Little-endian binary helpers shared by every serialized container.

use crate::error::{Error, Result};
use std::io::{Read, Write};

/// Upper bound on speculative allocation while reading a length-prefixed array.
///
/// Larger arrays still load; they just grow as words arrive instead of trusting the prefix.
const MAX_PREALLOC: usize = 1 << 16;

/// A container with a self-contained binary form.
pub(crate) trait Persist: Sized {
    fn write_to<W: Write>(&self, w: &mut W) -> Result<()>;
    fn read_from<R: Read>(r: &mut R) -> Result<Self>;
}

pub(crate) fn write_u64<W: Write>(w: &mut W, value: u64) -> Result<()> {
    w.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn read_u64<R: Read>(r: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub(crate) fn read_usize<R: Read>(r: &mut R) -> Result<usize> {
    let value = read_u64(r)?;
    usize::try_from(value)
        .map_err(|_| Error::InvalidEncoding(format!("length {value} does not fit in usize")))
}

/// Writes a length prefix followed by the words.
pub(crate) fn write_words<W: Write>(w: &mut W, words: &[u64]) -> Result<()> {
    write_u64(w, words.len() as u64)?;
    for &word in words {
        write_u64(w, word)?;
    }
    Ok(())
}

pub(crate) fn read_words<R: Read>(r: &mut R) -> Result<Vec<u64>> {
    let len = read_usize(r)?;
    let mut words = Vec::with_capacity(len.min(MAX_PREALLOC));
    for _ in 0..len {
        words.push(read_u64(r)?);
    }
    Ok(words)
}

pub(crate) fn write_u32s<W: Write>(w: &mut W, values: &[u32]) -> Result<()> {
    write_u64(w, values.len() as u64)?;
    for &value in values {
        w.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

pub(crate) fn read_u32s<R: Read>(r: &mut R) -> Result<Vec<u32>> {
    let len = read_usize(r)?;
    let mut values = Vec::with_capacity(len.min(MAX_PREALLOC));
    let mut buf = [0u8; 4];
    for _ in 0..len {
        r.read_exact(&mut buf)?;
        values.push(u32::from_le_bytes(buf));
    }
    Ok(values)
}

/// Writes a length prefix followed by the raw bytes.
pub(crate) fn write_bytes<W: Write>(w: &mut W, bytes: &[u8]) -> Result<()> {
    write_u64(w, bytes.len() as u64)?;
    w.write_all(bytes)?;
    Ok(())
}

pub(crate) fn read_bytes<R: Read>(r: &mut R) -> Result<Vec<u8>> {
    let len = read_usize(r)?;
    let mut bytes = Vec::with_capacity(len.min(MAX_PREALLOC));
    let read = r.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if read != len {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "byte array truncated",
        )));
    }
    Ok(bytes)
}
