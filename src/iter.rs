use crate::index::ShapedSlp;

/// Bytes expanded per refill.
const WINDOW: usize = 4096;

/// Iterator over the text of a [`ShapedSlp`].
///
/// Expands fixed-size windows with `expand_substr` instead of descending once
/// per byte.
pub struct TextIter<'a> {
    index: &'a ShapedSlp,
    /// Text position of `buf[0]`
    start: usize,
    buf: Vec<u8>,
    cursor: usize,
}

impl<'a> TextIter<'a> {
    pub(crate) fn new(index: &'a ShapedSlp, pos: usize) -> Self {
        Self {
            index,
            start: pos.min(index.len()),
            buf: Vec::new(),
            cursor: 0,
        }
    }

    /// Text position of the next byte.
    pub fn position(&self) -> usize {
        self.start + self.cursor
    }

    fn refill(&mut self) -> bool {
        self.start += self.buf.len();
        self.cursor = 0;
        let len = WINDOW.min(self.index.len() - self.start);
        self.buf.resize(len, 0);
        if len > 0 {
            self.index.expand_substr(self.start, &mut self.buf);
        }
        len > 0
    }
}

impl Iterator for TextIter<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.cursor == self.buf.len() && !self.refill() {
            return None;
        }
        let byte = self.buf[self.cursor];
        self.cursor += 1;
        Some(byte)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.index.len() - self.position();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TextIter<'_> {}
