use std::ops::Range;

/// One source line, without its line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Byte offset of the first character in the whole source.
    pub start: usize,
    pub text: &'a str,
}

impl<'a> Line<'a> {
    pub fn trimmed(&self) -> &'a str {
        self.text.trim()
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.start + self.text.len()
    }
}

/// Split source text into lines, keeping byte offsets. A trailing `\r` is dropped.
pub fn split_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (idx, raw) in source.split('\n').enumerate() {
        let text = raw.strip_suffix('\r').unwrap_or(raw);
        lines.push(Line {
            number: idx + 1,
            start,
            text,
        });
        start += raw.len() + 1;
    }
    lines
}

/// The position of a parse within its line sequence.
///
/// Every builder receives the cursor parked on its header line and returns
/// with it parked on its own closing line; the caller then steps past it.
/// A cursor belongs to exactly one parse call.
#[derive(Debug)]
pub struct LineCursor<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(source: &'a str) -> Self {
        LineCursor {
            lines: split_lines(source),
            pos: 0,
        }
    }

    /// The line the cursor is parked on, if any.
    pub fn current(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    /// Step to the next line and return it, or `None` at end of input.
    pub fn advance(&mut self) -> Option<Line<'a>> {
        if self.pos < self.lines.len() {
            self.pos += 1;
        }
        self.current()
    }
}
