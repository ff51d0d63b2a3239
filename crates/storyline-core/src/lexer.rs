//! Line lexer producing the directive/paragraph token stream.
//!
//! Lines are scanned with `memchr`. A line whose first non-whitespace
//! characters are the directive marker (`//` by default) becomes a
//! directive token; runs of other non-blank lines become one paragraph
//! token. Blank lines only separate paragraphs.

use std::borrow::Cow;

use memchr::memchr;

use crate::token::Token;

/// Marker that introduces a directive line.
pub const DEFAULT_MARKER: &str = "//";

/// A single physical line with its 1-based number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Line<'a> {
    text: &'a str,
    number: u32,
}

impl<'a> Line<'a> {
    #[inline(always)]
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Streaming lexer over a script.
///
/// Yields tokens through [`Iterator`]; [`Lexer::tokenize`] collects them.
/// Lexing cannot fail: every line is either blank, a directive or text.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    /// Current byte offset.
    offset: usize,
    /// Number of the next line to be read.
    line: u32,
    marker: &'a str,
    peeked: Option<Line<'a>>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer using [`DEFAULT_MARKER`].
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            offset: 0,
            line: 1,
            marker: DEFAULT_MARKER,
            peeked: None,
        }
    }

    /// Use a different directive marker.
    ///
    /// An empty marker falls back to [`DEFAULT_MARKER`], since it would turn
    /// every line into a directive.
    pub fn with_marker(mut self, marker: &'a str) -> Self {
        self.marker = if marker.is_empty() {
            DEFAULT_MARKER
        } else {
            marker
        };
        self
    }

    /// Consume the whole input.
    pub fn tokenize(self) -> Vec<Token<'a>> {
        self.collect()
    }

    /// Directive payload of `line`, if it is a directive.
    #[inline]
    fn directive_payload(&self, line: Line<'a>) -> Option<&'a str> {
        line.text
            .trim_start()
            .strip_prefix(self.marker)
            .map(str::trim)
    }

    #[inline]
    fn peek_line(&mut self) -> Option<Line<'a>> {
        if self.peeked.is_none() {
            self.peeked = self.read_line();
        }
        self.peeked
    }

    #[inline]
    fn next_line(&mut self) -> Option<Line<'a>> {
        if let Some(line) = self.peeked.take() {
            return Some(line);
        }
        self.read_line()
    }

    /// Consume the next line only if it continues the current paragraph.
    fn next_text_line(&mut self) -> Option<Line<'a>> {
        let line = self.peek_line()?;
        if line.is_blank() || self.directive_payload(line).is_some() {
            return None;
        }
        self.peeked = None;
        Some(line)
    }

    fn read_line(&mut self) -> Option<Line<'a>> {
        if self.offset >= self.bytes.len() {
            return None;
        }

        let start = self.offset;
        let end = match memchr(b'\n', &self.bytes[start..]) {
            Some(pos) => start + pos,
            None => self.bytes.len(),
        };

        // CRLF
        let text_end = if end > start && self.bytes[end - 1] == b'\r' {
            end - 1
        } else {
            end
        };

        self.offset = if end < self.bytes.len() { end + 1 } else { end };

        let number = self.line;
        self.line += 1;

        // `\n` and `\r` are ASCII, so both bounds sit on char boundaries.
        Some(Line {
            text: &self.input[start..text_end],
            number,
        })
    }

    fn read_paragraph(&mut self, first: Line<'a>) -> Token<'a> {
        let head = first.text.trim();
        let mut joined: Option<String> = None;

        while let Some(line) = self.next_text_line() {
            let text = joined.get_or_insert_with(|| head.to_string());
            text.push('\n');
            text.push_str(line.text.trim());
        }

        let text = match joined {
            Some(text) => Cow::Owned(text),
            None => Cow::Borrowed(head),
        };
        Token::paragraph(text, first.number)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let line = self.next_line()?;
            if line.is_blank() {
                continue;
            }
            if let Some(payload) = self.directive_payload(line) {
                return Some(Token::directive(payload, line.number));
            }
            return Some(self.read_paragraph(line));
        }
    }
}
