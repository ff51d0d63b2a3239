//! Tokens handed from the lexer to the command parser.
//!
//! A script is reduced to two kinds of tokens: directives (command lines)
//! and paragraphs (narrative text). Each token keeps the 1-based line it
//! started on so errors can point back at the source.

use std::borrow::Cow;

/// Token discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A command line, with the marker already stripped.
    Directive,
    /// Narrative text.
    Paragraph,
}

impl TokenKind {
    /// Lower-case name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Directive => "directive",
            TokenKind::Paragraph => "paragraph",
        }
    }
}

/// A single token with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Directive or paragraph.
    pub kind: TokenKind,
    /// Raw payload. Borrowed from the input unless the lexer had to join lines.
    pub text: Cow<'a, str>,
    /// 1-based source line.
    pub line: u32,
}

impl<'a> Token<'a> {
    /// Create a directive token.
    #[inline]
    pub fn directive(text: impl Into<Cow<'a, str>>, line: u32) -> Self {
        Self {
            kind: TokenKind::Directive,
            text: text.into(),
            line,
        }
    }

    /// Create a paragraph token.
    #[inline]
    pub fn paragraph(text: impl Into<Cow<'a, str>>, line: u32) -> Self {
        Self {
            kind: TokenKind::Paragraph,
            text: text.into(),
            line,
        }
    }

    #[inline]
    pub fn is_directive(&self) -> bool {
        self.kind == TokenKind::Directive
    }

    #[inline]
    pub fn is_paragraph(&self) -> bool {
        self.kind == TokenKind::Paragraph
    }

    /// Detach the token from the input buffer.
    pub fn into_owned(self) -> Token<'static> {
        Token {
            kind: self.kind,
            text: Cow::Owned(self.text.into_owned()),
            line: self.line,
        }
    }
}
