//! Parse errors.
//!
//! Parsing is fail-fast: the first violation is returned as a single
//! [`ParseError`] carrying the offending token (when there is one) and the
//! scope the parser was in, recorded by id rather than by reference.

use std::fmt;

use thiserror::Error;

use crate::token::{Token, TokenKind};

/// Error kinds for categorizing parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// No tokens at all.
    EmptyInput,
    /// Input ended, or content appeared, without a `book` directive.
    MissingBook,
    /// A second `book` directive.
    DuplicateBook,
    /// A directive or text appeared before the scope it needs
    /// (chapter before book, text before section, ...).
    OutOfOrder,
    /// `if` inside an open `if`, or `else`/`endif` without one.
    UnbalancedConditional,
    /// An `if` still open at a chapter/section boundary or end of input.
    UnclosedConditional,
    /// `book`/`chapter`/`section` not followed by a paragraph.
    MissingTitle,
    /// A required positional field is absent.
    MissingArgument,
    /// Command name outside the vocabulary.
    UnknownDirective,
}

impl ParseErrorKind {
    /// Ordering and balance violations, as opposed to input-level failures.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            ParseErrorKind::DuplicateBook
                | ParseErrorKind::OutOfOrder
                | ParseErrorKind::UnbalancedConditional
                | ParseErrorKind::UnclosedConditional
        )
    }
}

/// Owned snapshot of the token an error points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
}

impl From<&Token<'_>> for TokenInfo {
    fn from(token: &Token<'_>) -> Self {
        Self {
            kind: token.kind,
            text: token.text.to_string(),
            line: token.line,
        }
    }
}

/// Where in the partially built tree the parser was.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scope {
    pub chapter: Option<String>,
    pub section: Option<String>,
    /// Condition of the open `if`.
    pub condition: Option<String>,
}

impl Scope {
    pub fn is_empty(&self) -> bool {
        self.chapter.is_none() && self.section.is_none() && self.condition.is_none()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            self.chapter.as_ref().map(|id| format!("chapter `{id}`")),
            self.section.as_ref().map(|id| format!("section `{id}`")),
            self.condition.as_ref().map(|cond| format!("if `{cond}`")),
        ];
        let parts: Vec<String> = parts.into_iter().flatten().collect();
        f.write_str(&parts.join(", "))
    }
}

/// A fatal parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{}{}", line_prefix(.token), .message, scope_suffix(.scope))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Offending token; `None` for end-of-input conditions.
    pub token: Option<TokenInfo>,
    pub scope: Scope,
}

fn line_prefix(token: &Option<TokenInfo>) -> String {
    match token {
        Some(token) => format!("line {}: ", token.line),
        None => String::new(),
    }
}

fn scope_suffix(scope: &Scope) -> String {
    if scope.is_empty() {
        String::new()
    } else {
        format!(" (in {scope})")
    }
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            token: None,
            scope: Scope::default(),
        }
    }

    pub fn empty_input() -> Self {
        Self::new(ParseErrorKind::EmptyInput, "no tokens to parse")
    }

    pub fn missing_book() -> Self {
        Self::new(ParseErrorKind::MissingBook, "no \"book\" directive found")
    }

    /// Something other than `book` came first.
    pub fn before_book(what: &str) -> Self {
        Self::new(
            ParseErrorKind::MissingBook,
            format!("found {what} before \"book\""),
        )
    }

    /// Something appeared before the antecedent it needs.
    pub fn out_of_order(what: &str, antecedent: &str) -> Self {
        Self::new(
            ParseErrorKind::OutOfOrder,
            format!("found {what} before first \"{antecedent}\""),
        )
    }

    pub fn unknown_directive(name: &str) -> Self {
        let message = if name.is_empty() {
            "empty directive".to_string()
        } else {
            format!("unknown directive \"{name}\"")
        };
        Self::new(ParseErrorKind::UnknownDirective, message)
    }

    pub fn missing_argument(command: &str, argument: &str) -> Self {
        Self::new(
            ParseErrorKind::MissingArgument,
            format!("\"{command}\" needs {argument}"),
        )
    }

    /// Attach the offending token.
    pub fn with_token(mut self, token: &Token<'_>) -> Self {
        self.token = Some(TokenInfo::from(token));
        self
    }

    /// Attach the parser scope at the point of failure.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Source line of the offending token.
    pub fn line(&self) -> Option<u32> {
        self.token.as_ref().map(|token| token.line)
    }

    pub fn is_structural(&self) -> bool {
        self.kind.is_structural()
    }
}
