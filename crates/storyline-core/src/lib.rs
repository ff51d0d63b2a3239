//! # Storyline Core
//!
//! Parser for a line-oriented scripting format describing branching
//! narratives: one book, made of chapters, made of sections holding text,
//! state and inventory changes, conditional branches and links to other
//! sections.
//!
//! ## Quick Start
//!
//! ```rust
//! use storyline_core::{Element, Parser};
//!
//! let input = "\
//! // book
//! The Cave
//! // chapter c1
//! Entrance
//! // section s1
//! Dark Room
//!
//! It is dark.
//! // item torch
//! // > s2 Go deeper
//! ";
//! let book = Parser::new().parse_str(input).unwrap();
//!
//! let section = &book.chapters[0].sections[0];
//! assert_eq!(section.elements.len(), 2);
//! assert!(matches!(section.elements[1], Element::AddItem(_)));
//! assert_eq!(section.next[0].section_id, "s2");
//! ```
//!
//! ## Pipeline
//!
//! - [`Lexer`] splits text into directive and paragraph [`Token`]s.
//!   Consecutive text lines join into one paragraph, so a title line must be
//!   followed by a blank line or a directive.
//! - [`Parser`] runs the single-pass state machine over the tokens and
//!   returns a [`Book`] or the first [`ParseError`].
//!
//! Links are recorded by id only; see [`Book::resolve`] and
//! [`Book::dangling_links`] for checking them afterwards.

pub mod ast;
pub mod command;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Book, Chapter, Element, Link, Section};
pub use command::{Command, CommandKind};
pub use error::{ParseError, ParseErrorKind};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenKind};

/// Lex and parse `input` with default settings.
pub fn parse_str(input: &str) -> Result<Book, ParseError> {
    Parser::new().parse_str(input)
}
