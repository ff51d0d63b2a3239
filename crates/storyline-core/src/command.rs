//! Directive tokenization.
//!
//! A directive payload such as `> s2 Go on` is split into a lower-cased
//! command name and positional fields.

use std::fmt;

/// Separators between directive words: ordinary space and no-break space.
const SEPARATORS: [char; 2] = [' ', '\u{00A0}'];

/// The fixed directive vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `book` - declares the book; title on the next paragraph.
    Book,
    /// `chapter <id>` - title on the next paragraph.
    Chapter,
    /// `section <id>` - title on the next paragraph.
    Section,
    /// `if <condition...>`
    If,
    /// `else`
    Else,
    /// `endif`
    EndIf,
    /// `item <id>` or `item remove <id>`
    Item,
    /// `state <id> <modifier>`
    State,
    /// `> <section> <title...>` - link within the current chapter.
    Next,
    /// `>> <chapter> <section> <title...>` - link to another chapter.
    Jump,
}

impl CommandKind {
    /// Look up a lower-cased command name.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "book" => CommandKind::Book,
            "chapter" => CommandKind::Chapter,
            "section" => CommandKind::Section,
            "if" => CommandKind::If,
            "else" => CommandKind::Else,
            "endif" => CommandKind::EndIf,
            "item" => CommandKind::Item,
            "state" => CommandKind::State,
            ">" => CommandKind::Next,
            ">>" => CommandKind::Jump,
            _ => return None,
        };
        Some(kind)
    }

    /// The command word as written in scripts.
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Book => "book",
            CommandKind::Chapter => "chapter",
            CommandKind::Section => "section",
            CommandKind::If => "if",
            CommandKind::Else => "else",
            CommandKind::EndIf => "endif",
            CommandKind::Item => "item",
            CommandKind::State => "state",
            CommandKind::Next => ">",
            CommandKind::Jump => ">>",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tokenized directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    /// Lower-cased first word; empty for a bare marker.
    pub name: String,
    /// Recognized command, `None` when `name` is outside the vocabulary.
    pub kind: Option<CommandKind>,
    /// Remaining words in order.
    pub fields: Vec<&'a str>,
    /// Source line of the directive.
    pub line: u32,
}

impl<'a> Command<'a> {
    /// Split a directive payload into name and fields.
    pub fn parse(text: &'a str, line: u32) -> Self {
        let mut words = text
            .split(SEPARATORS)
            .map(str::trim)
            .filter(|word| !word.is_empty());

        let name = words.next().map(str::to_lowercase).unwrap_or_default();
        let kind = CommandKind::from_name(&name);

        Self {
            name,
            kind,
            fields: words.collect(),
            line,
        }
    }

    /// Positional field `index`, if present.
    #[inline]
    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.fields.get(index).copied()
    }

    /// Fields from `from` onward joined by single spaces.
    pub fn rest(&self, from: usize) -> String {
        self.fields.get(from..).unwrap_or_default().join(" ")
    }
}
