//! Single-pass command parser.
//!
//! Consumes the token stream left to right and builds a [`Book`]. The
//! "current" chapter, section and open branches are tracked as indices into
//! the tree under construction, so appending never needs a live borrow of a
//! node other than the one being written. The first violation aborts the
//! parse.

use crate::ast::{
    Book, ChangeState, Chapter, Element, ElseBlock, IfBlock, ItemChange, Link, Paragraph, Section,
};
use crate::command::{Command, CommandKind};
use crate::error::{ParseError, ParseErrorKind, Scope, TokenInfo};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Address of a conditional element inside the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Branch {
    chapter: usize,
    section: usize,
    element: usize,
}

/// Scope pointers carried across one pass.
#[derive(Debug, Default)]
struct State {
    book: Option<Book>,
    chapter: Option<usize>,
    /// Index into the current chapter's sections.
    section: Option<usize>,
    open_if: Option<Branch>,
    open_else: Option<Branch>,
    /// Directive that opened `open_if`.
    open_if_token: Option<TokenInfo>,
}

impl State {
    fn chapter(&self) -> Option<&Chapter> {
        self.book.as_ref()?.chapters.get(self.chapter?)
    }

    fn chapter_mut(&mut self) -> Option<&mut Chapter> {
        let index = self.chapter?;
        self.book.as_mut()?.chapters.get_mut(index)
    }

    fn section(&self) -> Option<&Section> {
        self.chapter()?.sections.get(self.section?)
    }

    fn section_mut(&mut self) -> Option<&mut Section> {
        let index = self.section?;
        self.chapter_mut()?.sections.get_mut(index)
    }

    fn branch(&self, branch: Branch) -> Option<&Element> {
        self.book
            .as_ref()?
            .chapters
            .get(branch.chapter)?
            .sections
            .get(branch.section)?
            .elements
            .get(branch.element)
    }

    fn branch_mut(&mut self, branch: Branch) -> Option<&mut Element> {
        self.book
            .as_mut()?
            .chapters
            .get_mut(branch.chapter)?
            .sections
            .get_mut(branch.section)?
            .elements
            .get_mut(branch.element)
    }

    fn open_condition(&self) -> Option<&str> {
        match self.branch(self.open_if?)? {
            Element::If(branch) => Some(&branch.condition),
            _ => None,
        }
    }

    fn has_container(&self) -> bool {
        self.open_else.or(self.open_if).is_some() || self.section().is_some()
    }

    /// Innermost open container: the open else, the open if, or the section.
    fn container_mut(&mut self) -> Option<&mut Vec<Element>> {
        debug_assert!(self.open_else.is_none() || self.open_if.is_some());
        match self.open_else.or(self.open_if) {
            Some(branch) => self.branch_mut(branch)?.body_mut(),
            None => Some(&mut self.section_mut()?.elements),
        }
    }

    fn push_chapter(&mut self, chapter: Chapter) -> Option<()> {
        let book = self.book.as_mut()?;
        book.chapters.push(chapter);
        self.chapter = Some(book.chapters.len() - 1);
        self.section = None;
        Some(())
    }

    fn push_section(&mut self, section: Section) -> Option<()> {
        let chapter = self.chapter_mut()?;
        chapter.sections.push(section);
        let index = chapter.sections.len() - 1;
        self.section = Some(index);
        Some(())
    }

    /// Append a conditional to the section at `chapter`/`section`.
    fn push_branch(&mut self, chapter: usize, section: usize, element: Element) -> Option<Branch> {
        let elements = &mut self
            .book
            .as_mut()?
            .chapters
            .get_mut(chapter)?
            .sections
            .get_mut(section)?
            .elements;
        elements.push(element);
        Some(Branch {
            chapter,
            section,
            element: elements.len() - 1,
        })
    }

    fn scope(&self) -> Scope {
        Scope {
            chapter: self.chapter().map(|chapter| chapter.id.clone()),
            section: self.section().map(|section| section.id.clone()),
            condition: self.open_condition().map(str::to_string),
        }
    }

    fn fail(&self, error: ParseError, token: &Token<'_>) -> ParseError {
        error.with_token(token).with_scope(self.scope())
    }
}

/// Command parser for storyline scripts.
///
/// The parser keeps only a position counter between calls; every other piece
/// of state lives for a single [`Parser::parse`].
#[derive(Debug, Clone)]
pub struct Parser {
    position: usize,
    strict_conditionals: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser with strict conditionals.
    #[inline]
    pub fn new() -> Self {
        Self {
            position: 0,
            strict_conditionals: true,
        }
    }

    /// Enable or disable strict conditional checking.
    ///
    /// When enabled (default), an `if` must be closed before the next
    /// `chapter` or `section` and before end of input, and may have at most
    /// one `else`. When disabled, an open branch keeps collecting elements
    /// across section boundaries until its `endif`.
    pub fn with_strict_conditionals(mut self, strict: bool) -> Self {
        self.strict_conditionals = strict;
        self
    }

    /// Rewind the position counter.
    #[inline]
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Index of the token being processed; after a failure, the failing one.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Lex `input` with the default marker and parse the result.
    pub fn parse_str(&mut self, input: &str) -> Result<Book, ParseError> {
        let tokens = Lexer::new(input).tokenize();
        self.parse(&tokens)
    }

    /// Parse a token stream into a book, stopping at the first error.
    pub fn parse(&mut self, tokens: &[Token<'_>]) -> Result<Book, ParseError> {
        self.reset();

        if tokens.is_empty() {
            return Err(ParseError::empty_input());
        }

        let mut state = State::default();

        while self.position < tokens.len() {
            let token = &tokens[self.position];
            if state.book.is_none() {
                check_book_first(&state, token)?;
            }
            match token.kind {
                TokenKind::Directive => {
                    let command = Command::parse(&token.text, token.line);
                    self.parse_directive(&mut state, tokens, token, &command)?;
                }
                TokenKind::Paragraph => {
                    let paragraph = Element::Paragraph(Paragraph {
                        text: token.text.to_string(),
                    });
                    push_element(&mut state, token, "text", paragraph)?;
                }
            }
            self.position += 1;
        }

        if self.strict_conditionals && state.open_if.is_some() {
            let condition = state.open_condition().unwrap_or_default();
            let message = format!("\"if {condition}\" is never closed with \"endif\"");
            let mut error = ParseError::new(ParseErrorKind::UnclosedConditional, message)
                .with_scope(state.scope());
            error.token = state.open_if_token.take();
            return Err(error);
        }

        state.book.ok_or_else(ParseError::missing_book)
    }

    fn parse_directive(
        &mut self,
        state: &mut State,
        tokens: &[Token<'_>],
        token: &Token<'_>,
        command: &Command<'_>,
    ) -> Result<(), ParseError> {
        let Some(kind) = command.kind else {
            return Err(state.fail(ParseError::unknown_directive(&command.name), token));
        };

        match kind {
            CommandKind::Book => {
                if state.book.is_some() {
                    let error = ParseError::new(
                        ParseErrorKind::DuplicateBook,
                        "found a second \"book\" directive",
                    );
                    return Err(state.fail(error, token));
                }
                let title = self.take_title(state, tokens, token, kind)?;
                state.book = Some(Book {
                    title,
                    chapters: Vec::new(),
                });
            }
            CommandKind::Chapter => {
                self.check_boundary(state, token, kind)?;
                let id = required(state, token, command, 0, "a chapter id")?;
                let title = self.take_title(state, tokens, token, kind)?;
                state.push_chapter(Chapter {
                    id: id.to_string(),
                    title,
                    sections: Vec::new(),
                });
            }
            CommandKind::Section => {
                if state.chapter.is_none() {
                    return Err(state.fail(ParseError::out_of_order("\"section\"", "chapter"), token));
                }
                self.check_boundary(state, token, kind)?;
                let id = required(state, token, command, 0, "a section id")?;
                let title = self.take_title(state, tokens, token, kind)?;
                state.push_section(Section {
                    id: id.to_string(),
                    title,
                    elements: Vec::new(),
                    next: Vec::new(),
                });
            }
            CommandKind::Next => {
                let Some(chapter_id) = state.chapter().map(|chapter| chapter.id.clone()) else {
                    return Err(state.fail(ParseError::out_of_order("\">\"", "chapter"), token));
                };
                let section_id = required(state, token, command, 0, "a target section id")?;
                let link = Link {
                    title: command.rest(1),
                    chapter_id,
                    section_id: section_id.to_string(),
                };
                push_link(state, token, kind, link)?;
            }
            CommandKind::Jump => {
                if state.section.is_none() {
                    return Err(state.fail(ParseError::out_of_order("\">>\"", "section"), token));
                }
                let chapter_id = required(state, token, command, 0, "a target chapter id")?;
                let section_id = required(state, token, command, 1, "a target section id")?;
                let link = Link {
                    title: command.rest(2),
                    chapter_id: chapter_id.to_string(),
                    section_id: section_id.to_string(),
                };
                push_link(state, token, kind, link)?;
            }
            CommandKind::State => {
                if !state.has_container() {
                    return Err(state.fail(ParseError::out_of_order("\"state\"", "section"), token));
                }
                let id = required(state, token, command, 0, "a state id")?;
                let modifier = required(state, token, command, 1, "a modifier")?;
                let element = Element::ChangeState(ChangeState {
                    id: id.to_string(),
                    modifier: modifier.to_string(),
                });
                push_element(state, token, "\"state\"", element)?;
            }
            CommandKind::Item => {
                if state.section.is_none() {
                    return Err(state.fail(ParseError::out_of_order("\"item\"", "section"), token));
                }
                let first = required(state, token, command, 0, "an item id")?;
                let element = if first.eq_ignore_ascii_case("remove") {
                    let id = required(state, token, command, 1, "an item id after \"remove\"")?;
                    Element::RemoveItem(ItemChange { id: id.to_string() })
                } else {
                    Element::AddItem(ItemChange {
                        id: first.to_string(),
                    })
                };
                push_element(state, token, "\"item\"", element)?;
            }
            CommandKind::If => {
                if state.open_if.is_some() {
                    let error = ParseError::new(
                        ParseErrorKind::UnbalancedConditional,
                        "found another \"if\" before \"endif\"",
                    );
                    return Err(state.fail(error, token));
                }
                let (Some(chapter), Some(section)) = (state.chapter, state.section) else {
                    return Err(state.fail(ParseError::out_of_order("\"if\"", "section"), token));
                };
                let condition = command.rest(0);
                if condition.is_empty() {
                    return Err(state.fail(ParseError::missing_argument("if", "a condition"), token));
                }
                let element = Element::If(IfBlock {
                    condition,
                    elements: Vec::new(),
                });
                state.open_if = state.push_branch(chapter, section, element);
                state.open_if_token = Some(TokenInfo::from(token));
            }
            CommandKind::Else => {
                if state.open_if.is_none() {
                    let error = ParseError::new(
                        ParseErrorKind::UnbalancedConditional,
                        "found \"else\" before \"if\"",
                    );
                    return Err(state.fail(error, token));
                }
                let if_condition = state.open_condition().unwrap_or_default().to_string();
                if self.strict_conditionals && state.open_else.is_some() {
                    let error = ParseError::new(
                        ParseErrorKind::UnbalancedConditional,
                        format!("found a second \"else\" for \"if {if_condition}\""),
                    );
                    return Err(state.fail(error, token));
                }
                // Lenient parses may have moved on from the if's section; the
                // else always joins the current one.
                let (Some(chapter), Some(section)) = (state.chapter, state.section) else {
                    return Err(state.fail(ParseError::out_of_order("\"else\"", "section"), token));
                };
                let element = Element::Else(ElseBlock {
                    if_condition,
                    elements: Vec::new(),
                });
                state.open_else = state.push_branch(chapter, section, element);
            }
            CommandKind::EndIf => {
                if state.open_if.is_none() {
                    let error = ParseError::new(
                        ParseErrorKind::UnbalancedConditional,
                        "found \"endif\" before \"if\"",
                    );
                    return Err(state.fail(error, token));
                }
                state.open_if = None;
                state.open_else = None;
                state.open_if_token = None;
            }
        }

        Ok(())
    }

    /// Read the title paragraph that must follow `book`/`chapter`/`section`.
    fn take_title(
        &mut self,
        state: &State,
        tokens: &[Token<'_>],
        token: &Token<'_>,
        kind: CommandKind,
    ) -> Result<String, ParseError> {
        let error = || {
            ParseError::new(
                ParseErrorKind::MissingTitle,
                format!("\"{kind}\" needs a title as text after the directive"),
            )
        };

        match tokens.get(self.position + 1) {
            Some(next) if next.is_paragraph() => {
                self.position += 1;
                Ok(next.text.to_string())
            }
            Some(next) => Err(state.fail(error(), next)),
            None => Err(state.fail(error(), token)),
        }
    }

    /// In strict mode, refuse to leave a section with an `if` still open.
    fn check_boundary(
        &self,
        state: &State,
        token: &Token<'_>,
        kind: CommandKind,
    ) -> Result<(), ParseError> {
        if !self.strict_conditionals {
            return Ok(());
        }
        match state.open_condition() {
            Some(condition) => {
                let error = ParseError::new(
                    ParseErrorKind::UnclosedConditional,
                    format!("found \"{kind}\" while \"if {condition}\" is still open"),
                );
                Err(state.fail(error, token))
            }
            None => Ok(()),
        }
    }
}

/// Only `book` may come before the book exists.
fn check_book_first(state: &State, token: &Token<'_>) -> Result<(), ParseError> {
    let what = match token.kind {
        TokenKind::Paragraph => "text".to_string(),
        TokenKind::Directive => match Command::parse(&token.text, token.line).kind {
            Some(CommandKind::Book) => return Ok(()),
            Some(kind) => format!("\"{kind}\""),
            // Unknown directives are reported as such.
            None => return Ok(()),
        },
    };
    Err(state.fail(ParseError::before_book(&what), token))
}

fn required<'c>(
    state: &State,
    token: &Token<'_>,
    command: &Command<'c>,
    index: usize,
    argument: &str,
) -> Result<&'c str, ParseError> {
    command
        .field(index)
        .ok_or_else(|| state.fail(ParseError::missing_argument(&command.name, argument), token))
}

fn push_element(
    state: &mut State,
    token: &Token<'_>,
    what: &str,
    element: Element,
) -> Result<(), ParseError> {
    match state.container_mut() {
        Some(container) => {
            container.push(element);
            Ok(())
        }
        None => Err(state.fail(ParseError::out_of_order(what, "section"), token)),
    }
}

fn push_link(
    state: &mut State,
    token: &Token<'_>,
    kind: CommandKind,
    link: Link,
) -> Result<(), ParseError> {
    match state.section_mut() {
        Some(section) => {
            section.next.push(link);
            Ok(())
        }
        None => {
            let what = format!("\"{kind}\"");
            Err(state.fail(ParseError::out_of_order(&what, "section"), token))
        }
    }
}
