//! Document tree produced by the parser.
//!
//! The tree is strictly owned from the root down: a [`Book`] owns its
//! chapters, a [`Chapter`] its sections, a [`Section`] its elements and
//! links, and a conditional branch its body. [`Link`]s refer to other
//! sections by id only; resolving them is left to consumers, with
//! [`Book::resolve`] and [`Book::dangling_links`] as helpers.

/// Root of a parsed script.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Book {
    pub title: String,
    /// Chapters in source order.
    pub chapters: Vec<Chapter>,
}

/// A chapter of the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Free-form id. Uniqueness is not checked.
    pub id: String,
    pub title: String,
    /// Sections in source order.
    pub sections: Vec<Section>,
}

/// The smallest navigable unit of narrative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Free-form id. Uniqueness is not checked.
    pub id: String,
    pub title: String,
    /// Content in presentation order.
    pub elements: Vec<Element>,
    /// Outgoing links in presentation order.
    pub next: Vec<Link>,
}

/// A labeled, unresolved reference to a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Display label.
    pub title: String,
    pub chapter_id: String,
    pub section_id: String,
}

/// Ordered content of a section or conditional branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// Narrative text.
    Paragraph(Paragraph),
    /// State mutation, interpreted by the runtime.
    ChangeState(ChangeState),
    /// Inventory gain.
    AddItem(ItemChange),
    /// Inventory loss.
    RemoveItem(ItemChange),
    /// Conditional branch.
    If(IfBlock),
    /// Alternative branch of the preceding `If`.
    Else(ElseBlock),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeState {
    pub id: String,
    /// Opaque to the parser.
    pub modifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemChange {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfBlock {
    /// Opaque boolean expression text.
    pub condition: String,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElseBlock {
    /// Condition of the `If` this branch pairs with.
    pub if_condition: String,
    pub elements: Vec<Element>,
}

impl Book {
    /// First chapter with the given id.
    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|chapter| chapter.id == id)
    }

    /// Section addressed by chapter and section id.
    pub fn section(&self, chapter_id: &str, section_id: &str) -> Option<&Section> {
        self.chapter(chapter_id)?.section(section_id)
    }

    /// Target of `link`, if it exists.
    pub fn resolve(&self, link: &Link) -> Option<&Section> {
        self.section(&link.chapter_id, &link.section_id)
    }

    /// All sections with their owning chapter, in source order.
    pub fn sections(&self) -> impl Iterator<Item = (&Chapter, &Section)> {
        self.chapters
            .iter()
            .flat_map(|chapter| chapter.sections.iter().map(move |section| (chapter, section)))
    }

    /// Links whose target section does not exist.
    pub fn dangling_links(&self) -> Vec<DanglingLink<'_>> {
        self.sections()
            .flat_map(|(chapter, section)| {
                section.next.iter().map(move |link| DanglingLink {
                    chapter_id: &chapter.id,
                    section_id: &section.id,
                    link,
                })
            })
            .filter(|dangling| self.resolve(dangling.link).is_none())
            .collect()
    }
}

/// A link that points nowhere, with the section it was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DanglingLink<'a> {
    pub chapter_id: &'a str,
    pub section_id: &'a str,
    pub link: &'a Link,
}

impl Chapter {
    /// First section with the given id.
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == id)
    }
}

impl Element {
    /// Short lower-case name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            Element::Paragraph(_) => "paragraph",
            Element::ChangeState(_) => "state",
            Element::AddItem(_) => "add item",
            Element::RemoveItem(_) => "remove item",
            Element::If(_) => "if",
            Element::Else(_) => "else",
        }
    }

    /// Body of a conditional branch.
    pub fn body(&self) -> Option<&[Element]> {
        match self {
            Element::If(branch) => Some(&branch.elements),
            Element::Else(branch) => Some(&branch.elements),
            _ => None,
        }
    }

    pub(crate) fn body_mut(&mut self) -> Option<&mut Vec<Element>> {
        match self {
            Element::If(branch) => Some(&mut branch.elements),
            Element::Else(branch) => Some(&mut branch.elements),
            _ => None,
        }
    }
}
