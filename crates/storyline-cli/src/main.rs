//! Storyline CLI - Parse, validate, and inspect storyline scripts
//!
//! Usage:
//!   storyline <COMMAND> [OPTIONS] <FILE>
//!
//! Commands:
//!   parse     Parse and display the book structure
//!   validate  Check the script for errors and dangling links
//!   stats     Show script statistics

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser as ClapParser, Subcommand};
use serde::Serialize;
use storyline_core::ast::DanglingLink;
use storyline_core::{Book, Element, Lexer, ParseError, Parser, Section};

#[derive(Debug, ClapParser)]
#[command(name = "storyline", version, about = "Storyline script parser and validator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse and display the book structure
    Parse(InputArgs),
    /// Check the script for errors and dangling links
    Validate(InputArgs),
    /// Show script statistics
    Stats(InputArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Script to read
    file: PathBuf,
    /// Output in JSON format
    #[arg(short, long)]
    json: bool,
    /// Show the whole tree
    #[arg(short, long)]
    verbose: bool,
    /// Let an open `if` continue across section boundaries
    #[arg(long)]
    lenient: bool,
    /// Prefix that marks a directive line
    #[arg(long, default_value = storyline_core::lexer::DEFAULT_MARKER)]
    marker: String,
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Parse(args) => cmd_parse(&args),
        Command::Validate(args) => cmd_validate(&args),
        Command::Stats(args) => cmd_stats(&args),
    }
}

fn read_input(args: &InputArgs) -> Result<String, String> {
    fs::read_to_string(&args.file)
        .map_err(|e| format!("failed to read '{}': {}", args.file.display(), e))
}

fn parse_input(args: &InputArgs, input: &str) -> Result<Book, ParseError> {
    let tokens = Lexer::new(input).with_marker(&args.marker).tokenize();
    Parser::new()
        .with_strict_conditionals(!args.lenient)
        .parse(&tokens)
}

// =============================================================================
// Parse Command
// =============================================================================

fn cmd_parse(args: &InputArgs) -> Result<(), String> {
    let input = read_input(args)?;
    let book = parse_input(args, &input).map_err(|e| e.to_string())?;

    if args.json {
        print_json(&book)?;
    } else if args.verbose {
        print_book_verbose(&book);
    } else {
        print_book_summary(&book);
    }

    Ok(())
}

// =============================================================================
// Validate Command
// =============================================================================

fn cmd_validate(args: &InputArgs) -> Result<(), String> {
    let input = read_input(args)?;

    let book = match parse_input(args, &input) {
        Ok(book) => book,
        Err(error) => {
            if args.json {
                let errors = [JsonError::from(&error)];
                println!(
                    "{}",
                    serde_json::json!({"valid": false, "errors": errors, "warnings": []})
                );
            } else {
                eprintln!("Invalid: {}", error);
            }
            return Err("1 error found".to_string());
        }
    };

    let dangling = book.dangling_links();
    if args.json {
        let warnings: Vec<String> = dangling.iter().map(describe_dangling).collect();
        println!(
            "{}",
            serde_json::json!({"valid": true, "errors": [], "warnings": warnings})
        );
    } else {
        for link in &dangling {
            eprintln!("warning: {}", describe_dangling(link));
        }
        println!("Valid: no errors found, {} warning(s)", dangling.len());
    }

    Ok(())
}

fn describe_dangling(dangling: &DanglingLink) -> String {
    format!(
        "link \"{}\" in {}/{} points to missing section {}/{}",
        dangling.link.title,
        dangling.chapter_id,
        dangling.section_id,
        dangling.link.chapter_id,
        dangling.link.section_id
    )
}

// =============================================================================
// Stats Command
// =============================================================================

fn cmd_stats(args: &InputArgs) -> Result<(), String> {
    let input = read_input(args)?;
    let book = parse_input(args, &input).map_err(|e| e.to_string())?;

    let stats = BookStats::from_book(&book);

    if args.json {
        let json = serde_json::to_string_pretty(&stats).map_err(|e| e.to_string())?;
        println!("{}", json);
        return Ok(());
    }

    println!("Book Statistics");
    println!("---------------");
    println!("Title:        {}", book.title);
    println!("Chapters:     {}", stats.chapters);
    println!("Sections:     {}", stats.sections);
    println!("Links:        {}", stats.links);
    println!("  Dangling:   {}", stats.dangling_links);
    println!();
    println!("Elements:");
    println!("  Paragraphs:     {}", stats.paragraphs);
    println!("  State changes:  {}", stats.state_changes);
    println!("  Items added:    {}", stats.items_added);
    println!("  Items removed:  {}", stats.items_removed);
    println!("  Conditionals:   {}", stats.conditionals);
    println!("  Else branches:  {}", stats.else_branches);

    Ok(())
}

#[derive(Debug, Default, Serialize)]
struct BookStats {
    chapters: usize,
    sections: usize,
    links: usize,
    dangling_links: usize,
    paragraphs: usize,
    state_changes: usize,
    items_added: usize,
    items_removed: usize,
    conditionals: usize,
    else_branches: usize,
}

impl BookStats {
    fn from_book(book: &Book) -> Self {
        let mut stats = Self {
            chapters: book.chapters.len(),
            dangling_links: book.dangling_links().len(),
            ..Self::default()
        };

        for (_, section) in book.sections() {
            stats.sections += 1;
            stats.links += section.next.len();
            stats.count_elements(&section.elements);
        }
        stats
    }

    fn count_elements(&mut self, elements: &[Element]) {
        for element in elements {
            match element {
                Element::Paragraph(_) => self.paragraphs += 1,
                Element::ChangeState(_) => self.state_changes += 1,
                Element::AddItem(_) => self.items_added += 1,
                Element::RemoveItem(_) => self.items_removed += 1,
                Element::If(branch) => {
                    self.conditionals += 1;
                    self.count_elements(&branch.elements);
                }
                Element::Else(branch) => {
                    self.else_branches += 1;
                    self.count_elements(&branch.elements);
                }
            }
        }
    }
}

// =============================================================================
// JSON Output
// =============================================================================

#[derive(Serialize)]
struct JsonError<'a> {
    kind: String,
    message: &'a str,
    line: Option<u32>,
    chapter: Option<&'a str>,
    section: Option<&'a str>,
}

impl<'a> From<&'a ParseError> for JsonError<'a> {
    fn from(error: &'a ParseError) -> Self {
        Self {
            kind: format!("{:?}", error.kind),
            message: &error.message,
            line: error.line(),
            chapter: error.scope.chapter.as_deref(),
            section: error.scope.section.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct JsonBook<'a> {
    title: &'a str,
    chapters: Vec<JsonChapter<'a>>,
}

#[derive(Serialize)]
struct JsonChapter<'a> {
    id: &'a str,
    title: &'a str,
    sections: Vec<JsonSection<'a>>,
}

#[derive(Serialize)]
struct JsonSection<'a> {
    id: &'a str,
    title: &'a str,
    elements: Vec<JsonElement<'a>>,
    next: Vec<JsonLink<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonLink<'a> {
    title: &'a str,
    chapter_id: &'a str,
    section_id: &'a str,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum JsonElement<'a> {
    Paragraph {
        text: &'a str,
    },
    State {
        id: &'a str,
        modifier: &'a str,
    },
    AddItem {
        id: &'a str,
    },
    RemoveItem {
        id: &'a str,
    },
    If {
        condition: &'a str,
        elements: Vec<JsonElement<'a>>,
    },
    Else {
        #[serde(rename = "ifCondition")]
        if_condition: &'a str,
        elements: Vec<JsonElement<'a>>,
    },
}

fn print_json(book: &Book) -> Result<(), String> {
    let json_book = convert_book(book);
    let json = serde_json::to_string_pretty(&json_book).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn convert_book(book: &Book) -> JsonBook<'_> {
    JsonBook {
        title: &book.title,
        chapters: book
            .chapters
            .iter()
            .map(|chapter| JsonChapter {
                id: &chapter.id,
                title: &chapter.title,
                sections: chapter.sections.iter().map(convert_section).collect(),
            })
            .collect(),
    }
}

fn convert_section(section: &Section) -> JsonSection<'_> {
    JsonSection {
        id: &section.id,
        title: &section.title,
        elements: section.elements.iter().map(convert_element).collect(),
        next: section
            .next
            .iter()
            .map(|link| JsonLink {
                title: &link.title,
                chapter_id: &link.chapter_id,
                section_id: &link.section_id,
            })
            .collect(),
    }
}

fn convert_element(element: &Element) -> JsonElement<'_> {
    match element {
        Element::Paragraph(p) => JsonElement::Paragraph { text: &p.text },
        Element::ChangeState(s) => JsonElement::State {
            id: &s.id,
            modifier: &s.modifier,
        },
        Element::AddItem(i) => JsonElement::AddItem { id: &i.id },
        Element::RemoveItem(i) => JsonElement::RemoveItem { id: &i.id },
        Element::If(b) => JsonElement::If {
            condition: &b.condition,
            elements: b.elements.iter().map(convert_element).collect(),
        },
        Element::Else(b) => JsonElement::Else {
            if_condition: &b.if_condition,
            elements: b.elements.iter().map(convert_element).collect(),
        },
    }
}

// =============================================================================
// Text Output
// =============================================================================

fn print_book_summary(book: &Book) {
    println!("Book: {}", book.title);
    println!("Chapters: {}", book.chapters.len());
    for chapter in &book.chapters {
        println!("  [{}] {} ({} sections)", chapter.id, chapter.title, chapter.sections.len());
        for section in &chapter.sections {
            println!(
                "    [{}] {} ({} elements, {} links)",
                section.id,
                first_line(&section.title),
                section.elements.len(),
                section.next.len()
            );
        }
    }
}

fn print_book_verbose(book: &Book) {
    println!("=== Storyline Book ===");
    println!();
    println!("Title: {}", book.title);

    for chapter in &book.chapters {
        println!();
        println!("--- Chapter {}: {} ---", chapter.id, chapter.title);
        for section in &chapter.sections {
            println!();
            println!("  Section {}: {}", section.id, first_line(&section.title));
            print_elements(&section.elements, 2);
            for link in &section.next {
                println!(
                    "    -> {}/{} \"{}\"",
                    link.chapter_id, link.section_id, link.title
                );
            }
        }
    }
}

fn print_elements(elements: &[Element], indent: usize) {
    let prefix = "  ".repeat(indent);

    for element in elements {
        match element {
            Element::Paragraph(p) => {
                let preview: String = p.text.chars().take(60).collect();
                let ellipsis = if p.text.chars().count() > 60 { "..." } else { "" };
                println!("{}Text: {}{}", prefix, preview.replace('\n', "\\n"), ellipsis);
            }
            Element::ChangeState(s) => println!("{}State: {} {}", prefix, s.id, s.modifier),
            Element::AddItem(i) => println!("{}Item: +{}", prefix, i.id),
            Element::RemoveItem(i) => println!("{}Item: -{}", prefix, i.id),
            Element::If(b) => {
                println!("{}If: {}", prefix, b.condition);
                print_elements(&b.elements, indent + 1);
            }
            Element::Else(b) => {
                println!("{}Else (of: {})", prefix, b.if_condition);
                print_elements(&b.elements, indent + 1);
            }
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "\
// book
Stats

// chapter c1
One

// section s1
Start

Hello.
// item lamp
// if has lamp
// item remove lamp
// state light +1
// else
Dark.
// endif
// > s2 On
// >> c9 s9 Nowhere

// section s2
Next
";

    #[test]
    fn test_book_stats_counts_nested_elements() {
        let book = storyline_core::parse_str(SCRIPT).unwrap();
        let stats = BookStats::from_book(&book);

        assert_eq!(stats.chapters, 1);
        assert_eq!(stats.sections, 2);
        assert_eq!(stats.links, 2);
        assert_eq!(stats.dangling_links, 1);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.items_added, 1);
        assert_eq!(stats.items_removed, 1);
        assert_eq!(stats.state_changes, 1);
        assert_eq!(stats.conditionals, 1);
        assert_eq!(stats.else_branches, 1);
    }

    #[test]
    fn test_json_shape() {
        let book = storyline_core::parse_str(SCRIPT).unwrap();
        let json = serde_json::to_value(convert_book(&book)).unwrap();

        let section = &json["chapters"][0]["sections"][0];
        assert_eq!(section["id"], "s1");
        assert_eq!(section["elements"][1]["type"], "addItem");
        assert_eq!(section["elements"][2]["type"], "if");
        assert_eq!(section["elements"][2]["elements"][1]["type"], "state");
        assert_eq!(section["elements"][3]["ifCondition"], "has lamp");
        assert_eq!(section["next"][1]["chapterId"], "c9");
    }
}
