//! One `name(...)` invocation in a build script

use std::fmt;

use serde::Serialize;

use super::section::Section;

/// The interior of a command: argument sections interleaved with raw
/// comment/whitespace fragments that keep their original position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SectionItem {
    Section(Section),
    Text(String),
}

impl fmt::Display for SectionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionItem::Section(section) => write!(f, "{}", section),
            SectionItem::Text(text) => write!(f, "{}", text),
        }
    }
}

/// A single command invocation.
///
/// A command parsed from source carries its exact original text and replays
/// it verbatim while untouched. Once dirty, it is rendered structurally from
/// its sections forever - the flag never resets, even if later edits restore
/// the original content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub name: String,
    /// Whitespace between the command name and its opening paren
    pub pre_paren: String,
    items: Vec<SectionItem>,
    original: Option<String>,
    dirty: bool,
}

impl Command {
    /// A synthetic command: no original text, always rendered structurally
    pub fn new(name: &str) -> Self {
        Command {
            name: name.to_string(),
            pre_paren: String::new(),
            items: Vec::new(),
            original: None,
            dirty: true,
        }
    }

    /// A command reconstructed by the parser, carrying its source text
    pub(crate) fn from_source(
        name: String,
        pre_paren: String,
        items: Vec<SectionItem>,
        original: String,
    ) -> Self {
        Command {
            name,
            pre_paren,
            items,
            original: Some(original),
            dirty: false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Irreversible: a regenerated command never reverts to verbatim replay
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    pub fn items(&self) -> &[SectionItem] {
        &self.items
    }

    /// The argument sections, skipping raw fragments
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.items.iter().filter_map(|item| match item {
            SectionItem::Section(section) => Some(section),
            SectionItem::Text(_) => None,
        })
    }

    /// First section with the given name, if any
    pub fn get_section(&self, name: &str) -> Option<&Section> {
        self.sections().find(|section| section.name == name)
    }

    /// Mutable access to a section; callers that change it must also call
    /// [`mark_dirty`](Command::mark_dirty)
    pub fn get_section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.items.iter_mut().find_map(|item| match item {
            SectionItem::Section(section) if section.name == name => Some(section),
            _ => None,
        })
    }

    pub fn get_sections(&self, name: &str) -> Vec<&Section> {
        self.sections()
            .filter(|section| section.name == name)
            .collect()
    }

    /// Append a fresh section with the given values; marks the command dirty
    pub fn add_section(&mut self, name: &str, values: Vec<String>) {
        self.items
            .push(SectionItem::Section(Section::with_values(name, values)));
        self.dirty = true;
    }

    /// Append an existing section if it is valid; marks the command dirty
    pub fn add(&mut self, section: Section) {
        if section.is_valid() {
            self.items.push(SectionItem::Section(section));
            self.dirty = true;
        }
    }

    pub(crate) fn push_item(&mut self, item: SectionItem) {
        self.items.push(item);
    }

    /// The first value of the first section - the build-artifact anchor for
    /// target-style commands
    pub fn first_token(&self) -> Option<&str> {
        self.sections()
            .next()
            .and_then(|section| section.values.first())
            .map(String::as_str)
    }

    /// Every value of every section, in order
    pub fn get_tokens(&self) -> Vec<&str> {
        self.sections()
            .flat_map(|section| section.values.iter().map(String::as_str))
            .collect()
    }

    /// Append a value to the last section (creating an anonymous one when
    /// the command has none); marks the command dirty
    pub fn add_token(&mut self, value: &str) {
        let last = self.items.iter_mut().rev().find_map(|item| match item {
            SectionItem::Section(section) => Some(section),
            SectionItem::Text(_) => None,
        });
        match last {
            Some(section) => section.add(value),
            None => self.add_section("", vec![value.to_string()]),
        }
        self.dirty = true;
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(original), false) = (&self.original, self.dirty) {
            return write!(f, "{}", original);
        }

        let mut out = format!("{}{}(", self.name, self.pre_paren);
        for item in &self.items {
            let rendered = item.to_string();
            let Some(first) = rendered.chars().next() else {
                continue;
            };
            let glue_needed = !matches!(out.chars().last(), Some('(') | Some(' ') | Some('\n'))
                && first != ' '
                && first != '\n';
            if glue_needed {
                out.push(' ');
            }
            out.push_str(&rendered);
        }
        if out.contains('\n') && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push(')');
        write!(f, "{}", out)
    }
}
