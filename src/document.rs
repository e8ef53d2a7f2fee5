//! The parsed build script: ordered contents, name index, and mutation API
//!
//! A document owns its content nodes outright, including the nested
//! documents inside command groups. The name index is a materialized view of
//! the content list - every mutation that adds or removes a node updates the
//! index in the same operation, never lazily.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::ast::{Command, CommandGroup};
use crate::ordering::{
    ordering_table, sort_key, DocumentStyle, BUILD_TARGET_COMMANDS, GROUP_KEY, INSTALL_COMMANDS,
    TEST_COMMANDS, TEST_GUARD,
};

static VARIABLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid pattern"));

/// The variable holding the project name, seeded from `project(...)`
const PROJECT_NAME_VAR: &str = "PROJECT_NAME";

/// One node of a document's content list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ContentItem {
    /// Interstitial whitespace or a comment, replayed verbatim
    Text(String),
    Command(Command),
    Group(CommandGroup),
}

impl ContentItem {
    pub fn as_command(&self) -> Option<&Command> {
        match self {
            ContentItem::Command(command) => Some(command),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&CommandGroup> {
        match self {
            ContentItem::Group(group) => Some(group),
            _ => None,
        }
    }

    /// The name this node files under in the document index
    fn index_key(&self) -> Option<&str> {
        match self {
            ContentItem::Text(_) => None,
            ContentItem::Command(command) => Some(&command.name),
            ContentItem::Group(_) => Some(GROUP_KEY),
        }
    }
}

impl fmt::Display for ContentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentItem::Text(text) => write!(f, "{}", text),
            ContentItem::Command(command) => write!(f, "{}", command),
            ContentItem::Group(group) => write!(f, "{}", group),
        }
    }
}

/// A parsed build script (or the nested body of a command group)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    contents: Vec<ContentItem>,
    /// Command name (or [`GROUP_KEY`]) to ordered positions in `contents`
    index: HashMap<String, Vec<usize>>,
    /// Resolved `${VAR}` substitutions, from `set(...)` and `project(...)`
    variables: HashMap<String, String>,
    depth: usize,
}

impl Document {
    /// An empty document, e.g. for a synthetic nested body
    pub fn empty(depth: usize) -> Self {
        Document {
            contents: Vec::new(),
            index: HashMap::new(),
            variables: HashMap::new(),
            depth,
        }
    }

    pub(crate) fn from_contents(contents: Vec<ContentItem>, depth: usize) -> Self {
        let mut doc = Document {
            contents,
            index: HashMap::new(),
            variables: HashMap::new(),
            depth,
        };
        doc.rebuild_index();
        doc.collect_variables();
        doc
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Two spaces per nesting level
    fn indentation(&self) -> String {
        "  ".repeat(self.depth)
    }

    pub fn contents(&self) -> &[ContentItem] {
        &self.contents
    }

    /// Ordered positions of the commands (or groups, via [`GROUP_KEY`])
    /// filed under `name`
    pub fn positions(&self, name: &str) -> &[usize] {
        self.index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All commands with the given name, in document order
    pub fn commands(&self, name: &str) -> Vec<&Command> {
        self.positions(name)
            .iter()
            .filter_map(|&pos| self.contents[pos].as_command())
            .collect()
    }

    /// All command groups, in document order
    pub fn groups(&self) -> Vec<&CommandGroup> {
        self.positions(GROUP_KEY)
            .iter()
            .filter_map(|&pos| self.contents[pos].as_group())
            .collect()
    }

    pub fn project_name(&self) -> Option<&str> {
        self.variables.get(PROJECT_NAME_VAR).map(String::as_str)
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, item) in self.contents.iter().enumerate() {
            if let Some(key) = item.index_key() {
                self.index.entry(key.to_string()).or_default().push(pos);
            }
        }
    }

    /// Seed the variable table from every `set(NAME VALUE...)` command plus
    /// the project name
    fn collect_variables(&mut self) {
        let mut entries: Vec<(String, String)> = Vec::new();
        if let Some(name) = self
            .commands("project")
            .first()
            .and_then(|command| command.first_token())
        {
            entries.push((PROJECT_NAME_VAR.to_string(), name.to_string()));
        }
        for command in self.commands("set") {
            let Some(first) = command.sections().next() else {
                continue;
            };
            let tokens = command.get_tokens();
            if !first.name.is_empty() {
                entries.push((first.name.clone(), tokens.join(" ")));
            } else if let Some((name, rest)) = tokens.split_first() {
                entries.push((name.to_string(), rest.join(" ")));
            }
        }
        self.variables.extend(entries);
    }

    /// Substitute every `${VAR}` occurrence from the variable table.
    /// Unresolvable references are left as literal text, never an error.
    pub fn resolve(&self, text: &str) -> String {
        VARIABLE_PATTERN
            .replace_all(text, |caps: &regex::Captures| {
                match self.variables.get(&caps[1]) {
                    Some(value) => value.clone(),
                    None => {
                        log::debug!("leaving unresolvable variable {} as-is", &caps[0]);
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Resolve a list of value tokens, re-splitting on internal whitespace -
    /// a resolved value can expand into multiple tokens (or none)
    pub fn resolve_all<S: AsRef<str>>(&self, values: &[S]) -> Vec<String> {
        let mut resolved = Vec::new();
        for value in values {
            let text = self.resolve(value.as_ref());
            resolved.extend(text.split_whitespace().map(str::to_string));
        }
        resolved
    }

    /// First-seen order of distinct build artifact names - the anchors list
    pub fn ordered_build_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = Vec::new();
        for item in &self.contents {
            let Some(command) = item.as_command() else {
                continue;
            };
            if !BUILD_TARGET_COMMANDS.contains(&command.name.as_str()) {
                continue;
            }
            if let Some(token) = command.first_token() {
                if !targets.iter().any(|t| t == token) {
                    targets.push(token.to_string());
                }
            }
        }
        targets
    }

    fn rules_for(&self, command_name: &str) -> Vec<(String, Vec<String>)> {
        let mut rules = Vec::new();
        for command in self.commands(command_name) {
            let tokens = self.resolve_all(&command.get_tokens());
            if let Some((target, sources)) = tokens.split_first() {
                rules.push((target.clone(), sources.to_vec()));
            }
        }
        rules
    }

    /// Declared library targets, with variables resolved
    pub fn libraries(&self) -> Vec<String> {
        self.rules_for("add_library")
            .into_iter()
            .map(|(target, _)| target)
            .collect()
    }

    /// Declared executable targets, with variables resolved
    pub fn executables(&self) -> Vec<String> {
        self.rules_for("add_executable")
            .into_iter()
            .map(|(target, _)| target)
            .collect()
    }

    /// Map of every declared target to its source list, variables resolved
    pub fn target_build_rules(&self) -> HashMap<String, Vec<String>> {
        let mut rules: HashMap<String, Vec<String>> = HashMap::new();
        rules.extend(self.rules_for("add_library"));
        rules.extend(self.rules_for("add_executable"));
        rules
    }

    /// Classify the document's layout convention from the relative order of
    /// its test-category and install-category nodes
    pub fn layout_style(&self) -> DocumentStyle {
        #[derive(PartialEq, Clone, Copy)]
        enum Category {
            Test,
            Install,
        }

        let mut transitions: Vec<Category> = Vec::new();
        for item in &self.contents {
            let category = match item {
                ContentItem::Command(command) => {
                    if TEST_COMMANDS.contains(&command.name.as_str()) {
                        Category::Test
                    } else if INSTALL_COMMANDS.contains(&command.name.as_str()) {
                        Category::Install
                    } else {
                        continue;
                    }
                }
                ContentItem::Group(group)
                    if group.open.name == "if" && group.guard_token() == Some(TEST_GUARD) =>
                {
                    Category::Test
                }
                _ => continue,
            };
            if transitions.last() != Some(&category) {
                transitions.push(category);
            }
        }

        match transitions.as_slice() {
            [] => DocumentStyle::Neither,
            [Category::Test] | [Category::Test, Category::Install] => DocumentStyle::TestFirst,
            [Category::Install] | [Category::Install, Category::Test] => {
                DocumentStyle::InstallFirst
            }
            _ => DocumentStyle::Mixed,
        }
    }

    /// The canonical position for a new node: one past the last existing
    /// node whose sort key is less than or equal to the new key, so
    /// equal-key nodes insert after their peers
    pub fn insertion_index(&self, item: &ContentItem) -> usize {
        let table = ordering_table(self.layout_style());
        let mut anchors = self.ordered_build_targets();
        let new_key = sort_key(item, &mut anchors, table);

        let mut insert_at = 0;
        for (pos, content) in self.contents.iter().enumerate() {
            if matches!(content, ContentItem::Text(_)) {
                continue;
            }
            let key = sort_key(content, &mut anchors, table);
            if key <= new_key {
                insert_at = pos + 1;
            } else {
                return insert_at;
            }
        }
        self.contents.len()
    }

    /// Insert a command at its canonical position
    pub fn add_command(&mut self, command: Command) {
        self.insert_content(ContentItem::Command(command));
    }

    /// Insert a command group at its canonical position
    pub fn add_group(&mut self, group: CommandGroup) {
        self.insert_content(ContentItem::Group(group));
    }

    fn insert_content(&mut self, item: ContentItem) {
        let insert_at = self.insertion_index(&item);

        let mut block: Vec<ContentItem> = Vec::new();
        if insert_at > 0 && !matches!(self.contents[insert_at - 1], ContentItem::Text(_)) {
            block.push(ContentItem::Text("\n".to_string()));
        }
        let node_offset = if self.depth > 0 {
            block.push(ContentItem::Text(self.indentation()));
            let offset = block.len();
            block.push(item);
            block.push(ContentItem::Text("\n".to_string()));
            offset
        } else {
            let offset = block.len();
            block.push(item);
            offset
        };

        let key = block[node_offset]
            .index_key()
            .expect("inserted node is a command or group")
            .to_string();
        let node_pos = insert_at + node_offset;
        let shift = block.len();

        for positions in self.index.values_mut() {
            for pos in positions.iter_mut() {
                if *pos >= insert_at {
                    *pos += shift;
                }
            }
        }
        let positions = self.index.entry(key).or_default();
        let slot = positions
            .iter()
            .position(|&pos| pos > node_pos)
            .unwrap_or(positions.len());
        positions.insert(slot, node_pos);

        self.contents.splice(insert_at..insert_at, block);
    }

    /// Remove the command or group at `pos` from the contents and the index.
    ///
    /// Panics if `pos` does not hold a command or group - that is a caller
    /// error, not a recoverable condition.
    pub fn remove_command_at(&mut self, pos: usize) {
        let item = self.contents.remove(pos);
        let key = item
            .index_key()
            .unwrap_or_else(|| panic!("content at {} is not a command or group", pos));
        log::debug!("removing {} at position {}", key, pos);

        let positions = self
            .index
            .get_mut(key)
            .unwrap_or_else(|| panic!("{:?} missing from index", key));
        let slot = positions
            .iter()
            .position(|&p| p == pos)
            .unwrap_or_else(|| panic!("position {} missing from index of {:?}", pos, key));
        positions.remove(slot);
        if positions.is_empty() {
            self.index.remove(key);
        }
        for positions in self.index.values_mut() {
            for p in positions.iter_mut() {
                if *p > pos {
                    *p -= 1;
                }
            }
        }
    }

    /// First command named `command_name` that has a `section_name` section
    /// (position, `true`), else the first command of that name (position,
    /// `false`), else `None`
    fn command_with_section(&self, command_name: &str, section_name: &str) -> Option<(usize, bool)> {
        let positions = self.positions(command_name);
        let first = *positions.first()?;
        for &pos in positions {
            if let Some(command) = self.contents[pos].as_command() {
                if command.get_section(section_name).is_some() {
                    return Some((pos, true));
                }
            }
        }
        Some((first, false))
    }

    /// Ensure a command of the given type carries the given items in the
    /// given section - the idempotent merge primitive.
    ///
    /// Items are diffed against the *resolved* existing values, so an item
    /// already present behind an unexpanded variable is not re-added. A
    /// sorted value list stays sorted after the merge; an unsorted one keeps
    /// its order, with the new items appended in sorted order among
    /// themselves. Re-running with the same items is a byte-for-byte no-op.
    pub fn section_check(
        &mut self,
        items: &[&str],
        command_name: &str,
        section_name: &str,
        zero_okay: bool,
        alphabetical: bool,
    ) {
        if items.is_empty() && !zero_okay {
            return;
        }

        let Some((pos, has_section)) = self.command_with_section(command_name, section_name) else {
            let mut command = Command::new(command_name);
            let mut values: Vec<String> = items.iter().map(|item| item.to_string()).collect();
            values.sort();
            if !section_name.is_empty() || !values.is_empty() {
                command.add_section(section_name, values);
            }
            self.add_command(command);
            return;
        };

        let existing: Vec<String> = self.contents[pos]
            .as_command()
            .and_then(|command| command.get_section(section_name))
            .map(|section| section.values.clone())
            .unwrap_or_default();
        let resolved = self.resolve_all(&existing);
        let mut missing: Vec<String> = items
            .iter()
            .filter(|item| !resolved.iter().any(|r| r == **item))
            .map(|item| item.to_string())
            .collect();
        missing.sort();

        let ContentItem::Command(command) = &mut self.contents[pos] else {
            unreachable!("index entries always point at commands");
        };
        if !has_section {
            if !section_name.is_empty() || !missing.is_empty() {
                command.add_section(section_name, missing);
            }
        } else {
            if missing.is_empty() {
                return;
            }
            let section = command
                .get_section_mut(section_name)
                .expect("section presence was just checked");
            if alphabetical && is_sorted(&section.values) {
                for item in missing {
                    let slot = section.values.binary_search(&item).unwrap_or_else(|e| e);
                    section.values.insert(slot, item);
                }
            } else {
                section.values.extend(missing);
            }
            command.mark_dirty();
        }
    }

    /// Nested bodies of every `if(CATKIN_ENABLE_TESTING)` block
    pub fn test_bodies(&self) -> Vec<&Document> {
        self.groups()
            .into_iter()
            .filter(|group| group.open.name == "if" && group.guard_token() == Some(TEST_GUARD))
            .map(|group| &group.body)
            .collect()
    }

    /// The first test block's body, lazily creating an
    /// `if(CATKIN_ENABLE_TESTING)` / `endif()` group when requested
    pub fn test_body_mut(&mut self, create_if_needed: bool) -> Option<&mut Document> {
        let find = |doc: &Document| {
            doc.positions(GROUP_KEY).iter().copied().find(|&pos| {
                doc.contents[pos].as_group().is_some_and(|group| {
                    group.open.name == "if" && group.guard_token() == Some(TEST_GUARD)
                })
            })
        };

        let pos = match find(self) {
            Some(pos) => pos,
            None => {
                if !create_if_needed {
                    return None;
                }
                let mut open = Command::new("if");
                open.add_section(TEST_GUARD, Vec::new());
                let body = Document::from_contents(
                    vec![ContentItem::Text("\n".to_string())],
                    self.depth + 1,
                );
                let close = Command::new("endif");
                self.add_group(CommandGroup::new(open, body, close));
                find(self).expect("test block was just added")
            }
        };
        match &mut self.contents[pos] {
            ContentItem::Group(group) => Some(&mut group.body),
            _ => None,
        }
    }

    /// Canonicalize the whole document layout: cluster each node with its
    /// immediately preceding raw fragments so formatting travels with its
    /// owner, stable-sort the clusters, and recurse into group bodies.
    /// Running this twice in a row is a no-op the second time.
    pub fn enforce_ordering(&mut self, style: Option<DocumentStyle>) {
        let style = style.unwrap_or_else(|| self.layout_style());
        let table = ordering_table(style);
        let mut anchors = self.ordered_build_targets();

        let mut clusters: Vec<(Vec<ContentItem>, ContentItem)> = Vec::new();
        let mut pending: Vec<ContentItem> = Vec::new();
        for item in std::mem::take(&mut self.contents) {
            if matches!(item, ContentItem::Text(_)) {
                pending.push(item);
            } else {
                clusters.push((std::mem::take(&mut pending), item));
            }
        }
        let trailing = pending;

        let mut keyed: Vec<_> = clusters
            .into_iter()
            .map(|cluster| (sort_key(&cluster.1, &mut anchors, table), cluster))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        for (_, (prefix, node)) in keyed {
            self.contents.extend(prefix);
            self.contents.push(node);
        }
        self.contents.extend(trailing);
        self.rebuild_index();

        for item in &mut self.contents {
            if let ContentItem::Group(group) = item {
                group.body.enforce_ordering(Some(style));
            }
        }
    }

    /// Write the serialized document to `path`, skipping the write when the
    /// file already holds identical bytes. Returns whether a write happened.
    pub fn write_if_changed(&self, path: &Path) -> io::Result<bool> {
        let rendered = self.to_string();
        match fs::read_to_string(path) {
            Ok(existing) if existing == rendered => return Ok(false),
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        fs::write(path, rendered)?;
        Ok(true)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.contents {
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

fn is_sorted(values: &[String]) -> bool {
    values.windows(2).all(|pair| pair[0] <= pair[1])
}
