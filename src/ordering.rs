//! Canonical ordering policy for build-script content
//!
//! Every command kind has a position in a fixed bucket table; commands in a
//! shared bucket are tie-broken by a secondary key instead of table
//! position. Build-target commands cluster around the artifact they
//! reference (the "anchor"), in the order the artifacts first appear in the
//! file, so a target's declaration, dependency edges and link edges stay
//! contiguous.

use serde::{Deserialize, Serialize};

use crate::ast::Command;
use crate::document::ContentItem;

/// Commands that declare or reference a named build artifact
pub const BUILD_TARGET_COMMANDS: &[&str] = &[
    "add_library",
    "add_executable",
    "target_link_libraries",
    "add_dependencies",
    "add_rostest",
];

/// Commands that open a guarded block
pub const GROUP_OPENERS: &[&str] = &["if", "foreach"];

/// Index key under which command groups are filed in a document
pub const GROUP_KEY: &str = "group";

/// Test-category commands, for document layout classification
pub const TEST_COMMANDS: &[&str] = &[
    "catkin_add_gtest",
    "roslint_cpp",
    "roslint_python",
    "roslint_add_test",
    "add_rostest",
];

/// Install-category commands, for document layout classification
pub const INSTALL_COMMANDS: &[&str] = &["install", "catkin_install_python"];

/// The guard keyword that marks a test block
pub const TEST_GUARD: &str = "CATKIN_ENABLE_TESTING";

/// A document's pre-existing layout convention, detected from the relative
/// order of its test-category and install-category nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStyle {
    TestFirst,
    InstallFirst,
    Mixed,
    Neither,
}

static ORDERING_TEST_FIRST: &[&[&str]] = &[
    &["cmake_minimum_required"],
    &["project"],
    &["set_directory_properties"],
    &["find_package"],
    &["pkg_check_modules"],
    &["set"],
    &["catkin_python_setup"],
    &["add_definitions"],
    &["add_message_files"],
    &["add_service_files"],
    &["add_action_files"],
    &["generate_dynamic_reconfigure_options"],
    &["generate_messages"],
    &["catkin_package"],
    &["catkin_metapackage"],
    BUILD_TARGET_COMMANDS,
    &["include_directories"],
    &["roslint_cpp", "roslint_python", "roslint_add_test"],
    &["catkin_add_gtest"],
    &[GROUP_KEY],
    &["install", "catkin_install_python"],
];

static ORDERING_INSTALL_FIRST: &[&[&str]] = &[
    &["cmake_minimum_required"],
    &["project"],
    &["set_directory_properties"],
    &["find_package"],
    &["pkg_check_modules"],
    &["set"],
    &["catkin_python_setup"],
    &["add_definitions"],
    &["add_message_files"],
    &["add_service_files"],
    &["add_action_files"],
    &["generate_dynamic_reconfigure_options"],
    &["generate_messages"],
    &["catkin_package"],
    &["catkin_metapackage"],
    BUILD_TARGET_COMMANDS,
    &["include_directories"],
    &["install", "catkin_install_python"],
    &["roslint_cpp", "roslint_python", "roslint_add_test"],
    &["catkin_add_gtest"],
    &[GROUP_KEY],
];

/// The bucket table matching a document's layout convention
pub fn ordering_table(style: DocumentStyle) -> &'static [&'static [&'static str]] {
    match style {
        DocumentStyle::InstallFirst => ORDERING_INSTALL_FIRST,
        DocumentStyle::TestFirst | DocumentStyle::Mixed | DocumentStyle::Neither => {
            ORDERING_TEST_FIRST
        }
    }
}

/// Table position of a command name. Names absent from the table sort after
/// every present name; that is a recoverable situation, not an error.
pub fn ordering_index(name: &str, table: &[&[&str]]) -> usize {
    for (i, bucket) in table.iter().enumerate() {
        if bucket.contains(&name) {
            return i;
        }
    }
    if !name.is_empty() {
        log::warn!("no canonical ordering position for {:?}, sorting last", name);
    }
    table.len()
}

/// Secondary key within a shared bucket
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TieBreak {
    /// Pure table-position order; stable sort keeps the original order
    Neutral,
    /// `(first-seen artifact index, command rank within the bucket)`
    Anchor(usize, usize),
    /// The opening guard's first non-trivial argument
    Guard(String),
}

/// Full sort key of one content node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    pub bucket: usize,
    pub tie: TieBreak,
}

fn build_target_tie(command: &Command, anchors: &mut Vec<String>) -> TieBreak {
    let Some(token) = command.first_token() else {
        return TieBreak::Neutral;
    };
    let anchor = match anchors.iter().position(|a| a == token) {
        Some(i) => i,
        None => {
            anchors.push(token.to_string());
            anchors.len() - 1
        }
    };
    let rank = BUILD_TARGET_COMMANDS
        .iter()
        .position(|name| *name == command.name)
        .unwrap_or(0);
    TieBreak::Anchor(anchor, rank)
}

/// Compute a node's sort key. `anchors` is the first-seen order of build
/// artifacts across the document and grows as new artifacts appear.
pub fn sort_key(item: &ContentItem, anchors: &mut Vec<String>, table: &[&[&str]]) -> SortKey {
    match item {
        ContentItem::Text(_) => SortKey {
            bucket: table.len() + 1,
            tie: TieBreak::Neutral,
        },
        ContentItem::Command(command) => {
            let bucket = ordering_index(&command.name, table);
            let tie = if BUILD_TARGET_COMMANDS.contains(&command.name.as_str()) {
                build_target_tie(command, anchors)
            } else {
                TieBreak::Neutral
            };
            SortKey { bucket, tie }
        }
        ContentItem::Group(group) => SortKey {
            bucket: ordering_index(GROUP_KEY, table),
            tie: match group.guard_token() {
                Some(token) => TieBreak::Guard(token.to_string()),
                None => TieBreak::Neutral,
            },
        },
    }
}
