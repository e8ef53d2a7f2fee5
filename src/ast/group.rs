//! A matched guard/end-guard block with a nested sub-document

use std::fmt;

use serde::Serialize;

use super::command::Command;
use crate::document::Document;

/// A balanced guarded block, e.g. `if(...)` ... `endif()` or
/// `foreach(...)` ... `endforeach()`.
///
/// The body is a distinct [`Document`] one nesting level deeper, owned
/// outright by the group - sibling documents share nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandGroup {
    pub open: Command,
    pub body: Document,
    pub close: Command,
}

impl CommandGroup {
    pub fn new(open: Command, body: Document, close: Command) -> Self {
        CommandGroup { open, body, close }
    }

    /// The guard's first non-trivial argument: the section name when the
    /// guard is a keyword (e.g. `CATKIN_ENABLE_TESTING`), otherwise its
    /// first value
    pub fn guard_token(&self) -> Option<&str> {
        let section = self.open.sections().next()?;
        if !section.name.is_empty() {
            Some(&section.name)
        } else {
            section.values.first().map(String::as_str)
        }
    }
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.open, self.body, self.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_group_round_trip() {
        let source = "if(CATKIN_ENABLE_TESTING)\n  catkin_add_gtest(t test/t.cpp)\nendif()\n";
        let doc = parse(source).unwrap();
        assert_eq!(doc.to_string(), source);
    }

    #[test]
    fn test_guard_token_keyword() {
        let doc = parse("if(CATKIN_ENABLE_TESTING)\nendif()\n").unwrap();
        let group = doc.groups()[0];
        assert_eq!(group.guard_token(), Some("CATKIN_ENABLE_TESTING"));
    }

    #[test]
    fn test_guard_token_positional() {
        let doc = parse("foreach(dir ${dirs})\nendforeach()\n").unwrap();
        let group = doc.groups()[0];
        assert_eq!(group.guard_token(), Some("dir"));
    }
}
