//! A keyword-or-positional argument group within a command

use std::fmt;

use serde::Serialize;

use super::style::SectionStyle;

/// One argument group of a command.
///
/// `name` is non-empty only when the source token was an all-caps word -
/// that is the sole signal distinguishing a keyword section from positional
/// values. A section is valid iff it has a name or at least one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub name: String,
    pub values: Vec<String>,
    pub style: SectionStyle,
}

impl Section {
    /// A fresh named section; each call constructs its own empty value list
    pub fn new(name: &str) -> Self {
        Section {
            name: name.to_string(),
            values: Vec::new(),
            style: SectionStyle::default(),
        }
    }

    pub fn with_values(name: &str, values: Vec<String>) -> Self {
        Section {
            name: name.to_string(),
            values,
            style: SectionStyle::default(),
        }
    }

    pub fn add(&mut self, value: &str) {
        self.values.push(value.to_string());
    }

    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() || !self.values.is_empty()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.style.prename)?;
        if !self.name.is_empty() {
            write!(f, "{}", self.name)?;
            if !self.values.is_empty() {
                write!(f, "{}", self.style.name_value_sep)?;
            }
        }
        write!(f, "{}", self.values.join(&self.style.value_sep))
    }
}
