//! Captured formatting for a section

use serde::Serialize;

/// The separator text a section was written with in the source.
///
/// A style is only consulted when its owning command is re-rendered
/// structurally; clean commands replay their original text and bypass it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionStyle {
    /// Whitespace/comments before the section name (or first value)
    pub prename: String,
    /// Separator between the section name and its first value
    pub name_value_sep: String,
    /// Separator between consecutive values
    pub value_sep: String,
}

impl SectionStyle {
    pub fn new(prename: &str, name_value_sep: &str, value_sep: &str) -> Self {
        SectionStyle {
            prename: prename.to_string(),
            name_value_sep: name_value_sep.to_string(),
            value_sep: value_sep.to_string(),
        }
    }
}

impl Default for SectionStyle {
    fn default() -> Self {
        SectionStyle::new("", " ", " ")
    }
}
