//! The structured model of a build script
//!
//! Commands are made of sections; sections carry the formatting they were
//! written with; groups wrap a nested document between a guard and its
//! end-guard. Serialization is `Display` throughout: a clean command replays
//! its original text, everything else renders from structure.

pub mod command;
pub mod group;
pub mod section;
pub mod style;

pub use command::{Command, SectionItem};
pub use group::CommandGroup;
pub use section::Section;
pub use style::SectionStyle;
