//! # cmakedoc
//!
//! A style-preserving parser and rewriter for CMake build scripts.
//!
//! A `CMakeLists.txt` file parses into a [`Document`]: an ordered list of
//! commands, guarded command groups and raw text fragments, indexed by
//! command name. Callers query and mutate the document through a structured
//! API ([`Document::section_check`], [`Document::add_command`], ...),
//! optionally canonicalize its layout with [`Document::enforce_ordering`],
//! and serialize it back with `to_string()`.
//!
//! The central fidelity contract: any command left untouched reproduces its
//! original text byte-for-byte, while any touched command is regenerated
//! from its structured form using the formatting captured at parse time.

pub mod ast;
pub mod document;
pub mod error;
pub mod lexer;
pub mod ordering;
pub mod parser;

pub use ast::{Command, CommandGroup, Section, SectionItem, SectionStyle};
pub use document::{ContentItem, Document};
pub use error::{LexError, ParseError};
pub use ordering::DocumentStyle;
pub use parser::{parse, parse_one};
