//! Token definitions for CMake text
//!
//! The tokens are defined using the logos derive macro. Every variant keeps
//! the exact text it was produced from, so a parsed command can reproduce
//! its original source byte-for-byte.

use logos::Logos;
use serde::{Deserialize, Serialize};

/// All possible tokens in a CMake build script
#[derive(Logos, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    /// A `#` comment running through end-of-line (newline included when present)
    #[regex(r"#[^\n]*\n?", |lex| lex.slice().to_owned())]
    Comment(String),

    /// A double-quoted run, no escape processing
    #[regex(r#""[^"]*""#, |lex| lex.slice().to_owned())]
    Quoted(String),

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    /// Uppercase letters and underscores only - the keyword-argument signal
    #[regex(r"[A-Z_]+", |lex| lex.slice().to_owned(), priority = 3)]
    CapsWord(String),

    /// Maximal run excluding whitespace, parens, quotes and comment markers
    #[regex(r#"[^ \t\r\n()#"]+"#, |lex| lex.slice().to_owned())]
    Word(String),

    /// A newline on its own, distinct from other whitespace for style capture
    #[token("\n")]
    Newline,

    /// A run of spaces and tabs
    #[regex(r"[ \t]+", |lex| lex.slice().to_owned())]
    Whitespace(String),
}

impl Token {
    /// The exact source text this token was produced from
    pub fn literal(&self) -> &str {
        match self {
            Token::Comment(s)
            | Token::Quoted(s)
            | Token::CapsWord(s)
            | Token::Word(s)
            | Token::Whitespace(s) => s,
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::Newline => "\n",
        }
    }

    /// Whitespace or newline
    pub fn is_space(&self) -> bool {
        matches!(self, Token::Whitespace(_) | Token::Newline)
    }

    /// Whitespace, newline or comment - never part of a section's values
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace(_) | Token::Newline | Token::Comment(_)
        )
    }

    /// Can this token begin a command name?
    pub fn is_word(&self) -> bool {
        matches!(self, Token::Word(_) | Token::CapsWord(_))
    }
}
