//! Error types for lexing and parsing CMake text

use std::fmt;
use std::ops::Range;

/// A byte run in the input matched none of the token patterns.
///
/// Lexing is all-or-nothing: no partial token stream is produced, so a
/// `LexError` always fails the whole parse of that file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Byte range of the unrecognized input
    pub span: Range<usize>,
    /// The offending text itself
    pub fragment: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized input at bytes {}..{}: {:?}",
            self.span.start, self.span.end, self.fragment
        )
    }
}

impl std::error::Error for LexError {}

/// Errors that can occur while building a document from a token stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Tokenization failed
    Lex(LexError),
    /// The token stream ended while a command's parentheses were unbalanced
    UnexpectedEof { command_name: String },
    /// A token that cannot start a content node appeared at document level
    UnexpectedToken { token: String },
    /// A specific token kind was required but something else was found
    Expected {
        expected: &'static str,
        found: String,
    },
    /// `parse_one` was given text that does not hold exactly one command
    NotASingleCommand { found: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(err) => write!(f, "{}", err),
            ParseError::UnexpectedEof { command_name } => {
                write!(f, "input ended while processing command {:?}", command_name)
            }
            ParseError::UnexpectedToken { token } => {
                write!(f, "unexpected token {:?} at document level", token)
            }
            ParseError::Expected { expected, found } => {
                write!(f, "expected {} but found {:?}", expected, found)
            }
            ParseError::NotASingleCommand { found } => {
                write!(f, "expected exactly one command, found {}", found)
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Lex(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::Lex(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_display() {
        let err = LexError {
            span: 4..6,
            fragment: "\r\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unrecognized input at bytes 4..6: \"\\r\\n\""
        );
    }

    #[test]
    fn test_parse_error_wraps_lex_error() {
        let lex = LexError {
            span: 0..1,
            fragment: "\r".to_string(),
        };
        let parse: ParseError = lex.clone().into();
        assert_eq!(parse, ParseError::Lex(lex));
    }

    #[test]
    fn test_unbalanced_display_names_command() {
        let err = ParseError::UnexpectedEof {
            command_name: "install".to_string(),
        };
        assert!(err.to_string().contains("install"));
    }
}
