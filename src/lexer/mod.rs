//! Lexer for CMake text
//!
//! Tokenization is handled entirely by logos; this module drives the lexer
//! and turns the first unrecognized byte run into a [`LexError`]. Nothing is
//! ever silently dropped - every byte of valid input lands in exactly one
//! token, which is what makes byte-for-byte reproduction possible later.

pub mod tokens;

pub use tokens::Token;

use crate::error::LexError;
use logos::Logos;

/// Tokenize a string and collect all tokens
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(()) => {
                return Err(LexError {
                    span: lexer.span(),
                    fragment: lexer.slice().to_string(),
                })
            }
        }
    }

    Ok(tokens)
}
