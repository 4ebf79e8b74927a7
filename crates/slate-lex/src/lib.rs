//! slate-lex - Lexical analysis for Slate source code.
//!
//! The lexer turns a source string into a flat token list terminated by
//! [`TokenKind::Eof`]. Scanning is longest-match over a fixed rule set;
//! identifiers that match a reserved word are retagged to that word's
//! token kind, and the word operators `MOD DIV AND OR NOT` are retagged
//! to [`TokenKind::Operation`].
//!
//! Two properties matter to the rest of the pipeline:
//!
//! - Newlines are statement separators, so `\n` emits an explicit
//!   [`TokenKind::Newline`] token rather than being skipped with the rest
//!   of the whitespace.
//! - String tokens carry the *unquoted* content as their lexeme; the
//!   parser never sees the quote characters.
//!
//! Lexing is one-shot: [`tokenize`] runs to completion before the parser
//! starts, and the first unrecognised character aborts with a [`LexError`].

mod cursor;
mod lexer;
mod token;

pub use cursor::Cursor;
pub use lexer::{tokenize, Lexer};
pub use token::{keyword_from_ident, Token, TokenKind};

use slate_util::Span;
use thiserror::Error;

/// Errors produced while scanning source text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LexError {
    /// No lexer rule matched at this position.
    #[error("unexpected character '{ch}' at byte offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Byte offset of the character in the source.
        offset: usize,
        /// Location of the character.
        span: Span,
    },

    /// A string literal ran into a newline or the end of input.
    #[error("unterminated string literal")]
    UnterminatedString {
        /// Location of the opening quote.
        span: Span,
    },
}

impl LexError {
    /// Returns the source location of the error.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
        }
    }
}
