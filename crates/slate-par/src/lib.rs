//! slate-par - Recursive-descent parser for Slate.
//!
//! The parser consumes the token list produced by `slate-lex` and builds
//! the typed AST defined in [`ast`]. Statements are dispatched on the
//! current token kind; expressions go through a fixed precedence ladder
//! (see `expr.rs`):
//!
//! ```text
//! assignment
//!   logical        AND OR
//!     comparison   == != > < >= <=
//!       additive   + -
//!         multiplicative   * / MOD DIV
//!           unary          NOT, leading -
//!             postfix      .member  .member(args)  [index]
//!               primary    literals, names, calls, ( ), [ ]
//! ```
//!
//! All binary levels are left-associative. There is no error recovery:
//! the first mismatch aborts with a [`ParseError`].

pub mod ast;

mod expr;
mod stmt;

use slate_lex::{Token, TokenKind};
use slate_util::Span;
use thiserror::Error;

use ast::Program;

/// Errors produced while parsing.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    /// The token stream did not match the grammar.
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// What the grammar wanted here.
        expected: String,
        /// What was actually there (kind or lexeme).
        found: String,
        /// Location of the offending token.
        span: Span,
    },

    /// The token stream ran out mid-construct.
    #[error("hit end of input while parsing {context}")]
    UnexpectedEof {
        /// The construct being parsed.
        context: String,
    },

    /// `return` appeared inside a `procedure`.
    #[error("procedure cannot return a value")]
    ReturnInProcedure {
        /// Location of the `return` keyword.
        span: Span,
    },

    /// A numeric literal did not fit its type.
    #[error("invalid number literal '{lexeme}'")]
    InvalidNumber {
        /// The literal text.
        lexeme: String,
        /// Location of the literal.
        span: Span,
    },
}

impl ParseError {
    /// Returns the source location of the error, if it has one.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { .. } => Span::DUMMY,
            ParseError::ReturnInProcedure { span } => *span,
            ParseError::InvalidNumber { span, .. } => *span,
        }
    }
}

/// Parses a token list into a [`Program`].
///
/// Stray newlines at the top level are consumed silently; everything else
/// must be a statement.
///
/// # Examples
///
/// ```
/// use slate_lex::tokenize;
/// use slate_par::parse;
///
/// let program = parse(tokenize("x = 1 + 2\n").unwrap()).unwrap();
/// assert_eq!(program.body.len(), 1);
/// ```
pub fn parse(tokens: Vec<Token>) -> Result<Program, ParseError> {
    Parser::new(tokens).parse()
}

/// The Slate parser.
pub struct Parser {
    /// Token stream from the lexer, `Eof`-terminated.
    tokens: Vec<Token>,

    /// Current position in the token stream.
    position: usize,
}

impl Parser {
    /// Creates a parser over an `Eof`-terminated token list.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parses the whole token stream.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::default();

        while self.current_kind() != TokenKind::Eof {
            if self.current_kind() == TokenKind::Newline {
                self.advance();
                continue;
            }
            program.body.push(self.parse_stmt()?);
        }

        Ok(program)
    }

    // =========================================================================
    // Token stream helpers
    // =========================================================================

    /// The current token.
    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    /// The current token's kind.
    pub(crate) fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    /// The token after the current one.
    pub(crate) fn peek(&self) -> &Token {
        let idx = (self.position + 1).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// Consumes and returns the current token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    /// Consumes the current token if it has the given kind.
    pub(crate) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.current_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the current token, failing unless it has the given kind.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.current_kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    /// Consumes a statement terminator: a newline, or end of input.
    ///
    /// `Eof` is left in place so the top-level loop sees it.
    pub(crate) fn newline_or_eof(&mut self) -> Result<(), ParseError> {
        match self.current_kind() {
            TokenKind::Eof => Ok(()),
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            _ => Err(self.unexpected("newline or end of input")),
        }
    }

    /// Skips over consecutive newline tokens.
    pub(crate) fn skip_newlines(&mut self) {
        while self.current_kind() == TokenKind::Newline {
            self.advance();
        }
    }

    /// Builds an `UnexpectedToken` error at the current token.
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        if token.kind == TokenKind::Eof {
            return ParseError::UnexpectedEof {
                context: expected.to_string(),
            };
        }
        let found = match token.kind {
            TokenKind::Name | TokenKind::Number | TokenKind::Operation | TokenKind::Compare => {
                format!("'{}'", token.lexeme)
            }
            TokenKind::Newline => "newline".to_string(),
            _ => token.kind.to_string(),
        };
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found,
            span: token.span,
        }
    }
}
