//! The scanner: characters in, tokens out.

use slate_util::Span;

use crate::cursor::Cursor;
use crate::token::{keyword_from_ident, Token, TokenKind};
use crate::LexError;

/// Lexes a whole source string into a token list ending with `Eof`.
///
/// # Examples
///
/// ```
/// use slate_lex::{tokenize, TokenKind};
///
/// let tokens = tokenize("x = 1\n").unwrap();
/// let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     vec![
///         TokenKind::Name,
///         TokenKind::Assign,
///         TokenKind::Number,
///         TokenKind::Newline,
///         TokenKind::Eof,
///     ]
/// );
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

/// The Slate lexer.
///
/// Wraps a [`Cursor`] and scans one token per [`Lexer::next_token`] call.
/// Horizontal whitespace and `//` comments are skipped; newlines are
/// significant and produce their own tokens.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,

    /// Start byte offset of the token being scanned.
    token_start: usize,

    /// Start line of the token being scanned.
    token_line: u32,

    /// Start column of the token being scanned.
    token_column: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            token_start: 0,
            token_line: 1,
            token_column: 1,
        }
    }

    /// Scans and returns the next token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_insignificant();

        self.token_start = self.cursor.position();
        self.token_line = self.cursor.line();
        self.token_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Ok(self.make(TokenKind::Eof, ""));
        }

        match self.cursor.current_char() {
            '\n' => {
                self.cursor.advance();
                Ok(self.make(TokenKind::Newline, "\n"))
            }
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LSqBrace),
            ']' => self.single(TokenKind::RSqBrace),
            ',' => self.single(TokenKind::Comma),
            '+' | '-' | '*' | '/' | '^' => self.single(TokenKind::Operation),
            '=' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Ok(self.spanned(TokenKind::Compare))
                } else {
                    Ok(self.spanned(TokenKind::Assign))
                }
            }
            '!' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Ok(self.spanned(TokenKind::Compare))
                } else {
                    Err(LexError::UnexpectedChar {
                        ch: '!',
                        offset: self.token_start,
                        span: self.current_span(),
                    })
                }
            }
            '<' | '>' => {
                self.cursor.advance();
                self.cursor.match_char('=');
                Ok(self.spanned(TokenKind::Compare))
            }
            '.' => {
                if self.cursor.peek_char(1).is_ascii_digit() {
                    self.lex_number()
                } else {
                    self.single(TokenKind::Dot)
                }
            }
            '"' | '\'' => self.lex_string(),
            c if c.is_ascii_digit() => self.lex_number(),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.lex_identifier()),
            c => Err(LexError::UnexpectedChar {
                ch: c,
                offset: self.token_start,
                span: self.current_span(),
            }),
        }
    }

    /// Skips horizontal whitespace, carriage returns, and `//` comments.
    ///
    /// Newlines are left in place so [`Lexer::next_token`] can emit them.
    fn skip_insignificant(&mut self) {
        loop {
            match self.cursor.current_char() {
                ' ' | '\t' | '\r' => self.cursor.advance(),
                '/' if self.cursor.peek_char(1) == '/' => {
                    while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                        self.cursor.advance();
                    }
                }
                _ => return,
            }
        }
    }

    /// Scans an identifier and promotes reserved words.
    fn lex_identifier(&mut self) -> Token {
        loop {
            let c = self.cursor.current_char();
            if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(self.token_start);
        let kind = keyword_from_ident(text).unwrap_or(TokenKind::Name);
        self.spanned(kind)
    }

    /// Scans an integer or decimal literal.
    ///
    /// Accepts `12`, `12.5`, and `.5`. A trailing dot is not part of the
    /// number, so `a.length`-style member access after a digit run still
    /// lexes as number-dot-name.
    fn lex_number(&mut self) -> Result<Token, LexError> {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        Ok(self.spanned(TokenKind::Number))
    }

    /// Scans a string literal delimited by `"` or `'`.
    ///
    /// The outer quotes are stripped here: the token's lexeme is the
    /// content between them. The literal must close on the same line.
    fn lex_string(&mut self) -> Result<Token, LexError> {
        let quote = self.cursor.current_char();
        self.cursor.advance();
        let content_start = self.cursor.position();

        loop {
            if self.cursor.is_at_end() || self.cursor.current_char() == '\n' {
                return Err(LexError::UnterminatedString {
                    span: self.current_span(),
                });
            }
            if self.cursor.current_char() == quote {
                break;
            }
            self.cursor.advance();
        }

        let content = self.cursor.slice_from(content_start).to_string();
        self.cursor.advance(); // closing quote
        Ok(Token::new(TokenKind::Str, content, self.current_span()))
    }

    /// Consumes one character and emits it as `kind`.
    fn single(&mut self, kind: TokenKind) -> Result<Token, LexError> {
        self.cursor.advance();
        Ok(self.spanned(kind))
    }

    /// Builds a token whose lexeme is the scanned source slice.
    fn spanned(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            self.cursor.slice_from(self.token_start),
            self.current_span(),
        )
    }

    /// Builds a token with an explicit lexeme.
    fn make(&self, kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, self.current_span())
    }

    /// Span from the token start to the cursor.
    fn current_span(&self) -> Span {
        Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_line,
            self.token_column,
        )
    }
}
