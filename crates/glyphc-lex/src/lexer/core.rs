//! Main lexer struct and dispatch.

use glyphc_util::Span;

use crate::cursor::{Cursor, CursorSnapshot};
use crate::token::Token;
use crate::unicode;

/// On-demand tokenizer for Glyph source.
pub struct Lexer<'a> {
    pub(crate) cursor: Cursor<'a>,
    token_start: usize,
    token_line: u32,
    token_col: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            token_start: 0,
            token_line: 1,
            token_col: 1,
        }
    }

    /// Produce the next token and its span.
    pub fn next_token(&mut self) -> (Token, Span) {
        self.skip_space();

        // line comment: skip to end of line, the newline branch below
        // produces the terminator token
        if self.cursor.current_char() == '/' && self.cursor.peek_char(1) == '/' {
            while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                self.cursor.advance();
            }
        }

        self.mark_start();

        if self.cursor.is_at_end() {
            return self.make(Token::Eof);
        }

        let c = self.cursor.current_char();

        // collapse a run of newlines (and interleaved whitespace/comments)
        // into one terminator token
        if c == '\n' {
            self.cursor.advance();
            loop {
                match self.cursor.current_char() {
                    '\n' | ' ' | '\t' | '\r' => self.cursor.advance(),
                    _ => break,
                }
            }
            if self.cursor.current_char() == '/' && self.cursor.peek_char(1) == '/' {
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance();
                }
                return self.next_token();
            }
            return self.make(Token::Newline);
        }

        if c == '\r' {
            self.cursor.advance();
            return self.next_token();
        }

        if unicode::is_ascii_ident_start(c) {
            return self.lex_ident();
        }
        if c.is_ascii_digit() {
            return self.lex_number();
        }
        if c == '"' {
            return self.lex_string();
        }
        if self.cursor.at_non_ascii() {
            return self.lex_emoji();
        }

        self.lex_operator(c)
    }

    /// Save lexer position for bounded lookahead.
    pub fn snapshot(&self) -> CursorSnapshot {
        self.cursor.snapshot()
    }

    /// Rewind to a saved position.
    pub fn restore(&mut self, snapshot: CursorSnapshot) {
        self.cursor.restore(snapshot);
    }

    fn skip_space(&mut self) {
        while matches!(self.cursor.current_char(), ' ' | '\t') {
            self.cursor.advance();
        }
    }

    pub(crate) fn mark_start(&mut self) {
        self.token_start = self.cursor.position();
        self.token_line = self.cursor.line();
        self.token_col = self.cursor.column();
    }

    pub(crate) fn make(&self, token: Token) -> (Token, Span) {
        let span = Span::new(
            self.token_start,
            self.cursor.position() - self.token_start,
            self.token_line,
            self.token_col,
        );
        (token, span)
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> (Token, Span) {
        self.make(Token::Error(message.into()))
    }
}
