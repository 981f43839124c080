//! Operator and punctuation lexing, maximal munch.

use glyphc_util::Span;

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    pub(crate) fn lex_operator(&mut self, c: char) -> (Token, Span) {
        self.cursor.advance();
        let tok = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            ';' => Token::Semi,
            '~' => Token::Tilde,
            '^' => Token::Caret,
            '?' => Token::Question,
            '+' => {
                if self.cursor.match_char('=') {
                    Token::PlusEq
                } else {
                    Token::Plus
                }
            },
            '%' => {
                if self.cursor.match_char('=') {
                    Token::PercentEq
                } else {
                    Token::Percent
                }
            },
            '/' => {
                if self.cursor.match_char('=') {
                    Token::SlashEq
                } else {
                    Token::Slash
                }
            },
            '*' => {
                if self.cursor.match_char('=') {
                    Token::StarEq
                } else {
                    Token::Star
                }
            },
            '&' => {
                if self.cursor.match_char('&') {
                    Token::AndAnd
                } else {
                    Token::Amp
                }
            },
            '|' => {
                if self.cursor.match_char('|') {
                    Token::OrOr
                } else if self.cursor.match_char('>') {
                    Token::PipeGt
                } else {
                    Token::Pipe
                }
            },
            '!' => {
                if self.cursor.match_char('=') {
                    Token::NotEq
                } else {
                    Token::Bang
                }
            },
            '=' => {
                if self.cursor.match_char('=') {
                    Token::EqEq
                } else {
                    Token::Eq
                }
            },
            '<' => {
                if self.cursor.match_char('=') {
                    Token::LtEq
                } else if self.cursor.match_char('<') {
                    Token::Shl
                } else {
                    Token::Lt
                }
            },
            '>' => {
                if self.cursor.match_char('=') {
                    Token::GtEq
                } else if self.cursor.match_char('>') {
                    Token::Shr
                } else {
                    Token::Gt
                }
            },
            ':' => {
                if self.cursor.match_char('=') {
                    Token::ColonEq
                } else {
                    Token::Colon
                }
            },
            '-' => {
                if self.cursor.match_char('>') {
                    Token::Arrow
                } else if self.cursor.match_char('=') {
                    Token::MinusEq
                } else {
                    Token::Minus
                }
            },
            '.' => {
                if self.cursor.match_char('.') {
                    if self.cursor.match_char('=') {
                        Token::DotDotEq
                    } else if self.cursor.match_char('.') {
                        Token::Ellipsis
                    } else {
                        Token::DotDot
                    }
                } else {
                    Token::Dot
                }
            },
            _ => return self.error("unexpected character"),
        };
        self.make(tok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_op(source: &str) -> Token {
        let mut lexer = Lexer::new(source);
        lexer.next_token().0
    }

    #[test]
    fn test_single_char_ops() {
        assert_eq!(lex_op("+"), Token::Plus);
        assert_eq!(lex_op("-"), Token::Minus);
        assert_eq!(lex_op("*"), Token::Star);
        assert_eq!(lex_op("/"), Token::Slash);
        assert_eq!(lex_op("%"), Token::Percent);
        assert_eq!(lex_op("&"), Token::Amp);
        assert_eq!(lex_op("|"), Token::Pipe);
        assert_eq!(lex_op("^"), Token::Caret);
        assert_eq!(lex_op("~"), Token::Tilde);
        assert_eq!(lex_op("!"), Token::Bang);
        assert_eq!(lex_op("?"), Token::Question);
        assert_eq!(lex_op("."), Token::Dot);
    }

    #[test]
    fn test_comparison_ops() {
        assert_eq!(lex_op("=="), Token::EqEq);
        assert_eq!(lex_op("!="), Token::NotEq);
        assert_eq!(lex_op("<="), Token::LtEq);
        assert_eq!(lex_op(">="), Token::GtEq);
        assert_eq!(lex_op("<"), Token::Lt);
        assert_eq!(lex_op(">"), Token::Gt);
    }

    #[test]
    fn test_shift_and_logic() {
        assert_eq!(lex_op("<<"), Token::Shl);
        assert_eq!(lex_op(">>"), Token::Shr);
        assert_eq!(lex_op("&&"), Token::AndAnd);
        assert_eq!(lex_op("||"), Token::OrOr);
    }

    #[test]
    fn test_assignment_ops() {
        assert_eq!(lex_op("="), Token::Eq);
        assert_eq!(lex_op(":="), Token::ColonEq);
        assert_eq!(lex_op("+="), Token::PlusEq);
        assert_eq!(lex_op("-="), Token::MinusEq);
        assert_eq!(lex_op("*="), Token::StarEq);
        assert_eq!(lex_op("/="), Token::SlashEq);
        assert_eq!(lex_op("%="), Token::PercentEq);
    }

    #[test]
    fn test_arrow_colon_pipe() {
        assert_eq!(lex_op("->"), Token::Arrow);
        assert_eq!(lex_op(":"), Token::Colon);
        assert_eq!(lex_op("|>"), Token::PipeGt);
    }

    #[test]
    fn test_dots() {
        assert_eq!(lex_op(".."), Token::DotDot);
        assert_eq!(lex_op("..="), Token::DotDotEq);
        assert_eq!(lex_op("..."), Token::Ellipsis);
    }
}
