//! Number literal lexing.

use glyphc_util::Span;

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lex an integer (optionally `0x` hex) or a float (`digits.digits`).
    pub(crate) fn lex_number(&mut self) -> (Token, Span) {
        let start = self.cursor.position();

        if self.cursor.current_char() == '0'
            && matches!(self.cursor.peek_char(1), 'x' | 'X')
        {
            self.cursor.advance();
            self.cursor.advance();
            let digits = self.cursor.position();
            while self.cursor.current_char().is_ascii_hexdigit() {
                self.cursor.advance();
            }
            if digits == self.cursor.position() {
                return self.error("no digits after '0x'");
            }
            let text = self.cursor.slice_from(digits);
            return match i64::from_str_radix(text, 16) {
                Ok(value) => self.make(Token::Int(value)),
                Err(_) => self.error("integer literal overflow"),
            };
        }

        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        // float: digit+ '.' digit+
        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
            let text = self.cursor.slice_from(start);
            return match text.parse::<f64>() {
                Ok(value) => self.make(Token::Float(value)),
                Err(_) => self.error("invalid float literal"),
            };
        }

        let text = self.cursor.slice_from(start);
        match text.parse::<i64>() {
            Ok(value) => self.make(Token::Int(value)),
            Err(_) => self.error("integer literal overflow"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_num(source: &str) -> Token {
        let mut lexer = Lexer::new(source);
        lexer.next_token().0
    }

    #[test]
    fn test_decimal() {
        assert_eq!(lex_num("0"), Token::Int(0));
        assert_eq!(lex_num("42"), Token::Int(42));
        assert_eq!(lex_num("123456"), Token::Int(123456));
    }

    #[test]
    fn test_hex() {
        assert_eq!(lex_num("0xFF"), Token::Int(255));
        assert_eq!(lex_num("0x0"), Token::Int(0));
        assert_eq!(lex_num("0Xab"), Token::Int(0xab));
    }

    #[test]
    fn test_float() {
        assert!(matches!(lex_num("3.14"), Token::Float(f) if (f - 3.14).abs() < 1e-9));
        assert!(matches!(lex_num("0.5"), Token::Float(f) if (f - 0.5).abs() < 1e-9));
    }

    #[test]
    fn test_integer_then_dot_is_not_float() {
        // `1..4` must stay Int DotDot Int for ranges
        let mut lexer = Lexer::new("1..4");
        assert_eq!(lexer.next_token().0, Token::Int(1));
        assert_eq!(lexer.next_token().0, Token::DotDot);
        assert_eq!(lexer.next_token().0, Token::Int(4));
    }

    #[test]
    fn test_hex_without_digits() {
        assert!(matches!(lex_num("0x"), Token::Error(_)));
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(lex_num("99999999999999999999"), Token::Error(_)));
    }
}
