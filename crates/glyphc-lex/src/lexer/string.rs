//! String literal lexing.

use glyphc_util::Span;

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lex a double-quoted string. Escapes `\n \t \\ \" \0 \r` decode to
    /// their byte; an unknown escape keeps the raw character. Newlines are
    /// permitted inside the literal; only end-of-input is unterminated.
    pub(crate) fn lex_string(&mut self) -> (Token, Span) {
        self.cursor.advance();

        let mut content = String::new();
        loop {
            if self.cursor.is_at_end() {
                return self.error("unterminated string");
            }
            let c = self.cursor.current_char();
            if c == '"' {
                self.cursor.advance();
                break;
            }
            if c == '\\' {
                self.cursor.advance();
                let e = self.cursor.current_char();
                content.push(match e {
                    'n' => '\n',
                    't' => '\t',
                    '\\' => '\\',
                    '"' => '"',
                    '0' => '\0',
                    'r' => '\r',
                    other => other,
                });
                self.cursor.advance();
            } else {
                content.push(c);
                self.cursor.advance();
            }
        }

        self.make(Token::Str(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_str(source: &str) -> Token {
        let mut lexer = Lexer::new(source);
        lexer.next_token().0
    }

    #[test]
    fn test_simple_string() {
        assert_eq!(lex_str("\"hello\""), Token::Str("hello".into()));
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(lex_str("\"\""), Token::Str("".into()));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(lex_str(r#""a\nb\tc""#), Token::Str("a\nb\tc".into()));
        assert_eq!(lex_str(r#""q\"q""#), Token::Str("q\"q".into()));
        assert_eq!(lex_str(r#""x\\y""#), Token::Str("x\\y".into()));
        assert_eq!(lex_str(r#""nul\0end""#), Token::Str("nul\0end".into()));
        assert_eq!(lex_str(r#""cr\r""#), Token::Str("cr\r".into()));
    }

    #[test]
    fn test_unknown_escape_keeps_char() {
        assert_eq!(lex_str(r#""\q""#), Token::Str("q".into()));
    }

    #[test]
    fn test_unterminated() {
        assert!(matches!(lex_str("\"oops"), Token::Error(_)));
    }
}
