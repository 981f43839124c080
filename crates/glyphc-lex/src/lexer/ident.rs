//! Identifier, keyword, and emoji lexing.

use glyphc_util::Span;

use crate::token::Token;
use crate::unicode;
use crate::Lexer;

/// ASCII keyword table. Long and short spellings both accepted; `bool` is a
/// synonym for `i32` and `v` for `void`.
fn check_keyword(word: &str) -> Option<Token> {
    let tok = match word {
        "ext" | "extern" => Token::Ext,
        "fn" => Token::Fn,
        "ret" => Token::Ret,
        "if" => Token::If,
        "el" => Token::El,
        "wh" => Token::Wh,
        "for" => Token::For,
        "match" => Token::Match,
        "st" | "struct" => Token::St,
        "enum" => Token::Enum,
        "use" => Token::Use,
        "as" => Token::As,
        "sz" | "sizeof" => Token::Sz,
        "null" => Token::Null,
        "brk" | "break" => Token::Brk,
        "cont" | "continue" => Token::Cont,
        "nw" | "new" => Token::Nw,
        "del" | "delete" => Token::Del,
        "asm" => Token::Asm,
        "ct" => Token::Ct,
        "defer" => Token::Defer,
        "var" => Token::Var,
        "i8" => Token::I8,
        "i16" => Token::I16,
        "i32" => Token::I32,
        "i64" => Token::I64,
        "u8" => Token::U8,
        "u16" => Token::U16,
        "u32" => Token::U32,
        "u64" => Token::U64,
        "f32" => Token::F32,
        "f64" => Token::F64,
        "bool" => Token::I32,
        "v" | "void" => Token::Void,
        _ => return None,
    };
    Some(tok)
}

impl<'a> Lexer<'a> {
    /// Lex an identifier or keyword.
    pub(crate) fn lex_ident(&mut self) -> (Token, Span) {
        let start = self.cursor.position();
        while unicode::is_ascii_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }
        let word = self.cursor.slice_from(start);
        match check_keyword(word) {
            Some(tok) => self.make(tok),
            None => {
                let name = word.to_string();
                self.make(Token::Ident(name))
            },
        }
    }

    /// Lex a non-ASCII code point: an emoji keyword, a stdlib alias, or an
    /// error. An optional variation selector after the symbol is consumed.
    pub(crate) fn lex_emoji(&mut self) -> (Token, Span) {
        let cp = self.cursor.current_char();
        self.cursor.advance();
        if self.cursor.current_char() == unicode::VARIATION_SELECTOR {
            self.cursor.advance();
        }
        if let Some(tok) = unicode::keyword_emoji(cp) {
            return self.make(tok);
        }
        if let Some(name) = unicode::stdlib_emoji(cp) {
            return self.make(Token::Ident(name.to_string()));
        }
        self.error("unexpected character")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_one(source: &str) -> Token {
        let mut lexer = Lexer::new(source);
        lexer.next_token().0
    }

    #[test]
    fn test_keywords() {
        assert_eq!(lex_one("fn"), Token::Fn);
        assert_eq!(lex_one("ret"), Token::Ret);
        assert_eq!(lex_one("wh"), Token::Wh);
        assert_eq!(lex_one("defer"), Token::Defer);
        assert_eq!(lex_one("match"), Token::Match);
    }

    #[test]
    fn test_long_spellings() {
        assert_eq!(lex_one("struct"), Token::St);
        assert_eq!(lex_one("extern"), Token::Ext);
        assert_eq!(lex_one("sizeof"), Token::Sz);
        assert_eq!(lex_one("break"), Token::Brk);
        assert_eq!(lex_one("continue"), Token::Cont);
        assert_eq!(lex_one("new"), Token::Nw);
        assert_eq!(lex_one("delete"), Token::Del);
    }

    #[test]
    fn test_type_keywords() {
        assert_eq!(lex_one("i8"), Token::I8);
        assert_eq!(lex_one("u64"), Token::U64);
        assert_eq!(lex_one("f32"), Token::F32);
        assert_eq!(lex_one("v"), Token::Void);
        assert_eq!(lex_one("void"), Token::Void);
    }

    #[test]
    fn test_bool_aliases_i32() {
        assert_eq!(lex_one("bool"), Token::I32);
    }

    #[test]
    fn test_identifier() {
        assert_eq!(lex_one("foo_bar2"), Token::Ident("foo_bar2".into()));
        assert_eq!(lex_one("_x"), Token::Ident("_x".into()));
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(lex_one("fnord"), Token::Ident("fnord".into()));
        assert_eq!(lex_one("structure"), Token::Ident("structure".into()));
    }

    #[test]
    fn test_emoji_keywords() {
        assert_eq!(lex_one("🔧"), Token::Fn);
        assert_eq!(lex_one("↩"), Token::Ret);
        assert_eq!(lex_one("❓"), Token::If);
        assert_eq!(lex_one("➰"), Token::For);
        assert_eq!(lex_one("🔜"), Token::Defer);
        assert_eq!(lex_one("💎"), Token::U64);
    }

    #[test]
    fn test_variation_selector_skipped() {
        assert_eq!(lex_one("🗑\u{FE0F}"), Token::Del);
    }

    #[test]
    fn test_stdlib_alias() {
        assert_eq!(lex_one("🖨"), Token::Ident("printf".into()));
        assert_eq!(lex_one("🧠"), Token::Ident("malloc".into()));
    }

    #[test]
    fn test_unknown_emoji_is_error() {
        assert!(matches!(lex_one("🦀"), Token::Error(_)));
    }
}
