//! Emoji vocabulary tables.
//!
//! Two disjoint maps over single code points: one aliases emoji to keyword
//! tokens, the other to C standard library identifiers. Either may be
//! followed by the emoji variation selector U+FE0F, which the lexer skips.

use crate::token::Token;

/// Emoji variation selector.
pub const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Keyword emoji.
///
/// ```text
/// CONTROL FLOW         DECLARATIONS        MEMORY
/// ❓ if                🔧 fn               ✨ nw
/// ❗ el                📦 st               🗑  del
/// 🔁 wh               🔌 ext
/// ↩  ret              📥 use              MISC
/// 🛑 brk               🏷  enum            🔄 as
/// ⏩ cont                                  📏 sz
/// ➰ for              NEW FEATURES         ∅  null
/// 🎯 match            🔩 asm
/// 🔜 defer            ⚡ ct
///
/// TYPES
/// 💧 i8    📊 i16   🔢 i32   🔷 i64
/// 🔶 u8    📈 u16   🔵 u32   💎 u64
/// 🌊 f32   🌀 f64   ⬛ void
/// ```
pub fn keyword_emoji(cp: char) -> Option<Token> {
    let tok = match cp {
        // control flow
        '\u{2753}' => Token::If,     // ❓
        '\u{2757}' => Token::El,     // ❗
        '\u{1F501}' => Token::Wh,    // 🔁
        '\u{21A9}' => Token::Ret,    // ↩
        '\u{1F6D1}' => Token::Brk,   // 🛑
        '\u{23E9}' => Token::Cont,   // ⏩
        '\u{27B0}' => Token::For,    // ➰
        '\u{1F3AF}' => Token::Match, // 🎯
        '\u{1F51C}' => Token::Defer, // 🔜

        // declarations
        '\u{1F527}' => Token::Fn,   // 🔧
        '\u{1F4E6}' => Token::St,   // 📦
        '\u{1F3F7}' => Token::Enum, // 🏷
        '\u{1F50C}' => Token::Ext,  // 🔌
        '\u{1F4E5}' => Token::Use,  // 📥

        // memory
        '\u{2728}' => Token::Nw,  // ✨
        '\u{1F5D1}' => Token::Del, // 🗑

        // new features
        '\u{1F529}' => Token::Asm, // 🔩
        '\u{26A1}' => Token::Ct,   // ⚡

        // misc
        '\u{1F504}' => Token::As,   // 🔄
        '\u{1F4CF}' => Token::Sz,   // 📏
        '\u{2205}' => Token::Null,  // ∅

        // types - signed int
        '\u{1F4A7}' => Token::I8,  // 💧
        '\u{1F4CA}' => Token::I16, // 📊
        '\u{1F522}' => Token::I32, // 🔢
        '\u{1F537}' => Token::I64, // 🔷

        // types - unsigned int
        '\u{1F536}' => Token::U8,  // 🔶
        '\u{1F4C8}' => Token::U16, // 📈
        '\u{1F535}' => Token::U32, // 🔵
        '\u{1F48E}' => Token::U64, // 💎

        // types - float
        '\u{1F30A}' => Token::F32, // 🌊
        '\u{1F300}' => Token::F64, // 🌀

        // types - void
        '\u{2B1B}' => Token::Void, // ⬛

        _ => return None,
    };
    Some(tok)
}

/// C standard library aliases. Disjoint from the keyword set; each lexes as
/// an identifier token carrying the aliased name.
pub fn stdlib_emoji(cp: char) -> Option<&'static str> {
    let name = match cp {
        '\u{1F5A8}' => "printf",  // 🖨
        '\u{1F4E4}' => "puts",    // 📤
        '\u{2328}' => "getchar",  // ⌨
        '\u{1F9E0}' => "malloc",  // 🧠
        '\u{1F193}' => "free",    // 🆓
        '\u{1F9F5}' => "strlen",  // 🧵
        '\u{1F4CB}' => "strcpy",  // 📋
        '\u{1F517}' => "strcat",  // 🔗
        '\u{2696}' => "strcmp",   // ⚖
        '\u{1F4D1}' => "memcpy",  // 📑
        '\u{1F9F9}' => "memset",  // 🧹
        '\u{1F6AA}' => "exit",    // 🚪
        '\u{1F3B2}' => "rand",    // 🎲
        _ => return None,
    };
    Some(name)
}

pub fn is_ascii_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_ascii_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_emoji() {
        assert_eq!(keyword_emoji('🔧'), Some(Token::Fn));
        assert_eq!(keyword_emoji('↩'), Some(Token::Ret));
        assert_eq!(keyword_emoji('🔢'), Some(Token::I32));
        assert_eq!(keyword_emoji('⬛'), Some(Token::Void));
        assert_eq!(keyword_emoji('🎯'), Some(Token::Match));
        assert_eq!(keyword_emoji('x'), None);
    }

    #[test]
    fn test_stdlib_emoji() {
        assert_eq!(stdlib_emoji('🖨'), Some("printf"));
        assert_eq!(stdlib_emoji('🧠'), Some("malloc"));
        assert_eq!(stdlib_emoji('🆓'), Some("free"));
        assert_eq!(stdlib_emoji('🔧'), None);
    }

    #[test]
    fn test_tables_disjoint() {
        for cp in ['🖨', '📤', '⌨', '🧠', '🆓', '🧵', '📋', '🔗', '⚖', '📑', '🧹', '🚪', '🎲'] {
            assert!(keyword_emoji(cp).is_none(), "{cp} in both tables");
        }
    }
}
