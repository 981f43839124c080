//! Token definitions for the Glyph language.

use std::fmt;

/// A lexical unit. Literal variants carry their decoded payload; everything
/// else is identified by the variant alone. The span travels separately.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    // Keywords
    /// `ext` / `extern` / 🔌 - external function declaration
    Ext,
    /// `fn` / 🔧 - function declaration
    Fn,
    /// `ret` / ↩ - return
    Ret,
    /// `if` / ❓
    If,
    /// `el` / ❗ - else
    El,
    /// `wh` / 🔁 - while
    Wh,
    /// `for` / ➰
    For,
    /// `match` / 🎯
    Match,
    /// `st` / `struct` / 📦
    St,
    /// `enum` / 🏷
    Enum,
    /// `use` / 📥 - prelude import
    Use,
    /// `as` / 🔄 - cast
    As,
    /// `sz` / `sizeof` / 📏
    Sz,
    /// `null` / ∅
    Null,
    /// `brk` / `break` / 🛑
    Brk,
    /// `cont` / `continue` / ⏩
    Cont,
    /// `nw` / `new` / ✨
    Nw,
    /// `del` / `delete` / 🗑
    Del,
    /// `asm` / 🔩 - inline assembly
    Asm,
    /// `ct` / ⚡ - compile-time evaluation
    Ct,
    /// `defer` / 🔜
    Defer,
    /// `var` - explicit variable declaration
    Var,

    // Type keywords
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// `v` / `void` / ⬛
    Void,

    // Literals
    /// Integer literal with its decoded value.
    Int(i64),
    /// Float literal with its decoded value.
    Float(f64),
    /// String literal, escapes decoded at lex time.
    Str(String),

    /// Identifier (also produced by the stdlib emoji aliases).
    Ident(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    Lt,
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `?`
    Question,
    /// `=`
    Eq,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `:=` - inferred declaration
    ColonEq,
    /// `:`
    Colon,
    /// `->`
    Arrow,
    /// `.`
    Dot,
    /// `...` - variadic marker
    Ellipsis,
    /// `..` - exclusive range
    DotDot,
    /// `..=` - inclusive range
    DotDotEq,
    /// `|>` - pipeline operator
    PipeGt,
    Comma,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Special
    /// `;` - statement terminator, same class as newline
    Semi,
    /// Collapsed newline run - statement terminator
    Newline,
    Eof,
    /// Lexical error with a short message; the parser reports and aborts.
    Error(String),
}

impl Token {
    pub fn is_terminator(&self) -> bool {
        matches!(self, Token::Newline | Token::Semi)
    }

    pub fn is_type_start(&self) -> bool {
        matches!(
            self,
            Token::I8
                | Token::I16
                | Token::I32
                | Token::I64
                | Token::U8
                | Token::U16
                | Token::U32
                | Token::U64
                | Token::F32
                | Token::F64
                | Token::Void
                | Token::Star
                | Token::LBracket
        )
    }

    /// True for `name` matching this identifier token.
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, Token::Ident(s) if s == name)
    }

    /// Short display name used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Token::Ext => "ext",
            Token::Fn => "fn",
            Token::Ret => "ret",
            Token::If => "if",
            Token::El => "el",
            Token::Wh => "wh",
            Token::For => "for",
            Token::Match => "match",
            Token::St => "st",
            Token::Enum => "enum",
            Token::Use => "use",
            Token::As => "as",
            Token::Sz => "sz",
            Token::Null => "null",
            Token::Brk => "brk",
            Token::Cont => "cont",
            Token::Nw => "nw",
            Token::Del => "del",
            Token::Asm => "asm",
            Token::Ct => "ct",
            Token::Defer => "defer",
            Token::Var => "var",
            Token::I8 => "i8",
            Token::I16 => "i16",
            Token::I32 => "i32",
            Token::I64 => "i64",
            Token::U8 => "u8",
            Token::U16 => "u16",
            Token::U32 => "u32",
            Token::U64 => "u64",
            Token::F32 => "f32",
            Token::F64 => "f64",
            Token::Void => "void",
            Token::Int(_) => "<int>",
            Token::Float(_) => "<float>",
            Token::Str(_) => "<str>",
            Token::Ident(_) => "<ident>",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Amp => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Tilde => "~",
            Token::Bang => "!",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Shl => "<<",
            Token::Shr => ">>",
            Token::Question => "?",
            Token::Eq => "=",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::PercentEq => "%=",
            Token::ColonEq => ":=",
            Token::Colon => ":",
            Token::Arrow => "->",
            Token::Dot => ".",
            Token::Ellipsis => "...",
            Token::DotDot => "..",
            Token::DotDotEq => "..=",
            Token::PipeGt => "|>",
            Token::Comma => ",",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Semi => ";",
            Token::Newline => "<newline>",
            Token::Eof => "<eof>",
            Token::Error(_) => "<error>",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "{}", s),
            Token::Int(v) => write!(f, "{}", v),
            Token::Float(v) => write!(f, "{}", v),
            Token::Str(s) => write!(f, "{:?}", s),
            Token::Error(m) => write!(f, "<error: {}>", m),
            other => write!(f, "{}", other.describe()),
        }
    }
}
