//! glyphc-lex - lexical analysis for the Glyph language.
//!
//! Turns preprocessed UTF-8 source text into a stream of tokens on demand.
//! Two surface vocabularies alias to the same token set: ASCII keywords
//! (`fn`, `ret`, `wh`, ...) and single-codepoint emoji (🔧, ↩, 🔁, ...).
//! A third table maps emoji to C standard library identifiers (🖨 lexes as
//! the identifier `printf`).
//!
//! Newlines are significant: a run of blank lines collapses into a single
//! `Newline` token, which the parser treats like `;`.

pub mod cursor;
mod lexer;
pub mod token;
pub mod unicode;

pub use cursor::{Cursor, CursorSnapshot};
pub use lexer::Lexer;
pub use token::Token;
