//! glyphc-par - recursive-descent parser for the keyword/emoji surface,
//! plus the S-expression front-end over the same AST.
//!
//! The parser is single-pass with bounded lookahead: ambiguous prefixes
//! (keyword-free declarations, struct-init literals) are resolved by saving
//! and restoring the lexer state. Statements are terminated by newline or
//! `;`. Top-level statements are collected and wrapped in a synthesized
//! `fn main() -> i32`.

mod expr;
mod items;
pub mod sexpr;
mod stmt;
mod types;

use std::path::PathBuf;

use glyphc_ast::{Decl, FnDecl, Program, Stmt, StmtKind, Type};
use glyphc_lex::{CursorSnapshot, Lexer, Token};
use glyphc_util::{Diagnostic, Span};

pub type Result<T> = std::result::Result<T, Diagnostic>;

/// Knobs threaded through parsing instead of process globals.
#[derive(Clone, Debug, Default)]
pub struct ParseConfig {
    /// Skip the automatic `std` prelude (wasm builds, hermetic tests).
    pub no_std_prelude: bool,
}

/// Directories searched for `use NAME` prelude files, in order.
const PRELUDE_DIRS: &[&str] = &["lib", "/usr/local/lib/glyph"];
/// Prelude file extension (keyword surface).
const PRELUDE_EXT: &str = "gly";

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    tok: Token,
    span: Span,
    file: String,
    config: ParseConfig,
}

/// Saved parser position for bounded lookahead.
struct Snapshot {
    cursor: CursorSnapshot,
    tok: Token,
    span: Span,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, file: impl Into<String>, config: ParseConfig) -> Result<Self> {
        let mut p = Self {
            lexer: Lexer::new(source),
            tok: Token::Eof,
            span: Span::DUMMY,
            file: file.into(),
            config,
        };
        p.next()?;
        Ok(p)
    }

    // ---- token plumbing ----

    pub(crate) fn next(&mut self) -> Result<()> {
        let (tok, span) = self.lexer.next_token();
        if let Token::Error(msg) = &tok {
            return Err(Diagnostic::at(&self.file, span, msg.clone()));
        }
        self.tok = tok;
        self.span = span;
        Ok(())
    }

    pub(crate) fn check(&self, tok: &Token) -> bool {
        self.tok == *tok
    }

    pub(crate) fn match_tok(&mut self, tok: &Token) -> Result<bool> {
        if self.tok == *tok {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect(&mut self, tok: Token) -> Result<()> {
        if self.tok != tok {
            return Err(self.error_here(&format!("expected '{}'", tok.describe())));
        }
        self.next()
    }

    pub(crate) fn expect_ident(&mut self) -> Result<String> {
        match std::mem::replace(&mut self.tok, Token::Eof) {
            Token::Ident(name) => {
                self.next()?;
                Ok(name)
            },
            other => {
                self.tok = other;
                Err(self.error_here("expected identifier"))
            },
        }
    }

    pub(crate) fn expect_str(&mut self) -> Result<String> {
        match std::mem::replace(&mut self.tok, Token::Eof) {
            Token::Str(s) => {
                self.next()?;
                Ok(s)
            },
            other => {
                self.tok = other;
                Err(self.error_here("expected string literal"))
            },
        }
    }

    pub(crate) fn skip_nl(&mut self) -> Result<()> {
        while self.tok.is_terminator() {
            self.next()?;
        }
        Ok(())
    }

    /// A statement must end with a terminator, `}`, or EOF.
    pub(crate) fn expect_nl_or_end(&mut self) -> Result<()> {
        if self.tok.is_terminator() {
            self.next()?;
            self.skip_nl()?;
        } else if !matches!(self.tok, Token::RBrace | Token::Eof) {
            return Err(self.error_here("expected newline or ';'"));
        }
        Ok(())
    }

    pub(crate) fn error_here(&self, msg: &str) -> Diagnostic {
        Diagnostic::at(
            &self.file,
            self.span,
            format!("{} (got '{}')", msg, self.tok.describe()),
        )
    }

    pub(crate) fn save(&self) -> Snapshot {
        Snapshot {
            cursor: self.lexer.snapshot(),
            tok: self.tok.clone(),
            span: self.span,
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.lexer.restore(snapshot.cursor);
        self.tok = snapshot.tok;
        self.span = snapshot.span;
    }

    // ---- entry points ----

    /// Parse a full program. Auto-loads the `std` prelude once (unless
    /// suppressed), resolves `use NAME`, and wraps loose top-level
    /// statements in `fn main() -> i32`.
    pub fn parse(&mut self) -> Result<Program> {
        let mut decls: Vec<Decl> = Vec::new();
        let mut top_stmts: Vec<Stmt> = Vec::new();

        if !self.config.no_std_prelude {
            if let Some(std_prog) = load_prelude("std")? {
                decls.extend(std_prog.decls);
            }
        }

        self.skip_nl()?;
        while !self.check(&Token::Eof) {
            if self.check(&Token::Use) {
                self.next()?;
                let name = self.expect_ident()?;
                self.expect_nl_or_end()?;
                if let Some(sub) = load_prelude(&name)? {
                    decls.extend(sub.decls);
                }
                self.skip_nl()?;
                continue;
            }

            if matches!(self.tok, Token::Ext | Token::Fn | Token::St | Token::Enum) {
                decls.push(self.parse_decl()?);
                self.skip_nl()?;
                continue;
            }

            // keyword-free declarations: IDENT{ is a struct; IDENT( is a
            // function when the matching ')' is followed by '=', '->' or '{'
            if matches!(self.tok, Token::Ident(_)) {
                let snap = self.save();
                self.next()?;
                if self.check(&Token::LBrace) {
                    self.restore(snap);
                    decls.push(self.parse_decl()?);
                    self.skip_nl()?;
                    continue;
                }
                if self.check(&Token::LParen) {
                    self.next()?;
                    let mut depth = 1usize;
                    while depth > 0 && !self.check(&Token::Eof) {
                        if self.check(&Token::LParen) {
                            depth += 1;
                        } else if self.check(&Token::RParen) {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        self.next()?;
                    }
                    if self.check(&Token::RParen) {
                        self.next()?;
                    }
                    let is_decl = matches!(self.tok, Token::Eq | Token::Arrow | Token::LBrace);
                    self.restore(snap);
                    if is_decl {
                        decls.push(self.parse_decl()?);
                        self.skip_nl()?;
                        continue;
                    }
                } else {
                    self.restore(snap);
                }
            }

            top_stmts.push(self.parse_stmt()?);
            self.skip_nl()?;
        }

        if !top_stmts.is_empty() {
            decls.push(Decl::Fn(FnDecl {
                name: "main".to_string(),
                params: Vec::new(),
                ret: Type::I32,
                body: top_stmts,
                span: Span::DUMMY,
            }));
        }

        Ok(Program { decls })
    }

    /// Parse a prelude file: declarations only, no synthesized `main`, no
    /// automatic std (preludes name their imports explicitly).
    pub fn parse_prelude(&mut self) -> Result<Program> {
        let mut decls: Vec<Decl> = Vec::new();
        self.skip_nl()?;
        while !self.check(&Token::Eof) {
            if self.check(&Token::Use) {
                self.next()?;
                let name = self.expect_ident()?;
                self.expect_nl_or_end()?;
                if let Some(sub) = load_prelude(&name)? {
                    decls.extend(sub.decls);
                }
                self.skip_nl()?;
                continue;
            }
            decls.push(self.parse_decl()?);
            self.skip_nl()?;
        }
        Ok(Program { decls })
    }

    /// Parse `{ stmt* }` into a statement list.
    pub(crate) fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        self.expect(Token::LBrace)?;
        self.skip_nl()?;
        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) && !self.check(&Token::Eof) {
            stmts.push(self.parse_stmt()?);
            self.skip_nl()?;
        }
        self.expect(Token::RBrace)?;
        Ok(stmts)
    }
}

/// Locate, preprocess, and parse a prelude file. A missing file is not an
/// error: `Ok(None)` lets `use` of an unknown module fall through.
pub fn load_prelude(name: &str) -> Result<Option<Program>> {
    for dir in PRELUDE_DIRS {
        let path = PathBuf::from(dir).join(format!("{}.{}", name, PRELUDE_EXT));
        if !path.is_file() {
            continue;
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            Diagnostic::message(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let src = glyphc_pp::preprocess(&raw);
        let mut sub = Parser::new(
            &src,
            path.display().to_string(),
            ParseConfig::default(),
        )?;
        return sub.parse_prelude().map(Some);
    }
    Ok(None)
}

/// Does any `ret expr` (with a value) appear in this statement tree?
/// Drives `i32` return-type inference for arrowless functions.
pub(crate) fn block_has_return_value(stmts: &[Stmt]) -> bool {
    stmts.iter().any(stmt_has_return_value)
}

fn stmt_has_return_value(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Ret(value) => value.is_some(),
        StmtKind::Block(stmts) => block_has_return_value(stmts),
        StmtKind::If {
            then_blk, else_blk, ..
        } => {
            block_has_return_value(then_blk)
                || else_blk.as_deref().is_some_and(block_has_return_value)
        },
        StmtKind::While { body, .. } => block_has_return_value(body),
        StmtKind::For { body, .. } => block_has_return_value(body),
        StmtKind::Match { case_bodies, .. } => {
            case_bodies.iter().any(|b| block_has_return_value(b))
        },
        _ => false,
    }
}
