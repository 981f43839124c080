//! Top-level declaration parsing: ext, fn, st, enum.

use glyphc_ast::{Decl, EnumDecl, ExtDecl, FnDecl, Param, StDecl, Stmt, StmtKind, Type};
use glyphc_lex::Token;

use crate::{block_has_return_value, Parser, Result};

impl<'a> Parser<'a> {
    pub(crate) fn parse_decl(&mut self) -> Result<Decl> {
        match self.tok {
            Token::Ext => self.parse_ext_decl(),
            Token::Fn => self.parse_fn_decl(true),
            Token::St => self.parse_st_decl(true),
            Token::Enum => self.parse_enum_decl(),
            // keyword-free: IDENT( is a function, IDENT{ a struct
            Token::Ident(_) => {
                let snap = self.save();
                self.next()?;
                let is_fn = self.check(&Token::LParen);
                let is_st = self.check(&Token::LBrace);
                self.restore(snap);
                if is_fn {
                    self.parse_fn_decl(false)
                } else if is_st {
                    self.parse_st_decl(false)
                } else {
                    Err(self.error_here("expected declaration"))
                }
            },
            _ => Err(self.error_here("expected declaration")),
        }
    }

    fn parse_ext_decl(&mut self) -> Result<Decl> {
        let span = self.span;
        self.expect(Token::Ext)?;
        let name = self.expect_ident()?;
        self.expect(Token::LParen)?;
        let (params, variadic) = self.parse_params(true)?;
        self.expect(Token::RParen)?;

        let ret = if self.match_tok(&Token::Arrow)? {
            self.parse_type()?
        } else {
            Type::Void
        };
        self.expect_nl_or_end()?;

        Ok(Decl::Ext(ExtDecl {
            name,
            params,
            ret,
            variadic,
            span,
        }))
    }

    pub(crate) fn parse_fn_decl(&mut self, has_kw: bool) -> Result<Decl> {
        let span = self.span;
        if has_kw {
            self.expect(Token::Fn)?;
        }
        let name = self.expect_ident()?;
        let is_main = name == "main";

        // `main { }` shorthand: parens optional
        let mut params = Vec::new();
        if self.check(&Token::LParen) {
            self.next()?;
            let (p, _) = self.parse_params(false)?;
            params = p;
            self.expect(Token::RParen)?;
        }

        let mut ret = if self.match_tok(&Token::Arrow)? {
            self.parse_type()?
        } else if is_main {
            Type::I32
        } else {
            Type::Void
        };

        let mut body;
        if self.match_tok(&Token::Eq)? {
            // one-liner: fn name(args) = expr
            let value_span = self.span;
            let value = self.parse_expr()?;
            self.expect_nl_or_end()?;
            body = vec![Stmt::new(StmtKind::Ret(Some(value)), value_span)];
            if ret == Type::Void && !is_main {
                ret = Type::I32;
            }
        } else {
            body = self.parse_block()?;
            // arrowless functions that return a value produce i32
            if ret == Type::Void && !is_main && block_has_return_value(&body) {
                ret = Type::I32;
            }
        }

        // implicit return: a trailing expression statement of a non-void,
        // non-main function becomes its return value
        if ret != Type::Void && !is_main {
            if let Some(last) = body.last_mut() {
                if let StmtKind::Expr(_) = &last.kind {
                    let StmtKind::Expr(expr) =
                        std::mem::replace(&mut last.kind, StmtKind::Break)
                    else {
                        unreachable!();
                    };
                    last.kind = StmtKind::Ret(Some(expr));
                }
            }
        }

        Ok(Decl::Fn(FnDecl {
            name,
            params,
            ret,
            body,
            span,
        }))
    }

    pub(crate) fn parse_st_decl(&mut self, has_kw: bool) -> Result<Decl> {
        let span = self.span;
        if has_kw {
            self.expect(Token::St)?;
        }
        let name = self.expect_ident()?;
        self.expect(Token::LBrace)?;
        self.skip_nl()?;

        let mut fields = Vec::new();
        while !self.check(&Token::RBrace) && !self.check(&Token::Eof) {
            let fname = self.expect_ident()?;
            self.expect(Token::Colon)?;
            let fty = self.parse_type()?;
            fields.push(Param {
                name: fname,
                ty: fty,
            });
            self.match_tok(&Token::Comma)?;
            self.skip_nl()?;
        }
        self.expect(Token::RBrace)?;

        Ok(Decl::St(StDecl { name, fields, span }))
    }

    fn parse_enum_decl(&mut self) -> Result<Decl> {
        let span = self.span;
        self.expect(Token::Enum)?;
        let name = self.expect_ident()?;
        self.expect(Token::LBrace)?;
        self.skip_nl()?;

        let mut members = Vec::new();
        let mut value: i32 = 0;
        while !self.check(&Token::RBrace) && !self.check(&Token::Eof) {
            let mname = self.expect_ident()?;
            if self.match_tok(&Token::Eq)? {
                value = match self.tok {
                    Token::Int(n) => n as i32,
                    _ => return Err(self.error_here("expected integer enum value")),
                };
                self.next()?;
            }
            members.push((mname, value));
            value += 1;
            // optional separator
            if !self.match_tok(&Token::Comma)? {
                self.match_tok(&Token::Semi)?;
            }
            self.skip_nl()?;
        }
        self.expect(Token::RBrace)?;

        Ok(Decl::Enum(EnumDecl {
            name,
            members,
            span,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::{ParseConfig, Parser};
    use glyphc_ast::{Decl, Type};

    fn parse_decls(source: &str) -> Vec<Decl> {
        let mut parser =
            Parser::new(source, "test.gly", ParseConfig { no_std_prelude: true }).unwrap();
        parser.parse().unwrap().decls
    }

    #[test]
    fn test_ext_decl() {
        let decls = parse_decls("ext printf(*u8, ...) -> i32");
        let Decl::Ext(e) = &decls[0] else {
            panic!("expected ext");
        };
        assert_eq!(e.name, "printf");
        assert!(e.variadic);
        assert_eq!(e.ret, Type::I32);
        assert_eq!(e.params.len(), 1);
        assert_eq!(e.params[0].name, "_p0");
        assert_eq!(e.params[0].ty, Type::ptr(Type::U8));
    }

    #[test]
    fn test_ext_decl_void_default() {
        let decls = parse_decls("ext free(*v)");
        let Decl::Ext(e) = &decls[0] else {
            panic!("expected ext");
        };
        assert_eq!(e.ret, Type::Void);
        assert!(!e.variadic);
    }

    #[test]
    fn test_ext_lone_variadic() {
        let decls = parse_decls("ext mystery(...) -> i32");
        let Decl::Ext(e) = &decls[0] else {
            panic!("expected ext");
        };
        assert!(e.variadic);
        assert!(e.params.is_empty());
    }

    #[test]
    fn test_struct_decl_newline_fields() {
        let decls = parse_decls("st Point {\n x: i32\n y: i32\n}");
        let Decl::St(s) = &decls[0] else {
            panic!("expected struct");
        };
        assert_eq!(s.name, "Point");
        assert_eq!(s.fields.len(), 2);
        assert_eq!(s.fields[1].name, "y");
    }

    #[test]
    fn test_struct_decl_comma_fields() {
        let decls = parse_decls("struct Pair { a: i64, b: i64 }");
        let Decl::St(s) = &decls[0] else {
            panic!("expected struct");
        };
        assert_eq!(s.fields.len(), 2);
    }

    #[test]
    fn test_enum_decl_values() {
        let decls = parse_decls("enum Color { Red; Green; Blue = 5; Cyan }");
        let Decl::Enum(e) = &decls[0] else {
            panic!("expected enum");
        };
        assert_eq!(
            e.members,
            vec![
                ("Red".to_string(), 0),
                ("Green".to_string(), 1),
                ("Blue".to_string(), 5),
                ("Cyan".to_string(), 6),
            ]
        );
    }

    #[test]
    fn test_fn_untyped_param_defaults_i32() {
        let decls = parse_decls("fn f(x) -> i32 { ret x }");
        let Decl::Fn(f) = &decls[0] else {
            panic!("expected fn");
        };
        assert_eq!(f.params[0].ty, Type::I32);
    }
}
