//! Type and parameter-list parsing.

use glyphc_ast::{Param, Type};
use glyphc_lex::Token;

use crate::{Parser, Result};

impl<'a> Parser<'a> {
    /// Parse a type:
    /// - primitive keyword
    /// - `*T` pointer, `*fn(types) -> T` function pointer
    /// - `[N] T` array
    /// - bare identifier as a named struct
    pub(crate) fn parse_type(&mut self) -> Result<Type> {
        if self.check(&Token::Star) {
            self.next()?;
            if self.check(&Token::Fn) {
                self.next()?;
                self.expect(Token::LParen)?;
                let (params, variadic) = self.parse_params(true)?;
                self.expect(Token::RParen)?;
                let ret = if self.match_tok(&Token::Arrow)? {
                    self.parse_type()?
                } else {
                    Type::Void
                };
                let param_types = params.into_iter().map(|p| p.ty).collect();
                return Ok(Type::ptr(Type::function(ret, param_types, variadic)));
            }
            return Ok(Type::ptr(self.parse_type()?));
        }

        if self.match_tok(&Token::LBracket)? {
            let len = match self.tok {
                Token::Int(n) if n >= 0 => n as u32,
                _ => return Err(self.error_here("expected array length")),
            };
            self.next()?;
            self.expect(Token::RBracket)?;
            return Ok(Type::array(len, self.parse_type()?));
        }

        let ty = match &self.tok {
            Token::I8 => Type::I8,
            Token::I16 => Type::I16,
            Token::I32 => Type::I32,
            Token::I64 => Type::I64,
            Token::U8 => Type::U8,
            Token::U16 => Type::U16,
            Token::U32 => Type::U32,
            Token::U64 => Type::U64,
            Token::F32 => Type::F32,
            Token::F64 => Type::F64,
            Token::Void => Type::Void,
            Token::Ident(name) => Type::Struct(name.clone()),
            _ => return Err(self.error_here("expected type")),
        };
        self.next()?;
        Ok(ty)
    }

    /// Parse a parameter list up to (not including) the closing paren.
    ///
    /// `allow_anon` enables extern-style anonymous parameters (bare types,
    /// named `_p0`, `_p1`, ...) and the trailing `...` variadic marker.
    /// Without it a bare identifier parameter defaults to `i32`.
    pub(crate) fn parse_params(&mut self, allow_anon: bool) -> Result<(Vec<Param>, bool)> {
        let mut params = Vec::new();
        let mut variadic = false;

        if self.check(&Token::RParen) {
            return Ok((params, false));
        }

        let mut anon_idx = 0usize;
        loop {
            if self.check(&Token::Ellipsis) {
                self.next()?;
                variadic = true;
                break;
            }

            // anonymous parameter: bare type (extern declarations)
            if allow_anon && self.tok.is_type_start() {
                let ty = self.parse_type()?;
                params.push(Param {
                    name: format!("_p{}", anon_idx),
                    ty,
                });
                anon_idx += 1;
                if !self.match_tok(&Token::Comma)? {
                    break;
                }
                continue;
            }

            let name = self.expect_ident()?;
            if self.check(&Token::Colon) {
                self.next()?;
                let ty = self.parse_type()?;
                params.push(Param { name, ty });
            } else if allow_anon {
                // identifier used as a struct type, still anonymous
                params.push(Param {
                    name: format!("_p{}", anon_idx),
                    ty: Type::Struct(name),
                });
                anon_idx += 1;
            } else {
                // untyped parameter defaults to i32
                params.push(Param {
                    name,
                    ty: Type::I32,
                });
            }

            if !self.match_tok(&Token::Comma)? {
                break;
            }
        }

        Ok((params, variadic))
    }
}
