//! Expression parsing: precedence climbing with postfix, cast, ternary and
//! pipeline layers.

use glyphc_ast::{BinOp, Expr, ExprKind, Type, UnOp};
use glyphc_lex::Token;
use glyphc_util::Span;

use crate::{Parser, Result};

/// Binary operator precedence, tight binding is high. Ranges sit at the
/// loosest binary level so `1..n + 1` ranges over `1 .. (n + 1)`.
fn binop_prec(tok: &Token) -> Option<(BinOp, u8)> {
    let entry = match tok {
        Token::DotDot => (BinOp::Range, 1),
        Token::DotDotEq => (BinOp::RangeInclusive, 1),
        Token::OrOr => (BinOp::LogOr, 2),
        Token::AndAnd => (BinOp::LogAnd, 3),
        Token::Pipe => (BinOp::BitOr, 4),
        Token::Caret => (BinOp::BitXor, 5),
        Token::Amp => (BinOp::BitAnd, 6),
        Token::EqEq => (BinOp::Eq, 7),
        Token::NotEq => (BinOp::Ne, 7),
        Token::Lt => (BinOp::Lt, 8),
        Token::Gt => (BinOp::Gt, 8),
        Token::LtEq => (BinOp::Le, 8),
        Token::GtEq => (BinOp::Ge, 8),
        Token::Shl => (BinOp::Shl, 9),
        Token::Shr => (BinOp::Shr, 9),
        Token::Plus => (BinOp::Add, 10),
        Token::Minus => (BinOp::Sub, 10),
        Token::Star => (BinOp::Mul, 11),
        Token::Slash => (BinOp::Div, 11),
        Token::Percent => (BinOp::Rem, 11),
        _ => return None,
    };
    Some(entry)
}

/// Build a call to a named function.
pub(crate) fn make_call(name: &str, args: Vec<Expr>, span: Span) -> Expr {
    let callee = Expr::new(ExprKind::Ident(name.to_string()), span);
    Expr::new(
        ExprKind::Call {
            callee: Box::new(callee),
            args,
        },
        span,
    )
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> Result<Expr> {
        let mut expr = self.parse_binop(1)?;

        // ternary: cond ? then : else
        if self.check(&Token::Question) {
            let span = self.span;
            self.next()?;
            let then_expr = self.parse_expr()?;
            self.expect(Token::Colon)?;
            let else_expr = self.parse_expr()?;
            expr = Expr::new(
                ExprKind::Ternary {
                    cond: Box::new(expr),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                },
                span,
            );
        }

        // pipeline: x |> f(args) rewrites to f(x, args); x |> f to f(x)
        while self.check(&Token::PipeGt) {
            self.next()?;
            let rhs = self.parse_binop(1)?;
            expr = match rhs.kind {
                ExprKind::Call { callee, mut args } => {
                    args.insert(0, expr);
                    Expr::new(ExprKind::Call { callee, args }, rhs.span)
                },
                ExprKind::Ident(_) => Expr::new(
                    ExprKind::Call {
                        callee: Box::new(rhs),
                        args: vec![expr],
                    },
                    self.span,
                ),
                _ => return Err(self.error_here("pipe RHS must be function or call")),
            };
        }

        Ok(expr)
    }

    fn parse_binop(&mut self, min_prec: u8) -> Result<Expr> {
        let mut left = self.parse_cast()?;
        loop {
            let Some((op, prec)) = binop_prec(&self.tok) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            let span = self.span;
            self.next()?;
            let next_min = if op.is_range() { prec } else { prec + 1 };
            let right = self.parse_binop(next_min)?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    /// `as` binds between unary and binary, so `&buf as *v` casts `&buf`.
    fn parse_cast(&mut self) -> Result<Expr> {
        let mut expr = self.parse_unary()?;
        while self.check(&Token::As) {
            let span = self.span;
            self.next()?;
            let target = self.parse_type()?;
            expr = Expr::new(
                ExprKind::Cast {
                    expr: Box::new(expr),
                    target,
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let span = self.span;
        let op = match self.tok {
            Token::Amp => Some(UnOp::Addr),
            Token::Star => Some(UnOp::Deref),
            Token::Bang => Some(UnOp::Not),
            Token::Minus => Some(UnOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            self.next()?;
            let operand = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        // compile-time marker as expression prefix
        if self.check(&Token::Ct) {
            self.next()?;
            let inner = self.parse_unary()?;
            return Ok(Expr::new(ExprKind::Comptime(Box::new(inner)), span));
        }

        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    fn parse_postfix(&mut self, mut left: Expr) -> Result<Expr> {
        loop {
            let span = self.span;
            match self.tok {
                Token::LParen => {
                    self.next()?;
                    let mut args = Vec::new();
                    if !self.check(&Token::RParen) {
                        loop {
                            self.skip_nl()?;
                            args.push(self.parse_expr()?);
                            self.skip_nl()?;
                            if !self.match_tok(&Token::Comma)? {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen)?;
                    left = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(left),
                            args,
                        },
                        span,
                    );
                },
                Token::Dot => {
                    self.next()?;
                    let field = self.expect_ident()?;
                    left = Expr::new(
                        ExprKind::Field {
                            object: Box::new(left),
                            field,
                        },
                        span,
                    );
                },
                Token::LBracket => {
                    self.next()?;
                    let index = self.parse_expr()?;
                    self.expect(Token::RBracket)?;
                    left = Expr::new(
                        ExprKind::Index {
                            object: Box::new(left),
                            index: Box::new(index),
                        },
                        span,
                    );
                },
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let span = self.span;

        match &self.tok {
            Token::Int(v) => {
                let v = *v;
                self.next()?;
                Ok(Expr::new(ExprKind::Int(v), span))
            },
            Token::Float(v) => {
                let v = *v;
                self.next()?;
                Ok(Expr::new(ExprKind::Float(v), span))
            },
            Token::Str(_) => {
                let s = self.expect_str()?;
                Ok(Expr::new(ExprKind::Str(s), span))
            },
            Token::Null => {
                self.next()?;
                Ok(Expr::new(ExprKind::Null, span))
            },
            Token::Ident(_) => {
                let name = self.expect_ident()?;
                // struct-init sugar: T { field: value, ... }
                if self.check(&Token::LBrace) && self.looks_like_struct_init()? {
                    return self.parse_struct_init_literal(Type::Struct(name), span);
                }
                Ok(Expr::new(ExprKind::Ident(name), span))
            },
            Token::LParen => {
                self.next()?;
                let expr = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            },
            Token::Sz => {
                self.next()?;
                let target = self.parse_type()?;
                Ok(Expr::new(ExprKind::Sizeof(target), span))
            },
            Token::Nw => {
                self.next()?;
                let ty = self.parse_type()?;
                if self.check(&Token::LBrace) {
                    // nw T { f: v, ... } is a struct-init literal
                    return self.parse_struct_init_literal(ty, span);
                }
                // plain nw T desugars to malloc(sz T) as *T
                let size = Expr::new(ExprKind::Sizeof(ty.clone()), span);
                let call = make_call("malloc", vec![size], span);
                Ok(Expr::new(
                    ExprKind::Cast {
                        expr: Box::new(call),
                        target: Type::ptr(ty),
                    },
                    span,
                ))
            },
            _ => Err(self.error_here("expected expression")),
        }
    }

    /// Distinguish `T { field: v }` struct-init from `{` opening a block:
    /// struct init starts with `}` (empty) or `ident :`.
    fn looks_like_struct_init(&mut self) -> Result<bool> {
        let snap = self.save();
        self.next()?; // consume '{'
        self.skip_nl()?;
        let ok = if self.check(&Token::RBrace) {
            true
        } else if matches!(self.tok, Token::Ident(_)) {
            self.next()?;
            self.check(&Token::Colon)
        } else {
            false
        };
        self.restore(snap);
        Ok(ok)
    }

    pub(crate) fn parse_struct_init_literal(&mut self, ty: Type, span: Span) -> Result<Expr> {
        self.expect(Token::LBrace)?;
        self.skip_nl()?;
        let mut fields = Vec::new();
        while !self.check(&Token::RBrace) && !self.check(&Token::Eof) {
            let name = self.expect_ident()?;
            self.expect(Token::Colon)?;
            let value = self.parse_expr()?;
            fields.push((name, value));
            self.match_tok(&Token::Comma)?;
            self.skip_nl()?;
        }
        self.expect(Token::RBrace)?;
        Ok(Expr::new(ExprKind::StructInit { ty, fields }, span))
    }
}

#[cfg(test)]
mod tests {
    use crate::{ParseConfig, Parser};
    use glyphc_ast::{BinOp, Expr, ExprKind, UnOp};

    fn parse_expr(source: &str) -> Expr {
        let mut parser =
            Parser::new(source, "test.gly", ParseConfig { no_std_prelude: true }).unwrap();
        parser.parse_expr().unwrap()
    }

    fn binary_op(expr: &Expr) -> BinOp {
        let ExprKind::Binary { op, .. } = &expr.kind else {
            panic!("expected binary, got {:?}", expr.kind);
        };
        *op
    }

    #[test]
    fn test_precedence_mul_over_add() {
        // 2 + 3 * 4 parses as 2 + (3 * 4)
        let e = parse_expr("2 + 3 * 4");
        let ExprKind::Binary { op, right, .. } = &e.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Add);
        assert_eq!(binary_op(right), BinOp::Mul);
    }

    #[test]
    fn test_left_associativity() {
        // 10 - 4 - 3 parses as (10 - 4) - 3
        let e = parse_expr("10 - 4 - 3");
        let ExprKind::Binary { op, left, .. } = &e.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Sub);
        assert_eq!(binary_op(left), BinOp::Sub);
    }

    #[test]
    fn test_comparison_binds_looser_than_shift() {
        let e = parse_expr("1 << 2 < 3");
        assert_eq!(binary_op(&e), BinOp::Lt);
    }

    #[test]
    fn test_parens_override() {
        let e = parse_expr("(2 + 3) * 4");
        assert_eq!(binary_op(&e), BinOp::Mul);
    }

    #[test]
    fn test_unary_chain() {
        let e = parse_expr("-*p");
        let ExprKind::Unary { op, operand } = &e.kind else {
            panic!("expected unary");
        };
        assert_eq!(*op, UnOp::Neg);
        assert!(matches!(
            operand.kind,
            ExprKind::Unary {
                op: UnOp::Deref,
                ..
            }
        ));
    }

    #[test]
    fn test_cast_binds_after_unary() {
        // &buf as *v casts the address, not buf
        let e = parse_expr("&buf as *v");
        let ExprKind::Cast { expr, .. } = &e.kind else {
            panic!("expected cast");
        };
        assert!(matches!(
            expr.kind,
            ExprKind::Unary {
                op: UnOp::Addr,
                ..
            }
        ));
    }

    #[test]
    fn test_postfix_chain() {
        let e = parse_expr("a.b[0](1)");
        let ExprKind::Call { callee, args } = &e.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 1);
        assert!(matches!(callee.kind, ExprKind::Index { .. }));
    }

    #[test]
    fn test_ternary() {
        let e = parse_expr("a ? 1 : 2");
        assert!(matches!(e.kind, ExprKind::Ternary { .. }));
    }

    #[test]
    fn test_pipeline_with_args() {
        // x |> f(a) rewrites to f(x, a)
        let e = parse_expr("x |> f(a)");
        let ExprKind::Call { args, .. } = &e.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
        assert!(matches!(&args[0].kind, ExprKind::Ident(n) if n == "x"));
    }

    #[test]
    fn test_pipeline_bare_fn() {
        let e = parse_expr("x |> f");
        let ExprKind::Call { callee, args } = &e.kind else {
            panic!("expected call");
        };
        assert!(matches!(&callee.kind, ExprKind::Ident(n) if n == "f"));
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_pipeline_chain() {
        let e = parse_expr("x |> f |> g");
        let ExprKind::Call { callee, args } = &e.kind else {
            panic!("expected call");
        };
        assert!(matches!(&callee.kind, ExprKind::Ident(n) if n == "g"));
        assert!(matches!(&args[0].kind, ExprKind::Call { .. }));
    }

    #[test]
    fn test_nw_desugars_to_malloc_cast() {
        let e = parse_expr("nw Point");
        let ExprKind::Cast { expr, target } = &e.kind else {
            panic!("expected cast");
        };
        assert!(target.is_ptr());
        let ExprKind::Call { callee, args } = &expr.kind else {
            panic!("expected call");
        };
        assert!(matches!(&callee.kind, ExprKind::Ident(n) if n == "malloc"));
        assert!(matches!(&args[0].kind, ExprKind::Sizeof(_)));
    }

    #[test]
    fn test_nw_struct_init() {
        let e = parse_expr("nw Point { x: 1, y: 2 }");
        let ExprKind::StructInit { fields, .. } = &e.kind else {
            panic!("expected struct init");
        };
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_bare_struct_init() {
        let e = parse_expr("Point { x: 1 }");
        assert!(matches!(e.kind, ExprKind::StructInit { .. }));
    }

    #[test]
    fn test_ident_not_struct_init() {
        // `cond {` must stay an identifier so `if cond { }` works
        let mut parser = Parser::new(
            "cond { x = 1 }",
            "test.gly",
            ParseConfig { no_std_prelude: true },
        )
        .unwrap();
        let e = parser.parse_expr().unwrap();
        assert!(matches!(e.kind, ExprKind::Ident(_)));
    }

    #[test]
    fn test_comptime_prefix() {
        let e = parse_expr("ct 2 + 3");
        // ct binds like a unary prefix: (ct 2) + 3
        let ExprKind::Binary { left, .. } = &e.kind else {
            panic!("expected binary");
        };
        assert!(matches!(left.kind, ExprKind::Comptime(_)));
    }

    #[test]
    fn test_range_expr() {
        let e = parse_expr("1..n + 1");
        let ExprKind::Binary { op, right, .. } = &e.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Range);
        assert_eq!(binary_op(right), BinOp::Add);
    }

    #[test]
    fn test_sizeof() {
        let e = parse_expr("sz i64");
        assert!(matches!(e.kind, ExprKind::Sizeof(glyphc_ast::Type::I64)));
    }

    #[test]
    fn test_logical_vs_bitwise_precedence() {
        // a & b && c | d parses as (a & b) && (c | d)
        let e = parse_expr("a & b && c | d");
        let ExprKind::Binary { op, left, right } = &e.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::LogAnd);
        assert_eq!(binary_op(left), BinOp::BitAnd);
        assert_eq!(binary_op(right), BinOp::BitOr);
    }
}
