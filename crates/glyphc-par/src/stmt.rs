//! Statement parsing.

use glyphc_ast::{BinOp, Expr, ExprKind, InlineAsm, Stmt, StmtKind};
use glyphc_lex::Token;

use crate::expr::make_call;
use crate::{Parser, Result};

impl<'a> Parser<'a> {
    pub(crate) fn parse_stmt(&mut self) -> Result<Stmt> {
        let span = self.span;

        // ret expr?
        if self.check(&Token::Ret) {
            self.next()?;
            let value = if self.tok.is_terminator()
                || self.check(&Token::RBrace)
                || self.check(&Token::Eof)
            {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect_nl_or_end()?;
            return Ok(Stmt::new(StmtKind::Ret(value), span));
        }

        // if cond { } (el { } | el if ...)?
        if self.check(&Token::If) {
            self.next()?;
            let cond = self.parse_expr()?;
            let then_blk = self.parse_block()?;
            self.skip_nl()?;
            let mut else_blk = None;
            if self.match_tok(&Token::El)? {
                if self.check(&Token::If) {
                    // el if chains as a nested if inside the else block
                    let elif = self.parse_stmt()?;
                    else_blk = Some(vec![elif]);
                } else {
                    else_blk = Some(self.parse_block()?);
                }
            }
            self.skip_nl()?;
            return Ok(Stmt::new(
                StmtKind::If {
                    cond,
                    then_blk,
                    else_blk,
                },
                span,
            ));
        }

        // del expr desugars to free(expr)
        if self.check(&Token::Del) {
            self.next()?;
            let arg = self.parse_expr()?;
            self.expect_nl_or_end()?;
            let call = make_call("free", vec![arg], span);
            return Ok(Stmt::new(StmtKind::Expr(call), span));
        }

        if self.check(&Token::Brk) {
            self.next()?;
            self.expect_nl_or_end()?;
            return Ok(Stmt::new(StmtKind::Break, span));
        }

        if self.check(&Token::Cont) {
            self.next()?;
            self.expect_nl_or_end()?;
            return Ok(Stmt::new(StmtKind::Continue, span));
        }

        if self.check(&Token::Asm) {
            return self.parse_asm_stmt();
        }

        // ct expr as a statement; the block loop eats the terminator
        if self.check(&Token::Ct) {
            self.next()?;
            let inner = self.parse_expr()?;
            let expr = Expr::new(ExprKind::Comptime(Box::new(inner)), span);
            return Ok(Stmt::new(StmtKind::Expr(expr), span));
        }

        // wh cond { }
        if self.check(&Token::Wh) {
            self.next()?;
            let cond = self.parse_expr()?;
            let body = self.parse_block()?;
            self.skip_nl()?;
            return Ok(Stmt::new(StmtKind::While { cond, body }, span));
        }

        if self.check(&Token::For) {
            return self.parse_for_stmt();
        }

        if self.check(&Token::Match) {
            return self.parse_match_stmt();
        }

        if self.check(&Token::Defer) {
            self.next()?;
            let body = self.parse_stmt()?;
            return Ok(Stmt::new(StmtKind::Defer(Box::new(body)), span));
        }

        // var NAME := expr | var NAME : type (= expr)?
        if self.check(&Token::Var) {
            self.next()?;
            // optional 'mut' noise word
            if self.tok.is_ident("mut") {
                self.next()?;
            }
            let name = self.expect_ident()?;
            if self.match_tok(&Token::ColonEq)? || self.match_tok(&Token::Eq)? {
                let init = self.parse_expr()?;
                self.expect_nl_or_end()?;
                return Ok(Stmt::new(
                    StmtKind::Decl {
                        name,
                        ty: None,
                        init: Some(init),
                    },
                    span,
                ));
            }
            if self.match_tok(&Token::Colon)? {
                let ty = self.parse_type()?;
                let init = if self.match_tok(&Token::Eq)? {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect_nl_or_end()?;
                return Ok(Stmt::new(
                    StmtKind::Decl {
                        name,
                        ty: Some(ty),
                        init,
                    },
                    span,
                ));
            }
            return Err(self.error_here("expected ':=' or ':' after 'var'"));
        }

        // statement-form builtins: `print expr` / `check expr` without parens
        if self.tok.is_ident("print") || self.tok.is_ident("check") {
            let snap = self.save();
            let name = self.expect_ident()?;
            let rewrite = !matches!(
                self.tok,
                Token::ColonEq | Token::Colon | Token::Newline | Token::Semi | Token::Eof
                    | Token::RBrace
            );
            if rewrite {
                let arg = self.parse_expr()?;
                self.expect_nl_or_end()?;
                let call = make_call(&name, vec![arg], span);
                return Ok(Stmt::new(StmtKind::Expr(call), span));
            }
            self.restore(snap);
        }

        // declaration: NAME := expr or NAME : type (= expr)?
        if matches!(self.tok, Token::Ident(_)) {
            let snap = self.save();
            let name = self.expect_ident()?;

            if self.check(&Token::ColonEq) {
                self.next()?;
                let init = self.parse_expr()?;
                self.expect_nl_or_end()?;
                return Ok(Stmt::new(
                    StmtKind::Decl {
                        name,
                        ty: None,
                        init: Some(init),
                    },
                    span,
                ));
            }

            if self.check(&Token::Colon) {
                self.next()?;
                let ty = self.parse_type()?;
                let init = if self.match_tok(&Token::Eq)? {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect_nl_or_end()?;
                return Ok(Stmt::new(
                    StmtKind::Decl {
                        name,
                        ty: Some(ty),
                        init,
                    },
                    span,
                ));
            }

            // not a declaration: rewind and reparse as an expression
            self.restore(snap);
        }

        // expression, assignment, or compound assignment
        let expr = self.parse_expr()?;

        if self.check(&Token::Eq) {
            self.next()?;
            let value = self.parse_expr()?;
            self.expect_nl_or_end()?;
            return Ok(Stmt::new(
                StmtKind::Assign {
                    target: expr,
                    value,
                },
                span,
            ));
        }

        let compound = match self.tok {
            Token::PlusEq => Some(BinOp::Add),
            Token::MinusEq => Some(BinOp::Sub),
            Token::StarEq => Some(BinOp::Mul),
            Token::SlashEq => Some(BinOp::Div),
            Token::PercentEq => Some(BinOp::Rem),
            _ => None,
        };
        if let Some(op) = compound {
            self.next()?;
            let rhs = self.parse_expr()?;
            self.expect_nl_or_end()?;
            // x op= v desugars to x = x op v
            let value = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(expr.clone()),
                    right: Box::new(rhs),
                },
                span,
            );
            return Ok(Stmt::new(
                StmtKind::Assign {
                    target: expr,
                    value,
                },
                span,
            ));
        }

        self.expect_nl_or_end()?;
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }

    /// `for i := start..end { }` / `..=`: synthesized init/cond/incr.
    fn parse_for_stmt(&mut self) -> Result<Stmt> {
        let span = self.span;
        self.expect(Token::For)?;
        let iter = self.expect_ident()?;
        self.expect(Token::ColonEq)?;
        let range = self.parse_expr()?;

        let ExprKind::Binary { op, left, right } = range.kind else {
            return Err(self.error_here("expected range in for loop"));
        };
        if !op.is_range() {
            return Err(self.error_here("expected range in for loop"));
        }
        let inclusive = op == BinOp::RangeInclusive;

        let body = self.parse_block()?;
        self.skip_nl()?;

        let ident = |name: &str| Expr::new(ExprKind::Ident(name.to_string()), span);

        let init = Stmt::new(
            StmtKind::Decl {
                name: iter.clone(),
                ty: None,
                init: Some(*left),
            },
            span,
        );
        let cond = Expr::new(
            ExprKind::Binary {
                op: if inclusive { BinOp::Le } else { BinOp::Lt },
                left: Box::new(ident(&iter)),
                right,
            },
            span,
        );
        let incr_value = Expr::new(
            ExprKind::Binary {
                op: BinOp::Add,
                left: Box::new(ident(&iter)),
                right: Box::new(Expr::new(ExprKind::Int(1), span)),
            },
            span,
        );
        let incr = Stmt::new(
            StmtKind::Assign {
                target: ident(&iter),
                value: incr_value,
            },
            span,
        );

        Ok(Stmt::new(
            StmtKind::For {
                init: Box::new(init),
                cond,
                incr: Box::new(incr),
                body,
            },
            span,
        ))
    }

    /// `match expr { val { } ... _ { } }`
    fn parse_match_stmt(&mut self) -> Result<Stmt> {
        let span = self.span;
        self.expect(Token::Match)?;
        let scrutinee = self.parse_expr()?;
        self.expect(Token::LBrace)?;
        self.skip_nl()?;

        let mut case_vals = Vec::new();
        let mut case_bodies = Vec::new();
        while !self.check(&Token::RBrace) && !self.check(&Token::Eof) {
            if self.tok.is_ident("_") {
                self.next()?;
                case_vals.push(None);
            } else {
                case_vals.push(Some(self.parse_expr()?));
            }
            case_bodies.push(self.parse_block()?);
            self.skip_nl()?;
        }
        self.expect(Token::RBrace)?;
        self.skip_nl()?;

        Ok(Stmt::new(
            StmtKind::Match {
                scrutinee,
                case_vals,
                case_bodies,
            },
            span,
        ))
    }

    /// `asm("template" : "=r"(out), ... : "r"(in), ... : "clobber", ...)`
    fn parse_asm_stmt(&mut self) -> Result<Stmt> {
        let span = self.span;
        self.expect(Token::Asm)?;
        self.expect(Token::LParen)?;
        let template = self.expect_str()?;

        let mut outputs = Vec::new();
        let mut inputs = Vec::new();
        let mut clobbers = Vec::new();

        if self.match_tok(&Token::Colon)? {
            while matches!(self.tok, Token::Str(_)) {
                let constraint = self.expect_str()?;
                self.expect(Token::LParen)?;
                let target = self.parse_expr()?;
                self.expect(Token::RParen)?;
                outputs.push((constraint, target));
                if !self.match_tok(&Token::Comma)? {
                    break;
                }
            }
            if self.match_tok(&Token::Colon)? {
                while matches!(self.tok, Token::Str(_)) {
                    let constraint = self.expect_str()?;
                    self.expect(Token::LParen)?;
                    let value = self.parse_expr()?;
                    self.expect(Token::RParen)?;
                    inputs.push((constraint, value));
                    if !self.match_tok(&Token::Comma)? {
                        break;
                    }
                }
                if self.match_tok(&Token::Colon)? {
                    while matches!(self.tok, Token::Str(_)) {
                        clobbers.push(self.expect_str()?);
                        if !self.match_tok(&Token::Comma)? {
                            break;
                        }
                    }
                }
            }
        }
        self.expect(Token::RParen)?;
        self.expect_nl_or_end()?;

        Ok(Stmt::new(
            StmtKind::Asm(InlineAsm {
                template,
                outputs,
                inputs,
                clobbers,
            }),
            span,
        ))
    }
}
