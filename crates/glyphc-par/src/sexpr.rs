//! S-expression front-end.
//!
//! A second concrete syntax over the same AST, selected by the `.gsx` file
//! extension. Parenthesized prefix forms only:
//!
//! ```text
//! (fn add ((a i32) (b i32)) i32
//!   (^ (+ a b)))
//! (st Point (x i32) (y i32))
//! (ext printf (*u8 ...) i32)
//! ```
//!
//! Statement heads: `=` infer-decl, `:` typed-decl, `!` assign,
//! `+= -= *= /= %=` compound assign, `^` return, `brk`, `cont`, `if`
//! (optional trailing `(el ...)`), `@` while, `del`. Any other list is a
//! call. `;` starts a line comment.

use glyphc_ast::{
    BinOp, Decl, EnumDecl, Expr, ExprKind, ExtDecl, FnDecl, Param, Program, StDecl, Stmt,
    StmtKind, Type, UnOp,
};
use glyphc_util::{Diagnostic, Span};

use crate::expr::make_call;
use crate::{load_prelude, ParseConfig, Result};

// ---- tokenizer ----

#[derive(Clone, Debug, PartialEq)]
enum STok {
    LParen,
    RParen,
    Int(i64),
    Float(f64),
    Str(String),
    Sym(String),
    Eof,
}

struct SLex<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> SLex<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> char {
        self.src[self.pos..].chars().next().unwrap_or('\0')
    }

    fn peek2(&self) -> char {
        let mut it = self.src[self.pos..].chars();
        it.next();
        it.next().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        if c == '\0' {
            return c;
        }
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        c
    }

    fn skip(&mut self) {
        loop {
            while matches!(self.peek(), ' ' | '\t' | '\n' | '\r') {
                self.advance();
            }
            if self.peek() == ';' {
                while self.peek() != '\0' && self.peek() != '\n' {
                    self.advance();
                }
                continue;
            }
            break;
        }
    }

    fn next_tok(&mut self) -> (STok, Span) {
        self.skip();
        let span = Span::point(self.line, self.col);
        let c = self.peek();
        if c == '\0' {
            return (STok::Eof, span);
        }
        if c == '(' {
            self.advance();
            return (STok::LParen, span);
        }
        if c == ')' {
            self.advance();
            return (STok::RParen, span);
        }

        if c == '"' {
            self.advance();
            let mut buf = String::new();
            while self.peek() != '\0' && self.peek() != '"' {
                if self.peek() == '\\' {
                    self.advance();
                    let e = self.advance();
                    buf.push(match e {
                        'n' => '\n',
                        't' => '\t',
                        '\\' => '\\',
                        '"' => '"',
                        '0' => '\0',
                        'r' => '\r',
                        other => other,
                    });
                } else {
                    buf.push(self.advance());
                }
            }
            if self.peek() == '"' {
                self.advance();
            }
            return (STok::Str(buf), span);
        }

        if c.is_ascii_digit() || (c == '-' && self.peek2().is_ascii_digit()) {
            let start = self.pos;
            if c == '-' {
                self.advance();
            }
            while self.peek().is_ascii_digit() {
                self.advance();
            }
            if self.peek() == '.' && self.peek2().is_ascii_digit() {
                self.advance();
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
                let text = &self.src[start..self.pos];
                return (STok::Float(text.parse().unwrap_or(0.0)), span);
            }
            let text = &self.src[start..self.pos];
            return (STok::Int(text.parse().unwrap_or(0)), span);
        }

        // symbol: anything up to whitespace, parens, or quotes
        let start = self.pos;
        while !matches!(self.peek(), '\0' | ' ' | '\t' | '\n' | '\r' | '(' | ')' | '"') {
            self.advance();
        }
        (STok::Sym(self.src[start..self.pos].to_string()), span)
    }
}

// ---- tree ----

#[derive(Clone, Debug)]
enum SExpr {
    Atom(STok, Span),
    List(Vec<SExpr>, Span),
}

impl SExpr {
    fn span(&self) -> Span {
        match self {
            SExpr::Atom(_, s) | SExpr::List(_, s) => *s,
        }
    }

    fn sym(&self) -> Option<&str> {
        match self {
            SExpr::Atom(STok::Sym(s), _) => Some(s),
            _ => None,
        }
    }
}

struct SParser<'a> {
    lex: SLex<'a>,
    tok: STok,
    span: Span,
    file: String,
}

impl<'a> SParser<'a> {
    fn new(src: &'a str, file: &str) -> Self {
        let mut lex = SLex::new(src);
        let (tok, span) = lex.next_tok();
        Self {
            lex,
            tok,
            span,
            file: file.to_string(),
        }
    }

    fn next(&mut self) {
        let (tok, span) = self.lex.next_tok();
        self.tok = tok;
        self.span = span;
    }

    fn error(&self, span: Span, msg: impl Into<String>) -> Diagnostic {
        Diagnostic::at(&self.file, span, msg)
    }

    fn parse_sexpr(&mut self) -> SExpr {
        let span = self.span;
        if self.tok == STok::LParen {
            self.next();
            let mut items = Vec::new();
            while self.tok != STok::RParen && self.tok != STok::Eof {
                items.push(self.parse_sexpr());
            }
            if self.tok == STok::RParen {
                self.next();
            }
            return SExpr::List(items, span);
        }
        let atom = SExpr::Atom(self.tok.clone(), span);
        self.next();
        atom
    }

    // ---- transduction ----

    fn se_type(&self, e: &SExpr) -> Result<Type> {
        let span = e.span();
        let Some(s) = e.sym() else {
            return Err(self.error(span, "expected type"));
        };
        self.type_from_symbol(s, span)
    }

    fn type_from_symbol(&self, s: &str, span: Span) -> Result<Type> {
        let ty = match s {
            "i8" => Type::I8,
            "i16" => Type::I16,
            "i32" => Type::I32,
            "i64" => Type::I64,
            "u8" => Type::U8,
            "u16" => Type::U16,
            "u32" => Type::U32,
            "u64" => Type::U64,
            "f32" => Type::F32,
            "f64" => Type::F64,
            "v" => Type::Void,
            _ => {
                if let Some(inner) = s.strip_prefix('*') {
                    Type::ptr(self.type_from_symbol(inner, span)?)
                } else {
                    Type::Struct(s.to_string())
                }
            },
        };
        Ok(ty)
    }

    fn se_expr(&self, e: &SExpr) -> Result<Expr> {
        let span = e.span();
        match e {
            SExpr::Atom(tok, _) => {
                let kind = match tok {
                    STok::Int(v) => ExprKind::Int(*v),
                    STok::Float(v) => ExprKind::Float(*v),
                    STok::Str(s) => ExprKind::Str(s.clone()),
                    STok::Sym(s) if s == "null" => ExprKind::Null,
                    STok::Sym(s) => ExprKind::Ident(s.clone()),
                    _ => return Err(self.error(span, "unexpected token in expression")),
                };
                Ok(Expr::new(kind, span))
            },
            SExpr::List(items, _) => {
                if items.is_empty() {
                    return Err(self.error(span, "empty list"));
                }
                let Some(op) = items[0].sym() else {
                    return Err(self.error(span, "expected operator or function name"));
                };

                // (? cond then else)
                if op == "?" && items.len() == 4 {
                    return Ok(Expr::new(
                        ExprKind::Ternary {
                            cond: Box::new(self.se_expr(&items[1])?),
                            then_expr: Box::new(self.se_expr(&items[2])?),
                            else_expr: Box::new(self.se_expr(&items[3])?),
                        },
                        span,
                    ));
                }

                // binary forms
                if items.len() == 3 {
                    let binop = match op {
                        "+" => Some(BinOp::Add),
                        "-" => Some(BinOp::Sub),
                        "*" => Some(BinOp::Mul),
                        "/" => Some(BinOp::Div),
                        "%" => Some(BinOp::Rem),
                        "<" => Some(BinOp::Lt),
                        ">" => Some(BinOp::Gt),
                        "<=" => Some(BinOp::Le),
                        ">=" => Some(BinOp::Ge),
                        "==" => Some(BinOp::Eq),
                        "!=" => Some(BinOp::Ne),
                        "&&" => Some(BinOp::LogAnd),
                        "||" => Some(BinOp::LogOr),
                        "&" => Some(BinOp::BitAnd),
                        "|" => Some(BinOp::BitOr),
                        "^" => Some(BinOp::BitXor),
                        "<<" => Some(BinOp::Shl),
                        ">>" => Some(BinOp::Shr),
                        _ => None,
                    };
                    if let Some(op) = binop {
                        return Ok(Expr::new(
                            ExprKind::Binary {
                                op,
                                left: Box::new(self.se_expr(&items[1])?),
                                right: Box::new(self.se_expr(&items[2])?),
                            },
                            span,
                        ));
                    }
                }

                // unary forms
                if items.len() == 2 {
                    let unop = match op {
                        "&" => Some(UnOp::Addr),
                        "*" => Some(UnOp::Deref),
                        "-" => Some(UnOp::Neg),
                        "!" | "~" => Some(UnOp::Not),
                        _ => None,
                    };
                    if let Some(op) = unop {
                        return Ok(Expr::new(
                            ExprKind::Unary {
                                op,
                                operand: Box::new(self.se_expr(&items[1])?),
                            },
                            span,
                        ));
                    }
                }

                // (. obj field)
                if op == "." && items.len() == 3 {
                    let Some(field) = items[2].sym() else {
                        return Err(self.error(span, "expected field name"));
                    };
                    return Ok(Expr::new(
                        ExprKind::Field {
                            object: Box::new(self.se_expr(&items[1])?),
                            field: field.to_string(),
                        },
                        span,
                    ));
                }

                // ([] obj idx)
                if op == "[]" && items.len() == 3 {
                    return Ok(Expr::new(
                        ExprKind::Index {
                            object: Box::new(self.se_expr(&items[1])?),
                            index: Box::new(self.se_expr(&items[2])?),
                        },
                        span,
                    ));
                }

                // (as expr type)
                if op == "as" && items.len() == 3 {
                    return Ok(Expr::new(
                        ExprKind::Cast {
                            expr: Box::new(self.se_expr(&items[1])?),
                            target: self.se_type(&items[2])?,
                        },
                        span,
                    ));
                }

                // (sz type)
                if op == "sz" && items.len() == 2 {
                    return Ok(Expr::new(ExprKind::Sizeof(self.se_type(&items[1])?), span));
                }

                // (nw type) desugars to malloc(sz type) as *type
                if op == "nw" && items.len() == 2 {
                    let ty = self.se_type(&items[1])?;
                    let size = Expr::new(ExprKind::Sizeof(ty.clone()), span);
                    let call = make_call("malloc", vec![size], span);
                    return Ok(Expr::new(
                        ExprKind::Cast {
                            expr: Box::new(call),
                            target: Type::ptr(ty),
                        },
                        span,
                    ));
                }

                // (name args...) is a call
                let args = items[1..]
                    .iter()
                    .map(|a| self.se_expr(a))
                    .collect::<Result<Vec<_>>>()?;
                Ok(make_call(op, args, span))
            },
        }
    }

    fn se_block(&self, items: &[SExpr]) -> Result<Vec<Stmt>> {
        items.iter().map(|e| self.se_stmt(e)).collect()
    }

    fn se_stmt(&self, e: &SExpr) -> Result<Stmt> {
        let span = e.span();
        let SExpr::List(items, _) = e else {
            return Ok(Stmt::new(StmtKind::Expr(self.se_expr(e)?), span));
        };
        if items.is_empty() {
            return Err(self.error(span, "empty form"));
        }
        let Some(op) = items[0].sym() else {
            return Ok(Stmt::new(StmtKind::Expr(self.se_expr(e)?), span));
        };

        match op {
            // (= name val)
            "=" if items.len() == 3 => {
                let Some(name) = items[1].sym() else {
                    return Err(self.error(span, "expected variable name"));
                };
                Ok(Stmt::new(
                    StmtKind::Decl {
                        name: name.to_string(),
                        ty: None,
                        init: Some(self.se_expr(&items[2])?),
                    },
                    span,
                ))
            },
            // (: name type val?)
            ":" if items.len() == 3 || items.len() == 4 => {
                let Some(name) = items[1].sym() else {
                    return Err(self.error(span, "expected variable name"));
                };
                let init = if items.len() == 4 {
                    Some(self.se_expr(&items[3])?)
                } else {
                    None
                };
                Ok(Stmt::new(
                    StmtKind::Decl {
                        name: name.to_string(),
                        ty: Some(self.se_type(&items[2])?),
                        init,
                    },
                    span,
                ))
            },
            // (! target val)
            "!" if items.len() == 3 => Ok(Stmt::new(
                StmtKind::Assign {
                    target: self.se_expr(&items[1])?,
                    value: self.se_expr(&items[2])?,
                },
                span,
            )),
            // (+= target val) and friends desugar like the infix surface
            "+=" | "-=" | "*=" | "/=" | "%=" if items.len() == 3 => {
                let binop = match op {
                    "+=" => BinOp::Add,
                    "-=" => BinOp::Sub,
                    "*=" => BinOp::Mul,
                    "/=" => BinOp::Div,
                    _ => BinOp::Rem,
                };
                let target = self.se_expr(&items[1])?;
                let value = Expr::new(
                    ExprKind::Binary {
                        op: binop,
                        left: Box::new(target.clone()),
                        right: Box::new(self.se_expr(&items[2])?),
                    },
                    span,
                );
                Ok(Stmt::new(StmtKind::Assign { target, value }, span))
            },
            // (^ val?)
            "^" => {
                let value = if items.len() > 1 {
                    Some(self.se_expr(&items[1])?)
                } else {
                    None
                };
                Ok(Stmt::new(StmtKind::Ret(value), span))
            },
            "brk" => Ok(Stmt::new(StmtKind::Break, span)),
            "cont" => Ok(Stmt::new(StmtKind::Continue, span)),
            // (if cond then... [ (el else...) ])
            "if" if items.len() >= 3 => {
                let cond = self.se_expr(&items[1])?;
                let mut then_end = items.len();
                let mut else_blk = None;
                if let SExpr::List(last, _) = &items[items.len() - 1] {
                    if !last.is_empty() && last[0].sym() == Some("el") {
                        then_end = items.len() - 1;
                        else_blk = Some(self.se_block(&last[1..])?);
                    }
                }
                Ok(Stmt::new(
                    StmtKind::If {
                        cond,
                        then_blk: self.se_block(&items[2..then_end])?,
                        else_blk,
                    },
                    span,
                ))
            },
            // (@ cond body...)
            "@" if items.len() >= 3 => Ok(Stmt::new(
                StmtKind::While {
                    cond: self.se_expr(&items[1])?,
                    body: self.se_block(&items[2..])?,
                },
                span,
            )),
            // (del e) desugars to free(e)
            "del" if items.len() == 2 => {
                let call = make_call("free", vec![self.se_expr(&items[1])?], span);
                Ok(Stmt::new(StmtKind::Expr(call), span))
            },
            _ => Ok(Stmt::new(StmtKind::Expr(self.se_expr(e)?), span)),
        }
    }

    fn is_type_symbol(s: &str) -> bool {
        matches!(
            s,
            "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "f32" | "f64" | "v"
        ) || s.starts_with('*')
    }

    fn se_decl(&self, e: &SExpr) -> Result<Decl> {
        let span = e.span();
        let SExpr::List(items, _) = e else {
            return Err(self.error(span, "expected declaration"));
        };
        if items.is_empty() {
            return Err(self.error(span, "expected declaration"));
        }
        let Some(op) = items[0].sym() else {
            return Err(self.error(span, "expected declaration"));
        };

        match op {
            // (fn name ((p type)...) ret? body...)
            "fn" if items.len() >= 3 => {
                let Some(name) = items[1].sym() else {
                    return Err(self.error(span, "expected function name"));
                };
                let name = name.to_string();
                let is_main = name == "main";

                let mut params = Vec::new();
                if let SExpr::List(plist, _) = &items[2] {
                    for p in plist {
                        match p {
                            SExpr::List(pair, pspan) if pair.len() == 2 => {
                                let Some(pname) = pair[0].sym() else {
                                    return Err(self.error(*pspan, "expected parameter name"));
                                };
                                params.push(Param {
                                    name: pname.to_string(),
                                    ty: self.se_type(&pair[1])?,
                                });
                            },
                            // anonymous parameter: just a type
                            _ => params.push(Param {
                                name: "_".to_string(),
                                ty: self.se_type(p)?,
                            }),
                        }
                    }
                }

                let default_ret = if is_main { Type::I32 } else { Type::Void };
                let (ret, body_start) = match items.get(3).and_then(|e| e.sym()) {
                    Some(s) if Self::is_type_symbol(s) => (self.se_type(&items[3])?, 4),
                    _ => (default_ret, 3),
                };

                let mut body = self.se_block(&items[body_start..])?;

                // implicit return for non-void, non-main functions
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
            },
            // (st name (field type)...)
            "st" if items.len() >= 2 => {
                let Some(name) = items[1].sym() else {
                    return Err(self.error(span, "expected struct name"));
                };
                let mut fields = Vec::new();
                for f in &items[2..] {
                    let SExpr::List(pair, fspan) = f else {
                        return Err(self.error(f.span(), "expected (field type)"));
                    };
                    if pair.len() != 2 {
                        return Err(self.error(*fspan, "expected (field type)"));
                    }
                    let Some(fname) = pair[0].sym() else {
                        return Err(self.error(*fspan, "expected field name"));
                    };
                    fields.push(Param {
                        name: fname.to_string(),
                        ty: self.se_type(&pair[1])?,
                    });
                }
                Ok(Decl::St(StDecl {
                    name: name.to_string(),
                    fields,
                    span,
                }))
            },
            // (enum name (member value?)... )
            "enum" if items.len() >= 2 => {
                let Some(name) = items[1].sym() else {
                    return Err(self.error(span, "expected enum name"));
                };
                let mut members = Vec::new();
                let mut value: i32 = 0;
                for m in &items[2..] {
                    match m {
                        SExpr::Atom(STok::Sym(mname), _) => {
                            members.push((mname.clone(), value));
                            value += 1;
                        },
                        SExpr::List(pair, mspan) if pair.len() == 2 => {
                            let Some(mname) = pair[0].sym() else {
                                return Err(self.error(*mspan, "expected member name"));
                            };
                            let SExpr::Atom(STok::Int(v), _) = &pair[1] else {
                                return Err(self.error(*mspan, "expected member value"));
                            };
                            value = *v as i32;
                            members.push((mname.to_string(), value));
                            value += 1;
                        },
                        _ => return Err(self.error(m.span(), "expected enum member")),
                    }
                }
                Ok(Decl::Enum(EnumDecl {
                    name: name.to_string(),
                    members,
                    span,
                }))
            },
            // (ext name (types... [...]) ret?)
            "ext" if items.len() >= 3 => {
                let Some(name) = items[1].sym() else {
                    return Err(self.error(span, "expected extern name"));
                };
                let SExpr::List(tlist, _) = &items[2] else {
                    return Err(self.error(items[2].span(), "expected parameter type list"));
                };
                let mut types = tlist.as_slice();
                let mut variadic = false;
                if let Some(last) = types.last() {
                    if last.sym() == Some("...") {
                        variadic = true;
                        types = &types[..types.len() - 1];
                    }
                }
                let params = types
                    .iter()
                    .enumerate()
                    .map(|(i, t)| {
                        Ok(Param {
                            name: format!("_p{}", i),
                            ty: self.se_type(t)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let ret = match items.get(3) {
                    Some(t) => self.se_type(t)?,
                    None => Type::Void,
                };
                Ok(Decl::Ext(ExtDecl {
                    name: name.to_string(),
                    params,
                    ret,
                    variadic,
                    span,
                }))
            },
            other => Err(self.error(span, format!("unknown declaration '{}'", other))),
        }
    }
}

/// Parse an S-expression source file into a program. The `std` prelude
/// (keyword surface) is auto-loaded like the main parser does.
pub fn parse(src: &str, file: &str, config: &ParseConfig) -> Result<Program> {
    let mut p = SParser::new(src, file);
    let mut decls = Vec::new();

    if !config.no_std_prelude {
        if let Some(std_prog) = load_prelude("std")? {
            decls.extend(std_prog.decls);
        }
    }

    while p.tok != STok::Eof {
        let e = p.parse_sexpr();
        decls.push(p.se_decl(&e)?);
    }

    Ok(Program { decls })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_gsx(src: &str) -> Program {
        parse(src, "test.gsx", &ParseConfig { no_std_prelude: true }).unwrap()
    }

    #[test]
    fn test_fn_decl() {
        let prog = parse_gsx("(fn add ((a i32) (b i32)) i32 (^ (+ a b)))");
        let Decl::Fn(f) = &prog.decls[0] else {
            panic!("expected fn");
        };
        assert_eq!(f.name, "add");
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.ret, Type::I32);
        assert!(matches!(&f.body[0].kind, StmtKind::Ret(Some(_))));
    }

    #[test]
    fn test_fn_without_ret_type() {
        let prog = parse_gsx("(fn main () (^ 0))");
        let Decl::Fn(f) = &prog.decls[0] else {
            panic!("expected fn");
        };
        assert_eq!(f.ret, Type::I32);
    }

    #[test]
    fn test_struct_decl() {
        let prog = parse_gsx("(st Point (x i32) (y i32))");
        let Decl::St(s) = &prog.decls[0] else {
            panic!("expected struct");
        };
        assert_eq!(s.name, "Point");
        assert_eq!(s.fields.len(), 2);
    }

    #[test]
    fn test_ext_decl_variadic() {
        let prog = parse_gsx("(ext printf (*u8 ...) i32)");
        let Decl::Ext(e) = &prog.decls[0] else {
            panic!("expected ext");
        };
        assert!(e.variadic);
        assert_eq!(e.params.len(), 1);
        assert_eq!(e.params[0].ty, Type::ptr(Type::U8));
    }

    #[test]
    fn test_while_and_compound_assign() {
        let prog = parse_gsx("(fn f () i32 (= x 0) (@ (< x 5) (+= x 1)) (^ x))");
        let Decl::Fn(f) = &prog.decls[0] else {
            panic!("expected fn");
        };
        assert!(matches!(&f.body[1].kind, StmtKind::While { .. }));
    }

    #[test]
    fn test_if_with_else() {
        let prog = parse_gsx("(fn f ((x i32)) i32 (if (< x 0) (^ 0) (el (^ 1))))");
        let Decl::Fn(f) = &prog.decls[0] else {
            panic!("expected fn");
        };
        let StmtKind::If { else_blk, .. } = &f.body[0].kind else {
            panic!("expected if");
        };
        assert!(else_blk.is_some());
    }

    #[test]
    fn test_ternary_and_field() {
        let prog = parse_gsx("(fn f ((p *Point)) i32 (^ (? (> (. p x) 0) 1 0)))");
        let Decl::Fn(f) = &prog.decls[0] else {
            panic!("expected fn");
        };
        let StmtKind::Ret(Some(e)) = &f.body[0].kind else {
            panic!("expected ret");
        };
        assert!(matches!(e.kind, ExprKind::Ternary { .. }));
    }

    #[test]
    fn test_del_desugar() {
        let prog = parse_gsx("(fn f ((p *v)) (del p))");
        let Decl::Fn(f) = &prog.decls[0] else {
            panic!("expected fn");
        };
        let StmtKind::Expr(e) = &f.body[0].kind else {
            panic!("expected expr");
        };
        let ExprKind::Call { callee, .. } = &e.kind else {
            panic!("expected call");
        };
        assert!(matches!(&callee.kind, ExprKind::Ident(n) if n == "free"));
    }

    #[test]
    fn test_nw_desugar() {
        let prog = parse_gsx("(fn f () *Point (^ (nw Point)))");
        let Decl::Fn(f) = &prog.decls[0] else {
            panic!("expected fn");
        };
        let StmtKind::Ret(Some(e)) = &f.body[0].kind else {
            panic!("expected ret");
        };
        assert!(matches!(e.kind, ExprKind::Cast { .. }));
    }

    #[test]
    fn test_implicit_return_promotion() {
        let prog = parse_gsx("(fn f () i32 (+ 1 2))");
        let Decl::Fn(f) = &prog.decls[0] else {
            panic!("expected fn");
        };
        assert!(matches!(&f.body[0].kind, StmtKind::Ret(Some(_))));
    }

    #[test]
    fn test_comments_skipped() {
        let prog = parse_gsx("; header comment\n(fn main () (^ 0)) ; trailing");
        assert_eq!(prog.decls.len(), 1);
    }

    #[test]
    fn test_negative_number_atom() {
        let prog = parse_gsx("(fn f () i32 (^ -5))");
        let Decl::Fn(f) = &prog.decls[0] else {
            panic!("expected fn");
        };
        let StmtKind::Ret(Some(e)) = &f.body[0].kind else {
            panic!("expected ret");
        };
        assert!(matches!(e.kind, ExprKind::Int(-5)));
    }

    #[test]
    fn test_unknown_decl_errors() {
        let result = parse(
            "(wat x)",
            "test.gsx",
            &ParseConfig { no_std_prelude: true },
        );
        assert!(result.is_err());
    }
}
