//! glyphc-ast - AST node definitions shared by both parsers.
//!
//! Nodes are tagged sums with the source position outside the tag, so every
//! node kind carries a span without repeating it per variant. The tree is
//! immutable after parsing; the code generator resolves types as it lowers
//! and returns them beside the produced values.

pub mod types;

pub use types::Type;

use glyphc_util::Span;

/// A whole compilation unit: prelude declarations followed by the input
/// file's declarations, in source order.
#[derive(Clone, Debug)]
pub struct Program {
    pub decls: Vec<Decl>,
}

/// A named, typed parameter (or struct field).
#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

/// Top-level declaration.
#[derive(Clone, Debug)]
pub enum Decl {
    /// External function: name, params, return type, variadic flag.
    Ext(ExtDecl),
    /// Function definition.
    Fn(FnDecl),
    /// Named struct.
    St(StDecl),
    /// Enum: members become `i32` constants.
    Enum(EnumDecl),
}

#[derive(Clone, Debug)]
pub struct ExtDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Type,
    pub variadic: bool,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct FnDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Type,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct StDecl {
    pub name: String,
    pub fields: Vec<Param>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<(String, i32)>,
    pub span: Span,
}

/// Statement node: kind + source position.
#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    /// `ret expr?`
    Ret(Option<Expr>),
    Expr(Expr),
    /// `name : type = init` or `name := init` (type left for inference).
    Decl {
        name: String,
        ty: Option<Type>,
        init: Option<Expr>,
    },
    Assign {
        target: Expr,
        value: Expr,
    },
    If {
        cond: Expr,
        then_blk: Vec<Stmt>,
        else_blk: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    Break,
    Continue,
    /// Synthesized from `for i := start..end`: explicit init/cond/incr.
    For {
        init: Box<Stmt>,
        cond: Expr,
        incr: Box<Stmt>,
        body: Vec<Stmt>,
    },
    /// Parallel case values and bodies; a `None` value is the default arm.
    Match {
        scrutinee: Expr,
        case_vals: Vec<Option<Expr>>,
        case_bodies: Vec<Vec<Stmt>>,
    },
    /// Statement emitted at every function exit, in reverse push order.
    Defer(Box<Stmt>),
    Asm(InlineAsm),
}

/// `asm("template" : outputs : inputs : clobbers)`
#[derive(Clone, Debug)]
pub struct InlineAsm {
    pub template: String,
    pub outputs: Vec<(String, Expr)>,
    pub inputs: Vec<(String, Expr)>,
    pub clobbers: Vec<String>,
}

/// Expression node: kind + source position.
#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Str(String),
    Null,
    Ident(String),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Field {
        object: Box<Expr>,
        field: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Cast {
        expr: Box<Expr>,
        target: Type,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// `sz T` - layout size of a type, i64.
    Sizeof(Type),
    /// `nw T { field: value, ... }` - heap-allocated struct literal, `*T`.
    StructInit {
        ty: Type,
        fields: Vec<(String, Expr)>,
    },
    /// `ct expr` - folded to an i64 constant at compile time.
    Comptime(Box<Expr>),
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    /// `&&` - short-circuit.
    LogAnd,
    /// `||` - short-circuit.
    LogOr,
    /// `..` - exclusive range; only valid in `for` heads and reducer calls.
    Range,
    /// `..=` - inclusive range.
    RangeInclusive,
}

impl BinOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge
        )
    }

    pub fn is_range(&self) -> bool {
        matches!(self, BinOp::Range | BinOp::RangeInclusive)
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    /// `-`
    Neg,
    /// `!` - bitwise complement (zero is false, non-zero is true).
    Not,
    /// `&` - address of an l-value.
    Addr,
    /// `*` - load through a pointer.
    Deref,
}
