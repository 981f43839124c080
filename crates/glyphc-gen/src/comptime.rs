//! Compile-time constant folding.
//!
//! A `ct` expression must reduce to an i64 constant: integer literals,
//! `sz T` (layout constant), unary minus, integer binary arithmetic and
//! comparisons, and ternaries over an integer condition. Division by zero
//! folds to zero. Anything outside this subset is a compile-time error.

use glyphc_ast::{BinOp, Expr, ExprKind, UnOp};

use crate::error::{CodeGenError, Result};
use crate::llvm::CodeGen;

impl<'ctx, 'ast> CodeGen<'ctx, 'ast> {
    pub(crate) fn fold_comptime(&self, expr: &Expr) -> Result<i64> {
        match &expr.kind {
            ExprKind::Int(v) => Ok(*v),

            ExprKind::Sizeof(ty) => Ok(self.abi_size(ty)? as i64),

            ExprKind::Unary {
                op: UnOp::Neg,
                operand,
            } => Ok(self.fold_comptime(operand)?.wrapping_neg()),

            ExprKind::Binary { op, left, right } => {
                let l = self.fold_comptime(left)?;
                let r = self.fold_comptime(right)?;
                let v = match op {
                    BinOp::Add => l.wrapping_add(r),
                    BinOp::Sub => l.wrapping_sub(r),
                    BinOp::Mul => l.wrapping_mul(r),
                    BinOp::Div => {
                        if r == 0 {
                            0
                        } else {
                            l.wrapping_div(r)
                        }
                    },
                    BinOp::Rem => {
                        if r == 0 {
                            0
                        } else {
                            l.wrapping_rem(r)
                        }
                    },
                    BinOp::Shl => l.wrapping_shl(r as u32),
                    BinOp::Shr => l.wrapping_shr(r as u32),
                    BinOp::BitAnd => l & r,
                    BinOp::BitOr => l | r,
                    BinOp::BitXor => l ^ r,
                    BinOp::Eq => (l == r) as i64,
                    BinOp::Ne => (l != r) as i64,
                    BinOp::Lt => (l < r) as i64,
                    BinOp::Gt => (l > r) as i64,
                    BinOp::Le => (l <= r) as i64,
                    BinOp::Ge => (l >= r) as i64,
                    _ => return Err(CodeGenError::ComptimeUnfoldable),
                };
                Ok(v)
            },

            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                let c = self.fold_comptime(cond)?;
                if c != 0 {
                    self.fold_comptime(then_expr)
                } else {
                    self.fold_comptime(else_expr)
                }
            },

            // nested ct marks fold the same way
            ExprKind::Comptime(inner) => self.fold_comptime(inner),

            _ => Err(CodeGenError::ComptimeUnfoldable),
        }
    }
}
