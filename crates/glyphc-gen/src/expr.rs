//! Expression lowering.
//!
//! Every expression lowers to an IR value plus its resolved Glyph type
//! (`None` for void calls). L-values lower to an address and the type
//! stored there. Implicit conversions happen at binary operations, call
//! edges, stores, and return edges.

use glyphc_ast::{BinOp, Expr, ExprKind, Type, UnOp};
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue, PointerValue};
use inkwell::{FloatPredicate, IntPredicate};

use crate::error::{CodeGenError, Result};
use crate::llvm::{CodeGen, SymbolKind};

/// A lowered expression: the value (absent for void calls) and its type.
pub(crate) type Lowered<'ctx> = (Option<BasicValueEnum<'ctx>>, Type);

enum Callee<'ctx> {
    /// Known function symbol.
    Direct(FunctionValue<'ctx>),
    /// Variable of function-pointer type; the slot holding the pointer.
    Indirect(PointerValue<'ctx>),
}

impl<'ctx, 'ast> CodeGen<'ctx, 'ast> {
    pub(crate) fn cg_expr(&mut self, expr: &'ast Expr) -> Result<Lowered<'ctx>> {
        match &expr.kind {
            ExprKind::Int(v) => {
                let val = self.context.i32_type().const_int(*v as u64, true);
                Ok((Some(val.into()), Type::I32))
            },

            ExprKind::Float(v) => {
                let val = self.context.f64_type().const_float(*v);
                Ok((Some(val.into()), Type::F64))
            },

            ExprKind::Str(s) => {
                let global = self.builder.build_global_string_ptr(s, "str")?;
                Ok((
                    Some(global.as_pointer_value().into()),
                    Type::ptr(Type::U8),
                ))
            },

            ExprKind::Null => {
                let ptr = self
                    .context
                    .ptr_type(inkwell::AddressSpace::default())
                    .const_null();
                Ok((Some(ptr.into()), Type::ptr(Type::Void)))
            },

            ExprKind::Ident(name) => {
                let sym = self
                    .sym_lookup(name)
                    .ok_or_else(|| CodeGenError::Undefined(name.clone()))?;
                match &sym.kind {
                    SymbolKind::Var(ptr) => {
                        let (ptr, ty) = (*ptr, sym.ty.clone());
                        let llty = self.llvm_type(&ty)?;
                        let val = self.builder.build_load(llty, ptr, name)?;
                        Ok((Some(val), ty))
                    },
                    SymbolKind::Func(func) => {
                        // the function itself, usable as a pointer value
                        let val = func.as_global_value().as_pointer_value();
                        Ok((Some(val.into()), sym.ty.clone()))
                    },
                }
            },

            ExprKind::Call { callee, args } => self.cg_call(callee, args),

            ExprKind::Field { .. } | ExprKind::Index { .. } => {
                let (ptr, ty) = self.cg_lvalue(expr)?;
                let llty = self.llvm_type(&ty)?;
                let val = self.builder.build_load(llty, ptr, "load")?;
                Ok((Some(val), ty))
            },

            ExprKind::Binary { op, left, right } => self.cg_binary(*op, left, right),

            ExprKind::Unary { op, operand } => self.cg_unary(*op, operand),

            ExprKind::Cast { expr, target } => {
                let (val, _) = self.cg_expr_value(expr)?;
                let llty = self.llvm_type(target)?;
                let val = self.coerce(val, llty)?;
                Ok((Some(val), target.clone()))
            },

            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => self.cg_ternary(cond, then_expr, else_expr),

            ExprKind::Sizeof(ty) => {
                let size = self.abi_size(ty)?;
                let val = self.context.i64_type().const_int(size, false);
                Ok((Some(val.into()), Type::I64))
            },

            ExprKind::StructInit { ty, fields } => self.cg_struct_init(ty, fields),

            ExprKind::Comptime(inner) => {
                let folded = self.fold_comptime(inner)?;
                let val = self.context.i64_type().const_int(folded as u64, true);
                Ok((Some(val.into()), Type::I64))
            },
        }
    }

    /// Lower an expression that must produce a value.
    pub(crate) fn cg_expr_value(
        &mut self,
        expr: &'ast Expr,
    ) -> Result<(BasicValueEnum<'ctx>, Type)> {
        let (val, ty) = self.cg_expr(expr)?;
        match val {
            Some(v) => Ok((v, ty)),
            None => Err(CodeGenError::VoidValue),
        }
    }

    // ---- lvalues ----

    /// Lower an expression to the address it designates plus the type
    /// stored there. No load is emitted.
    pub(crate) fn cg_lvalue(&mut self, expr: &'ast Expr) -> Result<(PointerValue<'ctx>, Type)> {
        match &expr.kind {
            ExprKind::Ident(name) => {
                let sym = self
                    .sym_lookup(name)
                    .ok_or_else(|| CodeGenError::Undefined(name.clone()))?;
                match &sym.kind {
                    SymbolKind::Var(ptr) => Ok((*ptr, sym.ty.clone())),
                    SymbolKind::Func(_) => Err(CodeGenError::NotAnLvalue),
                }
            },

            ExprKind::Field { object, field } => {
                let obj_ty = self.infer_expr_type(object);
                let Some((sname, def)) = self.resolve_struct(&obj_ty) else {
                    return Err(CodeGenError::Unsupported(
                        "field access on non-struct type".to_string(),
                    ));
                };
                let sname = sname.to_string();
                let st_ty = def.llvm_type;
                let Some(idx) = def.field_index(field) else {
                    return Err(CodeGenError::FieldNotFound {
                        strct: sname,
                        field: field.clone(),
                    });
                };
                let field_ty = def.fields[idx].1.clone();

                // a pointer to a struct is followed; a struct value uses
                // its own address
                let base = if obj_ty.is_ptr() {
                    let (val, _) = self.cg_expr_value(object)?;
                    val.into_pointer_value()
                } else {
                    self.cg_lvalue(object)?.0
                };

                let ptr = self
                    .builder
                    .build_struct_gep(st_ty, base, idx as u32, "fptr")?;
                Ok((ptr, field_ty))
            },

            ExprKind::Unary {
                op: UnOp::Deref,
                operand,
            } => {
                let (val, ty) = self.cg_expr_value(operand)?;
                let BasicValueEnum::PointerValue(ptr) = val else {
                    return Err(CodeGenError::NotAnLvalue);
                };
                let pointee = ty.pointee().cloned().unwrap_or(Type::I32);
                Ok((ptr, pointee))
            },

            ExprKind::Index { object, index } => {
                let obj_ty = self.infer_expr_type(object);
                let (base, _) = self.cg_lvalue(object)?;
                let (idx_val, _) = self.cg_expr_value(index)?;
                let BasicValueEnum::IntValue(idx) = idx_val else {
                    return Err(CodeGenError::Unsupported(
                        "non-integer index".to_string(),
                    ));
                };

                if let Type::Array { elem, .. } = &obj_ty {
                    let elem_ty = (**elem).clone();
                    let arr_llty = self.llvm_type(&obj_ty)?;
                    let zero = self.context.i32_type().const_zero();
                    let ptr = unsafe {
                        self.builder.build_gep(arr_llty, base, &[zero, idx], "idx")?
                    };
                    return Ok((ptr, elem_ty));
                }

                // pointer indexing: load the pointer, then stride by the
                // pointee size
                let elem_ty = obj_ty.pointee().cloned().unwrap_or(Type::I32);
                let elem_llty = self.llvm_type(&elem_ty)?;
                let ptr_ty = self.context.ptr_type(inkwell::AddressSpace::default());
                let loaded = self
                    .builder
                    .build_load(ptr_ty, base, "lp")?
                    .into_pointer_value();
                let ptr = unsafe { self.builder.build_gep(elem_llty, loaded, &[idx], "idx")? };
                Ok((ptr, elem_ty))
            },

            _ => Err(CodeGenError::NotAnLvalue),
        }
    }

    // ---- operators ----

    fn cg_binary(&mut self, op: BinOp, left: &'ast Expr, right: &'ast Expr) -> Result<Lowered<'ctx>> {
        // && and || evaluate the RHS conditionally
        if matches!(op, BinOp::LogAnd | BinOp::LogOr) {
            return self.cg_short_circuit(op, left, right);
        }
        if op.is_range() {
            return Err(CodeGenError::Unsupported(
                "range outside of for loop or reducer".to_string(),
            ));
        }

        let (lv, lt) = self.cg_expr_value(left)?;
        let (rv, rt) = self.cg_expr_value(right)?;

        // pointer arithmetic and pointer comparison
        if lv.is_pointer_value() || rv.is_pointer_value() {
            return self.cg_pointer_binary(op, lv, lt, rv, rt);
        }

        let mut lv = lv;
        let mut rv = rv;

        // widen integers to the common width (zero-extension)
        if let (BasicValueEnum::IntValue(li), BasicValueEnum::IntValue(ri)) = (lv, rv) {
            let lw = li.get_type().get_bit_width();
            let rw = ri.get_type().get_bit_width();
            if lw > rw {
                rv = self
                    .builder
                    .build_int_z_extend(ri, li.get_type(), "widen")?
                    .into();
            } else if rw > lw {
                lv = self
                    .builder
                    .build_int_z_extend(li, ri.get_type(), "widen")?
                    .into();
            }
        }

        // promote the integer side when the other is a float; two floats
        // of different width widen to f64
        match (lv, rv) {
            (BasicValueEnum::FloatValue(_), BasicValueEnum::IntValue(_)) => {
                rv = self.coerce(rv, lv.get_type())?;
            },
            (BasicValueEnum::IntValue(_), BasicValueEnum::FloatValue(_)) => {
                lv = self.coerce(lv, rv.get_type())?;
            },
            (BasicValueEnum::FloatValue(lf), BasicValueEnum::FloatValue(rf))
                if lf.get_type() != rf.get_type() =>
            {
                let f64_ty = self.context.f64_type();
                lv = self.builder.build_float_cast(lf, f64_ty, "fw")?.into();
                rv = self.builder.build_float_cast(rf, f64_ty, "fw")?.into();
            },
            _ => {},
        }

        // static result type: the float side wins, otherwise the wider
        // integer operand (left on a tie)
        let operand_ty = if lt.is_float() && rt.is_float() {
            if lt == rt { lt.clone() } else { Type::F64 }
        } else if lt.is_float() {
            lt.clone()
        } else if rt.is_float() {
            rt.clone()
        } else {
            match (lt.int_width(), rt.int_width()) {
                (Some(lw), Some(rw)) if rw > lw => rt.clone(),
                _ => lt.clone(),
            }
        };

        if let (BasicValueEnum::FloatValue(lf), BasicValueEnum::FloatValue(rf)) = (lv, rv) {
            let b = &self.builder;
            let (val, ty): (BasicValueEnum, Type) = match op {
                BinOp::Add => (b.build_float_add(lf, rf, "fadd")?.into(), operand_ty),
                BinOp::Sub => (b.build_float_sub(lf, rf, "fsub")?.into(), operand_ty),
                BinOp::Mul => (b.build_float_mul(lf, rf, "fmul")?.into(), operand_ty),
                BinOp::Div => (b.build_float_div(lf, rf, "fdiv")?.into(), operand_ty),
                BinOp::Rem => (b.build_float_rem(lf, rf, "frem")?.into(), operand_ty),
                BinOp::Eq => (
                    b.build_float_compare(FloatPredicate::OEQ, lf, rf, "feq")?.into(),
                    Type::I32,
                ),
                BinOp::Ne => (
                    b.build_float_compare(FloatPredicate::ONE, lf, rf, "fne")?.into(),
                    Type::I32,
                ),
                BinOp::Lt => (
                    b.build_float_compare(FloatPredicate::OLT, lf, rf, "flt")?.into(),
                    Type::I32,
                ),
                BinOp::Gt => (
                    b.build_float_compare(FloatPredicate::OGT, lf, rf, "fgt")?.into(),
                    Type::I32,
                ),
                BinOp::Le => (
                    b.build_float_compare(FloatPredicate::OLE, lf, rf, "fle")?.into(),
                    Type::I32,
                ),
                BinOp::Ge => (
                    b.build_float_compare(FloatPredicate::OGE, lf, rf, "fge")?.into(),
                    Type::I32,
                ),
                other => {
                    return Err(CodeGenError::Unsupported(format!(
                        "float operands for {:?}",
                        other
                    )));
                },
            };
            return Ok((Some(val), ty));
        }

        let (BasicValueEnum::IntValue(li), BasicValueEnum::IntValue(ri)) = (lv, rv) else {
            return Err(CodeGenError::Unsupported(format!(
                "operand types for {:?}",
                op
            )));
        };

        // division, remainder, right shift, and ordering follow the
        // signedness of the static operand type
        let unsigned = operand_ty.is_unsigned();
        let b = &self.builder;
        let (val, ty): (BasicValueEnum, Type) = match op {
            BinOp::Add => (b.build_int_add(li, ri, "add")?.into(), operand_ty),
            BinOp::Sub => (b.build_int_sub(li, ri, "sub")?.into(), operand_ty),
            BinOp::Mul => (b.build_int_mul(li, ri, "mul")?.into(), operand_ty),
            BinOp::Div => {
                if unsigned {
                    (b.build_int_unsigned_div(li, ri, "udiv")?.into(), operand_ty)
                } else {
                    (b.build_int_signed_div(li, ri, "div")?.into(), operand_ty)
                }
            },
            BinOp::Rem => {
                if unsigned {
                    (b.build_int_unsigned_rem(li, ri, "urem")?.into(), operand_ty)
                } else {
                    (b.build_int_signed_rem(li, ri, "rem")?.into(), operand_ty)
                }
            },
            BinOp::BitAnd => (b.build_and(li, ri, "and")?.into(), operand_ty),
            BinOp::BitOr => (b.build_or(li, ri, "or")?.into(), operand_ty),
            BinOp::BitXor => (b.build_xor(li, ri, "xor")?.into(), operand_ty),
            BinOp::Shl => (b.build_left_shift(li, ri, "shl")?.into(), operand_ty),
            BinOp::Shr => (
                b.build_right_shift(li, ri, !unsigned, "shr")?.into(),
                operand_ty,
            ),
            BinOp::Eq => (
                b.build_int_compare(IntPredicate::EQ, li, ri, "eq")?.into(),
                Type::I32,
            ),
            BinOp::Ne => (
                b.build_int_compare(IntPredicate::NE, li, ri, "ne")?.into(),
                Type::I32,
            ),
            BinOp::Lt => {
                let p = if unsigned { IntPredicate::ULT } else { IntPredicate::SLT };
                (b.build_int_compare(p, li, ri, "lt")?.into(), Type::I32)
            },
            BinOp::Gt => {
                let p = if unsigned { IntPredicate::UGT } else { IntPredicate::SGT };
                (b.build_int_compare(p, li, ri, "gt")?.into(), Type::I32)
            },
            BinOp::Le => {
                let p = if unsigned { IntPredicate::ULE } else { IntPredicate::SLE };
                (b.build_int_compare(p, li, ri, "le")?.into(), Type::I32)
            },
            BinOp::Ge => {
                let p = if unsigned { IntPredicate::UGE } else { IntPredicate::SGE };
                (b.build_int_compare(p, li, ri, "ge")?.into(), Type::I32)
            },
            other => {
                return Err(CodeGenError::Unsupported(format!(
                    "integer operands for {:?}",
                    other
                )));
            },
        };
        Ok((Some(val), ty))
    }

    /// `p + i` / `p - i` stride by the pointee size; `p - q` is the byte
    /// difference as i64; pointer comparisons go through ptrtoint.
    fn cg_pointer_binary(
        &mut self,
        op: BinOp,
        lv: BasicValueEnum<'ctx>,
        lt: Type,
        rv: BasicValueEnum<'ctx>,
        _rt: Type,
    ) -> Result<Lowered<'ctx>> {
        let i64_ty = self.context.i64_type();

        // p - q
        if op == BinOp::Sub && lv.is_pointer_value() && rv.is_pointer_value() {
            let li = self
                .builder
                .build_ptr_to_int(lv.into_pointer_value(), i64_ty, "lp2i")?;
            let ri = self
                .builder
                .build_ptr_to_int(rv.into_pointer_value(), i64_ty, "rp2i")?;
            let diff = self.builder.build_int_sub(li, ri, "ptrdiff")?;
            return Ok((Some(diff.into()), Type::I64));
        }

        // p +/- i
        if matches!(op, BinOp::Add | BinOp::Sub) && lv.is_pointer_value() {
            let BasicValueEnum::IntValue(ri) = rv else {
                return Err(CodeGenError::Unsupported(
                    "pointer arithmetic with non-integer".to_string(),
                ));
            };
            let elem_ty = lt.pointee().cloned().unwrap_or(Type::U8);
            let elem_llty = self.llvm_type(&elem_ty)?;
            let mut idx = ri;
            if op == BinOp::Sub {
                idx = self.builder.build_int_neg(idx, "neg")?;
            }
            if idx.get_type().get_bit_width() < 64 {
                idx = self.builder.build_int_s_extend(idx, i64_ty, "sext")?;
            }
            let ptr = unsafe {
                self.builder
                    .build_gep(elem_llty, lv.into_pointer_value(), &[idx], "ptradd")?
            };
            return Ok((Some(ptr.into()), lt));
        }

        // comparisons: both sides become i64 integers first
        if op.is_comparison() {
            let li = self.pointer_compare_operand(lv)?;
            let ri = self.pointer_compare_operand(rv)?;
            let pred = match op {
                BinOp::Eq => IntPredicate::EQ,
                BinOp::Ne => IntPredicate::NE,
                BinOp::Lt => IntPredicate::ULT,
                BinOp::Gt => IntPredicate::UGT,
                BinOp::Le => IntPredicate::ULE,
                _ => IntPredicate::UGE,
            };
            let val = self.builder.build_int_compare(pred, li, ri, "pcmp")?;
            return Ok((Some(val.into()), Type::I32));
        }

        Err(CodeGenError::Unsupported(format!(
            "pointer operands for {:?}",
            op
        )))
    }

    fn pointer_compare_operand(
        &self,
        val: BasicValueEnum<'ctx>,
    ) -> Result<inkwell::values::IntValue<'ctx>> {
        let i64_ty = self.context.i64_type();
        match val {
            BasicValueEnum::PointerValue(p) => {
                Ok(self.builder.build_ptr_to_int(p, i64_ty, "p2i")?)
            },
            BasicValueEnum::IntValue(i) => {
                if i.get_type().get_bit_width() < 64 {
                    Ok(self.builder.build_int_z_extend(i, i64_ty, "zext")?)
                } else {
                    Ok(i)
                }
            },
            _ => Err(CodeGenError::Unsupported(
                "pointer comparison operand".to_string(),
            )),
        }
    }

    /// Three-block diamond with an i1 phi; the RHS block only runs when the
    /// LHS did not already decide the outcome.
    fn cg_short_circuit(
        &mut self,
        op: BinOp,
        left: &'ast Expr,
        right: &'ast Expr,
    ) -> Result<Lowered<'ctx>> {
        let (lv, _) = self.cg_expr_value(left)?;
        let lb = self.to_bool(lv)?;

        let func = self.current_fn();
        let entry_bb = self
            .builder
            .get_insert_block()
            .ok_or_else(|| CodeGenError::Llvm("no insert block".to_string()))?;
        let rhs_bb = self.context.append_basic_block(func, "sc.rhs");
        let merge_bb = self.context.append_basic_block(func, "sc.end");

        if op == BinOp::LogAnd {
            self.builder.build_conditional_branch(lb, rhs_bb, merge_bb)?;
        } else {
            self.builder.build_conditional_branch(lb, merge_bb, rhs_bb)?;
        }

        self.builder.position_at_end(rhs_bb);
        let (rv, _) = self.cg_expr_value(right)?;
        let rb = self.to_bool(rv)?;
        let rhs_end = self
            .builder
            .get_insert_block()
            .ok_or_else(|| CodeGenError::Llvm("no insert block".to_string()))?;
        self.builder.build_unconditional_branch(merge_bb)?;

        self.builder.position_at_end(merge_bb);
        let i1 = self.context.bool_type();
        let short_val = i1.const_int(if op == BinOp::LogAnd { 0 } else { 1 }, false);
        let phi = self.builder.build_phi(i1, "sc")?;
        phi.add_incoming(&[(&short_val, entry_bb), (&rb, rhs_end)]);
        Ok((Some(phi.as_basic_value()), Type::I32))
    }

    fn cg_unary(&mut self, op: UnOp, operand: &'ast Expr) -> Result<Lowered<'ctx>> {
        match op {
            UnOp::Neg => {
                let (val, ty) = self.cg_expr_value(operand)?;
                let out: BasicValueEnum = match val {
                    BasicValueEnum::FloatValue(fv) => {
                        self.builder.build_float_neg(fv, "fneg")?.into()
                    },
                    BasicValueEnum::IntValue(iv) => self.builder.build_int_neg(iv, "neg")?.into(),
                    other => {
                        return Err(CodeGenError::Unsupported(format!(
                            "negation of {:?}",
                            other.get_type()
                        )));
                    },
                };
                Ok((Some(out), ty))
            },
            UnOp::Not => {
                let (val, _) = self.cg_expr_value(operand)?;
                let BasicValueEnum::IntValue(iv) = val else {
                    return Err(CodeGenError::Unsupported(
                        "complement of non-integer".to_string(),
                    ));
                };
                let out = self.builder.build_not(iv, "not")?;
                Ok((Some(out.into()), Type::I32))
            },
            UnOp::Addr => {
                let (ptr, ty) = self.cg_lvalue(operand)?;
                Ok((Some(ptr.into()), Type::ptr(ty)))
            },
            UnOp::Deref => {
                let (val, ty) = self.cg_expr_value(operand)?;
                let BasicValueEnum::PointerValue(ptr) = val else {
                    return Err(CodeGenError::Unsupported(
                        "dereference of non-pointer".to_string(),
                    ));
                };
                let pointee = ty.pointee().cloned().unwrap_or(Type::I32);
                let llty = self.llvm_type(&pointee)?;
                let out = self.builder.build_load(llty, ptr, "deref")?;
                Ok((Some(out), pointee))
            },
        }
    }

    fn cg_ternary(
        &mut self,
        cond: &'ast Expr,
        then_expr: &'ast Expr,
        else_expr: &'ast Expr,
    ) -> Result<Lowered<'ctx>> {
        let (cv, _) = self.cg_expr_value(cond)?;
        let cb = self.to_bool(cv)?;

        let func = self.current_fn();
        let then_bb = self.context.append_basic_block(func, "t.then");
        let else_bb = self.context.append_basic_block(func, "t.else");
        let merge_bb = self.context.append_basic_block(func, "t.merge");

        self.builder.build_conditional_branch(cb, then_bb, else_bb)?;

        self.builder.position_at_end(then_bb);
        let (then_val, then_ty) = self.cg_expr_value(then_expr)?;
        let then_end = self
            .builder
            .get_insert_block()
            .ok_or_else(|| CodeGenError::Llvm("no insert block".to_string()))?;
        self.builder.build_unconditional_branch(merge_bb)?;

        self.builder.position_at_end(else_bb);
        let (else_val, _) = self.cg_expr_value(else_expr)?;
        // the else branch follows the then branch's type
        let else_val = self.coerce(else_val, then_val.get_type())?;
        let else_end = self
            .builder
            .get_insert_block()
            .ok_or_else(|| CodeGenError::Llvm("no insert block".to_string()))?;
        self.builder.build_unconditional_branch(merge_bb)?;

        self.builder.position_at_end(merge_bb);
        let phi = self.builder.build_phi(then_val.get_type(), "t.val")?;
        phi.add_incoming(&[(&then_val, then_end), (&else_val, else_end)]);
        Ok((Some(phi.as_basic_value()), then_ty))
    }

    // ---- calls ----

    fn cg_call(&mut self, callee: &'ast Expr, args: &'ast [Expr]) -> Result<Lowered<'ctx>> {
        let mut ufcs_self = None;

        let (target, fn_ty) = match &callee.kind {
            ExprKind::Ident(name) => match self.sym_lookup(name) {
                Some(sym) => match &sym.kind {
                    SymbolKind::Func(func) => (Callee::Direct(*func), sym.ty.clone()),
                    SymbolKind::Var(slot) => {
                        // a variable of function-pointer type calls
                        // indirectly
                        let slot = *slot;
                        match &sym.ty {
                            Type::Ptr(inner) if matches!(**inner, Type::Fn { .. }) => {
                                (Callee::Indirect(slot), (**inner).clone())
                            },
                            _ => return Err(CodeGenError::NotAFunction(name.clone())),
                        }
                    },
                },
                None => {
                    // codegen-provided intrinsics resolve only when the
                    // name is not otherwise bound
                    if name == "print" {
                        return self.cg_builtin_print(args);
                    }
                    if matches!(name.as_str(), "product" | "sum" | "count" | "min" | "max") {
                        return self.cg_builtin_reduce(name, args);
                    }
                    return Err(CodeGenError::UndefinedFunction(name.clone()));
                },
            },
            ExprKind::Field { object, field } => {
                // uniform function-call syntax: obj.f(args) is f(obj, args)
                // when f names a free function
                let pair = match self.sym_lookup(field) {
                    Some(sym) => match &sym.kind {
                        SymbolKind::Func(func) => (Callee::Direct(*func), sym.ty.clone()),
                        SymbolKind::Var(_) => {
                            return Err(CodeGenError::NotAFunction(field.clone()));
                        },
                    },
                    None => return Err(CodeGenError::NotAFunction(field.clone())),
                };
                ufcs_self = Some(self.cg_expr_value(object)?.0);
                pair
            },
            _ => {
                return Err(CodeGenError::Unsupported(
                    "callee expression".to_string(),
                ));
            },
        };

        let Type::Fn {
            ret,
            params,
            variadic,
        } = fn_ty
        else {
            return Err(CodeGenError::NotAFunction("<callee>".to_string()));
        };

        // arguments coerce to declared parameter types on the call edge;
        // variadic extras pass through unchanged
        let mut lowered: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len() + 1);
        let mut param_idx = 0usize;
        if let Some(self_val) = ufcs_self {
            let val = if param_idx < params.len() {
                let llty = self.llvm_type(&params[param_idx])?;
                self.coerce(self_val, llty)?
            } else {
                self_val
            };
            lowered.push(val.into());
            param_idx += 1;
        }
        for arg in args {
            let (val, _) = self.cg_expr_value(arg)?;
            let val = if param_idx < params.len() {
                let llty = self.llvm_type(&params[param_idx])?;
                self.coerce(val, llty)?
            } else {
                val
            };
            lowered.push(val.into());
            param_idx += 1;
        }

        let name = if ret.is_void() { "" } else { "call" };
        let call = match target {
            Callee::Direct(func) => self.builder.build_call(func, &lowered, name)?,
            Callee::Indirect(slot) => {
                let ptr_ty = self.context.ptr_type(inkwell::AddressSpace::default());
                let fp = self
                    .builder
                    .build_load(ptr_ty, slot, "fp")?
                    .into_pointer_value();
                let llvm_fn_ty = self.llvm_fn_type(&ret, &params, variadic)?;
                self.builder
                    .build_indirect_call(llvm_fn_ty, fp, &lowered, name)?
            },
        };

        Ok((call.try_as_basic_value().left(), *ret))
    }

    /// `print(x)` formats by the argument's type through `printf`.
    fn cg_builtin_print(&mut self, args: &'ast [Expr]) -> Result<Lowered<'ctx>> {
        if args.is_empty() {
            return Err(CodeGenError::Unsupported(
                "print requires an argument".to_string(),
            ));
        }
        let printf = match self.sym_lookup("printf") {
            Some(sym) => match &sym.kind {
                SymbolKind::Func(func) => *func,
                SymbolKind::Var(_) => return Err(CodeGenError::NotAFunction("printf".into())),
            },
            None => {
                return Err(CodeGenError::Unsupported(
                    "print requires printf (load the std prelude)".to_string(),
                ));
            },
        };

        let (val, ty) = self.cg_expr_value(&args[0])?;
        let (fmt, val) = if ty.is_float() {
            let val = if ty == Type::F32 {
                let fv = val.into_float_value();
                self.builder
                    .build_float_ext(fv, self.context.f64_type(), "fpext")?
                    .into()
            } else {
                val
            };
            ("%f\n", val)
        } else if ty.is_ptr() {
            // *u8 prints as a C string
            ("%s\n", val)
        } else if matches!(ty, Type::I64 | Type::U64) {
            let val = self.coerce(val, self.context.i64_type().into())?;
            ("%lld\n", val)
        } else {
            let val = self.coerce(val, self.context.i32_type().into())?;
            ("%d\n", val)
        };

        let fmt_ptr = self.builder.build_global_string_ptr(fmt, "print_fmt")?;
        let call = self.builder.build_call(
            printf,
            &[fmt_ptr.as_pointer_value().into(), val.into()],
            "",
        )?;
        Ok((call.try_as_basic_value().left(), Type::I32))
    }

    /// Range reducers expand to an i32 accumulator loop over the range.
    fn cg_builtin_reduce(&mut self, name: &str, args: &'ast [Expr]) -> Result<Lowered<'ctx>> {
        if args.len() != 1 {
            return Err(CodeGenError::Unsupported(format!(
                "{} requires exactly 1 range argument",
                name
            )));
        }
        let ExprKind::Binary { op, left, right } = &args[0].kind else {
            return Err(CodeGenError::Unsupported(format!(
                "{} argument must be a range (start..end or start..=end)",
                name
            )));
        };
        if !op.is_range() {
            return Err(CodeGenError::Unsupported(format!(
                "{} argument must be a range (start..end or start..=end)",
                name
            )));
        }
        let inclusive = *op == BinOp::RangeInclusive;

        let i32_ty = self.context.i32_type();
        let (start, _) = self.cg_expr_value(left)?;
        let (end, _) = self.cg_expr_value(right)?;
        let start = self
            .builder
            .build_int_cast_sign_flag(start.into_int_value(), i32_ty, true, "s")?;
        let end = self
            .builder
            .build_int_cast_sign_flag(end.into_int_value(), i32_ty, true, "e")?;

        let init = match name {
            "product" => i32_ty.const_int(1, false),
            "min" => i32_ty.const_int(i32::MAX as u64, false),
            "max" => i32_ty.const_int(i32::MIN as u32 as u64, true),
            _ => i32_ty.const_zero(), // sum, count
        };

        let acc_ptr = self.builder.build_alloca(i32_ty, "acc")?;
        let i_ptr = self.builder.build_alloca(i32_ty, "i")?;
        self.builder.build_store(acc_ptr, init)?;
        self.builder.build_store(i_ptr, start)?;

        let func = self.current_fn();
        let cond_bb = self.context.append_basic_block(func, "red.cond");
        let body_bb = self.context.append_basic_block(func, "red.body");
        let end_bb = self.context.append_basic_block(func, "red.end");

        self.builder.build_unconditional_branch(cond_bb)?;

        self.builder.position_at_end(cond_bb);
        let i_val = self
            .builder
            .build_load(i32_ty, i_ptr, "iv")?
            .into_int_value();
        let pred = if inclusive { IntPredicate::SLE } else { IntPredicate::SLT };
        let cmp = self.builder.build_int_compare(pred, i_val, end, "cmp")?;
        self.builder.build_conditional_branch(cmp, body_bb, end_bb)?;

        self.builder.position_at_end(body_bb);
        let acc = self
            .builder
            .build_load(i32_ty, acc_ptr, "av")?
            .into_int_value();
        let i_val = self
            .builder
            .build_load(i32_ty, i_ptr, "iv2")?
            .into_int_value();
        let new_acc = match name {
            "product" => self.builder.build_int_mul(acc, i_val, "mul")?,
            "sum" => self.builder.build_int_add(acc, i_val, "add")?,
            "count" => self
                .builder
                .build_int_add(acc, i32_ty.const_int(1, false), "cnt")?,
            "min" => {
                let lt = self
                    .builder
                    .build_int_compare(IntPredicate::SLT, i_val, acc, "lt")?;
                self.builder
                    .build_select(lt, i_val, acc, "min")?
                    .into_int_value()
            },
            _ => {
                let gt = self
                    .builder
                    .build_int_compare(IntPredicate::SGT, i_val, acc, "gt")?;
                self.builder
                    .build_select(gt, i_val, acc, "max")?
                    .into_int_value()
            },
        };
        self.builder.build_store(acc_ptr, new_acc)?;
        let next = self
            .builder
            .build_int_add(i_val, i32_ty.const_int(1, false), "next")?;
        self.builder.build_store(i_ptr, next)?;
        self.builder.build_unconditional_branch(cond_bb)?;

        self.builder.position_at_end(end_bb);
        let result = self.builder.build_load(i32_ty, acc_ptr, "result")?;
        Ok((Some(result), Type::I32))
    }

    // ---- struct literals ----

    /// `T { f: v, ... }` allocates through `malloc` and stores each field;
    /// the result is `*T`.
    fn cg_struct_init(
        &mut self,
        ty: &Type,
        fields: &'ast [(String, Expr)],
    ) -> Result<Lowered<'ctx>> {
        let Type::Struct(name) = ty else {
            return Err(CodeGenError::Unsupported(
                "struct literal of non-struct type".to_string(),
            ));
        };
        let (st_ty, def_fields) = {
            let def = self
                .structs
                .get(name)
                .ok_or_else(|| CodeGenError::UndefinedStruct(name.clone()))?;
            (def.llvm_type, def.fields.clone())
        };

        let malloc = match self.sym_lookup("malloc") {
            Some(sym) => match &sym.kind {
                SymbolKind::Func(func) => *func,
                SymbolKind::Var(_) => return Err(CodeGenError::NotAFunction("malloc".into())),
            },
            None => {
                return Err(CodeGenError::Unsupported(
                    "struct literal requires malloc (load the std prelude)".to_string(),
                ));
            },
        };

        let size = self.abi_size(ty)?;
        let size_val = self.context.i64_type().const_int(size, false);
        let call = self
            .builder
            .build_call(malloc, &[size_val.into()], "sinit")?;
        let raw = call
            .try_as_basic_value()
            .left()
            .ok_or(CodeGenError::VoidValue)?;
        let ptr_ty = self.context.ptr_type(inkwell::AddressSpace::default());
        let ptr = self.coerce(raw, ptr_ty.into())?.into_pointer_value();

        for (fname, fexpr) in fields {
            let Some(idx) = def_fields.iter().position(|(n, _)| n == fname) else {
                return Err(CodeGenError::FieldNotFound {
                    strct: name.clone(),
                    field: fname.clone(),
                });
            };
            let field_ty = def_fields[idx].1.clone();
            let fptr = self
                .builder
                .build_struct_gep(st_ty, ptr, idx as u32, "fip")?;
            let (val, _) = self.cg_expr_value(fexpr)?;
            let llty = self.llvm_type(&field_ty)?;
            let val = self.coerce(val, llty)?;
            self.builder.build_store(fptr, val)?;
        }

        Ok((Some(ptr.into()), Type::ptr(ty.clone())))
    }

    // ---- type inference ----

    /// Best-effort static type of an expression, used before lowering for
    /// declaration inference and lvalue typing. Falls back to i32 the way
    /// integer literals do.
    pub(crate) fn infer_expr_type(&self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::Int(_) => Type::I32,
            ExprKind::Float(_) => Type::F64,
            ExprKind::Str(_) => Type::ptr(Type::U8),
            ExprKind::Null => Type::ptr(Type::Void),
            ExprKind::Ident(name) => self
                .sym_lookup(name)
                .map(|s| s.ty.clone())
                .unwrap_or(Type::I32),
            ExprKind::Call { callee, .. } => {
                let sym = match &callee.kind {
                    ExprKind::Ident(name) => self.sym_lookup(name),
                    ExprKind::Field { field, .. } => self.sym_lookup(field),
                    _ => None,
                };
                match sym.map(|s| &s.ty) {
                    Some(Type::Fn { ret, .. }) => (**ret).clone(),
                    Some(Type::Ptr(inner)) => match inner.as_ref() {
                        Type::Fn { ret, .. } => (**ret).clone(),
                        _ => Type::I32,
                    },
                    _ => Type::I32,
                }
            },
            ExprKind::Cast { target, .. } => target.clone(),
            ExprKind::Unary { op, operand } => match op {
                UnOp::Addr => Type::ptr(self.infer_expr_type(operand)),
                UnOp::Deref => self
                    .infer_expr_type(operand)
                    .pointee()
                    .cloned()
                    .unwrap_or(Type::I32),
                _ => self.infer_expr_type(operand),
            },
            ExprKind::Binary { op, left, right } => {
                if op.is_comparison() {
                    return Type::I32;
                }
                let lt = self.infer_expr_type(left);
                let rt = self.infer_expr_type(right);
                if lt.is_float() || rt.is_float() {
                    Type::F64
                } else {
                    lt
                }
            },
            ExprKind::Field { object, field } => {
                let obj_ty = self.infer_expr_type(object);
                self.resolve_struct(&obj_ty)
                    .and_then(|(_, def)| {
                        def.field_index(field).map(|i| def.fields[i].1.clone())
                    })
                    .unwrap_or(Type::I32)
            },
            ExprKind::Index { object, .. } => {
                let obj_ty = self.infer_expr_type(object);
                match obj_ty {
                    Type::Array { elem, .. } => *elem,
                    Type::Ptr(base) => *base,
                    _ => Type::I32,
                }
            },
            ExprKind::Ternary { then_expr, .. } => self.infer_expr_type(then_expr),
            ExprKind::Sizeof(_) => Type::I64,
            ExprKind::StructInit { ty, .. } => Type::ptr(ty.clone()),
            ExprKind::Comptime(_) => Type::I64,
        }
    }
}
