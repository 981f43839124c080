//! Code generator core: symbol and struct tables, declaration passes,
//! statement lowering, and module finalization.

use std::path::PathBuf;

use glyphc_ast::{Decl, EnumDecl, ExtDecl, FnDecl, Program, StDecl, Stmt, StmtKind, Type};
use indexmap::IndexMap;
use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::passes::PassBuilderOptions;
use inkwell::targets::{
    CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetData, TargetMachine,
    TargetTriple,
};
use inkwell::types::{BasicType, BasicTypeEnum, StructType};
use inkwell::values::{BasicValueEnum, FunctionValue, IntValue, PointerValue};
use inkwell::{FloatPredicate, GlobalVisibility, IntPredicate, OptimizationLevel};

use crate::error::{CodeGenError, Result};

/// Compilation target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TargetKind {
    #[default]
    Native,
    Wasm32,
}

/// Options for one object emission.
#[derive(Clone, Debug)]
pub struct CodegenOptions {
    pub module_name: String,
    pub obj_path: PathBuf,
    /// 0-3; levels above 3 clamp to 3.
    pub opt_level: u8,
    pub target: TargetKind,
    /// Dump the verified module IR to stderr.
    pub emit_ir: bool,
}

/// One symbol table entry. Variables hold their stack (or global) address
/// so loads and stores can be emitted at use sites; functions hold the
/// function value directly.
pub(crate) struct Symbol<'ctx> {
    pub name: String,
    pub ty: Type,
    pub kind: SymbolKind<'ctx>,
}

pub(crate) enum SymbolKind<'ctx> {
    Var(PointerValue<'ctx>),
    Func(FunctionValue<'ctx>),
}

/// A registered named struct: ordered fields plus the LLVM named type.
pub(crate) struct StructDef<'ctx> {
    pub fields: Vec<(String, Type)>,
    pub llvm_type: StructType<'ctx>,
}

impl<'ctx> StructDef<'ctx> {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(f, _)| f == name)
    }
}

pub struct CodeGen<'ctx, 'ast> {
    pub(crate) context: &'ctx Context,
    pub module: Module<'ctx>,
    pub(crate) builder: Builder<'ctx>,
    pub(crate) target_data: TargetData,

    /// Scope stack: lookup scans from the end, scopes restore a saved
    /// length on function exit.
    pub(crate) syms: Vec<Symbol<'ctx>>,
    pub(crate) structs: IndexMap<String, StructDef<'ctx>>,

    pub(crate) cur_fn: Option<FunctionValue<'ctx>>,
    cur_ret: Type,

    /// Innermost loop targets: continue and break.
    loop_cond: Option<BasicBlock<'ctx>>,
    loop_end: Option<BasicBlock<'ctx>>,

    /// Deferred statements for the current function, in push order.
    defers: Vec<&'ast Stmt>,
    /// Set while replaying defers at an exit so a deferred `ret` does not
    /// replay them again.
    emitting_defers: bool,
}

impl<'ctx, 'ast> CodeGen<'ctx, 'ast> {
    pub fn new(context: &'ctx Context, module_name: &str, target_data: TargetData) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();
        Self {
            context,
            module,
            builder,
            target_data,
            syms: Vec::new(),
            structs: IndexMap::new(),
            cur_fn: None,
            cur_ret: Type::Void,
            loop_cond: None,
            loop_end: None,
            defers: Vec::new(),
            emitting_defers: false,
        }
    }

    // ---- symbol table ----

    pub(crate) fn sym_push(&mut self, name: impl Into<String>, ty: Type, kind: SymbolKind<'ctx>) {
        self.syms.push(Symbol {
            name: name.into(),
            ty,
            kind,
        });
    }

    pub(crate) fn sym_lookup(&self, name: &str) -> Option<&Symbol<'ctx>> {
        self.syms.iter().rev().find(|s| s.name == name)
    }

    /// Resolve a struct table entry from a struct or pointer-to-struct type.
    pub(crate) fn resolve_struct(&self, ty: &Type) -> Option<(&str, &StructDef<'ctx>)> {
        let name = match ty {
            Type::Struct(name) => name,
            Type::Ptr(base) => match base.as_ref() {
                Type::Struct(name) => name,
                _ => return None,
            },
            _ => return None,
        };
        self.structs
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
    }

    // ---- common helpers ----

    pub(crate) fn block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|b| b.get_terminator())
            .is_some()
    }

    pub(crate) fn current_fn(&self) -> FunctionValue<'ctx> {
        self.cur_fn.expect("codegen outside of a function body")
    }

    /// Truthiness: integer and pointer values compare against zero, floats
    /// against 0.0; an i1 passes through.
    pub(crate) fn to_bool(&self, val: BasicValueEnum<'ctx>) -> Result<IntValue<'ctx>> {
        match val {
            BasicValueEnum::IntValue(iv) => {
                if iv.get_type().get_bit_width() == 1 {
                    return Ok(iv);
                }
                let zero = iv.get_type().const_zero();
                Ok(self
                    .builder
                    .build_int_compare(IntPredicate::NE, iv, zero, "tobool")?)
            },
            BasicValueEnum::FloatValue(fv) => {
                let zero = fv.get_type().const_zero();
                Ok(self
                    .builder
                    .build_float_compare(FloatPredicate::ONE, fv, zero, "tobool")?)
            },
            BasicValueEnum::PointerValue(pv) => Ok(self.builder.build_is_not_null(pv, "tobool")?),
            other => Err(CodeGenError::Unsupported(format!(
                "condition of type {:?}",
                other.get_type()
            ))),
        }
    }

    /// Implicit conversion toward a target LLVM type: integer widen
    /// (zero-extend) or narrow, signed int<->float, float width casts,
    /// int<->pointer. Pointers are opaque so pointer-to-pointer is the
    /// identity.
    pub(crate) fn coerce(
        &self,
        val: BasicValueEnum<'ctx>,
        target: BasicTypeEnum<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>> {
        if val.get_type() == target {
            return Ok(val);
        }
        let out = match (val, target) {
            (BasicValueEnum::IntValue(iv), BasicTypeEnum::IntType(it)) => {
                let sw = iv.get_type().get_bit_width();
                let tw = it.get_bit_width();
                if tw > sw {
                    self.builder.build_int_z_extend(iv, it, "widen")?.into()
                } else if tw < sw {
                    self.builder.build_int_truncate(iv, it, "narrow")?.into()
                } else {
                    iv.into()
                }
            },
            (BasicValueEnum::IntValue(iv), BasicTypeEnum::FloatType(ft)) => self
                .builder
                .build_signed_int_to_float(iv, ft, "i2f")?
                .into(),
            (BasicValueEnum::FloatValue(fv), BasicTypeEnum::IntType(it)) => self
                .builder
                .build_float_to_signed_int(fv, it, "f2i")?
                .into(),
            (BasicValueEnum::FloatValue(fv), BasicTypeEnum::FloatType(ft)) => {
                self.builder.build_float_cast(fv, ft, "fcast")?.into()
            },
            (BasicValueEnum::PointerValue(pv), BasicTypeEnum::PointerType(_)) => pv.into(),
            (BasicValueEnum::IntValue(iv), BasicTypeEnum::PointerType(pt)) => {
                self.builder.build_int_to_ptr(iv, pt, "i2p")?.into()
            },
            (BasicValueEnum::PointerValue(pv), BasicTypeEnum::IntType(it)) => {
                self.builder.build_ptr_to_int(pv, it, "p2i")?.into()
            },
            (other, _) => other,
        };
        Ok(out)
    }

    // ---- declaration passes ----

    /// Lower a whole program. Pass order: structs register their layouts
    /// first, then enum members become constants, then externs and
    /// function bodies in source order.
    pub fn compile_program(&mut self, program: &'ast Program) -> Result<()> {
        for decl in &program.decls {
            if let Decl::St(st) = decl {
                self.cg_st_decl(st)?;
            }
        }
        for decl in &program.decls {
            if let Decl::Enum(en) = decl {
                self.cg_enum_decl(en)?;
            }
        }
        for decl in &program.decls {
            match decl {
                Decl::St(_) | Decl::Enum(_) => {},
                Decl::Ext(ext) => self.cg_ext_decl(ext)?,
                Decl::Fn(func) => self.cg_fn_decl(func)?,
            }
        }
        Ok(())
    }

    fn cg_st_decl(&mut self, st: &StDecl) -> Result<()> {
        // duplicate declarations (prelude loaded twice) are ignored
        if self.structs.contains_key(&st.name) {
            return Ok(());
        }

        let llvm_type = self.context.opaque_struct_type(&st.name);
        // register the name before computing field types so pointer fields
        // may refer to the struct itself
        self.structs.insert(
            st.name.clone(),
            StructDef {
                fields: st.fields.iter().map(|f| (f.name.clone(), f.ty.clone())).collect(),
                llvm_type,
            },
        );

        let field_types = st
            .fields
            .iter()
            .map(|f| self.llvm_type(&f.ty))
            .collect::<Result<Vec<_>>>()?;
        llvm_type.set_body(&field_types, false);
        Ok(())
    }

    /// Enum members become private constant `i32` globals, consecutive
    /// from 0 unless a member sets an explicit value.
    fn cg_enum_decl(&mut self, en: &EnumDecl) -> Result<()> {
        let i32_type = self.context.i32_type();
        for (name, value) in &en.members {
            if self.sym_lookup(name).is_some() {
                continue;
            }
            let global = self.module.add_global(i32_type, None, name);
            global.set_initializer(&i32_type.const_int(*value as u64, true));
            global.set_constant(true);
            global.set_linkage(Linkage::Private);
            self.sym_push(
                name.clone(),
                Type::I32,
                SymbolKind::Var(global.as_pointer_value()),
            );
        }
        Ok(())
    }

    fn cg_ext_decl(&mut self, ext: &ExtDecl) -> Result<()> {
        // duplicate extern declarations are ignored
        if self.sym_lookup(&ext.name).is_some() {
            return Ok(());
        }
        let param_types: Vec<Type> = ext.params.iter().map(|p| p.ty.clone()).collect();
        let fn_type = self.llvm_fn_type(&ext.ret, &param_types, ext.variadic)?;
        let func = self.module.add_function(&ext.name, fn_type, None);
        self.sym_push(
            ext.name.clone(),
            Type::function(ext.ret.clone(), param_types, ext.variadic),
            SymbolKind::Func(func),
        );
        Ok(())
    }

    fn cg_fn_decl(&mut self, decl: &'ast FnDecl) -> Result<()> {
        let param_types: Vec<Type> = decl.params.iter().map(|p| p.ty.clone()).collect();
        let fn_type = self.llvm_fn_type(&decl.ret, &param_types, false)?;
        let func = self.module.add_function(&decl.name, fn_type, None);
        self.sym_push(
            decl.name.clone(),
            Type::function(decl.ret.clone(), param_types, false),
            SymbolKind::Func(func),
        );

        let prev_fn = self.cur_fn.replace(func);
        let prev_ret = std::mem::replace(&mut self.cur_ret, decl.ret.clone());
        let scope = self.syms.len();
        let prev_defers = std::mem::take(&mut self.defers);

        let entry = self.context.append_basic_block(func, "entry");
        self.builder.position_at_end(entry);

        for (i, param) in decl.params.iter().enumerate() {
            let value = func
                .get_nth_param(i as u32)
                .ok_or_else(|| CodeGenError::Llvm(format!("missing parameter {}", i)))?;
            let llty = self.llvm_type(&param.ty)?;
            let slot = self.builder.build_alloca(llty, &param.name)?;
            self.builder.build_store(slot, value)?;
            self.sym_push(param.name.clone(), param.ty.clone(), SymbolKind::Var(slot));
        }

        self.cg_block(&decl.body)?;

        // implicit fall-through: run defers, then default-return
        if !self.block_terminated() {
            self.emit_defers()?;
            if !self.block_terminated() {
                match &decl.ret {
                    Type::Void => {
                        self.builder.build_return(None)?;
                    },
                    ty if ty.is_float() => {
                        let BasicTypeEnum::FloatType(ft) = self.llvm_type(ty)? else {
                            unreachable!();
                        };
                        self.builder.build_return(Some(&ft.const_zero()))?;
                    },
                    ty if ty.is_ptr() => {
                        let llty = self.llvm_type(ty)?.into_pointer_type();
                        self.builder.build_return(Some(&llty.const_null()))?;
                    },
                    ty => {
                        let llty = self.llvm_type(ty)?;
                        self.builder.build_return(Some(&llty.const_zero()))?;
                    },
                }
            }
        }

        self.cur_fn = prev_fn;
        self.cur_ret = prev_ret;
        self.syms.truncate(scope);
        self.defers = prev_defers;
        Ok(())
    }

    // ---- statements ----

    pub(crate) fn cg_block(&mut self, stmts: &'ast [Stmt]) -> Result<()> {
        for stmt in stmts {
            self.cg_stmt(stmt)?;
            if self.block_terminated() {
                break;
            }
        }
        Ok(())
    }

    /// Replay deferred statements in reverse push order. A deferred
    /// statement may itself terminate the block (e.g. a `ret`), which makes
    /// the pending return dead; remaining defers are skipped the same way a
    /// statement after `ret` would be.
    fn emit_defers(&mut self) -> Result<()> {
        if self.emitting_defers {
            return Ok(());
        }
        self.emitting_defers = true;
        let defers = self.defers.clone();
        for stmt in defers.iter().rev() {
            if self.block_terminated() {
                break;
            }
            let res = self.cg_stmt(stmt);
            if res.is_err() {
                self.emitting_defers = false;
                return res;
            }
        }
        self.emitting_defers = false;
        Ok(())
    }

    pub(crate) fn cg_stmt(&mut self, stmt: &'ast Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Block(stmts) => self.cg_block(stmts),

            StmtKind::Ret(value) => {
                let retval = match value {
                    Some(expr) if !self.cur_ret.is_void() => {
                        let (val, _) = self.cg_expr_value(expr)?;
                        let target = self.llvm_type(&self.cur_ret.clone())?;
                        Some(self.coerce(val, target)?)
                    },
                    Some(expr) => {
                        // value returned from a void function: evaluate for
                        // side effects only
                        self.cg_expr(expr)?;
                        None
                    },
                    None => None,
                };
                self.emit_defers()?;
                if !self.block_terminated() {
                    match retval {
                        Some(v) => self.builder.build_return(Some(&v))?,
                        None => self.builder.build_return(None)?,
                    };
                }
                Ok(())
            },

            StmtKind::Expr(expr) => {
                self.cg_expr(expr)?;
                Ok(())
            },

            StmtKind::Decl { name, ty, init } => {
                let ty = match ty {
                    Some(t) => t.clone(),
                    None => match init {
                        Some(e) => self.infer_expr_type(e),
                        None => return Err(CodeGenError::CannotInfer(name.clone())),
                    },
                };
                let llty = self.llvm_type(&ty)?;
                let slot = self.builder.build_alloca(llty, name)?;
                if let Some(e) = init {
                    let (val, _) = self.cg_expr_value(e)?;
                    let val = self.coerce(val, llty)?;
                    self.builder.build_store(slot, val)?;
                }
                self.sym_push(name.clone(), ty, SymbolKind::Var(slot));
                Ok(())
            },

            StmtKind::Assign { target, value } => {
                let (val, _) = self.cg_expr_value(value)?;
                let (ptr, target_ty) = self.cg_lvalue(target)?;
                let llty = self.llvm_type(&target_ty)?;
                let val = self.coerce(val, llty)?;
                self.builder.build_store(ptr, val)?;
                Ok(())
            },

            StmtKind::If {
                cond,
                then_blk,
                else_blk,
            } => {
                let (cond_val, _) = self.cg_expr_value(cond)?;
                let cond_bool = self.to_bool(cond_val)?;

                let func = self.current_fn();
                let then_bb = self.context.append_basic_block(func, "then");
                let else_bb = self.context.append_basic_block(func, "else");
                let merge_bb = self.context.append_basic_block(func, "merge");

                let false_target = if else_blk.is_some() { else_bb } else { merge_bb };
                self.builder
                    .build_conditional_branch(cond_bool, then_bb, false_target)?;

                self.builder.position_at_end(then_bb);
                self.cg_block(then_blk)?;
                if !self.block_terminated() {
                    self.builder.build_unconditional_branch(merge_bb)?;
                }

                self.builder.position_at_end(else_bb);
                if let Some(else_blk) = else_blk {
                    self.cg_block(else_blk)?;
                }
                if !self.block_terminated() {
                    self.builder.build_unconditional_branch(merge_bb)?;
                }

                self.builder.position_at_end(merge_bb);
                Ok(())
            },

            StmtKind::While { cond, body } => {
                let func = self.current_fn();
                let cond_bb = self.context.append_basic_block(func, "wh.cond");
                let body_bb = self.context.append_basic_block(func, "wh.body");
                let end_bb = self.context.append_basic_block(func, "wh.end");

                let prev_cond = self.loop_cond.replace(cond_bb);
                let prev_end = self.loop_end.replace(end_bb);

                self.builder.build_unconditional_branch(cond_bb)?;
                self.builder.position_at_end(cond_bb);
                let (cond_val, _) = self.cg_expr_value(cond)?;
                let cond_bool = self.to_bool(cond_val)?;
                self.builder
                    .build_conditional_branch(cond_bool, body_bb, end_bb)?;

                self.builder.position_at_end(body_bb);
                self.cg_block(body)?;
                if !self.block_terminated() {
                    self.builder.build_unconditional_branch(cond_bb)?;
                }

                self.loop_cond = prev_cond;
                self.loop_end = prev_end;
                self.builder.position_at_end(end_bb);
                Ok(())
            },

            StmtKind::Break => {
                let target = self.loop_end.ok_or(CodeGenError::BreakOutsideLoop)?;
                self.builder.build_unconditional_branch(target)?;
                Ok(())
            },

            StmtKind::Continue => {
                let target = self.loop_cond.ok_or(CodeGenError::ContinueOutsideLoop)?;
                self.builder.build_unconditional_branch(target)?;
                Ok(())
            },

            StmtKind::For {
                init,
                cond,
                incr,
                body,
            } => {
                self.cg_stmt(init)?;

                let func = self.current_fn();
                let cond_bb = self.context.append_basic_block(func, "for.cond");
                let body_bb = self.context.append_basic_block(func, "for.body");
                let incr_bb = self.context.append_basic_block(func, "for.incr");
                let end_bb = self.context.append_basic_block(func, "for.end");

                // continue jumps to the increment, not the condition
                let prev_cond = self.loop_cond.replace(incr_bb);
                let prev_end = self.loop_end.replace(end_bb);

                self.builder.build_unconditional_branch(cond_bb)?;
                self.builder.position_at_end(cond_bb);
                let (cond_val, _) = self.cg_expr_value(cond)?;
                let cond_bool = self.to_bool(cond_val)?;
                self.builder
                    .build_conditional_branch(cond_bool, body_bb, end_bb)?;

                self.builder.position_at_end(body_bb);
                self.cg_block(body)?;
                if !self.block_terminated() {
                    self.builder.build_unconditional_branch(incr_bb)?;
                }

                self.builder.position_at_end(incr_bb);
                self.cg_stmt(incr)?;
                self.builder.build_unconditional_branch(cond_bb)?;

                self.loop_cond = prev_cond;
                self.loop_end = prev_end;
                self.builder.position_at_end(end_bb);
                Ok(())
            },

            StmtKind::Match {
                scrutinee,
                case_vals,
                case_bodies,
            } => {
                let (mval, _) = self.cg_expr_value(scrutinee)?;
                let func = self.current_fn();
                let end_bb = self.context.append_basic_block(func, "ma.end");

                for (val, body) in case_vals.iter().zip(case_bodies) {
                    match val {
                        None => {
                            // default arm catches everything; later arms
                            // are dead
                            self.cg_block(body)?;
                            if !self.block_terminated() {
                                self.builder.build_unconditional_branch(end_bb)?;
                            }
                            break;
                        },
                        Some(case) => {
                            let (cv, _) = self.cg_expr_value(case)?;
                            let cv = self.coerce(cv, mval.get_type())?;
                            let eq = match mval {
                                BasicValueEnum::FloatValue(mf) => {
                                    self.builder.build_float_compare(
                                        FloatPredicate::OEQ,
                                        mf,
                                        cv.into_float_value(),
                                        "ma.eq",
                                    )?
                                },
                                BasicValueEnum::IntValue(mi) => self.builder.build_int_compare(
                                    IntPredicate::EQ,
                                    mi,
                                    cv.into_int_value(),
                                    "ma.eq",
                                )?,
                                other => {
                                    return Err(CodeGenError::Unsupported(format!(
                                        "match over {:?}",
                                        other.get_type()
                                    )));
                                },
                            };
                            let then_bb = self.context.append_basic_block(func, "ma.then");
                            let next_bb = self.context.append_basic_block(func, "ma.next");
                            self.builder.build_conditional_branch(eq, then_bb, next_bb)?;
                            self.builder.position_at_end(then_bb);
                            self.cg_block(body)?;
                            if !self.block_terminated() {
                                self.builder.build_unconditional_branch(end_bb)?;
                            }
                            self.builder.position_at_end(next_bb);
                        },
                    }
                }

                if !self.block_terminated() {
                    self.builder.build_unconditional_branch(end_bb)?;
                }
                self.builder.position_at_end(end_bb);
                Ok(())
            },

            StmtKind::Defer(body) => {
                self.defers.push(body);
                Ok(())
            },

            StmtKind::Asm(asm) => self.cg_asm(asm),
        }
    }
}

/// Lower a program to an object file for the requested target.
pub fn emit_object(program: &Program, opts: &CodegenOptions) -> Result<()> {
    let triple = match opts.target {
        TargetKind::Native => {
            Target::initialize_native(&InitializationConfig::default())
                .map_err(CodeGenError::Target)?;
            TargetMachine::get_default_triple()
        },
        TargetKind::Wasm32 => {
            Target::initialize_webassembly(&InitializationConfig::default());
            TargetTriple::create("wasm32-unknown-unknown")
        },
    };

    let target =
        Target::from_triple(&triple).map_err(|e| CodeGenError::Target(e.to_string()))?;
    let opt = match opts.opt_level {
        0 => OptimizationLevel::None,
        1 => OptimizationLevel::Less,
        2 => OptimizationLevel::Default,
        _ => OptimizationLevel::Aggressive,
    };
    let machine = target
        .create_target_machine(&triple, "generic", "", opt, RelocMode::PIC, CodeModel::Default)
        .ok_or_else(|| CodeGenError::Target("cannot create target machine".to_string()))?;

    let context = Context::create();
    let mut cg = CodeGen::new(&context, &opts.module_name, machine.get_target_data());
    cg.module.set_triple(&triple);
    cg.module
        .set_data_layout(&machine.get_target_data().get_data_layout());

    cg.compile_program(program)?;

    // wasm exports every user-defined function so the linker keeps them
    if opts.target == TargetKind::Wasm32 {
        for decl in &program.decls {
            if let Decl::Fn(f) = decl {
                if let Some(func) = cg.module.get_function(&f.name) {
                    func.set_linkage(Linkage::External);
                    func.as_global_value()
                        .set_visibility(GlobalVisibility::Default);
                }
            }
        }
    }

    // verify before any optimization; on failure the unverified IR goes to
    // stderr so the bad module can be inspected
    if let Err(message) = cg.module.verify() {
        eprintln!("--- IR ---\n{}", cg.module.print_to_string().to_string());
        return Err(CodeGenError::Verify(message.to_string()));
    }

    if opts.emit_ir {
        eprintln!("{}", cg.module.print_to_string().to_string());
    }

    if opts.opt_level > 0 {
        let passes = format!("default<O{}>", opts.opt_level.min(3));
        cg.module
            .run_passes(&passes, &machine, PassBuilderOptions::create())
            .map_err(|e| CodeGenError::Llvm(format!("pass error: {}", e)))?;
    }

    machine
        .write_to_file(&cg.module, FileType::Object, &opts.obj_path)
        .map_err(|e| CodeGenError::Emit(e.to_string()))?;

    Ok(())
}
