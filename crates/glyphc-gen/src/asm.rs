//! Inline assembly lowering.
//!
//! `asm("template" : outputs : inputs : clobbers)` becomes an inline-asm
//! call. Constraints concatenate as `outputs,inputs,~{clobber}`; with no
//! outputs the asm type is void, with one it is the lvalue's type, with
//! several it is an anonymous struct whose elements store back to their
//! lvalues. All asm is volatile with side effects, AT&T dialect.

use glyphc_ast::InlineAsm;
use inkwell::types::{BasicMetadataTypeEnum, BasicType};
use inkwell::values::BasicMetadataValueEnum;
use inkwell::InlineAsmDialect;

use crate::error::{CodeGenError, Result};
use crate::llvm::CodeGen;

impl<'ctx, 'ast> CodeGen<'ctx, 'ast> {
    pub(crate) fn cg_asm(&mut self, asm: &'ast InlineAsm) -> Result<()> {
        let mut constraints = String::new();
        for (c, _) in &asm.outputs {
            if !constraints.is_empty() {
                constraints.push(',');
            }
            constraints.push_str(c);
        }
        for (c, _) in &asm.inputs {
            if !constraints.is_empty() {
                constraints.push(',');
            }
            constraints.push_str(c);
        }
        for c in &asm.clobbers {
            if !constraints.is_empty() {
                constraints.push(',');
            }
            constraints.push_str(&format!("~{{{}}}", c));
        }

        let mut in_vals: Vec<BasicMetadataValueEnum> = Vec::with_capacity(asm.inputs.len());
        let mut in_types: Vec<BasicMetadataTypeEnum> = Vec::with_capacity(asm.inputs.len());
        for (_, expr) in &asm.inputs {
            let (val, _) = self.cg_expr_value(expr)?;
            in_types.push(val.get_type().into());
            in_vals.push(val.into());
        }

        let fn_ty = match asm.outputs.len() {
            0 => self.context.void_type().fn_type(&in_types, false),
            1 => {
                let out_ty = self.infer_expr_type(&asm.outputs[0].1);
                self.llvm_type(&out_ty)?.fn_type(&in_types, false)
            },
            _ => {
                let member_types = asm
                    .outputs
                    .iter()
                    .map(|(_, e)| self.llvm_type(&self.infer_expr_type(e)))
                    .collect::<Result<Vec<_>>>()?;
                self.context
                    .struct_type(&member_types, false)
                    .fn_type(&in_types, false)
            },
        };

        let asm_ptr = self.context.create_inline_asm(
            fn_ty,
            asm.template.clone(),
            constraints,
            true,
            false,
            Some(InlineAsmDialect::ATT),
            false,
        );

        let call = self
            .builder
            .build_indirect_call(fn_ty, asm_ptr, &in_vals, "")?;

        match asm.outputs.len() {
            0 => {},
            1 => {
                let result = call
                    .try_as_basic_value()
                    .left()
                    .ok_or(CodeGenError::VoidValue)?;
                let (ptr, _) = self.cg_lvalue(&asm.outputs[0].1)?;
                self.builder.build_store(ptr, result)?;
            },
            n => {
                let result = call
                    .try_as_basic_value()
                    .left()
                    .ok_or(CodeGenError::VoidValue)?
                    .into_struct_value();
                for i in 0..n {
                    let elem = self.builder.build_extract_value(result, i as u32, "")?;
                    let (ptr, _) = self.cg_lvalue(&asm.outputs[i].1)?;
                    self.builder.build_store(ptr, elem)?;
                }
            },
        }

        Ok(())
    }
}
