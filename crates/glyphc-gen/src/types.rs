//! Glyph type to LLVM type mapping.
//!
//! Lives on `CodeGen` because named struct types resolve against the
//! struct table. Pointers are opaque; the pointee type is carried on the
//! Glyph side and named explicitly at every load, store, and GEP.

use glyphc_ast::Type;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType};

use crate::error::{CodeGenError, Result};
use crate::llvm::CodeGen;

impl<'ctx, 'ast> CodeGen<'ctx, 'ast> {
    /// Map a Glyph value type to an LLVM basic type.
    pub(crate) fn llvm_type(&self, ty: &Type) -> Result<BasicTypeEnum<'ctx>> {
        let llty = match ty {
            Type::I8 | Type::U8 => self.context.i8_type().into(),
            Type::I16 | Type::U16 => self.context.i16_type().into(),
            Type::I32 | Type::U32 => self.context.i32_type().into(),
            Type::I64 | Type::U64 => self.context.i64_type().into(),
            Type::F32 => self.context.f32_type().into(),
            Type::F64 => self.context.f64_type().into(),
            Type::Ptr(_) => self
                .context
                .ptr_type(inkwell::AddressSpace::default())
                .into(),
            Type::Array { len, elem } => {
                let elem_ty = self.llvm_type(elem)?;
                elem_ty.array_type(*len).into()
            },
            Type::Struct(name) => {
                let def = self
                    .structs
                    .get(name)
                    .ok_or_else(|| CodeGenError::UndefinedStruct(name.clone()))?;
                def.llvm_type.into()
            },
            Type::Void | Type::Fn { .. } => {
                return Err(CodeGenError::Unsupported(format!(
                    "type {:?} in value position",
                    ty
                )));
            },
        };
        Ok(llty)
    }

    /// Build an LLVM function type from a Glyph signature.
    pub(crate) fn llvm_fn_type(
        &self,
        ret: &Type,
        params: &[Type],
        variadic: bool,
    ) -> Result<FunctionType<'ctx>> {
        let param_types = params
            .iter()
            .map(|p| self.llvm_type(p).map(BasicMetadataTypeEnum::from))
            .collect::<Result<Vec<_>>>()?;
        if ret.is_void() {
            Ok(self.context.void_type().fn_type(&param_types, variadic))
        } else {
            Ok(self.llvm_type(ret)?.fn_type(&param_types, variadic))
        }
    }

    /// Target layout size of a type, in bytes.
    pub(crate) fn abi_size(&self, ty: &Type) -> Result<u64> {
        let llty = self.llvm_type(ty)?;
        Ok(self.target_data.get_abi_size(&llty))
    }
}
