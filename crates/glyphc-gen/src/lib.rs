//! glyphc-gen - LLVM IR lowering and object emission for Glyph.
//!
//! Operates on a complete program AST. Top-level declarations are visited
//! in three passes (structs, enums, functions) so that any later reference
//! resolves; expressions lower to IR values with their resolved type
//! returned alongside. The finished module is verified, optionally
//! optimized with the default pass pipeline, and written as an object file
//! for the native target or wasm32.

mod asm;
mod comptime;
pub mod error;
pub mod linker;
mod llvm;

mod expr;
mod types;

pub use error::{CodeGenError, Result};
pub use linker::Linker;
pub use llvm::{emit_object, CodeGen, CodegenOptions, TargetKind};
