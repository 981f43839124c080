//! Error types for LLVM code generation.

use thiserror::Error;

/// Error type for code generation. Every variant is terminal: the driver
/// prints one diagnostic and exits.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// Name not found in the symbol table.
    #[error("undefined '{0}'")]
    Undefined(String),

    /// Call target not found.
    #[error("undefined function '{0}'")]
    UndefinedFunction(String),

    /// Named struct never declared.
    #[error("undefined struct '{0}'")]
    UndefinedStruct(String),

    /// Field access on a struct that has no such field.
    #[error("struct '{strct}' has no field '{field}'")]
    FieldNotFound { strct: String, field: String },

    /// Call through a name that is not a function.
    #[error("'{0}' is not a function")]
    NotAFunction(String),

    /// Assignment target or address-of operand has no address.
    #[error("expression is not an lvalue")]
    NotAnLvalue,

    /// Declaration with neither a type nor an inferable initializer.
    #[error("cannot infer type for '{0}'")]
    CannotInfer(String),

    /// A void call used where a value is required.
    #[error("void value used in expression")]
    VoidValue,

    #[error("'brk' outside of loop")]
    BreakOutsideLoop,

    #[error("'cont' outside of loop")]
    ContinueOutsideLoop,

    /// Operation not defined for the operand types.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Expression outside the compile-time-foldable subset.
    #[error("cannot evaluate expression at compile time")]
    ComptimeUnfoldable,

    /// LLVM builder operation failed.
    #[error("LLVM operation failed: {0}")]
    Llvm(String),

    /// Module rejected by the verifier. The IR has already been dumped to
    /// stderr by the time this propagates.
    #[error("LLVM verify error:\n{0}")]
    Verify(String),

    /// Target or target machine construction failed.
    #[error("target error: {0}")]
    Target(String),

    /// Object file emission failed.
    #[error("emit error: {0}")]
    Emit(String),

    /// External linker invocation failed.
    #[error("linking failed: {0}")]
    Link(String),
}

impl From<inkwell::builder::BuilderError> for CodeGenError {
    fn from(e: inkwell::builder::BuilderError) -> Self {
        CodeGenError::Llvm(e.to_string())
    }
}

/// Result type alias for code generation operations.
pub type Result<T> = std::result::Result<T, CodeGenError>;
