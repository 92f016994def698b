use std::fmt::Display;

use thiserror::Error;

use crate::Position;

/// Which part of the pipeline produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    /// Static violation found by the checker; evaluation is refused.
    Check,
    /// Reported by the checker but does not block evaluation.
    Warning,
    /// Raised while evaluating; aborts the program.
    Runtime,
}

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    /// Attaches a position to an error raised somewhere that had none.
    pub fn or_at(mut self, position: &Position) -> Self {
        if self.position.is_null() {
            self.position = position.clone();
        }
        self
    }

    pub fn phase(&self) -> ErrorPhase {
        match &self.internal_error {
            ErrorImpl::RedundantCast { .. } => ErrorPhase::Warning,
            ErrorImpl::UndefinedSymbol { .. }
            | ErrorImpl::Redefinition { .. }
            | ErrorImpl::SelfReferentialInit { .. }
            | ErrorImpl::TypeMismatch { .. }
            | ErrorImpl::UnsupportedOperation { .. }
            | ErrorImpl::ArityMismatch { .. }
            | ErrorImpl::IllegalBreakOrContinue { .. }
            | ErrorImpl::IllegalReturn { .. }
            | ErrorImpl::MissingReturn { .. }
            | ErrorImpl::InvalidCast { .. }
            | ErrorImpl::MalformedFormatString { .. }
            | ErrorImpl::IndexTypeError { .. }
            | ErrorImpl::AssignToConstant { .. } => ErrorPhase::Check,
            _ => ErrorPhase::Runtime,
        }
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UndefinedSymbol { .. } => "UndefinedSymbol",
            ErrorImpl::Redefinition { .. } => "Redefinition",
            ErrorImpl::SelfReferentialInit { .. } => "SelfReferentialInit",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::UnsupportedOperation { .. } => "UnsupportedOperation",
            ErrorImpl::ArityMismatch { .. } => "ArityMismatch",
            ErrorImpl::IllegalBreakOrContinue { .. } => "IllegalBreakOrContinue",
            ErrorImpl::IllegalReturn { .. } => "IllegalReturn",
            ErrorImpl::MissingReturn { .. } => "MissingReturn",
            ErrorImpl::InvalidCast { .. } => "InvalidCast",
            ErrorImpl::MalformedFormatString { .. } => "MalformedFormatString",
            ErrorImpl::IndexTypeError { .. } => "IndexTypeError",
            ErrorImpl::AssignToConstant { .. } => "AssignToConstant",
            ErrorImpl::RedundantCast { .. } => "RedundantCast",
            ErrorImpl::UndefinedProperty { .. } => "UndefinedProperty",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::NotAnInstance { .. } => "NotAnInstance",
            ErrorImpl::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            ErrorImpl::CallArityMismatch { .. } => "CallArityMismatch",
            ErrorImpl::BuiltinCallFailure { .. } => "BuiltinCallFailure",
            ErrorImpl::DivisionByZero => "DivisionByZero",
            ErrorImpl::UninitializedVariable { .. } => "UninitializedVariable",
            ErrorImpl::StackExhausted { .. } => "StackExhausted",
            ErrorImpl::AllocationFailure { .. } => "AllocationFailure",
            ErrorImpl::MissingEntryPoint { .. } => "MissingEntryPoint",
            ErrorImpl::ScopeUnderflow => "ScopeUnderflow",
            ErrorImpl::InternalError { .. } => "InternalError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UndefinedSymbol { symbol } => {
                ErrorTip::Suggestion(format!("`{}` must be declared before it is used", symbol))
            }
            ErrorImpl::Redefinition { symbol } => ErrorTip::Suggestion(format!(
                "`{}` is already declared in this scope, pick another name",
                symbol
            )),
            ErrorImpl::SelfReferentialInit { symbol } => ErrorTip::Suggestion(format!(
                "`{}` cannot be used in its own initializer",
                symbol
            )),
            ErrorImpl::TypeMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::ArityMismatch { expected, received, .. }
            | ErrorImpl::CallArityMismatch { expected, received, .. } => ErrorTip::Suggestion(
                format!("Expected {} arguments, received {}", expected, received),
            ),
            ErrorImpl::IllegalBreakOrContinue { .. } => {
                ErrorTip::Suggestion(String::from("Only valid inside a `while` or `for` body"))
            }
            ErrorImpl::MissingReturn { .. } => ErrorTip::Suggestion(String::from(
                "Every path through a non-void function must end in a `return`",
            )),
            ErrorImpl::InvalidCast { .. } => ErrorTip::Suggestion(String::from(
                "Casts are only defined between `int`, `float`, `bool` and `string`",
            )),
            ErrorImpl::MalformedFormatString { .. } => ErrorTip::Suggestion(String::from(
                "Use `%d` for int, `%f` for float and `%s` for string arguments",
            )),
            ErrorImpl::IndexTypeError { .. } => {
                ErrorTip::Suggestion(String::from("Array indexes must be of type `int`"))
            }
            ErrorImpl::RedundantCast { ty } => ErrorTip::Suggestion(format!(
                "The expression already has type `{}`, the cast can be removed",
                ty
            )),
            ErrorImpl::IndexOutOfBounds { length, .. } => ErrorTip::Suggestion(format!(
                "Valid indexes are 0 to {}",
                length.saturating_sub(1)
            )),
            ErrorImpl::StackExhausted { .. } => ErrorTip::Suggestion(String::from(
                "Check for recursion without a base case",
            )),
            _ => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.position.is_null() {
            write!(f, "{}: {}", self.get_error_name(), self.internal_error)
        } else {
            write!(
                f,
                "{}: {} (line {})",
                self.get_error_name(),
                self.internal_error,
                self.position.0
            )
        }
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    // Check-time
    #[error("{symbol:?} is not defined")]
    UndefinedSymbol { symbol: String },
    #[error("{symbol:?} is already defined in this scope")]
    Redefinition { symbol: String },
    #[error("{symbol:?} is referenced in its own initialization")]
    SelfReferentialInit { symbol: String },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMismatch { expected: String, received: String },
    #[error("unsupported operation: {operator} between {operands}")]
    UnsupportedOperation { operator: String, operands: String },
    #[error("wrong number of arguments for {callee:?}: expected {expected}, received {received}")]
    ArityMismatch {
        callee: String,
        expected: usize,
        received: usize,
    },
    #[error("{statement} used outside of a while/for loop")]
    IllegalBreakOrContinue { statement: String },
    #[error("illegal return: {reason}")]
    IllegalReturn { reason: String },
    #[error("function {function:?} can reach the end of its body without returning a value")]
    MissingReturn { function: String },
    #[error("cannot cast {source_type} to {target}")]
    InvalidCast { target: String, source_type: String },
    #[error("malformed format string: {reason}")]
    MalformedFormatString { reason: String },
    #[error("array index must be int, received {received}")]
    IndexTypeError { received: String },
    #[error("cannot assign to constant {symbol:?}")]
    AssignToConstant { symbol: String },
    #[error("redundant cast to {ty}")]
    RedundantCast { ty: String },

    // Runtime
    #[error("undefined property {property:?}")]
    UndefinedProperty { property: String },
    #[error("{value} is not callable")]
    NotCallable { value: String },
    #[error("{value} is not an instance")]
    NotAnInstance { value: String },
    #[error("index {index} is out of bounds for an array of length {length}")]
    IndexOutOfBounds { index: i64, length: usize },
    #[error("{callee:?} expected {expected} arguments, received {received}")]
    CallArityMismatch {
        callee: String,
        expected: usize,
        received: usize,
    },
    #[error("builtin {builtin:?} failed: {reason}")]
    BuiltinCallFailure { builtin: String, reason: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("{symbol:?} is read before it is assigned")]
    UninitializedVariable { symbol: String },
    #[error("call depth exceeded {depth}")]
    StackExhausted { depth: usize },
    #[error("cannot allocate an array of {length} elements")]
    AllocationFailure { length: i64 },
    #[error("cannot start program: {reason}")]
    MissingEntryPoint { reason: String },
    #[error("attempted to pop the outermost scope")]
    ScopeUnderflow,
    #[error("internal error: {reason}")]
    InternalError { reason: String },
}
