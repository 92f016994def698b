//! Utility macros for the interpreter.
//!
//! - `MK_BUILTIN!` - Creates a prelude `Builtin` entry
//! - `MK_RUNTIME_ERROR!` - Creates an `Error` from an `ErrorImpl` variant at a position

/// Creates a prelude builtin entry.
///
/// # Example
///
/// ```ignore
/// MK_BUILTIN!("len", [Type::Any] -> Type::Int, builtin_len)
/// ```
#[macro_export]
macro_rules! MK_BUILTIN {
    ($name:literal, [$($param:expr),*] -> $ret:expr, $func:path) => {
        Builtin {
            name: $name,
            params: vec![$($param),*],
            return_type: $ret,
            func: $func,
        }
    };
}

/// Creates an `Error` from an `ErrorImpl` variant and a position.
///
/// # Example
///
/// ```ignore
/// return Err(MK_RUNTIME_ERROR!(NotAnInstance { value: object.to_string() }, &expr.position));
/// ```
#[macro_export]
macro_rules! MK_RUNTIME_ERROR {
    ($variant:ident, $position:expr) => {
        $crate::errors::errors::Error::new(
            $crate::errors::errors::ErrorImpl::$variant,
            ($position).clone(),
        )
    };
    ($variant:ident { $($field:ident : $value:expr),* $(,)? }, $position:expr) => {
        $crate::errors::errors::Error::new(
            $crate::errors::errors::ErrorImpl::$variant { $($field: $value),* },
            ($position).clone(),
        )
    };
}
