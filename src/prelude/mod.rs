//! The prelude: constants and builtin functions every program can see.
//!
//! Built once per process and installed as the outermost read-only scope by
//! both the checker and the interpreter.

pub mod prelude;
