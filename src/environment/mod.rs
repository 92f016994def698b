//! Scoped environments shared by the checker and the interpreter.
//!
//! An environment is a chain of frames linked to their parent. Lookups walk
//! the chain innermost first; definitions only ever touch the current frame.
//! The checker stores symbols in it, the interpreter stores runtime values.

pub mod environment;
