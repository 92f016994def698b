//! Tree-walking interpreter.
//!
//! Executes a checked program against live environments. It handles:
//!
//! - The runtime value and object model (functions, classes, instances, arrays)
//! - Statement execution with explicit control-flow signals
//! - Expression evaluation, including formatted I/O
//! - The `main` entry point contract

pub mod expr;
pub mod format;
pub mod interpreter;
pub mod io;
pub mod stmt;
pub mod value;

#[cfg(test)]
mod tests;
