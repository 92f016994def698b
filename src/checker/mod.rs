//! Static checking and semantic analysis module.
//!
//! This module validates a program before it is allowed to run:
//!
//! - Resolving every name through a scoped symbol table
//! - Checking operand, assignment, argument and return types
//! - Enforcing where `break`, `continue` and `return` may appear
//! - Validating casts and `printf`/`scanf`/`sprintf` format strings
//!
//! Violations are collected rather than aborting at the first one; a program
//! with any violation is rejected.

pub mod checker;
pub mod expr;
pub mod stmt;
