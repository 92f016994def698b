//! Error types and error handling for the checker and the interpreter.
//!
//! This module defines the error types used throughout the pipeline.
//! It includes:
//!
//! - Error structures with source position information
//! - Check-time and runtime error variants
//! - Error formatting and display functionality
//! - Helpful error messages and suggestions

pub mod errors;
