//! Type system definitions for the AST.
//!
//! This module defines the types used in the language, including:
//!
//! - Primitive types (`void`, `bool`, `int`, `float`, `string`)
//! - Composite types (arrays, classes, functions)
//! - The `Any` type used for dynamically typed positions
//!
//! Types appear in declarations as written by the parser and are then used
//! by the checker as the resolved type of every expression.

use std::fmt::Display;

/// Represents every type the checker can assign to a declaration or expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Void,
    Bool,
    Int,
    Float,
    Str,
    Nil,
    Array(Box<Type>),
    Class(String),
    Function,
    /// Acts a bit like a `void*` in C.
    ///
    /// Used for instance fields, bound methods and builtin parameters,
    /// whose types are only known at runtime.
    Any,
}

impl Type {
    /// Resolves a primitive type name as written in source.
    ///
    /// Class names are not primitive and resolve to `None`.
    pub fn from_name(name: &str) -> Option<Type> {
        match name {
            "void" => Some(Type::Void),
            "bool" => Some(Type::Bool),
            "int" => Some(Type::Int),
            "float" => Some(Type::Float),
            "string" | "char" => Some(Type::Str),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::Any)
    }

    /// Primitive types are the valid targets and sources of a cast.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Bool | Type::Int | Type::Float | Type::Str)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    /// Checks whether a value of type `other` may be stored where `self` is expected.
    ///
    /// This does not know about class hierarchies; the checker widens class
    /// compatibility on top of it.
    pub fn is_compatible_with(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Any, _) | (_, Type::Any) => true,
            (Type::Array(a), Type::Array(b)) => a.is_compatible_with(b),
            _ => self == other,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Str => write!(f, "string"),
            Type::Nil => write!(f, "nil"),
            Type::Array(element) => write!(f, "{}[]", element),
            Type::Class(name) => write!(f, "{}", name),
            Type::Function => write!(f, "function"),
            Type::Any => write!(f, "any"),
        }
    }
}
