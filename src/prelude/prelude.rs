use std::fmt::Debug;

use lazy_static::lazy_static;

use crate::{
    ast::types::Type,
    errors::errors::ErrorImpl,
    interpreter::{interpreter::Interpreter, value::Value},
    MK_BUILTIN,
};

pub type BuiltinFn = fn(&mut Interpreter, &[Value]) -> Result<Value, ErrorImpl>;

/// A host function visible to programs under a fixed name.
pub struct Builtin {
    pub name: &'static str,
    /// `Type::Any` accepts a value of any type.
    pub params: Vec<Type>,
    pub return_type: Type,
    pub func: BuiltinFn,
}

impl Builtin {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Float(f64),
    Bool(bool),
    Nil,
}

impl Constant {
    pub fn get_type(&self) -> Type {
        match self {
            Constant::Float(_) => Type::Float,
            Constant::Bool(_) => Type::Bool,
            Constant::Nil => Type::Nil,
        }
    }

    pub fn to_value(self) -> Value {
        match self {
            Constant::Float(value) => Value::Float(value),
            Constant::Bool(value) => Value::Bool(value),
            Constant::Nil => Value::Nil,
        }
    }
}

/// The bindings installed as the outermost, read-only frame of every run.
#[derive(Debug)]
pub struct Prelude {
    pub constants: Vec<(&'static str, Constant)>,
    pub builtins: Vec<Builtin>,
}

impl Prelude {
    pub fn builtin(&'static self, name: &str) -> Option<&'static Builtin> {
        self.builtins.iter().find(|builtin| builtin.name == name)
    }
}

lazy_static! {
    pub static ref PRELUDE: Prelude = Prelude {
        constants: vec![
            ("PI", Constant::Float(3.14159)),
            ("E", Constant::Float(2.71828)),
            ("TRUE", Constant::Bool(true)),
            ("FALSE", Constant::Bool(false)),
            ("NULL", Constant::Nil),
        ],
        builtins: vec![
            MK_BUILTIN!("print", [Type::Any] -> Type::Void, builtin_print),
            MK_BUILTIN!("input", [Type::Str] -> Type::Str, builtin_input),
            MK_BUILTIN!("len", [Type::Any] -> Type::Int, builtin_len),
            MK_BUILTIN!("type", [Type::Any] -> Type::Str, builtin_type),
        ],
    };
}

fn builtin_print(interpreter: &mut Interpreter, arguments: &[Value]) -> Result<Value, ErrorImpl> {
    let value = single_argument("print", arguments)?;
    interpreter.output.println(&value.to_string());
    Ok(Value::Nil)
}

fn builtin_input(interpreter: &mut Interpreter, arguments: &[Value]) -> Result<Value, ErrorImpl> {
    let prompt = single_argument("input", arguments)?;
    interpreter.output.print(&prompt.to_string());
    interpreter
        .input
        .read_line()
        .map(Value::Str)
        .ok_or_else(|| ErrorImpl::BuiltinCallFailure {
            builtin: String::from("input"),
            reason: String::from("input stream is exhausted"),
        })
}

fn builtin_len(_interpreter: &mut Interpreter, arguments: &[Value]) -> Result<Value, ErrorImpl> {
    match single_argument("len", arguments)? {
        Value::Str(string) => Ok(Value::Int(string.chars().count() as i64)),
        Value::Array(array) => Ok(Value::Int(array.borrow().items.len() as i64)),
        other => Err(ErrorImpl::BuiltinCallFailure {
            builtin: String::from("len"),
            reason: format!("a value of type {} has no length", other.type_name()),
        }),
    }
}

fn builtin_type(_interpreter: &mut Interpreter, arguments: &[Value]) -> Result<Value, ErrorImpl> {
    let value = single_argument("type", arguments)?;
    Ok(Value::Str(value.type_name()))
}

fn single_argument<'a>(builtin: &str, arguments: &'a [Value]) -> Result<&'a Value, ErrorImpl> {
    match arguments {
        [value] => Ok(value),
        _ => Err(ErrorImpl::CallArityMismatch {
            callee: builtin.to_string(),
            expected: 1,
            received: arguments.len(),
        }),
    }
}
