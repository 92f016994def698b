use std::{
    cell::RefCell,
    collections::HashMap,
    fmt::{Debug, Display},
    rc::Rc,
};

use crate::{
    ast::{ast::FuncDecl, types::Type},
    environment::environment::Environment,
    errors::errors::{Error, ErrorImpl},
    prelude::prelude::Builtin,
    Position,
};

use super::{interpreter::Interpreter, stmt::Flow};

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// Also the result of calling a `void` function.
    Nil,
    /// Arrays are shared by handle, so a callee sees writes made by its caller and vice versa.
    Array(Rc<RefCell<ArrayValue>>),
    Function(Callable),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

impl Value {
    /// The default element value used by `new T[n]`.
    pub fn default_for(ty: &Type) -> Value {
        match ty {
            Type::Int => Value::Int(0),
            Type::Float => Value::Float(0.0),
            Type::Bool => Value::Bool(false),
            Type::Str => Value::Str(String::new()),
            _ => Value::Nil,
        }
    }

    /// Allocates a default-filled array, failing instead of aborting when the
    /// host cannot hold `length` elements.
    pub fn new_array(element: Type, length: usize) -> Result<Value, ErrorImpl> {
        let mut items = Vec::new();
        items
            .try_reserve_exact(length)
            .map_err(|_| ErrorImpl::AllocationFailure {
                length: i64::try_from(length).unwrap_or(i64::MAX),
            })?;
        items.resize(length, Value::default_for(&element));
        Ok(Value::Array(Rc::new(RefCell::new(ArrayValue { element, items }))))
    }

    /// Booleans pass through, nil is false and everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(value) => *value,
            Value::Nil => false,
            _ => true,
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::Int(_) => String::from("int"),
            Value::Float(_) => String::from("float"),
            Value::Bool(_) => String::from("bool"),
            Value::Str(_) => String::from("string"),
            Value::Nil => String::from("nil"),
            Value::Array(_) => String::from("array"),
            Value::Function(_) => String::from("function"),
            Value::Class(_) => String::from("class"),
            Value::Instance(instance) => instance.class.name.clone(),
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) | (Value::Float(_), Value::Float(_)) => {
                self.as_float() == other.as_float()
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => {
                if value.is_finite() && value.fract() == 0.0 {
                    write!(f, "{:.1}", value)
                } else {
                    write!(f, "{}", value)
                }
            }
            Value::Bool(value) => write!(f, "{}", value),
            Value::Str(value) => write!(f, "{}", value),
            Value::Nil => write!(f, "nil"),
            Value::Array(array) => {
                let array = array.borrow();
                let items: Vec<String> = array.items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Function(callable) => write!(f, "{:?}", callable),
            Value::Class(class) => write!(f, "{}", class.name),
            Value::Instance(instance) => write!(f, "{} instance", instance.class.name),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(value) => write!(f, "{:?}", value),
            other => write!(f, "{}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArrayValue {
    pub element: Type,
    pub items: Vec<Value>,
}

impl ArrayValue {
    fn slot(&self, index: i64) -> Result<usize, ErrorImpl> {
        usize::try_from(index)
            .ok()
            .filter(|slot| *slot < self.items.len())
            .ok_or(ErrorImpl::IndexOutOfBounds {
                index,
                length: self.items.len(),
            })
    }

    pub fn get(&self, index: i64) -> Result<Value, ErrorImpl> {
        let slot = self.slot(index)?;
        Ok(self.items[slot].clone())
    }

    pub fn set(&mut self, index: i64, value: Value) -> Result<(), ErrorImpl> {
        let slot = self.slot(index)?;
        self.items[slot] = value;
        Ok(())
    }
}

#[derive(Clone)]
pub enum Callable {
    User(Rc<Function>),
    Builtin(&'static Builtin),
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::User(a), Callable::User(b)) => Rc::ptr_eq(a, b),
            (Callable::Builtin(a), Callable::Builtin(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callable::User(function) => write!(f, "<function {}>", function.name()),
            Callable::Builtin(builtin) => write!(f, "{:?}", builtin),
        }
    }
}

/// A user function together with the environment it was declared in.
pub struct Function {
    pub decl: Rc<FuncDecl>,
    pub closure: Environment<Value>,
}

impl Function {
    pub fn new(decl: Rc<FuncDecl>, closure: Environment<Value>) -> Self {
        Function { decl, closure }
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn arity(&self) -> usize {
        self.decl.arity()
    }

    /// Runs the body in a fresh child of the closure, never of the caller's
    /// environment. A body that finishes without `return` yields nil.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, Error> {
        if arguments.len() != self.arity() {
            return Err(Error::new(
                ErrorImpl::CallArityMismatch {
                    callee: self.name().to_string(),
                    expected: self.arity(),
                    received: arguments.len(),
                },
                Position::null(),
            ));
        }

        let mut env = self.closure.child();
        for (param, argument) in self.decl.params.iter().zip(arguments) {
            env.define(&param.name, argument)
                .map_err(|error| Error::new(error, self.decl.position.clone()))?;
        }

        interpreter.enter_call(&self.decl)?;
        let flow = interpreter.execute_body(&self.decl.body, env);
        interpreter.exit_call();

        match flow? {
            Flow::Normal => Ok(Value::Nil),
            Flow::Return(value) => Ok(value),
            Flow::Break | Flow::Continue => Err(Error::new(
                ErrorImpl::InternalError {
                    reason: format!("loop signal escaped function {:?}", self.name()),
                },
                self.decl.position.clone(),
            )),
        }
    }

    /// Returns a copy of this function whose closure binds `this` to `instance`.
    pub fn bind(&self, instance: &Rc<Instance>) -> Result<Rc<Function>, ErrorImpl> {
        let mut closure = self.closure.child();
        closure.define("this", Value::Instance(Rc::clone(instance)))?;
        Ok(Rc::new(Function::new(Rc::clone(&self.decl), closure)))
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<function {}>", self.name())
    }
}

pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: HashMap<String, Rc<Function>>,
}

impl Class {
    /// Looks `name` up on this class, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self
                .superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name)),
        }
    }

    /// Allocates an instance and runs `init` on it when the chain defines one.
    pub fn instantiate(self: &Rc<Self>, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, Error> {
        let instance = Rc::new(Instance::new(Rc::clone(self)));

        match self.find_method("init") {
            Some(init) => {
                init.bind(&instance)
                    .map_err(|error| Error::new(error, init.decl.position.clone()))?
                    .call(interpreter, arguments)?;
            }
            None if !arguments.is_empty() => {
                return Err(Error::new(
                    ErrorImpl::CallArityMismatch {
                        callee: self.name.clone(),
                        expected: 0,
                        received: arguments.len(),
                    },
                    Position::null(),
                ))
            }
            None => {}
        }

        Ok(Value::Instance(instance))
    }
}

impl Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    /// Fields shadow methods; a method is returned bound to this instance.
    pub fn get(self: &Rc<Self>, name: &str) -> Result<Value, ErrorImpl> {
        if let Some(value) = self.fields.borrow().get(name) {
            return Ok(value.clone());
        }

        match self.class.find_method(name) {
            Some(method) => Ok(Value::Function(Callable::User(method.bind(self)?))),
            None => Err(ErrorImpl::UndefinedProperty {
                property: name.to_string(),
            }),
        }
    }

    pub fn set(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}
