use std::rc::Rc;

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{ClassDecl, Decl, FuncDecl, Program, VarDecl},
        statements::Compound,
    },
    environment::environment::Environment,
    errors::errors::{Error, ErrorImpl},
    prelude::prelude::PRELUDE,
    Position, MK_RUNTIME_ERROR,
};

use super::{
    expr::evaluate_expr,
    io::{InputSource, OutputSink},
    stmt::{execute_compound_body, Flow},
    value::{Callable, Class, Function, Value},
};

#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Calls nested deeper than this fail with `StackExhausted`.
    pub max_call_depth: usize,
    /// Write `Return: <value>` when `main` returns something other than nil.
    pub echo_return: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_call_depth: 10_000,
            echo_return: false,
        }
    }
}

#[derive(Debug)]
pub struct Interpreter {
    /// The environment statements currently run in.
    pub env: Environment<Value>,
    pub output: OutputSink,
    pub input: InputSource,
    pub config: InterpreterConfig,
    depth: usize,
}

impl Interpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        Self::with_io(config, OutputSink::Stdout, InputSource::stdin())
    }

    pub fn with_io(config: InterpreterConfig, output: OutputSink, input: InputSource) -> Self {
        Interpreter {
            env: prelude_environment(),
            output,
            input,
            config,
            depth: 0,
        }
    }

    pub fn push_scope(&mut self) {
        self.env.push();
        trace!(depth = self.env.depth(), "push scope");
    }

    pub fn pop_scope(&mut self, position: &Position) -> Result<(), Error> {
        trace!(depth = self.env.depth(), "pop scope");
        self.env
            .pop()
            .map_err(|error| Error::new(error, position.clone()))
    }

    pub fn enter_call(&mut self, decl: &FuncDecl) -> Result<(), Error> {
        if self.depth >= self.config.max_call_depth {
            return Err(MK_RUNTIME_ERROR!(
                StackExhausted {
                    depth: self.config.max_call_depth
                },
                &decl.position
            ));
        }
        self.depth += 1;
        trace!(function = %decl.name, depth = self.depth, "call");
        Ok(())
    }

    pub fn exit_call(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Runs a function body in `env`, restoring the caller's environment afterwards.
    pub fn execute_body(&mut self, body: &Compound, env: Environment<Value>) -> Result<Flow, Error> {
        let caller = std::mem::replace(&mut self.env, env);
        let flow = execute_compound_body(self, body);
        self.env = caller;
        flow
    }

    pub fn lookup(&self, name: &str, position: &Position) -> Result<Value, Error> {
        self.env.lookup(name).map_err(|error| match error {
            ErrorImpl::SelfReferentialInit { symbol } => {
                MK_RUNTIME_ERROR!(UninitializedVariable { symbol: symbol }, position)
            }
            other => Error::new(other, position.clone()),
        })
    }

    pub fn assign(&self, name: &str, value: Value, position: &Position) -> Result<(), Error> {
        self.env
            .assign(name, value)
            .map_err(|error| Error::new(error, position.clone()))
    }

    pub fn define(&mut self, name: &str, value: Value, position: &Position) -> Result<(), Error> {
        self.env
            .define(name, value)
            .map_err(|error| Error::new(error, position.clone()))
    }

    /// Invokes anything callable: user functions, builtins and classes.
    pub fn call_value(&mut self, callee: Value, arguments: Vec<Value>, position: &Position) -> Result<Value, Error> {
        match callee {
            Value::Function(Callable::User(function)) => function
                .call(self, arguments)
                .map_err(|error| error.or_at(position)),
            Value::Function(Callable::Builtin(builtin)) => {
                if arguments.len() != builtin.arity() {
                    return Err(MK_RUNTIME_ERROR!(
                        CallArityMismatch {
                            callee: builtin.name.to_string(),
                            expected: builtin.arity(),
                            received: arguments.len()
                        },
                        position
                    ));
                }
                trace!(builtin = builtin.name, "call builtin");
                (builtin.func)(self, &arguments).map_err(|error| Error::new(error, position.clone()))
            }
            Value::Class(class) => class
                .instantiate(self, arguments)
                .map_err(|error| error.or_at(position)),
            other => Err(MK_RUNTIME_ERROR!(
                NotCallable {
                    value: other.to_string()
                },
                position
            )),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

fn prelude_environment() -> Environment<Value> {
    let prelude: &'static _ = &*PRELUDE;
    let constants = prelude
        .constants
        .iter()
        .map(|(name, constant)| (name.to_string(), constant.to_value()));
    let builtins = prelude
        .builtins
        .iter()
        .map(|builtin| (builtin.name.to_string(), Value::Function(Callable::Builtin(builtin))));

    Environment::with_frozen_root(constants.chain(builtins))
}

/// Runs a checked program: declares every global in order, then calls `main`.
///
/// `main` is located before anything executes; a program without a zero
/// argument `main` fails without running any statement.
#[tracing::instrument(level = "debug", skip_all)]
pub fn interpret(interpreter: &mut Interpreter, program: &Program) -> Result<Value, Error> {
    let main = program.find_function("main").ok_or_else(|| {
        MK_RUNTIME_ERROR!(
            MissingEntryPoint {
                reason: String::from("no function named `main` is declared")
            },
            &Position::null()
        )
    })?;
    if main.arity() != 0 {
        return Err(MK_RUNTIME_ERROR!(
            MissingEntryPoint {
                reason: format!("`main` must take no parameters, it takes {}", main.arity())
            },
            &main.position
        ));
    }

    for decl in &program.decls {
        execute_decl(interpreter, decl)?;
    }

    let entry = interpreter.lookup("main", &main.position)?;
    let result = interpreter.call_value(entry, vec![], &main.position)?;
    debug!(result = ?result, "main returned");

    if interpreter.config.echo_return && result != Value::Nil {
        interpreter.output.println(&format!("Return: {}", result));
    }

    Ok(result)
}

pub fn execute_decl(interpreter: &mut Interpreter, decl: &Decl) -> Result<(), Error> {
    match decl {
        Decl::Var(var) => execute_var_decl(interpreter, var),
        Decl::Func(func) => {
            debug!(name = %func.name, "define function");
            let function = Function::new(Rc::clone(func), interpreter.env.clone());
            interpreter.define(
                &func.name,
                Value::Function(Callable::User(Rc::new(function))),
                &func.position,
            )
        }
        Decl::Class(class) => execute_class_decl(interpreter, class),
    }
}

/// A variable declared without an initializer stays unreadable until assigned.
pub fn execute_var_decl(interpreter: &mut Interpreter, var: &VarDecl) -> Result<(), Error> {
    match &var.initializer {
        Some(initializer) => {
            let value = evaluate_expr(interpreter, initializer)?;
            interpreter.define(&var.name, value, &var.position)
        }
        None => interpreter
            .env
            .declare(&var.name)
            .map_err(|error| Error::new(error, var.position.clone())),
    }
}

fn execute_class_decl(interpreter: &mut Interpreter, class: &ClassDecl) -> Result<(), Error> {
    debug!(name = %class.name, superclass = ?class.superclass, "define class");

    let superclass = match &class.superclass {
        Some(name) => match interpreter.lookup(name, &class.position)? {
            Value::Class(superclass) => Some(superclass),
            other => {
                return Err(MK_RUNTIME_ERROR!(
                    InternalError {
                        reason: format!("superclass {:?} is a {}, not a class", name, other.type_name())
                    },
                    &class.position
                ))
            }
        },
        None => None,
    };

    // Methods of a subclass close over a frame binding `super`.
    let closure = match &superclass {
        Some(superclass) => {
            let mut closure = interpreter.env.child();
            closure
                .define("super", Value::Class(Rc::clone(superclass)))
                .map_err(|error| Error::new(error, class.position.clone()))?;
            closure
        }
        None => interpreter.env.clone(),
    };

    let methods = class
        .methods
        .iter()
        .map(|method| {
            let function = Function::new(Rc::clone(method), closure.clone());
            (method.name.clone(), Rc::new(function))
        })
        .collect();

    let value = Class {
        name: class.name.clone(),
        superclass,
        methods,
    };
    interpreter.define(&class.name, Value::Class(Rc::new(value)), &class.position)
}
