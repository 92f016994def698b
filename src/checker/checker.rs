use std::{collections::HashMap, rc::Rc};

use tracing::{debug, trace, warn};

use crate::{
    ast::{
        ast::{ClassDecl, Decl, FuncDecl, Program, VarDecl},
        types::Type,
    },
    environment::environment::Environment,
    errors::errors::{Error, ErrorImpl},
    prelude::prelude::{Builtin, PRELUDE},
    stack::ensure_sufficient_stack,
    Position,
};

use super::{
    expr::check_expr,
    stmt::{always_returns, check_compound_body},
};

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub name: String,
    pub params: Vec<Type>,
    pub return_type: Type,
}

impl FunctionSig {
    pub fn from_decl(decl: &FuncDecl) -> Self {
        FunctionSig {
            name: decl.name.clone(),
            params: decl.params.iter().map(|param| param.ty.clone()).collect(),
            return_type: decl.return_type.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ClassInfo {
    pub name: String,
    pub superclass: Option<Rc<ClassInfo>>,
    pub fields: HashMap<String, Type>,
    pub methods: HashMap<String, Rc<FunctionSig>>,
}

impl ClassInfo {
    pub fn find_method(&self, name: &str) -> Option<Rc<FunctionSig>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self.superclass.as_ref().and_then(|superclass| superclass.find_method(name)),
        }
    }

    pub fn find_field(&self, name: &str) -> Option<Type> {
        match self.fields.get(name) {
            Some(ty) => Some(ty.clone()),
            None => self.superclass.as_ref().and_then(|superclass| superclass.find_field(name)),
        }
    }

    /// Whether this class is `name` or inherits from it.
    pub fn is_a(&self, name: &str) -> bool {
        self.name == name
            || self
                .superclass
                .as_ref()
                .is_some_and(|superclass| superclass.is_a(name))
    }
}

/// What a name means to the checker.
#[derive(Debug, Clone)]
pub enum Symbol {
    Var(Type),
    /// A prelude constant.
    Const(Type),
    /// The receiver of a method body; readable but never assignable.
    This(Type),
    Function(Rc<FunctionSig>),
    Class(Rc<ClassInfo>),
    Builtin(&'static Builtin),
}

impl Symbol {
    pub fn get_type(&self) -> Type {
        match self {
            Symbol::Var(ty) | Symbol::Const(ty) | Symbol::This(ty) => ty.clone(),
            Symbol::Function(_) | Symbol::Builtin(_) => Type::Function,
            Symbol::Class(_) => Type::Any,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Symbol::Var(ty) | Symbol::Const(ty) => ty.to_string(),
            Symbol::This(_) => String::from("this"),
            Symbol::Function(_) | Symbol::Builtin(_) => String::from("function"),
            Symbol::Class(_) => String::from("class"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionContext {
    pub name: String,
    pub return_type: Type,
}

#[derive(Debug)]
pub struct Checker {
    pub env: Environment<Symbol>,
    /// Every class declared so far, by name.
    pub classes: HashMap<String, Rc<ClassInfo>>,
    pub errors: Vec<Error>,
    pub warnings: Vec<Error>,
    pub in_loop: bool,
    pub function: Option<FunctionContext>,
}

impl Checker {
    pub fn new() -> Self {
        let prelude: &'static _ = &*PRELUDE;
        let constants = prelude
            .constants
            .iter()
            .map(|(name, constant)| (name.to_string(), Symbol::Const(constant.get_type())));
        let builtins = prelude
            .builtins
            .iter()
            .map(|builtin| (builtin.name.to_string(), Symbol::Builtin(builtin)));

        Checker {
            env: Environment::with_frozen_root(constants.chain(builtins)),
            classes: HashMap::new(),
            errors: vec![],
            warnings: vec![],
            in_loop: false,
            function: None,
        }
    }

    pub fn report(&mut self, error: ErrorImpl, position: &Position) {
        debug!(%error, line = position.0, "check error");
        self.errors.push(Error::new(error, position.clone()));
    }

    pub fn warn(&mut self, error: ErrorImpl, position: &Position) {
        warn!(%error, line = position.0, "check warning");
        self.warnings.push(Error::new(error, position.clone()));
    }

    pub fn push_scope(&mut self) {
        self.env.push();
        trace!(depth = self.env.depth(), "push scope");
    }

    pub fn pop_scope(&mut self, position: &Position) {
        trace!(depth = self.env.depth(), "pop scope");
        if let Err(error) = self.env.pop() {
            self.report(error, position);
        }
    }

    /// Defines `name` in the current scope, reporting a redefinition.
    pub fn define(&mut self, name: &str, symbol: Symbol, position: &Position) -> bool {
        match self.env.define(name, symbol) {
            Ok(()) => true,
            Err(error) => {
                self.report(error, position);
                false
            }
        }
    }

    /// Resolves `name`, reporting it if it is unbound or still being initialized.
    pub fn lookup(&mut self, name: &str, position: &Position) -> Option<Symbol> {
        match self.env.lookup(name) {
            Ok(symbol) => Some(symbol),
            Err(error) => {
                self.report(error, position);
                None
            }
        }
    }

    /// Checks that a declared type only names classes that exist.
    pub fn resolve_type(&mut self, ty: &Type, position: &Position) -> bool {
        match ty {
            Type::Class(name) => {
                if self.classes.contains_key(name) {
                    true
                } else {
                    self.report(ErrorImpl::UndefinedSymbol { symbol: name.clone() }, position);
                    false
                }
            }
            Type::Array(element) => self.resolve_type(element, position),
            _ => true,
        }
    }

    /// Whether a value of type `received` can be stored where `expected` is declared.
    ///
    /// Beyond plain compatibility, a class accepts its subclasses and nil stands
    /// in for a missing object or array.
    pub fn is_assignable(&self, expected: &Type, received: &Type) -> bool {
        if expected.is_compatible_with(received) {
            return true;
        }
        match (expected, received) {
            (Type::Class(_) | Type::Array(_), Type::Nil) => true,
            (Type::Class(expected), Type::Class(received)) => self
                .classes
                .get(received)
                .is_some_and(|class| class.is_a(expected)),
            _ => false,
        }
    }

    pub fn expect_assignable(&mut self, expected: &Type, received: &Type, position: &Position) {
        if !self.is_assignable(expected, received) {
            self.report(
                ErrorImpl::TypeMismatch {
                    expected: expected.to_string(),
                    received: received.to_string(),
                },
                position,
            );
        }
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks a whole program.
///
/// Every violation is collected; the program is rejected if there is at
/// least one. On success the warnings are returned.
#[tracing::instrument(level = "debug", skip_all, fields(decls = program.decls.len()))]
pub fn check(program: &Program) -> Result<Vec<Error>, Vec<Error>> {
    let mut checker = Checker::new();

    for decl in &program.decls {
        check_decl(&mut checker, decl);
    }

    debug!(
        errors = checker.errors.len(),
        warnings = checker.warnings.len(),
        "check finished"
    );

    if checker.errors.is_empty() {
        Ok(checker.warnings)
    } else {
        Err(checker.errors)
    }
}

pub fn check_decl(checker: &mut Checker, decl: &Decl) {
    match decl {
        Decl::Var(var) => check_var_decl(checker, var),
        Decl::Func(func) => check_func_decl(checker, func),
        Decl::Class(class) => check_class_decl(checker, class),
    }
}

pub fn check_var_decl(checker: &mut Checker, var: &VarDecl) {
    debug!(name = %var.name, ty = %var.ty, "declare variable");

    if var.ty == Type::Void {
        checker.report(
            ErrorImpl::TypeMismatch {
                expected: String::from("a value type"),
                received: var.ty.to_string(),
            },
            &var.position,
        );
    }
    checker.resolve_type(&var.ty, &var.position);

    // The name is bound to a placeholder while its initializer is checked.
    let declared = match checker.env.declare(&var.name) {
        Ok(()) => true,
        Err(error) => {
            checker.report(error, &var.position);
            false
        }
    };

    if let Some(initializer) = &var.initializer {
        let ty = check_expr(checker, initializer);
        checker.expect_assignable(&var.ty, &ty, &initializer.position);
    }

    if declared {
        checker.define(&var.name, Symbol::Var(var.ty.clone()), &var.position);
    }
}

pub fn check_func_decl(checker: &mut Checker, func: &Rc<FuncDecl>) {
    debug!(name = %func.name, arity = func.arity(), "declare function");

    let sig = Rc::new(FunctionSig::from_decl(func));
    checker.define(&func.name, Symbol::Function(sig), &func.position);
    check_function_body(checker, func);
}

/// Checks parameters and body of a function or method in a fresh scope.
///
/// The body's own declarations live in the same scope as the parameters.
pub fn check_function_body(checker: &mut Checker, func: &FuncDecl) {
    ensure_sufficient_stack(|| {
        checker.resolve_type(&func.return_type, &func.position);

        checker.push_scope();
        for param in &func.params {
            checker.resolve_type(&param.ty, &func.position);
            checker.define(&param.name, Symbol::Var(param.ty.clone()), &func.position);
        }

        let in_loop = std::mem::replace(&mut checker.in_loop, false);
        let function = checker.function.replace(FunctionContext {
            name: func.name.clone(),
            return_type: func.return_type.clone(),
        });

        check_compound_body(checker, &func.body);

        checker.in_loop = in_loop;
        checker.function = function;
        checker.pop_scope(&func.position);

        if func.return_type != Type::Void && !func.body.iter().any(always_returns) {
            checker.report(
                ErrorImpl::MissingReturn {
                    function: func.name.clone(),
                },
                &func.position,
            );
        }
    })
}

pub fn check_class_decl(checker: &mut Checker, class: &Rc<ClassDecl>) {
    debug!(name = %class.name, superclass = ?class.superclass, "declare class");

    let superclass = class.superclass.as_ref().and_then(|name| {
        match checker.lookup(name, &class.position)? {
            Symbol::Class(info) => Some(info),
            other => {
                checker.report(
                    ErrorImpl::TypeMismatch {
                        expected: String::from("class"),
                        received: other.describe(),
                    },
                    &class.position,
                );
                None
            }
        }
    });

    let mut fields = HashMap::new();
    for field in &class.fields {
        if fields.insert(field.name.clone(), field.ty.clone()).is_some() {
            checker.report(ErrorImpl::Redefinition { symbol: field.name.clone() }, &class.position);
        }
    }

    let mut methods = HashMap::new();
    for method in &class.methods {
        let duplicate = fields.contains_key(&method.name)
            || methods
                .insert(method.name.clone(), Rc::new(FunctionSig::from_decl(method)))
                .is_some();
        if duplicate {
            checker.report(ErrorImpl::Redefinition { symbol: method.name.clone() }, &method.position);
        }
    }

    let info = Rc::new(ClassInfo {
        name: class.name.clone(),
        superclass: superclass.clone(),
        fields,
        methods,
    });

    if checker.define(&class.name, Symbol::Class(Rc::clone(&info)), &class.position) {
        checker.classes.insert(class.name.clone(), Rc::clone(&info));
    }

    for field in &class.fields {
        checker.resolve_type(&field.ty, &class.position);
    }

    checker.push_scope();
    checker.define("this", Symbol::This(Type::Class(class.name.clone())), &class.position);
    if let Some(superclass) = superclass {
        checker.define("super", Symbol::Class(superclass), &class.position);
    }

    for method in &class.methods {
        check_function_body(checker, method);
    }

    checker.pop_scope(&class.position);
}
