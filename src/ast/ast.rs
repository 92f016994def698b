use std::rc::Rc;

use crate::Position;

use super::{expressions::Expr, statements::Compound, types::Type};

/// A whole program unit as handed over by the parser.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub decls: Vec<Decl>,
}

impl Program {
    pub fn new(decls: Vec<Decl>) -> Self {
        Program { decls }
    }

    /// Finds a top-level function declaration by name.
    pub fn find_function(&self, name: &str) -> Option<&Rc<FuncDecl>> {
        self.decls.iter().find_map(|decl| match decl {
            Decl::Func(func) if func.name == name => Some(func),
            _ => None,
        })
    }
}

/// Declaration kinds
///
/// Functions and classes are reference counted so runtime function and class
/// values can point back at their declaring node without cloning the tree.
#[derive(Debug, Clone)]
pub enum Decl {
    Var(VarDecl),
    Func(Rc<FuncDecl>),
    Class(Rc<ClassDecl>),
}

/// Variable Declaration
///
/// Array declarations (`int a[];`) are variable declarations with an array type.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub initializer: Option<Expr>,
    pub position: Position,
}

impl VarDecl {
    pub fn new(ty: Type, name: &str) -> Self {
        VarDecl {
            name: name.to_string(),
            ty,
            initializer: None,
            position: Position::null(),
        }
    }

    pub fn with_initializer(mut self, initializer: Expr) -> Self {
        self.initializer = Some(initializer);
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

impl Param {
    pub fn new(ty: Type, name: &str) -> Self {
        Param {
            name: name.to_string(),
            ty,
        }
    }
}

/// Function Declaration
///
/// Also used for methods inside a class body.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Param>,
    pub body: Compound,
    pub position: Position,
}

impl FuncDecl {
    pub fn new(return_type: Type, name: &str, params: Vec<Param>, body: Compound) -> Self {
        FuncDecl {
            name: name.to_string(),
            return_type,
            params,
            body,
            position: Position::null(),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Class Declaration
///
/// Single inheritance only; the superclass is referenced by name and must be
/// declared before this class. Fields are declared with a type only; instances
/// start out empty and gain fields when they are first set.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub superclass: Option<String>,
    pub fields: Vec<Param>,
    pub methods: Vec<Rc<FuncDecl>>,
    pub position: Position,
}

impl ClassDecl {
    pub fn new(name: &str, superclass: Option<&str>) -> Self {
        ClassDecl {
            name: name.to_string(),
            superclass: superclass.map(str::to_string),
            fields: vec![],
            methods: vec![],
            position: Position::null(),
        }
    }

    pub fn field(mut self, ty: Type, name: &str) -> Self {
        self.fields.push(Param::new(ty, name));
        self
    }

    pub fn method(mut self, method: FuncDecl) -> Self {
        self.methods.push(Rc::new(method));
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}
