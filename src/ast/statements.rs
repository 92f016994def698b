use std::slice::Iter;

use crate::Position;

use super::{ast::VarDecl, expressions::Expr};

/// A block: local declarations first, then statements.
#[derive(Debug, Clone, Default)]
pub struct Compound {
    pub decls: Vec<VarDecl>,
    pub stmts: Vec<Stmt>,
}

impl Compound {
    pub fn new(decls: Vec<VarDecl>, stmts: Vec<Stmt>) -> Self {
        Compound { decls, stmts }
    }

    pub fn iter(&self) -> Iter<'_, Stmt> {
        self.stmts.iter()
    }
}

#[derive(Debug, Clone)]
pub enum ForInit {
    Decl(VarDecl),
    Expr(Expr),
}

/// Statement Types
#[derive(Debug, Clone)]
pub enum StmtKind {
    Compound(Compound),
    If {
        condition: Expr,
        then_body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    For {
        init: ForInit,
        condition: Expr,
        update: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Expr(Expr),
    Null,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub position: Position,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Stmt {
            kind,
            position: Position::null(),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn block(decls: Vec<VarDecl>, stmts: Vec<Stmt>) -> Self {
        Stmt::new(StmtKind::Compound(Compound::new(decls, stmts)))
    }

    pub fn if_else(condition: Expr, then_body: Stmt, else_body: Option<Stmt>) -> Self {
        Stmt::new(StmtKind::If {
            condition,
            then_body: Box::new(then_body),
            else_body: else_body.map(Box::new),
        })
    }

    pub fn while_loop(condition: Expr, body: Stmt) -> Self {
        Stmt::new(StmtKind::While {
            condition,
            body: Box::new(body),
        })
    }

    pub fn for_loop(init: ForInit, condition: Expr, update: Expr, body: Stmt) -> Self {
        Stmt::new(StmtKind::For {
            init,
            condition,
            update,
            body: Box::new(body),
        })
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Stmt::new(StmtKind::Return(value))
    }

    pub fn brk() -> Self {
        Stmt::new(StmtKind::Break)
    }

    pub fn cont() -> Self {
        Stmt::new(StmtKind::Continue)
    }

    pub fn expr(expression: Expr) -> Self {
        let position = expression.position.clone();
        Stmt::new(StmtKind::Expr(expression)).at(position)
    }

    pub fn null() -> Self {
        Stmt::new(StmtKind::Null)
    }
}
