use std::{cell::RefCell, fmt::Display};

use crate::Position;

use super::types::Type;

/// Represents the literal values that can appear in source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Nil,
}

impl Literal {
    pub fn get_type(&self) -> Type {
        match self {
            Literal::Int(_) => Type::Int,
            Literal::Float(_) => Type::Float,
            Literal::Bool(_) => Type::Bool,
            Literal::Str(_) => Type::Str,
            Literal::Nil => Type::Nil,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }

    pub fn is_relational(self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge)
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl Display for LogicalOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalOp::And => write!(f, "&&"),
            LogicalOp::Or => write!(f, "||"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

/// Expression Types
///
/// One variant per concrete node kind; both the checker and the interpreter
/// match on this tag directly.
#[derive(Debug, Clone)]
pub enum ExprKind {
    Const(Literal),
    VarRef(String),
    ArrayNew {
        element: Type,
        size: Box<Expr>,
    },
    ArrayLookup {
        name: String,
        index: Box<Expr>,
    },
    ArrayAssign {
        name: String,
        index: Box<Expr>,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    VarAssign {
        name: String,
        value: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    PreInc(Box<Expr>),
    PreDec(Box<Expr>),
    PostInc(Box<Expr>),
    PostDec(Box<Expr>),
    /// `name op= value`, where `op` is one of the arithmetic operators.
    CompoundAssign {
        op: BinaryOp,
        name: String,
        value: Box<Expr>,
    },
    /// `cast<target>(expr)`; the target is kept as written so the checker can reject unknown names.
    Cast {
        target: String,
        expr: Box<Expr>,
    },
    IntToFloat(Box<Expr>),
    Get {
        object: Box<Expr>,
        name: String,
    },
    Set {
        object: Box<Expr>,
        name: String,
        value: Box<Expr>,
    },
    This,
    /// `super.name`
    Super(String),
    Grouping(Box<Expr>),
    Printf {
        format: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Scanf {
        format: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Sprintf {
        destination: String,
        format: Box<Expr>,
        arguments: Vec<Expr>,
    },
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: Position,
    /// Filled in by the checker.
    resolved_type: RefCell<Option<Type>>,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            position: Position::null(),
            resolved_type: RefCell::new(None),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// The type the checker inferred for this expression, if it has been checked.
    pub fn resolved_type(&self) -> Option<Type> {
        self.resolved_type.borrow().clone()
    }

    pub fn set_resolved_type(&self, ty: Type) {
        *self.resolved_type.borrow_mut() = Some(ty);
    }

    /// Whether this expression is one of the increment/decrement forms.
    pub fn is_step(&self) -> bool {
        match &self.kind {
            ExprKind::PreInc(_) | ExprKind::PreDec(_) | ExprKind::PostInc(_) | ExprKind::PostDec(_) => true,
            ExprKind::CompoundAssign { op, .. } => matches!(op, BinaryOp::Add | BinaryOp::Sub),
            _ => false,
        }
    }

    pub fn is_assignment(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::VarAssign { .. } | ExprKind::ArrayAssign { .. } | ExprKind::CompoundAssign { .. } | ExprKind::Set { .. }
        )
    }

    // Constructors used by the parser and by tests.

    pub fn int(value: i64) -> Self {
        Expr::new(ExprKind::Const(Literal::Int(value)))
    }

    pub fn float(value: f64) -> Self {
        Expr::new(ExprKind::Const(Literal::Float(value)))
    }

    pub fn boolean(value: bool) -> Self {
        Expr::new(ExprKind::Const(Literal::Bool(value)))
    }

    pub fn string(value: &str) -> Self {
        Expr::new(ExprKind::Const(Literal::Str(value.to_string())))
    }

    pub fn nil() -> Self {
        Expr::new(ExprKind::Const(Literal::Nil))
    }

    pub fn var(name: &str) -> Self {
        Expr::new(ExprKind::VarRef(name.to_string()))
    }

    pub fn assign(name: &str, value: Expr) -> Self {
        Expr::new(ExprKind::VarAssign {
            name: name.to_string(),
            value: Box::new(value),
        })
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn logical(op: LogicalOp, left: Expr, right: Expr) -> Self {
        Expr::new(ExprKind::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// A call to a named function, builtin or class.
    pub fn call(name: &str, arguments: Vec<Expr>) -> Self {
        Expr::call_expr(Expr::var(name), arguments)
    }

    pub fn call_expr(callee: Expr, arguments: Vec<Expr>) -> Self {
        let position = callee.position.clone();
        Expr::new(ExprKind::Call {
            callee: Box::new(callee),
            arguments,
        })
        .at(position)
    }

    pub fn new_array(element: Type, size: Expr) -> Self {
        Expr::new(ExprKind::ArrayNew {
            element,
            size: Box::new(size),
        })
    }

    pub fn index(name: &str, index: Expr) -> Self {
        Expr::new(ExprKind::ArrayLookup {
            name: name.to_string(),
            index: Box::new(index),
        })
    }

    pub fn index_assign(name: &str, index: Expr, value: Expr) -> Self {
        Expr::new(ExprKind::ArrayAssign {
            name: name.to_string(),
            index: Box::new(index),
            value: Box::new(value),
        })
    }

    pub fn pre_inc(target: Expr) -> Self {
        Expr::new(ExprKind::PreInc(Box::new(target)))
    }

    pub fn pre_dec(target: Expr) -> Self {
        Expr::new(ExprKind::PreDec(Box::new(target)))
    }

    pub fn post_inc(target: Expr) -> Self {
        Expr::new(ExprKind::PostInc(Box::new(target)))
    }

    pub fn post_dec(target: Expr) -> Self {
        Expr::new(ExprKind::PostDec(Box::new(target)))
    }

    pub fn compound_assign(op: BinaryOp, name: &str, value: Expr) -> Self {
        Expr::new(ExprKind::CompoundAssign {
            op,
            name: name.to_string(),
            value: Box::new(value),
        })
    }

    pub fn cast(target: &str, expr: Expr) -> Self {
        Expr::new(ExprKind::Cast {
            target: target.to_string(),
            expr: Box::new(expr),
        })
    }

    pub fn int_to_float(expr: Expr) -> Self {
        Expr::new(ExprKind::IntToFloat(Box::new(expr)))
    }

    pub fn get(object: Expr, name: &str) -> Self {
        Expr::new(ExprKind::Get {
            object: Box::new(object),
            name: name.to_string(),
        })
    }

    pub fn set(object: Expr, name: &str, value: Expr) -> Self {
        Expr::new(ExprKind::Set {
            object: Box::new(object),
            name: name.to_string(),
            value: Box::new(value),
        })
    }

    pub fn this() -> Self {
        Expr::new(ExprKind::This)
    }

    pub fn super_method(name: &str) -> Self {
        Expr::new(ExprKind::Super(name.to_string()))
    }

    pub fn group(expr: Expr) -> Self {
        Expr::new(ExprKind::Grouping(Box::new(expr)))
    }

    pub fn printf(format: &str, arguments: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Printf {
            format: Box::new(Expr::string(format)),
            arguments,
        })
    }

    pub fn scanf(format: &str, arguments: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Scanf {
            format: Box::new(Expr::string(format)),
            arguments,
        })
    }

    pub fn sprintf(destination: &str, format: &str, arguments: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Sprintf {
            destination: destination.to_string(),
            format: Box::new(Expr::string(format)),
            arguments,
        })
    }
}
