use crate::{
    ast::{
        expressions::Expr,
        statements::{Compound, ForInit, Stmt, StmtKind},
    },
    errors::errors::Error,
    stack::ensure_sufficient_stack,
};

use super::{
    expr::evaluate_expr,
    interpreter::{execute_var_decl, Interpreter},
    value::Value,
};

/// How a statement finished.
///
/// Function calls consume `Return`; loops consume `Break` and `Continue`.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

pub fn execute_stmt(interpreter: &mut Interpreter, stmt: &Stmt) -> Result<Flow, Error> {
    ensure_sufficient_stack(|| match &stmt.kind {
        StmtKind::Compound(compound) => {
            interpreter.push_scope();
            let flow = execute_compound_body(interpreter, compound);
            interpreter.pop_scope(&stmt.position)?;
            flow
        }
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            if evaluate_expr(interpreter, condition)?.is_truthy() {
                execute_stmt(interpreter, then_body)
            } else if let Some(else_body) = else_body {
                execute_stmt(interpreter, else_body)
            } else {
                Ok(Flow::Normal)
            }
        }
        StmtKind::While { condition, body } => {
            while evaluate_expr(interpreter, condition)?.is_truthy() {
                match execute_stmt(interpreter, body)? {
                    Flow::Break => break,
                    Flow::Return(value) => return Ok(Flow::Return(value)),
                    Flow::Normal | Flow::Continue => {}
                }
            }
            Ok(Flow::Normal)
        }
        StmtKind::For {
            init,
            condition,
            update,
            body,
        } => {
            interpreter.push_scope();
            let flow = execute_for(interpreter, init, condition, update, body);
            interpreter.pop_scope(&stmt.position)?;
            flow
        }
        StmtKind::Return(value) => {
            let value = match value {
                Some(value) => evaluate_expr(interpreter, value)?,
                None => Value::Nil,
            };
            Ok(Flow::Return(value))
        }
        StmtKind::Break => Ok(Flow::Break),
        StmtKind::Continue => Ok(Flow::Continue),
        StmtKind::Expr(expr) => {
            evaluate_expr(interpreter, expr)?;
            Ok(Flow::Normal)
        }
        StmtKind::Null => Ok(Flow::Normal),
    })
}

/// Runs a block's declarations and statements in the current scope, stopping
/// at the first statement that does not finish normally.
pub fn execute_compound_body(interpreter: &mut Interpreter, compound: &Compound) -> Result<Flow, Error> {
    for var in &compound.decls {
        execute_var_decl(interpreter, var)?;
    }

    for stmt in compound.iter() {
        let flow = execute_stmt(interpreter, stmt)?;
        if flow != Flow::Normal {
            return Ok(flow);
        }
    }

    Ok(Flow::Normal)
}

fn execute_for(
    interpreter: &mut Interpreter,
    init: &ForInit,
    condition: &Expr,
    update: &Expr,
    body: &Stmt,
) -> Result<Flow, Error> {
    match init {
        ForInit::Decl(var) => execute_var_decl(interpreter, var)?,
        ForInit::Expr(expr) => {
            evaluate_expr(interpreter, expr)?;
        }
    }

    while evaluate_expr(interpreter, condition)?.is_truthy() {
        match execute_stmt(interpreter, body)? {
            Flow::Break => break,
            Flow::Return(value) => return Ok(Flow::Return(value)),
            // `continue` still runs the update clause.
            Flow::Normal | Flow::Continue => {}
        }
        evaluate_expr(interpreter, update)?;
    }

    Ok(Flow::Normal)
}
