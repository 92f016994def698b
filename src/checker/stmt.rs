use crate::{
    ast::{
        expressions::Expr,
        statements::{Compound, ForInit, Stmt, StmtKind},
        types::Type,
    },
    errors::errors::ErrorImpl,
    stack::ensure_sufficient_stack,
};

use super::{
    checker::{check_var_decl, Checker},
    expr::{check_condition, check_expr},
};

pub fn check_stmt(checker: &mut Checker, stmt: &Stmt) {
    ensure_sufficient_stack(|| match &stmt.kind {
        StmtKind::Compound(compound) => {
            checker.push_scope();
            check_compound_body(checker, compound);
            checker.pop_scope(&stmt.position);
        }
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            check_condition(checker, condition);
            check_stmt(checker, then_body);
            if let Some(else_body) = else_body {
                check_stmt(checker, else_body);
            }
        }
        StmtKind::While { condition, body } => {
            check_condition(checker, condition);
            check_loop_body(checker, body);
        }
        StmtKind::For {
            init,
            condition,
            update,
            body,
        } => {
            checker.push_scope();

            match init {
                ForInit::Decl(var) => check_var_decl(checker, var),
                ForInit::Expr(expr) => {
                    if !expr.is_assignment() {
                        checker.report(
                            ErrorImpl::TypeMismatch {
                                expected: String::from("an assignment or declaration"),
                                received: String::from("an expression"),
                            },
                            &expr.position,
                        );
                    }
                    check_expr(checker, expr);
                }
            }

            check_condition(checker, condition);

            if !update.is_step() {
                checker.report(
                    ErrorImpl::TypeMismatch {
                        expected: String::from("an increment or decrement"),
                        received: String::from("an expression"),
                    },
                    &update.position,
                );
            }
            check_expr(checker, update);

            check_loop_body(checker, body);
            checker.pop_scope(&stmt.position);
        }
        StmtKind::Return(value) => check_return(checker, value.as_ref(), stmt),
        StmtKind::Break | StmtKind::Continue => {
            if !checker.in_loop {
                let statement = if matches!(stmt.kind, StmtKind::Break) { "break" } else { "continue" };
                checker.report(
                    ErrorImpl::IllegalBreakOrContinue {
                        statement: statement.to_string(),
                    },
                    &stmt.position,
                );
            }
        }
        StmtKind::Expr(expr) => {
            check_expr(checker, expr);
        }
        StmtKind::Null => {}
    })
}

/// Checks a block's declarations and statements in the current scope.
pub fn check_compound_body(checker: &mut Checker, compound: &Compound) {
    for var in &compound.decls {
        check_var_decl(checker, var);
    }
    for stmt in compound.iter() {
        check_stmt(checker, stmt);
    }
}

fn check_loop_body(checker: &mut Checker, body: &Stmt) {
    let in_loop = std::mem::replace(&mut checker.in_loop, true);
    check_stmt(checker, body);
    checker.in_loop = in_loop;
}

fn check_return(checker: &mut Checker, value: Option<&Expr>, stmt: &Stmt) {
    let received = value.map(|value| check_expr(checker, value));

    let Some(function) = checker.function.clone() else {
        checker.report(
            ErrorImpl::IllegalReturn {
                reason: String::from("return outside of a function"),
            },
            &stmt.position,
        );
        return;
    };

    match (&function.return_type, received) {
        (Type::Void, Some(_)) => checker.report(
            ErrorImpl::IllegalReturn {
                reason: format!("void function {:?} cannot return a value", function.name),
            },
            &stmt.position,
        ),
        (Type::Void, None) => {}
        (expected, None) => checker.report(
            ErrorImpl::TypeMismatch {
                expected: expected.to_string(),
                received: Type::Void.to_string(),
            },
            &stmt.position,
        ),
        (expected, Some(received)) => checker.expect_assignable(expected, &received, &stmt.position),
    }
}

/// Whether every path through `stmt` ends in a `return`.
///
/// Loops never count, since their body may not run.
pub fn always_returns(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) => true,
        StmtKind::Compound(compound) => compound.iter().any(always_returns),
        StmtKind::If {
            then_body,
            else_body: Some(else_body),
            ..
        } => always_returns(then_body) && always_returns(else_body),
        _ => false,
    }
}
