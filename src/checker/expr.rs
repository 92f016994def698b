use std::rc::Rc;

use crate::{
    ast::{
        expressions::{BinaryOp, Expr, ExprKind, Literal, UnaryOp},
        types::Type,
    },
    errors::errors::ErrorImpl,
    interpreter::format::specifiers,
    stack::ensure_sufficient_stack,
    Position,
};

use super::checker::{Checker, ClassInfo, FunctionSig, Symbol};

/// Resolves the type of `expr`, records it on the node and reports any violation.
///
/// After a reported violation the expression resolves to `Type::Any` so one
/// mistake does not cascade into more reports.
pub fn check_expr(checker: &mut Checker, expr: &Expr) -> Type {
    let ty = ensure_sufficient_stack(|| resolve_expr(checker, expr));
    expr.set_resolved_type(ty.clone());
    ty
}

/// Conditions must be boolean.
pub fn check_condition(checker: &mut Checker, condition: &Expr) {
    let ty = check_expr(checker, condition);
    if ty != Type::Bool && !ty.is_any() {
        checker.report(
            ErrorImpl::TypeMismatch {
                expected: Type::Bool.to_string(),
                received: ty.to_string(),
            },
            &condition.position,
        );
    }
}

fn resolve_expr(checker: &mut Checker, expr: &Expr) -> Type {
    let position = &expr.position;

    match &expr.kind {
        ExprKind::Const(literal) => literal.get_type(),
        ExprKind::VarRef(name) => checker
            .lookup(name, position)
            .map_or(Type::Any, |symbol| symbol.get_type()),
        ExprKind::Grouping(inner) => check_expr(checker, inner),
        ExprKind::ArrayNew { element, size } => {
            if *element == Type::Void {
                checker.report(
                    ErrorImpl::TypeMismatch {
                        expected: String::from("an element type"),
                        received: element.to_string(),
                    },
                    position,
                );
            }
            checker.resolve_type(element, position);
            check_index(checker, size);
            Type::Array(Box::new(element.clone()))
        }
        ExprKind::ArrayLookup { name, index } => {
            let element = array_element(checker, name, position);
            check_index(checker, index);
            element
        }
        ExprKind::ArrayAssign { name, index, value } => {
            let element = array_element(checker, name, position);
            check_index(checker, index);
            let value_type = check_expr(checker, value);
            checker.expect_assignable(&element, &value_type, &value.position);
            element
        }
        ExprKind::VarAssign { name, value } => {
            let target = assignable_variable(checker, name, position);
            let value_type = check_expr(checker, value);
            match target {
                Some(target) => {
                    checker.expect_assignable(&target, &value_type, &value.position);
                    target
                }
                None => Type::Any,
            }
        }
        ExprKind::CompoundAssign { op, name, value } => {
            let target = assignable_variable(checker, name, position);
            let value_type = check_expr(checker, value);
            let Some(target) = target else {
                return Type::Any;
            };
            if let Some(result) = binary_result(checker, *op, &target, &value_type, position) {
                checker.expect_assignable(&target, &result, position);
            }
            target
        }
        ExprKind::Binary { op, left, right } => {
            let left = check_expr(checker, left);
            let right = check_expr(checker, right);
            binary_result(checker, *op, &left, &right, position).unwrap_or(Type::Any)
        }
        ExprKind::Logical { op, left, right } => {
            let left = check_expr(checker, left);
            let right = check_expr(checker, right);
            let is_boolean = |ty: &Type| *ty == Type::Bool || ty.is_any();
            if !is_boolean(&left) || !is_boolean(&right) {
                checker.report(
                    ErrorImpl::UnsupportedOperation {
                        operator: op.to_string(),
                        operands: format!("{} and {}", left, right),
                    },
                    position,
                );
            }
            Type::Bool
        }
        ExprKind::Unary { op, operand } => {
            let operand = check_expr(checker, operand);
            match op {
                UnaryOp::Not => Type::Bool,
                UnaryOp::Neg | UnaryOp::Plus if operand.is_numeric() => operand,
                UnaryOp::Neg | UnaryOp::Plus => {
                    checker.report(
                        ErrorImpl::UnsupportedOperation {
                            operator: op.to_string(),
                            operands: operand.to_string(),
                        },
                        position,
                    );
                    Type::Any
                }
            }
        }
        ExprKind::PreInc(target) | ExprKind::PostInc(target) => check_step(checker, "++", target),
        ExprKind::PreDec(target) | ExprKind::PostDec(target) => check_step(checker, "--", target),
        ExprKind::Cast { target, expr: inner } => check_cast(checker, target, inner, position),
        ExprKind::IntToFloat(inner) => {
            let ty = check_expr(checker, inner);
            if ty != Type::Int && !ty.is_any() {
                checker.report(
                    ErrorImpl::TypeMismatch {
                        expected: Type::Int.to_string(),
                        received: ty.to_string(),
                    },
                    &inner.position,
                );
            }
            Type::Float
        }
        ExprKind::Get { object, name } => {
            let Some(class) = object_class(checker, object) else {
                return Type::Any;
            };
            if let Some(ty) = class.find_field(name) {
                ty
            } else if class.find_method(name).is_some() {
                Type::Function
            } else {
                Type::Any
            }
        }
        ExprKind::Set { object, name, value } => {
            let class = object_class(checker, object);
            let value_type = check_expr(checker, value);
            if let Some(field) = class.and_then(|class| class.find_field(name)) {
                checker.expect_assignable(&field, &value_type, &value.position);
            }
            value_type
        }
        ExprKind::This => checker
            .lookup("this", position)
            .map_or(Type::Any, |symbol| symbol.get_type()),
        ExprKind::Super(name) => match super_method(checker, name, position) {
            Some(_) => Type::Function,
            None => Type::Any,
        },
        ExprKind::Call { callee, arguments } => check_call(checker, callee, arguments, position),
        ExprKind::Printf { format, arguments } => {
            check_format(checker, format, arguments);
            Type::Void
        }
        ExprKind::Scanf { format, arguments } => {
            for argument in arguments {
                if !matches!(argument.kind, ExprKind::VarRef(_) | ExprKind::ArrayLookup { .. }) {
                    checker.report(
                        ErrorImpl::TypeMismatch {
                            expected: String::from("a variable or array element"),
                            received: String::from("an expression"),
                        },
                        &argument.position,
                    );
                }
            }
            check_format(checker, format, arguments);
            Type::Void
        }
        ExprKind::Sprintf {
            destination,
            format,
            arguments,
        } => {
            if let Some(target) = assignable_variable(checker, destination, position) {
                if target != Type::Str && !target.is_any() {
                    checker.report(
                        ErrorImpl::TypeMismatch {
                            expected: Type::Str.to_string(),
                            received: target.to_string(),
                        },
                        position,
                    );
                }
            }
            check_format(checker, format, arguments);
            Type::Void
        }
    }
}

/// The result type of `left op right`, or `None` after reporting an
/// unsupported combination.
fn binary_result(checker: &mut Checker, op: BinaryOp, left: &Type, right: &Type, position: &Position) -> Option<Type> {
    if left.is_any() || right.is_any() {
        return Some(match op {
            _ if !op.is_arithmetic() => Type::Bool,
            _ if left.is_any() => right.clone(),
            _ => left.clone(),
        });
    }

    let result = match op {
        BinaryOp::Add if *left == Type::Str && *right == Type::Str => Some(Type::Str),
        _ if op.is_arithmetic() && left.is_numeric() && left == right => Some(left.clone()),
        _ if op.is_relational() && left.is_numeric() && left == right => Some(Type::Bool),
        _ if op.is_equality() && (left == right || *left == Type::Nil || *right == Type::Nil) => Some(Type::Bool),
        _ => None,
    };

    if result.is_none() {
        checker.report(
            ErrorImpl::UnsupportedOperation {
                operator: op.to_string(),
                operands: format!("{} and {}", left, right),
            },
            position,
        );
    }
    result
}

fn check_index(checker: &mut Checker, index: &Expr) {
    let ty = check_expr(checker, index);
    if ty != Type::Int && !ty.is_any() {
        checker.report(
            ErrorImpl::IndexTypeError {
                received: ty.to_string(),
            },
            &index.position,
        );
    }
}

/// The element type of the array variable `name`.
fn array_element(checker: &mut Checker, name: &str, position: &Position) -> Type {
    let Some(symbol) = checker.lookup(name, position) else {
        return Type::Any;
    };
    match symbol.get_type() {
        Type::Array(element) => *element,
        Type::Any => Type::Any,
        other => {
            checker.report(
                ErrorImpl::TypeMismatch {
                    expected: String::from("array"),
                    received: other.to_string(),
                },
                position,
            );
            Type::Any
        }
    }
}

/// The declared type of `name` if it is a variable that may be assigned to.
fn assignable_variable(checker: &mut Checker, name: &str, position: &Position) -> Option<Type> {
    match checker.lookup(name, position)? {
        Symbol::Var(ty) => Some(ty),
        Symbol::Const(_) => {
            checker.report(ErrorImpl::AssignToConstant { symbol: name.to_string() }, position);
            None
        }
        other => {
            checker.report(
                ErrorImpl::TypeMismatch {
                    expected: String::from("variable"),
                    received: other.describe(),
                },
                position,
            );
            None
        }
    }
}

fn check_step(checker: &mut Checker, operator: &str, target: &Expr) -> Type {
    let ty = match &target.kind {
        ExprKind::VarRef(name) => {
            let ty = assignable_variable(checker, name, &target.position).unwrap_or(Type::Any);
            target.set_resolved_type(ty.clone());
            ty
        }
        ExprKind::ArrayLookup { .. } | ExprKind::Get { .. } => check_expr(checker, target),
        _ => {
            check_expr(checker, target);
            checker.report(
                ErrorImpl::UnsupportedOperation {
                    operator: operator.to_string(),
                    operands: String::from("a value that cannot be assigned to"),
                },
                &target.position,
            );
            return Type::Any;
        }
    };

    if !ty.is_numeric() {
        checker.report(
            ErrorImpl::UnsupportedOperation {
                operator: operator.to_string(),
                operands: ty.to_string(),
            },
            &target.position,
        );
        return Type::Any;
    }
    ty
}

fn check_cast(checker: &mut Checker, target: &str, inner: &Expr, position: &Position) -> Type {
    let source = check_expr(checker, inner);

    let Some(target_type) = Type::from_name(target).filter(Type::is_primitive) else {
        checker.report(
            ErrorImpl::InvalidCast {
                target: target.to_string(),
                source_type: source.to_string(),
            },
            position,
        );
        return Type::Any;
    };

    if !source.is_primitive() && !source.is_any() {
        checker.report(
            ErrorImpl::InvalidCast {
                target: target.to_string(),
                source_type: source.to_string(),
            },
            position,
        );
    } else if source == target_type {
        checker.warn(ErrorImpl::RedundantCast { ty: source.to_string() }, position);
    }

    target_type
}

/// The class of an object expression, reporting a value that cannot be an instance.
fn object_class(checker: &mut Checker, object: &Expr) -> Option<Rc<ClassInfo>> {
    match check_expr(checker, object) {
        Type::Class(name) => checker.classes.get(&name).cloned(),
        Type::Any => None,
        other => {
            checker.report(
                ErrorImpl::TypeMismatch {
                    expected: String::from("class instance"),
                    received: other.to_string(),
                },
                &object.position,
            );
            None
        }
    }
}

fn super_method(checker: &mut Checker, name: &str, position: &Position) -> Option<Rc<FunctionSig>> {
    let superclass = match checker.lookup("super", position)? {
        Symbol::Class(superclass) => superclass,
        _ => return None,
    };
    let method = superclass.find_method(name);
    if method.is_none() {
        checker.report(ErrorImpl::UndefinedProperty { property: name.to_string() }, position);
    }
    method
}

fn check_call(checker: &mut Checker, callee: &Expr, arguments: &[Expr], position: &Position) -> Type {
    let argument_types: Vec<Type> = arguments.iter().map(|argument| check_expr(checker, argument)).collect();

    match &callee.kind {
        ExprKind::VarRef(name) => {
            let Some(symbol) = checker.lookup(name, &callee.position) else {
                return Type::Any;
            };
            callee.set_resolved_type(symbol.get_type());
            match symbol {
                Symbol::Function(sig) => {
                    check_arguments(checker, &sig.name, &sig.params, &argument_types, arguments, position);
                    sig.return_type.clone()
                }
                Symbol::Builtin(builtin) => {
                    check_arguments(checker, builtin.name, &builtin.params, &argument_types, arguments, position);
                    builtin.return_type.clone()
                }
                Symbol::Class(class) => {
                    let params = class.find_method("init").map(|init| init.params.clone()).unwrap_or_default();
                    check_arguments(checker, &class.name, &params, &argument_types, arguments, position);
                    Type::Class(class.name.clone())
                }
                Symbol::Var(Type::Function | Type::Any) => Type::Any,
                other => {
                    checker.report(
                        ErrorImpl::TypeMismatch {
                            expected: String::from("function"),
                            received: other.describe(),
                        },
                        position,
                    );
                    Type::Any
                }
            }
        }
        ExprKind::Get { object, name } => {
            callee.set_resolved_type(Type::Function);
            let method = object_class(checker, object).and_then(|class| class.find_method(name));
            match method {
                Some(sig) => {
                    check_arguments(checker, name, &sig.params, &argument_types, arguments, position);
                    sig.return_type.clone()
                }
                None => Type::Any,
            }
        }
        ExprKind::Super(name) => {
            callee.set_resolved_type(Type::Function);
            match super_method(checker, name, &callee.position) {
                Some(sig) => {
                    check_arguments(checker, name, &sig.params, &argument_types, arguments, position);
                    sig.return_type.clone()
                }
                None => Type::Any,
            }
        }
        _ => match check_expr(checker, callee) {
            Type::Function | Type::Any => Type::Any,
            other => {
                checker.report(
                    ErrorImpl::TypeMismatch {
                        expected: String::from("function"),
                        received: other.to_string(),
                    },
                    position,
                );
                Type::Any
            }
        },
    }
}

fn check_arguments(
    checker: &mut Checker,
    callee: &str,
    params: &[Type],
    argument_types: &[Type],
    arguments: &[Expr],
    position: &Position,
) {
    if params.len() != argument_types.len() {
        checker.report(
            ErrorImpl::ArityMismatch {
                callee: callee.to_string(),
                expected: params.len(),
                received: argument_types.len(),
            },
            position,
        );
        return;
    }

    for ((param, received), argument) in params.iter().zip(argument_types).zip(arguments) {
        checker.expect_assignable(param, received, &argument.position);
    }
}

fn check_format(checker: &mut Checker, format: &Expr, arguments: &[Expr]) {
    format.set_resolved_type(Type::Str);
    let argument_types: Vec<Type> = arguments.iter().map(|argument| check_expr(checker, argument)).collect();

    let ExprKind::Const(Literal::Str(text)) = &format.kind else {
        checker.report(
            ErrorImpl::MalformedFormatString {
                reason: String::from("the format must be a string literal"),
            },
            &format.position,
        );
        return;
    };

    let specifiers = specifiers(text);
    if specifiers.len() != arguments.len() {
        checker.report(
            ErrorImpl::MalformedFormatString {
                reason: format!(
                    "{} specifiers but {} arguments",
                    specifiers.len(),
                    arguments.len()
                ),
            },
            &format.position,
        );
        return;
    }

    for ((specifier, received), argument) in specifiers.into_iter().zip(argument_types).zip(arguments) {
        let expected = specifier.expected_type();
        if !expected.is_compatible_with(&received) {
            checker.report(
                ErrorImpl::TypeMismatch {
                    expected: expected.to_string(),
                    received: received.to_string(),
                },
                &argument.position,
            );
        }
    }
}
