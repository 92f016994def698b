use std::{cell::RefCell, cmp::Ordering, rc::Rc};

use crate::{
    ast::{
        expressions::{BinaryOp, Expr, ExprKind, Literal, LogicalOp, UnaryOp},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
    stack::ensure_sufficient_stack,
    Position, MK_RUNTIME_ERROR,
};

use super::{
    format::{format, specifiers},
    interpreter::Interpreter,
    value::{ArrayValue, Callable, Instance, Value},
};

pub fn evaluate_expr(interpreter: &mut Interpreter, expr: &Expr) -> Result<Value, Error> {
    ensure_sufficient_stack(|| evaluate(interpreter, expr))
}

fn evaluate(interpreter: &mut Interpreter, expr: &Expr) -> Result<Value, Error> {
    let position = &expr.position;
    let at = |error: ErrorImpl| Error::new(error, position.clone());

    match &expr.kind {
        ExprKind::Const(literal) => Ok(match literal {
            Literal::Int(value) => Value::Int(*value),
            Literal::Float(value) => Value::Float(*value),
            Literal::Bool(value) => Value::Bool(*value),
            Literal::Str(value) => Value::Str(value.clone()),
            Literal::Nil => Value::Nil,
        }),
        ExprKind::VarRef(name) => interpreter.lookup(name, position),
        ExprKind::Grouping(inner) => evaluate_expr(interpreter, inner),
        ExprKind::ArrayNew { element, size } => {
            let size = expect_int(evaluate_expr(interpreter, size)?, position)?;
            let length = usize::try_from(size).map_err(|_| at(ErrorImpl::IndexOutOfBounds { index: size, length: 0 }))?;
            Value::new_array(element.clone(), length).map_err(at)
        }
        ExprKind::ArrayLookup { name, index } => {
            let array = lookup_array(interpreter, name, position)?;
            let index = expect_int(evaluate_expr(interpreter, index)?, position)?;
            let value = array.borrow().get(index).map_err(at)?;
            Ok(value)
        }
        ExprKind::ArrayAssign { name, index, value } => {
            let array = lookup_array(interpreter, name, position)?;
            let index = expect_int(evaluate_expr(interpreter, index)?, position)?;
            let value = evaluate_expr(interpreter, value)?;
            array.borrow_mut().set(index, value.clone()).map_err(at)?;
            Ok(value)
        }
        ExprKind::VarAssign { name, value } => {
            let value = evaluate_expr(interpreter, value)?;
            interpreter.assign(name, value.clone(), position)?;
            Ok(value)
        }
        ExprKind::CompoundAssign { op, name, value } => {
            let current = interpreter.lookup(name, position)?;
            let operand = evaluate_expr(interpreter, value)?;
            let result = binary_op(*op, current, operand).map_err(at)?;
            interpreter.assign(name, result.clone(), position)?;
            Ok(result)
        }
        ExprKind::Binary { op, left, right } => {
            let left = evaluate_expr(interpreter, left)?;
            let right = evaluate_expr(interpreter, right)?;
            binary_op(*op, left, right).map_err(at)
        }
        ExprKind::Logical { op, left, right } => {
            let left = evaluate_expr(interpreter, left)?;
            // The operand that decides the outcome is the result.
            match (op, left.is_truthy()) {
                (LogicalOp::Or, true) | (LogicalOp::And, false) => Ok(left),
                _ => evaluate_expr(interpreter, right),
            }
        }
        ExprKind::Unary { op, operand } => {
            let operand = evaluate_expr(interpreter, operand)?;
            match (op, operand) {
                (UnaryOp::Not, operand) => Ok(Value::Bool(!operand.is_truthy())),
                (UnaryOp::Neg, Value::Int(value)) => Ok(Value::Int(value.wrapping_neg())),
                (UnaryOp::Neg, Value::Float(value)) => Ok(Value::Float(-value)),
                (UnaryOp::Plus, operand @ (Value::Int(_) | Value::Float(_))) => Ok(operand),
                (op, operand) => Err(at(ErrorImpl::InternalError {
                    reason: format!("unsupported operand for unary {}: {}", op, operand.type_name()),
                })),
            }
        }
        ExprKind::PreInc(target) => step(interpreter, target, 1, true),
        ExprKind::PreDec(target) => step(interpreter, target, -1, true),
        ExprKind::PostInc(target) => step(interpreter, target, 1, false),
        ExprKind::PostDec(target) => step(interpreter, target, -1, false),
        ExprKind::Cast { target, expr: inner } => {
            let value = evaluate_expr(interpreter, inner)?;
            cast(target, value).map_err(at)
        }
        ExprKind::IntToFloat(inner) => match evaluate_expr(interpreter, inner)? {
            Value::Int(value) => Ok(Value::Float(value as f64)),
            other => Ok(other),
        },
        ExprKind::Get { object, name } => {
            let instance = expect_instance(evaluate_expr(interpreter, object)?, position)?;
            instance.get(name).map_err(at)
        }
        ExprKind::Set { object, name, value } => {
            let instance = expect_instance(evaluate_expr(interpreter, object)?, position)?;
            let value = evaluate_expr(interpreter, value)?;
            instance.set(name, value.clone());
            Ok(value)
        }
        ExprKind::This => interpreter.lookup("this", position),
        ExprKind::Super(name) => {
            let superclass = match interpreter.lookup("super", position)? {
                Value::Class(superclass) => superclass,
                other => {
                    return Err(at(ErrorImpl::InternalError {
                        reason: format!("`super` is bound to a {}", other.type_name()),
                    }))
                }
            };
            let this = expect_instance(interpreter.lookup("this", position)?, position)?;
            let method = superclass.find_method(name).ok_or_else(|| {
                at(ErrorImpl::UndefinedProperty {
                    property: name.clone(),
                })
            })?;
            Ok(Value::Function(Callable::User(method.bind(&this).map_err(at)?)))
        }
        ExprKind::Call { callee, arguments } => {
            let callee = evaluate_expr(interpreter, callee)?;
            let arguments = arguments
                .iter()
                .map(|argument| evaluate_expr(interpreter, argument))
                .collect::<Result<Vec<_>, _>>()?;
            interpreter.call_value(callee, arguments, position)
        }
        ExprKind::Printf { format, arguments } => {
            let text = format_arguments(interpreter, format, arguments)?;
            interpreter.output.print(&text);
            Ok(Value::Nil)
        }
        ExprKind::Sprintf {
            destination,
            format,
            arguments,
        } => {
            let text = format_arguments(interpreter, format, arguments)?;
            interpreter.assign(destination, Value::Str(text), position)?;
            Ok(Value::Nil)
        }
        ExprKind::Scanf { format, arguments } => {
            let format = expect_string(evaluate_expr(interpreter, format)?, position)?;
            let specifiers = specifiers(&format);
            if specifiers.len() != arguments.len() {
                return Err(at(ErrorImpl::MalformedFormatString {
                    reason: format!("{} specifiers but {} arguments", specifiers.len(), arguments.len()),
                }));
            }

            for (specifier, target) in specifiers.into_iter().zip(arguments) {
                let token = interpreter.input.read_token().ok_or_else(|| {
                    at(ErrorImpl::BuiltinCallFailure {
                        builtin: String::from("scanf"),
                        reason: String::from("input stream is exhausted"),
                    })
                })?;
                let value = specifier.parse(&token).ok_or_else(|| {
                    at(ErrorImpl::BuiltinCallFailure {
                        builtin: String::from("scanf"),
                        reason: format!("cannot read {:?} as {}", token, specifier.expected_type()),
                    })
                })?;
                store(interpreter, target, value)?;
            }
            Ok(Value::Nil)
        }
    }
}

fn format_arguments(interpreter: &mut Interpreter, format_expr: &Expr, arguments: &[Expr]) -> Result<String, Error> {
    let template = expect_string(evaluate_expr(interpreter, format_expr)?, &format_expr.position)?;
    let values = arguments
        .iter()
        .map(|argument| evaluate_expr(interpreter, argument))
        .collect::<Result<Vec<_>, _>>()?;
    format(&template, &values).map_err(|error| Error::new(error, format_expr.position.clone()))
}

/// An assignable location, resolved once so reading and writing it never
/// re-evaluates the index or object expression.
enum Place {
    Var(String),
    Element(Rc<RefCell<ArrayValue>>, i64),
    Field(Rc<Instance>, String),
}

fn resolve_place(interpreter: &mut Interpreter, target: &Expr) -> Result<Place, Error> {
    let position = &target.position;
    match &target.kind {
        ExprKind::VarRef(name) => Ok(Place::Var(name.clone())),
        ExprKind::ArrayLookup { name, index } => {
            let array = lookup_array(interpreter, name, position)?;
            let index = expect_int(evaluate_expr(interpreter, index)?, position)?;
            Ok(Place::Element(array, index))
        }
        ExprKind::Get { object, name } => {
            let instance = expect_instance(evaluate_expr(interpreter, object)?, position)?;
            Ok(Place::Field(instance, name.clone()))
        }
        _ => Err(MK_RUNTIME_ERROR!(
            InternalError {
                reason: String::from("assignment to an expression that is not a variable, element or field")
            },
            position
        )),
    }
}

fn read_place(interpreter: &Interpreter, place: &Place, position: &Position) -> Result<Value, Error> {
    let value = match place {
        Place::Var(name) => return interpreter.lookup(name, position),
        Place::Element(array, index) => array.borrow().get(*index),
        Place::Field(instance, name) => instance.get(name),
    };
    value.map_err(|error| Error::new(error, position.clone()))
}

fn write_place(interpreter: &Interpreter, place: Place, value: Value, position: &Position) -> Result<(), Error> {
    match place {
        Place::Var(name) => interpreter.assign(&name, value, position),
        Place::Element(array, index) => {
            let result = array.borrow_mut().set(index, value);
            result.map_err(|error| Error::new(error, position.clone()))
        }
        Place::Field(instance, name) => {
            instance.set(&name, value);
            Ok(())
        }
    }
}

/// Applies `++`/`--` to an assignable target and returns the new value
/// (prefix) or the old one (postfix).
fn step(interpreter: &mut Interpreter, target: &Expr, delta: i64, prefix: bool) -> Result<Value, Error> {
    let place = resolve_place(interpreter, target)?;
    let old = read_place(interpreter, &place, &target.position)?;
    let new = match &old {
        Value::Int(value) => Value::Int(value.wrapping_add(delta)),
        Value::Float(value) => Value::Float(value + delta as f64),
        other => {
            return Err(MK_RUNTIME_ERROR!(
                InternalError {
                    reason: format!("cannot step a value of type {}", other.type_name())
                },
                &target.position
            ))
        }
    };
    write_place(interpreter, place, new.clone(), &target.position)?;
    Ok(if prefix { new } else { old })
}

/// Writes `value` into a variable, array element or field.
fn store(interpreter: &mut Interpreter, target: &Expr, value: Value) -> Result<(), Error> {
    let place = resolve_place(interpreter, target)?;
    write_place(interpreter, place, value, &target.position)
}

pub fn binary_op(op: BinaryOp, left: Value, right: Value) -> Result<Value, ErrorImpl> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&left, &right).ok_or_else(|| unsupported(op, &left, &right))?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        _ => arithmetic(op, left, right),
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => left.as_float()?.partial_cmp(&right.as_float()?),
    }
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value, ErrorImpl> {
    match (&left, &right) {
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::Int(a), Value::Int(b)) => integer_arithmetic(op, *a, *b).map(Value::Int),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => float_arithmetic(op, a, b).map(Value::Float),
            _ => Err(unsupported(op, &left, &right)),
        },
    }
}

/// Integer division rounds toward negative infinity and `%` takes the sign
/// of the divisor, so `a == (a / b) * b + a % b` always holds.
fn integer_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<i64, ErrorImpl> {
    match op {
        BinaryOp::Add => Ok(a.wrapping_add(b)),
        BinaryOp::Sub => Ok(a.wrapping_sub(b)),
        BinaryOp::Mul => Ok(a.wrapping_mul(b)),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => Err(ErrorImpl::DivisionByZero),
        BinaryOp::Div => {
            let quotient = a.wrapping_div(b);
            let remainder = a.wrapping_rem(b);
            Ok(if remainder != 0 && (remainder < 0) != (b < 0) {
                quotient.wrapping_sub(1)
            } else {
                quotient
            })
        }
        BinaryOp::Rem => {
            let remainder = a.wrapping_rem(b);
            Ok(if remainder != 0 && (remainder < 0) != (b < 0) {
                remainder + b
            } else {
                remainder
            })
        }
        _ => Err(ErrorImpl::InternalError {
            reason: format!("{} is not an arithmetic operator", op),
        }),
    }
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> Result<f64, ErrorImpl> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Sub => Ok(a - b),
        BinaryOp::Mul => Ok(a * b),
        BinaryOp::Div | BinaryOp::Rem if b == 0.0 => Err(ErrorImpl::DivisionByZero),
        BinaryOp::Div => Ok(a / b),
        BinaryOp::Rem => Ok(a - b * (a / b).floor()),
        _ => Err(ErrorImpl::InternalError {
            reason: format!("{} is not an arithmetic operator", op),
        }),
    }
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> ErrorImpl {
    ErrorImpl::InternalError {
        reason: format!(
            "unsupported operands for {}: {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ),
    }
}

/// Converts between the primitive types.
///
/// Floats truncate toward zero when cast to int, and strings are parsed.
pub fn cast(target: &str, value: Value) -> Result<Value, ErrorImpl> {
    let parse_failure = |value: &str| ErrorImpl::BuiltinCallFailure {
        builtin: target.to_string(),
        reason: format!("cannot convert {:?} to {}", value, target),
    };

    match (Type::from_name(target), value) {
        (Some(Type::Int), Value::Int(value)) => Ok(Value::Int(value)),
        (Some(Type::Int), Value::Float(value)) => Ok(Value::Int(value.trunc() as i64)),
        (Some(Type::Int), Value::Bool(value)) => Ok(Value::Int(value as i64)),
        (Some(Type::Int), Value::Str(value)) => value
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| parse_failure(&value)),
        (Some(Type::Float), Value::Int(value)) => Ok(Value::Float(value as f64)),
        (Some(Type::Float), Value::Float(value)) => Ok(Value::Float(value)),
        (Some(Type::Float), Value::Bool(value)) => Ok(Value::Float(if value { 1.0 } else { 0.0 })),
        (Some(Type::Float), Value::Str(value)) => value
            .trim()
            .parse()
            .map(Value::Float)
            .map_err(|_| parse_failure(&value)),
        (Some(Type::Bool), Value::Int(value)) => Ok(Value::Bool(value != 0)),
        (Some(Type::Bool), Value::Float(value)) => Ok(Value::Bool(value != 0.0)),
        (Some(Type::Bool), Value::Bool(value)) => Ok(Value::Bool(value)),
        (Some(Type::Bool), Value::Str(value)) => Ok(Value::Bool(!value.is_empty())),
        (Some(Type::Str), value @ (Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::Str(_))) => {
            Ok(Value::Str(value.to_string()))
        }
        (_, value) => Err(ErrorImpl::InternalError {
            reason: format!("cannot cast {} to {}", value.type_name(), target),
        }),
    }
}

fn lookup_array(interpreter: &Interpreter, name: &str, position: &Position) -> Result<Rc<RefCell<ArrayValue>>, Error> {
    match interpreter.lookup(name, position)? {
        Value::Array(array) => Ok(array),
        other => Err(MK_RUNTIME_ERROR!(
            InternalError {
                reason: format!("{:?} holds a {}, not an array", name, other.type_name())
            },
            position
        )),
    }
}

fn expect_int(value: Value, position: &Position) -> Result<i64, Error> {
    match value {
        Value::Int(value) => Ok(value),
        other => Err(MK_RUNTIME_ERROR!(
            InternalError {
                reason: format!("expected an int, found {}", other.type_name())
            },
            position
        )),
    }
}

fn expect_string(value: Value, position: &Position) -> Result<String, Error> {
    match value {
        Value::Str(value) => Ok(value),
        other => Err(MK_RUNTIME_ERROR!(
            InternalError {
                reason: format!("expected a string, found {}", other.type_name())
            },
            position
        )),
    }
}

fn expect_instance(value: Value, position: &Position) -> Result<Rc<Instance>, Error> {
    match value {
        Value::Instance(instance) => Ok(instance),
        other => Err(MK_RUNTIME_ERROR!(
            NotAnInstance {
                value: other.to_string()
            },
            position
        )),
    }
}
