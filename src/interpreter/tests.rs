//! Unit tests for evaluation.

use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::{
    ast::{
        ast::{ClassDecl, Decl, FuncDecl, Param, Program, VarDecl},
        expressions::{BinaryOp, Expr, LogicalOp},
        statements::{Compound, ForInit, Stmt},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::{
    expr::{binary_op, cast},
    format::{format, specifiers, Specifier},
    interpreter::{interpret, Interpreter, InterpreterConfig},
    io::{InputSource, OutputSink},
    value::Value,
};

fn function(return_type: Type, name: &str, params: Vec<Param>, decls: Vec<VarDecl>, stmts: Vec<Stmt>) -> Decl {
    Decl::Func(Rc::new(FuncDecl::new(
        return_type,
        name,
        params,
        Compound::new(decls, stmts),
    )))
}

fn main_fn(decls: Vec<VarDecl>, stmts: Vec<Stmt>) -> Decl {
    function(Type::Void, "main", vec![], decls, stmts)
}

fn execute_with(config: InterpreterConfig, input: &str, decls: Vec<Decl>) -> (Result<Value, Error>, String) {
    let program = Program::new(decls);
    let mut interpreter = Interpreter::with_io(config, OutputSink::buffer(), InputSource::buffer(input));
    let result = interpret(&mut interpreter, &program);
    (result, interpreter.output.get_output().to_string())
}

fn execute(decls: Vec<Decl>) -> (Result<Value, Error>, String) {
    execute_with(InterpreterConfig::default(), "", decls)
}

fn error_name(result: Result<Value, Error>) -> String {
    result.unwrap_err().get_error_name().to_string()
}

fn print(expr: Expr) -> Stmt {
    Stmt::expr(Expr::call("print", vec![expr]))
}

#[test]
fn test_integer_division_floors() {
    assert_eq!(binary_op(BinaryOp::Div, Value::Int(7), Value::Int(2)).unwrap(), Value::Int(3));
    assert_eq!(binary_op(BinaryOp::Div, Value::Int(-7), Value::Int(2)).unwrap(), Value::Int(-4));
    assert_eq!(binary_op(BinaryOp::Rem, Value::Int(-7), Value::Int(2)).unwrap(), Value::Int(1));
    assert_eq!(binary_op(BinaryOp::Rem, Value::Int(7), Value::Int(-2)).unwrap(), Value::Int(-1));
}

#[test]
fn test_float_division() {
    assert_eq!(
        binary_op(BinaryOp::Div, Value::Float(7.0), Value::Int(2)).unwrap(),
        Value::Float(3.5)
    );
}

#[test]
fn test_division_by_zero() {
    assert_eq!(
        binary_op(BinaryOp::Div, Value::Int(1), Value::Int(0)).unwrap_err(),
        ErrorImpl::DivisionByZero
    );
    assert_eq!(
        binary_op(BinaryOp::Rem, Value::Float(1.0), Value::Float(0.0)).unwrap_err(),
        ErrorImpl::DivisionByZero
    );
}

#[test]
fn test_integer_overflow_wraps() {
    assert_eq!(
        binary_op(BinaryOp::Add, Value::Int(i64::MAX), Value::Int(1)).unwrap(),
        Value::Int(i64::MIN)
    );
}

#[test]
fn test_string_operators() {
    assert_eq!(
        binary_op(BinaryOp::Add, Value::Str(String::from("ab")), Value::Str(String::from("cd"))).unwrap(),
        Value::Str(String::from("abcd"))
    );
    assert_eq!(
        binary_op(BinaryOp::Lt, Value::Str(String::from("a")), Value::Str(String::from("b"))).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_equality_with_nil() {
    assert_eq!(binary_op(BinaryOp::Eq, Value::Nil, Value::Nil).unwrap(), Value::Bool(true));
    assert_eq!(binary_op(BinaryOp::Ne, Value::Int(0), Value::Nil).unwrap(), Value::Bool(true));
}

#[test]
fn test_casts() {
    assert_eq!(cast("int", Value::Float(-2.7)).unwrap(), Value::Int(-2));
    assert_eq!(cast("float", Value::Int(3)).unwrap(), Value::Float(3.0));
    assert_eq!(cast("string", Value::Float(2.0)).unwrap(), Value::Str(String::from("2.0")));
    assert_eq!(cast("int", Value::Str(String::from(" 42 "))).unwrap(), Value::Int(42));
    assert_eq!(cast("bool", Value::Str(String::new())).unwrap(), Value::Bool(false));
    assert!(matches!(
        cast("int", Value::Str(String::from("forty"))).unwrap_err(),
        ErrorImpl::BuiltinCallFailure { .. }
    ));
}

#[test]
fn test_value_display() {
    assert_eq!(Value::Float(3.0).to_string(), "3.0");
    assert_eq!(Value::Float(0.25).to_string(), "0.25");
    assert_eq!(Value::Nil.to_string(), "nil");
    assert_eq!(Value::new_array(Type::Bool, 2).unwrap().to_string(), "[false, false]");
}

#[test]
fn test_format_substitution() {
    let text = format(
        "%s is %d, %f\\n",
        &[Value::Str(String::from("x")), Value::Int(4), Value::Float(0.5)],
    )
    .unwrap();

    assert_eq!(text, "x is 4, 0.5\n");
    assert_eq!(specifiers("%d%%s"), vec![Specifier::Int, Specifier::Str]);
}

#[test]
fn test_format_argument_count() {
    assert!(matches!(
        format("%d %d", &[Value::Int(1)]).unwrap_err(),
        ErrorImpl::MalformedFormatString { .. }
    ));
    assert!(matches!(
        format("none", &[Value::Int(1)]).unwrap_err(),
        ErrorImpl::MalformedFormatString { .. }
    ));
}

#[test]
fn test_recursion() {
    let fib = function(
        Type::Int,
        "fib",
        vec![Param::new(Type::Int, "n")],
        vec![],
        vec![
            Stmt::if_else(
                Expr::binary(BinaryOp::Lt, Expr::var("n"), Expr::int(2)),
                Stmt::ret(Some(Expr::var("n"))),
                None,
            ),
            Stmt::ret(Some(Expr::binary(
                BinaryOp::Add,
                Expr::call("fib", vec![Expr::binary(BinaryOp::Sub, Expr::var("n"), Expr::int(1))]),
                Expr::call("fib", vec![Expr::binary(BinaryOp::Sub, Expr::var("n"), Expr::int(2))]),
            ))),
        ],
    );
    let main = main_fn(
        vec![],
        vec![Stmt::expr(Expr::printf("%d\\n", vec![Expr::call("fib", vec![Expr::int(10)])]))],
    );

    let (result, output) = execute(vec![fib, main]);
    assert_eq!(result.unwrap(), Value::Nil);
    assert_eq!(output, "55\n");
}

#[test]
fn test_evaluator_alone_resolves_later_declarations() {
    // The checker rejects this order; the evaluator binds every global before `main` runs.
    let main = main_fn(vec![], vec![print(Expr::call("later", vec![]))]);
    let later = function(Type::Int, "later", vec![], vec![], vec![Stmt::ret(Some(Expr::int(9)))]);

    let (_, output) = execute(vec![main, later]);
    assert_eq!(output, "9\n");
}

#[test]
fn test_while_with_break() {
    let main = main_fn(
        vec![VarDecl::new(Type::Int, "n").with_initializer(Expr::int(0))],
        vec![
            Stmt::while_loop(
                Expr::boolean(true),
                Stmt::block(
                    vec![],
                    vec![
                        Stmt::expr(Expr::post_inc(Expr::var("n"))),
                        Stmt::if_else(
                            Expr::binary(BinaryOp::Eq, Expr::var("n"), Expr::int(3)),
                            Stmt::brk(),
                            None,
                        ),
                    ],
                ),
            ),
            print(Expr::var("n")),
        ],
    );

    let (_, output) = execute(vec![main]);
    assert_eq!(output, "3\n");
}

#[test]
fn test_for_continue_runs_update() {
    let main = main_fn(
        vec![VarDecl::new(Type::Int, "total").with_initializer(Expr::int(0))],
        vec![
            Stmt::for_loop(
                ForInit::Decl(VarDecl::new(Type::Int, "i").with_initializer(Expr::int(0))),
                Expr::binary(BinaryOp::Lt, Expr::var("i"), Expr::int(5)),
                Expr::pre_inc(Expr::var("i")),
                Stmt::block(
                    vec![],
                    vec![
                        Stmt::if_else(
                            Expr::binary(BinaryOp::Eq, Expr::var("i"), Expr::int(2)),
                            Stmt::cont(),
                            None,
                        ),
                        Stmt::expr(Expr::compound_assign(BinaryOp::Add, "total", Expr::var("i"))),
                    ],
                ),
            ),
            print(Expr::var("total")),
        ],
    );

    let (_, output) = execute(vec![main]);
    assert_eq!(output, "8\n");
}

#[test]
fn test_increment_results() {
    let main = main_fn(
        vec![VarDecl::new(Type::Int, "n").with_initializer(Expr::int(1))],
        vec![
            print(Expr::post_inc(Expr::var("n"))),
            print(Expr::pre_inc(Expr::var("n"))),
            print(Expr::pre_dec(Expr::var("n"))),
        ],
    );

    let (_, output) = execute(vec![main]);
    assert_eq!(output, "1\n3\n2\n");
}

#[test]
fn test_logical_short_circuit() {
    let noisy = function(
        Type::Bool,
        "noisy",
        vec![],
        vec![],
        vec![print(Expr::string("evaluated")), Stmt::ret(Some(Expr::boolean(true)))],
    );
    let main = main_fn(
        vec![],
        vec![
            print(Expr::logical(LogicalOp::And, Expr::boolean(false), Expr::call("noisy", vec![]))),
            print(Expr::logical(LogicalOp::Or, Expr::boolean(true), Expr::call("noisy", vec![]))),
        ],
    );

    let (_, output) = execute(vec![noisy, main]);
    assert_eq!(output, "false\ntrue\n");
}

#[test]
fn test_block_scopes_shadow_and_restore() {
    let main = main_fn(
        vec![VarDecl::new(Type::Int, "x").with_initializer(Expr::int(1))],
        vec![
            Stmt::block(
                vec![VarDecl::new(Type::Int, "x").with_initializer(Expr::int(2))],
                vec![print(Expr::var("x"))],
            ),
            print(Expr::var("x")),
        ],
    );

    let (_, output) = execute(vec![main]);
    assert_eq!(output, "2\n1\n");
}

#[test]
fn test_callee_cannot_see_caller_locals() {
    let peek = function(Type::Void, "peek", vec![], vec![], vec![print(Expr::var("secret"))]);
    let main = main_fn(
        vec![VarDecl::new(Type::Int, "secret").with_initializer(Expr::int(1))],
        vec![Stmt::expr(Expr::call("peek", vec![]))],
    );

    let (result, _) = execute(vec![peek, main]);
    assert_eq!(error_name(result), "UndefinedSymbol");
}

#[test]
fn test_globals_are_visible_in_functions() {
    let counter = Decl::Var(VarDecl::new(Type::Int, "counter").with_initializer(Expr::int(10)));
    let bump = function(
        Type::Void,
        "bump",
        vec![],
        vec![],
        vec![Stmt::expr(Expr::compound_assign(BinaryOp::Add, "counter", Expr::int(5)))],
    );
    let main = main_fn(
        vec![],
        vec![Stmt::expr(Expr::call("bump", vec![])), print(Expr::var("counter"))],
    );

    let (_, output) = execute(vec![counter, bump, main]);
    assert_eq!(output, "15\n");
}

#[test]
fn test_reading_an_uninitialized_variable() {
    let main = main_fn(vec![VarDecl::new(Type::Int, "x")], vec![print(Expr::var("x"))]);

    let (result, output) = execute(vec![main]);
    assert_eq!(error_name(result), "UninitializedVariable");
    assert_eq!(output, "");
}

#[test]
fn test_arrays_are_shared_with_callees() {
    let fill = function(
        Type::Void,
        "fill",
        vec![Param::new(Type::Array(Box::new(Type::Int)), "a")],
        vec![],
        vec![Stmt::expr(Expr::index_assign("a", Expr::int(0), Expr::int(7)))],
    );
    let main = main_fn(
        vec![VarDecl::new(Type::Array(Box::new(Type::Int)), "arr")
            .with_initializer(Expr::new_array(Type::Int, Expr::int(2)))],
        vec![
            Stmt::expr(Expr::call("fill", vec![Expr::var("arr")])),
            print(Expr::var("arr")),
            print(Expr::call("len", vec![Expr::var("arr")])),
        ],
    );

    let (_, output) = execute(vec![fill, main]);
    assert_eq!(output, "[7, 0]\n2\n");
}

#[test]
fn test_index_out_of_bounds() {
    let main = main_fn(
        vec![VarDecl::new(Type::Array(Box::new(Type::Int)), "arr")
            .with_initializer(Expr::new_array(Type::Int, Expr::int(5)))],
        vec![Stmt::expr(Expr::index_assign("arr", Expr::int(10), Expr::int(1)).at(Position::line(4)))],
    );

    let (result, _) = execute(vec![main]);
    let error = result.unwrap_err();
    assert_eq!(
        error.get_impl(),
        &ErrorImpl::IndexOutOfBounds { index: 10, length: 5 }
    );
    assert_eq!(error.get_position().0, 4);
}

#[test]
fn test_increment_evaluates_its_index_once() {
    let main = main_fn(
        vec![
            VarDecl::new(Type::Array(Box::new(Type::Int)), "a")
                .with_initializer(Expr::new_array(Type::Int, Expr::int(4))),
            VarDecl::new(Type::Int, "i").with_initializer(Expr::int(0)),
        ],
        vec![
            Stmt::expr(Expr::post_inc(Expr::index("a", Expr::post_inc(Expr::var("i"))))),
            print(Expr::var("i")),
            print(Expr::index("a", Expr::int(0))),
            print(Expr::index("a", Expr::int(1))),
        ],
    );

    let (result, output) = execute(vec![main]);
    assert!(result.is_ok());
    assert_eq!(output, "1\n1\n0\n");
}

#[test]
fn test_increment_evaluates_its_object_once() {
    let make = function(
        Type::Class(String::from("Counter")),
        "make",
        vec![],
        vec![],
        vec![
            print(Expr::string("made")),
            Stmt::ret(Some(Expr::var("shared"))),
        ],
    );
    let shared = Decl::Var(
        VarDecl::new(Type::Class(String::from("Counter")), "shared")
            .with_initializer(Expr::call("Counter", vec![Expr::int(1)])),
    );
    let main = main_fn(
        vec![],
        vec![
            Stmt::expr(Expr::pre_inc(Expr::get(Expr::call("make", vec![]), "count"))),
            print(Expr::get(Expr::var("shared"), "count")),
        ],
    );

    let (_, output) = execute(vec![counter_class(), shared, make, main]);
    assert_eq!(output, "made\n2\n");
}

#[test]
fn test_oversized_array_is_a_runtime_error() {
    let main = main_fn(
        vec![VarDecl::new(Type::Array(Box::new(Type::Int)), "a")
            .with_initializer(Expr::new_array(Type::Int, Expr::int(i64::MAX)).at(Position::line(2)))],
        vec![],
    );

    let (result, _) = execute(vec![main]);
    let error = result.unwrap_err();
    assert_eq!(error.get_impl(), &ErrorImpl::AllocationFailure { length: i64::MAX });
    assert_eq!(error.get_position().0, 2);
}

fn counter_class() -> Decl {
    let init = FuncDecl::new(
        Type::Void,
        "init",
        vec![Param::new(Type::Int, "start")],
        Compound::new(vec![], vec![Stmt::expr(Expr::set(Expr::this(), "count", Expr::var("start")))]),
    );
    let add = FuncDecl::new(
        Type::Void,
        "add",
        vec![],
        Compound::new(
            vec![],
            vec![Stmt::expr(Expr::set(
                Expr::this(),
                "count",
                Expr::binary(BinaryOp::Add, Expr::get(Expr::this(), "count"), Expr::int(1)),
            ))],
        ),
    );
    Decl::Class(Rc::new(
        ClassDecl::new("Counter", None)
            .field(Type::Int, "count")
            .method(init)
            .method(add),
    ))
}

#[test]
fn test_instances_run_init_and_methods() {
    let main = main_fn(
        vec![VarDecl::new(Type::Class(String::from("Counter")), "c")
            .with_initializer(Expr::call("Counter", vec![Expr::int(5)]))],
        vec![
            Stmt::expr(Expr::call_expr(Expr::get(Expr::var("c"), "add"), vec![])),
            print(Expr::get(Expr::var("c"), "count")),
            print(Expr::var("c")),
        ],
    );

    let (_, output) = execute(vec![counter_class(), main]);
    assert_eq!(output, "6\nCounter instance\n");
}

#[test]
fn test_undefined_property() {
    let main = main_fn(
        vec![VarDecl::new(Type::Class(String::from("Counter")), "c")
            .with_initializer(Expr::call("Counter", vec![Expr::int(0)]))],
        vec![print(Expr::get(Expr::var("c"), "missing"))],
    );

    let (result, _) = execute(vec![counter_class(), main]);
    assert_eq!(error_name(result), "UndefinedProperty");
}

#[test]
fn test_constructor_arity() {
    let main = main_fn(vec![], vec![Stmt::expr(Expr::call("Counter", vec![]))]);

    let (result, _) = execute(vec![counter_class(), main]);
    assert_eq!(error_name(result), "CallArityMismatch");
}

#[test]
fn test_override_and_super() {
    let returning = |name: &str, value: i64| {
        FuncDecl::new(Type::Int, name, vec![], Compound::new(vec![], vec![Stmt::ret(Some(Expr::int(value)))]))
    };
    let a = ClassDecl::new("A", None).method(returning("f", 1));
    let b = ClassDecl::new("B", Some("A")).method(returning("f", 2)).method(FuncDecl::new(
        Type::Int,
        "g",
        vec![],
        Compound::new(
            vec![],
            vec![Stmt::ret(Some(Expr::call_expr(Expr::super_method("f"), vec![])))],
        ),
    ));
    let main = main_fn(
        vec![VarDecl::new(Type::Class(String::from("B")), "b").with_initializer(Expr::call("B", vec![]))],
        vec![Stmt::expr(Expr::printf(
            "%d %d",
            vec![
                Expr::call_expr(Expr::get(Expr::var("b"), "f"), vec![]),
                Expr::call_expr(Expr::get(Expr::var("b"), "g"), vec![]),
            ],
        ))],
    );

    let (_, output) = execute(vec![Decl::Class(Rc::new(a)), Decl::Class(Rc::new(b)), main]);
    assert_eq!(output, "2 1");
}

#[test]
fn test_calling_a_non_callable() {
    let main = main_fn(
        vec![VarDecl::new(Type::Int, "x").with_initializer(Expr::int(1))],
        vec![Stmt::expr(Expr::call("x", vec![]))],
    );

    let (result, _) = execute(vec![main]);
    assert_eq!(error_name(result), "NotCallable");
}

#[test]
fn test_field_access_on_a_non_instance() {
    let main = main_fn(
        vec![VarDecl::new(Type::Int, "x").with_initializer(Expr::int(1))],
        vec![print(Expr::get(Expr::var("x"), "field"))],
    );

    let (result, _) = execute(vec![main]);
    assert_eq!(error_name(result), "NotAnInstance");
}

#[test]
fn test_unbounded_recursion_exhausts_the_stack() {
    let forever = function(
        Type::Void,
        "forever",
        vec![],
        vec![],
        vec![Stmt::expr(Expr::call("forever", vec![]))],
    );
    let main = main_fn(vec![], vec![Stmt::expr(Expr::call("forever", vec![]))]);
    let config = InterpreterConfig {
        max_call_depth: 64,
        ..InterpreterConfig::default()
    };

    let (result, _) = execute_with(config, "", vec![forever, main]);
    assert_eq!(result.unwrap_err().get_impl(), &ErrorImpl::StackExhausted { depth: 64 });
}

#[test]
fn test_missing_main_runs_nothing() {
    let global = Decl::Var(
        VarDecl::new(Type::Void, "noise").with_initializer(Expr::call("print", vec![Expr::string("side effect")])),
    );

    let (result, output) = execute(vec![global]);
    assert_eq!(error_name(result), "MissingEntryPoint");
    assert_eq!(output, "");
}

#[test]
fn test_main_with_parameters() {
    let main = function(Type::Void, "main", vec![Param::new(Type::Int, "argc")], vec![], vec![]);

    let (result, _) = execute(vec![main]);
    assert_eq!(error_name(result), "MissingEntryPoint");
}

#[test]
fn test_echo_return() {
    let main = function(Type::Int, "main", vec![], vec![], vec![Stmt::ret(Some(Expr::int(5)))]);
    let config = InterpreterConfig {
        echo_return: true,
        ..InterpreterConfig::default()
    };

    let (result, output) = execute_with(config, "", vec![main]);
    assert_eq!(result.unwrap(), Value::Int(5));
    assert_eq!(output, "Return: 5\n");
}

#[test]
fn test_scanf_reads_tokens_across_lines() {
    let main = main_fn(
        vec![VarDecl::new(Type::Int, "n"), VarDecl::new(Type::Str, "word")],
        vec![
            Stmt::expr(Expr::scanf("%d %s", vec![Expr::var("n"), Expr::var("word")])),
            Stmt::expr(Expr::printf("%s=%d", vec![Expr::var("word"), Expr::var("n")])),
        ],
    );

    let (_, output) = execute_with(InterpreterConfig::default(), "42\n  answer\n", vec![main]);
    assert_eq!(output, "answer=42");
}

#[test]
fn test_scanf_rejects_a_malformed_token() {
    let main = main_fn(
        vec![VarDecl::new(Type::Int, "n")],
        vec![Stmt::expr(Expr::scanf("%d", vec![Expr::var("n")]))],
    );

    let (result, _) = execute_with(InterpreterConfig::default(), "forty-two", vec![main]);
    assert_eq!(error_name(result), "BuiltinCallFailure");
}

#[test]
fn test_sprintf_assigns_the_destination() {
    let main = main_fn(
        vec![VarDecl::new(Type::Str, "text")],
        vec![
            Stmt::expr(Expr::sprintf("text", "%d-%s", vec![Expr::int(7), Expr::string("up")])),
            print(Expr::var("text")),
        ],
    );

    let (_, output) = execute(vec![main]);
    assert_eq!(output, "7-up\n");
}

#[test]
fn test_prelude_constants_are_read_only() {
    let main = main_fn(vec![], vec![Stmt::expr(Expr::assign("PI", Expr::float(3.0)))]);

    let (result, _) = execute(vec![main]);
    assert_eq!(error_name(result), "AssignToConstant");
}

#[test]
fn test_runtime_error_stops_execution() {
    let main = main_fn(
        vec![],
        vec![
            print(Expr::string("before")),
            Stmt::expr(Expr::binary(BinaryOp::Div, Expr::int(1), Expr::int(0))),
            print(Expr::string("after")),
        ],
    );

    let (result, output) = execute(vec![main]);
    assert_eq!(error_name(result), "DivisionByZero");
    assert_eq!(output, "before\n");
}
