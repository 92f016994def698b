//! Integration tests for end-to-end runs.
//!
//! These tests build programs through the public AST constructors and push
//! them through the whole pipeline: checking, startup and evaluation.

use std::rc::Rc;

use minicpp::{
    ast::{
        ast::{ClassDecl, Decl, FuncDecl, Param, Program, VarDecl},
        expressions::{BinaryOp, Expr},
        statements::{Compound, ForInit, Stmt},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl, ErrorPhase},
    format_error,
    interpreter::{
        interpreter::{Interpreter, InterpreterConfig},
        io::{InputSource, OutputSink},
        value::Value,
    },
    run, Outcome, Position,
};
use pretty_assertions::assert_eq;

fn buffered(input: &str) -> Interpreter {
    Interpreter::with_io(
        InterpreterConfig::default(),
        OutputSink::buffer(),
        InputSource::buffer(input),
    )
}

fn main_fn(decls: Vec<VarDecl>, stmts: Vec<Stmt>) -> Decl {
    Decl::Func(Rc::new(FuncDecl::new(
        Type::Void,
        "main",
        vec![],
        Compound::new(decls, stmts),
    )))
}

fn run_program(decls: Vec<Decl>, input: &str) -> (Result<Outcome, Vec<Error>>, String) {
    let program = Program::new(decls);
    let mut interpreter = buffered(input);
    let result = run(&program, &mut interpreter);
    (result, interpreter.output.get_output().to_string())
}

fn error_names(result: Result<Outcome, Vec<Error>>) -> Vec<String> {
    result
        .unwrap_err()
        .iter()
        .map(|error| error.get_error_name().to_string())
        .collect()
}

#[test]
fn test_integer_and_float_division() {
    let main = main_fn(
        vec![],
        vec![Stmt::expr(Expr::printf(
            "%d %f\\n",
            vec![
                Expr::binary(BinaryOp::Div, Expr::int(7), Expr::int(2)),
                Expr::binary(BinaryOp::Div, Expr::float(7.0), Expr::int_to_float(Expr::int(2))),
            ],
        ))],
    );

    let (result, output) = run_program(vec![main], "");
    assert!(result.is_ok());
    assert_eq!(output, "3 3.5\n");
}

#[test]
fn test_string_concatenation() {
    let main = main_fn(
        vec![VarDecl::new(Type::Str, "greeting")
            .with_initializer(Expr::binary(BinaryOp::Add, Expr::string("hello, "), Expr::string("world")))],
        vec![Stmt::expr(Expr::call("print", vec![Expr::var("greeting")]))],
    );

    let (_, output) = run_program(vec![main], "");
    assert_eq!(output, "hello, world\n");
}

#[test]
fn test_mixed_addition_is_rejected_before_running() {
    let main = main_fn(
        vec![],
        vec![
            Stmt::expr(Expr::call("print", vec![Expr::string("unreachable")])),
            Stmt::expr(Expr::binary(BinaryOp::Add, Expr::int(1), Expr::string("a")).at(Position::line(3))),
        ],
    );

    let (result, output) = run_program(vec![main], "");
    let errors = result.unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].phase(), ErrorPhase::Check);
    assert_eq!(errors[0].get_position().0, 3);
    assert_eq!(output, "");
}

#[test]
fn test_break_placement() {
    let outside = main_fn(vec![], vec![Stmt::brk()]);
    let (result, _) = run_program(vec![outside], "");
    assert_eq!(error_names(result), vec!["IllegalBreakOrContinue"]);

    let inside = main_fn(
        vec![],
        vec![
            Stmt::while_loop(Expr::boolean(true), Stmt::brk()),
            Stmt::expr(Expr::call("print", vec![Expr::string("out")])),
        ],
    );
    let (result, output) = run_program(vec![inside], "");
    assert!(result.is_ok());
    assert_eq!(output, "out\n");
}

#[test]
fn test_inheritance_override_and_super() {
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
        vec![VarDecl::new(Type::Class(String::from("A")), "object").with_initializer(Expr::call("B", vec![]))],
        vec![Stmt::expr(Expr::printf(
            "%d %d\\n",
            vec![
                Expr::call_expr(Expr::get(Expr::var("object"), "f"), vec![]),
                Expr::call_expr(Expr::get(Expr::var("object"), "g"), vec![]),
            ],
        ))],
    );

    let (result, output) = run_program(
        vec![Decl::Class(Rc::new(a)), Decl::Class(Rc::new(b)), main],
        "",
    );
    assert!(result.is_ok());
    assert_eq!(output, "2 1\n");
}

#[test]
fn test_out_of_range_index_is_a_runtime_error() {
    let main = main_fn(
        vec![VarDecl::new(Type::Array(Box::new(Type::Int)), "arr")],
        vec![
            Stmt::expr(Expr::assign("arr", Expr::new_array(Type::Int, Expr::int(5)))),
            Stmt::expr(Expr::index_assign("arr", Expr::int(10), Expr::int(1)).at(Position::line(6))),
        ],
    );

    let (result, _) = run_program(vec![main], "");
    let errors = result.unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].phase(), ErrorPhase::Runtime);
    assert_eq!(errors[0].get_impl(), &ErrorImpl::IndexOutOfBounds { index: 10, length: 5 });
    assert_eq!(
        format_error(&errors[0]),
        "Error: IndexOutOfBounds (Valid indexes are 0 to 4)\n-> <input>:6\n   index 10 is out of bounds for an array of length 5"
    );
}

#[test]
fn test_printf_specifier_mismatch() {
    let main = main_fn(
        vec![],
        vec![Stmt::expr(Expr::printf("%d %s", vec![Expr::int(3)]))],
    );

    let (result, output) = run_program(vec![main], "");
    assert_eq!(error_names(result), vec!["MalformedFormatString"]);
    assert_eq!(output, "");
}

#[test]
fn test_missing_main_produces_no_output() {
    let helper = Decl::Func(Rc::new(FuncDecl::new(
        Type::Void,
        "helper",
        vec![],
        Compound::new(vec![], vec![Stmt::expr(Expr::call("print", vec![Expr::string("never")]))]),
    )));

    let (result, output) = run_program(vec![helper], "");
    assert_eq!(error_names(result), vec!["MissingEntryPoint"]);
    assert_eq!(output, "");
}

#[test]
fn test_redundant_cast_still_runs() {
    let main = main_fn(
        vec![],
        vec![Stmt::expr(Expr::call("print", vec![Expr::cast("int", Expr::int(4))]))],
    );

    let (result, output) = run_program(vec![main], "");
    let outcome = result.unwrap();
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].phase(), ErrorPhase::Warning);
    assert_eq!(output, "4\n");
}

#[test]
fn test_read_sum_and_report() {
    // Reads a count, then that many integers, and prints their sum.
    let main = main_fn(
        vec![
            VarDecl::new(Type::Int, "count"),
            VarDecl::new(Type::Int, "sum").with_initializer(Expr::int(0)),
            VarDecl::new(Type::Array(Box::new(Type::Int)), "values"),
            VarDecl::new(Type::Str, "report"),
        ],
        vec![
            Stmt::expr(Expr::scanf("%d", vec![Expr::var("count")])),
            Stmt::expr(Expr::assign("values", Expr::new_array(Type::Int, Expr::var("count")))),
            Stmt::for_loop(
                ForInit::Decl(VarDecl::new(Type::Int, "i").with_initializer(Expr::int(0))),
                Expr::binary(BinaryOp::Lt, Expr::var("i"), Expr::var("count")),
                Expr::post_inc(Expr::var("i")),
                Stmt::block(
                    vec![],
                    vec![
                        Stmt::expr(Expr::scanf("%d", vec![Expr::index("values", Expr::var("i"))])),
                        Stmt::expr(Expr::compound_assign(
                            BinaryOp::Add,
                            "sum",
                            Expr::index("values", Expr::var("i")),
                        )),
                    ],
                ),
            ),
            Stmt::expr(Expr::sprintf(
                "report",
                "%d values, sum %d",
                vec![Expr::call("len", vec![Expr::var("values")]), Expr::var("sum")],
            )),
            Stmt::expr(Expr::call("print", vec![Expr::var("report")])),
        ],
    );

    let (result, output) = run_program(vec![main], "3\n4 5\n6\n");
    assert!(result.is_ok());
    assert_eq!(output, "3 values, sum 15\n");
}

#[test]
fn test_main_return_value() {
    let main = Decl::Func(Rc::new(FuncDecl::new(
        Type::Int,
        "main",
        vec![],
        Compound::new(vec![], vec![Stmt::ret(Some(Expr::int(42)))]),
    )));
    let program = Program::new(vec![main]);
    let mut interpreter = Interpreter::with_io(
        InterpreterConfig {
            echo_return: true,
            ..InterpreterConfig::default()
        },
        OutputSink::buffer(),
        InputSource::buffer(""),
    );

    let outcome = run(&program, &mut interpreter).unwrap();
    assert_eq!(outcome.value, Value::Int(42));
    assert_eq!(interpreter.output.get_output(), "Return: 42\n");
}

#[test]
fn test_class_with_state() {
    let account = ClassDecl::new("Account", None)
        .field(Type::Float, "balance")
        .method(FuncDecl::new(
            Type::Void,
            "init",
            vec![Param::new(Type::Float, "opening")],
            Compound::new(
                vec![],
                vec![Stmt::expr(Expr::set(Expr::this(), "balance", Expr::var("opening")))],
            ),
        ))
        .method(FuncDecl::new(
            Type::Bool,
            "withdraw",
            vec![Param::new(Type::Float, "amount")],
            Compound::new(
                vec![],
                vec![
                    Stmt::if_else(
                        Expr::binary(BinaryOp::Gt, Expr::var("amount"), Expr::get(Expr::this(), "balance")),
                        Stmt::ret(Some(Expr::boolean(false))),
                        None,
                    ),
                    Stmt::expr(Expr::set(
                        Expr::this(),
                        "balance",
                        Expr::binary(BinaryOp::Sub, Expr::get(Expr::this(), "balance"), Expr::var("amount")),
                    )),
                    Stmt::ret(Some(Expr::boolean(true))),
                ],
            ),
        ));
    let withdraw = |amount: f64| {
        Expr::call_expr(Expr::get(Expr::var("account"), "withdraw"), vec![Expr::float(amount)])
    };
    let main = main_fn(
        vec![VarDecl::new(Type::Class(String::from("Account")), "account")
            .with_initializer(Expr::call("Account", vec![Expr::float(10.0)]))],
        vec![
            Stmt::expr(Expr::call("print", vec![withdraw(4.0)])),
            Stmt::expr(Expr::call("print", vec![withdraw(7.5)])),
            Stmt::expr(Expr::call("print", vec![Expr::get(Expr::var("account"), "balance")])),
        ],
    );

    let (result, output) = run_program(vec![Decl::Class(Rc::new(account)), main], "");
    assert!(result.is_ok());
    assert_eq!(output, "true\nfalse\n6.0\n");
}
