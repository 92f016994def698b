#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::{
    ast::ast::Program,
    checker::checker::check,
    errors::errors::{Error, ErrorTip},
    interpreter::{
        interpreter::{interpret, Interpreter},
        value::Value,
    },
};

pub mod ast;
pub mod checker;
pub mod environment;
pub mod errors;
pub mod interpreter;
pub mod macros;
pub mod prelude;
pub mod stack;

extern crate regex;

/// A source line and the name of the file it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }

    pub fn line(line: u32) -> Self {
        Position(line, Rc::new(String::from("<input>")))
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// The result of a program that checked cleanly and ran to completion.
#[derive(Debug)]
pub struct Outcome {
    /// What `main` returned.
    pub value: Value,
    /// Checker warnings, which do not block evaluation.
    pub warnings: Vec<Error>,
}

/// Checks `program` and, if no violation was found, runs it.
///
/// Check errors are all returned together; a runtime error is returned alone.
pub fn run(program: &Program, interpreter: &mut Interpreter) -> Result<Outcome, Vec<Error>> {
    let warnings = check(program)?;
    let value = interpret(interpreter, program).map_err(|error| vec![error])?;
    Ok(Outcome { value, warnings })
}

/// Renders an error for a terminal.
///
/// ```text
/// Error: TypeMismatch (Expected type `int`, received `string`)
/// -> main.mc:12
///    types do not match: expected int, received string
/// ```
pub fn format_error(error: &Error) -> String {
    let mut rendered = match error.get_tip() {
        ErrorTip::None => format!("Error: {}\n", error.get_error_name()),
        tip => format!("Error: {} ({})\n", error.get_error_name(), tip),
    };

    let position = error.get_position();
    if !position.is_null() {
        rendered.push_str(&format!("-> {}:{}\n", position.1, position.0));
    }
    rendered.push_str(&format!("   {}", error.get_impl()));

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::errors::ErrorImpl;

    #[test]
    fn test_format_error_with_tip_and_position() {
        let error = Error::new(
            ErrorImpl::TypeMismatch {
                expected: String::from("int"),
                received: String::from("string"),
            },
            Position(12, Rc::new(String::from("main.mc"))),
        );

        assert_eq!(
            format_error(&error),
            "Error: TypeMismatch (Expected type `int`, received `string`)\n\
             -> main.mc:12\n   \
             types do not match: expected int, received string"
        );
    }

    #[test]
    fn test_format_error_without_position() {
        let error = Error::new(ErrorImpl::DivisionByZero, Position::null());

        assert_eq!(format_error(&error), "Error: DivisionByZero\n   division by zero");
    }
}
