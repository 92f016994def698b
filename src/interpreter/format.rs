//! `printf`-style format strings.
//!
//! Only `%d`, `%f` and `%s` are recognised. Substitution happens left to
//! right, then `\n` and `\t` escapes are resolved in the result.

use lazy_static::lazy_static;
use regex::Regex;

use crate::{ast::types::Type, errors::errors::ErrorImpl};

use super::value::Value;

lazy_static! {
    pub static ref FORMAT_SPECIFIER: Regex = Regex::new("%[dfs]").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier {
    Int,
    Float,
    Str,
}

impl Specifier {
    fn from_match(specifier: &str) -> Option<Specifier> {
        match specifier {
            "%d" => Some(Specifier::Int),
            "%f" => Some(Specifier::Float),
            "%s" => Some(Specifier::Str),
            _ => None,
        }
    }

    pub fn expected_type(self) -> Type {
        match self {
            Specifier::Int => Type::Int,
            Specifier::Float => Type::Float,
            Specifier::Str => Type::Str,
        }
    }

    /// Converts one token of input to the value this specifier reads.
    pub fn parse(self, token: &str) -> Option<Value> {
        match self {
            Specifier::Int => token.parse().ok().map(Value::Int),
            Specifier::Float => token.parse().ok().map(Value::Float),
            Specifier::Str => Some(Value::Str(token.to_string())),
        }
    }
}

pub fn specifiers(format: &str) -> Vec<Specifier> {
    FORMAT_SPECIFIER
        .find_iter(format)
        .filter_map(|specifier| Specifier::from_match(specifier.as_str()))
        .collect()
}

pub fn unescape(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\t", "\t")
}

pub fn format(format: &str, arguments: &[Value]) -> Result<String, ErrorImpl> {
    let mut result = String::with_capacity(format.len());
    let mut arguments = arguments.iter();
    let mut last = 0;

    for specifier in FORMAT_SPECIFIER.find_iter(format) {
        let argument = arguments.next().ok_or_else(|| ErrorImpl::MalformedFormatString {
            reason: String::from("more specifiers than arguments"),
        })?;
        result.push_str(&format[last..specifier.start()]);
        result.push_str(&argument.to_string());
        last = specifier.end();
    }
    result.push_str(&format[last..]);

    if arguments.next().is_some() {
        return Err(ErrorImpl::MalformedFormatString {
            reason: String::from("more arguments than specifiers"),
        });
    }

    Ok(unescape(&result))
}
