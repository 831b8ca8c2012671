use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::evaluator::{AssertionErrorKind, Evaluator, RuntimeError, Value};
use crate::function::Callable;

/// A host-provided function. The catalog below is immutable; identifier
/// lookup consults it only after the whole environment chain misses, so a
/// `let len = ...` binding shadows the builtin of the same name.
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    function: fn(Vec<Value>) -> Result<Value, RuntimeError>,
}

impl Callable for Builtin {
    fn call(
        &self,
        _evaluator: &mut Evaluator,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        (self.function)(arguments)
    }
}

pub static BUILTINS: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("len", Builtin { name: "len", function: len });
    m.insert("first", Builtin { name: "first", function: first });
    m.insert("last", Builtin { name: "last", function: last });
    m.insert("rest", Builtin { name: "rest", function: rest });
    m.insert("push", Builtin { name: "push", function: push });
    m.insert("puts", Builtin { name: "puts", function: puts });
    m
});

pub fn lookup_builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.get(name)
}

fn expect_arity(arguments: &[Value], want: usize) -> Result<(), RuntimeError> {
    if arguments.len() == want {
        Ok(())
    } else {
        Err(RuntimeError::assertion(
            AssertionErrorKind::WrongArity,
            format!(
                "wrong number of arguments: expected {}, got {}",
                want,
                arguments.len()
            ),
        ))
    }
}

fn len(arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_arity(&arguments, 1)?;
    match &arguments[0] {
        Value::String(value) => Ok(Value::Integer(value.len() as i64)),
        Value::Array(elements) => Ok(Value::Integer(elements.len() as i64)),
        other => Err(RuntimeError::assertion(
            AssertionErrorKind::InvalidToken,
            format!("argument to `len` not supported, got {}", other.type_name()),
        )),
    }
}

fn first(arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_arity(&arguments, 1)?;
    match &arguments[0] {
        Value::Array(elements) => Ok(elements.first().cloned().unwrap_or(Value::Null)),
        other => Err(RuntimeError::assertion(
            AssertionErrorKind::InvalidToken,
            format!("argument to `first` must be ARRAY, got {}", other.type_name()),
        )),
    }
}

fn last(arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_arity(&arguments, 1)?;
    match &arguments[0] {
        Value::Array(elements) => Ok(elements.last().cloned().unwrap_or(Value::Null)),
        other => Err(RuntimeError::assertion(
            AssertionErrorKind::InvalidToken,
            format!("argument to `last` must be ARRAY, got {}", other.type_name()),
        )),
    }
}

fn rest(arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_arity(&arguments, 1)?;
    match &arguments[0] {
        Value::Array(elements) => {
            if elements.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Array(elements[1..].to_vec()))
            }
        }
        other => Err(RuntimeError::assertion(
            AssertionErrorKind::InvalidToken,
            format!("argument to `rest` must be ARRAY, got {}", other.type_name()),
        )),
    }
}

// arrays are persistent: push hands back a new array, the argument is untouched
fn push(arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_arity(&arguments, 2)?;
    match (&arguments[0], &arguments[1]) {
        (Value::Array(elements), value) => {
            let mut elements = elements.clone();
            elements.push(value.clone());
            Ok(Value::Array(elements))
        }
        (other, _) => Err(RuntimeError::assertion(
            AssertionErrorKind::InvalidToken,
            format!("argument to `push` must be ARRAY, got {}", other.type_name()),
        )),
    }
}

fn puts(arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    for argument in &arguments {
        println!("{}", argument);
    }
    Ok(Value::Null)
}
