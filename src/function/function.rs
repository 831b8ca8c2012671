use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::evaluator::{AssertionErrorKind, Evaluator, RuntimeError, Value};
use crate::parser::ast::Block;

/*
Each call gets its own environment, created at call time and chained to the
environment the function literal captured. Creating it at call time rather
than at definition time is what makes recursion work: several in-flight
calls to the same function each hold their own bindings for the same
parameter names.

Once the body finishes, a `Return` unwinding out of it is unwrapped here,
at the call boundary, and the plain value handed to the caller.
*/

/// Anything that can sit in callee position: user functions and builtins.
pub trait Callable {
    fn call(&self, evaluator: &mut Evaluator, arguments: Vec<Value>)
        -> Result<Value, RuntimeError>;
}

/// A user-defined function: parameter names, a body, and the environment
/// captured when the literal was evaluated.
#[derive(Debug, Clone)]
pub struct Function {
    pub parameters: Vec<String>,
    pub body: Block,
    pub closure: Rc<RefCell<Environment>>,
}

impl Callable for Function {
    fn call(
        &self,
        evaluator: &mut Evaluator,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        if arguments.len() != self.parameters.len() {
            return Err(RuntimeError::assertion(
                AssertionErrorKind::WrongArity,
                format!(
                    "wrong number of arguments: expected {}, got {}",
                    self.parameters.len(),
                    arguments.len()
                ),
            ));
        }

        // a fresh activation record chained to the captured environment
        let env = Environment::new_enclosed(Rc::clone(&self.closure));
        for (parameter, argument) in self.parameters.iter().zip(arguments) {
            env.borrow_mut().define(parameter.clone(), argument);
        }

        match evaluator.execute_block(&self.body, &env) {
            Err(RuntimeError::Return(value)) => Ok(value),
            other => other,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "fn({}) {}", self.parameters.join(", "), self.body)
    }
}
