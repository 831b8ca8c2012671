use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::Ordering;

use crate::environment::Environment;
use crate::evaluator::{Evaluator, RuntimeError};
use crate::parser::ast::Program;
use crate::runner::HAD_RUNTIMES;

/// The front end's driver: owns the evaluator and the global scope, which
/// persists for the interpreter's lifetime so that REPL lines see the
/// bindings of the lines before them.
pub struct Interpreter {
    evaluator: Evaluator,
    globals: Rc<RefCell<Environment>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            evaluator: Evaluator::new(),
            globals: Environment::new_global(),
        }
    }

    pub fn interpret(&mut self, program: &Program) {
        match self.evaluator.evaluate(program, &self.globals) {
            Ok(value) => println!("{}", value),
            Err(error) => Self::runtime_error(error),
        }
    }

    fn runtime_error(error: RuntimeError) {
        eprintln!("ERROR: {}", error);
        HAD_RUNTIMES.store(true, Ordering::Relaxed);
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}
