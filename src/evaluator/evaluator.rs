use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use crate::environment::Environment;
use crate::evaluator::{AssertionErrorKind, RuntimeError, Value};
use crate::function::{self, Callable, Function};
use crate::lexer::TokenType;
use crate::parser::ast::{Block, Expression, Program, Statement};

/*
The evaluator is a post-order walk: operands before operators, arguments
before calls, every sub-result inspected before its parent combines them.
There is no mutable interpreter state outside the environment chain, so
evaluation is a pure function of the tree and the environment it is handed.

Name resolution is dynamic. An identifier is looked up outward through the
environment chain; only when the whole chain misses is the builtin catalog
consulted, which means user bindings shadow builtins but builtins never
shadow user code.
*/
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Evaluator
    }

    /// Evaluate a program: statements run in order until one returns or
    /// fails. A top-level `return` is unwrapped here; otherwise the value
    /// of the last statement (or `null` for an empty program) comes back.
    pub fn evaluate(
        &mut self,
        program: &Program,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Value, RuntimeError> {
        let mut result = Value::Null;

        for statement in &program.statements {
            match self.execute_statement(statement, env) {
                Ok(value) => result = value,
                Err(RuntimeError::Return(value)) => return Ok(value),
                Err(error) => return Err(error),
            }
        }

        Ok(result)
    }

    /// Evaluate the statements of a block. Unlike `evaluate`, a `Return`
    /// passes through unchanged so that nested blocks unwind all the way
    /// to the enclosing function call.
    pub fn execute_block(
        &mut self,
        block: &Block,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Value, RuntimeError> {
        let mut result = Value::Null;
        for statement in &block.statements {
            result = self.execute_statement(statement, env)?;
        }
        Ok(result)
    }

    fn execute_statement(
        &mut self,
        statement: &Statement,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Value, RuntimeError> {
        match statement {
            Statement::Let { name, value } => {
                let value = self.evaluate_expression(value, env)?;
                env.borrow_mut().define(name.clone(), value);
                Ok(Value::Null)
            }
            Statement::Return(value) => {
                let value = self.evaluate_expression(value, env)?;
                Err(RuntimeError::Return(value))
            }
            Statement::Expression(expression) => self.evaluate_expression(expression, env),
        }
    }

    fn evaluate_expression(
        &mut self,
        expression: &Expression,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Value, RuntimeError> {
        match expression {
            Expression::IntegerLiteral(value) => Ok(Value::Integer(*value)),
            Expression::BooleanLiteral(value) => Ok(Value::Bool(*value)),
            Expression::StringLiteral(value) => Ok(Value::String(value.clone())),
            Expression::Identifier(name) => self.resolve_identifier(name, env),
            Expression::Prefix { operator, right } => {
                let right = self.evaluate_expression(right, env)?;
                self.evaluate_prefix(*operator, right)
            }
            Expression::Infix {
                operator,
                left,
                right,
            } => {
                let left = self.evaluate_expression(left, env)?;
                let right = self.evaluate_expression(right, env)?;
                self.evaluate_infix(*operator, left, right)
            }
            Expression::IfElse {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.evaluate_expression(condition, env)?;
                if condition.is_truthy() {
                    self.execute_block(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.execute_block(alternative, env)
                } else {
                    Ok(Value::Null)
                }
            }
            Expression::FunctionLiteral { parameters, body } => {
                // closure capture: the literal holds the environment in
                // effect at the moment it is evaluated
                Ok(Value::Function(Rc::new(Function {
                    parameters: parameters.clone(),
                    body: body.clone(),
                    closure: Rc::clone(env),
                })))
            }
            Expression::Call { callee, arguments } => {
                let callee = self.evaluate_expression(callee, env)?;
                let mut evaluated = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    evaluated.push(self.evaluate_expression(argument, env)?);
                }
                match callee {
                    Value::Function(function) => function.call(self, evaluated),
                    Value::Builtin(builtin) => builtin.call(self, evaluated),
                    other => Err(RuntimeError::assertion(
                        AssertionErrorKind::InvalidToken,
                        format!("not a function: {}", other.type_name()),
                    )),
                }
            }
            Expression::ArrayLiteral(elements) => {
                let mut evaluated = Vec::with_capacity(elements.len());
                for element in elements {
                    evaluated.push(self.evaluate_expression(element, env)?);
                }
                Ok(Value::Array(evaluated))
            }
            Expression::Index { collection, index } => {
                let collection = self.evaluate_expression(collection, env)?;
                let index = self.evaluate_expression(index, env)?;
                Self::evaluate_index(collection, index)
            }
        }
    }

    fn resolve_identifier(
        &self,
        name: &str,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Value, RuntimeError> {
        if let Some(value) = env.borrow().get(name) {
            return Ok(value);
        }
        if let Some(builtin) = function::lookup_builtin(name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(RuntimeError::assertion(
            AssertionErrorKind::InvalidIdentifier,
            format!("identifier not found: {}", name),
        ))
    }

    fn evaluate_prefix(&self, operator: TokenType, right: Value) -> Result<Value, RuntimeError> {
        match operator {
            TokenType::Bang => Ok(Value::Bool(!right.is_truthy())),
            TokenType::Minus => match right {
                Value::Integer(value) => Ok(Value::Integer(-value)),
                other => Err(RuntimeError::assertion(
                    AssertionErrorKind::InvalidToken,
                    format!("unknown operator: -{}", other.type_name()),
                )),
            },
            other => Err(RuntimeError::assertion(
                AssertionErrorKind::UnknownOperator,
                format!("unknown operator: {}", other),
            )),
        }
    }

    fn evaluate_infix(
        &self,
        operator: TokenType,
        left: Value,
        right: Value,
    ) -> Result<Value, RuntimeError> {
        if mem::discriminant(&left) != mem::discriminant(&right) {
            return Err(RuntimeError::assertion(
                AssertionErrorKind::InvalidToken,
                format!(
                    "type mismatch: {} {} {}",
                    left.type_name(),
                    operator,
                    right.type_name()
                ),
            ));
        }

        match (&left, &right) {
            (Value::Integer(l), Value::Integer(r)) => {
                Self::evaluate_integer_infix(operator, *l, *r)
            }
            (Value::String(l), Value::String(r)) => match operator {
                TokenType::Plus => Ok(Value::String(format!("{}{}", l, r))),
                _ => Err(Self::unknown_operator(operator, &left, &right)),
            },
            _ => match operator {
                TokenType::EqualEqual => Ok(Value::Bool(left == right)),
                TokenType::BangEqual => Ok(Value::Bool(left != right)),
                _ => Err(Self::unknown_operator(operator, &left, &right)),
            },
        }
    }

    fn evaluate_integer_infix(
        operator: TokenType,
        left: i64,
        right: i64,
    ) -> Result<Value, RuntimeError> {
        match operator {
            TokenType::Plus => Ok(Value::Integer(left + right)),
            TokenType::Minus => Ok(Value::Integer(left - right)),
            TokenType::Star => Ok(Value::Integer(left * right)),
            TokenType::Slash => {
                if right == 0 {
                    Err(RuntimeError::assertion(
                        AssertionErrorKind::DivisionByZero,
                        "division by zero",
                    ))
                } else {
                    // host semantics: i64 division truncates toward zero
                    Ok(Value::Integer(left / right))
                }
            }
            TokenType::Less => Ok(Value::Bool(left < right)),
            TokenType::Greater => Ok(Value::Bool(left > right)),
            TokenType::EqualEqual => Ok(Value::Bool(left == right)),
            TokenType::BangEqual => Ok(Value::Bool(left != right)),
            other => Err(RuntimeError::assertion(
                AssertionErrorKind::UnknownOperator,
                format!("unknown operator: INTEGER {} INTEGER", other),
            )),
        }
    }

    fn evaluate_index(collection: Value, index: Value) -> Result<Value, RuntimeError> {
        match (collection, index) {
            (Value::Array(elements), Value::Integer(position)) => {
                if position < 0 || position as usize >= elements.len() {
                    Ok(Value::Null)
                } else {
                    Ok(elements[position as usize].clone())
                }
            }
            (Value::Array(_), other) => Err(RuntimeError::assertion(
                AssertionErrorKind::IndexOutOfBounds,
                format!("array index must be an integer, got {}", other.type_name()),
            )),
            (other, _) => Err(RuntimeError::assertion(
                AssertionErrorKind::IndexOutOfBounds,
                format!("index operator not supported: {}", other.type_name()),
            )),
        }
    }

    fn unknown_operator(operator: TokenType, left: &Value, right: &Value) -> RuntimeError {
        RuntimeError::assertion(
            AssertionErrorKind::UnknownOperator,
            format!(
                "unknown operator: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            ),
        )
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}
