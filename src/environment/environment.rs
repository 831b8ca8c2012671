use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::evaluator::Value;

/// A single lexical scope: bindings plus an optional enclosing scope.
///
/// Scopes are shared, not owned. Every function literal captures the scope
/// it was evaluated in, and several closures may capture the same one, so a
/// scope lives as long as its longest-lived holder. A closure bound with
/// `let` can even reach itself through its captured scope; the resulting
/// `Rc` cycle is accepted and lives until process exit.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Bindings for *this* scope
    values: HashMap<String, Value>,

    /// Optional parent scope
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// Create the top-level (global) environment.
    pub fn new_global() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: None,
        }))
    }

    /// Create a nested environment chained to its parent.
    pub fn new_enclosed(enclosing: Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }))
    }

    pub fn define(&mut self, name: String, value: Value) {
        // Insert or shadow without extra checks.
        self.values.insert(name, value);
    }

    /// Local lookup first, then outward through the chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        if let Some(ref parent) = self.enclosing {
            return parent.borrow().get(name);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_get() {
        let env = Environment::new_global();
        env.borrow_mut()
            .define("a".to_string(), Value::Integer(1));
        assert_eq!(env.borrow().get("a"), Some(Value::Integer(1)));
        assert_eq!(env.borrow().get("b"), None);
    }

    #[test]
    fn lookup_walks_the_chain() {
        let outer = Environment::new_global();
        outer
            .borrow_mut()
            .define("a".to_string(), Value::Integer(1));

        let inner = Environment::new_enclosed(Rc::clone(&outer));
        assert_eq!(inner.borrow().get("a"), Some(Value::Integer(1)));
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let outer = Environment::new_global();
        outer
            .borrow_mut()
            .define("a".to_string(), Value::Integer(1));

        let inner = Environment::new_enclosed(Rc::clone(&outer));
        inner
            .borrow_mut()
            .define("a".to_string(), Value::Integer(2));

        assert_eq!(inner.borrow().get("a"), Some(Value::Integer(2)));
        assert_eq!(outer.borrow().get("a"), Some(Value::Integer(1)));
    }

    #[test]
    fn rebinding_a_local_overwrites() {
        let env = Environment::new_global();
        env.borrow_mut()
            .define("a".to_string(), Value::Integer(1));
        env.borrow_mut()
            .define("a".to_string(), Value::Integer(2));
        assert_eq!(env.borrow().get("a"), Some(Value::Integer(2)));
    }

    #[test]
    fn defining_writes_to_the_local_scope_only() {
        let outer = Environment::new_global();
        outer
            .borrow_mut()
            .define("a".to_string(), Value::Integer(1));

        let inner = Environment::new_enclosed(Rc::clone(&outer));
        inner
            .borrow_mut()
            .define("b".to_string(), Value::Integer(2));

        assert_eq!(outer.borrow().get("b"), None);
    }
}
