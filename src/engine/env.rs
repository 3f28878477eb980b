use crate::engine::error::ExecutionError;
use crate::engine::token::Token;
use crate::engine::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// A scope's name-to-value bindings plus a link to the enclosing scope.
///
/// Environments are shared by reference between a closure and the scope
/// that captured it. Bindings are define-once: the language has no
/// assignment, so after `define` succeeds a name never changes within
/// its scope, and plain `Rc` sharing is safe.
#[derive(Debug, PartialEq)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// Creates a new, empty root environment.
    pub fn new() -> Rc<RefCell<Self>> {
        debug!("creating new root environment");
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: None,
        }))
    }

    /// Creates a new environment enclosed by an outer one. Lookups fall
    /// through to the outer chain; definitions stay local.
    pub fn new_enclosed(enclosing: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        trace!("creating new enclosed environment");
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }))
    }

    /// Adds a new binding. Redefinition in the same scope is an error;
    /// shadowing an outer scope's name in a nested scope is fine.
    pub fn define(&mut self, name: &Token, value: Value) -> Result<(), ExecutionError> {
        if self.values.contains_key(&name.lexeme) {
            return Err(ExecutionError::AlreadyDefined {
                line: name.line,
                name: name.lexeme.clone(),
            });
        }

        trace!(name = %name.lexeme, ?value, "defining variable");
        self.values.insert(name.lexeme.clone(), value);
        Ok(())
    }

    /// Resolves a name, walking outward through the enclosing chain.
    pub fn get(&self, name: &Token) -> Result<Value, ExecutionError> {
        match self.values.get(&name.lexeme) {
            Some(value) => Ok(value.clone()),
            None => match &self.enclosing {
                Some(outer) => outer.borrow().get(name),
                None => Err(ExecutionError::UndefinedVariable {
                    line: name.line,
                    name: name.lexeme.clone(),
                }),
            },
        }
    }
}
