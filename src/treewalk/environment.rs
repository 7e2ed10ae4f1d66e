use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::scanner::Token;

use super::callable::Callable;
use super::expr::LiteralValue;

#[derive(Debug, Clone)]
pub enum FinchValue {
    Nil,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    Callable(Callable),
}

impl FinchValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Boolean(value) => *value,
            Self::Number(value) => *value != 0.0,
            Self::String(value) => !value.is_empty(),
            Self::Callable(_) => true,
        }
    }
}

// Values of different kinds are never equal.
impl PartialEq for FinchValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Boolean(left), Self::Boolean(right)) => left == right,
            (Self::Number(left), Self::Number(right)) => left == right,
            (Self::String(left), Self::String(right)) => left == right,
            (Self::Callable(left), Self::Callable(right)) => left.same_as(right),
            _ => false,
        }
    }
}

impl fmt::Display for FinchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value}"),
            Self::Callable(callable) => write!(f, "{callable}"),
        }
    }
}

impl From<&LiteralValue> for FinchValue {
    fn from(value: &LiteralValue) -> FinchValue {
        match value {
            LiteralValue::Boolean(value) => FinchValue::Boolean(*value),
            LiteralValue::Nil => FinchValue::Nil,
            LiteralValue::Number(value) => FinchValue::Number(*value),
            LiteralValue::String(value) => FinchValue::String(Rc::from(value.as_str())),
        }
    }
}

impl From<bool> for FinchValue {
    fn from(value: bool) -> FinchValue {
        FinchValue::Boolean(value)
    }
}

impl From<f64> for FinchValue {
    fn from(value: f64) -> FinchValue {
        FinchValue::Number(value)
    }
}

impl From<String> for FinchValue {
    fn from(value: String) -> FinchValue {
        FinchValue::String(Rc::from(value))
    }
}

/// One lexical scope. Scopes are shared through `Rc` so a closure can keep
/// its defining scope (and every scope enclosing it) alive after the block
/// or call that created it has finished.
///
/// The enclosing scope is fixed at construction; only the bindings of a
/// scope are mutable.
///
/// A function declared in a scope is bound in that same scope and holds it
/// as its closure, so the scope keeps itself alive through that binding.
/// Such scopes are never freed, even once the function is unreachable from
/// the program.
#[derive(Debug, Default)]
pub struct Environment {
    values: RefCell<HashMap<String, FinchValue>>,
    enclosing: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Rc<Environment> {
        Rc::new(Environment::default())
    }

    pub fn new_enclosed(enclosing: &Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment {
            values: RefCell::new(HashMap::new()),
            enclosing: Some(Rc::clone(enclosing)),
        })
    }

    /// Bind `name` in this scope, replacing any previous binding here.
    pub fn define(&self, name: &str, value: FinchValue) {
        self.values.borrow_mut().insert(name.to_string(), value);
    }

    /// Bind `name` to the absent value, as `var x;` does.
    pub fn declare(&self, name: &str) {
        self.define(name, FinchValue::Nil);
    }

    /// Look `name` up through the scope chain. A binding that holds the
    /// absent value has never been given a usable value and cannot be read.
    pub fn get(&self, name: &Token) -> Result<FinchValue, RuntimeError> {
        if let Some(value) = self.values.borrow().get(&name.lexeme) {
            return match value {
                FinchValue::Nil => Err(RuntimeError::new(
                    &format!("Variable '{}' not assigned.", name.lexeme),
                    name.line,
                )),
                value => Ok(value.clone()),
            };
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.get(name),
            None => Err(undefined_variable(name)),
        }
    }

    /// Overwrite the nearest existing binding of `name`. Never declares.
    pub fn assign(&self, name: &Token, value: FinchValue) -> Result<(), RuntimeError> {
        if let Some(binding) = self.values.borrow_mut().get_mut(&name.lexeme) {
            *binding = value;
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.assign(name, value),
            None => Err(undefined_variable(name)),
        }
    }
}

fn undefined_variable(name: &Token) -> RuntimeError {
    RuntimeError::new(&format!("Undefined variable '{}'.", name.lexeme), name.line)
}
