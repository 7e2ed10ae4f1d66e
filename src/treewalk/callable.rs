use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use once_cell::sync::Lazy;

use crate::error::RuntimeError;

use super::environment::{Environment, FinchValue};
use super::interpreter::{Flow, Interpreter};
use super::stmt::FunctionDeclaration;

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

pub type NativeResult = Result<FinchValue, String>;

/// Anything a call expression can invoke.
#[derive(Debug, Clone)]
pub enum Callable {
    Native(Rc<NativeFunction>),
    Function(Rc<FinchFunction>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Self::Native(native) => native.arity,
            Self::Function(function) => function.declaration.params.len(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Native(native) => native.name,
            Self::Function(function) => &function.declaration.name.lexeme,
        }
    }

    /// Identity comparison, two callables are only equal if they are the same object.
    pub fn same_as(&self, other: &Callable) -> bool {
        match (self, other) {
            (Self::Native(left), Self::Native(right)) => Rc::ptr_eq(left, right),
            (Self::Function(left), Self::Function(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }

    /// Invoke with arguments whose count already matches `arity`.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<FinchValue>,
        line: u32,
    ) -> Result<FinchValue, RuntimeError> {
        tracing::debug!(name = self.name(), arity = self.arity(), "call");
        match self {
            Self::Native(native) => (native.func)(&arguments).map_err(|message| RuntimeError::new(&message, line)),
            Self::Function(function) => function.call(interpreter, arguments),
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(native) => write!(f, "<native fn {}>", native.name),
            Self::Function(function) => write!(f, "<fn {}>", function.declaration.name.lexeme),
        }
    }
}

/// A user function together with the scope it was declared in.
pub struct FinchFunction {
    pub declaration: Rc<FunctionDeclaration>,
    pub closure: Rc<Environment>,
}

impl FinchFunction {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<FinchValue>) -> Result<FinchValue, RuntimeError> {
        // parameters live in a fresh scope under the closure, not under the caller
        let environment = Environment::new_enclosed(&self.closure);
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, environment)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(FinchValue::Nil),
        }
    }
}

// The closure chain can contain this function again, so only print the name.
impl fmt::Debug for FinchFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinchFunction")
            .field("name", &self.declaration.name.lexeme)
            .field("arity", &self.declaration.params.len())
            .finish()
    }
}

#[derive(Debug)]
pub struct NativeFunction {
    pub arity: usize,
    pub func: fn(&[FinchValue]) -> NativeResult,
    pub name: &'static str,
}

pub fn standard_library() -> Vec<NativeFunction> {
    // clock() counts from the first interpreter that loads the library
    Lazy::force(&EPOCH);

    vec![NativeFunction {
        arity: 0,
        func: native_clock,
        name: "clock",
    }]
}

fn native_clock(_args: &[FinchValue]) -> NativeResult {
    let duration = Instant::now() - *EPOCH;
    Ok(FinchValue::from(duration.as_secs_f64()))
}
