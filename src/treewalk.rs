mod callable;
mod interpreter;

pub mod environment;
pub mod expr;
pub mod parser;
pub mod stmt;

pub use callable::{Callable, FinchFunction, NativeFunction};
pub use interpreter::{Flow, Interpreter};

use crate::error::{Diagnostics, ExecutionError};
use crate::scanner;

use stmt::Stmt;

pub type ExecutionResult = Result<(), ExecutionError>;

/// Scan and parse `code`. Static errors are collected in `diagnostics`; the
/// returned program holds every statement that parsed cleanly.
pub fn parse_source(code: &str, diagnostics: &mut Diagnostics) -> Vec<Stmt> {
    let tokens = scanner::scan_tokens(code, diagnostics);
    parser::parse(&tokens, diagnostics)
}

/// Run `code` against `interpreter`. A program with any static error is never
/// executed.
#[tracing::instrument(level = "debug", skip_all)]
pub fn execute(code: &str, interpreter: &mut Interpreter) -> ExecutionResult {
    let mut diagnostics = Diagnostics::new();
    let statements = parse_source(code, &mut diagnostics);
    if diagnostics.had_error() {
        return Err(ExecutionError::Static(diagnostics.into_errors()));
    }

    interpreter.interpret(&statements)?;
    Ok(())
}
