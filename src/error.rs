use std::fmt;
use std::result;

use thiserror::Error;

pub type GenericResult<T> = result::Result<T, Box<dyn std::error::Error>>;

/// Where a static error is anchored in the token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// Scan errors have no token to point at.
    None,
    End,
    Lexeme(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::End => write!(f, "at end"),
            Self::Lexeme(lexeme) => write!(f, "at '{lexeme}'"),
        }
    }
}

/// A scan or parse error. These are collected rather than thrown so a single
/// pass can report several of them.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[Line {line}] Error {location}: {message}")]
pub struct StaticError {
    pub line: u32,
    pub location: Location,
    pub message: String,
}

impl StaticError {
    pub fn new(line: u32, location: Location, message: &str) -> StaticError {
        StaticError {
            line,
            location,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Runtime Error: {message}\n[Line {line}]")]
pub struct RuntimeError {
    pub line: u32,
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: &str, line: u32) -> RuntimeError {
        RuntimeError {
            line,
            message: message.to_string(),
        }
    }
}

/// Static errors reported during one scan+parse run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<StaticError>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn report(&mut self, error: StaticError) {
        tracing::debug!(line = error.line, message = %error.message, "static error");
        self.errors.push(error);
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[StaticError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<StaticError> {
        self.errors
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("{}", format_static_errors(.0))]
    Static(Vec<StaticError>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

fn format_static_errors(errors: &[StaticError]) -> String {
    errors
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
