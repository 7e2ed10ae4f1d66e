use std::io::Write;
use std::mem;
use std::rc::Rc;
use std::result;

use crate::error::RuntimeError;
use crate::scanner::{Token, TokenType};

use super::callable::{standard_library, Callable, FinchFunction};
use super::environment::{Environment, FinchValue};
use super::expr::{Expr, LiteralValue};
use super::stmt::{FunctionDeclaration, Stmt};

type ValueResult = result::Result<FinchValue, RuntimeError>;
type StatementResult = result::Result<Flow, RuntimeError>;

/// How a statement finished. `Return` unwinds to the nearest function call.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(FinchValue),
}

pub struct Interpreter<'a> {
    environment: Rc<Environment>,
    output_writer: &'a mut dyn Write,
}

impl<'a> Interpreter<'a> {
    pub fn new(output_writer: &'a mut dyn Write) -> Interpreter<'a> {
        let globals = Environment::new();
        for native in standard_library() {
            let name = native.name;
            globals.define(name, FinchValue::Callable(Callable::Native(Rc::new(native))));
        }

        Interpreter {
            environment: globals,
            output_writer,
        }
    }

    /// Run top-level statements in order against the global scope, stopping at
    /// the first runtime error. The global scope persists between calls.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = statements.len()))]
    pub fn interpret(&mut self, statements: &[Stmt]) -> result::Result<(), RuntimeError> {
        for statement in statements {
            match self.execute_statement(statement) {
                Ok(Flow::Normal) => {}
                // a stray top-level return just ends the program
                Ok(Flow::Return(_)) => break,
                Err(error) => {
                    tracing::debug!(line = error.line, message = %error.message, "runtime error");
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// Execute `statements` with `environment` as the current scope. The
    /// previous scope is restored however the block exits.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Rc<Environment>) -> StatementResult {
        tracing::trace!(statements = statements.len(), "enter block");
        let previous = mem::replace(&mut self.environment, environment);
        let result = self.execute_statements(statements);
        self.environment = previous;
        tracing::trace!("exit block");
        result
    }

    fn execute_statements(&mut self, statements: &[Stmt]) -> StatementResult {
        for statement in statements {
            if let Flow::Return(value) = self.execute_statement(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_statement(&mut self, statement: &Stmt) -> StatementResult {
        match statement {
            Stmt::Block { statements } => self.block_statement(statements),
            Stmt::Expression { expression } => self.expression_statement(expression),
            Stmt::Function { declaration } => self.function_statement(declaration),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => self.if_statement(condition, then_branch, else_branch.as_deref()),
            Stmt::Print { expression } => self.print_statement(expression),
            Stmt::Return { value, .. } => self.return_statement(value.as_ref()),
            Stmt::Var { name, initializer } => self.var_statement(name, initializer.as_ref()),
            Stmt::While { condition, body } => self.while_statement(condition, body),
        }
    }

    fn block_statement(&mut self, statements: &[Stmt]) -> StatementResult {
        let environment = Environment::new_enclosed(&self.environment);
        self.execute_block(statements, environment)
    }

    fn expression_statement(&mut self, expression: &Expr) -> StatementResult {
        self.evaluate(expression)?;
        Ok(Flow::Normal)
    }

    fn function_statement(&mut self, declaration: &Rc<FunctionDeclaration>) -> StatementResult {
        let function = FinchFunction {
            declaration: Rc::clone(declaration),
            closure: Rc::clone(&self.environment),
        };
        self.environment.define(
            &declaration.name.lexeme,
            FinchValue::Callable(Callable::Function(Rc::new(function))),
        );
        Ok(Flow::Normal)
    }

    fn if_statement(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) -> StatementResult {
        if self.evaluate(condition)?.is_truthy() {
            self.execute_statement(then_branch)
        } else if let Some(else_statement) = else_branch {
            self.execute_statement(else_statement)
        } else {
            Ok(Flow::Normal)
        }
    }

    fn print_statement(&mut self, expression: &Expr) -> StatementResult {
        let result = self.evaluate(expression)?;
        writeln!(self.output_writer, "{result}").map_err(|_| {
            build_error("Unable to write program output.", expression.line().unwrap_or_default())
        })?;
        Ok(Flow::Normal)
    }

    fn return_statement(&mut self, value: Option<&Expr>) -> StatementResult {
        let return_value = match value {
            Some(expression) => self.evaluate(expression)?,
            None => FinchValue::Nil,
        };
        Ok(Flow::Return(return_value))
    }

    fn var_statement(&mut self, name: &Token, initializer: Option<&Expr>) -> StatementResult {
        match initializer {
            Some(initializer) => {
                let value = self.evaluate(initializer)?;
                self.environment.define(&name.lexeme, value);
            }
            None => self.environment.declare(&name.lexeme),
        }
        Ok(Flow::Normal)
    }

    fn while_statement(&mut self, condition: &Expr, body: &Stmt) -> StatementResult {
        while self.evaluate(condition)?.is_truthy() {
            if let Flow::Return(value) = self.execute_statement(body)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn evaluate(&mut self, expression: &Expr) -> ValueResult {
        match expression {
            Expr::Assign { name, value } => self.evaluate_assign(name, value),
            Expr::Binary { left, operator, right } => self.evaluate_binary(left, operator, right),
            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),
            Expr::Grouping { expression } => self.evaluate(expression),
            Expr::Literal { value } => Ok(evaluate_literal(value)),
            Expr::Logical { left, operator, right } => self.evaluate_logical(left, operator, right),
            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),
            Expr::Variable { name } => self.environment.get(name),
        }
    }

    fn evaluate_assign(&mut self, name: &Token, value: &Expr) -> ValueResult {
        let result = self.evaluate(value)?;
        self.environment.assign(name, result.clone())?;
        Ok(result)
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> ValueResult {
        let left_evaluated = self.evaluate(left)?;
        let right_evaluated = self.evaluate(right)?;

        match operator.token_type {
            TokenType::EqualEqual => Ok(FinchValue::from(left_evaluated == right_evaluated)),
            TokenType::BangEqual => Ok(FinchValue::from(left_evaluated != right_evaluated)),
            TokenType::Plus => match (&left_evaluated, &right_evaluated) {
                (FinchValue::Number(left_number), FinchValue::Number(right_number)) => {
                    Ok(FinchValue::from(left_number + right_number))
                }
                (FinchValue::String(left_string), FinchValue::String(right_string)) => {
                    Ok(FinchValue::from(format!("{left_string}{right_string}")))
                }
                _ => Err(build_error(
                    "Operands of '+' must be two numbers or two strings.",
                    operator.line,
                )),
            },
            _ => {
                let (left_number, right_number) = number_operands(operator, &left_evaluated, &right_evaluated)?;
                let evaluated = match operator.token_type {
                    TokenType::Minus => FinchValue::from(left_number - right_number),
                    TokenType::Star => FinchValue::from(left_number * right_number),
                    TokenType::Slash => {
                        if right_number == 0.0 {
                            return Err(build_error("Division by zero.", operator.line));
                        }
                        FinchValue::from(left_number / right_number)
                    }
                    TokenType::Greater => FinchValue::from(left_number > right_number),
                    TokenType::GreaterEqual => FinchValue::from(left_number >= right_number),
                    TokenType::Less => FinchValue::from(left_number < right_number),
                    TokenType::LessEqual => FinchValue::from(left_number <= right_number),
                    _ => {
                        return Err(build_error(
                            &format!("Unknown binary operator '{}'.", operator.lexeme),
                            operator.line,
                        ))
                    }
                };
                Ok(evaluated)
            }
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> ValueResult {
        let callee = self.evaluate(callee)?;

        let mut evaluated_args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            evaluated_args.push(self.evaluate(argument)?);
        }

        let FinchValue::Callable(callable) = callee else {
            return Err(build_error("Can only call functions and natives.", paren.line));
        };

        if evaluated_args.len() != callable.arity() {
            return Err(build_error(
                &format!(
                    "Arity mismatch: expected {} arguments but got {}.",
                    callable.arity(),
                    evaluated_args.len()
                ),
                paren.line,
            ));
        }

        callable.call(self, evaluated_args, paren.line)
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> ValueResult {
        let left_evaluated = self.evaluate(left)?;

        // short circuit if possible
        match operator.token_type {
            TokenType::Or if left_evaluated.is_truthy() => return Ok(left_evaluated),
            TokenType::And if !left_evaluated.is_truthy() => return Ok(left_evaluated),
            TokenType::Or | TokenType::And => {}
            _ => return Err(build_error("Unhandled logical operator.", operator.line)),
        }

        self.evaluate(right)
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> ValueResult {
        let operand = self.evaluate(right)?;
        match operator.token_type {
            TokenType::Bang => Ok(FinchValue::from(!operand.is_truthy())),
            TokenType::Minus => match operand {
                FinchValue::Number(original) => Ok(FinchValue::from(-original)),
                _ => Err(build_error("Operand of '-' must be a number.", operator.line)),
            },
            _ => Err(build_error(
                &format!("Unknown unary operator '{}'.", operator.lexeme),
                operator.line,
            )),
        }
    }
}

fn evaluate_literal(value: &LiteralValue) -> FinchValue {
    FinchValue::from(value)
}

fn number_operands(operator: &Token, left: &FinchValue, right: &FinchValue) -> result::Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (FinchValue::Number(left_number), FinchValue::Number(right_number)) => Ok((*left_number, *right_number)),
        _ => Err(build_error(
            &format!("Operands of '{}' must be numbers.", operator.lexeme),
            operator.line,
        )),
    }
}

fn build_error(message: &str, line: u32) -> RuntimeError {
    RuntimeError::new(message, line)
}
