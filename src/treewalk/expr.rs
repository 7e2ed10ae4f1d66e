use std::fmt;

use crate::scanner::{Literal, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Assign {
        name: Token,
        value: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
    Grouping {
        expression: Box<Expr>,
    },
    Literal {
        value: LiteralValue,
    },
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Variable {
        name: Token,
    },
}

impl Expr {
    /// Source line of the first token this expression carries, if any.
    pub fn line(&self) -> Option<u32> {
        match self {
            Expr::Assign { name, .. } | Expr::Variable { name } => Some(name.line),
            Expr::Binary { operator, .. } | Expr::Logical { operator, .. } | Expr::Unary { operator, .. } => {
                Some(operator.line)
            }
            Expr::Call { paren, .. } => Some(paren.line),
            Expr::Grouping { expression } => expression.line(),
            Expr::Literal { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Boolean(bool),
    Nil,
    Number(f64),
    String(String),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Nil => write!(f, "nil"),
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value}"),
        }
    }
}

impl From<&Literal> for LiteralValue {
    fn from(literal: &Literal) -> LiteralValue {
        match literal {
            Literal::Number(value) => LiteralValue::Number(*value),
            Literal::String(value) => LiteralValue::String(value.clone()),
        }
    }
}

/// Render an expression in parenthesized prefix form, e.g. `(+ 1 (* 2 3))`.
pub fn print_ast(root: &Expr) -> String {
    let mut printed = String::new();
    format_expr(root, &mut printed);
    printed
}

pub(super) fn format_expr(expr: &Expr, output: &mut String) {
    match expr {
        Expr::Assign { name, value } => {
            format_subexprs("=", &[&Expr::Variable { name: name.clone() }, &**value], output);
        }
        Expr::Binary {
            left,
            operator,
            right,
        }
        | Expr::Logical {
            left,
            operator,
            right,
        } => {
            format_subexprs(&operator.lexeme, &[&**left, &**right], output);
        }
        Expr::Call {
            callee, arguments, ..
        } => {
            let mut operands: Vec<&Expr> = vec![&**callee];
            operands.extend(arguments.iter());
            format_subexprs("call", &operands, output);
        }
        Expr::Grouping { expression } => {
            format_subexprs("group", &[&**expression], output);
        }
        Expr::Literal { value } => match value {
            LiteralValue::String(text) => {
                output.push('"');
                output.push_str(text);
                output.push('"');
            }
            _ => output.push_str(&value.to_string()),
        },
        Expr::Unary { operator, right } => {
            format_subexprs(&operator.lexeme, &[&**right], output);
        }
        Expr::Variable { name } => {
            output.push_str(&name.lexeme);
        }
    }
}

fn format_subexprs(name: &str, exprs: &[&Expr], output: &mut String) {
    output.push('(');
    output.push_str(name);
    for expr in exprs {
        output.push(' ');
        format_expr(expr, output);
    }
    output.push(')');
}
