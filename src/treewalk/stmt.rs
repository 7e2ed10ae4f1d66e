use std::rc::Rc;

use crate::scanner::Token;

use super::expr::{format_expr, Expr};

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block {
        statements: Vec<Stmt>,
    },
    Expression {
        expression: Expr,
    },
    Function {
        declaration: Rc<FunctionDeclaration>,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Print {
        expression: Expr,
    },
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}

/// Shared between the statement tree and every function value created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

/// Render each top-level statement on its own line in parenthesized prefix form.
pub fn print_program(statements: &[Stmt]) -> String {
    statements
        .iter()
        .map(|statement| {
            let mut printed = String::new();
            format_stmt(statement, &mut printed);
            printed
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_stmt(statement: &Stmt, output: &mut String) {
    match statement {
        Stmt::Block { statements } => {
            output.push_str("(block");
            format_body(statements, output);
            output.push(')');
        }
        Stmt::Expression { expression } => {
            output.push_str("(; ");
            format_expr(expression, output);
            output.push(')');
        }
        Stmt::Function { declaration } => {
            output.push_str("(fun ");
            output.push_str(&declaration.name.lexeme);
            output.push_str(" (");
            let params: Vec<&str> = declaration.params.iter().map(|param| param.lexeme.as_str()).collect();
            output.push_str(&params.join(" "));
            output.push(')');
            format_body(&declaration.body, output);
            output.push(')');
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            output.push_str("(if ");
            format_expr(condition, output);
            output.push(' ');
            format_stmt(then_branch, output);
            if let Some(else_branch) = else_branch {
                output.push(' ');
                format_stmt(else_branch, output);
            }
            output.push(')');
        }
        Stmt::Print { expression } => {
            output.push_str("(print ");
            format_expr(expression, output);
            output.push(')');
        }
        Stmt::Return { value, .. } => {
            output.push_str("(return");
            if let Some(value) = value {
                output.push(' ');
                format_expr(value, output);
            }
            output.push(')');
        }
        Stmt::Var { name, initializer } => {
            output.push_str("(var ");
            output.push_str(&name.lexeme);
            if let Some(initializer) = initializer {
                output.push(' ');
                format_expr(initializer, output);
            }
            output.push(')');
        }
        Stmt::While { condition, body } => {
            output.push_str("(while ");
            format_expr(condition, output);
            output.push(' ');
            format_stmt(body, output);
            output.push(')');
        }
    }
}

fn format_body(statements: &[Stmt], output: &mut String) {
    for statement in statements {
        output.push(' ');
        format_stmt(statement, output);
    }
}
