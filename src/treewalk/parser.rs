use std::rc::Rc;
use std::result;

use crate::error::{Diagnostics, Location, StaticError};
use crate::scanner::{Token, TokenType};

use super::expr::{Expr, LiteralValue};
use super::stmt::{FunctionDeclaration, Stmt};

const MAX_ARGUMENTS: usize = 255;

type ParseResult<T> = result::Result<T, StaticError>;
type StmtResult = ParseResult<Stmt>;
type ExprResult = ParseResult<Expr>;

/// Parse a token stream that ends in an EOF token. Statements containing a
/// syntax error are reported to `diagnostics` and left out of the result.
#[tracing::instrument(level = "debug", skip_all, fields(tokens = tokens.len()))]
pub fn parse(tokens: &[Token], diagnostics: &mut Diagnostics) -> Vec<Stmt> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut cursor = TokenCursor::new(tokens, diagnostics);
    let mut statements = Vec::new();

    while !cursor.at_end() {
        if let Some(statement) = declaration(&mut cursor) {
            statements.push(statement);
        }
    }

    tracing::debug!(statements = statements.len(), "parse finished");
    statements
}

fn declaration(cursor: &mut TokenCursor) -> Option<Stmt> {
    let result = match cursor.peek().token_type {
        TokenType::Fun => {
            cursor.advance();
            function_declaration(cursor)
        }
        TokenType::Var => var_declaration(cursor),
        _ => statement(cursor),
    };

    match result {
        Ok(statement) => Some(statement),
        Err(error) => {
            cursor.diagnostics.report(error);
            cursor.synchronize();
            None
        }
    }
}

fn function_declaration(cursor: &mut TokenCursor) -> StmtResult {
    let name = cursor.consume(TokenType::Identifier, "Expect function name.")?;
    cursor.consume(TokenType::LeftParen, "Expect '(' after function name.")?;

    let mut params = Vec::new();
    if !cursor.check(TokenType::RightParen) {
        loop {
            if params.len() >= MAX_ARGUMENTS {
                let error = cursor.error_at_current("Can't have more than 255 parameters.");
                cursor.diagnostics.report(error);
            }
            params.push(cursor.consume(TokenType::Identifier, "Expect parameter name.")?);
            if cursor.advance_if_match(TokenType::Comma).is_none() {
                break;
            }
        }
    }
    cursor.consume(TokenType::RightParen, "Expect ')' after parameters.")?;

    cursor.consume(TokenType::LeftBrace, "Expect '{' before function body.")?;
    let body = block_body(cursor)?;

    Ok(Stmt::Function {
        declaration: Rc::new(FunctionDeclaration { name, params, body }),
    })
}

fn var_declaration(cursor: &mut TokenCursor) -> StmtResult {
    cursor.consume(TokenType::Var, "Expect 'var'.")?;
    let name = cursor.consume(TokenType::Identifier, "Expect variable name.")?;

    // no initializer leaves the variable declared but unassigned
    let initializer = if cursor.advance_if_match(TokenType::Equal).is_some() {
        Some(expression(cursor)?)
    } else {
        None
    };

    cursor.consume(TokenType::Semicolon, "Expect ';' after variable declaration.")?;

    Ok(Stmt::Var { name, initializer })
}

fn statement(cursor: &mut TokenCursor) -> StmtResult {
    let leading = [
        TokenType::For,
        TokenType::If,
        TokenType::Print,
        TokenType::Return,
        TokenType::While,
        TokenType::LeftBrace,
    ];

    if let Some(token) = cursor.advance_if_any_match(&leading) {
        match token.token_type {
            TokenType::For => for_statement(cursor),
            TokenType::If => if_statement(cursor),
            TokenType::Print => print_statement(cursor),
            TokenType::Return => return_statement(token, cursor),
            TokenType::While => while_statement(cursor),
            _ => Ok(Stmt::Block {
                statements: block_body(cursor)?,
            }),
        }
    } else {
        expression_statement(cursor)
    }
}

// for loops have no node of their own, they become a while loop inside a block
fn for_statement(cursor: &mut TokenCursor) -> StmtResult {
    cursor.consume(TokenType::LeftParen, "Expect '(' after 'for'.")?;

    let initializer = if cursor.advance_if_match(TokenType::Semicolon).is_some() {
        None
    } else if cursor.check(TokenType::Var) {
        Some(var_declaration(cursor)?)
    } else {
        Some(expression_statement(cursor)?)
    };

    let condition = if cursor.check(TokenType::Semicolon) {
        None
    } else {
        Some(expression(cursor)?)
    };
    cursor.consume(TokenType::Semicolon, "Expect ';' after loop condition.")?;

    let increment = if cursor.check(TokenType::RightParen) {
        None
    } else {
        Some(expression(cursor)?)
    };
    cursor.consume(TokenType::RightParen, "Expect ')' after for clauses.")?;

    let mut body = statement(cursor)?;

    if let Some(increment) = increment {
        body = Stmt::Block {
            statements: vec![body, Stmt::Expression { expression: increment }],
        };
    }

    let condition = condition.unwrap_or(Expr::Literal {
        value: LiteralValue::Boolean(true),
    });
    body = Stmt::While {
        condition,
        body: Box::new(body),
    };

    if let Some(initializer) = initializer {
        body = Stmt::Block {
            statements: vec![initializer, body],
        };
    }

    Ok(body)
}

fn if_statement(cursor: &mut TokenCursor) -> StmtResult {
    cursor.consume(TokenType::LeftParen, "Expect '(' after 'if'.")?;
    let condition = expression(cursor)?;
    cursor.consume(TokenType::RightParen, "Expect ')' after if condition.")?;

    // else binds to the nearest if
    let then_branch = Box::new(statement(cursor)?);
    let else_branch = if cursor.advance_if_match(TokenType::Else).is_some() {
        Some(Box::new(statement(cursor)?))
    } else {
        None
    };

    Ok(Stmt::If {
        condition,
        then_branch,
        else_branch,
    })
}

fn print_statement(cursor: &mut TokenCursor) -> StmtResult {
    let expression = expression(cursor)?;
    cursor.consume(TokenType::Semicolon, "Expect ';' after value.")?;
    Ok(Stmt::Print { expression })
}

fn return_statement(keyword: Token, cursor: &mut TokenCursor) -> StmtResult {
    let value = if cursor.check(TokenType::Semicolon) {
        None
    } else {
        Some(expression(cursor)?)
    };
    cursor.consume(TokenType::Semicolon, "Expect ';' after return value.")?;
    Ok(Stmt::Return { keyword, value })
}

fn while_statement(cursor: &mut TokenCursor) -> StmtResult {
    cursor.consume(TokenType::LeftParen, "Expect '(' after 'while'.")?;
    let condition = expression(cursor)?;
    cursor.consume(TokenType::RightParen, "Expect ')' after condition.")?;
    let body = Box::new(statement(cursor)?);
    Ok(Stmt::While { condition, body })
}

fn expression_statement(cursor: &mut TokenCursor) -> StmtResult {
    let expression = expression(cursor)?;
    cursor.consume(TokenType::Semicolon, "Expect ';' after expression.")?;
    Ok(Stmt::Expression { expression })
}

// Expects the opening brace to be consumed already.
fn block_body(cursor: &mut TokenCursor) -> ParseResult<Vec<Stmt>> {
    let mut statements = Vec::new();
    while !cursor.check(TokenType::RightBrace) && !cursor.at_end() {
        if let Some(statement) = declaration(cursor) {
            statements.push(statement);
        }
    }
    cursor.consume(TokenType::RightBrace, "Expect '}' after block.")?;
    Ok(statements)
}

fn expression(cursor: &mut TokenCursor) -> ExprResult {
    assignment(cursor)
}

fn assignment(cursor: &mut TokenCursor) -> ExprResult {
    let expr = or(cursor)?;

    if let Some(equal) = cursor.advance_if_match(TokenType::Equal) {
        let value = assignment(cursor)?;

        return match expr {
            Expr::Variable { name } => Ok(Expr::Assign {
                name,
                value: Box::new(value),
            }),
            _ => {
                // reported without unwinding, the parser is not confused
                let error = error_at(&equal, "Invalid assignment target.");
                cursor.diagnostics.report(error);
                Ok(expr)
            }
        };
    }

    Ok(expr)
}

fn or(cursor: &mut TokenCursor) -> ExprResult {
    logical_left_associative(cursor, and, TokenType::Or)
}

fn and(cursor: &mut TokenCursor) -> ExprResult {
    logical_left_associative(cursor, equality, TokenType::And)
}

fn logical_left_associative(
    cursor: &mut TokenCursor,
    higher_precedence: fn(&mut TokenCursor) -> ExprResult,
    token_type: TokenType,
) -> ExprResult {
    let mut expr = higher_precedence(cursor)?;

    while let Some(operator) = cursor.advance_if_match(token_type) {
        let right = higher_precedence(cursor)?;
        expr = Expr::Logical {
            left: Box::new(expr),
            operator,
            right: Box::new(right),
        };
    }

    Ok(expr)
}

fn equality(cursor: &mut TokenCursor) -> ExprResult {
    binary_left_associative(cursor, comparison, &[TokenType::BangEqual, TokenType::EqualEqual])
}

fn comparison(cursor: &mut TokenCursor) -> ExprResult {
    binary_left_associative(
        cursor,
        term,
        &[
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ],
    )
}

fn term(cursor: &mut TokenCursor) -> ExprResult {
    binary_left_associative(cursor, factor, &[TokenType::Minus, TokenType::Plus])
}

fn factor(cursor: &mut TokenCursor) -> ExprResult {
    binary_left_associative(cursor, unary, &[TokenType::Slash, TokenType::Star])
}

// Parse a binary left associative expression as long as the current token matches one of the given types
fn binary_left_associative(
    cursor: &mut TokenCursor,
    higher_precedence: fn(&mut TokenCursor) -> ExprResult,
    types: &[TokenType],
) -> ExprResult {
    let mut expr = higher_precedence(cursor)?;

    while let Some(operator) = cursor.advance_if_any_match(types) {
        let right = higher_precedence(cursor)?;
        expr = Expr::Binary {
            left: Box::new(expr),
            operator,
            right: Box::new(right),
        };
    }

    Ok(expr)
}

fn unary(cursor: &mut TokenCursor) -> ExprResult {
    if let Some(operator) = cursor.advance_if_any_match(&[TokenType::Bang, TokenType::Minus]) {
        let right = unary(cursor)?;
        return Ok(Expr::Unary {
            operator,
            right: Box::new(right),
        });
    }

    call(cursor)
}

fn call(cursor: &mut TokenCursor) -> ExprResult {
    let mut expr = primary(cursor)?;

    while cursor.advance_if_match(TokenType::LeftParen).is_some() {
        expr = finish_call(cursor, expr)?;
    }

    Ok(expr)
}

fn finish_call(cursor: &mut TokenCursor, callee: Expr) -> ExprResult {
    let mut arguments = Vec::new();
    if !cursor.check(TokenType::RightParen) {
        loop {
            if arguments.len() >= MAX_ARGUMENTS {
                let error = cursor.error_at_current("Can't have more than 255 arguments.");
                cursor.diagnostics.report(error);
            }
            arguments.push(expression(cursor)?);
            if cursor.advance_if_match(TokenType::Comma).is_none() {
                break;
            }
        }
    }

    let paren = cursor.consume(TokenType::RightParen, "Expect ')' after arguments.")?;

    Ok(Expr::Call {
        callee: Box::new(callee),
        paren,
        arguments,
    })
}

fn primary(cursor: &mut TokenCursor) -> ExprResult {
    let current = cursor.peek().clone();

    let expr = match current.token_type {
        TokenType::False => Expr::Literal {
            value: LiteralValue::Boolean(false),
        },
        TokenType::True => Expr::Literal {
            value: LiteralValue::Boolean(true),
        },
        TokenType::Nil => Expr::Literal {
            value: LiteralValue::Nil,
        },
        TokenType::Number | TokenType::String => match &current.literal {
            Some(literal) => Expr::Literal {
                value: LiteralValue::from(literal),
            },
            None => return Err(error_at(&current, "Expect expression.")),
        },
        TokenType::Identifier => Expr::Variable { name: current },
        TokenType::LeftParen => {
            cursor.advance();
            let expr = expression(cursor)?;
            cursor.consume(TokenType::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping {
                expression: Box::new(expr),
            });
        }
        _ => return Err(error_at(&current, "Expect expression.")),
    };

    cursor.advance();
    Ok(expr)
}

fn error_at(token: &Token, message: &str) -> StaticError {
    let location = match token.token_type {
        TokenType::EOF => Location::End,
        _ => Location::Lexeme(token.lexeme.clone()),
    };
    StaticError::new(token.line, location, message)
}

struct TokenCursor<'a, 'd> {
    tokens: &'a [Token],
    index: usize,
    diagnostics: &'d mut Diagnostics,
}

impl<'a, 'd> TokenCursor<'a, 'd> {
    fn new(tokens: &'a [Token], diagnostics: &'d mut Diagnostics) -> TokenCursor<'a, 'd> {
        TokenCursor {
            tokens,
            index: 0,
            diagnostics,
        }
    }

    // callers guarantee the stream is non-empty, so the last token is always there
    fn peek(&self) -> &'a Token {
        let index = self.index.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn previous(&self) -> &'a Token {
        let index = self.index.saturating_sub(1).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn advance(&mut self) {
        if !self.at_end() {
            self.index += 1;
        }
    }

    fn at_end(&self) -> bool {
        self.index >= self.tokens.len() || self.peek().token_type == TokenType::EOF
    }

    fn check(&self, token_type: TokenType) -> bool {
        !self.at_end() && self.peek().token_type == token_type
    }

    fn advance_if_match(&mut self, token_type: TokenType) -> Option<Token> {
        self.advance_if_any_match(&[token_type])
    }

    fn advance_if_any_match(&mut self, types: &[TokenType]) -> Option<Token> {
        let token = self.peek();
        if !self.at_end() && types.contains(&token.token_type) {
            self.advance();
            Some(token.clone())
        } else {
            None
        }
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> ParseResult<Token> {
        self.advance_if_match(token_type)
            .ok_or_else(|| self.error_at_current(message))
    }

    fn error_at_current(&self, message: &str) -> StaticError {
        error_at(self.peek(), message)
    }

    // Skip tokens until the start of what looks like the next statement.
    fn synchronize(&mut self) {
        self.advance();

        while !self.at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            match self.peek().token_type {
                TokenType::Class
                | TokenType::Fun
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => self.advance(),
            }
        }
    }
}
