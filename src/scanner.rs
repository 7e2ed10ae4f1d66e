use crate::error::{Diagnostics, Location, StaticError};

pub fn scan_tokens(code: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let mut scanner = Scanner {
        chars: code.chars().collect(),
        cursor_begin: 0,
        cursor_end: 0,
        line: 1,
        tokens: Vec::new(),
        diagnostics,
    };

    while !scanner.at_end() {
        scanner.cursor_begin = scanner.cursor_end;
        scanner.scan_token();
    }

    let line = scanner.line;
    scanner.tokens.push(Token {
        token_type: TokenType::EOF,
        lexeme: String::new(),
        literal: None,
        line,
    });

    tracing::debug!(
        tokens = scanner.tokens.len(),
        errors = scanner.diagnostics.errors().len(),
        "scan finished"
    );
    scanner.tokens
}

struct Scanner<'d> {
    chars: Vec<char>,
    cursor_begin: usize,
    cursor_end: usize,
    line: u32,
    tokens: Vec<Token>,
    diagnostics: &'d mut Diagnostics,
}

impl Scanner<'_> {
    fn scan_token(&mut self) {
        let current = self.advance();

        match current {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            '.' => self.add_token(TokenType::Dot),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            ';' => self.add_token(TokenType::Semicolon),
            '*' => self.add_token(TokenType::Star),
            '!' => self.add_either('=', TokenType::BangEqual, TokenType::Bang),
            '=' => self.add_either('=', TokenType::EqualEqual, TokenType::Equal),
            '<' => self.add_either('=', TokenType::LessEqual, TokenType::Less),
            '>' => self.add_either('=', TokenType::GreaterEqual, TokenType::Greater),
            '/' => {
                if self.advance_if('/') {
                    while self.peek() != Some('\n') && !self.at_end() {
                        self.advance();
                    }
                } else if self.advance_if('*') {
                    self.block_comment();
                } else {
                    self.add_token(TokenType::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if is_alpha(c) => self.identifier(),
            _ => self.error("Unexpected character."),
        }
    }

    // block comments nest, so track how many are still open
    fn block_comment(&mut self) {
        let mut depth = 1;
        while depth > 0 {
            match (self.peek(), self.peek_next()) {
                (None, _) => {
                    self.error("Unterminated block comment.");
                    return;
                }
                (Some('*'), Some('/')) => {
                    self.cursor_end += 2;
                    depth -= 1;
                }
                (Some('/'), Some('*')) => {
                    self.cursor_end += 2;
                    depth += 1;
                }
                (Some('\n'), _) => {
                    self.line += 1;
                    self.cursor_end += 1;
                }
                _ => self.cursor_end += 1,
            }
        }
    }

    fn string(&mut self) {
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.at_end() {
            self.error("Unterminated string.");
            return;
        }

        // closing quote
        self.advance();

        let value: String = self.chars[self.cursor_begin + 1..self.cursor_end - 1].iter().collect();
        self.add_literal_token(TokenType::String, Some(Literal::String(value)));
    }

    fn number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = self.current_lexeme();
        match text.parse::<f64>() {
            Ok(value) => self.add_literal_token(TokenType::Number, Some(Literal::Number(value))),
            Err(_) => self.error("Invalid number literal."),
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_some_and(is_alphanumeric) {
            self.advance();
        }

        let token_type = keyword(&self.current_lexeme()).unwrap_or(TokenType::Identifier);
        self.add_token(token_type);
    }

    fn at_end(&self) -> bool {
        self.cursor_end >= self.chars.len()
    }

    fn advance(&mut self) -> char {
        let current = self.chars[self.cursor_end];
        self.cursor_end += 1;
        current
    }

    fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.cursor_end += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor_end).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.cursor_end + 1).copied()
    }

    fn current_lexeme(&self) -> String {
        self.chars[self.cursor_begin..self.cursor_end].iter().collect()
    }

    fn add_either(&mut self, second: char, matched: TokenType, single: TokenType) {
        let token_type = if self.advance_if(second) { matched } else { single };
        self.add_token(token_type);
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.add_literal_token(token_type, None);
    }

    fn add_literal_token(&mut self, token_type: TokenType, literal: Option<Literal>) {
        let lexeme = self.current_lexeme();
        self.tokens.push(Token {
            token_type,
            lexeme,
            literal,
            line: self.line,
        });
    }

    fn error(&mut self, message: &str) {
        self.diagnostics
            .report(StaticError::new(self.line, Location::None, message));
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alphanumeric(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}

fn keyword(text: &str) -> Option<TokenType> {
    let token_type = match text {
        "and" => TokenType::And,
        "class" => TokenType::Class,
        "else" => TokenType::Else,
        "false" => TokenType::False,
        "fun" => TokenType::Fun,
        "for" => TokenType::For,
        "if" => TokenType::If,
        "nil" => TokenType::Nil,
        "or" => TokenType::Or,
        "print" => TokenType::Print,
        "return" => TokenType::Return,
        "super" => TokenType::Super,
        "this" => TokenType::This,
        "true" => TokenType::True,
        "var" => TokenType::Var,
        "while" => TokenType::While,
        _ => return None,
    };
    Some(token_type)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: u32,
}

/// Parsed value carried by number and string tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Single-character tokens.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One or two character tokens.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals.
    Identifier,
    String,
    Number,

    // Keywords.
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    EOF,
}
