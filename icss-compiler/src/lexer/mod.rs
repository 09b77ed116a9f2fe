use anyhow::Result;
use thiserror::Error;

use crate::source::SourceFile;

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Self {
            kind,
            lexeme,
            line,
            column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Lower-case name: tag selectors and property names.
    Identifier,
    /// Capitalised name: variables.
    Variable,
    IdSelector(String),
    ClassSelector(String),
    Color(String),
    Pixel(i64),
    Percentage(i64),
    Scalar(i64),
    Boolean(bool),
    Keyword(Keyword),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Colon,
    Assign, // :=
    Comma,
    Plus,
    Minus,
    Star,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    If,
    Else,
}

#[derive(Debug, Clone, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct LexerError {
    message: String,
    line: usize,
    column: usize,
}

impl LexerError {
    fn new<S: Into<String>>(message: S, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a SourceFile) -> Self {
        Self {
            input: &source.contents,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance_char();
                }
                '/' if self.peek_next_char() == Some('*') => {
                    self.skip_comment()?;
                }
                '0'..='9' => {
                    let token = self.lex_number()?;
                    tokens.push(token);
                }
                'a'..='z' => tokens.push(self.lex_identifier_or_keyword()),
                'A'..='Z' => tokens.push(self.lex_variable_or_boolean()),
                '#' => {
                    let token = self.lex_hash()?;
                    tokens.push(token);
                }
                '.' => {
                    let token = self.lex_class_selector()?;
                    tokens.push(token);
                }
                ':' => {
                    let token = self.lex_colon_variants();
                    tokens.push(token);
                }
                '{' => tokens.push(self.simple_token(TokenKind::LBrace)),
                '}' => tokens.push(self.simple_token(TokenKind::RBrace)),
                '[' => tokens.push(self.simple_token(TokenKind::LBracket)),
                ']' => tokens.push(self.simple_token(TokenKind::RBracket)),
                ';' => tokens.push(self.simple_token(TokenKind::Semicolon)),
                ',' => tokens.push(self.simple_token(TokenKind::Comma)),
                '+' => tokens.push(self.simple_token(TokenKind::Plus)),
                '-' => tokens.push(self.simple_token(TokenKind::Minus)),
                '*' => tokens.push(self.simple_token(TokenKind::Star)),
                other => {
                    return Err(LexerError::new(
                        format!("Unexpected character '{other}'"),
                        self.line,
                        self.column,
                    )
                    .into());
                }
            }
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));

        Ok(tokens)
    }

    fn skip_comment(&mut self) -> Result<()> {
        let start_line = self.line;
        let start_column = self.column;
        self.advance_char(); // consume '/'
        self.advance_char(); // consume '*'

        while let Some(ch) = self.advance_char() {
            if ch == '*' && self.peek_char() == Some('/') {
                self.advance_char();
                return Ok(());
            }
        }

        Err(LexerError::new("Unterminated comment", start_line, start_column).into())
    }

    fn lex_number(&mut self) -> Result<Token> {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        while matches!(self.peek_char(), Some('0'..='9')) {
            self.advance_char();
        }
        let digits = self.slice(start, self.position);
        let value = digits.parse::<i64>().map_err(|_| {
            LexerError::new(
                format!("Failed to parse number literal '{digits}'"),
                start_line,
                start_column,
            )
        })?;

        let kind = if self.peek_char() == Some('p') && self.peek_next_char() == Some('x') {
            self.advance_char();
            self.advance_char();
            TokenKind::Pixel(value)
        } else if self.peek_char() == Some('%') {
            self.advance_char();
            TokenKind::Percentage(value)
        } else {
            TokenKind::Scalar(value)
        };

        Ok(Token::new(
            kind,
            self.slice(start, self.position).to_string(),
            start_line,
            start_column,
        ))
    }

    fn lex_identifier_or_keyword(&mut self) -> Token {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;
        self.consume_name();

        let lexeme = self.slice(start, self.position).to_string();
        let kind = match keyword_from_lexeme(&lexeme) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier,
        };
        Token::new(kind, lexeme, start_line, start_column)
    }

    fn lex_variable_or_boolean(&mut self) -> Token {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;
        while matches!(self.peek_char(), Some(ch) if ch.is_ascii_alphanumeric() || ch == '_') {
            self.advance_char();
        }

        let lexeme = self.slice(start, self.position).to_string();
        let kind = match lexeme.as_str() {
            "TRUE" => TokenKind::Boolean(true),
            "FALSE" => TokenKind::Boolean(false),
            _ => TokenKind::Variable,
        };
        Token::new(kind, lexeme, start_line, start_column)
    }

    /// `#` followed by exactly six hex digits is a color; any other name is an id selector.
    fn lex_hash(&mut self) -> Result<Token> {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;
        self.advance_char(); // consume '#'

        let name_start = self.position;
        self.consume_name();
        let name = self.slice(name_start, self.position);
        if name.is_empty() {
            return Err(
                LexerError::new("Expected a name after '#'", start_line, start_column).into(),
            );
        }

        let kind = if name.len() == 6 && name.chars().all(|ch| ch.is_ascii_hexdigit()) {
            TokenKind::Color(self.slice(start, self.position).to_string())
        } else {
            TokenKind::IdSelector(name.to_string())
        };
        Ok(Token::new(
            kind,
            self.slice(start, self.position).to_string(),
            start_line,
            start_column,
        ))
    }

    fn lex_class_selector(&mut self) -> Result<Token> {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;
        self.advance_char(); // consume '.'

        let name_start = self.position;
        self.consume_name();
        let name = self.slice(name_start, self.position);
        if name.is_empty() {
            return Err(
                LexerError::new("Expected a name after '.'", start_line, start_column).into(),
            );
        }

        Ok(Token::new(
            TokenKind::ClassSelector(name.to_string()),
            self.slice(start, self.position).to_string(),
            start_line,
            start_column,
        ))
    }

    fn lex_colon_variants(&mut self) -> Token {
        let start_line = self.line;
        let start_column = self.column;
        let start = self.position;
        self.advance_char(); // consume ':'

        let kind = if self.peek_char() == Some('=') {
            self.advance_char();
            TokenKind::Assign
        } else {
            TokenKind::Colon
        };
        Token::new(
            kind,
            self.slice(start, self.position).to_string(),
            start_line,
            start_column,
        )
    }

    fn consume_name(&mut self) {
        while matches!(
            self.peek_char(),
            Some(ch) if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
        ) {
            self.advance_char();
        }
    }

    fn simple_token(&mut self, kind: TokenKind) -> Token {
        let start_line = self.line;
        let start_column = self.column;
        let start = self.position;
        self.advance_char();
        Token::new(
            kind,
            self.slice(start, self.position).to_string(),
            start_line,
            start_column,
        )
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.input[self.position..].chars();
        iter.next()?;
        iter.next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else if ch != '\r' {
            self.column += 1;
        }
        Some(ch)
    }

    fn slice(&self, start: usize, end: usize) -> &str {
        &self.input[start..end]
    }
}

fn keyword_from_lexeme(lexeme: &str) -> Option<Keyword> {
    match lexeme {
        "if" => Some(Keyword::If),
        "else" => Some(Keyword::Else),
        _ => None,
    }
}
