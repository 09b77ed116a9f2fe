use anyhow::{anyhow, Result};

use crate::ast::{Ast, Literal, NodeId, NodeKind, Operator, Selector, SourceSpan};
use crate::diagnostics::Diagnostics;
use crate::lexer::{Keyword, Token, TokenKind};
use crate::source::SourceFile;

/// Deepest if/else nesting, and most operators in one expression, accepted before parsing
/// gives up.
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Copy, Clone, PartialEq, PartialOrd)]
enum Precedence {
    Lowest = 0,
    Term,
    Factor,
}

impl Precedence {
    fn of(kind: &TokenKind) -> Option<(Self, Operator)> {
        match kind {
            TokenKind::Plus => Some((Precedence::Term, Operator::Add)),
            TokenKind::Minus => Some((Precedence::Term, Operator::Subtract)),
            TokenKind::Star => Some((Precedence::Factor, Operator::Multiply)),
            _ => None,
        }
    }
}

pub struct Parser<'a> {
    _source: &'a SourceFile,
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
    operators: usize,
    ast: Ast,
    diagnostics: Diagnostics,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a SourceFile, tokens: Vec<Token>) -> Self {
        Self {
            _source: source,
            tokens,
            current: 0,
            depth: 0,
            operators: 0,
            ast: Ast::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    fn span_from_token(token: &Token) -> SourceSpan {
        let len = token.lexeme.chars().count().max(1);
        SourceSpan::new(
            token.line,
            token.column,
            token.line,
            token.column + len.saturating_sub(1),
        )
    }

    fn union_spans(&self, a: NodeId, b: NodeId) -> Option<SourceSpan> {
        match (self.ast.span(a), self.ast.span(b)) {
            (Some(a), Some(b)) => Some(SourceSpan::union(&a, &b)),
            (a, b) => a.or(b),
        }
    }

    pub fn parse(&mut self) -> Result<Ast> {
        let root = self.ast.root();
        while !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::Variable => self.parse_assignment(root)?,
                _ => self.parse_stylerule(root)?,
            }
        }
        Ok(std::mem::take(&mut self.ast))
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn parse_stylerule(&mut self, parent: NodeId) -> Result<()> {
        let span = Self::span_from_token(self.peek());
        let rule = self.ast.add_node(NodeKind::Stylerule, Some(span));

        self.parse_selector(rule)?;
        while matches!(self.peek_kind(), TokenKind::Comma) {
            self.advance();
            self.parse_selector(rule)?;
        }

        self.expect_token(TokenKind::LBrace, "expected '{' after selector")?;
        self.parse_body(rule)?;
        self.expect_token(TokenKind::RBrace, "expected '}' to close stylerule")?;

        self.ast.push_child(parent, rule);
        Ok(())
    }

    fn parse_selector(&mut self, rule: NodeId) -> Result<()> {
        let token = self.peek().clone();
        let selector = match &token.kind {
            TokenKind::Identifier => Selector::Tag(token.lexeme.clone()),
            TokenKind::IdSelector(name) => Selector::Id(name.clone()),
            TokenKind::ClassSelector(name) => Selector::Class(name.clone()),
            // `#abcdef` lexes as a color but is a valid id in selector position.
            TokenKind::Color(hex) => Selector::Id(hex.trim_start_matches('#').to_string()),
            _ => return Err(self.unexpected("expected selector")),
        };
        self.advance();
        self.ast.append(
            rule,
            NodeKind::Selector(selector),
            Some(Self::span_from_token(&token)),
        );
        Ok(())
    }

    fn parse_body(&mut self, container: NodeId) -> Result<()> {
        loop {
            match self.peek_kind() {
                TokenKind::RBrace | TokenKind::Eof => return Ok(()),
                TokenKind::Identifier => self.parse_declaration(container)?,
                TokenKind::Variable => self.parse_assignment(container)?,
                TokenKind::Keyword(Keyword::If) => self.parse_if_clause(container)?,
                _ => {
                    return Err(
                        self.unexpected("expected declaration, variable assignment or if clause")
                    )
                }
            }
        }
    }

    fn parse_declaration(&mut self, parent: NodeId) -> Result<()> {
        let property = self.advance().clone();
        self.expect_token(TokenKind::Colon, "expected ':' after property name")?;
        let value = self.parse_expression()?;
        let terminator =
            self.expect_token(TokenKind::Semicolon, "expected ';' after declaration")?;

        let span = SourceSpan::union(
            &Self::span_from_token(&property),
            &Self::span_from_token(&terminator),
        );
        let declaration = self.ast.append(parent, NodeKind::Declaration, Some(span));
        self.ast.append(
            declaration,
            NodeKind::PropertyName(property.lexeme.clone()),
            Some(Self::span_from_token(&property)),
        );
        self.ast.push_child(declaration, value);
        Ok(())
    }

    fn parse_assignment(&mut self, parent: NodeId) -> Result<()> {
        let name = self.advance().clone();
        self.expect_token(TokenKind::Assign, "expected ':=' after variable name")?;
        let value = self.parse_expression()?;
        let terminator =
            self.expect_token(TokenKind::Semicolon, "expected ';' after variable assignment")?;

        let span = SourceSpan::union(
            &Self::span_from_token(&name),
            &Self::span_from_token(&terminator),
        );
        let assignment = self
            .ast
            .append(parent, NodeKind::VariableAssignment, Some(span));
        self.ast.append(
            assignment,
            NodeKind::VariableReference(name.lexeme.clone()),
            Some(Self::span_from_token(&name)),
        );
        self.ast.push_child(assignment, value);
        Ok(())
    }

    fn parse_if_clause(&mut self, parent: NodeId) -> Result<()> {
        let keyword = self.advance().clone();
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            self.diagnostics.push_error_with_span(
                format!("if clauses nested deeper than {MAX_NESTING_DEPTH} levels"),
                Some(Self::span_from_token(&keyword)),
            );
            return Err(anyhow!(
                "nesting limit exceeded at line {}, column {}",
                keyword.line,
                keyword.column
            ));
        }

        self.expect_token(TokenKind::LBracket, "expected '[' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect_token(TokenKind::RBracket, "expected ']' after condition")?;

        let if_clause = self
            .ast
            .add_node(NodeKind::IfClause, Some(Self::span_from_token(&keyword)));
        self.ast.push_child(if_clause, condition);

        self.expect_token(TokenKind::LBrace, "expected '{' to open if body")?;
        self.parse_body(if_clause)?;
        self.expect_token(TokenKind::RBrace, "expected '}' to close if body")?;

        if matches!(self.peek_kind(), TokenKind::Keyword(Keyword::Else)) {
            let else_keyword = self.advance().clone();
            let else_clause = self.ast.append(
                if_clause,
                NodeKind::ElseClause,
                Some(Self::span_from_token(&else_keyword)),
            );
            self.expect_token(TokenKind::LBrace, "expected '{' after 'else'")?;
            self.parse_body(else_clause)?;
            self.expect_token(TokenKind::RBrace, "expected '}' to close else body")?;
        }

        self.ast.push_child(parent, if_clause);
        self.depth -= 1;
        Ok(())
    }

    fn parse_expression(&mut self) -> Result<NodeId> {
        self.operators = 0;
        self.parse_expression_with_precedence(Precedence::Lowest)
    }

    fn parse_expression_with_precedence(&mut self, precedence: Precedence) -> Result<NodeId> {
        let mut lhs = self.parse_primary()?;

        while let Some((next, operator)) = Precedence::of(self.peek_kind()) {
            if next <= precedence {
                break;
            }
            let symbol = self.advance().clone();
            self.operators += 1;
            if self.operators > MAX_NESTING_DEPTH {
                self.diagnostics.push_error_with_span(
                    format!("expression has more than {MAX_NESTING_DEPTH} operators"),
                    Some(Self::span_from_token(&symbol)),
                );
                return Err(anyhow!(
                    "operator limit exceeded at line {}, column {}",
                    symbol.line,
                    symbol.column
                ));
            }
            let rhs = self.parse_expression_with_precedence(next)?;
            let span = self.union_spans(lhs, rhs);
            let operation = self.ast.add_node(NodeKind::Operation(operator), span);
            self.ast.push_child(operation, lhs);
            self.ast.push_child(operation, rhs);
            lhs = operation;
        }

        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<NodeId> {
        let token = self.peek().clone();
        let kind = match &token.kind {
            TokenKind::Pixel(value) => NodeKind::Literal(Literal::Pixel(*value)),
            TokenKind::Percentage(value) => NodeKind::Literal(Literal::Percentage(*value)),
            TokenKind::Scalar(value) => NodeKind::Literal(Literal::Scalar(*value)),
            TokenKind::Color(value) => NodeKind::Literal(Literal::Color(value.clone())),
            TokenKind::Boolean(value) => NodeKind::Literal(Literal::Bool(*value)),
            TokenKind::Variable => NodeKind::VariableReference(token.lexeme.clone()),
            _ => return Err(self.unexpected("expected expression")),
        };
        self.advance();
        Ok(self
            .ast
            .add_node(kind, Some(Self::span_from_token(&token))))
    }

    fn unexpected(&mut self, message: &str) -> anyhow::Error {
        let token = self.peek().clone();
        let found = if matches!(token.kind, TokenKind::Eof) {
            "end of input".to_string()
        } else {
            format!("'{}'", token.lexeme)
        };
        self.diagnostics.push_error_with_span(
            format!("{message} (found {found})"),
            Some(Self::span_from_token(&token)),
        );
        anyhow!(
            "{} at line {}, column {} (found {})",
            message,
            token.line,
            token.column,
            found
        )
    }

    fn expect_token(&mut self, expected: TokenKind, message: &str) -> Result<Token> {
        if std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(&expected) {
            Ok(self.advance().clone())
        } else {
            Err(self.unexpected(message))
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.current].kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }
}
