use crate::lexer::{LexicalError, Span, TokenKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParserErrorKind {
    #[error("Expected {expected} but got {actual}.")]
    UnexpectedToken {
        actual: TokenKind,
        expected: TokenKind,
    },
    #[error("Expected an expression but got {0}.")]
    NonExpression(TokenKind),
    #[error("Expected a statement terminator but got {0}.")]
    MissingTerminator(TokenKind),
    #[error("Unexpected end of input.")]
    UnexpectedEof,
    #[error("Cannot assign to this expression.")]
    InvalidLValue,
    #[error("Integer literal `{0}` is out of range.")]
    InvalidInteger(String),
    #[error("Class definition inside a method body.")]
    ClassInMethod,
    #[error("{0}")]
    LexicalError(#[from] LexicalError),
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}")]
pub struct ParserError {
    #[source]
    pub kind: ParserErrorKind,
    pub span: Span,
}

impl ParserError {
    pub fn code(&self) -> &'static str {
        match &self.kind {
            ParserErrorKind::UnexpectedToken { .. } => "PE001",
            ParserErrorKind::NonExpression(_) => "PE002",
            ParserErrorKind::MissingTerminator(_) => "PE003",
            ParserErrorKind::UnexpectedEof => "PE004",
            ParserErrorKind::InvalidLValue => "PE005",
            ParserErrorKind::InvalidInteger(_) => "PE006",
            ParserErrorKind::ClassInMethod => "PE007",
            ParserErrorKind::LexicalError(e) => e.code(),
        }
    }

    /// Whether more input could turn this error into a successful parse.
    pub fn is_incomplete(&self) -> bool {
        match &self.kind {
            ParserErrorKind::UnexpectedEof => true,
            ParserErrorKind::UnexpectedToken { actual, .. }
            | ParserErrorKind::NonExpression(actual)
            | ParserErrorKind::MissingTerminator(actual) => *actual == TokenKind::Eof,
            ParserErrorKind::LexicalError(e) => {
                e.kind == crate::lexer::LexicalErrorKind::UnclosedString
            }
            _ => false,
        }
    }
}
