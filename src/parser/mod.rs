mod error;
pub mod expression;
pub mod formatter;
mod program;

pub use error::{ParserError, ParserErrorKind};
use expression::{
    AssignTarget, BlockLiteral, Body, CallExpression, ClassDecl, Expression, ExpressionAtomKind,
    ExpressionKind, InfixAssignmentOperator, InfixOperator, InfixShortCircuitOperator,
    MethodDecl, PostfixOperator, PrefixOperator,
};
pub use program::Program;
use std::rc::Rc;

use crate::{
    lexer::{Lexer, LineBreaks, Span, SpanIndex, Token, TokenKind},
    string::{unescape_string_literal, Ident},
};

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    lookahead: Option<Result<Token, ParserError>>,
    previous_end: SpanIndex,
    method_depth: u32,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: None,
            previous_end: 0.into(),
            method_depth: 0,
        }
    }

    pub fn get_source(&self) -> &'src str {
        self.lexer.get_source()
    }

    pub fn get_line_breaks(&self) -> LineBreaks {
        self.lexer.get_line_breaks()
    }

    pub fn parse(&mut self) -> Result<Program, ParserError> {
        let body = self.parse_body(&[TokenKind::Eof])?;
        self.expect(TokenKind::Eof)?;
        Ok(Program::new(body))
    }
}

// Token plumbing
impl<'src> Parser<'src> {
    fn peek(&mut self) -> Result<Token, ParserError> {
        match self.lookahead {
            Some(ref token_or_error) => token_or_error.clone(),
            None => {
                let next_token = self.lex_token();
                self.lookahead = Some(next_token.clone());
                next_token
            }
        }
    }

    fn lex_token(&mut self) -> Result<Token, ParserError> {
        self.lexer.next_token().map_err(|e| ParserError {
            span: e.span,
            kind: e.into(),
        })
    }

    fn next_token(&mut self) -> Result<Token, ParserError> {
        let token = match self.lookahead.take() {
            Some(token_or_error) => token_or_error,
            None => self.lex_token(),
        }?;
        self.previous_end = token.span.end();
        Ok(token)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParserError> {
        let next_token = self.next_token()?;
        if next_token.kind != expected {
            Err(ParserError {
                span: next_token.span,
                kind: ParserErrorKind::UnexpectedToken {
                    actual: next_token.kind,
                    expected,
                },
            })
        } else {
            Ok(next_token)
        }
    }

    fn eat_if(&mut self, next: TokenKind) -> Result<Option<Token>, ParserError> {
        let next_token = self.peek()?;
        if next_token.kind != next {
            Ok(None)
        } else {
            self.next_token().map(Some)
        }
    }

    fn skip_newlines(&mut self) -> Result<(), ParserError> {
        while self.eat_if(TokenKind::Newline)?.is_some() {}
        Ok(())
    }

    fn skip_terminators(&mut self) -> Result<(), ParserError> {
        while self.peek()?.kind.is_terminator() {
            self.next_token()?;
        }
        Ok(())
    }

    /// Whether `token` starts exactly where the previously consumed token ended.
    fn is_adjacent(&self, token: &Token) -> bool {
        token.span.start == self.previous_end
    }

    fn lexeme(&self, token: &Token) -> &'src str {
        self.lexer.get_lexeme(&token.span).unwrap_or_default()
    }

    fn make_ident(&self, token: &Token) -> Ident {
        Ident {
            name: self.lexeme(token).into(),
            span: token.span,
        }
    }
}

// Sequences
impl<'src> Parser<'src> {
    /// Parses terminator-separated expressions up to, but not including, one of `terminators`.
    fn parse_body(&mut self, terminators: &[TokenKind]) -> Result<Body, ParserError> {
        let mut expressions = Vec::new();
        loop {
            self.skip_terminators()?;
            let token = self.peek()?;
            if terminators.contains(&token.kind) {
                break;
            }
            if token.kind == TokenKind::Eof {
                return Err(ParserError {
                    kind: ParserErrorKind::UnexpectedEof,
                    span: token.span,
                });
            }

            expressions.push(self.parse_expression()?);

            let token = self.peek()?;
            if !token.kind.is_terminator() && !terminators.contains(&token.kind) {
                return Err(ParserError {
                    kind: ParserErrorKind::MissingTerminator(token.kind),
                    span: token.span,
                });
            }
        }
        Ok(expressions.into())
    }

    /// Parses comma separated expressions and consumes the closing token.
    fn parse_delimited(
        &mut self,
        close: TokenKind,
    ) -> Result<(Vec<Expression>, Token), ParserError> {
        let mut items = Vec::new();
        loop {
            self.skip_newlines()?;
            if let Some(token) = self.eat_if(close)? {
                return Ok((items, token));
            }
            items.push(self.parse_expression()?);
            self.skip_newlines()?;
            if let Some(token) = self.eat_if(close)? {
                return Ok((items, token));
            }
            self.expect(TokenKind::Comma)?;
        }
    }

    fn parse_parameter_list(&mut self, close: TokenKind) -> Result<Rc<[Ident]>, ParserError> {
        let mut parameters = Vec::new();
        loop {
            self.skip_newlines()?;
            if self.eat_if(close)?.is_some() {
                break;
            }
            let token = self.expect(TokenKind::Ident)?;
            parameters.push(self.make_ident(&token));
            self.skip_newlines()?;
            if self.eat_if(close)?.is_some() {
                break;
            }
            self.expect(TokenKind::Comma)?;
        }
        Ok(parameters.into())
    }
}

// Pratt parser for expressions
impl<'src> Parser<'src> {
    pub fn parse_expression(&mut self) -> Result<Expression, ParserError> {
        self.parse_expression_pratt(0)
    }

    fn parse_expression_pratt(&mut self, min_bp: u8) -> Result<Expression, ParserError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let token = self.peek()?;

            if let Some(operator) = PostfixOperator::from_token(token.kind) {
                if operator.get_binding_power() < min_bp {
                    break;
                }
                lhs = self.parse_postfix(lhs, operator)?;
                continue;
            }

            if let Some(operator) = InfixOperator::from_token(token.kind) {
                let (lbp, rbp) = operator.get_binding_power();
                if lbp < min_bp {
                    break;
                }
                self.next_token()?;
                self.skip_newlines()?;
                let rhs = self.parse_expression_pratt(rbp)?;
                let span = lhs.span.merge(&rhs.span);
                lhs = Expression {
                    kind: ExpressionKind::Infix {
                        operator,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    span,
                };
                continue;
            }

            if let Some(operator) = InfixShortCircuitOperator::from_token(token.kind) {
                let (lbp, rbp) = operator.get_binding_power();
                if lbp < min_bp {
                    break;
                }
                self.next_token()?;
                self.skip_newlines()?;
                let rhs = self.parse_expression_pratt(rbp)?;
                let span = lhs.span.merge(&rhs.span);
                lhs = Expression {
                    kind: ExpressionKind::InfixShortCircuit {
                        operator,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    span,
                };
                continue;
            }

            if token.kind == TokenKind::Equal {
                let (lbp, rbp) = InfixAssignmentOperator::Assign.get_binding_power();
                if lbp < min_bp {
                    break;
                }
                self.next_token()?;
                self.skip_newlines()?;
                let value = self.parse_expression_pratt(rbp)?;
                let span = lhs.span.merge(&value.span);
                let target = Self::to_assign_target(lhs)?;
                lhs = Expression {
                    kind: ExpressionKind::Assign {
                        target,
                        value: Box::new(value),
                    },
                    span,
                };
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    fn to_assign_target(lhs: Expression) -> Result<AssignTarget, ParserError> {
        match lhs.kind {
            ExpressionKind::Variable(ident) => Ok(AssignTarget::Variable(ident)),
            ExpressionKind::InstanceVariable(name) => Ok(AssignTarget::InstanceVariable(name)),
            ExpressionKind::ClassVariable(name) => Ok(AssignTarget::ClassVariable(name)),
            ExpressionKind::GlobalVariable(name) => Ok(AssignTarget::GlobalVariable(name)),
            ExpressionKind::Constant(name) => Ok(AssignTarget::Constant(name)),
            _ => Err(ParserError {
                kind: ParserErrorKind::InvalidLValue,
                span: lhs.span,
            }),
        }
    }

    fn parse_prefix(&mut self) -> Result<Expression, ParserError> {
        let token = self.next_token()?;
        let span = token.span;

        let kind = match token.kind {
            TokenKind::IntegerLiteral => {
                let lexeme = self.lexeme(&token);
                let digits: String = lexeme.chars().filter(|&c| c != '_').collect();
                let value = digits.parse::<i64>().map_err(|_| ParserError {
                    kind: ParserErrorKind::InvalidInteger(lexeme.into()),
                    span,
                })?;
                ExpressionKind::Atom(ExpressionAtomKind::Integer(value))
            }
            TokenKind::StringLiteral => {
                let value = unescape_string_literal(self.lexeme(&token));
                ExpressionKind::Atom(ExpressionAtomKind::StringLiteral(value))
            }
            TokenKind::KeywordTrue => ExpressionKind::Atom(ExpressionAtomKind::Bool(true)),
            TokenKind::KeywordFalse => ExpressionKind::Atom(ExpressionAtomKind::Bool(false)),
            TokenKind::KeywordNil => ExpressionKind::Atom(ExpressionAtomKind::Nil),
            TokenKind::KeywordSelf => ExpressionKind::Atom(ExpressionAtomKind::SelfValue),
            TokenKind::Ident => {
                let ident = self.make_ident(&token);
                let next = self.peek()?;
                let is_call = (next.kind == TokenKind::LeftParenthesis && self.is_adjacent(&next))
                    || matches!(next.kind, TokenKind::KeywordDo | TokenKind::LeftBrace);
                if is_call {
                    return self.parse_call_rest(None, ident, span);
                }
                ExpressionKind::Variable(ident)
            }
            TokenKind::Constant => ExpressionKind::Constant(self.lexeme(&token).into()),
            TokenKind::InstanceVariable => {
                ExpressionKind::InstanceVariable(self.lexeme(&token)[1..].into())
            }
            TokenKind::ClassVariable => {
                ExpressionKind::ClassVariable(self.lexeme(&token)[2..].into())
            }
            TokenKind::GlobalVariable => {
                ExpressionKind::GlobalVariable(self.lexeme(&token)[1..].into())
            }
            TokenKind::LeftBracket => {
                let (items, close) = self.parse_delimited(TokenKind::RightBracket)?;
                return Ok(Expression {
                    kind: ExpressionKind::Array(items),
                    span: span.merge(&close.span),
                });
            }
            TokenKind::LeftParenthesis => {
                let body = self.parse_body(&[TokenKind::RightParenthesis])?;
                let close = self.expect(TokenKind::RightParenthesis)?;
                return Ok(Expression {
                    kind: ExpressionKind::Sequence(body),
                    span: span.merge(&close.span),
                });
            }
            TokenKind::KeywordIf => return self.parse_if(token),
            TokenKind::KeywordDef => return self.parse_method_decl(token),
            TokenKind::KeywordClass => return self.parse_class_decl(token),
            TokenKind::Eof => {
                return Err(ParserError {
                    kind: ParserErrorKind::UnexpectedEof,
                    span,
                })
            }
            kind => match PrefixOperator::from_token(kind) {
                Some(operator) => {
                    let rhs = self.parse_expression_pratt(operator.get_binding_power())?;
                    return Ok(Expression {
                        span: span.merge(&rhs.span),
                        kind: ExpressionKind::Prefix {
                            operator,
                            rhs: Box::new(rhs),
                        },
                    });
                }
                None => {
                    return Err(ParserError {
                        kind: ParserErrorKind::NonExpression(kind),
                        span,
                    })
                }
            },
        };

        Ok(Expression { kind, span })
    }

    fn parse_postfix(
        &mut self,
        lhs: Expression,
        operator: PostfixOperator,
    ) -> Result<Expression, ParserError> {
        self.next_token()?;
        match operator {
            PostfixOperator::Send => {
                self.skip_newlines()?;
                let token = self.next_token()?;
                let method = match token.kind {
                    TokenKind::Ident | TokenKind::Constant | TokenKind::KeywordClass => {
                        self.make_ident(&token)
                    }
                    actual => {
                        return Err(ParserError {
                            kind: ParserErrorKind::UnexpectedToken {
                                actual,
                                expected: TokenKind::Ident,
                            },
                            span: token.span,
                        })
                    }
                };
                let start = lhs.span;
                self.parse_call_rest(Some(lhs), method, start)
            }
            PostfixOperator::Index => {
                self.skip_newlines()?;
                let index = self.parse_expression()?;
                self.skip_newlines()?;
                let close = self.expect(TokenKind::RightBracket)?;
                Ok(Expression {
                    span: lhs.span.merge(&close.span),
                    kind: ExpressionKind::Index {
                        receiver: Box::new(lhs),
                        index: Box::new(index),
                    },
                })
            }
        }
    }

    /// Parses the optional argument list and block following a method name.
    fn parse_call_rest(
        &mut self,
        receiver: Option<Expression>,
        method: Ident,
        start: Span,
    ) -> Result<Expression, ParserError> {
        let mut end = method.span;
        let mut arguments = Vec::new();

        let next = self.peek()?;
        if next.kind == TokenKind::LeftParenthesis && self.is_adjacent(&next) {
            self.next_token()?;
            let (items, close) = self.parse_delimited(TokenKind::RightParenthesis)?;
            arguments = items;
            end = close.span;
        }

        let block = self.parse_block()?;
        if let Some(ref block) = block {
            end = block.span;
        }

        Ok(Expression {
            kind: ExpressionKind::Call(CallExpression {
                receiver: receiver.map(Box::new),
                method,
                arguments,
                block,
            }),
            span: start.merge(&end),
        })
    }

    fn parse_block(&mut self) -> Result<Option<Rc<BlockLiteral>>, ParserError> {
        let opening = self.peek()?;
        let closing = match opening.kind {
            TokenKind::KeywordDo => TokenKind::KeywordEnd,
            TokenKind::LeftBrace => TokenKind::RightBrace,
            _ => return Ok(None),
        };
        self.next_token()?;

        let parameters = if self.eat_if(TokenKind::PipePipe)?.is_some() {
            Rc::from(Vec::new())
        } else if self.eat_if(TokenKind::Pipe)?.is_some() {
            self.parse_parameter_list(TokenKind::Pipe)?
        } else {
            Rc::from(Vec::new())
        };
        let body = self.parse_body(&[closing])?;
        let close = self.expect(closing)?;

        Ok(Some(Rc::new(BlockLiteral {
            parameters,
            body,
            span: opening.span.merge(&close.span),
        })))
    }
}

// Compound expressions
impl<'src> Parser<'src> {
    fn parse_if(&mut self, keyword: Token) -> Result<Expression, ParserError> {
        let condition = self.parse_expression()?;
        self.parse_then()?;
        let success = self.parse_body(&[
            TokenKind::KeywordElsif,
            TokenKind::KeywordElse,
            TokenKind::KeywordEnd,
        ])?;

        let token = self.next_token()?;
        let (failure, end) = match token.kind {
            TokenKind::KeywordElsif => {
                let nested = self.parse_if(token)?;
                let end = nested.span;
                (Some(Rc::from(vec![nested])), end)
            }
            TokenKind::KeywordElse => {
                let body = self.parse_body(&[TokenKind::KeywordEnd])?;
                let close = self.expect(TokenKind::KeywordEnd)?;
                (Some(body), close.span)
            }
            _ => (None, token.span),
        };

        Ok(Expression {
            kind: ExpressionKind::If {
                condition: Box::new(condition),
                success,
                failure,
            },
            span: keyword.span.merge(&end),
        })
    }

    fn parse_then(&mut self) -> Result<(), ParserError> {
        let token = self.peek()?;
        if token.kind.is_terminator() {
            self.skip_terminators()?;
            self.eat_if(TokenKind::KeywordThen)?;
            Ok(())
        } else {
            self.expect(TokenKind::KeywordThen).map(|_| ())
        }
    }

    fn parse_method_decl(&mut self, keyword: Token) -> Result<Expression, ParserError> {
        let token = self.next_token()?;
        if !matches!(token.kind, TokenKind::Ident | TokenKind::Constant) {
            return Err(ParserError {
                kind: ParserErrorKind::UnexpectedToken {
                    actual: token.kind,
                    expected: TokenKind::Ident,
                },
                span: token.span,
            });
        }
        let name = self.make_ident(&token);

        let parameters = match self.eat_if(TokenKind::LeftParenthesis)? {
            Some(_) => self.parse_parameter_list(TokenKind::RightParenthesis)?,
            None => Rc::from(Vec::new()),
        };

        self.method_depth += 1;
        let body = self.parse_body(&[TokenKind::KeywordEnd]);
        self.method_depth -= 1;
        let body = body?;
        let close = self.expect(TokenKind::KeywordEnd)?;

        Ok(Expression {
            kind: ExpressionKind::MethodDecl(Rc::new(MethodDecl {
                name,
                parameters,
                body,
            })),
            span: keyword.span.merge(&close.span),
        })
    }

    fn parse_class_decl(&mut self, keyword: Token) -> Result<Expression, ParserError> {
        if self.method_depth > 0 {
            return Err(ParserError {
                kind: ParserErrorKind::ClassInMethod,
                span: keyword.span,
            });
        }

        let token = self.expect(TokenKind::Constant)?;
        let name = self.make_ident(&token);
        let super_class = match self.eat_if(TokenKind::LessThan)? {
            Some(_) => {
                let token = self.expect(TokenKind::Constant)?;
                Some(self.make_ident(&token))
            }
            None => None,
        };

        let body = self.parse_body(&[TokenKind::KeywordEnd])?;
        let close = self.expect(TokenKind::KeywordEnd)?;

        Ok(Expression {
            kind: ExpressionKind::ClassDecl(Rc::new(ClassDecl {
                name,
                super_class,
                body,
            })),
            span: keyword.span.merge(&close.span),
        })
    }
}
