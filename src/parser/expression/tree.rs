use super::operator::{InfixOperator, InfixShortCircuitOperator, PrefixOperator};
use crate::{
    lexer::Span,
    string::{Ident, IdentName},
};
use compact_str::CompactString;
use std::rc::Rc;

/// A sequence of expressions evaluated in order. Shared so that callables can hold onto their
/// bodies without copying the tree.
pub type Body = Rc<[Expression]>;

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionAtomKind {
    Integer(i64),
    StringLiteral(CompactString),
    Bool(bool),
    Nil,
    SelfValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Variable(Ident),
    InstanceVariable(IdentName),
    ClassVariable(IdentName),
    GlobalVariable(IdentName),
    Constant(IdentName),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockLiteral {
    pub parameters: Rc<[Ident]>,
    pub body: Body,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub receiver: Option<Box<Expression>>,
    pub method: Ident,
    pub arguments: Vec<Expression>,
    pub block: Option<Rc<BlockLiteral>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: Ident,
    pub parameters: Rc<[Ident]>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Ident,
    pub super_class: Option<Ident>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Atom(ExpressionAtomKind),
    Variable(Ident),
    InstanceVariable(IdentName),
    ClassVariable(IdentName),
    GlobalVariable(IdentName),
    Constant(IdentName),
    Prefix {
        operator: PrefixOperator,
        rhs: Box<Expression>,
    },
    Infix {
        operator: InfixOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    InfixShortCircuit {
        operator: InfixShortCircuitOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Assign {
        target: AssignTarget,
        value: Box<Expression>,
    },
    Array(Vec<Expression>),
    Index {
        receiver: Box<Expression>,
        index: Box<Expression>,
    },
    Call(CallExpression),
    If {
        condition: Box<Expression>,
        success: Body,
        failure: Option<Body>,
    },
    Sequence(Body),
    MethodDecl(Rc<MethodDecl>),
    ClassDecl(Rc<ClassDecl>),
}
