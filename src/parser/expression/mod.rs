mod operator;
mod tree;

pub use operator::{
    InfixAssignmentOperator, InfixOperator, InfixShortCircuitOperator, PostfixOperator,
    PrefixOperator,
};
pub use tree::{
    AssignTarget, BlockLiteral, Body, CallExpression, ClassDecl, Expression, ExpressionAtomKind,
    ExpressionKind, MethodDecl,
};
