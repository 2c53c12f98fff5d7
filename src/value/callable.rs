use super::Value;
use crate::{
    environment::{Discipline, Frame},
    object::Class,
    parser::expression::{BlockLiteral, Body, MethodDecl},
    string::{Ident, IdentName},
};
use std::rc::Rc;

/// The `self` side of an evaluation scope.
#[derive(Debug, Clone)]
pub struct Receiver {
    /// The value of `self`.
    pub value: Value,
    /// The class that `def` installs methods into.
    pub definee: Class,
    /// The frame nested `def`s capture as their defining frame.
    pub lexical: Frame,
}

#[derive(Debug, Clone)]
pub enum CallableKind {
    /// Bound to its receiver at call time.
    Method { name: IdentName },
    /// Bound to the receiver in effect where the literal was written.
    Block { receiver: Receiver },
}

/// A deferred unit of execution: a method body or a block.
pub struct Callable {
    pub kind: CallableKind,
    pub parameters: Rc<[Ident]>,
    pub body: Body,
    pub frame: Frame,
    pub discipline: Discipline,
}

impl Callable {
    pub fn method(decl: &MethodDecl, frame: Frame) -> Self {
        Self {
            kind: CallableKind::Method {
                name: decl.name.name.clone(),
            },
            parameters: decl.parameters.clone(),
            body: decl.body.clone(),
            frame,
            discipline: Discipline::Shadowing,
        }
    }

    pub fn block(literal: &BlockLiteral, frame: Frame, receiver: Receiver) -> Self {
        Self {
            kind: CallableKind::Block { receiver },
            parameters: literal.parameters.clone(),
            body: literal.body.clone(),
            frame,
            discipline: Discipline::Through,
        }
    }

    pub fn get_name(&self) -> &str {
        match &self.kind {
            CallableKind::Method { name } => name,
            CallableKind::Block { .. } => "block",
        }
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parameters: Vec<&str> = self.parameters.iter().map(|p| p.name.as_ref()).collect();
        f.debug_struct("Callable")
            .field("name", &self.get_name())
            .field("parameters", &parameters)
            .field("discipline", &self.discipline)
            .finish()
    }
}
