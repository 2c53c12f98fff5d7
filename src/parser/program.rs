use super::expression::{Body, Expression};

/// A parsed source file: the top-level sequence of expressions.
#[derive(Debug, Clone)]
pub struct Program {
    body: Body,
}

impl Program {
    pub fn new(body: Body) -> Self {
        Self { body }
    }

    pub fn get_body(&self) -> &Body {
        &self.body
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expression> {
        self.body.iter()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
