use crate::{string::IdentName, value::Value};
use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// How a frame resolves writes to names it does not bind itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// Writes always land in the current frame. Used by the top-level program, class bodies and
    /// method calls.
    Shadowing,
    /// Writes update the nearest enclosing binding and only create a new binding when none
    /// exists. Used by block invocations.
    Through,
}

/// A name to value binding scope with an optional parent used for lookup.
///
/// Frames are shared handles: closures keep their defining frame alive by holding a clone.
#[derive(Clone)]
pub struct Frame {
    inner: Rc<RefCell<FrameImpl>>,
}

struct FrameImpl {
    values: HashMap<IdentName, Value>,
    parent: Option<Frame>,
    discipline: Discipline,
}

impl Frame {
    /// Creates the top-level program frame.
    pub fn root() -> Self {
        Self::with_parent(None, Discipline::Shadowing)
    }

    pub fn new_scope(&self, discipline: Discipline) -> Self {
        Self::with_parent(Some(self.clone()), discipline)
    }

    fn with_parent(parent: Option<Frame>, discipline: Discipline) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FrameImpl {
                values: HashMap::new(),
                parent,
                discipline,
            })),
        }
    }

    pub fn discipline(&self) -> Discipline {
        self.inner.borrow().discipline
    }

    pub fn parent(&self) -> Option<Frame> {
        self.inner.borrow().parent.clone()
    }

    /// Creates or updates a binding in this frame, ignoring every ancestor.
    pub fn define(&self, name: IdentName, value: Value) {
        self.inner.borrow_mut().values.insert(name, value);
    }

    /// Resolves `name` from this frame outwards.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = Some(self.clone());
        while let Some(frame) = current {
            let inner = frame.inner.borrow();
            if let Some(value) = inner.values.get(name) {
                return Some(value.clone());
            }
            current = inner.parent.clone();
        }
        None
    }

    /// Whether this frame itself binds `name`.
    pub fn binds(&self, name: &str) -> bool {
        self.inner.borrow().values.contains_key(name)
    }

    /// Performs a write according to this frame's discipline.
    ///
    /// A `Through` write walks enclosing `Through` frames and the first `Shadowing` frame above
    /// them. It never reaches past that frame, so a block running inside a method cannot reach
    /// the method's own defining scope.
    pub fn assign(&self, name: IdentName, value: Value) {
        let target = match self.discipline() {
            Discipline::Shadowing => self.clone(),
            Discipline::Through => self.find_writable(&name).unwrap_or_else(|| self.clone()),
        };
        target.define(name, value);
    }

    fn find_writable(&self, name: &str) -> Option<Frame> {
        let mut current = Some(self.clone());
        while let Some(frame) = current {
            if frame.binds(name) {
                return Some(frame);
            }
            if frame.discipline() == Discipline::Shadowing {
                return None;
            }
            current = frame.parent();
        }
        None
    }

    /// Names bound directly in this frame, sorted.
    pub fn local_names(&self) -> Vec<IdentName> {
        let mut names: Vec<IdentName> = self.inner.borrow().values.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("discipline", &self.discipline())
            .field("names", &self.local_names())
            .finish()
    }
}
