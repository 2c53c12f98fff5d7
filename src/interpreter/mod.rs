pub mod context;
mod tree;

use crate::value::Value;
pub use tree::{TreeWalkInterpreter, MAX_CALL_DEPTH};

/// What the `assert` sink does after a mismatch has been reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionPolicy {
    /// Abort the current top-level statement with an assertion failure.
    Halt,
    /// Keep evaluating; `assert` returns `nil`.
    Continue,
}

/// Host services the evaluator calls out to.
pub trait SystemContext {
    fn writeln(&mut self, text: &str);

    fn assertion_failed(&mut self, _actual: &Value, _expected: &Value) -> AssertionPolicy {
        AssertionPolicy::Halt
    }
}
