use super::Value;
use crate::lexer::Span;
use crate::string::IdentName;
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RuntimeErrorKind {
    #[error("undefined local variable or method `{0}`")]
    UnboundName(IdentName),
    #[error("uninitialized constant {0}")]
    UninitializedConstant(IdentName),
    #[error("uninitialized class variable @@{name} in {class}")]
    UninitializedClassVariable { name: IdentName, class: IdentName },
    #[error("undefined method `{name}` for an instance of {class}")]
    NoMethod { name: IdentName, class: IdentName },
    #[error("wrong number of arguments (given {actual}, expected {expected})")]
    InvalidArgumentCount { actual: usize, expected: usize },
    #[error("no block given to `{0}`")]
    MissingBlock(IdentName),
    #[error("expected an Integer operand but got {}", .0.inspect())]
    NonNumeric(Value),
    #[error("expected Integer operands but got {} and {}", .0.inspect(), .1.inspect())]
    NonNumerics(Value, Value),
    #[error("cannot add {} and {}", .0.inspect(), .1.inspect())]
    NonAddable(Value, Value),
    #[error("cannot compare {} with {}", .0.inspect(), .1.inspect())]
    NonComparable(Value, Value),
    #[error("{} cannot be indexed", .0.inspect())]
    NonIndexable(Value),
    #[error("index must be an Integer but got {}", .0.inspect())]
    InvalidIndex(Value),
    #[error("superclass of {0} must be a Class")]
    InvalidSuperClass(IdentName),
    #[error("superclass mismatch for class {0}")]
    SuperclassMismatch(IdentName),
    #[error("{0} is not a class")]
    NotAClass(IdentName),
    #[error("allocator undefined for {0}")]
    NonAllocatable(IdentName),
    #[error("can't modify instance variables of {}", .0.inspect())]
    ImmutableReceiver(Value),
    #[error("divided by 0")]
    ZeroDivision,
    #[error("integer overflow")]
    IntegerOverflow,
    #[error("stack level too deep")]
    StackTooDeep,
    #[error("expected {}, got {}", .expected.inspect(), .actual.inspect())]
    AssertionFailure { actual: Value, expected: Value },
}

/// Ruby style error class names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NameError,
    NoMethodError,
    ArgumentError,
    TypeError,
    ZeroDivisionError,
    RangeError,
    SystemStackError,
    AssertionFailure,
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ErrorCategory::NameError => "NameError",
            ErrorCategory::NoMethodError => "NoMethodError",
            ErrorCategory::ArgumentError => "ArgumentError",
            ErrorCategory::TypeError => "TypeError",
            ErrorCategory::ZeroDivisionError => "ZeroDivisionError",
            ErrorCategory::RangeError => "RangeError",
            ErrorCategory::SystemStackError => "SystemStackError",
            ErrorCategory::AssertionFailure => "AssertionFailure",
        };
        write!(f, "{text}")
    }
}

#[derive(Debug, Error, Clone)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Span,
}

impl RuntimeError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            RuntimeErrorKind::UnboundName(_) => "RT001",
            RuntimeErrorKind::UninitializedConstant(_) => "RT002",
            RuntimeErrorKind::UninitializedClassVariable { .. } => "RT003",
            RuntimeErrorKind::NoMethod { .. } => "RT004",
            RuntimeErrorKind::InvalidArgumentCount { .. } => "RT005",
            RuntimeErrorKind::MissingBlock(_) => "RT006",
            RuntimeErrorKind::NonNumeric(_) => "RT007",
            RuntimeErrorKind::NonNumerics(_, _) => "RT008",
            RuntimeErrorKind::NonAddable(_, _) => "RT009",
            RuntimeErrorKind::NonComparable(_, _) => "RT010",
            RuntimeErrorKind::NonIndexable(_) => "RT011",
            RuntimeErrorKind::InvalidIndex(_) => "RT012",
            RuntimeErrorKind::InvalidSuperClass(_) => "RT013",
            RuntimeErrorKind::SuperclassMismatch(_) => "RT014",
            RuntimeErrorKind::NotAClass(_) => "RT015",
            RuntimeErrorKind::NonAllocatable(_) => "RT016",
            RuntimeErrorKind::ImmutableReceiver(_) => "RT017",
            RuntimeErrorKind::ZeroDivision => "RT018",
            RuntimeErrorKind::IntegerOverflow => "RT019",
            RuntimeErrorKind::AssertionFailure { .. } => "RT020",
            RuntimeErrorKind::StackTooDeep => "RT021",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            RuntimeErrorKind::UnboundName(_)
            | RuntimeErrorKind::UninitializedConstant(_)
            | RuntimeErrorKind::UninitializedClassVariable { .. } => ErrorCategory::NameError,
            RuntimeErrorKind::NoMethod { .. } => ErrorCategory::NoMethodError,
            RuntimeErrorKind::InvalidArgumentCount { .. } | RuntimeErrorKind::MissingBlock(_) => {
                ErrorCategory::ArgumentError
            }
            RuntimeErrorKind::NonNumeric(_)
            | RuntimeErrorKind::NonNumerics(_, _)
            | RuntimeErrorKind::NonAddable(_, _)
            | RuntimeErrorKind::NonComparable(_, _)
            | RuntimeErrorKind::NonIndexable(_)
            | RuntimeErrorKind::InvalidIndex(_)
            | RuntimeErrorKind::InvalidSuperClass(_)
            | RuntimeErrorKind::SuperclassMismatch(_)
            | RuntimeErrorKind::NotAClass(_)
            | RuntimeErrorKind::NonAllocatable(_)
            | RuntimeErrorKind::ImmutableReceiver(_) => ErrorCategory::TypeError,
            RuntimeErrorKind::ZeroDivision => ErrorCategory::ZeroDivisionError,
            RuntimeErrorKind::IntegerOverflow => ErrorCategory::RangeError,
            RuntimeErrorKind::StackTooDeep => ErrorCategory::SystemStackError,
            RuntimeErrorKind::AssertionFailure { .. } => ErrorCategory::AssertionFailure,
        }
    }
}
