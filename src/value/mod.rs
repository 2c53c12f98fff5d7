mod callable;
pub mod error;
pub mod formatter;

pub use callable::{Callable, CallableKind, Receiver};
use crate::object::{AttributeBearing, Class, Instance};
use compact_str::{CompactString, ToCompactString};
use error::RuntimeErrorKind;
use std::{cmp::Ordering, fmt::Display, rc::Rc};

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    String(CompactString),
    Bool(bool),
    Nil,
    Array(Rc<[Value]>),
    Callable(Rc<Callable>),
    Class(Class),
    Instance(Instance),
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Nil => Ok(()),
            Value::Array(_) => write!(f, "{}", self.inspect()),
            Value::Callable(_) => write!(f, "#<Proc>"),
            Value::Class(class) => write!(f, "{}", class.get_name()),
            Value::Instance(instance) => match instance.get_label() {
                Some(label) => write!(f, "{label}"),
                None => write!(f, "#<{}>", instance.get_class().get_name()),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_compact_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value.into())
    }
}

impl Value {
    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Structural equality for plain data, identity for objects.
    pub fn is_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(lhs), Value::Integer(rhs)) => lhs == rhs,
            (Value::String(lhs), Value::String(rhs)) => lhs == rhs,
            (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
            (Value::Nil, Value::Nil) => true,
            (Value::Array(lhs), Value::Array(rhs)) => {
                lhs.len() == rhs.len() && lhs.iter().zip(rhs.iter()).all(|(l, r)| l.is_equal(r))
            }
            (Value::Callable(lhs), Value::Callable(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Class(lhs), Value::Class(rhs)) => lhs.ptr_eq(rhs),
            (Value::Instance(lhs), Value::Instance(rhs)) => lhs.ptr_eq(rhs),
            _ => false,
        }
    }

    /// Developer facing rendering: strings are quoted and `nil` is spelled out.
    pub fn inspect(&self) -> String {
        match self {
            Value::String(v) => quote(v),
            Value::Nil => "nil".into(),
            Value::Array(items) => {
                let items: Vec<String> = items.iter().map(Value::inspect).collect();
                format!("[{}]", items.join(", "))
            }
            other => format!("{other}"),
        }
    }

    pub fn as_attribute_bearing(&self) -> Option<&dyn AttributeBearing> {
        match self {
            Value::Class(class) => Some(class),
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }
}

/// Double quoted form using only the escapes a string literal accepts.
fn quote(text: &str) -> String {
    let mut output = String::with_capacity(text.len() + 2);
    output.push('"');
    for c in text.chars() {
        match c {
            '\n' => output.push_str("\\n"),
            '\t' => output.push_str("\\t"),
            '\0' => output.push_str("\\0"),
            '\u{1b}' => output.push_str("\\e"),
            '\\' => output.push_str("\\\\"),
            '"' => output.push_str("\\\""),
            c => output.push(c),
        }
    }
    output.push('"');
    output
}

// Operators
impl Value {
    pub fn negate(&self) -> Result<Value, RuntimeErrorKind> {
        match self {
            Value::Integer(v) => v
                .checked_neg()
                .map(Value::Integer)
                .ok_or(RuntimeErrorKind::IntegerOverflow),
            _ => Err(RuntimeErrorKind::NonNumeric(self.clone())),
        }
    }

    pub fn not(&self) -> Value {
        Value::Bool(!self.is_truthy())
    }

    pub fn add(&self, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, rhs) {
            (Value::Integer(l), Value::Integer(r)) => l
                .checked_add(*r)
                .map(Value::Integer)
                .ok_or(RuntimeErrorKind::IntegerOverflow),
            (Value::String(l), Value::String(r)) => {
                let mut joined = l.clone();
                joined.push_str(r);
                Ok(Value::String(joined))
            }
            (Value::Array(l), Value::Array(r)) => {
                Ok(Value::Array(l.iter().chain(r.iter()).cloned().collect()))
            }
            _ => Err(RuntimeErrorKind::NonAddable(self.clone(), rhs.clone())),
        }
    }

    pub fn subtract(&self, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        let (l, r) = self.integer_operands(rhs)?;
        l.checked_sub(r)
            .map(Value::Integer)
            .ok_or(RuntimeErrorKind::IntegerOverflow)
    }

    pub fn multiply(&self, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        let (l, r) = self.integer_operands(rhs)?;
        l.checked_mul(r)
            .map(Value::Integer)
            .ok_or(RuntimeErrorKind::IntegerOverflow)
    }

    /// Integer division rounding toward negative infinity.
    pub fn divide(&self, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        let (l, r) = self.integer_operands(rhs)?;
        if r == 0 {
            return Err(RuntimeErrorKind::ZeroDivision);
        }
        let quotient = l.checked_div(r).ok_or(RuntimeErrorKind::IntegerOverflow)?;
        let remainder = l.wrapping_rem(r);
        match remainder != 0 && ((remainder < 0) != (r < 0)) {
            true => Ok(Value::Integer(quotient - 1)),
            false => Ok(Value::Integer(quotient)),
        }
    }

    /// Remainder taking the sign of the divisor.
    pub fn modulo(&self, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        let (l, r) = self.integer_operands(rhs)?;
        if r == 0 {
            return Err(RuntimeErrorKind::ZeroDivision);
        }
        let remainder = l.wrapping_rem(r);
        match remainder != 0 && ((remainder < 0) != (r < 0)) {
            true => Ok(Value::Integer(remainder + r)),
            false => Ok(Value::Integer(remainder)),
        }
    }

    pub fn compare(&self, rhs: &Value) -> Result<Ordering, RuntimeErrorKind> {
        match (self, rhs) {
            (Value::Integer(l), Value::Integer(r)) => Ok(l.cmp(r)),
            (Value::String(l), Value::String(r)) => Ok(l.cmp(r)),
            _ => Err(RuntimeErrorKind::NonComparable(self.clone(), rhs.clone())),
        }
    }

    /// Element access with negative indices counting from the end. Out of range reads are `nil`.
    pub fn index(&self, index: &Value) -> Result<Value, RuntimeErrorKind> {
        let Value::Integer(position) = index else {
            return Err(RuntimeErrorKind::InvalidIndex(index.clone()));
        };
        match self {
            Value::Array(items) => Ok(resolve_index(*position, items.len())
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Value::Nil)),
            Value::String(text) => {
                let count = text.chars().count();
                Ok(resolve_index(*position, count)
                    .and_then(|i| text.chars().nth(i))
                    .map(|c| Value::String(c.to_compact_string()))
                    .unwrap_or(Value::Nil))
            }
            _ => Err(RuntimeErrorKind::NonIndexable(self.clone())),
        }
    }

    fn integer_operands(&self, rhs: &Value) -> Result<(i64, i64), RuntimeErrorKind> {
        match (self, rhs) {
            (Value::Integer(l), Value::Integer(r)) => Ok((*l, *r)),
            _ => Err(RuntimeErrorKind::NonNumerics(self.clone(), rhs.clone())),
        }
    }
}

fn resolve_index(position: i64, length: usize) -> Option<usize> {
    let length = i64::try_from(length).ok()?;
    let position = if position < 0 {
        position + length
    } else {
        position
    };
    (0..length)
        .contains(&position)
        .then(|| position as usize)
}
