use super::{BuiltinClasses, Class, Instance, Method};
use crate::{
    interpreter::AssertionPolicy,
    lexer::Span,
    value::{
        error::{RuntimeError, RuntimeErrorKind},
        Callable, Value,
    },
};
use compact_str::{format_compact, CompactString};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    Any,
}

impl Arity {
    pub fn check(&self, actual: usize) -> Result<(), RuntimeErrorKind> {
        match *self {
            Arity::Exactly(expected) if expected != actual => {
                Err(RuntimeErrorKind::InvalidArgumentCount { actual, expected })
            }
            _ => Ok(()),
        }
    }
}

/// Everything a native method sees of the call site.
pub struct NativeCall<'a> {
    pub receiver: &'a Value,
    pub arguments: Vec<Value>,
    pub block: Option<Rc<Callable>>,
    pub span: Span,
}

impl<'a> NativeCall<'a> {
    fn error(&self, kind: RuntimeErrorKind) -> RuntimeError {
        RuntimeError {
            kind,
            span: self.span,
        }
    }

    fn require_block(&self, name: &str) -> Result<Rc<Callable>, RuntimeError> {
        self.block
            .clone()
            .ok_or_else(|| self.error(RuntimeErrorKind::MissingBlock(name.into())))
    }
}

/// The slice of the interpreter that native methods may call back into.
pub trait Runtime {
    fn class_of(&self, value: &Value) -> Class;
    fn invoke_block(
        &mut self,
        block: &Callable,
        arguments: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError>;
    fn writeln(&mut self, text: &str);
    fn assertion_failed(&mut self, actual: &Value, expected: &Value) -> AssertionPolicy;
}

pub trait NativeMethod {
    fn get_name(&self) -> &'static str;
    fn get_arity(&self) -> Arity;
    fn call(&self, runtime: &mut dyn Runtime, call: NativeCall<'_>)
        -> Result<Value, RuntimeError>;
}

type NativeFn = fn(&mut dyn Runtime, NativeCall<'_>) -> Result<Value, RuntimeError>;

struct Builtin {
    name: &'static str,
    arity: Arity,
    function: NativeFn,
}

impl NativeMethod for Builtin {
    fn get_name(&self) -> &'static str {
        self.name
    }

    fn get_arity(&self) -> Arity {
        self.arity
    }

    fn call(
        &self,
        runtime: &mut dyn Runtime,
        call: NativeCall<'_>,
    ) -> Result<Value, RuntimeError> {
        (self.function)(runtime, call)
    }
}

fn register(class: &Class, name: &'static str, arity: Arity, function: NativeFn) {
    let builtin = Builtin {
        name,
        arity,
        function,
    };
    class.define_method(name.into(), Method::Native(Rc::new(builtin)));
}

/// Installs the native method tables of the built-in classes.
pub fn install(classes: &BuiltinClasses) {
    let object = &classes.object;
    register(object, "puts", Arity::Any, object_puts);
    register(object, "assert", Arity::Exactly(2), object_assert);
    register(object, "proc", Arity::Exactly(0), object_proc);
    register(object, "class", Arity::Exactly(0), object_class);
    register(object, "instance_variables", Arity::Exactly(0), object_instance_variables);
    register(object, "to_s", Arity::Exactly(0), object_to_s);
    register(object, "inspect", Arity::Exactly(0), object_inspect);

    let class = &classes.class;
    register(class, "new", Arity::Exactly(0), class_new);
    register(class, "name", Arity::Exactly(0), class_name);
    register(class, "superclass", Arity::Exactly(0), class_superclass);

    let integer = &classes.integer;
    register(integer, "times", Arity::Exactly(0), integer_times);
    register(integer, "to_i", Arity::Exactly(0), integer_to_i);

    let string = &classes.string;
    register(string, "to_i", Arity::Exactly(0), string_to_i);
    register(string, "len", Arity::Exactly(0), string_length);
    register(string, "length", Arity::Exactly(0), string_length);

    let array = &classes.array;
    register(array, "each", Arity::Exactly(0), array_each);
    register(array, "len", Arity::Exactly(0), array_length);
    register(array, "length", Arity::Exactly(0), array_length);

    register(&classes.proc_class, "call", Arity::Any, proc_call);
}

fn write_puts(runtime: &mut dyn Runtime, value: &Value) {
    match value {
        Value::Array(items) if items.is_empty() => runtime.writeln(""),
        Value::Array(items) => items.iter().for_each(|item| write_puts(runtime, item)),
        value => runtime.writeln(&value.to_string()),
    }
}

fn object_puts(runtime: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    if call.arguments.is_empty() {
        runtime.writeln("");
    }
    for argument in call.arguments.iter() {
        write_puts(runtime, argument);
    }
    Ok(Value::Nil)
}

fn object_assert(runtime: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    let [actual, expected] = call.arguments.as_slice() else {
        return Err(call.error(RuntimeErrorKind::InvalidArgumentCount {
            actual: call.arguments.len(),
            expected: 2,
        }));
    };
    if actual.is_equal(expected) {
        return Ok(Value::Nil);
    }
    match runtime.assertion_failed(actual, expected) {
        AssertionPolicy::Continue => Ok(Value::Nil),
        AssertionPolicy::Halt => Err(call.error(RuntimeErrorKind::AssertionFailure {
            actual: actual.clone(),
            expected: expected.clone(),
        })),
    }
}

fn object_proc(_: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    call.require_block("proc").map(Value::Callable)
}

fn object_class(runtime: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    Ok(Value::Class(runtime.class_of(call.receiver)))
}

fn object_instance_variables(
    _: &mut dyn Runtime,
    call: NativeCall<'_>,
) -> Result<Value, RuntimeError> {
    let names = match call.receiver.as_attribute_bearing() {
        Some(object) => object
            .attribute_names()
            .iter()
            .map(|name| Value::String(format_compact!("@{name}")))
            .collect(),
        None => Vec::new(),
    };
    Ok(Value::from(names))
}

fn object_to_s(_: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    Ok(Value::String(format_compact!("{}", call.receiver)))
}

fn object_inspect(_: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    Ok(Value::String(CompactString::from(call.receiver.inspect())))
}

fn class_new(_: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    let Value::Class(class) = call.receiver else {
        return Err(call.error(RuntimeErrorKind::NotAClass(
            call.receiver.to_string().into(),
        )));
    };
    if !class.is_allocatable() {
        return Err(call.error(RuntimeErrorKind::NonAllocatable(class.get_name().clone())));
    }
    Ok(Value::Instance(Instance::new(class.clone())))
}

fn class_name(_: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    match call.receiver {
        Value::Class(class) => Ok(Value::from(class.get_name().as_ref())),
        other => Err(call.error(RuntimeErrorKind::NotAClass(other.to_string().into()))),
    }
}

fn class_superclass(_: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    match call.receiver {
        Value::Class(class) => Ok(class
            .get_super_class()
            .cloned()
            .map(Value::Class)
            .unwrap_or(Value::Nil)),
        other => Err(call.error(RuntimeErrorKind::NotAClass(other.to_string().into()))),
    }
}

fn integer_times(runtime: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    let block = call.require_block("times")?;
    let Value::Integer(count) = *call.receiver else {
        return Err(call.error(RuntimeErrorKind::NonNumeric(call.receiver.clone())));
    };
    for counter in 0..count {
        let arguments = match block.arity() {
            0 => Vec::new(),
            _ => vec![Value::Integer(counter)],
        };
        runtime.invoke_block(&block, arguments, call.span)?;
    }
    Ok(Value::Nil)
}

fn integer_to_i(_: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    match call.receiver {
        Value::Integer(_) => Ok(call.receiver.clone()),
        other => Err(call.error(RuntimeErrorKind::NonNumeric(other.clone()))),
    }
}

/// Parses optional leading whitespace, an optional sign and the longest run of digits.
fn parse_integer_prefix(text: &str) -> Result<i64, RuntimeErrorKind> {
    let text = text.trim_start();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Ok(0);
    }
    let signed = match negative {
        true => format!("-{digits}"),
        false => digits,
    };
    signed
        .parse::<i64>()
        .map_err(|_| RuntimeErrorKind::IntegerOverflow)
}

fn string_to_i(_: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    match call.receiver {
        Value::String(text) => parse_integer_prefix(text)
            .map(Value::Integer)
            .map_err(|kind| call.error(kind)),
        other => Err(call.error(RuntimeErrorKind::NonNumeric(other.clone()))),
    }
}

fn string_length(_: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    match call.receiver {
        Value::String(text) => Ok(Value::Integer(text.chars().count() as i64)),
        other => Err(call.error(RuntimeErrorKind::NonIndexable(other.clone()))),
    }
}

fn array_each(runtime: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    let block = call.require_block("each")?;
    let Value::Array(items) = call.receiver else {
        return Err(call.error(RuntimeErrorKind::NonIndexable(call.receiver.clone())));
    };
    for item in items.iter() {
        let arguments = match block.arity() {
            0 => Vec::new(),
            _ => vec![item.clone()],
        };
        runtime.invoke_block(&block, arguments, call.span)?;
    }
    Ok(Value::Nil)
}

fn array_length(_: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    match call.receiver {
        Value::Array(items) => Ok(Value::Integer(items.len() as i64)),
        other => Err(call.error(RuntimeErrorKind::NonIndexable(other.clone()))),
    }
}

fn proc_call(runtime: &mut dyn Runtime, call: NativeCall<'_>) -> Result<Value, RuntimeError> {
    match call.receiver {
        Value::Callable(callable) => runtime.invoke_block(callable, call.arguments, call.span),
        other => Err(call.error(RuntimeErrorKind::NoMethod {
            name: "call".into(),
            class: runtime.class_of(other).get_name().clone(),
        })),
    }
}
