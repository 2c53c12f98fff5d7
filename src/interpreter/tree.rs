use super::{AssertionPolicy, SystemContext};
use crate::{
    environment::{Discipline, Frame},
    lexer::Span,
    object::{
        native::{NativeCall, Runtime},
        Class, Method, Universe,
    },
    parser::{
        expression::{
            AssignTarget, Body, CallExpression, ClassDecl, Expression, ExpressionAtomKind,
            ExpressionKind, InfixOperator, InfixShortCircuitOperator, MethodDecl, PrefixOperator,
        },
        Program,
    },
    string::Ident,
    value::{
        error::{RuntimeError, RuntimeErrorKind},
        Callable, CallableKind, Receiver, Value,
    },
};
use std::rc::Rc;

/// Where an expression is evaluated: the binding frame plus everything tied to `self`.
#[derive(Debug, Clone)]
struct Scope {
    frame: Frame,
    receiver: Receiver,
}

/// Deepest nesting of method and block invocations before `StackTooDeep` is raised.
pub const MAX_CALL_DEPTH: usize = 10_000;

/// Native stack kept free before an invocation; below this the stack is grown.
const RED_ZONE: usize = 128 * 1024;

/// Size of each extra stack segment.
const STACK_SEGMENT: usize = 1024 * 1024;

pub struct TreeWalkInterpreter<C: SystemContext> {
    universe: Universe,
    globals: Frame,
    context: C,
    depth: usize,
}

impl<C: SystemContext> TreeWalkInterpreter<C> {
    pub fn new(context: C) -> Self {
        Self {
            universe: Universe::new(),
            globals: Frame::root(),
            context,
            depth: 0,
        }
    }

    /// Evaluates every top-level expression in order and returns the last value. The first
    /// error aborts the run; state built up to that point is kept.
    pub fn run(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        let scope = self.top_level_scope();
        self.evaluate_body(&scope, program.get_body())
    }

    pub fn get_context(&self) -> &C {
        &self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    pub fn get_universe(&self) -> &Universe {
        &self.universe
    }

    pub fn get_globals(&self) -> &Frame {
        &self.globals
    }

    fn top_level_scope(&self) -> Scope {
        Scope {
            frame: self.globals.clone(),
            receiver: Receiver {
                value: self.universe.get_main(),
                definee: self.universe.get_classes().object.clone(),
                lexical: self.globals.clone(),
            },
        }
    }
}

// Expressions
impl<C: SystemContext> TreeWalkInterpreter<C> {
    fn evaluate_body(&mut self, scope: &Scope, body: &Body) -> Result<Value, RuntimeError> {
        let mut result = Value::Nil;
        for expression in body.iter() {
            result = self.evaluate(scope, expression)?;
        }
        Ok(result)
    }

    fn evaluate(&mut self, scope: &Scope, expr: &Expression) -> Result<Value, RuntimeError> {
        let span = expr.span;
        let error = |kind| RuntimeError { kind, span };

        match &expr.kind {
            ExpressionKind::Atom(atom) => Ok(Self::evaluate_atom(scope, atom)),
            ExpressionKind::Variable(ident) => self.read_variable(scope, ident),
            ExpressionKind::InstanceVariable(name) => Ok(scope
                .receiver
                .value
                .as_attribute_bearing()
                .and_then(|object| object.get_attribute(name))
                .unwrap_or(Value::Nil)),
            ExpressionKind::ClassVariable(name) => {
                let class = self.class_variable_scope(scope);
                class
                    .find_class_variable_owner(name)
                    .and_then(|owner| owner.get_class_variable(name))
                    .ok_or_else(|| {
                        error(RuntimeErrorKind::UninitializedClassVariable {
                            name: name.clone(),
                            class: class.get_name().clone(),
                        })
                    })
            }
            ExpressionKind::GlobalVariable(name) => Ok(self.universe.get_global(name)),
            ExpressionKind::Constant(name) => self
                .universe
                .get_constant(name)
                .ok_or_else(|| error(RuntimeErrorKind::UninitializedConstant(name.clone()))),
            ExpressionKind::Prefix { operator, rhs } => {
                let rhs = self.evaluate(scope, rhs)?;
                Self::evaluate_prefix(*operator, &rhs).map_err(error)
            }
            ExpressionKind::Infix { operator, lhs, rhs } => {
                let lhs = self.evaluate(scope, lhs)?;
                let rhs = self.evaluate(scope, rhs)?;
                Self::evaluate_infix(*operator, &lhs, &rhs).map_err(error)
            }
            ExpressionKind::InfixShortCircuit { operator, lhs, rhs } => {
                let lhs = self.evaluate(scope, lhs)?;
                let decided = match operator {
                    InfixShortCircuitOperator::And => !lhs.is_truthy(),
                    InfixShortCircuitOperator::Or => lhs.is_truthy(),
                };
                match decided {
                    true => Ok(lhs),
                    false => self.evaluate(scope, rhs),
                }
            }
            ExpressionKind::Assign { target, value } => {
                let value = self.evaluate(scope, value)?;
                self.assign(scope, target, value.clone()).map_err(error)?;
                Ok(value)
            }
            ExpressionKind::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items.iter() {
                    values.push(self.evaluate(scope, item)?);
                }
                Ok(Value::from(values))
            }
            ExpressionKind::Index { receiver, index } => {
                let receiver = self.evaluate(scope, receiver)?;
                let index = self.evaluate(scope, index)?;
                receiver.index(&index).map_err(error)
            }
            ExpressionKind::Call(call) => self.evaluate_call(scope, call, span),
            ExpressionKind::If {
                condition,
                success,
                failure,
            } => {
                let condition = self.evaluate(scope, condition)?;
                match (condition.is_truthy(), failure) {
                    (true, _) => self.evaluate_body(scope, success),
                    (false, Some(failure)) => self.evaluate_body(scope, failure),
                    (false, None) => Ok(Value::Nil),
                }
            }
            ExpressionKind::Sequence(body) => self.evaluate_body(scope, body),
            ExpressionKind::MethodDecl(decl) => Ok(self.define_method(scope, decl)),
            ExpressionKind::ClassDecl(decl) => self.define_class(scope, decl, span),
        }
    }

    fn evaluate_atom(scope: &Scope, atom: &ExpressionAtomKind) -> Value {
        match atom {
            ExpressionAtomKind::Integer(v) => Value::Integer(*v),
            ExpressionAtomKind::StringLiteral(v) => Value::String(v.clone()),
            ExpressionAtomKind::Bool(v) => Value::Bool(*v),
            ExpressionAtomKind::Nil => Value::Nil,
            ExpressionAtomKind::SelfValue => scope.receiver.value.clone(),
        }
    }

    fn evaluate_prefix(operator: PrefixOperator, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        match operator {
            PrefixOperator::Minus => rhs.negate(),
            PrefixOperator::Bang => Ok(rhs.not()),
        }
    }

    fn evaluate_infix(
        operator: InfixOperator,
        lhs: &Value,
        rhs: &Value,
    ) -> Result<Value, RuntimeErrorKind> {
        match operator {
            InfixOperator::Add => lhs.add(rhs),
            InfixOperator::Subtract => lhs.subtract(rhs),
            InfixOperator::Multiply => lhs.multiply(rhs),
            InfixOperator::Divide => lhs.divide(rhs),
            InfixOperator::Modulo => lhs.modulo(rhs),
            InfixOperator::LessThan => lhs.compare(rhs).map(|o| o.is_lt().into()),
            InfixOperator::LessThanEqual => lhs.compare(rhs).map(|o| o.is_le().into()),
            InfixOperator::GreaterThan => lhs.compare(rhs).map(|o| o.is_gt().into()),
            InfixOperator::GreaterThanEqual => lhs.compare(rhs).map(|o| o.is_ge().into()),
            InfixOperator::EqualEqual => Ok(lhs.is_equal(rhs).into()),
            InfixOperator::BangEqual => Ok((!lhs.is_equal(rhs)).into()),
        }
    }
}

// Names
impl<C: SystemContext> TreeWalkInterpreter<C> {
    /// Local variables shadow methods; an unbound bare name is tried as a zero argument call on
    /// `self` before giving up.
    fn read_variable(&mut self, scope: &Scope, ident: &Ident) -> Result<Value, RuntimeError> {
        if let Some(value) = scope.frame.lookup(&ident.name) {
            return Ok(value);
        }

        let receiver = scope.receiver.value.clone();
        match self.universe.class_of(&receiver).find_method(&ident.name) {
            Some(method) => self.invoke_method(receiver, method, Vec::new(), None, ident.span),
            None => Err(RuntimeError {
                kind: RuntimeErrorKind::UnboundName(ident.name.clone()),
                span: ident.span,
            }),
        }
    }

    fn assign(
        &mut self,
        scope: &Scope,
        target: &AssignTarget,
        value: Value,
    ) -> Result<(), RuntimeErrorKind> {
        match target {
            AssignTarget::Variable(ident) => scope.frame.assign(ident.name.clone(), value),
            AssignTarget::InstanceVariable(name) => {
                let Some(object) = scope.receiver.value.as_attribute_bearing() else {
                    return Err(RuntimeErrorKind::ImmutableReceiver(
                        scope.receiver.value.clone(),
                    ));
                };
                object.set_attribute(name.clone(), value);
            }
            AssignTarget::ClassVariable(name) => {
                let class = self.class_variable_scope(scope);
                let owner = class.find_class_variable_owner(name).unwrap_or(class);
                owner.set_class_variable(name.clone(), value);
            }
            AssignTarget::GlobalVariable(name) => self.universe.set_global(name.clone(), value),
            AssignTarget::Constant(name) => self.universe.set_constant(name.clone(), value),
        }
        Ok(())
    }

    /// The class whose ancestor chain `@@name` resolves against: the class itself inside a
    /// class body, otherwise the runtime class of `self`.
    fn class_variable_scope(&self, scope: &Scope) -> Class {
        match &scope.receiver.value {
            Value::Class(class) => class.clone(),
            other => self.universe.class_of(other),
        }
    }
}

// Definitions
impl<C: SystemContext> TreeWalkInterpreter<C> {
    fn define_method(&mut self, scope: &Scope, decl: &MethodDecl) -> Value {
        let definee = &scope.receiver.definee;
        let redefined = definee.has_own_method(&decl.name.name);
        tracing::debug!(
            class = %definee.get_name(),
            method = %decl.name,
            redefined,
            "installing method"
        );
        let callable = Callable::method(decl, scope.receiver.lexical.clone());
        definee.define_method(decl.name.name.clone(), Method::Defined(Rc::new(callable)));
        Value::Nil
    }

    fn define_class(
        &mut self,
        scope: &Scope,
        decl: &ClassDecl,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let name = &decl.name.name;
        let error = |kind| RuntimeError { kind, span };

        let super_class = match &decl.super_class {
            Some(ident) => match self.universe.get_constant(&ident.name) {
                Some(Value::Class(class)) => Some(class),
                Some(_) => {
                    return Err(RuntimeError {
                        kind: RuntimeErrorKind::InvalidSuperClass(name.clone()),
                        span: ident.span,
                    })
                }
                None => {
                    return Err(RuntimeError {
                        kind: RuntimeErrorKind::UninitializedConstant(ident.name.clone()),
                        span: ident.span,
                    })
                }
            },
            None => None,
        };

        let class = match self.universe.get_constant(name) {
            Some(Value::Class(existing)) => {
                if let Some(requested) = super_class {
                    let unchanged = existing
                        .get_super_class()
                        .is_some_and(|current| current.ptr_eq(&requested));
                    if !unchanged {
                        return Err(error(RuntimeErrorKind::SuperclassMismatch(name.clone())));
                    }
                }
                tracing::debug!(class = %name, "reopening class");
                existing
            }
            Some(_) => return Err(error(RuntimeErrorKind::NotAClass(name.clone()))),
            None => {
                let parent =
                    super_class.unwrap_or_else(|| self.universe.get_classes().object.clone());
                tracing::debug!(class = %name, parent = %parent.get_name(), "creating class");
                let class = Class::new(name.clone(), Some(parent));
                self.universe
                    .set_constant(name.clone(), Value::Class(class.clone()));
                class
            }
        };

        let frame = scope.frame.new_scope(Discipline::Shadowing);
        let body_scope = Scope {
            receiver: Receiver {
                value: Value::Class(class.clone()),
                definee: class,
                lexical: frame.clone(),
            },
            frame,
        };
        self.evaluate_body(&body_scope, &decl.body)
    }
}

// Dispatch
impl<C: SystemContext> TreeWalkInterpreter<C> {
    fn evaluate_call(
        &mut self,
        scope: &Scope,
        call: &CallExpression,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let receiver = match &call.receiver {
            Some(receiver) => self.evaluate(scope, receiver)?,
            None => scope.receiver.value.clone(),
        };

        let mut arguments = Vec::with_capacity(call.arguments.len());
        for argument in call.arguments.iter() {
            arguments.push(self.evaluate(scope, argument)?);
        }

        let block = call.block.as_ref().map(|literal| {
            Rc::new(Callable::block(
                literal,
                scope.frame.clone(),
                scope.receiver.clone(),
            ))
        });

        self.call_method(receiver, &call.method, arguments, block, span)
    }

    /// Looks `name` up on the receiver's class chain, nearest class first, and invokes it.
    pub fn call_method(
        &mut self,
        receiver: Value,
        name: &Ident,
        arguments: Vec<Value>,
        block: Option<Rc<Callable>>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let class = self.universe.class_of(&receiver);
        let Some(method) = class.find_method(&name.name) else {
            return Err(RuntimeError {
                kind: RuntimeErrorKind::NoMethod {
                    name: name.name.clone(),
                    class: class.get_name().clone(),
                },
                span: name.span,
            });
        };
        self.invoke_method(receiver, method, arguments, block, span)
    }

    fn invoke_method(
        &mut self,
        receiver: Value,
        method: Method,
        arguments: Vec<Value>,
        block: Option<Rc<Callable>>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match method {
            Method::Native(native) => {
                tracing::trace!(method = native.get_name(), "calling native method");
                native
                    .get_arity()
                    .check(arguments.len())
                    .map_err(|kind| RuntimeError { kind, span })?;
                let call = NativeCall {
                    receiver: &receiver,
                    arguments,
                    block,
                    span,
                };
                native.call(self, call)
            }
            Method::Defined(callable) => {
                self.invoke_callable(&callable, Some(receiver), arguments, span)
            }
        }
    }

    /// Runs a method body or block in a fresh frame whose parent is the callable's captured
    /// frame. Methods take `self` from the call; blocks keep the one they were written under.
    #[tracing::instrument(level = "debug", skip_all, fields(callable = callable.get_name()))]
    fn invoke_callable(
        &mut self,
        callable: &Callable,
        receiver: Option<Value>,
        arguments: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        if self.depth >= MAX_CALL_DEPTH {
            tracing::debug!(depth = self.depth, "call depth limit reached");
            return Err(RuntimeError {
                kind: RuntimeErrorKind::StackTooDeep,
                span,
            });
        }

        self.depth += 1;
        let result = stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || {
            self.enter_callable(callable, receiver, arguments, span)
        });
        self.depth -= 1;
        result
    }

    fn enter_callable(
        &mut self,
        callable: &Callable,
        receiver: Option<Value>,
        arguments: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        if arguments.len() != callable.arity() {
            return Err(RuntimeError {
                kind: RuntimeErrorKind::InvalidArgumentCount {
                    actual: arguments.len(),
                    expected: callable.arity(),
                },
                span,
            });
        }

        let frame = callable.frame.new_scope(callable.discipline);
        for (parameter, argument) in callable.parameters.iter().zip(arguments) {
            frame.define(parameter.name.clone(), argument);
        }

        let receiver = match &callable.kind {
            CallableKind::Block { receiver } => receiver.clone(),
            CallableKind::Method { .. } => {
                let value = receiver.unwrap_or_else(|| self.universe.get_main());
                Receiver {
                    definee: self.universe.class_of(&value),
                    value,
                    lexical: callable.frame.clone(),
                }
            }
        };

        self.evaluate_body(&Scope { frame, receiver }, &callable.body)
    }
}

impl<C: SystemContext> Runtime for TreeWalkInterpreter<C> {
    fn class_of(&self, value: &Value) -> Class {
        self.universe.class_of(value)
    }

    fn invoke_block(
        &mut self,
        block: &Callable,
        arguments: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        self.invoke_callable(block, None, arguments, span)
    }

    fn writeln(&mut self, text: &str) {
        self.context.writeln(text);
    }

    fn assertion_failed(&mut self, actual: &Value, expected: &Value) -> AssertionPolicy {
        self.context.assertion_failed(actual, expected)
    }
}
