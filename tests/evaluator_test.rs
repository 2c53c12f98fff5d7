use color_eyre::eyre::{eyre, Result};
use proptest::prelude::*;
use rubble::{
    interpreter::{
        context::BufferedContext, AssertionPolicy, SystemContext, TreeWalkInterpreter,
        MAX_CALL_DEPTH,
    },
    parser::Parser,
    value::{
        error::{ErrorCategory, RuntimeError, RuntimeErrorKind},
        Value,
    },
};

fn run_with(
    source: &str,
    context: BufferedContext,
) -> Result<(Result<Value, RuntimeError>, BufferedContext)> {
    let program = Parser::new(source)
        .parse()
        .map_err(|e| eyre!("failed to parse {source:?}: {e}"))?;
    let mut interpreter = TreeWalkInterpreter::new(context);
    let result = interpreter.run(&program);
    Ok((result, interpreter.into_context()))
}

fn evaluate(source: &str) -> Result<Value> {
    let (result, _) = run_with(source, BufferedContext::new())?;
    result.map_err(|e| eyre!("runtime error in {source:?}: {e}"))
}

fn evaluate_integer(source: &str) -> Result<i64> {
    match evaluate(source)? {
        Value::Integer(v) => Ok(v),
        other => Err(eyre!("expected an Integer but got {}", other.inspect())),
    }
}

#[test]
fn times_accumulates_into_outer_frame() -> Result<()> {
    let source = "a = 0\n255.times do |n|\n  a = a + n\nend\na";
    assert_eq!(evaluate_integer(source)?, 32385);
    Ok(())
}

#[test]
fn two_variable_accumulation() -> Result<()> {
    let source = "a = 0\nb = 0\n24.times do |n|\n  b = b + n + a\n  a = b\nend\na";
    assert_eq!(evaluate_integer(source)?, 16777191);
    Ok(())
}

#[test]
fn method_write_does_not_escape() -> Result<()> {
    assert_eq!(evaluate_integer("a=1; def foo; a; a=2; end; foo(); a")?, 1);
    Ok(())
}

#[test]
fn block_write_escapes() -> Result<()> {
    assert_eq!(evaluate_integer("a=0; 3.times{|n| a=a+n}; a")?, 3);
    Ok(())
}

#[test]
fn method_reads_class_body_local() -> Result<()> {
    let source = "a=1; class Foo; a=2; def bar2; a; end; end; Foo.new.bar2";
    assert_eq!(evaluate_integer(source)?, 2);
    assert_eq!(
        evaluate_integer("a=1; class Foo; a=2; def bar2; a; end; end; Foo.new.bar2; a")?,
        1
    );
    Ok(())
}

#[test]
fn instance_variables_are_per_instance() -> Result<()> {
    let source = "class Vec
  def set_xxx(x)
    @xxx = x
  end
  def get_xxx
    @xxx
  end
end
foo1 = Vec.new
foo2 = Vec.new
foo1.set_xxx(777)
foo2.set_xxx(999)
[foo1.get_xxx, foo2.get_xxx]";
    let value = evaluate(source)?;
    assert!(value.is_equal(&Value::from(vec![Value::Integer(777), Value::Integer(999)])));
    Ok(())
}

#[test]
fn class_variables_are_shared_between_instances() -> Result<()> {
    let source = "class Car
  @@class_var = 2
  def set_class_var(i)
    @@class_var = i
  end
  def get_class_var
    @@class_var
  end
end
car1 = Car.new
car2 = Car.new
car1.set_class_var(22222)
car2.get_class_var";
    assert_eq!(evaluate_integer(source)?, 22222);
    Ok(())
}

#[test]
fn iteration_primitives_return_nil() -> Result<()> {
    let (result, context) = run_with("a = 3.times { puts('hello') }\na", BufferedContext::new())?;
    assert!(matches!(result, Ok(Value::Nil)));
    assert_eq!(context.into_data(), "hello\nhello\nhello\n");
    assert!(matches!(evaluate("[1, 2].each { |x| x }")?, Value::Nil));
    Ok(())
}

#[test]
fn reopened_class_keeps_methods() -> Result<()> {
    let source = "class Car
  def setName(str)
    @name = str
  end
  def getName
    @name
  end
end
early = Car.new
early.setName('Legacy')
class Car
  def wheels
    4
  end
end
late = Car.new
late.setName('XV')
[early.getName, late.getName, early.wheels]";
    let expected = Value::from(vec![
        Value::from("Legacy"),
        Value::from("XV"),
        Value::Integer(4),
    ]);
    assert!(evaluate(source)?.is_equal(&expected));
    Ok(())
}

#[test]
fn class_objects_have_their_own_attributes() -> Result<()> {
    let source = "class Counter
  @count = 5
  def count
    @count
  end
end
Counter.new.count";
    assert!(matches!(evaluate(source)?, Value::Nil));
    Ok(())
}

#[test]
fn halting_assertion_surfaces_as_error() -> Result<()> {
    let (result, context) = run_with("assert(1, 2)\nputs('after')", BufferedContext::new())?;
    let error = result.expect_err("mismatched assert must halt");
    assert_eq!(error.category(), ErrorCategory::AssertionFailure);
    assert!(matches!(error.kind, RuntimeErrorKind::AssertionFailure { .. }));
    assert_eq!(context.get_failures(), ["expected 2, got 1"]);
    assert_eq!(context.into_data(), "");
    Ok(())
}

#[test]
fn continuing_assertion_keeps_evaluating() -> Result<()> {
    let context = BufferedContext::with_policy(AssertionPolicy::Continue);
    let (result, context) = run_with("assert('a', 'b')\nputs('after')\n7", context)?;
    assert!(matches!(result, Ok(Value::Integer(7))));
    assert_eq!(context.get_failures(), ["expected \"b\", got \"a\""]);
    assert_eq!(context.into_data(), "after\n");
    Ok(())
}

#[derive(Default)]
struct LinesOnly {
    lines: Vec<String>,
}

impl SystemContext for LinesOnly {
    fn writeln(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}

#[test]
fn hosts_halt_on_assertion_failure_by_default() -> Result<()> {
    let program = Parser::new("puts('before')\nassert(1, 2)\nputs('after')")
        .parse()
        .map_err(|e| eyre!("{e}"))?;
    let mut interpreter = TreeWalkInterpreter::new(LinesOnly::default());
    let error = interpreter
        .run(&program)
        .expect_err("default policy halts");
    assert_eq!(error.category(), ErrorCategory::AssertionFailure);
    assert_eq!(interpreter.into_context().lines, ["before"]);
    Ok(())
}

#[test]
fn error_aborts_but_keeps_earlier_state() -> Result<()> {
    let program = Parser::new("x = 1\nnope\n")
        .parse()
        .map_err(|e| eyre!("{e}"))?;
    let mut interpreter = TreeWalkInterpreter::new(BufferedContext::new());
    let error = interpreter
        .run(&program)
        .expect_err("reading an unbound name fails");
    assert_eq!(error.category(), ErrorCategory::NameError);
    assert_eq!(error.code(), "RT001");

    let follow_up = Parser::new("x + 1").parse().map_err(|e| eyre!("{e}"))?;
    let value = interpreter.run(&follow_up).map_err(|e| eyre!("{e}"))?;
    assert!(matches!(value, Value::Integer(2)));
    Ok(())
}

#[test]
fn deep_recursion_raises_instead_of_overflowing() -> Result<()> {
    let source = "def countdown(n)
  if n == 0 then 0 else countdown(n - 1) + 1 end
end
countdown(5000)";
    assert_eq!(evaluate_integer(source)?, 5000);

    let program = Parser::new("def dive(n)\n  dive(n + 1)\nend\ndive(0)")
        .parse()
        .map_err(|e| eyre!("{e}"))?;
    let mut interpreter = TreeWalkInterpreter::new(BufferedContext::new());
    let error = interpreter
        .run(&program)
        .expect_err("unbounded recursion must fail");
    assert!(matches!(error.kind, RuntimeErrorKind::StackTooDeep));
    assert_eq!(error.category(), ErrorCategory::SystemStackError);
    assert_eq!(error.code(), "RT021");
    assert_eq!(error.to_string(), "stack level too deep");

    let object = &interpreter.get_universe().get_classes().object;
    assert!(object.has_own_method("dive"));

    let follow_up = Parser::new("depth = 0\n10.times { depth = depth + 1 }\ndive(0)")
        .parse()
        .map_err(|e| eyre!("{e}"))?;
    let error = interpreter
        .run(&follow_up)
        .expect_err("the limit applies again on a later run");
    assert!(matches!(error.kind, RuntimeErrorKind::StackTooDeep));
    assert!(matches!(
        interpreter.get_globals().lookup("depth"),
        Some(Value::Integer(10))
    ));
    Ok(())
}

#[test]
fn call_depth_limit_is_exact() -> Result<()> {
    let allowed = format!(
        "def down(n)\n  if n == 0 then 0 else down(n - 1) end\nend\ndown({})",
        MAX_CALL_DEPTH - 1
    );
    assert_eq!(evaluate_integer(&allowed)?, 0);

    let refused = format!(
        "def down(n)\n  if n == 0 then 0 else down(n - 1) end\nend\ndown({MAX_CALL_DEPTH})"
    );
    let (result, _) = run_with(&refused, BufferedContext::new())?;
    let error = result.expect_err("one call past the limit fails");
    assert!(matches!(error.kind, RuntimeErrorKind::StackTooDeep));
    Ok(())
}

#[test]
fn inspect_uses_literal_escapes() -> Result<()> {
    let value = evaluate("\"tab\\t nl\\n nul\\0 esc\\e slash\\\\ quote\\\"\"")?;
    let inspected = value.inspect();
    assert_eq!(
        inspected,
        "\"tab\\t nl\\n nul\\0 esc\\e slash\\\\ quote\\\"\""
    );
    assert!(evaluate(&inspected)?.is_equal(&value));
    Ok(())
}

proptest! {
    #[test]
    fn times_sums_to_triangular_number(n in 0i64..400) {
        let source = format!("sum = 0\n{n}.times {{ |i| sum = sum + i }}\nsum");
        let value = evaluate_integer(&source).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(value, n * (n - 1) / 2);
    }

    #[test]
    fn methods_shadow_and_blocks_write_through(outer in -1000i64..1000, inner in -1000i64..1000) {
        let method = format!("a = {outer}\ndef write_a\n  a = {inner}\nend\nwrite_a()\na");
        let value = evaluate_integer(&method).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(value, outer);

        let block = format!("a = {outer}\n1.times {{ a = {inner} }}\na");
        let value = evaluate_integer(&block).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(value, inner);
    }

    #[test]
    fn floor_division_identity(a in -10_000i64..10_000, b in prop_oneof![-100i64..-1, 1i64..100]) {
        let source = format!("({a}) / ({b}) * ({b}) + ({a}) % ({b})");
        let value = evaluate_integer(&source).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(value, a);
    }
}
