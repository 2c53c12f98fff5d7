use color_eyre::eyre::Result;
use rubble::parser::{
    formatter::{ProgramFormatter, SExpressionFormatter},
    Parser, ParserErrorKind,
};

fn check(input: &str, expected: &str, test_name: &str) {
    let formatter = SExpressionFormatter::new(input);
    let actual = match Parser::new(input).parse() {
        Ok(ref program) => formatter.format(program),
        Err(ref e) => formatter.format_error(e),
    };

    assert_eq!(actual, expected, "Failed the test {test_name}");
}

#[test]
fn smoke_test() {
    check("", "", "smoke");
}

#[test]
fn test_precedence() {
    check("1 + 2 * 3 - -4", "(- (+ 1 (* 2 3)) (- 4))", "arithmetic");
    check("a < b == c >= d", "(== (< a b) (>= c d))", "comparison");
    check("a || b && !c", "(|| a (&& b (! c)))", "logical");
    check("x = y = 3 % 2", "(= x (= y (% 3 2)))", "assignment");
}

#[test]
fn test_variables() {
    check(
        "@a = @@b\n$c = Foo\nself",
        "(= @a @@b)\n(= $c Foo)\nself",
        "sigils",
    );
}

#[test]
fn test_literals() -> Result<()> {
    check(
        "[1, 'two', nil, true][0]",
        "(index (array 1 \"two\" nil true) 0)",
        "array",
    );
    check("\"a\\nb\"", "\"a\\nb\"", "escape");
    Ok(())
}

#[test]
fn test_calls() {
    check("foo()", "(call _ foo)", "bare call");
    check("foo(1, 2)", "(call _ foo 1 2)", "bare call with arguments");
    check("foo", "foo", "bare name");
    check("a.b.c(1)", "(call (call a b) c 1)", "chain");
    check("x.class", "(call x class)", "class as method name");
    check(
        "3.times { |n| puts(n) }",
        "(call 3 times (block (n) (call _ puts n)))",
        "brace block",
    );
    check(
        "list.each do |a, b|\n  a\nend",
        "(call list each (block (a b) a))",
        "do block",
    );
    check("proc { }", "(call _ proc (block ()))", "empty block");
    check(
        "obj.run(\n  1,\n  2\n)",
        "(call obj run 1 2)",
        "multiline arguments",
    );
}

#[test]
fn test_definitions() {
    check(
        "def add(a, b)\n  a + b\nend",
        "(def add (a b) (+ a b))",
        "method",
    );
    check("def nothing; end", "(def nothing ())", "empty method");
    check(
        "class Dog < Animal\n  def speak\n    'woof'\n  end\nend",
        "(class Dog < Animal (def speak () \"woof\"))",
        "class",
    );
}

#[test]
fn test_conditionals() {
    check(
        "if a then 1 else 2 end",
        "(if a (do 1) (do 2))",
        "inline if",
    );
    check(
        "if a\n  1\nelsif b\n  2\nend",
        "(if a (do 1) (do (if b (do 2))))",
        "elsif",
    );
    check("(1; 2)", "(seq 1 2)", "sequence");
}

#[test]
fn test_errors() {
    check("def foo\n  class Bar\n  end\nend", "[line 2] SyntaxError: Class definition inside a method body.", "class in method");
    check("1 = 2", "[line 1] SyntaxError: Cannot assign to this expression.", "lvalue");
    check("puts 1", "[line 1] SyntaxError: Expected a statement terminator but got INTEGER.", "space before arguments");
    check("x = 'open", "[line 1] SyntaxError: Unterminated string.", "lexical");
}

#[test]
fn test_incomplete_input() {
    for source in ["def foo", "class A\n  x = 1", "foo(1,", "'abc", "if x\n"] {
        let error = Parser::new(source)
            .parse()
            .expect_err("the source ends in the middle of an expression");
        assert!(error.is_incomplete(), "{source:?} should be incomplete");
    }

    let error = Parser::new("1 = 2").parse().expect_err("not an lvalue");
    assert_eq!(error.kind, ParserErrorKind::InvalidLValue);
    assert!(!error.is_incomplete());
}
