use std::{
    fs::{read_dir, read_to_string},
    path::Path,
};

use color_eyre::{eyre::Context, Result};
use rubble::{
    interpreter::{context::BufferedContext, TreeWalkInterpreter},
    parser::{
        formatter::{ProgramFormatter, SExpressionFormatter},
        Parser,
    },
    value::formatter::{BasicFormatter, ValueFormatter},
};

#[test]
fn test_closure() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/closure");
    test_engine(input_dir)
}

#[test]
fn test_block() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/block");
    test_engine(input_dir)
}

#[test]
fn test_method() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/method");
    test_engine(input_dir)
}

#[test]
fn test_class() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/class");
    test_engine(input_dir)
}

#[test]
fn test_class_variable() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/class_variable");
    test_engine(input_dir)
}

#[test]
fn test_operator() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/operator");
    test_engine(input_dir)
}

#[test]
fn test_builtin() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/builtin");
    test_engine(input_dir)
}

#[test]
fn test_error() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/error");
    test_engine(input_dir)
}

#[test]
fn test_sample() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/sample");
    test_engine(input_dir)
}

struct TestCase {
    name: String,
    source: String,
    output: String,
    runtime_errors: String,
}

impl TestCase {
    pub fn check(&self) {
        let program = match Parser::new(&self.source).parse() {
            Ok(program) => program,
            Err(e) => {
                let formatter = SExpressionFormatter::new(&self.source);
                panic!(
                    "Failed test {} at parse stage: {}",
                    self.name,
                    formatter.format_error(&e)
                );
            }
        };

        let value_formatter = BasicFormatter::new(&self.source);
        let mut interpreter = TreeWalkInterpreter::new(BufferedContext::new());
        let runtime_errors = match interpreter.run(&program) {
            Ok(_) => String::new(),
            Err(e) => value_formatter.format_error(&e),
        };
        assert_eq!(
            self.runtime_errors, runtime_errors,
            "Failed test {} at runtime.",
            self.name,
        );

        let output = interpreter.into_context().into_data();
        assert_eq!(self.output, output, "Failed test {} at print.", self.name);
    }
}

fn test_engine(input_dir: &Path) -> Result<()> {
    let mut succeeded = true;
    for entry in read_dir(input_dir).context("Failed to open input test data folder")? {
        let entry = entry?;
        let path = entry.path();

        let Some(extension) = path.extension() else {
            continue;
        };

        if extension != "rb" {
            continue;
        }

        println!("Parsing {path:?}");
        let test_case = parse_test_case(&path)?;
        println!("Checking {}", test_case.name);

        let res = std::panic::catch_unwind(|| {
            test_case.check();
        });
        if res.is_err() {
            println!("\tFails test case {}", test_case.name);
            succeeded = false;
        }
    }

    assert!(succeeded, "Some test cases in {input_dir:?} failed");

    Ok(())
}

fn parse_test_case(input_path: &Path) -> Result<TestCase> {
    const EXPECT_OUTPUT: &str = "# expect:";
    const EXPECT_RUNTIME_ERROR: &str = "# expect runtime error:";

    let test_name = input_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let input = read_to_string(input_path).context("Failed to open input test data file")?;

    let mut output = String::new();
    let mut expected_runtime_errors = Vec::new();

    for (line_index, line) in input.lines().enumerate() {
        if let Some(comment_index) = line.find(EXPECT_RUNTIME_ERROR) {
            let expected = line[comment_index + EXPECT_RUNTIME_ERROR.len()..].trim();
            expected_runtime_errors.push(format!("[line {}] {expected}", line_index + 1));
        } else if let Some(comment_index) = line.find(EXPECT_OUTPUT) {
            let expected = line[comment_index + EXPECT_OUTPUT.len()..].trim();
            output.push_str(expected);
            output.push('\n');
        }
    }

    Ok(TestCase {
        name: test_name,
        source: input,
        output,
        runtime_errors: expected_runtime_errors.join("\n"),
    })
}
