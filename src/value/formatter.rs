use super::error::{RuntimeError, RuntimeErrorKind};
use super::Value;
use crate::lexer::LineBreaks;
use ariadne::{Color, ColorGenerator, Fmt, Label, Report, ReportKind, Source};
use std::path::Path;

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait ValueFormatter {
    fn format(&self, value: &Value) -> String;
    fn format_error(&self, error: &RuntimeError) -> String;
}

pub struct DebugFormatter;

impl ValueFormatter for DebugFormatter {
    fn format(&self, value: &Value) -> String {
        format!("{value:?}")
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        format!("{error:?}")
    }
}

/// One line per error: `[line N] Category: message`.
pub struct BasicFormatter {
    line_breaks: LineBreaks,
}

impl BasicFormatter {
    pub fn new(text: &str) -> Self {
        let line_breaks = LineBreaks::new(text);
        Self { line_breaks }
    }
}

impl ValueFormatter for BasicFormatter {
    fn format(&self, value: &Value) -> String {
        value.inspect()
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        let line = self.line_breaks.get_line_from_span(error.span);
        format!("[line {line}] {}: {}", error.category(), error.kind)
    }
}

pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src Path,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self { text, path }
    }

    fn headline(error: &RuntimeError) -> &'static str {
        match error.kind {
            RuntimeErrorKind::UnboundName(_) => "Read of an unbound name",
            RuntimeErrorKind::UninitializedConstant(_) => "Read of an undefined constant",
            RuntimeErrorKind::UninitializedClassVariable { .. } => {
                "Read of an unset class variable"
            }
            RuntimeErrorKind::NoMethod { .. } => "Method lookup failed",
            RuntimeErrorKind::InvalidArgumentCount { .. } => "Argument count mismatch",
            RuntimeErrorKind::MissingBlock(_) => "Method requires a block",
            RuntimeErrorKind::NonNumeric(_) | RuntimeErrorKind::NonNumerics(_, _) => {
                "Expected numeric operands"
            }
            RuntimeErrorKind::NonAddable(_, _) => "Operands cannot be added",
            RuntimeErrorKind::NonComparable(_, _) => "Operands cannot be compared",
            RuntimeErrorKind::NonIndexable(_) | RuntimeErrorKind::InvalidIndex(_) => {
                "Invalid index expression"
            }
            RuntimeErrorKind::InvalidSuperClass(_)
            | RuntimeErrorKind::SuperclassMismatch(_)
            | RuntimeErrorKind::NotAClass(_) => "Invalid class definition",
            RuntimeErrorKind::NonAllocatable(_) => "Class cannot be instantiated",
            RuntimeErrorKind::ImmutableReceiver(_) => "Receiver has no instance variables",
            RuntimeErrorKind::ZeroDivision => "Division by zero",
            RuntimeErrorKind::IntegerOverflow => "Integer overflow",
            RuntimeErrorKind::StackTooDeep => "Call depth exceeded",
            RuntimeErrorKind::AssertionFailure { .. } => "Assertion failed",
        }
    }
}

impl<'src> ValueFormatter for PrettyFormatter<'src> {
    fn format(&self, value: &Value) -> String {
        value.inspect()
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        let path = self.path.to_string_lossy();
        let path = path.as_ref();
        let span = error.span;
        let mut colors = ColorGenerator::new();
        let mut output = std::io::Cursor::new(Vec::new());

        let label = match &error.kind {
            RuntimeErrorKind::AssertionFailure { actual, expected } => format!(
                "expected {} but got {}",
                expected.inspect().fg(colors.next()),
                actual.inspect().fg(colors.next()),
            ),
            kind => format!("{}: {}", error.category().fg(Color::BrightRed), kind),
        };

        Report::build(ReportKind::Error, (path, span.range()))
            .with_code(error.code())
            .with_message(Self::headline(error))
            .with_label(
                Label::new((path, span.range()))
                    .with_message(label)
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }
}
