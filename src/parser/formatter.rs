use super::{
    expression::{AssignTarget, Body, Expression, ExpressionAtomKind, ExpressionKind},
    ParserError, Program,
};
use crate::lexer::LineBreaks;
use crate::string::Ident;
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::path::Path;

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait ProgramFormatter {
    fn format(&self, program: &Program) -> String;
    fn format_error(&self, error: &ParserError) -> String;
}

pub struct DebugFormatter;

impl ProgramFormatter for DebugFormatter {
    fn format(&self, program: &Program) -> String {
        format!("{program:#?}")
    }

    fn format_error(&self, error: &ParserError) -> String {
        format!("{error:?}")
    }
}

/// Renders programs as one S-expression per top-level expression.
pub struct SExpressionFormatter {
    line_breaks: LineBreaks,
}

impl SExpressionFormatter {
    pub fn new(text: &str) -> Self {
        Self {
            line_breaks: LineBreaks::new(text),
        }
    }

    pub fn format_expression(expression: &Expression) -> String {
        match &expression.kind {
            ExpressionKind::Atom(atom) => match atom {
                ExpressionAtomKind::Integer(v) => format!("{v}"),
                ExpressionAtomKind::StringLiteral(v) => format!("{:?}", v.as_str()),
                ExpressionAtomKind::Bool(v) => format!("{v}"),
                ExpressionAtomKind::Nil => "nil".into(),
                ExpressionAtomKind::SelfValue => "self".into(),
            },
            ExpressionKind::Variable(ident) => format!("{ident}"),
            ExpressionKind::InstanceVariable(name) => format!("@{name}"),
            ExpressionKind::ClassVariable(name) => format!("@@{name}"),
            ExpressionKind::GlobalVariable(name) => format!("${name}"),
            ExpressionKind::Constant(name) => format!("{name}"),
            ExpressionKind::Prefix { operator, rhs } => {
                format!("({operator} {})", Self::format_expression(rhs))
            }
            ExpressionKind::Infix { operator, lhs, rhs } => format!(
                "({operator} {} {})",
                Self::format_expression(lhs),
                Self::format_expression(rhs)
            ),
            ExpressionKind::InfixShortCircuit { operator, lhs, rhs } => format!(
                "({operator} {} {})",
                Self::format_expression(lhs),
                Self::format_expression(rhs)
            ),
            ExpressionKind::Assign { target, value } => {
                let target = match target {
                    AssignTarget::Variable(ident) => format!("{ident}"),
                    AssignTarget::InstanceVariable(name) => format!("@{name}"),
                    AssignTarget::ClassVariable(name) => format!("@@{name}"),
                    AssignTarget::GlobalVariable(name) => format!("${name}"),
                    AssignTarget::Constant(name) => format!("{name}"),
                };
                format!("(= {target} {})", Self::format_expression(value))
            }
            ExpressionKind::Array(items) => {
                Self::format_list("array", items.iter().map(Self::format_expression))
            }
            ExpressionKind::Index { receiver, index } => format!(
                "(index {} {})",
                Self::format_expression(receiver),
                Self::format_expression(index)
            ),
            ExpressionKind::Call(call) => {
                let receiver = match &call.receiver {
                    Some(receiver) => Self::format_expression(receiver),
                    None => "_".into(),
                };
                let mut parts = vec![receiver, format!("{}", call.method)];
                parts.extend(call.arguments.iter().map(Self::format_expression));
                if let Some(block) = &call.block {
                    let mut block_parts = vec![Self::format_parameters(&block.parameters)];
                    block_parts.extend(Self::format_body(&block.body));
                    parts.push(Self::format_list("block", block_parts));
                }
                Self::format_list("call", parts)
            }
            ExpressionKind::If {
                condition,
                success,
                failure,
            } => {
                let mut parts = vec![
                    Self::format_expression(condition),
                    Self::format_list("do", Self::format_body(success)),
                ];
                if let Some(failure) = failure {
                    parts.push(Self::format_list("do", Self::format_body(failure)));
                }
                Self::format_list("if", parts)
            }
            ExpressionKind::Sequence(body) => Self::format_list("seq", Self::format_body(body)),
            ExpressionKind::MethodDecl(decl) => {
                let mut parts = vec![
                    format!("{}", decl.name),
                    Self::format_parameters(&decl.parameters),
                ];
                parts.extend(Self::format_body(&decl.body));
                Self::format_list("def", parts)
            }
            ExpressionKind::ClassDecl(decl) => {
                let mut parts = vec![format!("{}", decl.name)];
                if let Some(super_class) = &decl.super_class {
                    parts.push(format!("< {super_class}"));
                }
                parts.extend(Self::format_body(&decl.body));
                Self::format_list("class", parts)
            }
        }
    }

    fn format_body(body: &Body) -> impl Iterator<Item = String> + '_ {
        body.iter().map(Self::format_expression)
    }

    fn format_parameters(parameters: &[Ident]) -> String {
        let names: Vec<String> = parameters.iter().map(|p| format!("{p}")).collect();
        format!("({})", names.join(" "))
    }

    fn format_list(head: &str, items: impl IntoIterator<Item = String>) -> String {
        let mut output = format!("({head}");
        for item in items {
            output.push(' ');
            output.push_str(&item);
        }
        output.push(')');
        output
    }
}

impl ProgramFormatter for SExpressionFormatter {
    fn format(&self, program: &Program) -> String {
        program
            .iter()
            .map(Self::format_expression)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_error(&self, error: &ParserError) -> String {
        let line = self.line_breaks.get_line_from_span(error.span);
        format!("[line {line}] SyntaxError: {}", error.kind)
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
}

impl<'src> ProgramFormatter for PrettyFormatter<'src> {
    fn format(&self, program: &Program) -> String {
        SExpressionFormatter::new(self.text).format(program)
    }

    fn format_error(&self, error: &ParserError) -> String {
        let path = self.path.to_string_lossy();
        let path = path.as_ref();
        let span = error.span;
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, (path, span.range()))
            .with_code(error.code())
            .with_message("Failed to parse source")
            .with_label(
                Label::new((path, span.range()))
                    .with_message(format!("{}", error.kind))
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }
}
