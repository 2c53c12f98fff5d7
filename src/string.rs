use crate::lexer::Span;
use compact_str::CompactString;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: IdentName,
    pub span: Span,
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub type IdentName = Rc<str>;

/// Decodes the body of a quoted string literal, lexeme quotes included.
pub fn unescape_string_literal(lexeme: &str) -> CompactString {
    let mut chars = lexeme.chars();
    let quote = chars.next();
    let body = chars.as_str();
    let body = body.strip_suffix(|c| Some(c) == quote).unwrap_or(body);

    let mut output = CompactString::default();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            output.push(c);
            continue;
        }
        match (quote, chars.next()) {
            (Some('"'), Some('n')) => output.push('\n'),
            (Some('"'), Some('t')) => output.push('\t'),
            (Some('"'), Some('0')) => output.push('\0'),
            (Some('"'), Some('e')) => output.push('\u{1b}'),
            (Some('"'), Some(escaped @ ('\\' | '"'))) => output.push(escaped),
            (Some('\''), Some(escaped @ ('\\' | '\''))) => output.push(escaped),
            (_, Some(other)) => {
                output.push('\\');
                output.push(other);
            }
            (_, None) => output.push('\\'),
        }
    }
    output
}
