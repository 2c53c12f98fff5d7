mod span;

pub use span::{SpanIndex, SpanLength};
use std::collections::HashMap;
use std::fmt::Display;
use std::ops::Range;
use std::sync::LazyLock;

/// The hashmap for keywords
pub static KEYWORD_HASHMAP: LazyLock<HashMap<&'static str, TokenKind>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("class", TokenKind::KeywordClass);
    map.insert("def", TokenKind::KeywordDef);
    map.insert("do", TokenKind::KeywordDo);
    map.insert("else", TokenKind::KeywordElse);
    map.insert("elsif", TokenKind::KeywordElsif);
    map.insert("end", TokenKind::KeywordEnd);
    map.insert("false", TokenKind::KeywordFalse);
    map.insert("if", TokenKind::KeywordIf);
    map.insert("nil", TokenKind::KeywordNil);
    map.insert("self", TokenKind::KeywordSelf);
    map.insert("then", TokenKind::KeywordThen);
    map.insert("true", TokenKind::KeywordTrue);
    map
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// The byte position of the start of the token.
    pub start: SpanIndex,
    /// The length of the token in bytes.
    pub length: SpanLength,
}

impl Span {
    pub fn new(start: SpanIndex, end: SpanIndex) -> Self {
        Self {
            start,
            length: end - start,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start.into()..(self.start + self.length).into()
    }

    pub fn end(&self) -> SpanIndex {
        self.start + self.length
    }

    pub fn merge(&self, other: &Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        let length = end - start;
        Span { start, length }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Punctuation
    LeftParenthesis,
    RightParenthesis,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Semicolon,
    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pipe,
    PipePipe,
    AmpersandAmpersand,
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    // Literals and names
    IntegerLiteral,
    StringLiteral,
    Ident,
    Constant,
    InstanceVariable,
    ClassVariable,
    GlobalVariable,
    // Keywords
    KeywordClass,
    KeywordDef,
    KeywordDo,
    KeywordElse,
    KeywordElsif,
    KeywordEnd,
    KeywordFalse,
    KeywordIf,
    KeywordNil,
    KeywordSelf,
    KeywordThen,
    KeywordTrue,
    // Layout
    Newline,
    Eof,
}

impl TokenKind {
    /// Tokens that close off a statement.
    pub fn is_terminator(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Semicolon)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TokenKind::LeftParenthesis => "LEFT_PAREN",
            TokenKind::RightParenthesis => "RIGHT_PAREN",
            TokenKind::LeftBracket => "LEFT_BRACKET",
            TokenKind::RightBracket => "RIGHT_BRACKET",
            TokenKind::LeftBrace => "LEFT_BRACE",
            TokenKind::RightBrace => "RIGHT_BRACE",
            TokenKind::Comma => "COMMA",
            TokenKind::Dot => "DOT",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Percent => "PERCENT",
            TokenKind::Pipe => "PIPE",
            TokenKind::PipePipe => "PIPE_PIPE",
            TokenKind::AmpersandAmpersand => "AMPERSAND_AMPERSAND",
            TokenKind::Bang => "BANG",
            TokenKind::BangEqual => "BANG_EQUAL",
            TokenKind::Equal => "EQUAL",
            TokenKind::EqualEqual => "EQUAL_EQUAL",
            TokenKind::LessThan => "LESS",
            TokenKind::LessThanEqual => "LESS_EQUAL",
            TokenKind::GreaterThan => "GREATER",
            TokenKind::GreaterThanEqual => "GREATER_EQUAL",
            TokenKind::IntegerLiteral => "INTEGER",
            TokenKind::StringLiteral => "STRING",
            TokenKind::Ident => "IDENTIFIER",
            TokenKind::Constant => "CONSTANT",
            TokenKind::InstanceVariable => "INSTANCE_VARIABLE",
            TokenKind::ClassVariable => "CLASS_VARIABLE",
            TokenKind::GlobalVariable => "GLOBAL_VARIABLE",
            TokenKind::KeywordClass => "CLASS",
            TokenKind::KeywordDef => "DEF",
            TokenKind::KeywordDo => "DO",
            TokenKind::KeywordElse => "ELSE",
            TokenKind::KeywordElsif => "ELSIF",
            TokenKind::KeywordEnd => "END",
            TokenKind::KeywordFalse => "FALSE",
            TokenKind::KeywordIf => "IF",
            TokenKind::KeywordNil => "NIL",
            TokenKind::KeywordSelf => "SELF",
            TokenKind::KeywordThen => "THEN",
            TokenKind::KeywordTrue => "TRUE",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Eof => "EOF",
        };
        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
