mod cursor;
mod error;
pub mod formatter;
mod token;

use cursor::{Cursor, SourceChar};
pub use error::{LexicalError, LexicalErrorKind};
use std::{ops::Range, rc::Rc};
pub use token::{Span, SpanIndex, SpanLength, Token, TokenKind, KEYWORD_HASHMAP};

#[derive(Debug, Clone)]
pub struct LineBreaks {
    line_breaks: Rc<[Range<SpanIndex>]>,
}

impl LineBreaks {
    pub fn new(text: &str) -> Self {
        let line_breaks = if !text.is_empty() {
            let mut line_breaks = Vec::new();
            let mut cursor: SpanIndex = 0.into();
            for (offset, byte) in text.bytes().enumerate() {
                let offset = (offset + 1).into();
                if byte == b'\n' {
                    line_breaks.push(cursor..offset);
                    cursor = offset;
                }
            }
            if !text.ends_with('\n') {
                line_breaks.push(cursor..(text.len() + 1).into());
            }
            line_breaks
        } else {
            vec![0.into()..1.into()]
        };
        Self {
            line_breaks: line_breaks.into(),
        }
    }

    pub fn get_max_line(&self) -> u32 {
        (self.line_breaks.len() + 1) as u32
    }

    pub fn get_line(&self, offset: SpanIndex) -> u32 {
        self.line_breaks
            .binary_search_by(|r| {
                if offset < r.start {
                    std::cmp::Ordering::Greater
                } else if offset >= r.end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .map(|v| (v + 1) as u32)
            .unwrap_or(self.get_max_line())
    }

    pub fn get_line_from_span(&self, span: Span) -> u32 {
        self.get_line(span.start)
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[derive(Debug)]
pub struct Lexer<'src> {
    source: &'src str,
    cursor: Cursor<'src>,
    line_breaks: LineBreaks,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            cursor: Cursor::new(source),
            line_breaks: LineBreaks::new(source),
            finished: false,
        }
    }

    pub fn get_source(&self) -> &'src str {
        self.source
    }

    pub fn get_line_breaks(&self) -> LineBreaks {
        self.line_breaks.clone()
    }

    pub fn get_lexeme(&self, span: &Span) -> Option<&'src str> {
        self.source.get(span.range())
    }
}

impl<'src> Lexer<'src> {
    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        loop {
            let Some(c) = self.cursor.next_char() else {
                let end = self.cursor.offset();
                return Ok(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(end, end),
                });
            };

            let kind = match c.value {
                ' ' | '\t' | '\r' => continue,
                '#' => {
                    self.cursor.eat_while(|c| c != '\n');
                    continue;
                }
                '\n' => TokenKind::Newline,
                '(' => TokenKind::LeftParenthesis,
                ')' => TokenKind::RightParenthesis,
                '[' => TokenKind::LeftBracket,
                ']' => TokenKind::RightBracket,
                '{' => TokenKind::LeftBrace,
                '}' => TokenKind::RightBrace,
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                ';' => TokenKind::Semicolon,
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '%' => TokenKind::Percent,
                '|' => match self.cursor.eat_if('|') {
                    true => TokenKind::PipePipe,
                    false => TokenKind::Pipe,
                },
                '&' => match self.cursor.eat_if('&') {
                    true => TokenKind::AmpersandAmpersand,
                    false => return Err(self.error_at(c, LexicalErrorKind::Unrecognized('&'))),
                },
                '!' => match self.cursor.eat_if('=') {
                    true => TokenKind::BangEqual,
                    false => TokenKind::Bang,
                },
                '=' => match self.cursor.eat_if('=') {
                    true => TokenKind::EqualEqual,
                    false => TokenKind::Equal,
                },
                '<' => match self.cursor.eat_if('=') {
                    true => TokenKind::LessThanEqual,
                    false => TokenKind::LessThan,
                },
                '>' => match self.cursor.eat_if('=') {
                    true => TokenKind::GreaterThanEqual,
                    false => TokenKind::GreaterThan,
                },
                '\'' | '"' => self.lex_string(c)?,
                '@' => match self.cursor.eat_if('@') {
                    true => self.lex_sigil_name(c, "@@", TokenKind::ClassVariable)?,
                    false => self.lex_sigil_name(c, "@", TokenKind::InstanceVariable)?,
                },
                '$' => self.lex_sigil_name(c, "$", TokenKind::GlobalVariable)?,
                v if v.is_ascii_digit() => {
                    self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
                    TokenKind::IntegerLiteral
                }
                v if is_name_start(v) => {
                    self.cursor.eat_while(is_name_continue);
                    let end = self.cursor.offset();
                    let lexeme = &self.source[Span::new(c.offset, end).range()];
                    match KEYWORD_HASHMAP.get(lexeme) {
                        Some(keyword) => *keyword,
                        None if v.is_ascii_uppercase() => TokenKind::Constant,
                        None => TokenKind::Ident,
                    }
                }
                v => return Err(self.error_at(c, LexicalErrorKind::Unrecognized(v))),
            };

            let end = self.cursor.offset();
            return Ok(Token {
                kind,
                span: Span::new(c.offset, end),
            });
        }
    }

    fn lex_string(&mut self, opening: SourceChar) -> Result<TokenKind, LexicalError> {
        loop {
            match self.cursor.next_char() {
                Some(c) if c.value == opening.value => return Ok(TokenKind::StringLiteral),
                Some(c) if c.value == '\\' => {
                    let _ = self.cursor.next_char();
                }
                Some(_) => {}
                None => {
                    let end = self.cursor.offset();
                    return Err(LexicalError {
                        kind: LexicalErrorKind::UnclosedString,
                        span: Span::new(opening.offset, end),
                    });
                }
            }
        }
    }

    fn lex_sigil_name(
        &mut self,
        sigil: SourceChar,
        text: &'static str,
        kind: TokenKind,
    ) -> Result<TokenKind, LexicalError> {
        match self.cursor.peek_char() {
            Some(c) if is_name_start(c) => {
                self.cursor.eat_while(is_name_continue);
                Ok(kind)
            }
            _ => Err(LexicalError {
                kind: LexicalErrorKind::MissingVariableName(text),
                span: Span::new(sigil.offset, self.cursor.offset()),
            }),
        }
    }

    fn error_at(&self, c: SourceChar, kind: LexicalErrorKind) -> LexicalError {
        LexicalError {
            kind,
            span: Span::new(c.offset, c.next_offset()),
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token, LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token_or_error = self.next_token();
        match token_or_error {
            Ok(Token {
                kind: TokenKind::Eof,
                ..
            })
            | Err(_) => self.finished = true,
            Ok(_) => {}
        }
        Some(token_or_error)
    }
}
