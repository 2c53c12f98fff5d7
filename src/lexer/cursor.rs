use super::token::SpanIndex;
use std::{iter::Peekable, str::CharIndices};

#[derive(Debug, Clone, Copy)]
pub struct SourceChar {
    pub value: char,
    pub offset: SpanIndex,
}

impl SourceChar {
    pub fn next_offset(&self) -> SpanIndex {
        self.offset + self.value.len_utf8()
    }
}

/// Character stream over the source with one character of lookahead.
#[derive(Debug)]
pub struct Cursor<'src> {
    chars: Peekable<CharIndices<'src>>,
    length: usize,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            length: source.len(),
        }
    }

    pub fn next_char(&mut self) -> Option<SourceChar> {
        self.chars.next().map(|(offset, value)| SourceChar {
            value,
            offset: offset.into(),
        })
    }

    pub fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    pub fn eat_if(&mut self, expected: char) -> bool {
        match self.peek_char() {
            Some(c) if c == expected => {
                self.chars.next();
                true
            }
            _ => false,
        }
    }

    pub fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if !predicate(c) {
                break;
            }
            self.chars.next();
        }
    }

    /// Byte offset of the next unread character.
    pub fn offset(&mut self) -> SpanIndex {
        match self.chars.peek() {
            Some(&(offset, _)) => offset.into(),
            None => self.length.into(),
        }
    }
}
