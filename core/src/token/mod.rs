mod chars;
mod error;
mod lexer;

#[cfg(test)]
mod token_test;

pub use chars::{is_digit, is_ident_char, is_space};
pub use error::{Diagnostic, LineIndex, Position, Severity, TextRange};
pub use lexer::{Scanner, ScannerState};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Word,
    Reserved,
    Number,
    String,
    Operator,
    /// `:=` and the compound assignments.
    Assign,
    Comma,
    /// `(` or `[`
    OpenDelim,
    /// `)` or `]`
    CloseDelim,
    OpenBrace,
    CloseBrace,
    Directive,
    Label,
    Hotkey,
    Hotstring,
    Dot,
    Comment,
    BlockComment,
    InlineComment,
    Unknown,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
    pub len: usize,
    /// First token on its physical line.
    pub top_of_line: bool,
    /// Do not record this word as a variable reference (label targets and the like).
    pub ignore: bool,
    /// Newlines skipped between the previous token and this one.
    pub newlines: u32,
}

impl Token {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, self.len)
    }

    #[inline]
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    #[inline]
    pub fn is_op(&self, text: &str) -> bool {
        self.is(TokenKind::Operator, text)
    }

    #[inline]
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Reserved && self.text.eq_ignore_ascii_case(word)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::BlockComment | TokenKind::InlineComment)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

const RESERVED_WORDS: &[&str] = &[
    "and", "break", "case", "catch", "class", "contains", "continue", "else", "extends", "finally", "for", "global",
    "goto", "if", "in", "is", "local", "loop", "not", "or", "return", "static", "switch", "throw", "try", "until",
    "while",
];

/// Reserved words the scanner emits as operators.
const WORD_OPERATORS: &[&str] = &["and", "contains", "in", "is", "not", "or"];

pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word))
}

pub fn is_word_operator(word: &str) -> bool {
    WORD_OPERATORS.iter().any(|w| w.eq_ignore_ascii_case(word))
}
