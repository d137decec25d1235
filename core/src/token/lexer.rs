use super::chars::{is_blank, is_digit, is_hex_digit, is_ident_char, is_space};
use super::{Token, TokenKind, is_reserved_word, is_word_operator};

const PUNCTUATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "&", "++", "--", "**", "**=", "//", "=", "+=", "-=", "*=", "/=", "//=", "==", ":=", "!=",
    "!==", "~=", ">", "<", ">=", "<=", ">>", "<<", ">>=", "<<=", ">>>", ">>>=", "&&", "&=", "|", "||", "!", "~", ",",
    ":", "?", "??", "??=", "^", "^=", "|=", "::", "=>",
];

const ASSIGN_OPERATORS: &[&str] = &[
    ":=", "+=", "-=", "*=", "/=", "//=", ".=", "|=", "&=", "^=", ">>=", "<<=", ">>>=", "**=", "??=",
];

/// Directives whose whole line belongs to the directive token.
const LINE_DIRECTIVES: &[&str] = &["dllload", "hotstring", "include", "requires", "errorstdout"];

#[inline]
fn is_punctuator(s: &str) -> bool {
    PUNCTUATORS.contains(&s)
}

/// Saved cursor, used by the parser to roll back speculative parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerState {
    idx: usize,
    begin_line: bool,
}

/// Pull-based, context sensitive scanner. It never fails: malformed input turns
/// into partial or `Unknown` tokens and the parser decides what to report.
pub struct Scanner {
    chars: Vec<char>,
    idx: usize,
    len: usize,
    begin_line: bool,
}

impl Scanner {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Self {
            len: chars.len(),
            chars,
            idx: 0,
            begin_line: true,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cursor(&self) -> usize {
        self.idx
    }

    pub fn checkpoint(&self) -> ScannerState {
        ScannerState {
            idx: self.idx,
            begin_line: self.begin_line,
        }
    }

    pub fn restore(&mut self, state: ScannerState) {
        self.idx = state.idx;
        self.begin_line = state.begin_line;
    }

    #[inline]
    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.len);
        if start >= end {
            return String::new();
        }
        self.chars[start..end].iter().collect()
    }

    /// First non space/tab character at or after `from`, stopping at a newline.
    pub fn next_non_blank(&self, from: usize) -> Option<char> {
        self.chars[from.min(self.len)..].iter().copied().find(|c| !is_blank(*c))
    }

    /// Index of the `\n` ending the line that contains `from`, or the input length.
    pub fn line_end(&self, from: usize) -> usize {
        let from = from.min(self.len);
        self.chars[from..].iter().position(|&c| c == '\n').map_or(self.len, |p| from + p)
    }

    /// Leaves the cursor on the newline that ends the current line.
    pub fn skip_line(&mut self) {
        self.idx = self.line_end(self.idx);
    }

    pub fn next_token(&mut self) -> Token {
        let mut newlines = 0u32;
        while let Some(c) = self.char_at(self.idx) {
            if !is_space(c) {
                break;
            }
            if c == '\n' {
                newlines += 1;
                self.begin_line = true;
            }
            self.idx += 1;
        }

        if self.idx >= self.len {
            return Token {
                kind: TokenKind::Eof,
                text: String::new(),
                offset: self.len,
                len: 0,
                top_of_line: true,
                ignore: false,
                newlines,
            };
        }

        let top = std::mem::replace(&mut self.begin_line, false);
        let start = self.idx;
        let c = self.chars[start];

        if top && c != ';' {
            if let Some(token) = self.scan_hotkey(start, newlines) {
                return token;
            }
        }

        if is_ident_char(c) {
            return self.scan_word(start, top, newlines);
        }

        let next = self.char_at(start + 1);
        match c {
            '(' | '[' => self.single(TokenKind::OpenDelim, start, top, newlines),
            ')' | ']' => self.single(TokenKind::CloseDelim, start, top, newlines),
            '{' => self.single(TokenKind::OpenBrace, start, top, newlines),
            '}' => self.single(TokenKind::CloseBrace, start, top, newlines),
            '"' | '\'' => self.scan_string(start, c, top, newlines),
            ';' => {
                let end = self.trimmed_line_end(start);
                self.idx = end;
                let kind = if top { TokenKind::Comment } else { TokenKind::InlineComment };
                self.token(kind, self.slice(start, end), start, end - start, top, newlines)
            }
            '/' if top && next == Some('*') => self.scan_block_comment(start, newlines),
            '#' if top && next.is_some_and(|n| !is_space(n)) => self.scan_directive(start, newlines),
            '.' => match next {
                Some('=') => {
                    self.idx = start + 2;
                    self.token(TokenKind::Assign, ".=".into(), start, 2, top, newlines)
                }
                Some(n) if is_blank(n) => self.single(TokenKind::Operator, start, top, newlines),
                _ => self.single(TokenKind::Dot, start, top, newlines),
            },
            '`' => {
                let end = (start + 2).min(self.len);
                self.idx = end;
                self.token(TokenKind::Word, self.slice(start, end), start, end - start, top, newlines)
            }
            _ => self.scan_punctuator(start, top, newlines),
        }
    }

    fn token(&self, kind: TokenKind, text: String, offset: usize, len: usize, top: bool, newlines: u32) -> Token {
        Token {
            kind,
            text,
            offset,
            len,
            top_of_line: top,
            ignore: false,
            newlines,
        }
    }

    fn single(&mut self, kind: TokenKind, start: usize, top: bool, newlines: u32) -> Token {
        self.idx = start + 1;
        self.token(kind, self.chars[start].to_string(), start, 1, top, newlines)
    }

    /// End of the current line with trailing blanks and `\r` dropped.
    fn trimmed_line_end(&self, from: usize) -> usize {
        let mut end = self.line_end(from);
        while end > from && is_space(self.chars[end - 1]) {
            end -= 1;
        }
        end
    }

    fn scan_word(&mut self, start: usize, top: bool, newlines: u32) -> Token {
        if is_digit(self.chars[start]) {
            if let Some(end) = self.scan_number(start) {
                self.idx = end;
                return self.token(TokenKind::Number, self.slice(start, end), start, end - start, top, newlines);
            }
        }

        let mut end = start;
        while end < self.len && is_ident_char(self.chars[end]) {
            end += 1;
        }
        self.idx = end;
        let word = self.slice(start, end);
        let after_dot = start > 0 && self.chars[start - 1] == '.';

        if !after_dot && is_reserved_word(&word) {
            let kind = if is_word_operator(&word) { TokenKind::Operator } else { TokenKind::Reserved };
            return self.token(kind, word, start, end - start, top, newlines);
        }

        if top && self.char_at(end) == Some(':') && !matches!(self.char_at(end + 1), Some(':' | '=')) {
            let rest = self.slice(end + 1, self.line_end(end + 1));
            let rest = rest.trim();
            if rest.is_empty() || rest.starts_with(';') {
                self.idx = end + 1;
                return self.token(TokenKind::Label, format!("{}:", word), start, end + 1 - start, top, newlines);
            }
        }

        self.token(TokenKind::Word, word, start, end - start, top, newlines)
    }

    /// Decimal or hex literal starting at a digit; `None` when the run turns out to be a word like `1abc`.
    fn scan_number(&self, start: usize) -> Option<usize> {
        let mut i = start;
        if self.chars[i] == '0' && matches!(self.char_at(i + 1), Some('x' | 'X')) {
            i += 2;
            let digits = i;
            while self.char_at(i).is_some_and(is_hex_digit) {
                i += 1;
            }
            if i == digits {
                return None;
            }
        } else {
            while self.char_at(i).is_some_and(is_digit) {
                i += 1;
            }
            let after_dot = start > 0 && self.chars[start - 1] == '.';
            if !after_dot && self.char_at(i) == Some('.') && self.char_at(i + 1).is_some_and(is_digit) {
                i += 1;
                while self.char_at(i).is_some_and(is_digit) {
                    i += 1;
                }
            }
            if matches!(self.char_at(i), Some('e' | 'E')) {
                let mut j = i + 1;
                if matches!(self.char_at(j), Some('+' | '-')) {
                    j += 1;
                }
                if self.char_at(j).is_some_and(is_digit) {
                    while self.char_at(j).is_some_and(is_digit) {
                        j += 1;
                    }
                    i = j;
                }
            }
        }
        if self.char_at(i).is_some_and(is_ident_char) { None } else { Some(i) }
    }

    fn scan_string(&mut self, start: usize, quote: char, top: bool, newlines: u32) -> Token {
        let mut i = start + 1;
        loop {
            let Some(ch) = self.char_at(i) else {
                // end of input inside the literal: keep what we have
                self.idx = self.len;
                return self.token(TokenKind::String, self.slice(start, self.len), start, self.len - start, top, newlines);
            };
            match ch {
                '`' => i += 2,
                c if c == quote => {
                    self.idx = i + 1;
                    return self.token(TokenKind::String, self.slice(start, i + 1), start, i + 1 - start, top, newlines);
                }
                '\n' => match self.continuation_close(i + 1) {
                    Some(resume) => i = resume,
                    None => {
                        // unterminated on this line; resume scanning at the newline
                        self.idx = i;
                        let text = self.slice(start, i).trim_end().to_string();
                        let len = text.chars().count();
                        return self.token(TokenKind::Unknown, text, start, len, top, newlines);
                    }
                },
                _ => i += 1,
            }
        }
    }

    /// When the next non-blank line opens a continuation section, returns the index just past
    /// the `)` that closes it.
    fn continuation_close(&self, from: usize) -> Option<usize> {
        let mut line_start = from;
        loop {
            let first = (line_start..self.len).find(|&j| !is_space(self.chars[j]) || self.chars[j] == '\n')?;
            if self.chars[first] == '\n' {
                line_start = first + 1;
                continue;
            }
            if self.chars[first] != '(' {
                return None;
            }
            break;
        }
        let mut line_start = self.line_end(line_start) + 1;
        while line_start < self.len {
            let end = self.line_end(line_start);
            if let Some(first) = (line_start..end).find(|&j| !is_blank(self.chars[j])) {
                if self.chars[first] == ')' {
                    return Some(first + 1);
                }
            }
            line_start = end + 1;
        }
        None
    }

    fn scan_block_comment(&mut self, start: usize, newlines: u32) -> Token {
        let mut line_start = start;
        let mut end = self.len;
        while line_start < self.len {
            let line_end = self.trimmed_line_end(line_start);
            let from = if line_start == start { start + 2 } else { line_start };
            if line_end >= from + 2 && self.chars[line_end - 2] == '*' && self.chars[line_end - 1] == '/' {
                end = line_end;
                break;
            }
            line_start = self.line_end(line_start) + 1;
        }
        self.idx = end;
        self.token(TokenKind::BlockComment, self.slice(start, end), start, end - start, true, newlines)
    }

    fn scan_directive(&mut self, start: usize, newlines: u32) -> Token {
        let mut end = start + 1;
        while end < self.len && !is_space(self.chars[end]) {
            end += 1;
        }
        let name = self.slice(start + 1, end).to_ascii_lowercase();
        let takes_line = LINE_DIRECTIVES.iter().any(|d| name.starts_with(d));
        if takes_line && self.char_at(end).is_some_and(is_blank) {
            let line_end = self.trimmed_line_end(end);
            let rest = self.slice(end, line_end);
            let text = format!("{} {}", self.slice(start, end), rest.trim());
            self.idx = line_end;
            return self.token(TokenKind::Directive, text, start, line_end - start, true, newlines);
        }
        self.idx = end;
        self.token(TokenKind::Directive, self.slice(start, end), start, end - start, true, newlines)
    }

    fn scan_punctuator(&mut self, start: usize, top: bool, newlines: u32) -> Token {
        let mut op = self.chars[start].to_string();
        if !is_punctuator(&op) {
            return self.single(TokenKind::Unknown, start, top, newlines);
        }
        while let Some(n) = self.char_at(start + op.chars().count()) {
            let mut longer = op.clone();
            longer.push(n);
            if !is_punctuator(&longer) {
                break;
            }
            op = longer;
        }
        let len = op.chars().count();
        self.idx = start + len;
        let kind = if op == "," {
            TokenKind::Comma
        } else if ASSIGN_OPERATORS.contains(&op.as_str()) {
            TokenKind::Assign
        } else {
            TokenKind::Operator
        };
        self.token(kind, op, start, len, top, newlines)
    }

    /// Hotkey and hotstring lines. Only called for the first token on a line.
    fn scan_hotkey(&mut self, start: usize, newlines: u32) -> Option<Token> {
        let line_end = self.line_end(start);
        let trimmed_end = self.trimmed_line_end(start);
        let line = &self.chars[start..trimmed_end];
        if !line.windows(2).any(|w| w == [':', ':']) {
            return None;
        }

        if line[0] == ':' {
            if let Some((head, execute)) = match_hotstring(line) {
                let rest: String = line[head..].iter().collect();
                let text: String = line[..head].iter().collect();
                if execute || opens_block(&rest) {
                    self.idx = start + head;
                    return Some(self.token(TokenKind::Hotkey, text, start, head, true, newlines));
                }
                self.idx = line_end;
                return Some(self.token(TokenKind::Hotstring, text, start, head, true, newlines));
            }
        }

        let head = match_hotkey(line)?;
        let text = collapse_whitespace(&line[..head]);
        let rest: String = line[head..].iter().collect();
        if is_remap(rest.trim()) {
            self.idx = line_end;
            return Some(self.token(TokenKind::Hotstring, text, start, head, true, newlines));
        }
        self.idx = start + head;
        Some(self.token(TokenKind::Hotkey, text, start, head, true, newlines))
    }
}

fn collapse_whitespace(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len());
    let mut in_space = false;
    for &c in chars {
        if is_space(c) {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn opens_block(rest: &str) -> bool {
    let Some(after) = rest.trim().strip_prefix('{') else {
        return false;
    };
    let after_trim = after.trim_start();
    after_trim.is_empty() || (after_trim.starts_with(';') && after.len() != after_trim.len())
}

/// `:options:trigger::` head; returns its length and whether the `X` option is present.
fn match_hotstring(line: &[char]) -> Option<(usize, bool)> {
    let mut i = 1;
    let mut execute = false;
    while i < line.len() && line[i] != ':' {
        let c = line[i];
        let allowed = is_space(c) || is_digit(c) || matches!(c.to_ascii_lowercase(), '*' | '?' | 'c' | 'p' | 'k' | 's' | 'i' | 'e' | 'b' | 'r' | 't' | 'o' | 'x' | 'z');
        if !allowed {
            return None;
        }
        execute |= c.eq_ignore_ascii_case(&'x');
        i += 1;
    }
    let trigger = i + 1;
    let mut j = trigger + 1;
    while j + 1 < line.len() {
        if line[j] == ':' && line[j + 1] == ':' {
            let printable = line[trigger..j].iter().all(|&c| c == '\t' || (' '..='~').contains(&c));
            return printable.then_some((j + 2, execute));
        }
        j += 1;
    }
    None
}

/// Candidate end positions of a key name starting at `p`.
fn key_ends(line: &[char], p: usize) -> Vec<usize> {
    let mut ends = Vec::new();
    let Some(&c) = line.get(p) else {
        return ends;
    };
    if c.is_ascii_alphabetic() {
        let mut q = p + 1;
        while line.get(q).is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_') {
            q += 1;
        }
        if q > p + 1 {
            ends.push(q);
        }
    }
    if c == '`' && line.get(p + 1) == Some(&';') {
        ends.push(p + 2);
    }
    if ('!'..='~').contains(&c) && c != ';' {
        ends.push(p + 1);
    }
    ends
}

/// End positions after zero to four `[<>]?[!+#^]` modifiers, longest last.
fn modifier_ends(line: &[char], start: usize) -> Vec<usize> {
    let mut ends = vec![start];
    let mut p = start;
    for _ in 0..4 {
        let mut q = p;
        if matches!(line.get(q), Some('<' | '>')) {
            q += 1;
        }
        if !matches!(line.get(q), Some('!' | '+' | '#' | '^')) {
            break;
        }
        p = q + 1;
        ends.push(p);
    }
    ends
}

fn skip_blanks(line: &[char], mut p: usize) -> usize {
    while line.get(p).is_some_and(|c| is_blank(*c)) {
        p += 1;
    }
    p
}

/// Optional ` up` then `::`; returns the index after `::`.
fn hotkey_tail(line: &[char], p: usize) -> Option<usize> {
    let colons = |q: usize| (line.get(q) == Some(&':') && line.get(q + 1) == Some(&':')).then_some(q + 2);
    let q = skip_blanks(line, p);
    if q > p {
        let up: String = line[q..line.len().min(q + 2)].iter().collect();
        if up.eq_ignore_ascii_case("up") {
            if let Some(end) = colons(skip_blanks(line, q + 2)) {
                return Some(end);
            }
        }
    }
    colons(q)
}

/// `[$][~*]{0,2}` then `mods key` or `key & key`, then the tail. Returns the head length.
fn match_hotkey(line: &[char]) -> Option<usize> {
    let mut i = 0;
    if line.first() == Some(&'$') {
        i += 1;
    }
    for _ in 0..2 {
        if matches!(line.get(i), Some('~' | '*')) {
            i += 1;
        }
    }

    for first in key_ends(line, i) {
        let amp = skip_blanks(line, first);
        if line.get(amp) == Some(&'&') {
            for second in key_ends(line, skip_blanks(line, amp + 1)) {
                if let Some(end) = hotkey_tail(line, second) {
                    return Some(end);
                }
            }
        }
    }

    for mods in modifier_ends(line, i).into_iter().rev() {
        for key in key_ends(line, mods) {
            if let Some(end) = hotkey_tail(line, key) {
                return Some(end);
            }
        }
    }
    None
}

/// A hotkey remainder that names a single key (`a::b`), i.e. a remap with no body.
fn is_remap(rest: &str) -> bool {
    let body = match rest.find(|c: char| c == ';') {
        Some(pos) if pos > 0 && rest[..pos].ends_with(is_blank) => rest[..pos].trim_end(),
        _ => rest,
    };
    if body.is_empty() {
        return false;
    }
    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;
    for _ in 0..2 {
        if matches!(chars.get(i), Some('~' | '*')) {
            i += 1;
        }
    }
    modifier_ends(&chars, i).into_iter().any(|m| {
        let rest = &chars[m..];
        match rest {
            ['`', '{'] => true,
            [c] => ('!'..='~').contains(c) && *c != '{',
            [first, tail @ ..] if first.is_ascii_alphabetic() && !tail.is_empty() => {
                tail.iter().all(|c| c.is_ascii_alphanumeric() || *c == '_')
            }
            _ => false,
        }
    })
}
