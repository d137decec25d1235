use super::{Checkpoint, Mode, Parser};
use crate::analysis::{CallSite, FoldingKind, FoldingRange};
use crate::builtins::is_builtin_variable;
use crate::symbol::{ExprText, Reference, Symbol, SymbolItem, VariableSymbol};
use crate::token::{Diagnostic, TextRange, Token, TokenKind, is_digit};
use crate::util::fast_map::name_key;

impl<'o> Parser<'o> {
    /// Advances to the next token unless the current one was handed back.
    pub(super) fn next_token(&mut self) -> &Token {
        if !self.next {
            self.next = true;
            return &self.tk;
        }
        let tk = self.scanner.next_token();
        if tk.kind == TokenKind::BlockComment {
            let start = self.line_index.line_of(tk.offset);
            let end = self.line_index.line_of(tk.end());
            if start < end {
                self.folding.push(FoldingRange {
                    start_line: start,
                    end_line: end,
                    kind: FoldingKind::Comment,
                });
            }
        }
        if tk.kind != TokenKind::Eof {
            self.tokens.entry(tk.offset).or_insert_with(|| tk.clone());
        }
        self.lk = std::mem::replace(&mut self.tk, tk);
        &self.tk
    }

    pub(super) fn next_token_skip_comments(&mut self) -> &Token {
        loop {
            self.next_token();
            if !self.tk.is_comment() {
                return &self.tk;
            }
        }
    }

    /// Gives the current token back so the next `next_token` returns it again.
    #[inline]
    pub(super) fn push_back(&mut self) {
        self.next = false;
    }

    pub(super) fn char_after(&self, tk: &Token) -> Option<char> {
        self.scanner.char_at(tk.end())
    }

    pub(super) fn preceded_by_dot(&self, tk: &Token) -> bool {
        tk.offset > 0 && self.scanner.char_at(tk.offset - 1) == Some('.')
    }

    pub(super) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            scanner: self.scanner.checkpoint(),
            tk: self.tk.clone(),
            lk: self.lk.clone(),
            next: self.next,
            diagnostics: self.diagnostics.len(),
            folding: self.folding.len(),
            references: self.references.len(),
            calls: self.calls.len(),
        }
    }

    pub(super) fn restore(&mut self, cp: Checkpoint) {
        self.scanner.restore(cp.scanner);
        self.tk = cp.tk;
        self.lk = cp.lk;
        self.next = cp.next;
        self.diagnostics.truncate(cp.diagnostics);
        self.folding.truncate(cp.folding);
        self.references.truncate(cp.references);
        self.calls.truncate(cp.calls);
    }

    pub(super) fn error(&mut self, message: impl Into<String>, offset: usize, length: usize) {
        self.diagnostics.push(Diagnostic::error(message, offset, length));
    }

    pub(super) fn warning(&mut self, message: impl Into<String>, offset: usize, length: usize) {
        self.diagnostics.push(Diagnostic::warning(message, offset, length));
    }

    pub(super) fn error_at(&mut self, message: impl Into<String>, tk: &Token) {
        let (offset, len) = (tk.offset, tk.len.max(1));
        self.error(message, offset, len);
    }

    /// One folding range per matched brace pair; the closing line stays visible.
    pub(super) fn fold_block(&mut self, open: usize, close: usize) {
        let start = self.line_index.line_of(open);
        let end = self.line_index.line_of(close).saturating_sub(1);
        if start < end {
            self.folding.push(FoldingRange {
                start_line: start,
                end_line: end,
                kind: FoldingKind::Block,
            });
        }
    }

    pub(super) fn fold_lines(&mut self, start: usize, end: usize) {
        let start = self.line_index.line_of(start);
        let end = self.line_index.line_of(end);
        if start < end {
            self.folding.push(FoldingRange {
                start_line: start,
                end_line: end,
                kind: FoldingKind::Line,
            });
        }
    }

    /// Doc comment for the current token: a comment that ended on the line just above it.
    pub(super) fn doc_comment(&self) -> Option<String> {
        let is_doc = matches!(self.lk.kind, TokenKind::Comment | TokenKind::BlockComment) && self.tk.newlines == 1;
        is_doc.then(|| trim_comment(&self.lk)).filter(|s| !s.is_empty())
    }

    /// Trimmed source between two offsets, with the offset of its first kept character.
    pub(super) fn span_text(&self, start: usize, end: usize) -> ExprText {
        let raw = self.scanner.slice(start, end);
        let lead = raw.chars().take_while(|c| c.is_whitespace()).count();
        ExprText {
            text: raw.trim().to_string(),
            offset: start + lead,
        }
    }

    pub(super) fn is_reference_name(&self, name: &str) -> bool {
        if is_builtin_variable(name) || self.options.extra_builtins.contains(name_key(name).as_ref()) {
            return false;
        }
        !(self.class_depth > 0 && (name.eq_ignore_ascii_case("this") || name.eq_ignore_ascii_case("super")))
    }

    /// Records a variable occurrence and returns its symbol, or `None` for names that never
    /// become references.
    pub(super) fn add_variable(&mut self, tk: &Token, assigned: bool, mode: Mode) -> Option<Symbol> {
        if tk.ignore || tk.kind != TokenKind::Word || !self.is_reference_name(&tk.text) {
            return None;
        }
        self.references.push(Reference {
            name: name_key(&tk.text).into_owned(),
            range: tk.range(),
            assigned,
        });
        self.check_identifier(tk, "variable");
        let var = VariableSymbol {
            assigned,
            global_space: mode == Mode::Script,
            ..Default::default()
        };
        Some(Symbol::new(tk.text.clone(), tk.range(), tk.range(), SymbolItem::Variable(var)))
    }

    pub(super) fn record_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.texts.entry(name_key(text).into_owned()).or_insert_with(|| text.to_string());
        }
    }

    pub(super) fn check_identifier(&mut self, tk: &Token, what: &str) {
        if tk.text.starts_with(|c: char| is_digit(c) || c == '$') {
            self.error_at(format!("Illegal {} name \"{}\"", what, tk.text), tk);
        }
    }

    pub(super) fn line_of(&self, offset: usize) -> u32 {
        self.line_index.line_of(offset)
    }

    /// End of the last consumed token.
    pub(super) fn consumed_end(&self) -> usize {
        if self.next { self.tk.end() } else { self.lk.end() }
    }

    /// Records a call of `name` running from the name to `end`.
    pub(super) fn record_call(&mut self, name: &Token, end: usize, method: bool) {
        self.calls.push(CallSite {
            name: name.text.clone(),
            range: TextRange::new(name.offset, end.max(name.end())),
            method,
        });
    }
}

pub(super) fn trim_comment(tk: &Token) -> String {
    match tk.kind {
        TokenKind::BlockComment => {
            let body = tk.text.trim_start_matches("/*").trim_end_matches("*/");
            body.lines()
                .map(|line| line.trim_start().trim_start_matches('*').trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        }
        _ => tk.text.trim_start_matches(';').trim().to_string(),
    }
}

/// String literal body without its quotes.
pub fn unquote(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('"' | '\'')), Some(close)) if open == close => chars.as_str(),
        _ => text,
    }
}

/// Any of the assignment forms that write their left operand.
pub(super) fn writes_operand(tk: &Token) -> bool {
    tk.kind == TokenKind::Assign || (tk.kind == TokenKind::Operator && matches!(tk.text.as_str(), "++" | "--"))
}

/// Operators that may start an operand.
pub(super) fn is_prefix_operator(text: &str) -> bool {
    matches!(text, "-" | "+" | "!" | "~" | "&" | "*" | "++" | "--" | "%") || text.eq_ignore_ascii_case("not")
}
