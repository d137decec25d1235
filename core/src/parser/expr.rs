use super::function::{FunctionHead, ParamParse};
use super::helpers::{is_prefix_operator, unquote, writes_operand};
use super::{Mode, Parser};
use crate::symbol::Symbol;
use crate::token::{Token, TokenKind};
use crate::util::fast_map::{FastHashSet, fast_hash_set_new, name_key};

/// A token that lets an expression carry on from the previous line.
fn continues_line(tk: &Token) -> bool {
    match tk.kind {
        TokenKind::Assign | TokenKind::Comma | TokenKind::Dot => true,
        TokenKind::Operator => !matches!(tk.text.as_str(), "++" | "--" | "!" | "~" | "%") && !tk.text.eq_ignore_ascii_case("not"),
        _ => false,
    }
}

fn closer_for(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "%",
    }
}

impl<'o> Parser<'o> {
    /// One operand of a comma list. Returns after consuming the `,`, or with the token that
    /// ended the expression handed back. Inside a pair, line breaks do not end it.
    pub(super) fn parse_expr(&mut self, in_pair: bool, mode: Mode) -> Vec<Symbol> {
        let mut result = Vec::new();
        let mut at_operand = true;
        loop {
            let tk = self.next_token().clone();
            if tk.is_eof() {
                self.push_back();
                return result;
            }
            if tk.is_comment() {
                if in_pair {
                    continue;
                }
                self.push_back();
                return result;
            }
            if tk.top_of_line && !in_pair && !continues_line(&tk) {
                self.push_back();
                return result;
            }
            match tk.kind {
                TokenKind::Comma => return result,
                TokenKind::CloseBrace | TokenKind::CloseDelim => {
                    self.push_back();
                    return result;
                }
                TokenKind::OpenBrace => {
                    if !at_operand {
                        self.push_back();
                        return result;
                    }
                    result.extend(self.parse_object(&tk, mode));
                    at_operand = false;
                }
                TokenKind::OpenDelim if tk.text == "(" => {
                    let (refs, ended) = self.parse_paren(&tk, in_pair, mode);
                    result.extend(refs);
                    if ended {
                        return result;
                    }
                    at_operand = false;
                }
                TokenKind::OpenDelim => {
                    result.extend(self.parse_pair(&tk, mode));
                    at_operand = false;
                }
                TokenKind::Operator if tk.text == "%" => {
                    result.extend(self.parse_pair(&tk, mode));
                    at_operand = false;
                }
                TokenKind::Operator => {
                    let postfix = !at_operand && matches!(tk.text.as_str(), "++" | "--");
                    if at_operand && !is_prefix_operator(&tk.text) {
                        self.error_at(format!("Unexpected operator \"{}\"", tk.text), &tk);
                    }
                    at_operand = !postfix;
                }
                TokenKind::Assign | TokenKind::Dot => at_operand = true,
                TokenKind::Word => {
                    if self.parse_word_in_expr(&tk, in_pair, mode, &mut result) {
                        return result;
                    }
                    at_operand = false;
                }
                TokenKind::Reserved => {
                    self.error_at("Reserved words cannot be used as variable names", &tk);
                    at_operand = false;
                }
                TokenKind::Unknown => {
                    self.error_at(format!("Unknown token \"{}\"", tk.text), &tk);
                    at_operand = false;
                }
                _ => at_operand = false,
            }
        }
    }

    /// Comma separated expressions up to the end of the logical line.
    pub(super) fn parse_line(&mut self, mode: Mode) -> Vec<Symbol> {
        let mut result = Vec::new();
        loop {
            result.extend(self.parse_expr(false, mode));
            if !(self.next && self.tk.kind == TokenKind::Comma) {
                return result;
            }
        }
    }

    /// Consumes up to the delimiter matching `open` (`(`, `[` or `%`), which must be the
    /// token just read. An unmatched opener gets one diagnostic at its offset.
    pub(super) fn parse_pair(&mut self, open: &Token, mode: Mode) -> Vec<Symbol> {
        let close = closer_for(&open.text);
        self.closers.push(close);
        let result = self.parse_pair_body(open, close, mode);
        self.closers.pop();
        result
    }

    /// Whether a pair outside the innermost one waits for `close`.
    fn enclosing_expects(&self, close: &str) -> bool {
        self.closers.iter().rev().skip(1).any(|c| *c == close)
    }

    fn parse_pair_body(&mut self, open: &Token, close: &'static str, mode: Mode) -> Vec<Symbol> {
        let mut result = Vec::new();
        loop {
            let tk = self.next_token().clone();
            if tk.is_eof() || (close == "%" && tk.top_of_line) {
                self.error(format!("Missing closing \"{}\"", close), open.offset, 1);
                self.push_back();
                return result;
            }
            match tk.kind {
                TokenKind::CloseDelim if tk.text == close => return result,
                TokenKind::CloseDelim if close == ")" && tk.text == "]" && !self.enclosing_expects("]") => {
                    self.error_at(format!("Unexpected \"{}\"", tk.text), &tk);
                }
                TokenKind::CloseDelim | TokenKind::CloseBrace => {
                    self.error(format!("Missing closing \"{}\"", close), open.offset, 1);
                    self.push_back();
                    return result;
                }
                TokenKind::Operator if tk.text == "%" => {
                    if close == "%" {
                        return result;
                    }
                    result.extend(self.parse_pair(&tk, mode));
                }
                TokenKind::OpenDelim if tk.text == "(" => {
                    let (refs, _) = self.parse_paren(&tk, true, mode);
                    result.extend(refs);
                }
                TokenKind::OpenDelim => result.extend(self.parse_pair(&tk, mode)),
                TokenKind::OpenBrace => result.extend(self.parse_object(&tk, mode)),
                TokenKind::Word => {
                    self.parse_word_in_expr(&tk, true, mode, &mut result);
                }
                TokenKind::String if close == "]" => {
                    if self.scanner.next_non_blank(tk.end()) == Some(']') {
                        self.record_text(unquote(&tk.text));
                    }
                }
                TokenKind::Reserved => self.error_at("Reserved words cannot be used as variable names", &tk),
                TokenKind::Unknown => self.error_at(format!("Unknown token \"{}\"", tk.text), &tk),
                _ => {}
            }
        }
    }

    /// `(` in operand position: a parenthesised expression or the parameter list of an
    /// anonymous `(a, b) => expr`. The flag is set when an arrow body ended the expression.
    fn parse_paren(&mut self, open: &Token, in_pair: bool, mode: Mode) -> (Vec<Symbol>, bool) {
        let cp = self.checkpoint();
        if let ParamParse::Params(params) = self.parse_params(")") {
            let arrow = self.next_token_skip_comments().clone();
            if arrow.is_op("=>") {
                let names: FastHashSet<String> = params.iter().map(Symbol::key).collect();
                return (self.parse_anonymous_body(&names, in_pair, mode), true);
            }
        }
        self.restore(cp);
        (self.parse_pair(open, mode), false)
    }

    /// Body of an anonymous arrow function; occurrences of its own parameters are dropped.
    fn parse_anonymous_body(&mut self, params: &FastHashSet<String>, in_pair: bool, mode: Mode) -> Vec<Symbol> {
        self.func_depth += 1;
        let mut body = self.parse_expr(in_pair, mode);
        self.func_depth -= 1;
        body.retain(|s| !(s.is_variable() && params.contains(&s.key())));
        body
    }

    /// A word inside an expression. Returns true when it started an arrow function whose
    /// body ended the enclosing expression.
    fn parse_word_in_expr(&mut self, tk: &Token, in_pair: bool, mode: Mode, result: &mut Vec<Symbol>) -> bool {
        let next_char = self.char_after(tk);
        if self.preceded_by_dot(tk) {
            if next_char == Some('(') {
                let open = self.next_token().clone();
                result.extend(self.parse_pair(&open, mode));
                let end = self.consumed_end();
                self.record_call(tk, end, true);
            }
            return false;
        }
        if next_char == Some('%') {
            return false;
        }
        if next_char == Some('(') {
            let open = self.next_token().clone();
            let cp = self.checkpoint();
            if let ParamParse::Params(params) = self.parse_params(")") {
                let arrow = self.next_token_skip_comments().clone();
                if arrow.is_op("=>") {
                    let head = FunctionHead {
                        name: tk.clone(),
                        params,
                        is_static: false,
                        method: false,
                        detail: None,
                    };
                    let closure = self.parse_arrow_function(head, in_pair);
                    result.push(closure);
                    return true;
                }
            }
            self.restore(cp);
            result.extend(self.parse_pair(&open, mode));
            let end = self.consumed_end();
            self.record_call(tk, end, false);
            return false;
        }

        let following = self.next_token().clone();
        if following.is_op("=>") && !following.top_of_line {
            let mut names = fast_hash_set_new();
            names.insert(name_key(&tk.text).into_owned());
            result.extend(self.parse_anonymous_body(&names, in_pair, mode));
            return true;
        }
        self.push_back();
        let assigned = !following.top_of_line && writes_operand(&following);
        if let Some(var) = self.add_variable(tk, assigned, mode) {
            result.push(var);
        }
        false
    }

    /// Object literal; `open` is the `{` just read.
    pub(super) fn parse_object(&mut self, open: &Token, mode: Mode) -> Vec<Symbol> {
        let mut result = Vec::new();
        let mut keys: FastHashSet<String> = fast_hash_set_new();
        loop {
            let key = self.next_token_skip_comments().clone();
            match key.kind {
                TokenKind::CloseBrace => {
                    self.fold_block(open.offset, key.offset);
                    return result;
                }
                TokenKind::Eof | TokenKind::CloseDelim => {
                    self.error("Missing closing \"}\"", open.offset, 1);
                    self.push_back();
                    return result;
                }
                TokenKind::Comma => continue,
                TokenKind::Word | TokenKind::Reserved | TokenKind::Number => {
                    if !keys.insert(name_key(&key.text).into_owned()) {
                        self.warning(format!("Duplicate object key \"{}\"", key.text), key.offset, key.len);
                    }
                    self.record_text(&key.text);
                }
                TokenKind::Label => {
                    // `key:` alone on its line, the value follows
                    let name = key.text.trim_end_matches(':');
                    if !keys.insert(name_key(name).into_owned()) {
                        self.warning(format!("Duplicate object key \"{}\"", name), key.offset, name.chars().count());
                    }
                    self.record_text(name);
                    result.extend(self.parse_expr(true, mode));
                    continue;
                }
                TokenKind::String => {
                    self.error_at("Object keys cannot be quoted strings", &key);
                }
                TokenKind::Operator if key.text == "%" => {
                    result.extend(self.parse_pair(&key, mode));
                }
                _ => {
                    self.error_at(format!("Unexpected \"{}\" in object literal", key.text), &key);
                    continue;
                }
            }

            let colon = self.next_token_skip_comments().clone();
            if !colon.is_op(":") {
                self.error_at(format!("Expected \":\" after object key, found \"{}\"", colon.text), &colon);
                self.push_back();
                continue;
            }
            result.extend(self.parse_expr(true, mode));
        }
    }
}
