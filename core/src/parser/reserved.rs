use super::helpers::is_prefix_operator;
use super::{DeclKind, Mode, Parser, ScopeCollector};
use crate::symbol::{ScopeAssumption, Symbol, SymbolItem, VariableSymbol};
use crate::token::{ScannerState, Token, TokenKind};

const LOOP_KINDS: &[&str] = &["parse", "files", "read", "reg"];

impl<'o> Parser<'o> {
    /// Dispatch for a reserved word in statement position; `self.tk` is the keyword.
    pub(super) fn parse_reserved(&mut self, mode: Mode, scope: &mut ScopeCollector, result: &mut Vec<Symbol>) {
        let kw = self.tk.clone();
        let after_kw = self.scanner.checkpoint();
        let word = kw.text.to_ascii_lowercase();
        match word.as_str() {
            "class" if kw.top_of_line => self.parse_class(&kw, mode, result),
            "class" => self.downgrade_keyword(&kw, after_kw, mode),
            "global" | "local" | "static" => self.parse_scope_keyword(&kw, after_kw, mode, scope, result),
            "loop" => {
                self.next_token();
                match self.tk.kind {
                    TokenKind::Word if !self.tk.top_of_line && LOOP_KINDS.iter().any(|k| self.tk.text.eq_ignore_ascii_case(k)) => {
                        self.tk.kind = TokenKind::Reserved;
                    }
                    TokenKind::Comma | TokenKind::Assign => self.downgrade_keyword(&kw, after_kw, mode),
                    TokenKind::Operator if !self.tk.top_of_line && !is_prefix_operator(&self.tk.text) => {
                        self.downgrade_keyword(&kw, after_kw, mode)
                    }
                    _ => self.push_back(),
                }
            }
            "continue" | "break" | "goto" => {
                self.next_token();
                if self.tk.top_of_line {
                    self.push_back();
                } else if self.tk.kind == TokenKind::Word {
                    // label target, not a variable
                    self.tk.ignore = true;
                } else if matches!(self.tk.kind, TokenKind::Assign) {
                    self.downgrade_keyword(&kw, after_kw, mode);
                } else {
                    self.push_back();
                }
            }
            "return" => self.parse_return(mode, result),
            "for" => self.parse_for(mode, result),
            "catch" => self.parse_catch(mode, result),
            _ => {
                self.next_token();
                let misuse = !self.tk.top_of_line
                    && (self.tk.kind == TokenKind::Assign
                        || (self.tk.kind == TokenKind::Operator && !is_prefix_operator(&self.tk.text) && self.tk.text != "("));
                if misuse {
                    self.downgrade_keyword(&kw, after_kw, mode);
                } else {
                    self.push_back();
                }
            }
        }
    }

    /// Reports a keyword used as a variable, retypes it as a word and reparses from it.
    pub(super) fn downgrade_keyword(&mut self, kw: &Token, after_kw: ScannerState, mode: Mode) {
        if !mode.is_class() {
            self.error_at("Reserved words cannot be used as variable names", kw);
        }
        self.scanner.restore(after_kw);
        let mut word = kw.clone();
        word.kind = TokenKind::Word;
        self.tk = word;
        self.push_back();
    }

    fn parse_scope_keyword(
        &mut self,
        kw: &Token,
        after_kw: ScannerState,
        mode: Mode,
        scope: &mut ScopeCollector,
        result: &mut Vec<Symbol>,
    ) {
        let kind = match kw.text.to_ascii_lowercase().as_str() {
            "global" => DeclKind::Global,
            "local" => DeclKind::Local,
            _ => DeclKind::Static,
        };
        self.next_token_skip_comments();

        if self.tk.kind == TokenKind::Assign && !self.tk.top_of_line {
            self.downgrade_keyword(kw, after_kw, mode);
            return;
        }

        if mode.is_class() {
            if kind != DeclKind::Static {
                self.error_at("Class property declarations cannot use global or local", kw);
            } else if !self.tk.top_of_line && matches!(self.tk.kind, TokenKind::Word | TokenKind::Reserved) {
                self.pending_static = true;
            }
            if !self.tk.top_of_line && matches!(self.tk.kind, TokenKind::Word | TokenKind::Reserved) {
                // the member is reparsed as if it started the line
                self.tk.kind = TokenKind::Word;
                self.tk.top_of_line = true;
            }
            self.push_back();
            return;
        }

        if self.tk.top_of_line || self.tk.is_eof() {
            // bare keyword changes the function's default assumption
            scope.assume = match kind {
                DeclKind::Global => ScopeAssumption::GLOBAL,
                DeclKind::Local => scope.assume.with(ScopeAssumption::LOCAL),
                DeclKind::Static => scope.assume.with(ScopeAssumption::STATIC),
            };
            self.push_back();
            return;
        }

        if kind != DeclKind::Global && self.tk.kind == TokenKind::Word && self.char_after(&self.tk.clone()) == Some('(') {
            // `static Name(...)` style function definition
            self.tk.top_of_line = true;
            self.push_back();
            return;
        }

        self.push_back();
        let (decls, refs) = self.parse_declarations(kind, mode);
        result.extend(refs);
        if mode == Mode::Script {
            result.extend(decls);
        } else {
            scope.decls.extend(decls.into_iter().map(|d| (kind, d)));
        }
    }

    /// `name [:= expr], ...` after a scope keyword. Returns the declared variables and the
    /// references found in their initializers.
    fn parse_declarations(&mut self, kind: DeclKind, mode: Mode) -> (Vec<Symbol>, Vec<Symbol>) {
        let mut decls = Vec::new();
        let mut refs = Vec::new();
        loop {
            let name = self.next_token_skip_comments().clone();
            if name.kind != TokenKind::Word {
                if name.kind == TokenKind::Reserved && !name.top_of_line {
                    self.error_at("Reserved words cannot be used as variable names", &name);
                    continue;
                }
                self.push_back();
                break;
            }
            self.check_identifier(&name, "variable");
            let mut var = VariableSymbol {
                is_static: kind == DeclKind::Static,
                global_space: kind == DeclKind::Global || mode == Mode::Script,
                assigned: true,
                ..Default::default()
            };
            self.references.push(crate::symbol::Reference {
                name: crate::util::fast_map::name_key(&name.text).into_owned(),
                range: name.range(),
                assigned: true,
            });

            self.next_token();
            let mut more = false;
            if self.tk.is(TokenKind::Assign, ":=") {
                let start = self.tk.end();
                refs.extend(self.parse_expr(false, mode));
                var.default = Some(self.span_text(start, self.lk.end()));
                more = self.next && self.tk.kind == TokenKind::Comma;
            } else if self.tk.kind == TokenKind::Comma && !self.tk.top_of_line {
                more = true;
            } else {
                self.push_back();
            }
            decls.push(Symbol::new(name.text.clone(), name.range(), name.range(), SymbolItem::Variable(var)));
            if !more {
                break;
            }
        }
        (decls, refs)
    }

    fn parse_return(&mut self, mode: Mode, result: &mut Vec<Symbol>) {
        self.next_token();
        if self.tk.top_of_line || self.tk.is_eof() || self.tk.kind == TokenKind::CloseBrace {
            self.push_back();
            return;
        }
        self.push_back();
        let start = self.tk.offset;
        result.extend(self.parse_line(mode));
        let expr = self.span_text(start, self.lk.end());
        if let Some(frame) = self.returns.last_mut() {
            if !expr.text.is_empty() {
                frame.push(expr);
            }
        }
    }

    /// `for a, b in expr`: the loop variables are written by the loop.
    fn parse_for(&mut self, mode: Mode, result: &mut Vec<Symbol>) {
        let mut paren: Option<Token> = None;
        loop {
            let tk = self.next_token().clone();
            if tk.top_of_line || tk.is_eof() {
                self.push_back();
                return;
            }
            match tk.kind {
                TokenKind::Word => {
                    if let Some(var) = self.add_variable(&tk, true, mode) {
                        result.push(var);
                    }
                }
                TokenKind::Comma => {}
                TokenKind::OpenDelim if tk.text == "(" && paren.is_none() => paren = Some(tk),
                TokenKind::Operator if tk.text == "&" => {}
                TokenKind::Operator if tk.text.eq_ignore_ascii_case("in") => {
                    if let Some(open) = paren {
                        result.extend(self.parse_pair(&open, mode));
                    }
                    return;
                }
                _ => {
                    self.push_back();
                    return;
                }
            }
        }
    }

    /// `catch [Class] [as name]`
    fn parse_catch(&mut self, mode: Mode, result: &mut Vec<Symbol>) {
        loop {
            let tk = self.next_token().clone();
            if tk.top_of_line || tk.is_eof() || tk.kind != TokenKind::Word {
                if tk.kind != TokenKind::Comma || tk.top_of_line {
                    self.push_back();
                    return;
                }
                continue;
            }
            if tk.text.eq_ignore_ascii_case("as") {
                let name = self.next_token().clone();
                if name.kind == TokenKind::Word && !name.top_of_line {
                    if let Some(var) = self.add_variable(&name, true, mode) {
                        result.push(var);
                    }
                } else {
                    self.push_back();
                }
                return;
            }
            if let Some(var) = self.add_variable(&tk, false, mode) {
                result.push(var);
            }
        }
    }
}
