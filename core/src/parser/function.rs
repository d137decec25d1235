use super::helpers::writes_operand;
use super::{DeclKind, Mode, Parser, ScopeCollector};
use crate::symbol::{ExprText, FunctionSymbol, Reference, ScopeAssumption, Statement, Symbol, SymbolItem, VariableSymbol, format_signature};
use crate::token::{TextRange, Token, TokenKind, is_space};
use crate::util::fast_map::{FastHashMap, FastHashSet, fast_hash_map_new, fast_hash_set_new, name_key};

/// Outcome of reading a parenthesised list as parameters.
pub(super) enum ParamParse {
    Params(Vec<Symbol>),
    /// Not a parameter list. Carries the offending default value, if that was the problem.
    Invalid(Option<Token>),
}

/// Everything known about a function before its body is read.
pub(super) struct FunctionHead {
    pub name: Token,
    pub params: Vec<Symbol>,
    pub is_static: bool,
    pub method: bool,
    pub detail: Option<String>,
}

impl<'o> Parser<'o> {
    /// Statement starting with a plain word; `self.tk` is the word.
    pub(super) fn parse_word_statement(&mut self, mode: Mode, result: &mut Vec<Symbol>) {
        let word = self.tk.clone();
        let is_static = std::mem::take(&mut self.pending_static);
        let detail = self.doc_comment();
        let after = self.char_after(&word);
        let before = word.offset.checked_sub(1).and_then(|i| self.scanner.char_at(i));
        if after == Some('%') || before == Some('%') {
            return;
        }

        let dotted = self.preceded_by_dot(&word);
        if after == Some('(') {
            let open = self.next_token().clone();
            if dotted {
                result.extend(self.parse_pair(&open, mode));
                let end = self.consumed_end();
                self.record_call(&word, end, true);
            } else {
                self.parse_function_or_call(word, open, is_static, detail, mode, result);
            }
            return;
        }
        if dotted {
            return;
        }

        let next = self.next_token().clone();
        if mode.is_class() {
            if !word.top_of_line {
                self.push_back();
            } else if next.is_op("=>") || next.kind == TokenKind::OpenBrace || next.is(TokenKind::OpenDelim, "[") {
                self.parse_property(word, next, is_static, detail, result);
            } else {
                self.parse_field_declarations(word, next, is_static, detail, result);
            }
            return;
        }

        if word.top_of_line && self.is_command_call(&word, &next) {
            if after == Some(',') {
                self.error_at("Function call requires a space or \"(\"", &word);
            }
            self.push_back();
            result.extend(self.parse_line(mode));
            let end = self.consumed_end();
            self.record_call(&word, end, false);
            return;
        }
        if word.top_of_line && (next.top_of_line || next.is_eof()) {
            // lone word: a call without arguments
            self.push_back();
            self.record_call(&word, word.end(), false);
            return;
        }

        self.push_back();
        let assigned = !next.top_of_line && writes_operand(&next);
        let Some(mut var) = self.add_variable(&word, assigned, mode) else {
            return;
        };
        var.detail = detail;
        if next.is(TokenKind::Assign, ":=") {
            self.next_token();
            let start = next.end();
            let refs = self.parse_expr(false, mode);
            if let Some(v) = var.as_variable_mut() {
                v.default = Some(self.span_text(start, self.lk.end().max(start)));
            }
            result.push(var);
            result.extend(refs);
        } else {
            result.push(var);
        }
    }

    /// `Name arg, arg` style call: the word is followed by a blank or comma and the next
    /// token cannot continue an expression.
    fn is_command_call(&self, word: &Token, next: &Token) -> bool {
        if next.top_of_line || next.is_eof() {
            return false;
        }
        let spaced = self.char_after(word).is_none_or(|c| is_space(c) || c == ',');
        let continues = match next.kind {
            TokenKind::Assign | TokenKind::Dot => true,
            TokenKind::Operator => !super::helpers::is_prefix_operator(&next.text) || next.text == "%",
            _ => false,
        };
        spaced && !continues
    }

    /// `Name(...)`: a fat-arrow or block definition, or a call. `open` is the `(` just read.
    fn parse_function_or_call(
        &mut self,
        word: Token,
        open: Token,
        is_static: bool,
        detail: Option<String>,
        mode: Mode,
        result: &mut Vec<Symbol>,
    ) {
        let cp = self.checkpoint();
        let (params, bad, args_end) = match self.parse_params(")") {
            ParamParse::Params(params) => (Some(params), None, 0),
            ParamParse::Invalid(bad) => {
                self.restore(cp.clone());
                let args = self.parse_pair(&open, mode);
                result.extend(args);
                (None, bad, self.consumed_end())
            }
        };
        let next = self.next_token_skip_comments().clone();
        let arrow = next.is_op("=>") && !next.top_of_line;
        let block = next.kind == TokenKind::OpenBrace && word.top_of_line;

        if !arrow && !block {
            self.push_back();
            let end = if params.is_some() {
                self.restore(cp);
                result.extend(self.parse_pair(&open, mode));
                self.consumed_end()
            } else {
                args_end
            };
            self.record_call(&word, end, false);
            return;
        }

        let params = match params {
            Some(params) => params,
            None => {
                match &bad {
                    Some(value) => self.error_at("Invalid parameter default value", value),
                    None => self.error_at("Invalid parameter list", &open),
                }
                Vec::new()
            }
        };
        self.check_identifier(&word, "function");
        let head = FunctionHead {
            name: word,
            params,
            is_static,
            method: mode.is_class(),
            detail,
        };
        let function = if arrow { self.parse_arrow_function(head, false) } else { self.parse_block_function(head) };
        result.push(function);
    }

    /// Reads a parameter list; `self.tk` is the opening delimiter and `close` the closer.
    /// On success the closer has been consumed.
    pub(super) fn parse_params(&mut self, close: &str) -> ParamParse {
        let mut params = Vec::new();
        let mut tk = self.next_token_skip_comments().clone();
        if tk.is(TokenKind::CloseDelim, close) {
            return ParamParse::Params(params);
        }
        loop {
            let mut var = VariableSymbol {
                assigned: true,
                ..Default::default()
            };
            if tk.is_op("&") {
                var.by_ref = true;
                tk = self.next_token_skip_comments().clone();
            } else if tk.kind == TokenKind::Word
                && tk.text.eq_ignore_ascii_case("byref")
                && self.char_after(&tk).is_some_and(is_space)
            {
                var.by_ref = true;
                tk = self.next_token_skip_comments().clone();
            }
            if tk.is_op("*") && !var.by_ref {
                let end = self.next_token_skip_comments().clone();
                if !end.is(TokenKind::CloseDelim, close) {
                    return ParamParse::Invalid(None);
                }
                // unnamed rest parameter, kept for the signature
                var.variadic = true;
                params.push(Symbol::new("", tk.range(), tk.range(), SymbolItem::Variable(var)));
                return ParamParse::Params(params);
            }
            if tk.kind != TokenKind::Word {
                return ParamParse::Invalid(None);
            }
            let name = tk;

            let mut after = self.next_token_skip_comments().clone();
            if after.is_op("*") {
                var.variadic = true;
                after = self.next_token_skip_comments().clone();
            } else if after.is(TokenKind::Assign, ":=") {
                let value = self.next_token_skip_comments().clone();
                let valid = match value.kind {
                    TokenKind::String | TokenKind::Number => true,
                    TokenKind::Operator if value.text == "-" || value.text == "+" => {
                        let number = self.next_token().clone();
                        number.kind == TokenKind::Number && number.offset == value.end()
                    }
                    TokenKind::Word => ["true", "false", "unset"].iter().any(|w| value.text.eq_ignore_ascii_case(w)),
                    _ => false,
                };
                if !valid {
                    return ParamParse::Invalid(Some(value));
                }
                var.default = Some(self.span_text(value.offset, self.tk.end()));
                after = self.next_token_skip_comments().clone();
            }

            self.check_identifier(&name, "parameter");
            self.references.push(Reference {
                name: name_key(&name.text).into_owned(),
                range: name.range(),
                assigned: true,
            });
            params.push(Symbol::new(name.text.clone(), name.range(), name.range(), SymbolItem::Variable(var)));

            match after.kind {
                TokenKind::Comma => tk = self.next_token_skip_comments().clone(),
                TokenKind::CloseDelim if after.text == close => return ParamParse::Params(params),
                _ => return ParamParse::Invalid(None),
            }
        }
    }

    /// `name(params) => expr`; `self.tk` is the `=>`.
    pub(super) fn parse_arrow_function(&mut self, head: FunctionHead, in_pair: bool) -> Symbol {
        let start = self.tk.end();
        self.func_depth += 1;
        self.returns.push(Vec::new());
        let body = self.parse_expr(in_pair, Mode::Function);
        self.returns.pop();
        self.func_depth -= 1;

        let end = self.lk.end().max(start);
        let expr = self.span_text(start, end);
        self.fold_lines(head.name.offset, end);
        let range = TextRange::new(head.name.offset, end);
        let (statement, children) = self.finish_function_scope(&head.params, body, ScopeCollector::default());
        let returns = if expr.text.is_empty() { Vec::new() } else { vec![expr] };
        self.build_function(head, range, statement, children, returns)
    }

    /// `name(params) { ... }`; `self.tk` is the `{`.
    pub(super) fn parse_block_function(&mut self, head: FunctionHead) -> Symbol {
        let (body, scope) = self.parse_function_body();
        let returns = self.returns.pop().unwrap_or_default();
        let range = TextRange::new(head.name.offset, self.tk.end().max(head.name.end()));
        let (statement, children) = self.finish_function_scope(&head.params, body, scope);
        self.build_function(head, range, statement, children, returns)
    }

    fn build_function(
        &mut self,
        head: FunctionHead,
        range: TextRange,
        statement: Statement,
        children: Vec<Symbol>,
        returns: Vec<ExprText>,
    ) -> Symbol {
        let function = FunctionSymbol {
            signature: format_signature(&head.name.text, &head.params),
            params: head.params,
            closure: self.func_depth > 0,
            is_static: head.is_static,
            statement,
            returns,
        };
        let item = if head.method { SymbolItem::Method(function) } else { SymbolItem::Function(function) };
        let mut symbol = Symbol::new(head.name.text.clone(), range, head.name.range(), item);
        symbol.detail = head.detail;
        symbol.children = children;
        symbol
    }

    /// Splits a function body into its Statement and its children.
    ///
    /// Declarations merge in source order and the first one for a name wins; a later
    /// declaration of another kind only raises a warning. The first assignment of each
    /// undeclared name defines a local. Nested functions, classes and labels are kept as
    /// children; plain reads are dropped since the reference index already has them.
    pub(super) fn finish_function_scope(
        &mut self,
        params: &[Symbol],
        body: Vec<Symbol>,
        scope: ScopeCollector,
    ) -> (Statement, Vec<Symbol>) {
        let mut statement = Statement {
            assume: scope.assume,
            ..Default::default()
        };
        let mut children = Vec::new();
        let param_keys: FastHashSet<String> = params.iter().map(Symbol::key).collect();
        let mut declared: FastHashMap<String, DeclKind> = fast_hash_map_new();

        for (kind, decl) in scope.decls {
            let key = decl.key();
            if param_keys.contains(&key) {
                self.warning(format!("Conflicting scope declaration for \"{}\"", decl.name), decl.range.start, decl.range.len());
                continue;
            }
            match declared.get(&key) {
                Some(&first) => {
                    if first != kind {
                        self.warning(format!("Conflicting scope declaration for \"{}\"", decl.name), decl.range.start, decl.range.len());
                    }
                }
                None => {
                    declared.insert(key.clone(), kind);
                    if kind == DeclKind::Global {
                        statement.global.insert(key, decl);
                    } else {
                        children.push(decl.clone());
                        statement.local.insert(key, decl);
                    }
                }
            }
        }

        let assume_global = statement.assume == ScopeAssumption::GLOBAL;
        let assume_static = statement.assume.contains(ScopeAssumption::STATIC);
        for mut symbol in body {
            if !symbol.is_variable() {
                children.push(symbol);
                continue;
            }
            let key = symbol.key();
            let Some(var) = symbol.as_variable_mut() else {
                continue;
            };
            if !var.assigned || assume_global {
                continue;
            }
            var.is_static = assume_static;
            if param_keys.contains(&key) || statement.declares(&key) {
                continue;
            }
            statement.define.insert(key, symbol.clone());
            children.push(symbol);
        }
        children.sort_by_key(|s| s.range.start);
        (statement, children)
    }

    /// Script-level symbols: the first assignment of every variable plus all other symbols.
    pub(super) fn finish_script_scope(&mut self, body: Vec<Symbol>) -> Vec<Symbol> {
        let mut seen: FastHashSet<String> = fast_hash_set_new();
        let mut symbols: Vec<Symbol> = body
            .into_iter()
            .filter(|s| match s.as_variable() {
                Some(var) if s.is_variable() => var.assigned && seen.insert(s.key()),
                _ => true,
            })
            .collect();
        symbols.sort_by_key(|s| s.range.start);
        symbols
    }
}
