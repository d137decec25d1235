use super::{Mode, Parser, ScopeCollector};
use crate::symbol::{FunctionSymbol, Symbol, SymbolItem, VariableSymbol, format_signature};
use crate::token::{TextRange, Token, TokenKind};

impl<'o> Parser<'o> {
    /// Parses statements until end of input or, for nested modes, the `}` matching the
    /// brace in `self.tk` when called.
    pub(super) fn parse_block(&mut self, mode: Mode, scope: &mut ScopeCollector) -> Vec<Symbol> {
        let mut result = Vec::new();
        let mut blocks: Vec<usize> = Vec::new();
        let nested = mode != Mode::Script;
        if nested {
            blocks.push(self.tk.offset);
        }
        let mut in_switch: Option<usize> = None;

        loop {
            let tk = self.next_token().clone();
            match tk.kind {
                TokenKind::Eof => {
                    for &open in blocks.iter().rev() {
                        self.error("Missing closing \"}\"", open, 1);
                    }
                    self.push_back();
                    return result;
                }
                TokenKind::OpenBrace => blocks.push(tk.offset),
                TokenKind::CloseBrace => {
                    let Some(open) = blocks.pop() else {
                        self.error_at("Unexpected \"}\"", &tk);
                        continue;
                    };
                    self.fold_block(open, tk.offset);
                    if in_switch == Some(blocks.len()) {
                        in_switch = None;
                    }
                    if nested && blocks.is_empty() {
                        return result;
                    }
                }
                TokenKind::CloseDelim => self.error_at(format!("Unexpected \"{}\"", tk.text), &tk),
                TokenKind::OpenDelim => {
                    let refs = self.parse_pair(&tk, mode);
                    result.extend(refs);
                }
                TokenKind::Unknown => self.error_at(format!("Unknown token \"{}\"", tk.text), &tk),
                TokenKind::Operator if tk.text == "%" => {
                    let refs = self.parse_pair(&tk, mode);
                    result.extend(refs);
                }
                TokenKind::Comment if tk.top_of_line && tk.text.starts_with(";;") => {
                    let name = tk.text.trim_start_matches(';').trim();
                    if !name.is_empty() {
                        self.regions.push(Symbol::new(name, tk.range(), tk.range(), SymbolItem::Region));
                    }
                }
                TokenKind::Directive => self.parse_directive(&tk, mode),
                TokenKind::Label => {
                    let name = tk.text.trim_end_matches(':');
                    if in_switch.is_some() && name.eq_ignore_ascii_case("default") {
                        continue;
                    }
                    let mut label = Symbol::new(
                        name,
                        tk.range(),
                        TextRange::at(tk.offset, tk.len - 1),
                        SymbolItem::Label,
                    );
                    label.detail = self.doc_comment();
                    result.push(label);
                }
                TokenKind::Hotkey => {
                    let hotkey = self.parse_hotkey(&tk, mode);
                    result.push(hotkey);
                }
                TokenKind::Hotstring => {
                    if mode != Mode::Script {
                        self.error_at("Hotkeys and hotstrings cannot be defined inside functions or classes", &tk);
                    }
                    let end = self.scanner.line_end(tk.offset);
                    let range = TextRange::new(tk.offset, end);
                    let selection = TextRange::at(tk.offset, tk.len.saturating_sub(2));
                    let mut hotstring = Symbol::new(tk.text.trim_end_matches("::"), range, selection, SymbolItem::Hotkey(None));
                    hotstring.detail = self.doc_comment();
                    result.push(hotstring);
                }
                TokenKind::Word => self.parse_word_statement(mode, &mut result),
                TokenKind::Reserved => {
                    if tk.is_keyword("switch") {
                        in_switch = Some(blocks.len());
                        continue;
                    }
                    self.parse_reserved(mode, scope, &mut result);
                }
                _ => {}
            }
        }
    }

    fn parse_hotkey(&mut self, hk: &Token, mode: Mode) -> Symbol {
        if mode != Mode::Script {
            self.error_at("Hotkeys and hotstrings cannot be defined inside functions or classes", hk);
        } else if is_invalid_hotkey(&hk.text) {
            self.error_at("Invalid hotkey definition", hk);
        }
        let detail = self.doc_comment();
        let name = hk.text.trim_end_matches("::").to_string();
        let selection = TextRange::at(hk.offset, hk.len.saturating_sub(2));
        let mut symbol = Symbol::new(name, hk.range(), selection, SymbolItem::Hotkey(None));
        symbol.detail = detail;

        self.next_token_skip_comments();
        if self.tk.kind != TokenKind::OpenBrace {
            self.push_back();
            return symbol;
        }

        let this_hotkey = Symbol::new(
            "ThisHotkey",
            TextRange::at(hk.offset, 0),
            TextRange::at(hk.offset, 0),
            SymbolItem::Variable(VariableSymbol {
                assigned: true,
                ..Default::default()
            }),
        );
        let params = vec![this_hotkey];
        let (body, scope) = self.parse_function_body();
        symbol.range = TextRange::new(hk.offset, self.tk.end());
        let (statement, children) = self.finish_function_scope(&params, body, scope);
        symbol.children = children;
        let returns = self.returns.pop().unwrap_or_default();
        symbol.item = SymbolItem::Hotkey(Some(Box::new(FunctionSymbol {
            signature: format_signature(&symbol.name, &params),
            params,
            closure: false,
            is_static: false,
            statement,
            returns,
        })));
        symbol
    }

    /// Body of a `{ }` function; `self.tk` must be the opening brace. Leaves the matching
    /// `}` in `self.tk` and the return list on `self.returns`.
    pub(super) fn parse_function_body(&mut self) -> (Vec<Symbol>, ScopeCollector) {
        let mut scope = ScopeCollector::default();
        self.func_depth += 1;
        self.returns.push(Vec::new());
        let body = self.parse_block(Mode::Function, &mut scope);
        self.func_depth -= 1;
        (body, scope)
    }
}

/// Whitespace before `::`, or `&` not surrounded by spaces.
fn is_invalid_hotkey(text: &str) -> bool {
    let head = text.trim_end_matches("::");
    if head.ends_with(char::is_whitespace) {
        return true;
    }
    match head.find('&') {
        Some(pos) if pos > 0 => {
            let (before, after) = (&head[..pos], &head[pos + 1..]);
            !before.trim().is_empty() && !after.trim().is_empty() && !(before.ends_with(' ') && after.starts_with(' '))
        }
        _ => false,
    }
}
