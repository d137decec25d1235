use std::collections::BTreeMap;

use super::function::{FunctionHead, ParamParse};
use super::{Mode, Parser, ScopeCollector};

use crate::analysis::MemberEntry;
use crate::symbol::{ClassSymbol, Symbol, SymbolItem, VariableSymbol};
use crate::token::{TextRange, Token, TokenKind};
use crate::util::fast_map::{FastHashSet, fast_hash_set_new};

impl<'o> Parser<'o> {
    /// `class Name [extends Base.Name] { ... }`; `kw` is the `class` keyword at line start.
    pub(super) fn parse_class(&mut self, kw: &Token, mode: Mode, result: &mut Vec<Symbol>) {
        let detail = self.doc_comment();
        let mut name = self.next_token().clone();
        if name.kind == TokenKind::Reserved && !name.is_keyword("extends") {
            // builtin declarations name a class `Class`
            name.kind = TokenKind::Word;
        }
        if name.kind != TokenKind::Word || name.top_of_line {
            self.error_at("Invalid class definition", kw);
            self.push_back();
            return;
        }
        self.check_identifier(&name, "class");
        if mode == Mode::Function || self.func_depth > 0 {
            self.error_at("Functions cannot contain classes", kw);
        }

        let mut extends = None;
        let mut next = self.next_token_skip_comments().clone();
        if next.is_keyword("extends") && !next.top_of_line {
            let mut parts = Vec::new();
            loop {
                let part = self.next_token().clone();
                if part.kind != TokenKind::Word || part.top_of_line {
                    self.error_at("Expected a class name after \"extends\"", &next);
                    self.push_back();
                    break;
                }
                parts.push(part.text.clone());
                if self.char_after(&part) != Some('.') {
                    break;
                }
                self.next_token();
            }
            if !parts.is_empty() {
                extends = Some(parts.join("."));
            }
            next = self.next_token_skip_comments().clone();
        }

        if next.kind != TokenKind::OpenBrace {
            self.error_at("Class body expected", &name);
            self.push_back();
            return;
        }

        self.class_depth += 1;
        let saved_static = std::mem::take(&mut self.pending_static);
        let mut scope = ScopeCollector::default();
        let body = self.parse_block(Mode::ClassInstance, &mut scope);
        self.pending_static = saved_static;
        self.class_depth -= 1;

        let range = TextRange::new(kw.offset, self.tk.end().max(name.end()));
        let (children, class) = class_members(body, extends);
        let mut symbol = Symbol::new(name.text.clone(), range, name.range(), SymbolItem::Class(class));
        symbol.children = children;
        symbol.detail = detail;
        tracing::trace!(target: "ahk2::parse", class = %symbol.name, members = symbol.children.len(), "class parsed");
        result.push(symbol);
    }

    /// `Name := value, Other := value` at the top of a class body; `next` follows `word`.
    pub(super) fn parse_field_declarations(
        &mut self,
        mut word: Token,
        mut next: Token,
        is_static: bool,
        mut detail: Option<String>,
        result: &mut Vec<Symbol>,
    ) {
        let mode = if is_static { Mode::ClassStatic } else { Mode::ClassInstance };
        loop {
            let mut var = VariableSymbol {
                is_static,
                assigned: true,
                ..Default::default()
            };
            let mut more = false;
            if next.is(TokenKind::Assign, ":=") {
                let start = next.end();
                // initializer references are not members
                self.parse_expr(false, mode);
                var.default = Some(self.span_text(start, self.lk.end().max(start)));
                more = self.next && self.tk.kind == TokenKind::Comma;
            } else {
                if self.char_after(&word) != Some('.') {
                    self.error_at("Property declaration must be initialized", &word);
                }
                if next.kind == TokenKind::Comma && !next.top_of_line {
                    more = true;
                } else {
                    self.push_back();
                }
            }

            self.check_identifier(&word, "property");
            let mut field = Symbol::new(word.text.clone(), word.range(), word.range(), SymbolItem::Variable(var));
            field.detail = detail.take();
            result.push(field);
            if !more {
                return;
            }

            let following = self.next_token_skip_comments().clone();
            if following.kind != TokenKind::Word || following.top_of_line {
                self.push_back();
                return;
            }
            word = following;
            next = self.next_token().clone();
        }
    }

    /// `Name[params] => expr` or `Name[params] { get ... set ... }`; `next` follows `word`.
    pub(super) fn parse_property(
        &mut self,
        word: Token,
        mut next: Token,
        is_static: bool,
        detail: Option<String>,
        result: &mut Vec<Symbol>,
    ) {
        let mode = if is_static { Mode::ClassStatic } else { Mode::ClassInstance };
        let mut params = Vec::new();
        if next.is(TokenKind::OpenDelim, "[") {
            let cp = self.checkpoint();
            match self.parse_params("]") {
                ParamParse::Params(p) => params = p,
                ParamParse::Invalid(bad) => {
                    self.restore(cp);
                    let at = bad.unwrap_or_else(|| next.clone());
                    self.error_at("Invalid parameter list", &at);
                    self.parse_pair(&next, mode);
                }
            }
            next = self.next_token_skip_comments().clone();
        }

        let mut property = Symbol::new(
            word.text.clone(),
            word.range(),
            word.range(),
            SymbolItem::Property(VariableSymbol {
                is_static,
                assigned: true,
                ..Default::default()
            }),
        );
        property.detail = detail;

        if next.is_op("=>") && !next.top_of_line {
            let getter = self.accessor_head(&word, "get", &params, is_static);
            property.children.push(self.parse_arrow_function(getter, false));
        } else if next.kind == TokenKind::OpenBrace {
            self.parse_accessor_block(&next, &word, &params, is_static, &mut property.children);
        } else {
            self.error_at("Invalid getter/setter", &word);
            self.push_back();
        }
        let end = if next.kind == TokenKind::OpenBrace {
            self.tk.end()
        } else {
            property.children.last().map_or(word.end(), |c| c.range.end)
        };
        property.range = TextRange::new(word.offset, end.max(word.end()));
        result.push(property);
    }

    /// `{ get ... set ... }` after a property name; `open` is the `{`.
    fn parse_accessor_block(
        &mut self,
        open: &Token,
        prop: &Token,
        params: &[Symbol],
        is_static: bool,
        accessors: &mut Vec<Symbol>,
    ) {
        loop {
            let tk = self.next_token_skip_comments().clone();
            match tk.kind {
                TokenKind::CloseBrace => {
                    self.fold_block(open.offset, tk.offset);
                    return;
                }
                TokenKind::Eof => {
                    self.error("Missing closing \"}\"", open.offset, 1);
                    self.push_back();
                    return;
                }
                TokenKind::Word if tk.text.eq_ignore_ascii_case("get") || tk.text.eq_ignore_ascii_case("set") => {
                    let mut head = self.accessor_head(&tk, &tk.text, params, is_static);
                    if tk.text.eq_ignore_ascii_case("set") {
                        head.params.push(Symbol::new(
                            "Value",
                            TextRange::at(tk.offset, 0),
                            TextRange::at(tk.offset, 0),
                            SymbolItem::Variable(VariableSymbol {
                                assigned: true,
                                ..Default::default()
                            }),
                        ));
                    }
                    let body = self.next_token_skip_comments().clone();
                    if body.is_op("=>") {
                        accessors.push(self.parse_arrow_function(head, false));
                    } else if body.kind == TokenKind::OpenBrace {
                        accessors.push(self.parse_block_function(head));
                    } else {
                        self.error_at("Invalid getter/setter", &tk);
                        self.push_back();
                    }
                }
                _ => self.error_at(format!("Invalid getter/setter in \"{}\"", prop.text), &tk),
            }
        }
    }

    fn accessor_head(&self, name: &Token, accessor: &str, params: &[Symbol], is_static: bool) -> FunctionHead {
        let mut name = name.clone();
        name.text = accessor.to_ascii_lowercase();
        FunctionHead {
            name,
            params: params.to_vec(),
            is_static,
            method: true,
            detail: None,
        }
    }
}

/// Keeps the members of a class body and builds its static and instance maps.
/// Fields and properties are unique per static-ness and name; the first one wins.
fn class_members(body: Vec<Symbol>, extends: Option<String>) -> (Vec<Symbol>, ClassSymbol) {
    let mut seen: FastHashSet<(bool, String)> = fast_hash_set_new();
    let mut children: Vec<Symbol> = body
        .into_iter()
        .filter(|s| match &s.item {
            SymbolItem::Variable(v) | SymbolItem::Property(v) => v.assigned && seen.insert((v.is_static, s.key())),
            SymbolItem::Method(_) | SymbolItem::Class(_) => true,
            _ => false,
        })
        .collect();
    children.sort_by_key(|s| s.range.start);

    let mut class = ClassSymbol {
        extends,
        ..Default::default()
    };
    for (index, child) in children.iter().enumerate() {
        let is_static = match &child.item {
            SymbolItem::Method(f) => f.is_static,
            SymbolItem::Variable(v) | SymbolItem::Property(v) => v.is_static,
            _ => true,
        };
        let map = if is_static { &mut class.static_members } else { &mut class.instance_members };
        map.entry(child.key()).or_insert(index);
    }
    (children, class)
}

/// Member name to definitions, over every script-level class and the classes nested in them.
pub(super) fn index_members(symbols: &[Symbol]) -> BTreeMap<String, Vec<MemberEntry>> {
    let mut index: BTreeMap<String, Vec<MemberEntry>> = BTreeMap::new();
    for symbol in symbols.iter().filter(|s| s.as_class().is_some()) {
        index_class(symbol, &symbol.name, &mut index);
    }
    index
}

fn index_class(class: &Symbol, path: &str, index: &mut BTreeMap<String, Vec<MemberEntry>>) {
    for member in &class.children {
        let is_static = match &member.item {
            SymbolItem::Method(f) => f.is_static,
            SymbolItem::Variable(v) | SymbolItem::Property(v) => v.is_static,
            SymbolItem::Class(_) => true,
            _ => continue,
        };
        index.entry(member.key()).or_default().push(MemberEntry {
            class: path.to_string(),
            name: member.name.clone(),
            kind: member.kind(),
            is_static,
            selection_range: member.selection_range,
        });
        if member.as_class().is_some() {
            index_class(member, &format!("{}.{}", path, member.name), index);
        }
    }
}
