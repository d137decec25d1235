//! Scope resolution over parsed documents.
//!
//! A [`Resolver`] borrows the analyses it may look at: the primary document, the
//! documents it includes (whose script scope is shared with it) and the rest of the
//! project (searched for classes only). Lookups never fail; a miss is `None`.


use std::collections::BTreeMap;

use crate::analysis::Analysis;
use crate::builtins::prelude;
use crate::symbol::{ScopeAssumption, Symbol, SymbolKind};
use crate::util::cancel::CancelFlag;
use crate::util::fast_map::{FastHashSet, fast_hash_set_new, name_key};

/// The class whose body encloses an offset.
#[derive(Debug, Clone)]
pub struct ClassContext<'a> {
    pub class: &'a Symbol,
    /// Dotted name from the script scope, e.g. `Outer.Inner`.
    pub path: String,
    /// The offset sits in a static method or static property.
    pub in_static: bool,
}

pub struct Resolver<'a> {
    /// Primary document first, then its includes.
    docs: Vec<&'a Analysis>,
    project: Vec<&'a Analysis>,
    cancel: CancelFlag,
}

fn accepts(symbol: &Symbol, kinds: Option<&[SymbolKind]>) -> bool {
    kinds.is_none_or(|k| k.contains(&symbol.kind()))
}

impl<'a> Resolver<'a> {
    pub fn new(primary: &'a Analysis) -> Self {
        Self {
            docs: vec![primary],
            project: Vec::new(),
            cancel: CancelFlag::default(),
        }
    }

    /// Documents whose script scope is visible from the primary one.
    pub fn with_includes(mut self, docs: impl IntoIterator<Item = &'a Analysis>) -> Self {
        self.docs.extend(docs);
        self
    }

    /// Every other open document, searched when a class name is not in scope.
    pub fn with_project(mut self, docs: impl IntoIterator<Item = &'a Analysis>) -> Self {
        self.project.extend(docs);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn primary(&self) -> &'a Analysis {
        self.docs[0]
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Symbol a name refers to at `offset` in the primary document.
    pub fn find_symbol(&self, name: &str, offset: usize, kinds: Option<&[SymbolKind]>) -> Option<&'a Symbol> {
        self.find_symbol_in(self.primary(), name, offset, kinds)
    }

    /// Like [`find_symbol`](Self::find_symbol) with `offset` taken in `doc`.
    pub fn find_symbol_in(
        &self,
        doc: &'a Analysis,
        name: &str,
        offset: usize,
        kinds: Option<&[SymbolKind]>,
    ) -> Option<&'a Symbol> {
        let key = name_key(name);
        let key = key.as_ref();
        for scope in scope_chain_in(doc, offset).into_iter().rev() {
            let Some(function) = scope.as_function() else {
                continue;
            };
            let statement = &function.statement;
            if let Some(param) = function.params.iter().find(|p| p.is_named(key)) {
                if accepts(param, kinds) {
                    return Some(param);
                }
            }
            if let Some(decl) = statement.global.get(key) {
                return self.script_symbol(key, kinds).or_else(|| accepts(decl, kinds).then_some(decl));
            }
            if let Some(decl) = statement.local.get(key) {
                if accepts(decl, kinds) {
                    return Some(decl);
                }
            }
            if statement.assume == ScopeAssumption::GLOBAL {
                return self.script_symbol(key, kinds);
            }
            if let Some(local) = statement.define.get(key) {
                if accepts(local, kinds) {
                    return Some(local);
                }
            }
            let nested = scope
                .children
                .iter()
                .find(|c| !c.is_variable() && c.is_named(key) && accepts(c, kinds));
            if nested.is_some() {
                return nested;
            }
            if statement.assume.contains(ScopeAssumption::LOCAL) {
                return None;
            }
        }
        self.script_symbol(key, kinds)
    }

    /// Script scope of the primary document and its includes, then the builtin classes.
    fn script_symbol(&self, key: &str, kinds: Option<&[SymbolKind]>) -> Option<&'a Symbol> {
        self.docs
            .iter()
            .copied()
            .chain(std::iter::once(prelude()))
            .flat_map(|doc| doc.symbols.iter())
            .find(|s| s.kind() != SymbolKind::Region && s.is_named(key) && accepts(s, kinds))
    }

    /// Function scopes enclosing `offset` in the primary document, outermost first.
    pub fn scope_chain(&self, offset: usize) -> Vec<&'a Symbol> {
        scope_chain_in(self.primary(), offset)
    }

    /// Names visible at `offset`, innermost first, one entry per lower-cased name.
    pub fn scope_children_at(&self, offset: usize) -> Vec<&'a Symbol> {
        let mut seen: FastHashSet<String> = fast_hash_set_new();
        let mut out = Vec::new();
        let mut push = |symbol: &'a Symbol, out: &mut Vec<&'a Symbol>| {
            if symbol.name.is_empty() || matches!(symbol.kind(), SymbolKind::Region | SymbolKind::Hotkey | SymbolKind::Label) {
                return;
            }
            if seen.insert(symbol.key()) {
                out.push(symbol);
            }
        };
        for scope in self.scope_chain(offset).into_iter().rev() {
            if let Some(function) = scope.as_function() {
                for param in &function.params {
                    push(param, &mut out);
                }
                for decl in function.statement.global.values() {
                    if let Some(global) = self.script_symbol(&decl.key(), None) {
                        push(global, &mut out);
                    }
                }
            }
            for child in &scope.children {
                push(child, &mut out);
            }
        }
        for doc in self.docs.iter().copied() {
            for symbol in &doc.symbols {
                push(symbol, &mut out);
            }
        }
        out
    }

    /// Members of a class and its bases, nearest definition first. `static_only` selects
    /// the members reachable through the class object rather than an instance.
    pub fn class_members(&self, class: &'a Symbol, static_only: bool) -> BTreeMap<String, &'a Symbol> {
        let mut members = BTreeMap::new();
        let mut visited: Vec<*const Symbol> = Vec::new();
        let root = if static_only { "Class" } else { "Object" };
        let mut current = Some(class);
        while let Some(symbol) = current {
            if visited.contains(&(symbol as *const Symbol)) {
                break;
            }
            visited.push(symbol);
            let Some(info) = symbol.as_class() else {
                break;
            };
            let map = if static_only { &info.static_members } else { &info.instance_members };
            for (key, &index) in map {
                if let Some(member) = symbol.children.get(index) {
                    members.entry(key.clone()).or_insert(member);
                }
            }
            current = match &info.extends {
                Some(base) => self.find_class(base).or_else(|| builtin_class(root)),
                None => builtin_class(root),
            };
        }
        members
    }

    /// Class by dotted name: script scope first, then the project, then the builtins.
    pub fn find_class(&self, dotted: &str) -> Option<&'a Symbol> {
        let mut parts = dotted.split('.');
        let first = name_key(parts.next()?.trim()).into_owned();
        let is_class = |s: &&'a Symbol| s.kind() == SymbolKind::Class && s.is_named(&first);
        let mut class = self.docs.iter().copied().flat_map(|d| d.symbols.iter()).find(is_class);
        if class.is_none() {
            if self.cancel.is_cancelled() {
                tracing::debug!(target: "ahk2::resolve", class = dotted, "class lookup cancelled");
                return None;
            }
            class = self
                .project
                .iter()
                .copied()
                .chain(std::iter::once(prelude()))
                .flat_map(|d| d.symbols.iter())
                .find(is_class);
        }
        let mut class = class?;
        for part in parts {
            let key = name_key(part.trim()).into_owned();
            class = class
                .children
                .iter()
                .find(|c| c.kind() == SymbolKind::Class && c.is_named(&key))?;
        }
        Some(class)
    }

    /// Class body enclosing `offset` in `doc`.
    pub fn enclosing_class_in(&self, doc: &'a Analysis, offset: usize) -> Option<ClassContext<'a>> {
        let mut context: Option<ClassContext<'a>> = None;
        let mut level: &'a [Symbol] = &doc.symbols;
        while let Some(symbol) = level
            .iter()
            .find(|s| s.range.contains(offset) && (s.as_function().is_some() || !s.children.is_empty()))
        {
            match symbol.kind() {
                SymbolKind::Class => {
                    let path = match &context {
                        Some(outer) => format!("{}.{}", outer.path, symbol.name),
                        None => symbol.name.clone(),
                    };
                    context = Some(ClassContext {
                        class: symbol,
                        path,
                        in_static: false,
                    });
                }
                SymbolKind::Method | SymbolKind::Property => {
                    let is_static = match symbol.as_function() {
                        Some(f) => f.is_static,
                        None => symbol.as_variable().is_some_and(|v| v.is_static),
                    };
                    if let Some(ctx) = context.as_mut() {
                        ctx.in_static |= is_static;
                    }
                }
                _ => {}
            }
            level = &symbol.children;
        }
        context
    }

    /// Which of the known analyses owns `symbol`.
    pub fn doc_of(&self, symbol: &Symbol) -> Option<&'a Analysis> {
        let target = symbol as *const Symbol;
        self.docs
            .iter()
            .chain(self.project.iter())
            .copied()
            .chain(std::iter::once(prelude()))
            .find(|doc| {
                let mut found = false;
                for root in &doc.symbols {
                    root.walk(&mut |s| found |= std::ptr::eq(s, target));
                    if found {
                        break;
                    }
                }
                found
            })
    }
}

/// Function scopes enclosing `offset`, outermost first.
pub fn scope_chain_in(doc: &Analysis, offset: usize) -> Vec<&Symbol> {
    let mut chain = Vec::new();
    let mut level: &[Symbol] = &doc.symbols;
    while let Some(symbol) = level
        .iter()
        .find(|s| s.range.contains(offset) && (s.as_function().is_some() || !s.children.is_empty()))
    {
        if symbol.as_function().is_some() {
            chain.push(symbol);
        }
        level = &symbol.children;
    }
    chain
}

fn builtin_class(name: &str) -> Option<&'static Symbol> {
    prelude().symbols.iter().find(|s| s.kind() == SymbolKind::Class && s.name == name)
}
