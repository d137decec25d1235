//! Symbol tree produced by the parser.
//!
//! Every symbol carries a kind-tagged payload; kind specific data only exists on the
//! matching variant. Names keep their source spelling, lookups go through
//! [`name_key`](crate::util::fast_map::name_key).

use serde::Serialize;

use crate::token::TextRange;
use crate::util::fast_map::{FastHashMap, name_key};

#[cfg(test)]
mod symbol_test;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Variable,
    Property,
    Label,
    Hotkey,
    /// `;;` comment promoted to a navigation marker.
    Region,
}

/// Source text of an expression together with its starting offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExprText {
    pub text: String,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScopeAssumption(u8);

impl ScopeAssumption {
    pub const DEFAULT: ScopeAssumption = ScopeAssumption(0);
    pub const LOCAL: ScopeAssumption = ScopeAssumption(1);
    pub const STATIC: ScopeAssumption = ScopeAssumption(2);
    pub const GLOBAL: ScopeAssumption = ScopeAssumption(4);

    pub fn contains(self, other: ScopeAssumption) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn with(self, other: ScopeAssumption) -> ScopeAssumption {
        ScopeAssumption(self.0 | other.0)
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

/// Scope declarations collected from one function body. The three maps are disjoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Statement {
    pub assume: ScopeAssumption,
    pub global: FastHashMap<String, Symbol>,
    /// `local` and `static` declarations.
    pub local: FastHashMap<String, Symbol>,
    /// Names assigned in the body without a declaration.
    pub define: FastHashMap<String, Symbol>,
}

impl Statement {
    pub fn declares(&self, key: &str) -> bool {
        self.global.contains_key(key) || self.local.contains_key(key) || self.define.contains_key(key)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FunctionSymbol {
    /// Parameters as `Variable` symbols, in declaration order.
    pub params: Vec<Symbol>,
    pub signature: String,
    /// Declared inside another function.
    pub closure: bool,
    pub is_static: bool,
    pub statement: Statement,
    /// `return` operands (the body, for fat-arrow functions).
    pub returns: Vec<ExprText>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ClassSymbol {
    /// Dotted base class name, resolved on demand.
    pub extends: Option<String>,
    /// Lower-cased member name to index into the class's children.
    pub static_members: FastHashMap<String, usize>,
    pub instance_members: FastHashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VariableSymbol {
    pub by_ref: bool,
    pub is_static: bool,
    pub variadic: bool,
    /// Declared at script scope.
    pub global_space: bool,
    /// This occurrence writes the variable.
    pub assigned: bool,
    /// Parameter default or the right hand side of the declaring assignment.
    pub default: Option<ExprText>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data")]
pub enum SymbolItem {
    Function(FunctionSymbol),
    Method(FunctionSymbol),
    Class(ClassSymbol),
    Variable(VariableSymbol),
    Property(VariableSymbol),
    Label,
    /// Hotkeys and hotstrings; those with a `{ }` body carry a function.
    Hotkey(Option<Box<FunctionSymbol>>),
    Region,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub range: TextRange,
    pub selection_range: TextRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Symbol>,
    #[serde(flatten)]
    pub item: SymbolItem,
}

impl Symbol {
    pub fn new(name: impl Into<String>, range: TextRange, selection_range: TextRange, item: SymbolItem) -> Self {
        Self {
            name: name.into(),
            range,
            selection_range,
            detail: None,
            children: Vec::new(),
            item,
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self.item {
            SymbolItem::Function(_) => SymbolKind::Function,
            SymbolItem::Method(_) => SymbolKind::Method,
            SymbolItem::Class(_) => SymbolKind::Class,
            SymbolItem::Variable(_) => SymbolKind::Variable,
            SymbolItem::Property(_) => SymbolKind::Property,
            SymbolItem::Label => SymbolKind::Label,
            SymbolItem::Hotkey(_) => SymbolKind::Hotkey,
            SymbolItem::Region => SymbolKind::Region,
        }
    }

    pub fn key(&self) -> String {
        name_key(&self.name).into_owned()
    }

    pub fn is_named(&self, key: &str) -> bool {
        name_key(&self.name) == key
    }

    /// Function payload of functions, methods and block hotkeys.
    pub fn as_function(&self) -> Option<&FunctionSymbol> {
        match &self.item {
            SymbolItem::Function(f) | SymbolItem::Method(f) => Some(f),
            SymbolItem::Hotkey(Some(f)) => Some(f),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassSymbol> {
        match &self.item {
            SymbolItem::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableSymbol> {
        match &self.item {
            SymbolItem::Variable(v) | SymbolItem::Property(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_variable_mut(&mut self) -> Option<&mut VariableSymbol> {
        match &mut self.item {
            SymbolItem::Variable(v) | SymbolItem::Property(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.item, SymbolItem::Variable(_))
    }

    /// Walks this symbol and all descendants, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Symbol)) {
        visit(self);
        if let Some(f) = self.as_function() {
            for p in &f.params {
                p.walk(visit);
            }
        }
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// One occurrence of a variable name, kept for reference search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Lower-cased name.
    pub name: String,
    pub range: TextRange,
    pub assigned: bool,
}

/// Printed signature, e.g. `foo(a, &b, c := 2, rest*)`.
pub fn format_signature(name: &str, params: &[Symbol]) -> String {
    let mut out = String::with_capacity(name.len() + 2 + params.len() * 8);
    out.push_str(name);
    out.push('(');
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let var = param.as_variable();
        if var.is_some_and(|v| v.by_ref) {
            out.push('&');
        }
        out.push_str(&param.name);
        if let Some(v) = var {
            if v.variadic {
                out.push('*');
            }
            if let Some(default) = &v.default {
                out.push_str(" := ");
                out.push_str(&default.text);
            }
        }
    }
    out.push(')');
    out
}
