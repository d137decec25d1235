use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::symbol::{Reference, Symbol, SymbolKind};
use crate::token::{Diagnostic, LineIndex, Position, TextRange, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldingKind {
    Block,
    Comment,
    /// Multi-line single expression bodies.
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FoldingRange {
    pub start_line: u32,
    pub end_line: u32,
    pub kind: FoldingKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludeEntry {
    pub path: PathBuf,
    /// Directive text as written.
    pub raw: String,
    pub line: u32,
}

/// A call of a function or method, named as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSite {
    pub name: String,
    /// From the name through the argument list.
    pub range: TextRange,
    /// Called through a `.` receiver.
    pub method: bool,
}

/// One class member definition in the document-wide member index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberEntry {
    /// Dotted path of the owning class.
    pub class: String,
    pub name: String,
    pub kind: SymbolKind,
    pub is_static: bool,
    pub selection_range: TextRange,
}

/// Complete result of one parse. Built once, never mutated, replaced wholesale on reparse.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Analysis {
    pub symbols: Vec<Symbol>,
    pub diagnostics: Vec<Diagnostic>,
    pub folding_ranges: Vec<FoldingRange>,
    /// Lower-cased resolved path to the directive that pulled it in.
    pub includes: BTreeMap<String, IncludeEntry>,
    /// Line of an `#include` to the directory relative includes resolved against there.
    pub include_dirs: BTreeMap<u32, PathBuf>,
    /// String literals used as object keys or index operands, lower-cased to original.
    pub texts: BTreeMap<String, String>,
    pub references: Vec<Reference>,
    /// Call sites in source order.
    pub calls: Vec<CallSite>,
    /// Lower-cased member name to every class member defined under it.
    pub member_index: BTreeMap<String, Vec<MemberEntry>>,
    #[serde(skip)]
    pub(crate) tokens: Vec<Token>,
    #[serde(skip)]
    pub(crate) line_index: LineIndex,
}

impl Analysis {
    /// Empty tree with a single diagnostic, used when a parse could not complete.
    pub fn failed(text: &str, message: impl Into<String>) -> Self {
        Self {
            diagnostics: vec![Diagnostic::error(message, 0, 0)],
            line_index: LineIndex::new(text),
            ..Default::default()
        }
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn offset_of(&self, position: Position) -> usize {
        self.line_index.offset_of(position)
    }

    pub fn position_of(&self, offset: usize) -> Position {
        self.line_index.position_of(offset)
    }

    /// Raw token covering `offset` (end inclusive), if any.
    pub fn token_at(&self, offset: usize) -> Option<&Token> {
        let idx = self.tokens.partition_point(|t| t.offset <= offset);
        let tk = self.tokens.get(idx.checked_sub(1)?)?;
        (offset <= tk.end()).then_some(tk)
    }

    /// Every occurrence of a variable name, in source order.
    pub fn references_to<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Reference> + 'a {
        let key = crate::util::fast_map::name_key(name).into_owned();
        self.references.iter().filter(move |r| r.name == key)
    }

    pub fn calls_to<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CallSite> + 'a {
        self.calls.iter().filter(move |c| c.name.eq_ignore_ascii_case(name))
    }

    /// Members named `name` in any class of this document, for receivers of unknown shape.
    pub fn members_named(&self, name: &str) -> &[MemberEntry] {
        let key = crate::util::fast_map::name_key(name);
        self.member_index.get(key.as_ref()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == crate::token::Severity::Error)
    }
}
