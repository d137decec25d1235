//! Recursive-descent parser that builds the symbol tree.
//!
//! The parser drives a [`Scanner`] one token at a time. `tk` is the current token and
//! `lk` the one before it; clearing `next` makes the following `next_token` call hand
//! back `tk` again instead of scanning, which is how a helper gives a token back to
//! its caller. Speculative parses save a [`Checkpoint`] and restore it on failure.

mod class;
mod directives;
mod expr;
mod function;
mod helpers;
mod program;
mod reserved;

#[cfg(test)]
mod class_test;
#[cfg(test)]
mod expr_test;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::analysis::{Analysis, CallSite, FoldingRange, IncludeEntry};
use crate::symbol::{ExprText, Reference, ScopeAssumption, Symbol};
use crate::token::{Diagnostic, LineIndex, Scanner, ScannerState, Token, TokenKind};
use crate::util::fast_map::FastHashSet;

pub use directives::resolve_case_insensitive;
pub(crate) use helpers::unquote;

/// Per-document inputs the parser needs besides the text.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Full path of the script, used for `%A_LineFile%`.
    pub file: Option<PathBuf>,
    /// Directory of the script; base for relative includes.
    pub script_dir: PathBuf,
    /// Ordered library search list for `#include <lib>`.
    pub lib_dirs: Vec<PathBuf>,
    /// Additional lower-cased names that are never recorded as variable references.
    pub extra_builtins: FastHashSet<String>,
    /// Keep at most this many diagnostics; 0 keeps all.
    pub max_diagnostics: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Script,
    Function,
    ClassStatic,
    ClassInstance,
}

impl Mode {
    pub fn is_class(self) -> bool {
        matches!(self, Mode::ClassStatic | Mode::ClassInstance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclKind {
    Global,
    Local,
    Static,
}

/// Scope declarations seen while parsing one body, in source order.
#[derive(Debug, Default)]
struct ScopeCollector {
    assume: ScopeAssumption,
    decls: Vec<(DeclKind, Symbol)>,
}

#[derive(Clone)]
struct Checkpoint {
    scanner: ScannerState,
    tk: Token,
    lk: Token,
    next: bool,
    diagnostics: usize,
    folding: usize,
    references: usize,
    calls: usize,
}

pub struct Parser<'o> {
    scanner: Scanner,
    options: &'o ParseOptions,
    line_index: LineIndex,
    tk: Token,
    lk: Token,
    next: bool,
    diagnostics: Vec<Diagnostic>,
    folding: Vec<FoldingRange>,
    includes: BTreeMap<String, IncludeEntry>,
    include_dirs: BTreeMap<u32, PathBuf>,
    include_dir: PathBuf,
    texts: BTreeMap<String, String>,
    references: Vec<Reference>,
    calls: Vec<CallSite>,
    tokens: BTreeMap<usize, Token>,
    regions: Vec<Symbol>,
    /// `return` operands of the functions currently being parsed, innermost last.
    returns: Vec<Vec<ExprText>>,
    class_depth: u32,
    func_depth: u32,
    /// Set by `static` inside a class body for the member that follows.
    pending_static: bool,
    /// Closers of the delimiter pairs currently open, innermost last.
    closers: Vec<&'static str>,
}

fn empty_token() -> Token {
    Token {
        kind: TokenKind::Eof,
        text: String::new(),
        offset: 0,
        len: 0,
        top_of_line: true,
        ignore: false,
        newlines: 0,
    }
}

impl<'o> Parser<'o> {
    pub fn new(text: &str, options: &'o ParseOptions) -> Self {
        let include_dir = options.script_dir.clone();
        Self {
            scanner: Scanner::new(text),
            options,
            line_index: LineIndex::new(text),
            tk: empty_token(),
            lk: empty_token(),
            next: true,
            diagnostics: Vec::new(),
            folding: Vec::new(),
            includes: BTreeMap::new(),
            include_dirs: BTreeMap::new(),
            include_dir,
            texts: BTreeMap::new(),
            references: Vec::new(),
            calls: Vec::new(),
            tokens: BTreeMap::new(),
            regions: Vec::new(),
            returns: Vec::new(),
            class_depth: 0,
            func_depth: 0,
            pending_static: false,
            closers: Vec::new(),
        }
    }

    /// Parses the whole document.
    pub fn parse(mut self) -> Analysis {
        let mut scope = ScopeCollector::default();
        let body = self.parse_block(Mode::Script, &mut scope);
        let mut symbols = self.finish_script_scope(body);
        let member_index = class::index_members(&symbols);
        symbols.append(&mut self.regions);

        let mut diagnostics = self.diagnostics;
        diagnostics.sort_by_key(|d| d.offset);
        if self.options.max_diagnostics > 0 {
            diagnostics.truncate(self.options.max_diagnostics);
        }

        Analysis {
            symbols,
            diagnostics,
            folding_ranges: self.folding,
            includes: self.includes,
            include_dirs: self.include_dirs,
            texts: self.texts,
            references: self.references,
            calls: self.calls,
            member_index,
            tokens: self.tokens.into_values().collect(),
            line_index: self.line_index,
        }
    }
}
