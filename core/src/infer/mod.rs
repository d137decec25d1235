//! Shape inference for expressions.
//!
//! Works on the expression's own tokens rather than a full expression tree: assignments,
//! ternaries and binary operators are recognised at bracket depth zero, anything left is
//! a primary followed by a chain of member accesses, calls and index operations.

#[cfg(test)]
mod infer_test;

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::analysis::Analysis;
use crate::builtins::prelude;
use crate::parser::unquote;
use crate::resolve::Resolver;
use crate::symbol::{ExprText, Symbol, SymbolItem, SymbolKind};
use crate::token::{Scanner, Token, TokenKind};
use crate::util::fast_map::{FastHashMap, FastHashSet, fast_hash_map_new, fast_hash_set_new};

/// What an expression may evaluate to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "shape", content = "name")]
pub enum Shape {
    String,
    Number,
    Array,
    Object,
    /// The class object itself, by dotted name.
    ClassObject(String),
    Instance(String),
    Function(String),
    /// COM object with its ProgID; members come from the host.
    Foreign(String),
    Unknown,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::String => f.write_str("String"),
            Shape::Number => f.write_str("Number"),
            Shape::Array => f.write_str("Array"),
            Shape::Object => f.write_str("Object"),
            Shape::ClassObject(name) => write!(f, "class {}", name),
            Shape::Instance(name) => f.write_str(name),
            Shape::Function(name) => write!(f, "func {}", name),
            Shape::Foreign(prog_id) => write!(f, "ComObject({})", prog_id),
            Shape::Unknown => f.write_str("unknown"),
        }
    }
}

pub type Shapes = BTreeSet<Shape>;

fn one(shape: Shape) -> Shapes {
    BTreeSet::from([shape])
}

fn unknown() -> Shapes {
    one(Shape::Unknown)
}

/// Instances of the literal classes collapse to the literal shapes.
fn instance_of(class: &str) -> Shape {
    if class.eq_ignore_ascii_case("Array") {
        Shape::Array
    } else if class.eq_ignore_ascii_case("Object") {
        Shape::Object
    } else {
        Shape::Instance(class.to_string())
    }
}

/// Request-scoped inference state. Create one per query; it caches every
/// sub-expression it evaluates and refuses to re-enter one already in progress.
pub struct TypeInference<'r, 'a> {
    resolver: &'r Resolver<'a>,
    cache: FastHashMap<(String, usize, usize), Shapes>,
    in_progress: FastHashSet<(String, usize, usize)>,
    /// Qualified function name to its symbol and owning document.
    callables: FastHashMap<String, (&'a Symbol, &'a Analysis)>,
}

impl<'r, 'a> TypeInference<'r, 'a> {
    pub fn new(resolver: &'r Resolver<'a>) -> Self {
        Self {
            resolver,
            cache: fast_hash_map_new(),
            in_progress: fast_hash_set_new(),
            callables: fast_hash_map_new(),
        }
    }

    /// Shapes of `expr` evaluated at `offset` of the primary document.
    ///
    /// Each call starts from an empty cache, so an instance may serve several queries.
    pub fn infer(&mut self, expr: &str, offset: usize) -> Shapes {
        self.cache.clear();
        self.in_progress.clear();
        let doc = self.resolver.primary();
        self.infer_in(doc, expr, offset)
    }

    /// The symbol behind a `Function` shape produced by this inference.
    pub fn callable(&self, name: &str) -> Option<&'a Symbol> {
        self.callables.get(name).map(|(symbol, _)| *symbol)
    }

    fn infer_in(&mut self, doc: &'a Analysis, expr: &str, offset: usize) -> Shapes {
        let key = (expr.trim().to_string(), offset, doc as *const Analysis as usize);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }
        if self.resolver.is_cancelled() || !self.in_progress.insert(key.clone()) {
            return unknown();
        }
        let tokens = tokenize(expr);
        let shapes = self.eval(doc, &tokens, offset);
        self.in_progress.remove(&key);
        let shapes = if shapes.is_empty() { unknown() } else { shapes };
        self.cache.insert(key, shapes.clone());
        shapes
    }

    fn infer_text(&mut self, doc: &'a Analysis, text: &ExprText) -> Shapes {
        self.infer_in(doc, &text.text, text.offset)
    }

    fn eval(&mut self, doc: &'a Analysis, tokens: &[Token], offset: usize) -> Shapes {
        if tokens.is_empty() {
            return unknown();
        }
        let depths = depths(tokens);
        let top = |i: usize| depths[i] == 0;

        if let Some(i) = (0..tokens.len()).find(|&i| top(i) && tokens[i].kind == TokenKind::Assign) {
            if tokens[i].text == ".=" {
                return one(Shape::String);
            }
            if tokens[i].text != ":=" {
                return one(Shape::Number);
            }
            return self.eval(doc, &tokens[i + 1..], offset);
        }
        if (0..tokens.len()).any(|i| top(i) && tokens[i].is_op("=>")) {
            return unknown();
        }
        if let Some(q) = (0..tokens.len()).find(|&i| top(i) && tokens[i].is_op("?")) {
            let mut nested = 0usize;
            for i in q + 1..tokens.len() {
                if !top(i) {
                    continue;
                }
                if tokens[i].is_op("?") {
                    nested += 1;
                } else if tokens[i].is_op(":") {
                    if nested == 0 {
                        let mut shapes = self.eval(doc, &tokens[q + 1..i], offset);
                        shapes.extend(self.eval(doc, &tokens[i + 1..], offset));
                        return shapes;
                    }
                    nested -= 1;
                }
            }
            return unknown();
        }
        if let Some(i) = (0..tokens.len()).find(|&i| top(i) && tokens[i].is_op("??")) {
            let mut shapes = self.eval(doc, &tokens[..i], offset);
            shapes.extend(self.eval(doc, &tokens[i + 1..], offset));
            return shapes;
        }

        match classify(tokens, &depths) {
            Operators::Concat => one(Shape::String),
            Operators::Arithmetic => one(Shape::Number),
            Operators::Prefix(op) if op == "&" => unknown(),
            Operators::Prefix(_) => one(Shape::Number),
            Operators::Dynamic => unknown(),
            Operators::None => self.eval_chain(doc, tokens, offset),
        }
    }

    /// Primary followed by `.member`, `(args)` and `[index]` suffixes.
    fn eval_chain(&mut self, doc: &'a Analysis, tokens: &[Token], offset: usize) -> Shapes {
        let (mut shapes, mut i) = self.eval_primary(doc, tokens, offset);
        let suffixed = i < tokens.len();
        while i < tokens.len() && !is_unknown(&shapes) {
            let tk = &tokens[i];
            match tk.kind {
                TokenKind::Dot => {
                    let Some(member) = tokens.get(i + 1).filter(|t| t.kind == TokenKind::Word) else {
                        return unknown();
                    };
                    shapes = self.member_of(&shapes, &member.text);
                    i += 2;
                }
                TokenKind::OpenDelim if tk.text == "(" => {
                    shapes = self.call_of(&shapes);
                    i = matching(tokens, i) + 1;
                }
                _ => return unknown(),
            }
        }
        if suffixed && is_unknown(&shapes) { unknown() } else { shapes }
    }

    fn eval_primary(&mut self, doc: &'a Analysis, tokens: &[Token], offset: usize) -> (Shapes, usize) {
        let tk = &tokens[0];
        match tk.kind {
            TokenKind::Number => (one(Shape::Number), 1),
            TokenKind::String => (one(Shape::String), 1),
            TokenKind::OpenBrace => (one(Shape::Object), matching(tokens, 0) + 1),
            TokenKind::OpenDelim if tk.text == "[" => (one(Shape::Array), matching(tokens, 0) + 1),
            TokenKind::OpenDelim => {
                let close = matching(tokens, 0);
                let inner = tokens.get(1..close).unwrap_or_default();
                (self.eval(doc, inner, offset), close + 1)
            }
            TokenKind::Word => self.eval_word(doc, tokens, offset),
            _ => (unknown(), tokens.len()),
        }
    }

    fn eval_word(&mut self, doc: &'a Analysis, tokens: &[Token], offset: usize) -> (Shapes, usize) {
        let word = &tokens[0];
        let name = word.text.as_str();
        let adjacent_call = tokens.get(1).is_some_and(|t| t.is(TokenKind::OpenDelim, "(") && t.offset == word.end());

        if name.eq_ignore_ascii_case("new") {
            let Some(class) = tokens.get(1).filter(|t| t.kind == TokenKind::Word) else {
                return (unknown(), tokens.len());
            };
            let mut end = 2;
            let mut dotted = class.text.clone();
            while tokens.get(end).is_some_and(|t| t.kind == TokenKind::Dot) {
                match tokens.get(end + 1).filter(|t| t.kind == TokenKind::Word) {
                    Some(part) => {
                        dotted.push('.');
                        dotted.push_str(&part.text);
                        end += 2;
                    }
                    None => return (unknown(), tokens.len()),
                }
            }
            if tokens.get(end).is_some_and(|t| t.is(TokenKind::OpenDelim, "(")) {
                end = matching(tokens, end) + 1;
            }
            let shapes = match self.resolver.find_class(&dotted) {
                Some(_) => one(instance_of(&dotted)),
                None => unknown(),
            };
            return (shapes, end);
        }

        if name.eq_ignore_ascii_case("ComObject") && adjacent_call {
            let close = matching(tokens, 1);
            let shapes = match tokens.get(2) {
                Some(arg) if arg.kind == TokenKind::String && close == 3 => {
                    one(Shape::Foreign(unquote(&arg.text).to_string()))
                }
                _ => unknown(),
            };
            return (shapes, close + 1);
        }

        if name.eq_ignore_ascii_case("true") || name.eq_ignore_ascii_case("false") {
            return (one(Shape::Number), 1);
        }

        if name.eq_ignore_ascii_case("this") || name.eq_ignore_ascii_case("super") {
            let Some(context) = self.resolver.enclosing_class_in(doc, offset) else {
                return (unknown(), tokens.len());
            };
            let path = if name.eq_ignore_ascii_case("super") {
                match context.class.as_class().and_then(|c| c.extends.clone()) {
                    Some(base) => base,
                    None => "Object".to_string(),
                }
            } else {
                context.path
            };
            let shape = if context.in_static { Shape::ClassObject(path) } else { instance_of(&path) };
            return (one(shape), 1);
        }

        let Some(symbol) = self.resolver.find_symbol_in(doc, name, offset, None) else {
            return (unknown(), tokens.len());
        };
        let owner = self.resolver.doc_of(symbol).unwrap_or(doc);
        (self.shapes_of_symbol(symbol, owner, None), 1)
    }

    /// Shapes a resolved symbol stands for. `class_path` qualifies members of a class.
    fn shapes_of_symbol(&mut self, symbol: &'a Symbol, owner: &'a Analysis, class_path: Option<&str>) -> Shapes {
        let qualified = match class_path {
            Some(path) => format!("{}.{}", path, symbol.name),
            None => symbol.name.clone(),
        };
        match &symbol.item {
            SymbolItem::Class(_) => one(Shape::ClassObject(qualified)),
            SymbolItem::Function(_) | SymbolItem::Method(_) => {
                self.callables.insert(qualified.clone(), (symbol, owner));
                one(Shape::Function(qualified))
            }
            SymbolItem::Variable(var) => match &var.default {
                Some(init) => self.infer_text(owner, init),
                None => unknown(),
            },
            SymbolItem::Property(_) => {
                // the getter's result, when it has one
                let getter = symbol.children.iter().find(|c| c.name == "get");
                match getter.and_then(Symbol::as_function) {
                    Some(get) => self.union_of_returns(owner, &get.returns),
                    None => unknown(),
                }
            }
            _ => unknown(),
        }
    }

    fn union_of_returns(&mut self, owner: &'a Analysis, returns: &[ExprText]) -> Shapes {
        let mut shapes = Shapes::new();
        for ret in returns {
            shapes.extend(self.infer_text(owner, ret));
        }
        if shapes.is_empty() { unknown() } else { shapes }
    }

    fn member_of(&mut self, receivers: &Shapes, member: &str) -> Shapes {
        let mut out = Shapes::new();
        for receiver in receivers {
            let (class_name, static_only) = match receiver {
                Shape::String => ("String".to_string(), false),
                Shape::Number => ("Number".to_string(), false),
                Shape::Array => ("Array".to_string(), false),
                Shape::Object => ("Object".to_string(), false),
                Shape::Function(_) => ("Func".to_string(), false),
                Shape::Instance(name) => (name.clone(), false),
                Shape::ClassObject(name) => (name.clone(), true),
                Shape::Foreign(_) | Shape::Unknown => {
                    out.insert(Shape::Unknown);
                    continue;
                }
            };
            let found = self.resolver.find_class(&class_name).and_then(|class| {
                let members = self.resolver.class_members(class, static_only);
                members.get(&crate::util::fast_map::name_key(member).into_owned()).copied()
            });
            let Some(symbol) = found else {
                out.insert(Shape::Unknown);
                continue;
            };
            let owner = self.resolver.doc_of(symbol).unwrap_or(prelude());
            let path = if symbol.kind() == SymbolKind::Class || symbol.as_function().is_some() {
                Some(class_name.as_str())
            } else {
                None
            };
            out.extend(self.shapes_of_symbol(symbol, owner, path));
        }
        out
    }

    fn call_of(&mut self, callees: &Shapes) -> Shapes {
        let mut out = Shapes::new();
        for callee in callees {
            match callee {
                Shape::ClassObject(name) => {
                    out.insert(instance_of(name));
                }
                Shape::Function(name) => match self.callables.get(name).copied() {
                    Some((symbol, owner)) => {
                        let returns = symbol.as_function().map(|f| f.returns.clone()).unwrap_or_default();
                        out.extend(self.union_of_returns(owner, &returns));
                    }
                    None => {
                        out.insert(Shape::Unknown);
                    }
                },
                _ => {
                    out.insert(Shape::Unknown);
                }
            }
        }
        out
    }
}

fn is_unknown(shapes: &Shapes) -> bool {
    shapes.is_empty() || shapes.contains(&Shape::Unknown)
}

fn tokenize(expr: &str) -> Vec<Token> {
    let mut scanner = Scanner::new(expr);
    let mut tokens = Vec::new();
    loop {
        let tk = scanner.next_token();
        if tk.is_eof() {
            return tokens;
        }
        if !tk.is_comment() {
            tokens.push(tk);
        }
    }
}

/// Bracket depth before each token; closers count at the outer depth.
fn depths(tokens: &[Token]) -> Vec<usize> {
    let mut depth = 0usize;
    tokens
        .iter()
        .map(|tk| match tk.kind {
            TokenKind::OpenDelim | TokenKind::OpenBrace => {
                depth += 1;
                depth - 1
            }
            TokenKind::CloseDelim | TokenKind::CloseBrace => {
                depth = depth.saturating_sub(1);
                depth
            }
            _ => depth,
        })
        .collect()
}

/// Index of the closer matching the opener at `open`, or the last index.
fn matching(tokens: &[Token], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, tk) in tokens.iter().enumerate().skip(open) {
        match tk.kind {
            TokenKind::OpenDelim | TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseDelim | TokenKind::CloseBrace => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    tokens.len().saturating_sub(1)
}

enum Operators {
    None,
    /// `%name%` somewhere at depth zero.
    Dynamic,
    Concat,
    Arithmetic,
    Prefix(String),
}

/// Operators at depth zero, telling concatenation from the rest.
fn classify(tokens: &[Token], depths: &[usize]) -> Operators {
    let mut has_binary = false;
    let mut prev_operand = false;
    let mut prefix: Option<String> = None;
    for (i, tk) in tokens.iter().enumerate() {
        if depths[i] != 0 {
            continue;
        }
        match tk.kind {
            TokenKind::Operator if tk.text == "%" => return Operators::Dynamic,
            TokenKind::Operator => {
                if prev_operand {
                    if tk.text == "." {
                        return Operators::Concat;
                    }
                    has_binary = true;
                    prev_operand = matches!(tk.text.as_str(), "++" | "--");
                } else if i == 0 {
                    prefix = Some(tk.text.to_ascii_lowercase());
                }
            }
            TokenKind::Word if i == 0 && tk.text.eq_ignore_ascii_case("new") => {}
            TokenKind::Word | TokenKind::Number | TokenKind::String => {
                let after_dot = i > 0 && tokens[i - 1].kind == TokenKind::Dot;
                if prev_operand && !after_dot {
                    return Operators::Concat;
                }
                prev_operand = true;
            }
            TokenKind::OpenDelim | TokenKind::OpenBrace => {
                let glued = i > 0 && tokens[i - 1].end() == tk.offset && tk.text != "{";
                if prev_operand && !glued {
                    return Operators::Concat;
                }
            }
            TokenKind::CloseDelim | TokenKind::CloseBrace => prev_operand = true,
            _ => {}
        }
    }
    match (has_binary, prefix) {
        (true, _) => Operators::Arithmetic,
        (false, Some(op)) => Operators::Prefix(op),
        (false, None) => Operators::None,
    }
}
