//! Registry of parsed documents and the query surface over it.
//!
//! Each document lives in the map as an `Arc<Document>`; a reparse builds a new
//! [`Document`] and swaps it in, so queries always work on a complete snapshot.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::config::EngineConfig;
use crate::document::{Document, decode_source, parse_document};
use crate::infer::{Shapes, TypeInference};
use crate::parser::ParseOptions;
use crate::resolve::Resolver;
use crate::symbol::{Symbol, SymbolKind};
use crate::token::{Diagnostic, Token};
use crate::util::cancel::CancelFlag;
use crate::util::document_key;
use crate::util::fast_map::{FastHashSet, fast_hash_set_new};

/// Member lookup for foreign (COM) objects, answered by the host environment.
pub trait HostIntrospection: Send + Sync {
    fn member_names<'a>(&'a self, prog_id: &'a str) -> BoxFuture<'a, Vec<String>>;
}

/// Documents a query may look at, held alive for the duration of the query.
struct Snapshot {
    primary: Arc<Document>,
    includes: Vec<Arc<Document>>,
    project: Vec<Arc<Document>>,
}

impl Snapshot {
    fn resolver(&self, cancel: CancelFlag) -> Resolver<'_> {
        Resolver::new(&self.primary.analysis)
            .with_includes(self.includes.iter().map(|d| &d.analysis))
            .with_project(self.project.iter().map(|d| &d.analysis))
            .with_cancel(cancel)
    }
}

pub struct Workspace {
    config: EngineConfig,
    documents: DashMap<String, Arc<Document>>,
    host: Option<Arc<dyn HostIntrospection>>,
}

impl Workspace {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            documents: DashMap::new(),
            host: None,
        }
    }

    pub fn with_host(mut self, host: Arc<dyn HostIntrospection>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parses `text` as an open document and loads the files it includes.
    pub fn open(&self, uri: &str, path: Option<PathBuf>, text: String, version: i32) -> Arc<Document> {
        let options = self.config.parse_options(path.as_deref());
        let doc = self.publish(uri, path, text, version, false, &options);
        self.load_includes(&doc, &options);
        doc
    }

    /// Reparses an open document with new text. Returns `None` for unknown documents.
    pub fn update(&self, uri: &str, text: String, version: i32) -> Option<Arc<Document>> {
        let previous = self.get(uri)?;
        let options = self.config.parse_options(previous.path.as_deref());
        let doc = self.publish(uri, previous.path.clone(), text, version, previous.dependency, &options);
        self.load_includes(&doc, &options);
        Some(doc)
    }

    /// Reads, decodes and opens the file at `path`.
    pub fn load_file(&self, path: &Path) -> anyhow::Result<Arc<Document>> {
        let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let text = decode_source(&bytes, self.config.legacy_encoding)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        Ok(self.open(&document_key(path), Some(path.to_path_buf()), text, 0))
    }

    /// Parses off the async executor and publishes the result.
    pub async fn update_in_background(self: Arc<Self>, uri: String, text: String, version: i32) -> Option<Arc<Document>> {
        tokio::task::spawn_blocking(move || self.update(&uri, text, version)).await.ok().flatten()
    }

    /// Removes a document, then every dependency no open document still includes.
    pub fn close(&self, uri: &str) {
        self.documents.remove(&name_of(uri));
        let mut reachable: FastHashSet<String> = fast_hash_set_new();
        let roots: Vec<Arc<Document>> = self
            .documents
            .iter()
            .filter(|entry| !entry.value().dependency)
            .map(|entry| entry.value().clone())
            .collect();
        for root in roots {
            reachable.insert(root.key.clone());
            for dep in self.includes_of(&root) {
                reachable.insert(dep.key.clone());
            }
        }
        self.documents.retain(|key, doc| !doc.dependency || reachable.contains(key));
    }

    pub fn clear(&self) {
        self.documents.clear();
    }

    pub fn get(&self, uri: &str) -> Option<Arc<Document>> {
        self.documents.get(&name_of(uri)).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Diagnostics to report for a document; none for include-only dependencies.
    pub fn diagnostics(&self, uri: &str) -> Vec<Diagnostic> {
        match self.get(uri) {
            Some(doc) if !doc.dependency => doc.analysis.diagnostics.clone(),
            _ => Vec::new(),
        }
    }

    pub fn find_symbol_at(&self, uri: &str, name: &str, offset: usize, kinds: Option<&[SymbolKind]>) -> Option<Symbol> {
        let snapshot = self.snapshot(uri)?;
        let resolver = snapshot.resolver(CancelFlag::default());
        resolver.find_symbol(name, offset, kinds).cloned()
    }

    pub fn scope_children_at(&self, uri: &str, offset: usize) -> Vec<Symbol> {
        let Some(snapshot) = self.snapshot(uri) else {
            return Vec::new();
        };
        let resolver = snapshot.resolver(CancelFlag::default());
        resolver.scope_children_at(offset).into_iter().cloned().collect()
    }

    /// Members of the class named `class` (dotted) as seen from `uri`.
    pub fn class_members(&self, uri: &str, class: &str, static_only: bool) -> BTreeMap<String, Symbol> {
        let Some(snapshot) = self.snapshot(uri) else {
            return BTreeMap::new();
        };
        let resolver = snapshot.resolver(CancelFlag::default());
        let Some(symbol) = resolver.find_class(class) else {
            return BTreeMap::new();
        };
        resolver
            .class_members(symbol, static_only)
            .into_iter()
            .map(|(key, member)| (key, member.clone()))
            .collect()
    }

    pub fn infer_expression_type(&self, uri: &str, expr: &str, offset: usize, cancel: &CancelFlag) -> Shapes {
        let Some(snapshot) = self.snapshot(uri) else {
            return Shapes::new();
        };
        let resolver = snapshot.resolver(cancel.clone());
        let mut inference = TypeInference::new(&resolver);
        inference.infer(expr, offset)
    }

    pub fn token_at(&self, uri: &str, offset: usize) -> Option<Token> {
        self.get(uri)?.analysis.token_at(offset).cloned()
    }

    /// Member names of a foreign object, empty without a host or once cancelled.
    pub async fn foreign_members(&self, prog_id: &str, cancel: &CancelFlag) -> Vec<String> {
        let Some(host) = self.host.as_ref() else {
            return Vec::new();
        };
        if cancel.is_cancelled() {
            return Vec::new();
        }
        let names = host.member_names(prog_id).await;
        if cancel.is_cancelled() {
            tracing::debug!(target: "ahk2::resolve", prog_id, "foreign member lookup cancelled");
            return Vec::new();
        }
        names
    }

    fn publish(
        &self,
        uri: &str,
        path: Option<PathBuf>,
        text: String,
        version: i32,
        dependency: bool,
        options: &ParseOptions,
    ) -> Arc<Document> {
        let key = name_of(uri);
        let analysis = parse_document(&text, options);
        let doc = Arc::new(Document {
            key: key.clone(),
            path,
            text,
            version,
            dependency,
            analysis,
        });
        self.documents.insert(key, doc.clone());
        doc
    }

    /// Parses every file `doc` includes, transitively, that is not loaded yet.
    fn load_includes(&self, doc: &Document, options: &ParseOptions) {
        let mut queue: VecDeque<(String, PathBuf)> = doc
            .analysis
            .includes
            .iter()
            .map(|(key, entry)| (key.clone(), entry.path.clone()))
            .collect();
        while let Some((key, path)) = queue.pop_front() {
            if self.documents.contains_key(&key) {
                continue;
            }
            let text = match std::fs::read(&path)
                .map_err(anyhow::Error::from)
                .and_then(|bytes| decode_source(&bytes, self.config.legacy_encoding))
            {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(target: "ahk2::include", path = %path.display(), error = %err, "include not loaded");
                    continue;
                }
            };
            let dep_options = ParseOptions {
                file: Some(path.clone()),
                ..options.clone()
            };
            let dep = self.publish(&key, Some(path), text, 0, true, &dep_options);
            tracing::debug!(target: "ahk2::include", key = %dep.key, includes = dep.analysis.includes.len(), "dependency loaded");
            queue.extend(dep.analysis.includes.iter().map(|(k, e)| (k.clone(), e.path.clone())));
        }
    }

    /// Loaded documents `doc` includes, transitively, in discovery order.
    fn includes_of(&self, doc: &Document) -> Vec<Arc<Document>> {
        let mut seen: FastHashSet<String> = fast_hash_set_new();
        seen.insert(doc.key.clone());
        let mut out = Vec::new();
        let mut queue: VecDeque<String> = doc.analysis.includes.keys().cloned().collect();
        while let Some(key) = queue.pop_front() {
            if !seen.insert(key.clone()) {
                continue;
            }
            if let Some(dep) = self.get(&key) {
                queue.extend(dep.analysis.includes.keys().cloned());
                out.push(dep);
            }
        }
        out
    }

    fn snapshot(&self, uri: &str) -> Option<Snapshot> {
        let primary = self.get(uri)?;
        let includes = self.includes_of(&primary);
        let in_scope: FastHashSet<&str> = std::iter::once(primary.key.as_str())
            .chain(includes.iter().map(|d| d.key.as_str()))
            .collect();
        let project = self
            .documents
            .iter()
            .filter(|entry| !in_scope.contains(entry.key().as_str()))
            .map(|entry| entry.value().clone())
            .collect();
        Some(Snapshot {
            primary,
            includes,
            project,
        })
    }
}

/// Registry key: case-insensitive with forward slashes.
fn name_of(uri: &str) -> String {
    document_key(Path::new(uri))
}
