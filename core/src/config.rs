use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::parser::ParseOptions;
use crate::util::fast_map::name_key;

/// How bytes that are neither BOM-marked nor valid UTF-8 are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyEncoding {
    /// Each byte becomes the code point of the same value.
    #[default]
    Latin1,
    /// Refuse the file.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Ordered search list for `#include <lib>`.
    pub library_dirs: Vec<PathBuf>,
    pub legacy_encoding: LegacyEncoding,
    /// Per document cap; 0 keeps every diagnostic.
    pub max_diagnostics: usize,
    /// Extra names that are never recorded as variable references.
    pub builtin_variables: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            library_dirs: Vec::new(),
            legacy_encoding: LegacyEncoding::Latin1,
            max_diagnostics: 0,
            builtin_variables: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid engine configuration")
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))?;
        tracing::debug!(target: "ahk2::config", path = %path.display(), libs = config.library_dirs.len(), "config loaded");
        Ok(config)
    }

    /// Parser inputs for the script at `path`.
    pub fn parse_options(&self, path: Option<&Path>) -> ParseOptions {
        let script_dir = path
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        ParseOptions {
            file: path.map(Path::to_path_buf),
            script_dir,
            lib_dirs: self.library_dirs.clone(),
            extra_builtins: self
                .builtin_variables
                .iter()
                .map(|name| name_key(name).into_owned())
                .collect(),
            max_diagnostics: self.max_diagnostics,
        }
    }
}
