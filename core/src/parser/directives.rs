use std::path::{Component, Path, PathBuf};

use super::{Mode, Parser};
use crate::analysis::IncludeEntry;
use crate::token::Token;
use crate::util::document_key;

const LINE_VARIABLES: &[&str] = &["%a_scriptdir%", "%a_workingdir%", "%a_linefile%"];

impl<'o> Parser<'o> {
    /// `#include` and `#includeagain`; other directives carry nothing the tree needs.
    pub(super) fn parse_directive(&mut self, tk: &Token, mode: Mode) {
        let body = tk.text.trim_start_matches('#');
        let (name, rest) = body.split_once(|c: char| c.is_whitespace()).unwrap_or((body, ""));
        if !name.eq_ignore_ascii_case("include") && !name.eq_ignore_ascii_case("includeagain") {
            return;
        }
        if mode != Mode::Script {
            self.warning("#include inside a function or class cannot be scoped", tk.offset, tk.len);
        }

        let mut operand = strip_inline_comment(rest).trim();
        let mut optional = false;
        if operand.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("*i")) {
            optional = true;
            operand = operand[2..].trim_start();
        }
        let operand = strip_quotes(operand);
        let line = self.line_of(tk.offset);

        if operand.is_empty() {
            self.include_dir = self.options.lib_dirs.first().cloned().unwrap_or_else(|| self.options.script_dir.clone());
            self.include_dirs.insert(line, self.include_dir.clone());
            return;
        }

        let resolved = if let Some(lib) = operand.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            self.find_library(lib)
        } else {
            let expanded = self.expand_line_variables(operand).replace('\\', "/");
            let path = PathBuf::from(expanded);
            let path = if path.is_absolute() { path } else { self.include_dir.join(path) };
            match resolve_case_insensitive(&path) {
                Some(dir) if dir.is_dir() => {
                    tracing::debug!(target: "ahk2::include", dir = %dir.display(), "include directory changed");
                    self.include_dir = dir.clone();
                    self.include_dirs.insert(line, dir);
                    return;
                }
                found => found,
            }
        };
        self.include_dirs.insert(line, self.include_dir.clone());

        match resolved {
            Some(path) => {
                tracing::debug!(target: "ahk2::include", path = %path.display(), line, "include resolved");
                self.includes.insert(
                    document_key(&path),
                    IncludeEntry {
                        path,
                        raw: tk.text.clone(),
                        line,
                    },
                );
            }
            None if optional => {}
            None => self.error_at(format!("File not found: \"{}\"", operand), tk),
        }
    }

    /// `<Name>` lookup: `Name.ahk` in each library directory, then the part before the
    /// first `_`.
    fn find_library(&self, name: &str) -> Option<PathBuf> {
        let mut candidates = vec![with_ahk_extension(name)];
        if let Some((prefix, _)) = name.split_once('_') {
            if !prefix.is_empty() {
                candidates.push(with_ahk_extension(prefix));
            }
        }
        candidates.iter().find_map(|file| {
            self.options
                .lib_dirs
                .iter()
                .find_map(|dir| resolve_case_insensitive(&dir.join(file)).filter(|p| p.is_file()))
        })
    }

    fn expand_line_variables(&self, operand: &str) -> String {
        let script_dir = self.options.script_dir.to_string_lossy().into_owned();
        let line_file = self
            .options
            .file
            .as_ref()
            .map_or_else(|| script_dir.clone(), |f| f.to_string_lossy().into_owned());
        let mut out = operand.to_string();
        for var in LINE_VARIABLES {
            let value = if *var == "%a_linefile%" { &line_file } else { &script_dir };
            let mut from = 0;
            while let Some(found) = out[from..].to_ascii_lowercase().find(var) {
                let pos = from + found;
                out.replace_range(pos..pos + var.len(), value);
                from = pos + value.len();
            }
        }
        out
    }
}

fn strip_inline_comment(text: &str) -> &str {
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b';' && (i == 0 || bytes[i - 1] == b' ' || bytes[i - 1] == b'\t') {
            return &text[..i];
        }
    }
    text
}

fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner.trim();
        }
    }
    text
}

fn with_ahk_extension(name: &str) -> String {
    if Path::new(name).extension().is_some() { name.to_string() } else { format!("{}.ahk", name) }
}

/// Finds `path` on disk, matching each component case-insensitively when the exact
/// spelling does not exist.
pub fn resolve_case_insensitive(path: &Path) -> Option<PathBuf> {
    if path.exists() {
        return Some(path.to_path_buf());
    }
    let mut current = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                let exact = current.join(part);
                if exact.exists() {
                    current = exact;
                    continue;
                }
                let wanted = part.to_string_lossy().to_lowercase();
                let dir = if current.as_os_str().is_empty() { PathBuf::from(".") } else { current.clone() };
                let entry = std::fs::read_dir(&dir)
                    .ok()?
                    .filter_map(Result::ok)
                    .find(|e| e.file_name().to_string_lossy().to_lowercase() == wanted)?;
                current = current.join(entry.file_name());
            }
            other => current.push(other.as_os_str()),
        }
    }
    current.exists().then_some(current)
}
