//! One parsed source document and the decoding that precedes parsing.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::bail;

use crate::analysis::Analysis;
use crate::config::LegacyEncoding;
use crate::parser::{ParseOptions, Parser};

/// A document as held by the [`Workspace`](crate::workspace::Workspace).
#[derive(Debug, Clone)]
pub struct Document {
    /// Lower-cased path or URI.
    pub key: String,
    pub path: Option<PathBuf>,
    pub text: String,
    pub version: i32,
    /// Loaded only because another document includes it.
    pub dependency: bool,
    pub analysis: Analysis,
}

/// Decodes raw file bytes. A BOM selects UTF-16LE or UTF-8; otherwise the bytes must be
/// UTF-8 or are decoded with the legacy fallback.
pub fn decode_source(bytes: &[u8], legacy: LegacyEncoding) -> anyhow::Result<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        if rest.len() % 2 != 0 {
            bail!("truncated UTF-16LE input");
        }
        let units: Vec<u16> = rest.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect();
        return Ok(String::from_utf16(&units)?);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return Ok(String::from_utf8(rest.to_vec())?);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(err) => match legacy {
            LegacyEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            LegacyEncoding::Strict => bail!("source is not valid UTF-8: {}", err),
        },
    }
}

/// Parses `text`. A panic inside the parser yields an empty tree with one error.
pub fn parse_document(text: &str, options: &ParseOptions) -> Analysis {
    guarded_parse(text, options, || Parser::new(text, options).parse())
}

/// Runs `parse`, turning a panic into `Analysis::failed` for `text`.
pub(crate) fn guarded_parse(text: &str, options: &ParseOptions, parse: impl FnOnce() -> Analysis) -> Analysis {
    let started = Instant::now();
    match catch_unwind(AssertUnwindSafe(parse)) {
        Ok(analysis) => {
            tracing::debug!(
                target: "ahk2::parse",
                file = ?options.file,
                symbols = analysis.symbols.len(),
                diagnostics = analysis.diagnostics.len(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "document parsed"
            );
            analysis
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(target: "ahk2::parse", file = ?options.file, %reason, "parser panicked");
            Analysis::failed(text, format!("Internal parser error: {}", reason))
        }
    }
}
