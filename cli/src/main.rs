use std::path::{Component, Path, PathBuf};
use std::sync::Once;

use ahk2_core::token::{Position, Severity};
use ahk2_core::util::cancel::CancelFlag;
use ahk2_core::{EngineConfig, Workspace};
use anyhow::Context;
use clap::{Parser, Subcommand};

#[cfg(test)]
mod main_test;

static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "ahk2::include=info,ahk2::config=info,ahk2_core=info,ahk2_cli=info";

#[derive(Debug, Parser)]
#[command(name = "ahk2", author, version, about = "Static analysis for AutoHotkey v2 scripts", long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,

    /// JSON engine configuration file
    #[arg(long, global = true, value_name = "FILE", value_parser = parse_sanitized_path)]
    config: Option<PathBuf>,

    /// Extra library directory for `#include <lib>`; may repeat
    #[arg(long = "lib", global = true, value_name = "DIR")]
    libs: Vec<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse scripts and their includes, printing diagnostics. Exits 1 on errors.
    Check {
        #[arg(value_name = "FILE", required = true, value_parser = parse_sanitized_path)]
        files: Vec<PathBuf>,
    },
    /// Print the symbol tree of a script as JSON.
    Symbols {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Infer the possible shapes of an expression at a 1-based LINE:COL.
    Infer {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        #[arg(value_name = "LINE:COL", value_parser = parse_position)]
        position: Position,
        #[arg(value_name = "EXPR")]
        expr: String,
    },
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);

    for comp in p.components() {
        if matches!(comp, Component::ParentDir) {
            return Err(anyhow::anyhow!(
                "Parent directory components ('..') are not allowed in file paths."
            ));
        }
    }

    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

/// `LINE:COL`, both 1-based, into a zero-based position.
fn parse_position(raw: &str) -> Result<Position, String> {
    let (line, col) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected LINE:COL, got '{}'", raw))?;
    let parse = |part: &str| match part.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("'{}' is not a positive number", part)),
    };
    Ok(Position::new(parse(line)?, parse(col)?))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn maybe_init_tracing() {
    let raw = match std::env::var("AHK2_TRACE") {
        Ok(value) => value,
        Err(_) => return,
    };
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off")
    {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());
        let builder = fmt().with_writer(std::io::stderr);
        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };
        let _ = builder.try_init();
    });
}

fn load_config(config: Option<&Path>, libs: Vec<PathBuf>) -> anyhow::Result<EngineConfig> {
    let mut engine = match config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    engine.library_dirs.extend(libs);
    Ok(engine)
}

/// Prints every reportable diagnostic; returns whether any of them is an error.
fn run_check(workspace: &Workspace, files: &[PathBuf]) -> anyhow::Result<bool> {
    let mut errors = 0usize;
    let mut warnings = 0usize;
    for file in files {
        let doc = workspace.load_file(file)?;
        for diag in workspace.diagnostics(&doc.key) {
            let level = match diag.severity {
                Severity::Error => {
                    errors += 1;
                    "error"
                }
                Severity::Warning => {
                    warnings += 1;
                    "warning"
                }
            };
            println!("{}:{}: {}: {}", file.display(), doc.analysis.position_of(diag.offset), level, diag.message);
        }
    }
    eprintln!("{} file(s) checked: {} error(s), {} warning(s)", files.len(), errors, warnings);
    Ok(errors > 0)
}

fn run_symbols(workspace: &Workspace, file: &Path, pretty: bool) -> anyhow::Result<()> {
    let doc = workspace.load_file(file)?;
    let json = if pretty {
        serde_json::to_string_pretty(&doc.analysis.symbols)
    } else {
        serde_json::to_string(&doc.analysis.symbols)
    }
    .context("failed to serialize symbols")?;
    println!("{}", json);
    Ok(())
}

fn run_infer(workspace: &Workspace, file: &Path, position: Position, expr: &str) -> anyhow::Result<()> {
    let doc = workspace.load_file(file)?;
    let offset = doc.analysis.offset_of(position);
    let shapes = workspace.infer_expression_type(&doc.key, expr, offset, &CancelFlag::new());
    let names: Vec<String> = shapes.iter().map(ToString::to_string).collect();
    println!("{}", names.join(" | "));
    Ok(())
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();

    let CliArgs { command, config, libs } = CliArgs::parse();
    let workspace = Workspace::new(load_config(config.as_deref(), libs)?);

    match command {
        Commands::Check { files } => {
            if run_check(&workspace, &files)? {
                std::process::exit(1);
            }
        }
        Commands::Symbols { file, pretty } => run_symbols(&workspace, &file, pretty)?,
        Commands::Infer { file, position, expr } => run_infer(&workspace, &file, position, &expr)?,
    }
    Ok(())
}
