pub mod analysis;
pub mod builtins;
pub mod config;
pub mod document;
pub mod infer;
pub mod parser;
pub mod resolve;
pub mod symbol;
pub mod token;
pub mod util;
pub mod workspace;

#[cfg(test)]
mod config_test;

pub use analysis::Analysis;
pub use config::EngineConfig;
pub use document::{Document, parse_document};
pub use infer::{Shape, Shapes};
pub use workspace::Workspace;
