//! PyPI JSON index client for pypkgbuild.
//!
//! This crate is the network edge of the tool: it fetches the JSON metadata
//! document for a module (optionally pinned to an exact version) and opens
//! source-archive byte streams for downstream inspection. Module-not-found and
//! version-not-found are distinct, user-correctable conditions and get their
//! own error variants.

pub mod client;

pub use client::{Client, DEFAULT_INDEX_URL};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("{0}")]
    ModuleNotFound(String),
    #[error("{module} {version}")]
    VersionNotFound { module: String, version: String },
    #[error("malformed index document: missing key '{0}'")]
    Malformed(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("invalid JSON from index: {0}")]
    Json(#[from] serde_json::Error),
}
