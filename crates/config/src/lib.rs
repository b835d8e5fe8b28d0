//! CLI flags and YAML config file loading, producing the `ServiceConfig`
//! the core depends on (spec §6). Mirrors the teacher's `clap`-derive CLI
//! (see `testnet`'s `Cli`), plus a YAML layer for everything not worth
//! re-typing as a flag on every invocation.

use std::path::{Path, PathBuf};

use anchor_types::ServiceConfig;
use clap::Parser;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: serde_yaml::Error },
}

/// Anchor node CLI flags.
#[derive(Parser, Debug)]
#[clap(about = "DID anchoring node")]
pub struct Cli {
    /// Path to a YAML file overriding the default `ServiceConfig`.
    #[clap(short, long, default_value = "anchor.yaml")]
    pub config: PathBuf,

    /// Port the resolver's minimal HTTP surface listens on.
    #[clap(short, long, default_value_t = 8080)]
    pub port: u16,

    /// `tracing_subscriber::EnvFilter` directive, overridable via `RUST_LOG`.
    #[clap(long, default_value = "info")]
    pub log_filter: String,
}

/// Load `ServiceConfig` from `path` if it exists, falling back to
/// `ServiceConfig::default()` otherwise. A present-but-malformed file is an
/// error rather than a silent fallback.
pub fn load_service_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    if !path.exists() {
        return Ok(ServiceConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}
