use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::error::{Error, Result};

/// Logging setup for binaries built on this crate.
///
/// `RUST_LOG`, when set, takes precedence over `filter`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: true,
        }
    }
}

impl LogConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(Error::ConfigRead)?;
        Self::from_json(&raw)
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }

    /// Installs the global subscriber. Returns `false` if one was already set.
    pub fn init(&self) -> bool {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(self.env_filter())
            .with_ansi(self.ansi)
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    }
}
