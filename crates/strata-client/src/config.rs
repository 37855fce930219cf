//! Client configuration
//!
//! Loaded from TOML or built in code:
//!
//! ```toml
//! endpoint = "https://lab.example.org/api/query/"
//! field_naming = "camel_case"
//! timeout_secs = 60
//! encoding = "json"
//!
//! [defaults]
//! follow_fks = true
//! ```

use crate::args::RequestArgs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use strata_core::FieldNaming;
use thiserror::Error;

/// Errors loading client configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How request arguments are encoded in the POST body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyEncoding {
    /// `application/x-www-form-urlencoded`
    #[default]
    Form,
    /// `application/json`
    Json,
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Query endpoint URL
    pub endpoint: String,
    /// Client-wide request arguments, layered under per-call params
    pub defaults: RequestArgs,
    /// Naming convention for entity fields and relationship names
    pub field_naming: FieldNaming,
    /// Per-request timeout for the HTTP transport
    pub timeout_secs: u64,
    pub encoding: BodyEncoding,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/api/query/".to_string(),
            defaults: RequestArgs::new(),
            field_naming: FieldNaming::Verbatim,
            timeout_secs: 30,
            encoding: BodyEncoding::Form,
            user_agent: concat!("strata/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Config for `endpoint` with every other setting at its default.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), endpoint = %config.endpoint, "loaded client config");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
