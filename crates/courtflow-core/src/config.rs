use crate::error::{CourtflowError, Result};
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Validation findings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl WarnLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarnLevel::Warning => "warning",
            WarnLevel::Error => "error",
        }
    }
}

/// A problem found in `config.yaml`. Errors stop commands that need the
/// store; warnings are only reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// StoreBackend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreBackend {
    /// redb file, relative paths resolve against the project root.
    Local {
        #[serde(default = "default_store_path")]
        path: PathBuf,
    },
    /// PostgREST-compatible backend. `COURTFLOW_API_KEY` overrides `api_key`.
    Remote {
        url: String,
        #[serde(default)]
        api_key: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// Nothing survives the process; useful for dry runs.
    Memory,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_STORE_FILE)
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Local {
            path: default_store_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    #[serde(default = "default_organization_name")]
    pub organization_name: String,
    #[serde(default)]
    pub store: StoreBackend,
}

fn default_organization_name() -> String {
    "My Team".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            organization_name: default_organization_name(),
            store: StoreBackend::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        io::read_yaml(&paths::config_path(root))?.ok_or(CourtflowError::NotInitialized)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        io::write_yaml(&paths::config_path(root), self)
    }

    /// Copy safe to print: a configured API key is masked.
    pub fn redacted(&self) -> Config {
        let mut shown = self.clone();
        if let StoreBackend::Remote { api_key, .. } = &mut shown.store {
            if !api_key.is_empty() {
                *api_key = "<redacted>".to_string();
            }
        }
        shown
    }

    /// Findings, most severe first.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut found = Vec::new();
        if self.organization_name.trim().is_empty() {
            found.push(ConfigWarning::warning(
                "organization_name is empty; new organizations will be unnamed",
            ));
        }
        if let StoreBackend::Remote { url, api_key, .. } = &self.store {
            let url = url.trim();
            if url.is_empty() {
                found.push(ConfigWarning::error(
                    "store.url is required for the remote backend",
                ));
            } else if !(url.starts_with("http://") || url.starts_with("https://")) {
                found.push(ConfigWarning::error(format!(
                    "store.url '{url}' must start with http:// or https://"
                )));
            }
            if api_key.is_empty() && std::env::var("COURTFLOW_API_KEY").is_err() {
                found.push(ConfigWarning::warning(
                    "store.api_key is empty and COURTFLOW_API_KEY is unset",
                ));
            }
        }
        found.sort_by(|a, b| b.level.cmp(&a.level));
        found
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
