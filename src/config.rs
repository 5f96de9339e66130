//! Configuration for the shell worker and the backend client.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn default_cache_name() -> String {
    "kukaya-shell".to_string()
}

const fn default_cache_version() -> u32 {
    1
}

fn default_asset_set() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/offline.html",
        "/static/css/app.css",
        "/static/js/app.js",
        "/static/js/auth.js",
        "/static/icons/icon-192.png",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_offline_page() -> String {
    "/offline.html".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000/api/".to_string()
}

/// Configuration for the shell worker.
///
/// The asset set and the generation identifier (name plus version) are the
/// only knobs the cache controller itself consumes; the rest configures
/// rollout eagerness and the backend origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Base name of the cache.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,
    /// Version marker; bumping it starts a new generation.
    #[serde(default = "default_cache_version")]
    pub cache_version: u32,
    /// Paths that must all be cached for the app shell to boot offline.
    #[serde(default = "default_asset_set")]
    pub asset_set: Vec<String>,
    /// Page served to failed navigations with no cached entry.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,
    /// Whether a fresh install requests activation immediately instead of
    /// waiting for prior generations to be released.
    #[serde(default = "default_true")]
    pub eager_takeover: bool,
    /// Whether activation claims open clients without a reload.
    #[serde(default = "default_true")]
    pub claim_clients: bool,
    /// Origin of the backend API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            cache_version: default_cache_version(),
            asset_set: default_asset_set(),
            offline_page: default_offline_page(),
            eager_takeover: true,
            claim_clients: true,
            api_base_url: default_api_base_url(),
        }
    }
}

impl ShellConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current generation identifier.
    #[must_use]
    pub fn generation(&self) -> String {
        format!("{}-v{}", self.cache_name, self.cache_version)
    }

    /// Sets the cache name.
    #[must_use]
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    /// Sets the cache version.
    #[must_use]
    pub const fn with_cache_version(mut self, version: u32) -> Self {
        self.cache_version = version;
        self
    }

    /// Replaces the asset set.
    #[must_use]
    pub fn with_asset_set<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.asset_set = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the offline fallback page.
    #[must_use]
    pub fn with_offline_page(mut self, path: impl Into<String>) -> Self {
        self.offline_page = path.into();
        self
    }

    /// Sets whether install requests immediate activation.
    #[must_use]
    pub const fn with_eager_takeover(mut self, eager: bool) -> Self {
        self.eager_takeover = eager;
        self
    }

    /// Sets whether activation claims open clients.
    #[must_use]
    pub const fn with_claim_clients(mut self, claim: bool) -> Self {
        self.claim_clients = claim;
        self
    }

    /// Sets the backend API origin.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Loads configuration from the default location, falling back to
    /// defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error only when a file exists but cannot be parsed.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Default configuration file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kukaya")
            .join("shell.toml")
    }
}
