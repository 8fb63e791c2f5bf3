//! Client configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/directup/config.toml`
//! - Windows: `%APPDATA%/directup/config.toml`
//!
//! Values are resolved per call: command-line flag, then environment
//! (`DIRECTUP_BACKEND_URL`, `DIRECTUP_TOKEN`), then the file, then defaults.

use std::path::{Path, PathBuf};

use directup_broker::Credential;
use serde::{Deserialize, Serialize};

pub const BACKEND_URL_ENV: &str = "DIRECTUP_BACKEND_URL";
pub const TOKEN_ENV: &str = "DIRECTUP_TOKEN";

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the upload URL broker.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Bearer token from the identity provider. Usually supplied through
    /// the environment instead of the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Upload body chunk size in KiB (one progress update per chunk).
    #[serde(default = "default_chunk_kib")]
    pub chunk_kib: usize,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8081".into()
}

fn default_chunk_kib() -> usize {
    256
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            token: None,
            chunk_kib: default_chunk_kib(),
        }
    }
}

/// Effective settings after applying flags and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub backend_url: String,
    pub credential: Option<Credential>,
    pub chunk_size: usize,
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // The file may hold a token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Applies flag and environment overrides.
    pub fn resolve(
        &self,
        backend_url: Option<&str>,
        token: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Settings {
        let backend_url = backend_url
            .map(str::to_string)
            .or_else(|| env(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| self.backend_url.clone());

        let env_token = env(TOKEN_ENV);
        let credential = token
            .and_then(|t| Credential::from_optional(Some(t)))
            .or_else(|| Credential::from_optional(env_token.as_deref()))
            .or_else(|| Credential::from_optional(self.token.as_deref()));

        Settings {
            backend_url,
            credential,
            chunk_size: self.chunk_kib.max(1) * 1024,
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("directup").join("config.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("directup")
            .join("config.toml"))
    }
}
