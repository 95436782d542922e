//! Store configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quotagrid_core::traits::SpecificationStore;
use quotagrid_core::validate::Tolerance;

use crate::file::FileStore;
use crate::http::HttpStore;
use crate::mock::MemoryStore;

/// Configuration for a single store.
///
/// Note: Custom Debug impl masks the API token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Http {
        base_url: String,
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        role: Option<String>,
    },
    File {
        #[serde(default = "default_snapshot_dir")]
        dir: PathBuf,
    },
    Memory,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Http {
                base_url,
                token,
                role,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("token", &token.as_ref().map(|_| "***"))
                .field("role", role)
                .finish(),
            StoreConfig::File { dir } => f.debug_struct("File").field("dir", dir).finish(),
            StoreConfig::Memory => f.write_str("Memory"),
        }
    }
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("./quotagrid-data")
}

/// Top-level quotagrid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotagridConfig {
    /// Store configurations keyed by name.
    #[serde(default)]
    pub stores: HashMap<String, StoreConfig>,
    /// Store used when none is named on the command line.
    #[serde(default = "default_store")]
    pub default_store: String,
    /// Maximum deviation, in items, a submitted grid may have.
    #[serde(default)]
    pub tolerance: Tolerance,
}

fn default_store() -> String {
    "local".to_string()
}

impl Default for QuotagridConfig {
    fn default() -> Self {
        Self {
            stores: HashMap::new(),
            default_store: default_store(),
            tolerance: Tolerance::default(),
        }
    }
}

impl QuotagridConfig {
    /// Look up a store by name, falling back to `default_store`.
    pub fn store(&self, name: Option<&str>) -> Result<(&str, &StoreConfig)> {
        let name = name.unwrap_or(&self.default_store);
        self.stores
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .with_context(|| {
                let mut known: Vec<&str> = self.stores.keys().map(String::as_str).collect();
                known.sort_unstable();
                format!("unknown store '{name}' (configured: {})", known.join(", "))
            })
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + end]).unwrap_or_default();
        result.replace_range(start..start + end + 1, &value);
    }
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Http {
            base_url,
            token,
            role,
        } => StoreConfig::Http {
            base_url: resolve_env_vars(base_url),
            token: token.as_deref().map(resolve_env_vars),
            role: role.as_deref().map(resolve_env_vars),
        },
        StoreConfig::File { dir } => StoreConfig::File {
            dir: PathBuf::from(resolve_env_vars(&dir.to_string_lossy())),
        },
        StoreConfig::Memory => StoreConfig::Memory,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quotagrid.toml` in the current directory
/// 2. `~/.config/quotagrid/config.toml`
///
/// `QUOTAGRID_API_TOKEN` overrides the token of every HTTP store.
pub fn load_config() -> Result<QuotagridConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuotagridConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("quotagrid.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuotagridConfig::default(),
    };

    if let Ok(token) = std::env::var("QUOTAGRID_API_TOKEN") {
        for store in config.stores.values_mut() {
            if let StoreConfig::Http { token: slot, .. } = store {
                *slot = Some(token.clone());
            }
        }
    }

    Ok(config)
}

/// Parse a config document and resolve `${VAR}` references in store settings.
pub fn parse_config(content: &str) -> Result<QuotagridConfig> {
    let mut config: QuotagridConfig = toml::from_str(content)?;
    config.stores = config
        .stores
        .iter()
        .map(|(k, v)| (k.clone(), resolve_store_config(v)))
        .collect();
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quotagrid"))
}

/// Create a store instance from its configuration.
pub fn create_store(config: &StoreConfig) -> Result<Box<dyn SpecificationStore>> {
    match config {
        StoreConfig::Http {
            base_url,
            token,
            role,
        } => Ok(Box::new(HttpStore::new(
            base_url,
            token.clone(),
            role.clone(),
        )?)),
        StoreConfig::File { dir } => Ok(Box::new(FileStore::new(dir.clone()))),
        StoreConfig::Memory => Ok(Box::new(MemoryStore::new())),
    }
}
