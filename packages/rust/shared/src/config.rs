//! Application configuration for autocat.
//!
//! A project config lives at `./autocat.toml`; a user config at
//! `~/.autocat/autocat.toml`. CLI flags override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CatError, Result};
use crate::types::{AutoCompileSpec, DEFAULT_LABEL_PREFIX};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "autocat.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".autocat";

// ---------------------------------------------------------------------------
// Config structs (matching autocat.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP client settings for remote sources.
    #[serde(default)]
    pub http: HttpConfig,

    /// Discovery specs used when the CLI is given no sources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discover: Vec<AutoCompileSpec>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// String placed between concatenated sources.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Whether to wrap sources in BEGIN/END markers.
    #[serde(default)]
    pub markers: bool,

    /// Label prefix for discovery results.
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,

    /// Glob used when neither files nor `[[discover]]` specs are given.
    #[serde(default = "default_glob")]
    pub default_glob: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            markers: false,
            label_prefix: default_label_prefix(),
            default_glob: default_glob(),
        }
    }
}

fn default_separator() -> String {
    "\n\n".into()
}
fn default_label_prefix() -> String {
    DEFAULT_LABEL_PREFIX.into()
}
fn default_glob() -> String {
    "**/*.cat.*".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds; 0 leaves requests unbounded.
    #[serde(default)]
    pub timeout_secs: u64,

    /// User-Agent sent with remote reads.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    concat!("autocat/", env!("CARGO_PKG_VERSION")).into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.autocat/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CatError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.autocat/autocat.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Find the config file that applies to `cwd`: project first, then user.
pub fn locate_config(cwd: &Path) -> Option<PathBuf> {
    let project = cwd.join(CONFIG_FILE_NAME);
    if project.is_file() {
        return Some(project);
    }
    config_file_path().ok().filter(|p| p.is_file())
}

/// Load the application config for `cwd`. Returns defaults if no file exists.
pub fn load_config(cwd: &Path) -> Result<AppConfig> {
    match locate_config(cwd) {
        Some(path) => load_config_from(&path),
        None => {
            tracing::debug!(cwd = %cwd.display(), "config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CatError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| CatError::config(format!("failed to parse {}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), specs = config.discover.len(), "loaded config");
    Ok(config)
}

/// Create the user config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CatError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CatError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CatError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
