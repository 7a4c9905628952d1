use crate::index::scan::{DEFAULT_EXCLUDE_PATTERNS, DEFAULT_FRAGMENT_PATTERNS};
use crate::lint::sources::DEFAULT_SOURCE_EXTENSIONS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "sidx";
const CONFIG_FILE: &str = "config.json";

/// Per-project config file looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = ".sidx.json";

/// Lint configuration stored in the project or the app data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root of the documented sources; enables the owning-file check
    #[serde(default)]
    pub source_root: Option<PathBuf>,

    /// Extensions collected from the source root (empty means all files)
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Check codes to skip
    #[serde(default)]
    pub disabled_checks: Vec<String>,

    /// Verify that anchor pages exist
    #[serde(default = "default_true")]
    pub check_pages: bool,

    /// Verify that anchor fragments exist inside their pages
    #[serde(default = "default_true")]
    pub check_anchors: bool,

    /// Treat warnings as failures
    #[serde(default)]
    pub deny_warnings: bool,

    /// File name globs that identify fragments
    #[serde(default = "default_fragment_patterns")]
    pub fragment_patterns: Vec<String>,

    /// File name globs excluded from discovery
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_source_extensions() -> Vec<String> {
    DEFAULT_SOURCE_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_fragment_patterns() -> Vec<String> {
    DEFAULT_FRAGMENT_PATTERNS.iter().map(|s| s.to_string()).collect()
}

fn default_exclude_patterns() -> Vec<String> {
    DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_root: None,
            source_extensions: default_source_extensions(),
            disabled_checks: Vec::new(),
            check_pages: default_true(),
            check_anchors: default_true(),
            deny_warnings: false,
            fragment_patterns: default_fragment_patterns(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

impl AppConfig {
    /// Load the project config from `dir`, falling back to the app data
    /// config, falling back to defaults.
    pub fn load(dir: &Path) -> Result<Self> {
        match Self::locate(dir)? {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Path of the config file that [`AppConfig::load`] would read
    pub fn locate(dir: &Path) -> Result<Option<PathBuf>> {
        let project = dir.join(PROJECT_CONFIG_FILE);
        if project.is_file() {
            return Ok(Some(project));
        }

        let global = get_config_path()?;
        if global.is_file() {
            return Ok(Some(global));
        }
        Ok(None)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        // Relative source roots are relative to the config file
        if let (Some(root), Some(parent)) = (config.source_root.as_mut(), path.parent()) {
            if root.is_relative() {
                *root = parent.join(&*root);
            }
        }

        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(path, content + "\n")
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }
}

/// Get the path to the global config file
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_app_data_dir()?.join(CONFIG_FILE))
}

/// Get the application data directory (not created)
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_CONFIG_HOME or ~/.config
        dirs::config_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    Ok(base.join(APP_NAME))
}
