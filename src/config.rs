use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::Deserialize;

const APP_NAME: &str = "datans";
const CONFIG_FILE: &str = "config.json";

/// Root prefix under which packages are addressed.
pub const DEFAULT_ROOT: &str = "datans.data";

/// Platform path list of extra store directories, searched before configured ones.
pub const STORE_PATH_ENV: &str = "DATANS_STORE_PATH";
/// Overrides [`Config::root`].
pub const ROOT_ENV: &str = "DATANS_ROOT";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store directories searched first, in order.
    pub store_dirs: Vec<PathBuf>,
    /// Also search `data_packages/` in the working directory and its ancestors.
    pub search_ancestors: bool,
    /// Dotted root prefix, e.g. `datans.data`.
    pub root: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dirs: Vec::new(),
            search_ancestors: true,
            root: DEFAULT_ROOT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides.
    /// Falls back to defaults if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        let config = match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_env()
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Apply `DATANS_STORE_PATH` and `DATANS_ROOT`.
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var_os(STORE_PATH_ENV),
            std::env::var(ROOT_ENV).ok(),
        )
    }

    fn with_overrides(mut self, store_path: Option<std::ffi::OsString>, root: Option<String>) -> Self {
        if let Some(paths) = store_path {
            let mut dirs: Vec<PathBuf> = std::env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            dirs.append(&mut self.store_dirs);
            self.store_dirs = dirs;
        }
        if let Some(root) = root.filter(|r| !r.is_empty()) {
            self.root = root;
        }
        self
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
