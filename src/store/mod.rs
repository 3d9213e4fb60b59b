//! Package stores.
//!
//! A store root is a directory laid out as:
//!
//! ```text
//! <root>/
//!     <owner>/<package>.json    descriptor
//!     .objs/<hash>              blobs referenced by leaf hashes
//! ```
//!
//! Several roots may be searched; the first root holding a package wins.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{is_identifier, ContentNode, Package};

/// Name of the store directory looked up in the working directory and its ancestors.
pub const ANCESTOR_STORE_DIR: &str = "data_packages";

const DESCRIPTOR_EXT: &str = "json";

/// Where packages come from.
pub trait PackageStore {
    /// Store root directories, in search order.
    fn store_roots(&self) -> Result<Vec<PathBuf>, StoreError>;

    /// Whether `root` has a directory for `owner`.
    fn owner_dir_exists(&self, root: &Path, owner: &str) -> bool;

    /// Directory of `owner` under `root`.
    fn user_path(&self, root: &Path, owner: &str) -> PathBuf {
        root.join(owner)
    }

    /// Look up `owner/name` across all roots.
    fn find_package(&self, owner: &str, name: &str) -> Result<Option<Package>, StoreError>;
}

/// A store backed by directories on the local file system.
#[derive(Debug, Clone, Default)]
pub struct DirStore {
    roots: Vec<PathBuf>,
}

impl DirStore {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Build the root list from configuration, starting the ancestor search
    /// at the current working directory.
    pub fn discover(config: &Config) -> Result<Self, StoreError> {
        let cwd = std::env::current_dir()?;
        Ok(Self::discover_from(config, &cwd))
    }

    /// Configured dirs, then `data_packages/` in `cwd` and its ancestors
    /// (nearest first), then the user store. Only existing directories are
    /// kept, each once.
    pub fn discover_from(config: &Config, cwd: &Path) -> Self {
        let mut candidates = config.store_dirs.clone();
        if config.search_ancestors {
            candidates.extend(cwd.ancestors().map(|dir| dir.join(ANCESTOR_STORE_DIR)));
        }
        candidates.extend(Self::user_store_dir());

        let mut roots: Vec<PathBuf> = Vec::new();
        for dir in candidates {
            if dir.is_dir() && !roots.contains(&dir) {
                roots.push(dir);
            }
        }
        tracing::debug!("Store roots: {:?}", roots);
        Self { roots }
    }

    /// Per-user store, e.g. `~/.local/share/datans/packages` on Linux.
    pub fn user_store_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "datans")
            .map(|dirs| dirs.data_dir().join("packages"))
    }

    pub fn owner_dir(root: &Path, owner: &str) -> PathBuf {
        root.join(owner)
    }

    pub fn package_path(root: &Path, owner: &str, name: &str) -> PathBuf {
        Self::owner_dir(root, owner).join(format!("{}.{}", name, DESCRIPTOR_EXT))
    }

    /// Owners across all roots, sorted and deduplicated.
    pub fn owners(&self) -> Result<Vec<String>, StoreError> {
        let mut owners = Vec::new();
        for root in self.store_roots()? {
            let entries = match fs::read_dir(&root) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Skipping unreadable store root {}: {}", root.display(), e);
                    continue;
                }
            };
            for entry in entries {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                if let Some(name) = entry.file_name().to_str().filter(|n| is_identifier(n)) {
                    owners.push(name.to_string());
                }
            }
        }
        owners.sort();
        owners.dedup();
        Ok(owners)
    }

    /// Packages of `owner` across all roots, sorted and deduplicated.
    pub fn packages(&self, owner: &str) -> Result<Vec<String>, StoreError> {
        let mut packages = Vec::new();
        if !is_identifier(owner) {
            return Ok(packages);
        }
        for root in self.store_roots()? {
            let dir = Self::owner_dir(&root, owner);
            if !dir.is_dir() {
                continue;
            }
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Skipping unreadable owner dir {}: {}", dir.display(), e);
                    continue;
                }
            };
            for entry in entries {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(DESCRIPTOR_EXT) {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if is_identifier(stem) {
                        packages.push(stem.to_string());
                    }
                }
            }
        }
        packages.sort();
        packages.dedup();
        Ok(packages)
    }

    fn read_descriptor(path: &Path) -> Result<Option<ContentNode>, StoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl PackageStore for DirStore {
    fn store_roots(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut roots = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            if root.is_dir() {
                roots.push(root.clone());
            } else {
                tracing::debug!("Store root {} is not a directory", root.display());
            }
        }
        Ok(roots)
    }

    fn owner_dir_exists(&self, root: &Path, owner: &str) -> bool {
        is_identifier(owner) && Self::owner_dir(root, owner).is_dir()
    }

    fn find_package(&self, owner: &str, name: &str) -> Result<Option<Package>, StoreError> {
        if !is_identifier(owner) || !is_identifier(name) {
            return Ok(None);
        }
        for root in self.store_roots()? {
            let path = Self::package_path(&root, owner, name);
            if !path.is_file() {
                continue;
            }
            if let Some(contents) = Self::read_descriptor(&path)? {
                return Ok(Some(Package::new(owner, name, root, path, contents)));
            }
        }
        Ok(None)
    }
}
