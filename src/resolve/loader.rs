use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::cache::{Module, NamespaceModule, ResolutionCache};
use super::materialize::materialize;
use crate::error::ResolveError;
use crate::models::{Container, Package};

/// Loads the placeholder for an owner directory.
#[derive(Debug, Clone)]
pub struct OwnerLoader {
    location: PathBuf,
}

impl OwnerLoader {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// The cached unit for `fullname`, or a new empty namespace.
    pub fn load(&self, cache: &ResolutionCache, fullname: &str) -> Module {
        cache.get_or_insert_with(fullname, || {
            Module::Namespace(Arc::new(NamespaceModule {
                name: fullname.to_string(),
                location: self.location.clone(),
            }))
        })
    }
}

/// Loads a package, materializing its tree on first use.
#[derive(Debug, Clone)]
pub struct PackageLoader {
    package: Arc<Package>,
}

impl PackageLoader {
    pub fn new(package: Package) -> Self {
        Self {
            package: Arc::new(package),
        }
    }

    pub fn package(&self) -> &Arc<Package> {
        &self.package
    }

    pub fn location(&self) -> &Path {
        self.package.location()
    }

    /// The cached object for `fullname`; otherwise materialize the package,
    /// cache the tree and return it.
    pub fn load(&self, cache: &ResolutionCache, fullname: &str) -> Result<Module, ResolveError> {
        cache.get_or_try_insert_with(fullname, || {
            let root = materialize(&self.package)?;
            tracing::info!(
                "Materialized {} from {} ({} top-level entries)",
                fullname,
                self.package.location().display(),
                root.children().len()
            );
            Ok(Module::Package(Arc::new(root)))
        })
    }
}
