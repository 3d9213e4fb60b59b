use std::path::PathBuf;
use std::sync::Arc;

use super::cache::{Member, Module, ResolutionCache};
use super::loader::{OwnerLoader, PackageLoader};
use crate::config::Config;
use crate::error::ResolveError;
use crate::intercept::{IoTable, VFS_OPENERS};
use crate::models::{is_identifier, Container, Node, SymbolicPath};
use crate::store::{DirStore, PackageStore};

/// First-segment prefix selecting virtual file-system mode.
pub const VFS_MARKER: &str = "vfs__";

/// Outcome of dispatching a name.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Not ours; the caller should keep looking elsewhere.
    NotApplicable,
    Owner(OwnerLoader),
    Package(PackageLoader),
}

impl Resolution {
    pub fn is_applicable(&self) -> bool {
        !matches!(self, Resolution::NotApplicable)
    }
}

/// Resolves names under a root prefix against a package store.
///
/// Below the root, one segment names an owner and two name a package.
/// Resolved modules are kept in the resolver's [`ResolutionCache`], so
/// importing the same name twice yields the same instance.
#[derive(Debug)]
pub struct Resolver<S = DirStore> {
    store: S,
    root: SymbolicPath,
    cache: ResolutionCache,
    io: Arc<IoTable>,
}

impl Resolver<DirStore> {
    /// A resolver over the stores and root named by `config`.
    pub fn from_config(config: &Config) -> Result<Self, ResolveError> {
        let store = DirStore::discover(config)?;
        Self::new(store, &config.root)
    }
}

impl<S: PackageStore> Resolver<S> {
    pub fn new(store: S, root: &str) -> Result<Self, ResolveError> {
        Ok(Self {
            store,
            root: SymbolicPath::parse(root)?,
            cache: ResolutionCache::new(),
            io: Arc::new(IoTable::with_defaults()),
        })
    }

    /// Use `io` as the redirection table activated in virtual file-system mode.
    pub fn with_io(mut self, io: Arc<IoTable>) -> Self {
        self.io = io;
        self
    }

    pub fn root(&self) -> &SymbolicPath {
        &self.root
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn io(&self) -> &Arc<IoTable> {
        &self.io
    }

    /// Classify `fullname`. The search path is accepted for hook
    /// compatibility and not consulted; locations come from the store.
    pub fn find(
        &self,
        fullname: &str,
        _search_path: Option<&[PathBuf]>,
    ) -> Result<Resolution, ResolveError> {
        let path = match SymbolicPath::parse(fullname) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("Not resolving '{}': {}", fullname, e);
                return Ok(Resolution::NotApplicable);
            }
        };
        match path.strip_prefix(&self.root) {
            Some(rest) => self.find_path(&rest),
            None => Ok(Resolution::NotApplicable),
        }
    }

    /// Classify a path relative to the root.
    pub fn find_path(&self, rest: &SymbolicPath) -> Result<Resolution, ResolveError> {
        let rest = match rest.first().strip_prefix(VFS_MARKER) {
            Some(owner) => {
                self.activate_vfs()?;
                if !is_identifier(owner) {
                    return Ok(Resolution::NotApplicable);
                }
                rest.clone().with_first(owner)
            }
            None => rest.clone(),
        };

        match rest.segments() {
            [owner] => {
                for root in self.store.store_roots()? {
                    if self.store.owner_dir_exists(&root, owner) {
                        let location = self.store.user_path(&root, owner);
                        tracing::debug!("Owner {} found at {}", owner, location.display());
                        return Ok(Resolution::Owner(OwnerLoader::new(location)));
                    }
                }
                Ok(Resolution::NotApplicable)
            }
            [owner, name] => match self.store.find_package(owner, name)? {
                Some(package) => {
                    tracing::debug!(
                        "Package {}.{} found at {}",
                        owner,
                        name,
                        package.location().display()
                    );
                    Ok(Resolution::Package(PackageLoader::new(package)))
                }
                None => Ok(Resolution::NotApplicable),
            },
            _ => Ok(Resolution::NotApplicable),
        }
    }

    /// Resolve `fullname` the way an importer would: cached modules are
    /// returned as-is, parents are resolved before children, and names
    /// below a package are looked up in its tree.
    ///
    /// `Ok(None)` means the name is not ours or does not exist.
    pub fn import(&self, fullname: &str) -> Result<Option<Module>, ResolveError> {
        if let Some(module) = self.cache.get(fullname) {
            return Ok(Some(module));
        }
        let Ok(path) = SymbolicPath::parse(fullname) else {
            return Ok(None);
        };
        let Some(rest) = path.strip_prefix(&self.root) else {
            return Ok(None);
        };

        let package_depth = self.root.depth() + 2;
        if rest.depth() > 2 {
            return self.import_member(&path, package_depth);
        }
        if rest.depth() == 2 {
            if let Some(parent) = path.truncate(path.depth() - 1) {
                if self.import(&parent.to_dotted())?.is_none() {
                    return Ok(None);
                }
            }
        }

        match self.find(fullname, None)? {
            Resolution::NotApplicable => Ok(None),
            Resolution::Owner(loader) => Ok(Some(loader.load(&self.cache, fullname))),
            Resolution::Package(loader) => loader.load(&self.cache, fullname).map(Some),
        }
    }

    fn import_member(
        &self,
        path: &SymbolicPath,
        package_depth: usize,
    ) -> Result<Option<Module>, ResolveError> {
        let Some(package_path) = path.truncate(package_depth) else {
            return Ok(None);
        };
        let package_name = package_path.to_dotted();
        let Some(Module::Package(package)) = self.import(&package_name)? else {
            return Ok(None);
        };

        let members = path.segments()[package_depth..].to_vec();
        let mut node: Option<&Node> = None;
        for (i, name) in members.iter().enumerate() {
            let next = match node {
                None => package.child(name),
                Some(parent) => parent.child(name),
            };
            node = Some(next.ok_or_else(|| ResolveError::MemberNotFound {
                package: package_name.clone(),
                name: members[..=i].join("."),
            })?);
        }
        Ok(Some(Module::Member(Member::new(package, members))))
    }

    fn activate_vfs(&self) -> Result<(), ResolveError> {
        for (module, function) in VFS_OPENERS {
            self.io.activate(module, function)?;
        }
        Ok(())
    }
}
