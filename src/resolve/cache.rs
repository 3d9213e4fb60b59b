use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::models::{Container, Node, PackageNode};

/// A resolved name.
#[derive(Debug, Clone)]
pub enum Module {
    /// An owner-level placeholder with no members of its own.
    Namespace(Arc<NamespaceModule>),
    /// A materialized package.
    Package(Arc<PackageNode>),
    /// A table, file or group inside a package. Never cached.
    Member(Member),
}

/// Empty namespace unit standing in for an owner directory, so that the
/// packages below it can be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceModule {
    pub name: String,
    pub location: PathBuf,
}

/// A node reached by walking a package tree.
#[derive(Debug, Clone)]
pub struct Member {
    package: Arc<PackageNode>,
    path: Vec<String>,
}

impl Member {
    pub(crate) fn new(package: Arc<PackageNode>, path: Vec<String>) -> Self {
        Self { package, path }
    }

    pub fn package(&self) -> &Arc<PackageNode> {
        &self.package
    }

    /// Names from the package root down to this member.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The member's node. `Some` for every member produced by
    /// [`Resolver::import`](super::Resolver::import).
    pub fn node(&self) -> Option<&Node> {
        self.package.get(&self.path.join("."))
    }
}

impl Module {
    pub fn as_package(&self) -> Option<&Arc<PackageNode>> {
        match self {
            Module::Package(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_namespace(&self) -> Option<&Arc<NamespaceModule>> {
        match self {
            Module::Namespace(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Member> {
        match self {
            Module::Member(m) => Some(m),
            _ => None,
        }
    }

    /// Identity, not structural equality.
    pub fn same_instance(&self, other: &Module) -> bool {
        match (self, other) {
            (Module::Namespace(a), Module::Namespace(b)) => Arc::ptr_eq(a, b),
            (Module::Package(a), Module::Package(b)) => Arc::ptr_eq(a, b),
            (Module::Member(a), Module::Member(b)) => {
                Arc::ptr_eq(&a.package, &b.package) && a.path == b.path
            }
            _ => false,
        }
    }
}

/// Fully-qualified name to resolved module. Entries are never evicted.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<String, Module>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Module> {
        self.entries
            .lock()
            .expect("resolution cache lock poisoned")
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .lock()
            .expect("resolution cache lock poisoned")
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("resolution cache lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached names, sorted.
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.lock().expect("resolution cache lock poisoned");
        let mut names: Vec<String> = entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get_or_insert_with(&self, name: &str, build: impl FnOnce() -> Module) -> Module {
        let mut entries = self.entries.lock().expect("resolution cache lock poisoned");
        entries.entry(name.to_string()).or_insert_with(build).clone()
    }

    /// Return the entry for `name`, building and storing it first if absent.
    /// Nothing is stored when `build` fails.
    pub fn get_or_try_insert_with<E>(
        &self,
        name: &str,
        build: impl FnOnce() -> Result<Module, E>,
    ) -> Result<Module, E> {
        let mut entries = self.entries.lock().expect("resolution cache lock poisoned");
        if let Some(existing) = entries.get(name) {
            return Ok(existing.clone());
        }
        let module = build()?;
        entries.insert(name.to_string(), module.clone());
        Ok(module)
    }
}
