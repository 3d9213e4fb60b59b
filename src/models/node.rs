use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use super::Package;
use crate::error::InterceptError;
use crate::intercept::{IoTable, BZ2_FILE, GZIP_FILE, HDF5_FILE, IO_OPEN};

/// A materialized package: the root of a presentation tree.
///
/// Owns every node below it. Children are addressed by their exact
/// descriptor name.
#[derive(Debug, Clone)]
pub struct PackageNode {
    package: Arc<Package>,
    children: BTreeMap<String, Node>,
}

/// A named group of tables, files and further groups.
#[derive(Debug, Clone)]
pub struct GroupNode {
    package: Arc<Package>,
    children: BTreeMap<String, Node>,
}

/// What a [`DataNode`] was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataKind {
    Table { format: Option<String> },
    File,
}

/// A leaf bound to the blobs of one table or file.
#[derive(Debug, Clone)]
pub struct DataNode {
    package: Arc<Package>,
    kind: DataKind,
    hashes: Vec<String>,
}

/// A child of a [`PackageNode`] or [`GroupNode`].
///
/// `Package` holds a ROOT descriptor nested inside another package.
#[derive(Debug, Clone)]
pub enum Node {
    Package(PackageNode),
    Group(GroupNode),
    Data(DataNode),
}

/// Nodes that own named children.
pub trait Container {
    fn children(&self) -> &BTreeMap<String, Node>;

    fn attach(&mut self, name: impl Into<String>, child: Node);

    fn child(&self, name: &str) -> Option<&Node> {
        self.children().get(name)
    }

    fn keys(&self) -> Vec<&str> {
        self.children().keys().map(String::as_str).collect()
    }

    /// Nested lookup by dotted name, e.g. `meta.notes`.
    fn get(&self, dotted: &str) -> Option<&Node> {
        let mut parts = dotted.split('.');
        let mut node = self.child(parts.next()?)?;
        for part in parts {
            node = node.child(part)?;
        }
        Some(node)
    }
}

impl PackageNode {
    pub fn new(package: Arc<Package>) -> Self {
        Self {
            package,
            children: BTreeMap::new(),
        }
    }

    pub fn package(&self) -> &Arc<Package> {
        &self.package
    }
}

impl Container for PackageNode {
    fn children(&self) -> &BTreeMap<String, Node> {
        &self.children
    }

    fn attach(&mut self, name: impl Into<String>, child: Node) {
        self.children.insert(name.into(), child);
    }
}

impl GroupNode {
    pub fn new(package: Arc<Package>) -> Self {
        Self {
            package,
            children: BTreeMap::new(),
        }
    }

    pub fn package(&self) -> &Arc<Package> {
        &self.package
    }
}

impl Container for GroupNode {
    fn children(&self) -> &BTreeMap<String, Node> {
        &self.children
    }

    fn attach(&mut self, name: impl Into<String>, child: Node) {
        self.children.insert(name.into(), child);
    }
}

impl DataNode {
    pub fn new(package: Arc<Package>, kind: DataKind, hashes: Vec<String>) -> Self {
        Self {
            package,
            kind,
            hashes,
        }
    }

    pub fn package(&self) -> &Arc<Package> {
        &self.package
    }

    pub fn kind(&self) -> &DataKind {
        &self.kind
    }

    pub fn hashes(&self) -> &[String] {
        &self.hashes
    }

    /// Blob paths in the package's store, one per hash.
    pub fn data_paths(&self) -> Vec<PathBuf> {
        self.hashes
            .iter()
            .map(|h| self.package.object_path(h))
            .collect()
    }

    /// Open the first blob through `io`, using the opener that matches the
    /// table format.
    pub fn open(&self, io: &IoTable) -> Result<File, InterceptError> {
        let Some(hash) = self.hashes.first() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} has no data", self.package.full_name()),
            )
            .into());
        };
        let (module, function) = self.opener();
        io.call(module, function, &self.package.object_path(hash))
    }

    fn opener(&self) -> (&'static str, &'static str) {
        let DataKind::Table {
            format: Some(format),
        } = &self.kind
        else {
            return IO_OPEN;
        };
        match format.to_ascii_lowercase().as_str() {
            "h5" | "hdf5" => HDF5_FILE,
            "bz2" => BZ2_FILE,
            "gz" | "gzip" => GZIP_FILE,
            _ => IO_OPEN,
        }
    }
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Data(_))
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            Node::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&DataNode> {
        match self {
            Node::Data(d) => Some(d),
            _ => None,
        }
    }

    /// Children of a package or group; `None` for leaves.
    pub fn children(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Package(p) => Some(p.children()),
            Node::Group(g) => Some(g.children()),
            Node::Data(_) => None,
        }
    }

    /// Named child; always `None` for leaves.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children()?.get(name)
    }

    pub fn package(&self) -> &Arc<Package> {
        match self {
            Node::Package(p) => p.package(),
            Node::Group(g) => g.package(),
            Node::Data(d) => d.package(),
        }
    }
}
