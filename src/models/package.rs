use std::path::{Path, PathBuf};

use super::ContentNode;

/// Directory under a store root holding content-addressed blobs.
pub const OBJECTS_DIR: &str = ".objs";

/// A package found in a store: its identity, on-disk location and descriptor.
///
/// Presentation nodes hold an `Arc<Package>` so every node in a tree shares
/// one handle to the package it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub owner: String,
    pub name: String,
    /// Store root the package was found in.
    pub store_root: PathBuf,
    location: PathBuf,
    contents: ContentNode,
}

impl Package {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        store_root: impl Into<PathBuf>,
        location: impl Into<PathBuf>,
        contents: ContentNode,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            store_root: store_root.into(),
            location: location.into(),
            contents,
        }
    }

    /// Path of the persisted descriptor.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Root of the persisted descriptor tree.
    pub fn contents(&self) -> &ContentNode {
        &self.contents
    }

    /// `owner.name`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    /// Where the blob for `hash` lives.
    pub fn object_path(&self, hash: &str) -> PathBuf {
        self.store_root.join(OBJECTS_DIR).join(hash)
    }
}
