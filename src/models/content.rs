use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A persisted package descriptor node.
///
/// Descriptors are stored as JSON, tagged by `"type"`:
///
/// ```json
/// {"type": "ROOT", "children": {
///     "prices": {"type": "TABLE", "hashes": ["ab12"], "format": "csv"},
///     "meta": {"type": "GROUP", "children": {
///         "notes": {"type": "FILE", "hashes": ["cd34"]}}}}}
/// ```
///
/// Unrecognised tags parse as [`ContentNode::Unknown`] so that the problem is
/// reported when the tree is materialized rather than looking like a missing package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum ContentNode {
    Root {
        #[serde(default)]
        children: BTreeMap<String, ContentNode>,
    },
    Group {
        #[serde(default)]
        children: BTreeMap<String, ContentNode>,
    },
    Table {
        hashes: Vec<String>,
        /// Storage format of the table blob, e.g. `csv`, `parquet`, `h5`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    File {
        hashes: Vec<String>,
    },
    #[serde(other)]
    Unknown,
}

impl ContentNode {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Root { .. } => "root",
            Self::Group { .. } => "group",
            Self::Table { .. } => "table",
            Self::File { .. } => "file",
            Self::Unknown => "unknown",
        }
    }

    /// Child mapping for `Root` and `Group`; `None` for leaves.
    pub fn children(&self) -> Option<&BTreeMap<String, ContentNode>> {
        match self {
            Self::Root { children } | Self::Group { children } => Some(children),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Table { .. } | Self::File { .. })
    }
}
