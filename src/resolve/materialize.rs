//! Descriptor to presentation tree.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ResolveError;
use crate::models::{
    Container, ContentNode, DataKind, DataNode, GroupNode, Node, Package, PackageNode,
};

/// Build the presentation tree for `package`.
///
/// The top of the descriptor must hold children (a `Root` or a `Group`).
/// Every descriptor node below it yields exactly one presentation node under
/// the same name; a node of unknown kind fails the whole package.
pub fn materialize(package: &Arc<Package>) -> Result<PackageNode, ResolveError> {
    let Some(children) = package.contents().children() else {
        return Err(unexpected(package, "<root>", package.contents()));
    };

    let mut root = PackageNode::new(package.clone());
    attach_children(package, &mut root, children, "")?;
    Ok(root)
}

fn attach_children<C: Container>(
    package: &Arc<Package>,
    parent: &mut C,
    children: &BTreeMap<String, ContentNode>,
    prefix: &str,
) -> Result<(), ResolveError> {
    for (name, content) in children {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        let child = from_content(package, content, &path)?;
        parent.attach(name.clone(), child);
    }
    Ok(())
}

fn from_content(
    package: &Arc<Package>,
    content: &ContentNode,
    path: &str,
) -> Result<Node, ResolveError> {
    match content {
        ContentNode::Table { hashes, format } => Ok(Node::Data(DataNode::new(
            package.clone(),
            DataKind::Table {
                format: format.clone(),
            },
            hashes.clone(),
        ))),
        ContentNode::File { hashes } => Ok(Node::Data(DataNode::new(
            package.clone(),
            DataKind::File,
            hashes.clone(),
        ))),
        ContentNode::Root { children } => {
            let mut root = PackageNode::new(package.clone());
            attach_children(package, &mut root, children, path)?;
            Ok(Node::Package(root))
        }
        ContentNode::Group { children } => {
            let mut group = GroupNode::new(package.clone());
            attach_children(package, &mut group, children, path)?;
            Ok(Node::Group(group))
        }
        ContentNode::Unknown => Err(unexpected(package, path, content)),
    }
}

fn unexpected(package: &Package, path: &str, content: &ContentNode) -> ResolveError {
    ResolveError::UnexpectedNode {
        package: package.full_name(),
        path: path.to_string(),
        kind: content.kind().to_string(),
    }
}
