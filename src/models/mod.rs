//! Domain models for datans.
//!
//! # Core Concepts
//!
//! - [`SymbolicPath`]: a dotted name such as `datans.data.acme.demo`. Below the
//!   root prefix, one segment names an owner and two name a package.
//! - [`ContentNode`]: the persisted descriptor of a package, a tree of
//!   root/group/table/file nodes.
//! - [`Package`]: a package located in a store, with its descriptor.
//! - [`PackageNode`], [`GroupNode`], [`DataNode`]: the navigable presentation
//!   tree materialized from a descriptor. Structure and names match the
//!   descriptor exactly.

mod content;
mod node;
mod package;
mod path;

pub use content::*;
pub use node::*;
pub use package::*;
pub use path::*;
