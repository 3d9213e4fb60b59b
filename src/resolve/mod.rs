//! Namespace resolution and lazy materialization.
//!
//! A name such as `datans.data.acme.demo` flows through three stages:
//!
//! 1. [`Resolver::find`] strips the root prefix and classifies the rest by
//!    depth. One segment is an owner and two are a package. A leading
//!    `vfs__` on the owner also activates interception of the openers in
//!    [`VFS_OPENERS`](crate::intercept::VFS_OPENERS).
//! 2. The returned loader produces a [`Module`]: an empty namespace for an
//!    owner, or the package tree built by [`materialize`].
//! 3. The module is stored in the [`ResolutionCache`] under the full name and
//!    handed back unchanged on every later lookup.

mod cache;
mod dispatch;
mod loader;
mod materialize;

pub use cache::{Member, Module, NamespaceModule, ResolutionCache};
pub use dispatch::{Resolution, Resolver, VFS_MARKER};
pub use loader::{OwnerLoader, PackageLoader};
pub use materialize::materialize;
