//! Resolve dotted names like `datans.data.acme.demo` to navigable trees of
//! on-disk data packages.

pub mod config;
pub mod error;
pub mod intercept;
pub mod models;
pub mod render;
pub mod resolve;
pub mod store;

pub use error::{InterceptError, PathError, ResolveError, StoreError};
pub use resolve::{Module, Resolution, Resolver};
