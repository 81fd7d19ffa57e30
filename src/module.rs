// src/module.rs

//! Root configuration tree handed to operations.
//!
//! Loading and resolving modules happens elsewhere; backends only need to
//! know where a tree came from and whether it is complete.

use std::fmt::Debug;
use std::path::Path;

use crate::operation::ResourceAddress;

pub trait ModuleTree: Send + Sync + Debug {
    /// Directory the root module was loaded from.
    fn source_dir(&self) -> &Path;

    /// Whether every child module has been fetched and loaded.
    fn is_loaded(&self) -> bool;

    /// Addresses of every resource the configuration declares.
    fn resources(&self) -> Vec<ResourceAddress>;
}
