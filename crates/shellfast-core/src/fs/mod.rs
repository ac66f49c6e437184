//! File system abstractions for shellfast.
//!
//! This module provides the entry type ([`entry::FileEntry`]), the depth-first
//! traversal engine ([`walk::PathWalker`]) that every recursive operation is
//! built on, disk usage accounting ([`usage::du`]) and the file operations in
//! [`ops`].

pub mod entry;
pub mod ops;
pub mod usage;
pub mod walk;

pub use usage::{DuEntry, DuOptions, DuReport};
pub use walk::{PathWalker, SortBy, TypeFilter, WalkOptions};
