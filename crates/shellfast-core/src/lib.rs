//! shellfast core library: POSIX shell utilities as in-process calls.
//!
//! `shellfast-core` implements the behavior of common file and text
//! utilities (`ls`, `find`, `du`, `cp`, `grep`, `sort`, `diff`, `cut`, ...)
//! as plain functions returning structured values. Nothing here spawns a
//! process or prints; rendering is left to the caller (see `shellfast-cli`).
//!
//! # Modules
//!
//! - [`fs`]: Traversal ([`PathWalker`]), [`FileEntry`], disk usage and file operations.
//! - [`text`]: Line buffers, sorting, diffing, set comparison, field extraction and counting.
//! - [`pattern`]: Substring and glob matching shared by `find` and `grep`.
//! - [`config`]: User defaults from a TOML file.
//! - [`error`]: Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod config;
pub mod error;
pub mod fs;
pub mod pattern;
pub mod text;

pub use config::settings::Config;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use fs::entry::{FileEntry, FileKind};
pub use fs::ops::{
    chmod, cp, find, ln, ls, mkdir, mv, rm, rmdir, touch, CpOptions, FindOptions, Listing,
    LsOptions, RmOptions,
};
pub use fs::usage::du;
pub use fs::walk::PathWalker;
pub use pattern::{MatchKind, MatchSpec, Matcher};
pub use text::comm::{comm_files, comm_lines, comm_merge};
pub use text::count::{wc, wc_bytes};
pub use text::diff::{cmp_files, diff_files, diff_lines, format_unified, is_identical};
pub use text::fields::{cut, join, paste};
pub use text::grep::grep;
pub use text::lines::{cat, head, head_bytes, tail, tail_bytes, LineBuffer};
pub use text::sort::{sort_file, sort_lines};
