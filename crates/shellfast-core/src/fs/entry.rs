//! File entry representation.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// What kind of filesystem object an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Dir,
    Symlink,
    Other,
}

impl FileKind {
    fn from_file_type(ft: std::fs::FileType) -> Self {
        if ft.is_symlink() {
            FileKind::Symlink
        } else if ft.is_dir() {
            FileKind::Dir
        } else if ft.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        }
    }
}

/// A single file or directory entry.
///
/// `FileEntry` is an immutable snapshot of one metadata read. Directory
/// sizes are reported as `0`; use [`crate::fs::usage::du`] for accumulated
/// directory sizes.
///
/// # Examples
///
/// ```no_run
/// use shellfast_core::FileEntry;
/// use std::fs;
///
/// let metadata = fs::symlink_metadata("Cargo.toml").unwrap();
/// let entry = FileEntry::new("Cargo.toml".into(), &metadata);
/// assert_eq!(entry.name(), "Cargo.toml");
/// assert!(!entry.is_dir());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    path: PathBuf,
    name: String,
    kind: FileKind,
    size: u64,
    mode: u32,
    modified: Option<SystemTime>,
    inode: u64,
    nlink: u64,
}

impl FileEntry {
    /// Creates a new `FileEntry` from a path and its metadata.
    ///
    /// Pass `symlink_metadata` to describe a link itself, or `metadata` to
    /// describe its target.
    pub fn new(path: PathBuf, metadata: &std::fs::Metadata) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().nfc().collect::<String>())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let kind = FileKind::from_file_type(metadata.file_type());
        let (mode, inode, nlink) = unix_fields(metadata);

        Self {
            path,
            name,
            kind,
            size: if kind == FileKind::Dir { 0 } else { metadata.len() },
            mode,
            modified: metadata.modified().ok(),
            inode,
            nlink,
        }
    }

    /// Returns the full path of this entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the last component of the path.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Returns the size in bytes. Always `0` for directories.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the raw `st_mode` bits (type and permissions).
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Returns only the permission bits of [`FileEntry::mode`].
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    /// Returns the last-modified time, if available.
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn inode(&self) -> u64 {
        self.inode
    }

    pub fn nlink(&self) -> u64 {
        self.nlink
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    /// Returns `true` if the name starts with `.`.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

#[cfg(unix)]
fn unix_fields(metadata: &std::fs::Metadata) -> (u32, u64, u64) {
    use std::os::unix::fs::MetadataExt;
    (metadata.mode(), metadata.ino(), metadata.nlink())
}

#[cfg(not(unix))]
fn unix_fields(metadata: &std::fs::Metadata) -> (u32, u64, u64) {
    let mode = if metadata.permissions().readonly() { 0o444 } else { 0o644 };
    (mode, 0, 1)
}
