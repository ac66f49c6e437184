//! Lazy depth-first directory traversal.
//!
//! [`PathWalker`] is an iterator of `CoreResult<FileEntry>` in preorder.
//! Errors for a single entry (an unreadable subdirectory, a file removed
//! mid-walk, a symlink cycle) are yielded in place and the walk goes on
//! with the next sibling, unless [`WalkOptions::abort_on_error`] is set.
//! Stopping early is just dropping the iterator.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::{self, Metadata, ReadDir};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{io_error, CoreError, CoreResult};
use crate::fs::entry::{FileEntry, FileKind};
use crate::pattern::{MatchSpec, Matcher};

/// Restricts yielded entries to one kind (`find -type f|d|l`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    File,
    Dir,
    Symlink,
}

impl TypeFilter {
    pub fn accepts(self, kind: FileKind) -> bool {
        matches!(
            (self, kind),
            (TypeFilter::File, FileKind::File)
                | (TypeFilter::Dir, FileKind::Dir)
                | (TypeFilter::Symlink, FileKind::Symlink)
        )
    }
}

impl FromStr for TypeFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "f" => Ok(TypeFilter::File),
            "d" => Ok(TypeFilter::Dir),
            "l" => Ok(TypeFilter::Symlink),
            other => Err(CoreError::InvalidArgument(format!(
                "unknown file type {other:?} (expected f, d or l)"
            ))),
        }
    }
}

/// Sibling order for sorted traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Name,
    Size,
    Time,
}

impl FromStr for SortBy {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "name" => Ok(SortBy::Name),
            "size" => Ok(SortBy::Size),
            "time" => Ok(SortBy::Time),
            other => Err(CoreError::InvalidArgument(format!(
                "unknown sort field {other:?}"
            ))),
        }
    }
}

/// Options for [`PathWalker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Descend below the root's immediate children.
    pub recursive: bool,
    /// Follow symlinks below the root. The root itself is always resolved.
    pub follow_symlinks: bool,
    /// Deepest level yielded; the root is depth 0.
    pub max_depth: Option<usize>,
    /// Yield only entries whose name matches. Descent is not affected.
    pub name_filter: Option<MatchSpec>,
    /// Yield only entries of this kind. Descent is not affected.
    pub type_filter: Option<TypeFilter>,
    /// Neither yield nor descend into entries whose name starts with `.`.
    pub skip_hidden: bool,
    pub include_root: bool,
    /// Visit siblings in this order instead of directory-read order.
    pub sort_by: Option<SortBy>,
    /// Reverse the sibling order chosen by `sort_by`.
    pub sort_reverse: bool,
    /// Stop after the first error instead of skipping the failed entry.
    pub abort_on_error: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
            max_depth: None,
            name_filter: None,
            type_filter: None,
            skip_hidden: false,
            include_root: true,
            sort_by: None,
            sort_reverse: false,
            abort_on_error: false,
        }
    }
}

/// Device and inode of a directory on the active descent path.
type DirId = (u64, u64);

enum Children {
    Stream { dir: PathBuf, read: ReadDir },
    Sorted(std::vec::IntoIter<CoreResult<PathBuf>>),
}

impl Children {
    fn next_path(&mut self) -> Option<CoreResult<PathBuf>> {
        match self {
            Children::Stream { dir, read } => read
                .next()
                .map(|r| r.map(|e| e.path()).map_err(|e| CoreError::from_io(dir.as_path(), e))),
            Children::Sorted(iter) => iter.next(),
        }
    }
}

struct Frame {
    children: Children,
    /// Depth of the entries this frame yields.
    depth: usize,
    id: Option<DirId>,
}

/// Iterative preorder walk rooted at one path.
///
/// # Examples
///
/// ```no_run
/// use shellfast_core::fs::walk::{PathWalker, WalkOptions};
///
/// let walker = PathWalker::new("/var/log", WalkOptions::default()).unwrap();
/// for entry in walker.flatten() {
///     println!("{}", entry.path().display());
/// }
/// ```
pub struct PathWalker {
    options: WalkOptions,
    matcher: Option<Matcher>,
    start: Option<PathBuf>,
    stack: Vec<Frame>,
    ancestors: HashSet<DirId>,
    deferred: Option<CoreError>,
    done: bool,
}

impl PathWalker {
    /// Prepares a walk. Nothing below the root is read until iteration.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if `root` does not exist.
    /// - [`CoreError::InvalidArgument`] if the name filter does not compile.
    pub fn new(root: impl Into<PathBuf>, options: WalkOptions) -> CoreResult<Self> {
        let root = root.into();
        let matcher = options
            .name_filter
            .as_ref()
            .map(MatchSpec::compile)
            .transpose()?;
        fs::symlink_metadata(&root).map_err(io_error(&root))?;
        tracing::debug!(root = %root.display(), ?options, "walk");

        Ok(Self {
            options,
            matcher,
            start: Some(root),
            stack: Vec::new(),
            ancestors: HashSet::new(),
            deferred: None,
            done: false,
        })
    }

    /// Stats `path`, opens it for descent when needed, and returns what to
    /// yield for it (`None` when filtered out).
    fn visit(&mut self, path: PathBuf, depth: usize) -> Option<CoreResult<FileEntry>> {
        let follow = self.options.follow_symlinks || depth == 0;
        let meta = match stat(&path, follow) {
            Ok(meta) => meta,
            Err(e) => return Some(Err(e)),
        };
        let entry = FileEntry::new(path, &meta);
        if depth > 0 && self.options.skip_hidden && entry.is_hidden() {
            return None;
        }

        if entry.is_dir() && self.should_descend(depth) {
            match self.open(entry.path(), &meta, depth) {
                Ok(()) => {}
                Err(err @ CoreError::CycleDetected(_)) => return Some(Err(err)),
                // Reported right after the directory itself.
                Err(err) => self.deferred = Some(err),
            }
        }

        self.accepts(&entry, depth).then_some(Ok(entry))
    }

    fn should_descend(&self, depth: usize) -> bool {
        (depth == 0 || self.options.recursive)
            && self.options.max_depth.map_or(true, |max| depth < max)
    }

    fn open(&mut self, dir: &Path, meta: &Metadata, depth: usize) -> CoreResult<()> {
        let id = dir_id(meta);
        if let Some(id) = id {
            if !self.ancestors.insert(id) {
                return Err(CoreError::CycleDetected(dir.to_path_buf()));
            }
        }

        let read = match fs::read_dir(dir) {
            Ok(read) => read,
            Err(e) => {
                if let Some(id) = id {
                    self.ancestors.remove(&id);
                }
                return Err(CoreError::from_io(dir, e));
            }
        };

        let children = match self.options.sort_by {
            None => Children::Stream {
                dir: dir.to_path_buf(),
                read,
            },
            Some(by) => Children::Sorted(self.sorted(dir, read, by).into_iter()),
        };
        self.stack.push(Frame {
            children,
            depth: depth + 1,
            id,
        });
        Ok(())
    }

    fn sorted(&self, dir: &Path, read: ReadDir, by: SortBy) -> Vec<CoreResult<PathBuf>> {
        let mut failed = Vec::new();
        let mut keyed: Vec<(Option<FileEntry>, PathBuf)> = Vec::new();
        for item in read {
            match item {
                Ok(e) => {
                    let path = e.path();
                    let entry = stat(&path, self.options.follow_symlinks)
                        .ok()
                        .map(|m| FileEntry::new(path.clone(), &m));
                    keyed.push((entry, path));
                }
                Err(e) => failed.push(Err(CoreError::from_io(dir, e))),
            }
        }

        keyed.sort_by(|(ea, pa), (eb, pb)| {
            let ord = match by {
                SortBy::Name => Ordering::Equal,
                SortBy::Size => ea
                    .as_ref()
                    .map(FileEntry::size)
                    .cmp(&eb.as_ref().map(FileEntry::size)),
                SortBy::Time => ea
                    .as_ref()
                    .and_then(FileEntry::modified)
                    .cmp(&eb.as_ref().and_then(FileEntry::modified)),
            };
            ord.then_with(|| pa.file_name().cmp(&pb.file_name()))
        });
        if self.options.sort_reverse {
            keyed.reverse();
        }

        keyed
            .into_iter()
            .map(|(_, path)| Ok(path))
            .chain(failed)
            .collect()
    }

    fn accepts(&self, entry: &FileEntry, depth: usize) -> bool {
        if depth == 0 && !self.options.include_root {
            return false;
        }
        if let Some(filter) = self.options.type_filter {
            if !filter.accepts(entry.kind()) {
                return false;
            }
        }
        match &self.matcher {
            Some(m) => m.is_match(entry.name()),
            None => true,
        }
    }

    fn settle(&mut self, item: CoreResult<FileEntry>) -> CoreResult<FileEntry> {
        item.or_else(|err| self.fail(err))
    }

    fn fail(&mut self, err: CoreError) -> CoreResult<FileEntry> {
        if self.options.abort_on_error {
            self.done = true;
        } else {
            tracing::warn!(error = %err, "skipping entry");
        }
        Err(err)
    }
}

impl Iterator for PathWalker {
    type Item = CoreResult<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if let Some(err) = self.deferred.take() {
                return Some(self.fail(err));
            }
            if let Some(root) = self.start.take() {
                if let Some(item) = self.visit(root, 0) {
                    return Some(self.settle(item));
                }
                continue;
            }

            let frame = self.stack.last_mut()?;
            let depth = frame.depth;
            match frame.children.next_path() {
                None => {
                    if let Some(id) = self.stack.pop().and_then(|f| f.id) {
                        self.ancestors.remove(&id);
                    }
                }
                Some(Err(err)) => return Some(self.fail(err)),
                Some(Ok(path)) => {
                    if let Some(item) = self.visit(path, depth) {
                        return Some(self.settle(item));
                    }
                }
            }
        }
        None
    }
}

/// Reads metadata, resolving a symlink when `follow` is set. A dangling
/// link is described as the link itself.
pub(crate) fn stat(path: &Path, follow: bool) -> CoreResult<Metadata> {
    let meta = fs::symlink_metadata(path).map_err(io_error(path))?;
    if follow && meta.file_type().is_symlink() {
        return Ok(fs::metadata(path).unwrap_or(meta));
    }
    Ok(meta)
}

#[cfg(unix)]
fn dir_id(meta: &Metadata) -> Option<DirId> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn dir_id(_meta: &Metadata) -> Option<DirId> {
    None
}
