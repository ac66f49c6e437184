//! Filesystem operations: listing, searching and mutating paths.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{io_error, CoreError, CoreResult};
use crate::fs::entry::FileEntry;
use crate::fs::walk::{PathWalker, SortBy, TypeFilter, WalkOptions};
use crate::pattern::MatchSpec;

/// Options for [`ls`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LsOptions {
    /// Include names starting with `.`.
    pub all: bool,
    pub recursive: bool,
    /// Sibling order; directory-read order when `None`.
    pub sort_by: Option<SortBy>,
    pub reverse: bool,
    /// List directories only.
    pub directory_only: bool,
    pub abort_on_error: bool,
}

impl Default for LsOptions {
    fn default() -> Self {
        Self {
            all: false,
            recursive: false,
            sort_by: Some(SortBy::Name),
            reverse: false,
            directory_only: false,
            abort_on_error: false,
        }
    }
}

/// Entries gathered by a walk together with the errors it stepped over.
#[derive(Debug, Default)]
pub struct Listing {
    pub entries: Vec<FileEntry>,
    /// Unreadable or cyclic entries in walk order; empty for a complete walk.
    pub errors: Vec<CoreError>,
}

impl Listing {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Lists the contents of a directory.
///
/// Entries are returned in tree order: each directory's children follow it,
/// siblings ordered by `sort_by`. Unreadable subdirectories are reported in
/// [`Listing::errors`] unless `abort_on_error` is set, in which case the
/// first one is returned as the error.
///
/// # Errors
///
/// - [`CoreError::NotFound`]: the path does not exist.
/// - [`CoreError::NotADirectory`]: the path is not a directory.
/// - [`CoreError::PermissionDenied`]: read access is denied.
pub fn ls(path: &Path, options: &LsOptions) -> CoreResult<Listing> {
    let meta = fs::metadata(path).map_err(io_error(path))?;
    if !meta.is_dir() {
        return Err(CoreError::NotADirectory(path.to_path_buf()));
    }
    fs::read_dir(path).map(drop).map_err(io_error(path))?;

    let walker = PathWalker::new(
        path,
        WalkOptions {
            recursive: options.recursive,
            include_root: false,
            skip_hidden: !options.all,
            type_filter: options.directory_only.then_some(TypeFilter::Dir),
            sort_by: options.sort_by,
            sort_reverse: options.reverse,
            abort_on_error: options.abort_on_error,
            ..Default::default()
        },
    )?;
    collect(walker, options.abort_on_error)
}

/// Options for [`find`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Anchored glob matched against each entry name.
    pub name: Option<String>,
    pub case_insensitive: bool,
    pub file_type: Option<TypeFilter>,
    /// Inclusive lower bound on regular-file size.
    pub min_size: Option<u64>,
    /// Inclusive upper bound on regular-file size.
    pub max_size: Option<u64>,
    pub max_depth: Option<usize>,
    pub follow_symlinks: bool,
    pub abort_on_error: bool,
}

impl FindOptions {
    fn validate(&self) -> CoreResult<()> {
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                return Err(CoreError::InvalidArgument(format!(
                    "min_size {min} exceeds max_size {max}"
                )));
            }
        }
        Ok(())
    }

    fn size_matches(&self, entry: &FileEntry) -> bool {
        if !entry.is_file() {
            return self.min_size.is_none() && self.max_size.is_none();
        }
        self.min_size.map_or(true, |min| entry.size() >= min)
            && self.max_size.map_or(true, |max| entry.size() <= max)
    }
}

/// Searches `root` (included) for entries matching every given filter.
///
/// Walk failures below the root land in [`Listing::errors`] unless
/// `abort_on_error` is set.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if `root` does not exist.
/// - [`CoreError::InvalidArgument`] for a malformed glob or reversed size bounds.
pub fn find(root: &Path, options: &FindOptions) -> CoreResult<Listing> {
    options.validate()?;
    let name_filter = options
        .name
        .as_ref()
        .map(|n| MatchSpec::glob(n.as_str()).case_insensitive(options.case_insensitive));

    let walker = PathWalker::new(
        root,
        WalkOptions {
            follow_symlinks: options.follow_symlinks,
            max_depth: options.max_depth,
            name_filter,
            type_filter: options.file_type,
            abort_on_error: options.abort_on_error,
            ..Default::default()
        },
    )?;

    let mut found = collect(walker, options.abort_on_error)?;
    found.entries.retain(|e| options.size_matches(e));
    Ok(found)
}

fn collect(walker: PathWalker, abort_on_error: bool) -> CoreResult<Listing> {
    let mut listing = Listing::default();
    for item in walker {
        match item {
            Ok(entry) => listing.entries.push(entry),
            Err(err) if abort_on_error => return Err(err),
            Err(err) => listing.errors.push(err),
        }
    }
    Ok(listing)
}

/// Creates a directory. With `parents`, missing ancestors are created and an
/// existing directory is not an error.
pub fn mkdir(path: &Path, parents: bool) -> CoreResult<()> {
    if parents {
        fs::create_dir_all(path).map_err(io_error(path))
    } else {
        fs::create_dir(path).map_err(io_error(path))
    }
}

/// Removes an empty directory.
///
/// # Errors
///
/// - [`CoreError::NotFound`]: the path does not exist.
/// - [`CoreError::NotADirectory`]: the path is not a directory.
/// - [`CoreError::NotEmpty`]: the directory has children.
pub fn rmdir(path: &Path) -> CoreResult<()> {
    let meta = fs::symlink_metadata(path).map_err(io_error(path))?;
    if !meta.is_dir() {
        return Err(CoreError::NotADirectory(path.to_path_buf()));
    }
    fs::remove_dir(path).map_err(io_error(path))
}

/// Options for [`rm`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RmOptions {
    pub recursive: bool,
    /// A missing path is a successful no-op.
    pub force: bool,
}

/// Removes a file, a symlink, or with `recursive` a whole directory tree.
///
/// Symlinks are removed, never followed.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if `path` does not exist and `force` is unset.
/// - [`CoreError::IsADirectory`] for a directory without `recursive`.
pub fn rm(path: &Path, options: &RmOptions) -> CoreResult<()> {
    // Use symlink_metadata: does NOT follow symlinks
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if options.force && e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(CoreError::from_io(path, e)),
    };

    if !meta.is_dir() {
        return fs::remove_file(path).map_err(io_error(path));
    }
    if !options.recursive {
        return Err(CoreError::IsADirectory(path.to_path_buf()));
    }
    remove_tree(path)
}

/// Deletes a tree children-first from a full preorder listing.
fn remove_tree(root: &Path) -> CoreResult<()> {
    let walker = PathWalker::new(
        root,
        WalkOptions {
            abort_on_error: true,
            ..Default::default()
        },
    )?;
    let entries = walker.collect::<CoreResult<Vec<_>>>()?;
    tracing::debug!(root = %root.display(), count = entries.len(), "remove tree");

    for entry in entries.iter().rev() {
        let path = entry.path();
        if entry.is_dir() {
            fs::remove_dir(path).map_err(io_error(path))?;
        } else {
            fs::remove_file(path).map_err(io_error(path))?;
        }
    }
    Ok(())
}

/// Updates the modification time, creating an empty file if needed.
///
/// With `no_create`, a missing path is left alone.
pub fn touch(path: &Path, no_create: bool) -> CoreResult<()> {
    match fs::symlink_metadata(path) {
        Ok(_) => {
            let file = File::open(path).map_err(io_error(path))?;
            file.set_modified(SystemTime::now()).map_err(io_error(path))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if no_create {
                return Ok(());
            }
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)
                .map_err(io_error(path))?;
            Ok(())
        }
        Err(e) => Err(CoreError::from_io(path, e)),
    }
}

/// Options for [`cp`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpOptions {
    /// Required to copy a directory.
    pub recursive: bool,
    /// Overwrite an existing destination.
    pub force: bool,
}

/// Maximum recursion depth for copy_dir_recursive to prevent symlink loops.
const MAX_COPY_DEPTH: usize = 64;

/// Copies `src` to exactly `dest`. Symlinks are copied as symlinks.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if `src` does not exist.
/// - [`CoreError::AlreadyExists`] if `dest` exists and `force` is unset.
/// - [`CoreError::IsADirectory`] if `src` is a directory and `recursive` is unset.
/// - [`CoreError::InvalidArgument`] if `dest` lies inside `src`.
pub fn cp(src: &Path, dest: &Path, options: &CpOptions) -> CoreResult<()> {
    let meta = fs::symlink_metadata(src).map_err(io_error(src))?;
    if fs::symlink_metadata(dest).is_ok() && !options.force {
        return Err(CoreError::AlreadyExists(dest.to_path_buf()));
    }

    if meta.is_dir() {
        if !options.recursive {
            return Err(CoreError::IsADirectory(src.to_path_buf()));
        }
        if is_within(src, dest)? {
            return Err(CoreError::InvalidArgument(format!(
                "cannot copy {} into itself",
                src.display()
            )));
        }
        copy_dir_recursive(src, dest, 0)
    } else if meta.is_symlink() {
        copy_symlink(src, dest)
    } else {
        fs::copy(src, dest).map_err(io_error(dest))?;
        Ok(())
    }
}

/// True when `dest` resolves to `src` or a path below it, after symlinks
/// and `..` components on both sides are resolved.
fn is_within(src: &Path, dest: &Path) -> CoreResult<bool> {
    let src = fs::canonicalize(src).map_err(io_error(src))?;
    Ok(resolve_target(dest).starts_with(src))
}

/// Canonical form of a path that may not exist yet: the deepest existing
/// ancestor is canonicalized and the remaining names appended to it.
fn resolve_target(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = fs::canonicalize(existing) {
            return rest.iter().rev().fold(canonical, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name);
                existing = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return path.to_path_buf(),
        }
    }
}

fn copy_dir_recursive(src: &Path, dest: &Path, depth: usize) -> CoreResult<()> {
    if depth > MAX_COPY_DEPTH {
        return Err(CoreError::InvalidArgument(format!(
            "maximum recursion depth ({MAX_COPY_DEPTH}) exceeded during copy"
        )));
    }

    fs::create_dir_all(dest).map_err(io_error(dest))?;

    for entry in fs::read_dir(src).map_err(io_error(src))? {
        let entry = entry.map_err(io_error(src))?;
        let entry_path = entry.path();
        let target = dest.join(entry.file_name());

        // Use entry.file_type() which does NOT follow symlinks
        let ft = entry.file_type().map_err(io_error(&entry_path))?;

        if ft.is_symlink() {
            copy_symlink(&entry_path, &target)?;
        } else if ft.is_dir() {
            copy_dir_recursive(&entry_path, &target, depth + 1)?;
        } else {
            fs::copy(&entry_path, &target).map_err(io_error(&target))?;
        }
    }

    Ok(())
}

fn copy_symlink(src: &Path, dest: &Path) -> CoreResult<()> {
    let link_target = fs::read_link(src).map_err(io_error(src))?;
    if fs::symlink_metadata(dest).is_ok() {
        fs::remove_file(dest).map_err(io_error(dest))?;
    }
    #[cfg(unix)]
    std::os::unix::fs::symlink(&link_target, dest).map_err(io_error(dest))?;
    #[cfg(not(unix))]
    {
        let _ = link_target;
        fs::copy(src, dest).map_err(io_error(dest))?;
    }
    Ok(())
}

/// Moves `src` to `dest`.
///
/// Renames in place when both paths share a filesystem. Only when `rename`
/// reports a cross-device move does it fall back to copy + delete.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if `src` does not exist.
/// - [`CoreError::AlreadyExists`] if `dest` exists and `force` is unset.
/// - Any other `rename` failure, with `src` left in place.
pub fn mv(src: &Path, dest: &Path, force: bool) -> CoreResult<()> {
    fs::symlink_metadata(src).map_err(io_error(src))?;
    if fs::symlink_metadata(dest).is_ok() && !force {
        return Err(CoreError::AlreadyExists(dest.to_path_buf()));
    }

    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(err) if crosses_devices(&err) => {
            tracing::debug!(error = %err, "rename crosses devices, copying instead");
            move_across_devices(src, dest)
        }
        Err(err) => Err(CoreError::from_io(src, err)),
    }
}

fn crosses_devices(err: &io::Error) -> bool {
    #[cfg(not(windows))]
    const EXDEV: i32 = 18;
    // ERROR_NOT_SAME_DEVICE
    #[cfg(windows)]
    const EXDEV: i32 = 17;
    err.raw_os_error() == Some(EXDEV)
}

/// Copy + delete. A failed copy removes whatever part of `dest` it created;
/// a failed delete keeps the complete copy at `dest`.
fn move_across_devices(src: &Path, dest: &Path) -> CoreResult<()> {
    let existed = fs::symlink_metadata(dest).is_ok();
    let copy = CpOptions {
        recursive: true,
        force: true,
    };
    if let Err(err) = cp(src, dest, &copy) {
        if !existed {
            let cleanup = RmOptions {
                recursive: true,
                force: true,
            };
            if let Err(cleanup_err) = rm(dest, &cleanup) {
                tracing::warn!(error = %cleanup_err, "cannot remove partial copy");
            }
        }
        return Err(err);
    }
    rm(
        src,
        &RmOptions {
            recursive: true,
            force: false,
        },
    )
}

/// Creates a hard link, or a symbolic link when `symbolic` is set.
///
/// A symbolic link may dangle; a hard link target must exist.
///
/// # Errors
///
/// - [`CoreError::AlreadyExists`] if `link` exists.
/// - [`CoreError::NotFound`] for a missing hard-link target.
pub fn ln(target: &Path, link: &Path, symbolic: bool) -> CoreResult<()> {
    if fs::symlink_metadata(link).is_ok() {
        return Err(CoreError::AlreadyExists(link.to_path_buf()));
    }
    if symbolic {
        make_symlink(target, link)
    } else {
        fs::symlink_metadata(target).map_err(io_error(target))?;
        fs::hard_link(target, link).map_err(io_error(link))
    }
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> CoreResult<()> {
    std::os::unix::fs::symlink(target, link).map_err(io_error(link))
}

#[cfg(not(unix))]
fn make_symlink(_target: &Path, _link: &Path) -> CoreResult<()> {
    Err(CoreError::InvalidArgument(
        "symbolic links are not supported on this platform".to_string(),
    ))
}

/// Sets permission bits. With `recursive`, every entry below a directory is
/// changed too, deepest first; symlinks below the root are skipped.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if `path` does not exist.
/// - [`CoreError::InvalidArgument`] if `mode` has bits above `0o7777`.
pub fn chmod(path: &Path, mode: u32, recursive: bool) -> CoreResult<()> {
    if mode > 0o7777 {
        return Err(CoreError::InvalidArgument(format!(
            "invalid mode {mode:o}"
        )));
    }
    let meta = fs::metadata(path).map_err(io_error(path))?;

    if recursive && meta.is_dir() {
        let walker = PathWalker::new(
            path,
            WalkOptions {
                abort_on_error: true,
                ..Default::default()
            },
        )?;
        let entries = walker.collect::<CoreResult<Vec<_>>>()?;
        for entry in entries.iter().rev().filter(|e| !e.is_symlink()) {
            set_mode(entry.path(), mode)?;
        }
        Ok(())
    } else {
        set_mode(path, mode)
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> CoreResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(io_error(path))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> CoreResult<()> {
    let mut perms = fs::metadata(path).map_err(io_error(path))?.permissions();
    perms.set_readonly(mode & 0o222 == 0);
    fs::set_permissions(path, perms).map_err(io_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(entries: &[FileEntry]) -> Vec<&str> {
        entries.iter().map(FileEntry::name).collect()
    }

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("b.txt"), "12345").unwrap();
        fs::write(root.join("a.txt"), "1").unwrap();
        fs::write(root.join(".hidden"), "").unwrap();
        fs::create_dir(root.join("dir")).unwrap();
        fs::write(root.join("dir/inner.log"), "123").unwrap();
        tmp
    }

    // -- ls -----------------------------------------------------------------

    #[test]
    fn ls_sorted_by_name_skips_hidden() {
        let tmp = setup();
        let entries = ls(tmp.path(), &LsOptions::default()).unwrap().entries;
        assert_eq!(names(&entries), vec!["a.txt", "b.txt", "dir"]);
    }

    #[test]
    fn ls_all_includes_hidden() {
        let tmp = setup();
        let opts = LsOptions {
            all: true,
            ..Default::default()
        };
        let entries = ls(tmp.path(), &opts).unwrap().entries;
        assert_eq!(names(&entries), vec![".hidden", "a.txt", "b.txt", "dir"]);
    }

    #[test]
    fn ls_by_size_reversed() {
        let tmp = setup();
        let opts = LsOptions {
            sort_by: Some(SortBy::Size),
            reverse: true,
            ..Default::default()
        };
        let entries = ls(tmp.path(), &opts).unwrap().entries;
        assert_eq!(names(&entries), vec!["b.txt", "a.txt", "dir"]);
    }

    #[test]
    fn ls_recursive_and_directory_only() {
        let tmp = setup();
        let opts = LsOptions {
            recursive: true,
            ..Default::default()
        };
        let entries = ls(tmp.path(), &opts).unwrap().entries;
        assert_eq!(names(&entries), vec!["a.txt", "b.txt", "dir", "inner.log"]);

        let opts = LsOptions {
            directory_only: true,
            ..Default::default()
        };
        assert_eq!(names(&ls(tmp.path(), &opts).unwrap().entries), vec!["dir"]);
    }

    #[test]
    fn ls_errors() {
        let tmp = setup();
        let err = ls(&tmp.path().join("nope"), &LsOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        let err = ls(&tmp.path().join("a.txt"), &LsOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::NotADirectory(_)));
    }

    // -- find ---------------------------------------------------------------

    #[test]
    fn find_by_name_glob() {
        let tmp = setup();
        let opts = FindOptions {
            name: Some("*.txt".to_string()),
            ..Default::default()
        };
        let mut found = names(&find(tmp.path(), &opts).unwrap().entries)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        found.sort();
        assert_eq!(found, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn find_includes_root_and_hidden() {
        let tmp = setup();
        let found = find(tmp.path(), &FindOptions::default()).unwrap().entries;
        assert_eq!(found.len(), 6);
        assert_eq!(found[0].path(), tmp.path());
    }

    #[test]
    fn find_size_bounds_apply_to_files_only() {
        let tmp = setup();
        let opts = FindOptions {
            min_size: Some(2),
            ..Default::default()
        };
        let mut found: Vec<String> = find(tmp.path(), &opts)
            .unwrap()
            .entries
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        found.sort();
        assert_eq!(found, vec!["b.txt", "inner.log"]);
    }

    #[test]
    fn find_type_and_depth() {
        let tmp = setup();
        let opts = FindOptions {
            file_type: Some(TypeFilter::File),
            max_depth: Some(1),
            ..Default::default()
        };
        let found = find(tmp.path(), &opts).unwrap().entries;
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(FileEntry::is_file));
    }

    #[test]
    fn find_case_insensitive_name() {
        let tmp = setup();
        fs::write(tmp.path().join("README.MD"), "").unwrap();
        let opts = FindOptions {
            name: Some("readme.*".to_string()),
            case_insensitive: true,
            ..Default::default()
        };
        assert_eq!(find(tmp.path(), &opts).unwrap().entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn find_reports_symlink_loop() {
        let tmp = setup();
        std::os::unix::fs::symlink("..", tmp.path().join("dir/loop")).unwrap();
        let opts = FindOptions {
            follow_symlinks: true,
            ..Default::default()
        };
        let found = find(tmp.path(), &opts).unwrap();
        assert!(!found.is_complete());
        assert!(found
            .errors
            .iter()
            .any(|e| matches!(e, CoreError::CycleDetected(_))));
        assert!(found.entries.iter().any(|e| e.name() == "inner.log"));

        let opts = FindOptions {
            abort_on_error: true,
            ..opts
        };
        assert!(matches!(
            find(tmp.path(), &opts).unwrap_err(),
            CoreError::CycleDetected(_)
        ));
    }

    #[test]
    fn find_complete_walk_has_no_errors() {
        let tmp = setup();
        assert!(find(tmp.path(), &FindOptions::default()).unwrap().is_complete());
    }

    #[test]
    fn find_rejects_reversed_bounds() {
        let tmp = setup();
        let opts = FindOptions {
            min_size: Some(10),
            max_size: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            find(tmp.path(), &opts).unwrap_err(),
            CoreError::InvalidArgument(_)
        ));
    }

    // -- mkdir / rmdir ------------------------------------------------------

    #[test]
    fn mkdir_plain_and_parents() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b/c");

        let err = mkdir(&nested, false).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        mkdir(&nested, true).unwrap();
        assert!(nested.is_dir());
        mkdir(&nested, true).unwrap();

        let err = mkdir(&nested, false).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists(_)));
    }

    #[test]
    fn rmdir_refuses_non_empty_and_files() {
        let tmp = setup();
        let err = rmdir(&tmp.path().join("dir")).unwrap_err();
        assert!(matches!(err, CoreError::NotEmpty(_)));

        let err = rmdir(&tmp.path().join("a.txt")).unwrap_err();
        assert!(matches!(err, CoreError::NotADirectory(_)));

        fs::create_dir(tmp.path().join("empty")).unwrap();
        rmdir(&tmp.path().join("empty")).unwrap();
        assert!(!tmp.path().join("empty").exists());
    }

    // -- rm -----------------------------------------------------------------

    #[test]
    fn rm_file() {
        let tmp = setup();
        let path = tmp.path().join("a.txt");
        rm(&path, &RmOptions::default()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn rm_missing_respects_force() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope");
        let err = rm(&path, &RmOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        let force = RmOptions {
            force: true,
            ..Default::default()
        };
        assert!(rm(&path, &force).is_ok());
    }

    #[test]
    fn rm_directory_needs_recursive() {
        let tmp = setup();
        let dir = tmp.path().join("dir");
        let err = rm(&dir, &RmOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::IsADirectory(_)));

        let opts = RmOptions {
            recursive: true,
            ..Default::default()
        };
        rm(&dir, &opts).unwrap();
        assert!(!dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn rm_recursive_does_not_follow_symlinks() {
        let tmp = TempDir::new().unwrap();
        let keep = tmp.path().join("keep");
        fs::create_dir(&keep).unwrap();
        fs::write(keep.join("precious"), "data").unwrap();

        let doomed = tmp.path().join("doomed");
        fs::create_dir(&doomed).unwrap();
        std::os::unix::fs::symlink(&keep, doomed.join("link")).unwrap();

        let opts = RmOptions {
            recursive: true,
            ..Default::default()
        };
        rm(&doomed, &opts).unwrap();
        assert!(!doomed.exists());
        assert!(keep.join("precious").exists());
    }

    // -- touch --------------------------------------------------------------

    #[test]
    fn touch_creates_and_updates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("new.txt");
        touch(&path, false).unwrap();
        assert!(path.is_file());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);

        let old = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        File::open(&path).unwrap().set_modified(old).unwrap();
        touch(&path, false).unwrap();
        assert!(fs::metadata(&path).unwrap().modified().unwrap() > old);
    }

    #[test]
    fn touch_no_create_leaves_missing_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ghost");
        touch(&path, true).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn touch_keeps_contents() {
        let tmp = setup();
        let path = tmp.path().join("b.txt");
        touch(&path, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "12345");
    }

    // -- cp -----------------------------------------------------------------

    #[test]
    fn cp_file_and_conflict() {
        let tmp = setup();
        let src = tmp.path().join("a.txt");
        let dest = tmp.path().join("copy.txt");
        cp(&src, &dest, &CpOptions::default()).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "1");

        let err = cp(&tmp.path().join("b.txt"), &dest, &CpOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists(_)));

        let force = CpOptions {
            force: true,
            ..Default::default()
        };
        cp(&tmp.path().join("b.txt"), &dest, &force).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "12345");
    }

    #[test]
    fn cp_directory_needs_recursive() {
        let tmp = setup();
        let src = tmp.path().join("dir");
        let dest = tmp.path().join("dir2");
        let err = cp(&src, &dest, &CpOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::IsADirectory(_)));

        let opts = CpOptions {
            recursive: true,
            ..Default::default()
        };
        cp(&src, &dest, &opts).unwrap();
        assert_eq!(fs::read_to_string(dest.join("inner.log")).unwrap(), "123");
        assert!(src.join("inner.log").exists());
    }

    #[test]
    fn cp_into_itself_is_rejected() {
        let tmp = setup();
        let src = tmp.path().join("dir");
        let opts = CpOptions {
            recursive: true,
            ..Default::default()
        };
        let err = cp(&src, &src.join("nested"), &opts).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn cp_into_itself_through_dot_dot() {
        let tmp = setup();
        fs::create_dir(tmp.path().join("other")).unwrap();
        let src = tmp.path().join("dir");
        let dest = tmp.path().join("other/../dir/nested");
        let opts = CpOptions {
            recursive: true,
            ..Default::default()
        };
        let err = cp(&src, &dest, &opts).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert!(!src.join("nested").exists());
    }

    #[cfg(unix)]
    #[test]
    fn cp_into_itself_through_symlink() {
        let tmp = setup();
        let src = tmp.path().join("dir");
        std::os::unix::fs::symlink(&src, tmp.path().join("alias")).unwrap();
        let opts = CpOptions {
            recursive: true,
            ..Default::default()
        };
        let err = cp(&src, &tmp.path().join("alias/copy"), &opts).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert!(!src.join("copy").exists());
    }

    #[test]
    fn cp_into_sibling_with_shared_prefix() {
        let tmp = setup();
        let src = tmp.path().join("dir");
        let opts = CpOptions {
            recursive: true,
            ..Default::default()
        };
        cp(&src, &tmp.path().join("dir2"), &opts).unwrap();
        assert!(tmp.path().join("dir2/inner.log").is_file());
    }

    #[test]
    fn cp_missing_source() {
        let tmp = TempDir::new().unwrap();
        let err = cp(
            &tmp.path().join("nope"),
            &tmp.path().join("x"),
            &CpOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn cp_copies_symlinks_as_links() {
        let tmp = setup();
        let src = tmp.path().join("dir");
        std::os::unix::fs::symlink("inner.log", src.join("alias")).unwrap();
        let dest = tmp.path().join("dir2");
        let opts = CpOptions {
            recursive: true,
            ..Default::default()
        };
        cp(&src, &dest, &opts).unwrap();
        let meta = fs::symlink_metadata(dest.join("alias")).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(
            fs::read_link(dest.join("alias")).unwrap(),
            Path::new("inner.log")
        );
    }

    // -- mv -----------------------------------------------------------------

    #[test]
    fn mv_renames_and_checks_destination() {
        let tmp = setup();
        let src = tmp.path().join("a.txt");
        let dest = tmp.path().join("moved.txt");
        mv(&src, &dest, false).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "1");

        let err = mv(&tmp.path().join("b.txt"), &dest, false).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists(_)));

        mv(&tmp.path().join("b.txt"), &dest, true).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "12345");
    }

    #[test]
    fn mv_missing_source() {
        let tmp = TempDir::new().unwrap();
        let err = mv(&tmp.path().join("nope"), &tmp.path().join("x"), false).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn mv_rename_failure_is_not_retried_as_copy() {
        let tmp = setup();
        let src = tmp.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("mine.txt"), "m").unwrap();
        let dest = tmp.path().join("dir");

        let err = mv(&src, &dest, true).unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotEmpty(_) | CoreError::AlreadyExists(_) | CoreError::Io { .. }
        ));
        assert!(src.join("mine.txt").is_file());
        assert!(!dest.join("mine.txt").exists());
        assert!(dest.join("inner.log").is_file());
    }

    #[test]
    fn only_exdev_triggers_the_copy_fallback() {
        #[cfg(unix)]
        assert!(crosses_devices(&io::Error::from_raw_os_error(18)));
        assert!(!crosses_devices(&io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(!crosses_devices(&io::Error::from(io::ErrorKind::NotFound)));
    }

    #[test]
    fn failed_cross_device_copy_leaves_no_partial_destination() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let mut deepest = src.clone();
        for _ in 0..MAX_COPY_DEPTH + 2 {
            deepest.push("d");
        }
        fs::create_dir_all(&deepest).unwrap();
        let dest = tmp.path().join("dest");

        let err = move_across_devices(&src, &dest).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert!(!dest.exists());
        assert!(deepest.is_dir());
    }

    #[test]
    fn failed_cross_device_copy_keeps_existing_destination() {
        let tmp = setup();
        let src = tmp.path().join("src");
        let mut deepest = src.clone();
        for _ in 0..MAX_COPY_DEPTH + 2 {
            deepest.push("d");
        }
        fs::create_dir_all(&deepest).unwrap();
        let dest = tmp.path().join("dir");

        assert!(move_across_devices(&src, &dest).is_err());
        assert!(dest.join("inner.log").is_file());
        assert!(deepest.is_dir());
    }

    #[test]
    fn cross_device_move_copies_then_removes() {
        let tmp = setup();
        let src = tmp.path().join("dir");
        let dest = tmp.path().join("moved");
        move_across_devices(&src, &dest).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(dest.join("inner.log")).unwrap(), "123");
    }

    // -- ln -----------------------------------------------------------------

    #[test]
    fn ln_hard_link_shares_inode() {
        let tmp = setup();
        let target = tmp.path().join("a.txt");
        let link = tmp.path().join("hard");
        ln(&target, &link, false).unwrap();
        assert_eq!(fs::read_to_string(&link).unwrap(), "1");

        let err = ln(&target, &link, false).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists(_)));

        let err = ln(&tmp.path().join("nope"), &tmp.path().join("h2"), false).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn ln_symbolic_may_dangle() {
        let tmp = TempDir::new().unwrap();
        let link = tmp.path().join("soft");
        ln(Path::new("does-not-exist"), &link, true).unwrap();
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    }

    // -- chmod --------------------------------------------------------------

    #[cfg(unix)]
    #[test]
    fn chmod_single_and_recursive() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = setup();
        let file = tmp.path().join("a.txt");
        chmod(&file, 0o600, false).unwrap();
        assert_eq!(fs::metadata(&file).unwrap().permissions().mode() & 0o7777, 0o600);

        let dir = tmp.path().join("dir");
        chmod(&dir, 0o750, true).unwrap();
        assert_eq!(fs::metadata(&dir).unwrap().permissions().mode() & 0o7777, 0o750);
        assert_eq!(
            fs::metadata(dir.join("inner.log")).unwrap().permissions().mode() & 0o7777,
            0o750
        );
    }

    #[test]
    fn chmod_rejects_bad_mode() {
        let tmp = setup();
        let err = chmod(&tmp.path().join("a.txt"), 0o17777, false).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }
}
