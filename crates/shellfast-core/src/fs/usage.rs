//! Recursive size accumulation (`du`).

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::CoreResult;
use crate::fs::walk::{PathWalker, WalkOptions};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuOptions {
    /// Count symlink targets instead of the links themselves.
    pub follow_symlinks: bool,
    /// Report only the root total.
    pub summary_only: bool,
    /// Fail on the first unreadable entry instead of counting it in
    /// [`DuReport::skipped`].
    pub abort_on_error: bool,
}

/// Cumulative size of one directory (or of a file root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuEntry {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuReport {
    pub total: u64,
    /// Per-directory totals, children before parents, root last.
    /// Empty when `summary_only` is set.
    pub entries: Vec<DuEntry>,
    /// Entries the walk could not read.
    pub skipped: usize,
}

/// Sums apparent sizes under `root`.
///
/// Regular files count their size and symlinks the size of the link itself.
/// Hard links are counted once per path.
///
/// # Errors
///
/// - [`crate::CoreError::NotFound`] if `root` does not exist.
/// - The first walk error when `abort_on_error` is set.
pub fn du(root: &Path, options: &DuOptions) -> CoreResult<DuReport> {
    let walker = PathWalker::new(
        root,
        WalkOptions {
            follow_symlinks: options.follow_symlinks,
            abort_on_error: options.abort_on_error,
            ..Default::default()
        },
    )?;

    // Open directories along the current descent path with their running sums.
    let mut open: Vec<DuEntry> = Vec::new();
    let mut report = DuReport::default();

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) if options.abort_on_error => return Err(err),
            Err(_) => {
                report.skipped += 1;
                continue;
            }
        };

        while let Some(top) = open.last() {
            if entry.path().parent() == Some(top.path.as_path()) {
                break;
            }
            close_top(&mut open, &mut report, options.summary_only);
        }

        if entry.is_dir() {
            open.push(DuEntry {
                path: entry.path().to_path_buf(),
                bytes: 0,
            });
        } else if let Some(top) = open.last_mut() {
            top.bytes += entry.size();
        } else {
            report.total = entry.size();
            if !options.summary_only {
                report.entries.push(DuEntry {
                    path: entry.path().to_path_buf(),
                    bytes: entry.size(),
                });
            }
        }
    }

    while !open.is_empty() {
        close_top(&mut open, &mut report, options.summary_only);
    }

    tracing::debug!(root = %root.display(), total = report.total, "du");
    Ok(report)
}

/// Pops the innermost open directory, folding its sum into its parent or,
/// for the root, into the report total.
fn close_top(open: &mut Vec<DuEntry>, report: &mut DuReport, summary_only: bool) {
    let Some(done) = open.pop() else {
        return;
    };
    match open.last_mut() {
        Some(parent) => parent.bytes += done.bytes,
        None => report.total = done.bytes,
    }
    if !summary_only {
        report.entries.push(done);
    }
}
