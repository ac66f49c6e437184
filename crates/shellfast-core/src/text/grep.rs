//! Line search over files and directory trees.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{io_error, CoreError, CoreResult};
use crate::fs::walk::{PathWalker, SortBy, TypeFilter, WalkOptions};
use crate::pattern::{MatchSpec, Matcher};
use crate::text::lines::stream_lines;

/// Options for [`grep`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrepOptions {
    pub ignore_case: bool,
    /// Select lines that do not match.
    pub invert: bool,
    /// Report per-file counts instead of lines.
    pub count_only: bool,
    /// Report only the files with at least one selected line.
    pub files_only: bool,
    /// The match must not touch word characters on either side.
    pub whole_word: bool,
    /// Record 1-based line numbers in [`GrepMatch::line_number`].
    pub line_numbers: bool,
    /// Search every regular file below a directory.
    pub recursive: bool,
}

impl GrepOptions {
    fn validate(&self) -> CoreResult<()> {
        if self.count_only && self.files_only {
            return Err(CoreError::InvalidArgument(
                "count_only and files_only are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One selected line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrepMatch {
    pub path: PathBuf,
    pub line_number: Option<u64>,
    /// The line without its terminator.
    pub line: Vec<u8>,
}

impl GrepMatch {
    pub fn line_lossy(&self) -> String {
        String::from_utf8_lossy(&self.line).into_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrepOutput {
    Lines(Vec<GrepMatch>),
    /// Selected-line count per searched file, including zero counts.
    Counts(Vec<(PathBuf, u64)>),
    Files(Vec<PathBuf>),
}

/// The result of one [`grep`] call.
#[derive(Debug)]
pub struct GrepReport {
    pub output: GrepOutput,
    /// Files a recursive search could not reach or read; they contribute
    /// nothing to `output`.
    pub errors: Vec<CoreError>,
}

/// Searches `path` for lines containing `pattern`. An empty pattern selects
/// every line.
///
/// # Errors
///
/// - [`CoreError::InvalidArgument`] for conflicting modes.
/// - [`CoreError::NotFound`] if `path` does not exist.
/// - [`CoreError::IsADirectory`] for a directory without `recursive`.
/// - Any read error on a single-file search.
pub fn grep(pattern: &str, path: &Path, options: &GrepOptions) -> CoreResult<GrepReport> {
    options.validate()?;
    let matcher = MatchSpec::substring(pattern)
        .case_insensitive(options.ignore_case)
        .invert(options.invert)
        .whole_word(options.whole_word)
        .compile()?;

    let meta = fs::metadata(path).map_err(io_error(path))?;
    let (files, mut errors) = if meta.is_dir() {
        if !options.recursive {
            return Err(CoreError::IsADirectory(path.to_path_buf()));
        }
        regular_files(path)?
    } else {
        (vec![path.to_path_buf()], Vec::new())
    };
    tracing::debug!(pattern, path = %path.display(), files = files.len(), "grep");

    let mut lines = Vec::new();
    let mut counts = Vec::new();
    let mut hits = Vec::new();

    for file in files {
        let searched = if options.count_only {
            count_matches(&matcher, &file).map(|n| counts.push((file.clone(), n)))
        } else if options.files_only {
            has_match(&matcher, &file).map(|hit| {
                if hit {
                    hits.push(file.clone());
                }
            })
        } else {
            collect_matches(&matcher, &file, options.line_numbers, &mut lines)
        };
        match searched {
            Ok(()) => {}
            Err(err) if meta.is_dir() => {
                tracing::warn!(error = %err, "skipping file");
                errors.push(err);
            }
            Err(err) => return Err(err),
        }
    }

    let output = if options.count_only {
        GrepOutput::Counts(counts)
    } else if options.files_only {
        GrepOutput::Files(hits)
    } else {
        GrepOutput::Lines(lines)
    };
    Ok(GrepReport { output, errors })
}

/// Regular files below `root` in name order, plus the walk errors met on
/// the way.
fn regular_files(root: &Path) -> CoreResult<(Vec<PathBuf>, Vec<CoreError>)> {
    let walker = PathWalker::new(
        root,
        WalkOptions {
            type_filter: Some(TypeFilter::File),
            sort_by: Some(SortBy::Name),
            ..Default::default()
        },
    )?;
    let mut files = Vec::new();
    let mut errors = Vec::new();
    for item in walker {
        match item {
            Ok(entry) => files.push(entry.path().to_path_buf()),
            Err(err) => errors.push(err),
        }
    }
    Ok((files, errors))
}

fn count_matches(matcher: &Matcher, file: &Path) -> CoreResult<u64> {
    let mut n = 0;
    stream_lines(file, |line, _| {
        if matcher.is_match(line) {
            n += 1;
        }
        true
    })?;
    Ok(n)
}

fn has_match(matcher: &Matcher, file: &Path) -> CoreResult<bool> {
    let mut found = false;
    stream_lines(file, |line, _| {
        found = matcher.is_match(line);
        !found
    })?;
    Ok(found)
}

fn collect_matches(
    matcher: &Matcher,
    file: &Path,
    line_numbers: bool,
    out: &mut Vec<GrepMatch>,
) -> CoreResult<()> {
    let mut number = 0u64;
    stream_lines(file, |line, _| {
        number += 1;
        if matcher.is_match(line) {
            out.push(GrepMatch {
                path: file.to_path_buf(),
                line_number: line_numbers.then_some(number),
                line: line.to_vec(),
            });
        }
        true
    })
}
