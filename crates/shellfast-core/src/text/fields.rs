//! Delimiter-based field selection: `cut`, `paste` and `join`.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::text::lines::{self, stream_lines, LineBuffer};
use crate::text::sort::field_of;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldRange {
    Single(usize),
    Closed(usize, usize),
    From(usize),
    UpTo(usize),
}

/// A parsed list of 1-based fields such as `2`, `1,3`, `2-4`, `3-` or `-2`.
///
/// Selection keeps the order given, so `3,1` yields field 3 before field 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    ranges: Vec<FieldRange>,
}

impl FieldSpec {
    /// Returns the 0-based indices selected from a line with `count` fields.
    /// Fields past the end of the line are skipped.
    pub fn select(&self, count: usize) -> Vec<usize> {
        let mut picked = Vec::new();
        for range in &self.ranges {
            let (start, end) = match *range {
                FieldRange::Single(n) => (n, n),
                FieldRange::Closed(a, b) => (a, b),
                FieldRange::From(a) => (a, count),
                FieldRange::UpTo(b) => (1, b),
            };
            picked.extend((start..=end.min(count)).map(|f| f - 1));
        }
        picked
    }
}

impl FromStr for FieldSpec {
    type Err = CoreError;

    fn from_str(spec: &str) -> CoreResult<Self> {
        if spec.is_empty() {
            return Err(CoreError::InvalidArgument("empty field list".to_string()));
        }

        let bad = |part: &str| CoreError::InvalidArgument(format!("bad field: {part}"));
        let number = |s: &str, part: &str| -> CoreResult<usize> {
            match s.parse::<usize>() {
                Ok(0) => Err(CoreError::InvalidArgument(
                    "fields are numbered from 1".to_string(),
                )),
                Ok(n) => Ok(n),
                Err(_) => Err(bad(part)),
            }
        };

        let mut ranges = Vec::new();
        for part in spec.split(',') {
            let range = match part.split_once('-') {
                None => FieldRange::Single(number(part, part)?),
                Some(("", "")) => return Err(bad(part)),
                Some(("", b)) => FieldRange::UpTo(number(b, part)?),
                Some((a, "")) => FieldRange::From(number(a, part)?),
                Some((a, b)) => {
                    let (a, b) = (number(a, part)?, number(b, part)?);
                    if a > b {
                        return Err(CoreError::InvalidArgument(format!(
                            "decreasing field range: {part}"
                        )));
                    }
                    FieldRange::Closed(a, b)
                }
            };
            ranges.push(range);
        }
        Ok(Self { ranges })
    }
}

/// Options for [`cut`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutOptions {
    /// Exactly one character.
    pub delimiter: String,
    pub fields: String,
    /// Drop lines that contain no delimiter instead of passing them through.
    pub only_delimited: bool,
}

impl Default for CutOptions {
    fn default() -> Self {
        Self {
            delimiter: "\t".to_string(),
            fields: "1".to_string(),
            only_delimited: false,
        }
    }
}

impl CutOptions {
    fn validate(&self) -> CoreResult<FieldSpec> {
        if self.delimiter.chars().count() != 1 {
            return Err(CoreError::InvalidArgument(format!(
                "delimiter must be a single character, got {:?}",
                self.delimiter
            )));
        }
        self.fields.parse()
    }
}

/// Applies `cut` to in-memory lines.
pub fn cut_lines<T: AsRef<[u8]>>(lines: &[T], options: &CutOptions) -> CoreResult<Vec<Vec<u8>>> {
    let spec = options.validate()?;
    let delim = options.delimiter.as_bytes();
    Ok(lines
        .iter()
        .filter_map(|line| cut_one(line.as_ref(), delim, &spec, options.only_delimited))
        .collect())
}

/// Streams `path` through `cut`. The result ends with a newline iff the
/// last selected input line did.
pub fn cut(path: &Path, options: &CutOptions) -> CoreResult<LineBuffer> {
    let spec = options.validate()?;
    let delim = options.delimiter.as_bytes();
    tracing::debug!(path = %path.display(), ?options, "cut");

    let mut out = Vec::new();
    let mut last_terminated = false;
    stream_lines(path, |line, terminated| {
        if let Some(selected) = cut_one(line, delim, &spec, options.only_delimited) {
            out.push(selected);
            last_terminated = terminated;
        }
        true
    })?;
    Ok(LineBuffer::from_lines(out, last_terminated))
}

fn cut_one(line: &[u8], delim: &[u8], spec: &FieldSpec, only_delimited: bool) -> Option<Vec<u8>> {
    let fields = split_bytes(line, delim);
    if fields.len() == 1 {
        return (!only_delimited).then(|| line.to_vec());
    }

    let mut out = Vec::with_capacity(line.len());
    for (n, idx) in spec.select(fields.len()).into_iter().enumerate() {
        if n > 0 {
            out.extend_from_slice(delim);
        }
        out.extend_from_slice(fields[idx]);
    }
    Some(out)
}

fn split_bytes<'a>(line: &'a [u8], delim: &[u8]) -> Vec<&'a [u8]> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + delim.len() <= line.len() {
        if &line[i..i + delim.len()] == delim {
            fields.push(&line[start..i]);
            i += delim.len();
            start = i;
        } else {
            i += 1;
        }
    }
    fields.push(&line[start..]);
    fields
}

/// Merges columns row by row. Exhausted columns contribute empty fields
/// until every column is exhausted.
pub fn paste_columns<T: AsRef<[u8]>>(columns: &[Vec<T>], delimiter: &[u8]) -> Vec<Vec<u8>> {
    let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
    (0..rows)
        .map(|row| {
            let mut out = Vec::new();
            for (n, column) in columns.iter().enumerate() {
                if n > 0 {
                    out.extend_from_slice(delimiter);
                }
                if let Some(line) = column.get(row) {
                    out.extend_from_slice(line.as_ref());
                }
            }
            out
        })
        .collect()
}

/// Loads every file and pastes them side by side.
///
/// The result ends with a newline iff one of the inputs reaching the last
/// row does.
pub fn paste(files: &[PathBuf], delimiter: &str) -> CoreResult<LineBuffer> {
    let buffers = files
        .iter()
        .map(|f| lines::load(f))
        .collect::<CoreResult<Vec<_>>>()?;
    let rows = buffers.iter().map(LineBuffer::len).max().unwrap_or(0);
    let ends_with_newline = buffers
        .iter()
        .filter(|b| b.len() == rows)
        .any(LineBuffer::ends_with_newline);
    let columns: Vec<Vec<Vec<u8>>> = buffers.into_iter().map(LineBuffer::into_lines).collect();
    Ok(LineBuffer::from_lines(
        paste_columns(&columns, delimiter.as_bytes()),
        ends_with_newline,
    ))
}

/// Options for [`join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOptions {
    /// 1-based key field in the first input.
    pub field1: usize,
    /// 1-based key field in the second input.
    pub field2: usize,
    /// Field separator; runs of blanks when `None`, with a single space
    /// between the joined records.
    pub separator: Option<char>,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            field1: 1,
            field2: 1,
            separator: None,
        }
    }
}

impl JoinOptions {
    fn validate(&self) -> CoreResult<()> {
        if self.field1 == 0 || self.field2 == 0 {
            return Err(CoreError::InvalidArgument(
                "join fields are numbered from 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Equi-joins two inputs that are sorted on their key fields.
///
/// Each output record is `first <sep> second`. Runs of equal keys on both
/// sides produce their cross product; unpaired lines are dropped.
pub fn join_records<T: AsRef<[u8]>>(
    first: &[T],
    second: &[T],
    options: &JoinOptions,
) -> CoreResult<Vec<Vec<u8>>> {
    options.validate()?;

    let mut buf = [0u8; 4];
    let sep: Option<&[u8]> = match options.separator {
        Some(c) => Some(c.encode_utf8(&mut buf).as_bytes()),
        None => None,
    };
    let glue = sep.unwrap_or(b" ").to_vec();

    let key = |line: &[u8], field: usize| -> Vec<u8> {
        let found = match sep {
            Some(d) => split_bytes(line, d).get(field - 1).copied(),
            None => field_of(line, field, None),
        };
        found.unwrap_or(&[]).to_vec()
    };

    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < first.len() && j < second.len() {
        let ka = key(first[i].as_ref(), options.field1);
        let kb = key(second[j].as_ref(), options.field2);
        match ka.cmp(&kb) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                let i_end = i + first[i..]
                    .iter()
                    .take_while(|l| key(l.as_ref(), options.field1) == ka)
                    .count();
                let j_end = j + second[j..]
                    .iter()
                    .take_while(|l| key(l.as_ref(), options.field2) == kb)
                    .count();
                for a in &first[i..i_end] {
                    for b in &second[j..j_end] {
                        let mut record = a.as_ref().to_vec();
                        record.extend_from_slice(&glue);
                        record.extend_from_slice(b.as_ref());
                        out.push(record);
                    }
                }
                i = i_end;
                j = j_end;
            }
        }
    }
    Ok(out)
}

/// Loads two files and joins them with [`join_records`].
pub fn join(first: &Path, second: &Path, options: &JoinOptions) -> CoreResult<LineBuffer> {
    options.validate()?;
    let a = lines::load(first)?;
    let b = lines::load(second)?;
    let records = join_records(a.lines(), b.lines(), options)?;
    Ok(LineBuffer::from_lines(records, true))
}
