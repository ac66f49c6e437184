//! Line loading and streaming line access.
//!
//! [`LineBuffer`] is the byte-exact line view used by the text engines.
//! `head`, `tail` and the internal line streamer read incrementally so their
//! memory use is bounded by the requested window, not by the file size.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{io_error, CoreError, CoreResult};

/// An ordered sequence of lines without terminators.
///
/// Re-joining [`LineBuffer::lines`] with `\n` and appending a final `\n`
/// iff [`LineBuffer::ends_with_newline`] reproduces the source bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<Vec<u8>>,
    ends_with_newline: bool,
}

impl LineBuffer {
    /// Splits `bytes` at `\n`. A trailing `\r` stays attached to its line.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::default();
        }
        let ends_with_newline = bytes.last() == Some(&b'\n');
        let body = if ends_with_newline {
            &bytes[..bytes.len() - 1]
        } else {
            bytes
        };
        Self {
            lines: body.split(|&b| b == b'\n').map(<[u8]>::to_vec).collect(),
            ends_with_newline,
        }
    }

    /// Builds a buffer from already-split lines.
    pub fn from_lines(lines: Vec<Vec<u8>>, ends_with_newline: bool) -> Self {
        Self {
            ends_with_newline: ends_with_newline && !lines.is_empty(),
            lines,
        }
    }

    pub fn lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<Vec<u8>> {
        self.lines
    }

    pub fn ends_with_newline(&self) -> bool {
        self.ends_with_newline
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines decoded as UTF-8, with invalid sequences replaced.
    pub fn to_strings_lossy(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect()
    }

    /// Re-joins the lines into the original byte stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        join_lines(&self.lines, self.ends_with_newline)
    }
}

/// Joins lines with `\n`, appending a final `\n` when `trailing_newline`.
pub fn join_lines<T: AsRef<[u8]>>(lines: &[T], trailing_newline: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(lines.iter().map(|l| l.as_ref().len() + 1).sum());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        out.extend_from_slice(line.as_ref());
    }
    if trailing_newline && !lines.is_empty() {
        out.push(b'\n');
    }
    out
}

/// Opens `path` for reading, rejecting directories.
///
/// # Errors
///
/// - [`CoreError::NotFound`]: the path does not exist.
/// - [`CoreError::IsADirectory`]: the path is a directory.
/// - [`CoreError::PermissionDenied`]: read access is denied.
pub fn open_file(path: &Path) -> CoreResult<File> {
    let meta = std::fs::metadata(path).map_err(io_error(path))?;
    if meta.is_dir() {
        return Err(CoreError::IsADirectory(path.to_path_buf()));
    }
    File::open(path).map_err(io_error(path))
}

/// Reads the whole file into memory.
pub fn read_bytes(path: &Path) -> CoreResult<Vec<u8>> {
    let mut file = open_file(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(io_error(path))?;
    Ok(buf)
}

/// Loads `path` into a [`LineBuffer`].
///
/// # Errors
///
/// Same as [`open_file`], plus [`CoreError::Io`] for read failures.
pub fn load(path: &Path) -> CoreResult<LineBuffer> {
    Ok(LineBuffer::from_bytes(&read_bytes(path)?))
}

/// Streams the lines of `path` to `visit` without buffering the file.
///
/// `visit` receives each line (terminator stripped) and whether it was
/// terminated by `\n`; returning `false` stops the read early.
pub(crate) fn stream_lines<F>(path: &Path, mut visit: F) -> CoreResult<()>
where
    F: FnMut(&[u8], bool) -> bool,
{
    let mut reader = BufReader::new(open_file(path)?);
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line).map_err(io_error(path))?;
        if read == 0 {
            return Ok(());
        }
        let terminated = line.last() == Some(&b'\n');
        if terminated {
            line.pop();
        }
        if !visit(&line, terminated) {
            return Ok(());
        }
    }
}

/// Returns the first `n` lines, stopping the read once they are found.
pub fn head(path: &Path, n: usize) -> CoreResult<LineBuffer> {
    let mut lines = Vec::with_capacity(n.min(1024));
    let mut last_terminated = false;
    if n == 0 {
        open_file(path)?;
        return Ok(LineBuffer::default());
    }
    stream_lines(path, |line, terminated| {
        lines.push(line.to_vec());
        last_terminated = terminated;
        lines.len() < n
    })?;
    Ok(LineBuffer::from_lines(lines, last_terminated))
}

/// Returns the last `n` lines using a ring buffer of at most `n` lines.
///
/// When the file has fewer than `n` lines, all of them are returned.
pub fn tail(path: &Path, n: usize) -> CoreResult<LineBuffer> {
    let mut window: VecDeque<Vec<u8>> = VecDeque::with_capacity(n.min(1024));
    let mut last_terminated = false;
    if n == 0 {
        open_file(path)?;
        return Ok(LineBuffer::default());
    }
    stream_lines(path, |line, terminated| {
        if window.len() == n {
            window.pop_front();
        }
        window.push_back(line.to_vec());
        last_terminated = terminated;
        true
    })?;
    Ok(LineBuffer::from_lines(window.into(), last_terminated))
}

/// Returns at most the first `n` bytes.
pub fn head_bytes(path: &Path, n: u64) -> CoreResult<Vec<u8>> {
    let file = open_file(path)?;
    let mut buf = Vec::new();
    file.take(n).read_to_end(&mut buf).map_err(io_error(path))?;
    Ok(buf)
}

/// Returns at most the last `n` bytes, seeking from the end.
pub fn tail_bytes(path: &Path, n: u64) -> CoreResult<Vec<u8>> {
    let mut file = open_file(path)?;
    let len = file.metadata().map_err(io_error(path))?.len();
    let start = len.saturating_sub(n);
    file.seek(SeekFrom::Start(start)).map_err(io_error(path))?;
    let mut buf = Vec::with_capacity((len - start) as usize);
    file.read_to_end(&mut buf).map_err(io_error(path))?;
    Ok(buf)
}

/// Options for [`cat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CatOptions {
    /// Prefix each output line with its 1-based number.
    pub number_lines: bool,
    /// Collapse runs of empty lines into one.
    pub squeeze_blank: bool,
}

/// Returns the file contents, optionally numbered or squeezed.
///
/// With default options the bytes are returned unchanged.
pub fn cat(path: &Path, options: CatOptions) -> CoreResult<Vec<u8>> {
    let bytes = read_bytes(path)?;
    if !options.number_lines && !options.squeeze_blank {
        return Ok(bytes);
    }

    let buffer = LineBuffer::from_bytes(&bytes);
    let mut kept: Vec<Vec<u8>> = Vec::with_capacity(buffer.len());
    let mut prev_blank = false;
    let mut number = 0usize;

    for line in buffer.lines() {
        let blank = line.is_empty();
        if options.squeeze_blank && blank && prev_blank {
            continue;
        }
        prev_blank = blank;

        if options.number_lines {
            number += 1;
            let mut numbered = format!("{number:>6}\t").into_bytes();
            numbered.extend_from_slice(line);
            kept.push(numbered);
        } else {
            kept.push(line.clone());
        }
    }

    Ok(join_lines(&kept, buffer.ends_with_newline()))
}
