//! Line, word, character and byte counting.

use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::error::{io_error, CoreResult};
use crate::text::lines::open_file;

/// Options for [`wc`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WcOptions {
    /// Count lines only; the other counters are left as `None`.
    pub lines_only: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WcCounts {
    pub lines: u64,
    pub words: Option<u64>,
    pub chars: Option<u64>,
    pub bytes: Option<u64>,
}

/// Running counter fed in arbitrary chunks.
#[derive(Debug, Default)]
struct Counter {
    newlines: u64,
    words: u64,
    chars: u64,
    bytes: u64,
    in_word: bool,
    last: Option<u8>,
    /// Incomplete UTF-8 sequence carried over from the previous chunk.
    pending: Vec<u8>,
}

impl Counter {
    fn feed(&mut self, chunk: &[u8], lines_only: bool) {
        if chunk.is_empty() {
            return;
        }
        self.bytes += chunk.len() as u64;
        self.last = chunk.last().copied();
        self.newlines += chunk.iter().filter(|&&b| b == b'\n').count() as u64;
        if lines_only {
            return;
        }

        for &b in chunk {
            if is_space(b) {
                self.in_word = false;
            } else if !self.in_word {
                self.in_word = true;
                self.words += 1;
            }
        }

        let mut data = std::mem::take(&mut self.pending);
        data.extend_from_slice(chunk);
        self.count_chars(&data);
    }

    fn count_chars(&mut self, mut data: &[u8]) {
        loop {
            match std::str::from_utf8(data) {
                Ok(_) => {
                    self.chars += scalar_count(data);
                    return;
                }
                Err(e) => {
                    let (valid, rest) = data.split_at(e.valid_up_to());
                    self.chars += scalar_count(valid);
                    match e.error_len() {
                        Some(n) => {
                            self.chars += n as u64;
                            data = &rest[n..];
                        }
                        None => {
                            self.pending = rest.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }

    fn finish(self, lines_only: bool) -> WcCounts {
        let unterminated = self.bytes > 0 && self.last != Some(b'\n');
        let lines = self.newlines + u64::from(unterminated);
        if lines_only {
            return WcCounts {
                lines,
                ..Default::default()
            };
        }
        WcCounts {
            lines,
            words: Some(self.words),
            chars: Some(self.chars + self.pending.len() as u64),
            bytes: Some(self.bytes),
        }
    }
}

/// Number of scalar values in already-validated UTF-8.
fn scalar_count(valid: &[u8]) -> u64 {
    valid.iter().filter(|&&b| b & 0xC0 != 0x80).count() as u64
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Counts an in-memory byte stream.
pub fn wc_bytes(bytes: &[u8], options: WcOptions) -> WcCounts {
    let mut counter = Counter::default();
    counter.feed(bytes, options.lines_only);
    counter.finish(options.lines_only)
}

/// Counts `path` in a single buffered pass.
pub fn wc(path: &Path, options: WcOptions) -> CoreResult<WcCounts> {
    let mut reader = BufReader::new(open_file(path)?);
    let mut counter = Counter::default();
    loop {
        let chunk = reader.fill_buf().map_err(io_error(path))?;
        if chunk.is_empty() {
            break;
        }
        let n = chunk.len();
        counter.feed(chunk, options.lines_only);
        reader.consume(n);
    }
    Ok(counter.finish(options.lines_only))
}
