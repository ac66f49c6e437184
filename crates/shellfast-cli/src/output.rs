//! Rendering of core results for the terminal.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;

use serde::Serialize;
use shellfast_core::text::comm::{Column, Partition};
use shellfast_core::text::diff::{DiffHunk, DiffOp};
use shellfast_core::text::grep::{GrepMatch, GrepOutput};
use shellfast_core::{FileEntry, FileKind, LineBuffer};

/// Output format selection for all subcommands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Single JSON value on stdout.
    Json,
    /// Conventional utility output on stdout.
    #[default]
    Human,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Human => write!(f, "human"),
        }
    }
}

/// Writes `value` as one line of JSON.
pub fn emit_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Formats a byte count with binary units: `512`, `1.5K`, `3.0M`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "K", "M", "G", "T", "P"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        bytes.to_string()
    } else {
        format!("{size:.1}{}", UNITS[unit])
    }
}

pub fn size_string(bytes: u64, human: bool) -> String {
    if human {
        human_size(bytes)
    } else {
        bytes.to_string()
    }
}

/// `ls -l` style mode string, e.g. `drwxr-xr-x`.
pub fn mode_string(kind: FileKind, permissions: u32) -> String {
    let mut s = String::with_capacity(10);
    s.push(match kind {
        FileKind::Dir => 'd',
        FileKind::Symlink => 'l',
        FileKind::File => '-',
        FileKind::Other => '?',
    });
    for shift in [6, 3, 0] {
        let bits = (permissions >> shift) & 0o7;
        s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        s.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    s
}

pub fn format_time_ago(time: SystemTime) -> String {
    let elapsed = match SystemTime::now().duration_since(time) {
        Ok(d) => d,
        Err(_) => return "just now".to_owned(),
    };

    let secs = elapsed.as_secs();
    if secs < 60 {
        return format!("{secs}s ago");
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{mins}m ago");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    format!("{days}d ago")
}

/// Path of `entry` relative to the listed directory, or its name.
fn display_path(entry: &FileEntry, base: &Path) -> String {
    entry
        .path()
        .strip_prefix(base)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| entry.name().to_string())
}

pub fn write_listing<W: Write>(
    out: &mut W,
    entries: &[FileEntry],
    base: &Path,
    long: bool,
    human: bool,
) -> anyhow::Result<()> {
    for entry in entries {
        let name = display_path(entry, base);
        if long {
            let age = entry
                .modified()
                .map(format_time_ago)
                .unwrap_or_else(|| "-".to_owned());
            writeln!(
                out,
                "{} {:>8} {:>9} {}",
                mode_string(entry.kind(), entry.permissions()),
                size_string(entry.size(), human),
                age,
                name
            )?;
        } else {
            writeln!(out, "{name}")?;
        }
    }
    Ok(())
}

/// Lines of a buffer as lossy strings, for JSON output.
#[derive(Debug, Serialize)]
pub struct LinesView {
    pub lines: Vec<String>,
    pub ends_with_newline: bool,
}

impl From<&LineBuffer> for LinesView {
    fn from(buffer: &LineBuffer) -> Self {
        Self {
            lines: buffer.to_strings_lossy(),
            ends_with_newline: buffer.ends_with_newline(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchView {
    pub path: String,
    pub line_number: Option<u64>,
    pub line: String,
}

impl From<&GrepMatch> for MatchView {
    fn from(m: &GrepMatch) -> Self {
        Self {
            path: m.path.display().to_string(),
            line_number: m.line_number,
            line: m.line_lossy(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", content = "results", rename_all = "lowercase")]
pub enum GrepView {
    Lines(Vec<MatchView>),
    Counts(Vec<(String, u64)>),
    Files(Vec<String>),
}

impl From<&GrepOutput> for GrepView {
    fn from(output: &GrepOutput) -> Self {
        match output {
            GrepOutput::Lines(matches) => GrepView::Lines(matches.iter().map(MatchView::from).collect()),
            GrepOutput::Counts(counts) => GrepView::Counts(
                counts
                    .iter()
                    .map(|(p, n)| (p.display().to_string(), *n))
                    .collect(),
            ),
            GrepOutput::Files(files) => {
                GrepView::Files(files.iter().map(|p| p.display().to_string()).collect())
            }
        }
    }
}

/// Writes grep results; file names are prefixed when `with_names` is set.
pub fn write_grep<W: Write>(out: &mut W, output: &GrepOutput, with_names: bool) -> anyhow::Result<()> {
    match output {
        GrepOutput::Lines(matches) => {
            for m in matches {
                if with_names {
                    write!(out, "{}:", m.path.display())?;
                }
                if let Some(n) = m.line_number {
                    write!(out, "{n}:")?;
                }
                out.write_all(&m.line)?;
                out.write_all(b"\n")?;
            }
        }
        GrepOutput::Counts(counts) => {
            for (path, n) in counts {
                if with_names {
                    writeln!(out, "{}:{n}", path.display())?;
                } else {
                    writeln!(out, "{n}")?;
                }
            }
        }
        GrepOutput::Files(files) => {
            for path in files {
                writeln!(out, "{}", path.display())?;
            }
        }
    }
    Ok(())
}

pub fn lossy_hunks(hunks: &[DiffHunk<Vec<u8>>]) -> Vec<DiffHunk<String>> {
    hunks
        .iter()
        .map(|h| DiffHunk {
            op: h.op,
            lines: h
                .lines
                .iter()
                .map(|l| String::from_utf8_lossy(l).into_owned())
                .collect(),
        })
        .collect()
}

pub fn lossy_partition(part: &Partition<Vec<u8>>) -> Partition<String> {
    let lossy = |lines: &[Vec<u8>]| -> Vec<String> {
        lines
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect()
    };
    Partition {
        only_first: lossy(&part.only_first),
        only_second: lossy(&part.only_second),
        both: lossy(&part.both),
    }
}

/// Three-column `comm` output, one row per merged line in merge order.
pub fn write_comm<W: Write>(out: &mut W, rows: &[(Column, Vec<u8>)]) -> anyhow::Result<()> {
    for (column, line) in rows {
        let indent: &[u8] = match column {
            Column::OnlyFirst => b"",
            Column::OnlySecond => b"\t",
            Column::Both => b"\t\t",
        };
        out.write_all(indent)?;
        out.write_all(line)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

pub fn has_changes(hunks: &[DiffHunk<Vec<u8>>]) -> bool {
    hunks.iter().any(|h| h.op != DiffOp::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_size_bytes() {
        assert_eq!(human_size(0), "0");
        assert_eq!(human_size(1023), "1023");
    }

    #[test]
    fn human_size_units() {
        assert_eq!(human_size(1024), "1.0K");
        assert_eq!(human_size(1536), "1.5K");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0M");
        assert_eq!(human_size(1024 * 1024 * 1024), "1.0G");
    }

    #[test]
    fn mode_strings() {
        assert_eq!(mode_string(FileKind::Dir, 0o755), "drwxr-xr-x");
        assert_eq!(mode_string(FileKind::File, 0o640), "-rw-r-----");
        assert_eq!(mode_string(FileKind::Symlink, 0o777), "lrwxrwxrwx");
    }

    #[test]
    fn json_emit_is_one_line() {
        let mut buf = Vec::new();
        emit_json(&mut buf, &serde_json::json!({"lines": 2})).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "{\"lines\":2}\n");
    }

    #[test]
    fn comm_columns_interleave_in_order() {
        let rows = shellfast_core::comm_merge(
            &[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()],
            &[b"b".to_vec(), b"c".to_vec(), b"d".to_vec()],
        );
        let mut buf = Vec::new();
        write_comm(&mut buf, &rows).unwrap();
        assert_eq!(buf, b"a\n\t\tb\n\t\tc\n\td\n".to_vec());
    }

    #[test]
    fn comm_duplicates_print_in_merge_order() {
        let rows = shellfast_core::comm_merge(
            &[b"a".to_vec(), b"a".to_vec()],
            &[b"a".to_vec()],
        );
        let mut buf = Vec::new();
        write_comm(&mut buf, &rows).unwrap();
        assert_eq!(buf, b"\t\ta\na\n".to_vec());
    }

    #[test]
    fn grep_counts_with_and_without_names() {
        let output = GrepOutput::Counts(vec![("f.txt".into(), 3)]);
        let mut plain = Vec::new();
        write_grep(&mut plain, &output, false).unwrap();
        assert_eq!(plain, b"3\n".to_vec());

        let mut named = Vec::new();
        write_grep(&mut named, &output, true).unwrap();
        assert_eq!(named, b"f.txt:3\n".to_vec());
    }
}
