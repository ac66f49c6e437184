//! Line diff (Myers) and byte comparison.

use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::error::{io_error, CoreResult};
use crate::text::lines::{self, open_file};

/// The operation of a [`DiffHunk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    Equal,
    Insert,
    Delete,
}

/// A maximal run of lines sharing one operation.
///
/// Concatenating the `Equal` and `Delete` hunks in order yields the old
/// sequence; concatenating `Equal` and `Insert` hunks yields the new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffHunk<T> {
    pub op: DiffOp,
    pub lines: Vec<T>,
}

/// Computes a minimal edit script from `old` to `new`.
///
/// Within each divergent region every deletion is emitted before any
/// insertion, matching conventional unified-diff output. Memory use is
/// linear in the input length.
pub fn diff_lines<T>(old: &[T], new: &[T]) -> Vec<DiffHunk<T>>
where
    T: AsRef<[u8]> + Clone,
{
    let pairs = common_subsequence(old, new);
    build_hunks(old, new, &pairs)
}

/// Loads both files and diffs their lines.
///
/// # Errors
///
/// - [`crate::CoreError::NotFound`] if either path is missing.
/// - [`crate::CoreError::IsADirectory`] if either path is a directory.
pub fn diff_files(old: &Path, new: &Path) -> CoreResult<Vec<DiffHunk<Vec<u8>>>> {
    let a = lines::load(old)?;
    let b = lines::load(new)?;
    tracing::debug!(old = %old.display(), new = %new.display(), "diff");
    Ok(diff_lines(a.lines(), b.lines()))
}

/// Returns `true` when the script contains no insertions or deletions.
pub fn is_identical<T>(hunks: &[DiffHunk<T>]) -> bool {
    hunks.iter().all(|h| h.op == DiffOp::Equal)
}

/// Index pairs `(old, new)` of a longest common subsequence, ascending.
fn common_subsequence<T: AsRef<[u8]>>(old: &[T], new: &[T]) -> Vec<(usize, usize)> {
    // A line missing from the other side is never part of the subsequence.
    let in_old: HashSet<&[u8]> = old.iter().map(AsRef::as_ref).collect();
    let in_new: HashSet<&[u8]> = new.iter().map(AsRef::as_ref).collect();
    let a_idx: Vec<usize> = (0..old.len())
        .filter(|&i| in_new.contains(old[i].as_ref()))
        .collect();
    let b_idx: Vec<usize> = (0..new.len())
        .filter(|&j| in_old.contains(new[j].as_ref()))
        .collect();
    let a: Vec<&[u8]> = a_idx.iter().map(|&i| old[i].as_ref()).collect();
    let b: Vec<&[u8]> = b_idx.iter().map(|&j| new[j].as_ref()).collect();

    let mut pairs = Vec::new();
    conquer(&a, &b, 0, 0, &mut pairs);
    pairs
        .into_iter()
        .map(|(x, y)| (a_idx[x], b_idx[y]))
        .collect()
}

/// Linear-space Myers: strips the common prefix and suffix, then splits the
/// remainder at the middle snake and recurses on both halves.
fn conquer(a: &[&[u8]], b: &[&[u8]], x0: usize, y0: usize, out: &mut Vec<(usize, usize)>) {
    let prefix = a.iter().zip(b).take_while(|(p, q)| p == q).count();
    out.extend((0..prefix).map(|i| (x0 + i, y0 + i)));
    let (a, b) = (&a[prefix..], &b[prefix..]);
    let (x0, y0) = (x0 + prefix, y0 + prefix);

    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(p, q)| p == q)
        .count();
    let a_mid = &a[..a.len() - suffix];
    let b_mid = &b[..b.len() - suffix];

    if !a_mid.is_empty() && !b_mid.is_empty() {
        if let Some((x, y)) = middle_snake(a_mid, b_mid) {
            conquer(&a_mid[..x], &b_mid[..y], x0, y0, out);
            conquer(&a_mid[x..], &b_mid[y..], x0 + x, y0 + y, out);
        }
    }

    let (tail_x, tail_y) = (x0 + a_mid.len(), y0 + b_mid.len());
    out.extend((0..suffix).map(|i| (tail_x + i, tail_y + i)));
}

/// Diagonal-indexed furthest-reaching x values.
struct Frontier {
    offset: isize,
    v: Vec<isize>,
}

impl Frontier {
    fn new(max_d: isize) -> Self {
        Self {
            offset: max_d + 1,
            v: vec![0; 2 * (max_d as usize + 1) + 1],
        }
    }

    fn get(&self, k: isize) -> isize {
        self.v[(k + self.offset) as usize]
    }

    fn set(&mut self, k: isize, x: isize) {
        self.v[(k + self.offset) as usize] = x;
    }
}

/// Finds a point on an optimal edit path roughly halfway through it,
/// searching forward from the start and backward from the end at once.
/// Both inputs must be non-empty.
fn middle_snake(a: &[&[u8]], b: &[&[u8]]) -> Option<(usize, usize)> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let delta = n - m;
    let odd = delta & 1 == 1;
    let max_d = (n + m + 1) / 2 + 1;

    let mut vf = Frontier::new(max_d);
    let mut vb = Frontier::new(max_d);

    for d in 0..max_d {
        let mut k = d;
        while k >= -d {
            let mut x = if k == -d || (k != d && vf.get(k - 1) < vf.get(k + 1)) {
                vf.get(k + 1)
            } else {
                vf.get(k - 1) + 1
            };
            let (x0, y0) = (x, x - k);
            let mut y = y0;
            let inside = x0 <= n && (0..=m).contains(&y0);
            while x < n && y >= 0 && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            vf.set(k, x);
            if inside && odd && (k - delta).abs() <= d - 1 && x + vb.get(delta - k) >= n {
                return Some((x0 as usize, y0 as usize));
            }
            k -= 2;
        }

        let mut k = d;
        while k >= -d {
            let mut x = if k == -d || (k != d && vb.get(k - 1) < vb.get(k + 1)) {
                vb.get(k + 1)
            } else {
                vb.get(k - 1) + 1
            };
            let mut y = x - k;
            while x < n
                && y >= 0
                && y < m
                && a[(n - x - 1) as usize] == b[(m - y - 1) as usize]
            {
                x += 1;
                y += 1;
            }
            vb.set(k, x);
            let inside = x <= n && (0..=m).contains(&y);
            if inside && !odd && (k - delta).abs() <= d && x + vf.get(delta - k) >= n {
                return Some(((n - x) as usize, (m - y) as usize));
            }
            k -= 2;
        }
    }
    None
}

/// Expands matched index pairs into hunks; each gap between matches becomes
/// its deletions followed by its insertions.
fn build_hunks<T: Clone>(old: &[T], new: &[T], pairs: &[(usize, usize)]) -> Vec<DiffHunk<T>> {
    let mut hunks: Vec<DiffHunk<T>> = Vec::new();

    fn push<T>(hunks: &mut Vec<DiffHunk<T>>, op: DiffOp, line: T) {
        match hunks.last_mut() {
            Some(last) if last.op == op => last.lines.push(line),
            _ => hunks.push(DiffHunk {
                op,
                lines: vec![line],
            }),
        }
    }

    let gap = |hunks: &mut Vec<DiffHunk<T>>, x: std::ops::Range<usize>, y: std::ops::Range<usize>| {
        for line in &old[x] {
            push(hunks, DiffOp::Delete, line.clone());
        }
        for line in &new[y] {
            push(hunks, DiffOp::Insert, line.clone());
        }
    };

    let (mut x, mut y) = (0, 0);
    for &(px, py) in pairs {
        gap(&mut hunks, x..px, y..py);
        push(&mut hunks, DiffOp::Equal, old[px].clone());
        x = px + 1;
        y = py + 1;
    }
    gap(&mut hunks, x..old.len(), y..new.len());
    hunks
}

/// Renders an edit script as a unified diff with `context` lines around
/// each change. Identical inputs render to an empty string.
pub fn format_unified<T: AsRef<[u8]>>(
    hunks: &[DiffHunk<T>],
    old_label: &str,
    new_label: &str,
    context: usize,
) -> String {
    if is_identical(hunks) {
        return String::new();
    }

    let flat: Vec<(DiffOp, &[u8])> = hunks
        .iter()
        .flat_map(|h| h.lines.iter().map(move |l| (h.op, l.as_ref())))
        .collect();

    let changes: Vec<usize> = flat
        .iter()
        .enumerate()
        .filter(|(_, (op, _))| *op != DiffOp::Equal)
        .map(|(i, _)| i)
        .collect();

    // Group changes whose context windows touch.
    let mut groups: Vec<(usize, usize)> = Vec::new();
    for &i in &changes {
        let start = i.saturating_sub(context);
        let end = (i + 1 + context).min(flat.len());
        match groups.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => groups.push((start, end)),
        }
    }

    let mut out = format!("--- {old_label}\n+++ {new_label}\n");
    for (start, end) in groups {
        let old_before = count_side(&flat[..start], DiffOp::Insert);
        let new_before = count_side(&flat[..start], DiffOp::Delete);
        let old_len = count_side(&flat[start..end], DiffOp::Insert);
        let new_len = count_side(&flat[start..end], DiffOp::Delete);

        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            range_label(old_before, old_len),
            range_label(new_before, new_len)
        ));
        for (op, line) in &flat[start..end] {
            let marker = match op {
                DiffOp::Equal => ' ',
                DiffOp::Delete => '-',
                DiffOp::Insert => '+',
            };
            out.push(marker);
            out.push_str(&String::from_utf8_lossy(line));
            out.push('\n');
        }
    }
    out
}

/// Counts lines that belong to one side, i.e. everything except `excluded`.
fn count_side(lines: &[(DiffOp, &[u8])], excluded: DiffOp) -> usize {
    lines.iter().filter(|(op, _)| *op != excluded).count()
}

fn range_label(before: usize, len: usize) -> String {
    match len {
        0 => format!("{before},0"),
        1 => format!("{}", before + 1),
        _ => format!("{},{}", before + 1, len),
    }
}

/// Result of a byte-wise comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CmpResult {
    pub identical: bool,
    /// 0-based offset of the first differing byte, or the length of the
    /// shorter file when one is a prefix of the other.
    pub first_difference_offset: Option<u64>,
    /// 1-based line containing that byte.
    pub line_number: Option<u64>,
}

/// Compares two files byte by byte, stopping at the first difference.
pub fn cmp_files(a: &Path, b: &Path) -> CoreResult<CmpResult> {
    let mut ra = BufReader::new(open_file(a)?);
    let mut rb = BufReader::new(open_file(b)?);
    let mut offset = 0u64;
    let mut line = 1u64;

    loop {
        let ba = ra.fill_buf().map_err(io_error(a))?;
        let bb = rb.fill_buf().map_err(io_error(b))?;

        if ba.is_empty() && bb.is_empty() {
            return Ok(CmpResult {
                identical: true,
                first_difference_offset: None,
                line_number: None,
            });
        }
        if ba.is_empty() || bb.is_empty() {
            return Ok(differ(offset, line));
        }

        let n = ba.len().min(bb.len());
        if let Some(pos) = ba[..n].iter().zip(&bb[..n]).position(|(x, y)| x != y) {
            line += count_newlines(&ba[..pos]);
            return Ok(differ(offset + pos as u64, line));
        }

        line += count_newlines(&ba[..n]);
        offset += n as u64;
        ra.consume(n);
        rb.consume(n);
    }
}

fn differ(offset: u64, line: u64) -> CmpResult {
    CmpResult {
        identical: false,
        first_difference_offset: Some(offset),
        line_number: Some(line),
    }
}

fn count_newlines(bytes: &[u8]) -> u64 {
    bytes.iter().filter(|&&b| b == b'\n').count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::fs;
    use tempfile::TempDir;

    fn ops<T>(hunks: &[DiffHunk<T>]) -> Vec<DiffOp> {
        hunks.iter().map(|h| h.op).collect()
    }

    fn side<'a>(hunks: &[DiffHunk<&'a str>], skip: DiffOp) -> Vec<&'a str> {
        hunks
            .iter()
            .filter(|h| h.op != skip)
            .flat_map(|h| h.lines.iter().copied())
            .collect()
    }

    fn changed(hunks: &[DiffHunk<&str>]) -> usize {
        hunks
            .iter()
            .filter(|h| h.op != DiffOp::Equal)
            .map(|h| h.lines.len())
            .sum()
    }

    #[test]
    fn identical_sequences_are_one_equal_hunk() {
        let hunks = diff_lines(&["a", "b"], &["a", "b"]);
        assert_eq!(
            hunks,
            vec![DiffHunk {
                op: DiffOp::Equal,
                lines: vec!["a", "b"]
            }]
        );
        assert!(is_identical(&hunks));
    }

    #[test]
    fn empty_inputs() {
        let empty: [&str; 0] = [];
        assert!(diff_lines(&empty, &empty).is_empty());

        let hunks = diff_lines(&empty, &["x", "y"]);
        assert_eq!(ops(&hunks), vec![DiffOp::Insert]);

        let hunks = diff_lines(&["x"], &empty);
        assert_eq!(ops(&hunks), vec![DiffOp::Delete]);
    }

    #[test]
    fn deletions_come_before_insertions() {
        let hunks = diff_lines(&["a", "b", "c"], &["a", "x", "c"]);
        assert_eq!(
            ops(&hunks),
            vec![DiffOp::Equal, DiffOp::Delete, DiffOp::Insert, DiffOp::Equal]
        );
        assert_eq!(hunks[1].lines, vec!["b"]);
        assert_eq!(hunks[2].lines, vec!["x"]);
    }

    #[test]
    fn disjoint_sequences() {
        let old = ["a", "b", "c"];
        let new = ["x", "y"];
        let hunks = diff_lines(&old, &new);
        assert_eq!(ops(&hunks), vec![DiffOp::Delete, DiffOp::Insert]);
        assert_eq!(side(&hunks, DiffOp::Insert), old);
        assert_eq!(side(&hunks, DiffOp::Delete), new);
    }

    #[test]
    fn script_is_minimal() {
        // Classic Myers example: LCS has length 4, so 3 + 2 edits.
        let old = ["A", "B", "C", "A", "B", "B", "A"];
        let new = ["C", "B", "A", "B", "A", "C"];
        let hunks = diff_lines(&old, &new);
        assert_eq!(changed(&hunks), 5);
        assert_eq!(side(&hunks, DiffOp::Insert), old);
        assert_eq!(side(&hunks, DiffOp::Delete), new);
    }

    #[test]
    fn reconstructs_both_sides_with_repeats() {
        let old = ["x", "a", "x", "b", "x"];
        let new = ["a", "x", "x", "b", "c", "x"];
        let hunks = diff_lines(&old, &new);
        assert_eq!(side(&hunks, DiffOp::Insert), old);
        assert_eq!(side(&hunks, DiffOp::Delete), new);
    }

    #[test]
    fn large_disjoint_inputs() {
        let old: Vec<String> = (0..20_000).map(|i| format!("a{i}")).collect();
        let new: Vec<String> = (0..20_000).map(|i| format!("b{i}")).collect();
        let hunks = diff_lines(&old, &new);
        assert_eq!(ops(&hunks), vec![DiffOp::Delete, DiffOp::Insert]);
        assert_eq!(hunks[0].lines, old);
        assert_eq!(hunks[1].lines, new);
    }

    #[test]
    fn large_inputs_with_scattered_changes() {
        let old: Vec<String> = (0..6_000).map(|i| format!("line {}", i % 500)).collect();
        let new: Vec<String> = old
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 7 != 0)
            .map(|(i, l)| if i % 11 == 0 { format!("{l}!") } else { l.clone() })
            .collect();
        let hunks = diff_lines(&old, &new);
        let rebuilt_old: Vec<&String> = hunks
            .iter()
            .filter(|h| h.op != DiffOp::Insert)
            .flat_map(|h| h.lines.iter())
            .collect();
        let rebuilt_new: Vec<&String> = hunks
            .iter()
            .filter(|h| h.op != DiffOp::Delete)
            .flat_map(|h| h.lines.iter())
            .collect();
        assert_eq!(rebuilt_old, old.iter().collect::<Vec<_>>());
        assert_eq!(rebuilt_new, new.iter().collect::<Vec<_>>());
    }

    #[test]
    fn reversed_input_is_minimal() {
        let old: Vec<String> = (0..400).map(|i| i.to_string()).collect();
        let new: Vec<String> = old.iter().rev().cloned().collect();
        let hunks = diff_lines(&old, &new);
        let kept: usize = hunks
            .iter()
            .filter(|h| h.op == DiffOp::Equal)
            .map(|h| h.lines.len())
            .sum();
        // Distinct lines reversed share exactly one line in any common subsequence.
        assert_eq!(kept, 1);
    }

    #[test]
    fn diff_files_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        fs::write(&a, "x\n").unwrap();
        let err = diff_files(&a, &tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn unified_identical_is_empty() {
        let hunks = diff_lines(&["a"], &["a"]);
        assert_eq!(format_unified(&hunks, "a", "b", 3), "");
    }

    #[test]
    fn unified_renders_headers_and_markers() {
        let hunks = diff_lines(&["a", "b", "c"], &["a", "x", "c"]);
        let text = format_unified(&hunks, "old.txt", "new.txt", 3);
        assert_eq!(
            text,
            "--- old.txt\n+++ new.txt\n@@ -1,3 +1,3 @@\n a\n-b\n+x\n c\n"
        );
    }

    #[test]
    fn unified_splits_distant_changes() {
        let old: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        let mut new = old.clone();
        new[1] = "one".to_string();
        new[18] = "eighteen".to_string();
        let hunks = diff_lines(&old, &new);
        let text = format_unified(&hunks, "a", "b", 2);
        assert_eq!(text.matches("@@ -").count(), 2);
        assert!(text.contains("@@ -1,4 +1,4 @@"));
        assert!(text.contains("@@ -17,4 +17,4 @@"));
    }

    #[test]
    fn unified_pure_insertion_into_empty() {
        let empty: [&str; 0] = [];
        let hunks = diff_lines(&empty, &["n"]);
        let text = format_unified(&hunks, "a", "b", 3);
        assert!(text.contains("@@ -0,0 +1 @@\n+n\n"));
    }

    #[test]
    fn cmp_identical_files() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::write(&a, "same\nbytes").unwrap();
        fs::write(&b, "same\nbytes").unwrap();
        let result = cmp_files(&a, &b).unwrap();
        assert!(result.identical);
        assert_eq!(result.first_difference_offset, None);
    }

    #[test]
    fn cmp_reports_first_difference() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::write(&a, "line1\nabc").unwrap();
        fs::write(&b, "line1\nabd").unwrap();
        let result = cmp_files(&a, &b).unwrap();
        assert!(!result.identical);
        assert_eq!(result.first_difference_offset, Some(8));
        assert_eq!(result.line_number, Some(2));
    }

    #[test]
    fn cmp_length_mismatch() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::write(&a, "abc").unwrap();
        fs::write(&b, "abcdef").unwrap();
        let result = cmp_files(&a, &b).unwrap();
        assert!(!result.identical);
        assert_eq!(result.first_difference_offset, Some(3));
    }

    #[test]
    fn cmp_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        fs::write(&a, "abc").unwrap();
        let err = cmp_files(&tmp.path().join("nope"), &a).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
