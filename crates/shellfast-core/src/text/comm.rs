//! Three-way partition of two sorted line sequences.

use std::cmp::Ordering;
use std::path::Path;

use serde::Serialize;

use crate::error::CoreResult;
use crate::text::lines;

/// The `comm` column a merged line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    OnlyFirst,
    OnlySecond,
    Both,
}

/// Result of [`comm_lines`]. Each column keeps the merge order of the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Partition<T> {
    pub only_first: Vec<T>,
    pub only_second: Vec<T>,
    pub both: Vec<T>,
}

impl<T: Clone> Partition<T> {
    /// Splits merged rows into their three columns.
    pub fn from_rows(rows: &[(Column, T)]) -> Self {
        let mut out = Partition {
            only_first: Vec::new(),
            only_second: Vec::new(),
            both: Vec::new(),
        };
        for (column, line) in rows {
            let target = match column {
                Column::OnlyFirst => &mut out.only_first,
                Column::OnlySecond => &mut out.only_second,
                Column::Both => &mut out.both,
            };
            target.push(line.clone());
        }
        out
    }
}

/// Merges two byte-sorted sequences, tagging every line with its column in
/// the order the merge visits it.
///
/// Sortedness is not checked: unsorted input produces whatever the merge
/// comparison yields. Duplicates are matched one-for-one, so a line that
/// appears twice in `first` and once in `second` is emitted once as
/// [`Column::Both`] and once as [`Column::OnlyFirst`].
pub fn comm_merge<T>(first: &[T], second: &[T]) -> Vec<(Column, T)>
where
    T: AsRef<[u8]> + Clone,
{
    let mut rows = Vec::with_capacity(first.len().max(second.len()));
    let (mut i, mut j) = (0, 0);

    while i < first.len() && j < second.len() {
        match first[i].as_ref().cmp(second[j].as_ref()) {
            Ordering::Equal => {
                rows.push((Column::Both, first[i].clone()));
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                rows.push((Column::OnlyFirst, first[i].clone()));
                i += 1;
            }
            Ordering::Greater => {
                rows.push((Column::OnlySecond, second[j].clone()));
                j += 1;
            }
        }
    }
    rows.extend(first[i..].iter().map(|l| (Column::OnlyFirst, l.clone())));
    rows.extend(second[j..].iter().map(|l| (Column::OnlySecond, l.clone())));
    rows
}

/// Partitions two byte-sorted sequences into three columns; see
/// [`comm_merge`] for the matching rules.
pub fn comm_lines<T>(first: &[T], second: &[T]) -> Partition<T>
where
    T: AsRef<[u8]> + Clone,
{
    Partition::from_rows(&comm_merge(first, second))
}

/// Loads both files and merges their lines.
pub fn comm_merge_files(first: &Path, second: &Path) -> CoreResult<Vec<(Column, Vec<u8>)>> {
    let a = lines::load(first)?;
    let b = lines::load(second)?;
    Ok(comm_merge(a.lines(), b.lines()))
}

/// Loads both files and partitions their lines.
pub fn comm_files(first: &Path, second: &Path) -> CoreResult<Partition<Vec<u8>>> {
    Ok(Partition::from_rows(&comm_merge_files(first, second)?))
}
