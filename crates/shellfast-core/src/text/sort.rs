//! Line sorting.
//!
//! Every mode is a total order: lines whose keys compare equal are ordered
//! by their raw bytes, and only byte-identical lines keep input order.

use std::cmp::Ordering;
use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::text::lines::{self, LineBuffer};

/// Options for [`sort_lines`] and [`sort_file`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortOptions {
    /// Emit the exact reverse of the ascending order.
    pub reverse: bool,
    /// Compare by leading numeric value instead of bytes.
    pub numeric: bool,
    /// Collapse adjacent byte-identical lines after sorting.
    pub unique: bool,
    /// Fold ASCII case before comparing keys.
    pub ignore_case: bool,
    /// 1-based field used as the sort key; whole line when `None`.
    pub key: Option<usize>,
    /// Field separator for `key`; runs of blanks when `None`.
    pub separator: Option<u8>,
}

impl SortOptions {
    fn validate(&self) -> CoreResult<()> {
        if self.key == Some(0) {
            return Err(CoreError::InvalidArgument(
                "sort key fields are numbered from 1".to_string(),
            ));
        }
        if self.separator.is_some() && self.key.is_none() {
            return Err(CoreError::InvalidArgument(
                "separator requires a sort key".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sorts `lines` and returns a **new** vector; the input is never mutated.
///
/// # Errors
///
/// - [`CoreError::InvalidArgument`] for a zero key or a separator without key.
pub fn sort_lines<T>(lines: &[T], options: &SortOptions) -> CoreResult<Vec<T>>
where
    T: AsRef<[u8]> + Clone,
{
    options.validate()?;

    let mut sorted = lines.to_vec();
    sorted.sort_by(|a, b| compare_lines(a.as_ref(), b.as_ref(), options));

    if options.reverse {
        sorted.reverse();
    }
    if options.unique {
        sorted.dedup_by(|a, b| a.as_ref() == b.as_ref());
    }
    Ok(sorted)
}

/// Loads `path` and sorts its lines. The result always ends with a newline
/// unless it is empty.
pub fn sort_file(path: &Path, options: &SortOptions) -> CoreResult<LineBuffer> {
    options.validate()?;
    let buffer = lines::load(path)?;
    tracing::debug!(path = %path.display(), lines = buffer.len(), ?options, "sort");
    let sorted = sort_lines(buffer.lines(), options)?;
    Ok(LineBuffer::from_lines(sorted, true))
}

fn compare_lines(a: &[u8], b: &[u8], options: &SortOptions) -> Ordering {
    let ka = sort_key(a, options);
    let kb = sort_key(b, options);

    let ord = if options.numeric {
        NumericKey::parse(ka).cmp(&NumericKey::parse(kb))
    } else if options.ignore_case {
        ka.iter()
            .map(u8::to_ascii_lowercase)
            .cmp(kb.iter().map(u8::to_ascii_lowercase))
    } else {
        ka.cmp(kb)
    };

    ord.then_with(|| a.cmp(b))
}

fn sort_key<'a>(line: &'a [u8], options: &SortOptions) -> &'a [u8] {
    match options.key {
        None => line,
        Some(field) => field_of(line, field, options.separator).unwrap_or(&[]),
    }
}

/// Returns the 1-based `field` of `line`.
pub(crate) fn field_of(line: &[u8], field: usize, separator: Option<u8>) -> Option<&[u8]> {
    match separator {
        Some(sep) => line.split(|&b| b == sep).nth(field - 1),
        None => line
            .split(|b| b.is_ascii_whitespace())
            .filter(|f| !f.is_empty())
            .nth(field - 1),
    }
}

/// Leading numeric value of a key.
///
/// `Missing` (no digits) orders before every parsed number. Digits are
/// compared as strings, so arbitrarily long runs never overflow.
#[derive(Debug, PartialEq, Eq)]
enum NumericKey<'a> {
    Missing,
    Number {
        negative: bool,
        int: &'a [u8],
        frac: &'a [u8],
    },
}

impl<'a> NumericKey<'a> {
    fn parse(key: &'a [u8]) -> Self {
        let mut i = key
            .iter()
            .position(|&b| b != b' ' && b != b'\t')
            .unwrap_or(key.len());

        let mut negative = false;
        match key.get(i) {
            Some(b'-') => {
                negative = true;
                i += 1;
            }
            Some(b'+') => i += 1,
            _ => {}
        }

        let int_start = i;
        while key.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        let int = &key[int_start..i];

        let mut frac: &[u8] = &[];
        if key.get(i) == Some(&b'.') {
            let frac_start = i + 1;
            let mut j = frac_start;
            while key.get(j).is_some_and(u8::is_ascii_digit) {
                j += 1;
            }
            frac = &key[frac_start..j];
        }

        if int.is_empty() && frac.is_empty() {
            return NumericKey::Missing;
        }

        let int = trim_start_zeros(int);
        let frac = trim_end_zeros(frac);
        NumericKey::Number {
            // -0 and 0 are the same value.
            negative: negative && !(int.is_empty() && frac.is_empty()),
            int,
            frac,
        }
    }
}

impl Ord for NumericKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        use NumericKey::{Missing, Number};
        match (self, other) {
            (Missing, Missing) => Ordering::Equal,
            (Missing, Number { .. }) => Ordering::Less,
            (Number { .. }, Missing) => Ordering::Greater,
            (
                Number { negative: na, int: ia, frac: fa },
                Number { negative: nb, int: ib, frac: fb },
            ) => match (na, nb) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => cmp_magnitude(ia, fa, ib, fb),
                (true, true) => cmp_magnitude(ib, fb, ia, fa),
            },
        }
    }
}

impl PartialOrd for NumericKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn cmp_magnitude(ia: &[u8], fa: &[u8], ib: &[u8], fb: &[u8]) -> Ordering {
    ia.len()
        .cmp(&ib.len())
        .then_with(|| ia.cmp(ib))
        .then_with(|| fa.cmp(fb))
}

fn trim_start_zeros(digits: &[u8]) -> &[u8] {
    let start = digits.iter().position(|&d| d != b'0').unwrap_or(digits.len());
    &digits[start..]
}

fn trim_end_zeros(digits: &[u8]) -> &[u8] {
    let end = digits.iter().rposition(|&d| d != b'0').map_or(0, |p| p + 1);
    &digits[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sorted<'a>(input: &[&'a str], options: SortOptions) -> Vec<&'a str> {
        sort_lines(input, &options).unwrap()
    }

    #[test]
    fn lexicographic_is_default() {
        assert_eq!(
            sorted(&["cherry", "apple", "banana"], SortOptions::default()),
            vec!["apple", "banana", "cherry"]
        );
    }

    #[test]
    fn lexicographic_is_byte_order() {
        assert_eq!(
            sorted(&["b", "B", "a", "A"], SortOptions::default()),
            vec!["A", "B", "a", "b"]
        );
    }

    #[test]
    fn numeric_orders_by_value() {
        let opts = SortOptions {
            numeric: true,
            ..Default::default()
        };
        assert_eq!(sorted(&["10", "2", "100", "1"], opts), vec!["1", "2", "10", "100"]);
    }

    #[test]
    fn numeric_handles_signs_and_non_numbers() {
        let opts = SortOptions {
            numeric: true,
            ..Default::default()
        };
        assert_eq!(
            sorted(&["3", "abc", "-7", "", "+2", "-"], opts),
            vec!["", "-", "abc", "-7", "+2", "3"]
        );
    }

    #[test]
    fn numeric_compares_long_digit_runs() {
        let opts = SortOptions {
            numeric: true,
            ..Default::default()
        };
        let big = "123456789012345678901234567890";
        assert_eq!(sorted(&[big, "99", "-5"], opts), vec!["-5", "99", big]);
    }

    #[test]
    fn numeric_fraction_and_leading_zeros() {
        let opts = SortOptions {
            numeric: true,
            ..Default::default()
        };
        assert_eq!(
            sorted(&["1.5", "001", "1.25", "-0.5", "-1.5"], opts),
            vec!["-1.5", "-0.5", "001", "1.25", "1.5"]
        );
    }

    #[test]
    fn numeric_ties_fall_back_to_bytes() {
        let opts = SortOptions {
            numeric: true,
            ..Default::default()
        };
        assert_eq!(sorted(&["5x", "05", "5"], opts), vec!["05", "5", "5x"]);
        assert_eq!(sorted(&["-0", "0"], opts), vec!["-0", "0"]);
    }

    #[test]
    fn reverse_is_exact_reverse() {
        let asc = sorted(&["b", "a", "c", "a"], SortOptions::default());
        let desc = sorted(
            &["b", "a", "c", "a"],
            SortOptions {
                reverse: true,
                ..Default::default()
            },
        );
        let mut expected = asc.clone();
        expected.reverse();
        assert_eq!(desc, expected);
    }

    #[test]
    fn unique_collapses_adjacent_duplicates() {
        let opts = SortOptions {
            unique: true,
            ..Default::default()
        };
        assert_eq!(sorted(&["b", "a", "b", "a", "c"], opts), vec!["a", "b", "c"]);
    }

    #[test]
    fn unique_keeps_case_variants() {
        let opts = SortOptions {
            unique: true,
            ignore_case: true,
            ..Default::default()
        };
        assert_eq!(sorted(&["b", "A", "a", "B"], opts), vec!["A", "a", "B", "b"]);
    }

    #[test]
    fn key_with_separator() {
        let opts = SortOptions {
            key: Some(2),
            separator: Some(b':'),
            ..Default::default()
        };
        assert_eq!(
            sorted(&["x:c", "y:a", "z:b", "w"], opts),
            vec!["w", "y:a", "z:b", "x:c"]
        );
    }

    #[test]
    fn key_with_blank_runs() {
        let opts = SortOptions {
            key: Some(2),
            numeric: true,
            ..Default::default()
        };
        assert_eq!(
            sorted(&["bob   30", "amy 4", "cy\t12"], opts),
            vec!["amy 4", "cy\t12", "bob   30"]
        );
    }

    #[test]
    fn zero_key_is_invalid() {
        let opts = SortOptions {
            key: Some(0),
            ..Default::default()
        };
        let err = sort_lines(&["a"], &opts).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn separator_without_key_is_invalid() {
        let opts = SortOptions {
            separator: Some(b','),
            ..Default::default()
        };
        assert!(sort_lines(&["a"], &opts).is_err());
    }

    #[test]
    fn sort_file_reads_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("f.txt");
        fs::write(&path, "cherry\napple\nbanana").unwrap();

        let buf = sort_file(&path, &SortOptions::default()).unwrap();
        assert_eq!(buf.to_bytes(), b"apple\nbanana\ncherry\n");
    }

    #[test]
    fn sort_file_missing_is_not_found() {
        let err = sort_file(Path::new("/nonexistent/sort/input"), &SortOptions::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
