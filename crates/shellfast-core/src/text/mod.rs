//! Line-oriented text processing.
//!
//! Lines are byte sequences split on `\n`; no encoding is assumed except
//! where a function says otherwise (character counts in [`count::wc`]).

pub mod comm;
pub mod count;
pub mod diff;
pub mod fields;
pub mod grep;
pub mod lines;
pub mod sort;

pub use comm::{Column, Partition};
pub use count::{WcCounts, WcOptions};
pub use diff::{CmpResult, DiffHunk, DiffOp};
pub use fields::{CutOptions, FieldSpec, JoinOptions};
pub use grep::{GrepMatch, GrepOptions, GrepOutput, GrepReport};
pub use lines::{CatOptions, LineBuffer};
pub use sort::SortOptions;
