use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// POSIX file and text utilities, run in-process.
#[derive(Parser, Debug)]
#[command(name = "sf", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format for all subcommands.
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    /// Configuration file (default: $SHELLFAST_CONFIG or ~/.config/shellfast/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List directory contents.
    Ls(LsArgs),
    /// Search a directory tree.
    Find(FindArgs),
    /// Summarize disk usage.
    Du(DuArgs),
    /// Create a directory.
    Mkdir(MkdirArgs),
    /// Remove an empty directory.
    Rmdir(PathArg),
    /// Remove files or directories.
    Rm(RmArgs),
    /// Create a file or update its modification time.
    Touch(TouchArgs),
    /// Copy files or directories.
    Cp(CpArgs),
    /// Move or rename a file or directory.
    Mv(MvArgs),
    /// Create a hard or symbolic link.
    Ln(LnArgs),
    /// Change permission bits.
    Chmod(ChmodArgs),

    /// Print a file.
    Cat(CatArgs),
    /// Print the first lines or bytes of a file.
    Head(SliceArgs),
    /// Print the last lines or bytes of a file.
    Tail(SliceArgs),
    /// Print lines containing a pattern.
    Grep(GrepArgs),
    /// Sort the lines of a file.
    Sort(SortArgs),
    /// Compare two files line by line.
    Diff(DiffArgs),
    /// Compare two files byte by byte.
    Cmp(PairArgs),
    /// Compare two sorted files line by line.
    Comm(PairArgs),
    /// Count lines, words, characters and bytes.
    Wc(WcArgs),
    /// Select fields from each line.
    Cut(CutArgs),
    /// Merge corresponding lines of files.
    Paste(PasteArgs),
    /// Join lines of two sorted files on a common field.
    Join(JoinArgs),
}

// ── Shared argument structs ──────────────────────────────────────────

#[derive(Args, Debug)]
pub struct PathArg {
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct PairArgs {
    pub first: PathBuf,
    pub second: PathBuf,
}

// ── filesystem ───────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct LsArgs {
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Include entries whose names start with `.`.
    #[arg(short, long)]
    pub all: bool,

    /// Long listing with type, permissions, size and age.
    #[arg(short, long)]
    pub long: bool,

    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// Sort by name, size or time; `none` keeps directory order.
    #[arg(long, default_value = "name")]
    pub sort: String,

    #[arg(short, long)]
    pub reverse: bool,

    /// List directories only.
    #[arg(short, long)]
    pub directory: bool,

    /// Print sizes as 1.5K, 3.0M, ...
    #[arg(long)]
    pub human_readable: bool,
}

#[derive(Args, Debug)]
pub struct FindArgs {
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Glob matched against entry names.
    #[arg(long)]
    pub name: Option<String>,

    /// Like --name, ignoring case.
    #[arg(long, conflicts_with = "name")]
    pub iname: Option<String>,

    /// Entry type: f, d or l.
    #[arg(long = "type")]
    pub file_type: Option<String>,

    /// Minimum regular-file size in bytes.
    #[arg(long)]
    pub min_size: Option<u64>,

    /// Maximum regular-file size in bytes.
    #[arg(long)]
    pub max_size: Option<u64>,

    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Follow symbolic links.
    #[arg(short = 'L', long)]
    pub follow: bool,
}

#[derive(Args, Debug)]
pub struct DuArgs {
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Print only the total.
    #[arg(short, long)]
    pub summarize: bool,

    /// Count symlink targets.
    #[arg(short = 'L', long)]
    pub follow: bool,

    #[arg(long)]
    pub human_readable: bool,
}

#[derive(Args, Debug)]
pub struct MkdirArgs {
    pub path: PathBuf,

    /// Create missing parents; an existing directory is not an error.
    #[arg(short, long)]
    pub parents: bool,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    pub path: PathBuf,

    #[arg(short, long)]
    pub recursive: bool,

    /// Ignore missing paths.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct TouchArgs {
    pub path: PathBuf,

    /// Do not create the file.
    #[arg(short = 'c', long)]
    pub no_create: bool,
}

#[derive(Args, Debug)]
pub struct CpArgs {
    pub src: PathBuf,
    pub dest: PathBuf,

    #[arg(short, long)]
    pub recursive: bool,

    /// Overwrite an existing destination.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct MvArgs {
    pub src: PathBuf,
    pub dest: PathBuf,

    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct LnArgs {
    pub target: PathBuf,
    pub link: PathBuf,

    #[arg(short, long)]
    pub symbolic: bool,
}

#[derive(Args, Debug)]
pub struct ChmodArgs {
    /// Octal mode, e.g. 644.
    #[arg(value_parser = parse_octal_mode)]
    pub mode: u32,

    pub path: PathBuf,

    #[arg(short = 'R', long)]
    pub recursive: bool,
}

fn parse_octal_mode(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s, 8)
        .ok()
        .filter(|m| *m <= 0o7777)
        .ok_or_else(|| format!("invalid octal mode {s:?}"))
}

// ── text ─────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct CatArgs {
    pub path: PathBuf,

    #[arg(short = 'n', long)]
    pub number: bool,

    #[arg(short, long)]
    pub squeeze_blank: bool,
}

#[derive(Args, Debug)]
pub struct SliceArgs {
    pub path: PathBuf,

    /// Number of lines (default from config).
    #[arg(short = 'n', long)]
    pub lines: Option<usize>,

    /// Number of bytes; overrides --lines.
    #[arg(short = 'c', long)]
    pub bytes: Option<u64>,
}

#[derive(Args, Debug)]
pub struct GrepArgs {
    pub pattern: String,
    pub path: PathBuf,

    #[arg(short, long)]
    pub ignore_case: bool,

    /// Select non-matching lines.
    #[arg(short = 'v', long)]
    pub invert_match: bool,

    #[arg(short, long, conflicts_with = "files_with_matches")]
    pub count: bool,

    #[arg(short = 'l', long)]
    pub files_with_matches: bool,

    #[arg(short, long)]
    pub word_regexp: bool,

    #[arg(short = 'n', long)]
    pub line_number: bool,

    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Args, Debug)]
pub struct SortArgs {
    pub path: PathBuf,

    #[arg(short, long)]
    pub reverse: bool,

    #[arg(short, long)]
    pub numeric: bool,

    #[arg(short, long)]
    pub unique: bool,

    /// Fold lower case to upper case.
    #[arg(short = 'f', long)]
    pub ignore_case: bool,

    /// 1-based key field.
    #[arg(short, long)]
    pub key: Option<usize>,

    /// Field separator for --key.
    #[arg(short = 't', long)]
    pub separator: Option<char>,
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,

    /// Context lines (default from config).
    #[arg(short = 'U', long)]
    pub unified: Option<usize>,
}

#[derive(Args, Debug)]
pub struct WcArgs {
    pub path: PathBuf,

    /// Count lines only.
    #[arg(short, long)]
    pub lines: bool,
}

#[derive(Args, Debug)]
pub struct CutArgs {
    pub path: PathBuf,

    /// Single-character delimiter (default from config).
    #[arg(short, long)]
    pub delimiter: Option<String>,

    /// Field list such as 1,3-4 or 2-.
    #[arg(short, long)]
    pub fields: String,

    /// Drop lines without a delimiter.
    #[arg(short, long)]
    pub only_delimited: bool,
}

#[derive(Args, Debug)]
pub struct PasteArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[arg(short, long, default_value = "\t")]
    pub delimiter: String,
}

#[derive(Args, Debug)]
pub struct JoinArgs {
    pub first: PathBuf,
    pub second: PathBuf,

    /// Join field of the first file.
    #[arg(short = '1', long = "field1", default_value_t = 1)]
    pub field1: usize,

    /// Join field of the second file.
    #[arg(short = '2', long = "field2", default_value_t = 1)]
    pub field2: usize,

    /// Field separator; blanks when omitted.
    #[arg(short = 't', long)]
    pub separator: Option<char>,
}
