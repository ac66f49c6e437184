//! Subcommand dispatch: maps parsed arguments onto core calls and renders
//! the results.

use std::io::Write;

use anyhow::Context as _;
use serde_json::json;
use shellfast_core::fs::usage::DuOptions;
use shellfast_core::fs::walk::{SortBy, TypeFilter};
use shellfast_core::text::count::WcOptions;
use shellfast_core::text::fields::{CutOptions, JoinOptions};
use shellfast_core::text::grep::GrepOptions;
use shellfast_core::text::lines::CatOptions;
use shellfast_core::text::sort::SortOptions;
use shellfast_core::{
    fs::ops, text, Config, CoreError, CpOptions, FindOptions, LineBuffer, LsOptions, RmOptions,
};

use crate::cli::{Command, SliceArgs};
use crate::output::{self, OutputFormat};

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    pub config: Config,
}

/// How a successful command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// Compared inputs differ (`diff`, `cmp`).
    Differ,
    /// Output was produced but some entries could not be read.
    Incomplete,
}

pub fn run<W: Write>(command: Command, ctx: &Context, out: &mut W) -> anyhow::Result<Status> {
    let json = ctx.format == OutputFormat::Json;
    let human_sizes = ctx.config.output.human_readable;
    let walk = ctx.config.walk_options();
    let mut status = Status::Success;

    match command {
        Command::Ls(args) => {
            let sort_by = match args.sort.as_str() {
                "none" => None,
                other => Some(other.parse::<SortBy>()?),
            };
            let options = LsOptions {
                all: args.all,
                recursive: args.recursive,
                sort_by,
                reverse: args.reverse,
                directory_only: args.directory,
                abort_on_error: walk.abort_on_error,
            };
            let listing = ops::ls(&args.path, &options)
                .with_context(|| format!("cannot list {}", args.path.display()))?;
            status = report_skipped(&listing.errors);
            if json {
                output::emit_json(out, &listing.entries)?;
            } else {
                output::write_listing(
                    out,
                    &listing.entries,
                    &args.path,
                    args.long,
                    args.human_readable || human_sizes,
                )?;
            }
        }
        Command::Find(args) => {
            let file_type = args
                .file_type
                .as_deref()
                .map(str::parse::<TypeFilter>)
                .transpose()?;
            let options = FindOptions {
                case_insensitive: args.iname.is_some(),
                name: args.iname.or(args.name),
                file_type,
                min_size: args.min_size,
                max_size: args.max_size,
                max_depth: args.max_depth,
                follow_symlinks: args.follow || walk.follow_symlinks,
                abort_on_error: walk.abort_on_error,
            };
            let listing = ops::find(&args.root, &options)
                .with_context(|| format!("cannot search {}", args.root.display()))?;
            status = report_skipped(&listing.errors);
            if json {
                output::emit_json(out, &listing.entries)?;
            } else {
                for entry in &listing.entries {
                    writeln!(out, "{}", entry.path().display())?;
                }
            }
        }
        Command::Du(args) => {
            let options = DuOptions {
                follow_symlinks: args.follow || walk.follow_symlinks,
                summary_only: args.summarize,
                abort_on_error: walk.abort_on_error,
            };
            let report = shellfast_core::du(&args.path, &options)
                .with_context(|| format!("cannot measure {}", args.path.display()))?;
            if report.skipped > 0 {
                eprintln!("sf: {} entries could not be read", report.skipped);
                status = Status::Incomplete;
            }
            if json {
                output::emit_json(out, &report)?;
            } else {
                let human = args.human_readable || human_sizes;
                if args.summarize {
                    writeln!(
                        out,
                        "{}\t{}",
                        output::size_string(report.total, human),
                        args.path.display()
                    )?;
                } else {
                    for entry in &report.entries {
                        writeln!(
                            out,
                            "{}\t{}",
                            output::size_string(entry.bytes, human),
                            entry.path.display()
                        )?;
                    }
                }
            }
        }
        Command::Mkdir(args) => ops::mkdir(&args.path, args.parents)?,
        Command::Rmdir(args) => ops::rmdir(&args.path)?,
        Command::Rm(args) => ops::rm(
            &args.path,
            &RmOptions {
                recursive: args.recursive,
                force: args.force,
            },
        )?,
        Command::Touch(args) => ops::touch(&args.path, args.no_create)?,
        Command::Cp(args) => ops::cp(
            &args.src,
            &args.dest,
            &CpOptions {
                recursive: args.recursive,
                force: args.force,
            },
        )?,
        Command::Mv(args) => ops::mv(&args.src, &args.dest, args.force)?,
        Command::Ln(args) => ops::ln(&args.target, &args.link, args.symbolic)?,
        Command::Chmod(args) => ops::chmod(&args.path, args.mode, args.recursive)?,

        Command::Cat(args) => {
            let options = CatOptions {
                number_lines: args.number,
                squeeze_blank: args.squeeze_blank,
            };
            let bytes = text::lines::cat(&args.path, options)?;
            write_bytes(out, json, bytes)?;
        }
        Command::Head(args) => slice(out, ctx, json, &args, true)?,
        Command::Tail(args) => slice(out, ctx, json, &args, false)?,
        Command::Grep(args) => {
            let options = GrepOptions {
                ignore_case: args.ignore_case,
                invert: args.invert_match,
                count_only: args.count,
                files_only: args.files_with_matches,
                whole_word: args.word_regexp,
                line_numbers: args.line_number,
                recursive: args.recursive,
            };
            let report = text::grep::grep(&args.pattern, &args.path, &options)?;
            status = report_skipped(&report.errors);
            if json {
                output::emit_json(out, &output::GrepView::from(&report.output))?;
            } else {
                output::write_grep(out, &report.output, args.recursive)?;
            }
        }
        Command::Sort(args) => {
            let separator = args
                .separator
                .map(|c| {
                    u8::try_from(c).map_err(|_| anyhow::anyhow!("separator must be a single byte"))
                })
                .transpose()?;
            let options = SortOptions {
                reverse: args.reverse,
                numeric: args.numeric,
                unique: args.unique,
                ignore_case: args.ignore_case,
                key: args.key,
                separator,
            };
            let sorted = text::sort::sort_file(&args.path, &options)?;
            write_lines(out, json, &sorted)?;
        }
        Command::Diff(args) => {
            let hunks = text::diff::diff_files(&args.old, &args.new)?;
            let differ = output::has_changes(&hunks);
            if json {
                output::emit_json(out, &output::lossy_hunks(&hunks))?;
            } else {
                let context = args.unified.unwrap_or(ctx.config.text.diff_context);
                let old_label = args.old.display().to_string();
                let new_label = args.new.display().to_string();
                let rendered = text::diff::format_unified(&hunks, &old_label, &new_label, context);
                out.write_all(rendered.as_bytes())?;
            }
            if differ {
                return Ok(Status::Differ);
            }
        }
        Command::Cmp(args) => {
            let result = text::diff::cmp_files(&args.first, &args.second)?;
            if json {
                output::emit_json(out, &result)?;
            } else if let (Some(offset), Some(line)) =
                (result.first_difference_offset, result.line_number)
            {
                writeln!(
                    out,
                    "{} {} differ: byte {}, line {line}",
                    args.first.display(),
                    args.second.display(),
                    offset + 1
                )?;
            }
            if !result.identical {
                return Ok(Status::Differ);
            }
        }
        Command::Comm(args) => {
            let rows = text::comm::comm_merge_files(&args.first, &args.second)?;
            if json {
                let part = text::comm::Partition::from_rows(&rows);
                output::emit_json(out, &output::lossy_partition(&part))?;
            } else {
                output::write_comm(out, &rows)?;
            }
        }
        Command::Wc(args) => {
            let counts = text::count::wc(&args.path, WcOptions { lines_only: args.lines })?;
            if json {
                output::emit_json(out, &counts)?;
            } else {
                let mut row = format!("{:>7}", counts.lines);
                for n in [counts.words, counts.chars, counts.bytes].into_iter().flatten() {
                    row.push_str(&format!(" {n:>7}"));
                }
                writeln!(out, "{row} {}", args.path.display())?;
            }
        }
        Command::Cut(args) => {
            let options = CutOptions {
                delimiter: args
                    .delimiter
                    .unwrap_or_else(|| ctx.config.text.cut_delimiter.clone()),
                fields: args.fields,
                only_delimited: args.only_delimited,
            };
            let cut = text::fields::cut(&args.path, &options)?;
            write_lines(out, json, &cut)?;
        }
        Command::Paste(args) => {
            let pasted = text::fields::paste(&args.files, &args.delimiter)?;
            write_lines(out, json, &pasted)?;
        }
        Command::Join(args) => {
            let options = JoinOptions {
                field1: args.field1,
                field2: args.field2,
                separator: args.separator,
            };
            let joined = text::fields::join(&args.first, &args.second, &options)?;
            write_lines(out, json, &joined)?;
        }
    }
    Ok(status)
}

/// Prints each error a resilient walk stepped over.
fn report_skipped(errors: &[CoreError]) -> Status {
    for err in errors {
        eprintln!("sf: {err}");
    }
    if errors.is_empty() {
        Status::Success
    } else {
        Status::Incomplete
    }
}

fn slice<W: Write>(
    out: &mut W,
    ctx: &Context,
    json: bool,
    args: &SliceArgs,
    from_start: bool,
) -> anyhow::Result<()> {
    if let Some(n) = args.bytes {
        let bytes = if from_start {
            text::lines::head_bytes(&args.path, n)?
        } else {
            text::lines::tail_bytes(&args.path, n)?
        };
        return write_bytes(out, json, bytes);
    }

    let n = args.lines.unwrap_or(ctx.config.text.default_lines);
    let buffer = if from_start {
        text::lines::head(&args.path, n)?
    } else {
        text::lines::tail(&args.path, n)?
    };
    write_lines(out, json, &buffer)
}

fn write_lines<W: Write>(out: &mut W, json: bool, buffer: &LineBuffer) -> anyhow::Result<()> {
    if json {
        output::emit_json(out, &output::LinesView::from(buffer))
    } else {
        out.write_all(&buffer.to_bytes())?;
        Ok(())
    }
}

fn write_bytes<W: Write>(out: &mut W, json: bool, bytes: Vec<u8>) -> anyhow::Result<()> {
    if json {
        let content = String::from_utf8_lossy(&bytes);
        output::emit_json(out, &json!({ "content": content }))
    } else {
        out.write_all(&bytes)?;
        Ok(())
    }
}
