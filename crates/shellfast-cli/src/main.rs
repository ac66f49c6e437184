mod cli;
mod commands;
mod output;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use shellfast_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::commands::{Context, Status};
use crate::output::OutputFormat;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shellfast=warn,sf=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let format = cli.output;

    match execute(cli) {
        Ok(Status::Success) => ExitCode::SUCCESS,
        Ok(Status::Differ) => ExitCode::from(1),
        Ok(Status::Incomplete) => ExitCode::from(2),
        Err(e) => {
            report_error(format, &e);
            ExitCode::from(2)
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<Status> {
    let config = load_config(cli.config)?;
    let ctx = Context {
        format: cli.output,
        config,
    };
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let status = commands::run(cli.command, &ctx, &mut out)?;
    out.flush()?;
    Ok(status)
}

/// An explicit path must exist; the default location may be absent.
fn load_config(explicit: Option<PathBuf>) -> anyhow::Result<Config> {
    let explicit = explicit.or_else(|| std::env::var_os("SHELLFAST_CONFIG").map(PathBuf::from));
    if let Some(path) = explicit {
        return Config::load(&path)
            .with_context(|| format!("cannot load config {}", path.display()));
    }

    let Some(home) = std::env::var_os("HOME") else {
        return Ok(Config::default());
    };
    let path = PathBuf::from(home).join(".config/shellfast/config.toml");
    Config::load_or_default(&path).with_context(|| format!("cannot load config {}", path.display()))
}

fn report_error(format: OutputFormat, err: &anyhow::Error) {
    tracing::debug!(error = ?err, "command failed");
    match format {
        OutputFormat::Json => {
            let kind = err
                .downcast_ref::<shellfast_core::CoreError>()
                .map(|e| format!("{:?}", e.kind()));
            let obj = serde_json::json!({
                "error": format!("{err:#}"),
                "kind": kind,
            });
            println!("{obj}");
        }
        OutputFormat::Human => eprintln!("sf: {err:#}"),
    }
}
