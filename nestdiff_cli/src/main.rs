mod presenters;

use clap::Parser;
use nestdiff_common::{load_config, Config};
use presenters::{html, text, write_output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// In-depth comparison of files, archives, and directories.
///
/// Exit status: 0 when the inputs are identical, 1 when differences were
/// found, 2 on error.
#[derive(Parser)]
#[command(name = "nestdiff")]
#[command(version = "0.1.0")]
#[command(about = "Report semantic differences between two build artifacts", long_about = None)]
struct Cli {
    /// First input (file, archive, or directory)
    file1: PathBuf,

    /// Second input
    file2: PathBuf,

    /// Write the plain-text report to FILE ('-' for stdout)
    #[arg(long, value_name = "FILE")]
    text: Option<PathBuf>,

    /// Write the HTML report to FILE ('-' for stdout)
    #[arg(long, value_name = "FILE")]
    html: Option<PathBuf>,

    /// Write the JSON report to FILE ('-' for stdout)
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Treat absent files as empty instead of escalating
    #[arg(long)]
    new_file: bool,

    /// Enable fuzzy member pairing with the given minimum similarity
    /// ratio (0 < RATIO <= 1)
    #[arg(long, value_name = "RATIO")]
    fuzzy: Option<f32>,

    /// Per-hunk line cap for unified diffs
    #[arg(long, value_name = "LINES")]
    max_diff_block_lines: Option<usize>,

    /// Byte cap for reports and raw binary reads
    #[arg(long, value_name = "BYTES")]
    max_report_size: Option<usize>,

    /// Load configuration from FILE instead of the default location
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose engine logging on stderr
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so report output can go cleanly to stdout
    let default_filter = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match run(&cli) {
        Ok(exit) => exit,
        Err(e) => {
            error!("{e:#}");
            eprintln!("nestdiff: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = effective_config(cli)?;

    let difference = nestdiff_core::compare_paths(&cli.file1, &cli.file2, &config)?;

    let Some(difference) = difference else {
        return Ok(ExitCode::SUCCESS);
    };

    let mut wrote_any = false;
    if let Some(target) = &cli.text {
        write_output(target, &text::render_text(&difference))?;
        wrote_any = true;
    }
    if let Some(target) = &cli.html {
        let (rendered, _) = html::render_html(&difference, &config);
        write_output(target, &rendered)?;
        wrote_any = true;
    }
    if let Some(target) = &cli.json {
        write_output(target, &presenters::render_json(&difference)?)?;
        wrote_any = true;
    }
    if !wrote_any {
        write_output(std::path::Path::new("-"), &text::render_text(&difference))?;
    }

    Ok(ExitCode::from(1))
}

fn effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = load_config(cli.config.as_deref())?.config;

    if cli.new_file {
        config.new_file = true;
    }
    if let Some(ratio) = cli.fuzzy {
        anyhow::ensure!(
            ratio > 0.0 && ratio <= 1.0,
            "--fuzzy must be within (0, 1], got {ratio}"
        );
        config.fuzzy_threshold = ratio;
    }
    if let Some(lines) = cli.max_diff_block_lines {
        config.max_diff_block_lines = lines;
    }
    if let Some(bytes) = cli.max_report_size {
        config.max_report_size = bytes;
    }

    Ok(config)
}
