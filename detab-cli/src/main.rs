use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use detab::{ConfigOverrides, PipelineConfig, RunOutcome, RunSummary, MAX_TAB_WIDTH};
use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Replace tabs with spaces in every matching file under a directory
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Regular expression matched against file names [default: .*]
    #[arg(long)]
    filter: Option<String>,

    /// Directory to start from [default: .]
    #[arg(long)]
    startdir: Option<PathBuf>,

    /// Tab size in spaces, 0 deletes tabs [default: 4]
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_TAB_WIDTH))]
    tabsize: Option<i64>,

    /// Number of worker threads [default: CPU count - 1]
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Report what would change without writing anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            eprintln!("\nFor more information, try '--help'.");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<RunSummary> {
    let startdir = cli
        .startdir
        .map(|dir| {
            if dir.is_absolute() {
                Ok(dir)
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(dir))
                    .context("Failed to resolve start directory")
            }
        })
        .transpose()?;

    let config = PipelineConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?
        .merge_with_cli(ConfigOverrides {
            filter: cli.filter,
            root_path: startdir,
            tab_width: cli.tabsize,
            worker_count: cli.threads,
            dry_run: cli.dry_run,
            log_level: cli.verbose.then(|| "debug".to_string()),
        });

    init_tracing(&config.log_level);
    debug!("Using configuration: {:?}", config);

    let RunOutcome {
        summary,
        scan_error,
    } = detab::execute(&config)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    match scan_error {
        Some(err) => Err(err.into()),
        None => Ok(summary),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_summary(summary: &RunSummary) {
    let verb = if summary.dry_run {
        "Would change"
    } else {
        "Changed"
    };

    for path in &summary.changed_files {
        println!("{} {}", verb.green(), path.display().to_string().blue());
    }

    for failure in &summary.failures {
        eprintln!(
            "{} {}: {}",
            "Failed".red(),
            failure.path.display().to_string().blue(),
            failure.message
        );
    }

    println!(
        "\n{} {} of {} files ({} tabs replaced, {} failed) in {} ms",
        verb,
        summary.files_changed,
        summary.files_processed,
        summary.tabs_replaced,
        summary.files_failed(),
        summary.elapsed_ms
    );
}
