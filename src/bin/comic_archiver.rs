use std::fs::{self, OpenOptions};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use comic_archiver::app::App;
use comic_archiver::config::{ConfigLoader, ResolvedConfig};
use comic_archiver::error::ArchiveError;
use comic_archiver::output::JsonOutput;
use comic_archiver::store::{ArchiveAction, Store};
use comic_archiver::xkcd::ComicHttpClient;

#[derive(Parser)]
#[command(name = "comic-archiver")]
#[command(about = "Incremental xkcd comic mirror with a bucketed Markdown archive")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch, archive and summarize in one pass (default)")]
    Run(RunArgs),
    #[command(about = "Fetch new comics and write their records, nothing else")]
    Fetch(FetchArgs),
    #[command(about = "Move loose records into the bucketed tree")]
    Organize,
    #[command(about = "Print the highest comic id on disk")]
    Latest,
    #[command(about = "Write a starter comic-archiver.json")]
    Init,
}

#[derive(Args, Default)]
struct RunArgs {
    #[arg(long)]
    count: Option<u32>,

    /// Seed for the summary's random picks; omit for a fresh sample each run.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Default)]
struct FetchArgs {
    #[arg(long)]
    count: Option<u32>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(archive) = report.downcast_ref::<ArchiveError>() {
            return ExitCode::from(map_exit_code(archive));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ArchiveError) -> u8 {
    match error {
        ArchiveError::ConfigRead(_) | ArchiveError::ConfigParse(_) => 2,
        ArchiveError::Http(_) | ArchiveError::Status { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Init)) {
        return init_config();
    }

    let config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
    init_logging(&config).into_diagnostic()?;

    let store = Store::new(config.output_root.clone());
    let client = ComicHttpClient::new(&config.base_url).into_diagnostic()?;
    let app = App::new(store, client, config);

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            let mut rng = seeded_rng(args.seed);
            let result = app.run(args.count, &mut rng).into_diagnostic()?;
            if cli.json {
                JsonOutput::print_run(&result).into_diagnostic()?;
            } else {
                let moved = result
                    .archived
                    .iter()
                    .filter(|outcome| outcome.action == ArchiveAction::Moved)
                    .count();
                println!(
                    "fetched {} new comics after #{}, archived {} files, summary {}",
                    result.fetched.len(),
                    result.started_after,
                    moved,
                    if result.summary_written {
                        "written"
                    } else {
                        "skipped"
                    }
                );
            }
        }
        Commands::Fetch(args) => {
            let result = app.fetch_new(args.count).into_diagnostic()?;
            if cli.json {
                JsonOutput::print_fetch(&result).into_diagnostic()?;
            } else {
                println!(
                    "fetched {} new comics after #{}",
                    result.records.len(),
                    result.started_after
                );
            }
        }
        Commands::Organize => {
            let outcomes = app.organize().into_diagnostic()?;
            if cli.json {
                JsonOutput::print_archive(&outcomes).into_diagnostic()?;
            } else {
                let moved = outcomes
                    .iter()
                    .filter(|outcome| outcome.action == ArchiveAction::Moved)
                    .count();
                println!("archived {} files ({} skipped)", moved, outcomes.len() - moved);
            }
        }
        Commands::Latest => {
            let latest = app.latest().into_diagnostic()?;
            if cli.json {
                JsonOutput::print_latest(latest).into_diagnostic()?;
            } else {
                println!("{latest}");
            }
        }
        Commands::Init => {}
    }

    Ok(())
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Log lines go both to stderr and to an append-only file under the output
/// root, matching the tool's batch usage.
fn init_logging(config: &ResolvedConfig) -> Result<(), ArchiveError> {
    if let Some(parent) = config.log_path.parent() {
        if !parent.as_str().is_empty() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| ArchiveError::Filesystem(err.to_string()))?;
        }
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path.as_std_path())
        .map_err(|err| ArchiveError::Filesystem(err.to_string()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();
    Ok(())
}

fn init_config() -> miette::Result<()> {
    let path = Path::new("comic-archiver.json");
    if path.exists() {
        return Err(miette::Report::msg("comic-archiver.json already exists"));
    }
    let content =
        serde_json::to_string_pretty(&ConfigLoader::starter_config()).into_diagnostic()?;
    fs::write(path, content + "\n").into_diagnostic()?;
    println!("wrote comic-archiver.json");
    Ok(())
}
