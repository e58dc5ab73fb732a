use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use global_usage::app_state::AppState;
use global_usage::commands::{self, UsageLookupRequest};
use global_usage::{logging, settings, UsageError};

#[derive(Parser)]
#[command(name = "global-usage")]
#[command(about = "Look up where files are used across wikis, paged in either direction")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to $GLOBAL_USAGE_CONFIG, then ./global-usage.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the pages using one or more files, or every file in a category
    Usage {
        /// File names (or a single category name with --category)
        #[arg(required = true)]
        targets: Vec<String>,
        /// Treat the target as a category and list usage of its member files
        #[arg(long)]
        category: bool,
        /// Only show usage from pages in these namespace ids
        #[arg(long = "namespace")]
        namespaces: Vec<i64>,
        /// Only show usage from these sites
        #[arg(long = "site")]
        sites: Vec<String>,
        /// Hide usage from the home site
        #[arg(long)]
        exclude_local: bool,
        /// Rows per page (clamped to 1..=500)
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
        /// Continuation token `target|site|page_id`
        #[arg(long)]
        offset: Option<String>,
        /// Page backward from the token
        #[arg(long)]
        backward: bool,
    },
    /// Show files used on more than one page, most used first
    Top {
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Rows per page (clamped to 1..=5000)
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Load usage rows from a JSON array file
    Seed { file: PathBuf },
    /// Create or upgrade the usage store schema
    Migrate,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), UsageError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| UsageError::InvalidInput(format!("failed to render output: {e}")))?;
    println!("{out}");
    Ok(())
}

async fn dispatch(state: &AppState, command: Commands) -> Result<(), UsageError> {
    match command {
        Commands::Usage {
            targets,
            category,
            namespaces,
            sites,
            exclude_local,
            limit,
            offset,
            backward,
        } => {
            let req = UsageLookupRequest {
                targets,
                category,
                namespaces,
                sites,
                exclude_local,
                limit,
                offset,
                backward,
            };
            print_json(&commands::usage_lookup(state, req).await?)
        }
        Commands::Top { offset, limit } => print_json(&commands::top_usage(state, offset, limit).await?),
        Commands::Seed { file } => {
            let written = commands::seed_usage(state, &file).await?;
            println!("seeded {written} usage rows");
            Ok(())
        }
        Commands::Migrate => {
            commands::migrate(state).await?;
            println!("usage store is up to date");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let path = cli.config.unwrap_or_else(settings::default_settings_path);
    let settings = match settings::read(&path) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = logging::init(&settings.log_level, settings.log_dir.as_deref());
    tracing::debug!(config = %path.display(), home_site = %settings.home_site, "settings loaded");

    let state = AppState::from_settings(settings);
    match dispatch(&state, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
