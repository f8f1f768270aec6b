//! Binary entry point for daybook.
//!
//! This binary provides the CLI interface for the daybook journal.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow unnecessary_wraps for consistent command function signatures
#![allow(clippy::unnecessary_wraps)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use chrono::Datelike;
use clap::{Parser, Subcommand};
use daybook::config::DaybookConfig;
use daybook::events::ChangeBus;
use daybook::mcp::McpServer;
use daybook::media::MediaLibrary;
use daybook::observability::{self, LoggingConfig};
use daybook::render::{RenderOutcome, RenderPipeline, RendererKind, SceneSpec, artifact_name};
use daybook::store::JournalStore;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Daybook - a journaling MCP server with yearly recap videos.
#[derive(Parser)]
#[command(name = "daybook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdio.
    Serve,

    /// Show status.
    Status,

    /// Add a journal entry.
    Add {
        /// Entry title.
        title: String,

        /// Entry body text.
        #[arg(short = 'm', long)]
        content: Option<String>,

        /// Tags for the entry (comma-separated).
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// List journal entries.
    List {
        /// Only show entries from this year.
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Render a yearly recap video.
    Render {
        /// Calendar year to render.
        year: i32,

        /// Use the simulated renderer instead of ffmpeg.
        #[arg(long)]
        simulate: bool,

        /// Output file path.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(LoggingConfig::from_env(cli.verbose)) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(cli: Cli, config: DaybookConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Serve => cmd_serve(&config).await,

        Commands::Status => cmd_status(&config),

        Commands::Add {
            title,
            content,
            tags,
        } => cmd_add(&config, title, content, tags).await,

        Commands::List { year } => cmd_list(&config, year),

        Commands::Render {
            year,
            simulate,
            output,
        } => cmd_render(&config, year, simulate, output).await,
    }
}

/// Loads configuration.
fn load_config(path: Option<&str>) -> Result<DaybookConfig, Box<dyn std::error::Error>> {
    // If a path is provided, load from that file
    if let Some(config_path) = path {
        return DaybookConfig::load_from_file(std::path::Path::new(config_path))
            .map_err(std::convert::Into::into);
    }

    // Otherwise, load from the default location (env override included)
    Ok(DaybookConfig::load_default())
}

/// Opens the journal store, creating the data directory if needed.
fn open_store(config: &DaybookConfig) -> Result<Arc<JournalStore>, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.data_dir)?;
    let bus = Arc::new(ChangeBus::new());
    Ok(Arc::new(JournalStore::new(
        bus,
        Some(config.snapshot_path()),
    )?))
}

/// Serve command.
async fn cmd_serve(config: &DaybookConfig) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.data_dir)?;
    let mut server = McpServer::new(config)?;
    server.run_stdio().await?;
    Ok(())
}

/// Status command.
fn cmd_status(config: &DaybookConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Daybook Status");
    println!("==============");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    // Check data directory
    let data_status = if config.data_dir.exists() {
        "Configured"
    } else {
        "Will be created on first use"
    };
    println!("Data Directory: {data_status}");
    println!("  Path: {}", config.data_dir.display());

    // Check journal snapshot
    let snapshot = config.snapshot_path();
    let snapshot_status = if snapshot.exists() {
        "Available"
    } else {
        "Not initialized"
    };
    println!("Journal Snapshot: {snapshot_status}");

    // Check media directory
    let library = MediaLibrary::new(&config.media_dir);
    println!("Media Directory: {} video(s)", library.count());
    println!("  Path: {}", config.media_dir.display());

    let renderer = if config.renderer.simulated {
        "simulated"
    } else {
        config.renderer.command.as_str()
    };
    println!("Renderer: {renderer}");

    Ok(())
}

/// Add command.
async fn cmd_add(
    config: &DaybookConfig,
    title: String,
    content: Option<String>,
    tags: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let tags = parse_tags(tags.as_deref());
    let entry = store
        .create_entry(&title, content.as_deref().unwrap_or(""), &tags)
        .await?;

    println!("Created entry {}: {}", entry.id, entry.title);
    Ok(())
}

/// List command.
fn cmd_list(
    config: &DaybookConfig,
    year: Option<i32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let mut shown = 0usize;

    for entry in store.list_entries() {
        if year.is_some_and(|y| entry.created_at.year() != y) {
            continue;
        }
        let tags = if entry.tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", entry.tags.join(", "))
        };
        println!(
            "{:>4}  {}  {}{}",
            entry.id,
            entry.created_at.format("%Y-%m-%d"),
            entry.title,
            tags
        );
        shown += 1;
    }

    if shown == 0 {
        println!("No entries found");
    }
    Ok(())
}

/// Render command.
async fn cmd_render(
    config: &DaybookConfig,
    year: i32,
    simulate: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let scene = SceneSpec::build(year, &store.list_entries());

    let kind = if simulate || config.renderer.simulated {
        RendererKind::Simulated {
            steps: config.renderer.simulated_steps,
            step_delay: config.renderer.simulated_step_delay,
        }
    } else {
        RendererKind::Command(config.renderer.command.clone())
    };
    let pipeline = RenderPipeline::new(kind);
    let output = output.unwrap_or_else(|| config.media_dir.join(artifact_name(year)));

    // Ctrl-C cancels the render instead of killing the process outright.
    let cancel = CancellationToken::new();
    let ctrl = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl.cancel();
        }
    });

    println!(
        "Rendering recap for {year}: {} cards, {:.0}s",
        scene.cards.len(),
        scene.duration_secs()
    );
    let outcome = pipeline
        .render(&scene, &output, &cancel, |ratio| {
            print!("\r  {:>3.0}%", ratio * 100.0);
            let _ = std::io::stdout().flush();
        })
        .await;
    println!();

    match outcome {
        RenderOutcome::Completed { output } => {
            println!("Recap written to {}", output.display());
            Ok(())
        },
        RenderOutcome::Cancelled { subject } => {
            println!("Render of {subject} cancelled");
            Ok(())
        },
        RenderOutcome::Failed { reason } => Err(reason.into()),
    }
}

/// Parses a comma-separated tag list.
fn parse_tags(tags: Option<&str>) -> Vec<String> {
    tags.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(ToString::to_string)
            .collect()
    })
    .unwrap_or_default()
}
