use anyhow::Result;
use chapter_concat::{
    AutoConfirm, Config, Orchestrator, PipelineEvent, RunOutcome, TokioProcessRunner,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "chapter-concat")]
#[command(version, about = "Concatenate videos into one file with a merged chapter table")]
struct Cli {
    /// Videos to concatenate, in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output file name, placed next to the first input
    #[arg(short, long)]
    output_name: Option<String>,

    /// Replace the output file if it already exists
    #[arg(long)]
    overwrite: bool,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Script printing a chapter title for files without chapters
    #[arg(long)]
    chapter_plugin: Option<PathBuf>,

    /// Script printing the default output file name
    #[arg(long)]
    name_plugin: Option<PathBuf>,

    /// Temporary directory template, e.g. /scratch/concat-XXXXXX
    #[arg(long)]
    tmp_template: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut load_error = None;
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            load_error = Some(e);
            Config::from_env()
        }),
    };

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { config.output.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(format!("chapter_concat={log_level},warn"))
        .init();

    match (&config.source, load_error) {
        (_, Some(e)) => warn!("Failed to load config, using defaults: {}", e),
        (Some(path), None) => info!("📄 Loaded configuration from: {}", path.display()),
        (None, None) => debug!("No configuration file found, using defaults"),
    }

    if let Some(plugin) = cli.chapter_plugin {
        config.plugins.chapter_title = Some(plugin);
    }
    if let Some(plugin) = cli.name_plugin {
        config.plugins.savefile_name = Some(plugin);
    }
    if let Some(template) = cli.tmp_template {
        config.preferences.temporary_directory_template = Some(template);
    }
    config.validate()?;
    debug!("{}", config.summary());

    let mut confirmer = AutoConfirm::new().with_overwrite(cli.overwrite || config.output.overwrite_existing);
    if let Some(name) = cli.output_name {
        confirmer = confirmer.with_output_name(name);
    }

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let runner = TokioProcessRunner::new().with_progress_channel(progress_tx);
    let progress_task = tokio::spawn(async move {
        while let Some(update) = progress_rx.recv().await {
            debug!("{} {:.1}% {}", update.tool, update.ratio * 100.0, update.display);
        }
    });

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let event_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if let PipelineEvent::FileRegistered {
                index,
                path,
                duration,
                chapters,
            } = event
            {
                info!(
                    "📝 [{}] {} ({:.2}s, {} chapters)",
                    index + 1,
                    path.display(),
                    duration,
                    chapters
                );
            }
        }
    });

    info!("🚀 Chapter Concat starting...");
    let mut orchestrator =
        Orchestrator::new(config, Arc::new(runner), Arc::new(confirmer)).with_events(event_tx);
    let outcome = orchestrator.run(cli.files).await;

    drop(orchestrator);
    let _ = event_task.await;
    let _ = progress_task.await;

    match outcome? {
        RunOutcome::Completed { output, chapters } => {
            info!("🎉 Created {} with {} chapters", output.display(), chapters.len());
        }
        RunOutcome::Cancelled { stage } => {
            warn!("Cancelled at {}", stage);
        }
    }

    Ok(())
}
