use anyhow::{Context, Result};
use caption_harvester::batch::{BatchOptions, BatchProcessor};
use caption_harvester::config::Config;
use caption_harvester::formatters::{format_batch, format_transcript, OutputFormat};
use caption_harvester::http::ReqwestHttpClient;
use caption_harvester::retrieval::{extract_video_id, TranscriptApi};
use caption_harvester::SelectionMode;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

#[derive(Parser)]
#[command(name = "caption-harvester")]
#[command(version, author = "TigreRoll")]
#[command(about = "Retrieve caption tracks and transcripts for online videos")]
struct Cli {
    /// Video ids or watch URLs
    #[arg(required = true, value_name = "VIDEO_IDS")]
    video_ids: Vec<String>,

    /// Language codes in descending priority, e.g. `de,en`
    #[arg(short, long, value_delimiter = ',')]
    languages: Option<Vec<String>>,

    /// Print the available transcripts instead of retrieving one
    #[arg(long)]
    list_transcripts: bool,

    /// Only consider manually created transcripts
    #[arg(long, conflicts_with = "exclude_manually_created")]
    exclude_generated: bool,

    /// Only consider automatically generated transcripts
    #[arg(long)]
    exclude_manually_created: bool,

    /// Keep going when a video fails and report the failures at the end
    #[arg(long)]
    continue_after_error: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Write one file per video into this directory
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Proxy URL for all requests
    #[arg(long)]
    proxy: Option<String>,

    /// Number of videos processed concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn selection_mode(&self) -> Option<SelectionMode> {
        if self.exclude_generated {
            Some(SelectionMode::ManualOnly)
        } else if self.exclude_manually_created {
            Some(SelectionMode::GeneratedOnly)
        } else {
            None
        }
    }

    /// Command line flags take precedence over file and environment settings
    fn apply_to(&self, config: &mut Config) {
        if let Some(languages) = &self.languages {
            config.retrieval.languages = languages.clone();
        }
        if let Some(mode) = self.selection_mode() {
            config.retrieval.mode = mode;
        }
        if self.continue_after_error {
            config.retrieval.continue_after_error = true;
        }
        if let Some(workers) = self.workers {
            config.retrieval.workers = workers;
        }
        if let Some(proxy) = &self.proxy {
            config.http.proxy = Some(proxy.clone());
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(dir) = &self.output_dir {
            config.output.output_dir = Some(dir.clone());
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env_overrides(|name| std::env::var(name).ok())?;
            config
        }
        None => Config::load()?,
    };

    cli.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

fn log_directives(verbose: bool, log_level: &str) -> String {
    let level = if verbose { "debug" } else { log_level };
    format!("caption_harvester={level},caption_core={level},warn")
}

fn log_filter(verbose: bool, log_level: &str) -> EnvFilter {
    EnvFilter::new(log_directives(verbose, log_level))
}

/// Install the stderr subscriber. The returned handle swaps in the configured
/// level once the configuration has been loaded.
fn init_logging(verbose: bool) -> reload::Handle<EnvFilter, Registry> {
    let (filter, handle) = reload::Layer::new(log_filter(verbose, "info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    handle
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_handle = init_logging(cli.verbose);

    let config = load_config(&cli)?;
    log_handle.reload(log_filter(cli.verbose, &config.output.log_level))?;
    debug!("{}", config.summary());

    let video_ids = cli
        .video_ids
        .iter()
        .map(|input| extract_video_id(input))
        .collect::<Result<Vec<_>>>()?;

    let api = TranscriptApi::new(ReqwestHttpClient::new(&config.http)?);

    if cli.list_transcripts {
        let mut failed = Vec::new();
        for video_id in &video_ids {
            match api.list_transcripts(video_id).await {
                Ok(catalog) => println!("{}\n", catalog),
                Err(e) if config.retrieval.continue_after_error => {
                    warn!("❌ Failed: {} - {:#}", video_id, e);
                    failed.push(video_id.clone());
                }
                Err(e) => return Err(e),
            }
        }

        if !failed.is_empty() {
            eprintln!("Could not list transcripts for: {}", failed.join(", "));
            std::process::exit(1);
        }
        return Ok(());
    }

    info!("🚀 Caption Harvester starting...");
    info!("🌐 Languages: {}", config.retrieval.languages.join(", "));
    info!("🔧 Workers: {}", config.retrieval.workers);

    let processor = BatchProcessor::new(api, BatchOptions::from(config.retrieval.clone()));
    let outcome = processor.process(&video_ids).await?;
    let format = config.output.format;

    match &config.output.output_dir {
        Some(dir) => {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Cannot create output directory {}", dir.display()))?;

            for transcript in &outcome.transcripts {
                let path = dir.join(format!("{}.{}", transcript.video_id, format.extension()));
                tokio::fs::write(&path, format_transcript(&transcript.cues, format)?).await?;
                info!("💾 Saved: {}", path.display());
            }
        }
        None => {
            if !outcome.transcripts.is_empty() {
                println!("{}", format_batch(&outcome.transcripts, format)?);
            }
        }
    }

    if outcome.has_failures() {
        for failure in &outcome.failed {
            eprintln!("{}: {}", failure.video_id, failure.error);
        }
        eprintln!("Could not retrieve transcripts for: {}", outcome.failed_ids().join(", "));
        std::process::exit(1);
    }

    Ok(())
}
