use anyhow::{Context, Result};
use caption_core::SelectionMode;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::RetrievalConfig;
use crate::http::HttpClient;
use crate::retrieval::{FetchedTranscript, TranscriptApi};

/// How a batch selects tracks and reacts to failures
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub languages: Vec<String>,
    pub mode: SelectionMode,
    pub continue_after_error: bool,
    pub workers: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        RetrievalConfig::default().into()
    }
}

impl From<RetrievalConfig> for BatchOptions {
    fn from(config: RetrievalConfig) -> Self {
        Self {
            languages: config.languages,
            mode: config.mode,
            continue_after_error: config.continue_after_error,
            workers: config.workers,
        }
    }
}

/// An identifier whose transcript could not be retrieved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedVideo {
    pub video_id: String,
    pub error: String,
}

/// Overall batch results, in input order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub transcripts: Vec<FetchedTranscript>,
    pub failed: Vec<FailedVideo>,
    #[serde(skip)]
    pub total_time: Duration,
}

impl BatchOutcome {
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.video_id.as_str()).collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Retrieves transcripts for many identifiers with bounded concurrency
pub struct BatchProcessor<C> {
    api: TranscriptApi<C>,
    options: BatchOptions,
}

impl<C: HttpClient> BatchProcessor<C> {
    pub fn new(api: TranscriptApi<C>, options: BatchOptions) -> Self {
        info!(
            "🔧 Initializing BatchProcessor with {} workers",
            options.workers.max(1)
        );
        Self { api, options }
    }

    pub fn api(&self) -> &TranscriptApi<C> {
        &self.api
    }

    /// Retrieve a transcript for every identifier.
    ///
    /// Without `continue_after_error` the first failure in input order aborts
    /// the batch and is returned. Otherwise failures are recorded and the
    /// remaining identifiers are still processed.
    pub async fn process<S: AsRef<str>>(&self, video_ids: &[S]) -> Result<BatchOutcome> {
        let start_time = Instant::now();
        let total = video_ids.len();
        info!("🚀 Retrieving transcripts for {} videos...", total);

        let mut results = stream::iter(video_ids.iter().enumerate())
            .map(|(index, video_id)| async move {
                let video_id = video_id.as_ref();
                info!("📹 Processing video {}/{}: {}", index + 1, total, video_id);
                let result = self
                    .api
                    .retrieve(video_id, &self.options.languages, self.options.mode)
                    .await;
                (video_id, result)
            })
            .buffered(self.options.workers.max(1));

        let mut outcome = BatchOutcome::default();
        while let Some((video_id, result)) = results.next().await {
            match result {
                Ok(transcript) => {
                    info!("✅ Completed: {}", video_id);
                    outcome.transcripts.push(transcript);
                }
                Err(e) if self.options.continue_after_error => {
                    warn!("❌ Failed: {} - {}", video_id, e);
                    outcome.failed.push(FailedVideo {
                        video_id: video_id.to_string(),
                        error: format!("{:#}", e),
                    });
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Could not retrieve transcript for {}", video_id));
                }
            }
        }

        outcome.total_time = start_time.elapsed();
        info!(
            "🎉 Batch finished in {:.2}s: {} retrieved, {} failed",
            outcome.total_time.as_secs_f64(),
            outcome.transcripts.len(),
            outcome.failed.len()
        );

        Ok(outcome)
    }
}
