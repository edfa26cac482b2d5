/// Caption Harvester
///
/// Retrieves caption tracks for online videos: fetches the watch page, extracts
/// the embedded caption catalog, selects a transcript by language priority and
/// parses its timed-text document into cue records.

pub mod batch;
pub mod config;
pub mod formatters;
pub mod http;
pub mod retrieval;

// Re-export main types for easy access
pub use crate::batch::{BatchOptions, BatchOutcome, BatchProcessor, FailedVideo};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::formatters::OutputFormat;
pub use crate::http::{HttpClient, ReqwestHttpClient};
pub use crate::retrieval::{FetchedTranscript, TranscriptApi};
pub use caption_core::{CaptionError, CaptionTrackDescriptor, Catalog, CueRecord, SelectionMode};
