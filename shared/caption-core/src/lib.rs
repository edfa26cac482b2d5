//! Caption Core - Caption metadata extraction, transcript selection and timed-text parsing
//!
//! Every function in this crate is a pure transform over in-memory data. Fetching
//! page bodies and timed-text documents is left to the caller.

pub mod catalog;
pub mod cues;
pub mod extract;
pub mod selection;

pub use catalog::{CaptionTrackDescriptor, Catalog, TranslationTarget};
pub use cues::CueRecord;
pub use selection::SelectionMode;

/// Result type for caption pipeline operations
pub type Result<T> = std::result::Result<T, CaptionError>;

/// Error types for caption pipeline operations
#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    #[error("Could not retrieve a transcript for the video {0}! The video is no longer available")]
    VideoUnavailable(String),

    #[error("Could not retrieve a transcript for the video {0}! Subtitles are disabled for this video")]
    TranscriptsDisabled(String),

    #[error(
        "Could not retrieve a transcript for the video {subject_id}! No transcripts were found for any of the requested language codes: {requested_codes:?}\n\n{catalog}"
    )]
    NoTranscriptFound {
        subject_id: String,
        requested_codes: Vec<String>,
        catalog: Box<Catalog>,
    },

    #[error("Caption payload error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Caption payload is missing field: {0}")]
    MissingField(String),

    #[error("Malformed timed-text document: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Cue element <{element}> is missing attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    #[error("Invalid cue timing {attribute}={value:?}")]
    InvalidTiming { attribute: String, value: String },
}

impl CaptionError {
    /// Subject id carried by domain errors, `None` for parse failures
    pub fn subject_id(&self) -> Option<&str> {
        match self {
            CaptionError::VideoUnavailable(id) | CaptionError::TranscriptsDisabled(id) => Some(id),
            CaptionError::NoTranscriptFound { subject_id, .. } => Some(subject_id),
            _ => None,
        }
    }
}
