//! Transcript selection by language priority.
//!
//! The caller's language codes are the outer loop and provenance is the inner
//! loop: a generated track in the first-choice language beats a manual track in
//! the second-choice language.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{CaptionTrackDescriptor, Catalog, TrackBucket};
use crate::{CaptionError, Result};

/// Which provenance buckets a lookup searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Manually created tracks first, then generated ones
    #[default]
    Any,
    ManualOnly,
    GeneratedOnly,
}

impl Catalog {
    /// Find a transcript for the first matching language code, preferring
    /// manually created tracks within each language.
    pub fn find_transcript<S: AsRef<str>>(&self, language_codes: &[S]) -> Result<&CaptionTrackDescriptor> {
        self.find_in(language_codes, &[self.manual(), self.generated()])
    }

    /// Find a manually created transcript for the first matching language code
    pub fn find_manually_created_transcript<S: AsRef<str>>(
        &self,
        language_codes: &[S],
    ) -> Result<&CaptionTrackDescriptor> {
        self.find_in(language_codes, &[self.manual()])
    }

    /// Find an automatically generated transcript for the first matching language code
    pub fn find_generated_transcript<S: AsRef<str>>(
        &self,
        language_codes: &[S],
    ) -> Result<&CaptionTrackDescriptor> {
        self.find_in(language_codes, &[self.generated()])
    }

    pub fn select<S: AsRef<str>>(&self, language_codes: &[S], mode: SelectionMode) -> Result<&CaptionTrackDescriptor> {
        match mode {
            SelectionMode::Any => self.find_transcript(language_codes),
            SelectionMode::ManualOnly => self.find_manually_created_transcript(language_codes),
            SelectionMode::GeneratedOnly => self.find_generated_transcript(language_codes),
        }
    }

    fn find_in<'a, S: AsRef<str>>(
        &'a self,
        language_codes: &[S],
        buckets: &[&'a TrackBucket],
    ) -> Result<&'a CaptionTrackDescriptor> {
        for code in language_codes {
            for bucket in buckets {
                if let Some(track) = bucket.get(code.as_ref()) {
                    debug!(
                        "Selected {} transcript {} for {}",
                        if track.is_generated() { "generated" } else { "manual" },
                        track,
                        self.subject_id()
                    );
                    return Ok(track);
                }
            }
        }

        Err(CaptionError::NoTranscriptFound {
            subject_id: self.subject_id().to_string(),
            requested_codes: language_codes.iter().map(|c| c.as_ref().to_string()).collect(),
            catalog: Box::new(self.clone()),
        })
    }
}
