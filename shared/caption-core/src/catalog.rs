//! Caption catalog structures and the builder that assembles them from the raw
//! caption metadata payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::Result;

/// A language into which a caption track may be translated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationTarget {
    pub language_name: String,
    pub language_code: String,
}

/// One caption track available for a subject
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionTrackDescriptor {
    subject_id: String,
    language_code: String,
    language_name: String,
    retrieval_url: String,
    is_generated: bool,
    translation_targets: Vec<TranslationTarget>,
}

impl CaptionTrackDescriptor {
    /// Subject this track belongs to
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Language code, e.g. "en"
    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    /// Human readable language name, e.g. "English"
    pub fn language_name(&self) -> &str {
        &self.language_name
    }

    /// URL serving the timed-text document for this track
    pub fn retrieval_url(&self) -> &str {
        &self.retrieval_url
    }

    /// Whether this track was produced by speech recognition
    pub fn is_generated(&self) -> bool {
        self.is_generated
    }

    pub fn translation_targets(&self) -> &[TranslationTarget] {
        &self.translation_targets
    }

    pub fn is_translatable(&self) -> bool {
        !self.translation_targets.is_empty()
    }

    /// Look up a translation target by language code
    pub fn translation_target(&self, language_code: &str) -> Option<&TranslationTarget> {
        self.translation_targets
            .iter()
            .find(|target| target.language_code == language_code)
    }
}

impl fmt::Display for CaptionTrackDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (\"{}\")", self.language_code, self.language_name)
    }
}

/// Tracks of a single provenance keyed by language code.
///
/// Keeps insertion order. Re-inserting an existing code replaces the track in
/// place, so the position of the first insertion is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TrackBucket {
    tracks: Vec<CaptionTrackDescriptor>,
}

impl TrackBucket {
    fn insert(&mut self, track: CaptionTrackDescriptor) {
        match self
            .tracks
            .iter_mut()
            .find(|existing| existing.language_code == track.language_code)
        {
            Some(existing) => *existing = track,
            None => self.tracks.push(track),
        }
    }

    pub fn get(&self, language_code: &str) -> Option<&CaptionTrackDescriptor> {
        self.tracks
            .iter()
            .find(|track| track.language_code == language_code)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CaptionTrackDescriptor> {
        self.tracks.iter()
    }

    pub fn language_codes(&self) -> Vec<&str> {
        self.tracks.iter().map(|track| track.language_code.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// All caption tracks available for one subject, partitioned by provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    subject_id: String,
    manual: TrackBucket,
    generated: TrackBucket,
}

// Shape of `playerCaptionsTracklistRenderer`. Every field is required except
// `kind`, which is only present on generated tracks.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCaptionMetadata {
    translation_languages: Vec<RawTranslationLanguage>,
    caption_tracks: Vec<RawCaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTranslationLanguage {
    language_name: SimpleText,
    language_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCaptionTrack {
    base_url: String,
    name: SimpleText,
    language_code: String,
    kind: Option<String>,
    is_translatable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimpleText {
    simple_text: String,
}

const GENERATED_KIND: &str = "asr";

impl Catalog {
    /// Build a catalog from the raw caption metadata object.
    ///
    /// Missing fields anywhere in the payload fail the whole build.
    pub fn build(subject_id: &str, raw_metadata: &Value) -> Result<Self> {
        let raw = RawCaptionMetadata::deserialize(raw_metadata)?;

        let translation_targets: Vec<TranslationTarget> = raw
            .translation_languages
            .into_iter()
            .map(|language| TranslationTarget {
                language_name: language.language_name.simple_text,
                language_code: language.language_code,
            })
            .collect();

        let mut manual = TrackBucket::default();
        let mut generated = TrackBucket::default();

        for caption in raw.caption_tracks {
            let is_generated = caption.kind.as_deref() == Some(GENERATED_KIND);
            let track = CaptionTrackDescriptor {
                subject_id: subject_id.to_string(),
                language_code: caption.language_code,
                language_name: caption.name.simple_text,
                retrieval_url: caption.base_url,
                is_generated,
                translation_targets: if caption.is_translatable {
                    translation_targets.clone()
                } else {
                    Vec::new()
                },
            };

            if is_generated {
                generated.insert(track);
            } else {
                manual.insert(track);
            }
        }

        debug!(
            "Built catalog for {}: {} manual, {} generated",
            subject_id,
            manual.len(),
            generated.len()
        );

        Ok(Self {
            subject_id: subject_id.to_string(),
            manual,
            generated,
        })
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Manually created tracks
    pub fn manual(&self) -> &TrackBucket {
        &self.manual
    }

    /// Automatically generated tracks
    pub fn generated(&self) -> &TrackBucket {
        &self.generated
    }

    /// Iterate over every track, manual tracks first
    pub fn tracks(&self) -> impl Iterator<Item = &CaptionTrackDescriptor> {
        self.manual.iter().chain(self.generated.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.manual.is_empty() && self.generated.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CaptionTrackDescriptor;
    type IntoIter = std::iter::Chain<
        std::slice::Iter<'a, CaptionTrackDescriptor>,
        std::slice::Iter<'a, CaptionTrackDescriptor>,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.manual.iter().chain(self.generated.iter())
    }
}

fn describe_bucket(bucket: &TrackBucket) -> String {
    if bucket.is_empty() {
        return "None".to_string();
    }

    bucket
        .iter()
        .map(|track| format!(" - {}", track))
        .collect::<Vec<_>>()
        .join("\n")
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "For this video ({}) transcripts are available in the following languages:\n\n\
            (MANUALLY CREATED)\n\
            {}\n\n\
            (GENERATED)\n\
            {}",
            self.subject_id,
            describe_bucket(&self.manual),
            describe_bucket(&self.generated)
        )
    }
}
