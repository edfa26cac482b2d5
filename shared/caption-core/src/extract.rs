//! Locates the caption metadata payload embedded in a video page.
//!
//! The payload is found with plain string markers rather than an HTML parser.
//! Three outcomes are possible: the payload is present, the page is a video page
//! without captions, or the page is not a video page at all.

use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::{CaptionError, Result};

const CAPTIONS_MARKER: &str = "\"captions\":";
const PLAYABILITY_MARKER: &str = "\"playabilityStatus\":";
const VIDEO_DETAILS_MARKER: &str = ",\"videoDetails";
const RENDERER_FIELD: &str = "playerCaptionsTracklistRenderer";

/// Undo the JS string escaping of a raw page body.
///
/// Escaped ampersands become `&` and every remaining backslash is dropped.
/// Must run before [`fetch`] or [`extract_captions_json`].
pub fn normalize_page_body(raw: &str) -> String {
    raw.replace("\\u0026", "&").replace('\\', "")
}

/// Extract the raw `playerCaptionsTracklistRenderer` object from a normalized page body
pub fn extract_captions_json(subject_id: &str, page_body: &str) -> Result<Value> {
    let mut sections = page_body.split(CAPTIONS_MARKER);
    // The first section is whatever precedes the marker
    sections.next();

    let Some(section) = sections.next() else {
        if !page_body.contains(PLAYABILITY_MARKER) {
            warn!("No playability status on page for {}, video unavailable", subject_id);
            return Err(CaptionError::VideoUnavailable(subject_id.to_string()));
        }
        warn!("No caption configuration on page for {}", subject_id);
        return Err(CaptionError::TranscriptsDisabled(subject_id.to_string()));
    };

    let payload = section
        .split(VIDEO_DETAILS_MARKER)
        .next()
        .unwrap_or(section)
        .replace('\n', "");
    debug!("Caption payload for {}: {} bytes", subject_id, payload.len());

    let mut captions: Value = serde_json::from_str(&payload)?;
    captions
        .get_mut(RENDERER_FIELD)
        .map(Value::take)
        .ok_or_else(|| CaptionError::MissingField(RENDERER_FIELD.to_string()))
}

/// Build the caption catalog for a subject from its normalized page body
pub fn fetch(subject_id: &str, page_body: &str) -> Result<Catalog> {
    let captions = extract_captions_json(subject_id, page_body)?;
    Catalog::build(subject_id, &captions)
}
