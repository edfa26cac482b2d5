//! Timed-text document parsing

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{CaptionError, Result};

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<[^>]*>").expect("markup tag pattern is valid")
});

/// A single timed caption unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueRecord {
    /// Caption text with entities decoded and markup removed
    pub text: String,
    /// Offset from the start of the video in seconds
    pub start: f64,
    /// Display duration in seconds
    pub duration: f64,
}

impl CueRecord {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    /// End of the cue in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Decode HTML entities and numeric character references
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Remove every `<...>` tag without replacement
pub fn strip_markup(text: &str) -> String {
    MARKUP_TAG.replace_all(text, "").into_owned()
}

fn parse_timing(node: &roxmltree::Node<'_, '_>, attribute: &str) -> Result<f64> {
    let raw = node
        .attribute(attribute)
        .ok_or_else(|| CaptionError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute: attribute.to_string(),
        })?;

    match raw.trim().parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
        _ => Err(CaptionError::InvalidTiming {
            attribute: attribute.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Parse a timed-text document into cue records in document order.
///
/// Child elements of the root without text are skipped. Any malformed markup or
/// timing attribute fails the whole document.
pub fn parse(document: &str) -> Result<Vec<CueRecord>> {
    let tree = roxmltree::Document::parse(document)?;

    let mut cues = Vec::new();
    for node in tree.root_element().children().filter(|n| n.is_element()) {
        let text = match node.text() {
            Some(text) if !text.is_empty() => text,
            _ => continue,
        };

        cues.push(CueRecord {
            text: strip_markup(&decode_entities(text)),
            start: parse_timing(&node, "start")?,
            duration: parse_timing(&node, "dur")?,
        });
    }

    debug!("Parsed {} cues", cues.len());
    Ok(cues)
}
