//! Rendering of fetched transcripts for stdout or files

pub mod srt;

use anyhow::Result;
use caption_core::CueRecord;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::retrieval::FetchedTranscript;

pub use srt::{format_timestamp, SubtitleEntry, SubtitleGenerator, TimestampStyle};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    #[default]
    Pretty,
    /// Cue texts, one per line
    Text,
    /// SubRip subtitles
    Srt,
    /// WebVTT subtitles
    Vtt,
}

impl OutputFormat {
    /// File extension used when writing to an output directory
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json | OutputFormat::Pretty => "json",
            OutputFormat::Text => "txt",
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
        }
    }

    fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Pretty)
    }
}

/// Render the cues of a single transcript
pub fn format_transcript(cues: &[CueRecord], format: OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Json => serde_json::to_string(cues)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(cues)?,
        OutputFormat::Text => cues
            .iter()
            .map(|cue| cue.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Srt => SubtitleGenerator::from_cues(cues).generate_srt(),
        OutputFormat::Vtt => SubtitleGenerator::from_cues(cues).generate_webvtt(),
    };

    Ok(content)
}

/// Render several transcripts.
///
/// JSON formats produce one object mapping each video identifier to its cues.
/// Other formats render each transcript in turn, separated by a
/// blank line.
pub fn format_batch(transcripts: &[FetchedTranscript], format: OutputFormat) -> Result<String> {
    if format.is_json() {
        let mut by_video = serde_json::Map::new();
        for transcript in transcripts {
            by_video.insert(
                transcript.video_id.clone(),
                serde_json::to_value(&transcript.cues)?,
            );
        }
        let value = serde_json::Value::Object(by_video);

        return Ok(match format {
            OutputFormat::Pretty => serde_json::to_string_pretty(&value)?,
            _ => serde_json::to_string(&value)?,
        });
    }

    let rendered = transcripts
        .iter()
        .map(|transcript| format_transcript(&transcript.cues, format))
        .collect::<Result<Vec<_>>>()?;

    Ok(rendered.join("\n\n"))
}
