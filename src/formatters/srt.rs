use caption_core::CueRecord;
use std::fmt;
use std::time::Duration;

/// Separator between seconds and milliseconds in a cue timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    /// `HH:MM:SS,mmm`
    Srt,
    /// `HH:MM:SS.mmm`
    WebVtt,
}

/// One numbered subtitle block
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    /// Sequential number, starting at 1
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(index: usize, start: Duration, end: Duration, text: String) -> Self {
        Self {
            index,
            start,
            end,
            text: text.trim().to_string(),
        }
    }

    /// Timings beyond the range of `Duration` saturate to `Duration::MAX`
    pub fn from_cue(index: usize, cue: &CueRecord) -> Self {
        Self::new(index, seconds_to_duration(cue.start), seconds_to_duration(cue.end()), cue.text.clone())
    }

    fn render(&self, style: TimestampStyle) -> String {
        format!(
            "{} --> {}\n{}\n",
            format_timestamp(self.start, style),
            format_timestamp(self.end, style),
            self.text
        )
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.index, self.render(TimestampStyle::Srt))
    }
}

/// SRT and WebVTT document generator
#[derive(Debug, Clone, Default)]
pub struct SubtitleGenerator {
    entries: Vec<SubtitleEntry>,
}

impl SubtitleGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build entries from cue records, numbered in document order
    pub fn from_cues(cues: &[CueRecord]) -> Self {
        let entries = cues
            .iter()
            .enumerate()
            .map(|(i, cue)| SubtitleEntry::from_cue(i + 1, cue))
            .collect();

        Self { entries }
    }

    /// Generate SRT content
    pub fn generate_srt(&self) -> String {
        let mut content = String::new();

        for entry in &self.entries {
            content.push_str(&entry.to_string());
            content.push('\n');
        }

        content
    }

    /// Generate WebVTT content
    pub fn generate_webvtt(&self) -> String {
        let mut content = String::from("WEBVTT\n\n");

        for entry in &self.entries {
            content.push_str(&entry.render(TimestampStyle::WebVtt));
            content.push('\n');
        }

        content
    }

    /// Get total duration covered by the entries
    pub fn total_duration(&self) -> Duration {
        self.entries
            .iter()
            .map(|entry| entry.end)
            .max()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

/// Format a duration as `HH:MM:SS,mmm` or `HH:MM:SS.mmm`
pub fn format_timestamp(duration: Duration, style: TimestampStyle) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let milliseconds = duration.subsec_millis();
    let separator = match style {
        TimestampStyle::Srt => ',',
        TimestampStyle::WebVtt => '.',
    };

    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, seconds, separator, milliseconds)
}
