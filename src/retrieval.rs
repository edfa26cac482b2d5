//! Retrieval facade wiring the page fetch, the caption pipeline and the
//! timed-text fetch together.

use anyhow::{anyhow, Context, Result};
use caption_core::{cues, extract, CaptionTrackDescriptor, Catalog, CueRecord, SelectionMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::{form_urlencoded, Url};

use crate::http::{watch_url, HttpClient};

const LANGUAGE_PARAM: &str = "lang";

/// Cues of one selected transcript together with the track they came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedTranscript {
    pub video_id: String,
    pub language_code: String,
    pub language_name: String,
    pub is_generated: bool,
    pub cues: Vec<CueRecord>,
}

/// Transcript retrieval over an [`HttpClient`]
pub struct TranscriptApi<C> {
    client: C,
}

impl<C: HttpClient> TranscriptApi<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch the watch page of a video and build its caption catalog
    pub async fn list_transcripts(&self, video_id: &str) -> Result<Catalog> {
        let page = self
            .client
            .get(&watch_url(video_id))
            .await
            .with_context(|| format!("Failed to fetch watch page for {}", video_id))?;

        let body = extract::normalize_page_body(&page);
        let catalog = extract::fetch(video_id, &body)?;
        debug!(
            "{}: {} manual, {} generated tracks",
            video_id,
            catalog.manual().len(),
            catalog.generated().len()
        );
        Ok(catalog)
    }

    /// Download and parse the timed-text document of a track
    pub async fn fetch_transcript(&self, track: &CaptionTrackDescriptor) -> Result<Vec<CueRecord>> {
        let url = with_language_param(track.retrieval_url(), track.language_code())?;
        let document = self
            .client
            .get(&url)
            .await
            .with_context(|| format!("Failed to fetch transcript {} for {}", track, track.subject_id()))?;

        Ok(cues::parse(&document)?)
    }

    /// Select a track by language priority and fetch its cues
    pub async fn retrieve<S: AsRef<str>>(
        &self,
        video_id: &str,
        languages: &[S],
        mode: SelectionMode,
    ) -> Result<FetchedTranscript> {
        let catalog = self.list_transcripts(video_id).await?;
        let track = catalog.select(languages, mode)?;
        let cues = self.fetch_transcript(track).await?;

        info!(
            "📝 {}: {} cues from {} transcript {}",
            video_id,
            cues.len(),
            if track.is_generated() { "generated" } else { "manual" },
            track
        );

        Ok(FetchedTranscript {
            video_id: video_id.to_string(),
            language_code: track.language_code().to_string(),
            language_name: track.language_name().to_string(),
            is_generated: track.is_generated(),
            cues,
        })
    }

    /// Cues for the first available language, manual tracks preferred
    pub async fn get_transcript<S: AsRef<str>>(&self, video_id: &str, languages: &[S]) -> Result<Vec<CueRecord>> {
        Ok(self.retrieve(video_id, languages, SelectionMode::Any).await?.cues)
    }
}

/// Set the `lang` query parameter of a transcript URL, replacing any existing value.
///
/// Every other query segment is kept byte for byte, since the server signs them.
pub fn with_language_param(url: &str, language_code: &str) -> Result<String> {
    let mut parsed = Url::parse(url).with_context(|| format!("Invalid transcript URL: {}", url))?;

    let mut segments: Vec<&str> = parsed
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|segment| {
            let key = segment.split('=').next().unwrap_or_default();
            !segment.is_empty() && key != LANGUAGE_PARAM
        })
        .collect();

    let encoded_code: String = form_urlencoded::byte_serialize(language_code.as_bytes()).collect();
    let language_segment = format!("{}={}", LANGUAGE_PARAM, encoded_code);
    segments.push(&language_segment);

    let query = segments.join("&");
    parsed.set_query(Some(&query));
    Ok(parsed.into())
}

/// Accept a bare video identifier, a watch URL or a `youtu.be` short link
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();

    if let Ok(url) = Url::parse(input) {
        let id = match url.host_str() {
            Some("youtu.be") => url
                .path_segments()
                .and_then(|mut segments| segments.next())
                .map(str::to_string),
            _ => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
        };

        return id
            .filter(|id| is_video_id(id))
            .ok_or_else(|| anyhow!("No video id in URL: {}", input));
    }

    if is_video_id(input) {
        Ok(input.to_string())
    } else {
        Err(anyhow!("Invalid video id: {}", input))
    }
}

fn is_video_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use caption_core::CaptionError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub(crate) const TRANSCRIPT: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.0" dur="1.54">Hey, this is just a test</text><text start="1.54" dur="4.16">and this is the second line</text><text start="9.03" dur="2.2"></text></transcript>"#;

    /// Watch page with manual de/en tracks and a generated en track
    pub(crate) fn watch_page(video_id: &str) -> String {
        format!(
            concat!(
                r#"<script>var ytInitialPlayerResponse = {{\"playabilityStatus\":{{\"status\":\"OK\"}},"#,
                r#"\"captions\":{{\"playerCaptionsTracklistRenderer\":{{\"captionTracks\":["#,
                r#"{{\"baseUrl\":\"https://www.youtube.com/api/timedtext?v={id}&lang=de\",\"name\":{{\"simpleText\":\"Deutsch\"}},\"languageCode\":\"de\",\"isTranslatable\":true}},"#,
                r#"{{\"baseUrl\":\"https://www.youtube.com/api/timedtext?v={id}&lang=en\",\"name\":{{\"simpleText\":\"English\"}},\"languageCode\":\"en\",\"isTranslatable\":true}},"#,
                r#"{{\"baseUrl\":\"https://www.youtube.com/api/timedtext?v={id}&kind=asr\",\"name\":{{\"simpleText\":\"English (auto-generated)\"}},\"languageCode\":\"en\",\"kind\":\"asr\",\"isTranslatable\":false}}"#,
                r#"],\"translationLanguages\":[{{\"languageName\":{{\"simpleText\":\"Spanish\"}},\"languageCode\":\"es\"}}]}}}},"#,
                r#"\"videoDetails\":{{\"videoId\":\"{id}\"}}}};</script>"#
            ),
            id = video_id
        )
    }

    /// Serves canned bodies by URL prefix and records every requested URL
    #[derive(Default)]
    pub(crate) struct FakeHttpClient {
        responses: HashMap<String, String>,
        pub(crate) requests: Mutex<Vec<String>>,
    }

    impl FakeHttpClient {
        pub(crate) fn with_video(mut self, video_id: &str) -> Self {
            self.responses.insert(watch_url(video_id), watch_page(video_id));
            self.responses.insert(
                format!("https://www.youtube.com/api/timedtext?v={}", video_id),
                TRANSCRIPT.to_string(),
            );
            self
        }

        pub(crate) fn with_page(mut self, video_id: &str, body: &str) -> Self {
            self.responses.insert(watch_url(video_id), body.to_string());
            self
        }

        pub(crate) fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for FakeHttpClient {
        async fn get(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());

            // Longest matching prefix wins so the watch page never shadows another entry
            self.responses
                .iter()
                .filter(|(prefix, _)| url == prefix.as_str() || url.starts_with(&format!("{}&", prefix)))
                .max_by_key(|(prefix, _)| prefix.len())
                .map(|(_, body)| body.clone())
                .ok_or_else(|| anyhow!("HTTP error 404 Not Found: {}", url))
        }
    }

    #[tokio::test]
    async fn test_list_transcripts() {
        let api = TranscriptApi::new(FakeHttpClient::default().with_video("GJLlxj_dtq8"));
        let catalog = api.list_transcripts("GJLlxj_dtq8").await.unwrap();

        assert_eq!(catalog.manual().language_codes(), vec!["de", "en"]);
        assert_eq!(catalog.generated().language_codes(), vec!["en"]);
        assert_eq!(
            api.client().requested(),
            vec!["https://www.youtube.com/watch?v=GJLlxj_dtq8".to_string()]
        );
    }

    #[tokio::test]
    async fn test_get_transcript() {
        let api = TranscriptApi::new(FakeHttpClient::default().with_video("GJLlxj_dtq8"));
        let cues = api.get_transcript("GJLlxj_dtq8", &["en"]).await.unwrap();

        assert_eq!(
            cues,
            vec![
                CueRecord::new("Hey, this is just a test", 0.0, 1.54),
                CueRecord::new("and this is the second line", 1.54, 4.16),
            ]
        );
    }

    #[tokio::test]
    async fn test_transcript_request_uses_selected_language() {
        let api = TranscriptApi::new(FakeHttpClient::default().with_video("GJLlxj_dtq8"));
        api.get_transcript("GJLlxj_dtq8", &["de", "en"]).await.unwrap();

        let requested = api.client().requested();
        let transcript_url = Url::parse(&requested[1]).unwrap();
        let langs: Vec<_> = transcript_url
            .query_pairs()
            .filter(|(key, _)| key == "lang")
            .map(|(_, value)| value.into_owned())
            .collect();
        assert_eq!(langs, vec!["de"]);
    }

    #[tokio::test]
    async fn test_transcript_request_falls_back_to_next_language() {
        let api = TranscriptApi::new(FakeHttpClient::default().with_video("GJLlxj_dtq8"));
        let fetched = api
            .retrieve("GJLlxj_dtq8", &["cz", "en"], SelectionMode::Any)
            .await
            .unwrap();

        assert_eq!(fetched.language_code, "en");
        assert!(!fetched.is_generated);
        assert!(api.client().requested()[1].ends_with("&lang=en"));
    }

    #[tokio::test]
    async fn test_generated_only_selects_asr_track() {
        let api = TranscriptApi::new(FakeHttpClient::default().with_video("GJLlxj_dtq8"));
        let fetched = api
            .retrieve("GJLlxj_dtq8", &["en"], SelectionMode::GeneratedOnly)
            .await
            .unwrap();

        assert!(fetched.is_generated);
        assert_eq!(fetched.language_name, "English (auto-generated)");
        assert!(api.client().requested()[1].contains("kind=asr"));
    }

    #[tokio::test]
    async fn test_no_transcript_found_is_downcastable() {
        let api = TranscriptApi::new(FakeHttpClient::default().with_video("GJLlxj_dtq8"));
        let err = api.get_transcript("GJLlxj_dtq8", &["cz"]).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CaptionError>(),
            Some(CaptionError::NoTranscriptFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_disabled_and_unavailable_pages() {
        let api = TranscriptApi::new(
            FakeHttpClient::default()
                .with_page("dsMFmonKDD4", r#"{"playabilityStatus":{"status":"OK"}}"#)
                .with_page("abc", "<html>gone</html>"),
        );

        let disabled = api.list_transcripts("dsMFmonKDD4").await.unwrap_err();
        assert!(matches!(
            disabled.downcast_ref::<CaptionError>(),
            Some(CaptionError::TranscriptsDisabled(_))
        ));

        let unavailable = api.list_transcripts("abc").await.unwrap_err();
        assert!(matches!(
            unavailable.downcast_ref::<CaptionError>(),
            Some(CaptionError::VideoUnavailable(_))
        ));
    }

    #[test]
    fn test_with_language_param() {
        assert_eq!(
            with_language_param("https://www.youtube.com/api/timedtext?v=abc&lang=en", "de").unwrap(),
            "https://www.youtube.com/api/timedtext?v=abc&lang=de"
        );
        assert_eq!(
            with_language_param("https://www.youtube.com/api/timedtext?v=abc&kind=asr", "en").unwrap(),
            "https://www.youtube.com/api/timedtext?v=abc&kind=asr&lang=en"
        );
        assert!(with_language_param("not a url", "en").is_err());
    }

    #[test]
    fn test_with_language_param_keeps_signed_params_verbatim() {
        let url = "https://www.youtube.com/api/timedtext?v=abc&sparams=ip,ipbits,expire&signature=A1.B2&lang=en";

        assert_eq!(
            with_language_param(url, "en").unwrap(),
            "https://www.youtube.com/api/timedtext?v=abc&sparams=ip,ipbits,expire&signature=A1.B2&lang=en"
        );
        assert_eq!(
            with_language_param(url, "de").unwrap(),
            "https://www.youtube.com/api/timedtext?v=abc&sparams=ip,ipbits,expire&signature=A1.B2&lang=de"
        );
        assert_eq!(
            with_language_param("https://www.youtube.com/api/timedtext?lang=en&v=a%2Cb", "nl").unwrap(),
            "https://www.youtube.com/api/timedtext?v=a%2Cb&lang=nl"
        );
    }

    #[test]
    fn test_extract_video_id() {
        assert_eq!(extract_video_id("GJLlxj_dtq8").unwrap(), "GJLlxj_dtq8");
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=GJLlxj_dtq8&t=42").unwrap(),
            "GJLlxj_dtq8"
        );
        assert_eq!(extract_video_id("https://youtu.be/GJLlxj_dtq8").unwrap(), "GJLlxj_dtq8");
        assert!(extract_video_id("https://www.youtube.com/feed").is_err());
        assert!(extract_video_id("not an id!").is_err());
    }
}
