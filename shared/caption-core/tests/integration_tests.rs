use caption_core::extract::{self, normalize_page_body};
use caption_core::{cues, CaptionError, Catalog, CueRecord, SelectionMode};

/// Watch page fragment as served, with the player response embedded in an escaped JS string
const ESCAPED_WATCH_PAGE: &str = concat!(
    r#"<html><body><script>ytplayer.config = {"args":{"player_response":"{\"playabilityStatus\":{\"status\":\"OK\"},"#,
    r#"\"captions\":{\"playerCaptionsTracklistRenderer\":{\"captionTracks\":["#,
    r#"{\"baseUrl\":\"https://www.youtube.com/api/timedtext?v=F1xioXWb8CY&lang=nl\",\"name\":{\"simpleText\":\"Nederlands\"},\"languageCode\":\"nl\",\"isTranslatable\":true},"#,
    r#"{\"baseUrl\":\"https://www.youtube.com/api/timedtext?v=F1xioXWb8CY&lang=en\",\"name\":{\"simpleText\":\"English\"},\"languageCode\":\"en\",\"isTranslatable\":true},"#,
    r#"{\"baseUrl\":\"https://www.youtube.com/api/timedtext?v=F1xioXWb8CY&lang=nl&kind=asr\",\"name\":{\"simpleText\":\"Nederlands (automatisch gegenereerd)\"},\"languageCode\":\"nl\",\"kind\":\"asr\",\"isTranslatable\":false}"#,
    r#"],\"translationLanguages\":[{\"languageName\":{\"simpleText\":\"Deutsch\"},\"languageCode\":\"de\"},{\"languageName\":{\"simpleText\":\"English\"},\"languageCode\":\"en\"}]}},"#,
    r#"\"videoDetails\":{\"videoId\":\"F1xioXWb8CY\"}}"}};</script></body></html>"#
);

const TIMED_TEXT: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<transcript>
<text start="0.0" dur="1.54">Hey, this is just a test</text>
<text start="1.54" dur="4.16">and this is the &amp;lt;i&amp;gt;second&amp;lt;/i&amp;gt; line</text>
<text start="5.7" dur="3.239"></text>
<text start="8.939" dur="2">it&amp;#39;s shorter</text>
</transcript>"#;

fn watch_page_catalog() -> Catalog {
    let page = normalize_page_body(ESCAPED_WATCH_PAGE);
    extract::fetch("F1xioXWb8CY", &page).unwrap()
}

#[test]
fn test_escaped_page_yields_catalog() {
    let catalog = watch_page_catalog();

    assert_eq!(catalog.manual().language_codes(), vec!["nl", "en"]);
    assert_eq!(catalog.generated().language_codes(), vec!["nl"]);

    let english = catalog.manual().get("en").unwrap();
    assert_eq!(
        english.retrieval_url(),
        "https://www.youtube.com/api/timedtext?v=F1xioXWb8CY&lang=en"
    );
    assert_eq!(english.translation_targets().len(), 2);
}

#[test]
fn test_fallback_language_is_selected() {
    let catalog = watch_page_catalog();
    let selected = catalog.find_transcript(&["de", "en"]).unwrap();

    assert_eq!(selected.language_code(), "en");
    assert!(!selected.is_generated());
}

#[test]
fn test_unknown_language_reports_available_tracks() {
    let catalog = watch_page_catalog();
    let err = catalog.select(&["cz"], SelectionMode::Any).unwrap_err();

    assert_eq!(err.subject_id(), Some("F1xioXWb8CY"));
    let message = err.to_string();
    assert!(message.contains(" - nl (\"Nederlands\")\n - en (\"English\")"));
    assert!(message.contains("(GENERATED)\n - nl (\"Nederlands (automatisch gegenereerd)\")"));
}

#[test]
fn test_build_is_deterministic() {
    let page = normalize_page_body(ESCAPED_WATCH_PAGE);
    let raw = extract::extract_captions_json("F1xioXWb8CY", &page).unwrap();

    let first = Catalog::build("F1xioXWb8CY", &raw).unwrap();
    let second = Catalog::build("F1xioXWb8CY", &raw).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn test_page_outcomes() {
    assert!(matches!(
        extract::fetch("abc", "<html>nothing to see</html>"),
        Err(CaptionError::VideoUnavailable(_))
    ));
    assert!(matches!(
        extract::fetch("abc", r#"{"playabilityStatus":{"status":"OK"}}"#),
        Err(CaptionError::TranscriptsDisabled(_))
    ));
}

#[test]
fn test_timed_text_to_cues() {
    let parsed = cues::parse(TIMED_TEXT).unwrap();

    assert_eq!(
        parsed,
        vec![
            CueRecord::new("Hey, this is just a test", 0.0, 1.54),
            CueRecord::new("and this is the second line", 1.54, 4.16),
            CueRecord::new("it's shorter", 8.939, 2.0),
        ]
    );
}
