//! Request/result value types shared by the translator, the validator and the
//! orchestrator.

use serde::{Deserialize, Serialize};

/// Identifier of an issued translation request.
///
/// Strictly increasing within one orchestrator; comparing two ids tells which
/// request was issued later.
pub type RequestId = u64;

// ---------------------------------------------------------------------------
// EditState
// ---------------------------------------------------------------------------

/// Snapshot of everything the user has typed or selected.
///
/// The UI hands one of these to the orchestrator on every keystroke or
/// settings change; only the snapshot current when the debounce timer fires
/// is turned into a [`TranslationRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditState {
    pub source_text: String,
    /// Language code or `"auto"`.
    pub source_language: String,
    /// Country code; empty when unspecified.
    pub source_country: String,
    pub target_language: String,
    pub target_country: String,
}

impl EditState {
    /// `true` when the source text is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.source_text.trim().is_empty()
    }

    /// Freeze this snapshot into an immutable request.
    pub fn into_request(self, issued_at: RequestId) -> TranslationRequest {
        TranslationRequest {
            source_text: self.source_text,
            source_language: self.source_language,
            source_country: self.source_country,
            target_language: self.target_language,
            target_country: self.target_country,
            issued_at,
        }
    }
}

// ---------------------------------------------------------------------------
// TranslationRequest
// ---------------------------------------------------------------------------

/// An issued, immutable translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub source_text: String,
    pub source_language: String,
    pub source_country: String,
    pub target_language: String,
    pub target_country: String,
    pub issued_at: RequestId,
}

impl TranslationRequest {
    /// `true` when the source language should be detected by the model.
    pub fn detect_source(&self) -> bool {
        self.source_language.is_empty() || self.source_language.eq_ignore_ascii_case("auto")
    }
}

// ---------------------------------------------------------------------------
// TranslationResult
// ---------------------------------------------------------------------------

/// Speech hints returned alongside a translation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub voice_language_code: String,
    /// Text the synthesizer should read aloud (usually the translation).
    #[serde(default)]
    pub speak_text: String,
}

/// A validated translation.
///
/// `detected_language`, `source_language`, `translation` and `tts` are
/// mandatory on the wire; everything else defaults when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub detected_language: String,
    #[serde(default)]
    pub source_country: String,
    pub source_language: String,
    #[serde(default)]
    pub target_country: String,
    #[serde(default)]
    pub target_language: String,
    pub translation: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub notes: String,
    pub tts: TtsConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(text: &str) -> EditState {
        EditState {
            source_text: text.into(),
            source_language: "auto".into(),
            source_country: String::new(),
            target_language: "fr".into(),
            target_country: "FR".into(),
        }
    }

    #[test]
    fn blank_detection() {
        assert!(edit("").is_blank());
        assert!(edit("  \n\t ").is_blank());
        assert!(!edit(" hi ").is_blank());
    }

    #[test]
    fn into_request_keeps_fields() {
        let req = edit("hello").into_request(7);
        assert_eq!(req.source_text, "hello");
        assert_eq!(req.target_language, "fr");
        assert_eq!(req.target_country, "FR");
        assert_eq!(req.issued_at, 7);
        assert!(req.detect_source());
    }

    #[test]
    fn explicit_source_language_is_not_detected() {
        let mut e = edit("hola");
        e.source_language = "es".into();
        assert!(!e.into_request(1).detect_source());
    }
}
