//! Response contract validation.
//!
//! Models wrap JSON in markdown fences or chatter around it often enough that
//! a strict parse alone is not sufficient.  [`validate`] tries, in order:
//!
//! 1. a direct parse of the whole payload;
//! 2. a parse of the outermost `{ … }` substring.
//!
//! Nothing else is attempted.  A payload that parses but lacks a required
//! field is still [`TranslateError::MalformedResponse`].

use crate::translate::types::TranslationResult;
use crate::translate::TranslateError;

/// Parse and validate a raw model reply into a [`TranslationResult`].
///
/// ```
/// use live_translate::translate::validate;
///
/// let raw = "Sure!\n{\"detected_language\":\"en\",\"source_language\":\"en\",\
///            \"translation\":\"bonjour\",\"tts\":{}}";
/// let result = validate(raw).unwrap();
/// assert_eq!(result.translation, "bonjour");
/// ```
pub fn validate(raw: &str) -> Result<TranslationResult, TranslateError> {
    let parsed = match serde_json::from_str::<TranslationResult>(raw.trim()) {
        Ok(result) => result,
        Err(direct_err) => {
            let Some(candidate) = outermost_object(raw) else {
                return Err(TranslateError::MalformedResponse(direct_err.to_string()));
            };
            serde_json::from_str::<TranslationResult>(candidate)
                .map_err(|e| TranslateError::MalformedResponse(e.to_string()))?
        }
    };

    if parsed.translation.trim().is_empty() {
        return Err(TranslateError::MalformedResponse(
            "translation field is empty".into(),
        ));
    }

    Ok(parsed)
}

/// Slice from the first `{` to the last `}` inclusive.
fn outermost_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "detected_language": "en",
        "source_country": "US",
        "source_language": "en",
        "target_country": "FR",
        "target_language": "fr",
        "translation": "bonjour",
        "alternatives": ["salut", "coucou"],
        "notes": "informal variants listed",
        "tts": {"enabled": true, "voice_language_code": "fr-FR", "speak_text": "bonjour"}
    }"#;

    #[test]
    fn direct_parse_of_full_payload() {
        let r = validate(FULL).unwrap();
        assert_eq!(r.detected_language, "en");
        assert_eq!(r.target_country, "FR");
        assert_eq!(r.alternatives, vec!["salut", "coucou"]);
        assert!(r.tts.enabled);
        assert_eq!(r.tts.voice_language_code, "fr-FR");
    }

    #[test]
    fn fenced_json_is_extracted() {
        let raw = "```json\n{\"detected_language\":\"en\",\"source_language\":\"en\",\"translation\":\"hi\",\"tts\":{\"enabled\":true,\"voice_language_code\":\"en-US\",\"speak_text\":\"hi\"}}\n```";
        let r = validate(raw).unwrap();
        assert_eq!(r.translation, "hi");
        assert_eq!(r.tts.speak_text, "hi");
        assert!(r.alternatives.is_empty());
        assert!(r.notes.is_empty());
    }

    #[test]
    fn prose_around_object_is_tolerated() {
        let raw = format!("Here is your translation:\n{FULL}\nLet me know if you need more.");
        assert_eq!(validate(&raw).unwrap().translation, "bonjour");
    }

    #[test]
    fn missing_tts_is_malformed() {
        let raw = r#"{"detected_language":"en","source_language":"en","translation":"hi"}"#;
        assert!(matches!(
            validate(raw),
            Err(TranslateError::MalformedResponse(_))
        ));
    }

    #[test]
    fn missing_translation_in_wrapped_object_is_malformed() {
        let raw = "```json\n{\"detected_language\":\"en\",\"source_language\":\"en\",\"tts\":{}}\n```";
        assert!(matches!(
            validate(raw),
            Err(TranslateError::MalformedResponse(_))
        ));
    }

    #[test]
    fn empty_translation_is_malformed() {
        let raw = r#"{"detected_language":"en","source_language":"en","translation":"  ","tts":{}}"#;
        assert!(matches!(
            validate(raw),
            Err(TranslateError::MalformedResponse(_))
        ));
    }

    #[test]
    fn no_braces_is_malformed() {
        assert!(matches!(
            validate("I cannot translate that."),
            Err(TranslateError::MalformedResponse(_))
        ));
    }

    #[test]
    fn unbalanced_braces_are_malformed() {
        assert!(validate("} nope {").is_err());
        assert!(validate("{ \"detected_language\": ").is_err());
    }

    #[test]
    fn outermost_object_spans_first_to_last_brace() {
        assert_eq!(outermost_object("a {b {c} d} e"), Some("{b {c} d}"));
        assert_eq!(outermost_object("no object"), None);
    }
}
