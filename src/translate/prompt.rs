//! Prompt builder for the translation model.
//!
//! The system message pins the reply to the JSON contract that
//! [`validate`](crate::translate::validate) accepts; the user message carries
//! the request itself.

// ---------------------------------------------------------------------------
// System instruction
// ---------------------------------------------------------------------------

const SYSTEM_INSTRUCTION: &str = "\
You are a translation engine.
Translate the user's text into the requested target language and region.

Reply with ONE JSON object and nothing else, using exactly these keys:
{
  \"detected_language\": ISO-639-1 code of the input text,
  \"source_country\": ISO-3166 code of the input's regional variant, or \"\",
  \"source_language\": ISO-639-1 code used as the source,
  \"target_country\": ISO-3166 code of the target region,
  \"target_language\": ISO-639-1 code of the target language,
  \"translation\": the best translation,
  \"alternatives\": up to three other natural phrasings (may be empty),
  \"notes\": short usage notes, or \"\",
  \"tts\": {
    \"enabled\": true when the translation can be read aloud,
    \"voice_language_code\": BCP-47 voice locale such as \"fr-FR\",
    \"speak_text\": the text to read aloud
  }
}

Rules:
1. Preserve meaning, tone and formatting of the input.
2. Use the regional vocabulary of the target country.
3. Never wrap the JSON in markdown fences or add commentary.";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds `(system_msg, user_msg)` pairs for chat-completion endpoints.
///
/// ```rust
/// use live_translate::translate::{EditState, PromptBuilder};
///
/// let req = EditState {
///     source_text: "good morning".into(),
///     source_language: "auto".into(),
///     target_language: "es".into(),
///     target_country: "MX".into(),
///     ..EditState::default()
/// }
/// .into_request(1);
///
/// let (system, user) = PromptBuilder::new().build_chat(&req);
/// assert!(system.contains("JSON"));
/// assert!(user.contains("good morning"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the chat pair for `request`.
    pub fn build_chat(
        &self,
        request: &crate::translate::TranslationRequest,
    ) -> (String, String) {
        let system_msg = SYSTEM_INSTRUCTION.to_string();

        let source = if request.detect_source() {
            "detect automatically".to_string()
        } else {
            with_region(&request.source_language, &request.source_country)
        };
        let target = with_region(&request.target_language, &request.target_country);

        let mut user_msg = String::with_capacity(request.source_text.len() + 128);
        user_msg.push_str(&format!("Source language: {source}\n"));
        user_msg.push_str(&format!("Target language: {target}\n"));
        user_msg.push_str("\nText:\n");
        user_msg.push_str(&request.source_text);

        (system_msg, user_msg)
    }
}

fn with_region(language: &str, country: &str) -> String {
    if country.is_empty() {
        language.to_string()
    } else {
        format!("{language}-{country}")
    }
}
