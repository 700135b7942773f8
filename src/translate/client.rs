//! Core `Translator` trait and `ApiTranslator` implementation.
//!
//! `ApiTranslator` calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint.  All connection details come from [`TranslationApiConfig`];
//! nothing is hardcoded.  It returns the model's raw reply; contract
//! validation is the orchestrator's job.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::TranslationApiConfig;
use crate::translate::prompt::PromptBuilder;
use crate::translate::types::TranslationRequest;

// ---------------------------------------------------------------------------
// TranslateError
// ---------------------------------------------------------------------------

/// Errors from the translation capability and its response contract.
#[derive(Debug, Clone, Error)]
pub enum TranslateError {
    /// Transport, HTTP status or capability error.
    #[error("translation service failed: {0}")]
    RemoteFailure(String),

    /// The reply could not be interpreted as a translation result.
    #[error("malformed translation response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        TranslateError::RemoteFailure(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Translator trait
// ---------------------------------------------------------------------------

/// Async interface to the remote translation model.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn Translator>` across spawned tasks.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Return the raw reply text for `request`.
    async fn translate(&self, request: &TranslationRequest) -> Result<String, TranslateError>;
}

// ---------------------------------------------------------------------------
// ApiTranslator
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct ApiTranslator {
    client: reqwest::Client,
    config: TranslationApiConfig,
    prompt_builder: PromptBuilder,
}

impl ApiTranslator {
    /// Build an `ApiTranslator` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`; a default client is used if the builder fails.
    pub fn from_config(config: &TranslationApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
            prompt_builder: PromptBuilder::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Translator for ApiTranslator {
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-empty string.
    async fn translate(&self, request: &TranslationRequest) -> Result<String, TranslateError> {
        let (system_msg, user_msg) = self.prompt_builder.build_chat(request);

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": system_msg },
                { "role": "user",   "content": user_msg   }
            ],
            "stream":          false,
            "temperature":     self.config.temperature,
            "response_format": { "type": "json_object" }
        });

        let mut req = self.client.post(self.endpoint()).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        log::debug!("translate: request #{} sent", request.issued_at);
        let response = req.send().await?.error_for_status()?;

        let json: serde_json::Value = response.json().await?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| TranslateError::RemoteFailure("reply had no message content".into()))?;

        Ok(content.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(base_url: &str, api_key: Option<&str>) -> TranslationApiConfig {
        TranslationApiConfig {
            base_url: base_url.into(),
            api_key: api_key.map(|s| s.to_string()),
            ..TranslationApiConfig::default()
        }
    }

    #[test]
    fn from_config_accepts_missing_and_empty_keys() {
        let _ = ApiTranslator::from_config(&make_config("http://localhost:11434", None));
        let _ = ApiTranslator::from_config(&make_config("http://localhost:11434", Some("")));
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let t = ApiTranslator::from_config(&make_config("http://localhost:11434/", None));
        assert_eq!(t.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn translator_is_object_safe() {
        let t: Box<dyn Translator> =
            Box::new(ApiTranslator::from_config(&TranslationApiConfig::default()));
        drop(t);
    }

    #[test]
    fn errors_render_human_readable() {
        let e = TranslateError::RemoteFailure("503".into());
        assert_eq!(e.to_string(), "translation service failed: 503");
    }
}
