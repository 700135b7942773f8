//! Core `SpeechSynthesizer` trait and `ApiSynthesizer` implementation.
//!
//! `ApiSynthesizer` calls an OpenAI-compatible `/v1/audio/speech` endpoint and
//! asks for raw `pcm` output (24 kHz, signed 16-bit little-endian, mono), which
//! is exactly what [`decode`](crate::audio::decode) consumes.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::SpeechApiConfig;

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

/// Errors from the speech synthesis capability.
#[derive(Debug, Clone, Error)]
pub enum TtsError {
    /// Transport, HTTP status or capability error.
    #[error("speech service failed: {0}")]
    RemoteFailure(String),

    /// The call succeeded but carried no audio.
    #[error("speech service returned no audio")]
    NoAudioProduced,
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        TtsError::RemoteFailure(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Async interface to the remote text-to-speech capability.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`, returning raw PCM bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError>;
}

// ---------------------------------------------------------------------------
// ApiSynthesizer
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/audio/speech` endpoint.
pub struct ApiSynthesizer {
    client: reqwest::Client,
    config: SpeechApiConfig,
}

impl ApiSynthesizer {
    /// Build an `ApiSynthesizer` from application config.
    pub fn from_config(config: &SpeechApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/audio/speech", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechSynthesizer for ApiSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        let body = serde_json::json!({
            "model":           self.config.model,
            "input":           text,
            "voice":           self.config.voice,
            "response_format": "pcm"
        });

        let mut req = self.client.post(self.endpoint()).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        if bytes.is_empty() {
            return Err(TtsError::NoAudioProduced);
        }

        log::debug!("tts: received {} bytes of pcm", bytes.len());
        Ok(bytes.to_vec())
    }
}
