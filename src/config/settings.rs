//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// DeploymentMode
// ---------------------------------------------------------------------------

/// Which history backend (and debounce window) a session runs with.
///
/// | Variant | History backend       | Default quiet period |
/// |---------|-----------------------|----------------------|
/// | Local   | key-value slot on disk| 200 ms               |
/// | Cloud   | remote per-user store | 500 ms               |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentMode {
    Local,
    Cloud,
}

// ---------------------------------------------------------------------------
// TranslationApiConfig
// ---------------------------------------------------------------------------

/// Connection settings for the remote translation model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationApiConfig {
    /// Base URL of an OpenAI-compatible endpoint.
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TranslationApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.2,
            timeout_secs: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechApiConfig
// ---------------------------------------------------------------------------

/// Connection and format settings for the remote speech synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechApiConfig {
    /// Base URL of an OpenAI-compatible endpoint.
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// TTS model identifier.
    pub model: String,
    /// Voice name passed to the synthesizer.
    pub voice: String,
    /// Sample rate of the PCM returned by the synthesizer, in Hz.
    ///
    /// The shared audio output is opened at this rate.
    pub sample_rate: u32,
    /// Interleaved channel count of the returned PCM.
    pub channels: u16,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SpeechApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "gpt-4o-mini-tts".into(),
            voice: "alloy".into(),
            sample_rate: 24_000,
            channels: 1,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// OrchestratorConfig
// ---------------------------------------------------------------------------

/// Debounce windows for the translation orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Quiet period in milliseconds when running without an identity.
    pub local_quiet_ms: u64,
    /// Quiet period in milliseconds when running against the cloud backend.
    pub cloud_quiet_ms: u64,
}

impl OrchestratorConfig {
    /// Quiet period for the given deployment mode.
    pub fn quiet_period(&self, mode: DeploymentMode) -> Duration {
        match mode {
            DeploymentMode::Local => Duration::from_millis(self.local_quiet_ms),
            DeploymentMode::Cloud => Duration::from_millis(self.cloud_quiet_ms),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            local_quiet_ms: 200,
            cloud_quiet_ms: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryConfig
// ---------------------------------------------------------------------------

/// History store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of entries retained (oldest evicted first).
    pub capacity: usize,
    /// Base URL of the remote per-user history service.
    pub remote_base_url: String,
    /// Per-request HTTP timeout in seconds for the remote backend.
    pub timeout_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            remote_base_url: "http://localhost:8080".into(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// LanguageDefaults
// ---------------------------------------------------------------------------

/// Language/country selection a fresh session starts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageDefaults {
    /// Source language code, or `"auto"` for detection.
    pub source_language: String,
    /// Source country code; empty when unspecified.
    pub source_country: String,
    /// Target language code.
    pub target_language: String,
    /// Target country code.
    pub target_country: String,
}

impl Default for LanguageDefaults {
    fn default() -> Self {
        Self {
            source_language: "auto".into(),
            source_country: String::new(),
            target_language: "en".into(),
            target_country: "US".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use live_translate::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Translation model endpoint.
    pub translation: TranslationApiConfig,
    /// Speech synthesis endpoint and PCM format.
    pub speech: SpeechApiConfig,
    /// Debounce windows.
    pub orchestrator: OrchestratorConfig,
    /// History store settings.
    pub history: HistoryConfig,
    /// Initial language selection.
    pub languages: LanguageDefaults,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.translation.base_url, loaded.translation.base_url);
        assert_eq!(original.translation.api_key, loaded.translation.api_key);
        assert_eq!(original.translation.model, loaded.translation.model);
        assert_eq!(original.speech.voice, loaded.speech.voice);
        assert_eq!(original.speech.sample_rate, loaded.speech.sample_rate);
        assert_eq!(
            original.orchestrator.cloud_quiet_ms,
            loaded.orchestrator.cloud_quiet_ms
        );
        assert_eq!(original.history.capacity, loaded.history.capacity);
        assert_eq!(
            original.languages.target_language,
            loaded.languages.target_language
        );
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.history.capacity, 50);
        assert_eq!(config.languages.source_language, "auto");
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.speech.sample_rate, 24_000);
        assert_eq!(cfg.speech.channels, 1);
        assert_eq!(cfg.orchestrator.local_quiet_ms, 200);
        assert_eq!(cfg.orchestrator.cloud_quiet_ms, 500);
        assert_eq!(cfg.history.capacity, 50);
        assert!(cfg.translation.api_key.is_none());
        assert!(cfg.languages.source_country.is_empty());
    }

    #[test]
    fn quiet_period_follows_mode() {
        let cfg = OrchestratorConfig::default();
        assert_eq!(
            cfg.quiet_period(DeploymentMode::Local),
            Duration::from_millis(200)
        );
        assert_eq!(
            cfg.quiet_period(DeploymentMode::Cloud),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.translation.api_key = Some("sk-test".into());
        cfg.translation.model = "gpt-4.1".into();
        cfg.speech.voice = "verse".into();
        cfg.orchestrator.local_quiet_ms = 150;
        cfg.history.remote_base_url = "https://history.example.com".into();
        cfg.languages.target_language = "ja".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.translation.api_key, Some("sk-test".into()));
        assert_eq!(loaded.translation.model, "gpt-4.1");
        assert_eq!(loaded.speech.voice, "verse");
        assert_eq!(loaded.orchestrator.local_quiet_ms, 150);
        assert_eq!(loaded.history.remote_base_url, "https://history.example.com");
        assert_eq!(loaded.languages.target_language, "ja");
    }
}
