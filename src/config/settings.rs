//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]` so a partial `settings.toml` only
//! overrides what it names.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variable consulted when `transcription.api_key` is unset.
pub const TRANSCRIPTION_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable consulted when `router.api_key` is unset.
pub const ROUTER_KEY_ENV: &str = "HF_TOKEN";

/// Returns the configured key, or the environment fallback, ignoring blanks.
fn resolve_key(configured: Option<&str>, env_var: &str) -> Option<String> {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok())
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

// ---------------------------------------------------------------------------
// TranscriptionConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-to-text web service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Base URL of an OpenAI-compatible audio API.
    pub base_url: String,
    /// Bearer token.  Falls back to `$OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Model identifier (e.g. `"whisper-1"`).
    pub model: String,
    /// Spoken languages as ISO-639-1 codes.  A hint is only sent to the
    /// service when exactly one language is listed.
    pub languages: Vec<String>,
}

impl TranscriptionConfig {
    /// Effective API key after the environment fallback.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), TRANSCRIPTION_KEY_ENV)
    }

    /// Language hint for the service, if exactly one language is selected.
    pub fn language_hint(&self) -> Option<&str> {
        match self.languages.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "whisper-1".into(),
            languages: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// RouterConfig
// ---------------------------------------------------------------------------

/// Settings for the command-routing language model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Base URL of an OpenAI-compatible chat-completions API.
    pub base_url: String,
    /// Bearer token.  Falls back to `$HF_TOKEN`.
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// Upper bound on the completion length.
    pub max_tokens: u32,
}

impl RouterConfig {
    /// Effective API key after the environment fallback.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), ROUTER_KEY_ENV)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.huggingface.co".into(),
            api_key: None,
            model: "Qwen/Qwen3-235B-A22B-Instruct-2507:cerebras".into(),
            max_tokens: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for audio capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Recordings shorter than this are discarded without any network call.
    pub min_recording_secs: f32,
    /// Number of amplitude bars kept for the live level display.
    pub level_bars: usize,
    /// Write every accepted recording to the `recordings/` data directory.
    pub keep_recordings: bool,
}

/// Minimum recording length used when the configured one is unusable.
pub const DEFAULT_MIN_RECORDING_SECS: f32 = 0.4;

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            min_recording_secs: DEFAULT_MIN_RECORDING_SECS,
            level_bars: 30,
            keep_recordings: false,
        }
    }
}

impl AudioConfig {
    /// `min_recording_secs` as a [`Duration`].  Negative, non-finite or
    /// out-of-range values fall back to [`DEFAULT_MIN_RECORDING_SECS`].
    pub fn min_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.min_recording_secs).unwrap_or_else(|e| {
            log::warn!(
                "config: invalid min_recording_secs {} ({e}); using {DEFAULT_MIN_RECORDING_SECS}",
                self.min_recording_secs
            );
            Duration::from_secs_f32(DEFAULT_MIN_RECORDING_SECS)
        })
    }
}

// ---------------------------------------------------------------------------
// HotkeyConfig
// ---------------------------------------------------------------------------

/// Global hotkey bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Push-to-talk chord (e.g. `"F9"`, `"Shift+Space"`).
    pub push_to_talk_key: String,
    /// Optional chord that pastes the last transcript again.
    pub paste_last_key: Option<String>,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            push_to_talk_key: "F9".into(),
            paste_last_key: None,
        }
    }
}

// ---------------------------------------------------------------------------
// InjectConfig
// ---------------------------------------------------------------------------

/// Timing of the clipboard-paste text delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectConfig {
    /// Milliseconds between setting the clipboard and sending the paste chord.
    pub paste_settle_ms: u64,
    /// Milliseconds between the paste chord and restoring the old clipboard.
    pub restore_delay_ms: u64,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            paste_settle_ms: 50,
            restore_delay_ms: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// ActionsConfig
// ---------------------------------------------------------------------------

/// Settings used by the tool executor and the routing context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    /// Prefix the percent-encoded research topic is appended to.
    pub search_url: String,
    /// Browser name shown to the router.  `None` means detect it.
    pub default_browser: Option<String>,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.google.com/search?q=".into(),
            default_browser: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_command::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transcription: TranscriptionConfig,
    pub router: RouterConfig,
    pub audio: AudioConfig,
    pub hotkey: HotkeyConfig,
    pub inject: InjectConfig,
    pub actions: ActionsConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
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

    /// Save to an explicit path (useful for tests).
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
