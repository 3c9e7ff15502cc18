//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings, dictionary, style examples):
//!   Windows: %APPDATA%\voice-command\
//!   macOS:   ~/Library/Application Support/voice-command/
//!   Linux:   ~/.config/voice-command/
//!
//! Data dir (kept recordings):
//!   Windows: %LOCALAPPDATA%\voice-command\
//!   macOS:   ~/Library/Application Support/voice-command/
//!   Linux:   ~/.local/share/voice-command/

use std::path::{Path, PathBuf};

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`, `dictionary.json` and `style.txt`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Full path to `dictionary.json`.
    pub dictionary_file: PathBuf,
    /// Full path to `style.txt`.
    pub style_file: PathBuf,
    /// Directory where accepted recordings are kept when enabled.
    pub recordings_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voice-command";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self::with_dirs(&config_dir, &data_dir)
    }

    /// Lay the files out under explicit directories (useful for tests).
    pub fn with_dirs(config_dir: &Path, data_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            settings_file: config_dir.join("settings.toml"),
            dictionary_file: config_dir.join("dictionary.json"),
            style_file: config_dir.join("style.txt"),
            recordings_dir: data_dir.join("recordings"),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
