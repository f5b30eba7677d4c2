//! Configuration loading for Unseen.
//!
//! Reads an optional TOML file from `~/.unseen/config.toml`. Every section
//! is optional; a missing file means "all defaults". The credential can also
//! arrive via the `GEMINI_API_KEY` environment variable, which callers
//! consult before the config value.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level configuration.
///
/// ```toml
/// [app]
/// model = "gemini-2.5-flash"
///
/// [api_keys]
/// google = "AIza..."
///
/// [audio]
/// muted = false
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct UnseenConfig {
    pub app: Option<AppConfig>,
    pub api_keys: Option<ApiKeys>,
    pub audio: Option<AudioConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Generative model override. Defaults to the provider's pinned model.
    pub model: Option<String>,
}

#[derive(Default, Deserialize)]
pub struct ApiKeys {
    pub google: Option<String>,
}

// Manual Debug impl to prevent leaking API keys in logs.
impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let google = if self.google.is_some() {
            "[REDACTED]"
        } else {
            "None"
        };
        f.debug_struct("ApiKeys").field("google", &google).finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AudioConfig {
    /// Silence the engine entirely: no ambience, no cues. The core honors
    /// this flag but exposes no runtime toggle.
    #[serde(default)]
    pub muted: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl UnseenConfig {
    /// Load from the default location. Missing file (or an undeterminable
    /// home directory) is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        Self::load_from(path)
    }

    /// Load from an explicit path. Missing file is `Ok(None)`.
    pub fn load_from(path: PathBuf) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read { path, source: err });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse { path, source: err })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// The configured Google credential, if any.
    #[must_use]
    pub fn google_api_key(&self) -> Option<&str> {
        self.api_keys.as_ref()?.google.as_deref()
    }

    /// Model override, if any.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.app.as_ref()?.model.as_deref()
    }

    /// Whether audio is muted. Defaults to off.
    #[must_use]
    pub fn muted(&self) -> bool {
        self.audio.as_ref().is_some_and(|audio| audio.muted)
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".unseen").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, UnseenConfig};
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_full_config() {
        let (_dir, path) = write_config(
            r#"
            [app]
            model = "gemini-2.5-pro"

            [api_keys]
            google = "AIza-test"

            [audio]
            muted = true
            "#,
        );

        let config = UnseenConfig::load_from(path).unwrap().unwrap();
        assert_eq!(config.model(), Some("gemini-2.5-pro"));
        assert_eq!(config.google_api_key(), Some("AIza-test"));
        assert!(config.muted());
    }

    #[test]
    fn empty_file_yields_defaults() {
        let (_dir, path) = write_config("");
        let config = UnseenConfig::load_from(path).unwrap().unwrap();
        assert_eq!(config.model(), None);
        assert_eq!(config.google_api_key(), None);
        assert!(!config.muted());
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");
        assert!(UnseenConfig::load_from(path).unwrap().is_none());
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let (_dir, path) = write_config("[app\nmodel = ");
        let err = UnseenConfig::load_from(path.clone()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), &path);
    }

    #[test]
    fn api_keys_debug_is_redacted() {
        let (_dir, path) = write_config("[api_keys]\ngoogle = \"AIza-secret\"\n");
        let config = UnseenConfig::load_from(path).unwrap().unwrap();
        let debug = format!("{:?}", config.api_keys.unwrap());
        assert!(!debug.contains("AIza-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
