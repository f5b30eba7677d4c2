//! Core domain types for Unseen.
//!
//! This crate contains pure domain types with no IO, no async, and minimal
//! dependencies. Everything here can be used from any layer of the
//! application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Theme
// ============================================================================

/// Category of forbidden knowledge an [`Insight`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Occult,
    Conspiracy,
    Paranormal,
    Mysticism,
}

impl Theme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Theme::Occult => "occult",
            Theme::Conspiracy => "conspiracy",
            Theme::Paranormal => "paranormal",
            Theme::Mysticism => "mysticism",
        }
    }

    /// All themes, in display order.
    #[must_use]
    pub const fn all() -> &'static [Theme] {
        &[
            Theme::Occult,
            Theme::Conspiracy,
            Theme::Paranormal,
            Theme::Mysticism,
        ]
    }

    /// Parse a theme from its lowercase wire name.
    pub fn parse(value: &str) -> Result<Self, ThemeParseError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "occult" => Ok(Theme::Occult),
            "conspiracy" => Ok(Theme::Conspiracy),
            "paranormal" => Ok(Theme::Paranormal),
            "mysticism" => Ok(Theme::Mysticism),
            _ => Err(ThemeParseError(value.to_string())),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown theme: {0:?}")]
pub struct ThemeParseError(String);

// ============================================================================
// Insight
// ============================================================================

/// The phrase/explanation/theme/link payload shown after a gaze.
///
/// Immutable once produced. The wire shape uses camelCase field names
/// (`sourceUrl`), matching what the generative service is asked to emit.
/// The phrase is short by contract: at most three words, both in the
/// request prompt and across the built-in fallback entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub phrase: String,
    pub explanation: String,
    pub theme: Theme,
    pub source_url: String,
}

// ============================================================================
// OraclePhase
// ============================================================================

/// UI phase of the oracle. Exactly one value is current at any time and
/// drives all derived visuals and audio cues.
///
/// `Error` exists in the type model but no implemented transition produces
/// it: the insight provider absorbs every failure into the fallback path.
/// It becomes reachable only if a future caller surfaces provider failure
/// directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OraclePhase {
    #[default]
    Idle,
    Gazing,
    Revealed,
    Error,
}

impl OraclePhase {
    #[must_use]
    pub const fn is_gazing(self) -> bool {
        matches!(self, OraclePhase::Gazing)
    }

    #[must_use]
    pub const fn is_revealed(self) -> bool {
        matches!(self, OraclePhase::Revealed)
    }
}

// ============================================================================
// ApiKey
// ============================================================================

/// A generative-service credential.
///
/// Holds the secret without exposing it through `Debug` or `Display`;
/// call [`ApiKey::expose_secret`] at the single point of use (the request
/// header).
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a credential. Returns `None` for empty or whitespace-only input
    /// so "configured but blank" behaves like "not configured".
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

// Manual Debug impl to prevent leaking the key in logs.
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiKey, Insight, OraclePhase, Theme};

    #[test]
    fn theme_parse_aliases() {
        assert_eq!(Theme::parse("occult").unwrap(), Theme::Occult);
        assert_eq!(Theme::parse("Conspiracy").unwrap(), Theme::Conspiracy);
        assert_eq!(Theme::parse(" paranormal ").unwrap(), Theme::Paranormal);
        assert_eq!(Theme::parse("MYSTICISM").unwrap(), Theme::Mysticism);
        assert!(Theme::parse("astrology").is_err());
        assert!(Theme::parse("").is_err());
    }

    #[test]
    fn theme_all_covers_every_variant() {
        let all = Theme::all();
        assert_eq!(all.len(), 4);
        for theme in all {
            assert_eq!(Theme::parse(theme.as_str()).unwrap(), *theme);
        }
    }

    #[test]
    fn insight_deserializes_wire_shape() {
        let json = r#"{
            "phrase": "THE HUM",
            "explanation": "A low-frequency noise heard worldwide with no traceable source.",
            "theme": "paranormal",
            "sourceUrl": "https://en.wikipedia.org/wiki/The_Hum"
        }"#;
        let insight: Insight = serde_json::from_str(json).unwrap();
        assert_eq!(insight.phrase, "THE HUM");
        assert_eq!(insight.theme, Theme::Paranormal);
        assert_eq!(insight.source_url, "https://en.wikipedia.org/wiki/The_Hum");
    }

    #[test]
    fn insight_serializes_source_url_as_camel_case() {
        let insight = Insight {
            phrase: "EGREGORE".to_string(),
            explanation: "A psychic entity created by a collective group mind.".to_string(),
            theme: Theme::Occult,
            source_url: "https://en.wikipedia.org/wiki/Egregore".to_string(),
        };
        let value = serde_json::to_value(&insight).unwrap();
        assert!(value.get("sourceUrl").is_some());
        assert!(value.get("source_url").is_none());
    }

    #[test]
    fn phase_defaults_to_idle() {
        assert_eq!(OraclePhase::default(), OraclePhase::Idle);
        assert!(!OraclePhase::Idle.is_gazing());
        assert!(OraclePhase::Gazing.is_gazing());
        assert!(OraclePhase::Revealed.is_revealed());
    }

    #[test]
    fn api_key_rejects_blank_input() {
        assert!(ApiKey::new("").is_none());
        assert!(ApiKey::new("   ").is_none());
        let key = ApiKey::new("AIza-test").unwrap();
        assert_eq!(key.expose_secret(), "AIza-test");
    }

    #[test]
    fn api_key_debug_redacts_secret() {
        let key = ApiKey::new("AIza-super-secret").unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
