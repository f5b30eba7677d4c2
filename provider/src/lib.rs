//! Generative insight provider with local fallback.
//!
//! # Architecture
//!
//! One gaze, one request: [`GeminiOracle`] issues a single non-streaming
//! `generateContent` call to the Gemini API and parses the strict-JSON body
//! the model is instructed to return. Every failure path - missing
//! credential, network error, non-2xx status, malformed or empty response -
//! collapses into a uniformly random entry from the [`fallback`] archive.
//! The public operation never errors and never retries; the experience must
//! degrade silently rather than surface a failure to the user.
//!
//! # Testing
//!
//! The API base URL is overridable via [`GeminiOracle::with_base_url`],
//! which is the seam the wiremock integration tests drive.

use anyhow::Result;
use serde_json::{Value, json};
use unseen_types::{ApiKey, Insight};

pub mod fallback;

/// Canonical Gemini API base URL.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when no override is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Elevated sampling temperature: variety over strict factuality.
const TEMPERATURE: f64 = 1.3;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 60;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

const SYSTEM_INSTRUCTION: &str =
    "You are a dark oracle. You deal in secrets, forbidden knowledge, and the unsettling truth.";

const PROMPT: &str = r#"Generate a single JSON object containing a cryptic word or short phrase (max 3 words) related to:
1. Obscure conspiracy theories.
2. The occult and esoteric knowledge.
3. Paranormal phenomena.
4. Mysticism and ancient secrets.

The "phrase" should be out of context and mysterious.
The "explanation" should be a chilling or mind-bending revelation of what that phrase implies (max 30 words).
The "theme" should be one of: 'occult', 'conspiracy', 'paranormal', 'mysticism'.
The "sourceUrl" should be a valid, specific URL (Wikipedia, Britannica, or a reputable archive) to learn more about this topic.

Example output:
{
  "phrase": "ROKO'S BASILISK",
  "explanation": "A thought experiment stating that an all-powerful future AI may retroactively punish those who did not help bring it into existence.",
  "theme": "conspiracy",
  "sourceUrl": "https://en.wikipedia.org/wiki/Roko%27s_basilisk"
}"#;

/// Source of insights. The seam between the state machine and whatever
/// produces content; always resolves, never errors to the caller.
pub trait InsightSource {
    fn fetch_insight(&self) -> impl Future<Output = Insight> + Send;
}

/// Gemini-backed insight provider.
///
/// Cheap to clone: the underlying HTTP client is reference-counted, so a
/// clone can be moved into a spawned task while the original stays with
/// the state machine.
#[derive(Debug, Clone)]
pub struct GeminiOracle {
    client: reqwest::Client,
    api_key: Option<ApiKey>,
    model: String,
    base_url: String,
}

impl GeminiOracle {
    /// Build a provider. `None` disables the remote call entirely: every
    /// fetch resolves to a fallback without touching the network.
    #[must_use]
    pub fn new(api_key: Option<ApiKey>) -> Self {
        Self {
            client: http_client(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL. Test seam.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// One request, one chance; any failure consults the local archive.
    async fn fetch(&self) -> Insight {
        let Some(api_key) = &self.api_key else {
            tracing::warn!("No API key configured; drawing from the local archive");
            return fallback::random_fallback();
        };

        match self.request_insight(api_key).await {
            Ok(insight) => insight,
            Err(err) => {
                tracing::warn!(%err, "Oracle request failed; drawing from the local archive");
                fallback::random_fallback()
            }
        }
    }

    async fn request_insight(&self, api_key: &ApiKey) -> Result<Insight> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&build_request_body())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = read_capped_error_body(response).await;
            anyhow::bail!("API error {status}: {error_text}");
        }

        let data: Value = response.json().await?;
        let text = extract_candidate_text(&data)?;
        parse_insight(&text)
    }
}

impl InsightSource for GeminiOracle {
    fn fetch_insight(&self) -> impl Future<Output = Insight> + Send {
        self.fetch()
    }
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build HTTP client with timeouts: {e}");
            reqwest::Client::new()
        })
}

/// Build the request body.
///
/// Note: the Gemini API mixes casing - `system_instruction` is snake_case
/// while `generationConfig` and its fields are camelCase.
fn build_request_body() -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": PROMPT }]
        }],
        "system_instruction": {
            "parts": [{ "text": SYSTEM_INSTRUCTION }]
        },
        "generationConfig": {
            "temperature": TEMPERATURE,
            "responseMimeType": "application/json"
        }
    })
}

/// Pull the text of the first candidate out of a `generateContent` response,
/// concatenating multi-part answers.
fn extract_candidate_text(data: &Value) -> Result<String> {
    let parts = data["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Missing candidates in response"))?;

    let mut text = String::new();
    for part in parts {
        if let Some(chunk) = part["text"].as_str() {
            text.push_str(chunk);
        }
    }

    let text = text.trim().to_string();
    if text.is_empty() {
        anyhow::bail!("Empty response from the oracle");
    }
    Ok(text)
}

/// Parse the model's JSON payload into an [`Insight`], tolerating a code
/// fence around the body, and reject shapes that violate the contract.
fn parse_insight(text: &str) -> Result<Insight> {
    let body = strip_code_fence(text);
    let insight: Insight = serde_json::from_str(body)?;

    if insight.phrase.trim().is_empty() {
        anyhow::bail!("Oracle returned an empty phrase");
    }

    let source = url::Url::parse(&insight.source_url)
        .map_err(|e| anyhow::anyhow!("Invalid sourceUrl {:?}: {e}", insight.source_url))?;
    if !matches!(source.scheme(), "http" | "https") {
        anyhow::bail!("sourceUrl must be http(s), got {:?}", insight.source_url);
    }

    Ok(insight)
}

/// Models occasionally wrap JSON output in ``` fences despite the response
/// MIME type; strip one balanced fence if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

async fn read_capped_error_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(mut body) => {
            if body.len() > MAX_ERROR_BODY_BYTES {
                body.truncate(MAX_ERROR_BODY_BYTES);
                body.push_str("...(truncated)");
            }
            body
        }
        Err(e) => format!("<unreadable body: {e}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::{build_request_body, extract_candidate_text, parse_insight, strip_code_fence};
    use serde_json::json;
    use unseen_types::Theme;

    #[test]
    fn request_body_shape() {
        let body = build_request_body();
        assert!(body["contents"][0]["parts"][0]["text"].is_string());
        assert!(body["system_instruction"]["parts"][0]["text"].is_string());
        assert!(
            (body["generationConfig"]["temperature"].as_f64().unwrap() - 1.3).abs() < f64::EPSILON
        );
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn extracts_multi_part_text() {
        let data = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] }
            }]
        });
        assert_eq!(extract_candidate_text(&data).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn empty_candidates_is_error() {
        assert!(extract_candidate_text(&json!({ "candidates": [] })).is_err());
        assert!(extract_candidate_text(&json!({})).is_err());
    }

    #[test]
    fn whitespace_only_text_is_error() {
        let data = json!({
            "candidates": [{ "content": { "parts": [{ "text": "   \n" }] } }]
        });
        assert!(extract_candidate_text(&data).is_err());
    }

    #[test]
    fn parses_valid_insight() {
        let text = r#"{
            "phrase": "HOLLOW MOON",
            "explanation": "The moon rings like a bell when struck. Some conclude it is not solid.",
            "theme": "conspiracy",
            "sourceUrl": "https://en.wikipedia.org/wiki/Hollow_Moon"
        }"#;
        let insight = parse_insight(text).unwrap();
        assert_eq!(insight.phrase, "HOLLOW MOON");
        assert_eq!(insight.theme, Theme::Conspiracy);
    }

    #[test]
    fn parses_fenced_insight() {
        let text = "```json\n{\"phrase\":\"VRIL\",\"explanation\":\"A hidden energy.\",\"theme\":\"occult\",\"sourceUrl\":\"https://en.wikipedia.org/wiki/Vril\"}\n```";
        let insight = parse_insight(text).unwrap();
        assert_eq!(insight.phrase, "VRIL");
    }

    #[test]
    fn strip_code_fence_passthrough() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
    }

    #[test]
    fn rejects_bad_payloads() {
        // Not JSON at all.
        assert!(parse_insight("the spirits are quiet today").is_err());
        // Unknown theme.
        assert!(
            parse_insight(
                r#"{"phrase":"X","explanation":"y","theme":"astrology","sourceUrl":"https://a.example/b"}"#
            )
            .is_err()
        );
        // Relative source URL.
        assert!(
            parse_insight(
                r#"{"phrase":"X","explanation":"y","theme":"occult","sourceUrl":"/wiki/X"}"#
            )
            .is_err()
        );
        // Blank phrase.
        assert!(
            parse_insight(
                r#"{"phrase":" ","explanation":"y","theme":"occult","sourceUrl":"https://a.example/b"}"#
            )
            .is_err()
        );
    }
}

#[cfg(test)]
mod integration_tests {
    use super::{DEFAULT_MODEL, GeminiOracle, InsightSource, fallback};
    use serde_json::json;
    use unseen_types::{ApiKey, Theme};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn oracle_against(server: &MockServer) -> GeminiOracle {
        GeminiOracle::new(ApiKey::new("AIza-test")).with_base_url(server.uri())
    }

    fn generate_content_path() -> String {
        format!("/models/{DEFAULT_MODEL}:generateContent")
    }

    /// Wrap an insight JSON string the way `generateContent` returns it.
    fn gemini_body(inner: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": inner }], "role": "model" },
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn parses_successful_response() {
        let server = MockServer::start().await;

        let inner = json!({
            "phrase": "BLACK KNIGHT",
            "explanation": "An object in polar orbit said to be thirteen thousand years old.",
            "theme": "conspiracy",
            "sourceUrl": "https://en.wikipedia.org/wiki/Black_Knight_satellite_conspiracy_theory"
        })
        .to_string();

        Mock::given(method("POST"))
            .and(path(generate_content_path()))
            .and(header("x-goog-api-key", "AIza-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(&inner)))
            .expect(1)
            .mount(&server)
            .await;

        let insight = oracle_against(&server).fetch_insight().await;
        assert_eq!(insight.phrase, "BLACK KNIGHT");
        assert_eq!(insight.theme, Theme::Conspiracy);
    }

    #[tokio::test]
    async fn missing_credential_skips_the_network() {
        let server = MockServer::start().await;

        // Zero requests may reach the server on this path.
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let oracle = GeminiOracle::new(None).with_base_url(server.uri());
        let insight = oracle.fetch_insight().await;
        assert!(fallback::entries().contains(&insight));
    }

    #[tokio::test]
    async fn server_error_falls_back() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(generate_content_path()))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&server)
            .await;

        let insight = oracle_against(&server).fetch_insight().await;
        assert!(fallback::entries().contains(&insight));
    }

    #[tokio::test]
    async fn malformed_payload_falls_back() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(generate_content_path()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(gemini_body("not json at all")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let insight = oracle_against(&server).fetch_insight().await;
        assert!(fallback::entries().contains(&insight));
    }

    #[tokio::test]
    async fn empty_candidates_fall_back() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(generate_content_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let insight = oracle_against(&server).fetch_insight().await;
        assert!(fallback::entries().contains(&insight));
    }

    #[tokio::test]
    async fn fallback_insights_honor_the_contract() {
        // The scenario the provider guarantees: degraded responses are
        // indistinguishable in shape from live ones.
        let oracle = GeminiOracle::new(None);
        let insight = oracle.fetch_insight().await;
        assert!(!insight.source_url.is_empty());
        assert!(insight.phrase.split_whitespace().count() <= 3);
        assert!(Theme::all().contains(&insight.theme));
    }
}
