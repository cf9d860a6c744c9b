//! Gemini language model provider
//!
//! Talks to the `generateContent` REST endpoint. Prompt text and inline
//! parts are sent as a single user turn; the text of every part of the first
//! candidate is concatenated into the reply.

use crate::config::GeminiConfig;
use crate::error::{ParleyError, Result};
use crate::providers::{GenerationRequest, LanguageModel};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini API provider
///
/// # Examples
///
/// ```no_run
/// use parley::config::GeminiConfig;
/// use parley::providers::{GeminiProvider, GenerationRequest, LanguageModel};
///
/// # async fn example() -> parley::error::Result<()> {
/// let provider = GeminiProvider::new(GeminiConfig::default())?;
/// let reply = provider.generate(&GenerationRequest::text("Hello!")).await?;
/// # Ok(())
/// # }
/// ```
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

/// Request body for `generateContent`
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// A content part: either text or inline data
#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

/// Response body from `generateContent`
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiProvider {
    /// Create a new Gemini provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ParleyError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Gemini provider: base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Convert a generation request into the wire format
    fn build_request(request: &GenerationRequest) -> GeminiRequest {
        let mut parts = vec![GeminiPart {
            text: Some(request.prompt.clone()),
            inline_data: None,
        }];
        parts.extend(request.parts.iter().map(|p| GeminiPart {
            text: None,
            inline_data: Some(GeminiInlineData {
                mime_type: p.mime_type.clone(),
                data: p.data.clone(),
            }),
        }));

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts,
            }],
        }
    }

    /// Extract the reply text from a response
    fn extract_text(response: GeminiResponse) -> Result<String> {
        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ParleyError::Provider("Gemini returned no text".to_string()).into());
        }
        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ParleyError::Provider("Missing Gemini API key".to_string()))?;

        let body = Self::build_request(request);
        tracing::debug!(
            "Sending Gemini request: {} chars, {} inline parts",
            request.prompt.len(),
            request.parts.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to reach Gemini: {}", e);
                ParleyError::Provider(format!("Failed to reach Gemini: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini returned error {}: {}", status, error_text);
            return Err(ParleyError::Provider(format!(
                "Gemini returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            ParleyError::Provider(format!("Failed to parse Gemini response: {}", e))
        })?;

        Self::extract_text(parsed)
    }

    fn model_name(&self) -> String {
        self.config.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::InlinePart;

    #[test]
    fn test_gemini_provider_creation() {
        assert!(GeminiProvider::new(GeminiConfig::default()).is_ok());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = GeminiProvider::new(GeminiConfig {
            api_base: "http://localhost:8080/".to_string(),
            model: "gemini-test".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            provider.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_build_request_with_inline_parts() {
        let request = GenerationRequest::text("what is this?")
            .with_parts(vec![InlinePart::from_bytes("image/png", b"png")]);
        let body = serde_json::to_value(GeminiProvider::build_request(&request)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "what is this?");
        assert_eq!(
            body["contents"][0]["parts"][1]["inline_data"]["mime_type"],
            "image/png"
        );
        assert!(body["contents"][0]["parts"][1].get("text").is_none());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"},{"text":" there"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(GeminiProvider::extract_text(response).unwrap(), "Hello there");
    }

    #[test]
    fn test_extract_text_without_candidates_fails() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(GeminiProvider::extract_text(response).is_err());
    }

    #[tokio::test]
    async fn test_generate_without_api_key_fails() {
        let provider = GeminiProvider::new(GeminiConfig::default()).unwrap();
        let err = provider
            .generate(&GenerationRequest::text("hi"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Missing Gemini API key"));
    }

    #[tokio::test]
    async fn test_generate_gives_up_after_timeout() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(std::time::Duration::from_secs(5))
                    .set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(GeminiConfig {
            api_key: Some("test-key".to_string()),
            api_base: server.uri(),
            timeout_seconds: 1,
            ..Default::default()
        })
        .unwrap();
        let err = provider
            .generate(&GenerationRequest::text("hi"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to reach Gemini"));
    }
}
