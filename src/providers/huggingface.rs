//! Hugging Face inference provider
//!
//! Serves both feature extraction (embeddings) and text-to-image through the
//! hosted inference API, where every model is addressed as
//! `POST {api_base}/models/{model}`.

use crate::config::HuggingFaceConfig;
use crate::error::{ParleyError, Result};
use crate::providers::{EmbeddingModel, GeneratedImage, ImageModel, ImageRequest};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Media type assumed when the provider does not declare one
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Hugging Face inference provider
pub struct HuggingFaceProvider {
    client: Client,
    config: HuggingFaceConfig,
}

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
}

/// Feature-extraction responses come back either flat or as a batch of one
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Flat(Vec<f32>),
    Batched(Vec<Vec<f32>>),
}

impl FeatureExtractionResponse {
    fn into_vector(self) -> Vec<f32> {
        match self {
            Self::Flat(v) => v,
            Self::Batched(rows) => rows.into_iter().next().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TextToImageRequest<'a> {
    inputs: &'a str,
    parameters: TextToImageParameters<'a>,
}

#[derive(Debug, Serialize)]
struct TextToImageParameters<'a> {
    negative_prompt: &'a str,
    num_inference_steps: u32,
    guidance_scale: f32,
}

impl HuggingFaceProvider {
    /// Create a new Hugging Face provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: HuggingFaceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ParleyError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Hugging Face provider: base={}, embedding={}, image={}",
            config.api_base,
            config.embedding_model,
            config.image_model
        );

        Ok(Self { client, config })
    }

    fn model_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}",
            self.config.api_base.trim_end_matches('/'),
            model
        )
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl EmbeddingModel for HuggingFaceProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.model_url(&self.config.embedding_model);
        tracing::debug!("Requesting embedding from {}", url);

        let response = self
            .authorized(self.client.post(&url))
            .json(&FeatureExtractionRequest { inputs: text })
            .send()
            .await
            .map_err(|e| ParleyError::Embedding(format!("Failed to reach inference API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Feature extraction returned {}: {}", status, error_text);
            return Err(ParleyError::Embedding(format!(
                "Feature extraction returned {}: {}",
                status, error_text
            ))
            .into());
        }

        let parsed: FeatureExtractionResponse = response.json().await.map_err(|e| {
            ParleyError::Embedding(format!("Unexpected feature extraction response: {}", e))
        })?;

        Ok(parsed.into_vector())
    }
}

#[async_trait]
impl ImageModel for HuggingFaceProvider {
    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        let url = self.model_url(&self.config.image_model);
        tracing::debug!("Requesting image from {}", url);

        let body = TextToImageRequest {
            inputs: &request.inputs,
            parameters: TextToImageParameters {
                negative_prompt: &request.negative_prompt,
                num_inference_steps: request.num_inference_steps,
                guidance_scale: request.guidance_scale,
            },
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ParleyError::ImageGeneration(format!("Failed to reach inference API: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Text-to-image returned {}: {}", status, error_text);
            return Err(ParleyError::ImageGeneration(format!(
                "Text-to-image returned {}: {}",
                status, error_text
            ))
            .into());
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ParleyError::ImageGeneration(format!("Failed to read image: {}", e)))?;

        if bytes.is_empty() {
            return Err(
                ParleyError::ImageGeneration("Inference API returned no image".to_string()).into(),
            );
        }

        Ok(GeneratedImage {
            mime_type,
            bytes: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_url() {
        let provider = HuggingFaceProvider::new(HuggingFaceConfig {
            api_base: "http://localhost:9000/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            provider.model_url("sentence-transformers/all-MiniLM-L6-v2"),
            "http://localhost:9000/models/sentence-transformers/all-MiniLM-L6-v2"
        );
    }

    #[test]
    fn test_feature_extraction_flat() {
        let parsed: FeatureExtractionResponse = serde_json::from_str("[0.1, 0.2, 0.3]").unwrap();
        assert_eq!(parsed.into_vector(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_feature_extraction_batched_takes_first_row() {
        let parsed: FeatureExtractionResponse =
            serde_json::from_str("[[0.5, 0.5], [1.0, 0.0]]").unwrap();
        assert_eq!(parsed.into_vector(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_feature_extraction_empty_batch() {
        let parsed: FeatureExtractionResponse = serde_json::from_str("[[]]").unwrap();
        assert!(parsed.into_vector().is_empty());
    }

    #[test]
    fn test_text_to_image_body_shape() {
        let body = TextToImageRequest {
            inputs: "a fox",
            parameters: TextToImageParameters {
                negative_prompt: "blurry",
                num_inference_steps: 30,
                guidance_scale: 7.5,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["inputs"], "a fox");
        assert_eq!(json["parameters"]["negative_prompt"], "blurry");
        assert_eq!(json["parameters"]["num_inference_steps"], 30);
    }
}
