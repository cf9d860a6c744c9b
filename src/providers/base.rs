//! Base provider traits and common types for Parley
//!
//! Three remote capabilities are abstracted here: text generation (with
//! optional inline multimodal parts), feature extraction, and text-to-image.
//! The router only ever talks to these traits, which keeps the HTTP clients
//! swappable and lets tests substitute scripted fakes.

use crate::error::Result;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Inline binary part sent alongside a prompt
///
/// # Examples
///
/// ```
/// use parley::providers::InlinePart;
///
/// let part = InlinePart::from_bytes("image/png", &[0x89, 0x50, 0x4e, 0x47]);
/// assert_eq!(part.mime_type, "image/png");
/// assert_eq!(part.data, "iVBORw==");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlinePart {
    /// Declared media type (e.g. `image/png`)
    pub mime_type: String,
    /// Base64-encoded payload
    pub data: String,
}

impl InlinePart {
    /// Encode raw bytes into an inline part
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// Request for a text-generation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Prompt text
    pub prompt: String,
    /// Optional multimodal parts
    pub parts: Vec<InlinePart>,
}

impl GenerationRequest {
    /// Create a text-only request
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::providers::GenerationRequest;
    ///
    /// let request = GenerationRequest::text("Hello");
    /// assert_eq!(request.prompt, "Hello");
    /// assert!(request.parts.is_empty());
    /// ```
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            parts: Vec::new(),
        }
    }

    /// Attach inline parts to the request
    pub fn with_parts(mut self, parts: Vec<InlinePart>) -> Self {
        self.parts = parts;
        self
    }
}

/// Request for a text-to-image call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRequest {
    /// Full prompt sent as the model input
    pub inputs: String,
    /// Terms the model should avoid
    pub negative_prompt: String,
    /// Number of denoising steps
    pub num_inference_steps: u32,
    /// Classifier-free guidance strength
    pub guidance_scale: f32,
}

/// Image returned by a text-to-image call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Media type reported by the provider
    pub mime_type: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    /// Render the image as a `data:` URL
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::providers::GeneratedImage;
    ///
    /// let image = GeneratedImage { mime_type: "image/jpeg".into(), bytes: vec![1, 2, 3] };
    /// assert_eq!(image.data_url(), "data:image/jpeg;base64,AQID");
    /// ```
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Remote language model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate free-form text for a request
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the response carries no text
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Name of the model serving requests
    fn model_name(&self) -> String;
}

/// Remote feature-extraction model
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embed a single text into a fixed-length vector
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the response is not a vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Remote text-to-image model
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Generate an image for a request
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or returns no image bytes
    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage>;
}
