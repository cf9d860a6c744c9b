//! Provider module for Parley
//!
//! This module contains the remote model abstractions and their
//! implementations for Gemini (text) and Hugging Face (embeddings, images).

pub mod base;
pub mod gemini;
pub mod huggingface;

pub use base::{
    EmbeddingModel, GeneratedImage, GenerationRequest, ImageModel, ImageRequest, InlinePart,
    LanguageModel,
};
pub use gemini::GeminiProvider;
pub use huggingface::HuggingFaceProvider;

use crate::config::ProvidersConfig;
use crate::error::Result;
use std::sync::Arc;

/// The set of remote models a router needs
#[derive(Clone)]
pub struct ProviderSet {
    /// Text generation, file analysis and reminder parsing
    pub language: Arc<dyn LanguageModel>,
    /// Feature extraction for conversation memory
    pub embeddings: Arc<dyn EmbeddingModel>,
    /// Text-to-image generation
    pub images: Arc<dyn ImageModel>,
}

/// Create the provider set described by configuration
///
/// A single Hugging Face client serves both embeddings and images.
///
/// # Errors
///
/// Returns error if an HTTP client cannot be initialized
///
/// # Examples
///
/// ```
/// use parley::config::ProvidersConfig;
/// use parley::providers::create_providers;
///
/// let providers = create_providers(&ProvidersConfig::default()).unwrap();
/// assert_eq!(providers.language.model_name(), "gemini-2.0-flash-exp");
/// ```
pub fn create_providers(config: &ProvidersConfig) -> Result<ProviderSet> {
    let language = Arc::new(GeminiProvider::new(config.gemini.clone())?);
    let huggingface = Arc::new(HuggingFaceProvider::new(config.huggingface.clone())?);

    Ok(ProviderSet {
        language,
        embeddings: huggingface.clone(),
        images: huggingface,
    })
}
