//! Test utilities for Parley
//!
//! This module provides temporary file helpers and in-process fakes for the
//! remote model traits and the reminder notifier.

use crate::error::{ParleyError, Result};
use crate::providers::{
    EmbeddingModel, GeneratedImage, GenerationRequest, ImageModel, ImageRequest, LanguageModel,
};
use crate::reminders::{Notifier, Reminder};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Panics
///
/// Panics if the directory cannot be created
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Deterministic embedding model keyed on a handful of words
///
/// Dimensions: count of "sea", count of "ocean", count of marine words,
/// count of greetings, and a constant bias so no vector is all zeros.
pub struct KeywordEmbeddings;

impl KeywordEmbeddings {
    /// Length of every produced vector
    pub const DIMENSION: usize = 5;

    /// Embed synchronously
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0, 0.0, 0.0, 0.0, 0.1];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            match token {
                "sea" => v[0] += 1.0,
                "ocean" => v[1] += 1.0,
                _ => {}
            }
            if matches!(
                token,
                "sea" | "ocean" | "waves" | "breeze" | "shells" | "water"
            ) {
                v[2] += 1.0;
            }
            if matches!(token, "hi" | "hello") {
                v[3] += 1.0;
            }
        }
        v
    }
}

#[async_trait]
impl EmbeddingModel for KeywordEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }
}

/// Embedding model that always fails
pub struct FailingEmbeddings;

#[async_trait]
impl EmbeddingModel for FailingEmbeddings {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(ParleyError::Embedding("model is loading".to_string()).into())
    }
}

type Responder = dyn Fn(&GenerationRequest) -> Result<String> + Send + Sync;

/// Language model answering through a closure and recording every request
pub struct ScriptedLanguageModel {
    responder: Box<Responder>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedLanguageModel {
    /// Answer every request through `responder`
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same text
    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Fail every request
    pub fn failing() -> Self {
        Self::new(|_| Err(ParleyError::Provider("service unavailable".to_string()).into()))
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        (self.responder)(request)
    }

    fn model_name(&self) -> String {
        "scripted".to_string()
    }
}

/// Image model returning a fixed image, or failing when constructed empty
pub struct StaticImageModel {
    image: Option<GeneratedImage>,
    requests: Mutex<Vec<ImageRequest>>,
}

impl StaticImageModel {
    /// Always return a tiny JPEG-typed payload
    pub fn ok() -> Self {
        Self {
            image: Some(GeneratedImage {
                mime_type: "image/jpeg".to_string(),
                bytes: vec![0xff, 0xd8, 0xff, 0xe0],
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request
    pub fn failing() -> Self {
        Self {
            image: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ImageModel for StaticImageModel {
    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        self.image
            .clone()
            .ok_or_else(|| ParleyError::ImageGeneration("quota exceeded".to_string()).into())
    }
}

/// Notifier that records delivered reminders
#[derive(Default)]
pub struct RecordingNotifier {
    fail: bool,
    delivered: Mutex<Vec<Reminder>>,
}

impl RecordingNotifier {
    /// Notifier whose deliveries always fail
    pub fn failing() -> Self {
        Self {
            fail: true,
            delivered: Mutex::new(Vec::new()),
        }
    }

    /// Reminders delivered so far
    pub fn delivered(&self) -> Vec<Reminder> {
        self.delivered.lock().expect("delivered lock").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, reminder: &Reminder) -> Result<()> {
        if self.fail {
            return Err(ParleyError::Notification("no route to user".to_string()).into());
        }
        self.delivered
            .lock()
            .expect("delivered lock")
            .push(reminder.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::cosine_similarity;

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_keyword_embeddings_shape() {
        let v = KeywordEmbeddings::vector("Hello, sea and ocean!");
        assert_eq!(v.len(), KeywordEmbeddings::DIMENSION);
        assert_eq!(v, vec![1.0, 1.0, 2.0, 1.0, 0.1]);
    }

    #[test]
    fn test_keyword_embeddings_ordering() {
        let query = KeywordEmbeddings::vector("tell me about the sea");
        let sea = cosine_similarity(&query, &KeywordEmbeddings::vector("sea"));
        let ocean = cosine_similarity(&query, &KeywordEmbeddings::vector("ocean"));
        let hi = cosine_similarity(&query, &KeywordEmbeddings::vector("hi"));
        assert!(sea > ocean && ocean > hi);
    }

    #[tokio::test]
    async fn test_scripted_model_records_requests() {
        let model = ScriptedLanguageModel::replying("ok");
        let reply = model.generate(&GenerationRequest::text("hi")).await.unwrap();
        assert_eq!(reply, "ok");
        assert_eq!(model.requests()[0].prompt, "hi");
    }
}
