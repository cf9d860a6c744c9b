//! Bounded store of past exchanges with embeddings

use crate::config::MemoryConfig;
use crate::error::Result;
use crate::memory::{rank_by_similarity, ConversationMemory, ScoredMemory};
use crate::providers::EmbeddingModel;
use crate::storage::{Storage, Table};
use chrono::Utc;
use std::sync::Arc;
use ulid::Ulid;

/// Conversation memory backed by remote embeddings
///
/// Every exchange is embedded on the user's side of the turn. The
/// collection holds at most `capacity` entries; inserting past the limit
/// evicts the oldest.
pub struct VectorStore {
    storage: Storage,
    embeddings: Arc<dyn EmbeddingModel>,
    capacity: usize,
    dimension: usize,
}

impl VectorStore {
    /// Create a vector store over a storage handle
    pub fn new(storage: Storage, embeddings: Arc<dyn EmbeddingModel>, config: &MemoryConfig) -> Self {
        Self {
            storage,
            embeddings,
            capacity: config.capacity,
            dimension: config.embedding_dimension,
        }
    }

    /// Embed a text, returning `None` on any failure
    ///
    /// Failures, empty vectors and vectors of the wrong dimensionality are all
    /// logged and reported as `None`.
    async fn try_embed(&self, text: &str) -> Option<Vec<f32>> {
        match self.embeddings.embed(text).await {
            Ok(v) if v.is_empty() => {
                tracing::warn!("Embedding model returned an empty vector");
                None
            }
            Ok(v) if v.len() != self.dimension => {
                tracing::warn!(
                    expected = self.dimension,
                    actual = v.len(),
                    "Embedding has unexpected dimensionality"
                );
                None
            }
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Embedding failed: {:#}", e);
                None
            }
        }
    }

    /// Record an exchange
    ///
    /// The entry is stored even when no embedding could be computed; such
    /// entries never take part in retrieval.
    ///
    /// # Errors
    ///
    /// Returns error only if persisting the collection fails
    pub async fn add(&self, user_message: &str, bot_response: &str) -> Result<ConversationMemory> {
        let embedding = self.try_embed(user_message).await;

        let memory = ConversationMemory {
            id: Ulid::new().to_string(),
            user_message: user_message.to_string(),
            bot_response: bot_response.to_string(),
            timestamp: Utc::now(),
            embedding,
        };

        let capacity = self.capacity;
        let stored = memory.clone();
        let evicted = self
            .storage
            .update(Table::ConversationMemory, move |memories: &mut Vec<ConversationMemory>| {
                memories.push(stored);
                let overflow = memories.len().saturating_sub(capacity);
                memories.drain(..overflow);
                overflow
            })?;

        if evicted > 0 {
            tracing::debug!(evicted, "Evicted oldest memories");
        }
        tracing::debug!(
            id = %memory.id,
            embedded = memory.embedding.is_some(),
            "Stored conversation memory"
        );

        Ok(memory)
    }

    /// Find the `k` stored exchanges most similar to `text`
    ///
    /// Returns an empty result when nothing is stored or the query cannot be
    /// embedded.
    pub async fn query(&self, text: &str, k: usize) -> Vec<ScoredMemory> {
        if k == 0 {
            return Vec::new();
        }

        let memories = self.list();
        if memories.iter().all(|m| !m.has_embedding()) {
            return Vec::new();
        }

        let Some(query) = self.try_embed(text).await else {
            return Vec::new();
        };

        rank_by_similarity(&query, memories, |m| m.embedding.as_deref(), k)
            .into_iter()
            .map(|(memory, score)| ScoredMemory { memory, score })
            .collect()
    }

    /// All stored exchanges, oldest first
    pub fn list(&self) -> Vec<ConversationMemory> {
        self.storage.load(Table::ConversationMemory)
    }

    /// Number of stored exchanges
    pub fn len(&self) -> usize {
        self.list().len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete every stored exchange
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be cleared
    pub fn clear(&self) -> Result<()> {
        self.storage.clear(Table::ConversationMemory)
    }
}
