//! Conversation memory
//!
//! Past exchanges are kept with an embedding of the user's message so the
//! router can retrieve similar conversations as context for new prompts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod similarity;
pub mod vector_store;

pub use similarity::{cosine_similarity, rank_by_similarity};
pub use vector_store::VectorStore;

/// One remembered exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMemory {
    /// Unique identifier (ULID)
    pub id: String,
    /// What the user said
    pub user_message: String,
    /// What the assistant answered
    pub bot_response: String,
    /// When the exchange was recorded
    pub timestamp: DateTime<Utc>,
    /// Embedding of `user_message`, absent when embedding failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl ConversationMemory {
    /// Whether this entry can take part in similarity search
    pub fn has_embedding(&self) -> bool {
        self.embedding.as_ref().is_some_and(|e| !e.is_empty())
    }
}

/// A retrieved memory with its similarity score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMemory {
    /// The stored exchange
    pub memory: ConversationMemory,
    /// Cosine similarity to the query
    pub score: f32,
}
