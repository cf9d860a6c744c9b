use serde::{Deserialize, Serialize};

/// Logical tables kept in the embedded store
///
/// Each table is persisted as a single JSON array in one database row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    /// Scheduled reminders
    Reminders,
    /// Past exchanges with their embeddings
    ConversationMemory,
}

impl Table {
    /// Row name under which the table blob is stored
    pub fn key(&self) -> &'static str {
        match self {
            Self::Reminders => "reminders",
            Self::ConversationMemory => "conversation_memory",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
