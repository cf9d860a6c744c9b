//! Reminders: data model, persistence, extraction and scheduling
//!
//! A reminder is created when the router detects reminder intent, then
//! driven through `pending -> sent` (or `pending -> failed` when the
//! notification cannot be delivered) by the [`ReminderScheduler`].

use crate::error::{ParleyError, Result};
use crate::storage::{Storage, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

pub mod datetime;
pub mod notifier;
pub mod parser;
pub mod scheduler;

pub use datetime::parse_when;
pub use notifier::{Notifier, TerminalNotifier};
pub use parser::ReminderExtractor;
pub use scheduler::{ReminderScheduler, TickReport};

/// Lifecycle state of a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    /// Waiting for its time to arrive
    Pending,
    /// Notification delivered
    Sent,
    /// Notification could not be delivered
    Failed,
}

impl std::fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Sent => write!(f, "sent"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A scheduled reminder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Unique identifier (ULID)
    pub id: String,
    /// What to remind about
    pub task: String,
    /// When the reminder is due
    pub datetime: DateTime<Utc>,
    /// Current lifecycle state
    pub status: ReminderStatus,
    /// Optional address to notify in addition to the local alert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_address: Option<String>,
}

impl Reminder {
    /// Whether the reminder is pending and its time has arrived
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ReminderStatus::Pending && self.datetime <= now
    }
}

/// Task and time extracted from an utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    /// What to remind about
    pub task: String,
    /// Resolved due time
    pub datetime: DateTime<Utc>,
}

/// Persistent collection of reminders
#[derive(Clone)]
pub struct ReminderBook {
    storage: Storage,
}

impl ReminderBook {
    /// Create a reminder book over a storage handle
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create and persist a pending reminder
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::ReminderParse` for an empty task, or a storage
    /// error if persisting fails
    pub fn schedule(
        &self,
        task: &str,
        datetime: DateTime<Utc>,
        notify_address: Option<String>,
    ) -> Result<Reminder> {
        let task = task.trim();
        if task.is_empty() {
            return Err(ParleyError::ReminderParse("Reminder task is empty".to_string()).into());
        }

        let reminder = Reminder {
            id: Ulid::new().to_string(),
            task: task.to_string(),
            datetime,
            status: ReminderStatus::Pending,
            notify_address,
        };

        let stored = reminder.clone();
        self.storage
            .update(Table::Reminders, move |reminders: &mut Vec<Reminder>| {
                reminders.push(stored)
            })?;

        tracing::info!(id = %reminder.id, due = %reminder.datetime, "Scheduled reminder");
        Ok(reminder)
    }

    /// All reminders in creation order
    pub fn list(&self) -> Vec<Reminder> {
        self.storage.load(Table::Reminders)
    }

    /// Reminders still waiting to fire
    pub fn pending(&self) -> Vec<Reminder> {
        self.list()
            .into_iter()
            .filter(|r| r.status == ReminderStatus::Pending)
            .collect()
    }

    /// Pending reminders whose time has arrived
    pub fn due(&self, now: DateTime<Utc>) -> Vec<Reminder> {
        self.list().into_iter().filter(|r| r.is_due(now)).collect()
    }

    /// Transition a reminder's status
    ///
    /// Returns `false` when the reminder no longer exists.
    ///
    /// # Errors
    ///
    /// Returns error if persisting fails
    pub fn set_status(&self, id: &str, status: ReminderStatus) -> Result<bool> {
        self.storage
            .update(Table::Reminders, |reminders: &mut Vec<Reminder>| {
                match reminders.iter_mut().find(|r| r.id == id) {
                    Some(reminder) => {
                        reminder.status = status;
                        true
                    }
                    None => false,
                }
            })
    }

    /// Delete a single reminder
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::ReminderNotFound` if no reminder has this id
    pub fn delete(&self, id: &str) -> Result<Reminder> {
        let removed = self
            .storage
            .update(Table::Reminders, |reminders: &mut Vec<Reminder>| {
                let index = reminders.iter().position(|r| r.id == id)?;
                Some(reminders.remove(index))
            })?;

        match removed {
            Some(reminder) => {
                tracing::info!(id = %id, "Deleted reminder");
                Ok(reminder)
            }
            None => Err(ParleyError::ReminderNotFound(id.to_string()).into()),
        }
    }

    /// Delete every reminder
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be cleared
    pub fn clear(&self) -> Result<()> {
        self.storage.clear(Table::Reminders)
    }
}
