//! Error types for Parley
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Parley operations
///
/// Remote-call and storage failures are represented here so that the
/// response router can decide, at a single boundary, how each failure
/// degrades into a user-visible message.
#[derive(Error, Debug)]
pub enum ParleyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Language model provider errors (API calls, empty candidates, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Feature-extraction (embedding) errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Text-to-image errors
    #[error("Image generation error: {0}")]
    ImageGeneration(String),

    /// Attachment loading errors (read errors, size, unsupported type)
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// Reminder extraction errors (malformed model output, invalid datetime)
    #[error("Reminder parse error: {0}")]
    ReminderParse(String),

    /// Reminder was not found in the reminder log
    #[error("Reminder not found: {0}")]
    ReminderNotFound(String),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Embedded store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// A message with neither text nor attachments
    #[error("Nothing to send: provide a message or a file")]
    EmptyMessage,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Parley operations
///
/// Uses `anyhow::Error` as the error type so call sites can attach context
/// while still downcasting to [`ParleyError`] where it matters.
pub type Result<T> = anyhow::Result<T>;
