//! Parley - chat assistant library
//!
//! This library provides the core functionality for the Parley assistant:
//! routing each chat turn to a reminder, image, file-analysis or chat
//! handler, remembering past exchanges with embedding-based similarity,
//! and firing reminders when they come due.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `router`: Intent classification and per-intent response handling
//! - `chat`: Transcript of one conversation
//! - `memory`: Vector store and cosine similarity
//! - `reminders`: Reminder log, extraction, notification and scheduling
//! - `providers`: Gemini and Hugging Face clients behind model traits
//! - `attachments`: Loading and classifying attached files
//! - `storage`: Embedded persistence for reminders and memory
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use parley::{ChatSession, Config, ResponseRouter};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let mut session = ChatSession::new(ResponseRouter::from_config(&config)?);
//!     if let Some(reply) = session.send("remind me to stretch in 20 minutes", Vec::new()).await {
//!         println!("{}", reply.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod attachments;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod memory;
pub mod providers;
pub mod reminders;
pub mod router;
pub mod storage;

// Re-export commonly used types
pub use chat::ChatSession;
pub use config::Config;
pub use error::{ParleyError, Result};
pub use router::{BotReply, ResponseRouter};

#[cfg(test)]
pub mod test_utils;
