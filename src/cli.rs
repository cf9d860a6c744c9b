//! Command-line interface definition for Parley
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chat, one-shot questions, reminders and memory.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parley - chat assistant with reminders, image generation and memory
#[derive(Parser, Debug, Clone)]
#[command(name = "parley")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the embedded database location
    #[arg(long, env = "PARLEY_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Parley
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat,

    /// Send a single message and print the reply
    Ask {
        /// Message text
        prompt: String,

        /// Attach a file (repeatable)
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        /// Write a generated image to this path
        #[arg(long)]
        save_image: Option<PathBuf>,
    },

    /// Manage reminders
    Reminders {
        /// Reminder subcommand
        #[command(subcommand)]
        command: ReminderCommand,
    },

    /// Manage conversation memory
    Memory {
        /// Memory subcommand
        #[command(subcommand)]
        command: MemoryCommand,
    },
}

/// Reminder subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ReminderCommand {
    /// List all reminders
    List,

    /// Delete a single reminder
    Delete {
        /// Reminder identifier
        id: String,
    },

    /// Delete every reminder
    Clear,

    /// Run the reminder scheduler in the foreground until interrupted
    Watch,
}

/// Memory subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum MemoryCommand {
    /// List stored exchanges
    List,

    /// Find the stored exchanges most similar to a text
    Search {
        /// Query text
        text: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 3)]
        limit: usize,
    },

    /// Delete all stored exchanges
    Clear,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            command: Commands::Chat,
        }
    }
}
