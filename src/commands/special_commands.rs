//! Special commands parser for interactive chat
//!
//! Special commands manage the session instead of being sent to the
//! assistant: attaching files, viewing and clearing reminders and memory,
//! showing status and help, and leaving the session.
//!
//! Commands are prefixed with `/`; the command word is case-insensitive,
//! arguments are kept verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an argument it does not take
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Queue a file for the next message
    Attach(PathBuf),

    /// Show files queued for the next message
    ListFiles,

    /// Drop all queued files
    Detach,

    /// Show all reminders
    ListReminders,

    /// Delete one reminder by id
    DeleteReminder(String),

    /// Delete every reminder
    ClearReminders,

    /// Show stored conversation memory
    ListMemory,

    /// Delete all conversation memory
    ClearMemory,

    /// Show pending reminders, memory size and queued files
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input is sent to the assistant.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is not
/// a valid command, `CommandError::MissingArgument` when a required argument
/// is absent, and `CommandError::UnsupportedArgument` when a command that
/// takes no argument receives one.
///
/// # Examples
///
/// ```
/// use parley::commands::special_commands::{parse_special_command, SpecialCommand};
/// use std::path::PathBuf;
///
/// let cmd = parse_special_command("/attach ./Photo.PNG").unwrap();
/// assert_eq!(cmd, SpecialCommand::Attach(PathBuf::from("./Photo.PNG")));
///
/// let cmd = parse_special_command("/Reminders").unwrap();
/// assert_eq!(cmd, SpecialCommand::ListReminders);
///
/// let cmd = parse_special_command("hello there").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let (word, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    let no_arg = |command: SpecialCommand| {
        if arg.is_empty() {
            Ok(command)
        } else {
            Err(CommandError::UnsupportedArgument {
                command: word.clone(),
                arg: arg.to_string(),
            })
        }
    };

    match word.as_str() {
        "/attach" | "/file" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/attach".to_string(),
                    usage: "/attach <path>".to_string(),
                })
            } else {
                Ok(SpecialCommand::Attach(PathBuf::from(arg)))
            }
        }
        "/files" => no_arg(SpecialCommand::ListFiles),
        "/detach" => no_arg(SpecialCommand::Detach),

        "/reminders" => no_arg(SpecialCommand::ListReminders),
        "/delete" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/delete".to_string(),
                    usage: "/delete <reminder id>".to_string(),
                })
            } else {
                Ok(SpecialCommand::DeleteReminder(arg.to_string()))
            }
        }
        "/clear-reminders" => no_arg(SpecialCommand::ClearReminders),

        "/memory" => no_arg(SpecialCommand::ListMemory),
        "/clear-memory" => no_arg(SpecialCommand::ClearMemory),

        "/status" => no_arg(SpecialCommand::ShowStatus),
        "/help" | "/?" => no_arg(SpecialCommand::Help),
        "/exit" | "/quit" => no_arg(SpecialCommand::Exit),

        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Display help for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

ATTACHMENTS:
  /attach <path>    - Attach a file to your next message
  /files            - Show attached files
  /detach           - Remove all attached files

REMINDERS:
  /reminders        - List all reminders
  /delete <id>      - Delete a reminder
  /clear-reminders  - Delete all reminders

MEMORY:
  /memory           - Show remembered conversations
  /clear-memory     - Forget all conversations

SESSION:
  /status           - Show pending reminders and memory size
  /help             - Show this help message
  /?                - Same as /help
  exit              - Exit interactive mode
  quit              - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to the assistant
  - Say "remind me to ... at ..." to set a reminder
  - Say "generate an image of ..." to create an image
"#
    );
}
