/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`     : Interactive chat session
- `ask`      : Send one message and print the reply
- `reminders`: List, delete, clear and watch reminders
- `memory`   : List, search and clear conversation memory
*/

use crate::providers::GeneratedImage;
use std::path::{Path, PathBuf};

// Special commands parser for the chat session
pub mod special_commands;

// Reminder management commands
pub mod reminders;

// Conversation memory commands
pub mod memory;

/// Shorten text to at most `max` characters for table display
pub(crate) fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let kept: String = single_line.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// File extension for an image media type
fn image_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        _ => "jpg",
    }
}

/// Write a generated image to `path`, or to the temp directory when no path is given
fn save_image(image: &GeneratedImage, path: Option<&Path>, id: &str) -> std::io::Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::temp_dir().join(format!(
            "parley-{}.{}",
            id.to_lowercase(),
            image_extension(&image.mime_type)
        )),
    };
    std::fs::write(&path, &image.bytes)?;
    Ok(path)
}

// Chat command handler
pub mod chat {
    //! Interactive chat session handler.
    //!
    //! Builds a `ResponseRouter`, wraps it in a `ChatSession`, and runs a
    //! readline-based loop. Slash commands manage attachments, reminders and
    //! memory; everything else is sent to the assistant.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::attachments::Attachment;
    use crate::chat::{ChatSession, Message};
    use crate::config::Config;
    use crate::error::Result;
    use crate::router::ResponseRouter;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start an interactive chat session
    ///
    /// Pending reminders from earlier sessions are picked up by starting the
    /// scheduler right away.
    ///
    /// # Errors
    ///
    /// Returns error if the providers, storage or line editor cannot be
    /// initialized
    pub async fn run_chat(config: Config) -> Result<()> {
        let router = ResponseRouter::from_config(&config)?;
        if !router.reminders().pending().is_empty() {
            router.scheduler().start();
        }

        let mut session = ChatSession::new(router);
        let mut rl = DefaultEditor::new()?;
        let mut queued: Vec<Attachment> = Vec::new();
        let max_file_size = config.attachments.max_file_size_bytes;

        print_welcome_banner();
        if let Some(greeting) = session.transcript().first() {
            print_bot_message(greeting);
        }

        loop {
            match rl.readline(&format_prompt(queued.len())) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if let Err(e) = rl.add_history_entry(trimmed) {
                        tracing::debug!("Failed to record history: {}", e);
                    }

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::Attach(path) => {
                            match Attachment::load(&path, max_file_size).await {
                                Ok(attachment) => {
                                    println!(
                                        "Attached {} ({})\n",
                                        attachment.name.cyan(),
                                        attachment.mime_type
                                    );
                                    queued.push(attachment);
                                }
                                Err(e) => eprintln!("{}\n", e.to_string().red()),
                            }
                            continue;
                        }
                        SpecialCommand::ListFiles => {
                            print_queued(&queued);
                            continue;
                        }
                        SpecialCommand::Detach => {
                            queued.clear();
                            println!("Attachments cleared.\n");
                            continue;
                        }
                        SpecialCommand::ListReminders => {
                            reminders::print_reminders(&session.router().reminders().list());
                            continue;
                        }
                        SpecialCommand::DeleteReminder(id) => {
                            match session.router().reminders().delete(&id) {
                                Ok(reminder) => println!(
                                    "{}\n",
                                    format!("Deleted reminder: {}", reminder.task).green()
                                ),
                                Err(e) => eprintln!("{}\n", e.to_string().red()),
                            }
                            continue;
                        }
                        SpecialCommand::ClearReminders => {
                            match session.router().reminders().clear() {
                                Ok(()) => println!("{}\n", "All reminders cleared.".green()),
                                Err(e) => eprintln!("{}\n", e.to_string().red()),
                            }
                            continue;
                        }
                        SpecialCommand::ListMemory => {
                            memory::print_memories(
                                &session.router().memory().list(),
                                config.memory.capacity,
                            );
                            continue;
                        }
                        SpecialCommand::ClearMemory => {
                            match session.router().memory().clear() {
                                Ok(()) => {
                                    println!("{}\n", "Conversation memory cleared.".green())
                                }
                                Err(e) => eprintln!("{}\n", e.to_string().red()),
                            }
                            continue;
                        }
                        SpecialCommand::ShowStatus => {
                            print_status_display(&session, queued.len(), config.memory.capacity);
                            continue;
                        }
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {}
                    }

                    let attachments = std::mem::take(&mut queued);
                    if let Some(reply) = session.send(trimmed, attachments).await {
                        print_bot_message(reply);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        session.router().shutdown().await;
        println!("Goodbye!");
        Ok(())
    }

    fn format_prompt(queued: usize) -> String {
        if queued == 0 {
            format!("{} ", "you>".green().bold())
        } else {
            format!("{} {} ", format!("[{} file(s)]", queued).cyan(), "you>".green().bold())
        }
    }

    fn print_welcome_banner() {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║               Parley Interactive Chat - Welcome!             ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    fn print_bot_message(message: &Message) {
        println!("\n{} {}", "parley>".blue().bold(), message.text);
        if let Some(image) = &message.image {
            match save_image(image, None, &message.id) {
                Ok(path) => println!("{} {}", "Image saved to".dimmed(), path.display()),
                Err(e) => eprintln!("{}", format!("Failed to save image: {}", e).red()),
            }
        }
        println!();
    }

    fn print_queued(queued: &[Attachment]) {
        if queued.is_empty() {
            println!("No files attached.\n");
            return;
        }
        println!("Attached files:");
        for attachment in queued {
            println!(
                "  {} ({}, {} bytes)",
                attachment.name.cyan(),
                attachment.mime_type,
                attachment.bytes.len()
            );
        }
        println!();
    }

    fn print_status_display(session: &ChatSession, queued: usize, capacity: usize) {
        let router = session.router();
        let scheduler = if router.scheduler().is_running() {
            "running".green()
        } else {
            "stopped".dimmed()
        };

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Parley Session Status                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Pending Reminders: {}", router.reminders().pending().len());
        println!("Scheduler:         {}", scheduler);
        println!("Memory:            {}/{} conversations", router.memory().len(), capacity);
        println!("Attached Files:    {}", queued);
        println!("Transcript Size:   {} messages", session.transcript().len());
        println!();
    }

}

// Ask command handler
pub mod ask {
    //! One-shot question handler.

    use super::*;
    use crate::attachments::Attachment;
    use crate::chat::ChatSession;
    use crate::config::Config;
    use crate::error::{ParleyError, Result};
    use crate::router::ResponseRouter;
    use colored::Colorize;

    /// Send one message, print the reply and save any generated image
    ///
    /// # Errors
    ///
    /// Returns error if an attachment cannot be loaded, the message is empty,
    /// or the image cannot be written
    pub async fn run_ask(
        config: Config,
        prompt: String,
        files: Vec<PathBuf>,
        save_to: Option<PathBuf>,
    ) -> Result<()> {
        if prompt.trim().is_empty() && files.is_empty() {
            return Err(ParleyError::EmptyMessage.into());
        }

        let mut attachments = Vec::with_capacity(files.len());
        for path in &files {
            attachments.push(
                Attachment::load(path, config.attachments.max_file_size_bytes).await?,
            );
        }

        let mut session = ChatSession::new(ResponseRouter::from_config(&config)?);
        let reply = session
            .send(&prompt, attachments)
            .await
            .cloned()
            .ok_or(ParleyError::EmptyMessage)?;

        println!("{}", reply.text);
        if let Some(image) = &reply.image {
            let path =
                save_image(image, save_to.as_deref(), &reply.id).map_err(ParleyError::Io)?;
            println!("{} {}", "Image saved to".dimmed(), path.display());
        }

        let router = session.router();
        if router.scheduler().is_running() {
            println!(
                "Run {} to receive reminder notifications.",
                "parley reminders watch".cyan()
            );
        }
        router.shutdown().await;
        Ok(())
    }

}
