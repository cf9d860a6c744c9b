//! Reminder notification delivery

use crate::error::{ParleyError, Result};
use crate::reminders::Reminder;
use async_trait::async_trait;
use chrono::Local;
use colored::Colorize;
use std::io::Write;

/// Delivers a due reminder to the user
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one reminder
    ///
    /// # Errors
    ///
    /// Returns `ParleyError::Notification` if the reminder could not be delivered
    async fn notify(&self, reminder: &Reminder) -> Result<()>;
}

/// Prints reminders to the terminal, optionally ringing the bell
#[derive(Debug, Clone, Default)]
pub struct TerminalNotifier {
    audible: bool,
}

impl TerminalNotifier {
    /// Create a terminal notifier
    pub fn new(audible: bool) -> Self {
        Self { audible }
    }

    fn write(&self, reminder: &Reminder) -> std::io::Result<()> {
        let due = reminder.datetime.with_timezone(&Local);
        let bell = if self.audible { "\x07" } else { "" };
        let mut stdout = std::io::stdout().lock();

        writeln!(
            stdout,
            "\n{}{} {}\n  {}",
            bell,
            "Reminder:".yellow().bold(),
            reminder.task.bold(),
            format!("(due {})", due.format("%Y-%m-%d %H:%M")).dimmed()
        )?;
        stdout.flush()
    }
}

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn notify(&self, reminder: &Reminder) -> Result<()> {
        self.write(reminder)
            .map_err(|e| ParleyError::Notification(format!("Failed to write reminder: {}", e)))?;
        Ok(())
    }
}
