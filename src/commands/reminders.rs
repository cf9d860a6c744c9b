use crate::cli::ReminderCommand;
use crate::commands::truncate;
use crate::config::Config;
use crate::error::Result;
use crate::reminders::{Reminder, ReminderBook, ReminderScheduler, ReminderStatus, TerminalNotifier};
use crate::storage::Storage;
use chrono::Local;
use colored::Colorize;
use prettytable::{format, Table};
use std::sync::Arc;
use std::time::Duration;

/// Handle reminder commands
pub async fn handle_reminders(config: Config, command: ReminderCommand) -> Result<()> {
    let book = ReminderBook::new(Storage::from_config(&config.storage)?);

    match command {
        ReminderCommand::List => print_reminders(&book.list()),
        ReminderCommand::Delete { id } => {
            let reminder = book.delete(&id)?;
            println!(
                "{}",
                format!("Deleted reminder {} ({})", reminder.id, reminder.task).green()
            );
        }
        ReminderCommand::Clear => {
            book.clear()?;
            println!("{}", "All reminders cleared.".green());
        }
        ReminderCommand::Watch => {
            let pending = book.pending().len();
            let scheduler = ReminderScheduler::new(
                book,
                Arc::new(TerminalNotifier::new(config.reminders.audible)),
                Duration::from_secs(config.reminders.poll_interval_seconds),
            );
            scheduler.start();
            println!(
                "Watching {} pending reminder(s), checking every {}s. Press {} to stop.",
                pending,
                config.reminders.poll_interval_seconds,
                "Ctrl-C".cyan()
            );

            tokio::signal::ctrl_c().await?;
            scheduler.stop().await;
            println!("Stopped watching reminders.");
        }
    }

    Ok(())
}

/// Print reminders as a table
pub fn print_reminders(reminders: &[Reminder]) {
    if reminders.is_empty() {
        println!("{}", "No reminders set.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "ID".bold(),
        "Task".bold(),
        "Due".bold(),
        "Status".bold()
    ]);

    for reminder in reminders {
        let status = match reminder.status {
            ReminderStatus::Pending => "pending".yellow(),
            ReminderStatus::Sent => "sent".green(),
            ReminderStatus::Failed => "failed".red(),
        };
        table.add_row(prettytable::row![
            reminder.id.cyan(),
            truncate(&reminder.task, 40),
            reminder
                .datetime
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            status
        ]);
    }

    let pending = reminders
        .iter()
        .filter(|r| r.status == ReminderStatus::Pending)
        .count();

    println!("\nReminders ({} pending):", pending);
    table.printstd();
    println!();
}
