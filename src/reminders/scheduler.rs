//! Periodic reminder delivery
//!
//! A single background task polls the reminder book on a fixed interval and
//! delivers every pending reminder whose time has arrived. Starting an
//! already running scheduler is a no-op, so the router can start it lazily
//! on every reminder it creates.

use crate::reminders::{Notifier, ReminderBook, ReminderStatus};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Outcome of one polling pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Reminders delivered
    pub sent: usize,
    /// Reminders whose delivery failed
    pub failed: usize,
}

struct Poller {
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

/// Background poller that fires due reminders
pub struct ReminderScheduler {
    book: ReminderBook,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    poller: Mutex<Option<Poller>>,
}

impl ReminderScheduler {
    /// Create a stopped scheduler
    pub fn new(book: ReminderBook, notifier: Arc<dyn Notifier>, interval: Duration) -> Self {
        Self {
            book,
            notifier,
            interval,
            poller: Mutex::new(None),
        }
    }

    /// Start polling in the background
    ///
    /// Must be called from within a Tokio runtime. Returns `false` when the
    /// poller was already running.
    pub fn start(&self) -> bool {
        let mut poller = match self.poller.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if poller.as_ref().is_some_and(|p| !p.handle.is_finished()) {
            return false;
        }

        let cancellation = CancellationToken::new();
        let token = cancellation.clone();
        let book = self.book.clone();
        let notifier = Arc::clone(&self.notifier);
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;

                    _ = token.cancelled() => break,

                    _ = ticker.tick() => {
                        fire_due(&book, notifier.as_ref(), Utc::now()).await;
                    }
                }
            }
            tracing::debug!("Reminder poller stopped");
        });

        tracing::info!(interval_seconds = period.as_secs(), "Reminder scheduler started");
        *poller = Some(Poller {
            cancellation,
            handle,
        });
        true
    }

    /// Stop polling and wait for the background task to finish
    pub async fn stop(&self) {
        let poller = match self.poller.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(poller) = poller {
            poller.cancellation.cancel();
            if let Err(e) = poller.handle.await {
                tracing::warn!("Reminder poller ended abnormally: {}", e);
            }
            tracing::info!("Reminder scheduler stopped");
        }
    }

    /// Whether the background poller is active
    pub fn is_running(&self) -> bool {
        match self.poller.lock() {
            Ok(guard) => guard.as_ref().is_some_and(|p| !p.handle.is_finished()),
            Err(_) => false,
        }
    }

    /// Run one polling pass immediately
    pub async fn tick(&self) -> TickReport {
        self.tick_at(Utc::now()).await
    }

    /// Run one polling pass as if the current time were `now`
    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickReport {
        fire_due(&self.book, self.notifier.as_ref(), now).await
    }
}

/// Deliver every due reminder and record the outcome
///
/// A reminder deleted while its notification was in flight stays deleted.
async fn fire_due(book: &ReminderBook, notifier: &dyn Notifier, now: DateTime<Utc>) -> TickReport {
    let mut report = TickReport::default();

    for reminder in book.due(now) {
        let status = match notifier.notify(&reminder).await {
            Ok(()) => ReminderStatus::Sent,
            Err(e) => {
                tracing::warn!(id = %reminder.id, "Reminder delivery failed: {:#}", e);
                ReminderStatus::Failed
            }
        };

        match book.set_status(&reminder.id, status) {
            Ok(true) => match status {
                ReminderStatus::Sent => report.sent += 1,
                _ => report.failed += 1,
            },
            Ok(false) => {
                tracing::debug!(id = %reminder.id, "Reminder deleted before it was marked");
            }
            Err(e) => {
                tracing::error!(id = %reminder.id, "Failed to record reminder status: {:#}", e);
            }
        }
    }

    if report.sent + report.failed > 0 {
        tracing::info!(sent = report.sent, failed = report.failed, "Processed due reminders");
    }
    report
}
