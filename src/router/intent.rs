//! Intent classification for incoming messages

use crate::reminders::{ReminderExtractor, ReminderRequest};
use regex::Regex;
use std::sync::OnceLock;

fn image_request_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(generate|create|draw|imagine|make|show me)\s+(an?|some)?\s*images?\s+of\b")
            .expect("valid image request pattern")
    })
}

/// What the user is asking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Schedule a reminder
    Reminder(ReminderRequest),
    /// Generate an image of `subject`
    Image {
        /// What to draw, with the trigger phrase removed
        subject: String,
    },
    /// Analyze attached files
    Files,
    /// Free-form conversation
    Chat,
}

/// Extract the subject of an image request
///
/// Removes the first trigger phrase and trims the rest. Returns `None` when
/// the utterance is not an image request or nothing remains after removal.
///
/// # Examples
///
/// ```
/// use parley::router::image_subject;
///
/// assert_eq!(image_subject("generate an image of a red fox"), Some("a red fox".to_string()));
/// assert_eq!(image_subject("Please DRAW some images of cats!"), Some("Please  cats!".to_string()));
/// assert_eq!(image_subject("what is an image?"), None);
/// ```
pub fn image_subject(utterance: &str) -> Option<String> {
    let re = image_request_re();
    if !re.is_match(utterance) {
        return None;
    }
    let subject = re.replacen(utterance, 1, "").trim().to_string();
    (!subject.is_empty()).then_some(subject)
}

/// Ordered classifier: reminder, then image, then attachments, then chat
#[derive(Clone)]
pub struct IntentClassifier {
    extractor: ReminderExtractor,
}

impl IntentClassifier {
    /// Create a classifier around a reminder extractor
    pub fn new(extractor: ReminderExtractor) -> Self {
        Self { extractor }
    }

    /// Classify an utterance; the first matching intent wins
    pub async fn classify(&self, utterance: &str, has_attachments: bool) -> Intent {
        if let Some(reminder) = self.extractor.extract(utterance).await {
            return Intent::Reminder(reminder);
        }
        if let Some(subject) = image_subject(utterance) {
            return Intent::Image { subject };
        }
        if has_attachments {
            return Intent::Files;
        }
        Intent::Chat
    }
}
