//! Reminder intent extraction
//!
//! The language model is asked first; its JSON answer decides whether the
//! utterance is a reminder. When the call fails or the answer cannot be
//! used, a "remind me to <task> at|on|in <when>" pattern is tried instead.

use crate::error::{ParleyError, Result};
use crate::providers::{GenerationRequest, LanguageModel};
use crate::reminders::datetime::{localize, parse_when};
use crate::reminders::ReminderRequest;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Deserialize;
use std::fmt::Display;
use std::sync::{Arc, OnceLock};

fn fallback_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)remind me to (.+?) (?:on|at|in) (.+)").expect("valid reminder pattern")
    })
}

/// Structured answer expected from the model
#[derive(Debug, Deserialize)]
struct ModelAnswer {
    #[serde(rename = "isReminder")]
    is_reminder: bool,
    #[serde(default)]
    task: Option<String>,
    #[serde(default)]
    datetime: Option<String>,
}

/// Extracts reminder requests from free text
#[derive(Clone)]
pub struct ReminderExtractor {
    language: Arc<dyn LanguageModel>,
}

impl ReminderExtractor {
    /// Create an extractor backed by a language model
    pub fn new(language: Arc<dyn LanguageModel>) -> Self {
        Self { language }
    }

    /// Extract a reminder relative to the local clock
    pub async fn extract(&self, utterance: &str) -> Option<ReminderRequest> {
        self.extract_at(utterance, Local::now()).await
    }

    /// Extract a reminder relative to `now`
    ///
    /// Returns `None` when the utterance is not a reminder. A model answer of
    /// `isReminder: false` is final; only failures fall through to the
    /// pattern match.
    pub async fn extract_at<Tz>(&self, utterance: &str, now: DateTime<Tz>) -> Option<ReminderRequest>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: Display + Send + Sync,
    {
        let request = GenerationRequest::text(build_prompt(utterance, &now));
        let answer = match self.language.generate(&request).await {
            Ok(raw) => parse_model_answer(&raw, &now),
            Err(e) => Err(e),
        };

        match answer {
            Ok(Some(reminder)) => {
                tracing::debug!(task = %reminder.task, "Model extracted reminder");
                Some(reminder)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("Model reminder extraction failed, using pattern: {:#}", e);
                parse_fallback(utterance, &now)
            }
        }
    }
}

/// Prompt asking the model to classify and extract a reminder
fn build_prompt<Tz>(utterance: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        r#"Analyze the following message and decide whether the user is asking to be reminded of something.

Message: "{utterance}"

Current date and time: {now}

Respond with JSON only, without markdown formatting:
{{"isReminder": true or false, "task": "what to be reminded about", "datetime": "ISO 8601 date and time"}}

Examples of reminder requests:
- "remind me to call mom at 5pm"
- "set a reminder for the dentist tomorrow at 10am"
- "don't let me forget to water the plants in 2 hours"

If the message is not a reminder request, respond with {{"isReminder": false}}."#,
        utterance = utterance,
        now = now.to_rfc3339(),
    )
}

/// Strip markdown code fences wrapped around a JSON answer
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

/// Interpret the model's answer
///
/// # Errors
///
/// Returns `ParleyError::ReminderParse` when the answer is not the expected
/// JSON, or claims a reminder without a usable task or datetime
fn parse_model_answer<Tz: TimeZone>(
    raw: &str,
    now: &DateTime<Tz>,
) -> Result<Option<ReminderRequest>> {
    let answer: ModelAnswer = serde_json::from_str(strip_fences(raw))
        .map_err(|e| ParleyError::ReminderParse(format!("Malformed model answer: {}", e)))?;

    if !answer.is_reminder {
        return Ok(None);
    }

    let task = answer
        .task
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ParleyError::ReminderParse("Reminder without a task".to_string()))?;

    let raw_datetime = answer
        .datetime
        .ok_or_else(|| ParleyError::ReminderParse("Reminder without a datetime".to_string()))?;
    let datetime = parse_model_datetime(&raw_datetime, now).ok_or_else(|| {
        ParleyError::ReminderParse(format!("Invalid reminder datetime: {}", raw_datetime))
    })?;

    Ok(Some(ReminderRequest { task, datetime }))
}

/// Parse the ISO 8601 datetime the model was asked for
///
/// Offsets are honored; naive values are read in the zone of `now`.
fn parse_model_datetime<Tz: TimeZone>(raw: &str, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| localize(now, naive))
}

/// Match "remind me to <task> on|at|in <when>"
///
/// The task is the shortest text before the first " on ", " at " or " in ".
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use parley::reminders::parser::parse_fallback;
///
/// let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
/// let reminder = parse_fallback("Remind me to call mom at 3pm", &now).unwrap();
/// assert_eq!(reminder.task, "call mom");
/// assert_eq!(reminder.datetime, Utc.with_ymd_and_hms(2026, 5, 1, 15, 0, 0).unwrap());
///
/// assert!(parse_fallback("what's the weather?", &now).is_none());
/// ```
pub fn parse_fallback<Tz: TimeZone>(utterance: &str, now: &DateTime<Tz>) -> Option<ReminderRequest> {
    let caps = fallback_re().captures(utterance)?;
    let task = caps[1].trim();
    if task.is_empty() {
        return None;
    }
    let datetime = parse_when(&caps[2], now)?;
    Some(ReminderRequest {
        task: task.to_string(),
        datetime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedLanguageModel;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn extractor(model: ScriptedLanguageModel) -> (ReminderExtractor, Arc<ScriptedLanguageModel>) {
        let model = Arc::new(model);
        (ReminderExtractor::new(model.clone()), model)
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_fences("  {} "), "{}");
    }

    #[tokio::test]
    async fn test_model_answer_is_used() {
        let (extractor, model) = extractor(ScriptedLanguageModel::replying(
            "```json\n{\"isReminder\": true, \"task\": \"call mom\", \"datetime\": \"2026-12-25T10:00:00Z\"}\n```",
        ));

        let reminder = extractor
            .extract_at("remind me to call mom on christmas", noon())
            .await
            .unwrap();
        assert_eq!(reminder.task, "call mom");
        assert_eq!(
            reminder.datetime,
            Utc.with_ymd_and_hms(2026, 12, 25, 10, 0, 0).unwrap()
        );

        let prompt = &model.requests()[0].prompt;
        assert!(prompt.contains("remind me to call mom on christmas"));
        assert!(prompt.contains("2026-05-01T12:00:00+00:00"));
    }

    #[tokio::test]
    async fn test_naive_model_datetime_uses_reference_zone() {
        let (extractor, _) = extractor(ScriptedLanguageModel::replying(
            r#"{"isReminder": true, "task": "stretch", "datetime": "2026-05-01T15:30:00"}"#,
        ));
        let reminder = extractor.extract_at("stretch later", noon()).await.unwrap();
        assert_eq!(
            reminder.datetime,
            Utc.with_ymd_and_hms(2026, 5, 1, 15, 30, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_negative_answer_skips_fallback() {
        let (extractor, _) =
            extractor(ScriptedLanguageModel::replying(r#"{"isReminder": false}"#));
        assert!(extractor
            .extract_at("remind me to call mom at 3pm", noon())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_model_failure_uses_fallback() {
        let (extractor, _) = extractor(ScriptedLanguageModel::failing());
        let reminder = extractor
            .extract_at("remind me to call mom at 3pm", noon())
            .await
            .unwrap();
        assert_eq!(reminder.task, "call mom");
        assert_eq!(
            reminder.datetime,
            Utc.with_ymd_and_hms(2026, 5, 1, 15, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_malformed_answer_uses_fallback() {
        let (extractor, _) = extractor(ScriptedLanguageModel::replying("Sure! I can help."));
        let reminder = extractor
            .extract_at("remind me to stretch in 20 minutes", noon())
            .await
            .unwrap();
        assert_eq!(reminder.task, "stretch");
        assert_eq!(
            reminder.datetime,
            Utc.with_ymd_and_hms(2026, 5, 1, 12, 20, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_invalid_datetime_uses_fallback() {
        let (extractor, _) = extractor(ScriptedLanguageModel::replying(
            r#"{"isReminder": true, "task": "pay rent", "datetime": "next-ish"}"#,
        ));
        let reminder = extractor
            .extract_at("remind me to pay rent on 2026-06-01 09:00", noon())
            .await
            .unwrap();
        assert_eq!(reminder.task, "pay rent");
        assert_eq!(
            reminder.datetime,
            Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_empty_task_uses_fallback() {
        let (extractor, _) = extractor(ScriptedLanguageModel::replying(
            r#"{"isReminder": true, "task": " ", "datetime": "2026-05-01T15:00:00Z"}"#,
        ));
        assert!(extractor.extract_at("hello there", noon()).await.is_none());
    }

    #[test]
    fn test_fallback_unparseable_time_is_not_a_reminder() {
        assert!(parse_fallback("remind me to call mom at some point", &noon()).is_none());
    }

    #[test]
    fn test_fallback_is_case_insensitive() {
        let reminder = parse_fallback("REMIND ME TO Feed The Cat in 2 hours", &noon()).unwrap();
        assert_eq!(reminder.task, "Feed The Cat");
    }

    #[test]
    fn test_fallback_takes_shortest_task() {
        let reminder = parse_fallback("remind me to call mom tomorrow at 3pm", &noon()).unwrap();
        assert_eq!(reminder.task, "call mom tomorrow");
        assert_eq!(
            reminder.datetime,
            Utc.with_ymd_and_hms(2026, 5, 1, 15, 0, 0).unwrap()
        );
    }
}
