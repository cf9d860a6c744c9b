//! Natural-language date and time resolution
//!
//! Resolves the time fragment of a reminder ("at 3pm", "tomorrow at 9",
//! "in 20 minutes", "2026-12-25 10:00") against a reference instant. Naive
//! times are interpreted in the reference instant's time zone.

use chrono::{
    DateTime, Datelike, Duration, Month, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use regex::Regex;
use std::sync::OnceLock;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dt%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dt%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I%p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

fn relative_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:in\s+)?(an?|\d+)\s*(seconds?|secs?|minutes?|mins?|hours?|hrs?|days?|weeks?)(?:\s+from\s+now)?$",
        )
        .expect("valid relative time pattern")
    })
}

fn day_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(today|tonight|tomorrow)(?:\s+(?:at\s+)?(.+))?$")
            .expect("valid day word pattern")
    })
}

fn trailing_day_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.+?)\s+(today|tonight|tomorrow)$").expect("valid trailing day pattern")
    })
}

fn month_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?(?:,?\s+(?:at\s+)?(.+))?$",
        )
        .expect("valid month day pattern")
    })
}

fn time_of_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m?\.?$|^(\d{1,2}):(\d{2})$")
            .expect("valid time of day pattern")
    })
}

/// Resolve a time expression relative to `now`
///
/// Returns `None` when the expression is not understood or names a local
/// time that does not exist.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use parley::reminders::parse_when;
///
/// let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
/// assert_eq!(
///     parse_when("in 2 hours", &now),
///     Some(Utc.with_ymd_and_hms(2026, 5, 1, 14, 0, 0).unwrap())
/// );
/// assert_eq!(
///     parse_when("tomorrow at 9am", &now),
///     Some(Utc.with_ymd_and_hms(2026, 5, 2, 9, 0, 0).unwrap())
/// );
/// assert_eq!(parse_when("someday", &now), None);
/// ```
pub fn parse_when<Tz: TimeZone>(text: &str, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let text = text
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .trim()
        .to_lowercase();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&text.to_uppercase()) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&text, format) {
            return localize(now, naive);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
            return localize(now, date.and_time(NaiveTime::MIN));
        }
    }

    if let Some(caps) = relative_re().captures(&text) {
        let amount: i64 = match &caps[1] {
            "a" | "an" => 1,
            n => n.parse().ok()?,
        };
        let unit = &caps[2];
        let delta = if unit.starts_with("sec") {
            Duration::try_seconds(amount)?
        } else if unit.starts_with("min") {
            Duration::try_minutes(amount)?
        } else if unit.starts_with('h') {
            Duration::try_hours(amount)?
        } else if unit.starts_with('d') {
            Duration::try_days(amount)?
        } else {
            Duration::try_weeks(amount)?
        };
        return now.with_timezone(&Utc).checked_add_signed(delta);
    }

    if let Some(caps) = day_word_re().captures(&text) {
        return resolve_day_word(now, &caps[1], caps.get(2).map(|m| m.as_str()));
    }

    if let Some(caps) = trailing_day_word_re().captures(&text) {
        let time = caps[1].trim_start_matches("at ").trim();
        return resolve_day_word(now, &caps[2], Some(time));
    }

    if let Some(caps) = month_day_re().captures(&text) {
        if let Ok(month) = caps[1].parse::<Month>() {
            return resolve_month_day(
                now,
                month,
                caps[2].parse().ok()?,
                caps.get(3).and_then(|y| y.as_str().parse().ok()),
                caps.get(4).map(|m| m.as_str()),
            );
        }
    }

    let time = parse_time_of_day(&text)?;
    let today = now.naive_local().date();
    let candidate = localize(now, today.and_time(time))?;
    if candidate > now.with_timezone(&Utc) {
        Some(candidate)
    } else {
        localize(now, today.succ_opt()?.and_time(time))
    }
}

/// Parse a clock time such as "3pm", "3:30 pm", "15:30", "noon"
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let text = text.trim().to_lowercase();
    match text.as_str() {
        "noon" | "midday" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return Some(NaiveTime::MIN),
        _ => {}
    }

    let caps = time_of_day_re().captures(&text)?;
    if let Some(hour) = caps.get(1) {
        let hour: u32 = hour.as_str().parse().ok()?;
        let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        if !(1..=12).contains(&hour) {
            return None;
        }
        let hour = match (&caps[3], hour) {
            ("a", 12) => 0,
            ("a", h) => h,
            ("p", 12) => 12,
            (_, h) => h + 12,
        };
        NaiveTime::from_hms_opt(hour, minute, 0)
    } else {
        let hour: u32 = caps[4].parse().ok()?;
        let minute: u32 = caps[5].parse().ok()?;
        NaiveTime::from_hms_opt(hour, minute, 0)
    }
}

fn resolve_day_word<Tz: TimeZone>(
    now: &DateTime<Tz>,
    word: &str,
    time: Option<&str>,
) -> Option<DateTime<Utc>> {
    let today = now.naive_local().date();
    let time = match (word, time) {
        (_, Some(t)) => parse_time_of_day(t)?,
        ("tonight", None) => NaiveTime::from_hms_opt(20, 0, 0)?,
        ("tomorrow", None) => NaiveTime::from_hms_opt(9, 0, 0)?,
        _ => return None,
    };
    let date = if word == "tomorrow" {
        today.succ_opt()?
    } else {
        today
    };
    localize(now, date.and_time(time))
}

fn resolve_month_day<Tz: TimeZone>(
    now: &DateTime<Tz>,
    month: Month,
    day: u32,
    year: Option<i32>,
    time: Option<&str>,
) -> Option<DateTime<Utc>> {
    let time = match time {
        Some(t) => parse_time_of_day(t)?,
        None => NaiveTime::MIN,
    };
    let month = month.number_from_month();
    let this_year = now.naive_local().year();

    let at = |y: i32| NaiveDate::from_ymd_opt(y, month, day).map(|d| d.and_time(time));
    match year {
        Some(y) => localize(now, at(y)?),
        None => {
            let candidate = localize(now, at(this_year)?)?;
            if candidate >= now.with_timezone(&Utc) {
                Some(candidate)
            } else {
                localize(now, at(this_year + 1)?)
            }
        }
    }
}

/// Interpret a naive datetime in the zone of `now`
pub(crate) fn localize<Tz: TimeZone>(
    now: &DateTime<Tz>,
    naive: NaiveDateTime,
) -> Option<DateTime<Utc>> {
    now.timezone()
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
