//! Default system-prompt placeholders.

use chrono::{DateTime, Local, TimeZone};
use orca_domain::{DATE_TOKEN, PromptReplacements, TIME_TOKEN};
use std::fmt::Display;

/// Source of placeholder values, evaluated on every rebuild.
pub type ReplacementSource = fn() -> PromptReplacements;

/// `<date>` and `<time>` for the current local time.
pub fn current_replacements() -> PromptReplacements {
    replacements_at(&Local::now())
}

/// `<date>` (`2026-10-18`) and `<time>` (`09:05 PM`) for `now`.
pub fn replacements_at<Tz>(now: &DateTime<Tz>) -> PromptReplacements
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    PromptReplacements::new()
        .with(DATE_TOKEN, now.format("%Y-%m-%d").to_string())
        .with(TIME_TOKEN, now.format("%I:%M %p").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_formats_date_and_twelve_hour_time() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 21, 5, 0).unwrap();
        let replacements = replacements_at(&now);
        assert_eq!(replacements.get(DATE_TOKEN), Some("2026-10-18"));
        assert_eq!(replacements.get(TIME_TOKEN), Some("09:05 PM"));
    }

    #[test]
    fn test_current_replacements_has_both_tokens() {
        let replacements = current_replacements();
        assert_eq!(replacements.len(), 2);
        assert_eq!(replacements.get(DATE_TOKEN).map(str::len), Some(10));
    }
}
