//! Fixed-prefix extractors for fields that embed a status and a date in one
//! string, e.g. `Full Review Due 12 Jan 2024`.
//!
//! None of these fail: text that does not match a prefix (or whose date
//! suffix does not parse) is returned as the raw status with no date.

use chrono::NaiveDate;

use crate::coerce::parse_date;

const REVIEW_PREFIXES: &[&str] = &["Full Review Due ", "Full Ending "];
const TRAINING_PREFIXES: &[&str] = &["Full (Review Due: ", "Full (Ending: "];
const DISCLOSURE_PREFIX: &str = "Disclosure Issued : ";

/// Roles tab status cell.
pub fn extract_review_status(text: &str) -> (String, Option<NaiveDate>) {
    for prefix in REVIEW_PREFIXES {
        if let Some(rest) = text.strip_prefix(prefix) {
            if let Ok(date @ Some(_)) = parse_date(rest) {
                return ("Full".to_string(), date);
            }
        }
    }
    (text.to_string(), None)
}

/// Training tab role status cell; the date is wrapped in parentheses.
pub fn extract_training_status(text: &str) -> (String, Option<NaiveDate>) {
    for prefix in TRAINING_PREFIXES {
        if let Some(rest) = text.strip_prefix(prefix) {
            if let Ok(date @ Some(_)) = parse_date(rest.trim_end_matches(')')) {
                return ("Full".to_string(), date);
            }
        }
    }
    (text.to_string(), None)
}

/// Role popup disclosure field. Empty text is no status at all.
pub fn extract_disclosure_status(text: &str) -> (Option<String>, Option<NaiveDate>) {
    if let Some(rest) = text.strip_prefix(DISCLOSURE_PREFIX) {
        if let Ok(date @ Some(_)) = parse_date(rest) {
            return (Some("Disclosure Issued".to_string()), date);
        }
    }
    (crate::coerce::non_empty(text), None)
}
