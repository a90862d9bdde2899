//! Ticket link construction.
//!
//! The payload is `{base_url}/{first_name}/{email}/{roll_number}` with no
//! escaping. Whatever scans the code splits on `/`, so a name or email that
//! contains `/` yields a link with extra segments. That is kept as-is for
//! compatibility with existing ticket links and reported in the log.

use crate::types::Field;

/// Where ticket links point by default
pub const DEFAULT_BASE_URL: &str = "https://preview-ebon.vercel.app/ticket";

/// Build the ticket link for an attendee
#[must_use]
pub fn ticket_link(base_url: &str, first_name: &str, email: &str, roll_number: i64) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/{first_name}/{email}/{roll_number}")
}

/// Fields whose value would add segments to the link
#[must_use]
pub fn ambiguous_segments(first_name: &str, email: &str) -> Vec<Field> {
    [(Field::FirstName, first_name), (Field::Email, email)]
        .into_iter()
        .filter(|(_, value)| value.contains('/'))
        .map(|(field, _)| field)
        .collect()
}
