pub mod document;
pub mod fact_check;
pub mod region;
pub mod summary;

pub use document::*;
pub use fact_check::*;
pub use region::*;
pub use summary::*;

use chrono::NaiveDateTime;

/// Timestamp format used for every TEXT timestamp column.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_round_trips() {
        let now = chrono::Utc::now().naive_utc();
        let parsed = parse_timestamp(&format_timestamp(now));
        // Sub-second precision is dropped by the format
        assert_eq!(parsed.and_utc().timestamp(), now.and_utc().timestamp());
    }

    #[test]
    fn parse_accepts_iso_t_separator() {
        let parsed = parse_timestamp("2026-01-15T08:30:00");
        assert_eq!(format_timestamp(parsed), "2026-01-15 08:30:00");
    }
}
