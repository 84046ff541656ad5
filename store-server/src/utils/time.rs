//! Time helpers for human-readable output in emails and logs.

use chrono::DateTime;

/// Format unix-millis as "29 Aug 2026 14:30" (UTC).
///
/// Falls back to the raw number when the timestamp is out of range.
pub fn format_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%d %b %Y %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_known_instant() {
        // 2024-01-01 00:00:00 UTC
        assert_eq!(format_millis(1_704_067_200_000), "01 Jan 2024 00:00");
    }

    #[test]
    fn out_of_range_falls_back() {
        assert_eq!(format_millis(i64::MAX), i64::MAX.to_string());
    }
}
