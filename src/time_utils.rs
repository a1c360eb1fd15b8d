// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current timestamp for `created_at` fields.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Today's calendar date in UTC; birthdays are evaluated against it.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rfc3339_uses_z_suffix_and_whole_seconds() {
        let date = Utc.with_ymd_and_hms(2026, 3, 10, 8, 30, 5).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2026-03-10T08:30:05Z");
    }

    #[test]
    fn test_now_rfc3339_sorts_lexically() {
        let earlier = format_utc_rfc3339(Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap());
        let later = now_rfc3339();
        assert!(earlier < later);
    }
}
