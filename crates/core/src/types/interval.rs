//! Time-bucket granularity and bucket key formatting.
//!
//! Every metric groups records by a bucket key derived from a timestamp.
//! Keys of one granularity sort as strings in the same order as the periods
//! they name:
//!
//! | Interval    | Format      | Example      |
//! |-------------|-------------|--------------|
//! | `daily`     | `YYYY-MM-DD`| `2024-03-09` |
//! | `monthly`   | `YYYY-MM`   | `2024-03`    |
//! | `quarterly` | `YYYY-Qn`   | `2024-Q1`    |
//! | `yearly`    | `YYYY`      | `2024`       |
//!
//! Keys are computed in UTC.

use core::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Granularity of a time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl Interval {
    /// Resolve the `interval` query parameter.
    ///
    /// A missing or empty value means `Monthly`. Any value other than the four
    /// known names is not rejected: it falls back to `Daily` formatting.
    ///
    /// ```
    /// use shopmetrics_core::Interval;
    ///
    /// assert_eq!(Interval::from_query(None), Interval::Monthly);
    /// assert_eq!(Interval::from_query(Some("")), Interval::Monthly);
    /// assert_eq!(Interval::from_query(Some("yearly")), Interval::Yearly);
    /// assert_eq!(Interval::from_query(Some("weekly")), Interval::Daily);
    /// ```
    #[must_use]
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => Self::Monthly,
            Some(value) => Self::from_name(value).unwrap_or(Self::Daily),
        }
    }

    /// Match one of the four interval names exactly.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "daily" => Some(Self::Daily),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }

    /// Lowercase name as used in the query string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Format the bucket key for a timestamp at this granularity.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use shopmetrics_core::Interval;
    ///
    /// let ts = Utc.with_ymd_and_hms(2024, 8, 31, 23, 59, 59).unwrap();
    /// assert_eq!(Interval::Daily.bucket_key(ts), "2024-08-31");
    /// assert_eq!(Interval::Monthly.bucket_key(ts), "2024-08");
    /// assert_eq!(Interval::Quarterly.bucket_key(ts), "2024-Q3");
    /// assert_eq!(Interval::Yearly.bucket_key(ts), "2024");
    /// ```
    #[must_use]
    pub fn bucket_key(&self, timestamp: DateTime<Utc>) -> String {
        match self {
            Self::Daily => timestamp.format("%Y-%m-%d").to_string(),
            Self::Monthly => timestamp.format("%Y-%m").to_string(),
            Self::Quarterly => {
                let quarter = timestamp.month().div_ceil(3);
                format!("{:04}-Q{quarter}", timestamp.year())
            }
            Self::Yearly => timestamp.format("%Y").to_string(),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-function form of [`Interval::bucket_key`].
#[must_use]
pub fn bucket_key(timestamp: DateTime<Utc>, interval: Interval) -> String {
    interval.bucket_key(timestamp)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    const ALL: [Interval; 4] = [
        Interval::Daily,
        Interval::Monthly,
        Interval::Quarterly,
        Interval::Yearly,
    ];

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_quarter_boundaries() {
        let expected = [
            (1, "Q1"),
            (2, "Q1"),
            (3, "Q1"),
            (4, "Q2"),
            (5, "Q2"),
            (6, "Q2"),
            (7, "Q3"),
            (8, "Q3"),
            (9, "Q3"),
            (10, "Q4"),
            (11, "Q4"),
            (12, "Q4"),
        ];
        for (month, quarter) in expected {
            let key = Interval::Quarterly.bucket_key(at(2023, month, 1));
            assert_eq!(key, format!("2023-{quarter}"), "month {month}");
        }
    }

    #[test]
    fn test_bucket_key_uses_utc_date() {
        let late = Utc.with_ymd_and_hms(2023, 12, 31, 23, 30, 0).unwrap();
        assert_eq!(Interval::Daily.bucket_key(late), "2023-12-31");
        assert_eq!(Interval::Yearly.bucket_key(late), "2023");

        let next = late + Duration::hours(1);
        assert_eq!(Interval::Daily.bucket_key(next), "2024-01-01");
        assert_eq!(Interval::Quarterly.bucket_key(next), "2024-Q1");
    }

    #[test]
    fn test_bucket_keys_are_monotonic() {
        // Walk two years in 13-hour steps so every granularity crosses boundaries.
        let start = at(2022, 11, 15);
        let timestamps: Vec<_> = (0..1400).map(|i| start + Duration::hours(13 * i)).collect();

        for interval in ALL {
            for pair in timestamps.windows(2) {
                let [earlier, later] = pair else { continue };
                let a = interval.bucket_key(*earlier);
                let b = interval.bucket_key(*later);
                assert!(a <= b, "{interval}: {a} > {b}");
            }
        }
    }

    #[test]
    fn test_distinct_periods_give_distinct_keys() {
        assert_ne!(
            Interval::Monthly.bucket_key(at(2024, 1, 31)),
            Interval::Monthly.bucket_key(at(2024, 2, 1))
        );
        assert_eq!(
            Interval::Quarterly.bucket_key(at(2024, 4, 1)),
            Interval::Quarterly.bucket_key(at(2024, 6, 30))
        );
    }

    #[test]
    fn test_from_query_fallbacks() {
        assert_eq!(Interval::from_query(None), Interval::Monthly);
        assert_eq!(Interval::from_query(Some("")), Interval::Monthly);
        assert_eq!(Interval::from_query(Some("daily")), Interval::Daily);
        assert_eq!(Interval::from_query(Some("quarterly")), Interval::Quarterly);
        assert_eq!(Interval::from_query(Some("Monthly")), Interval::Daily);
        assert_eq!(Interval::from_query(Some("hourly")), Interval::Daily);
    }

    #[test]
    fn test_display_matches_query_name() {
        for interval in ALL {
            assert_eq!(Interval::from_name(&interval.to_string()), Some(interval));
        }
    }
}
