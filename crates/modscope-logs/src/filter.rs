use chrono::{DateTime, Utc};

use modscope_types::{LogQuery, TransactionRecord};

/// Time window and response code predicates, fixed for one scan
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordFilter {
    /// Records stamped before this instant are rejected
    cutoff: Option<DateTime<Utc>>,

    /// Response code to keep (None = all)
    code: Option<u16>,
}

impl RecordFilter {
    /// Resolve a query against the current time
    pub fn new(query: &LogQuery, now: DateTime<Utc>) -> Self {
        Self {
            cutoff: query.cutoff(now),
            code: query.code,
        }
    }

    /// Check a decoded record.
    ///
    /// The timestamp is always parsed, so a record with an unreadable
    /// timestamp is an error even when no time window is set.
    pub fn matches(&self, record: &TransactionRecord) -> Result<bool, chrono::ParseError> {
        let timestamp = record.parsed_timestamp()?;

        if let Some(cutoff) = self.cutoff {
            if timestamp < cutoff {
                return Ok(false);
            }
        }

        if let Some(code) = self.code {
            if record.http_code() != code {
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.cutoff
    }

    pub fn code(&self) -> Option<u16> {
        self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use modscope_types::TIMESTAMP_LAYOUT;
    use std::time::Duration;

    fn record_at(timestamp: &str, code: u16) -> TransactionRecord {
        let line = format!(
            r#"{{"transaction":{{"client_ip":"10.0.0.1","time_stamp":"{timestamp}","request":{{"method":"GET","uri":"/"}},"response":{{"http_code":{code}}}}}}}"#
        );
        serde_json::from_str(&line).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 3, 14, 12, 0, 0).unwrap()
    }

    fn aged(age: TimeDelta, code: u16) -> TransactionRecord {
        let stamp = (now() - age).format(TIMESTAMP_LAYOUT).to_string();
        record_at(&stamp, code)
    }

    fn within(minutes: u64) -> RecordFilter {
        let query = LogQuery::new("").with_since(Duration::from_secs(minutes * 60));
        RecordFilter::new(&query, now())
    }

    #[test]
    fn test_since_window_boundaries() {
        let record = aged(TimeDelta::minutes(10), 200);

        assert!(within(11).matches(&record).unwrap());
        assert!(!within(9).matches(&record).unwrap());
        // Exactly at the cutoff is kept
        assert!(within(10).matches(&record).unwrap());
    }

    #[test]
    fn test_no_window_keeps_old_records() {
        let filter = RecordFilter::new(&LogQuery::new(""), now());
        assert_eq!(filter.cutoff(), None);
        assert!(filter.matches(&aged(TimeDelta::days(400), 200)).unwrap());
    }

    #[test]
    fn test_code_filter() {
        let filter = RecordFilter::new(&LogQuery::new("").with_code(403), now());
        assert_eq!(filter.code(), Some(403));
        assert!(filter.matches(&aged(TimeDelta::minutes(1), 403)).unwrap());
        assert!(!filter.matches(&aged(TimeDelta::minutes(1), 200)).unwrap());

        let disabled = RecordFilter::new(&LogQuery::new("").with_code(0), now());
        assert!(disabled.matches(&aged(TimeDelta::minutes(1), 403)).unwrap());
        assert!(disabled.matches(&aged(TimeDelta::minutes(1), 200)).unwrap());
    }

    #[test]
    fn test_time_window_applies_before_code() {
        let filter = RecordFilter::new(
            &LogQuery::new("")
                .with_since(Duration::from_secs(60))
                .with_code(403),
            now(),
        );
        assert!(!filter.matches(&aged(TimeDelta::hours(2), 403)).unwrap());
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let filter = RecordFilter::new(&LogQuery::new(""), now());
        assert!(filter.matches(&record_at("2023-03-14T10:02:39Z", 200)).is_err());
    }
}
