use modscope_types::TransactionRecord;

/// Accepted records from every scanned pod, in scan order
#[derive(Clone, Debug, Default)]
pub struct RecordCollector {
    /// Internal storage
    records: Vec<TransactionRecord>,

    /// Counters for the scan summary
    stats: ScanStats,
}

impl RecordCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an accepted record. Duplicates across pods are kept.
    pub fn push(&mut self, record: TransactionRecord) {
        self.stats.records_kept += 1;
        self.records.push(record);
    }

    /// All records collected so far
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Consume the collector, keeping only the records
    pub fn into_records(self) -> Vec<TransactionRecord> {
        self.records
    }

    /// Total record count
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing was collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut ScanStats {
        &mut self.stats
    }
}

/// Counts gathered while scanning
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub pods_scanned: usize,
    pub lines_read: u64,
    pub waf_lines: u64,
    pub records_kept: usize,
}

impl ScanStats {
    /// WAF records dropped by the time or code predicates
    pub fn records_filtered(&self) -> u64 {
        self.waf_lines.saturating_sub(self.records_kept as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(client_ip: &str) -> TransactionRecord {
        let line = format!(
            r#"{{"transaction":{{"client_ip":"{client_ip}","time_stamp":"Tue Mar 14 10:02:39 2023","request":{{"method":"GET","uri":"/"}},"response":{{"http_code":403}}}}}}"#
        );
        serde_json::from_str(&line).unwrap()
    }

    #[test]
    fn test_keeps_push_order_and_duplicates() {
        let mut collector = RecordCollector::new();
        assert!(collector.is_empty());

        collector.push(record("10.0.0.2"));
        collector.push(record("10.0.0.1"));
        collector.push(record("10.0.0.2"));

        assert_eq!(collector.len(), 3);
        let ips: Vec<_> = collector
            .records()
            .iter()
            .map(|r| r.transaction.client_ip.as_str())
            .collect();
        assert_eq!(ips, vec!["10.0.0.2", "10.0.0.1", "10.0.0.2"]);
        assert_eq!(collector.stats().records_kept, 3);
        assert_eq!(collector.into_records().len(), 3);
    }

    #[test]
    fn test_records_filtered() {
        let stats = ScanStats {
            pods_scanned: 2,
            lines_read: 40,
            waf_lines: 5,
            records_kept: 2,
        };
        assert_eq!(stats.records_filtered(), 3);
    }
}
