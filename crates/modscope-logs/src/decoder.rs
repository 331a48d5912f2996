use modscope_types::{TransactionRecord, WAF_LOG_MARKER};

/// Decoder turning raw controller log lines into transaction records
pub struct RecordDecoder;

impl RecordDecoder {
    /// Whether the raw line is a ModSecurity JSON audit entry
    pub fn is_waf_log_line(line: &[u8]) -> bool {
        line.starts_with(WAF_LOG_MARKER.as_bytes())
    }

    /// Decode a raw line.
    ///
    /// Unmarked lines (access logs, controller chatter) yield `Ok(None)`.
    /// A marked line that does not match the record schema, or is not valid
    /// UTF-8, is an error. Unmarked lines are never inspected past the marker.
    pub fn decode(line: &[u8]) -> Result<Option<TransactionRecord>, serde_json::Error> {
        if !Self::is_waf_log_line(line) {
            return Ok(None);
        }
        serde_json::from_slice(line).map(Some)
    }
}
