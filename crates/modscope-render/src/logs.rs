use chrono::Local;
use tabled::Tabled;
use tracing::warn;

use modscope_types::{TransactionRecord, parse_timestamp};

use crate::table::{render_rows, truncate};

/// URI column width when none is configured
pub const DEFAULT_MAX_URI: usize = 30;

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Client IP")]
    client_ip: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "URI")]
    uri: String,
    #[tabled(rename = "Code")]
    code: u16,
    #[tabled(rename = "Secrules")]
    secrules: String,
    #[tabled(rename = "Rule IDs")]
    rule_ids: String,
}

/// Options for the log table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableOptions {
    /// URIs longer than this are cut and suffixed with `...`
    pub max_uri: usize,

    /// Show each rule with its matched data, including the anomaly score rule
    pub details: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            max_uri: DEFAULT_MAX_URI,
            details: false,
        }
    }
}

/// Records in presentation order.
///
/// Timestamps are compared as instants. Unparseable ones go last, ordered by
/// raw text. Equal keys keep collection order.
pub fn sorted_records(records: &[TransactionRecord]) -> Vec<&TransactionRecord> {
    let mut sorted: Vec<_> = records.iter().collect();
    sorted.sort_by_cached_key(|record| {
        let parsed = record.parsed_timestamp().ok();
        (parsed.is_none(), parsed, record.timestamp().to_string())
    });
    sorted
}

/// JSON array of records using the log field names, newline terminated
pub fn render_json(records: &[TransactionRecord]) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string(&sorted_records(records))?;
    out.push('\n');
    Ok(out)
}

/// Fixed-column text table
pub fn render_table(records: &[TransactionRecord], options: &TableOptions) -> String {
    let rows = sorted_records(records).into_iter().map(|record| {
        let tx = &record.transaction;
        LogRow {
            timestamp: format_timestamp(&tx.timestamp),
            host: record.host().to_string(),
            client_ip: tx.client_ip.clone(),
            method: tx.request.method.clone(),
            uri: truncate(&tx.request.uri, options.max_uri).into_owned(),
            code: tx.response.http_code,
            secrules: record.secrules_engine().unwrap_or_default().to_string(),
            rule_ids: rule_ids(record, options.details),
        }
    });

    render_rows(rows)
}

/// `YYYY-MM-DD_HH:MM:SS` in local time, or the raw text if it does not parse
fn format_timestamp(raw: &str) -> String {
    match parse_timestamp(raw) {
        Ok(ts) => ts.with_timezone(&Local).format("%Y-%m-%d_%H:%M:%S").to_string(),
        Err(e) => {
            warn!(timestamp = raw, error = %e, "unparseable timestamp, printing as is");
            raw.to_string()
        }
    }
}

fn rule_ids(record: &TransactionRecord, details: bool) -> String {
    record
        .messages()
        .iter()
        .map(|m| &m.details)
        .filter(|d| details || !d.is_informational())
        .map(|d| {
            if details {
                format!("{} - {:?}", d.rule_id, d.data)
            } else {
                d.rule_id.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
