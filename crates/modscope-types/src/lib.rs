//! Shared types for modscope
//!
//! This crate contains the WAF transaction record schema, the ingress snippet
//! entry, and the query parameters shared by the modscope crates.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Kubernetes Resource Types
// ============================================================================

/// Pod identity as returned by pod enumeration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
}

impl PodInfo {
    pub fn new(name: String, namespace: String) -> Self {
        Self { name, namespace }
    }
}

impl std::fmt::Display for PodInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// ============================================================================
// WAF Log Types
// ============================================================================

/// Every ModSecurity JSON audit line starts with this token
pub const WAF_LOG_MARKER: &str = r#"{"transaction":"#;

/// Layout of `time_stamp`, e.g. `Tue Mar 14 10:02:39 2023`
pub const TIMESTAMP_LAYOUT: &str = "%a %b %e %H:%M:%S %Y";

/// Rule 949110 only reports that the inbound anomaly score was exceeded
pub const INFORMATIONAL_RULE_ID: &str = "949110";

/// One decoded ModSecurity transaction log line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction: Transaction,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub client_ip: String,

    /// Raw timestamp, never rewritten after decode
    #[serde(rename = "time_stamp")]
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,

    pub request: Request,

    pub response: Response,

    /// Missing in older connector versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<Producer>,

    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_version: Option<f64>,

    #[serde(default)]
    pub headers: RequestHeaders,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestHeaders {
    #[serde(rename = "Host", default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub http_code: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modsecurity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrules_engine: Option<String>,
}

/// A rule that fired during the transaction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub details: MessageDetails,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageDetails {
    #[serde(rename = "ruleId")]
    pub rule_id: String,

    #[serde(default)]
    pub data: String,

    #[serde(rename = "match", default)]
    pub matched: String,

    #[serde(default)]
    pub severity: String,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
}

impl TransactionRecord {
    /// Parse the raw timestamp. ModSecurity writes it without a zone; it is read as UTC.
    pub fn parsed_timestamp(&self) -> Result<DateTime<Utc>, chrono::ParseError> {
        parse_timestamp(&self.transaction.timestamp)
    }

    pub fn timestamp(&self) -> &str {
        &self.transaction.timestamp
    }

    pub fn host(&self) -> &str {
        self.transaction
            .request
            .headers
            .host
            .as_deref()
            .unwrap_or_default()
    }

    pub fn http_code(&self) -> u16 {
        self.transaction.response.http_code
    }

    pub fn secrules_engine(&self) -> Option<&str> {
        self.transaction
            .producer
            .as_ref()
            .and_then(|p| p.secrules_engine.as_deref())
    }

    pub fn messages(&self) -> &[Message] {
        &self.transaction.messages
    }
}

impl MessageDetails {
    pub fn is_informational(&self) -> bool {
        self.rule_id == INFORMATIONAL_RULE_ID
    }
}

/// Parse a timestamp in [`TIMESTAMP_LAYOUT`] as UTC
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_LAYOUT).map(|t| t.and_utc())
}

// ============================================================================
// Ingress Types
// ============================================================================

/// Annotation carrying per-ingress ModSecurity directives
pub const MODSEC_SNIPPET_ANNOTATION: &str = "nginx.ingress.kubernetes.io/modsecurity-snippet";

/// A routing rule host and the paths served under it
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressHost {
    pub host: String,
    pub paths: Vec<String>,
}

/// ModSecurity configuration found on one Ingress
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressSnippet {
    pub namespace: String,
    pub name: String,
    pub hosts: Vec<IngressHost>,
    pub snippet_lines: Vec<String>,
}

impl IngressSnippet {
    /// Flattened host list in rule order
    pub fn host_names(&self) -> Vec<&str> {
        self.hosts.iter().map(|h| h.host.as_str()).collect()
    }
}

// ============================================================================
// Query Types
// ============================================================================

/// Label selecting the nginx ingress controller pods
pub const DEFAULT_SELECTOR: &str = "app=ingress-nginx-controller";

/// Default look-back window for log scans
pub const DEFAULT_SINCE: Duration = Duration::from_secs(24 * 60 * 60);

/// Selection criteria for one log scan
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogQuery {
    /// Pod label selector, evaluated across all namespaces
    pub selector: String,

    /// Reject records older than `now - since`
    pub since: Option<Duration>,

    /// Keep only records with this response code
    pub code: Option<u16>,
}

impl LogQuery {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            since: None,
            code: None,
        }
    }

    /// A zero duration disables the time window
    pub fn with_since(mut self, since: Duration) -> Self {
        self.since = (!since.is_zero()).then_some(since);
        self
    }

    /// Code 0 disables the response code filter
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = (code != 0).then_some(code);
        self
    }

    /// Oldest accepted timestamp relative to `now`, if a window is set
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let since = TimeDelta::from_std(self.since?).ok()?;
        now.checked_sub_signed(since)
    }
}

impl Default for LogQuery {
    fn default() -> Self {
        Self::new(DEFAULT_SELECTOR).with_since(DEFAULT_SINCE)
    }
}

// ============================================================================
// Durations
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid duration {0:?}, expected something like 90s, 5m, 3h or 1h30m")]
pub struct DurationParseError(pub String);

static DURATION_PART: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(\d+(?:\.\d+)?)(ns|us|µs|ms|s|m|h|d)").expect("valid duration regex")
});

static DURATION_FULL: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^(?:\d+(?:\.\d+)?(?:ns|us|µs|ms|s|m|h|d))+$")
        .expect("valid duration regex")
});

/// Parse a relative duration like `5s`, `2m`, `3h` or `1h30m`. A bare `0` is zero.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let s = input.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if !DURATION_FULL.is_match(s) {
        return Err(DurationParseError(input.to_string()));
    }

    let mut secs = 0.0_f64;
    for caps in DURATION_PART.captures_iter(s) {
        let value: f64 = caps[1]
            .parse()
            .map_err(|_| DurationParseError(input.to_string()))?;
        let unit = match &caps[2] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => 86400.0,
        };
        secs += value * unit;
    }

    Duration::try_from_secs_f64(secs).map_err(|_| DurationParseError(input.to_string()))
}
