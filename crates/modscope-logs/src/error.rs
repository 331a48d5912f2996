use modscope_types::PodInfo;

/// Any failure that aborts a log scan
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to list pods matching {selector:?}")]
    ListPods {
        selector: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to open log stream for pod {pod}")]
    OpenStream {
        pod: PodInfo,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to read log stream for pod {pod}")]
    ReadStream {
        pod: PodInfo,
        #[source]
        source: std::io::Error,
    },

    /// A line carried the WAF marker but is not a valid transaction record
    #[error("malformed WAF log line {line_number} in pod {pod}")]
    Decode {
        pod: PodInfo,
        line_number: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid timestamp {value:?} on line {line_number} in pod {pod}")]
    Timestamp {
        pod: PodInfo,
        line_number: u64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
