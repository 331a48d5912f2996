//! WAF log processing for modscope
//!
//! This crate decodes ModSecurity records out of ingress controller logs,
//! filters them and collects them across pods.

mod collector;
mod decoder;
mod error;
mod filter;
mod scanner;

pub use collector::{RecordCollector, ScanStats};
pub use decoder::RecordDecoder;
pub use error::ScanError;
pub use filter::RecordFilter;
pub use scanner::LogScanner;

// Re-export types used in our public API
pub use modscope_types::{LogQuery, TransactionRecord};
