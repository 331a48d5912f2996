//! Kubernetes client for modscope
//!
//! This crate provides the cluster collaborators used by the scan pipelines:
//! pod enumeration, pod log streaming and Ingress listing, plus extraction of
//! ModSecurity snippets from Ingress annotations.

mod client;
mod snippets;
mod source;

pub use client::KubeClient;
pub use snippets::{clean_snippet, fetch_snippets, snippet_from_ingress};
pub use source::{IngressSource, LogSource, LogStream};

// Re-export types that are used in our public API
pub use k8s_openapi::api::networking::v1::Ingress;
pub use modscope_types::{IngressHost, IngressSnippet, PodInfo};
