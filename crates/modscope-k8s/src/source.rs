//! Cluster collaborators consumed by the scan pipelines
//!
//! [`KubeClient`](crate::KubeClient) implements these against a live cluster.
//! Tests implement them over in-memory data.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use futures::AsyncBufRead;
use k8s_openapi::api::networking::v1::Ingress;

use modscope_types::PodInfo;

/// A line-readable pod log. Dropping it closes the underlying stream.
pub type LogStream<'a> = Pin<Box<dyn AsyncBufRead + Send + 'a>>;

/// Pod enumeration and log streaming
pub trait LogSource {
    /// Pods matching a label selector across all namespaces
    fn list_pods(&self, selector: &str) -> impl Future<Output = Result<Vec<PodInfo>>> + Send;

    /// Open the log of one pod from its beginning
    fn open_log<'a>(
        &'a self,
        pod: &PodInfo,
    ) -> impl Future<Output = Result<LogStream<'a>>> + Send;
}

/// Ingress enumeration
pub trait IngressSource {
    /// All Ingress objects cluster-wide
    fn list_ingresses(&self) -> impl Future<Output = Result<Vec<Ingress>>> + Send;
}
