//! Kubernetes client for modscope

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{ListParams, LogParams};
use kube::config::KubeConfigOptions;
use kube::{Api, Resource};

use crate::source::{IngressSource, LogSource, LogStream};
use modscope_types::PodInfo;

/// Kubernetes client wrapper
pub struct KubeClient {
    client: kube::Client,
}

impl KubeClient {
    /// Connect using the given kubeconfig context, or the inferred config
    /// (current context, then in-cluster) when none is given
    pub async fn new(context: Option<&str>) -> Result<Self> {
        let config = match context {
            Some(context_name) => kube::Config::from_kubeconfig(&KubeConfigOptions {
                context: Some(context_name.to_string()),
                ..Default::default()
            })
            .await
            .context(format!(
                "Failed to create config for context: {}",
                context_name
            ))?,
            None => kube::Config::infer()
                .await
                .context("Failed to load cluster config. Is kubectl configured?")?,
        };

        let client = kube::Client::try_from(config).context("Failed to create client")?;

        Ok(Self { client })
    }
}

impl LogSource for KubeClient {
    async fn list_pods(&self, selector: &str) -> Result<Vec<PodInfo>> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let list = pods
            .list(&ListParams::default().labels(selector))
            .await
            .context(format!("Failed to list pods matching {}", selector))?;

        Ok(list
            .items
            .into_iter()
            .map(|pod| {
                PodInfo::new(
                    pod.metadata.name.unwrap_or_default(),
                    pod.metadata.namespace.unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn open_log<'a>(&'a self, pod: &PodInfo) -> Result<LogStream<'a>> {
        // Build the request by hand so the stream only borrows the client
        let url = Pod::url_path(&(), Some(pod.namespace.as_str()));
        let request = kube::core::Request::new(url)
            .logs(&pod.name, &LogParams::default())
            .context(format!("Failed to build log request for pod {}", pod))?;

        let stream = self
            .client
            .request_stream(request)
            .await
            .context(format!("Failed to open log stream for pod {}", pod))?;

        Ok(Box::pin(stream))
    }
}

impl IngressSource for KubeClient {
    async fn list_ingresses(&self) -> Result<Vec<Ingress>> {
        let ingresses: Api<Ingress> = Api::all(self.client.clone());
        let list = ingresses
            .list(&ListParams::default())
            .await
            .context("Failed to list ingresses")?;

        Ok(list.items)
    }
}
