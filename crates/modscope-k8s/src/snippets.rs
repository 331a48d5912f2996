use anyhow::Result;
use k8s_openapi::api::networking::v1::Ingress;
use tracing::debug;

use modscope_types::{IngressHost, IngressSnippet, MODSEC_SNIPPET_ANNOTATION};

use crate::source::IngressSource;

/// Collect the ModSecurity snippet of every Ingress in the cluster
pub async fn fetch_snippets<S: IngressSource>(source: &S) -> Result<Vec<IngressSnippet>> {
    let ingresses = source.list_ingresses().await?;
    debug!(count = ingresses.len(), "listed ingresses");

    Ok(ingresses.iter().map(snippet_from_ingress).collect())
}

/// Extract hosts, paths and cleaned snippet lines from one Ingress
pub fn snippet_from_ingress(ingress: &Ingress) -> IngressSnippet {
    let hosts = ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_ref())
        .map(|rules| {
            rules
                .iter()
                .map(|rule| IngressHost {
                    host: rule.host.clone().unwrap_or_default(),
                    paths: rule
                        .http
                        .as_ref()
                        .map(|http| {
                            http.paths
                                .iter()
                                .map(|p| p.path.clone().unwrap_or_default())
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    // BTreeMap iteration visits keys in sorted order
    let snippet_lines = ingress
        .metadata
        .annotations
        .iter()
        .flatten()
        .filter(|(key, _)| is_modsec_snippet(key))
        .flat_map(|(_, value)| clean_snippet(value))
        .collect();

    let entry = IngressSnippet {
        namespace: ingress.metadata.namespace.clone().unwrap_or_default(),
        name: ingress.metadata.name.clone().unwrap_or_default(),
        hosts,
        snippet_lines,
    };
    debug!(
        namespace = %entry.namespace,
        name = %entry.name,
        lines = entry.snippet_lines.len(),
        "extracted snippet"
    );
    entry
}

fn is_modsec_snippet(key: &str) -> bool {
    key == MODSEC_SNIPPET_ANNOTATION
}

/// Trimmed directive lines, without blanks and `#` comments
pub fn clean_snippet(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::networking::v1::{
        HTTPIngressPath, HTTPIngressRuleValue, IngressBackend, IngressRule, IngressSpec,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn rule(host: &str, paths: &[&str]) -> IngressRule {
        IngressRule {
            host: Some(host.to_string()),
            http: Some(HTTPIngressRuleValue {
                paths: paths
                    .iter()
                    .map(|p| HTTPIngressPath {
                        path: Some(p.to_string()),
                        path_type: "Prefix".to_string(),
                        backend: IngressBackend::default(),
                    })
                    .collect(),
            }),
        }
    }

    fn ingress(
        namespace: &str,
        name: &str,
        rules: Vec<IngressRule>,
        annotations: &[(&str, &str)],
    ) -> Ingress {
        Ingress {
            metadata: ObjectMeta {
                namespace: Some(namespace.to_string()),
                name: Some(name.to_string()),
                annotations: Some(
                    annotations
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<BTreeMap<_, _>>(),
                ),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                rules: Some(rules),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    struct FakeIngresses(Vec<Ingress>);

    impl IngressSource for FakeIngresses {
        async fn list_ingresses(&self) -> Result<Vec<Ingress>> {
            Ok(self.0.clone())
        }
    }

    struct FailingIngresses;

    impl IngressSource for FailingIngresses {
        async fn list_ingresses(&self) -> Result<Vec<Ingress>> {
            anyhow::bail!("forbidden: cannot list ingresses")
        }
    }

    #[test]
    fn test_clean_snippet_drops_comments_and_blanks() {
        let value = "SecRuleEngine On\n# comment\n\nSecDebugLog /tmp/x.log";
        let lines: Vec<String> = clean_snippet(value).collect();
        assert_eq!(lines, vec!["SecRuleEngine On", "SecDebugLog /tmp/x.log"]);
    }

    #[test]
    fn test_clean_snippet_trims_whitespace() {
        let value = "  SecRuleEngine DetectionOnly  \n\t  # indented comment\n   \n  SecAuditEngine On\n";
        let lines: Vec<String> = clean_snippet(value).collect();
        assert_eq!(lines, vec!["SecRuleEngine DetectionOnly", "SecAuditEngine On"]);
    }

    #[test]
    fn test_snippet_from_ingress() {
        let ing = ingress(
            "shop",
            "storefront",
            vec![rule("shop.example.com", &["/", "/api"]), rule("www.example.com", &["/"])],
            &[
                (MODSEC_SNIPPET_ANNOTATION, "SecRuleEngine On\n# keep logs\nSecAuditLogParts ABIJDEFHZ\n"),
                ("nginx.ingress.kubernetes.io/enable-modsecurity", "true"),
            ],
        );

        let entry = snippet_from_ingress(&ing);
        assert_eq!(entry.namespace, "shop");
        assert_eq!(entry.name, "storefront");
        assert_eq!(entry.host_names(), vec!["shop.example.com", "www.example.com"]);
        assert_eq!(entry.hosts[0].paths, vec!["/", "/api"]);
        assert_eq!(
            entry.snippet_lines,
            vec!["SecRuleEngine On", "SecAuditLogParts ABIJDEFHZ"]
        );
    }

    #[test]
    fn test_snippet_from_bare_ingress() {
        let entry = snippet_from_ingress(&Ingress::default());
        assert_eq!(entry, IngressSnippet::default());
    }

    #[tokio::test]
    async fn test_fetch_snippets_keeps_listing_order() {
        let source = FakeIngresses(vec![
            ingress("b", "second", vec![rule("b.example.com", &["/"])], &[]),
            ingress(
                "a",
                "first",
                vec![],
                &[(MODSEC_SNIPPET_ANNOTATION, "SecRuleEngine Off")],
            ),
        ]);

        let entries = fetch_snippets(&source).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "second");
        assert!(entries[0].snippet_lines.is_empty());
        assert_eq!(entries[1].snippet_lines, vec!["SecRuleEngine Off"]);
    }

    #[tokio::test]
    async fn test_fetch_snippets_propagates_listing_failure() {
        let err = fetch_snippets(&FailingIngresses).await.unwrap_err();
        assert!(err.to_string().contains("forbidden"));
    }
}
