use tabled::Tabled;

use modscope_types::IngressSnippet;

use crate::table::{render_rows, truncate};

/// Snippet line width when none is configured
pub const DEFAULT_MAX_SNIPPET: usize = 50;

#[derive(Tabled)]
struct SnippetRow<'a> {
    #[tabled(rename = "Namespace")]
    namespace: &'a str,
    #[tabled(rename = "Ingress")]
    name: &'a str,
    #[tabled(rename = "Hosts")]
    hosts: String,
    #[tabled(rename = "ModsecSnippet")]
    snippet: String,
}

/// JSON array of snippet entries with hosts and paths, newline terminated
pub fn render_snippets_json(entries: &[IngressSnippet]) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string(entries)?;
    out.push('\n');
    Ok(out)
}

/// One row per Ingress; each snippet line is cut to `max_line` characters
pub fn render_snippets_table(entries: &[IngressSnippet], max_line: usize) -> String {
    let rows = entries.iter().map(|entry| SnippetRow {
        namespace: &entry.namespace,
        name: &entry.name,
        hosts: entry.host_names().join(","),
        snippet: entry
            .snippet_lines
            .iter()
            .map(|line| truncate(line, max_line))
            .collect::<Vec<_>>()
            .join(";"),
    });

    render_rows(rows)
}

/// Background on ModSecurity in the nginx ingress controller
pub fn explain() -> &'static str {
    "\
ModSecurity and Ingress

ModSecurity is a Web Application Firewall engine that protects HTTP
applications against common attacks. It runs as a module inside a web server
such as nginx, so the nginx ingress controller can load it.

Global options live in the ConfigMap read by the ingress controller pods.
Single ingresses are configured with annotations like:

  nginx.ingress.kubernetes.io/enable-modsecurity: \"true\"
  nginx.ingress.kubernetes.io/modsecurity-snippet: |
    SecRuleEngine On
    SecDebugLog /tmp/modsec_debug.log

With SecAuditLogFormat JSON and the audit log sent to stdout, every logged
transaction shows up in the controller pod logs as a line starting with
{\"transaction\":, which is what `modscope logs` reads.
"
}
