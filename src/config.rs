//! Optional settings file
//!
//! Read from `$MODSCOPE_CONFIG`, or `<config dir>/modscope/config.toml`.
//! Command line flags take precedence over anything set here.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable overriding the settings file location
const CONFIG_ENV: &str = "MODSCOPE_CONFIG";

#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Kubeconfig context to use instead of the current one
    pub context: Option<String>,

    /// Label selector for the ingress controller pods
    pub selector: Option<String>,

    /// Default look-back window, e.g. "6h"
    pub since: Option<String>,

    /// URI column width in the log table
    pub max_uri: Option<usize>,

    /// Snippet line width in the snippet table
    pub max_snippet: Option<usize>,
}

impl Config {
    /// Get the settings file path
    fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        let dir = dirs::config_dir()?;
        Some(dir.join("modscope").join("config.toml"))
    }

    /// Load the settings file. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .context(format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content).context(format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
context = "prod-eu"
selector = "app.kubernetes.io/name=ingress-nginx"
since = "6h"
max_uri = 60
max_snippet = 80
"#,
        )
        .unwrap();

        assert_eq!(config.context.as_deref(), Some("prod-eu"));
        assert_eq!(
            config.selector.as_deref(),
            Some("app.kubernetes.io/name=ingress-nginx")
        );
        assert_eq!(config.since.as_deref(), Some("6h"));
        assert_eq!(config.max_uri, Some(60));
        assert_eq!(config.max_snippet, Some(80));
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(Config::from_toml("selectr = \"app=x\"").is_err());
        assert!(Config::from_toml("max_uri = \"wide\"").is_err());
    }
}
