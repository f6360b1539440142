use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Search service base URL. Overridden by `ES_ENDPOINT` when set.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_index")]
    pub index: String,
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    #[serde(default = "default_max_hits")]
    pub max_hits: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            index: default_index(),
            fields: default_fields(),
            max_hits: default_max_hits(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_index() -> String {
    "general-rules-pdf".to_string()
}
fn default_fields() -> Vec<String> {
    vec!["content".to_string()]
}
fn default_max_hits() -> usize {
    3
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind address. The port part is overridden by `PORT` when set.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Config {
    /// Search endpoint after applying the `ES_ENDPOINT` environment override.
    pub fn search_endpoint(&self) -> Result<String> {
        if let Ok(ep) = std::env::var("ES_ENDPOINT") {
            if !ep.trim().is_empty() {
                return Ok(ep.trim().to_string());
            }
        }
        self.search.endpoint.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "Search endpoint not set. Set [search].endpoint in config or the ES_ENDPOINT environment variable."
            )
        })
    }

    /// Bind address after applying the `PORT` environment override.
    pub fn bind_addr(&self) -> String {
        match std::env::var("PORT") {
            Ok(port) if !port.trim().is_empty() => {
                let bind = &self.server.bind;
                // Keep a bracketed IPv6 host intact; only strip a trailing
                // `:port` that sits outside the brackets.
                let host = match bind.rfind(':') {
                    Some(pos) if !bind[pos..].contains(']') => &bind[..pos],
                    _ => bind.as_str(),
                };
                format!("{}:{}", host, port.trim())
            }
            _ => self.server.bind.clone(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

/// Load the config file if it exists, otherwise fall back to defaults.
///
/// API keys and the search endpoint can come entirely from the environment,
/// so a missing config file is not an error for any command.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.search.max_hits < 1 {
        anyhow::bail!("search.max_hits must be >= 1");
    }

    if config.search.fields.is_empty() {
        anyhow::bail!("search.fields must not be empty");
    }

    if config.search.index.trim().is_empty() {
        anyhow::bail!("search.index must not be empty");
    }

    if config.completion.model.trim().is_empty() {
        anyhow::bail!("completion.model must not be empty");
    }

    if let Some(t) = config.completion.temperature {
        if !(0.0..=2.0).contains(&t) {
            anyhow::bail!("completion.temperature must be in [0.0, 2.0]");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.search.index, "general-rules-pdf");
        assert_eq!(config.search.fields, vec!["content".to_string()]);
        assert_eq!(config.search.max_hits, 3);
        assert_eq!(config.completion.model, "gpt-3.5-turbo");
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn empty_toml_parses_to_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.search.max_hits, 3);
        assert_eq!(config.completion.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn load_config_reads_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[search]
endpoint = "https://es.example.com"
index = "handbook"
max_hits = 5

[completion]
model = "gpt-4o-mini"
temperature = 0.2

[server]
bind = "0.0.0.0:9000"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config.search.endpoint.as_deref(),
            Some("https://es.example.com")
        );
        assert_eq!(config.search.index, "handbook");
        assert_eq!(config.search.max_hits, 5);
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.completion.temperature, Some(0.2));
        assert_eq!(config.server.bind, "0.0.0.0:9000");
    }

    #[test]
    fn rejects_zero_max_hits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[search]\nmax_hits = 0\n").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[completion]\ntemperature = 3.5\n").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn port_env_overrides_bind_port() {
        // Single test mutating PORT so parallel tests never race on it.
        let mut config = Config::default();

        std::env::set_var("PORT", "9000");
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");

        config.server.bind = "0.0.0.0:8080".to_string();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");

        config.server.bind = "[::1]:8080".to_string();
        assert_eq!(config.bind_addr(), "[::1]:9000");

        config.server.bind = "[::1]".to_string();
        assert_eq!(config.bind_addr(), "[::1]:9000");

        std::env::remove_var("PORT");
        config.server.bind = "127.0.0.1:8080".to_string();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn load_or_default_tolerates_missing_file() {
        let config = load_or_default(Path::new("/nonexistent/ragline.toml")).unwrap();
        assert_eq!(config.search.max_hits, 3);
    }
}
