//! Configuration loading from disk and environment.
//!
//! Precedence, lowest to highest: built-in defaults, the optional TOML file,
//! environment variables.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Listening port.
pub const ENV_PORT: &str = "PORT";
/// Port that appears in proxy-visible URLs.
pub const ENV_EXT_PORT: &str = "EXT_PORT";
/// Upstream base URL.
pub const ENV_CLONE_URL: &str = "CLONE_URL";
/// Trusted proxy setting.
pub const ENV_TRUST_PROXY: &str = "TRUST_PROXY_IPS";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => write!(f, "Invalid value for {}: {:?}", var, value),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file plus the process environment,
/// then validate it.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-sourced values onto `config`.
///
/// `lookup` abstracts the environment so tests do not touch process state.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup(ENV_PORT) {
        config.listener.port = parse_port(ENV_PORT, port)?;
    }
    if let Some(port) = lookup(ENV_EXT_PORT) {
        config.public.external_port = Some(parse_port(ENV_EXT_PORT, port)?);
    }
    if let Some(url) = lookup(ENV_CLONE_URL) {
        config.upstream.base_url = url;
    }
    if let Some(trust) = lookup(ENV_TRUST_PROXY) {
        config.trust_proxy = trust;
    }
    Ok(())
}

fn parse_port(var: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("PORT", "4000"),
            ("EXT_PORT", "80"),
            ("CLONE_URL", "https://upstream.example"),
            ("TRUST_PROXY_IPS", "loopback"),
        ]);
        let mut config = ProxyConfig::default();
        apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.listener.port, 4000);
        assert_eq!(config.external_port(), 80);
        assert_eq!(config.upstream.base_url, "https://upstream.example");
        assert_eq!(config.trust_proxy, "loopback");
    }

    #[test]
    fn test_external_port_defaults_to_listener() {
        let vars = env(&[("PORT", "4000")]);
        let mut config = ProxyConfig::default();
        apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.external_port(), 4000);
    }

    #[test]
    fn test_bad_port() {
        let vars = env(&[("EXT_PORT", "eighty")]);
        let mut config = ProxyConfig::default();
        let err = apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "EXT_PORT", .. }));
    }

    #[test]
    fn test_toml_file() {
        let toml = r#"
            trust_proxy = "1"

            [listener]
            port = 8088

            [upstream]
            base_url = "https://upstream.example/"
            favicon_path = "/static/img/favicon32.png"

            [cache]
            max_age_secs = 60
        "#;
        let config: ProxyConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.listener.port, 8088);
        assert_eq!(config.listener.host, "127.0.0.1");
        assert_eq!(config.upstream_base(), "https://upstream.example");
        assert_eq!(config.upstream.favicon_path, "/static/img/favicon32.png");
        assert_eq!(config.upstream.default_accept_language, "en-US");
        assert_eq!(config.cache.header_value(), "public, max-age=60");
        assert!(validate_config(&config).is_ok());
    }
}
