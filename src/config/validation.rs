//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Upstream base must be an absolute http(s) URL with a host
//! - Trust proxy setting must parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use url::Url;

use crate::config::schema::ProxyConfig;
use crate::security::trust::TrustProxy;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstream.base_url.trim().is_empty() {
        errors.push(ValidationError::new("upstream.base_url", "must be set (CLONE_URL)"));
    } else {
        match Url::parse(config.upstream_base()) {
            Ok(url) if !matches!(url.scheme(), "http" | "https") => {
                errors.push(ValidationError::new("upstream.base_url", "scheme must be http or https"));
            }
            Ok(url) if url.host_str().is_none() => {
                errors.push(ValidationError::new("upstream.base_url", "must include a host"));
            }
            Ok(url) if url.query().is_some() || url.fragment().is_some() => {
                errors.push(ValidationError::new("upstream.base_url", "must not carry a query or fragment"));
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
        }
    }

    if !config.upstream.favicon_path.starts_with('/') {
        errors.push(ValidationError::new("upstream.favicon_path", "must start with '/'"));
    }

    if let Err(e) = config.trust_proxy.parse::<TrustProxy>() {
        errors.push(ValidationError::new("trust_proxy", e.to_string()));
    }

    let timeouts = &config.timeouts;
    if timeouts.request_secs == 0 || timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts", "must be greater than zero"));
    } else if timeouts.request_secs <= timeouts.upstream_secs {
        // Otherwise the request timeout answers 408 before the upstream error surfaces.
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than timeouts.upstream_secs",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
