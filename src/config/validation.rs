//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check every outbound URL is absolute http(s)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::Uri;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: '{value}' is not an absolute http(s) URL")]
    InvalidUrl { field: String, value: String },

    #[error("import.deep_link_scheme: '{0}' is not a valid URI scheme")]
    InvalidScheme(String),

    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.subscription.update_interval_hours == 0 {
        errors.push(ValidationError::Zero {
            field: "subscription.update_interval_hours",
        });
    }

    if config.tables.clients_path.is_empty() {
        errors.push(ValidationError::Empty { field: "tables.clients_path" });
    }
    if config.tables.links_path.is_empty() {
        errors.push(ValidationError::Empty { field: "tables.links_path" });
    }
    if config.import.fallback_host.is_empty() {
        errors.push(ValidationError::Empty { field: "import.fallback_host" });
    }

    if let Some(upstream) = &config.subscription.upstream {
        let ok = upstream
            .parse::<Uri>()
            .map(|uri| uri.scheme_str() == Some("http") && uri.authority().is_some())
            .unwrap_or(false);
        if !ok {
            errors.push(ValidationError::InvalidUrl {
                field: "subscription.upstream".to_string(),
                value: upstream.clone(),
            });
        }
    }

    let scheme = &config.import.deep_link_scheme;
    let scheme_ok = scheme.starts_with(|c: char| c.is_ascii_lowercase())
        && scheme
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '.' | '-'));
    if !scheme_ok {
        errors.push(ValidationError::InvalidScheme(scheme.clone()));
    }

    let sub = &config.subscription;
    let import = &config.import;
    let mut urls: Vec<(String, &str)> = vec![
        ("subscription.announce_url".to_string(), sub.announce_url.as_str()),
        ("subscription.support_url".to_string(), sub.support_url.as_str()),
        ("subscription.web_page_url".to_string(), sub.web_page_url.as_str()),
        ("import.support_chat_url".to_string(), import.support_chat_url.as_str()),
        ("import.happ_generator_url".to_string(), import.happ_generator_url.as_str()),
    ];
    urls.extend(
        import
            .stores
            .entries()
            .into_iter()
            .map(|(name, url)| (format!("import.stores.{name}"), url)),
    );
    for (field, value) in urls {
        if !is_web_url(value) {
            errors.push(ValidationError::InvalidUrl {
                field,
                value: value.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn is_web_url(value: &str) -> bool {
    value
        .parse::<Uri>()
        .map(|uri| matches!(uri.scheme_str(), Some("http" | "https")) && uri.authority().is_some())
        .unwrap_or(false)
}
