//! Configuration validation.
//!
//! Serde handles syntax; this module checks values: addresses parse, the
//! exporter endpoint is an http(s) URL, the route path is one the router
//! accepts. Every failure is reported, not just the first.

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    match Url::parse(&config.exporter.endpoint) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            if url.host_str().is_none() {
                errors.push(ValidationError::new("exporter.endpoint", "missing host"));
            }
        }
        Ok(url) => errors.push(ValidationError::new(
            "exporter.endpoint",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("exporter.endpoint", e.to_string())),
    }

    if config.exporter.timeout_ms == 0 {
        errors.push(ValidationError::new("exporter.timeout_ms", "must be > 0"));
    }
    if config.exporter.verify_on_startup && config.exporter.probe_timeout_ms == 0 {
        errors.push(ValidationError::new("exporter.probe_timeout_ms", "must be > 0"));
    }

    if let Err(message) = check_route_path(&config.handler.path) {
        errors.push(ValidationError::new("handler.path", message));
    }

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::new("service.name", "must not be empty"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check a route path against the router's syntax: absolute, `{name}`
/// captures with balanced braces (`{{` and `}}` escape), at most one capture
/// per segment, and a `{*name}` catch-all only as the whole last segment.
fn check_route_path(path: &str) -> Result<(), String> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err("must start with '/'".to_string());
    };

    let segments: Vec<&str> = rest.split('/').collect();
    let last = segments.len() - 1;

    for (index, segment) in segments.iter().enumerate() {
        if segment.starts_with(':') || segment.starts_with('*') {
            return Err(format!(
                "segment '{segment}' uses ':' or '*' captures; write '{{name}}' or '{{*name}}'"
            ));
        }

        let mut captures = 0;
        let mut chars = segment.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(format!("nested '{{' in segment '{segment}'")),
                            _ => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(format!("unclosed '{{' in segment '{segment}'"));
                    }

                    captures += 1;
                    if captures > 1 {
                        return Err(format!("more than one capture in segment '{segment}'"));
                    }

                    if name.is_empty() || name == "*" {
                        return Err(format!("empty capture name in segment '{segment}'"));
                    }
                    let whole_segment = segment.len() == name.len() + 2;
                    if name.starts_with('*') && (index != last || !whole_segment) {
                        return Err(format!(
                            "catch-all '{{{name}}}' must be the whole last segment"
                        ));
                    }
                }
                '}' => return Err(format!("unmatched '}}' in segment '{segment}'")),
                _ => {}
            }
        }
    }

    Ok(())
}
