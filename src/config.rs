//! Runtime configuration, read from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `ORDER_SPAN_LABEL` | `create order` | label of the per-invocation time span |
//! | `ORDER_STORE_BUFFER` | `32` | request queue size of each store actor |
//! | `RUST_LOG` | `info` | log filter |

use std::env;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub span_label: String,
    pub store_buffer: usize,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            span_label: "create order".to_string(),
            store_buffer: 32,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the process environment, falling back to [`Default`] for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let store_buffer = match lookup("ORDER_STORE_BUFFER") {
            None => defaults.store_buffer,
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        name: "ORDER_STORE_BUFFER",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            span_label: lookup("ORDER_SPAN_LABEL").unwrap_or(defaults.span_label),
            store_buffer,
            log_filter: lookup("RUST_LOG").unwrap_or(defaults.log_filter),
        })
    }

    pub fn with_span_label(mut self, label: impl Into<String>) -> Self {
        self.span_label = label.into();
        self
    }

    pub fn with_store_buffer(mut self, buffer: usize) -> Self {
        self.store_buffer = buffer;
        self
    }
}
