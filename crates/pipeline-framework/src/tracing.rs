//! # Log Setup
//!
//! Structured logging for pipelines and the services built on them. Every invocation runs inside
//! a `use_case` span, so hook, guard, and stage logs nest under the use case that produced them:
//!
//! ```text
//! INFO use_case{name="create order"}: Use case completed
//! WARN use_case{name="create order"}: Cleanup hook failed hook="SpanHook" phase=on_finally
//! ```
//!
//! Stage transitions and individual hook calls are logged at `debug`; cleanup failures at
//! `warn`; leaked guards at `error`.

use tracing_subscriber::EnvFilter;

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

/// Like [`setup_tracing`], but falls back to `default_filter` when `RUST_LOG` is unset or
/// invalid. Safe to call more than once; later calls are ignored.
pub fn setup_tracing_with_default(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
