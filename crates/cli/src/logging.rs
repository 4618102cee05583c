//! Logging setup
//!
//! Logs go to stderr so stdout carries only the child's output.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `privexec=info`)
//! - `PRIVEXEC_LOG_FORMAT`: `pretty` (default) or `json`

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "privexec=info";

pub fn init_logging() {
    let log_format = std::env::var("PRIVEXEC_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
