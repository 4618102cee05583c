//! Plan defaults loading
//!
//! Layers, lowest priority first:
//! 1. built-in `PlanDefaults::default()`
//! 2. optional TOML file (`--config` / `PRIVEXEC_CONFIG`)
//! 3. `PRIVEXEC_*` environment variables (e.g. `PRIVEXEC_ENFORCEMENT=in_process`)

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::path::Path;

use privexec_core::domain::PlanDefaults;

const ENV_PREFIX: &str = "PRIVEXEC";

/// Load plan defaults
///
/// `env` overrides the process environment as the variable source (tests only).
pub fn load_defaults(
    file: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> Result<PlanDefaults> {
    let mut builder = Config::builder();

    if let Some(path) = file {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(env),
    );

    let defaults: PlanDefaults = builder
        .build()
        .context("Failed to load configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    if defaults.default_deadline_secs == 0 || defaults.deadline_hard_cap_secs == 0 {
        anyhow::bail!("default_deadline_secs and deadline_hard_cap_secs must be positive");
    }

    tracing::debug!(defaults = ?defaults, "Plan defaults loaded");

    Ok(defaults)
}
