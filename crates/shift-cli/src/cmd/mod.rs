pub mod config;
pub mod optimize;
pub mod plan;
pub mod request;

use crate::scenario::Scenario;
use anyhow::Context;
use shift_core::config::Config;
use shift_core::Coordinator;
use std::path::Path;

/// Loads `path` when given, otherwise falls back to built-in defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::load(p).with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(Config::default()),
    }
}

pub fn load_scenario(config: &Config, path: &Path) -> anyhow::Result<Coordinator> {
    Scenario::load(path)?.build(config)
}
