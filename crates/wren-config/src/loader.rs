// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-based layered loading.
//!
//! Merge order, later wins: compiled defaults, `/etc/wren/wren.toml`,
//! `~/.config/wren/wren.toml`, `./wren.toml`, then `WREN_*` variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WrenConfig;

/// Candidate config files in merge order.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/wren/wren.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("wren").join("wren.toml"));
    }
    paths.push(PathBuf::from("wren.toml"));
    paths
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<WrenConfig, figment::Error> {
    config_paths()
        .into_iter()
        .fold(defaults(), |figment, path| figment.merge(Toml::file(path)))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<WrenConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

/// Load configuration from one file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WrenConfig, figment::Error> {
    defaults()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

fn defaults() -> Figment {
    Figment::new().merge(Serialized::defaults(WrenConfig::default()))
}

/// `WREN_AGENT__MAX_ITERATIONS=5` maps to `agent.max_iterations`.
///
/// A double underscore separates sections so single underscores inside key
/// names survive.
fn env_provider() -> Env {
    Env::prefixed("WREN_").split("__")
}
