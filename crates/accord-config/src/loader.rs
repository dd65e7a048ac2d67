// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./accord.toml` > `~/.config/accord/accord.toml` >
//! `/etc/accord/accord.toml`, with `ACCORD_*` environment overrides on top.

// figment::Error is external and cannot be boxed without a wrapper.
#![allow(clippy::result_large_err)]

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AccordConfig;

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/accord/accord.toml`
/// 3. `~/.config/accord/accord.toml`
/// 4. `./accord.toml`
/// 5. `ACCORD_*` environment variables
pub fn load_config() -> Result<AccordConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the defaults. No env, no files.
pub fn load_config_from_str(toml_content: &str) -> Result<AccordConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AccordConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AccordConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AccordConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AccordConfig::default()))
        .merge(Toml::file("/etc/accord/accord.toml"))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file("accord.toml"))
        .merge(env_provider())
}

/// `~/.config/accord/accord.toml` on Linux, the platform equivalent elsewhere.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("accord/accord.toml"))
}

/// Maps `ACCORD_STORAGE_DATABASE_PATH` to `storage.database_path`.
///
/// Only the section prefix is rewritten; splitting on every `_` would break
/// keys such as `database_path`.
fn env_provider() -> Env {
    Env::prefixed("ACCORD_").map(|key| {
        key.as_str()
            .to_ascii_lowercase()
            .replacen("log_", "log.", 1)
            .replacen("storage_", "storage.", 1)
            .into()
    })
}
