// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./ostra.toml` > `~/.config/ostra/ostra.toml` >
//! `/etc/ostra/ostra.toml` with environment variable overrides via the
//! `OSTRA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::OstraConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ostra/ostra.toml` (system-wide)
/// 3. `~/.config/ostra/ostra.toml` (user XDG config)
/// 4. `./ostra.toml` (local directory)
/// 5. `OSTRA_*` environment variables
pub fn load_config() -> Result<OstraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OstraConfig::default()))
        .merge(Toml::file("/etc/ostra/ostra.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("ostra/ostra.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("ostra.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit inline configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<OstraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OstraConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OstraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OstraConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `OSTRA_LLM_GEMINI_API_KEY` must map to
/// `llm.gemini_api_key`, not `llm.gemini.api.key`.
fn env_provider() -> Env {
    Env::prefixed("OSTRA_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("llm_", "llm.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("queue_", "queue.", 1)
            .replacen("telegram_", "telegram.", 1);
        mapped.into()
    })
}
