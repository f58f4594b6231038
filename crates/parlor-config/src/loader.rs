// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./parlor.toml` > `~/.config/parlor/parlor.toml` > `/etc/parlor/parlor.toml`
//! with environment variable overrides via `PARLOR_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ParlorConfig;

/// Env key prefixes (lowercased, `PARLOR_` stripped) and the dotted paths they map to.
///
/// Nested sections come before their parent so `tools_weather_api_key`
/// resolves to `tools.weather.api_key` rather than `tools.weather_api_key`.
const SECTION_PREFIXES: &[(&str, &str)] = &[
    ("tools_weather_", "tools.weather."),
    ("tools_stock_", "tools.stock."),
    ("tools_race_", "tools.race."),
    ("tools_", "tools."),
    ("server_", "server."),
    ("auth_", "auth."),
    ("anthropic_", "anthropic."),
    ("chat_", "chat."),
    ("storage_", "storage."),
    ("gateway_", "gateway."),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/parlor/parlor.toml` (system-wide)
/// 3. `~/.config/parlor/parlor.toml` (user XDG config)
/// 4. `./parlor.toml` (local directory)
/// 5. `PARLOR_*` environment variables
pub fn load_config() -> Result<ParlorConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ParlorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParlorConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ParlorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParlorConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Config files in merge order, lowest precedence first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/parlor/parlor.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("parlor/parlor.toml"));
    }
    paths.push(PathBuf::from("parlor.toml"));
    paths
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    search_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(ParlorConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
///
/// Uses explicit section prefixes, not `Env::split("_")`, because key names
/// contain underscores: `PARLOR_CHAT_MAX_TOOL_ROUNDS` must become
/// `chat.max_tool_rounds`, not `chat.max.tool.rounds`.
pub fn map_env_key(key: &str) -> String {
    for (prefix, section) in SECTION_PREFIXES {
        if let Some(rest) = key.strip_prefix(prefix) {
            return format!("{section}{rest}");
        }
    }
    key.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("PARLOR_").map(|key| map_env_key(key.as_str()).into())
}
