// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./ticketbridge.toml` > `~/.config/ticketbridge/ticketbridge.toml`
//! > `/etc/ticketbridge/ticketbridge.toml`, with `TICKETBRIDGE_` environment
//! variables on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TicketbridgeConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/ticketbridge/ticketbridge.toml";
pub(crate) const USER_CONFIG_SUFFIX: &str = "ticketbridge/ticketbridge.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "ticketbridge.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ticketbridge/ticketbridge.toml`
/// 3. `~/.config/ticketbridge/ticketbridge.toml`
/// 4. `./ticketbridge.toml`
/// 5. `TICKETBRIDGE_*` environment variables
pub fn load_config() -> Result<TicketbridgeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TicketbridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TicketbridgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TicketbridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TicketbridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TicketbridgeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join(USER_CONFIG_SUFFIX))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// `Env::split("_")` would turn `TICKETBRIDGE_JIRA_API_TOKEN` into
/// `jira.api.token`; only the first underscore after the section name
/// separates section from key.
fn env_provider() -> Env {
    Env::prefixed("TICKETBRIDGE_").map(|key| {
        let key_str = key.as_str();
        let mapped = if let Some(rest) = key_str.strip_prefix("telegram_") {
            format!("telegram.{rest}")
        } else if let Some(rest) = key_str.strip_prefix("jira_") {
            format!("jira.{rest}")
        } else if let Some(rest) = key_str.strip_prefix("bridge_") {
            format!("bridge.{rest}")
        } else {
            key_str.to_string()
        };
        mapped.into()
    })
}
