// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! [`validate_config`] checks values that are wrong whatever the command;
//! [`validate_for_serve`] additionally requires the credentials the bridge
//! needs to run. Both collect every error instead of failing fast.

use crate::diagnostic::ConfigError;
use crate::model::TicketbridgeConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &TicketbridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let bridge = &config.bridge;

    for (name, value) in [
        ("bridge.workers", bridge.workers as u64),
        ("bridge.queue_capacity", bridge.queue_capacity as u64),
        ("bridge.poll_interval_secs", bridge.poll_interval_secs),
        ("bridge.media_group_debounce_ms", bridge.media_group_debounce_ms),
        ("bridge.history_limit", bridge.history_limit as u64),
        ("jira.request_timeout_secs", config.jira.request_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{name} must be at least 1"),
            });
        }
    }

    if bridge.terminal_statuses.iter().all(|s| s.trim().is_empty()) {
        errors.push(ConfigError::Validation {
            message: "bridge.terminal_statuses must name at least one status".to_string(),
        });
    }

    if let Some(url) = config.jira.base_url.as_deref()
        && !(url.starts_with("https://") || url.starts_with("http://"))
    {
        errors.push(ConfigError::Validation {
            message: format!("jira.base_url `{url}` must start with http:// or https://"),
        });
    }

    if let Some(key) = config.jira.project_key.as_deref()
        && !is_valid_project_key(key)
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "jira.project_key `{key}` must be letters, digits or underscores, starting with a letter"
            ),
        });
    }

    if let Some(aggregate) = config.jira.aggregate_issue_key.as_deref()
        && !aggregate.contains('-')
    {
        errors.push(ConfigError::Validation {
            message: format!("jira.aggregate_issue_key `{aggregate}` is not an issue key"),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate everything `serve` needs on top of [`validate_config`].
pub fn validate_for_serve(config: &TicketbridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = validate_config(config).err().unwrap_or_default();

    let required = [
        ("telegram.bot_token", &config.telegram.bot_token),
        ("jira.base_url", &config.jira.base_url),
        ("jira.email", &config.jira.email),
        ("jira.api_token", &config.jira.api_token),
        ("jira.project_key", &config.jira.project_key),
    ];
    for (key, value) in required {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            errors.push(ConfigError::missing(key));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_project_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
