// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a typo in
//! `ticketbridge.toml` fails at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};
use ticketbridge_core::status::DEFAULT_TERMINAL_STATUSES;

/// Top-level ticketbridge configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TicketbridgeConfig {
    /// Telegram bot settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Jira Cloud settings.
    #[serde(default)]
    pub jira: JiraConfig,

    /// Worker pool, polling, and retention settings.
    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl TicketbridgeConfig {
    /// Copy with secrets masked, for printing.
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "********".to_string());
        let mut copy = self.clone();
        copy.telegram.bot_token = mask(&self.telegram.bot_token);
        copy.jira.api_token = mask(&self.jira.api_token);
        copy
    }
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Emoji set on a message once it has been forwarded to Jira. Empty disables.
    #[serde(default = "default_reaction_emoji")]
    pub reaction_emoji: String,

    /// Long-polling timeout for `getUpdates`.
    #[serde(default = "default_updates_timeout_secs")]
    pub updates_timeout_secs: u32,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            reaction_emoji: default_reaction_emoji(),
            updates_timeout_secs: default_updates_timeout_secs(),
        }
    }
}

fn default_reaction_emoji() -> String {
    "👌".to_string()
}

fn default_updates_timeout_secs() -> u32 {
    60
}

/// Jira Cloud configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JiraConfig {
    /// Site URL, e.g. `https://example.atlassian.net`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Account email used for basic auth.
    #[serde(default)]
    pub email: Option<String>,

    /// API token paired with `email`.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Tracker identity; comments mentioning it are forwarded to chat.
    #[serde(default)]
    pub username: Option<String>,

    /// Project new issues are created in.
    #[serde(default)]
    pub project_key: Option<String>,

    /// Issue type name or numeric id.
    #[serde(default = "default_issue_type")]
    pub issue_type: String,

    /// Issue whose description stores the ticket registry.
    #[serde(default)]
    pub aggregate_issue_key: Option<String>,

    /// Status the "Reopen" button transitions to. Unset hides the button.
    #[serde(default)]
    pub reopen_status: Option<String>,

    /// Comment prefix that forces forwarding to chat.
    #[serde(default = "default_comment_trigger")]
    pub comment_trigger: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            email: None,
            api_token: None,
            username: None,
            project_key: None,
            issue_type: default_issue_type(),
            aggregate_issue_key: None,
            reopen_status: None,
            comment_trigger: default_comment_trigger(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_issue_type() -> String {
    "Task".to_string()
}

fn default_comment_trigger() -> String {
    "/tg".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

/// Engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Number of workers consuming inbound events.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Bounded inbound queue size. A full queue blocks the update poller.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Seconds between reconciliation passes.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// How long a resolved ticket stays registered after its last update.
    /// Zero or negative falls back to 72 hours.
    #[serde(default = "default_closed_ticket_ttl_hours")]
    pub closed_ticket_ttl_hours: i64,

    /// Quiet period before a media group is forwarded.
    #[serde(default = "default_media_group_debounce_ms")]
    pub media_group_debounce_ms: u64,

    /// Messages kept per chat for issue descriptions.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Statuses treated as resolved (case-insensitive).
    #[serde(default = "default_terminal_statuses")]
    pub terminal_statuses: Vec<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            poll_interval_secs: default_poll_interval_secs(),
            closed_ticket_ttl_hours: default_closed_ticket_ttl_hours(),
            media_group_debounce_ms: default_media_group_debounce_ms(),
            history_limit: default_history_limit(),
            terminal_statuses: default_terminal_statuses(),
            log_level: default_log_level(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_closed_ticket_ttl_hours() -> i64 {
    7 * 24
}

fn default_media_group_debounce_ms() -> u64 {
    3000
}

fn default_history_limit() -> usize {
    10
}

fn default_terminal_statuses() -> Vec<String> {
    DEFAULT_TERMINAL_STATUSES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}
