// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the ticketbridge configuration system.

use ticketbridge_config::diagnostic::ConfigError;
use ticketbridge_config::model::TicketbridgeConfig;
use ticketbridge_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[telegram]
bot_token = "123:ABC"
reaction_emoji = "✅"

[jira]
base_url = "https://example.atlassian.net"
email = "ops@example.com"
api_token = "token"
username = "Support Bot"
project_key = "SUP"
issue_type = "10002"
aggregate_issue_key = "SUP-1"
reopen_status = "Reopened"
comment_trigger = "!chat"

[bridge]
workers = 2
queue_capacity = 64
poll_interval_secs = 30
closed_ticket_ttl_hours = 24
media_group_debounce_ms = 1500
history_limit = 5
terminal_statuses = ["Done", "Won't Do"]
log_level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.telegram.reaction_emoji, "✅");
    assert_eq!(config.jira.project_key.as_deref(), Some("SUP"));
    assert_eq!(config.jira.issue_type, "10002");
    assert_eq!(config.jira.aggregate_issue_key.as_deref(), Some("SUP-1"));
    assert_eq!(config.jira.reopen_status.as_deref(), Some("Reopened"));
    assert_eq!(config.jira.comment_trigger, "!chat");
    assert_eq!(config.bridge.workers, 2);
    assert_eq!(config.bridge.queue_capacity, 64);
    assert_eq!(config.bridge.poll_interval_secs, 30);
    assert_eq!(config.bridge.closed_ticket_ttl_hours, 24);
    assert_eq!(config.bridge.media_group_debounce_ms, 1500);
    assert_eq!(config.bridge.history_limit, 5);
    assert_eq!(config.bridge.terminal_statuses, vec!["Done", "Won't Do"]);
    assert_eq!(config.bridge.log_level, "debug");
}

/// Missing sections fall back to compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert!(config.telegram.bot_token.is_none());
    assert_eq!(config.telegram.reaction_emoji, "👌");
    assert_eq!(config.jira.issue_type, "Task");
    assert_eq!(config.jira.comment_trigger, "/tg");
    assert_eq!(config.jira.request_timeout_secs, 15);
    assert!(config.jira.reopen_status.is_none());
    assert_eq!(config.bridge.workers, 4);
    assert_eq!(config.bridge.queue_capacity, 1024);
    assert_eq!(config.bridge.poll_interval_secs, 10);
    assert_eq!(config.bridge.closed_ticket_ttl_hours, 168);
    assert_eq!(config.bridge.media_group_debounce_ms, 3000);
    assert_eq!(config.bridge.history_limit, 10);
    assert!(config.bridge.terminal_statuses.iter().any(|s| s == "done"));
}

/// Unknown field in [jira] is rejected.
#[test]
fn unknown_field_in_jira_produces_error() {
    let err = load_config_from_str("[jira]\nprojct_key = \"SUP\"\n")
        .expect_err("should reject unknown field");
    let err_str = err.to_string();
    assert!(
        err_str.contains("unknown field") || err_str.contains("projct_key"),
        "error should mention the bad key, got: {err_str}"
    );
}

/// Unexpected top-level section is rejected.
#[test]
fn unknown_top_level_section_is_rejected() {
    assert!(load_config_from_str("[database]\npath = \"x\"\n").is_err());
}

/// Typos surface as UnknownKey diagnostics with a suggestion and a span.
#[test]
fn unknown_key_diagnostic_suggests_correction() {
    let errors = load_and_validate_str("[bridge]\nworkrs = 3\n").unwrap_err();
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            span,
            ..
        } => {
            assert_eq!(key, "workrs");
            assert_eq!(suggestion.as_deref(), Some("workers"));
            assert!(span.is_some());
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Wrong value types surface as InvalidType diagnostics.
#[test]
fn wrong_type_produces_invalid_type() {
    let errors = load_and_validate_str("[bridge]\nworkers = \"many\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_errors_are_collected() {
    let errors = load_and_validate_str("[bridge]\nworkers = 0\nqueue_capacity = 0\n").unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

/// Figment tuple overrides land on nested keys.
#[test]
fn dotted_override_sets_nested_key() {
    use figment::{Figment, providers::Serialized};

    let config: TicketbridgeConfig = Figment::new()
        .merge(Serialized::defaults(TicketbridgeConfig::default()))
        .merge(("jira.reopen_status", "Reopened"))
        .extract()
        .expect("should set reopen_status via dot notation");

    assert_eq!(config.jira.reopen_status.as_deref(), Some("Reopened"));
}
