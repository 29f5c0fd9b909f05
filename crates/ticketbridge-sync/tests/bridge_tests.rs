// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup and shutdown of the full bridge.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use ticketbridge_config::TicketbridgeConfig;
use ticketbridge_core::{ChatMessage, InboundEvent, TicketRecord};
use ticketbridge_registry::{TicketRegistry, codec};
use ticketbridge_sync::Bridge;
use ticketbridge_test_utils::{MockGateway, MockTracker, TrackerOp};

fn config() -> TicketbridgeConfig {
    let mut config = TicketbridgeConfig::default();
    config.jira.aggregate_issue_key = Some("SUP-1000".into());
    config.bridge.workers = 2;
    config.bridge.queue_capacity = 4;
    config
}

fn create_command(id: i32) -> InboundEvent {
    InboundEvent::Message(ChatMessage {
        chat_id: 9,
        chat_title: Some("Ops".into()),
        message_id: id,
        from: None,
        text: Some("/create_issue laptop".into()),
        caption: None,
        reply_to: None,
        media_group_id: None,
        files: vec![],
        sent_at: Utc::now(),
    })
}

#[tokio::test]
async fn queued_events_drain_and_registry_is_flushed_on_shutdown() {
    let registry = Arc::new(TicketRegistry::new());
    let tracker = MockTracker::new("SUP");
    let gateway = MockGateway::new("bridge_bot");
    tracker
        .set_description(
            "SUP-1000",
            codec::encode(&[TicketRecord::new(9, "SUP-1", "Open", "", "")]),
        )
        .await;

    let bridge = Bridge::new(
        Arc::clone(&registry),
        Arc::new(tracker.clone()),
        Arc::new(gateway.clone()),
        &config(),
    )
    .unwrap();
    let cancel = CancellationToken::new();
    let running = bridge.start(cancel.clone()).await.unwrap();
    assert_eq!(registry.len(), 1);

    let sender = running.sender();
    for id in 0..3 {
        sender.send(create_command(id)).await.unwrap();
    }
    drop(sender);

    cancel.cancel();
    running.wait().await;

    assert_eq!(tracker.created_issues().await.len(), 3);
    assert_eq!(registry.len(), 4);
    let persisted = codec::decode(&tracker.description("SUP-1000").await.unwrap());
    assert_eq!(persisted.len(), 4);
    assert!(persisted.iter().any(|r| r.key == "SUP-103" && r.name == "laptop"));
}

#[tokio::test]
async fn start_fails_when_aggregate_is_unreadable() {
    let tracker = MockTracker::new("SUP");
    tracker.fail(TrackerOp::GetDescription, None).await;

    let bridge = Bridge::new(
        Arc::new(TicketRegistry::new()),
        Arc::new(tracker),
        Arc::new(MockGateway::new("bridge_bot")),
        &config(),
    )
    .unwrap();

    assert!(bridge.start(CancellationToken::new()).await.is_err());
}

#[tokio::test]
async fn start_without_aggregate_issue() {
    let mut config = config();
    config.jira.aggregate_issue_key = None;
    let registry = Arc::new(TicketRegistry::new());

    let bridge = Bridge::new(
        Arc::clone(&registry),
        Arc::new(MockTracker::new("SUP")),
        Arc::new(MockGateway::new("bridge_bot")),
        &config,
    )
    .unwrap();
    let cancel = CancellationToken::new();
    let running = bridge.start(cancel.clone()).await.unwrap();
    assert!(registry.is_empty());

    cancel.cancel();
    running.wait().await;
}
