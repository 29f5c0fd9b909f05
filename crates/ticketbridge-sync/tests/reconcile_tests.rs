// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation passes against the in-memory tracker and gateway.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use ticketbridge_core::TicketRecord;
use ticketbridge_registry::{TicketRegistry, codec};
use ticketbridge_sync::{ReconcileSettings, Reconciler};
use ticketbridge_test_utils::{MockGateway, MockTracker, TrackerOp, comment};

fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, hour, minute, second)
        .unwrap()
}

struct Fixture {
    registry: Arc<TicketRegistry>,
    tracker: MockTracker,
    gateway: MockGateway,
    reconciler: Reconciler,
}

fn fixture(project: &str, settings: ReconcileSettings) -> Fixture {
    let registry = Arc::new(TicketRegistry::new());
    let tracker = MockTracker::new(project);
    let gateway = MockGateway::new("bridge_bot");
    let reconciler = Reconciler::new(
        Arc::clone(&registry),
        Arc::new(tracker.clone()),
        Arc::new(gateway.clone()),
        settings,
    );
    Fixture {
        registry,
        tracker,
        gateway,
        reconciler,
    }
}

fn settings() -> ReconcileSettings {
    ReconcileSettings {
        retention: TimeDelta::hours(48),
        ..ReconcileSettings::default()
    }
}

// ---- Comment forwarding ----

#[tokio::test]
async fn forwards_only_comments_past_the_watermark() {
    let f = fixture("SUP", settings());
    let (t1, t2, t3) = (at(9, 0, 0), at(9, 5, 0), at(9, 10, 0));
    f.registry.add(555, "SUP-1", "Open", "printer", "ada");
    f.registry.update_last_comment_at("SUP-1", t1);
    f.tracker.set_issue("SUP-1", "Open", Some(t3)).await;
    f.tracker.push_comment("SUP-1", comment("1", "Bob", t1, "/tg first")).await;
    f.tracker.push_comment("SUP-1", comment("2", "Bob", t2, "/tg second")).await;
    f.tracker.push_comment("SUP-1", comment("3", "Bob", t3, "/tg third")).await;

    let report = f.reconciler.tick_at(at(10, 0, 0)).await;

    assert_eq!(report.comments_forwarded, 2);
    let sent = f.gateway.sent_messages().await;
    assert_eq!(sent.len(), 2);
    assert!(sent[0].html.contains("second"));
    assert!(sent[1].html.contains("third"));
    assert!(sent.iter().all(|m| m.chat_id == 555));
    assert_eq!(
        f.registry.get("SUP-1").unwrap().last_comment_at,
        Some(t3 + TimeDelta::seconds(1))
    );

    let again = f.reconciler.tick_at(at(10, 1, 0)).await;
    assert_eq!(again.comments_forwarded, 0);
    assert_eq!(f.gateway.sent_count().await, 2);
}

#[tokio::test]
async fn trigger_prefix_is_stripped() {
    let f = fixture("SUP", settings());
    f.registry.add(1, "SUP-1", "Open", "", "");
    f.tracker.set_issue("SUP-1", "Open", None).await;
    f.tracker
        .push_comment("SUP-1", comment("1", "Bob", at(9, 0, 0), "  /tg   please restart  "))
        .await;

    f.reconciler.tick_at(at(10, 0, 0)).await;

    let sent = f.gateway.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].html.contains("<b>please restart</b>"));
    assert!(!sent[0].html.contains("/tg"));
}

#[tokio::test]
async fn internal_comments_advance_the_watermark_silently() {
    let f = fixture("SUP", settings());
    f.registry.add(1, "SUP-1", "Open", "", "");
    f.tracker.set_issue("SUP-1", "Open", None).await;
    f.tracker
        .push_comment("SUP-1", comment("1", "Bob", at(9, 0, 0), "internal note"))
        .await;

    let report = f.reconciler.tick_at(at(10, 0, 0)).await;

    assert_eq!(report.comments_forwarded, 0);
    assert_eq!(f.gateway.sent_count().await, 0);
    assert_eq!(
        f.registry.get("SUP-1").unwrap().last_comment_at,
        Some(at(9, 0, 1))
    );
}

#[tokio::test]
async fn mention_of_tracker_identity_forwards_comment() {
    let f = fixture(
        "SUP",
        ReconcileSettings {
            tracker_identity: Some("Bridge Bot".into()),
            ..settings()
        },
    );
    f.registry.add(1, "SUP-1", "Open", "", "");
    f.tracker.set_issue("SUP-1", "Open", None).await;
    let mut mention = comment("1", "Bob", at(9, 0, 0), "Bridge Bot can you check?");
    mention.rendered_body = "<p><a href=\"#\">Bridge Bot</a> can you check?</p>".into();
    f.tracker.push_comment("SUP-1", mention).await;

    let report = f.reconciler.tick_at(at(10, 0, 0)).await;

    assert_eq!(report.comments_forwarded, 1);
    assert!(f.gateway.sent_messages().await[0].html.contains("can you check?"));
}

#[tokio::test]
async fn failed_send_still_advances_watermark() {
    let f = fixture("SUP", settings());
    f.registry.add(1, "SUP-1", "Open", "", "");
    f.tracker.set_issue("SUP-1", "Open", None).await;
    f.tracker
        .push_comment("SUP-1", comment("1", "Bob", at(9, 0, 0), "/tg hello"))
        .await;
    f.gateway.set_fail_sends(true);

    let report = f.reconciler.tick_at(at(10, 0, 0)).await;

    assert_eq!(report.comments_forwarded, 0);
    assert_eq!(report.errors, 0);
    assert_eq!(
        f.registry.get("SUP-1").unwrap().last_comment_at,
        Some(at(9, 0, 1))
    );
}

// ---- Status and expiry ----

#[tokio::test]
async fn resolved_ticket_expires_after_retention() {
    let f = fixture("SUP", settings());
    let now = at(12, 0, 0);
    let retention = TimeDelta::hours(48);
    f.registry.add(1, "SUP-1", "Done", "", "");
    f.registry.add(1, "SUP-2", "Done", "", "");
    f.tracker
        .set_issue("SUP-1", "Done", Some(now - retention - TimeDelta::seconds(1)))
        .await;
    f.tracker
        .set_issue("SUP-2", "Done", Some(now - retention + TimeDelta::seconds(1)))
        .await;

    let report = f.reconciler.tick_at(now).await;

    assert_eq!(report.expired, 1);
    assert!(f.registry.get("SUP-1").is_none());
    assert!(f.registry.get("SUP-2").is_some());
}

#[tokio::test]
async fn resolved_ticket_lifecycle_in_one_chat() {
    let f = fixture(
        "KEY",
        ReconcileSettings {
            retention: TimeDelta::hours(72),
            ..ReconcileSettings::default()
        },
    );
    let t = at(8, 0, 0);
    f.registry.add(555, "KEY-7", "Open", "", "");
    f.tracker.set_issue("KEY-7", "Done", Some(t)).await;

    f.reconciler
        .tick_at(t + TimeDelta::hours(72) - TimeDelta::hours(1))
        .await;
    let ticket = f.registry.get("KEY-7").unwrap();
    assert_eq!(ticket.status, "Done");
    assert_eq!(ticket.chat_id, 555);

    let report = f
        .reconciler
        .tick_at(t + TimeDelta::hours(72) + TimeDelta::hours(1))
        .await;
    assert_eq!(report.expired, 1);
    assert!(f.registry.list_all().iter().all(|r| r.key != "KEY-7"));
}

#[tokio::test]
async fn missing_update_time_never_expires() {
    let f = fixture("SUP", settings());
    f.registry.add(1, "SUP-1", "Done", "", "");
    f.tracker.set_issue("SUP-1", "Done", None).await;

    let report = f.reconciler.tick_at(at(12, 0, 0)).await;

    assert_eq!(report.expired, 0);
    assert!(f.registry.get("SUP-1").is_some());
}

#[tokio::test]
async fn closing_a_ticket_notifies_the_chat_once() {
    let f = fixture("SUP", settings());
    f.registry.add(42, "SUP-1", "In Progress", "", "ada");
    f.tracker.set_issue("SUP-1", "Done", Some(at(11, 0, 0))).await;

    let first = f.reconciler.tick_at(at(11, 30, 0)).await;
    let second = f.reconciler.tick_at(at(11, 31, 0)).await;

    assert_eq!(first.status_changes, 1);
    assert_eq!(first.closed_notices, 1);
    assert_eq!(second.closed_notices, 0);
    let sent = f.gateway.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, 42);
    assert!(sent[0].html.contains("Ticket closed"));
    assert!(sent[0].html.contains("@ada"));
    assert!(sent[0].actions.is_empty());
}

#[tokio::test]
async fn closed_notice_offers_reopen_when_configured() {
    let f = fixture(
        "SUP",
        ReconcileSettings {
            reopen_status: Some("Reopened".into()),
            ..settings()
        },
    );
    f.registry.add(42, "SUP-1", "Open", "", "");
    f.tracker.set_issue("SUP-1", "Closed", Some(at(11, 0, 0))).await;

    f.reconciler.tick_at(at(11, 30, 0)).await;

    let sent = f.gateway.sent_messages().await;
    assert_eq!(sent[0].action_data(), vec!["reopen|SUP-1".to_string()]);
}

#[tokio::test]
async fn status_change_between_active_states_is_silent() {
    let f = fixture("SUP", settings());
    f.registry.add(1, "SUP-1", "Open", "", "");
    f.tracker.set_issue("SUP-1", "In Progress", None).await;

    let report = f.reconciler.tick_at(at(11, 0, 0)).await;

    assert_eq!(report.status_changes, 1);
    assert_eq!(report.closed_notices, 0);
    assert_eq!(f.registry.get("SUP-1").unwrap().status, "In Progress");
    assert_eq!(f.gateway.sent_count().await, 0);
}

// ---- Isolation ----

#[tokio::test]
async fn one_failing_ticket_does_not_block_others() {
    let f = fixture("SUP", settings());
    f.registry.add(1, "SUP-1", "Open", "", "");
    f.registry.add(2, "SUP-2", "Open", "", "");
    f.tracker.set_issue("SUP-1", "Open", None).await;
    f.tracker.set_issue("SUP-2", "Done", Some(at(11, 0, 0))).await;
    f.tracker.fail(TrackerOp::GetComments, Some("SUP-1")).await;
    f.tracker.fail(TrackerOp::GetIssueStatus, Some("SUP-1")).await;

    let report = f.reconciler.tick_at(at(11, 30, 0)).await;

    assert_eq!(report.errors, 2);
    assert_eq!(report.tickets, 2);
    assert_eq!(f.registry.get("SUP-2").unwrap().status, "Done");
    assert_eq!(f.registry.get("SUP-1").unwrap().status, "Open");
}

// ---- Aggregate persistence ----

fn with_aggregate() -> ReconcileSettings {
    ReconcileSettings {
        aggregate_issue_key: Some("SUP-1000".into()),
        ..settings()
    }
}

#[tokio::test]
async fn dirty_registry_is_written_to_aggregate_issue() {
    let f = fixture("SUP", with_aggregate());
    f.registry.add(7, "SUP-1", "Open", "printer", "ada");
    f.tracker.set_issue("SUP-1", "In Progress", None).await;

    let report = f.reconciler.tick_at(at(11, 0, 0)).await;

    assert!(report.flushed);
    assert_eq!(f.tracker.description_updates().await, 1);
    let doc = f.tracker.description("SUP-1000").await.unwrap();
    let records = codec::decode(&doc);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key, "SUP-1");
    assert_eq!(records[0].status, "In Progress");
    assert_eq!(records[0].chat_id, 7);
}

#[tokio::test]
async fn clean_registry_is_not_written() {
    let f = fixture("SUP", with_aggregate());
    f.registry.add(7, "SUP-1", "Open", "", "");
    f.tracker.set_issue("SUP-1", "Open", None).await;

    let report = f.reconciler.tick_at(at(11, 0, 0)).await;

    assert!(!report.flushed);
    assert_eq!(f.tracker.description_updates().await, 0);
}

#[tokio::test]
async fn failed_flush_is_retried_next_tick() {
    let f = fixture("SUP", with_aggregate());
    f.registry.add(7, "SUP-1", "Open", "", "");
    f.tracker.set_issue("SUP-1", "Done", None).await;
    f.tracker.fail(TrackerOp::UpdateDescription, None).await;

    let failed = f.reconciler.tick_at(at(11, 0, 0)).await;
    assert!(!failed.flushed);
    assert_eq!(failed.errors, 1);

    f.tracker.heal().await;
    let retried = f.reconciler.tick_at(at(11, 1, 0)).await;
    assert!(retried.flushed);
    assert_eq!(f.tracker.description_updates().await, 1);
}

#[tokio::test]
async fn registry_loads_from_aggregate_issue() {
    let f = fixture("SUP", with_aggregate());
    let records = vec![
        TicketRecord::new(1, "SUP-1", "Open", "printer", "ada"),
        TicketRecord::new(2, "SUP-2", "Done", "", "bob"),
    ];
    f.tracker
        .set_description("SUP-1000", codec::encode(&records))
        .await;

    let loaded = f.reconciler.load_aggregate().await.unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(f.registry.list_all(), records);
    assert!(!f.registry.dirty_and_reset());
}

#[tokio::test]
async fn empty_aggregate_issue_loads_nothing() {
    let f = fixture("SUP", with_aggregate());
    assert_eq!(f.reconciler.load_aggregate().await.unwrap(), 0);
    assert!(f.registry.is_empty());
}

#[tokio::test]
async fn aggregate_read_failure_is_reported() {
    let f = fixture("SUP", with_aggregate());
    f.tracker.fail(TrackerOp::GetDescription, None).await;
    assert!(f.reconciler.load_aggregate().await.is_err());
}

// ---- Loop ----

#[tokio::test(start_paused = true)]
async fn run_stops_on_cancellation() {
    let f = fixture("SUP", settings());
    let reconciler = Arc::new(f.reconciler);
    let cancel = tokio_util::sync::CancellationToken::new();
    let task = {
        let reconciler = Arc::clone(&reconciler);
        let cancel = cancel.clone();
        tokio::spawn(async move { reconciler.run(cancel).await })
    };

    tokio::time::sleep(reconciler.settings().interval * 3).await;
    cancel.cancel();
    task.await.unwrap();
}
