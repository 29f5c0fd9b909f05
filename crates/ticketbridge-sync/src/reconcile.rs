// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic reconciliation of registered tickets against the tracker.
//!
//! Every tick walks a snapshot of the registry. For each ticket it forwards
//! new tracker comments to the ticket's chat, then refreshes the status:
//! a resolved ticket not updated within the retention window is dropped, a
//! changed status is recorded, and a newly resolved ticket is announced.
//! After the pass, a dirty registry is written back to the aggregate issue.
//!
//! Errors are contained per ticket. A ticket whose tracker call fails is
//! skipped and picked up again on the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use ticketbridge_config::TicketbridgeConfig;
use ticketbridge_core::{
    ActionButton, BridgeError, IssueTracker, MessagingGateway, StatusVocabulary, TicketRecord,
    TrackerComment,
};
use ticketbridge_registry::{TicketRegistry, codec};

use crate::render;

/// Retention used when the configured one is zero or negative.
const FALLBACK_RETENTION_HOURS: i64 = 72;

/// Added to the newest forwarded comment time so the boundary comment is
/// never seen as new again.
fn watermark_epsilon() -> TimeDelta {
    TimeDelta::seconds(1)
}

/// Knobs for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    pub interval: Duration,
    /// How long a resolved ticket stays registered after its last update.
    pub retention: TimeDelta,
    /// Comment prefix that forces forwarding. Empty disables the rule.
    pub comment_trigger: String,
    /// Tracker identity whose mention forces forwarding.
    pub tracker_identity: Option<String>,
    /// Target of the "Reopen" button. `None` hides the button.
    pub reopen_status: Option<String>,
    /// Issue whose description mirrors the registry. `None` disables flushing.
    pub aggregate_issue_key: Option<String>,
    pub vocabulary: StatusVocabulary,
}

impl ReconcileSettings {
    pub fn from_config(config: &TicketbridgeConfig) -> Self {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Self {
            interval: Duration::from_secs(config.bridge.poll_interval_secs.max(1)),
            retention: retention_from_hours(config.bridge.closed_ticket_ttl_hours),
            comment_trigger: config.jira.comment_trigger.clone(),
            tracker_identity: non_empty(&config.jira.username),
            reopen_status: non_empty(&config.jira.reopen_status),
            aggregate_issue_key: non_empty(&config.jira.aggregate_issue_key),
            vocabulary: StatusVocabulary::new(&config.bridge.terminal_statuses),
        }
    }
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self::from_config(&TicketbridgeConfig::default())
    }
}

/// Zero or negative hours fall back to 72.
pub fn retention_from_hours(hours: i64) -> TimeDelta {
    let hours = if hours <= 0 {
        FALLBACK_RETENTION_HOURS
    } else {
        hours
    };
    TimeDelta::hours(hours)
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tickets: usize,
    pub comments_forwarded: usize,
    pub status_changes: usize,
    pub closed_notices: usize,
    pub expired: usize,
    pub errors: usize,
    pub flushed: bool,
}

/// Drives the reconciliation of the registry against the tracker.
pub struct Reconciler {
    registry: Arc<TicketRegistry>,
    tracker: Arc<dyn IssueTracker>,
    gateway: Arc<dyn MessagingGateway>,
    settings: ReconcileSettings,
}

impl Reconciler {
    pub fn new(
        registry: Arc<TicketRegistry>,
        tracker: Arc<dyn IssueTracker>,
        gateway: Arc<dyn MessagingGateway>,
        settings: ReconcileSettings,
    ) -> Self {
        Self {
            registry,
            tracker,
            gateway,
            settings,
        }
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    /// Seed the registry from the aggregate issue. Returns the number of
    /// records loaded; zero when no aggregate issue is configured.
    pub async fn load_aggregate(&self) -> Result<usize, BridgeError> {
        let Some(key) = self.settings.aggregate_issue_key.as_deref() else {
            return Ok(0);
        };
        let Some(doc) = self.tracker.get_issue_description(key).await? else {
            info!(key, "aggregate issue has no description yet");
            return Ok(0);
        };
        let records = codec::decode(&doc);
        let count = records.len();
        self.registry.init(records);
        info!(key, count, "ticket registry loaded from aggregate issue");
        Ok(count)
    }

    /// Tick every `settings.interval` until `cancel` fires. The first tick
    /// happens one interval after start.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the first immediate tick.
        interval.tick().await;

        info!(
            interval_secs = self.settings.interval.as_secs(),
            "reconciliation loop started"
        );
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = self.tick().await;
                    if report.errors > 0 {
                        warn!(?report, "reconciliation tick finished with errors");
                    } else {
                        debug!(?report, "reconciliation tick finished");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("reconciliation loop shutting down");
                    break;
                }
            }
        }
    }

    pub async fn tick(&self) -> TickReport {
        self.tick_at(Utc::now()).await
    }

    /// One reconciliation pass with an explicit clock.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickReport {
        let tickets = self.registry.list_all();
        let mut report = TickReport {
            tickets: tickets.len(),
            ..TickReport::default()
        };

        for ticket in &tickets {
            if let Err(e) = self.forward_comments(ticket, &mut report).await {
                warn!(key = %ticket.key, error = %e, "failed to fetch comments");
                report.errors += 1;
            }
            if let Err(e) = self.check_status(ticket, now, &mut report).await {
                warn!(key = %ticket.key, error = %e, "failed to refresh status");
                report.errors += 1;
            }
        }

        if self.registry.dirty_and_reset() {
            match self.flush().await {
                Ok(flushed) => report.flushed = flushed,
                Err(e) => {
                    error!(error = %e, "failed to write ticket registry to aggregate issue");
                    self.registry.mark_dirty();
                    report.errors += 1;
                }
            }
        }

        report
    }

    /// Write the whole registry to the aggregate issue.
    pub async fn flush(&self) -> Result<bool, BridgeError> {
        let Some(key) = self.settings.aggregate_issue_key.as_deref() else {
            return Ok(false);
        };
        let doc = codec::encode(&self.registry.list_all());
        self.tracker.update_issue_description(key, &doc).await?;
        debug!(key, "aggregate issue updated");
        Ok(true)
    }

    async fn forward_comments(
        &self,
        ticket: &TicketRecord,
        report: &mut TickReport,
    ) -> Result<(), BridgeError> {
        let comments = self.tracker.get_comments(&ticket.key).await?;

        let mut newest: Option<DateTime<Utc>> = None;
        for comment in &comments {
            if ticket
                .last_comment_at
                .is_some_and(|watermark| comment.created <= watermark)
            {
                continue;
            }
            newest = newest.max(Some(comment.created));

            let Some(text) = self.forwardable_text(comment) else {
                continue;
            };
            let html = render::comment_forwarded(
                &ticket.key,
                &ticket.creator_username,
                &comment.author,
                text,
            );
            match self.gateway.send_message(ticket.chat_id, &html).await {
                Ok(()) => {
                    report.comments_forwarded += 1;
                    info!(key = %ticket.key, comment_id = %comment.id, "comment forwarded to chat");
                }
                Err(e) => {
                    warn!(key = %ticket.key, comment_id = %comment.id, error = %e, "failed to forward comment");
                }
            }
        }

        if let Some(newest) = newest {
            self.registry
                .update_last_comment_at(&ticket.key, newest + watermark_epsilon());
        }
        Ok(())
    }

    /// Text to forward, or `None` when the comment is not meant for chat.
    fn forwardable_text<'c>(&self, comment: &'c TrackerComment) -> Option<&'c str> {
        let trigger = self.settings.comment_trigger.as_str();
        if !trigger.is_empty()
            && let Some(rest) = comment.body.trim_start().strip_prefix(trigger)
        {
            return Some(rest.trim());
        }
        match self.settings.tracker_identity.as_deref() {
            Some(identity) if comment.rendered_body.contains(identity) => {
                Some(comment.body.trim())
            }
            _ => None,
        }
    }

    async fn check_status(
        &self,
        ticket: &TicketRecord,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) -> Result<(), BridgeError> {
        let issue = self.tracker.get_issue_status(&ticket.key).await?;
        let vocabulary = &self.settings.vocabulary;
        let terminal = vocabulary.is_terminal(&issue.status);

        if terminal
            && issue
                .updated
                .is_some_and(|updated| updated < now - self.settings.retention)
        {
            if self.registry.delete(&ticket.key) {
                report.expired += 1;
                info!(key = %ticket.key, status = %issue.status, "resolved ticket expired");
            }
            return Ok(());
        }

        if !self.registry.update_status(&ticket.key, &issue.status) {
            return Ok(());
        }
        report.status_changes += 1;
        info!(key = %ticket.key, from = %ticket.status, to = %issue.status, "ticket status changed");

        if terminal && !vocabulary.is_terminal(&ticket.status) {
            self.notify_closed(ticket, &issue.status).await;
            report.closed_notices += 1;
        }
        Ok(())
    }

    async fn notify_closed(&self, ticket: &TicketRecord, status: &str) {
        let url = self.tracker.browse_url(&ticket.key);
        let html = render::ticket_closed(&ticket.key, status, &url, &ticket.creator_username);
        let sent = match self.settings.reopen_status {
            Some(_) => {
                let reopen = ActionButton::new("Reopen", format!("reopen|{}", ticket.key));
                self.gateway
                    .send_rich_message(ticket.chat_id, &html, vec![vec![reopen]])
                    .await
            }
            None => self.gateway.send_message(ticket.chat_id, &html).await,
        };
        if let Err(e) = sent {
            warn!(key = %ticket.key, error = %e, "failed to send closed notification");
        }
    }
}
