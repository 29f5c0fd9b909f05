// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ticketbridge serve` command implementation.
//!
//! Wires the Jira tracker and the Telegram gateway into the bridge, starts
//! the update poller, and runs until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use ticketbridge_config::TicketbridgeConfig;
use ticketbridge_core::{BridgeError, IssueTracker};
use ticketbridge_jira::JiraTracker;
use ticketbridge_registry::TicketRegistry;
use ticketbridge_sync::{Bridge, install_signal_handler};
use ticketbridge_telegram::{TelegramGateway, UpdatePoller};
use tracing::{info, warn};

/// Runs the `ticketbridge serve` command.
///
/// The registry is loaded from the aggregate issue before any update is
/// polled. Shutdown stops polling first so the queued events can drain.
pub async fn run_serve(config: TicketbridgeConfig) -> Result<(), BridgeError> {
    init_tracing(&config.bridge.log_level);

    info!("starting ticketbridge serve");

    let tracker: Arc<dyn IssueTracker> = Arc::new(JiraTracker::new(&config.jira)?);
    let gateway = Arc::new(TelegramGateway::connect(&config.telegram).await?);
    let registry = Arc::new(TicketRegistry::new());

    let bridge = Bridge::new(registry, tracker, gateway.clone(), &config)?;

    let cancel = install_signal_handler();
    let running = bridge.start(cancel.clone()).await?;

    let poller = UpdatePoller::new(
        gateway.bot().clone(),
        Duration::from_secs(u64::from(config.telegram.updates_timeout_secs)),
    );
    poller.register_commands().await;

    let events = running.sender();
    let poll_cancel = cancel.clone();
    let polling = tokio::spawn(async move {
        poller.run(events, poll_cancel.clone()).await;
        // Polling only returns on its own if the listener gave up.
        poll_cancel.cancel();
    });

    running.wait().await;

    if let Err(e) = polling.await {
        warn!(error = %e, "polling task ended abnormally");
    }

    info!("ticketbridge serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with an env-filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ticketbridge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
