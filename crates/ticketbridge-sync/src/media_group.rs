// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Debounced batching of media-group messages.
//!
//! Telegram delivers an album (several photos or files sent together) as
//! independent messages sharing a `media_group_id`. The aggregator collects
//! them and hands the group to a [`BatchHandler`] as one batch once no new
//! member has arrived for the debounce window.
//!
//! The pending groups live inside a single actor task, so arrival,
//! deadline expiry and flush are serialized without a lock. A group leaves
//! the map exactly once; a message arriving after that starts a new group.
//! Batches are handled on their own tasks, outside the actor.
//!
//! Messages without a group id bypass the actor and are handled inline as a
//! batch of one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use ticketbridge_core::{BridgeError, ChatMessage};

const COMMAND_BUFFER: usize = 256;

/// Downstream processing of a completed batch.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    async fn handle_batch(&self, batch: Vec<ChatMessage>) -> Result<(), BridgeError>;
}

enum Command {
    Add(ChatMessage),
    Flush(String),
}

struct PendingGroup {
    messages: Vec<ChatMessage>,
    deadline: Instant,
}

/// Handle to the aggregator actor. Cheap to clone.
#[derive(Clone)]
pub struct MediaGroupAggregator {
    commands: mpsc::Sender<Command>,
    handler: Arc<dyn BatchHandler>,
}

impl MediaGroupAggregator {
    /// Start the actor. It runs until `cancel` fires or every handle is
    /// dropped, then waits for batches already handed out.
    pub fn spawn(
        handler: Arc<dyn BatchHandler>,
        debounce: Duration,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let actor = Actor {
            rx,
            handler: Arc::clone(&handler),
            debounce,
            pending: HashMap::new(),
            in_flight: TaskTracker::new(),
        };
        let task = tokio::spawn(actor.run(cancel));
        (Self { commands, handler }, task)
    }

    /// Queue a message. Groupless messages are handled before this returns.
    pub async fn submit(&self, message: ChatMessage) -> Result<(), BridgeError> {
        if message.media_group_id.is_none() {
            return self.handler.handle_batch(vec![message]).await;
        }
        self.commands
            .send(Command::Add(message))
            .await
            .map_err(|_| BridgeError::Internal("media group aggregator stopped".into()))
    }

    /// Hand a pending group to the handler now instead of at its deadline.
    pub async fn flush(&self, group_id: &str) -> Result<(), BridgeError> {
        self.commands
            .send(Command::Flush(group_id.to_string()))
            .await
            .map_err(|_| BridgeError::Internal("media group aggregator stopped".into()))
    }
}

struct Actor {
    rx: mpsc::Receiver<Command>,
    handler: Arc<dyn BatchHandler>,
    debounce: Duration,
    pending: HashMap<String, PendingGroup>,
    in_flight: TaskTracker,
}

impl Actor {
    async fn run(mut self, cancel: CancellationToken) {
        loop {
            let next_deadline = self.pending.values().map(|g| g.deadline).min();
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = self.rx.recv() => match command {
                    Some(Command::Add(message)) => self.add(message),
                    Some(Command::Flush(group_id)) => {
                        if let Some(group) = self.pending.remove(&group_id) {
                            self.dispatch(group_id, group);
                        }
                    }
                    None => break,
                },
                _ = sleep_until(next_deadline) => self.dispatch_due(Instant::now()),
            }
        }

        if !self.pending.is_empty() {
            let messages: usize = self.pending.values().map(|g| g.messages.len()).sum();
            warn!(
                groups = self.pending.len(),
                messages, "abandoning pending media groups on shutdown"
            );
        }
        self.in_flight.close();
        self.in_flight.wait().await;
        info!("media group aggregator stopped");
    }

    fn add(&mut self, message: ChatMessage) {
        let group_id = message.media_group_id.clone().unwrap_or_default();
        let deadline = Instant::now() + self.debounce;
        let group = self
            .pending
            .entry(group_id.clone())
            .or_insert_with(|| PendingGroup {
                messages: Vec::new(),
                deadline,
            });
        group.messages.push(message);
        group.deadline = deadline;
        debug!(group_id = %group_id, size = group.messages.len(), "media group extended");
    }

    fn dispatch_due(&mut self, now: Instant) {
        let due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, g)| g.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for group_id in due {
            if let Some(group) = self.pending.remove(&group_id) {
                self.dispatch(group_id, group);
            }
        }
    }

    fn dispatch(&self, group_id: String, group: PendingGroup) {
        let handler = Arc::clone(&self.handler);
        let size = group.messages.len();
        debug!(group_id = %group_id, size, "media group complete");
        self.in_flight.spawn(async move {
            if let Err(e) = handler.handle_batch(group.messages).await {
                warn!(group_id = %group_id, size, error = %e, "media group batch failed");
            }
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
