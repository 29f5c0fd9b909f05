// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The running bridge: event queue, worker pool and background tasks.
//!
//! Inbound events go through a bounded queue to a fixed pool of workers, so
//! a slow tracker applies backpressure to the chat poller instead of growing
//! memory. The reconciliation loop and the media-group actor run beside the
//! workers.
//!
//! Shutdown order: the producer side closes, workers drain what is queued,
//! then the media-group actor and the reconciler stop, and a dirty registry
//! gets one last flush.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use ticketbridge_config::TicketbridgeConfig;
use ticketbridge_core::{BridgeError, InboundEvent, IssueTracker, MessagingGateway};
use ticketbridge_registry::TicketRegistry;

use crate::dispatcher::Dispatcher;
use crate::handlers::{BridgeContext, ReplyCommentHandler};
use crate::media_group::MediaGroupAggregator;
use crate::reconcile::{ReconcileSettings, Reconciler};

/// How long queued events may take to drain on shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Sizing of the worker pool.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub workers: usize,
    pub queue_capacity: usize,
    pub media_group_debounce: Duration,
}

impl BridgeSettings {
    pub fn from_config(config: &TicketbridgeConfig) -> Self {
        Self {
            workers: config.bridge.workers.max(1),
            queue_capacity: config.bridge.queue_capacity.max(1),
            media_group_debounce: Duration::from_millis(config.bridge.media_group_debounce_ms),
        }
    }
}

/// Producer side of the event queue. Awaits while the queue is full.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<InboundEvent>,
}

impl EventSender {
    pub async fn send(&self, event: InboundEvent) -> Result<(), BridgeError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| BridgeError::Internal("event queue is closed".into()))
    }
}

/// A configured, not yet started bridge.
pub struct Bridge {
    ctx: Arc<BridgeContext>,
    reconciler: Arc<Reconciler>,
    settings: BridgeSettings,
}

impl Bridge {
    pub fn new(
        registry: Arc<TicketRegistry>,
        tracker: Arc<dyn IssueTracker>,
        gateway: Arc<dyn MessagingGateway>,
        config: &TicketbridgeConfig,
    ) -> Result<Self, BridgeError> {
        let ctx = Arc::new(BridgeContext::new(
            Arc::clone(&registry),
            Arc::clone(&tracker),
            Arc::clone(&gateway),
            config,
        )?);
        let reconciler = Arc::new(Reconciler::new(
            registry,
            tracker,
            gateway,
            ReconcileSettings::from_config(config),
        ));
        Ok(Self {
            ctx,
            reconciler,
            settings: BridgeSettings::from_config(config),
        })
    }

    /// Build from parts, bypassing configuration.
    pub fn from_parts(
        ctx: Arc<BridgeContext>,
        reconciler: Arc<Reconciler>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            ctx,
            reconciler,
            settings,
        }
    }

    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.ctx
    }

    /// Load the registry from the aggregate issue and start every task.
    ///
    /// Fails when the aggregate issue cannot be read, since a later flush
    /// would overwrite it with an incomplete registry.
    pub async fn start(self, cancel: CancellationToken) -> Result<RunningBridge, BridgeError> {
        let loaded = self.reconciler.load_aggregate().await?;
        info!(tickets = loaded, "ticket registry ready");

        let media_cancel = CancellationToken::new();
        let (media_groups, media_task) = MediaGroupAggregator::spawn(
            Arc::new(ReplyCommentHandler::new(Arc::clone(&self.ctx))),
            self.settings.media_group_debounce,
            media_cancel.clone(),
        );
        let dispatcher = Dispatcher::new(Arc::clone(&self.ctx), media_groups);

        let (tx, rx) = mpsc::channel(self.settings.queue_capacity);
        let rx = Arc::new(Mutex::new(rx));
        let workers = TaskTracker::new();
        for id in 0..self.settings.workers {
            workers.spawn(worker(id, Arc::clone(&rx), dispatcher.clone()));
        }
        workers.close();
        info!(
            workers = self.settings.workers,
            queue_capacity = self.settings.queue_capacity,
            "worker pool started"
        );

        let reconciler = Arc::clone(&self.reconciler);
        let reconcile_cancel = cancel.clone();
        let reconciler_task = tokio::spawn(async move { reconciler.run(reconcile_cancel).await });

        Ok(RunningBridge {
            sender: EventSender { tx },
            cancel,
            workers,
            media_cancel,
            media_task,
            reconciler_task,
            registry: Arc::clone(&self.ctx.registry),
            reconciler: self.reconciler,
        })
    }
}

/// Handle to a started bridge.
pub struct RunningBridge {
    sender: EventSender,
    cancel: CancellationToken,
    workers: TaskTracker,
    media_cancel: CancellationToken,
    media_task: JoinHandle<()>,
    reconciler_task: JoinHandle<()>,
    registry: Arc<TicketRegistry>,
    reconciler: Arc<Reconciler>,
}

impl RunningBridge {
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Wait for cancellation, then shut down in order.
    ///
    /// Workers exit once every [`EventSender`] is dropped and the queue is
    /// empty, so producers must release their senders on cancellation.
    pub async fn wait(self) {
        let RunningBridge {
            sender,
            cancel,
            workers,
            media_cancel,
            media_task,
            reconciler_task,
            registry,
            reconciler,
        } = self;

        cancel.cancelled().await;
        drop(sender);

        info!("draining event queue");
        if tokio::time::timeout(DRAIN_TIMEOUT, workers.wait())
            .await
            .is_err()
        {
            warn!(
                timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "workers did not drain in time"
            );
        }

        media_cancel.cancel();
        if let Err(e) = media_task.await {
            warn!(error = %e, "media group task ended abnormally");
        }
        if let Err(e) = reconciler_task.await {
            warn!(error = %e, "reconciliation task ended abnormally");
        }

        if registry.dirty_and_reset() {
            match reconciler.flush().await {
                Ok(_) => info!("ticket registry flushed on shutdown"),
                Err(e) => error!(error = %e, "failed to flush ticket registry on shutdown"),
            }
        }
        info!("bridge stopped");
    }
}

async fn worker(id: usize, rx: Arc<Mutex<mpsc::Receiver<InboundEvent>>>, dispatcher: Dispatcher) {
    debug!(worker = id, "worker started");
    loop {
        let event = rx.lock().await.recv().await;
        let Some(event) = event else {
            break;
        };
        if let Err(e) = dispatcher.dispatch(event).await {
            warn!(worker = id, error = %e, "event handling failed");
        }
    }
    debug!(worker = id, "worker stopped");
}
