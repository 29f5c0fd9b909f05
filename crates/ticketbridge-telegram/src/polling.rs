// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long polling of Telegram updates into the bridge's event queue.

use std::time::Duration;

use teloxide::dispatching::ShutdownToken;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::update_listeners::Polling;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ticketbridge_core::InboundEvent;
use ticketbridge_sync::EventSender;
use ticketbridge_sync::dispatcher::{CREATE_COMMAND, STATUS_COMMAND};

use crate::convert;

/// How often a shutdown request is retried while the dispatcher is still
/// starting up.
const SHUTDOWN_RETRY: Duration = Duration::from_millis(100);

/// Pulls updates with `getUpdates` and forwards them to the bridge.
pub struct UpdatePoller {
    bot: Bot,
    timeout: Duration,
}

impl UpdatePoller {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }

    /// Publish the bot's commands so clients can suggest them.
    pub async fn register_commands(&self) {
        let commands = vec![
            BotCommand::new(
                CREATE_COMMAND.trim_start_matches('/'),
                "Create a ticket from recent messages",
            ),
            BotCommand::new(
                STATUS_COMMAND.trim_start_matches('/'),
                "Show ticket status",
            ),
        ];
        if let Err(e) = self.bot.set_my_commands(commands).await {
            warn!(error = %e, "failed to register bot commands");
        }
    }

    /// Runs until `cancel` fires. The sender is dropped on return, which lets
    /// the bridge's workers drain and stop.
    ///
    /// A full event queue blocks the handler, so polling slows down instead
    /// of buffering updates in memory.
    pub async fn run(self, events: EventSender, cancel: CancellationToken) {
        let on_message = {
            let events = events.clone();
            move |msg: Message| {
                let events = events.clone();
                async move {
                    let event = InboundEvent::Message(convert::chat_message(&msg));
                    if let Err(e) = events.send(event).await {
                        debug!(error = %e, "dropping message after shutdown");
                    }
                    respond(())
                }
            }
        };

        let on_callback = move |query: CallbackQuery| {
            let events = events.clone();
            async move {
                match convert::callback_event(&query) {
                    Some(event) => {
                        if let Err(e) = events.send(InboundEvent::Callback(event)).await {
                            debug!(error = %e, "dropping callback after shutdown");
                        }
                    }
                    None => debug!(id = ?query.id, "ignoring callback without data"),
                }
                respond(())
            }
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(on_message))
            .branch(Update::filter_callback_query().endpoint(on_callback));

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|_| async {})
            .build();

        let watcher = tokio::spawn(stop_on_cancel(dispatcher.shutdown_token(), cancel));

        let listener = Polling::builder(self.bot)
            .timeout(self.timeout)
            .build();

        info!(timeout_secs = self.timeout.as_secs(), "Telegram polling started");
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("Telegram update listener error"),
            )
            .await;

        watcher.abort();
        info!("Telegram polling stopped");
    }
}

async fn stop_on_cancel(shutdown: ShutdownToken, cancel: CancellationToken) {
    cancel.cancelled().await;
    loop {
        match shutdown.shutdown() {
            Ok(done) => {
                done.await;
                return;
            }
            // The dispatcher has not started yet.
            Err(_) => tokio::time::sleep(SHUTDOWN_RETRY).await,
        }
    }
}
