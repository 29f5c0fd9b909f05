// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes inbound chat events to handlers.

use std::sync::Arc;

use tracing::debug;

use ticketbridge_core::{BridgeError, ChatMessage, InboundEvent};

use crate::handlers::{self, BridgeContext, is_command};
use crate::media_group::MediaGroupAggregator;

pub const CREATE_COMMAND: &str = "/create_issue";
pub const STATUS_COMMAND: &str = "/status_issue";

/// Routes each event to exactly one flow.
///
/// In order: create (`/create_issue` or a leading `@bot` mention), reply to
/// a forwarded comment or status card naming an issue (comment, batched by
/// media group), `/status_issue`. Any other message only feeds the chat
/// history, including replies to other bot notices.
#[derive(Clone)]
pub struct Dispatcher {
    ctx: Arc<BridgeContext>,
    media_groups: MediaGroupAggregator,
}

impl Dispatcher {
    pub fn new(ctx: Arc<BridgeContext>, media_groups: MediaGroupAggregator) -> Self {
        Self { ctx, media_groups }
    }

    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.ctx
    }

    pub async fn dispatch(&self, event: InboundEvent) -> Result<(), BridgeError> {
        match event {
            InboundEvent::Callback(callback) => {
                handlers::handle_callback(&self.ctx, &callback).await
            }
            InboundEvent::Message(message) => self.dispatch_message(message).await,
        }
    }

    async fn dispatch_message(&self, message: ChatMessage) -> Result<(), BridgeError> {
        let bot = self.ctx.gateway.bot_username();
        let text = message.text_or_empty().trim_start();

        if is_command(text, CREATE_COMMAND, bot) || mentions_first(text, bot) {
            debug!(chat_id = message.chat_id, "routing to create issue");
            return handlers::create_issue(&self.ctx, &message).await;
        }
        if self.ctx.reply_issue_key(&message).is_some() {
            debug!(
                chat_id = message.chat_id,
                media_group_id = ?message.media_group_id,
                "routing reply to comment flow"
            );
            return self.media_groups.submit(message).await;
        }
        if is_command(text, STATUS_COMMAND, bot) {
            return handlers::status_issue(&self.ctx, &message).await;
        }
        self.ctx.history.push(message);
        Ok(())
    }
}

/// True when `text` opens with an `@bot` mention.
fn mentions_first(text: &str, bot_username: &str) -> bool {
    text.split_whitespace()
        .next()
        .and_then(|first| first.strip_prefix('@'))
        .is_some_and(|name| !bot_username.is_empty() && name.eq_ignore_ascii_case(bot_username))
}
