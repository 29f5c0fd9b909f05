// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use tracing::{debug, warn};

use ticketbridge_core::{ActionButton, BridgeError, ChatId, ChatMessage};

use super::{BridgeContext, strip_command};
use crate::render;

/// `/status_issue [KEY]`. Without a key in the command or in the replied
/// message, sends the digest of the chat's tickets.
pub async fn status_issue(ctx: &BridgeContext, message: &ChatMessage) -> Result<(), BridgeError> {
    let key = ctx
        .keys
        .find(strip_command(message.text_or_empty()))
        .or_else(|| {
            message
                .reply_to
                .as_ref()
                .and_then(|reply| ctx.keys.find(&reply.text))
        });

    match key {
        Some(key) => send_issue_status(ctx, message.chat_id, &key).await,
        None => {
            let tickets = ctx.registry.list_by_chat_id(message.chat_id);
            debug!(chat_id = message.chat_id, tickets = tickets.len(), "sending chat digest");
            let html = render::chat_digest(&tickets, &ctx.vocabulary);
            ctx.gateway.send_message(message.chat_id, &html).await
        }
    }
}

/// Refresh one registered ticket from the tracker and post its status.
pub async fn send_issue_status(
    ctx: &BridgeContext,
    chat_id: ChatId,
    key: &str,
) -> Result<(), BridgeError> {
    let Some(ticket) = ctx.registry.get(key) else {
        return ctx
            .gateway
            .send_message(chat_id, &render::issue_not_registered(key))
            .await;
    };

    let issue = match ctx.tracker.get_issue_status(key).await {
        Ok(issue) => issue,
        Err(BridgeError::NotFound { .. }) => {
            return ctx
                .gateway
                .send_message(chat_id, &render::issue_not_found(key))
                .await;
        }
        Err(e) => {
            warn!(key, error = %e, "failed to fetch issue status");
            let html = render::action_failed("get info for", key, &e.to_string());
            return ctx.gateway.send_message(chat_id, &html).await;
        }
    };

    ctx.registry.update_status(key, &issue.status);
    let html = render::issue_status(&issue, &ticket.name, &ticket.creator_username);

    if ctx.reopen_status.is_some() && ctx.vocabulary.is_terminal(&issue.status) {
        let actions = vec![
            vec![ActionButton::new("Reopen", format!("reopen|{key}"))],
            vec![ActionButton::new("Refresh status", format!("status|{key}"))],
        ];
        ctx.gateway.send_rich_message(chat_id, &html, actions).await
    } else {
        ctx.gateway.send_message(chat_id, &html).await
    }
}
