// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use tracing::{debug, info, warn};

use ticketbridge_core::{BridgeError, CallbackEvent};

use super::{BridgeContext, send_issue_status};
use crate::render;

/// Inline-button presses: `reopen|KEY`, `status|KEY` and `addinfo|KEY`.
pub async fn handle_callback(ctx: &BridgeContext, event: &CallbackEvent) -> Result<(), BridgeError> {
    if let Err(e) = ctx.gateway.answer_callback(&event.id).await {
        warn!(callback_id = %event.id, error = %e, "failed to answer callback");
    }

    let (action, key) = event
        .data
        .split_once('|')
        .unwrap_or((event.data.as_str(), ""));
    let key = key.trim();
    if key.is_empty() {
        debug!(data = %event.data, "callback without issue key");
        return Ok(());
    }

    match action {
        "reopen" => reopen(ctx, event, key).await,
        "status" => send_issue_status(ctx, event.chat_id, key).await,
        "addinfo" => {
            ctx.gateway
                .send_message(event.chat_id, &render::add_info_prompt(key))
                .await
        }
        other => {
            debug!(action = other, key, "ignoring unknown callback action");
            Ok(())
        }
    }
}

async fn reopen(ctx: &BridgeContext, event: &CallbackEvent, key: &str) -> Result<(), BridgeError> {
    let Some(target) = ctx.reopen_status.as_deref() else {
        debug!(key, "reopen requested but no reopen status is configured");
        return Ok(());
    };

    if ctx.registry.get(key).is_none() {
        return ctx
            .gateway
            .send_message(event.chat_id, &render::too_old_to_reopen(key))
            .await;
    }

    if let Err(e) = ctx.tracker.transition_issue_to_status(key, target).await {
        let html = render::action_failed("reopen", key, &e.to_string());
        if let Err(send_err) = ctx.gateway.send_message(event.chat_id, &html).await {
            warn!(key, error = %send_err, "failed to report reopen failure");
        }
        return Err(e);
    }
    info!(key, status = target, user = %event.from.handle_or_name(), "ticket reopened from chat");

    let comment = render::reopen_comment(&event.from, event.chat_title.as_deref());
    if let Err(e) = ctx.tracker.add_comment(key, &comment).await {
        warn!(key, error = %e, "failed to comment on reopened ticket");
    }

    send_issue_status(ctx, event.chat_id, key).await
}
