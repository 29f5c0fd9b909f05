// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use tracing::{info, warn};

use ticketbridge_core::{BridgeError, ChatMessage};

use super::{BridgeContext, send_issue_status, strip_command};
use crate::render;

/// Create an issue from the chat's recent history and register it.
///
/// The payload after the command (or after the leading `@bot` mention) names
/// the ticket. Its first `@user` mention becomes the ticket's creator instead
/// of the sender.
pub async fn create_issue(ctx: &BridgeContext, message: &ChatMessage) -> Result<(), BridgeError> {
    let chat_id = message.chat_id;
    let history = ctx.history.messages(chat_id);
    let title = render::issue_title(message.chat_title.as_deref());
    let description = render::description_from_history(&title, &history);

    let created = match ctx.tracker.create_issue(&title, description).await {
        Ok(created) => created,
        Err(e) => {
            warn!(chat_id, error = %e, "failed to create issue");
            let html = render::action_failed("create a ticket", "", &e.to_string());
            return ctx.gateway.send_message(chat_id, &html).await;
        }
    };
    info!(chat_id, key = %created.key, "issue created");

    let mut index = 0;
    for file in history.iter().flat_map(|m| &m.files) {
        index += 1;
        let bytes = match ctx.gateway.download_file(file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %created.key, file_id = %file.file_id, error = %e, "failed to download history file");
                continue;
            }
        };
        let filename = file.upload_name(index);
        match ctx.tracker.add_attachment(&created.key, &filename, bytes).await {
            Ok(id) => info!(key = %created.key, filename = %filename, attachment_id = %id, "attachment uploaded"),
            Err(e) => warn!(key = %created.key, filename = %filename, error = %e, "failed to upload attachment"),
        }
    }

    let (name, creator) = parse_payload(message, ctx.gateway.bot_username());
    ctx.registry.add(chat_id, &created.key, "", &name, &creator);

    let html = render::ticket_created(&title, &created.key, &created.url);
    if let Err(e) = ctx.gateway.send_message(chat_id, &html).await {
        warn!(key = %created.key, error = %e, "failed to announce created ticket");
    }
    send_issue_status(ctx, chat_id, &created.key).await
}

/// `(name, creator)` from the command payload.
fn parse_payload(message: &ChatMessage, bot_username: &str) -> (String, String) {
    let payload = strip_command(message.text_or_empty()).trim();
    let mention = format!("@{bot_username}");
    let payload = payload.strip_prefix(mention.as_str()).unwrap_or(payload);

    let mut creator = message
        .from
        .as_ref()
        .and_then(|u| u.username.clone())
        .unwrap_or_default();
    let mut fields: Vec<&str> = payload.split_whitespace().collect();
    if let Some(pos) = fields.iter().position(|f| f.starts_with('@') && f.len() > 1) {
        creator = fields.remove(pos)[1..].to_string();
    }
    (fields.join(" "), creator)
}
