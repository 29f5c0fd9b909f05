// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use ticketbridge_core::{BridgeError, ChatMessage};

use super::BridgeContext;
use crate::media_group::BatchHandler;
use crate::render;

/// Turns a chat reply to a bot message (possibly an album) into one tracker
/// comment plus attachments on the issue named in the replied message.
pub struct ReplyCommentHandler {
    ctx: Arc<BridgeContext>,
}

impl ReplyCommentHandler {
    pub fn new(ctx: Arc<BridgeContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BatchHandler for ReplyCommentHandler {
    async fn handle_batch(&self, batch: Vec<ChatMessage>) -> Result<(), BridgeError> {
        let ctx = &self.ctx;
        let Some((anchor, key)) = batch
            .iter()
            .find_map(|m| ctx.reply_issue_key(m).map(|key| (m, key)))
        else {
            let chat_id = batch.first().map(|m| m.chat_id);
            warn!(?chat_id, size = batch.len(), "reply batch names no issue, dropping it");
            return Ok(());
        };
        let reply_text = anchor
            .reply_to
            .as_ref()
            .map(|r| r.text.as_str())
            .unwrap_or_default();

        let combined = batch
            .iter()
            .filter_map(ChatMessage::content)
            .collect::<Vec<_>>()
            .join(", ");
        let body = render::tracker_comment_from_chat(
            &combined,
            anchor.from.as_ref(),
            anchor.chat_title.as_deref(),
            reply_text,
        );

        for (i, file) in batch.iter().flat_map(|m| &m.files).enumerate() {
            let filename = file.upload_name(i + 1);
            let bytes = match ctx.gateway.download_file(file).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(key = %key, filename = %filename, error = %e, "failed to download reply file");
                    continue;
                }
            };
            if let Err(e) = ctx.tracker.add_attachment(&key, &filename, bytes).await {
                warn!(key = %key, filename = %filename, error = %e, "failed to upload attachment");
            }
        }

        ctx.tracker.add_comment(&key, &body).await?;
        info!(key = %key, messages = batch.len(), "chat reply added as comment");

        if !ctx.reaction_emoji.is_empty()
            && let Err(e) = ctx
                .gateway
                .set_reaction(anchor.chat_id, anchor.message_id, &ctx.reaction_emoji)
                .await
        {
            warn!(key = %key, error = %e, "failed to react to chat reply");
        }
        Ok(())
    }
}
