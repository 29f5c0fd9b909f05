// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging gateway trait for the chat platform (Telegram and test doubles).

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::types::{ActionButton, ChatId, FileRef};

/// Outbound side of the chat platform. Texts are HTML.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Username of the bot account, without `@`.
    fn bot_username(&self) -> &str;

    async fn send_message(&self, chat_id: ChatId, html: &str) -> Result<(), BridgeError>;

    /// Sends a message with rows of inline buttons.
    async fn send_rich_message(
        &self,
        chat_id: ChatId,
        html: &str,
        actions: Vec<Vec<ActionButton>>,
    ) -> Result<(), BridgeError>;

    /// Lightweight acknowledgment of a processed message.
    async fn set_reaction(
        &self,
        chat_id: ChatId,
        message_id: i32,
        emoji: &str,
    ) -> Result<(), BridgeError>;

    /// Resolves a platform file reference to a download URL.
    async fn fetch_file_url(&self, file: &FileRef) -> Result<String, BridgeError>;

    /// Downloads the bytes behind a file reference.
    async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>, BridgeError>;

    /// Stops the client-side spinner on a pressed inline button.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), BridgeError>;
}
