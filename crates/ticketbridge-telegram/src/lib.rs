// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram adapter for ticketbridge.
//!
//! Implements [`MessagingGateway`] for the Telegram Bot API via teloxide and
//! feeds incoming messages and button presses into the bridge through a
//! long-polling dispatcher.

pub mod convert;
pub mod polling;

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, ChatId as TelegramChatId, FileId, InlineKeyboardButton, InlineKeyboardMarkup,
    MessageId, ParseMode, ReactionType, Recipient,
};
use tracing::{debug, info, warn};

use ticketbridge_config::TelegramConfig;
use ticketbridge_core::{ActionButton, BridgeError, ChatId, FileRef, MessagingGateway};

pub use polling::UpdatePoller;

const TELEGRAM_FILE_URL: &str = "https://api.telegram.org/file";

/// Telegram gateway implementing [`MessagingGateway`].
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
    token: String,
    bot_username: String,
}

impl TelegramGateway {
    /// Creates a gateway for a bot whose username is already known.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig, bot_username: &str) -> Result<Self, BridgeError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            BridgeError::Config("telegram.bot_token is required for the Telegram gateway".into())
        })?;

        if token.is_empty() {
            return Err(BridgeError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        Ok(Self {
            bot: Bot::new(token),
            token: token.to_string(),
            bot_username: bot_username.trim_start_matches('@').to_string(),
        })
    }

    /// Creates a gateway and resolves the bot username with `getMe`.
    pub async fn connect(config: &TelegramConfig) -> Result<Self, BridgeError> {
        let mut gateway = Self::new(config, "")?;
        let me = gateway
            .bot
            .get_me()
            .await
            .map_err(|e| BridgeError::channel(format!("getMe failed: {e}"), e))?;
        gateway.bot_username = me.user.username.clone().unwrap_or_default();
        info!(username = %gateway.bot_username, "Telegram bot connected");
        Ok(gateway)
    }

    /// The underlying teloxide bot, for the update poller.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    async fn file_path(&self, file: &FileRef) -> Result<String, BridgeError> {
        let info = self
            .bot
            .get_file(FileId(file.file_id.clone()))
            .await
            .map_err(|e| BridgeError::channel(format!("failed to get file info: {e}"), e))?;
        Ok(info.path)
    }
}

fn recipient(chat_id: ChatId) -> Recipient {
    Recipient::Id(TelegramChatId(chat_id))
}

fn keyboard(actions: Vec<Vec<ActionButton>>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(actions.into_iter().map(|row| {
        row.into_iter()
            .map(|action| InlineKeyboardButton::callback(action.label, action.data))
            .collect::<Vec<_>>()
    }))
}

fn is_markup_error(error: &teloxide::RequestError) -> bool {
    error.to_string().contains("can't parse entities")
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    fn bot_username(&self) -> &str {
        &self.bot_username
    }

    async fn send_message(&self, chat_id: ChatId, html: &str) -> Result<(), BridgeError> {
        let result = self
            .bot
            .send_message(recipient(chat_id), html)
            .parse_mode(ParseMode::Html)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_markup_error(&e) => {
                warn!(chat_id, error = %e, "HTML rejected, sending as plain text");
                self.bot
                    .send_message(recipient(chat_id), html)
                    .await
                    .map(|_| ())
                    .map_err(|e| BridgeError::channel(format!("failed to send message: {e}"), e))
            }
            Err(e) => Err(BridgeError::channel(
                format!("failed to send message: {e}"),
                e,
            )),
        }
    }

    async fn send_rich_message(
        &self,
        chat_id: ChatId,
        html: &str,
        actions: Vec<Vec<ActionButton>>,
    ) -> Result<(), BridgeError> {
        let markup = keyboard(actions);
        let result = self
            .bot
            .send_message(recipient(chat_id), html)
            .parse_mode(ParseMode::Html)
            .reply_markup(markup.clone())
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_markup_error(&e) => {
                warn!(chat_id, error = %e, "HTML rejected, sending as plain text");
                self.bot
                    .send_message(recipient(chat_id), html)
                    .reply_markup(markup)
                    .await
                    .map(|_| ())
                    .map_err(|e| BridgeError::channel(format!("failed to send message: {e}"), e))
            }
            Err(e) => Err(BridgeError::channel(
                format!("failed to send message: {e}"),
                e,
            )),
        }
    }

    async fn set_reaction(
        &self,
        chat_id: ChatId,
        message_id: i32,
        emoji: &str,
    ) -> Result<(), BridgeError> {
        self.bot
            .set_message_reaction(recipient(chat_id), MessageId(message_id))
            .reaction(vec![ReactionType::Emoji {
                emoji: emoji.to_string(),
            }])
            .await
            .map_err(|e| BridgeError::channel(format!("failed to set reaction: {e}"), e))?;
        Ok(())
    }

    async fn fetch_file_url(&self, file: &FileRef) -> Result<String, BridgeError> {
        let path = self.file_path(file).await?;
        Ok(format!("{TELEGRAM_FILE_URL}/bot{}/{path}", self.token))
    }

    async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>, BridgeError> {
        let path = self.file_path(file).await?;

        let mut buf = Vec::new();
        self.bot
            .download_file(&path, &mut buf)
            .await
            .map_err(|e| BridgeError::channel(format!("failed to download file: {e}"), e))?;

        debug!(
            file_id = %file.file_id,
            kind = %file.kind,
            size = buf.len(),
            "downloaded file from Telegram"
        );
        Ok(buf)
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), BridgeError> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .await
            .map_err(|e| BridgeError::channel(format!("failed to answer callback: {e}"), e))?;
        Ok(())
    }
}
