// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging gateway that captures outgoing traffic.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use ticketbridge_core::{ActionButton, BridgeError, ChatId, FileRef, MessagingGateway};

/// A message passed to `send_message` or `send_rich_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub html: String,
    pub actions: Vec<Vec<ActionButton>>,
}

impl SentMessage {
    /// Callback payloads of every button, row by row.
    pub fn action_data(&self) -> Vec<String> {
        self.actions
            .iter()
            .flatten()
            .map(|a| a.data.clone())
            .collect()
    }
}

/// A mock chat platform for testing.
///
/// Sent messages, reactions and answered callbacks are recorded. Files are
/// served from an in-memory map seeded with [`MockGateway::add_file`].
#[derive(Clone)]
pub struct MockGateway {
    bot_username: String,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    reactions: Arc<Mutex<Vec<(ChatId, i32, String)>>>,
    answered: Arc<Mutex<Vec<String>>>,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_sends: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl MockGateway {
    pub fn new(bot_username: &str) -> Self {
        Self {
            bot_username: bot_username.to_string(),
            sent: Arc::new(Mutex::new(Vec::new())),
            reactions: Arc::new(Mutex::new(Vec::new())),
            answered: Arc::new(Mutex::new(Vec::new())),
            files: Arc::new(Mutex::new(HashMap::new())),
            fail_sends: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub async fn add_file(&self, file_id: &str, bytes: &[u8]) {
        self.files
            .lock()
            .await
            .insert(file_id.to_string(), bytes.to_vec());
    }

    /// Make every send fail until reset.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// `(chat_id, message_id, emoji)` of every reaction.
    pub async fn reactions(&self) -> Vec<(ChatId, i32, String)> {
        self.reactions.lock().await.clone()
    }

    pub async fn answered_callbacks(&self) -> Vec<String> {
        self.answered.lock().await.clone()
    }

    /// Wait until at least `n` reactions have been recorded.
    pub async fn wait_for_reactions(&self, n: usize) {
        loop {
            let notified = self.notify.notified();
            if self.reactions.lock().await.len() >= n {
                return;
            }
            notified.await;
        }
    }

    /// Wait until at least `n` messages have been sent.
    pub async fn wait_for_sent(&self, n: usize) {
        loop {
            let notified = self.notify.notified();
            if self.sent.lock().await.len() >= n {
                return;
            }
            notified.await;
        }
    }

    async fn record(
        &self,
        chat_id: ChatId,
        html: &str,
        actions: Vec<Vec<ActionButton>>,
    ) -> Result<(), BridgeError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BridgeError::Channel {
                message: "injected send failure".to_string(),
                source: None,
            });
        }
        self.sent.lock().await.push(SentMessage {
            chat_id,
            html: html.to_string(),
            actions,
        });
        self.notify.notify_waiters();
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for MockGateway {
    fn bot_username(&self) -> &str {
        &self.bot_username
    }

    async fn send_message(&self, chat_id: ChatId, html: &str) -> Result<(), BridgeError> {
        self.record(chat_id, html, Vec::new()).await
    }

    async fn send_rich_message(
        &self,
        chat_id: ChatId,
        html: &str,
        actions: Vec<Vec<ActionButton>>,
    ) -> Result<(), BridgeError> {
        self.record(chat_id, html, actions).await
    }

    async fn set_reaction(
        &self,
        chat_id: ChatId,
        message_id: i32,
        emoji: &str,
    ) -> Result<(), BridgeError> {
        self.reactions
            .lock()
            .await
            .push((chat_id, message_id, emoji.to_string()));
        self.notify.notify_waiters();
        Ok(())
    }

    async fn fetch_file_url(&self, file: &FileRef) -> Result<String, BridgeError> {
        Ok(format!("https://files.test/{}", file.file_id))
    }

    async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>, BridgeError> {
        self.files
            .lock()
            .await
            .get(&file.file_id)
            .cloned()
            .ok_or_else(|| BridgeError::Channel {
                message: format!("unknown file {}", file.file_id),
                source: None,
            })
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), BridgeError> {
        self.answered.lock().await.push(callback_id.to_string());
        Ok(())
    }
}
