// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recent messages per chat, used to describe newly created issues.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use ticketbridge_core::{ChatId, ChatMessage};

/// Bounded per-chat ring buffer of recent messages.
#[derive(Debug)]
pub struct ChatHistory {
    chats: Mutex<HashMap<ChatId, VecDeque<ChatMessage>>>,
    limit: usize,
}

impl ChatHistory {
    /// A limit of zero falls back to 10.
    pub fn new(limit: usize) -> Self {
        Self {
            chats: Mutex::new(HashMap::new()),
            limit: if limit == 0 { 10 } else { limit },
        }
    }

    pub fn push(&self, message: ChatMessage) {
        let mut chats = self.chats.lock().unwrap_or_else(|e| e.into_inner());
        let buffer = chats.entry(message.chat_id).or_default();
        buffer.push_back(message);
        while buffer.len() > self.limit {
            buffer.pop_front();
        }
    }

    /// Oldest first.
    pub fn messages(&self, chat_id: ChatId) -> Vec<ChatMessage> {
        self.chats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&chat_id)
            .map(|buffer| buffer.iter().cloned().collect())
            .unwrap_or_default()
    }
}
