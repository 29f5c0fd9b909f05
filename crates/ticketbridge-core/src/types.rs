// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the registry, the sync engine, and the adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a chat on the messaging platform.
pub type ChatId = i64;

/// One chat-originated tracker issue, as held by the ticket registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    /// Tracker issue key, e.g. `SUP-42`. Primary key of the registry.
    pub key: String,
    /// Free-text label supplied at creation. May be empty.
    pub name: String,
    /// Last observed tracker status name. Advisory only.
    pub status: String,
    /// Chat the ticket was created from.
    pub chat_id: ChatId,
    /// Chat handle of the user the ticket was created for.
    pub creator_username: String,
    /// Creation time of the newest tracker comment already forwarded to chat.
    /// `None` until the first comment is seen.
    pub last_comment_at: Option<DateTime<Utc>>,
}

impl TicketRecord {
    pub fn new(
        chat_id: ChatId,
        key: impl Into<String>,
        status: impl Into<String>,
        name: impl Into<String>,
        creator_username: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            status: status.into(),
            chat_id,
            creator_username: creator_username.into(),
            last_comment_at: None,
        }
    }
}

/// A chat participant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: u64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl ChatUser {
    /// Full name followed by the handle, e.g. `Ada Lovelace (@ada)`.
    pub fn full_name(&self) -> String {
        let mut name = self.first_name.clone();
        if let Some(last) = self.last_name.as_deref().filter(|l| !l.is_empty()) {
            name.push(' ');
            name.push_str(last);
        }
        match self.username.as_deref() {
            Some(handle) if !handle.is_empty() => format!("{name} (@{handle})"),
            _ => name,
        }
    }

    /// Handle if the user has one, otherwise the first name.
    pub fn handle_or_name(&self) -> String {
        self.username
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.first_name.clone())
    }
}

/// The kind of media attached to a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum FileKind {
    Photo,
    Document,
    Video,
    Audio,
    Voice,
}

impl FileKind {
    /// Extension used when the platform does not supply a file name.
    pub fn default_extension(self) -> &'static str {
        match self {
            Self::Photo => "jpg",
            Self::Document => "bin",
            Self::Video => "mp4",
            Self::Audio => "mp3",
            Self::Voice => "ogg",
        }
    }
}

/// A reference to a file hosted by the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Platform file identifier, resolved to a URL by the gateway.
    pub file_id: String,
    pub file_name: Option<String>,
    pub kind: FileKind,
}

impl FileRef {
    /// File name to use for an upload; falls back to `telegram_file_{index}.{ext}`.
    pub fn upload_name(&self, index: usize) -> String {
        match self.file_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("telegram_file_{index}.{}", self.kind.default_extension()),
        }
    }
}

/// The message an inbound message replies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    pub message_id: i32,
    pub from_username: Option<String>,
    pub from_is_bot: bool,
    pub text: String,
}

/// A chat message as seen by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub chat_id: ChatId,
    pub chat_title: Option<String>,
    pub message_id: i32,
    pub from: Option<ChatUser>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub reply_to: Option<ReplyRef>,
    /// Correlation id shared by the parts of a multi-attachment submission.
    pub media_group_id: Option<String>,
    pub files: Vec<FileRef>,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Text, or the caption when the message carries media.
    pub fn content(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.caption.as_deref().filter(|c| !c.is_empty()))
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// True when this message replies to a message sent by `bot_username`.
    pub fn is_reply_to(&self, bot_username: &str) -> bool {
        self.reply_to.as_ref().is_some_and(|r| {
            r.from_username
                .as_deref()
                .is_some_and(|u| u.eq_ignore_ascii_case(bot_username))
        })
    }
}

/// An inline-button press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackEvent {
    pub id: String,
    pub chat_id: ChatId,
    pub chat_title: Option<String>,
    pub from: ChatUser,
    pub data: String,
}

/// Everything the dispatcher can receive from the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Message(ChatMessage),
    Callback(CallbackEvent),
}

/// An inline button attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionButton {
    pub label: String,
    /// Opaque payload echoed back in a [`CallbackEvent`], e.g. `reopen|SUP-1`.
    pub data: String,
}

impl ActionButton {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Current tracker-side view of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueStatus {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub assignee: Option<String>,
    pub priority: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// A comment on a tracker issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerComment {
    pub id: String,
    /// Display name, or email when the tracker hides the name.
    pub author: String,
    pub created: DateTime<Utc>,
    /// Plain-text body.
    pub body: String,
    /// HTML rendering of the body, used for mention detection.
    pub rendered_body: String,
}

/// Result of creating an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub key: String,
    pub url: String,
}
