// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of teloxide updates into bridge events.
//!
//! Only the parts the bridge acts on are carried over: text or caption, the
//! replied-to message, the media-group id and file references. Files are not
//! downloaded here; handlers fetch them on demand through the gateway.

use teloxide::types::{CallbackQuery, Message, User};
use ticketbridge_core::{CallbackEvent, ChatMessage, ChatUser, FileKind, FileRef, ReplyRef};

/// Converts a Telegram user into a chat participant.
pub fn chat_user(user: &User) -> ChatUser {
    ChatUser {
        id: user.id.0,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

/// Converts a Telegram message into a [`ChatMessage`].
pub fn chat_message(msg: &Message) -> ChatMessage {
    ChatMessage {
        chat_id: msg.chat.id.0,
        chat_title: msg.chat.title().map(str::to_string),
        message_id: msg.id.0,
        from: msg.from.as_ref().map(chat_user),
        text: msg.text().map(str::to_string),
        caption: msg.caption().map(str::to_string),
        reply_to: msg.reply_to_message().map(reply_ref),
        media_group_id: msg.media_group_id().map(|id| id.to_string()),
        files: file_refs(msg),
        sent_at: msg.date,
    }
}

fn reply_ref(parent: &Message) -> ReplyRef {
    let from = parent.from.as_ref();
    ReplyRef {
        message_id: parent.id.0,
        from_username: from.and_then(|u| u.username.clone()),
        from_is_bot: from.is_some_and(|u| u.is_bot),
        text: parent
            .text()
            .or_else(|| parent.caption())
            .unwrap_or_default()
            .to_string(),
    }
}

/// File references carried by a message. Of a photo only the largest size
/// is kept.
pub fn file_refs(msg: &Message) -> Vec<FileRef> {
    let mut files = Vec::new();

    // Telegram lists photo sizes in ascending order.
    if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
        files.push(FileRef {
            file_id: largest.file.id.to_string(),
            file_name: None,
            kind: FileKind::Photo,
        });
    }
    if let Some(doc) = msg.document() {
        files.push(FileRef {
            file_id: doc.file.id.to_string(),
            file_name: doc.file_name.clone(),
            kind: FileKind::Document,
        });
    }
    if let Some(video) = msg.video() {
        files.push(FileRef {
            file_id: video.file.id.to_string(),
            file_name: video.file_name.clone(),
            kind: FileKind::Video,
        });
    }
    if let Some(audio) = msg.audio() {
        files.push(FileRef {
            file_id: audio.file.id.to_string(),
            file_name: audio.file_name.clone(),
            kind: FileKind::Audio,
        });
    }
    if let Some(voice) = msg.voice() {
        files.push(FileRef {
            file_id: voice.file.id.to_string(),
            file_name: None,
            kind: FileKind::Voice,
        });
    }
    files
}

/// Converts an inline-button press. Returns `None` when the press carries no
/// data or the originating message is no longer known.
pub fn callback_event(query: &CallbackQuery) -> Option<CallbackEvent> {
    let data = query.data.as_deref().filter(|d| !d.is_empty())?;
    let chat = query.message.as_ref()?.chat();
    Some(CallbackEvent {
        id: query.id.to_string(),
        chat_id: chat.id.0,
        chat_title: chat.title().map(str::to_string),
        from: chat_user(&query.from),
        data: data.to_string(),
    })
}
