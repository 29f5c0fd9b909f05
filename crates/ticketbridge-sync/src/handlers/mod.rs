// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive flows triggered by chat events.

mod callback;
mod comment;
mod create;
mod status;

use std::sync::Arc;

use ticketbridge_config::TicketbridgeConfig;
use ticketbridge_core::{
    BridgeError, ChatMessage, IssueKeyMatcher, IssueTracker, MessagingGateway, StatusVocabulary,
};
use ticketbridge_registry::TicketRegistry;

use crate::history::ChatHistory;
use crate::render;

pub use callback::handle_callback;
pub use comment::ReplyCommentHandler;
pub use create::create_issue;
pub use status::{send_issue_status, status_issue};

/// Everything a handler needs, shared by all workers.
pub struct BridgeContext {
    pub registry: Arc<TicketRegistry>,
    pub tracker: Arc<dyn IssueTracker>,
    pub gateway: Arc<dyn MessagingGateway>,
    pub history: ChatHistory,
    pub keys: IssueKeyMatcher,
    pub vocabulary: StatusVocabulary,
    /// Target of the "Reopen" button. `None` disables reopening.
    pub reopen_status: Option<String>,
    /// Reaction set on a chat reply once it reached the tracker. Empty disables it.
    pub reaction_emoji: String,
}

impl BridgeContext {
    pub fn new(
        registry: Arc<TicketRegistry>,
        tracker: Arc<dyn IssueTracker>,
        gateway: Arc<dyn MessagingGateway>,
        config: &TicketbridgeConfig,
    ) -> Result<Self, BridgeError> {
        let keys = IssueKeyMatcher::new(tracker.project_key())?;
        Ok(Self {
            registry,
            tracker,
            gateway,
            history: ChatHistory::new(config.bridge.history_limit),
            keys,
            vocabulary: StatusVocabulary::new(&config.bridge.terminal_statuses),
            reopen_status: config
                .jira
                .reopen_status
                .clone()
                .filter(|s| !s.trim().is_empty()),
            reaction_emoji: config.telegram.reaction_emoji.clone(),
        })
    }

    /// Issue a chat reply should be commented on: the message replies to a
    /// bot message that invites replies and names an issue.
    pub fn reply_issue_key(&self, message: &ChatMessage) -> Option<String> {
        if !message.is_reply_to(self.gateway.bot_username()) {
            return None;
        }
        let replied = message.reply_to.as_ref()?.text.as_str();
        if !accepts_replies(replied) {
            return None;
        }
        self.keys.find(replied)
    }
}

/// Only forwarded comments and status cards invite replies.
fn accepts_replies(reply_text: &str) -> bool {
    reply_text.contains(render::ANCHOR_REPLY_TO_COMMENT)
        || reply_text.contains(render::ANCHOR_REPLY_TO_STATUS)
}

/// Drop a leading `/command` or `/command@bot` token.
pub(crate) fn strip_command(text: &str) -> &str {
    let text = text.trim_start();
    if !text.starts_with('/') {
        return text;
    }
    match text.split_once(char::is_whitespace) {
        Some((_, rest)) => rest.trim_start(),
        None => "",
    }
}

/// True when `text` starts with `command`, optionally addressed as `command@bot`.
pub(crate) fn is_command(text: &str, command: &str, bot_username: &str) -> bool {
    let first = text.split_whitespace().next().unwrap_or_default();
    match first.split_once('@') {
        Some((name, bot)) => name == command && bot.eq_ignore_ascii_case(bot_username),
        None => first == command,
    }
}
