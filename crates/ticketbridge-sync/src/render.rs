// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat (HTML) and tracker (plain text / ADF) message texts.

use chrono::{DateTime, Local, Utc};
use ticketbridge_core::adf::Mark;
use ticketbridge_core::{
    AdfDocument, AdfNode, ChatMessage, ChatUser, IssueStatus, StatusVocabulary, TicketRecord,
};

/// Footer on forwarded comments. Replies to such a message go back to the tracker.
pub const ANCHOR_REPLY_TO_COMMENT: &str = "Reply to this message to answer in the ticket";

/// Footer on status messages. Replies to such a message are added as comments.
pub const ANCHOR_REPLY_TO_STATUS: &str =
    "‼️ To add information to this ticket, reply to this message ‼️";

/// Escape `&`, `<`, `>`, `"` and `'` for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Status name prefixed with a colour dot.
pub fn status_with_icon(status: &str) -> String {
    if status.is_empty() {
        return "Unknown".to_string();
    }
    let icon = match status.to_lowercase().as_str() {
        "open" | "to do" | "new" | "reopened" | "открыт" | "новая" | "к выполнению" => {
            Some("⚪")
        }
        "in progress" | "в работе" | "выполняется" => Some("🔵"),
        "done" | "closed" | "resolved" | "закрыт" | "решена" | "выполнена" | "готово" => {
            Some("🟢")
        }
        "blocked" | "cancelled" | "отменено" => Some("🔴"),
        "in review" | "на проверке" => Some("🟣"),
        _ => None,
    };
    match icon {
        Some(icon) => format!("{icon} {status}"),
        None => status.to_string(),
    }
}

fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|| "not set".to_string())
}

/// Summary of an issue created from a chat.
pub fn issue_title(chat_title: Option<&str>) -> String {
    match chat_title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => format!("Request from Telegram \"{title}\""),
        None => "Request from Telegram".to_string(),
    }
}

pub fn ticket_created(title: &str, key: &str, url: &str) -> String {
    format!(
        "🎉 <b>Ticket created</b>\n\n📚 <b>Title:</b> <code>{}</code>\n🗝️ <b>Key:</b> <code>{}</code>\n🔗 <b>Link:</b> <a href=\"{url}\">{}</a>",
        escape_html(title),
        escape_html(key),
        escape_html(url),
    )
}

pub fn ticket_closed(key: &str, status: &str, url: &str, creator: &str) -> String {
    let mut text = format!(
        "✅ <b>Ticket closed</b>\n\n🗝️ <b>Key:</b> <code>{}</code>\n📌 <b>Status:</b> {}\n🔗 <b>Link:</b> <a href=\"{url}\">{}</a>",
        escape_html(key),
        escape_html(status),
        escape_html(url),
    );
    if !creator.is_empty() {
        text.push_str(&format!("\n\n@{}, your ticket is closed.", escape_html(creator)));
    }
    text
}

/// A tracker comment forwarded into the ticket's chat.
pub fn comment_forwarded(key: &str, creator: &str, author: &str, body: &str) -> String {
    let addressee = if creator.is_empty() {
        String::new()
    } else {
        format!(" for @{}", escape_html(creator))
    };
    format!(
        "📬 Comment on <code>{}</code>\n👤 from {}{addressee}\n\n💬 <b>{}</b>\n\n📣 {ANCHOR_REPLY_TO_COMMENT}",
        escape_html(key),
        escape_html(author),
        escape_html(body),
    )
}

/// Detailed status of one issue.
pub fn issue_status(issue: &IssueStatus, name: &str, creator: &str) -> String {
    let summary = if name.trim().is_empty() {
        issue.summary.as_str()
    } else {
        name
    };
    let assignee = issue
        .assignee
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or("Unassigned");
    let mut text = format!(
        "📚 <b>Title:</b> <code>{}</code>\n🗝️ <b>Key:</b> <code>{}</code>\n\n📌 <b>Status:</b> {}\n👤 <b>Assignee:</b> {}\n\n🕑 <b>Created:</b> {}\n♻️ <b>Updated:</b> {}",
        escape_html(summary),
        escape_html(&issue.key),
        escape_html(&status_with_icon(&issue.status)),
        escape_html(assignee),
        format_date(issue.created),
        format_date(issue.updated),
    );
    if !creator.is_empty() {
        text.push_str(&format!("\n\n✍️ <b>Author:</b> @{}", escape_html(creator)));
    }
    text.push_str(&format!("\n\n<b>{ANCHOR_REPLY_TO_STATUS}</b>"));
    text
}

/// Digest of a chat's tickets: active first, then resolved.
pub fn chat_digest(tickets: &[TicketRecord], vocabulary: &StatusVocabulary) -> String {
    let mut out = String::from("🗂 <b>Tickets from this chat</b>\n\n");
    if tickets.is_empty() {
        out.push_str("No tickets have been created in this chat yet.\n");
    } else {
        let (ready, active): (Vec<&TicketRecord>, Vec<&TicketRecord>) = tickets
            .iter()
            .partition(|t| vocabulary.is_terminal(&t.status));
        let line = |t: &TicketRecord| {
            let name = if t.name.trim().is_empty() {
                issue_title(None)
            } else {
                t.name.trim().to_string()
            };
            format!(
                "• <code>{}</code> · {} · {}\n",
                escape_html(&t.key),
                escape_html(&name),
                escape_html(&status_with_icon(&t.status)),
            )
        };
        for ticket in &active {
            out.push_str(&line(ticket));
        }
        if !ready.is_empty() {
            if !active.is_empty() {
                out.push('\n');
            }
            out.push_str("<b>Resolved tickets</b>\n");
            for ticket in &ready {
                out.push_str(&line(ticket));
            }
        }
    }
    out.push_str("\nSend <code>/status_issue KEY-123</code> to see one ticket in detail.");
    out
}

pub fn issue_not_found(key: &str) -> String {
    format!("Ticket <code>{}</code> was not found", escape_html(key))
}

pub fn issue_not_registered(key: &str) -> String {
    format!(
        "Ticket <code>{}</code> was not created by this bot",
        escape_html(key)
    )
}

pub fn too_old_to_reopen(key: &str) -> String {
    format!(
        "Ticket <code>{}</code> is too old to be reopened from chat",
        escape_html(key)
    )
}

/// A failed interactive action, naming the action and the issue.
pub fn action_failed(action: &str, key: &str, detail: &str) -> String {
    if key.is_empty() {
        format!("⚠️ Could not {action}: {}", escape_html(detail))
    } else {
        format!(
            "⚠️ Could not {action} <code>{}</code>: {}",
            escape_html(key),
            escape_html(detail)
        )
    }
}

pub fn add_info_prompt(key: &str) -> String {
    format!(
        "🗝️ <code>{}</code>\n\n<b>{ANCHOR_REPLY_TO_STATUS}</b>",
        escape_html(key)
    )
}

/// Tracker comment carrying a chat message. When `reply_text` is a forwarded
/// comment, its body is quoted.
pub fn tracker_comment_from_chat(
    text: &str,
    author: Option<&ChatUser>,
    chat_title: Option<&str>,
    reply_text: &str,
) -> String {
    let mut out = String::from("💬 Message from Telegram");
    match chat_title.filter(|t| !t.is_empty()) {
        Some(title) => out.push_str(&format!(" ({title})\n")),
        None => out.push('\n'),
    }
    let author = author.map_or_else(|| "Unknown".to_string(), ChatUser::full_name);
    out.push_str(&format!("👤 Author: {author}\n"));
    out.push_str(text);

    if let Some(quoted) = quoted_comment(reply_text) {
        out.push_str("\n\n🔁 In reply to: ");
        out.push_str(&quoted);
    }
    out
}

/// Body of a forwarded comment, recovered from its chat rendering.
fn quoted_comment(reply_text: &str) -> Option<String> {
    if !reply_text.contains(ANCHOR_REPLY_TO_COMMENT) {
        return None;
    }
    // Header is two lines plus a blank line; footer is a blank line plus the anchor.
    let lines: Vec<&str> = reply_text.lines().collect();
    if lines.len() <= 5 {
        return None;
    }
    let body = lines[3..lines.len() - 2].join("\n");
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_string())
}

pub fn reopen_comment(user: &ChatUser, chat_title: Option<&str>) -> String {
    match chat_title.filter(|t| !t.is_empty()) {
        Some(title) => format!(
            "👤 {} in chat {title}\nrequested to reopen this ticket.",
            user.full_name()
        ),
        None => format!("👤 {} requested to reopen this ticket.", user.full_name()),
    }
}

/// Issue description built from recent chat history.
pub fn description_from_history(title: &str, history: &[ChatMessage]) -> AdfDocument {
    let mut blocks = vec![AdfNode::heading(3, format!("Subject: {title}"))];

    let Some(first) = history.first() else {
        blocks.push(AdfNode::paragraph("Chat history is empty"));
        return AdfDocument::new(blocks);
    };

    let chat_title = first.chat_title.as_deref().map(str::trim).unwrap_or_default();
    let heading = if chat_title.is_empty() {
        "Conversation from Telegram".to_string()
    } else {
        format!("Conversation from Telegram: {chat_title}")
    };
    blocks.push(AdfNode::heading(3, heading));

    for message in history {
        let Some(text) = message.content() else {
            continue;
        };
        let when = message
            .sent_at
            .with_timezone(&Local)
            .format("%d.%m.%y %H:%M");
        let who = message
            .from
            .as_ref()
            .map_or_else(|| "Unknown".to_string(), ChatUser::full_name);
        blocks.push(AdfNode::Paragraph {
            content: vec![AdfNode::marked_text(
                format!("{when} · {who}:"),
                vec![Mark::Strong],
            )],
        });
        blocks.push(AdfNode::panel("info", vec![AdfNode::paragraph(text)]));
    }

    blocks.push(AdfNode::Paragraph {
        content: vec![AdfNode::marked_text(
            "Generated automatically from the Telegram conversation",
            vec![Mark::Em],
        )],
    });
    AdfDocument::new(blocks)
}
