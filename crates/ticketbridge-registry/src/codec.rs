// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregate codec: the ticket registry as an ADF table and back.
//!
//! The aggregate issue's description holds one heading and one table. The
//! first row is a header; every further row is one ticket:
//!
//! | Key | Status | Name | Chat ID | Author | Last comment |
//!
//! Timestamps use `DD.MM.YYYY HH:MM:SS` in local time and are therefore
//! truncated to whole seconds. Cell text is written verbatim.
//!
//! Decoding is lenient. A malformed cell degrades to an empty string or
//! `None`/`0` for that field, a short row is skipped, and a document without
//! a table yields no records.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use ticketbridge_core::{AdfDocument, AdfNode, TicketRecord};
use tracing::debug;

/// Column titles of the header row.
pub const HEADER: [&str; 6] = ["Key", "Status", "Name", "Chat ID", "Author", "Last comment"];

/// Heading placed above the table.
pub const HEADING: &str = "Bot ticket registry";

/// `chrono` format of the last-comment column.
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Rows with fewer cells than this are skipped on decode.
const MIN_CELLS: usize = 4;

/// Encode records as an ADF document. Rows are sorted by key so repeated
/// flushes of the same state produce the same description.
pub fn encode(records: &[TicketRecord]) -> AdfDocument {
    let mut sorted: Vec<&TicketRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));

    let mut rows = Vec::with_capacity(sorted.len() + 1);
    rows.push(AdfNode::TableRow {
        content: HEADER
            .iter()
            .map(|title| AdfNode::TableHeader {
                content: vec![cell_paragraph(title)],
            })
            .collect(),
    });
    rows.extend(sorted.into_iter().map(encode_row));

    AdfDocument::new(vec![
        AdfNode::heading(2, HEADING),
        AdfNode::Table { content: rows },
    ])
}

fn encode_row(record: &TicketRecord) -> AdfNode {
    let chat_id = record.chat_id.to_string();
    let last_comment = record
        .last_comment_at
        .map(format_timestamp)
        .unwrap_or_default();
    let cells = [
        record.key.as_str(),
        record.status.as_str(),
        record.name.as_str(),
        chat_id.as_str(),
        record.creator_username.as_str(),
        last_comment.as_str(),
    ]
    .into_iter()
    .map(|text| AdfNode::TableCell {
        content: vec![cell_paragraph(text)],
    })
    .collect();
    AdfNode::TableRow { content: cells }
}

/// ADF rejects empty text nodes, so an empty cell is an empty paragraph.
fn cell_paragraph(text: &str) -> AdfNode {
    if text.is_empty() {
        AdfNode::Paragraph {
            content: Vec::new(),
        }
    } else {
        AdfNode::paragraph(text)
    }
}

/// Decode the first table of `doc` into records.
pub fn decode(doc: &AdfDocument) -> Vec<TicketRecord> {
    let Some(AdfNode::Table { content: rows }) = doc
        .content
        .iter()
        .find(|node| matches!(node, AdfNode::Table { .. }))
    else {
        debug!("aggregate document has no table");
        return Vec::new();
    };

    rows.iter()
        .skip(1)
        .filter_map(|row| match row {
            AdfNode::TableRow { content } => decode_row(content),
            _ => None,
        })
        .collect()
}

fn decode_row(cells: &[AdfNode]) -> Option<TicketRecord> {
    if cells.len() < MIN_CELLS {
        debug!(cells = cells.len(), "skipping short aggregate row");
        return None;
    }
    let text = |i: usize| cells.get(i).map(cell_text).unwrap_or_default();

    let key = text(0);
    if key.is_empty() {
        return None;
    }
    Some(TicketRecord {
        key,
        status: text(1),
        name: text(2),
        chat_id: text(3).trim().parse().unwrap_or_default(),
        creator_username: text(4),
        last_comment_at: parse_timestamp(&text(5)),
    })
}

/// Text of a cell: cell -> first paragraph -> its text nodes.
fn cell_text(cell: &AdfNode) -> String {
    let (AdfNode::TableCell { content } | AdfNode::TableHeader { content }) = cell else {
        return String::new();
    };
    content
        .iter()
        .find_map(|node| match node {
            AdfNode::Paragraph { content } => Some(
                content
                    .iter()
                    .filter_map(|inline| match inline {
                        AdfNode::Text { text, .. } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<String>(),
            ),
            _ => None,
        })
        .unwrap_or_default()
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a local-time cell value. Ambiguous wall-clock times (DST fold)
/// resolve to the earlier instant.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
