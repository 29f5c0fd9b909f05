// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Jira REST v3 request and response bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketbridge_core::AdfDocument;

// --- Issue creation ---

#[derive(Debug, Clone, Serialize)]
pub struct CreateIssueRequest {
    pub fields: CreateIssueFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateIssueFields {
    pub project: ProjectRef,
    #[serde(rename = "issuetype")]
    pub issue_type: IssueTypeRef,
    pub summary: String,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<AdfDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectRef {
    pub key: String,
}

/// Issue type by numeric id or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IssueTypeRef {
    Id { id: String },
    Name { name: String },
}

impl IssueTypeRef {
    /// A purely numeric value is an id, anything else a name.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
            Self::Id { id: value.into() }
        } else {
            Self::Name { name: value.into() }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIssueResponse {
    pub key: String,
}

// --- Issue reads ---

#[derive(Debug, Clone, Deserialize)]
pub struct IssueResponse {
    pub key: String,
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IssueFields {
    pub summary: String,
    pub status: Option<Named>,
    pub assignee: Option<Person>,
    pub priority: Option<Named>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Person {
    pub display_name: String,
    pub email_address: String,
}

impl Person {
    /// Display name, or the email when the name is hidden.
    pub fn label(&self) -> String {
        if self.display_name.trim().is_empty() {
            self.email_address.clone()
        } else {
            self.display_name.clone()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionResponse {
    pub fields: DescriptionFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DescriptionFields {
    pub description: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateDescriptionRequest<'a> {
    pub fields: UpdateDescriptionFields<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateDescriptionFields<'a> {
    pub description: &'a AdfDocument,
}

// --- Transitions ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransitionsResponse {
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub to: Named,
}

impl Transition {
    /// True when the transition or its target status is called `status`.
    pub fn reaches(&self, status: &str) -> bool {
        self.to.name.eq_ignore_ascii_case(status) || self.name.eq_ignore_ascii_case(status)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionRequest {
    pub transition: TransitionId,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionId {
    pub id: String,
}

// --- Comments ---

#[derive(Debug, Clone, Serialize)]
pub struct CommentRequest {
    pub body: AdfDocument,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentsResponse {
    pub comments: Vec<ApiComment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiComment {
    pub id: String,
    /// Plain string on some deployments, an ADF document on Cloud.
    pub body: serde_json::Value,
    pub rendered_body: Option<String>,
    pub created: Option<String>,
    pub author: Option<Person>,
}

// --- Attachments ---

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentResponse {
    pub id: String,
}

// --- Errors ---

/// Jira's error envelope.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub error_messages: Vec<String>,
    pub errors: BTreeMap<String, String>,
}

impl ApiErrorResponse {
    /// All messages joined, or `None` when the envelope is empty.
    pub fn summary(&self) -> Option<String> {
        let parts: Vec<String> = self
            .error_messages
            .iter()
            .cloned()
            .chain(self.errors.iter().map(|(field, msg)| format!("{field}: {msg}")))
            .collect();
        (!parts.is_empty()).then(|| parts.join("; "))
    }
}

// --- Helpers ---

const TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"];

/// Parses Jira timestamps, e.g. `2026-03-10T09:15:00.000+0300` or RFC 3339.
pub fn parse_jira_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    TIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Plain text of a comment body, which is either a string or raw ADF.
///
/// Walks the JSON instead of the typed model so that lists, mentions and
/// other nodes the typed model skips still contribute their text.
pub fn body_text(body: &serde_json::Value) -> String {
    let mut out = String::new();
    collect_text(body, &mut out);
    out.trim().to_string()
}

fn collect_text(node: &serde_json::Value, out: &mut String) {
    use serde_json::Value;
    match node {
        Value::String(s) => out.push_str(s),
        Value::Array(items) => items.iter().for_each(|item| collect_text(item, out)),
        Value::Object(map) => {
            let kind = map.get("type").and_then(Value::as_str).unwrap_or_default();
            match kind {
                "hardBreak" => out.push('\n'),
                "text" => {
                    if let Some(text) = map.get("text").and_then(Value::as_str) {
                        out.push_str(text);
                    }
                }
                "mention" | "emoji" => {
                    if let Some(text) = map
                        .get("attrs")
                        .and_then(|a| a.get("text"))
                        .and_then(Value::as_str)
                    {
                        out.push_str(text);
                    }
                }
                _ => {
                    if let Some(content) = map.get("content") {
                        let start = out.len();
                        collect_text(content, out);
                        if kind == "paragraph" && out.len() > start {
                            out.push('\n');
                        }
                    }
                }
            }
        }
        _ => {}
    }
}
