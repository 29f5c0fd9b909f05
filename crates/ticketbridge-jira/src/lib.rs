// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Jira Cloud adapter for ticketbridge.
//!
//! [`JiraTracker`] implements [`IssueTracker`] on top of the REST v3 API.
//! Issue bodies and comments are sent as Atlassian Document Format; comment
//! bodies are read back as plain text together with their HTML rendering,
//! which is what mention detection looks at.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::{debug, info};

use ticketbridge_config::JiraConfig;
use ticketbridge_core::{
    AdfDocument, BridgeError, CreatedIssue, IssueStatus, IssueTracker, TrackerComment,
};

use crate::client::{JiraClient, decode};
use crate::types::{
    AttachmentResponse, CommentRequest, CommentsResponse, CreateIssueFields, CreateIssueRequest,
    CreatedIssueResponse, DescriptionResponse, IssueResponse, IssueTypeRef, ProjectRef,
    TransitionId, TransitionRequest, TransitionsResponse, UpdateDescriptionFields,
    UpdateDescriptionRequest, body_text, parse_jira_time,
};

/// Label put on every issue the bridge creates.
const ISSUE_LABEL: &str = "telegram";

const STATUS_FIELDS: &str = "summary,status,assignee,priority,created,updated";

/// Jira issue tracker implementing [`IssueTracker`].
pub struct JiraTracker {
    client: JiraClient,
    project_key: String,
    issue_type: IssueTypeRef,
}

impl JiraTracker {
    /// Creates a tracker from the `[jira]` configuration section.
    pub fn new(config: &JiraConfig) -> Result<Self, BridgeError> {
        let required = |value: &Option<String>, name: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .ok_or_else(|| BridgeError::Config(format!("jira.{name} is required")))
        };
        let base_url = required(&config.base_url, "base_url")?;
        let email = required(&config.email, "email")?;
        let api_token = required(&config.api_token, "api_token")?;
        let project_key = required(&config.project_key, "project_key")?;

        let client = JiraClient::new(
            &base_url,
            &email,
            &api_token,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        info!(base_url = %client.base_url(), project = %project_key, "Jira tracker initialized");
        Ok(Self::with_client(client, &project_key, &config.issue_type))
    }

    /// Creates a tracker around an existing client.
    pub fn with_client(client: JiraClient, project_key: &str, issue_type: &str) -> Self {
        Self {
            client,
            project_key: project_key.trim().to_string(),
            issue_type: IssueTypeRef::parse(issue_type),
        }
    }
}

fn require_key(key: &str) -> Result<&str, BridgeError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(BridgeError::Policy("issue key is required".into()));
    }
    Ok(key)
}

#[async_trait]
impl IssueTracker for JiraTracker {
    fn project_key(&self) -> &str {
        &self.project_key
    }

    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.client.base_url(), key.trim())
    }

    async fn create_issue(
        &self,
        summary: &str,
        description: AdfDocument,
    ) -> Result<CreatedIssue, BridgeError> {
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(BridgeError::Policy("issue summary is required".into()));
        }
        let request = CreateIssueRequest {
            fields: CreateIssueFields {
                project: ProjectRef {
                    key: self.project_key.clone(),
                },
                issue_type: self.issue_type.clone(),
                summary: summary.to_string(),
                labels: vec![ISSUE_LABEL.to_string()],
                description: (!description.content.is_empty()).then_some(description),
            },
        };
        let response = self
            .client
            .send_json(Method::POST, "issue", "", &request, StatusCode::CREATED)
            .await?;
        let created: CreatedIssueResponse = decode(response).await?;
        info!(key = %created.key, "Jira issue created");
        Ok(CreatedIssue {
            url: self.browse_url(&created.key),
            key: created.key,
        })
    }

    async fn get_issue_status(&self, key: &str) -> Result<IssueStatus, BridgeError> {
        let key = require_key(key)?;
        let issue: IssueResponse = self
            .client
            .get(&format!("issue/{key}?fields={STATUS_FIELDS}"), key)
            .await?;
        let fields = issue.fields;
        Ok(IssueStatus {
            key: issue.key,
            summary: fields.summary,
            status: fields.status.map(|s| s.name).unwrap_or_default(),
            assignee: fields
                .assignee
                .map(|a| a.label())
                .filter(|a| !a.is_empty()),
            priority: fields.priority.map(|p| p.name).filter(|p| !p.is_empty()),
            created: fields.created.as_deref().and_then(parse_jira_time),
            updated: fields.updated.as_deref().and_then(parse_jira_time),
        })
    }

    async fn transition_issue_to_status(
        &self,
        key: &str,
        status: &str,
    ) -> Result<(), BridgeError> {
        let key = require_key(key)?;
        let status = status.trim();
        if status.is_empty() {
            return Err(BridgeError::Policy("target status is required".into()));
        }

        let path = format!("issue/{key}/transitions");
        let available: TransitionsResponse = self.client.get(&path, key).await?;
        let Some(transition) = available.transitions.iter().find(|t| t.reaches(status)) else {
            return Err(BridgeError::Policy(format!(
                "no transition to status \"{status}\" is available for {key}"
            )));
        };

        let request = TransitionRequest {
            transition: TransitionId {
                id: transition.id.clone(),
            },
        };
        self.client
            .send_json(Method::POST, &path, key, &request, StatusCode::NO_CONTENT)
            .await?;
        info!(key, status, transition_id = %transition.id, "Jira issue transitioned");
        Ok(())
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<(), BridgeError> {
        let key = require_key(key)?;
        let body = body.trim();
        if body.is_empty() {
            return Err(BridgeError::Policy("comment body is empty".into()));
        }
        let request = CommentRequest {
            body: AdfDocument::from_plain_text(body),
        };
        self.client
            .send_json(
                Method::POST,
                &format!("issue/{key}/comment"),
                key,
                &request,
                StatusCode::CREATED,
            )
            .await?;
        debug!(key, "Jira comment added");
        Ok(())
    }

    async fn get_comments(&self, key: &str) -> Result<Vec<TrackerComment>, BridgeError> {
        let key = require_key(key)?;
        let response: CommentsResponse = self
            .client
            .get(&format!("issue/{key}/comment?expand=renderedBody"), key)
            .await?;
        Ok(response
            .comments
            .into_iter()
            .filter_map(|c| {
                // A comment without a parseable creation time cannot be ordered
                // against the watermark.
                let created = c.created.as_deref().and_then(parse_jira_time)?;
                Some(TrackerComment {
                    author: c.author.map(|a| a.label()).unwrap_or_default(),
                    body: body_text(&c.body),
                    rendered_body: c.rendered_body.unwrap_or_default(),
                    created,
                    id: c.id,
                })
            })
            .collect())
    }

    async fn get_issue_description(&self, key: &str) -> Result<Option<AdfDocument>, BridgeError> {
        let key = require_key(key)?;
        let response: DescriptionResponse = self
            .client
            .get(&format!("issue/{key}?fields=description"), key)
            .await?;
        match response.fields.description {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| BridgeError::Decode {
                    message: format!("description of {key} is not a valid document: {e}"),
                }),
        }
    }

    async fn update_issue_description(
        &self,
        key: &str,
        description: &AdfDocument,
    ) -> Result<(), BridgeError> {
        let key = require_key(key)?;
        let request = UpdateDescriptionRequest {
            fields: UpdateDescriptionFields { description },
        };
        self.client
            .send_json(
                Method::PUT,
                &format!("issue/{key}"),
                key,
                &request,
                StatusCode::NO_CONTENT,
            )
            .await?;
        Ok(())
    }

    async fn add_attachment(
        &self,
        key: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BridgeError> {
        let key = require_key(key)?;
        if filename.trim().is_empty() {
            return Err(BridgeError::Policy("attachment file name is required".into()));
        }
        if bytes.is_empty() {
            return Err(BridgeError::Policy(format!("attachment {filename} is empty")));
        }
        let size = bytes.len();
        let uploaded: Vec<AttachmentResponse> = self
            .client
            .upload(&format!("issue/{key}/attachments"), key, filename, bytes)
            .await?;
        let id = uploaded
            .into_iter()
            .next()
            .map(|a| a.id)
            .ok_or_else(|| BridgeError::Decode {
                message: "Jira returned no attachment".into(),
            })?;
        info!(key, filename, size, attachment_id = %id, "Jira attachment uploaded");
        Ok(id)
    }
}
