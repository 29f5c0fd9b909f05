// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory issue tracker.
//!
//! Issues, comments, descriptions and reachable transitions are seeded by the
//! test; every write is captured for assertions. Any operation can be made to
//! fail for one key or for all keys via [`MockTracker::fail`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use ticketbridge_core::{
    AdfDocument, BridgeError, CreatedIssue, IssueStatus, IssueTracker, TrackerComment,
};

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerOp {
    CreateIssue,
    GetIssueStatus,
    Transition,
    AddComment,
    GetComments,
    GetDescription,
    UpdateDescription,
    AddAttachment,
}

#[derive(Default)]
struct State {
    issues: HashMap<String, IssueStatus>,
    comments: HashMap<String, Vec<TrackerComment>>,
    descriptions: HashMap<String, AdfDocument>,
    transitions: HashMap<String, Vec<String>>,
    created: Vec<(String, AdfDocument)>,
    added_comments: Vec<(String, String)>,
    attachments: Vec<(String, String, Vec<u8>)>,
    description_updates: usize,
    failures: HashSet<(TrackerOp, Option<String>)>,
    next_issue: u32,
}

impl State {
    fn check(&self, op: TrackerOp, key: &str) -> Result<(), BridgeError> {
        if self.failures.contains(&(op, None)) || self.failures.contains(&(op, Some(key.into())))
        {
            return Err(BridgeError::transport(format!("injected {op:?} failure")));
        }
        Ok(())
    }
}

/// A mock issue tracker for testing.
#[derive(Clone)]
pub struct MockTracker {
    project_key: String,
    state: Arc<Mutex<State>>,
}

/// Build a comment whose rendered body equals its plain body.
pub fn comment(id: &str, author: &str, created: DateTime<Utc>, body: &str) -> TrackerComment {
    TrackerComment {
        id: id.to_string(),
        author: author.to_string(),
        created,
        body: body.to_string(),
        rendered_body: body.to_string(),
    }
}

impl MockTracker {
    pub fn new(project_key: &str) -> Self {
        Self {
            project_key: project_key.to_string(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Create or replace an issue.
    pub async fn set_issue(&self, key: &str, status: &str, updated: Option<DateTime<Utc>>) {
        let mut state = self.state.lock().await;
        let issue = state
            .issues
            .entry(key.to_string())
            .or_insert_with(|| IssueStatus {
                key: key.to_string(),
                summary: format!("Summary of {key}"),
                ..IssueStatus::default()
            });
        issue.status = status.to_string();
        issue.updated = updated;
    }

    pub async fn remove_issue(&self, key: &str) {
        self.state.lock().await.issues.remove(key);
    }

    pub async fn push_comment(&self, key: &str, comment: TrackerComment) {
        self.state
            .lock()
            .await
            .comments
            .entry(key.to_string())
            .or_default()
            .push(comment);
    }

    pub async fn set_description(&self, key: &str, doc: AdfDocument) {
        self.state
            .lock()
            .await
            .descriptions
            .insert(key.to_string(), doc);
    }

    pub async fn description(&self, key: &str) -> Option<AdfDocument> {
        self.state.lock().await.descriptions.get(key).cloned()
    }

    /// Make `status` reachable from `key`'s current state.
    pub async fn allow_transition(&self, key: &str, status: &str) {
        self.state
            .lock()
            .await
            .transitions
            .entry(key.to_string())
            .or_default()
            .push(status.to_string());
    }

    /// Fail `op` for `key`, or for every key when `key` is `None`.
    pub async fn fail(&self, op: TrackerOp, key: Option<&str>) {
        self.state
            .lock()
            .await
            .failures
            .insert((op, key.map(String::from)));
    }

    /// Undo every injected failure.
    pub async fn heal(&self) {
        self.state.lock().await.failures.clear();
    }

    pub async fn issue(&self, key: &str) -> Option<IssueStatus> {
        self.state.lock().await.issues.get(key).cloned()
    }

    /// `(summary, description)` of every created issue.
    pub async fn created_issues(&self) -> Vec<(String, AdfDocument)> {
        self.state.lock().await.created.clone()
    }

    /// `(key, body)` of every added comment.
    pub async fn added_comments(&self) -> Vec<(String, String)> {
        self.state.lock().await.added_comments.clone()
    }

    /// `(key, filename, bytes)` of every uploaded attachment.
    pub async fn attachments(&self) -> Vec<(String, String, Vec<u8>)> {
        self.state.lock().await.attachments.clone()
    }

    pub async fn description_updates(&self) -> usize {
        self.state.lock().await.description_updates
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    fn project_key(&self) -> &str {
        &self.project_key
    }

    fn browse_url(&self, key: &str) -> String {
        format!("https://tracker.test/browse/{key}")
    }

    async fn create_issue(
        &self,
        summary: &str,
        description: AdfDocument,
    ) -> Result<CreatedIssue, BridgeError> {
        let mut state = self.state.lock().await;
        state.check(TrackerOp::CreateIssue, "")?;
        state.next_issue += 1;
        let key = format!("{}-{}", self.project_key, 100 + state.next_issue);
        state.issues.insert(
            key.clone(),
            IssueStatus {
                key: key.clone(),
                summary: summary.to_string(),
                status: "Open".to_string(),
                created: Some(Utc::now()),
                updated: Some(Utc::now()),
                ..IssueStatus::default()
            },
        );
        state.created.push((summary.to_string(), description));
        Ok(CreatedIssue {
            url: self.browse_url(&key),
            key,
        })
    }

    async fn get_issue_status(&self, key: &str) -> Result<IssueStatus, BridgeError> {
        let state = self.state.lock().await;
        state.check(TrackerOp::GetIssueStatus, key)?;
        state
            .issues
            .get(key)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound { key: key.into() })
    }

    async fn transition_issue_to_status(
        &self,
        key: &str,
        status: &str,
    ) -> Result<(), BridgeError> {
        let mut state = self.state.lock().await;
        state.check(TrackerOp::Transition, key)?;
        let reachable = state
            .transitions
            .get(key)
            .is_some_and(|t| t.iter().any(|s| s.eq_ignore_ascii_case(status)));
        let issue = state
            .issues
            .get_mut(key)
            .ok_or_else(|| BridgeError::NotFound { key: key.into() })?;
        if !reachable {
            return Err(BridgeError::Policy(format!(
                "no transition to status \"{status}\" for {key}"
            )));
        }
        issue.status = status.to_string();
        issue.updated = Some(Utc::now());
        Ok(())
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<(), BridgeError> {
        let mut state = self.state.lock().await;
        state.check(TrackerOp::AddComment, key)?;
        state.added_comments.push((key.to_string(), body.to_string()));
        Ok(())
    }

    async fn get_comments(&self, key: &str) -> Result<Vec<TrackerComment>, BridgeError> {
        let state = self.state.lock().await;
        state.check(TrackerOp::GetComments, key)?;
        Ok(state.comments.get(key).cloned().unwrap_or_default())
    }

    async fn get_issue_description(&self, key: &str) -> Result<Option<AdfDocument>, BridgeError> {
        let state = self.state.lock().await;
        state.check(TrackerOp::GetDescription, key)?;
        Ok(state.descriptions.get(key).cloned())
    }

    async fn update_issue_description(
        &self,
        key: &str,
        description: &AdfDocument,
    ) -> Result<(), BridgeError> {
        let mut state = self.state.lock().await;
        state.check(TrackerOp::UpdateDescription, key)?;
        state
            .descriptions
            .insert(key.to_string(), description.clone());
        state.description_updates += 1;
        Ok(())
    }

    async fn add_attachment(
        &self,
        key: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BridgeError> {
        let mut state = self.state.lock().await;
        state.check(TrackerOp::AddAttachment, key)?;
        state
            .attachments
            .push((key.to_string(), filename.to_string(), bytes));
        Ok(format!("att-{}", state.attachments.len()))
    }
}
