// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Issue tracker trait (Jira and test doubles).

use async_trait::async_trait;

use crate::adf::AdfDocument;
use crate::error::BridgeError;
use crate::types::{CreatedIssue, IssueStatus, TrackerComment};

/// Operations the bridge performs against the issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Project key new issues are filed under.
    fn project_key(&self) -> &str;

    /// Human-facing URL of an issue.
    fn browse_url(&self, key: &str) -> String;

    /// Creates an issue and returns its key and URL.
    async fn create_issue(
        &self,
        summary: &str,
        description: AdfDocument,
    ) -> Result<CreatedIssue, BridgeError>;

    /// Fails with [`BridgeError::NotFound`] when the issue is absent or hidden.
    async fn get_issue_status(&self, key: &str) -> Result<IssueStatus, BridgeError>;

    /// Fails with [`BridgeError::Policy`] when no transition reaches `status`.
    async fn transition_issue_to_status(&self, key: &str, status: &str)
    -> Result<(), BridgeError>;

    async fn add_comment(&self, key: &str, body: &str) -> Result<(), BridgeError>;

    async fn get_comments(&self, key: &str) -> Result<Vec<TrackerComment>, BridgeError>;

    /// Description of an issue, `None` when it is empty.
    async fn get_issue_description(&self, key: &str)
    -> Result<Option<AdfDocument>, BridgeError>;

    async fn update_issue_description(
        &self,
        key: &str,
        description: &AdfDocument,
    ) -> Result<(), BridgeError>;

    /// Uploads a file to an issue and returns the attachment id.
    async fn add_attachment(
        &self,
        key: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BridgeError>;
}
