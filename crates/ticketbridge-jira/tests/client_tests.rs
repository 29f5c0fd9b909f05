// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Jira adapter against a wiremock server.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ticketbridge_core::{AdfDocument, AdfNode, BridgeError, IssueTracker};
use ticketbridge_jira::JiraTracker;
use ticketbridge_jira::client::JiraClient;

const AUTH: &str = "Basic Ym90QGV4YW1wbGUuY29tOnNlY3JldA==";

fn tracker(server: &MockServer) -> JiraTracker {
    let client = JiraClient::new(&server.uri(), "bot@example.com", "secret", Duration::from_secs(5))
        .unwrap()
        .with_retry_delay(Duration::from_millis(10));
    JiraTracker::with_client(client, "SUP", "Task")
}

fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

// ---- Issues ----

#[tokio::test]
async fn create_issue_posts_fields_and_returns_browse_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue"))
        .and(header("authorization", AUTH))
        .and(body_partial_json(json!({
            "fields": {
                "project": {"key": "SUP"},
                "issuetype": {"name": "Task"},
                "summary": "Request from Telegram",
                "labels": ["telegram"],
                "description": {"type": "doc", "version": 1}
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "10042", "key": "SUP-42", "self": "https://x/rest/api/3/issue/10042"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let description = AdfDocument::new(vec![AdfNode::paragraph("hello")]);
    let created = tracker(&server)
        .create_issue("Request from Telegram", description)
        .await
        .unwrap();

    assert_eq!(created.key, "SUP-42");
    assert_eq!(created.url, format!("{}/browse/SUP-42", server.uri()));
}

#[tokio::test]
async fn create_issue_surfaces_jira_error_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorMessages": [],
            "errors": {"issuetype": "The issue type selected is invalid."}
        })))
        .mount(&server)
        .await;

    let err = tracker(&server)
        .create_issue("x", AdfDocument::default())
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("400"), "got: {text}");
    assert!(text.contains("issuetype: The issue type selected is invalid."), "got: {text}");
}

#[tokio::test]
async fn get_issue_status_maps_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/SUP-1"))
        .and(query_param("fields", "summary,status,assignee,priority,created,updated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "SUP-1",
            "fields": {
                "summary": "Printer down",
                "status": {"name": "In Progress"},
                "assignee": {"displayName": "", "emailAddress": "it@example.com"},
                "priority": {"name": "High"},
                "created": "2026-03-10T09:15:00.000+0300",
                "updated": "2026-03-11T10:00:00.000+0000"
            }
        })))
        .mount(&server)
        .await;

    let issue = tracker(&server).get_issue_status(" SUP-1 ").await.unwrap();

    assert_eq!(issue.key, "SUP-1");
    assert_eq!(issue.summary, "Printer down");
    assert_eq!(issue.status, "In Progress");
    assert_eq!(issue.assignee.as_deref(), Some("it@example.com"));
    assert_eq!(issue.priority.as_deref(), Some("High"));
    assert_eq!(issue.created, Some(utc("2026-03-10T06:15:00Z")));
    assert_eq!(issue.updated, Some(utc("2026-03-11T10:00:00Z")));
}

#[tokio::test]
async fn unassigned_issue_without_dates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/SUP-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "SUP-1",
            "fields": {"summary": "x", "status": {"name": "Open"}, "assignee": null}
        })))
        .mount(&server)
        .await;

    let issue = tracker(&server).get_issue_status("SUP-1").await.unwrap();
    assert_eq!(issue.assignee, None);
    assert_eq!(issue.updated, None);
}

#[tokio::test]
async fn missing_issue_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/SUP-9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errorMessages": ["Issue does not exist or you do not have permission to see it."]
        })))
        .mount(&server)
        .await;

    let err = tracker(&server).get_issue_status("SUP-9").await.unwrap_err();
    assert!(matches!(err, BridgeError::NotFound { ref key } if key == "SUP-9"));
}

#[tokio::test]
async fn reads_retry_once_on_transient_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/SUP-1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/SUP-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "SUP-1", "fields": {"status": {"name": "Open"}}
        })))
        .mount(&server)
        .await;

    let issue = tracker(&server).get_issue_status("SUP-1").await.unwrap();
    assert_eq!(issue.status, "Open");
}

#[tokio::test]
async fn reads_give_up_after_one_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/SUP-1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(2)
        .mount(&server)
        .await;

    let err = tracker(&server).get_issue_status("SUP-1").await.unwrap_err();
    assert!(err.is_transient());
    assert!(err.to_string().contains("overloaded"));
}

// ---- Transitions ----

#[tokio::test]
async fn transition_matches_target_status_case_insensitively() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/SUP-1/transitions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transitions": [
                {"id": "11", "name": "Start", "to": {"name": "In Progress"}},
                {"id": "31", "name": "Reopen issue", "to": {"name": "Reopened"}}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/SUP-1/transitions"))
        .and(body_json(json!({"transition": {"id": "31"}})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    tracker(&server)
        .transition_issue_to_status("SUP-1", "reopened")
        .await
        .unwrap();
}

#[tokio::test]
async fn unreachable_status_is_a_policy_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/SUP-1/transitions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transitions": [{"id": "11", "name": "Start", "to": {"name": "In Progress"}}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/SUP-1/transitions"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let err = tracker(&server)
        .transition_issue_to_status("SUP-1", "Reopened")
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Policy(_)));
    assert!(err.to_string().contains("Reopened"));
}

// ---- Comments ----

#[tokio::test]
async fn add_comment_sends_adf_with_hard_breaks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/SUP-1/comment"))
        .and(body_json(json!({
            "body": {
                "type": "doc",
                "version": 1,
                "content": [{
                    "type": "paragraph",
                    "content": [
                        {"type": "text", "text": "first"},
                        {"type": "hardBreak"},
                        {"type": "text", "text": "second"}
                    ]
                }]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "5"})))
        .expect(1)
        .mount(&server)
        .await;

    tracker(&server)
        .add_comment("SUP-1", "  first\nsecond  ")
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_comment_is_rejected_locally() {
    let server = MockServer::start().await;
    let err = tracker(&server).add_comment("SUP-1", "   ").await.unwrap_err();
    assert!(matches!(err, BridgeError::Policy(_)));
}

#[tokio::test]
async fn get_comments_reads_adf_and_string_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/SUP-1/comment"))
        .and(query_param("expand", "renderedBody"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "comments": [
                {
                    "id": "100",
                    "author": {"displayName": "Bob", "emailAddress": "bob@example.com"},
                    "created": "2026-03-10T09:00:00.000+0000",
                    "body": {"type": "doc", "version": 1, "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "/tg restarted"}]}
                    ]},
                    "renderedBody": "<p>/tg restarted</p>"
                },
                {
                    "id": "101",
                    "author": {"displayName": "", "emailAddress": "eve@example.com"},
                    "created": "2026-03-10T10:00:00.000+0000",
                    "body": "plain body",
                    "renderedBody": "<p>plain body</p>"
                },
                {
                    "id": "102",
                    "created": "garbage",
                    "body": "dropped"
                }
            ]
        })))
        .mount(&server)
        .await;

    let comments = tracker(&server).get_comments("SUP-1").await.unwrap();

    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].id, "100");
    assert_eq!(comments[0].author, "Bob");
    assert_eq!(comments[0].body, "/tg restarted");
    assert_eq!(comments[0].rendered_body, "<p>/tg restarted</p>");
    assert_eq!(comments[0].created, utc("2026-03-10T09:00:00Z"));
    assert_eq!(comments[1].author, "eve@example.com");
    assert_eq!(comments[1].body, "plain body");
}

// ---- Description ----

#[tokio::test]
async fn description_round_trip() {
    let server = MockServer::start().await;
    let doc = AdfDocument::new(vec![
        AdfNode::heading(2, "Bot ticket registry"),
        AdfNode::paragraph("body"),
    ]);
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/SUP-1000"))
        .and(query_param("fields", "description"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fields": {"description": serde_json::to_value(&doc).unwrap()}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/rest/api/3/issue/SUP-1000"))
        .and(body_json(json!({"fields": {"description": serde_json::to_value(&doc).unwrap()}})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker(&server);
    let fetched = tracker.get_issue_description("SUP-1000").await.unwrap();
    assert_eq!(fetched, Some(doc.clone()));
    tracker
        .update_issue_description("SUP-1000", &doc)
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_description_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/SUP-1000"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"fields": {"description": null}})),
        )
        .mount(&server)
        .await;

    let fetched = tracker(&server).get_issue_description("SUP-1000").await.unwrap();
    assert_eq!(fetched, None);
}

#[tokio::test]
async fn failed_description_update_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/rest/api/3/issue/SUP-1000"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = tracker(&server)
        .update_issue_description("SUP-1000", &AdfDocument::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("403"));
}

// ---- Attachments ----

#[tokio::test]
async fn add_attachment_uploads_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/SUP-1/attachments"))
        .and(header("x-atlassian-token", "no-check"))
        .and(body_string_contains("filename=\"photo.jpg\""))
        .and(body_string_contains("jpeg-bytes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "10001", "filename": "photo.jpg"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let id = tracker(&server)
        .add_attachment("SUP-1", "photo.jpg", b"jpeg-bytes".to_vec())
        .await
        .unwrap();
    assert_eq!(id, "10001");
}

#[tokio::test]
async fn empty_attachment_is_rejected_locally() {
    let server = MockServer::start().await;
    let err = tracker(&server)
        .add_attachment("SUP-1", "photo.jpg", Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Policy(_)));
}

#[test]
fn browse_url_uses_trimmed_base() {
    let client = JiraClient::new(
        "https://example.atlassian.net/",
        "bot@example.com",
        "secret",
        Duration::from_secs(5),
    )
    .unwrap();
    let tracker = JiraTracker::with_client(client, "SUP", "10002");
    assert_eq!(
        tracker.browse_url("SUP-7"),
        "https://example.atlassian.net/browse/SUP-7"
    );
    assert_eq!(tracker.project_key(), "SUP");
}
