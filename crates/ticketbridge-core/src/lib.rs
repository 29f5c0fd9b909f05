// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for ticketbridge.
//!
//! Holds the error type, the domain types, the ADF document model, and the
//! tracker/gateway traits every other crate in the workspace builds on.

pub mod adf;
pub mod error;
pub mod status;
pub mod traits;
pub mod types;

pub use adf::{AdfDocument, AdfNode};
pub use error::BridgeError;
pub use status::{IssueKeyMatcher, StatusVocabulary};
pub use traits::{IssueTracker, MessagingGateway};
pub use types::{
    ActionButton, CallbackEvent, ChatId, ChatMessage, ChatUser, CreatedIssue, FileKind, FileRef,
    InboundEvent, IssueStatus, ReplyRef, TicketRecord, TrackerComment,
};
