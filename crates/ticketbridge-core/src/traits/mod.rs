// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the sync engine drives.
//!
//! Both traits use `#[async_trait]` so they can be held as `Arc<dyn _>`.

pub mod gateway;
pub mod tracker;

pub use gateway::MessagingGateway;
pub use tracker::IssueTracker;
