// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for ticketbridge.
//!
//! - [`MockTracker`]: in-memory issue tracker with failure injection
//! - [`MockGateway`]: messaging gateway that records everything it is asked to send

pub mod mock_gateway;
pub mod mock_tracker;

pub use mock_gateway::{MockGateway, SentMessage};
pub use mock_tracker::{MockTracker, TrackerOp, comment};
