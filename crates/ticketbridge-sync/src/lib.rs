// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime of the chat/tracker bridge.
//!
//! [`Reconciler`] mirrors tracker activity into chat and persists the
//! registry. [`Dispatcher`] routes chat events to the handlers, batching
//! album replies through [`MediaGroupAggregator`]. [`Bridge`] wires them to
//! a bounded worker pool.

pub mod bridge;
pub mod dispatcher;
pub mod handlers;
pub mod history;
pub mod media_group;
pub mod reconcile;
pub mod render;
pub mod shutdown;

pub use bridge::{Bridge, BridgeSettings, EventSender, RunningBridge};
pub use dispatcher::Dispatcher;
pub use handlers::{BridgeContext, ReplyCommentHandler};
pub use history::ChatHistory;
pub use media_group::{BatchHandler, MediaGroupAggregator};
pub use reconcile::{ReconcileSettings, Reconciler, TickReport};
pub use shutdown::install_signal_handler;
