// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket registry and aggregate codec.
//!
//! [`TicketRegistry`] holds every chat-originated ticket in memory;
//! [`codec`] turns it into the ADF table stored in the aggregate issue's
//! description and back.

pub mod codec;
pub mod registry;

pub use codec::{decode, encode};
pub use registry::TicketRegistry;
