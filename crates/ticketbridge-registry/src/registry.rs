// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent ticket registry with a dirty bit.
//!
//! The registry is the process-lifetime source of truth for which tracker
//! issues came from which chat. The dirty bit records that the in-memory
//! state has diverged from the copy persisted in the aggregate issue.
//!
//! The lock guards map access only. No method performs I/O, so callers never
//! hold it across a network call.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use ticketbridge_core::{ChatId, TicketRecord};

#[derive(Debug, Default)]
struct Inner {
    tickets: HashMap<String, TicketRecord>,
    dirty: bool,
}

/// Thread-safe map of [`TicketRecord`] keyed by issue key.
#[derive(Debug, Default)]
pub struct TicketRegistry {
    inner: RwLock<Inner>,
}

impl TicketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation is a single store or map insert/remove, so the data
    // behind a poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or overwrite a ticket. Keeps the comment watermark of an
    /// existing record. Empty keys are ignored. Does not set the dirty bit.
    pub fn add(
        &self,
        chat_id: ChatId,
        key: &str,
        status: &str,
        name: &str,
        creator_username: &str,
    ) {
        if key.is_empty() {
            return;
        }
        let mut inner = self.write();
        let last_comment_at = inner.tickets.get(key).and_then(|t| t.last_comment_at);
        let mut record = TicketRecord::new(chat_id, key, status, name, creator_username);
        record.last_comment_at = last_comment_at;
        inner.tickets.insert(key.to_string(), record);
    }

    /// Snapshot of one ticket.
    pub fn get(&self, key: &str) -> Option<TicketRecord> {
        self.read().tickets.get(key).cloned()
    }

    /// Remove a ticket. Sets the dirty bit only if something was removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.write();
        let removed = inner.tickets.remove(key).is_some();
        if removed {
            inner.dirty = true;
        }
        removed
    }

    /// Seed from a persisted snapshot, overwriting by key. Does not set the
    /// dirty bit: this is a load, not a local change.
    pub fn init(&self, records: impl IntoIterator<Item = TicketRecord>) {
        let mut inner = self.write();
        for record in records {
            if record.key.is_empty() {
                continue;
            }
            inner.tickets.insert(record.key.clone(), record);
        }
    }

    /// Snapshot of every ticket, ordered by key.
    pub fn list_all(&self) -> Vec<TicketRecord> {
        let mut all: Vec<_> = self.read().tickets.values().cloned().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    /// Snapshot of the tickets created from one chat, ordered by key.
    pub fn list_by_chat_id(&self, chat_id: ChatId) -> Vec<TicketRecord> {
        let mut tickets: Vec<_> = self
            .read()
            .tickets
            .values()
            .filter(|t| t.chat_id == chat_id)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.key.cmp(&b.key));
        tickets
    }

    /// Record a new tracker status. Returns whether the stored value changed;
    /// only a change sets the dirty bit. Unknown keys and empty statuses are
    /// ignored.
    pub fn update_status(&self, key: &str, status: &str) -> bool {
        if status.is_empty() {
            return false;
        }
        let mut inner = self.write();
        let Some(ticket) = inner.tickets.get_mut(key) else {
            return false;
        };
        if ticket.status == status {
            return false;
        }
        ticket.status = status.to_string();
        inner.dirty = true;
        true
    }

    /// Advance the comment watermark. The watermark never moves backwards;
    /// only an actual advance sets the dirty bit.
    pub fn update_last_comment_at(&self, key: &str, at: DateTime<Utc>) -> bool {
        let mut inner = self.write();
        let Some(ticket) = inner.tickets.get_mut(key) else {
            return false;
        };
        if ticket.last_comment_at.is_some_and(|current| at <= current) {
            return false;
        }
        ticket.last_comment_at = Some(at);
        inner.dirty = true;
        true
    }

    /// Atomically read and clear the dirty bit.
    pub fn dirty_and_reset(&self) -> bool {
        std::mem::take(&mut self.write().dirty)
    }

    /// Re-arm the dirty bit, e.g. after a failed flush.
    pub fn mark_dirty(&self) {
        self.write().dirty = true;
    }

    pub fn len(&self) -> usize {
        self.read().tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().tickets.is_empty()
    }
}
