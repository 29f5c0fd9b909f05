// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent access to the ticket registry.

use std::sync::Arc;
use std::thread;

use ticketbridge_registry::TicketRegistry;

const THREADS: usize = 8;
const KEYS_PER_THREAD: usize = 200;

#[test]
fn concurrent_writers_on_disjoint_keys_lose_nothing() {
    let registry = Arc::new(TicketRegistry::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..KEYS_PER_THREAD {
                    let key = format!("T{t}-{i}");
                    registry.add(t as i64, &key, "Open", "name", "user");
                    registry.update_status(&key, "In Progress");
                    if i % 2 == 0 {
                        registry.delete(&key);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), THREADS * KEYS_PER_THREAD / 2);
    for ticket in registry.list_all() {
        assert_eq!(ticket.status, "In Progress");
        assert_eq!(ticket.name, "name");
        let index: usize = ticket.key.rsplit('-').next().unwrap().parse().unwrap();
        assert_eq!(index % 2, 1);
    }
    assert!(registry.dirty_and_reset());
    assert!(!registry.dirty_and_reset());
}

#[test]
fn contended_key_ends_in_a_serializable_state() {
    let registry = Arc::new(TicketRegistry::new());
    registry.add(1, "HOT-1", "Open", "hot", "alice");

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..500 {
                    match (t + i) % 3 {
                        0 => registry.add(1, "HOT-1", "Open", "hot", "alice"),
                        1 => {
                            registry.update_status("HOT-1", &format!("S{t}"));
                        }
                        _ => {
                            let _ = registry.get("HOT-1");
                            let _ = registry.list_by_chat_id(1);
                        }
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let ticket = registry.get("HOT-1").expect("ticket was never deleted");
    assert_eq!(ticket.chat_id, 1);
    assert_eq!(ticket.name, "hot");
    assert_eq!(ticket.creator_username, "alice");
    let valid_status =
        ticket.status == "Open" || (0..THREADS).any(|t| ticket.status == format!("S{t}"));
    assert!(valid_status, "unexpected status {}", ticket.status);
}

#[test]
fn readers_never_see_partial_records() {
    let registry = Arc::new(TicketRegistry::new());
    registry.add(1, "R-1", "A", "name-A", "user-A");

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for i in 0..2_000 {
                let tag = if i % 2 == 0 { "A" } else { "B" };
                registry.add(1, "R-1", tag, &format!("name-{tag}"), &format!("user-{tag}"));
            }
        })
    };
    let reader = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for _ in 0..2_000 {
                let ticket = registry.get("R-1").unwrap();
                assert_eq!(ticket.name, format!("name-{}", ticket.status));
                assert_eq!(ticket.creator_username, format!("user-{}", ticket.status));
            }
        })
    };
    writer.join().unwrap();
    reader.join().unwrap();
}
