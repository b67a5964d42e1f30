//! Property-style tests for the invariants in §8 (P1-P8). Concurrency
//! properties (P1-P3) are exercised with real OS threads against a
//! shared store file, since the claim path's correctness rests on
//! SQLite's write-serialization rather than in-process locking.

use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

use proptest::prelude::*;
use tempfile::TempDir;
use ticketq::coordinator::{Coordinator, CreateOptions};
use ticketq::model::Status;
use ticketq::store::Store;

fn open_coordinator_at(path: &Path) -> Coordinator {
    Coordinator::new(Store::open(path).unwrap())
}

/// P1 / P2 / P3: concurrent claims over a fixed ticket set never double
/// assign, and every claimed ticket satisfies I1/I2 and is never a
/// blocked one.
#[test]
fn concurrent_claims_never_double_assign() {
    const TICKET_COUNT: i64 = 20;
    const AGENT_COUNT: usize = 8;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tickets.db");
    Store::migrate(&path).unwrap();

    {
        let mut coord = open_coordinator_at(&path);
        for i in 0..TICKET_COUNT {
            coord.create(&format!("ticket {i}"), CreateOptions::default()).unwrap();
        }
    }

    let barrier = Arc::new(Barrier::new(AGENT_COUNT));
    let path = Arc::new(path);
    #[allow(clippy::needless_collect)] // must finish spawning every thread before any can clear the barrier
    let handles: Vec<_> = (0..AGENT_COUNT)
        .map(|agent_idx| {
            let barrier = Arc::clone(&barrier);
            let path = Arc::clone(&path);
            thread::spawn(move || {
                let mut coord = open_coordinator_at(&path);
                barrier.wait();
                let mut claimed = Vec::new();
                while let Ok(ticket) = coord.claim_next(&format!("agent-{agent_idx}")) {
                    claimed.push(ticket.id);
                }
                claimed
            })
        })
        .collect();
    let mut all_claimed: Vec<i64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    all_claimed.sort_unstable();

    let expected: Vec<i64> = (1..=TICKET_COUNT).collect();
    assert_eq!(all_claimed, expected);
    assert_eq!(all_claimed.len(), usize::try_from(TICKET_COUNT).unwrap(), "no ticket claimed twice");

    let coord = open_coordinator_at(&path);
    for id in 1..=TICKET_COUNT {
        let detail = coord.show(id).unwrap();
        assert_eq!(detail.ticket.status, Status::InProgress);
        assert!(detail.ticket.assigned_to.is_some());
    }
}

/// P3: a ticket blocked by a non-done ticket is never claimable, under
/// concurrent load.
#[test]
fn concurrent_claims_skip_blocked_tickets() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tickets.db");
    Store::migrate(&path).unwrap();

    let unblocked;
    let blocked;
    {
        let mut coord = open_coordinator_at(&path);
        unblocked = coord.create("blocker", CreateOptions::default()).unwrap();
        blocked = coord
            .create("blocked", CreateOptions { blocked_by: Some(unblocked), ..Default::default() })
            .unwrap();
    }

    let path = Arc::new(path);
    #[allow(clippy::needless_collect)] // spawn all threads before joining any, for genuine concurrency
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let path = Arc::clone(&path);
            thread::spawn(move || {
                let mut coord = open_coordinator_at(&path);
                coord.claim_next(&format!("agent-{i}")).ok().map(|t| t.id)
            })
        })
        .collect();
    let claimed: Vec<i64> = handles.into_iter().filter_map(|h| h.join().unwrap()).collect();
    assert!(claimed.iter().all(|&id| id != blocked));
    assert_eq!(claimed, vec![unblocked]);
}

proptest! {
    /// P5: round-trip create/show preserves supplied fields and defaults
    /// to `open`.
    #[test]
    fn create_show_roundtrip(title in "[a-zA-Z0-9][a-zA-Z0-9 ]{0,39}", description in proptest::option::of("[a-zA-Z0-9 ]{0,60}")) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.db");
        Store::migrate(&path).unwrap();
        let mut coord = open_coordinator_at(&path);

        let id = coord.create(&title, CreateOptions { description: description.clone(), ..Default::default() }).unwrap();
        let detail = coord.show(id).unwrap();

        prop_assert_eq!(detail.ticket.title, title.trim().to_string());
        prop_assert_eq!(detail.ticket.description, description);
        prop_assert_eq!(detail.ticket.status, Status::Open);
    }
}
