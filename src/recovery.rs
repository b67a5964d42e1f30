//! Orphan-Recovery Hook (§4.5).
//!
//! At fleet start no agent can legitimately hold a claimed ticket; any
//! ticket still showing an agent assignment is therefore held by a dead
//! process. `recover_orphans` reclaims every such ticket in one
//! transaction so a fresh fleet starts from a clean claimable set.

use chrono::Utc;

use crate::error::Result;
use crate::store::Store;

/// Reclaim every non-human, non-done ticket still carrying an
/// `assigned_to`. Returns the ids reclaimed, ascending. Idempotent: a
/// second call with nothing left to reclaim is a no-op returning `[]`
/// (P7).
///
/// # Errors
///
/// Propagates any underlying storage error.
pub fn recover_orphans(store: &mut Store) -> Result<Vec<i64>> {
    let tx = store.begin_immediate()?;

    let orphans: Vec<i64> = {
        let mut stmt = tx.prepare(
            "SELECT id FROM tickets
             WHERE assigned_to IS NOT NULL
               AND assigned_to != 'human'
               AND status != 'done'
             ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<i64>>>()?
    };

    let now = Utc::now().to_rfc3339();
    for &id in &orphans {
        tx.execute(
            "INSERT INTO activity_log (ticket_id, agent_id, action, detail, created_at)
             SELECT ?1, assigned_to, 'unclaimed', 'Auto-released on swarm start', ?2
             FROM tickets WHERE id = ?1",
            rusqlite::params![id, now],
        )?;
        tx.execute(
            "UPDATE tickets SET assigned_to = NULL, status = 'open', updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
    }

    tx.commit()?;
    Ok(orphans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{Coordinator, CreateOptions};
    use tempfile::TempDir;

    fn open_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.db");
        Store::migrate(&path).unwrap();
        (dir, Store::open(&path).unwrap())
    }

    #[test]
    fn reclaims_agent_held_tickets_but_not_human_held() {
        let (_dir, store) = open_store();
        let mut coord = Coordinator::new(store);
        let agent_owned = coord.create("A", CreateOptions::default()).unwrap();
        let human_owned = coord
            .create("B", CreateOptions { assigned_to: Some("human".into()), ..Default::default() })
            .unwrap();
        coord.claim_next("agent-7").unwrap();
        assert_eq!(agent_owned, 1);

        let recovered = recover_orphans(coord.store()).unwrap();
        assert_eq!(recovered, vec![agent_owned]);

        let detail = coord.show(agent_owned).unwrap();
        assert!(detail.ticket.assigned_to.is_none());

        let human_detail = coord.show(human_owned).unwrap();
        assert_eq!(human_detail.ticket.assigned_to.as_deref(), Some("human"));
    }

    #[test]
    fn second_run_is_a_no_op() {
        let (_dir, store) = open_store();
        let mut coord = Coordinator::new(store);
        coord.create("A", CreateOptions::default()).unwrap();
        coord.claim_next("agent-1").unwrap();

        recover_orphans(coord.store()).unwrap();
        let second = recover_orphans(coord.store()).unwrap();
        assert!(second.is_empty());
    }
}
