//! The business layer over [`Store`] (§4.2).
//!
//! `Coordinator` enforces every invariant in §3, implements atomic claim,
//! the block/unblock side-effects, status transitions, and the audit
//! trail. Every mutating method opens its own immediate-write transaction
//! and commits exactly one primary [`ActivityEvent`] (plus the I4
//! side-effect event where applicable).

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::{Error, Result};
use crate::model::{ActivityEvent, Comment, Status, Ticket, TicketDetail, TicketSummary, TicketType};
use crate::store::Store;

pub struct Coordinator {
    store: Store,
}

/// Optional fields accepted by [`Coordinator::create`].
#[derive(Debug, Default, Clone)]
pub struct CreateOptions {
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub ticket_type: Option<TicketType>,
    pub blocked_by: Option<i64>,
    pub block_dependents_of: Option<i64>,
}

/// Optional fields accepted by [`Coordinator::update`]; `None` means
/// "leave unchanged".
#[derive(Debug, Default, Clone)]
pub struct UpdateOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub status: Option<Status>,
    pub ticket_type: Option<TicketType>,
}

impl Coordinator {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// `create(title, ...)` — §4.2.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty title, [`Error::NotFound`]
    /// if `block_dependents_of` names a missing ticket, and propagates any
    /// underlying storage error.
    pub fn create(&mut self, title: &str, opts: CreateOptions) -> Result<i64> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("ticket title cannot be empty".into()));
        }

        let created_by = opts.created_by.unwrap_or_else(|| "human".to_string());
        let ticket_type = opts.ticket_type.unwrap_or_else(|| {
            if opts.assigned_to.as_deref() == Some("human") && opts.blocked_by.is_some() {
                TicketType::Question
            } else if opts.assigned_to.as_deref() == Some("human") {
                TicketType::Proposal
            } else {
                TicketType::Task
            }
        });

        let now = Utc::now();
        let tx = self.store.begin_immediate()?;

        tx.execute(
            "INSERT INTO tickets
               (title, description, status, assigned_to, parent_id, created_by, ticket_type, created_at, updated_at)
             VALUES (?1, ?2, 'open', ?3, ?4, ?5, ?6, ?7, ?7)",
            rusqlite::params![
                title,
                opts.description,
                opts.assigned_to,
                opts.parent_id,
                created_by,
                ticket_type.as_str(),
                now.to_rfc3339(),
            ],
        )?;
        let new_id = tx.last_insert_rowid();

        if let Some(blocked_by) = opts.blocked_by {
            tx.execute(
                "INSERT INTO blockers (ticket_id, blocked_by) VALUES (?1, ?2)",
                [new_id, blocked_by],
            )?;
            log_activity(&tx, Some(new_id), None, "blocker_added", Some(&format!("Blocked by #{blocked_by}")))?;
        }

        if let Some(source) = opts.block_dependents_of {
            let exists: bool = tx
                .query_row("SELECT 1 FROM tickets WHERE id = ?1", [source], |_| Ok(()))
                .optional()?
                .is_some();
            if !exists {
                return Err(Error::NotFound(format!("ticket {source}")));
            }

            let dependents: Vec<i64> = {
                let mut stmt = tx.prepare("SELECT ticket_id FROM blockers WHERE blocked_by = ?1")?;
                let rows = stmt.query_map([source], |row| row.get(0))?;
                rows.collect::<rusqlite::Result<Vec<i64>>>()?
            };
            for dependent in dependents {
                let inserted = tx
                    .execute(
                        "INSERT OR IGNORE INTO blockers (ticket_id, blocked_by) VALUES (?1, ?2)",
                        [dependent, new_id],
                    )?;
                if inserted > 0 {
                    log_activity(
                        &tx,
                        Some(dependent),
                        None,
                        "blocker_added",
                        Some(&format!("Blocked by new ticket #{new_id}")),
                    )?;
                }
            }
        }

        log_activity(&tx, Some(new_id), Some(&created_by), "created", Some(title))?;
        tx.commit()?;
        Ok(new_id)
    }

    /// `update(id, ...)` — §4.2.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a direct transition to `done` or
    /// an empty option set, [`Error::NotFound`] if `id` doesn't exist, and
    /// propagates any underlying storage error.
    pub fn update(&mut self, id: i64, opts: UpdateOptions) -> Result<()> {
        if opts.status == Some(Status::Done) {
            return Err(Error::Validation(
                "direct transition to done is not allowed; use the finalization path".into(),
            ));
        }

        let tx = self.store.begin_immediate()?;
        fetch_ticket(&tx, id)?;

        let mut changes = Vec::new();
        let mut set_clauses = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(title) = opts.title {
            set_clauses.push("title = ?".to_string());
            changes.push(format!("title -> {title}"));
            params.push(Box::new(title));
        }
        if let Some(description) = opts.description {
            set_clauses.push("description = ?".to_string());
            changes.push("description updated".to_string());
            params.push(Box::new(description));
        }
        if let Some(assigned_to) = opts.assigned_to {
            set_clauses.push("assigned_to = ?".to_string());
            changes.push(format!("assigned_to -> {assigned_to}"));
            params.push(Box::new(assigned_to));
        }
        if let Some(status) = opts.status {
            set_clauses.push("status = ?".to_string());
            params.push(Box::new(status.as_str().to_string()));
            changes.push(format!("status -> {status}"));
        }
        if let Some(ticket_type) = opts.ticket_type {
            set_clauses.push("ticket_type = ?".to_string());
            params.push(Box::new(ticket_type.as_str().to_string()));
            changes.push(format!("type -> {ticket_type}"));
        }

        if set_clauses.is_empty() {
            return Err(Error::Validation("nothing to update".into()));
        }

        set_clauses.push("updated_at = ?".to_string());
        params.push(Box::new(Utc::now().to_rfc3339()));
        params.push(Box::new(id));

        let sql = format!("UPDATE tickets SET {} WHERE id = ?", set_clauses.join(", "));
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(std::convert::AsRef::as_ref).collect();
        tx.execute(&sql, param_refs.as_slice())?;

        log_activity(&tx, Some(id), None, "updated", Some(&changes.join("; ")))?;
        tx.commit()?;
        Ok(())
    }

    /// `claim_next(agent)` — atomic, §4.2 / P1-P3.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no ticket is claimable right now, and
    /// propagates any underlying storage error.
    pub fn claim_next(&mut self, agent: &str) -> Result<Ticket> {
        let tx = self.store.begin_immediate()?;

        let candidate: Option<i64> = tx
            .query_row(
                "SELECT id FROM tickets
                 WHERE status = 'open'
                   AND assigned_to IS NULL
                   AND id NOT IN (
                       SELECT b.ticket_id FROM blockers b
                       JOIN tickets t ON t.id = b.blocked_by
                       WHERE t.status != 'done'
                   )
                 ORDER BY id ASC
                 LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let Some(id) = candidate else {
            return Err(Error::NotFound("no claimable ticket".into()));
        };

        let now = Utc::now().to_rfc3339();
        tx.execute(
            "UPDATE tickets SET assigned_to = ?1, status = 'in_progress', updated_at = ?2 WHERE id = ?3",
            rusqlite::params![agent, now, id],
        )?;
        log_activity(&tx, Some(id), Some(agent), "claimed", Some(&format!("Claimed by {agent}")))?;

        let ticket = fetch_ticket(&tx, id)?;
        tx.commit()?;
        Ok(ticket)
    }

    /// `block(id, by)` — §4.2, I4.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if either ticket doesn't exist,
    /// [`Error::Conflict`] if the edge already exists, and propagates any
    /// underlying storage error.
    pub fn block(&mut self, id: i64, by: i64) -> Result<()> {
        let tx = self.store.begin_immediate()?;
        fetch_ticket(&tx, id)?;
        fetch_ticket(&tx, by)?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO blockers (ticket_id, blocked_by) VALUES (?1, ?2)",
            [id, by],
        )?;
        if inserted == 0 {
            return Err(Error::Conflict(format!("ticket {id} is already blocked by {by}")));
        }

        let ticket = fetch_ticket(&tx, id)?;
        if let Some(prev_agent) = ticket.assigned_to {
            let now = Utc::now().to_rfc3339();
            tx.execute(
                "UPDATE tickets SET assigned_to = NULL, status = 'open', updated_at = ?1 WHERE id = ?2",
                rusqlite::params![now, id],
            )?;
            log_activity(
                &tx,
                Some(id),
                Some(&prev_agent),
                "unclaimed",
                Some(&format!("Auto-released (blocked by #{by})")),
            )?;
        }

        log_activity(&tx, Some(id), None, "blocker_added", Some(&format!("Blocked by #{by}")))?;
        tx.commit()?;
        Ok(())
    }

    /// `unblock(id, by)` — §4.2, P6.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such blocker edge exists, and
    /// propagates any underlying storage error.
    pub fn unblock(&mut self, id: i64, by: i64) -> Result<()> {
        let tx = self.store.begin_immediate()?;
        let deleted = tx.execute(
            "DELETE FROM blockers WHERE ticket_id = ?1 AND blocked_by = ?2",
            [id, by],
        )?;
        if deleted == 0 {
            return Err(Error::NotFound("blocker relationship".into()));
        }
        log_activity(&tx, Some(id), None, "blocker_removed", Some(&format!("Unblocked from #{by}")))?;
        tx.commit()?;
        Ok(())
    }

    /// `complete(id)` — transitions to `ready`, I5.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `id` doesn't exist, and propagates
    /// any underlying storage error.
    pub fn complete(&mut self, id: i64) -> Result<()> {
        let tx = self.store.begin_immediate()?;
        let ticket = fetch_ticket(&tx, id)?;
        let now = Utc::now().to_rfc3339();
        tx.execute(
            "UPDATE tickets SET status = 'ready', updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
        log_activity(
            &tx,
            Some(id),
            ticket.assigned_to.as_deref(),
            "completed",
            Some(&format!("Ticket #{id} completed, pending finalization")),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// `mark_done(id)` — finalization path, I5. Only the agent runtime's
    /// post-push step should call this; it is hidden from CLI help.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `id` doesn't exist, and propagates
    /// any underlying storage error.
    pub fn mark_done(&mut self, id: i64) -> Result<()> {
        let tx = self.store.begin_immediate()?;
        let ticket = fetch_ticket(&tx, id)?;
        let now = Utc::now().to_rfc3339();
        tx.execute(
            "UPDATE tickets SET status = 'done', updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
        log_activity(
            &tx,
            Some(id),
            ticket.assigned_to.as_deref(),
            "done",
            Some(&format!("Ticket #{id} finalized as done")),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// `unclaim(id)` — §4.2.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `id` doesn't exist, and propagates
    /// any underlying storage error.
    pub fn unclaim(&mut self, id: i64) -> Result<()> {
        let tx = self.store.begin_immediate()?;
        let ticket = fetch_ticket(&tx, id)?;
        let now = Utc::now().to_rfc3339();
        tx.execute(
            "UPDATE tickets SET assigned_to = NULL, status = 'open', updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
        log_activity(
            &tx,
            Some(id),
            ticket.assigned_to.as_deref(),
            "unclaimed",
            Some(&format!("Released by {}", ticket.assigned_to.as_deref().unwrap_or("(none)"))),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// `comment(id, author, body)` — §4.2.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `id` doesn't exist, and propagates
    /// any underlying storage error.
    pub fn comment(&mut self, id: i64, author: &str, body: &str) -> Result<i64> {
        let tx = self.store.begin_immediate()?;
        fetch_ticket(&tx, id)?;
        tx.execute(
            "INSERT INTO comments (ticket_id, author, body, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id, author, body, Utc::now().to_rfc3339()],
        )?;
        let comment_id = tx.last_insert_rowid();
        let preview: String = body.chars().take(200).collect();
        log_activity(&tx, Some(id), Some(author), "commented", Some(&preview))?;
        tx.commit()?;
        Ok(comment_id)
    }

    /// `list(status?, assigned_to?)` — §4.2.
    ///
    /// # Errors
    ///
    /// Propagates any underlying storage error.
    pub fn list(&self, status: Option<&str>, assigned_to: Option<&str>) -> Result<Vec<Ticket>> {
        let conn = self.store.conn();
        let mut sql = "SELECT * FROM tickets".to_string();
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        match status {
            Some(csv) => {
                let statuses: Vec<&str> = csv.split(',').map(str::trim).collect();
                let placeholders = statuses.iter().map(|_| "?").collect::<Vec<_>>().join(",");
                conditions.push(format!("status IN ({placeholders})"));
                params.extend(statuses.iter().map(|s| (*s).to_string()));
            }
            None => conditions.push("status != 'done'".to_string()),
        }
        if let Some(who) = assigned_to {
            conditions.push("assigned_to = ?".to_string());
            params.push(who.to_string());
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();
        let rows = stmt.query_map(param_refs.as_slice(), row_to_ticket)?;
        rows.collect::<rusqlite::Result<Vec<Ticket>>>().map_err(Error::from)
    }

    /// `show(id)` — §4.2.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `id` doesn't exist, and propagates
    /// any underlying storage error.
    pub fn show(&self, id: i64) -> Result<TicketDetail> {
        let conn = self.store.conn();
        let ticket = fetch_ticket(conn, id)?;

        let mut stmt = conn.prepare("SELECT * FROM comments WHERE ticket_id = ?1 ORDER BY created_at, id")?;
        let comments = stmt
            .query_map([id], row_to_comment)?
            .collect::<rusqlite::Result<Vec<Comment>>>()?;

        let mut stmt = conn.prepare("SELECT blocked_by FROM blockers WHERE ticket_id = ?1")?;
        let blocked_by = stmt.query_map([id], |row| row.get(0))?.collect::<rusqlite::Result<Vec<i64>>>()?;

        let mut stmt = conn.prepare("SELECT ticket_id FROM blockers WHERE blocked_by = ?1")?;
        let blocks = stmt.query_map([id], |row| row.get(0))?.collect::<rusqlite::Result<Vec<i64>>>()?;

        let mut stmt = conn.prepare("SELECT id FROM tickets WHERE parent_id = ?1 ORDER BY id")?;
        let children = stmt.query_map([id], |row| row.get(0))?.collect::<rusqlite::Result<Vec<i64>>>()?;

        Ok(TicketDetail { ticket, comments, blocked_by, blocks, children })
    }

    /// `count(status?)` — §4.2.
    ///
    /// # Errors
    ///
    /// Propagates any underlying storage error.
    pub fn count(&self, status: Option<&str>) -> Result<i64> {
        let conn = self.store.conn();
        match status {
            Some(csv) => {
                let statuses: Vec<&str> = csv.split(',').map(str::trim).collect();
                let placeholders = statuses.iter().map(|_| "?").collect::<Vec<_>>().join(",");
                let sql = format!("SELECT COUNT(*) FROM tickets WHERE status IN ({placeholders})");
                let params: Vec<&dyn rusqlite::ToSql> =
                    statuses.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
                Ok(conn.query_row(&sql, params.as_slice(), |row| row.get(0))?)
            }
            None => Ok(conn.query_row("SELECT COUNT(*) FROM tickets WHERE status != 'done'", [], |row| {
                row.get(0)
            })?),
        }
    }

    /// `activity(limit)` — §4.2, newest first.
    ///
    /// # Errors
    ///
    /// Propagates any underlying storage error.
    pub fn activity(&self, limit: i64) -> Result<Vec<ActivityEvent>> {
        let conn = self.store.conn();
        let mut stmt = conn.prepare("SELECT * FROM activity_log ORDER BY id DESC LIMIT ?1")?;
        let rows = stmt.query_map([limit], row_to_activity_event)?;
        rows.collect::<rusqlite::Result<Vec<ActivityEvent>>>().map_err(Error::from)
    }

    /// Per-row enrichment for `GET /api/tickets` (§6).
    ///
    /// # Errors
    ///
    /// Propagates any underlying storage error.
    pub fn list_summaries(&self, status: Option<&str>, assigned_to: Option<&str>) -> Result<Vec<TicketSummary>> {
        let tickets = self.list(status, assigned_to)?;
        let conn = self.store.conn();
        tickets
            .into_iter()
            .map(|ticket| {
                let comment_count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM comments WHERE ticket_id = ?1", [ticket.id], |row| {
                        row.get(0)
                    })?;
                let mut stmt = conn.prepare(
                    "SELECT b.blocked_by, t.status FROM blockers b
                     JOIN tickets t ON t.id = b.blocked_by WHERE b.ticket_id = ?1",
                )?;
                let blocker_rows = stmt
                    .query_map([ticket.id], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
                    .collect::<rusqlite::Result<Vec<(i64, String)>>>()?;
                let is_blocked = blocker_rows.iter().any(|(_, status)| status != "done");
                let blocked_by = blocker_rows.into_iter().map(|(id, _)| id).collect();
                Ok(TicketSummary { ticket, comment_count, blocked_by, is_blocked })
            })
            .collect()
    }

    /// Expose the underlying connection for the recovery hook and tests.
    pub fn store(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Walk the blocker graph and return the first cycle found, as a list
    /// of ticket ids starting and ending at the same id. The store itself
    /// never rejects a cyclic edge (§9); this is a diagnostic, not an
    /// enforcement mechanism.
    ///
    /// # Errors
    ///
    /// Propagates any underlying storage error.
    pub fn find_cycle(&self) -> Result<Option<Vec<i64>>> {
        let conn = self.store.conn();
        let mut stmt = conn.prepare("SELECT ticket_id, blocked_by FROM blockers")?;
        let edges: Vec<(i64, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(i64, i64)>>>()?;
        drop(stmt);

        let mut adjacency: std::collections::HashMap<i64, Vec<i64>> = std::collections::HashMap::new();
        for (ticket_id, blocked_by) in edges {
            adjacency.entry(ticket_id).or_default().push(blocked_by);
        }

        let mut visited = std::collections::HashSet::new();
        let starts: Vec<i64> = adjacency.keys().copied().collect();
        for start in starts {
            if visited.contains(&start) {
                continue;
            }
            let mut path = Vec::new();
            let mut on_path = std::collections::HashMap::new();
            if let Some(cycle) = visit(start, &adjacency, &mut visited, &mut on_path, &mut path) {
                return Ok(Some(cycle));
            }
        }
        Ok(None)
    }
}

fn visit(
    node: i64,
    adjacency: &std::collections::HashMap<i64, Vec<i64>>,
    visited: &mut std::collections::HashSet<i64>,
    on_path: &mut std::collections::HashMap<i64, usize>,
    path: &mut Vec<i64>,
) -> Option<Vec<i64>> {
    on_path.insert(node, path.len());
    path.push(node);

    if let Some(neighbors) = adjacency.get(&node) {
        for &next in neighbors {
            if let Some(&idx) = on_path.get(&next) {
                let mut cycle = path[idx..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
            if !visited.contains(&next) {
                if let Some(cycle) = visit(next, adjacency, visited, on_path, path) {
                    return Some(cycle);
                }
            }
        }
    }

    path.pop();
    on_path.remove(&node);
    visited.insert(node);
    None
}

/// Insert a row into `activity_log`. Shared by every mutating operation
/// to satisfy I6.
fn log_activity(
    conn: &Connection,
    ticket_id: Option<i64>,
    agent_id: Option<&str>,
    action: &str,
    detail: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO activity_log (ticket_id, agent_id, action, detail, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![ticket_id, agent_id, action, detail, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn fetch_ticket(conn: &Connection, id: i64) -> Result<Ticket> {
    conn.query_row("SELECT * FROM tickets WHERE id = ?1", [id], row_to_ticket)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("ticket {id}")))
}

fn row_to_ticket(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    let status_str: String = row.get("status")?;
    let type_str: String = row.get("ticket_type")?;
    Ok(Ticket {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: status_str.parse().unwrap_or(Status::Open),
        assigned_to: row.get("assigned_to")?,
        parent_id: row.get("parent_id")?,
        created_by: row.get("created_by")?,
        ticket_type: type_str.parse().unwrap_or(TicketType::Task),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        ticket_id: row.get("ticket_id")?,
        author: row.get("author")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_activity_event(row: &Row<'_>) -> rusqlite::Result<ActivityEvent> {
    Ok(ActivityEvent {
        id: row.get("id")?,
        ticket_id: row.get("ticket_id")?,
        agent_id: row.get("agent_id")?,
        action: row.get("action")?,
        detail: row.get("detail")?,
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_coordinator() -> (TempDir, Coordinator) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.db");
        Store::migrate(&path).unwrap();
        let store = Store::open(&path).unwrap();
        (dir, Coordinator::new(store))
    }

    #[test]
    fn create_empty_title_is_validation_error() {
        let (_dir, mut coord) = open_coordinator();
        let err = coord.create("   ", CreateOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn scenario_basic_claim() {
        let (_dir, mut coord) = open_coordinator();
        let id = coord
            .create("T1", CreateOptions { created_by: Some("human".into()), ..Default::default() })
            .unwrap();
        assert_eq!(id, 1);

        let claimed = coord.claim_next("a1").unwrap();
        assert_eq!(claimed.id, 1);
        assert_eq!(claimed.status, Status::InProgress);
        assert_eq!(claimed.assigned_to.as_deref(), Some("a1"));

        let err = coord.claim_next("a2").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn scenario_blocked_claim() {
        let (_dir, mut coord) = open_coordinator();
        let pre = coord.create("Pre", CreateOptions::default()).unwrap();
        let post = coord
            .create("Post", CreateOptions { blocked_by: Some(pre), ..Default::default() })
            .unwrap();

        let first = coord.claim_next("a").unwrap();
        assert_eq!(first.id, pre);
        assert!(matches!(coord.claim_next("b").unwrap_err(), Error::NotFound(_)));

        coord.mark_done(pre).unwrap();
        let second = coord.claim_next("b").unwrap();
        assert_eq!(second.id, post);
    }

    #[test]
    fn scenario_block_auto_unclaim() {
        let (_dir, mut coord) = open_coordinator();
        let x = coord.create("X", CreateOptions::default()).unwrap();
        let y = coord.create("Y", CreateOptions::default()).unwrap();

        coord.claim_next("a1").unwrap();
        coord.block(x, y).unwrap();

        let detail = coord.show(x).unwrap();
        assert_eq!(detail.ticket.status, Status::Open);
        assert!(detail.ticket.assigned_to.is_none());

        let events = coord.activity(10).unwrap();
        let blocker_idx = events.iter().position(|e| e.action == "blocker_added").unwrap();
        let unclaimed_idx = events.iter().position(|e| e.action == "unclaimed").unwrap();
        // newest-first ordering: blocker_added was logged after unclaimed, so it has a lower index.
        assert!(blocker_idx < unclaimed_idx);
    }

    #[test]
    fn scenario_dependents_copy() {
        let (_dir, mut coord) = open_coordinator();
        let a = coord.create("A", CreateOptions::default()).unwrap();
        let b = coord
            .create("B", CreateOptions { blocked_by: Some(a), ..Default::default() })
            .unwrap();
        let c = coord
            .create("C", CreateOptions { block_dependents_of: Some(a), ..Default::default() })
            .unwrap();

        let detail = coord.show(b).unwrap();
        let mut blockers = detail.blocked_by;
        blockers.sort_unstable();
        let mut expected = vec![a, c];
        expected.sort_unstable();
        assert_eq!(blockers, expected);
    }

    #[test]
    fn update_direct_done_is_rejected() {
        let (_dir, mut coord) = open_coordinator();
        let id = coord.create("T", CreateOptions::default()).unwrap();
        let err = coord
            .update(id, UpdateOptions { status: Some(Status::Done), ..Default::default() })
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let detail = coord.show(id).unwrap();
        assert_eq!(detail.ticket.status, Status::Open);
    }

    #[test]
    fn unblock_twice_second_is_not_found() {
        let (_dir, mut coord) = open_coordinator();
        let a = coord.create("A", CreateOptions::default()).unwrap();
        let b = coord
            .create("B", CreateOptions { blocked_by: Some(a), ..Default::default() })
            .unwrap();
        coord.unblock(b, a).unwrap();
        assert!(matches!(coord.unblock(b, a).unwrap_err(), Error::NotFound(_)));
    }
}
