//! Core data types shared by the Store, Coordinator, CLI, and HTTP layers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Ticket lifecycle state (§3, §4.2 state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Ready,
    Done,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Ready => "ready",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "ready" => Ok(Self::Ready),
            "done" => Ok(Self::Done),
            other => Err(Error::Validation(format!("unknown status: {other}"))),
        }
    }
}

/// Ticket category, defaulted in `Coordinator::create` per §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    Task,
    Proposal,
    Question,
    Verify,
}

impl TicketType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Proposal => "proposal",
            Self::Question => "question",
            Self::Verify => "verify",
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(Self::Task),
            "proposal" => Ok(Self::Proposal),
            "question" => Ok(Self::Question),
            "verify" => Ok(Self::Verify),
            other => Err(Error::Validation(format!("unknown ticket type: {other}"))),
        }
    }
}

/// A unit of work (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub assigned_to: Option<String>,
    pub parent_id: Option<i64>,
    pub created_by: String,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment on a ticket. Append-only (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub ticket_id: i64,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// An immutable audit record (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: i64,
    pub ticket_id: Option<i64>,
    pub agent_id: Option<String>,
    pub action: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Full ticket detail: the ticket plus its relations, as returned by
/// `Coordinator::show` and the `GET /api/tickets/{id}` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub comments: Vec<Comment>,
    pub blocked_by: Vec<i64>,
    pub blocks: Vec<i64>,
    pub children: Vec<i64>,
}

/// A ticket row enriched for `GET /api/tickets` listing (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSummary {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub comment_count: i64,
    pub blocked_by: Vec<i64>,
    pub is_blocked: bool,
}
