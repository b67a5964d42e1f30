//! `/api/tickets`, `/api/activity`, `/api/stats` handlers (§4.4, §6),
//! grounded in the original monitor's `api_*` functions. Each handler
//! opens its own `Store` inside `spawn_blocking`, matching §4.4's
//! per-request connection discipline while keeping the async runtime
//! free of blocking SQLite calls.

use axum::extract::{Path as AxumPath, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::coordinator::{Coordinator, CreateOptions, UpdateOptions};
use crate::error::Error;
use crate::model::{Status, TicketType};
use crate::store::Store;

use super::error::ApiError;
use super::state::AppState;

/// Run `f` against a freshly opened `Coordinator` on a blocking thread.
async fn with_coordinator<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Coordinator) -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    let path = state.0.db_path.clone();
    tokio::task::spawn_blocking(move || {
        let store = Store::open(&path)?;
        let mut coord = Coordinator::new(store);
        f(&mut coord)
    })
    .await
    .expect("blocking task panicked")
    .map_err(ApiError::from)
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub assigned_to: Option<String>,
}

pub async fn list_tickets(State(state): State<AppState>, Query(q): Query<ListQuery>) -> Result<Json<Value>, ApiError> {
    let tickets = with_coordinator(&state, move |c| c.list_summaries(q.status.as_deref(), q.assigned_to.as_deref())).await?;
    Ok(Json(json!({ "tickets": tickets })))
}

pub async fn get_ticket(State(state): State<AppState>, AxumPath(id): AxumPath<i64>) -> Result<Json<Value>, ApiError> {
    let detail = with_coordinator(&state, move |c| c.show(id)).await?;
    Ok(Json(serde_json::to_value(detail).expect("TicketDetail always serializes")))
}

#[derive(Deserialize)]
pub struct CreateBody {
    pub title: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Json(body): Json<CreateBody>,
) -> Result<(axum::http::StatusCode, Json<Value>), ApiError> {
    if body.title.trim().is_empty() {
        return Err(ApiError(Error::Validation("title is required".into())));
    }
    let id = with_coordinator(&state, move |c| {
        c.create(
            &body.title,
            CreateOptions {
                description: body.description,
                parent_id: body.parent_id,
                assigned_to: body.assigned_to,
                created_by: body.created_by,
                ..Default::default()
            },
        )
    })
    .await?;
    Ok((axum::http::StatusCode::CREATED, Json(json!({ "id": id }))))
}

#[derive(Deserialize)]
pub struct CommentBody {
    pub body: String,
    pub author: Option<String>,
}

pub async fn add_comment(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<i64>,
    Json(body): Json<CommentBody>,
) -> Result<(axum::http::StatusCode, Json<Value>), ApiError> {
    if body.body.trim().is_empty() {
        return Err(ApiError(Error::Validation("body is required".into())));
    }
    let author = body.author.unwrap_or_else(|| "human".to_string());
    with_coordinator(&state, move |c| c.comment(id, &author, &body.body)).await?;
    Ok((axum::http::StatusCode::CREATED, Json(json!({ "ok": true }))))
}

pub async fn complete_ticket(State(state): State<AppState>, AxumPath(id): AxumPath<i64>) -> Result<Json<Value>, ApiError> {
    with_coordinator(&state, move |c| c.complete(id)).await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize, Default)]
pub struct UpdateBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<String>,
}

pub async fn update_ticket(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<i64>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<Value>, ApiError> {
    if body.title.is_none() && body.description.is_none() && body.status.is_none() && body.assigned_to.is_none() {
        return Err(ApiError(Error::Validation("no fields to update".into())));
    }
    let status: Option<Status> = body.status.as_deref().map(str::parse).transpose()?;
    with_coordinator(&state, move |c| {
        c.update(
            id,
            UpdateOptions {
                title: body.title,
                description: body.description,
                assigned_to: body.assigned_to,
                status,
                ticket_type: None::<TicketType>,
            },
        )
    })
    .await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

pub async fn activity(State(state): State<AppState>, Query(q): Query<ActivityQuery>) -> Result<Json<Value>, ApiError> {
    let limit = q.limit.unwrap_or(50);
    let events = with_coordinator(&state, move |c| c.activity(limit)).await?;
    Ok(Json(json!({ "activity": events })))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let (tickets, total) = with_coordinator(&state, |c| {
        let tickets = c.list(Some("open,in_progress,ready,done"), None)?;
        let total = i64::try_from(tickets.len()).unwrap_or(i64::MAX);
        Ok((tickets, total))
    })
    .await?;

    let mut by_status = std::collections::BTreeMap::new();
    let mut needs_human = 0i64;
    for t in &tickets {
        *by_status.entry(t.status.to_string()).or_insert(0i64) += 1;
        if t.assigned_to.as_deref() == Some("human") && t.status != Status::Done {
            needs_human += 1;
        }
    }

    let blocked = with_coordinator(&state, |c| {
        let summaries = c.list_summaries(Some("open,in_progress,ready,done"), None)?;
        let blocked = summaries.iter().filter(|s| s.is_blocked && s.ticket.status != Status::Done).count();
        Ok(i64::try_from(blocked).unwrap_or(i64::MAX))
    })
    .await?;

    let mut body = json!({ "needs_human": needs_human, "blocked": blocked, "total": total });
    for (status, count) in by_status {
        body[status] = json!(count);
    }
    Ok(Json(body))
}
