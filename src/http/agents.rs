//! `GET /api/agents` and `GET /api/agents/{name}/logs` (§6), grounded in
//! the original monitor's `api_agents`/`api_agent_logs`: cross-reference
//! the container runtime's container list against the Store's
//! in-progress assignments, then enrich running containers with live
//! CPU/memory stats.

use axum::extract::{Path as AxumPath, State};
use axum::Json;
use serde_json::{json, Value};

use crate::coordinator::Coordinator;
use crate::store::Store;

use super::docker;
use super::state::AppState;

pub async fn list_agents(State(state): State<AppState>) -> Json<Value> {
    let socket = state.0.docker_socket.clone();
    let Some(containers) = docker::api_get(&socket, "/containers/json?all=true").await else {
        return Json(json!({ "agents": [], "error": "Docker not available" }));
    };
    let Some(containers) = containers.as_array().cloned() else {
        return Json(json!({ "agents": [], "error": "Docker not available" }));
    };

    let path = state.0.db_path.clone();
    let assignments = tokio::task::spawn_blocking(move || -> crate::error::Result<Vec<(String, i64, String)>> {
        let store = Store::open(&path)?;
        let coord = Coordinator::new(store);
        let in_progress = coord.list(Some("in_progress"), None)?;
        Ok(in_progress
            .into_iter()
            .filter_map(|t| t.assigned_to.map(|agent| (agent, t.id, t.title)))
            .collect())
    })
    .await
    .expect("blocking task panicked")
    .unwrap_or_default();

    let mut agents = Vec::with_capacity(containers.len());
    for c in containers {
        let name = c
            .get("Names")
            .and_then(Value::as_array)
            .and_then(|names| names.first())
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim_start_matches('/')
            .to_string();
        let id = c.get("Id").and_then(Value::as_str).unwrap_or("").to_string();
        let state_str = c.get("State").and_then(Value::as_str).unwrap_or("unknown").to_string();

        let current_ticket = assignments
            .iter()
            .find(|(agent, _, _)| agent == &name)
            .map(|(_, ticket_id, title)| json!({ "ticket_id": ticket_id, "ticket_title": title }));

        let mut entry = json!({
            "id": id.chars().take(12).collect::<String>(),
            "name": name,
            "state": state_str,
            "status": c.get("Status").cloned().unwrap_or(Value::Null),
            "image": c.get("Image").cloned().unwrap_or(Value::Null),
            "created": c.get("Created").cloned().unwrap_or(Value::Null),
            "labels": c.get("Labels").cloned().unwrap_or(Value::Null),
            "current_ticket": current_ticket,
        });

        if state_str == "running" {
            if let Some(stats) = docker::api_get(&state.0.docker_socket, &format!("/containers/{id}/stats?stream=false")).await {
                let cpu_pct = docker::cpu_percent(&stats);
                let (mem_usage, mem_limit, mem_pct) = docker::memory_stats(&stats);
                entry["cpu_percent"] = json!((cpu_pct * 100.0).round() / 100.0);
                entry["memory_usage"] = json!(mem_usage);
                entry["memory_limit"] = json!(mem_limit);
                entry["memory_percent"] = json!((mem_pct * 100.0).round() / 100.0);
            }
        }

        agents.push(entry);
    }

    Json(json!({ "agents": agents }))
}

pub async fn agent_logs(State(state): State<AppState>, AxumPath(name): AxumPath<String>) -> (axum::http::StatusCode, Json<Value>) {
    let socket = state.0.docker_socket.clone();
    let Some(containers) = docker::api_get(&socket, "/containers/json?all=true").await else {
        return (axum::http::StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "Docker not available" })));
    };
    let Some(containers) = containers.as_array() else {
        return (axum::http::StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "Docker not available" })));
    };

    let container_id = containers.iter().find_map(|c| {
        let id = c.get("Id").and_then(Value::as_str)?;
        let container_name = c
            .get("Names")
            .and_then(Value::as_array)
            .and_then(|names| names.first())
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim_start_matches('/');
        (container_name == name || id.starts_with(&name)).then(|| id.to_string())
    });

    let Some(container_id) = container_id else {
        return (axum::http::StatusCode::NOT_FOUND, Json(json!({ "error": format!("Container '{name}' not found") })));
    };

    let logs = docker::logs(&socket, &container_id, 100).await;
    (axum::http::StatusCode::OK, Json(json!({ "logs": logs, "container": name })))
}
