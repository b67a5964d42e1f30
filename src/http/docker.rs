//! Container-runtime queries (§4.4), grounded in the original monitor's
//! `docker_api`/`docker_logs`: shell out to `curl` over the runtime's Unix
//! socket rather than linking a Docker client crate, since that is what
//! the original system does and the socket protocol is otherwise just
//! HTTP-over-UDS with no Rust crate in the teacher's stack for it.

use std::path::Path;

use serde_json::Value;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

use super::state::{DOCKER_HARD_TIMEOUT, DOCKER_SOFT_TIMEOUT};

/// `GET <path>` against the Docker Engine API over its Unix socket.
/// Returns `None` on any failure (timeout, non-zero exit, invalid JSON) —
/// callers treat that as "runtime unavailable" per §7.
pub async fn api_get(socket: &Path, path: &str) -> Option<Value> {
    let output = run_curl(socket, &format!("http://localhost{path}")).await?;
    serde_json::from_slice(&output).ok()
}

/// Fetch and de-frame container logs (§4.4's `GET /api/agents/{name}/logs`).
/// The Docker log stream multiplexes stdout/stderr as repeated 8-byte
/// frame headers (`[stream_type(1)][0(3)][size_be(4)]`) followed by
/// `size` bytes of payload; this strips them for display.
pub async fn logs(socket: &Path, container_id: &str, tail: u32) -> String {
    let url = format!("http://localhost/containers/{container_id}/logs?stdout=true&stderr=true&tail={tail}");
    let Some(raw) = run_curl(socket, &url).await else {
        return String::new();
    };
    demux_log_frames(&raw)
}

fn demux_log_frames(raw: &[u8]) -> String {
    let mut lines = Vec::new();
    let mut i = 0usize;
    while i < raw.len() {
        if i + 8 <= raw.len() {
            let size = u32::from_be_bytes([raw[i + 4], raw[i + 5], raw[i + 6], raw[i + 7]]) as usize;
            let start = i + 8;
            let end = (start + size).min(raw.len());
            lines.push(String::from_utf8_lossy(&raw[start..end]).trim_end_matches('\n').to_string());
            i = end;
        } else {
            lines.push(String::from_utf8_lossy(&raw[i..]).to_string());
            break;
        }
    }
    lines.join("\n")
}

async fn run_curl(socket: &Path, url: &str) -> Option<Vec<u8>> {
    let mut cmd = Command::new("curl");
    cmd.arg("-s")
        .arg("--max-time")
        .arg("5")
        .arg("--unix-socket")
        .arg(socket)
        .arg(url);
    cmd.kill_on_drop(true);

    let run = async {
        let output = cmd.output().await.ok()?;
        output.status.success().then_some(output.stdout)
    };

    match timeout(DOCKER_HARD_TIMEOUT, timeout(DOCKER_SOFT_TIMEOUT, run)).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => {
            warn!("docker api call exceeded soft timeout");
            None
        }
        Err(_) => {
            warn!("docker api call exceeded hard timeout");
            None
        }
    }
}

/// CPU percentage from a `/containers/{id}/stats?stream=false` payload,
/// per the original's formula: `(cpu_delta / system_delta) * online_cpus * 100`.
#[must_use]
pub fn cpu_percent(stats: &Value) -> f64 {
    let cpu_usage = |key: &str| -> f64 {
        stats.get(key).and_then(|s| s.get("cpu_usage")).and_then(|u| u.get("total_usage")).and_then(Value::as_f64).unwrap_or(0.0)
    };
    let system_usage = |key: &str| -> f64 { stats.get(key).and_then(|s| s.get("system_cpu_usage")).and_then(Value::as_f64).unwrap_or(0.0) };

    let cpu_delta = cpu_usage("cpu_stats") - cpu_usage("precpu_stats");
    let system_delta = system_usage("cpu_stats") - system_usage("precpu_stats");
    let online_cpus = stats
        .get("cpu_stats")
        .and_then(|s| s.get("online_cpus"))
        .and_then(Value::as_f64)
        .filter(|&n| n > 0.0)
        .unwrap_or(1.0);

    if system_delta > 0.0 {
        (cpu_delta / system_delta) * online_cpus * 100.0
    } else {
        0.0
    }
}

/// `(usage, limit, percent)` from the same stats payload.
#[must_use]
pub fn memory_stats(stats: &Value) -> (u64, u64, f64) {
    let usage = stats.get("memory_stats").and_then(|s| s.get("usage")).and_then(Value::as_u64).unwrap_or(0);
    let limit = stats.get("memory_stats").and_then(|s| s.get("limit")).and_then(Value::as_u64).unwrap_or(1);
    let percent = if limit > 0 { usage as f64 / limit as f64 * 100.0 } else { 0.0 };
    (usage, limit, percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demux_strips_frame_headers() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&[1, 0, 0, 0]);
        let payload = b"hello\n";
        raw.extend_from_slice(&u32::try_from(payload.len()).unwrap().to_be_bytes());
        raw.extend_from_slice(payload);
        assert_eq!(demux_log_frames(&raw), "hello");
    }

    #[test]
    fn cpu_percent_zero_system_delta_is_zero() {
        let stats = serde_json::json!({
            "cpu_stats": {"cpu_usage": {"total_usage": 100}, "system_cpu_usage": 1000, "online_cpus": 2},
            "precpu_stats": {"cpu_usage": {"total_usage": 100}, "system_cpu_usage": 1000},
        });
        assert!((cpu_percent(&stats) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn memory_stats_computes_percent() {
        let stats = serde_json::json!({"memory_stats": {"usage": 50, "limit": 200}});
        let (usage, limit, pct) = memory_stats(&stats);
        assert_eq!(usage, 50);
        assert_eq!(limit, 200);
        assert!((pct - 25.0).abs() < 1e-9);
    }
}
