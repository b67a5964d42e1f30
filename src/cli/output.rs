//! Rendering for the Queue CLI.
//!
//! Reworks the teacher's `OutputContext`/`OutputMode` split — eager mode,
//! lazy console — onto crates that are actually fetchable: `comfy-table`
//! for tabular rendering and `crossterm` for terminal/color detection in
//! place of the teacher's `rich_rust`.

use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};

use crate::model::{ActivityEvent, Comment, Ticket, TicketDetail};

/// Whether a command should render data as a table/summary or as JSON.
/// Mirrors §6's `--format {text,json}` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// Whether the process should print anything at all besides what a
/// `--format` flag explicitly requests. `--quiet` collapses to this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Quiet,
}

fn color_enabled() -> bool {
    std::env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal()
}

pub fn print_created(id: i64, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        println!("{id}");
    } else {
        println!("created ticket #{id}");
    }
}

pub fn print_ok(mode: OutputMode) {
    if mode != OutputMode::Quiet {
        println!("ok");
    }
}

pub fn print_count(n: i64, _mode: OutputMode) {
    println!("{n}");
}

pub fn print_recovered(ids: &[i64], mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }
    if ids.is_empty() {
        println!("no orphaned tickets");
    } else {
        let list = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
        println!("reclaimed {} ticket(s): {list}", ids.len());
    }
}

pub fn print_nothing_claimable(mode: OutputMode) {
    if mode != OutputMode::Quiet {
        eprintln!("no claimable ticket");
    }
}

pub fn print_migrated(version: i64, mode: OutputMode) {
    if mode != OutputMode::Quiet {
        println!("store at schema version {version}");
    }
}

pub fn print_claimed(ticket: &Ticket, format: Format, mode: OutputMode) {
    if format == Format::Json {
        println!("{}", serde_json::to_string(ticket).expect("Ticket always serializes"));
        return;
    }
    if mode == OutputMode::Quiet {
        println!("{}", ticket.id);
    } else {
        println!("claimed #{} {}", ticket.id, ticket.title);
    }
}

pub fn print_list(tickets: &[Ticket], format: Format, mode: OutputMode) {
    if format == Format::Json {
        println!("{}", serde_json::to_string(tickets).expect("tickets always serialize"));
        return;
    }
    if mode == OutputMode::Quiet {
        for ticket in tickets {
            println!("{}", ticket.id);
        }
        return;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    if !color_enabled() {
        table.force_no_tty();
    }
    table.set_header(vec!["id", "status", "type", "assigned", "title"]);
    for ticket in tickets {
        table.add_row(vec![
            ticket.id.to_string(),
            ticket.status.to_string(),
            ticket.ticket_type.to_string(),
            ticket.assigned_to.clone().unwrap_or_default(),
            ticket.title.clone(),
        ]);
    }
    println!("{table}");
}

pub fn print_detail(detail: &TicketDetail, format: Format, mode: OutputMode) {
    if format == Format::Json {
        println!("{}", serde_json::to_string(detail).expect("TicketDetail always serializes"));
        return;
    }
    if mode == OutputMode::Quiet {
        return;
    }
    let t = &detail.ticket;
    println!("#{} {} [{}/{}]", t.id, t.title, t.status, t.ticket_type);
    if let Some(desc) = &t.description {
        println!("  {desc}");
    }
    if let Some(agent) = &t.assigned_to {
        println!("  assigned: {agent}");
    }
    if !detail.blocked_by.is_empty() {
        println!("  blocked by: {:?}", detail.blocked_by);
    }
    if !detail.blocks.is_empty() {
        println!("  blocks: {:?}", detail.blocks);
    }
    if !detail.children.is_empty() {
        println!("  children: {:?}", detail.children);
    }
    for comment in &detail.comments {
        println!("  [{}] {}: {}", comment.created_at.to_rfc3339(), comment.author, comment.body);
    }
}

pub fn print_comments(comments: &[Comment], format: Format, mode: OutputMode) {
    if format == Format::Json {
        println!("{}", serde_json::to_string(comments).expect("comments always serialize"));
        return;
    }
    if mode == OutputMode::Quiet {
        return;
    }
    for comment in comments {
        println!("[{}] {}: {}", comment.created_at.to_rfc3339(), comment.author, comment.body);
    }
}

pub fn print_activity(events: &[ActivityEvent], mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }
    for event in events {
        let ticket = event.ticket_id.map_or_else(|| "-".to_string(), |id| id.to_string());
        let agent = event.agent_id.as_deref().unwrap_or("-");
        println!("[{}] #{} {} {} {}", event.created_at.to_rfc3339(), ticket, agent, event.action, event.detail.as_deref().unwrap_or(""));
    }
}
