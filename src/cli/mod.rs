//! Queue CLI (§4.3, §6): a process-per-invocation front-end over
//! [`Coordinator`], dispatched via `clap`'s derive API.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::coordinator::{Coordinator, CreateOptions, UpdateOptions};
use crate::discovery::resolve_store_path;
use crate::error::Error;
use crate::model::{Status, TicketType};
use crate::recovery::recover_orphans;
use crate::store::Store;

mod output;

pub use output::{Format, OutputMode};

#[derive(Parser)]
#[command(name = "tq", about = "Ticket coordination queue for autonomous agent swarms")]
pub struct Cli {
    /// Path to the SQLite store. Overrides auto-discovery and `TICKET_DB`.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Suppress all non-essential output.
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new ticket.
    Create {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        parent: Option<i64>,
        #[arg(long)]
        assign: Option<String>,
        #[arg(long = "blocked-by")]
        blocked_by: Option<i64>,
        #[arg(long = "block-dependents-of")]
        block_dependents_of: Option<i64>,
        #[arg(long = "created-by")]
        created_by: Option<String>,
        #[arg(long = "type", value_enum)]
        ticket_type: Option<CliTicketType>,
    },
    /// Update an existing ticket.
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        assign: Option<String>,
        #[arg(long)]
        status: Option<CliStatus>,
        #[arg(long = "type", value_enum)]
        ticket_type: Option<CliTicketType>,
    },
    /// List tickets.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "assigned-to")]
        assigned_to: Option<String>,
        #[arg(long, default_value = "text")]
        format: Format,
    },
    /// Show full ticket detail.
    Show {
        id: i64,
        #[arg(long, default_value = "text")]
        format: Format,
    },
    /// Count tickets.
    Count {
        #[arg(long)]
        status: Option<String>,
    },
    /// Claim the next available ticket.
    ClaimNext {
        #[arg(long, required = true)]
        agent: String,
        #[arg(long, default_value = "text")]
        format: Format,
    },
    /// Add a comment to a ticket.
    Comment {
        id: i64,
        body: String,
        #[arg(long, default_value = "human")]
        author: String,
    },
    /// List comments on a ticket.
    Comments {
        id: i64,
        #[arg(long, default_value = "text")]
        format: Format,
    },
    /// Mark a ticket's work as done, pending finalization.
    Complete { id: i64 },
    /// Release a claimed ticket.
    Unclaim { id: i64 },
    /// Add a blocker relationship.
    Block {
        id: i64,
        #[arg(long, required = true)]
        by: i64,
    },
    /// Remove a blocker relationship.
    Unblock {
        id: i64,
        #[arg(long, required = true)]
        by: i64,
    },
    /// Show the activity log, newest first.
    Log {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Apply any pending schema migrations.
    Migrate,
    /// Reclaim tickets held by agents that no longer exist.
    Recover,
    /// Diagnostics that don't mutate the store.
    Diagnose {
        #[command(subcommand)]
        what: DiagnoseCommand,
    },
    /// Finalize a completed ticket as done. Used by the agent runtime's
    /// post-push step, not meant for interactive use.
    #[command(hide = true)]
    MarkDone { id: i64 },
}

#[derive(Subcommand)]
pub enum DiagnoseCommand {
    /// Walk the blocker graph and report the first cycle found, if any.
    Cycles,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum CliStatus {
    Open,
    InProgress,
    Ready,
    Done,
}

impl From<CliStatus> for Status {
    fn from(value: CliStatus) -> Self {
        match value {
            CliStatus::Open => Self::Open,
            CliStatus::InProgress => Self::InProgress,
            CliStatus::Ready => Self::Ready,
            CliStatus::Done => Self::Done,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum CliTicketType {
    Task,
    Proposal,
    Question,
    Verify,
}

impl From<CliTicketType> for TicketType {
    fn from(value: CliTicketType) -> Self {
        match value {
            CliTicketType::Task => Self::Task,
            CliTicketType::Proposal => Self::Proposal,
            CliTicketType::Question => Self::Question,
            CliTicketType::Verify => Self::Verify,
        }
    }
}

/// Run the parsed CLI, printing to stdout/stderr per `format`, returning
/// the process exit code per §4.3.
pub fn run(cli: Cli) -> ExitCode {
    let mode = if cli.quiet { OutputMode::Quiet } else { OutputMode::Human };

    let db_flag = cli.db.as_ref().and_then(|p| p.to_str()).map(ToString::to_string);
    let env_override = std::env::var("TICKET_DB").ok();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let path = resolve_store_path(db_flag.as_deref(), env_override.as_deref(), &cwd);

    if matches!(cli.command, Commands::Migrate) {
        return match Store::migrate(&path) {
            Ok(version) => {
                output::print_migrated(version, mode);
                ExitCode::SUCCESS
            }
            Err(err) => report(&err, mode),
        };
    }

    let store = match Store::open(&path) {
        Ok(store) => store,
        Err(err) => return report(&err, mode),
    };
    let mut coordinator = Coordinator::new(store);

    match dispatch(&mut coordinator, cli.command, mode) {
        Ok(code) => code,
        Err(err) => report(&err, mode),
    }
}

#[allow(clippy::too_many_lines)]
fn dispatch(coord: &mut Coordinator, command: Commands, mode: OutputMode) -> crate::error::Result<ExitCode> {
    match command {
        Commands::Create {
            title,
            description,
            parent,
            assign,
            blocked_by,
            block_dependents_of,
            created_by,
            ticket_type,
        } => {
            let id = coord.create(
                &title,
                CreateOptions {
                    description,
                    parent_id: parent,
                    assigned_to: assign,
                    created_by,
                    ticket_type: ticket_type.map(Into::into),
                    blocked_by,
                    block_dependents_of,
                },
            )?;
            output::print_created(id, mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Update { id, title, description, assign, status, ticket_type } => {
            coord.update(
                id,
                UpdateOptions {
                    title,
                    description,
                    assigned_to: assign,
                    status: status.map(Into::into),
                    ticket_type: ticket_type.map(Into::into),
                },
            )?;
            output::print_ok(mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::List { status, assigned_to, format } => {
            let tickets = coord.list(status.as_deref(), assigned_to.as_deref())?;
            output::print_list(&tickets, format, mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Show { id, format } => {
            let detail = coord.show(id)?;
            output::print_detail(&detail, format, mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Count { status } => {
            let n = coord.count(status.as_deref())?;
            output::print_count(n, mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::ClaimNext { agent, format } => match coord.claim_next(&agent) {
            Ok(ticket) => {
                output::print_claimed(&ticket, format, mode);
                Ok(ExitCode::SUCCESS)
            }
            Err(Error::NotFound(_)) => {
                output::print_nothing_claimable(mode);
                Ok(ExitCode::FAILURE)
            }
            Err(err) => Err(err),
        },
        Commands::Comment { id, body, author } => {
            coord.comment(id, &author, &body)?;
            output::print_ok(mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Comments { id, format } => {
            let detail = coord.show(id)?;
            output::print_comments(&detail.comments, format, mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Complete { id } => {
            coord.complete(id)?;
            output::print_ok(mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Unclaim { id } => {
            coord.unclaim(id)?;
            output::print_ok(mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Block { id, by } => {
            coord.block(id, by)?;
            output::print_ok(mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Unblock { id, by } => {
            coord.unblock(id, by)?;
            output::print_ok(mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Log { limit } => {
            let events = coord.activity(limit)?;
            output::print_activity(&events, mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Recover => {
            let reclaimed = recover_orphans(coord.store())?;
            output::print_recovered(&reclaimed, mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Diagnose { what: DiagnoseCommand::Cycles } => {
            #[allow(clippy::option_if_let_else)]
            if let Some(cycle) = coord.find_cycle()? {
                let path = cycle.iter().map(i64::to_string).collect::<Vec<_>>().join(" -> ");
                println!("cycle found: {path}");
                Ok(ExitCode::FAILURE)
            } else {
                if !matches!(mode, OutputMode::Quiet) {
                    println!("no cycles");
                }
                Ok(ExitCode::SUCCESS)
            }
        }
        Commands::MarkDone { id } => {
            coord.mark_done(id)?;
            output::print_ok(mode);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Migrate => unreachable!("handled in run() before a store is opened"),
    }
}

fn report(err: &Error, mode: OutputMode) -> ExitCode {
    if !matches!(mode, OutputMode::Quiet) {
        eprintln!("error: {err}");
    }
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
}
