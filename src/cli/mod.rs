// src/cli/mod.rs — CLI definition (clap derive)

pub mod auth;
pub mod stats;
pub mod tasks;

use clap::{Parser, Subcommand};

use crate::api::types::{Priority, TaskStatus};
use crate::core::view_model::SortOrder;
use crate::session::Gate;

#[derive(Parser)]
#[command(name = "taskmaster", about = "Task tracking client for the TaskMaster API", version)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Backend URL (overrides config and TASKMASTER_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// Replace an existing session
        #[arg(long)]
        force: bool,
    },
    /// Create an account and log in
    Signup {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// Replace an existing session
        #[arg(long)]
        force: bool,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List tasks (filtered, sorted, paginated)
    Tasks {
        /// Only this priority (1-5)
        #[arg(long)]
        priority: Option<Priority>,
        /// Only this status (pending | finished)
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Sort as field:direction, e.g. endTime:desc
        #[arg(long)]
        sort: Option<SortOrder>,
        /// 1-based page number
        #[arg(long, default_value = "1")]
        page: usize,
        /// Rows per page (defaults to view.page_size)
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Create a task (prompts for anything not given)
    Add {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        /// Start time (RFC 3339 or YYYY-MM-DDTHH:MM local)
        #[arg(long)]
        start: Option<String>,
        /// End time (RFC 3339 or YYYY-MM-DDTHH:MM local)
        #[arg(long)]
        end: Option<String>,
    },
    /// Change fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Mark a task finished now
    Finish { id: String },
    /// Delete one or more tasks
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Show task statistics
    Stats,
    /// Open the interactive dashboard
    Dashboard,
}

impl Commands {
    /// Session requirement for this command.
    pub fn gate(&self) -> Gate {
        match self {
            Commands::Login { .. } | Commands::Signup { .. } => Gate::GuestOnly,
            Commands::Logout | Commands::Whoami => Gate::Open,
            Commands::Tasks { .. }
            | Commands::Add { .. }
            | Commands::Edit { .. }
            | Commands::Finish { .. }
            | Commands::Delete { .. }
            | Commands::Stats
            | Commands::Dashboard => Gate::Protected,
        }
    }

    /// `--force` on login/signup bypasses the guest-only gate.
    pub fn forced(&self) -> bool {
        matches!(
            self,
            Commands::Login { force: true, .. } | Commands::Signup { force: true, .. }
        )
    }
}

/// A failure the user has already been told about through a notification.
/// The entry point exits non-zero without printing it again.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct AlreadyReported(pub String);
