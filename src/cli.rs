use crate::domain::models::{ActionKind, Role, View};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "satark", version, about = "Satark citizen portal and screening console")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        help = "Backend base URL (overrides config file and SATARK_API_URL)"
    )]
    pub api: Option<String>,
    #[arg(
        long,
        global = true,
        default_value = "warn",
        help = "Log filter written to stderr (e.g. info, satark=debug)"
    )]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate and store the session.
    Login {
        username: String,
        #[arg(long, env = "SATARK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Register a new account.
    Signup {
        username: String,
        #[arg(long, env = "SATARK_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, value_enum, default_value_t = Role::Citizen)]
        role: Role,
        #[arg(long, default_value_t = false, help = "Log in right after registering")]
        login: bool,
    },
    Logout,
    Whoami,
    /// Show the gate decision for a view without opening it.
    Authorize {
        #[arg(value_enum)]
        view: View,
    },
    Nav,
    /// Submit (or resubmit) the citizen application.
    Apply {
        #[arg(long)]
        pan: String,
        #[arg(long)]
        bank_account: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<String>,
    },
    /// Show the screening status of your own application.
    Status,
    Feed {
        #[command(subcommand)]
        command: FeedCommands,
    },
    /// Apply an action to one application.
    Act {
        id: i64,
        #[arg(value_enum)]
        action: ActionKind,
    },
    Stats,
    Threats,
    Users,
}

#[derive(Subcommand, Debug)]
pub enum FeedCommands {
    /// Fetch the feed once.
    Show {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value_t = false)]
        analytics: bool,
    },
    /// Live feed; stdin lines change the search or run /approve, /force,
    /// /flag, /refresh and /quit.
    Watch {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        interval_secs: Option<u64>,
        #[arg(long, help = "Exit after this many snapshots")]
        ticks: Option<u64>,
        #[arg(long, default_value_t = false)]
        analytics: bool,
    },
}
