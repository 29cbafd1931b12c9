//! CLI interface for the clinic portal

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};

use crate::auth::Role;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(author = "Krakaw")]
#[command(version = "1.0.0")]
#[command(about = "Role-gated terminal client for the clinic management API", long_about = None)]
pub struct Cli {
    /// Override the API base URL from clinic.toml
    #[arg(long, global = true, env = "CLINIC_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new clinic.toml configuration file
    Init,

    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        /// Password (prompted for when omitted)
        #[arg(long, env = "CLINIC_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Use the super-admin login
        #[arg(long)]
        super_admin: bool,
    },

    /// Create an account and log into it
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        /// Password (prompted for when omitted)
        #[arg(long, env = "CLINIC_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the saved session
    Logout,

    /// Show the logged-in user
    Whoami {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Check whether the current session may open a page
    Open {
        /// Page route, e.g. /doctor/patients
        route: String,
    },

    /// Scope lists to a clinic; without an id, go back to your own clinic
    UseClinic {
        clinic_id: Option<String>,
    },

    /// Manage patients
    Patients {
        #[command(subcommand)]
        action: ResourceAction,
    },

    /// Manage visits
    Visits {
        #[command(subcommand)]
        action: ResourceAction,
    },

    /// Manage eye examinations
    Examinations {
        #[command(subcommand)]
        action: ResourceAction,
    },

    /// Manage sales
    Sales {
        #[command(subcommand)]
        action: ResourceAction,
    },

    /// Manage products and stock
    Products {
        #[command(subcommand)]
        action: ResourceAction,
    },

    /// Manage staff accounts
    Users {
        #[command(subcommand)]
        action: ResourceAction,
    },

    /// Manage clinics
    Clinics {
        #[command(subcommand)]
        action: ResourceAction,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum ResourceAction {
    /// List records
    List {
        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Clinic scope (defaults to the selected clinic)
        #[arg(long)]
        clinic: Option<String>,

        /// Only records with this role (users)
        #[arg(long)]
        role: Option<Role>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one record
    Show {
        id: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Create a record from JSON (inline, or @path/to/file.json)
    Create {
        #[arg(short, long)]
        data: String,
    },

    /// Replace a record from JSON (inline, or @path/to/file.json)
    Update {
        id: String,

        #[arg(short, long)]
        data: String,
    },

    /// Delete a record
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
