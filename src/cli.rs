//! Command-line interface definition for kampus
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for logging in and out and viewing the student record.

use clap::{Parser, Subcommand};

/// kampus - student session and record viewer
///
/// Logs in against Firebase Authentication, caches the session locally,
/// and shows the signed-in student's record from Firestore.
#[derive(Parser, Debug, Clone)]
#[command(name = "kampus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the session storage location
    #[arg(long, env = "KAMPUS_STORAGE_PATH")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for kampus
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in with email and password and cache the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password (prompted for when omitted)
        #[arg(short, long, env = "KAMPUS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and clear the cached session
    Logout,

    /// Show who is signed in and where that came from
    Whoami,

    /// Show the signed-in student's record
    Profile {
        /// Print the resolution as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive shell that keeps one session open
    Shell,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
