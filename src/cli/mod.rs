//! CLI module - Command-line interface for Agora
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

use crate::entities::users::Role;

/// Agora - social networking backend
#[derive(Parser)]
#[command(name = "agora")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    #[command(alias = "web", alias = "daemon")]
    Serve,

    /// Create default config file
    Init,

    /// Change a user's role, e.g. to bootstrap the first admin
    GrantRole {
        /// Username of the account to change
        username: String,
        /// New role: `user` or `admin`
        #[arg(value_parser = parse_role)]
        role: Role,
    },

    /// List registered users
    #[command(alias = "ls")]
    Users,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse()
}

pub use commands::*;
