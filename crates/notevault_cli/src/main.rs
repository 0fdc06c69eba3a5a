//! notevault command-line front end.
//!
//! # Responsibility
//! - Map subcommands onto core note, sharing and auth operations.
//! - Print every outcome as a pretty JSON envelope on stdout.
//!
//! # Invariants
//! - Service failures exit with status 1 after printing a failure envelope.
//! - Process-level failures (database open, logging setup) exit with status 2.

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::SignupArgs;
use log::info;
use notevault_core::db::open_db;
use notevault_core::{default_log_level, init_logging};
use output::Envelope;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "notevault")]
#[command(about = "Multi-user notes with version history and sharing")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(
        long,
        global = true,
        env = "NOTEVAULT_DB",
        default_value = "notevault.sqlite3"
    )]
    db: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "NOTEVAULT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "NOTEVAULT_LOG_DIR")]
    log_dir: Option<String>,

    /// Bearer token returned by `login`
    #[arg(long, global = true, env = "NOTEVAULT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new user
    Signup {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },

    /// Exchange credentials for a bearer token
    Login {
        /// Login id (the account email)
        #[arg(long, default_value = "")]
        username: String,

        #[arg(long, default_value = "")]
        password: String,
    },

    /// Revoke the current bearer token
    Logout,

    /// Create a note owned by the current user
    Create {
        content: String,
    },

    /// Share a note with other users
    Share {
        /// Note slug
        note: String,

        /// Recipient user slugs
        users: Vec<String>,
    },

    /// Show one note
    Get {
        slug: String,
    },

    /// Replace the content of a note
    Update {
        slug: String,
        content: String,
    },

    /// Show the version history of a note
    History {
        slug: String,
    },

    /// Check core linkage
    Ping,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli) {
        Ok(envelope) if envelope.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(err) => {
            eprintln!("notevault: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<Envelope> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    let token = cli.token.as_deref();
    let envelope = match cli.command {
        Commands::Ping => commands::ping()?,
        command => {
            let mut conn = open_db(&cli.db)
                .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
            info!(
                "event=cli_command module=cli status=start db={}",
                cli.db.display()
            );
            match command {
                Commands::Signup {
                    email,
                    password,
                    first_name,
                    last_name,
                } => commands::signup(
                    &conn,
                    SignupArgs {
                        email,
                        password,
                        first_name,
                        last_name,
                    },
                )?,
                Commands::Login { username, password } => {
                    commands::login(&conn, &username, &password)?
                }
                Commands::Logout => commands::logout(&conn, token)?,
                Commands::Create { content } => commands::create(&mut conn, token, content)?,
                Commands::Share { note, users } => {
                    commands::share(&mut conn, token, &note, &users)?
                }
                Commands::Get { slug } => commands::get(&mut conn, token, &slug)?,
                Commands::Update { slug, content } => {
                    commands::update(&mut conn, token, &slug, content)?
                }
                Commands::History { slug } => commands::history(&conn, token, &slug)?,
                Commands::Ping => commands::ping()?,
            }
        }
    };

    envelope.print()?;
    Ok(envelope)
}
