//! Command-line interface: `serve` plus maintenance commands that mutate the
//! database directly.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::db::UserRole;
use crate::services::{init, maintenance};

#[derive(Parser, Debug)]
#[command(
    name = "forum-api",
    author,
    version,
    about = "Forum and expert marketplace API server and maintenance tools"
)]
pub struct Cli {
    /// SQLite database file to use instead of DATABASE_URL
    #[arg(long, short = 'd', global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server (default)
    Serve,
    /// Promote a user to expert and mark them verified
    PromoteExpert {
        /// Email of the user to promote
        email: String,
    },
    /// Set a new password for a user
    ResetPassword {
        /// Email of the user
        email: String,
        /// New plaintext password (at least 8 characters)
        password: String,
    },
    /// Create a user account
    CreateUser {
        email: String,
        name: String,
        password: String,
        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,
    },
    /// Insert the default forum categories into an empty database
    SeedCategories,
    /// Send a notification to a user (handy for testing the notification UI)
    Notify {
        email: String,
        title: String,
        message: String,
        #[arg(long = "type", default_value = "system")]
        kind: String,
        #[arg(long)]
        link: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RoleArg {
    User,
    Expert,
    Admin,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => UserRole::User,
            RoleArg::Expert => UserRole::Expert,
            RoleArg::Admin => UserRole::Admin,
        }
    }
}

impl Cli {
    /// Apply `--database` on top of an environment-derived config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.database {
            config.database.url = format!("sqlite://{}", path.display());
        }
    }
}

/// Run a maintenance command against the database. `Serve` is handled by the caller.
pub async fn run_maintenance(cli: &Cli, command: &Commands) -> Result<()> {
    let mut config = Config::maintenance_from_env()?;
    cli.apply_overrides(&mut config);

    let pool = init::init_db(&config.database).await?;

    match command {
        Commands::Serve => anyhow::bail!("`serve` is not a maintenance command"),
        Commands::PromoteExpert { email } => {
            let user = maintenance::promote_expert(&pool, email)
                .await
                .with_context(|| format!("Failed to promote {}", email))?;
            println!(
                "{} is now an {} (verified: {})",
                user.email,
                user.role.as_str(),
                user.is_verified
            );
        }
        Commands::ResetPassword { email, password } => {
            let user = maintenance::reset_password(&pool, email, password)
                .await
                .with_context(|| format!("Failed to reset password for {}", email))?;
            println!("Password updated for {}", user.email);
        }
        Commands::CreateUser {
            email,
            name,
            password,
            role,
        } => {
            let user = maintenance::create_user(&pool, email, name, password, (*role).into())
                .await
                .with_context(|| format!("Failed to create user {}", email))?;
            println!("Created {} {} ({})", user.role.as_str(), user.email, user.id);
        }
        Commands::SeedCategories => {
            let inserted = maintenance::seed_categories(&pool)
                .await
                .context("Failed to seed categories")?;
            println!("Inserted {} categories", inserted);
        }
        Commands::Notify {
            email,
            title,
            message,
            kind,
            link,
        } => {
            let notification =
                maintenance::notify_user(&pool, email, kind, title, message, link.as_deref())
                    .await
                    .with_context(|| format!("Failed to notify {}", email))?;
            println!("Created notification {} for {}", notification.id, email);
        }
    }

    pool.close().await;
    Ok(())
}
