//! Operator CLI for a relief deployment
//!
//! Applies migrations, bootstraps the single admin, issues tokens and dumps
//! logistics history. Results are printed as JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use relief_core::common::{ReferenceId, SupportRequestId};
use relief_core::config::Config;
use relief_core::domains::auth::JwtService;
use relief_core::domains::logistics::{logistics_history, LogisticStatus, LogisticsHistoryFilter};
use relief_core::domains::users::{bootstrap_admin, issue_token, NewUser};
use relief_core::kernel::{PgStore, ReliefDeps, TracingActivityLogger};
use serde::Serialize;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "relief-admin")]
#[command(about = "Relief coordination operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,

    /// Create the one admin account
    BootstrapAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: Option<String>,
        /// Pre-hashed credential
        #[arg(long)]
        password_hash: String,
    },

    /// Sign a bearer token for an existing account
    IssueToken {
        #[arg(long)]
        reference: ReferenceId,
    },

    /// Print logistics history, newest first
    History {
        /// Reference id of the account making the request
        #[arg(long = "as")]
        actor: ReferenceId,
        #[arg(long)]
        support_request: Option<SupportRequestId>,
        #[arg(long)]
        status: Option<LogisticStatus>,
    },
}

#[derive(Serialize)]
struct TokenResponse<'a> {
    reference: &'a ReferenceId,
    token: String,
}

fn output<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relief_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Migrate => cmd_migrate(&config).await,
        Commands::BootstrapAdmin {
            name,
            email,
            phone,
            address,
            password_hash,
        } => {
            let input = NewUser {
                name,
                email,
                phone_number: phone,
                address,
                password_hash,
            };
            cmd_bootstrap_admin(&config, input).await
        }
        Commands::IssueToken { reference } => cmd_issue_token(&config, &reference).await,
        Commands::History {
            actor,
            support_request,
            status,
        } => {
            let filter = LogisticsHistoryFilter {
                support_request_id: support_request,
                status,
                ..LogisticsHistoryFilter::default()
            };
            cmd_history(&config, &actor, filter).await
        }
    }
}

/// The background store logger can lose writes when a short-lived process
/// exits, so CLI activity goes to the log stream instead.
async fn connect(config: &Config) -> Result<(ReliefDeps, Arc<JwtService>)> {
    let (mut deps, jwt) = ReliefDeps::connect(config).await?;
    deps.activity = Arc::new(TracingActivityLogger);
    Ok((deps, jwt))
}

async fn cmd_migrate(config: &Config) -> Result<()> {
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    PgStore::new(pool).migrate().await?;
    tracing::info!("Migrations applied");
    output(&serde_json::json!({ "success": true }))
}

async fn cmd_bootstrap_admin(config: &Config, input: NewUser) -> Result<()> {
    let (deps, _) = connect(config).await?;
    let admin = bootstrap_admin(input, &deps).await?;
    output(&admin)
}

async fn cmd_issue_token(config: &Config, reference: &ReferenceId) -> Result<()> {
    let (deps, jwt) = connect(config).await?;
    let token = issue_token(reference, &jwt, &deps).await?;
    output(&TokenResponse { reference, token })
}

async fn cmd_history(
    config: &Config,
    actor: &ReferenceId,
    filter: LogisticsHistoryFilter,
) -> Result<()> {
    let (deps, _) = connect(config).await?;
    let identity = deps
        .store
        .user_by_reference(actor)
        .await?
        .with_context(|| format!("No account with reference {}", actor))?
        .identity();

    let mut entries = logistics_history(filter, &identity, &deps)?;
    while let Some(entry) = entries.try_next().await? {
        output(&entry)?;
    }
    Ok(())
}
