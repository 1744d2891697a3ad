// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warden - operator CLI for the courier queue and self-service flow store.

mod commands;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;
use warden_config::model::WardenConfig;
use warden_core::{MessageStatus, MessageType};

/// Warden - multi-tenant courier queue and flow storage.
#[derive(Parser, Debug)]
#[command(name = "warden", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tenant to scope courier and flow commands to (defaults to tenant.default_id).
    #[arg(long, global = true)]
    tenant: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply or inspect schema migrations.
    Migrate {
        #[command(subcommand)]
        action: Option<MigrateAction>,
    },
    /// Show database health and schema state.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Work with the courier message queue.
    Courier {
        #[command(subcommand)]
        action: CourierAction,
    },
    /// Inspect self-service flows.
    Flow {
        #[command(subcommand)]
        action: FlowAction,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateAction {
    /// Apply pending migrations (the default).
    Up,
    /// List applied and embedded migrations.
    Status,
    /// Roll back the last N migrations.
    Rollback {
        #[arg(default_value_t = 1)]
        steps: usize,
    },
}

#[derive(Subcommand, Debug)]
enum CourierAction {
    /// Queue a new message.
    Enqueue {
        recipient: String,
        subject: String,
        body: String,
        /// Delivery channel: email or phone.
        #[arg(long = "type", default_value = "email")]
        message_type: MessageType,
    },
    /// Claim the next queued messages and mark them processing.
    Claim {
        /// How many to claim (defaults to courier.batch_size).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the most recently queued message.
    Latest,
    /// Set a message's status.
    Mark {
        id: Uuid,
        /// queued, processing, or sent.
        status: MessageStatus,
        /// Skip the status transition check.
        #[arg(long)]
        force: bool,
    },
    /// Show one message.
    Show { id: Uuid },
}

#[derive(Subcommand, Debug)]
enum FlowAction {
    /// Show one login flow.
    Show { id: Uuid },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => warden_config::load_and_validate_path(path),
        None => warden_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            warden_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    if let Err(e) = run(cli, &config).await {
        eprintln!("warden: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &WardenConfig) -> Result<(), warden_core::WardenError> {
    let tenant = cli.tenant.as_deref();
    match cli.command {
        Some(Commands::Migrate { action }) => match action.unwrap_or(MigrateAction::Up) {
            MigrateAction::Up => commands::migrate_up(config).await,
            MigrateAction::Status => commands::migrate_status(config).await,
            MigrateAction::Rollback { steps } => commands::migrate_rollback(config, steps).await,
        },
        Some(Commands::Status { json, plain }) => status::run_status(config, json, plain).await,
        Some(Commands::Courier { action }) => {
            let tenant = commands::resolve_tenant(tenant, config)?;
            match action {
                CourierAction::Enqueue {
                    recipient,
                    subject,
                    body,
                    message_type,
                } => {
                    commands::courier_enqueue(config, tenant, recipient, subject, body, message_type)
                        .await
                }
                CourierAction::Claim { limit } => {
                    let limit = limit.unwrap_or(config.courier.batch_size);
                    commands::courier_claim(config, tenant, limit).await
                }
                CourierAction::Latest => commands::courier_latest(config, tenant).await,
                CourierAction::Mark { id, status, force } => {
                    commands::courier_mark(config, tenant, id, status, force).await
                }
                CourierAction::Show { id } => commands::courier_show(config, tenant, id).await,
            }
        }
        Some(Commands::Flow { action }) => {
            let tenant = commands::resolve_tenant(tenant, config)?;
            match action {
                FlowAction::Show { id } => commands::flow_show(config, tenant, id).await,
            }
        }
        None => {
            println!("warden: use --help for available commands");
            Ok(())
        }
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `log.level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warden={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
