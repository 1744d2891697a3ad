// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `warden status` command implementation.
//!
//! Opens the configured database, runs the adapter health check, and compares
//! applied migrations against the ones compiled into this build. A database
//! file that does not exist yet is reported rather than created.

use std::io::IsTerminal;
use std::path::Path;

use serde::Serialize;
use warden_config::model::WardenConfig;
use warden_core::{HealthStatus, PluginAdapter, WardenError};
use warden_storage::{SqliteStorage, migrations};

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub database_path: String,
    pub exists: bool,
    pub healthy: bool,
    pub health: String,
    pub schema_version: Option<i64>,
    pub applied_migrations: usize,
    pub embedded_migrations: usize,
}

fn describe(health: &HealthStatus) -> (bool, String) {
    match health {
        HealthStatus::Healthy => (true, "healthy".to_string()),
        HealthStatus::Unhealthy(reason) => (false, format!("unhealthy: {reason}")),
    }
}

/// Run the `warden status` command.
///
/// If `--json` is passed, outputs structured JSON for scripting.
/// If `--plain` is passed or stdout is not a TTY, disables colors.
pub async fn run_status(config: &WardenConfig, json: bool, plain: bool) -> Result<(), WardenError> {
    let path = config.storage.database_path.clone();
    let embedded = migrations::embedded_versions().len();

    let response = if Path::new(&path).exists() {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let (healthy, health) = describe(&storage.health_check().await?);
        let applied = migrations::status(storage.database()?).await?;
        storage.close().await?;
        StatusResponse {
            database_path: path,
            exists: true,
            healthy,
            health,
            schema_version: applied.last().map(|m| m.version),
            applied_migrations: applied.len(),
            embedded_migrations: embedded,
        }
    } else {
        StatusResponse {
            database_path: path,
            exists: false,
            healthy: false,
            health: "not created".to_string(),
            schema_version: None,
            applied_migrations: 0,
            embedded_migrations: embedded,
        }
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&response, use_color);
    }
    Ok(())
}

fn print_status(status: &StatusResponse, use_color: bool) {
    println!();
    println!("  warden status");
    println!("  {}", "-".repeat(35));
    println!("    Database: {}", status.database_path);

    if use_color {
        use colored::Colorize;
        if status.healthy {
            println!("    State:    {} {}", "✓".green(), status.health.green());
        } else {
            println!("    State:    {} {}", "✗".red(), status.health.red());
        }
    } else if status.healthy {
        println!("    State:    [OK] {}", status.health);
    } else {
        println!("    State:    [FAIL] {}", status.health);
    }

    println!(
        "    Schema:   {}/{} migrations applied",
        status.applied_migrations, status.embedded_migrations
    );
    if !status.exists {
        println!();
        println!("  Create it with: warden migrate");
    }
    println!();
}
