//! Operator CLI for the shipment service.
//!
//! Talks to a running server over its REST API, so it works the same against
//! any store backend.
//!
//! # Usage
//!
//! ```bash
//! # Create a shipment (prompts for anything not given as a flag)
//! shipctl create --sender Alice --recipient Bob --origin NY --destination LA --weight 5
//!
//! # Look one up, list, change status
//! shipctl get SHP-LX2K9A1B-4821
//! shipctl list --status "In Transit"
//! shipctl advance SHP-LX2K9A1B-4821
//! shipctl set-status SHP-LX2K9A1B-4821 "Out for Delivery" --note "Van 12"
//! shipctl deliver SHP-LX2K9A1B-4821
//! shipctl delete SHP-LX2K9A1B-4821
//!
//! # Watch a shipment until Ctrl-C
//! shipctl track SHP-LX2K9A1B-4821 --interval 5
//! ```
//!
//! # Environment Variables
//!
//! - `SHIPMENT_API_URL`: server base URL (default `http://localhost:3000`)
//! - `SHIPMENT_API_TOKEN`: admin token; required for everything but `get`,
//!   `track` and `health`
//! - `POLL_INTERVAL_SECS`: default for `track --interval` (10)
//! - `FLASH_TTL_MS`: default for `track --flash-ttl-ms` (3500)

use shipment_tracker::application::services::MARK_DELIVERED_NOTE;
use shipment_tracker::application::tracker::{
    DEFAULT_FLASH_TTL, DEFAULT_POLL_INTERVAL, FlashSink, PollingSession, TrackerState,
};
use shipment_tracker::api::dto::CreateShipmentRequest;
use shipment_tracker::domain::entities::{
    Notification, ServiceLevel, Severity, Shipment, ShipmentFilter, ShipmentStatus,
};
use shipment_tracker::infrastructure::client::ApiClient;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use std::sync::Arc;
use std::time::Duration;

/// CLI tool for managing shipments.
#[derive(Parser)]
#[command(name = "shipctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(long, env = "SHIPMENT_API_URL", default_value = "http://localhost:3000")]
    api: String,

    /// Admin bearer token
    #[arg(long, env = "SHIPMENT_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a shipment
    Create {
        #[arg(long)]
        sender: Option<String>,
        #[arg(long)]
        recipient: Option<String>,
        #[arg(long)]
        origin: Option<String>,
        #[arg(long)]
        destination: Option<String>,
        /// Weight in kg; anything non-numeric counts as 0
        #[arg(long)]
        weight: Option<String>,
        /// Ship with the Express service level instead of Ground
        #[arg(long)]
        express: bool,
    },

    /// Show a shipment and its history
    Get { tracking: String },

    /// List shipments, most recent first
    List {
        /// Substring of tracking code, sender or recipient
        #[arg(short, long)]
        query: Option<String>,
        /// Exact status, e.g. "In Transit"
        #[arg(short, long)]
        status: Option<ShipmentStatus>,
    },

    /// Move a shipment to its next status
    Advance { tracking: String },

    /// Set a status directly
    SetStatus {
        tracking: String,
        status: ShipmentStatus,
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Mark a shipment delivered
    Deliver { tracking: String },

    /// Delete a shipment
    Delete {
        tracking: String,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Poll a shipment and report status changes until Ctrl-C
    Track {
        tracking: String,
        /// Seconds between polls
        #[arg(
            short,
            long,
            env = "POLL_INTERVAL_SECS",
            default_value_t = DEFAULT_POLL_INTERVAL.as_secs(),
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval: u64,
        /// How long a status notification stays on screen, in milliseconds
        #[arg(
            long,
            env = "FLASH_TTL_MS",
            default_value_t = DEFAULT_FLASH_TTL.as_millis() as u64,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        flash_ttl_ms: u64,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = ApiClient::new(&cli.api, cli.token).context("Invalid --api URL")?;

    match cli.command {
        Commands::Create {
            sender,
            recipient,
            origin,
            destination,
            weight,
            express,
        } => {
            let request = CreateShipmentRequest {
                sender: prompt_missing(sender, "Sender")?,
                recipient: prompt_missing(recipient, "Recipient")?,
                origin: prompt_missing(origin, "Origin address")?,
                destination: prompt_missing(destination, "Destination address")?,
                weight: weight.map(serde_json::Value::String),
                service: Some(if express {
                    ServiceLevel::Express
                } else {
                    ServiceLevel::Ground
                }),
            };
            let shipment = client.create(&request).await?;
            println!("{}", "✅ Shipment created".green().bold());
            print_shipment(&shipment);
        }
        Commands::Get { tracking } => print_shipment(&client.get(&tracking).await?),
        Commands::List { query, status } => list(&client, ShipmentFilter { query, status }).await?,
        Commands::Advance { tracking } => {
            let shipment = client.advance(&tracking).await?;
            println!("{} {}", "➡️  Now".green(), shipment.status.to_string().bold());
        }
        Commands::SetStatus {
            tracking,
            status,
            note,
        } => {
            let shipment = client.set_status(&tracking, status, note).await?;
            println!("{} {}", "✅ Status set to".green(), shipment.status.to_string().bold());
        }
        Commands::Deliver { tracking } => {
            client
                .set_status(
                    &tracking,
                    ShipmentStatus::Delivered,
                    Some(MARK_DELIVERED_NOTE.to_string()),
                )
                .await?;
            println!("{}", "📦 Marked delivered".green().bold());
        }
        Commands::Delete { tracking, yes } => delete(&client, &tracking, yes).await?,
        Commands::Track {
            tracking,
            interval,
            flash_ttl_ms,
        } => {
            track(
                client,
                &tracking,
                Duration::from_secs(interval),
                Duration::from_millis(flash_ttl_ms),
            )
            .await?
        }
        Commands::Health => {
            let health = client.health().await?;
            println!(
                "  Status:    {}\n  Version:   {}\n  Shipments: {}\n  Store:     {}",
                health.status.bold(),
                health.version,
                health.shipments,
                health.checks.store.status
            );
        }
    }

    Ok(())
}

fn prompt_missing(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::new().with_prompt(prompt).interact_text()?),
    }
}

async fn list(client: &ApiClient, filter: ShipmentFilter) -> Result<()> {
    let response = client.list(&filter).await?;

    if response.items.is_empty() {
        println!("{}", "  No shipments found".yellow());
        return Ok(());
    }

    println!(
        "  {:<24} {:<18} {:<18} {:<18}",
        "Tracking".bright_white().bold(),
        "Sender".bright_white().bold(),
        "Recipient".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(80).bright_black());

    for shipment in &response.items {
        println!(
            "  {:<24} {:<18} {:<18} {}",
            shipment.tracking.cyan(),
            shipment.sender,
            shipment.recipient,
            colored_status(shipment.status)
        );
    }

    println!();
    println!("  Total: {}", response.total.to_string().bright_white().bold());
    Ok(())
}

async fn delete(client: &ApiClient, tracking: &str, skip_confirm: bool) -> Result<()> {
    let shipment = client.get(tracking).await?;
    print_shipment(&shipment);

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this shipment?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    client.delete(tracking).await?;
    println!("{}", "🗑️  Shipment deleted".green().bold());
    Ok(())
}

/// Looks the shipment up, then prints every tracker notification until the
/// tracker stops or Ctrl-C is pressed.
async fn track(
    client: ApiClient,
    tracking: &str,
    interval: Duration,
    flash_ttl: Duration,
) -> Result<()> {
    let flash = Arc::new(FlashSink::new(flash_ttl));
    let mut notifications = flash.subscribe();
    let mut session = PollingSession::new(Arc::new(client), Arc::clone(&flash), interval);
    let mut states = session.watch_state();

    let shipment = session.lookup(tracking).await?;
    print_shipment(&shipment);
    println!(
        "{}",
        format!("👀 Polling every {}s, Ctrl-C to stop", interval.as_secs()).bright_black()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                session.stop().await;
                println!();
                println!("{}", "⏹️  Stopped".yellow());
                return Ok(());
            }
            changed = notifications.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let flash = notifications.borrow_and_update().clone();
                if let Some(flash) = flash {
                    print_notification(&flash.notification);
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let state = states.borrow_and_update().clone();
                if let TrackerState::Stopped { reason, .. } = state {
                    anyhow::bail!("Tracking stopped: {}", reason);
                }
            }
        }
    }
}

fn print_notification(notification: &Notification) {
    let line = match notification.severity {
        Severity::Success => format!("🔔 {}", notification.message).green().bold(),
        Severity::Error => format!("⚠️  {}", notification.message).red().bold(),
        Severity::Warn => notification.message.yellow(),
        Severity::Info => notification.message.normal(),
    };
    println!("{}", line);
}

fn colored_status(status: ShipmentStatus) -> ColoredString {
    match status {
        ShipmentStatus::Created => status.as_str().bright_black(),
        s if s.is_terminal() => status.as_str().green(),
        _ => status.as_str().cyan(),
    }
}

fn print_shipment(shipment: &Shipment) {
    println!();
    println!(
        "  {} {}",
        shipment.tracking.bright_yellow().bold(),
        format!("({}%)", shipment.status.progress_percent()).bright_black()
    );
    println!("  Status:      {}", colored_status(shipment.status));
    println!("  From:        {} ({})", shipment.sender, shipment.origin);
    println!("  To:          {} ({})", shipment.recipient, shipment.destination);
    println!("  Weight:      {} kg, {:?}", shipment.weight, shipment.service);
    println!(
        "  Created:     {}",
        shipment.created_at.format("%Y-%m-%d %H:%M")
    );
    println!();
    println!("  {}", "History".bright_white().bold());
    for entry in &shipment.history {
        println!(
            "  {}  {:<18} {}",
            entry.at.format("%Y-%m-%d %H:%M").to_string().bright_black(),
            colored_status(entry.status),
            entry.note
        );
    }
    println!();
}
