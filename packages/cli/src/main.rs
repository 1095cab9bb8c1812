#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for location insight.
//!
//! Runs the same pipeline an embedded widget does and renders its
//! snapshots as text. Uses `indicatif-log-bridge` (via
//! [`location_insight_cli_utils::init_logger`]) so that log lines and the
//! status spinner never fight for the terminal.

mod config;
mod map;
mod render;
mod session;

use clap::{Parser, Subcommand};
use dialoguer::Select;
use location_insight_geocoder::service_registry::all_services;
use location_insight_source::registry::all_sources;
use location_insight_widget_models::QueryState;

use crate::config::ConfigArgs;
use crate::session::Session;

#[derive(Parser)]
#[command(name = "location_insight", about = "Location insight scores from the command line")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one location and exit
    Query {
        /// Location to score (defaults to the config's `location`)
        location: Option<String>,
        /// Print the snapshot as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Prompt for locations repeatedly
    Interactive,
    /// List the configured metric backends
    Sources,
    /// List the configured geocoding services
    Services,
}

/// Top-level menu shown when no subcommand is given.
enum Action {
    Search,
    Sources,
    Services,
}

impl Action {
    const ALL: &[Self] = &[Self::Search, Self::Sources, Self::Services];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Search => "Search locations",
            Self::Sources => "List metric sources",
            Self::Services => "List geocoding services",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = location_insight_cli_utils::init_logger();
    let cli = Cli::parse();

    let command = if let Some(command) = cli.command {
        command
    } else {
        println!("Location Insight");
        println!();

        let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::Search => Commands::Interactive,
            Action::Sources => Commands::Sources,
            Action::Services => Commands::Services,
        }
    };

    match command {
        Commands::Sources => {
            println!("{:<12} {:<12} {:<32} NAME", "ID", "CATEGORY", "PATH");
            println!("{}", "-".repeat(80));
            for source in all_sources() {
                println!(
                    "{:<12} {:<12} {:<32} {}",
                    source.id,
                    source.category.to_string(),
                    source.path,
                    source.name
                );
            }
        }
        Commands::Services => {
            println!("{:<12} {:<8} {:<8} NAME", "ID", "ENABLED", "PRIORITY");
            println!("{}", "-".repeat(60));
            for service in all_services() {
                println!(
                    "{:<12} {:<8} {:<8} {}",
                    service.id, service.enabled, service.priority, service.name
                );
            }
        }
        Commands::Query { location, json } => {
            let config = cli.config.load()?;
            let location = location
                .or_else(|| config.location.clone())
                .ok_or("No location given and none configured")?;

            let mut session = Session::new(config, multi)?;
            let snapshot = session.query(&location).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                session.print(&snapshot);
            }
            session.teardown();

            if snapshot.state == QueryState::Error {
                std::process::exit(1);
            }
        }
        Commands::Interactive => {
            let config = cli.config.load()?;
            let mut session = Session::new(config, multi)?;
            session.interactive().await?;
            session.teardown();
        }
    }

    Ok(())
}
