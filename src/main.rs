//! Tournées planner - groups delivery orders into truck routes
//!
//! Reads an order file, geocodes the cities, partitions the orders by city
//! and workday and builds capacity-, distance- and time-window-compatible
//! routes for a round-robin fleet.

mod cli;
mod config;
mod defaults;
mod error;
mod services;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, OutputFormat, PlanArgs};
use crate::config::{validate_radius, Config};
use crate::defaults::{DEFAULT_MAX_VOLUME_M3, DEFAULT_MAX_WEIGHT_KG, MAX_FLEET_SIZE};
use crate::services::fleet::FleetRegistry;
use crate::services::geocoding::create_geocoder;
use crate::services::planner::Planner;
use crate::services::{import, render};
use crate::types::{overlaps, TimeWindow};

fn init_logging() -> WorkerGuard {
    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "planner.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // stderr keeps stdout free for the rendered routes
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tournees_planner=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env must be loaded before LOGS_DIR/RUST_LOG are read
    dotenvy::dotenv().ok();
    let _guard = init_logging();

    let result = match cli.command {
        Command::Plan(args) => run_plan(args).await,
        Command::CheckWindow { first, second } => {
            check_window(&first, &second);
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn run_plan(args: PlanArgs) -> Result<()> {
    let config = Config::from_env()?;
    info!("Configuration loaded");

    let grouping_radius_km = match args.radius {
        Some(radius) => validate_radius(radius)?,
        None => config.grouping_radius_km,
    };

    let delimiter = u8::try_from(args.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| {
            format!(
                "Delimiter '{}' must be a single ASCII character",
                args.delimiter
            )
        })?;

    let fleet = if let Some(path) = &args.fleet {
        import::load_fleet(path, delimiter)?
    } else if !args.trucks.is_empty() {
        FleetRegistry::new(args.trucks)
    } else {
        if args.fleet_size > MAX_FLEET_SIZE {
            anyhow::bail!("--fleet-size must be at most {}", MAX_FLEET_SIZE);
        }
        FleetRegistry::with_default_trucks(args.fleet_size)?
    };
    if fleet.is_empty() {
        warn!(
            "Fleet is empty, routes get no truck and the default capacity of {} kg / {} m³",
            DEFAULT_MAX_WEIGHT_KG, DEFAULT_MAX_VOLUME_M3
        );
    }
    info!(
        "Fleet: {} truck(s), grouping radius {} km",
        fleet.len(),
        grouping_radius_km
    );
    for truck in fleet.iter() {
        debug!(
            "Truck {}: {} kg / {} m³",
            truck.plate, truck.max_weight_kg, truck.max_volume_m3
        );
    }

    let orders = import::load_orders(&args.orders, delimiter)
        .with_context(|| format!("Cannot plan {}", args.orders.display()))?;

    let geocoder = create_geocoder(&config.geocoder)?;
    let planner = Planner::new(geocoder, fleet, grouping_radius_km, config.geocoder.concurrency);
    let outcome = planner.plan(orders).await;
    if !outcome.unresolved_places.is_empty() {
        warn!(
            "Unresolved places (orders planned alone): {}",
            outcome.unresolved_places.join(", ")
        );
    }

    match args.format {
        OutputFormat::Table => print!("{}", render::render_tables(&outcome.routes)),
        OutputFormat::Json => println!("{}", render::render_json(&outcome.routes)?),
    }

    if let Some(path) = &args.map {
        render::write_map(path, &outcome.routes)?;
        info!("Map written to {}", path.display());
    }

    Ok(())
}

fn check_window(first: &str, second: &str) {
    for window in [first, second] {
        if let Err(e) = window.parse::<TimeWindow>() {
            println!("'{}': {}", window, e);
        }
    }
    let verdict = if overlaps(first, second) { "overlap" } else { "no overlap" };
    println!("{} / {}: {}", first, second, verdict);
}
