//! CLI argument parsing for the tournees-planner binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::defaults::DEFAULT_FLEET_SIZE;
use crate::services::import::parse_truck_spec;
use crate::types::Truck;

#[derive(Parser)]
#[command(name = "tournees-planner", about = "Group delivery orders into truck routes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plan routes for an order file
    Plan(PlanArgs),
    /// Tell whether two HH:MM-HH:MM windows overlap
    CheckWindow { first: String, second: String },
}

#[derive(Args)]
pub struct PlanArgs {
    /// Order file, `.xlsx` workbook or delimited text with the columns id_client, nom,
    /// prenom, volume, poids, ville, jour_de_travail and heures_de_travail
    pub orders: PathBuf,

    /// Field delimiter of delimited-text order and fleet files
    #[arg(long, default_value_t = ';')]
    pub delimiter: char,

    /// Grouping radius in km (overrides GROUPING_RADIUS_KM)
    #[arg(long)]
    pub radius: Option<f64>,

    /// Fleet file (plaque, poids_max, volume_max)
    #[arg(long, conflicts_with_all = ["trucks", "fleet_size"])]
    pub fleet: Option<PathBuf>,

    /// Truck as PLATE:WEIGHT_KG:VOLUME_M3, repeatable
    #[arg(long = "truck", value_name = "PLATE:WEIGHT:VOLUME", value_parser = parse_truck_spec)]
    pub trucks: Vec<Truck>,

    /// Number of default trucks when no fleet is given (0 = no truck)
    #[arg(long, default_value_t = DEFAULT_FLEET_SIZE, conflicts_with = "trucks")]
    pub fleet_size: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Write a GeoJSON map of the located orders to this file
    #[arg(long)]
    pub map: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
