//! Order file and fleet file ingestion
//!
//! Orders come from an `.xlsx` workbook (first worksheet) or from delimited
//! text, fleets from delimited text. Both carry a header row. The order file
//! must carry every column of `REQUIRED_COLUMNS`; a missing column stops the
//! run before anything is planned.

use std::io::Read;
use std::path::Path;

use calamine::{open_workbook, Reader, Xlsx};
use csv::StringRecord;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::PlanningError;
use crate::services::fleet::FleetRegistry;
use crate::types::{Coordinates, Order, Truck};

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "id_client",
    "nom",
    "prenom",
    "volume",
    "poids",
    "ville",
    "jour_de_travail",
    "heures_de_travail",
];

#[derive(Debug, Deserialize)]
struct OrderRow {
    id_client: String,
    nom: String,
    prenom: String,
    volume: String,
    poids: String,
    ville: String,
    jour_de_travail: String,
    heures_de_travail: String,
    #[serde(default, alias = "lat")]
    latitude: Option<f64>,
    #[serde(default, alias = "lon", alias = "lng")]
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TruckRow {
    #[serde(alias = "plate")]
    plaque: String,
    #[serde(alias = "max_weight")]
    poids_max: u32,
    #[serde(alias = "max_volume")]
    volume_max: f64,
}

fn reader<R: Read>(input: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Load orders from a file, picking the reader from its extension
pub fn load_orders(path: &Path, delimiter: u8) -> Result<Vec<Order>, PlanningError> {
    let orders = if is_workbook(path) {
        load_workbook_orders(path)?
    } else {
        parse_orders(std::fs::File::open(path)?, delimiter)?
    };
    info!("Loaded {} orders from {}", orders.len(), path.display());
    Ok(orders)
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
}

/// Parse delimited orders, rejecting input that lacks a required column
pub fn parse_orders<R: Read>(input: R, delimiter: u8) -> Result<Vec<Order>, PlanningError> {
    let mut reader = reader(input, delimiter);

    let headers = reader.headers()?.clone();
    check_columns(&headers)?;

    let mut orders = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        // +2: 0-based index plus the header line
        orders.push(order_from_record(&result?, &headers, row_idx + 2)?);
    }
    Ok(orders)
}

/// Read orders from the first worksheet of an `.xlsx` workbook, header on row 1
pub fn load_workbook_orders(path: &Path) -> Result<Vec<Order>, PlanningError> {
    let mut workbook: Xlsx<std::io::BufReader<std::fs::File>> =
        open_workbook(path).map_err(|e: calamine::XlsxError| PlanningError::Excel(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PlanningError::Excel("workbook has no worksheet".to_string()))?
        .map_err(|e| PlanningError::Excel(e.to_string()))?;

    let mut rows = range.rows().map(|cells| {
        cells
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect::<StringRecord>()
    });
    let headers = rows.next().unwrap_or_default();
    check_columns(&headers)?;

    let mut orders = Vec::new();
    for (row_idx, record) in rows.enumerate() {
        // Blank lines inside the used range carry no order
        if record.iter().all(str::is_empty) {
            continue;
        }
        orders.push(order_from_record(&record, &headers, row_idx + 2)?);
    }
    Ok(orders)
}

fn check_columns(headers: &StringRecord) -> Result<(), PlanningError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PlanningError::MissingColumns(missing))
    }
}

fn order_from_record(
    record: &StringRecord,
    headers: &StringRecord,
    row_num: usize,
) -> Result<Order, PlanningError> {
    let row: OrderRow = record.deserialize(Some(headers))?;

    let weight_kg = parse_quantity(&row.poids, row_num, "poids")?;
    let volume_m3 = parse_quantity(&row.volume, row_num, "volume")?;

    let coordinates = match (row.latitude, row.longitude) {
        (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
        (None, None) => None,
        _ => {
            warn!(
                "Row {}: latitude and longitude must be given together, ignoring",
                row_num
            );
            None
        }
    };

    let order = Order::new(
        row.id_client,
        row.prenom,
        row.nom,
        weight_kg,
        volume_m3,
        row.ville,
        row.jour_de_travail,
        row.heures_de_travail,
    )
    .with_coordinates(coordinates);

    if order.has_malformed_window() {
        warn!(
            "Row {}: time window '{}' is not HH:MM-HH:MM, order {} will not be grouped",
            row_num, order.time_window, order.id
        );
    }

    Ok(order)
}

/// Positive number, accepting a decimal comma ("1,5")
fn parse_quantity(value: &str, row: usize, column: &str) -> Result<f64, PlanningError> {
    let invalid = |message: &str| PlanningError::InvalidRow {
        row,
        column: column.to_string(),
        message: message.to_string(),
    };

    let number: f64 = value
        .replace(',', ".")
        .parse()
        .map_err(|_| invalid(&format!("'{}' is not a number", value)))?;

    if !number.is_finite() || number <= 0.0 {
        return Err(invalid(&format!("{} must be a positive number", value)));
    }
    Ok(number)
}

/// Load a fleet from a `plaque;poids_max;volume_max` file
pub fn load_fleet(path: &Path, delimiter: u8) -> Result<FleetRegistry, PlanningError> {
    let file = std::fs::File::open(path)?;
    let fleet = parse_fleet(file, delimiter)?;
    info!("Loaded {} trucks from {}", fleet.len(), path.display());
    Ok(fleet)
}

pub fn parse_fleet<R: Read>(input: R, delimiter: u8) -> Result<FleetRegistry, PlanningError> {
    let mut reader = reader(input, delimiter);

    let mut trucks = Vec::new();
    for result in reader.deserialize() {
        let row: TruckRow = result?;
        trucks.push(Truck::new(row.plaque, row.poids_max, row.volume_max)?);
    }
    Ok(FleetRegistry::new(trucks))
}

/// Parse a `PLATE:WEIGHT:VOLUME` truck argument
pub fn parse_truck_spec(spec: &str) -> Result<Truck, PlanningError> {
    let invalid = |message: String| PlanningError::InvalidTruck {
        plate: spec.to_string(),
        message,
    };

    // The plate itself may contain ':'
    let mut parts = spec.rsplitn(3, ':');
    let (Some(volume), Some(weight), Some(plate)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid("expected PLATE:WEIGHT:VOLUME".to_string()));
    };

    let weight: u32 = weight
        .trim()
        .parse()
        .map_err(|_| invalid(format!("'{}' is not a weight in kg", weight)))?;
    let volume: f64 = volume
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| invalid(format!("'{}' is not a volume in m³", volume)))?;

    Truck::new(plate.trim(), weight, volume)
}
