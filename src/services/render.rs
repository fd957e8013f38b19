//! Route output: text tables, JSON and a GeoJSON point map

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::services::geo;
use crate::types::Route;

const TABLE_COLUMNS: [&str; 6] = [
    "id_client",
    "nom",
    "prenom",
    "volume",
    "poids",
    "heures_de_travail",
];

/// Quantity without trailing zeros, at most two decimals
fn quantity(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Render every route as a header, a totals line and a member table
pub fn render_tables(routes: &[Route]) -> String {
    let mut out = String::new();

    for route in routes {
        let _ = writeln!(
            out,
            "Route #{} - City: {} | Day: {} | Truck: {} | Window: {}",
            route.index,
            route.city,
            route.workday,
            route.truck_label(),
            route.anchor().map(|o| o.time_window.as_str()).unwrap_or("-")
        );
        let _ = writeln!(
            out,
            "{} kg | {} m³ (capacity {} kg / {} m³)",
            quantity(route.total_weight_kg),
            quantity(route.total_volume_m3),
            quantity(route.capacity.max_weight_kg),
            quantity(route.capacity.max_volume_m3)
        );

        let rows: Vec<[String; 6]> = route
            .members
            .iter()
            .map(|o| {
                [
                    o.id.clone(),
                    o.last_name.clone(),
                    o.first_name.clone(),
                    quantity(o.volume_m3),
                    quantity(o.weight_kg),
                    o.time_window.clone(),
                ]
            })
            .collect();

        let mut widths = TABLE_COLUMNS.map(|c| c.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write_row(&mut out, &TABLE_COLUMNS.map(str::to_string), &widths);
        for row in &rows {
            write_row(&mut out, row, &widths);
        }

        for warning in &route.warnings {
            let _ = writeln!(
                out,
                "  ! {}: {}",
                warning.warning_type.as_str(),
                warning.message
            );
        }
        out.push('\n');
    }

    out
}

fn write_row(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    let _ = writeln!(out, "  {}", line.join("  ").trim_end());
}

/// Routes as pretty-printed JSON
pub fn render_json(routes: &[Route]) -> Result<String> {
    serde_json::to_string_pretty(routes).context("Failed to serialize routes")
}

/// GeoJSON FeatureCollection of every order with known coordinates.
///
/// The mean position of the points is added as a `center` member.
pub fn map_geojson(routes: &[Route]) -> Value {
    let features: Vec<Value> = routes
        .iter()
        .flat_map(|route| {
            route.members.iter().filter_map(move |order| {
                let coords = order.coordinates?;
                Some(json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": [coords.lng, coords.lat],
                    },
                    "properties": {
                        "idClient": order.id,
                        "city": order.city,
                        "workday": order.workday,
                        "route": route.index,
                        "truck": route.truck_label(),
                    },
                }))
            })
        })
        .collect();

    let center = geo::centroid(
        routes
            .iter()
            .flat_map(|r| r.members.iter())
            .filter_map(|o| o.coordinates.as_ref()),
    );

    json!({
        "type": "FeatureCollection",
        "center": center.map(|c| json!([c.lng, c.lat])),
        "features": features,
    })
}

/// Write the point map to `path`
pub fn write_map(path: &Path, routes: &[Route]) -> Result<()> {
    let content = serde_json::to_string_pretty(&map_geojson(routes))?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write map to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fleet::FleetRegistry;
    use crate::services::route_builder::build_routes;
    use crate::types::{Coordinates, Order, Truck};

    fn sample_routes() -> Vec<Route> {
        let fleet = FleetRegistry::new(vec![
            Truck::new("A", 1000, 5.0).unwrap(),
            Truck::new("B", 2000, 10.0).unwrap(),
        ]);
        let lyon = Some(Coordinates { lat: 45.0, lng: 4.0 });
        let orders = vec![
            Order::new("1", "Jean", "Dupont", 900.0, 4.0, "Lyon", "lundi", "08:00-12:00")
                .with_coordinates(lyon),
            Order::new("2", "Anne", "Martin", 900.0, 4.0, "Lyon", "lundi", "09:00-12:00")
                .with_coordinates(Some(Coordinates { lat: 45.02, lng: 4.02 })),
            Order::new("3", "Luc", "Petit", 900.0, 4.0, "Lyon", "lundi", "10:00-11:00"),
        ];
        build_routes(orders, "Lyon", "lundi", &fleet, 10.0)
    }

    #[test]
    fn test_quantity_formatting() {
        assert_eq!(quantity(1800.0), "1800");
        assert_eq!(quantity(0.1 + 0.2), "0.3");
        assert_eq!(quantity(12.5), "12.5");
    }

    #[test]
    fn test_render_tables() {
        let text = render_tables(&sample_routes());

        assert!(text.contains(
            "Route #1 - City: Lyon | Day: lundi | Truck: A | Window: 08:00-12:00"
        ));
        assert!(text.contains("Route #2 - City: Lyon | Day: lundi | Truck: B"));
        assert!(text.contains("900 kg | 4 m³ (capacity 2000 kg / 10 m³)"));
        assert!(text.contains("id_client  nom"));
        assert!(text.contains("Dupont"));
        assert!(text.contains("! MISSING_COORDINATES"));
    }

    #[test]
    fn test_render_json() {
        let json: Value = serde_json::from_str(&render_json(&sample_routes()).unwrap()).unwrap();

        assert_eq!(json.as_array().unwrap().len(), 3);
        assert_eq!(json[0]["truck"], "A");
        assert_eq!(json[0]["members"][0]["id"], "1");
    }

    #[test]
    fn test_map_contains_only_located_orders() {
        let map = map_geojson(&sample_routes());

        let features = map["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["geometry"]["coordinates"], json!([4.0, 45.0]));
        assert_eq!(features[0]["properties"]["route"], 1);

        let center = map["center"].as_array().unwrap();
        assert!((center[1].as_f64().unwrap() - 45.01).abs() < 1e-9);
    }

    #[test]
    fn test_empty_map_has_no_center() {
        let map = map_geojson(&[]);
        assert!(map["center"].is_null());
        assert!(map["features"].as_array().unwrap().is_empty());
    }
}
