//! Delivery order types

use serde::{Deserialize, Serialize};

use super::TimeWindow;

/// Geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A customer delivery order for one city and workday
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub weight_kg: f64,
    pub volume_m3: f64,
    pub city: String,
    pub workday: String,
    /// Raw window as supplied, e.g. "08:00-12:00"
    pub time_window: String,
    /// `None` when `time_window` is malformed
    #[serde(skip)]
    pub window: Option<TimeWindow>,
    pub coordinates: Option<Coordinates>,
}

impl Order {
    /// Build an order, parsing its time window once.
    ///
    /// A malformed window is kept as raw text and never overlaps anything.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        weight_kg: f64,
        volume_m3: f64,
        city: impl Into<String>,
        workday: impl Into<String>,
        time_window: impl Into<String>,
    ) -> Self {
        let time_window = time_window.into();
        let window = time_window.parse().ok();

        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            weight_kg,
            volume_m3,
            city: city.into(),
            workday: workday.into(),
            time_window,
            window,
            coordinates: None,
        }
    }

    pub fn with_coordinates(mut self, coordinates: Option<Coordinates>) -> Self {
        self.coordinates = coordinates;
        self
    }

    pub fn has_malformed_window(&self) -> bool {
        self.window.is_none()
    }

    /// Key of the (city, workday) partition this order is planned in
    pub fn partition_key(&self) -> (String, String) {
        (self.city.clone(), self.workday.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_parses_window() {
        let order = Order::new("1", "Jean", "Dupont", 100.0, 1.5, "Lyon", "lundi", "08:00-12:00");
        assert!(order.window.is_some());
        assert!(!order.has_malformed_window());
        assert!(order.coordinates.is_none());
    }

    #[test]
    fn test_malformed_window_kept_as_text() {
        let order = Order::new("1", "Jean", "Dupont", 100.0, 1.5, "Lyon", "lundi", "le matin");
        assert!(order.has_malformed_window());
        assert_eq!(order.time_window, "le matin");
    }

    #[test]
    fn test_serialize_skips_parsed_window() {
        let order = Order::new("7", "Anne", "Martin", 10.0, 0.5, "Nantes", "mardi", "09:00-10:00")
            .with_coordinates(Some(Coordinates { lat: 47.2, lng: -1.55 }));
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["id"], "7");
        assert_eq!(json["weightKg"], 10.0);
        assert_eq!(json["timeWindow"], "09:00-10:00");
        assert_eq!(json["coordinates"]["lat"], 47.2);
        assert!(json.get("window").is_none());
    }

    #[test]
    fn test_partition_key() {
        let order = Order::new("1", "Jean", "Dupont", 1.0, 1.0, "Lyon", "lundi", "08:00-12:00");
        assert_eq!(order.partition_key(), ("Lyon".to_string(), "lundi".to_string()));
    }
}
