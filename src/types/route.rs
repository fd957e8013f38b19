//! Route types

use serde::Serialize;

use super::{Capacity, Order};
use crate::defaults::NO_TRUCK_LABEL;

/// A truck trip ("tournée") serving orders of one city and workday
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// 1-based position within its (city, workday) partition
    pub index: usize,
    pub city: String,
    pub workday: String,
    /// Plate of the assigned truck, `None` when the fleet is empty
    pub truck: Option<String>,
    /// Capacity the route was built against
    pub capacity: Capacity,
    /// Members in acceptance order; the first one is the anchor
    pub members: Vec<Order>,
    pub total_weight_kg: f64,
    pub total_volume_m3: f64,
    pub warnings: Vec<RouteWarning>,
}

impl Route {
    pub fn anchor(&self) -> Option<&Order> {
        self.members.first()
    }

    pub fn truck_label(&self) -> &str {
        self.truck.as_deref().unwrap_or(NO_TRUCK_LABEL)
    }

    pub fn is_overflow(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.warning_type == RouteWarningType::CapacityOverflow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteWarningType {
    /// The single member exceeds every available capacity
    CapacityOverflow,
    /// A member could not be geocoded
    MissingCoordinates,
    /// A member's time window could not be parsed
    MalformedTimeWindow,
}

impl RouteWarningType {
    pub const fn as_str(self) -> &'static str {
        match self {
            RouteWarningType::CapacityOverflow => "CAPACITY_OVERFLOW",
            RouteWarningType::MissingCoordinates => "MISSING_COORDINATES",
            RouteWarningType::MalformedTimeWindow => "MALFORMED_TIME_WINDOW",
        }
    }
}

/// Warning about a degraded route
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteWarning {
    /// Index into `Route::members`, `None` for route-wide warnings
    pub member_index: Option<usize>,
    pub warning_type: RouteWarningType,
    pub message: String,
}
