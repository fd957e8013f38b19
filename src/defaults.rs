//! Default capacities, planning parameters and accepted input ranges

use std::ops::RangeInclusive;

/// Capacity used when the fleet is empty, and the default for a configured truck
pub const DEFAULT_MAX_WEIGHT_KG: u32 = 3500;
pub const DEFAULT_MAX_VOLUME_M3: f64 = 15.0;

pub const MAX_WEIGHT_RANGE_KG: RangeInclusive<u32> = 1000..=50000;
pub const MAX_VOLUME_RANGE_M3: RangeInclusive<f64> = 1.0..=100.0;

pub const DEFAULT_GROUPING_RADIUS_KM: f64 = 10.0;
pub const GROUPING_RADIUS_RANGE_KM: RangeInclusive<f64> = 1.0..=50.0;

/// Number of trucks generated when no fleet is configured
pub const DEFAULT_FLEET_SIZE: usize = 3;
pub const MAX_FLEET_SIZE: usize = 50;

/// Label shown in place of a plate when a route has no truck
pub const NO_TRUCK_LABEL: &str = "none";

/// Plate of the `index`-th (0-based) generated truck: 78359-A-7, 783510-A-7, ...
pub fn default_plate(index: usize) -> String {
    format!("7835{}-A-7", index + 9)
}
