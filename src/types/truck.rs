//! Truck and capacity types

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_MAX_VOLUME_M3, DEFAULT_MAX_WEIGHT_KG, MAX_VOLUME_RANGE_M3, MAX_WEIGHT_RANGE_KG,
};
use crate::error::PlanningError;

/// Weight and volume limits a route is built against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub max_weight_kg: f64,
    pub max_volume_m3: f64,
}

impl Capacity {
    /// Fallback capacity when no truck is configured
    pub const DEFAULT: Capacity = Capacity {
        max_weight_kg: DEFAULT_MAX_WEIGHT_KG as f64,
        max_volume_m3: DEFAULT_MAX_VOLUME_M3,
    };

    /// Whether a load of `weight_kg` / `volume_m3` fits
    pub fn admits(&self, weight_kg: f64, volume_m3: f64) -> bool {
        weight_kg <= self.max_weight_kg && volume_m3 <= self.max_volume_m3
    }
}

/// A delivery truck, identified by its license plate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Truck {
    pub plate: String,
    pub max_weight_kg: u32,
    pub max_volume_m3: f64,
}

impl Truck {
    /// Create a truck, enforcing the accepted capacity ranges
    pub fn new(
        plate: impl Into<String>,
        max_weight_kg: u32,
        max_volume_m3: f64,
    ) -> Result<Self, PlanningError> {
        let plate = plate.into();

        if plate.trim().is_empty() {
            return Err(PlanningError::InvalidTruck {
                plate,
                message: "plate must not be empty".into(),
            });
        }
        if !MAX_WEIGHT_RANGE_KG.contains(&max_weight_kg) {
            return Err(PlanningError::InvalidTruck {
                plate,
                message: format!(
                    "max weight {} kg outside {}..={} kg",
                    max_weight_kg,
                    MAX_WEIGHT_RANGE_KG.start(),
                    MAX_WEIGHT_RANGE_KG.end()
                ),
            });
        }
        if !MAX_VOLUME_RANGE_M3.contains(&max_volume_m3) {
            return Err(PlanningError::InvalidTruck {
                plate,
                message: format!(
                    "max volume {} m³ outside {}..={} m³",
                    max_volume_m3,
                    MAX_VOLUME_RANGE_M3.start(),
                    MAX_VOLUME_RANGE_M3.end()
                ),
            });
        }

        Ok(Self {
            plate,
            max_weight_kg,
            max_volume_m3,
        })
    }

    /// Truck with the default capacity
    pub fn with_default_capacity(plate: impl Into<String>) -> Result<Self, PlanningError> {
        Self::new(plate, DEFAULT_MAX_WEIGHT_KG, DEFAULT_MAX_VOLUME_M3)
    }

    pub fn capacity(&self) -> Capacity {
        Capacity {
            max_weight_kg: self.max_weight_kg as f64,
            max_volume_m3: self.max_volume_m3,
        }
    }
}
