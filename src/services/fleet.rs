//! Fleet registry with round-robin truck selection

use tracing::warn;

use crate::defaults::default_plate;
use crate::error::PlanningError;
use crate::types::{Capacity, Truck};

/// Ordered set of trucks, unique by plate
#[derive(Debug, Clone, Default)]
pub struct FleetRegistry {
    trucks: Vec<Truck>,
}

impl FleetRegistry {
    /// Build a registry from configured trucks.
    ///
    /// A repeated plate keeps the position of its first occurrence and the
    /// capacities of its last one.
    pub fn new(trucks: impl IntoIterator<Item = Truck>) -> Self {
        let mut registry: Vec<Truck> = Vec::new();

        for truck in trucks {
            match registry.iter_mut().find(|t| t.plate == truck.plate) {
                Some(existing) => {
                    warn!(
                        "Duplicate plate '{}' in fleet configuration, keeping last capacities",
                        truck.plate
                    );
                    *existing = truck;
                }
                None => registry.push(truck),
            }
        }

        Self { trucks: registry }
    }

    /// Generated fleet of `size` trucks with default plates and capacities
    pub fn with_default_trucks(size: usize) -> Result<Self, PlanningError> {
        let trucks = (0..size)
            .map(|i| Truck::with_default_capacity(default_plate(i)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(trucks))
    }

    /// Truck for the `counter`-th opened route, `None` if the fleet is empty
    pub fn truck_at(&self, counter: usize) -> Option<&Truck> {
        if self.is_empty() {
            return None;
        }
        self.trucks.get(counter % self.trucks.len())
    }

    /// Capacity of `truck_at(counter)`, or the default capacity
    pub fn capacity_at(&self, counter: usize) -> Capacity {
        self.truck_at(counter)
            .map(Truck::capacity)
            .unwrap_or(Capacity::DEFAULT)
    }

    pub fn first(&self) -> Option<&Truck> {
        self.trucks.first()
    }

    pub fn len(&self) -> usize {
        self.trucks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trucks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Truck> {
        self.trucks.iter()
    }
}
