//! Batch planning: geocode, partition by (city, workday), build routes

use std::collections::{BTreeMap, BTreeSet, HashMap};

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::services::fleet::FleetRegistry;
use crate::services::geocoding::Geocoder;
use crate::services::route_builder::build_routes;
use crate::types::{Coordinates, Order, Route};

/// Result of planning one batch of orders
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// Routes of every partition, partitions in (city, workday) order
    pub routes: Vec<Route>,
    /// Places the geocoder could not resolve
    pub unresolved_places: Vec<String>,
}

pub struct Planner {
    geocoder: Box<dyn Geocoder>,
    fleet: FleetRegistry,
    grouping_radius_km: f64,
    concurrency: usize,
}

impl Planner {
    pub fn new(
        geocoder: Box<dyn Geocoder>,
        fleet: FleetRegistry,
        grouping_radius_km: f64,
        concurrency: usize,
    ) -> Self {
        Self {
            geocoder,
            fleet,
            grouping_radius_km,
            concurrency: concurrency.max(1),
        }
    }

    /// Plan a batch. Geocoding misses degrade grouping but never fail the batch.
    pub async fn plan(&self, orders: Vec<Order>) -> PlanOutcome {
        let places = self.resolve_places(&orders).await;

        let mut unresolved_places: Vec<String> = places
            .iter()
            .filter(|(_, coords)| coords.is_none())
            .map(|(place, _)| place.clone())
            .collect();
        unresolved_places.sort();

        let mut partitions: BTreeMap<(String, String), Vec<Order>> = BTreeMap::new();
        for order in orders {
            let order = match order.coordinates {
                Some(_) => order,
                None => {
                    let coordinates = places.get(&order.city).copied().flatten();
                    order.with_coordinates(coordinates)
                }
            };
            partitions.entry(order.partition_key()).or_default().push(order);
        }

        let mut routes = Vec::new();
        for ((city, workday), orders) in partitions {
            routes.extend(build_routes(
                orders,
                &city,
                &workday,
                &self.fleet,
                self.grouping_radius_km,
            ));
        }

        info!(
            "Planned {} routes ({} overflow), {} unresolved place(s)",
            routes.len(),
            routes.iter().filter(|r| r.is_overflow()).count(),
            unresolved_places.len()
        );

        PlanOutcome {
            routes,
            unresolved_places,
        }
    }

    /// Geocode each distinct city of orders without coordinates, once
    async fn resolve_places(&self, orders: &[Order]) -> HashMap<String, Option<Coordinates>> {
        let places: BTreeSet<&str> = orders
            .iter()
            .filter(|o| o.coordinates.is_none())
            .map(|o| o.city.as_str())
            .collect();

        if places.is_empty() {
            return HashMap::new();
        }
        info!(
            "Geocoding {} distinct place(s) with {}",
            places.len(),
            self.geocoder.name()
        );

        let geocoder = &self.geocoder;
        stream::iter(places)
            .map(|place| async move {
                let coordinates = match geocoder.geocode(place).await {
                    Ok(Some(result)) => {
                        debug!("'{}' resolved to {}", place, result.display_name);
                        Some(result.coordinates)
                    }
                    Ok(None) => {
                        warn!("No geocoding match for '{}'", place);
                        None
                    }
                    Err(e) => {
                        warn!("Geocoding '{}' failed: {:#}", place, e);
                        None
                    }
                };
                (place.to_string(), coordinates)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::geocoding::{GeocodingResult, MockGeocoder, TableGeocoder};
    use crate::types::Truck;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn order(id: &str, city: &str, day: &str, weight: f64, volume: f64) -> Order {
        Order::new(id, "Jean", "Dupont", weight, volume, city, day, "08:00-12:00")
    }

    fn table() -> Box<dyn Geocoder> {
        Box::new(TableGeocoder::new(vec![
            ("Lyon".to_string(), Coordinates { lat: 45.764, lng: 4.8357 }),
            ("Lille".to_string(), Coordinates { lat: 50.6292, lng: 3.0573 }),
        ]))
    }

    /// Counts lookups per place and fails on one of them
    struct CountingGeocoder {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Geocoder for CountingGeocoder {
        async fn geocode(&self, place: &str) -> Result<Option<GeocodingResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if place == "Atlantis" {
                anyhow::bail!("service unavailable");
            }
            MockGeocoder::new().geocode(place).await
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[test]
    fn test_partitions_planned_in_city_day_order() {
        let fleet = FleetRegistry::with_default_trucks(2).unwrap();
        let planner = Planner::new(table(), fleet, 10.0, 2);
        let orders = vec![
            order("1", "Lyon", "mardi", 10.0, 1.0),
            order("2", "Lille", "lundi", 10.0, 1.0),
            order("3", "Lyon", "lundi", 10.0, 1.0),
            order("4", "Lyon", "mardi", 10.0, 2.0),
        ];

        let outcome = tokio_test::block_on(planner.plan(orders));

        let keys: Vec<(&str, &str, usize)> = outcome
            .routes
            .iter()
            .map(|r| (r.city.as_str(), r.workday.as_str(), r.index))
            .collect();
        assert_eq!(
            keys,
            vec![("Lille", "lundi", 1), ("Lyon", "lundi", 1), ("Lyon", "mardi", 1)]
        );
        let ids: Vec<&str> = outcome.routes[2].members.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "1"]);
        assert!(outcome.unresolved_places.is_empty());
    }

    #[test]
    fn test_unresolved_place_keeps_orders_ungrouped() {
        let fleet = FleetRegistry::with_default_trucks(1).unwrap();
        let planner = Planner::new(table(), fleet, 10.0, 1);
        let orders = vec![
            order("1", "Grenoble", "lundi", 10.0, 1.0),
            order("2", "Grenoble", "lundi", 10.0, 1.0),
        ];

        let outcome = tokio_test::block_on(planner.plan(orders));

        assert_eq!(outcome.unresolved_places, vec!["Grenoble"]);
        assert_eq!(outcome.routes.len(), 2);
        assert!(outcome.routes.iter().all(|r| r.members.len() == 1));
    }

    #[test]
    fn test_supplied_coordinates_are_kept() {
        let fleet = FleetRegistry::with_default_trucks(1).unwrap();
        let planner = Planner::new(table(), fleet, 10.0, 1);
        let own = Coordinates { lat: 45.70, lng: 4.80 };
        let orders = vec![
            order("1", "Lyon", "lundi", 10.0, 1.0).with_coordinates(Some(own)),
            order("2", "Lyon", "lundi", 10.0, 1.0),
        ];

        let outcome = tokio_test::block_on(planner.plan(orders));

        let members = &outcome.routes[0].members;
        assert_eq!(members[0].coordinates, Some(own));
        assert_eq!(members[1].coordinates, Some(Coordinates { lat: 45.764, lng: 4.8357 }));
    }

    #[tokio::test]
    async fn test_each_place_geocoded_once_and_failures_absorbed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let geocoder = Box::new(CountingGeocoder { calls: Arc::clone(&calls) });
        let fleet = FleetRegistry::new(vec![Truck::new("A", 3500, 15.0).unwrap()]);
        let planner = Planner::new(geocoder, fleet, 10.0, 3);
        let orders = vec![
            order("1", "Lyon", "lundi", 10.0, 1.0),
            order("2", "Lyon", "mardi", 10.0, 1.0),
            order("3", "Atlantis", "lundi", 10.0, 1.0),
            order("4", "Lyon", "lundi", 10.0, 1.0),
            order("5", "Nantes", "lundi", 10.0, 1.0),
        ];

        let outcome = planner.plan(orders).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.unresolved_places, vec!["Atlantis"]);
        let planned: usize = outcome.routes.iter().map(|r| r.members.len()).sum();
        assert_eq!(planned, 5);
    }

    #[test]
    fn test_empty_batch() {
        let planner = Planner::new(table(), FleetRegistry::default(), 10.0, 1);
        let outcome = tokio_test::block_on(planner.plan(vec![]));
        assert!(outcome.routes.is_empty());
        assert!(outcome.unresolved_places.is_empty());
    }
}
