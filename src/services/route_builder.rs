//! Greedy route construction for one (city, workday) partition
//!
//! Orders are sorted by volume (largest first) and routes are opened one at a
//! time, each on the next truck of the fleet in round-robin order. The first
//! order that fits the truck becomes the route's anchor; every later member
//! must fit the remaining capacity, lie within the grouping radius of the
//! anchor and share part of the anchor's time window.

use tracing::{debug, warn};

use crate::services::fleet::FleetRegistry;
use crate::services::geo;
use crate::types::{Capacity, Order, Route, RouteWarning, RouteWarningType, Truck};

/// Builds routes for partitions planned against the same fleet and radius
pub struct RouteBuilder<'a> {
    fleet: &'a FleetRegistry,
    grouping_radius_km: f64,
}

impl<'a> RouteBuilder<'a> {
    pub fn new(fleet: &'a FleetRegistry, grouping_radius_km: f64) -> Self {
        Self {
            fleet,
            grouping_radius_km,
        }
    }

    /// Partition `orders` (all of the same city and workday) into routes
    pub fn build(&self, mut orders: Vec<Order>, city: &str, workday: &str) -> Vec<Route> {
        // Stable: equal volumes keep their input order
        orders.sort_by(|a, b| b.volume_m3.total_cmp(&a.volume_m3));

        let mut remaining = orders;
        let mut routes: Vec<Route> = Vec::new();
        let mut counter = 0usize;
        let mut empty_scans = 0usize;
        let rotation = self.fleet.len().max(1);

        while !remaining.is_empty() {
            let truck = self.fleet.truck_at(counter);
            let capacity = self.fleet.capacity_at(counter);
            counter += 1;

            let members = self.fill(&mut remaining, capacity);

            if !members.is_empty() {
                empty_scans = 0;
                routes.push(new_route(routes.len() + 1, city, workday, truck, capacity, members));
                continue;
            }

            // Nothing left fits this truck; try the next one
            empty_scans += 1;
            if empty_scans < rotation {
                continue;
            }

            // No truck admits any remaining order: ship the bulkiest alone
            empty_scans = 0;
            let order = remaining.remove(0);
            let truck = self.fleet.first();
            let capacity = truck.map(Truck::capacity).unwrap_or(Capacity::DEFAULT);

            warn!(
                "Order {} ({} kg, {} m³) exceeds every truck capacity in {} / {}",
                order.id, order.weight_kg, order.volume_m3, city, workday
            );

            let message = format!(
                "Order {} ({} kg, {} m³) exceeds capacity {} kg / {} m³",
                order.id,
                order.weight_kg,
                order.volume_m3,
                capacity.max_weight_kg,
                capacity.max_volume_m3
            );
            let index = routes.len() + 1;
            let mut route = new_route(index, city, workday, truck, capacity, vec![order]);
            route.warnings.insert(
                0,
                RouteWarning {
                    member_index: None,
                    warning_type: RouteWarningType::CapacityOverflow,
                    message,
                },
            );
            routes.push(route);
        }

        debug!("{} / {}: {} route(s)", city, workday, routes.len());
        routes
    }

    /// Single left-to-right scan of the pool, moving accepted orders out
    fn fill(&self, remaining: &mut Vec<Order>, capacity: Capacity) -> Vec<Order> {
        let mut members: Vec<Order> = Vec::new();
        let mut weight = 0.0;
        let mut volume = 0.0;
        let mut cursor = 0;

        while cursor < remaining.len() {
            let candidate = &remaining[cursor];
            let fits = capacity.admits(weight + candidate.weight_kg, volume + candidate.volume_m3);
            let accepted = fits
                && members.first().map_or(true, |anchor| {
                    is_groupable(anchor, candidate, self.grouping_radius_km)
                });

            if accepted {
                let order = remaining.remove(cursor);
                weight += order.weight_kg;
                volume += order.volume_m3;
                members.push(order);
            } else {
                cursor += 1;
            }
        }

        members
    }
}

/// Build the routes of one partition
pub fn build_routes(
    orders: Vec<Order>,
    city: &str,
    workday: &str,
    fleet: &FleetRegistry,
    grouping_radius_km: f64,
) -> Vec<Route> {
    RouteBuilder::new(fleet, grouping_radius_km).build(orders, city, workday)
}

/// Whether `candidate` may join a route anchored by `anchor`.
///
/// Unknown coordinates or a malformed window on either side never group.
pub fn is_groupable(anchor: &Order, candidate: &Order, grouping_radius_km: f64) -> bool {
    let close = geo::distance_between(anchor.coordinates.as_ref(), candidate.coordinates.as_ref())
        .is_some_and(|d| d <= grouping_radius_km);

    let compatible = match (&anchor.window, &candidate.window) {
        (Some(a), Some(b)) => a.overlaps(b),
        _ => false,
    };

    close && compatible
}

fn new_route(
    index: usize,
    city: &str,
    workday: &str,
    truck: Option<&Truck>,
    capacity: Capacity,
    members: Vec<Order>,
) -> Route {
    let total_weight_kg = members.iter().map(|o| o.weight_kg).sum();
    let total_volume_m3 = members.iter().map(|o| o.volume_m3).sum();

    let mut warnings = Vec::new();
    for (i, order) in members.iter().enumerate() {
        if order.coordinates.is_none() {
            warnings.push(RouteWarning {
                member_index: Some(i),
                warning_type: RouteWarningType::MissingCoordinates,
                message: format!("No coordinates for order {} ({})", order.id, order.city),
            });
        }
        if order.has_malformed_window() {
            warnings.push(RouteWarning {
                member_index: Some(i),
                warning_type: RouteWarningType::MalformedTimeWindow,
                message: format!(
                    "Time window '{}' of order {} is not HH:MM-HH:MM",
                    order.time_window, order.id
                ),
            });
        }
    }

    Route {
        index,
        city: city.to_string(),
        workday: workday.to_string(),
        truck: truck.map(|t| t.plate.clone()),
        capacity,
        members,
        total_weight_kg,
        total_volume_m3,
        warnings,
    }
}
