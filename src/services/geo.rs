//! Geographic calculations

use crate::types::Coordinates;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle (Haversine) distance between two points in kilometers
pub fn distance_km(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Distance between two optional points; `None` if either is unknown
pub fn distance_between(from: Option<&Coordinates>, to: Option<&Coordinates>) -> Option<f64> {
    Some(distance_km(from?, to?))
}

/// Mean position of a set of points, `None` for an empty set
pub fn centroid<'a, I>(points: I) -> Option<Coordinates>
where
    I: IntoIterator<Item = &'a Coordinates>,
{
    let (count, lat, lng) = points
        .into_iter()
        .fold((0usize, 0.0, 0.0), |(n, lat, lng), p| (n + 1, lat + p.lat, lng + p.lng));

    (count > 0).then(|| Coordinates {
        lat: lat / count as f64,
        lng: lng / count as f64,
    })
}
