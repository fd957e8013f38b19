//! Geocoding abstraction layer
//!
//! Place names (city names of the order file) are resolved through a
//! `Geocoder`:
//! - `MockGeocoder` for tests and development (deterministic, no network)
//! - `TableGeocoder` for offline runs against a CSV of known places
//! - `RateLimitedNominatimGeocoder` for production (rate limiting and
//!   circuit breaker in front of the public API)
//!
//! The backend is selected by `GEOCODER_BACKEND` (see `config`).

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::{GeocoderBackend, GeocoderConfig};
use crate::services::nominatim::NominatimClient;
use crate::types::Coordinates;

/// Geocoder trait - abstraction for all geocoding implementations
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocode a place name to coordinates.
    /// Returns None if the place cannot be found.
    async fn geocode(&self, place: &str) -> Result<Option<GeocodingResult>>;

    /// Get the name of this geocoder implementation
    fn name(&self) -> &'static str;
}

/// Result of geocoding operation
#[derive(Debug, Clone)]
pub struct GeocodingResult {
    pub coordinates: Coordinates,
    /// Display name returned by geocoder
    pub display_name: String,
}

// ==========================================================================
// MockGeocoder
// ==========================================================================

/// Mock geocoder for testing - returns deterministic fake coordinates
#[derive(Default)]
pub struct MockGeocoder;

impl MockGeocoder {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic coordinates inside metropolitan France, derived from the name
    fn hash_to_coordinates(place: &str) -> Coordinates {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        place.trim().to_lowercase().hash(&mut hasher);
        let hash = hasher.finish();

        // Inner bounds, away from coasts and borders
        const LAT_MIN: f64 = 43.5;
        const LAT_MAX: f64 = 49.5;
        const LNG_MIN: f64 = -0.5;
        const LNG_MAX: f64 = 6.5;

        let lat_normalized = ((hash >> 32) as f64) / (u32::MAX as f64);
        let lng_normalized = ((hash & 0xFFFF_FFFF) as f64) / (u32::MAX as f64);

        Coordinates {
            lat: LAT_MIN + lat_normalized * (LAT_MAX - LAT_MIN),
            lng: LNG_MIN + lng_normalized * (LNG_MAX - LNG_MIN),
        }
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<GeocodingResult>> {
        if place.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(GeocodingResult {
            coordinates: Self::hash_to_coordinates(place),
            display_name: format!("{}, France", place.trim()),
        }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ==========================================================================
// TableGeocoder
// ==========================================================================

#[derive(Debug, Deserialize)]
struct PlaceRow {
    #[serde(alias = "ville", alias = "city", alias = "place")]
    name: String,
    #[serde(alias = "latitude", alias = "lat")]
    lat: f64,
    #[serde(alias = "longitude", alias = "lon", alias = "lng")]
    lng: f64,
}

/// Geocoder backed by a fixed table of place names (case-insensitive)
pub struct TableGeocoder {
    places: HashMap<String, Coordinates>,
}

impl TableGeocoder {
    pub fn new(places: impl IntoIterator<Item = (String, Coordinates)>) -> Self {
        Self {
            places: places
                .into_iter()
                .map(|(name, coords)| (normalize(&name), coords))
                .collect(),
        }
    }

    /// Load a `ville;latitude;longitude` file
    pub fn from_csv(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read geocoder table {}", path.display()))?;
        Self::from_csv_str(&content)
    }

    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut places = Vec::new();
        for result in reader.deserialize() {
            let row: PlaceRow = result.context("Invalid geocoder table row")?;
            places.push((row.name, Coordinates { lat: row.lat, lng: row.lng }));
        }
        Ok(Self::new(places))
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }
}

fn normalize(place: &str) -> String {
    place.trim().to_lowercase()
}

#[async_trait]
impl Geocoder for TableGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<GeocodingResult>> {
        Ok(self.places.get(&normalize(place)).map(|coordinates| GeocodingResult {
            coordinates: *coordinates,
            display_name: place.trim().to_string(),
        }))
    }

    fn name(&self) -> &'static str {
        "table"
    }
}

// ==========================================================================
// RateLimiter
// ==========================================================================

/// Rate limiter that enforces minimum interval between calls
pub struct RateLimiter {
    last_call: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_call: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait until it's safe to make another call
    pub async fn wait(&self) {
        // Held across the sleep so concurrent callers queue up
        let mut last = self.last_call.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }
}

// ==========================================================================
// CircuitBreaker
// ==========================================================================

/// Circuit breaker to prevent hammering a failing service
pub struct CircuitBreaker {
    failure_count: AtomicU32,
    threshold: u32,
    last_failure: parking_lot::Mutex<Option<Instant>>,
    recovery_time: Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, recovery_time: Duration) -> Self {
        Self {
            failure_count: AtomicU32::new(0),
            threshold,
            last_failure: parking_lot::Mutex::new(None),
            recovery_time,
        }
    }

    /// Check if circuit is open (blocking calls)
    pub fn is_open(&self) -> bool {
        if self.failure_count.load(Ordering::Relaxed) < self.threshold {
            return false;
        }
        // Half-open once the recovery time has passed
        match *self.last_failure.lock() {
            Some(last_time) => last_time.elapsed() < self.recovery_time,
            None => true,
        }
    }

    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        *self.last_failure.lock() = Some(Instant::now());
    }

    /// Record a success (resets failure count)
    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
    }
}

// ==========================================================================
// RateLimitedNominatimGeocoder
// ==========================================================================

/// Nominatim geocoder behind a rate limiter and a circuit breaker
pub struct RateLimitedNominatimGeocoder {
    client: NominatimClient,
    rate_limiter: RateLimiter,
    pub(crate) circuit_breaker: CircuitBreaker,
}

impl RateLimitedNominatimGeocoder {
    pub fn with_config(config: &GeocoderConfig) -> Result<Self> {
        Ok(Self {
            client: NominatimClient::new(&config.nominatim_url, config.country_codes.clone())?,
            rate_limiter: RateLimiter::new(Duration::from_millis(config.rate_limit_ms)),
            circuit_breaker: CircuitBreaker::new(
                config.circuit_breaker_threshold,
                Duration::from_secs(config.circuit_breaker_recovery_secs),
            ),
        })
    }
}

#[async_trait]
impl Geocoder for RateLimitedNominatimGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<GeocodingResult>> {
        if self.circuit_breaker.is_open() {
            tracing::warn!("Circuit breaker is open, rejecting geocoding request for '{}'", place);
            anyhow::bail!("Geocoding service temporarily unavailable (circuit breaker open)");
        }

        self.rate_limiter.wait().await;

        match self.client.geocode(place).await {
            Ok(found) => {
                // No result found is not a failure
                self.circuit_breaker.record_success();
                Ok(found.map(|(coordinates, display_name)| GeocodingResult {
                    coordinates,
                    display_name,
                }))
            }
            Err(e) => {
                self.circuit_breaker.record_failure();
                tracing::error!("Geocoding '{}' failed: {:#}", place, e);
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}

// ==========================================================================
// Factory function
// ==========================================================================

/// Create the geocoder selected by configuration
pub fn create_geocoder(config: &GeocoderConfig) -> Result<Box<dyn Geocoder>> {
    match config.backend {
        GeocoderBackend::Mock => {
            tracing::info!("Using MockGeocoder");
            Ok(Box::new(MockGeocoder::new()))
        }
        GeocoderBackend::Table => {
            let path = config
                .table_path
                .as_deref()
                .context("GEOCODER_TABLE must be set for the table geocoder")?;
            let geocoder = TableGeocoder::from_csv(path)?;
            tracing::info!("Using TableGeocoder with {} places", geocoder.len());
            Ok(Box::new(geocoder))
        }
        GeocoderBackend::Nominatim => {
            tracing::info!("Using RateLimitedNominatimGeocoder at {}", config.nominatim_url);
            Ok(Box::new(RateLimitedNominatimGeocoder::with_config(config)?))
        }
    }
}
