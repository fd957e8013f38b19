//! Configuration management

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{self, Context, Result};

use crate::defaults::{DEFAULT_GROUPING_RADIUS_KM, GROUPING_RADIUS_RANGE_KM};
use crate::error::PlanningError;

/// Default minimum interval between Nominatim requests (the public API allows 1 req/s)
pub const DEFAULT_RATE_LIMIT_MS: u64 = 1500;
pub const DEFAULT_CIRCUIT_BREAKER_THRESHOLD: u32 = 3;
pub const DEFAULT_CIRCUIT_BREAKER_RECOVERY_SECS: u64 = 300;
pub const DEFAULT_GEOCODER_CONCURRENCY: usize = 4;
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub geocoder: GeocoderConfig,

    /// Maximum distance between a route's anchor and its other members
    pub grouping_radius_km: f64,
}

/// Which geocoding implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocoderBackend {
    Mock,
    Table,
    Nominatim,
}

impl FromStr for GeocoderBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "table" => Ok(Self::Table),
            "nominatim" => Ok(Self::Nominatim),
            other => anyhow::bail!("unknown geocoder backend '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub backend: GeocoderBackend,

    /// CSV file of known places, required by the table backend
    pub table_path: Option<PathBuf>,

    /// Distinct places geocoded at the same time
    pub concurrency: usize,

    pub nominatim_url: String,

    /// Optional `countrycodes` filter, e.g. "fr"
    pub country_codes: Option<String>,

    pub rate_limit_ms: u64,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_recovery_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("GEOCODER_BACKEND") {
            Some(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, using mock", e);
                GeocoderBackend::Mock
            }),
            None => GeocoderBackend::Mock,
        };

        let table_path = lookup("GEOCODER_TABLE").map(PathBuf::from);
        if backend == GeocoderBackend::Table && table_path.is_none() {
            anyhow::bail!("GEOCODER_TABLE must be set when GEOCODER_BACKEND=table");
        }

        let concurrency = parse_or(&lookup, "GEOCODER_CONCURRENCY", DEFAULT_GEOCODER_CONCURRENCY)?;
        if concurrency == 0 {
            anyhow::bail!("GEOCODER_CONCURRENCY must be at least 1");
        }

        let nominatim_url = lookup("NOMINATIM_URL")
            .unwrap_or_else(|| DEFAULT_NOMINATIM_URL.to_string());

        let country_codes = lookup("NOMINATIM_COUNTRY_CODES").filter(|s| !s.trim().is_empty());

        let rate_limit_ms = parse_or(&lookup, "NOMINATIM_RATE_LIMIT_MS", DEFAULT_RATE_LIMIT_MS)?;
        let circuit_breaker_threshold =
            parse_or(&lookup, "NOMINATIM_CB_THRESHOLD", DEFAULT_CIRCUIT_BREAKER_THRESHOLD)?;
        let circuit_breaker_recovery_secs = parse_or(
            &lookup,
            "NOMINATIM_CB_RECOVERY_SECS",
            DEFAULT_CIRCUIT_BREAKER_RECOVERY_SECS,
        )?;

        let grouping_radius_km = validate_radius(parse_or(
            &lookup,
            "GROUPING_RADIUS_KM",
            DEFAULT_GROUPING_RADIUS_KM,
        )?)?;

        Ok(Self {
            geocoder: GeocoderConfig {
                backend,
                table_path,
                concurrency,
                nominatim_url,
                country_codes,
                rate_limit_ms,
                circuit_breaker_threshold,
                circuit_breaker_recovery_secs,
            },
            grouping_radius_km,
        })
    }
}

/// Check a grouping radius against the accepted range
pub fn validate_radius(radius_km: f64) -> Result<f64, PlanningError> {
    if GROUPING_RADIUS_RANGE_KM.contains(&radius_km) {
        Ok(radius_km)
    } else {
        Err(PlanningError::InvalidRadius(radius_km))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.geocoder.backend, GeocoderBackend::Mock);
        assert_eq!(config.geocoder.nominatim_url, DEFAULT_NOMINATIM_URL);
        assert_eq!(config.geocoder.rate_limit_ms, DEFAULT_RATE_LIMIT_MS);
        assert_eq!(config.geocoder.concurrency, DEFAULT_GEOCODER_CONCURRENCY);
        assert!(config.geocoder.country_codes.is_none());
        assert_eq!(config.grouping_radius_km, DEFAULT_GROUPING_RADIUS_KM);
    }

    #[test]
    fn test_config_nominatim_backend() {
        let config = config_from(&[
            ("GEOCODER_BACKEND", "Nominatim"),
            ("NOMINATIM_URL", "http://localhost:8080"),
            ("NOMINATIM_COUNTRY_CODES", "fr"),
            ("NOMINATIM_RATE_LIMIT_MS", "200"),
        ])
        .unwrap();

        assert_eq!(config.geocoder.backend, GeocoderBackend::Nominatim);
        assert_eq!(config.geocoder.nominatim_url, "http://localhost:8080");
        assert_eq!(config.geocoder.country_codes.as_deref(), Some("fr"));
        assert_eq!(config.geocoder.rate_limit_ms, 200);
    }

    #[test]
    fn test_config_unknown_backend_falls_back_to_mock() {
        let config = config_from(&[("GEOCODER_BACKEND", "google")]).unwrap();
        assert_eq!(config.geocoder.backend, GeocoderBackend::Mock);
    }

    #[test]
    fn test_config_table_backend_requires_path() {
        assert!(config_from(&[("GEOCODER_BACKEND", "table")]).is_err());

        let config = config_from(&[
            ("GEOCODER_BACKEND", "table"),
            ("GEOCODER_TABLE", "villes.csv"),
        ])
        .unwrap();
        assert_eq!(config.geocoder.table_path, Some(PathBuf::from("villes.csv")));
    }

    #[test]
    fn test_config_rejects_invalid_numbers() {
        assert!(config_from(&[("NOMINATIM_RATE_LIMIT_MS", "fast")]).is_err());
        assert!(config_from(&[("GEOCODER_CONCURRENCY", "0")]).is_err());
    }

    #[test]
    fn test_config_radius_range() {
        assert_eq!(
            config_from(&[("GROUPING_RADIUS_KM", "25")]).unwrap().grouping_radius_km,
            25.0
        );
        assert!(config_from(&[("GROUPING_RADIUS_KM", "0.5")]).is_err());
        assert!(config_from(&[("GROUPING_RADIUS_KM", "51")]).is_err());
    }

    #[test]
    fn test_validate_radius_bounds() {
        assert!(validate_radius(1.0).is_ok());
        assert!(validate_radius(50.0).is_ok());
        assert!(matches!(validate_radius(f64::NAN), Err(PlanningError::InvalidRadius(_))));
    }
}
