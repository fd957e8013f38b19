//! Nominatim geocoding client

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::Coordinates;

/// Nominatim search API response item
#[derive(Debug, Deserialize)]
pub struct NominatimResult {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

/// Nominatim geocoding client
pub struct NominatimClient {
    base_url: String,
    country_codes: Option<String>,
    client: reqwest::Client,
}

impl NominatimClient {
    /// Create a new client
    pub fn new(base_url: &str, country_codes: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tournees-planner/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            country_codes,
            client,
        })
    }

    /// Search URL for a free-text place name
    fn search_url(&self, place: &str) -> String {
        let mut url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(place)
        );
        if let Some(codes) = &self.country_codes {
            url.push_str("&countrycodes=");
            url.push_str(&urlencoding::encode(codes));
        }
        url
    }

    /// Geocode a place name to coordinates and the matched display name
    pub async fn geocode(&self, place: &str) -> Result<Option<(Coordinates, String)>> {
        let response = self
            .client
            .get(self.search_url(place))
            .send()
            .await
            .context("Failed to send geocoding request")?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        match results.into_iter().next() {
            Some(result) => {
                let lat: f64 = result.lat.parse().context("Invalid latitude")?;
                let lng: f64 = result.lon.parse().context("Invalid longitude")?;
                Ok(Some((Coordinates { lat, lng }, result.display_name)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_place() {
        let client = NominatimClient::new("https://nominatim.example.org/", None).unwrap();
        assert_eq!(
            client.search_url("Saint-Étienne"),
            "https://nominatim.example.org/search?q=Saint-%C3%89tienne&format=json&limit=1"
        );
    }

    #[test]
    fn test_search_url_with_country_filter() {
        let client =
            NominatimClient::new("https://nominatim.example.org", Some("fr".to_string())).unwrap();
        assert!(client.search_url("Lyon").ends_with("&countrycodes=fr"));
    }

    #[test]
    fn test_result_deserializes() {
        let json = r#"[{
            "lat": "45.7578137",
            "lon": "4.8320114",
            "display_name": "Lyon, France",
            "importance": 0.8
        }]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(json).unwrap();
        assert_eq!(results[0].lat, "45.7578137");
        assert_eq!(results[0].display_name, "Lyon, France");
    }

    // Requires network access and hits the public Nominatim API
    #[tokio::test]
    #[ignore]
    async fn test_geocode_lyon() {
        let client = NominatimClient::new("https://nominatim.openstreetmap.org", None).unwrap();

        let (coords, _) = client.geocode("Lyon").await.unwrap().unwrap();

        assert!((coords.lat - 45.76).abs() < 0.1);
        assert!((coords.lng - 4.83).abs() < 0.1);
    }
}
