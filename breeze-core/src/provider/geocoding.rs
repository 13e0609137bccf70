use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    FetchError,
    model::{Coordinate, Place},
    provider::{GeocodingClient, Source, get_json},
};

/// Upper bound on candidates returned per query.
pub const MAX_RESULTS: usize = 5;

/// Shortest query worth sending to the server.
pub const MIN_QUERY_CHARS: usize = 2;

/// City search against the Open-Meteo geocoding API.
#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoding {
    http: Client,
    base_url: String,
}

impl OpenMeteoGeocoding {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into() }
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    results: Option<Vec<GeoCity>>,
}

#[derive(Debug, Deserialize)]
struct GeoCity {
    id: i64,
    name: String,
    country: Option<String>,
    admin1: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl From<GeoCity> for Place {
    fn from(city: GeoCity) -> Self {
        Place {
            id: city.id.to_string(),
            name: city.name,
            country: city.country,
            region: city.admin1,
            coordinate: Coordinate::new(city.latitude, city.longitude),
        }
    }
}

#[async_trait]
impl GeocodingClient for OpenMeteoGeocoding {
    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<Place>, FetchError> {
        if query.chars().count() < MIN_QUERY_CHARS {
            return Ok(Vec::new());
        }

        let parsed: GeoResponse = get_json(
            &self.http,
            Source::Geocoding,
            &self.base_url,
            &[
                ("name", query.to_string()),
                ("count", MAX_RESULTS.to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ],
        )
        .await?;

        // A query without matches comes back with no `results` key at all.
        let places: Vec<Place> = parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .take(MAX_RESULTS)
            .map(Place::from)
            .collect();

        debug!(count = places.len(), "geocoding finished");
        Ok(places)
    }
}
