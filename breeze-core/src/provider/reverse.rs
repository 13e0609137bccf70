//! Reverse geocoding: coordinates to a human-readable place name.
//! Uses Nominatim (OpenStreetMap), which needs no API key.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    FetchError,
    model::Coordinate,
    provider::{ReverseGeocoder, Source, get_json},
};

#[derive(Debug, Clone)]
pub struct NominatimReverseGeocoder {
    http: Client,
    base_url: String,
}

impl NominatimReverseGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into() }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// "Locality, Country", or whichever of the two is known.
    fn place_name(self) -> Option<String> {
        let locality = self.city.or(self.town).or(self.village).or(self.municipality);
        let parts: Vec<String> =
            [locality, self.country].into_iter().flatten().filter(|s| !s.is_empty()).collect();

        if parts.is_empty() { None } else { Some(parts.join(", ")) }
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimReverseGeocoder {
    #[tracing::instrument(skip(self))]
    async fn place_name(&self, coordinate: Coordinate) -> Result<Option<String>, FetchError> {
        let body: NominatimResponse = get_json(
            &self.http,
            Source::ReverseGeocoding,
            &self.base_url,
            &[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("zoom", "10".to_string()),
            ],
        )
        .await?;

        let name = body.address.and_then(NominatimAddress::place_name);
        debug!(name = ?name, "reverse geocoded");
        Ok(name)
    }
}
