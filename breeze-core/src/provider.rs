use crate::{
    Config, FetchError,
    location::{ConsentPrompt, FixedLocationProvider, IpLocationProvider, LocationProvider},
    model::{AirQualitySample, ClimateSample, Coordinate, Place, PollenEntry},
    provider::{
        air_quality::OpenMeteoAirQuality, climate::OpenMeteoClimate, geocoding::OpenMeteoGeocoding,
        pollen::PollenProxy, reverse::NominatimReverseGeocoder,
    },
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod air_quality;
pub mod climate;
pub mod geocoding;
pub mod pollen;
pub mod reverse;

/// Every remote source the dashboard talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Geocoding,
    AirQuality,
    Pollen,
    Climate,
    ReverseGeocoding,
    IpLocation,
}

impl Source {
    /// Key used in the `[endpoints]` config table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Geocoding => "geocoding",
            Source::AirQuality => "air-quality",
            Source::Pollen => "pollen",
            Source::Climate => "climate",
            Source::ReverseGeocoding => "reverse-geocoding",
            Source::IpLocation => "ip-location",
        }
    }

    /// Human-readable name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Source::Geocoding => "Geocoding",
            Source::AirQuality => "Air quality",
            Source::Pollen => "Pollen",
            Source::Climate => "Climate archive",
            Source::ReverseGeocoding => "Reverse geocoding",
            Source::IpLocation => "IP geolocation",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Source::Geocoding => "https://geocoding-api.open-meteo.com/v1/search",
            Source::AirQuality => "https://air-quality-api.open-meteo.com/v1/air-quality",
            Source::Pollen => "https://breeze.earth/api/pollen",
            Source::Climate => "https://archive-api.open-meteo.com/v1/archive",
            Source::ReverseGeocoding => "https://nominatim.openstreetmap.org/reverse",
            Source::IpLocation => "http://ip-api.com/json",
        }
    }

    pub const fn all() -> &'static [Source] {
        &[
            Source::Geocoding,
            Source::AirQuality,
            Source::Pollen,
            Source::Climate,
            Source::ReverseGeocoding,
            Source::IpLocation,
        ]
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Source {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        Source::all().iter().copied().find(|s| s.as_str() == lower).ok_or_else(|| {
            let known: Vec<_> = Source::all().iter().map(Source::as_str).collect();
            anyhow::anyhow!("Unknown source '{value}'. Supported sources: {}.", known.join(", "))
        })
    }
}

/// Resolves free text into candidate places.
///
/// Callers are expected to send queries of at least two characters; shorter
/// queries yield an empty list without touching the network.
#[async_trait]
pub trait GeocodingClient: Send + Sync + Debug {
    async fn search(&self, query: &str) -> Result<Vec<Place>, FetchError>;
}

#[async_trait]
pub trait AirQualityClient: Send + Sync + Debug {
    async fn fetch(&self, coordinate: Coordinate) -> Result<AirQualitySample, FetchError>;
}

#[async_trait]
pub trait PollenClient: Send + Sync + Debug {
    async fn fetch(&self, coordinate: Coordinate) -> Result<Vec<PollenEntry>, FetchError>;
}

/// Historical daily maxima, one sample per reference year, sorted by year.
#[async_trait]
pub trait ClimateClient: Send + Sync + Debug {
    async fn fetch(&self, coordinate: Coordinate) -> Result<Vec<ClimateSample>, FetchError>;
}

/// Best-effort coordinate to place-name lookup.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    async fn place_name(&self, coordinate: Coordinate) -> Result<Option<String>, FetchError>;
}

/// Everything the dashboard needs from the outside world.
#[derive(Debug, Clone)]
pub struct Services {
    pub geocoder: Arc<dyn GeocodingClient>,
    pub air_quality: Arc<dyn AirQualityClient>,
    pub pollen: Arc<dyn PollenClient>,
    pub climate: Arc<dyn ClimateClient>,
    pub reverse_geocoder: Arc<dyn ReverseGeocoder>,
    pub locator: Arc<dyn LocationProvider>,
}

/// Construct the real network-backed services from config.
///
/// `consent` is asked once when location permission is still undecided.
pub fn services_from_config(
    config: &Config,
    consent: Arc<dyn ConsentPrompt>,
) -> anyhow::Result<Services> {
    let http = Client::new();
    let permission = config.location.permission.initial_state();

    let locator: Arc<dyn LocationProvider> = match config.location.home {
        Some(home) => Arc::new(FixedLocationProvider::new(home, permission, Some(consent))),
        None => Arc::new(IpLocationProvider::new(
            http.clone(),
            config.endpoint(Source::IpLocation),
            permission,
            Some(consent),
        )),
    };

    Ok(Services {
        geocoder: Arc::new(OpenMeteoGeocoding::with_client(
            http.clone(),
            config.endpoint(Source::Geocoding),
        )),
        air_quality: Arc::new(OpenMeteoAirQuality::with_client(
            http.clone(),
            config.endpoint(Source::AirQuality),
        )),
        pollen: Arc::new(PollenProxy::with_client(http.clone(), config.endpoint(Source::Pollen))),
        climate: Arc::new(
            OpenMeteoClimate::with_client(http.clone(), config.endpoint(Source::Climate))
                .with_reference_years(config.reference_years()?),
        ),
        reverse_geocoder: Arc::new(NominatimReverseGeocoder::with_client(
            http,
            config.endpoint(Source::ReverseGeocoding),
        )),
        locator,
    })
}

/// GET `url` with `query` and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    source: Source,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, FetchError> {
    let res = http
        .get(url)
        .query(query)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await
        .map_err(|e| FetchError::transport(source.label(), e.to_string()))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| FetchError::transport(source.label(), format!("failed to read body: {e}")))?;

    if !status.is_success() {
        return Err(FetchError::Status {
            source_name: source.label(),
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| FetchError::decode(source.label(), e.to_string()))
}

const USER_AGENT: &str = concat!("breeze/", env!("CARGO_PKG_VERSION"));

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::DenyAll;

    #[test]
    fn source_as_str_roundtrip() {
        for source in Source::all() {
            let s = source.as_str();
            let parsed = Source::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*source, parsed);
        }
    }

    #[test]
    fn unknown_source_error() {
        let err = Source::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown source"));
        assert!(err.to_string().contains("air-quality"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "µ".repeat(300);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn services_from_default_config() {
        let cfg = Config::default();
        let services = services_from_config(&cfg, Arc::new(DenyAll));
        assert!(services.is_ok());
    }

    #[test]
    fn services_from_config_rejects_bad_reference_years() {
        let mut cfg = Config::default();
        cfg.reference_years = Some(vec![]);
        let err = services_from_config(&cfg, Arc::new(DenyAll)).unwrap_err();
        assert!(err.to_string().contains("reference year"));
    }
}
