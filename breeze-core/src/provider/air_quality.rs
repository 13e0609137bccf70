use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    FetchError,
    model::{AirQualitySample, Coordinate},
    provider::{AirQualityClient, Source, get_json},
};

const CURRENT_FIELDS: &str =
    "us_aqi,pm10,pm2_5,carbon_monoxide,nitrogen_dioxide,sulphur_dioxide,ozone";

/// Current air quality from the Open-Meteo air-quality API.
#[derive(Debug, Clone)]
pub struct OpenMeteoAirQuality {
    http: Client,
    base_url: String,
}

impl OpenMeteoAirQuality {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into() }
    }

    /// US AQI for many locations in one request, index-aligned with `coordinates`.
    ///
    /// Never fails: any problem yields `None` for the affected entries.
    pub async fn fetch_aqi_many(&self, coordinates: &[Coordinate]) -> Vec<Option<i32>> {
        if coordinates.is_empty() {
            return Vec::new();
        }

        let lats: Vec<String> = coordinates.iter().map(|c| c.latitude.to_string()).collect();
        let lons: Vec<String> = coordinates.iter().map(|c| c.longitude.to_string()).collect();

        let result: Result<AqiOnlyPayload, FetchError> = get_json(
            &self.http,
            Source::AirQuality,
            &self.base_url,
            &[
                ("latitude", lats.join(",")),
                ("longitude", lons.join(",")),
                ("current", "us_aqi".to_string()),
            ],
        )
        .await;

        match result {
            Ok(AqiOnlyPayload::Many(entries)) => {
                let mut values: Vec<Option<i32>> =
                    entries.into_iter().map(|e| e.current.and_then(|c| c.us_aqi)).collect();
                values.resize(coordinates.len(), None);
                values
            }
            Ok(AqiOnlyPayload::One(entry)) => {
                let mut values = vec![None; coordinates.len()];
                values[0] = entry.current.and_then(|c| c.us_aqi);
                values
            }
            Err(e) => {
                warn!(error = %e, count = coordinates.len(), "multi-location AQI fetch failed");
                vec![None; coordinates.len()]
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct AqResponse {
    current: Option<AqCurrent>,
}

#[derive(Debug, Deserialize)]
struct AqCurrent {
    us_aqi: i32,
    pm2_5: f64,
    pm10: f64,
    carbon_monoxide: f64,
    nitrogen_dioxide: f64,
    sulphur_dioxide: f64,
    ozone: f64,
}

impl From<AqCurrent> for AirQualitySample {
    fn from(c: AqCurrent) -> Self {
        AirQualitySample {
            us_aqi: c.us_aqi,
            pm25: c.pm2_5,
            pm10: c.pm10,
            co: c.carbon_monoxide,
            no2: c.nitrogen_dioxide,
            so2: c.sulphur_dioxide,
            o3: c.ozone,
        }
    }
}

/// A single location comes back as an object, several as an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AqiOnlyPayload {
    Many(Vec<AqiOnlyEntry>),
    One(AqiOnlyEntry),
}

#[derive(Debug, Deserialize)]
struct AqiOnlyEntry {
    current: Option<AqiOnlyCurrent>,
}

#[derive(Debug, Deserialize)]
struct AqiOnlyCurrent {
    us_aqi: Option<i32>,
}

#[async_trait]
impl AirQualityClient for OpenMeteoAirQuality {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, coordinate: Coordinate) -> Result<AirQualitySample, FetchError> {
        let parsed: AqResponse = get_json(
            &self.http,
            Source::AirQuality,
            &self.base_url,
            &[
                ("latitude", coordinate.latitude.to_string()),
                ("longitude", coordinate.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ],
        )
        .await?;

        let sample: AirQualitySample = parsed
            .current
            .map(AirQualitySample::from)
            .ok_or_else(|| FetchError::empty(Source::AirQuality.label()))?;

        debug!(us_aqi = sample.us_aqi, "air quality fetched");
        Ok(sample)
    }
}
