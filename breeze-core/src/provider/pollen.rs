use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    FetchError,
    model::{Coordinate, PollenEntry},
    provider::{PollenClient, Source, get_json},
};

const MAX_INDEX: u8 = 5;

/// Pollen forecast through the Breeze backend, which proxies the Google Pollen API.
#[derive(Debug, Clone)]
pub struct PollenProxy {
    http: Client,
    base_url: String,
}

impl PollenProxy {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PollenResponse {
    daily_info: Option<Vec<DailyInfo>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyInfo {
    pollen_type_info: Option<Vec<TypeInfo>>,
    plant_info: Option<Vec<PlantInfo>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeInfo {
    code: String,
    display_name: String,
    index_info: Option<IndexInfo>,
    health_recommendations: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlantInfo {
    code: String,
    display_name: String,
    index_info: Option<IndexInfo>,
    plant_description: Option<PlantDescription>,
    health_recommendations: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct IndexInfo {
    value: Option<i64>,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlantDescription {
    family: Option<String>,
    season: Option<String>,
    special_colors: Option<String>,
    picture: Option<String>,
}

fn index_of(info: Option<&IndexInfo>) -> (u8, String) {
    let value = info
        .and_then(|i| i.value)
        .map(|v| v.clamp(0, i64::from(MAX_INDEX)) as u8)
        .unwrap_or(0);
    let category = info
        .and_then(|i| i.category.clone())
        .unwrap_or_else(|| "Low".to_string());
    (value, category)
}

impl From<TypeInfo> for PollenEntry {
    fn from(t: TypeInfo) -> Self {
        let (value, category) = index_of(t.index_info.as_ref());
        PollenEntry {
            id: t.code,
            name: t.display_name,
            value,
            category,
            is_plant: false,
            image_url: None,
            family: None,
            season: None,
            appearance: None,
            health_recommendations: t.health_recommendations,
        }
    }
}

impl From<PlantInfo> for PollenEntry {
    fn from(p: PlantInfo) -> Self {
        let (value, category) = index_of(p.index_info.as_ref());
        // Grass order; shown under its botanical name.
        let name = if p.code == "GRAMINALES" { "Graminales".to_string() } else { p.display_name };
        let description = p.plant_description;
        PollenEntry {
            id: p.code,
            name,
            value,
            category,
            is_plant: true,
            image_url: description.as_ref().and_then(|d| d.picture.clone()),
            family: description.as_ref().and_then(|d| d.family.clone()),
            season: description.as_ref().and_then(|d| d.season.clone()),
            appearance: description.and_then(|d| d.special_colors),
            health_recommendations: p.health_recommendations,
        }
    }
}

#[async_trait]
impl PollenClient for PollenProxy {
    /// Today's pollen types followed by individual plants, in server order.
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, coordinate: Coordinate) -> Result<Vec<PollenEntry>, FetchError> {
        let parsed: PollenResponse = get_json(
            &self.http,
            Source::Pollen,
            &self.base_url,
            &[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
            ],
        )
        .await?;

        let today = parsed
            .daily_info
            .and_then(|days| days.into_iter().next())
            .ok_or_else(|| FetchError::empty(Source::Pollen.label()))?;

        let entries: Vec<PollenEntry> = today
            .pollen_type_info
            .unwrap_or_default()
            .into_iter()
            .map(PollenEntry::from)
            .chain(today.plant_info.unwrap_or_default().into_iter().map(PollenEntry::from))
            .collect();

        debug!(count = entries.len(), "pollen fetched");
        Ok(entries)
    }
}
