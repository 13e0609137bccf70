use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate};
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    FetchError,
    model::{ClimateSample, Coordinate},
    provider::{ClimateClient, Source, get_json},
};

pub const DEFAULT_REFERENCE_YEARS: [i32; 5] = [1980, 1990, 2000, 2010, 2020];

/// Daily maximum temperature for today's calendar day across several decades,
/// from the Open-Meteo historical archive.
#[derive(Debug, Clone)]
pub struct OpenMeteoClimate {
    http: Client,
    base_url: String,
    reference_years: Vec<i32>,
}

impl OpenMeteoClimate {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into(), reference_years: DEFAULT_REFERENCE_YEARS.to_vec() }
    }

    pub fn with_reference_years(mut self, years: Vec<i32>) -> Self {
        self.reference_years = years;
        self
    }

    /// Reference years plus the year of `day`, ascending and without duplicates.
    pub fn years_for(&self, day: NaiveDate) -> Vec<i32> {
        let mut years = self.reference_years.clone();
        years.push(day.year());
        years.sort_unstable();
        years.dedup();
        years
    }

    /// One request per year for the calendar day of `day`.
    ///
    /// Years whose request fails, whose payload is empty, or which have no such
    /// day (Feb 29) are left out. The result is sorted ascending by year.
    pub async fn fetch_for_day(&self, coordinate: Coordinate, day: NaiveDate) -> Vec<ClimateSample> {
        let requests = self.years_for(day).into_iter().filter_map(|year| {
            match NaiveDate::from_ymd_opt(year, day.month(), day.day()) {
                Some(date) => Some(self.fetch_year(coordinate, year, date)),
                None => {
                    debug!(year, "calendar day does not exist in this year, skipping");
                    None
                }
            }
        });

        let mut samples: Vec<ClimateSample> = join_all(requests)
            .await
            .into_iter()
            .filter_map(|outcome| match outcome {
                Ok(sample) => Some(sample),
                Err((year, e)) => {
                    warn!(year, error = %e, "climate sample unavailable");
                    None
                }
            })
            .collect();

        samples.sort_by_key(|s| s.year);
        samples
    }

    async fn fetch_year(
        &self,
        coordinate: Coordinate,
        year: i32,
        date: NaiveDate,
    ) -> Result<ClimateSample, (i32, FetchError)> {
        let date = date.format("%Y-%m-%d").to_string();

        let parsed: ArchiveResponse = get_json(
            &self.http,
            Source::Climate,
            &self.base_url,
            &[
                ("latitude", coordinate.latitude.to_string()),
                ("longitude", coordinate.longitude.to_string()),
                ("start_date", date.clone()),
                ("end_date", date),
                ("daily", "temperature_2m_max".to_string()),
                ("timezone", "auto".to_string()),
            ],
        )
        .await
        .map_err(|e| (year, e))?;

        parsed
            .daily
            .and_then(|d| d.temperature_2m_max)
            .and_then(|temps| temps.into_iter().next().flatten())
            .map(|temperature_c| ClimateSample { year, temperature_c })
            .ok_or_else(|| (year, FetchError::empty(Source::Climate.label())))
    }
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: Option<ArchiveDaily>,
}

#[derive(Debug, Deserialize)]
struct ArchiveDaily {
    temperature_2m_max: Option<Vec<Option<f64>>>,
}

#[async_trait]
impl ClimateClient for OpenMeteoClimate {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, coordinate: Coordinate) -> Result<Vec<ClimateSample>, FetchError> {
        let today = Local::now().date_naive();
        let samples = self.fetch_for_day(coordinate, today).await;
        debug!(count = samples.len(), "climate history fetched");
        Ok(samples)
    }
}
