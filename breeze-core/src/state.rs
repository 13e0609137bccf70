use crate::{
    DashboardError,
    model::{AirQualitySample, AqiCategory, ClimateSample, Coordinate, Place, PollenEntry, PollutantReading},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
    ResultsShown,
}

/// Identifies one location request. Results carrying an older token are dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationToken {
    pub generation: u64,
    pub coordinate: Coordinate,
}

/// Everything the presentation layer shows. Only the dashboard writes it.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub place: Option<Place>,
    pub location_name: String,
    pub location: Option<LocationToken>,

    pub air_quality: Option<AirQualitySample>,
    pub pollen: Vec<PollenEntry>,
    pub climate: Vec<ClimateSample>,

    pub status: LoadStatus,
    pub error: Option<DashboardError>,

    pub search_query: String,
    pub search_phase: SearchPhase,
    pub search_results: Vec<Place>,

    pub(crate) search_generation: u64,
    pub(crate) location_generation: u64,
}

impl ViewState {
    /// Derived from the current air quality sample; empty without one.
    pub fn pollutants(&self) -> Vec<PollutantReading> {
        self.air_quality.as_ref().map(AirQualitySample::pollutants).unwrap_or_default()
    }

    pub fn aqi_category(&self) -> Option<AqiCategory> {
        self.air_quality.as_ref().map(AirQualitySample::category)
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.location.map(|t| t.coordinate)
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub(crate) fn is_current(&self, token: LocationToken) -> bool {
        self.location.is_some_and(|t| t.generation == token.generation)
    }

    pub(crate) fn clear_search(&mut self) {
        self.search_generation += 1;
        self.search_query.clear();
        self.search_results.clear();
        self.search_phase = SearchPhase::Idle;
    }
}
