//! Core library for the Breeze environmental dashboard.
//!
//! This crate defines:
//! - Clients for geocoding, air quality, pollen and climate history
//! - Device location with permission handling
//! - The [`Dashboard`] orchestrator and the [`ViewState`] it publishes
//! - Configuration
//!
//! It is used by `breeze-cli`, but any front end can drive a [`Dashboard`]
//! and render its state.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod state;

pub use config::{Config, EndpointConfig, LocationConfig};
pub use dashboard::{Dashboard, DashboardOptions, RefreshOutcome};
pub use error::{DashboardError, FetchError, LocationError};
pub use location::{ConsentPrompt, LocationProvider, PermissionState};
pub use model::{
    AirQualitySample, ClimateSample, Coordinate, Place, PollenEntry, PollutantKind,
    PollutantReading, TemperatureUnit,
};
pub use provider::{
    AirQualityClient, ClimateClient, GeocodingClient, PollenClient, ReverseGeocoder, Services,
    Source, services_from_config,
};
pub use state::{LoadStatus, LocationToken, SearchPhase, ViewState};
