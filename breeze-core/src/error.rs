//! Error types shared by the clients and the dashboard.

use thiserror::Error;

/// Failure of a single remote fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or its body could not be read.
    #[error("{source_name} request failed: {message}")]
    Transport { source_name: &'static str, message: String },

    /// The server answered with a non-success status.
    #[error("{source_name} request failed with status {status}: {body}")]
    Status { source_name: &'static str, status: u16, body: String },

    /// The payload was not the JSON we expected.
    #[error("Failed to parse {source_name} JSON: {message}")]
    Decode { source_name: &'static str, message: String },

    /// The payload was valid but carried no data.
    #[error("{source_name} response contained no data")]
    Empty { source_name: &'static str },
}

impl FetchError {
    pub fn transport<S: Into<String>>(source_name: &'static str, message: S) -> Self {
        Self::Transport { source_name, message: message.into() }
    }

    pub fn decode<S: Into<String>>(source_name: &'static str, message: S) -> Self {
        Self::Decode { source_name, message: message.into() }
    }

    pub fn empty(source_name: &'static str) -> Self {
        Self::Empty { source_name }
    }

    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }
}

/// Failure to obtain a device position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// The user-visible error kept in the dashboard state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("Air quality unavailable: {0}")]
    AirQualityUnavailable(String),

    #[error("Location access denied")]
    LocationDenied,

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),
}

impl DashboardError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::AirQualityUnavailable(_) => {
                "Unable to fetch air quality data.".to_string()
            }
            DashboardError::LocationDenied => {
                "Location access denied. Please enable it in your settings.\n\
                 Hint: run `breeze configure` and allow location access."
                    .to_string()
            }
            DashboardError::LocationUnavailable(_) => "Unable to get your location.".to_string(),
        }
    }
}

impl From<LocationError> for DashboardError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::PermissionDenied => DashboardError::LocationDenied,
            LocationError::Unavailable(reason) => DashboardError::LocationUnavailable(reason),
        }
    }
}
