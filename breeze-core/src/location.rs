//! Device location: permission state plus one-shot position fixes.
//!
//! There is no change callback. [`LocationProvider::request_permission`] is the
//! only notification path: it resolves once the user has decided, so a caller
//! that awaits it makes exactly one follow-up fix attempt. A decision made
//! outside the app is picked up by the next `use_current_location` call.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    LocationError,
    model::Coordinate,
    provider::{Source, get_json},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    NotDetermined,
    Authorized,
    Denied,
    Restricted,
}

impl PermissionState {
    pub fn is_authorized(&self) -> bool {
        matches!(self, PermissionState::Authorized)
    }

    pub fn is_refused(&self) -> bool {
        matches!(self, PermissionState::Denied | PermissionState::Restricted)
    }
}

/// Asks the user whether location may be used.
#[async_trait]
pub trait ConsentPrompt: Send + Sync + Debug {
    async fn ask(&self) -> bool;
}

/// Prompt that always refuses; used when nobody can be asked.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

#[async_trait]
impl ConsentPrompt for DenyAll {
    async fn ask(&self) -> bool {
        false
    }
}

#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    fn permission(&self) -> PermissionState;

    /// Resolves with the decided state. Only prompts while undetermined.
    async fn request_permission(&self) -> PermissionState;

    async fn request_one_shot_fix(&self) -> Result<Coordinate, LocationError>;
}

/// Permission bookkeeping shared by the concrete providers.
#[derive(Debug)]
pub struct PermissionGate {
    state: parking_lot::Mutex<PermissionState>,
    prompt: Option<Arc<dyn ConsentPrompt>>,
    // Serializes prompts so concurrent requests share one answer.
    asking: Mutex<()>,
}

impl PermissionGate {
    pub fn new(initial: PermissionState, prompt: Option<Arc<dyn ConsentPrompt>>) -> Self {
        Self { state: parking_lot::Mutex::new(initial), prompt, asking: Mutex::new(()) }
    }

    pub fn state(&self) -> PermissionState {
        *self.state.lock()
    }

    pub async fn request(&self) -> PermissionState {
        let _guard = self.asking.lock().await;

        let current = self.state();
        if current != PermissionState::NotDetermined {
            return current;
        }

        let next = match &self.prompt {
            Some(prompt) if prompt.ask().await => PermissionState::Authorized,
            Some(_) => PermissionState::Denied,
            None => PermissionState::Restricted,
        };

        info!(?next, "location permission decided");
        *self.state.lock() = next;
        next
    }

    fn check(&self) -> Result<(), LocationError> {
        match self.state() {
            PermissionState::Authorized => Ok(()),
            _ => Err(LocationError::PermissionDenied),
        }
    }
}

/// Approximate position from the public IP address.
#[derive(Debug)]
pub struct IpLocationProvider {
    http: Client,
    endpoint: String,
    gate: PermissionGate,
}

impl IpLocationProvider {
    pub fn new(
        http: Client,
        endpoint: impl Into<String>,
        initial: PermissionState,
        prompt: Option<Arc<dyn ConsentPrompt>>,
    ) -> Self {
        Self { http, endpoint: endpoint.into(), gate: PermissionGate::new(initial, prompt) }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    fn permission(&self) -> PermissionState {
        self.gate.state()
    }

    async fn request_permission(&self) -> PermissionState {
        self.gate.request().await
    }

    async fn request_one_shot_fix(&self) -> Result<Coordinate, LocationError> {
        self.gate.check()?;

        let body: IpApiResponse = get_json(&self.http, Source::IpLocation, &self.endpoint, &[])
            .await
            .map_err(|e| {
                warn!(error = %e, "IP geolocation request failed");
                LocationError::Unavailable(e.to_string())
            })?;

        if body.status != "success" {
            let reason = body.message.unwrap_or_else(|| body.status.clone());
            return Err(LocationError::Unavailable(reason));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                let fix = Coordinate::new(lat, lon);
                debug!(latitude = lat, longitude = lon, "IP geolocation fix");
                Ok(fix)
            }
            _ => Err(LocationError::Unavailable("response carried no coordinates".to_string())),
        }
    }
}

/// A configured home position, still subject to permission.
#[derive(Debug)]
pub struct FixedLocationProvider {
    coordinate: Coordinate,
    gate: PermissionGate,
}

impl FixedLocationProvider {
    pub fn new(
        coordinate: Coordinate,
        initial: PermissionState,
        prompt: Option<Arc<dyn ConsentPrompt>>,
    ) -> Self {
        Self { coordinate, gate: PermissionGate::new(initial, prompt) }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    fn permission(&self) -> PermissionState {
        self.gate.state()
    }

    async fn request_permission(&self) -> PermissionState {
        self.gate.request().await
    }

    async fn request_one_shot_fix(&self) -> Result<Coordinate, LocationError> {
        self.gate.check()?;
        Ok(self.coordinate)
    }
}

/// How the configuration pre-answers the permission question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionSetting {
    #[default]
    Ask,
    Allow,
    Deny,
}

impl PermissionSetting {
    pub fn initial_state(&self) -> PermissionState {
        match self {
            PermissionSetting::Ask => PermissionState::NotDetermined,
            PermissionSetting::Allow => PermissionState::Authorized,
            PermissionSetting::Deny => PermissionState::Denied,
        }
    }
}
