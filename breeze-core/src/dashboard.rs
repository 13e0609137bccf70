//! The dashboard orchestrator.
//!
//! [`Dashboard`] owns the [`ViewState`] and is its only writer. Every mutation
//! goes through the `watch` sender, which serializes writers and notifies
//! subscribers. Network work runs in spawned tasks and re-enters the state
//! only through a generation check:
//!
//! - search results are applied only if no newer query was typed,
//! - location data is applied only if no newer location was requested.
//!
//! Air quality gates the load status. Pollen and climate history are counted
//! background tasks that may land before or after it.

use parking_lot::Mutex;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    Config, DashboardError, FetchError,
    location::PermissionState,
    model::{AirQualitySample, ClimateSample, Coordinate, Place, PollenEntry},
    provider::{Services, geocoding::MIN_QUERY_CHARS},
    state::{LoadStatus, LocationToken, SearchPhase, ViewState},
};

const CURRENT_LOCATION_LABEL: &str = "Your Location";

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    /// Quiet period before a typed query is sent.
    pub debounce: Duration,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self { debounce: Duration::from_millis(crate::config::DEFAULT_DEBOUNCE_MS) }
    }
}

impl DashboardOptions {
    pub fn from_config(config: &Config) -> Self {
        Self { debounce: config.debounce() }
    }
}

/// How a location request ended, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Loaded,
    Failed,
    /// A newer location request took over before air quality arrived.
    Superseded,
}

/// How the place label changes when a new location becomes active.
enum Label {
    Place(Place),
    Name(String),
    Coordinate,
}

/// Cloneable handle to the dashboard. Clones share state.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<Inner>,
}

struct Inner {
    services: Services,
    options: DashboardOptions,
    state: watch::Sender<ViewState>,
    search_task: Mutex<Option<JoinHandle<()>>>,
    /// Pollen, climate and reverse-lookup tasks still running.
    background: watch::Sender<usize>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Dashboard")
            .field("status", &state.status)
            .field("search_phase", &state.search_phase)
            .field("location", &state.location)
            .field("background", &*self.inner.background.borrow())
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    pub fn new(services: Services, options: DashboardOptions) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        let (background, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                services,
                options,
                state,
                search_task: Mutex::new(None),
                background,
            }),
        }
    }

    pub fn snapshot(&self) -> ViewState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.inner.state.subscribe()
    }

    /// Search-as-you-type entry point. Must be called inside a Tokio runtime.
    ///
    /// Queries shorter than two characters clear the results immediately.
    /// Longer ones replace any pending search and fire after the debounce.
    pub fn set_search_query(&self, text: &str) {
        let mut slot = self.inner.search_task.lock();
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let query = text.to_string();
        if query.chars().count() < MIN_QUERY_CHARS {
            self.inner.state.send_modify(|s| {
                s.clear_search();
                s.search_query = query;
            });
            return;
        }

        let mut generation = 0;
        self.inner.state.send_modify(|s| {
            s.search_generation += 1;
            generation = s.search_generation;
            s.search_query = query.clone();
            s.search_phase = SearchPhase::Searching;
        });

        let this = self.clone();
        *slot = Some(tokio::spawn(async move { this.run_search(generation, query).await }));
    }

    async fn run_search(&self, generation: u64, query: String) {
        tokio::time::sleep(self.inner.options.debounce).await;

        if self.inner.state.borrow().search_generation != generation {
            debug!(%query, "search superseded during debounce");
            return;
        }

        // A failed search looks the same as one without matches.
        let places = match self.inner.services.geocoder.search(&query).await {
            Ok(places) => places,
            Err(e) => {
                warn!(%query, error = %e, "place search failed");
                Vec::new()
            }
        };

        let count = places.len();
        let applied = self.inner.state.send_if_modified(|s| {
            if s.search_generation != generation {
                return false;
            }
            s.search_results = places;
            s.search_phase = SearchPhase::ResultsShown;
            true
        });

        if applied {
            debug!(%query, count, "search results applied");
        } else {
            debug!(%query, "search superseded during request, result dropped");
        }
    }

    fn cancel_search(&self) {
        if let Some(previous) = self.inner.search_task.lock().take() {
            previous.abort();
        }
    }

    /// Make `place` the active location and load its data.
    pub async fn select_place(&self, place: Place) -> RefreshOutcome {
        self.cancel_search();
        info!(place = %place.display_name(), "place selected");

        let coordinate = place.coordinate;
        match self.start_location(coordinate, Label::Place(place), None) {
            Some(token) => self.load(token).await,
            None => RefreshOutcome::Superseded,
        }
    }

    /// Load data for a bare coordinate.
    pub async fn refresh_location(&self, coordinate: Coordinate) -> RefreshOutcome {
        match self.start_location(coordinate, Label::Coordinate, None) {
            Some(token) => self.load(token).await,
            None => RefreshOutcome::Superseded,
        }
    }

    /// Resolve the device position and load its data.
    ///
    /// Asks for permission when it is still undecided. Refusal or a failed
    /// fix is recorded in the state and returned without entering `Loading`.
    /// If another location was requested while waiting for the fix, the fix
    /// is dropped.
    pub async fn use_current_location(&self) -> Result<RefreshOutcome, DashboardError> {
        let locator = &self.inner.services.locator;
        let issued_at = self.inner.state.borrow().location_generation;

        let mut permission = locator.permission();
        if permission == PermissionState::NotDetermined {
            debug!("location permission undetermined, asking");
            permission = locator.request_permission().await;
        }

        if !permission.is_authorized() {
            warn!(?permission, "location permission refused");
            return Err(self.report_error(issued_at, DashboardError::LocationDenied));
        }

        let fix = match locator.request_one_shot_fix().await {
            Ok(fix) => fix,
            Err(e) => {
                warn!(error = %e, "no location fix");
                return Err(self.report_error(issued_at, e.into()));
            }
        };

        info!(latitude = fix.latitude, longitude = fix.longitude, "location fix received");

        let label = Label::Name(CURRENT_LOCATION_LABEL.to_string());
        let Some(token) = self.start_location(fix, label, Some(issued_at)) else {
            debug!("location fix arrived after another request, dropped");
            return Ok(RefreshOutcome::Superseded);
        };

        self.spawn_reverse_lookup(token);
        Ok(self.load(token).await)
    }

    /// Wait until no pollen, climate or reverse-lookup task is running.
    ///
    /// Only observes the tasks: dropping this future leaves them running.
    pub async fn settle(&self) {
        let mut pending = self.inner.background.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = pending.wait_for(|count| *count == 0).await;
    }

    /// Record a location error unless another location was requested since `issued_at`.
    fn report_error(&self, issued_at: u64, error: DashboardError) -> DashboardError {
        let recorded = self.inner.state.send_if_modified(|s| {
            if s.location_generation != issued_at {
                return false;
            }
            s.error = Some(error.clone());
            true
        });

        if !recorded {
            debug!(%error, "location error for a superseded request not recorded");
        }
        error
    }

    /// Activate a new location token and clear data belonging to the old one.
    ///
    /// With `expected` set, nothing happens unless the generation is still
    /// the one observed by the caller.
    fn start_location(
        &self,
        coordinate: Coordinate,
        label: Label,
        expected: Option<u64>,
    ) -> Option<LocationToken> {
        let mut token = None;

        self.inner.state.send_if_modified(|s| {
            if expected.is_some_and(|g| g != s.location_generation) {
                return false;
            }

            s.location_generation += 1;
            let next = LocationToken { generation: s.location_generation, coordinate };
            s.location = Some(next);

            match label {
                Label::Place(place) => {
                    s.location_name = place.display_name();
                    s.place = Some(place);
                    s.clear_search();
                }
                Label::Name(name) => {
                    s.location_name = name;
                    s.place = None;
                }
                Label::Coordinate => {
                    let same_place = s.place.as_ref().is_some_and(|p| p.coordinate == coordinate);
                    if !same_place {
                        s.place = None;
                        s.location_name = coordinate.to_string();
                    }
                }
            }

            s.status = LoadStatus::Loading;
            s.error = None;
            s.air_quality = None;
            s.pollen.clear();
            s.climate.clear();

            token = Some(next);
            true
        });

        if let Some(t) = token {
            info!(
                generation = t.generation,
                latitude = coordinate.latitude,
                longitude = coordinate.longitude,
                "loading location"
            );
        }
        token
    }

    async fn load(&self, token: LocationToken) -> RefreshOutcome {
        self.spawn_enrichment(token);

        let result = self.inner.services.air_quality.fetch(token.coordinate).await;
        self.apply_air_quality(token, result)
    }

    fn apply_air_quality(
        &self,
        token: LocationToken,
        result: Result<AirQualitySample, FetchError>,
    ) -> RefreshOutcome {
        if let Err(e) = &result {
            warn!(generation = token.generation, error = %e, "air quality fetch failed");
        }

        let mut outcome = RefreshOutcome::Superseded;
        self.inner.state.send_if_modified(|s| {
            if !s.is_current(token) {
                return false;
            }
            match result {
                Ok(sample) => {
                    s.air_quality = Some(sample);
                    s.status = LoadStatus::Loaded;
                    outcome = RefreshOutcome::Loaded;
                }
                Err(e) => {
                    s.air_quality = None;
                    s.status = LoadStatus::LoadFailed;
                    s.error = Some(DashboardError::AirQualityUnavailable(e.to_string()));
                    outcome = RefreshOutcome::Failed;
                }
            }
            true
        });

        if outcome == RefreshOutcome::Superseded {
            debug!(generation = token.generation, "air quality for superseded location dropped");
        }
        outcome
    }

    /// Spawn a detached task counted by [`Dashboard::settle`].
    fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.background.send_modify(|count| *count += 1);
        let pending = Pending(self.clone());
        tokio::spawn(async move {
            let _pending = pending;
            task.await;
        });
    }

    fn spawn_enrichment(&self, token: LocationToken) {
        let this = self.clone();
        self.spawn_background(async move {
            let result = this.inner.services.pollen.fetch(token.coordinate).await;
            this.apply_pollen(token, result);
        });

        let this = self.clone();
        self.spawn_background(async move {
            let result = this.inner.services.climate.fetch(token.coordinate).await;
            this.apply_climate(token, result);
        });
    }

    fn apply_pollen(&self, token: LocationToken, result: Result<Vec<PollenEntry>, FetchError>) {
        let entries = result.unwrap_or_else(|e| {
            if e.is_empty_result() {
                debug!(generation = token.generation, "no pollen data for this location");
            } else {
                warn!(generation = token.generation, error = %e, "pollen unavailable");
            }
            Vec::new()
        });

        let applied = self.inner.state.send_if_modified(|s| {
            if !s.is_current(token) {
                return false;
            }
            s.pollen = entries;
            true
        });

        if !applied {
            debug!(generation = token.generation, "pollen for superseded location dropped");
        }
    }

    fn apply_climate(&self, token: LocationToken, result: Result<Vec<ClimateSample>, FetchError>) {
        let mut samples = result.unwrap_or_else(|e| {
            warn!(generation = token.generation, error = %e, "climate history unavailable");
            Vec::new()
        });
        samples.sort_by_key(|s| s.year);

        let applied = self.inner.state.send_if_modified(|s| {
            if !s.is_current(token) {
                return false;
            }
            s.climate = samples;
            true
        });

        if !applied {
            debug!(generation = token.generation, "climate for superseded location dropped");
        }
    }

    fn spawn_reverse_lookup(&self, token: LocationToken) {
        let this = self.clone();
        self.spawn_background(async move {
            let name = match this.inner.services.reverse_geocoder.place_name(token.coordinate).await {
                Ok(Some(name)) => name,
                Ok(None) => {
                    debug!("reverse lookup found no place name");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "reverse lookup failed");
                    return;
                }
            };

            this.inner.state.send_if_modified(|s| {
                if !s.is_current(token) {
                    return false;
                }
                s.location_name = name;
                true
            });
        });
    }
}

/// Held by a background task; the count drops when the task ends or is aborted.
struct Pending(Dashboard);

impl Drop for Pending {
    fn drop(&mut self) {
        self.0.inner.background.send_modify(|count| *count = count.saturating_sub(1));
    }
}
