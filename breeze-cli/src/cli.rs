use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use breeze_core::{
    Config, ConsentPrompt, Coordinate, Dashboard, DashboardOptions, Place, RefreshOutcome,
    SearchPhase, Source, TemperatureUnit,
    location::PermissionSetting,
    model::top_cities,
    provider::air_quality::OpenMeteoAirQuality,
    services_from_config,
};
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Select, Text};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "breeze", version, about = "Air quality, pollen and climate history for any place")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List places matching a name.
    Search {
        /// At least two characters of a city name.
        query: String,
    },

    /// Show the dashboard for the best match of a place name.
    Show {
        /// City name, e.g. "Berlin".
        query: String,
    },

    /// Show the dashboard for the current location.
    Here,

    /// Show the dashboard for explicit coordinates.
    At {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Current AQI for well-known cities.
    Cities,

    /// Interactive configuration: units, location access, home position.
    Configure,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Cities => cities(&Config::load()?).await,
            Command::Search { query } => {
                let config = Config::load()?;
                let dashboard = build_dashboard(&config)?;
                let results = search(&dashboard, &query).await?;
                println!("{}", render::search_results(&query, &results));
                Ok(())
            }
            Command::Show { query } => {
                let config = Config::load()?;
                let dashboard = build_dashboard(&config)?;
                let place = search(&dashboard, &query)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow!("No places match '{query}'."))?;

                let outcome = dashboard.select_place(place).await;
                finish(&dashboard, &config, outcome).await
            }
            Command::Here => {
                let config = Config::load()?;
                let dashboard = build_dashboard(&config)?;
                let outcome = dashboard
                    .use_current_location()
                    .await
                    .map_err(|e| anyhow!(e.user_message()))?;
                finish(&dashboard, &config, outcome).await
            }
            Command::At { lat, lon } => {
                let coordinate = parse_coordinate(lat, lon)?;
                let config = Config::load()?;
                let dashboard = build_dashboard(&config)?;
                let outcome = dashboard.refresh_location(coordinate).await;
                finish(&dashboard, &config, outcome).await
            }
        }
    }
}

fn build_dashboard(config: &Config) -> Result<Dashboard> {
    let services = services_from_config(config, Arc::new(TerminalConsent))
        .context("Failed to set up data sources")?;
    Ok(Dashboard::new(services, DashboardOptions::from_config(config)))
}

/// Type the whole query at once and wait for the debounced search to land.
async fn search(dashboard: &Dashboard, query: &str) -> Result<Vec<Place>> {
    let mut rx = dashboard.subscribe();
    dashboard.set_search_query(query);

    let results = rx
        .wait_for(|state| state.search_phase != SearchPhase::Searching)
        .await
        .context("Dashboard stopped before the search finished")?
        .search_results
        .clone();

    debug!(query, count = results.len(), "search finished");
    Ok(results)
}

/// Wait for background enrichment, then print the dashboard.
async fn finish(dashboard: &Dashboard, config: &Config, outcome: RefreshOutcome) -> Result<()> {
    debug!(?outcome, "location refresh finished");
    dashboard.settle().await;

    let state = dashboard.snapshot();
    println!("{}", render::dashboard(&state, config.temperature_unit));
    println!("\nUpdated {}", Local::now().format("%H:%M"));
    Ok(())
}

async fn cities(config: &Config) -> Result<()> {
    let client = OpenMeteoAirQuality::new(config.endpoint(Source::AirQuality));
    let places = top_cities();
    let coordinates: Vec<Coordinate> = places.iter().map(|p| p.coordinate).collect();

    let values = client.fetch_aqi_many(&coordinates).await;
    for (place, aqi) in places.iter().zip(values) {
        println!("{}", render::city_line(place, aqi));
    }
    Ok(())
}

fn parse_coordinate(lat: f64, lon: f64) -> Result<Coordinate> {
    if !(-90.0..=90.0).contains(&lat) {
        bail!("Latitude must be between -90 and 90, got {lat}");
    }
    if !(-180.0..=180.0).contains(&lon) {
        bail!("Longitude must be between -180 and 180, got {lon}");
    }
    Ok(Coordinate::new(lat, lon))
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let unit = Select::new("Temperature unit:", vec!["fahrenheit", "celsius"]).prompt()?;
    config.temperature_unit = match unit {
        "celsius" => TemperatureUnit::Celsius,
        _ => TemperatureUnit::Fahrenheit,
    };

    let permission = Select::new("Location access:", vec!["ask", "allow", "deny"])
        .with_help_message("\"ask\" prompts the first time your location is needed")
        .prompt()?;
    config.location.permission = match permission {
        "allow" => PermissionSetting::Allow,
        "deny" => PermissionSetting::Deny,
        _ => PermissionSetting::Ask,
    };

    let use_home = Confirm::new("Use a fixed home position instead of IP geolocation?")
        .with_default(config.location.home.is_some())
        .prompt()?;
    config.location.home = if use_home {
        let lat = CustomType::<f64>::new("Latitude:").prompt()?;
        let lon = CustomType::<f64>::new("Longitude:").prompt()?;
        Some(parse_coordinate(lat, lon)?)
    } else {
        None
    };

    if Confirm::new("Change a data source URL?").with_default(false).prompt()? {
        let source = Select::new("Data source:", Source::all().to_vec()).prompt()?;
        let current = if config.has_endpoint_override(source) {
            config.endpoint(source)
        } else {
            String::new()
        };
        let input = Text::new("Base URL (leave empty for the default):")
            .with_initial_value(&current)
            .with_help_message(source.default_endpoint())
            .prompt()?;
        apply_endpoint(&mut config, source, &input)?;
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Set or clear the URL override for `source`. Empty input restores the default.
fn apply_endpoint(config: &mut Config, source: Source, input: &str) -> Result<()> {
    let url = input.trim();
    if url.is_empty() {
        if config.remove_endpoint(source) {
            println!("{} uses {} again", source.label(), source.default_endpoint());
        }
        return Ok(());
    }

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("Invalid URL for {source}: '{url}'.\nHint: it must start with http:// or https://");
    }
    config.upsert_endpoint(source, url.to_string());
    Ok(())
}

/// Asks on the terminal whether location may be used.
#[derive(Debug)]
struct TerminalConsent;

#[async_trait]
impl ConsentPrompt for TerminalConsent {
    async fn ask(&self) -> bool {
        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new("Allow Breeze to use your approximate location?")
                .with_default(false)
                .with_help_message("Needed to show conditions where you are")
                .prompt()
        })
        .await;

        match answer {
            Ok(Ok(allowed)) => allowed,
            Ok(Err(e)) => {
                warn!(error = %e, "location prompt failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "location prompt task failed");
                false
            }
        }
    }
}
