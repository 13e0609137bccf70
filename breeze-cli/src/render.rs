//! Plain-text rendering of dashboard state.

use breeze_core::{
    Place, TemperatureUnit, ViewState,
    model::{AqiCategory, PollenEntry, temperature_change},
};

/// Full dashboard view for one location.
pub fn dashboard(state: &ViewState, unit: TemperatureUnit) -> String {
    let mut lines = Vec::new();

    lines.push(heading(state));

    if let Some(error) = &state.error {
        lines.push(format!("! {}", error.user_message()));
    }

    match &state.air_quality {
        Some(sample) => {
            let category = sample.category();
            lines.push(String::new());
            lines.push(format!("Air quality: AQI {} ({})", sample.us_aqi, category.label()));
            lines.push(format!("  {}", category.description()));
            for tip in category.tips() {
                lines.push(format!("  - {tip}"));
            }

            lines.push(String::new());
            lines.push("Pollutants:".to_string());
            for reading in state.pollutants() {
                lines.push(format!(
                    "  {:<6} {:>6} {:<6} {}",
                    reading.kind.label(),
                    reading.rounded(),
                    reading.kind.unit(),
                    reading.status().label(),
                ));
            }
        }
        None if state.is_loading() => lines.push("Loading...".to_string()),
        None => {}
    }

    if !state.pollen.is_empty() {
        lines.push(String::new());
        lines.push("Pollen:".to_string());
        lines.extend(state.pollen.iter().map(pollen_line));
    }

    if !state.climate.is_empty() {
        lines.push(String::new());
        lines.push("Today in past years:".to_string());
        for sample in &state.climate {
            lines.push(format!("  {}  {}", sample.year, unit.format(sample.temperature_c)));
        }
        if let Some(change) = temperature_change(&state.climate) {
            lines.push(format!("  Change: {}", unit.format_diff(change)));
        }
    }

    lines.join("\n")
}

fn heading(state: &ViewState) -> String {
    if !state.location_name.is_empty() {
        return state.location_name.clone();
    }
    match state.coordinate() {
        Some(coordinate) => coordinate.to_string(),
        None => "No location selected".to_string(),
    }
}

fn pollen_line(entry: &PollenEntry) -> String {
    let kind = if entry.is_plant { "plant" } else { "type" };
    format!("  {:<20} {} ({}/5, {kind})", entry.name, entry.level().label(), entry.value)
}

/// Numbered list of search candidates.
pub fn search_results(query: &str, results: &[Place]) -> String {
    if results.is_empty() {
        return format!("No places match '{query}'.");
    }

    results
        .iter()
        .enumerate()
        .map(|(i, place)| format!("{}. {} ({})", i + 1, place.display_name(), place.coordinate))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One row of the city ticker.
pub fn city_line(place: &Place, aqi: Option<i32>) -> String {
    match aqi {
        Some(aqi) => {
            format!("{:<14} {:>4}  {}", place.name, aqi, AqiCategory::from_aqi(aqi).label())
        }
        None => format!("{:<14} {:>4}", place.name, "--"),
    }
}
