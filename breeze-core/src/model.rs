use serde::{Deserialize, Serialize};

/// A WGS84 position. Latitude and longitude always travel together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A named location, either from geocoding or from the built-in city catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    /// First-level administrative region (state, province, ...).
    pub region: Option<String>,
    pub coordinate: Coordinate,
}

impl Place {
    /// "Name, Region, Country", skipping missing or empty parts.
    pub fn display_name(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        for part in [&self.region, &self.country].into_iter().flatten() {
            if !part.is_empty() {
                parts.push(part.as_str());
            }
        }
        parts.join(", ")
    }
}

const TOP_CITIES: &[(&str, &str, &str, f64, f64)] = &[
    ("new-york", "New York", "USA", 40.7128, -74.0060),
    ("los-angeles", "Los Angeles", "USA", 34.0522, -118.2437),
    ("chicago", "Chicago", "USA", 41.8781, -87.6298),
    ("london", "London", "UK", 51.5074, -0.1278),
    ("paris", "Paris", "France", 48.8566, 2.3522),
    ("tokyo", "Tokyo", "Japan", 35.6762, 139.6503),
    ("berlin", "Berlin", "Germany", 52.5200, 13.4050),
    ("toronto", "Toronto", "Canada", 43.6532, -79.3832),
    ("sydney", "Sydney", "Australia", -33.8688, 151.2093),
    ("dubai", "Dubai", "UAE", 25.2048, 55.2708),
];

/// Well-known cities shown without searching.
pub fn top_cities() -> Vec<Place> {
    TOP_CITIES
        .iter()
        .map(|&(id, name, country, lat, lon)| Place {
            id: format!("catalog:{id}"),
            name: name.to_string(),
            country: Some(country.to_string()),
            region: None,
            coordinate: Coordinate::new(lat, lon),
        })
        .collect()
}

/// Current air quality snapshot for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySample {
    pub us_aqi: i32,
    pub pm25: f64,
    pub pm10: f64,
    pub co: f64,
    pub no2: f64,
    pub so2: f64,
    pub o3: f64,
}

impl AirQualitySample {
    /// One reading per pollutant, in display order.
    pub fn pollutants(&self) -> Vec<PollutantReading> {
        PollutantKind::all()
            .iter()
            .map(|&kind| PollutantReading { kind, value: self.value_of(kind) })
            .collect()
    }

    pub fn value_of(&self, kind: PollutantKind) -> f64 {
        match kind {
            PollutantKind::Pm25 => self.pm25,
            PollutantKind::Pm10 => self.pm10,
            PollutantKind::No2 => self.no2,
            PollutantKind::So2 => self.so2,
            PollutantKind::O3 => self.o3,
            PollutantKind::Co => self.co,
        }
    }

    pub fn category(&self) -> AqiCategory {
        AqiCategory::from_aqi(self.us_aqi)
    }
}

/// US AQI bands, with finer splits at the clean end of the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiCategory {
    Excellent,
    Good,
    Moderate,
    SlightlyHigh,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn from_aqi(aqi: i32) -> Self {
        match aqi {
            i32::MIN..=25 => Self::Excellent,
            26..=50 => Self::Good,
            51..=75 => Self::Moderate,
            76..=100 => Self::SlightlyHigh,
            101..=150 => Self::UnhealthyForSensitive,
            151..=200 => Self::Unhealthy,
            201..=300 => Self::VeryUnhealthy,
            _ => Self::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::SlightlyHigh => "Slightly High",
            Self::UnhealthyForSensitive => "Unhealthy for Sensitive Groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Air quality is pristine! Perfect day for adventures.",
            Self::Good => "Air quality is great. Breathe easy!",
            Self::Moderate => "Air quality is acceptable for most people.",
            Self::SlightlyHigh => "Getting a bit iffy for sensitive groups.",
            Self::UnhealthyForSensitive => "Sensitive groups should be cautious.",
            Self::Unhealthy => "Everyone may feel the effects now.",
            Self::VeryUnhealthy => "Serious health concerns for everyone.",
            Self::Hazardous => "Emergency conditions. Seriously bad air.",
        }
    }

    pub fn tips(&self) -> &'static [&'static str] {
        match self {
            Self::Excellent => &[
                "Air is exceptionally clean right now",
                "No air quality concerns at this level",
            ],
            Self::Good => &[
                "Air quality meets health standards",
                "Pollutant levels are low",
                "No health risks from air quality",
            ],
            Self::Moderate => &[
                "Air quality is acceptable for most",
                "Unusually sensitive people may experience minor effects",
                "Pollutant levels are within moderate range",
            ],
            Self::SlightlyHigh => &[
                "Sensitive groups may experience respiratory symptoms",
                "Air pollutants are at elevated levels",
                "Those with asthma should have medication available",
            ],
            Self::UnhealthyForSensitive => &[
                "Air quality may affect children, elderly, and those with respiratory conditions",
                "Pollutant concentrations are unhealthy for sensitive groups",
                "Consider using air purifiers indoors",
            ],
            Self::Unhealthy => &[
                "Air quality is unhealthy for everyone",
                "Keeping windows closed will help maintain indoor air quality",
                "Wearing masks can reduce exposure to pollutants",
            ],
            Self::VeryUnhealthy => &[
                "Air pollutants are at dangerous levels",
                "Indoor air quality is significantly better than outdoor",
                "Air purifiers can help reduce indoor pollutant levels",
            ],
            Self::Hazardous => &[
                "Air quality has reached hazardous levels",
                "Outdoor air contains dangerous pollutant concentrations",
                "N95 masks filter harmful particles from the air",
                "Air purifiers on high settings can improve indoor air",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollutantKind {
    Pm25,
    Pm10,
    No2,
    So2,
    O3,
    Co,
}

impl PollutantKind {
    pub const fn all() -> &'static [PollutantKind] {
        &[
            PollutantKind::Pm25,
            PollutantKind::Pm10,
            PollutantKind::No2,
            PollutantKind::So2,
            PollutantKind::O3,
            PollutantKind::Co,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pm25 => "PM2.5",
            Self::Pm10 => "PM10",
            Self::No2 => "NO₂",
            Self::So2 => "SO₂",
            Self::O3 => "O₃",
            Self::Co => "CO",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            Self::Pm25 => "Fine Particulate Matter (PM2.5)",
            Self::Pm10 => "Coarse Particulate Matter (PM10)",
            Self::No2 => "Nitrogen Dioxide (NO₂)",
            Self::So2 => "Sulfur Dioxide (SO₂)",
            Self::O3 => "Ground-Level Ozone (O₃)",
            Self::Co => "Carbon Monoxide (CO)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Pm25 => {
                "Tiny particles ≤2.5 micrometers that can penetrate deep into lungs and bloodstream."
            }
            Self::Pm10 => {
                "Inhalable particles ≤10 micrometers from dust, pollen, and mold. Affects respiratory system."
            }
            Self::No2 => {
                "Reddish-brown gas from vehicle emissions and power plants. Irritates airways and reduces immunity."
            }
            Self::So2 => {
                "Colorless gas from fossil fuel combustion. Can trigger asthma and respiratory issues."
            }
            Self::O3 => {
                "Formed by sunlight reacting with pollutants. Harmful to lungs, especially during outdoor activities."
            }
            Self::Co => {
                "Odorless, colorless gas from incomplete combustion. Reduces oxygen delivery to body tissues."
            }
        }
    }

    pub fn unit(&self) -> &'static str {
        "µg/m³"
    }

    /// Upper bound (inclusive) of the "good" band.
    pub fn good_limit(&self) -> f64 {
        match self {
            Self::Pm25 => 12.0,
            Self::Pm10 => 54.0,
            Self::No2 => 53.0,
            Self::So2 => 35.0,
            Self::O3 => 54.0,
            Self::Co => 4400.0,
        }
    }

    /// Upper bound (inclusive) of the "moderate" band.
    pub fn moderate_limit(&self) -> f64 {
        match self {
            Self::Pm25 => 35.4,
            Self::Pm10 => 154.0,
            Self::No2 => 100.0,
            Self::So2 => 75.0,
            Self::O3 => 70.0,
            Self::Co => 9400.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollutantStatus {
    Good,
    Moderate,
    Unhealthy,
}

impl PollutantStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Unhealthy => "Unhealthy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollutantReading {
    pub kind: PollutantKind,
    pub value: f64,
}

impl PollutantReading {
    pub fn status(&self) -> PollutantStatus {
        if self.value <= self.kind.good_limit() {
            PollutantStatus::Good
        } else if self.value <= self.kind.moderate_limit() {
            PollutantStatus::Moderate
        } else {
            PollutantStatus::Unhealthy
        }
    }

    pub fn rounded(&self) -> i64 {
        self.value.round() as i64
    }
}

/// One pollen type (grass, tree, weed) or individual plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollenEntry {
    pub id: String,
    pub name: String,
    /// Universal pollen index, 0..=5.
    pub value: u8,
    pub category: String,
    pub is_plant: bool,
    pub image_url: Option<String>,
    pub family: Option<String>,
    pub season: Option<String>,
    pub appearance: Option<String>,
    pub health_recommendations: Option<Vec<String>>,
}

impl PollenEntry {
    pub fn level(&self) -> PollenLevel {
        PollenLevel::from_index(self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollenLevel {
    None,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl PollenLevel {
    pub fn from_index(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Low,
            2..=3 => Self::Moderate,
            4 => Self::High,
            _ => Self::VeryHigh,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

/// Daily maximum temperature for the same calendar day in a given year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateSample {
    pub year: i32,
    pub temperature_c: f64,
}

/// Difference between the latest and the earliest sample, in °C.
///
/// Expects samples sorted by year, as the climate client returns them.
pub fn temperature_change(samples: &[ClimateSample]) -> Option<f64> {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) if samples.len() > 1 => {
            Some(last.temperature_c - first.temperature_c)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    pub fn format(&self, celsius: f64) -> String {
        let value = match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        };
        format!("{value:.1}{}", self.symbol())
    }

    /// Formats a temperature difference with an explicit sign.
    pub fn format_diff(&self, celsius_diff: f64) -> String {
        let value = match self {
            Self::Celsius => celsius_diff,
            Self::Fahrenheit => celsius_diff * 9.0 / 5.0,
        };
        let sign = if value >= 0.0 { "+" } else { "" };
        format!("{sign}{value:.1}{}", self.symbol())
    }
}
