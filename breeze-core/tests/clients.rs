//! Integration tests for the HTTP clients using wiremock.

use breeze_core::{
    AirQualityClient, Coordinate, FetchError, GeocodingClient, LocationError, LocationProvider,
    PermissionState, PollenClient, ReverseGeocoder,
    provider::{
        air_quality::OpenMeteoAirQuality, climate::OpenMeteoClimate,
        geocoding::OpenMeteoGeocoding, pollen::PollenProxy, reverse::NominatimReverseGeocoder,
    },
    location::IpLocationProvider,
};
use chrono::NaiveDate;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BERLIN: Coordinate = Coordinate::new(52.52, 13.405);

// ---------------------------------------------------------------------------
// Geocoding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn geocoding_maps_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "Berl"))
        .and(query_param("count", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {
                    "id": 2950159,
                    "name": "Berlin",
                    "latitude": 52.52437,
                    "longitude": 13.41053,
                    "country": "Germany",
                    "admin1": "Land Berlin"
                },
                {
                    "id": 5083330,
                    "name": "Berlin",
                    "latitude": 44.46867,
                    "longitude": -71.18508,
                    "country": "United States"
                }
            ],
            "generationtime_ms": 0.5
        })))
        .mount(&mock_server)
        .await;

    let client = OpenMeteoGeocoding::new(format!("{}/v1/search", mock_server.uri()));
    let places = client.search("Berl").await.unwrap();

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].id, "2950159");
    assert_eq!(places[0].display_name(), "Berlin, Land Berlin, Germany");
    assert_eq!(places[1].region, None);
    assert_eq!(places[1].coordinate, Coordinate::new(44.46867, -71.18508));
}

#[tokio::test]
async fn geocoding_without_matches_is_empty_not_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "generationtime_ms": 0.2 })),
        )
        .mount(&mock_server)
        .await;

    let client = OpenMeteoGeocoding::new(format!("{}/v1/search", mock_server.uri()));
    let places = client.search("Qxzy").await.unwrap();

    assert!(places.is_empty());
}

#[tokio::test]
async fn geocoding_short_query_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = OpenMeteoGeocoding::new(format!("{}/v1/search", mock_server.uri()));
    assert!(client.search("B").await.unwrap().is_empty());
    assert!(client.search("").await.unwrap().is_empty());
}

#[tokio::test]
async fn geocoding_server_error_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let client = OpenMeteoGeocoding::new(format!("{}/v1/search", mock_server.uri()));
    let err = client.search("Berlin").await.unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 500, .. }));
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let client = OpenMeteoGeocoding::new("http://127.0.0.1:9/v1/search");
    let err = client.search("Berlin").await.unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }), "unexpected error: {err}");
}

// ---------------------------------------------------------------------------
// Air quality
// ---------------------------------------------------------------------------

#[tokio::test]
async fn air_quality_maps_current_reading() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/air-quality"))
        .and(query_param("latitude", "52.52"))
        .and(query_param("longitude", "13.405"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "latitude": 52.5,
            "longitude": 13.4,
            "current": {
                "time": "2024-07-04T12:00",
                "interval": 3600,
                "us_aqi": 42,
                "pm10": 14.2,
                "pm2_5": 8.1,
                "carbon_monoxide": 180.0,
                "nitrogen_dioxide": 12.5,
                "sulphur_dioxide": 1.4,
                "ozone": 61.0
            }
        })))
        .mount(&mock_server)
        .await;

    let client = OpenMeteoAirQuality::new(format!("{}/v1/air-quality", mock_server.uri()));
    let sample = client.fetch(BERLIN).await.unwrap();

    assert_eq!(sample.us_aqi, 42);
    assert_eq!(sample.pm25, 8.1);
    assert_eq!(sample.pm10, 14.2);
    assert_eq!(sample.co, 180.0);
    assert_eq!(sample.no2, 12.5);
    assert_eq!(sample.so2, 1.4);
    assert_eq!(sample.o3, 61.0);
}

#[tokio::test]
async fn air_quality_without_current_block_is_empty_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "latitude": 52.5 })),
        )
        .mount(&mock_server)
        .await;

    let client = OpenMeteoAirQuality::new(mock_server.uri());
    let err = client.fetch(BERLIN).await.unwrap_err();

    assert!(err.is_empty_result(), "unexpected error: {err}");
}

#[tokio::test]
async fn air_quality_malformed_payload_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let client = OpenMeteoAirQuality::new(mock_server.uri());
    let err = client.fetch(BERLIN).await.unwrap_err();

    assert!(matches!(err, FetchError::Decode { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn aqi_for_many_locations() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("current", "us_aqi"))
        .and(query_param("latitude", "52.52,48.8566"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "current": { "us_aqi": 31 } },
            { "current": { "us_aqi": null } }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("current", "us_aqi"))
        .and(query_param("latitude", "52.52"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "current": { "us_aqi": 17 } })),
        )
        .mount(&mock_server)
        .await;

    let client = OpenMeteoAirQuality::new(mock_server.uri());

    let many = client.fetch_aqi_many(&[BERLIN, Coordinate::new(48.8566, 2.3522)]).await;
    assert_eq!(many, vec![Some(31), None]);

    let one = client.fetch_aqi_many(&[BERLIN]).await;
    assert_eq!(one, vec![Some(17)]);

    assert!(client.fetch_aqi_many(&[]).await.is_empty());
}

#[tokio::test]
async fn aqi_for_many_locations_degrades_to_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = OpenMeteoAirQuality::new(mock_server.uri());
    let values = client.fetch_aqi_many(&[BERLIN, BERLIN, BERLIN]).await;

    assert_eq!(values, vec![None, None, None]);
}

// ---------------------------------------------------------------------------
// Pollen
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pollen_lists_types_then_plants() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/pollen"))
        .and(query_param("lat", "52.52"))
        .and(query_param("lon", "13.405"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "dailyInfo": [
                {
                    "pollenTypeInfo": [
                        {
                            "code": "GRASS",
                            "displayName": "Grass",
                            "indexInfo": { "value": 3, "category": "Moderate" },
                            "healthRecommendations": ["Keep windows closed"]
                        },
                        { "code": "TREE", "displayName": "Tree" }
                    ],
                    "plantInfo": [
                        {
                            "code": "GRAMINALES",
                            "displayName": "Grasses",
                            "indexInfo": { "value": 9, "category": "Very High" },
                            "plantDescription": {
                                "family": "Poaceae",
                                "season": "Late spring, summer",
                                "specialColors": "Green",
                                "picture": "https://example.com/grass.jpg"
                            }
                        }
                    ]
                },
                { "pollenTypeInfo": [] }
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = PollenProxy::new(format!("{}/api/pollen", mock_server.uri()));
    let entries = client.fetch(BERLIN).await.unwrap();

    let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["GRASS", "TREE", "GRAMINALES"]);

    assert_eq!(entries[0].value, 3);
    assert!(!entries[0].is_plant);
    assert_eq!(entries[0].health_recommendations.as_deref(), Some(&["Keep windows closed".to_string()][..]));

    assert_eq!(entries[1].value, 0);
    assert_eq!(entries[1].category, "Low");

    let plant = &entries[2];
    assert!(plant.is_plant);
    assert_eq!(plant.name, "Graminales");
    assert_eq!(plant.value, 5);
    assert_eq!(plant.family.as_deref(), Some("Poaceae"));
    assert_eq!(plant.appearance.as_deref(), Some("Green"));
    assert_eq!(plant.image_url.as_deref(), Some("https://example.com/grass.jpg"));
}

#[tokio::test]
async fn pollen_without_daily_info_is_empty_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "dailyInfo": [] })))
        .mount(&mock_server)
        .await;

    let client = PollenProxy::new(mock_server.uri());
    let err = client.fetch(BERLIN).await.unwrap_err();

    assert!(err.is_empty_result(), "unexpected error: {err}");
}

// ---------------------------------------------------------------------------
// Climate history
// ---------------------------------------------------------------------------

fn archive_day(temperature: Option<f64>) -> serde_json::Value {
    serde_json::json!({
        "daily": {
            "time": ["ignored"],
            "temperature_2m_max": [temperature]
        }
    })
}

#[tokio::test]
async fn climate_omits_failed_years_and_sorts() {
    let mock_server = MockServer::start().await;

    // 1980 answers last, so completion order differs from year order.
    let answers = [
        ("1980-07-04", ResponseTemplate::new(200).set_body_json(archive_day(Some(24.1))).set_delay(Duration::from_millis(200))),
        ("1990-07-04", ResponseTemplate::new(500)),
        ("2000-07-04", ResponseTemplate::new(200).set_body_json(archive_day(Some(25.3)))),
        ("2010-07-04", ResponseTemplate::new(200).set_body_string("not json")),
        ("2020-07-04", ResponseTemplate::new(200).set_body_json(archive_day(Some(26.0)))),
        ("2024-07-04", ResponseTemplate::new(200).set_body_json(archive_day(Some(27.2)))),
    ];

    for (date, response) in answers {
        Mock::given(method("GET"))
            .and(path("/v1/archive"))
            .and(query_param("start_date", date))
            .and(query_param("end_date", date))
            .and(query_param("daily", "temperature_2m_max"))
            .respond_with(response)
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let client = OpenMeteoClimate::new(format!("{}/v1/archive", mock_server.uri()));
    let day = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
    let samples = client.fetch_for_day(BERLIN, day).await;

    let years: Vec<_> = samples.iter().map(|s| s.year).collect();
    assert_eq!(years, vec![1980, 2000, 2020, 2024]);
    assert_eq!(samples[0].temperature_c, 24.1);
    assert_eq!(samples[3].temperature_c, 27.2);
}

#[tokio::test]
async fn climate_skips_missing_values_and_impossible_days() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("start_date", "2000-02-29"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_day(None)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("start_date", "2020-02-29"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_day(Some(3.5))))
        .mount(&mock_server)
        .await;

    // 1990 and 2010 have no Feb 29 and must not be requested at all.
    Mock::given(method("GET"))
        .and(query_param("start_date", "1990-02-29"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_day(Some(1.0))))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = OpenMeteoClimate::new(mock_server.uri()).with_reference_years(vec![1990, 2000, 2010]);
    let day = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
    let samples = client.fetch_for_day(BERLIN, day).await;

    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].year, 2020);
    assert_eq!(samples[0].temperature_c, 3.5);
}

// ---------------------------------------------------------------------------
// Reverse geocoding and IP location
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reverse_geocoding_builds_city_and_country() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "display_name": "Mitte, Berlin, Germany",
            "address": { "city": "Berlin", "state": "Berlin", "country": "Germany" }
        })))
        .mount(&mock_server)
        .await;

    let client = NominatimReverseGeocoder::new(format!("{}/reverse", mock_server.uri()));
    let name = client.place_name(BERLIN).await.unwrap();

    assert_eq!(name.as_deref(), Some("Berlin, Germany"));
}

#[tokio::test]
async fn reverse_geocoding_without_address_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "Unable to geocode" })),
        )
        .mount(&mock_server)
        .await;

    let client = NominatimReverseGeocoder::new(mock_server.uri());
    assert_eq!(client.place_name(Coordinate::new(0.0, -140.0)).await.unwrap(), None);
}

#[tokio::test]
async fn ip_location_returns_fix_when_authorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "city": "Berlin",
            "lat": 52.52,
            "lon": 13.405
        })))
        .mount(&mock_server)
        .await;

    let provider = IpLocationProvider::new(
        reqwest::Client::new(),
        format!("{}/json", mock_server.uri()),
        PermissionState::Authorized,
        None,
    );

    assert_eq!(provider.request_one_shot_fix().await, Ok(BERLIN));
}

#[tokio::test]
async fn ip_location_reports_failed_lookup() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "private range"
        })))
        .mount(&mock_server)
        .await;

    let provider =
        IpLocationProvider::new(reqwest::Client::new(), mock_server.uri(), PermissionState::Authorized, None);

    assert_eq!(
        provider.request_one_shot_fix().await,
        Err(LocationError::Unavailable("private range".into()))
    );
}

#[tokio::test]
async fn ip_location_denied_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let provider =
        IpLocationProvider::new(reqwest::Client::new(), mock_server.uri(), PermissionState::Denied, None);

    assert_eq!(provider.request_one_shot_fix().await, Err(LocationError::PermissionDenied));
}
