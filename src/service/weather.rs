//! Point forecasts from the SMHI open data API.

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{errors::AppError, models::Event};

/// SMHI publishes roughly ten days ahead.
const FORECAST_HORIZON_DAYS: i64 = 10;
/// Forecast steps grow to 12 hours at the far end.
const MAX_STEP_DISTANCE_HOURS: i64 = 12;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmhiForecast {
    pub approved_time: Option<DateTime<Utc>>,
    pub time_series: Vec<SmhiTimeStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmhiTimeStep {
    pub valid_time: DateTime<Utc>,
    pub parameters: Vec<SmhiParameter>,
}

#[derive(Debug, Deserialize)]
pub struct SmhiParameter {
    pub name: String,
    pub values: Vec<f64>,
}

impl SmhiTimeStep {
    fn value(&self, name: &str) -> Option<f64> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.values.first().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub valid_time: DateTime<Utc>,
    /// °C
    pub temperature: Option<f64>,
    /// m/s
    pub wind_speed: Option<f64>,
    /// mm/h
    pub precipitation: Option<f64>,
    /// %
    pub humidity: Option<f64>,
    /// SMHI `Wsymb2` code, 1-27
    pub symbol: Option<u8>,
}

/// Picks the forecast step closest to `at`.
pub fn forecast_at(forecast: &SmhiForecast, at: DateTime<Utc>) -> Option<WeatherSnapshot> {
    let step = forecast
        .time_series
        .iter()
        .min_by_key(|step| (step.valid_time - at).num_seconds().abs())?;
    if (step.valid_time - at).num_seconds().abs() > Duration::hours(MAX_STEP_DISTANCE_HOURS).num_seconds() {
        return None;
    }
    Some(WeatherSnapshot {
        valid_time: step.valid_time,
        temperature: step.value("t"),
        wind_speed: step.value("ws"),
        precipitation: step.value("pmean"),
        humidity: step.value("r"),
        symbol: step
            .value("Wsymb2")
            .filter(|v| (1.0..=27.0).contains(v))
            .map(|v| v.round() as u8),
    })
}

/// Whether an event is close enough in time, and placed, for a forecast to exist.
pub fn in_forecast_range(event: &Event, now: DateTime<Utc>) -> bool {
    event.coordinates().is_some()
        && event.starts_at >= now - Duration::hours(1)
        && event.starts_at <= now + Duration::days(FORECAST_HORIZON_DAYS)
}

/// SMHI accepts at most six decimals.
fn coordinate(value: f64) -> String {
    let rounded = (value * 1_000_000.0).round() / 1_000_000.0;
    format!("{}", rounded)
}

#[derive(Clone)]
pub struct SmhiClient {
    client: Client,
    base_url: String,
}

impl SmhiClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn point_url(&self, latitude: f64, longitude: f64) -> String {
        format!(
            "{}/api/category/pmp3g/version/2/geotype/point/lon/{}/lat/{}/data.json",
            self.base_url,
            coordinate(longitude),
            coordinate(latitude)
        )
    }

    pub async fn point_forecast(&self, latitude: f64, longitude: f64) -> Result<SmhiForecast, AppError> {
        let url = self.point_url(latitude, longitude);
        debug!("fetching forecast {}", url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "SMHI returned {} for {},{}",
                response.status(),
                latitude,
                longitude
            )));
        }
        Ok(response.json::<SmhiForecast>().await?)
    }

    /// Weather at the event's start.
    pub async fn for_event(&self, event: &Event) -> Result<Option<WeatherSnapshot>, AppError> {
        if !in_forecast_range(event, Utc::now()) {
            return Ok(None);
        }
        let Some((latitude, longitude)) = event.coordinates() else {
            return Ok(None);
        };
        let forecast = self.point_forecast(latitude, longitude).await?;
        Ok(forecast_at(&forecast, event.starts_at))
    }

    /// Like [`SmhiClient::for_event`], but failures only log and yield no weather.
    pub async fn for_event_or_none(&self, event: &Event) -> Option<WeatherSnapshot> {
        match self.for_event(event).await {
            Ok(weather) => weather,
            Err(err) => {
                warn!("no weather for event {}: {}", event.id, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    const SAMPLE: &str = r#"{
        "approvedTime": "2024-06-01T10:05:12Z",
        "referenceTime": "2024-06-01T10:00:00Z",
        "geometry": {"type": "Point", "coordinates": [[11.95, 57.68]]},
        "timeSeries": [
            {"validTime": "2024-06-01T11:00:00Z", "parameters": [
                {"name": "t", "levelType": "hl", "level": 2, "unit": "Cel", "values": [17.2]},
                {"name": "Wsymb2", "levelType": "hl", "level": 0, "unit": "category", "values": [3]}
            ]},
            {"validTime": "2024-06-01T12:00:00Z", "parameters": [
                {"name": "t", "levelType": "hl", "level": 2, "unit": "Cel", "values": [18.4]},
                {"name": "ws", "levelType": "hl", "level": 10, "unit": "m/s", "values": [4.1]},
                {"name": "pmean", "levelType": "hl", "level": 0, "unit": "kg/m2/h", "values": [0.0]},
                {"name": "r", "levelType": "hl", "level": 2, "unit": "percent", "values": [62]},
                {"name": "Wsymb2", "levelType": "hl", "level": 0, "unit": "category", "values": [2]}
            ]}
        ]
    }"#;

    fn sample() -> SmhiForecast {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn picks_nearest_step() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 11, 40, 0).unwrap();
        let weather = forecast_at(&sample(), at).unwrap();
        assert_eq!(weather.valid_time, Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
        assert_eq!(weather.temperature, Some(18.4));
        assert_eq!(weather.wind_speed, Some(4.1));
        assert_eq!(weather.humidity, Some(62.0));
        assert_eq!(weather.symbol, Some(2));
    }

    #[test]
    fn missing_parameters_stay_empty() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap();
        let weather = forecast_at(&sample(), at).unwrap();
        assert_eq!(weather.wind_speed, None);
        assert_eq!(weather.symbol, Some(3));
    }

    #[test]
    fn nothing_beyond_the_series() {
        let at = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        assert_eq!(forecast_at(&sample(), at), None);
    }

    #[test]
    fn url_uses_rounded_coordinates() {
        let client = SmhiClient::new(Client::new(), "https://smhi.example/");
        assert_eq!(
            client.point_url(57.687654321, 11.95),
            "https://smhi.example/api/category/pmp3g/version/2/geotype/point/lon/11.95/lat/57.687654/data.json"
        );
    }

    #[test]
    fn forecast_range_needs_coordinates_and_near_start() {
        let now = Utc::now();
        let mut event = Event {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Kayak trip".into(),
            description: String::new(),
            location: None,
            latitude: Some(59.33),
            longitude: Some(18.07),
            starts_at: now + Duration::days(3),
            ends_at: None,
            is_public: true,
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        assert!(in_forecast_range(&event, now));

        event.starts_at = now + Duration::days(30);
        assert!(!in_forecast_range(&event, now));

        event.starts_at = now + Duration::days(3);
        event.longitude = None;
        assert!(!in_forecast_range(&event, now));
    }
}
