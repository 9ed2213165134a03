//! reqwest-backed sources for the transit and weather APIs.
//!
//! Both return the response body untouched; nothing here parses JSON.

use crate::config::CollectorConfig;
use crate::domain::model::DataKind;
use crate::domain::ports::{DepartureSource, WeatherSource};
use crate::utils::error::{CollectorError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DEPARTURES_PATH: &str = "/json/getdeparturesbystop";

/// Preview window in minutes; 60 is the API maximum.
const PREVIEW_MINUTES: &str = "60";

pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com";
const FORECAST_PATH: &str = "/v1/forecast";
const LATITUDE: &str = "40.1166557";
const LONGITUDE: &str = "88.2297261";
const CURRENT_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "wind_speed_10m",
    "wind_gusts_10m",
    "precipitation",
    "rain",
    "cloud_cover",
    "surface_pressure",
    "snowfall",
    "showers",
    "weather_code",
    "pressure_msl",
];

fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(CollectorError::Client)
}

/// Sends the request and hands back the raw body of a 200 response.
async fn fetch_body(request: RequestBuilder, kind: DataKind) -> Result<Vec<u8>> {
    let transport = |source| CollectorError::Transport { kind, source };

    let response = request.send().await.map_err(transport)?;
    tracing::debug!("{} API response status: {}", kind, response.status());

    if response.status() != StatusCode::OK {
        return Err(CollectorError::UnexpectedStatus {
            kind,
            status: response.status().as_u16(),
        });
    }

    let body = response.bytes().await.map_err(transport)?;
    Ok(body.to_vec())
}

#[derive(Debug, Clone)]
pub struct MtdClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl MtdClient {
    pub fn new(api_url: &str, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            endpoint: format!("{}{}", api_url.trim_end_matches('/'), DEPARTURES_PATH),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &CollectorConfig) -> Result<Self> {
        Self::new(&config.api_url, config.api_key.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DepartureSource for MtdClient {
    async fn fetch_departures(&self, stop_id: &str) -> Result<Vec<u8>> {
        tracing::debug!("Requesting departures for stop {}", stop_id);
        let request = self.client.get(&self.endpoint).query(&[
            ("key", self.api_key.as_str()),
            ("stop_id", stop_id),
            ("pt", PREVIEW_MINUTES),
        ]);
        fetch_body(request, DataKind::Departures).await
    }
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    endpoint: String,
}

impl WeatherClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(OPEN_METEO_BASE_URL)
    }

    /// Points the client at another Open-Meteo compatible host.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), FORECAST_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn current_fields() -> String {
        CURRENT_FIELDS.join(",")
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    async fn fetch_current(&self) -> Result<Vec<u8>> {
        tracing::debug!("Requesting current weather from {}", self.endpoint);
        let request = self.client.get(&self.endpoint).query(&[
            ("latitude", LATITUDE),
            ("longitude", LONGITUDE),
            ("current", Self::current_fields().as_str()),
        ]);
        fetch_body(request, DataKind::Weather).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_departures_sends_key_stop_and_preview_window() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/json/getdeparturesbystop")
                .query_param("key", "k")
                .query_param("stop_id", "IU")
                .query_param("pt", "60");
            then.status(200).body(r#"{"departures":[]}"#);
        });

        let client = MtdClient::new(&server.base_url(), "k").unwrap();
        let body = client.fetch_departures("IU").await.unwrap();

        api_mock.assert();
        assert_eq!(body, br#"{"departures":[]}"#);
    }

    #[tokio::test]
    async fn test_trailing_slash_in_base_url_is_ignored() {
        let client = MtdClient::new("http://localhost:9/api/", "k").unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/api/json/getdeparturesbystop"
        );
    }

    #[tokio::test]
    async fn test_non_200_is_unexpected_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/json/getdeparturesbystop");
            then.status(204);
        });

        let client = MtdClient::new(&server.base_url(), "k").unwrap();
        match client.fetch_departures("IU").await {
            Err(CollectorError::UnexpectedStatus { kind, status }) => {
                assert_eq!(kind, DataKind::Departures);
                assert_eq!(status, 204);
            }
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // 連接埠 9 (discard) 一般沒有服務在聽
        let client = MtdClient::new("http://127.0.0.1:9", "k").unwrap();
        assert!(matches!(
            client.fetch_departures("IU").await,
            Err(CollectorError::Transport {
                kind: DataKind::Departures,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_fetch_weather_requests_fixed_location_and_fields() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/forecast")
                .query_param("latitude", "40.1166557")
                .query_param("longitude", "88.2297261")
                .query_param("current", WeatherClient::current_fields());
            then.status(200).body(r#"{"current":{}}"#);
        });

        let client = WeatherClient::with_base_url(&server.base_url()).unwrap();
        let body = client.fetch_current().await.unwrap();

        api_mock.assert();
        assert_eq!(body, br#"{"current":{}}"#);
    }
}
