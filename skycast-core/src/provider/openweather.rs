use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::model::{CurrentWeather, ForecastPayload, LocationQuery, TemperatureUnit};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &LocationQuery,
        unit: TemperatureUnit,
    ) -> Result<T> {
        let url = format!("{}/{endpoint}", self.base_url);

        let mut params = location_params(query);
        params.push(("units", unit.units_param().to_string()));
        params.push(("appid", self.api_key.clone()));

        tracing::debug!(%url, %query, units = unit.units_param(), "requesting OpenWeather {endpoint}");

        let res = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({endpoint})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {endpoint} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {endpoint} request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse OpenWeather {endpoint} JSON"))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, query: &LocationQuery, unit: TemperatureUnit) -> Result<CurrentWeather> {
        self.get_json("weather", query, unit).await
    }

    async fn forecast(&self, query: &LocationQuery, unit: TemperatureUnit) -> Result<ForecastPayload> {
        self.get_json("forecast", query, unit).await
    }
}

fn location_params(query: &LocationQuery) -> Vec<(&'static str, String)> {
    match query {
        LocationQuery::City(name) => vec![("q", name.clone())],
        LocationQuery::Coordinates(coord) => {
            vec![("lat", coord.lat.to_string()), ("lon", coord.lon.to_string())]
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
