use crate::{
    Config,
    model::{CurrentWeather, ForecastPayload, LocationQuery, TemperatureUnit, WeatherReport},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(
        &self,
        query: &LocationQuery,
        unit: TemperatureUnit,
    ) -> anyhow::Result<CurrentWeather>;

    async fn forecast(
        &self,
        query: &LocationQuery,
        unit: TemperatureUnit,
    ) -> anyhow::Result<ForecastPayload>;
}

/// A lookup that did not produce both datasets.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to fetch weather for '{query}': {cause:#}")]
    Failed {
        query: LocationQuery,
        cause: anyhow::Error,
    },
}

/// Requests current conditions and the forecast concurrently.
///
/// Either both payloads come back as one [`WeatherReport`] or the whole
/// lookup fails; a half-finished pair is dropped.
pub async fn fetch_report(
    provider: &dyn WeatherProvider,
    query: LocationQuery,
    unit: TemperatureUnit,
) -> Result<WeatherReport, FetchError> {
    let joined = tokio::try_join!(provider.current(&query, unit), provider.forecast(&query, unit));

    match joined {
        Ok((current, forecast)) => {
            tracing::info!(%query, %unit, samples = forecast.list.len(), "weather report received");
            Ok(WeatherReport { current, forecast, unit, query })
        }
        Err(cause) => {
            tracing::warn!(%query, %unit, error = %format!("{cause:#}"), "weather lookup failed");
            Err(FetchError::Failed { query, cause })
        }
    }
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `skycast configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    let provider = match &config.base_url {
        Some(base_url) => OpenWeatherProvider::with_base_url(api_key, base_url),
        None => OpenWeatherProvider::new(api_key),
    };

    Ok(Box::new(provider))
}
