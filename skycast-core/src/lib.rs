//! Core library for the `skycast` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client and the paired current/forecast lookup
//! - Daily aggregation of the 3-hourly forecast
//! - Device location lookup
//! - Session state for interactive use
//!
//! It is used by `skycast-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod forecast;
pub mod location;
pub mod model;
pub mod provider;
pub mod state;

pub use config::Config;
pub use forecast::{DailySummary, daily_summaries, select_daily_summaries};
pub use location::{ChainLocator, Geolocator, LocationError};
pub use model::{
    Coord, CurrentWeather, ForecastPayload, ForecastSample, LocationQuery, TemperatureUnit,
    WeatherReport,
};
pub use provider::{FetchError, WeatherProvider, fetch_report, provider_from_config};
pub use state::{AppState, Session, UserMessage};
