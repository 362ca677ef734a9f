use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// What a single lookup is keyed on.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates(Coord),
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::City(name) => f.write_str(name),
            LocationQuery::Coordinates(coord) => write!(f, "{coord}"),
        }
    }
}

/// Unit system requested from the provider. Values are never converted locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Provider `units` query parameter.
    pub fn units_param(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "metric",
            TemperatureUnit::Fahrenheit => "imperial",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// Wind speed unit the provider uses for this unit system.
    pub fn speed_unit(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "m/s",
            TemperatureUnit::Fahrenheit => "mph",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit]
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemperatureUnit {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "celsius" | "c" | "metric" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" | "imperial" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: celsius, fahrenheit."
            )),
        }
    }
}

/// One weather condition descriptor, e.g. `Rain` / `light rain`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    #[serde(default)]
    pub description: String,
}

impl Condition {
    pub fn kind(&self) -> ConditionKind {
        ConditionKind::from_main(&self.main)
    }
}

/// Coarse condition category, used to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Clear,
    Clouds,
    Rain,
    Snow,
    Thunderstorm,
    Drizzle,
    Other,
}

impl ConditionKind {
    pub fn from_main(main: &str) -> Self {
        match main.to_lowercase().as_str() {
            "clear" => Self::Clear,
            "clouds" => Self::Clouds,
            "rain" => Self::Rain,
            "snow" => Self::Snow,
            "thunderstorm" => Self::Thunderstorm,
            "drizzle" => Self::Drizzle,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentMain {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    /// Meteorological direction in degrees.
    #[serde(default)]
    pub deg: f64,
}

impl Wind {
    pub fn compass_point(&self) -> &'static str {
        compass_point(self.deg)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    #[serde(default)]
    pub country: String,
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub event: String,
    #[serde(default)]
    pub description: String,
    pub start: i64,
    pub end: i64,
}

/// Current conditions as returned by the provider's current-weather endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub coord: Coord,
    pub name: String,
    pub main: CurrentMain,
    pub weather: Vec<Condition>,
    pub wind: Wind,
    pub sys: Sys,
    /// Visibility in metres.
    #[serde(default)]
    pub visibility: u32,
    #[serde(default, alias = "alert")]
    pub alerts: Vec<Alert>,
}

impl CurrentWeather {
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn sunrise_at(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.sys.sunrise)
    }

    pub fn sunset_at(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.sys.sunset)
    }

    pub fn visibility_km(&self) -> f64 {
        f64::from(self.visibility) / 1000.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleWind {
    pub speed: f64,
}

/// One timestamped reading in a forecast payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub dt: i64,
    pub main: SampleMain,
    pub weather: Vec<Condition>,
    pub wind: SampleWind,
    /// Probability of precipitation, 0..1.
    #[serde(default)]
    pub pop: f64,
}

impl ForecastSample {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.dt)
    }

    pub fn primary_condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    pub name: String,
    #[serde(default)]
    pub country: String,
}

/// Time-ordered forecast samples, typically every three hours.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub list: Vec<ForecastSample>,
    #[serde(default)]
    pub city: Option<ForecastCity>,
}

/// Current conditions and forecast from one successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: CurrentWeather,
    pub forecast: ForecastPayload,
    pub unit: TemperatureUnit,
    pub query: LocationQuery,
}

/// Maps a bearing in degrees to one of eight compass points.
pub fn compass_point(deg: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let index = ((deg + 22.5) / 45.0).floor().rem_euclid(8.0) as usize;
    POINTS[index]
}

pub(crate) fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}
