//! Device position lookup.
//!
//! A terminal has no location permission prompt, so the position comes from
//! configured home coordinates or an approximate lookup by public IP. A user
//! who turned IP lookup off is treated like one who denied the permission.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;

use crate::{Config, model::Coord};

pub const IP_API_URL: &str = "http://ip-api.com";

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    Unavailable,
    #[error("Location error: {0}")]
    Other(String),
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    /// One-shot position query.
    async fn locate(&self) -> Result<Coord, LocationError>;
}

/// Coordinates known ahead of time.
#[derive(Debug, Clone, Default)]
pub struct FixedLocator {
    coord: Option<Coord>,
}

impl FixedLocator {
    pub fn new(coord: Option<Coord>) -> Self {
        Self { coord }
    }
}

#[async_trait]
impl Geolocator for FixedLocator {
    async fn locate(&self) -> Result<Coord, LocationError> {
        self.coord.ok_or(LocationError::Unavailable)
    }
}

/// Approximate position of the public IP address, via ip-api.com.
#[derive(Debug, Clone)]
pub struct IpLocator {
    base_url: String,
    enabled: bool,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocator {
    pub fn new(enabled: bool) -> Self {
        Self::with_base_url(IP_API_URL, enabled)
    }

    pub fn with_base_url(base_url: &str, enabled: bool) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            enabled,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl Geolocator for IpLocator {
    async fn locate(&self) -> Result<Coord, LocationError> {
        if !self.enabled {
            return Err(LocationError::PermissionDenied);
        }

        let url = format!("{}/json", self.base_url);
        tracing::debug!(%url, "looking up position by IP");

        let res = self.http.get(&url).send().await.map_err(|err| {
            tracing::warn!(error = %err, "IP location request failed");
            LocationError::Unavailable
        })?;

        if !res.status().is_success() {
            return Err(LocationError::Other(format!(
                "IP location lookup failed with status {}",
                res.status()
            )));
        }

        let parsed: IpApiResponse = res
            .json()
            .await
            .map_err(|err| LocationError::Other(format!("Invalid IP location response: {err}")))?;

        match (parsed.status.as_str(), parsed.lat, parsed.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Coord { lat, lon }),
            _ => Err(LocationError::Other(
                parsed.message.unwrap_or_else(|| "IP location lookup failed".to_string()),
            )),
        }
    }
}

/// Fixed coordinates first, then IP lookup.
#[derive(Debug)]
pub struct ChainLocator {
    fixed: FixedLocator,
    fallback: IpLocator,
}

impl ChainLocator {
    pub fn new(fixed: FixedLocator, fallback: IpLocator) -> Self {
        Self { fixed, fallback }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(FixedLocator::new(config.location), IpLocator::new(!config.disable_ip_lookup))
    }
}

#[async_trait]
impl Geolocator for ChainLocator {
    async fn locate(&self) -> Result<Coord, LocationError> {
        match self.fixed.locate().await {
            Ok(coord) => Ok(coord),
            Err(_) => self.fallback.locate().await,
        }
    }
}
