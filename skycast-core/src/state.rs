//! Application state for one interactive lookup session.
//!
//! [`AppState`] only changes through [`AppState::apply`]. [`Session`] runs the
//! side effects (location lookup, the paired fetch) and feeds their outcome
//! back in as [`Event`]s, so a report is only committed once both payloads
//! are in hand.

use chrono::{DateTime, TimeZone};
use std::fmt;

use crate::{
    forecast::{DailySummary, daily_summaries},
    location::Geolocator,
    model::{Coord, LocationQuery, TemperatureUnit, WeatherReport},
    provider::{WeatherProvider, fetch_report},
};

/// The query most recently issued.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LastQuery {
    #[default]
    None,
    City(String),
    Coordinates(Coord),
}

impl LastQuery {
    pub fn to_query(&self) -> Option<LocationQuery> {
        match self {
            LastQuery::None => None,
            LastQuery::City(name) => Some(LocationQuery::City(name.clone())),
            LastQuery::Coordinates(coord) => Some(LocationQuery::Coordinates(*coord)),
        }
    }
}

impl From<&LocationQuery> for LastQuery {
    fn from(query: &LocationQuery) -> Self {
        match query {
            LocationQuery::City(name) => LastQuery::City(name.clone()),
            LocationQuery::Coordinates(coord) => LastQuery::Coordinates(*coord),
        }
    }
}

/// Messages shown to the user. Failures are not classified any further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMessage {
    FetchFailed,
    LocationUnavailable,
}

impl UserMessage {
    pub fn text(&self) -> &'static str {
        match self {
            UserMessage::FetchFailed => "Failed to fetch weather data. Please try again.",
            UserMessage::LocationUnavailable => {
                "Unable to get your location. Please allow location access or search for a city."
            }
        }
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    LocateStarted,
    FetchStarted(LocationQuery),
    FetchSucceeded(WeatherReport),
    FetchFailed,
    LocationFailed,
    UnitChanged(TemperatureUnit),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub unit: TemperatureUnit,
    pub last_query: LastQuery,
    pub report: Option<WeatherReport>,
    pub loading: bool,
    pub error: Option<UserMessage>,
}

impl AppState {
    pub fn new(unit: TemperatureUnit) -> Self {
        Self { unit, ..Self::default() }
    }

    pub fn apply(self, event: Event) -> Self {
        match event {
            Event::LocateStarted => Self { loading: true, error: None, ..self },
            Event::FetchStarted(query) => Self {
                last_query: LastQuery::from(&query),
                loading: true,
                error: None,
                ..self
            },
            Event::FetchSucceeded(report) => Self {
                report: Some(report),
                loading: false,
                error: None,
                ..self
            },
            Event::FetchFailed => Self {
                report: None,
                loading: false,
                error: Some(UserMessage::FetchFailed),
                ..self
            },
            Event::LocationFailed => Self {
                loading: false,
                error: Some(UserMessage::LocationUnavailable),
                ..self
            },
            Event::UnitChanged(unit) => Self { unit, ..self },
        }
    }

    /// Query to repeat after a unit change, if a report is on screen.
    pub fn refetch_query(&self) -> Option<LocationQuery> {
        let report = self.report.as_ref()?;
        self.last_query
            .to_query()
            .or_else(|| Some(LocationQuery::Coordinates(report.current.coord)))
    }

    pub fn daily_forecast<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<DailySummary<'_>> {
        self.report
            .as_ref()
            .map(|report| daily_summaries(&report.forecast.list, now))
            .unwrap_or_default()
    }
}

/// Drives [`AppState`] with a provider and a geolocator.
#[derive(Debug)]
pub struct Session {
    provider: Box<dyn WeatherProvider>,
    locator: Box<dyn Geolocator>,
    state: AppState,
}

impl Session {
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        locator: Box<dyn Geolocator>,
        unit: TemperatureUnit,
    ) -> Self {
        Self { provider, locator, state: AppState::new(unit) }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Looks up a city by name. Blank input is ignored.
    pub async fn search(&mut self, text: &str) {
        let city = text.trim();
        if city.is_empty() {
            tracing::debug!("ignoring empty search");
            return;
        }

        self.fetch(LocationQuery::City(city.to_string())).await;
    }

    /// Looks up the device position, then the weather there.
    pub async fn use_location(&mut self) {
        self.dispatch(Event::LocateStarted);

        match self.locator.locate().await {
            Ok(coord) => self.fetch(LocationQuery::Coordinates(coord)).await,
            Err(err) => {
                tracing::warn!(error = %err, "could not determine location");
                self.dispatch(Event::LocationFailed);
            }
        }
    }

    /// Switches the unit system, fetching again when a report is shown.
    pub async fn set_unit(&mut self, unit: TemperatureUnit) {
        if unit == self.state.unit {
            return;
        }

        self.dispatch(Event::UnitChanged(unit));

        if let Some(query) = self.state.refetch_query() {
            self.fetch(query).await;
        }
    }

    pub async fn toggle_unit(&mut self) {
        self.set_unit(self.state.unit.toggled()).await;
    }

    async fn fetch(&mut self, query: LocationQuery) {
        self.dispatch(Event::FetchStarted(query.clone()));

        let event = match fetch_report(self.provider.as_ref(), query, self.state.unit).await {
            Ok(report) => Event::FetchSucceeded(report),
            Err(_) => Event::FetchFailed,
        };

        self.dispatch(event);
    }

    fn dispatch(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::FixedLocator;
    use crate::model::{
        Condition, CurrentMain, CurrentWeather, ForecastPayload, ForecastSample, SampleMain,
        SampleWind, Sys, Wind,
    };
    use async_trait::async_trait;
    use chrono::{FixedOffset, Utc};
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<(&'static str, LocationQuery, TemperatureUnit)>>>;

    #[derive(Debug, Default)]
    struct FakeProvider {
        fail_current: bool,
        fail_forecast: bool,
        calls: Calls,
    }

    fn temp_for(unit: TemperatureUnit) -> f64 {
        match unit {
            TemperatureUnit::Celsius => 20.0,
            TemperatureUnit::Fahrenheit => 68.0,
        }
    }

    fn current(query: &LocationQuery, unit: TemperatureUnit) -> CurrentWeather {
        let temp = temp_for(unit);
        CurrentWeather {
            coord: Coord { lat: 48.85, lon: 2.35 },
            name: query.to_string(),
            main: CurrentMain { temp, feels_like: temp, temp_min: temp, temp_max: temp, humidity: 50 },
            weather: vec![Condition { main: "Clear".into(), description: "clear sky".into() }],
            wind: Wind { speed: 3.0, deg: 90.0 },
            sys: Sys { country: "FR".into(), sunrise: 0, sunset: 0 },
            visibility: 10_000,
            alerts: Vec::new(),
        }
    }

    fn forecast(unit: TemperatureUnit) -> ForecastPayload {
        let start = Utc::now().timestamp();
        let list = (0..40)
            .map(|i| ForecastSample {
                dt: start + i * 3 * 3600,
                main: SampleMain { temp: temp_for(unit), feels_like: temp_for(unit), humidity: 50 },
                weather: vec![Condition { main: "Rain".into(), description: String::new() }],
                wind: SampleWind { speed: 1.0 },
                pop: 0.3,
            })
            .collect();
        ForecastPayload { list, city: None }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn current(
            &self,
            query: &LocationQuery,
            unit: TemperatureUnit,
        ) -> anyhow::Result<CurrentWeather> {
            self.calls.lock().unwrap().push(("current", query.clone(), unit));
            if self.fail_current {
                anyhow::bail!("current unavailable");
            }
            Ok(current(query, unit))
        }

        async fn forecast(
            &self,
            query: &LocationQuery,
            unit: TemperatureUnit,
        ) -> anyhow::Result<ForecastPayload> {
            self.calls.lock().unwrap().push(("forecast", query.clone(), unit));
            if self.fail_forecast {
                anyhow::bail!("forecast unavailable");
            }
            Ok(forecast(unit))
        }
    }

    fn session(provider: FakeProvider, home: Option<Coord>) -> Session {
        Session::new(Box::new(provider), Box::new(FixedLocator::new(home)), TemperatureUnit::Celsius)
    }

    fn paris() -> LocationQuery {
        LocationQuery::City("Paris".into())
    }

    #[tokio::test]
    async fn search_commits_both_datasets() {
        let mut session = session(FakeProvider::default(), None);

        session.search("  Paris ").await;

        let state = session.state();
        let report = state.report.as_ref().unwrap();
        assert_eq!(report.current.name, "Paris");
        assert_eq!(report.forecast.list.len(), 40);
        assert_eq!(state.last_query, LastQuery::City("Paris".into()));
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn empty_search_is_ignored() {
        let provider = FakeProvider::default();
        let calls = provider.calls.clone();
        let mut session = session(provider, None);

        session.search("   ").await;

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(*session.state(), AppState::new(TemperatureUnit::Celsius));
    }

    #[tokio::test]
    async fn forecast_failure_clears_everything() {
        let mut session = session(FakeProvider::default(), None);
        session.search("Paris").await;
        assert!(session.state().report.is_some());

        session.provider = Box::new(FakeProvider { fail_forecast: true, ..Default::default() });
        session.search("Berlin").await;

        let state = session.state();
        assert!(state.report.is_none());
        assert_eq!(state.error, Some(UserMessage::FetchFailed));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn current_failure_clears_everything() {
        let mut session = session(FakeProvider { fail_current: true, ..Default::default() }, None);

        session.search("Paris").await;

        assert!(session.state().report.is_none());
        assert_eq!(session.state().error, Some(UserMessage::FetchFailed));
    }

    #[tokio::test]
    async fn unit_switch_refetches_last_city() {
        let provider = FakeProvider::default();
        let calls = provider.calls.clone();
        let mut session = session(provider, Some(Coord { lat: 10.0, lon: 10.0 }));
        session.search("Paris").await;
        calls.lock().unwrap().clear();

        session.set_unit(TemperatureUnit::Fahrenheit).await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, q, u)| *q == paris() && *u == TemperatureUnit::Fahrenheit));

        let report = session.state().report.as_ref().unwrap();
        assert_eq!(report.unit, TemperatureUnit::Fahrenheit);
        assert_eq!(report.current.main.temp, 68.0);
        assert!(report.forecast.list.iter().all(|s| s.main.temp == 68.0));
    }

    #[tokio::test]
    async fn unit_switch_after_location_then_city_refetches_city() {
        let home = Coord { lat: 52.52, lon: 13.4 };
        let provider = FakeProvider::default();
        let calls = provider.calls.clone();
        let mut session = session(provider, Some(home));
        session.use_location().await;
        session.search("Paris").await;
        calls.lock().unwrap().clear();

        session.toggle_unit().await;

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                ("current", paris(), TemperatureUnit::Fahrenheit),
                ("forecast", paris(), TemperatureUnit::Fahrenheit),
            ]
        );
        assert_eq!(session.state().report.as_ref().unwrap().current.main.temp, 68.0);
    }

    #[tokio::test]
    async fn unit_switch_after_city_then_location_refetches_coordinates() {
        let home = Coord { lat: 52.52, lon: 13.4 };
        let provider = FakeProvider::default();
        let calls = provider.calls.clone();
        let mut session = session(provider, Some(home));
        session.search("Paris").await;
        session.use_location().await;
        calls.lock().unwrap().clear();

        session.toggle_unit().await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, q, u)| {
            *q == LocationQuery::Coordinates(home) && *u == TemperatureUnit::Fahrenheit
        }));
    }

    #[tokio::test]
    async fn unit_switch_after_location_uses_coordinates() {
        let home = Coord { lat: 52.52, lon: 13.4 };
        let provider = FakeProvider::default();
        let calls = provider.calls.clone();
        let mut session = session(provider, Some(home));
        session.use_location().await;
        calls.lock().unwrap().clear();

        session.toggle_unit().await;

        let calls = calls.lock().unwrap();
        assert!(calls.iter().all(|(_, q, _)| *q == LocationQuery::Coordinates(home)));
        assert_eq!(session.state().unit, TemperatureUnit::Fahrenheit);
    }

    #[tokio::test]
    async fn unit_switch_without_report_only_stores_unit() {
        let provider = FakeProvider::default();
        let calls = provider.calls.clone();
        let mut session = session(provider, None);

        session.set_unit(TemperatureUnit::Fahrenheit).await;

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(session.state().unit, TemperatureUnit::Fahrenheit);
    }

    #[tokio::test]
    async fn same_unit_is_a_no_op() {
        let provider = FakeProvider::default();
        let calls = provider.calls.clone();
        let mut session = session(provider, None);
        session.search("Paris").await;
        calls.lock().unwrap().clear();

        session.set_unit(TemperatureUnit::Celsius).await;

        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_location_sets_distinct_message_without_fetching() {
        let provider = FakeProvider::default();
        let calls = provider.calls.clone();
        let mut session = session(provider, None);

        session.use_location().await;

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(session.state().error, Some(UserMessage::LocationUnavailable));
        assert!(!session.state().loading);
    }

    #[test]
    fn fetch_started_records_query_and_clears_error() {
        let state = AppState::new(TemperatureUnit::Celsius)
            .apply(Event::FetchFailed)
            .apply(Event::FetchStarted(paris()));

        assert!(state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.last_query, LastQuery::City("Paris".into()));
    }

    #[test]
    fn refetch_falls_back_to_report_coordinates() {
        let report = WeatherReport {
            current: current(&paris(), TemperatureUnit::Celsius),
            forecast: ForecastPayload::default(),
            unit: TemperatureUnit::Celsius,
            query: paris(),
        };
        let state = AppState::new(TemperatureUnit::Celsius).apply(Event::FetchSucceeded(report));

        assert_eq!(
            state.refetch_query(),
            Some(LocationQuery::Coordinates(Coord { lat: 48.85, lon: 2.35 }))
        );
    }

    #[tokio::test]
    async fn daily_forecast_comes_from_the_report() {
        let mut session = session(FakeProvider::default(), None);
        let now = Utc::now().with_timezone(&FixedOffset::east_opt(0).unwrap());
        assert!(session.state().daily_forecast(&now).is_empty());

        session.search("Paris").await;

        let days = session.state().daily_forecast(&now);
        assert!(!days.is_empty());
        assert!(days.len() <= 5);
        assert!(days.iter().all(|d| d.date > now.date_naive()));
    }
}
