use std::fmt;

use chrono::{DateTime, TimeZone};
use skycast_core::{
    AppState, DailySummary, WeatherReport, daily_summaries,
    model::{Condition, ConditionKind, TemperatureUnit},
};

pub fn icon(kind: ConditionKind) -> &'static str {
    match kind {
        ConditionKind::Clear => "☀",
        ConditionKind::Clouds => "☁",
        ConditionKind::Rain => "🌧",
        ConditionKind::Snow => "❄",
        ConditionKind::Thunderstorm => "⛈",
        ConditionKind::Drizzle => "🌦",
        ConditionKind::Other => "💧",
    }
}

fn condition_icon(condition: Option<&Condition>) -> &'static str {
    icon(condition.map_or(ConditionKind::Other, Condition::kind))
}

fn degrees(value: f64, unit: TemperatureUnit) -> String {
    format!("{}{}", value.round() as i64, unit.symbol())
}

fn clock<Tz: TimeZone>(ts: Option<DateTime<chrono::Utc>>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    ts.map(|t| t.with_timezone(tz).format("%I:%M %p").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Renders whatever the state currently holds.
pub fn render_state<Tz: TimeZone>(state: &AppState, now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    if let Some(message) = state.error {
        return format!("{message}\n");
    }

    match &state.report {
        Some(report) => render_report(report, now),
        None => String::new(),
    }
}

pub fn render_report<Tz: TimeZone>(report: &WeatherReport, now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    ReportView { report, now }.to_string()
}

struct ReportView<'a, Tz: TimeZone> {
    report: &'a WeatherReport,
    now: &'a DateTime<Tz>,
}

impl<Tz: TimeZone> fmt::Display for ReportView<'_, Tz>
where
    Tz::Offset: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = &self.report.current;
        let unit = self.report.unit;
        let tz = self.now.timezone();
        let condition = current.primary_condition();

        if current.sys.country.is_empty() {
            writeln!(f, "{}", current.name)?;
        } else {
            writeln!(f, "{}, {}", current.name, current.sys.country)?;
        }
        writeln!(
            f,
            "{}  {}  {}",
            condition_icon(condition),
            degrees(current.main.temp, unit),
            condition.map_or("", |c| c.description.as_str()),
        )?;
        writeln!(f)?;
        writeln!(f, "  Feels like   {}", degrees(current.main.feels_like, unit))?;
        writeln!(f, "  Humidity     {}%", current.main.humidity)?;
        writeln!(
            f,
            "  Wind         {} {} {}",
            current.wind.speed.round() as i64,
            unit.speed_unit(),
            current.wind.compass_point(),
        )?;
        writeln!(f, "  Visibility   {:.1} km", current.visibility_km())?;
        writeln!(
            f,
            "  Min / Max    {} / {}{}",
            current.main.temp_min.floor() as i64,
            current.main.temp_max.ceil() as i64,
            unit.symbol(),
        )?;
        writeln!(f, "  Sunrise      {}", clock(current.sunrise_at(), &tz))?;
        writeln!(f, "  Sunset       {}", clock(current.sunset_at(), &tz))?;

        for alert in &current.alerts {
            writeln!(f)?;
            writeln!(f, "⚠ {}", alert.event)?;
            if !alert.description.is_empty() {
                writeln!(f, "  {}", alert.description)?;
            }
        }

        let days = daily_summaries(&self.report.forecast.list, self.now);
        if !days.is_empty() {
            writeln!(f)?;
            writeln!(f, "5-Day Forecast")?;
            for day in &days {
                write_day(f, day, unit)?;
            }
        }

        Ok(())
    }
}

fn write_day(f: &mut fmt::Formatter<'_>, day: &DailySummary<'_>, unit: TemperatureUnit) -> fmt::Result {
    let sample = day.sample;
    writeln!(
        f,
        "  {:<10} {} {:>6}  💧{:>3}%  {} {}",
        day.weekday_name(),
        condition_icon(sample.primary_condition()),
        degrees(sample.main.temp, unit),
        sample.main.humidity,
        sample.wind.speed.round() as i64,
        unit.speed_unit(),
    )
}
