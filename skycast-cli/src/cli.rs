use anyhow::{Context, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select, Text};
use skycast_core::{
    ChainLocator, Config, Coord, Geolocator, Session, TemperatureUnit,
    location::FixedLocator, provider_from_config,
};

use crate::render::render_state;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Current weather and 5-day forecast")]
pub struct Cli {
    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and preferences.
    Configure,

    /// Show current weather and the 5-day forecast once.
    Show {
        /// City name, e.g. "Paris" or "Springfield,US".
        city: Option<String>,

        /// Use the device location instead of a city.
        #[arg(long, conflicts_with_all = ["city", "lat", "lon"])]
        here: bool,

        /// Latitude in decimal degrees.
        #[arg(long, requires = "lon", conflicts_with = "city", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in decimal degrees.
        #[arg(long, requires = "lat", conflicts_with = "city", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// celsius or fahrenheit; defaults to the configured unit.
        #[arg(short, long)]
        unit: Option<TemperatureUnit>,
    },

    /// Search, locate and switch units in a prompt loop.
    Interactive {
        /// celsius or fahrenheit; defaults to the configured unit.
        #[arg(short, long)]
        unit: Option<TemperatureUnit>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::debug!(command = ?self.command, "running");

        match self.command {
            Command::Configure => configure(),
            Command::Show { city, here, lat, lon, unit } => {
                let config = Config::load()?;
                let unit = unit.unwrap_or(config.default_unit);

                let locator: Box<dyn Geolocator> = match (lat, lon) {
                    (Some(lat), Some(lon)) => Box::new(FixedLocator::new(Some(Coord { lat, lon }))),
                    _ => Box::new(ChainLocator::from_config(&config)),
                };
                let lookup = lookup_for(city, here, lat.is_some())?;
                let mut session = Session::new(provider_from_config(&config)?, locator, unit);

                show(&mut session, lookup).await?;
                print!("{}", render_state(session.state(), &Local::now()));
                Ok(())
            }
            Command::Interactive { unit } => {
                let config = Config::load()?;
                let unit = unit.unwrap_or(config.default_unit);
                let session = Session::new(
                    provider_from_config(&config)?,
                    Box::new(ChainLocator::from_config(&config)),
                    unit,
                );
                interactive(session).await
            }
        }
    }
}

/// What a one-shot `show` looks up.
#[derive(Debug, PartialEq)]
enum Lookup {
    City(String),
    Location,
}

fn lookup_for(city: Option<String>, here: bool, coordinates: bool) -> anyhow::Result<Lookup> {
    match city {
        Some(city) if !here => Ok(Lookup::City(city)),
        _ if here || coordinates => Ok(Lookup::Location),
        _ => bail!("Nothing to look up.\nHint: pass a city name, --here or --lat/--lon."),
    }
}

async fn show(session: &mut Session, lookup: Lookup) -> anyhow::Result<()> {
    match lookup {
        Lookup::City(city) => session.search(&city).await,
        Lookup::Location => session.use_location().await,
    }

    let state = session.state();
    if let Some(message) = state.error {
        tracing::warn!(%message, "lookup failed");
        bail!("{message}");
    }
    if state.report.is_none() {
        bail!("Nothing to look up: the city name is empty.");
    }

    Ok(())
}

const SEARCH: &str = "Search for a city";
const LOCATE: &str = "Use my location";
const QUIT: &str = "Quit";

async fn interactive(mut session: Session) -> anyhow::Result<()> {
    loop {
        let toggle = format!("Switch to {}", session.state().unit.toggled().symbol());
        let choice = Select::new("What next?", vec![SEARCH, LOCATE, toggle.as_str(), QUIT])
            .prompt()
            .context("Prompt cancelled")?;

        match choice {
            SEARCH => {
                let city = Text::new("City:")
                    .with_placeholder("Search for a city...")
                    .prompt()
                    .context("Prompt cancelled")?;
                session.search(&city).await;
            }
            LOCATE => session.use_location().await,
            QUIT => return Ok(()),
            _ => session.toggle_unit().await,
        }

        println!();
        print!("{}", render_state(session.state(), &Local::now()));
        println!();
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()
        .context("Prompt cancelled")?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    }

    let units = TemperatureUnit::all().to_vec();
    let start = units.iter().position(|u| *u == config.default_unit).unwrap_or(0);
    config.default_unit = Select::new("Default unit:", units)
        .with_starting_cursor(start)
        .prompt()
        .context("Prompt cancelled")?;

    let set_home = Confirm::new("Store fixed home coordinates for --here?")
        .with_default(config.location.is_some())
        .prompt()
        .context("Prompt cancelled")?;
    config.location = if set_home {
        let lat = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a decimal number")
            .prompt()
            .context("Prompt cancelled")?;
        let lon = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a decimal number")
            .prompt()
            .context("Prompt cancelled")?;
        Some(Coord { lat, lon })
    } else {
        None
    };

    config.disable_ip_lookup = !Confirm::new("Allow approximate location lookup by IP address?")
        .with_default(!config.disable_ip_lookup)
        .prompt()
        .context("Prompt cancelled")?;

    let path = config.save()?;
    tracing::debug!(path = %path.display(), "configuration saved");
    println!("Saved configuration to {}", path.display());
    Ok(())
}
