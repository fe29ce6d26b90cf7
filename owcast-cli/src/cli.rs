use anyhow::{Context, anyhow};
use clap::{ArgAction, Parser, Subcommand, builder::NonEmptyStringValueParser};
use inquire::Password;
use owcast_core::{
    Config, CredentialStore, FileCredentialStore, OpenWeatherClient, Units,
    config::{API_KEY_ENV, CONFIG_PATH_ENV, env_api_key, env_base_url, resolve_api_key},
};
use std::{io::IsTerminal, path::PathBuf};
use tracing::debug;

use crate::render::Presenter;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "owcast", version, about = "Current weather and 5-day forecasts from OpenWeatherMap")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current weather for a city.
    Weather {
        /// City name, e.g. "Madrid" or "London,GB".
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        city: String,

        /// Unit system: metric, imperial or standard.
        #[arg(long, value_parser = parse_units)]
        units: Option<Units>,
    },

    /// Show a 5-day forecast for a city, one entry per day.
    Forecast {
        /// City name, e.g. "Madrid" or "London,GB".
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        city: String,

        /// Unit system: metric, imperial or standard.
        #[arg(long, value_parser = parse_units)]
        units: Option<Units>,
    },

    /// Store (or replace) the OpenWeatherMap API key.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => {
                let mut store = FileCredentialStore::from_default_location()?;
                let key = prompt_api_key()?;
                store.set(&key)?;
                Presenter::stdout().success(&format!(
                    "API key saved to {}",
                    store.path().display()
                ))?;
            }
            Command::Weather { city, units } => {
                let (client, units) = build_client(Settings::from_env(), units)?;
                let current = client.fetch_current(&city, units).await?;
                Presenter::stdout().current(&current, units)?;
            }
            Command::Forecast { city, units } => {
                let (client, units) = build_client(Settings::from_env(), units)?;
                let forecast = client.fetch_forecast(&city, units).await?;
                Presenter::stdout().forecast(&city, &forecast, units)?;
            }
        }

        Ok(())
    }
}

fn parse_units(value: &str) -> Result<Units, String> {
    value.parse().map_err(|e: anyhow::Error| e.to_string())
}

/// Inputs read from the environment before a lookup command runs.
struct Settings {
    /// The config file location may be unknown (no home directory).
    config_path: anyhow::Result<PathBuf>,
    env_api_key: Option<String>,
    env_base_url: Option<String>,
}

impl Settings {
    fn from_env() -> Self {
        Self {
            config_path: Config::config_file_path(),
            env_api_key: env_api_key(),
            env_base_url: env_base_url(),
        }
    }
}

fn build_client(
    settings: Settings,
    units: Option<Units>,
) -> anyhow::Result<(OpenWeatherClient, Units)> {
    let (config, api_key) = match (settings.config_path, settings.env_api_key) {
        (Ok(path), env_key) => {
            let config = Config::load_from(&path)?;
            let mut store = FileCredentialStore::new(path);
            let api_key = ensure_api_key(env_key, &mut store)?;
            (config, api_key)
        }
        (Err(err), Some(api_key)) => {
            debug!(error = %err, "No config file location; using environment settings only");
            (Config::default(), api_key)
        }
        (Err(err), None) => {
            return Err(err.context(format!(
                "No OpenWeatherMap API key available. Set {API_KEY_ENV} or {CONFIG_PATH_ENV}."
            )));
        }
    };

    let mut client = OpenWeatherClient::new(api_key);
    if let Some(base_url) = config.resolved_base_url(settings.env_base_url) {
        client = client.with_base_url(base_url);
    }
    let units = units.unwrap_or_else(|| config.units());

    debug!(base_url = client.base_url(), units = units.as_str(), "Client configured");
    Ok((client, units))
}

/// Return the environment or stored key, prompting for (and saving) one on first use.
fn ensure_api_key(
    env_key: Option<String>,
    store: &mut dyn CredentialStore,
) -> anyhow::Result<String> {
    if let Some(key) = resolve_api_key(env_key, &*store)? {
        return Ok(key);
    }

    if !std::io::stdin().is_terminal() {
        return Err(anyhow!(
            "No OpenWeatherMap API key configured.\n\
             Hint: run `owcast configure` or set {API_KEY_ENV}."
        ));
    }

    let mut presenter = Presenter::stdout();
    presenter.notice("No API key found. Let's set it up!")?;

    let key = prompt_api_key()?;
    store.set(&key)?;
    presenter.success("API key saved successfully!")?;

    Ok(key)
}

fn prompt_api_key() -> anyhow::Result<String> {
    let key = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_help_message("Get one at https://home.openweathermap.org/api_keys")
        .prompt()
        .context("Failed to read API key")?;

    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }
    Ok(key)
}
