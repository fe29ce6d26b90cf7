use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::{
    error::WeatherError,
    model::{CurrentConditions, Forecast, ForecastEntry, ForecastLocation, Units},
    transport::{HttpTransport, ReqwestTransport, TransportError},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// The forecast endpoint reports every 3 hours; 8 entries make a day.
const ENTRIES_PER_DAY: usize = 8;

/// Client for the two OpenWeatherMap endpoints we use.
///
/// Each call issues exactly one request through the transport and either
/// returns a fully validated record or a [`WeatherError`]. Nothing is printed
/// here; reporting is left to the caller.
#[derive(Clone)]
pub struct OpenWeatherClient<T = ReqwestTransport> {
    api_key: String,
    base_url: String,
    transport: T,
}

impl OpenWeatherClient<ReqwestTransport> {
    pub fn new(api_key: String) -> Self {
        Self::with_transport(api_key, ReqwestTransport::new())
    }
}

impl<T: HttpTransport> OpenWeatherClient<T> {
    pub fn with_transport(api_key: String, transport: T) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            transport,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_current(
        &self,
        city: &str,
        units: Units,
    ) -> Result<CurrentConditions, WeatherError> {
        let body = self.request("weather", city, units).await?;
        let current = parse_current(&body)?;

        info!(city = %current.city, temp = current.temperature, "Current conditions mapped");
        Ok(current)
    }

    pub async fn fetch_forecast(&self, city: &str, units: Units) -> Result<Forecast, WeatherError> {
        let body = self.request("forecast", city, units).await?;
        let forecast = parse_forecast(&body)?;

        info!(city = %city, days = forecast.len(), "Forecast mapped");
        Ok(forecast)
    }

    async fn request(&self, endpoint: &str, city: &str, units: Units) -> Result<String, WeatherError> {
        let location = city;
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::NotFound { location: location.to_string() });
        }

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        Url::parse(&url).map_err(|e| {
            WeatherError::InvalidConfiguration(format!("base URL '{}' is not valid: {e}", self.base_url))
        })?;
        debug!(url = %url, city = %city, units = %units, "Requesting OpenWeather");

        let res = self
            .transport
            .get(
                &url,
                &[
                    ("q", city),
                    ("appid", self.api_key.as_str()),
                    ("units", units.as_str()),
                ],
            )
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenWeather request failed");
                match e {
                    TransportError::Connect(message) => WeatherError::Connectivity(message),
                    TransportError::InvalidRequest(message) => {
                        WeatherError::InvalidConfiguration(message)
                    }
                    // A status arrived, so an error status still wins over the unreadable body.
                    TransportError::Body { status, message } if !(200..300).contains(&status) => {
                        classify_status(status, &message, city)
                    }
                    TransportError::Body { message, .. } => WeatherError::MalformedResponse(message),
                }
            })?;

        debug!(status = res.status, "Received OpenWeather response");

        if !res.is_success() {
            let err = classify_status(res.status, &res.body, city);
            warn!(status = res.status, error = %err, "OpenWeather returned an error status");
            return Err(err);
        }

        Ok(res.body)
    }
}

impl<T> fmt::Debug for OpenWeatherClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Map a non-2xx status to the matching error kind.
pub fn classify_status(status: u16, body: &str, location: &str) -> WeatherError {
    match status {
        401 => WeatherError::Authentication,
        404 => WeatherError::NotFound { location: location.to_string() },
        _ => WeatherError::Upstream { status, detail: error_detail(body) },
    }
}

/// Map a `/weather` body. Pure: the same input always yields the same record.
pub fn parse_current(body: &str) -> Result<CurrentConditions, WeatherError> {
    let raw: OwCurrentResponse = serde_json::from_str(body)?;

    let city = raw.name.trim().to_string();
    if city.is_empty() {
        return Err(WeatherError::malformed("location name is empty"));
    }

    let visibility = non_negative("visibility", raw.visibility)? / 1000.0;

    Ok(CurrentConditions {
        temperature: raw.main.temp,
        feels_like: raw.main.feels_like,
        humidity: humidity(raw.main.humidity)?,
        description: description(&raw.weather)?,
        wind_speed: non_negative("wind speed", raw.wind.speed)?,
        city,
        country: country(raw.sys.country)?,
        sunrise: timestamp("sunrise", raw.sys.sunrise)?,
        sunset: timestamp("sunset", raw.sys.sunset)?,
        pressure: raw
            .main
            .pressure
            .ok_or_else(|| WeatherError::malformed("missing field `main.pressure`"))?,
        visibility,
        timezone_offset_secs: timezone(raw.timezone)?,
    })
}

/// Map a `/forecast` body, keeping one entry per day.
pub fn parse_forecast(body: &str) -> Result<Forecast, WeatherError> {
    let raw: OwForecastResponse = serde_json::from_str(body)?;

    let entries = raw
        .list
        .iter()
        .step_by(ENTRIES_PER_DAY)
        .map(forecast_entry)
        .collect::<Result<Vec<_>, _>>()?;

    if entries.windows(2).any(|pair| pair[0].date >= pair[1].date) {
        return Err(WeatherError::malformed("forecast entries are not in chronological order"));
    }

    let location = raw
        .city
        .map(|city| -> Result<ForecastLocation, WeatherError> {
            Ok(ForecastLocation {
                name: city.name,
                country: country(city.country)?,
                timezone_offset_secs: timezone(city.timezone)?,
            })
        })
        .transpose()?;

    Ok(Forecast { location, entries })
}

fn forecast_entry(item: &OwForecastItem) -> Result<ForecastEntry, WeatherError> {
    Ok(ForecastEntry {
        date: timestamp("dt", item.dt)?,
        temperature: item.main.temp,
        feels_like: item.main.feels_like,
        humidity: humidity(item.main.humidity)?,
        description: description(&item.weather)?,
        wind_speed: non_negative("wind speed", item.wind.speed)?,
    })
}

fn humidity(raw: i64) -> Result<u8, WeatherError> {
    u8::try_from(raw)
        .ok()
        .filter(|h| *h <= 100)
        .ok_or_else(|| WeatherError::malformed(format!("humidity {raw} is outside 0..=100")))
}

fn non_negative(field: &str, value: f64) -> Result<f64, WeatherError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(WeatherError::malformed(format!("{field} must be non-negative, got {value}")))
    }
}

fn description(weather: &[OwWeather]) -> Result<String, WeatherError> {
    weather
        .first()
        .map(|w| w.description.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .ok_or_else(|| WeatherError::malformed("missing weather description"))
}

fn country(raw: Option<String>) -> Result<Option<String>, WeatherError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(code) if code.chars().count() == 2 => Ok(Some(code.to_string())),
        Some(code) => Err(WeatherError::malformed(format!(
            "country code '{code}' is not a 2-letter code"
        ))),
    }
}

fn timestamp(field: &str, secs: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| WeatherError::malformed(format!("{field} timestamp {secs} is out of range")))
}

fn timezone(secs: i32) -> Result<i32, WeatherError> {
    FixedOffset::east_opt(secs)
        .map(|_| secs)
        .ok_or_else(|| WeatherError::malformed(format!("timezone offset {secs}s is out of range")))
}

fn error_detail(body: &str) -> String {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| truncate_body(body))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: i64,
    pressure: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
    visibility: f64,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    country: Option<String>,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastItem {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    list: Vec<OwForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}
