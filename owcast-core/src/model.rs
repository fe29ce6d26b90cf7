use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Unit system sent upstream as the `units` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial, Units::Standard]
    }

    pub fn temperature_label(&self) -> &'static str {
        temperature_label(self.as_str())
    }

    pub fn speed_label(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric | Units::Standard => "m/s",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "standard" => Ok(Units::Standard),
            _ => Err(anyhow::anyhow!(
                "Unknown units '{value}'. Supported units: metric, imperial, standard."
            )),
        }
    }
}

/// Temperature label for a raw unit-system name. Anything other than
/// `metric` or `imperial` is reported in Kelvin, as upstream does.
pub fn temperature_label(units: &str) -> &'static str {
    match units {
        "metric" => "°C",
        "imperial" => "°F",
        _ => "K",
    }
}

/// Current conditions for a single location.
///
/// Numeric values are in whatever unit system was requested; the record itself
/// carries no labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub description: String,
    pub wind_speed: f64,
    pub city: String,
    pub country: Option<String>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    /// hPa
    pub pressure: u32,
    /// Kilometers.
    pub visibility: f64,
    pub timezone_offset_secs: i32,
}

impl CurrentConditions {
    /// UTC shift of the observed location.
    pub fn local_offset(&self) -> FixedOffset {
        offset_or_utc(self.timezone_offset_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub date: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub description: String,
    pub wind_speed: f64,
}

/// Location block reported alongside a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastLocation {
    pub name: String,
    pub country: Option<String>,
    pub timezone_offset_secs: i32,
}

/// One entry per day, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub location: Option<ForecastLocation>,
    pub entries: Vec<ForecastEntry>,
}

impl Forecast {
    pub fn local_offset(&self) -> FixedOffset {
        offset_or_utc(self.location.as_ref().map_or(0, |loc| loc.timezone_offset_secs))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn offset_or_utc(secs: i32) -> FixedOffset {
    FixedOffset::east_opt(secs).unwrap_or(Utc.fix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_as_str_roundtrip() {
        for units in Units::all() {
            let parsed: Units = units.as_str().parse().expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn units_parse_is_case_insensitive() {
        assert_eq!("Imperial".parse::<Units>().unwrap(), Units::Imperial);
        assert_eq!(" METRIC ".parse::<Units>().unwrap(), Units::Metric);
    }

    #[test]
    fn unknown_units_error() {
        let err = "kelvinish".parse::<Units>().unwrap_err();
        assert!(err.to_string().contains("Unknown units"));
    }

    #[test]
    fn temperature_labels() {
        assert_eq!(Units::Metric.temperature_label(), "°C");
        assert_eq!(Units::Imperial.temperature_label(), "°F");
        assert_eq!(Units::Standard.temperature_label(), "K");
        assert_eq!(temperature_label("anything-else"), "K");
        assert_eq!(temperature_label(""), "K");
    }

    #[test]
    fn speed_labels() {
        assert_eq!(Units::Metric.speed_label(), "m/s");
        assert_eq!(Units::Imperial.speed_label(), "mph");
        assert_eq!(Units::Standard.speed_label(), "m/s");
    }

    #[test]
    fn forecast_offset_defaults_to_utc() {
        let forecast = Forecast { location: None, entries: Vec::new() };
        assert_eq!(forecast.local_offset().local_minus_utc(), 0);
        assert!(forecast.is_empty());
    }
}
