use chrono::{DateTime, FixedOffset, Utc};
use colored::Colorize;
use owcast_core::{CurrentConditions, Forecast, Units, WeatherError};
use std::io::{self, Write};

/// Writes records, notices and errors to a terminal (or any writer).
pub struct Presenter<W: Write> {
    out: W,
}

impl Presenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Presenter<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn current(&mut self, weather: &CurrentConditions, units: Units) -> io::Result<()> {
        let temp = units.temperature_label();
        let offset = weather.local_offset();

        let location = match &weather.country {
            Some(country) => format!("{}, {}", weather.city, country),
            None => weather.city.clone(),
        };

        writeln!(self.out)?;
        writeln!(self.out, "{}", location.bold().cyan())?;
        writeln!(
            self.out,
            "{}",
            format!("{:.1}{temp}, feels like {:.1}{temp}", weather.temperature, weather.feels_like)
                .yellow()
        )?;
        writeln!(self.out, "{}", capitalize(&weather.description).bold())?;
        writeln!(self.out)?;

        let rows = [
            ("Humidity", format!("{}%", weather.humidity)),
            ("Wind", format!("{:.1} {}", weather.wind_speed, units.speed_label())),
            ("Visibility", format!("{:.1} km", weather.visibility)),
            ("Sunrise", local_time(weather.sunrise, offset, "%H:%M")),
            ("Sunset", local_time(weather.sunset, offset, "%H:%M")),
            ("Pressure", format!("{} hPa", weather.pressure)),
        ];

        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, value) in rows {
            writeln!(self.out, "  {}  {}", format!("{label:<width$}").cyan(), value.yellow())?;
        }

        Ok(())
    }

    pub fn forecast(&mut self, city: &str, forecast: &Forecast, units: Units) -> io::Result<()> {
        let name = match &forecast.location {
            Some(loc) => match &loc.country {
                Some(country) => format!("{}, {}", loc.name, country),
                None => loc.name.clone(),
            },
            None => city.to_string(),
        };

        writeln!(self.out)?;
        writeln!(self.out, "{}", format!("5-day forecast for {name}").bold().cyan())?;

        if forecast.is_empty() {
            writeln!(self.out, "{}", "No forecast data available.".dimmed())?;
            return Ok(());
        }

        let temp = units.temperature_label();
        let offset = forecast.local_offset();

        let header = ["Date", "Temp", "Feels like", "Humidity", "Wind", "Description"];
        let rows: Vec<[String; 6]> = forecast
            .entries
            .iter()
            .map(|entry| {
                [
                    local_time(entry.date, offset, "%Y-%m-%d"),
                    format!("{:.1}{temp}", entry.temperature),
                    format!("{:.1}{temp}", entry.feels_like),
                    format!("{}%", entry.humidity),
                    format!("{:.1} {}", entry.wind_speed, units.speed_label()),
                    capitalize(&entry.description),
                ]
            })
            .collect();

        let mut widths = header.map(|h| h.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let header_line = header
            .iter()
            .zip(widths)
            .map(|(h, w)| pad(h, w))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(self.out, "{}", header_line.bold())?;

        let rule = widths.iter().map(|w| "─".repeat(*w)).collect::<Vec<_>>().join("  ");
        writeln!(self.out, "{}", rule.dimmed())?;

        for row in rows {
            let [date, temperature, feels, humidity, wind, desc] = row;
            writeln!(
                self.out,
                "{}  {}  {}  {}  {}  {}",
                pad(&date, widths[0]).cyan(),
                pad(&temperature, widths[1]).yellow(),
                pad(&feels, widths[2]).yellow(),
                pad(&humidity, widths[3]).blue(),
                pad(&wind, widths[4]).green(),
                desc.magenta(),
            )?;
        }

        Ok(())
    }

    pub fn notice(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message.yellow())
    }

    pub fn success(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message.green())
    }

    pub fn weather_error(&mut self, err: &WeatherError) -> io::Result<()> {
        writeln!(self.out, "{}", format!("{}:", err.title()).bold().red())?;
        writeln!(self.out, "  {}", err.to_string().red())
    }

    pub fn error(&mut self, err: &anyhow::Error) -> io::Result<()> {
        writeln!(self.out, "{} {}", "Error:".bold().red(), format!("{err:#}").red())
    }
}

/// Print `err` to stderr and return the process exit status for it.
pub fn report_error(err: &anyhow::Error) -> u8 {
    let mut presenter = Presenter::stderr();

    let (written, code) = match err.downcast_ref::<WeatherError>() {
        Some(weather) => (presenter.weather_error(weather), weather.exit_code()),
        None => (presenter.error(err), 1),
    };

    if written.is_err() {
        eprintln!("Error: {err:#}");
    }
    code
}

fn local_time(at: DateTime<Utc>, offset: FixedOffset, format: &str) -> String {
    at.with_timezone(&offset).format(format).to_string()
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
