//! Core library for the `owcast` CLI.
//!
//! This crate defines:
//! - Configuration & credential storage
//! - The HTTP transport seam and its reqwest implementation
//! - The OpenWeatherMap response mapper and its error taxonomy
//! - Shared domain models (current conditions, forecasts, units)
//!
//! It is used by `owcast-cli`, but the mapper has no terminal side effects and
//! can be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod openweather;
pub mod transport;

pub use config::{Config, CredentialStore, FileCredentialStore};
pub use error::WeatherError;
pub use model::{CurrentConditions, Forecast, ForecastEntry, ForecastLocation, Units};
pub use openweather::OpenWeatherClient;
pub use transport::{HttpTransport, RawResponse, ReqwestTransport, TransportError};
