use thiserror::Error;

/// Failure modes of a single upstream call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    #[error("Could not connect to the weather service: {0}")]
    Connectivity(String),

    #[error("Invalid API key. Check the configured OpenWeatherMap key.")]
    Authentication,

    #[error("Location not recognized: '{location}'")]
    NotFound { location: String },

    #[error("Weather service returned HTTP {status}: {detail}")]
    Upstream { status: u16, detail: String },

    #[error("Unexpected response from the weather service: {0}")]
    MalformedResponse(String),

    /// The request could not be built from the client settings (e.g. base URL).
    #[error("Invalid client configuration: {0}")]
    InvalidConfiguration(String),
}

impl WeatherError {
    /// Short heading used when the error is shown to a user.
    pub fn title(&self) -> &'static str {
        match self {
            WeatherError::Connectivity(_) => "Connection error",
            WeatherError::Authentication => "Authentication error",
            WeatherError::NotFound { .. } => "Lookup error",
            WeatherError::Upstream { .. } => "Upstream error",
            WeatherError::MalformedResponse(_) => "Response error",
            WeatherError::InvalidConfiguration(_) => "Configuration error",
        }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            WeatherError::Connectivity(_) => 3,
            WeatherError::Authentication => 4,
            WeatherError::NotFound { .. } => 5,
            WeatherError::Upstream { .. } => 6,
            WeatherError::MalformedResponse(_) => 7,
            WeatherError::InvalidConfiguration(_) => 1,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        WeatherError::MalformedResponse(reason.into())
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::MalformedResponse(err.to_string())
    }
}
