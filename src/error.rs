//! Error types for the rtofs-atlas crate.
use chrono::NaiveDate;

/// Error type for the crate.
#[derive(Clone, PartialEq, Debug, thiserror::Error)]
pub enum AtlasError {
    /// Bad or invalid input, e.g. a date that cannot be parsed or a latitude off the globe.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Neither the requested day nor the day before has a grid on the server.
    #[error("No RTOFS grid available for {date} or the day before.")]
    DataUnavailable {
        /// The date originally requested.
        date: NaiveDate,
    },
    /// The grid was announced as available but could not be opened or read.
    #[error("Unable to access RTOFS data: {0}")]
    DataAccess(String),
    /// The grid is loaded but the search window around the position holds no valid data.
    #[error("No data around ({lat:.6}, {lon:.6}).")]
    NoDataAtLocation {
        /// Query latitude.
        lat: f64,
        /// Query longitude.
        lon: f64,
    },
    /// The configuration could not be read or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AtlasError {
    /// True for failures that mean "no data available" rather than a malformed request. These
    /// are degraded to an empty result by `Rtofs::query`.
    pub fn is_no_data(&self) -> bool {
        match self {
            AtlasError::DataUnavailable { .. }
            | AtlasError::DataAccess(_)
            | AtlasError::NoDataAtLocation { .. } => true,
            AtlasError::InvalidInput(_) | AtlasError::Config(_) => false,
        }
    }
}

/// Shorthand for results.
pub type Result<T> = ::std::result::Result<T, AtlasError>;

impl From<reqwest::Error> for AtlasError {
    fn from(err: reqwest::Error) -> Self {
        AtlasError::DataAccess(err.to_string())
    }
}

impl From<std::io::Error> for AtlasError {
    fn from(err: std::io::Error) -> Self {
        AtlasError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for AtlasError {
    fn from(err: toml::de::Error) -> Self {
        AtlasError::Config(err.to_string())
    }
}
