//! Configuration of the RTOFS atlas: where the data lives and how it is searched.
//!
//! Defaults point at the NOAA NOMADS server. A TOML file may override any subset of the fields:
//!
//! ```toml
//! search_window = 7
//! http_timeout_secs = 60
//! opendap_temp_url = "https://mirror.example.org/dods/rtofs/rtofs_global{date}/rtofs_glo_3dz_nowcast_daily_temp"
//! ```
//!
//! URL templates contain a `{date}` placeholder that is replaced by the date as `YYYYMMDD`.

use crate::error::{AtlasError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::{path::Path, time::Duration};

/// Placeholder in URL templates.
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Runtime configuration of an [`Rtofs`](crate::Rtofs) atlas.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Existence check for the temperature file of a forecast run.
    pub check_temp_url: String,
    /// Existence check for the salinity file of a forecast run.
    pub check_sal_url: String,
    /// OPeNDAP dataset with the temperature cube.
    pub opendap_temp_url: String,
    /// OPeNDAP dataset with the salinity cube.
    pub opendap_sal_url: String,
    /// Name of the temperature variable in the dataset.
    pub temperature_var: String,
    /// Name of the salinity variable in the dataset.
    pub salinity_var: String,
    /// Width of the square search window, in grid nodes. Must be odd.
    pub search_window: usize,
    /// Reference pressure of the potential temperatures in the grid (sigma-2).
    pub reference_pressure_dbar: f64,
    /// Index into the time dimension. The daily files usually hold 3 one-day steps.
    pub day_index: usize,
    /// Timeout for every HTTP request.
    pub http_timeout_secs: u64,
    /// Disable progress reporting, for headless use.
    pub server_mode: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        AtlasConfig {
            check_temp_url: "https://nomads.ncep.noaa.gov/pub/data/nccf/com/rtofs/prod/\
                             rtofs.{date}/rtofs_glo_3dz_n024_daily_3ztio.nc"
                .to_owned(),
            check_sal_url: "https://nomads.ncep.noaa.gov/pub/data/nccf/com/rtofs/prod/\
                            rtofs.{date}/rtofs_glo_3dz_n024_daily_3zsio.nc"
                .to_owned(),
            opendap_temp_url: "https://nomads.ncep.noaa.gov/dods/rtofs/\
                               rtofs_global{date}/rtofs_glo_3dz_nowcast_daily_temp"
                .to_owned(),
            opendap_sal_url: "https://nomads.ncep.noaa.gov/dods/rtofs/\
                              rtofs_global{date}/rtofs_glo_3dz_nowcast_daily_salt"
                .to_owned(),
            temperature_var: "temperature".to_owned(),
            salinity_var: "salinity".to_owned(),
            search_window: 5,
            reference_pressure_dbar: 2000.0,
            day_index: 2,
            http_timeout_secs: 120,
            server_mode: false,
        }
    }
}

impl AtlasConfig {
    /// Parse a configuration from TOML text. Missing fields take their default value.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AtlasConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|err| {
            AtlasError::Config(format!("reading {}: {}", path.as_ref().display(), err))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the values that the locator and the HTTP client rely on.
    pub fn validate(&self) -> Result<()> {
        if self.search_window == 0 || self.search_window % 2 == 0 {
            return Err(AtlasError::Config(format!(
                "search_window must be a positive odd number, got {}",
                self.search_window
            )));
        }
        if self.http_timeout_secs == 0 {
            return Err(AtlasError::Config("http_timeout_secs must be positive".to_owned()));
        }
        if !self.reference_pressure_dbar.is_finite() || self.reference_pressure_dbar < 0.0 {
            return Err(AtlasError::Config(format!(
                "invalid reference pressure {}",
                self.reference_pressure_dbar
            )));
        }
        for template in &[
            &self.check_temp_url,
            &self.check_sal_url,
            &self.opendap_temp_url,
            &self.opendap_sal_url,
        ] {
            if !template.contains(DATE_PLACEHOLDER) {
                return Err(AtlasError::Config(format!(
                    "url template without {} placeholder: {}",
                    DATE_PLACEHOLDER, template
                )));
            }
        }
        Ok(())
    }

    /// Half width of the search window.
    #[inline]
    pub fn search_half_window(&self) -> usize {
        self.search_window / 2
    }

    /// Timeout for HTTP requests.
    #[inline]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// The (temperature, salinity) existence check URLs for a date.
    pub fn check_urls(&self, date: NaiveDate) -> (String, String) {
        (
            expand_template(&self.check_temp_url, date),
            expand_template(&self.check_sal_url, date),
        )
    }

    /// The (temperature, salinity) OPeNDAP dataset URLs for a date.
    pub fn opendap_urls(&self, date: NaiveDate) -> (String, String) {
        (
            expand_template(&self.opendap_temp_url, date),
            expand_template(&self.opendap_sal_url, date),
        )
    }
}

fn expand_template(template: &str, date: NaiveDate) -> String {
    template.replace(DATE_PLACEHOLDER, &date.format("%Y%m%d").to_string())
}
