//! The RTOFS atlas: load a daily run, then answer position queries with synthetic profiles.

use crate::{
    config::AtlasConfig,
    error::{AtlasError, Result},
    grid::{GridProvider, OpendapProvider},
    locator::nearest_nodes,
    oceanography::Decibars,
    profile::build_profiles,
    progress::{NoProgress, ProgressReporter},
    session::GridCache,
    ssp::ProfileList,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use tracing::{debug, error, info};

/// Short name of the atlas.
pub const NAME: &str = "RTOFS";
/// Description of the atlas.
pub const DESCRIPTION: &str = "Global Real-Time Ocean Forecast System";

/// Synthetic sound speed profiles from the Global Real-Time Ocean Forecast System.
///
/// The atlas keeps at most one daily run loaded. Querying a date other than the loaded one
/// replaces it.
///
/// ```rust,no_run
/// use rtofs_atlas::{AtlasConfig, Rtofs};
/// use chrono::NaiveDate;
///
/// let mut rtofs = Rtofs::new(AtlasConfig::default())?;
/// let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
///
/// match rtofs.query(43.0, -70.0, date)? {
///     Some(profiles) => println!("{} profile(s)", profiles.len()),
///     None => println!("no data"),
/// }
/// # Ok::<(), rtofs_atlas::AtlasError>(())
/// ```
pub struct Rtofs<P: GridProvider = OpendapProvider> {
    config: AtlasConfig,
    cache: GridCache<P>,
    progress: Box<dyn ProgressReporter>,
}

impl Rtofs<OpendapProvider> {
    /// Create an atlas reading from the OPeNDAP server described by `config`.
    pub fn new(config: AtlasConfig) -> Result<Self> {
        config.validate()?;
        let provider = OpendapProvider::new(&config)?;
        Self::with_provider(config, provider)
    }
}

impl<P: GridProvider> Rtofs<P> {
    /// Create an atlas reading from any grid provider.
    pub fn with_provider(config: AtlasConfig, provider: P) -> Result<Self> {
        config.validate()?;
        let cache = GridCache::new(provider, config.day_index);

        Ok(Rtofs {
            config,
            cache,
            progress: Box::new(NoProgress),
        })
    }

    /// Builder method for the progress reporter.
    pub fn with_progress<R: ProgressReporter + 'static>(self, progress: R) -> Self {
        Rtofs {
            progress: Box::new(progress),
            ..self
        }
    }

    /// Short name of the atlas.
    #[inline]
    pub fn name(&self) -> &'static str {
        NAME
    }

    /// Description of the atlas.
    #[inline]
    pub fn desc(&self) -> &'static str {
        DESCRIPTION
    }

    /// The configuration in use.
    #[inline]
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// The grid provider.
    #[inline]
    pub fn provider(&self) -> &P {
        self.cache.provider()
    }

    /// True if a run is loaded.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.cache.is_loaded()
    }

    /// Date of the loaded run, `None` if nothing is loaded.
    #[inline]
    pub fn last_loaded_day(&self) -> Option<NaiveDate> {
        self.cache.loaded_date()
    }

    /// Drop the loaded run.
    pub fn clear_data(&mut self) {
        self.cache.clear();
    }

    /// Load the run for `date`, or for the day before when `date` is not out yet. Returns the
    /// date of the loaded run.
    pub fn download(&mut self, date: NaiveDate) -> Result<NaiveDate> {
        self.cache
            .ensure_loaded(date, self.progress.as_mut(), self.config.server_mode)
    }

    /// Build the profile at a position for the run of `date`.
    ///
    /// Fails with `InvalidInput` for a position off the globe, and with the reason of the
    /// failure when no profile can be built.
    pub fn try_query(&mut self, lat: f64, lon: f64, date: NaiveDate) -> Result<ProfileList> {
        debug!("query: {} @ ({:.6}, {:.6})", date, lon, lat);
        check_position(lat, lon).map_err(|err| {
            error!("invalid query: {} @ ({:.6}, {:.6})", date.format("%Y%m%d"), lon, lat);
            err
        })?;

        self.download(date).map_err(|err| {
            error!(
                "troubles in updating data set for timestamp: {}",
                date.format("%Y%m%d")
            );
            err
        })?;

        self.progress
            .start("Retrieve RTOFS data", self.config.server_mode);
        let result = self.locate_and_build(lat, lon, date);
        self.progress.end();

        result
    }

    fn locate_and_build(&mut self, lat: f64, lon: f64, date: NaiveDate) -> Result<ProfileList> {
        let session = self
            .cache
            .session()
            .ok_or_else(|| AtlasError::DataAccess("no grid loaded".to_owned()))?;

        let located = nearest_nodes(
            session,
            lat,
            lon,
            self.config.search_half_window(),
            self.progress.as_mut(),
        )?;

        let profiles = build_profiles(
            &located,
            lat,
            date,
            Decibars(self.config.reference_pressure_dbar),
        )?;
        self.progress.update(90);

        Ok(profiles)
    }

    /// Build the profile at a position for the run of `date`.
    ///
    /// `Ok(None)` means no data is available: the run is not out, the server cannot be
    /// reached, or there is no ocean data around the position. Only invalid input is an error.
    pub fn query(&mut self, lat: f64, lon: f64, date: NaiveDate) -> Result<Option<ProfileList>> {
        match self.try_query(lat, lon, date) {
            Ok(profiles) => Ok(Some(profiles)),
            Err(err) if err.is_no_data() => {
                info!("{}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Same as `query` for the current UTC date.
    pub fn query_now(&mut self, lat: f64, lon: f64) -> Result<Option<ProfileList>> {
        let today = Utc::now().naive_utc().date();
        self.query(lat, lon, today)
    }
}

fn check_position(lat: f64, lon: f64) -> Result<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(AtlasError::InvalidInput(format!("latitude {} out of range", lat)));
    }
    if !lon.is_finite() || !(-180.0..=360.0).contains(&lon) {
        return Err(AtlasError::InvalidInput(format!("longitude {} out of range", lon)));
    }
    Ok(())
}

impl<P: GridProvider> fmt::Display for Rtofs<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<{}: {}>", self.name(), self.desc())?;
        writeln!(f, "  <has data loaded: {}>", self.is_present())?;
        match self.last_loaded_day() {
            Some(day) => writeln!(f, "  <last loaded day: {}>", day.format("%d/%m/%Y")),
            None => writeln!(f, "  <last loaded day: none>"),
        }
    }
}

/// Parse a query date given as `YYYY-MM-DD`, `YYYYMMDD` or an RFC 3339 timestamp. Timestamps
/// are converted to UTC before taking the date.
///
/// # Examples
///
/// ```rust
/// use rtofs_atlas::parse_query_date;
/// use chrono::NaiveDate;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
/// assert_eq!(parse_query_date("2024-05-10").unwrap(), expected);
/// assert_eq!(parse_query_date("20240510").unwrap(), expected);
/// assert_eq!(parse_query_date("2024-05-10T22:30:00-04:00").unwrap(), expected.succ_opt().unwrap());
/// assert!(parse_query_date("yesterday").is_err());
/// ```
pub fn parse_query_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y%m%d") {
            return Ok(date);
        }
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(timestamp.with_timezone(&Utc).naive_utc().date());
    }

    Err(AtlasError::InvalidInput(format!("invalid date passed: {:?}", text)))
}
