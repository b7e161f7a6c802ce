//! The currently loaded forecast run and the cache deciding when to load another.

use crate::{
    error::{AtlasError, Result},
    grid::{Availability, GridField, GridProvider, GridVariable},
    progress::ProgressReporter,
    utility::longitude_east_of,
};
use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};

/// Origin and spacing of a regular latitude/longitude grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// Latitude of the first row.
    pub lat_origin: f64,
    /// Latitude spacing between rows.
    pub lat_step: f64,
    /// Longitude of the first column.
    pub lon_origin: f64,
    /// Longitude spacing between columns.
    pub lon_step: f64,
    /// Number of rows.
    pub n_lat: usize,
    /// Number of columns.
    pub n_lon: usize,
}

impl GridGeometry {
    /// Derive the geometry from the coordinate vectors. The spacing is taken from the first two
    /// samples of each vector, the grid is assumed uniform.
    pub fn from_axes(latitudes: &[f64], longitudes: &[f64]) -> Result<Self> {
        if latitudes.len() < 2 || longitudes.len() < 2 {
            return Err(AtlasError::DataAccess(format!(
                "grid too small: {} latitudes, {} longitudes",
                latitudes.len(),
                longitudes.len()
            )));
        }

        let lat_step = latitudes[1] - latitudes[0];
        let lon_step = longitudes[1] - longitudes[0];
        if !(lat_step.is_finite() && lon_step.is_finite()) || lat_step == 0.0 || lon_step == 0.0 {
            return Err(AtlasError::DataAccess(format!(
                "degenerate grid spacing: lat {}, lon {}",
                lat_step, lon_step
            )));
        }

        Ok(GridGeometry {
            lat_origin: latitudes[0],
            lat_step,
            lon_origin: longitudes[0],
            lon_step,
            n_lat: latitudes.len(),
            n_lon: longitudes.len(),
        })
    }

    /// Longitude expressed east of the grid origin.
    #[inline]
    pub fn grid_longitude(&self, lon: f64) -> f64 {
        longitude_east_of(lon, self.lon_origin)
    }

    /// Nearest grid index `(lat_idx, lon_idx)` of a position.
    ///
    /// Indexes are not clamped, a position off the grid gives indexes outside of it.
    pub fn locate(&self, lat: f64, lon: f64) -> (isize, isize) {
        let lon = self.grid_longitude(lon);

        let lat_idx = ((lat - self.lat_origin) / self.lat_step).round() as isize;
        let lon_idx = ((lon - self.lon_origin) / self.lon_step).round() as isize;

        (lat_idx, lon_idx)
    }
}

/// A loaded forecast run: variable handles plus the coordinate metadata needed to search it.
#[derive(Debug, Clone)]
pub struct GridSession<V> {
    loaded_date: NaiveDate,
    temperature: V,
    salinity: V,
    day_index: usize,
    depth_levels: Vec<f64>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    geometry: GridGeometry,
}

impl<V: GridVariable> GridSession<V> {
    /// Build a complete session from opened variables. Coordinates are read from the
    /// temperature variable.
    pub fn load(loaded_date: NaiveDate, temperature: V, salinity: V, day_index: usize) -> Result<Self> {
        let depth_levels = temperature.depths()?;
        let latitudes = temperature.latitudes()?;
        let longitudes = temperature.longitudes()?;

        if depth_levels.is_empty() {
            return Err(AtlasError::DataAccess("grid without depth levels".to_owned()));
        }
        let geometry = GridGeometry::from_axes(&latitudes, &longitudes)?;

        debug!(
            "0({:.3}, {:.3}); step({:.3}, {:.3})",
            geometry.lat_origin, geometry.lon_origin, geometry.lat_step, geometry.lon_step
        );

        Ok(GridSession {
            loaded_date,
            temperature,
            salinity,
            day_index,
            depth_levels,
            latitudes,
            longitudes,
            geometry,
        })
    }
}

impl<V> GridSession<V> {
    /// Date of the forecast run that is loaded.
    #[inline]
    pub fn loaded_date(&self) -> NaiveDate {
        self.loaded_date
    }

    /// The temperature variable.
    #[inline]
    pub fn temperature(&self) -> &V {
        &self.temperature
    }

    /// The salinity variable.
    #[inline]
    pub fn salinity(&self) -> &V {
        &self.salinity
    }

    /// Time step read from the run.
    #[inline]
    pub fn day_index(&self) -> usize {
        self.day_index
    }

    /// Depth of each level, in meters.
    #[inline]
    pub fn depth_levels(&self) -> &[f64] {
        &self.depth_levels
    }

    /// Latitude of each row.
    #[inline]
    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    /// Longitude of each column.
    #[inline]
    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// Grid origin and spacing.
    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }
}

/// Owns the provider and at most one loaded session.
pub struct GridCache<P: GridProvider> {
    provider: P,
    day_index: usize,
    session: Option<GridSession<P::Variable>>,
}

impl<P: GridProvider> GridCache<P> {
    /// Create an empty cache. `day_index` is the time step used for every run.
    pub fn new(provider: P, day_index: usize) -> Self {
        GridCache {
            provider,
            day_index,
            session: None,
        }
    }

    /// The grid provider.
    #[inline]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// True if a run is loaded.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    /// Date of the loaded run, if any.
    #[inline]
    pub fn loaded_date(&self) -> Option<NaiveDate> {
        self.session.as_ref().map(GridSession::loaded_date)
    }

    /// The loaded session, if any.
    #[inline]
    pub fn session(&self) -> Option<&GridSession<P::Variable>> {
        self.session.as_ref()
    }

    /// Drop the loaded session.
    pub fn clear(&mut self) {
        if self.session.take().is_some() {
            debug!("clearing data");
        }
    }

    /// Make sure a run for `date` is loaded, falling back to the run of the previous day.
    ///
    /// Returns the date of the loaded run. A run already loaded for exactly `date` is reused
    /// without touching the provider. On failure the cache is left empty.
    pub fn ensure_loaded(
        &mut self,
        date: NaiveDate,
        progress: &mut dyn ProgressReporter,
        progress_disabled: bool,
    ) -> Result<NaiveDate> {
        if let Some(loaded) = self.loaded_date() {
            if loaded == date {
                return Ok(loaded);
            }
            info!("cleaning data: {} {}", loaded, date);
        }
        self.clear();

        progress.start("Download RTOFS", progress_disabled);
        let result = self.load(date, progress);
        if result.is_ok() {
            progress.update(100);
        }
        progress.end();

        match result {
            Ok(session) => {
                let loaded = session.loaded_date();
                self.session = Some(session);
                info!("loaded data for {}", loaded);
                Ok(loaded)
            }
            Err(err) => {
                warn!("troubles in updating data set for {}: {}", date.format("%Y%m%d"), err);
                Err(err)
            }
        }
    }

    fn load(
        &self,
        date: NaiveDate,
        progress: &mut dyn ProgressReporter,
    ) -> Result<GridSession<P::Variable>> {
        let run_date = self.find_available(date)?;
        progress.update(30);

        let temperature = self.open_field(run_date, GridField::Temperature)?;
        progress.update(60);
        let salinity = self.open_field(run_date, GridField::Salinity)?;
        progress.update(80);

        GridSession::load(run_date, temperature, salinity, self.day_index).map_err(|err| {
            warn!("troubles in variable lookup for lat/long grid and/or depth: {}", err);
            err
        })
    }

    fn open_field(&self, date: NaiveDate, field: GridField) -> Result<P::Variable> {
        self.provider.open(date, field).map_err(|err| {
            warn!("unable to access {} data: {}", field, date.format("%Y%m%d"));
            match err {
                AtlasError::DataAccess(_) => err,
                other => AtlasError::DataAccess(other.to_string()),
            }
        })
    }

    // The nowcast of the requested day may not be out yet, fall back on the day before.
    fn find_available(&self, date: NaiveDate) -> Result<NaiveDate> {
        let previous = date - Duration::days(1);
        let mut transport_failure = None;

        for &candidate in &[date, previous] {
            let availability = self.provider.probe_available(candidate);
            debug!("RTOFS run for {} is {}", candidate, availability);
            match availability {
                Availability::Available => return Ok(candidate),
                Availability::Unreachable(reason) => {
                    transport_failure.get_or_insert(reason);
                }
                Availability::Missing => {}
            }
        }

        warn!(
            "unable to retrieve data from RTOFS server for date: {} and the day before",
            date
        );
        match transport_failure {
            Some(reason) => Err(AtlasError::DataAccess(reason)),
            None => Err(AtlasError::DataUnavailable { date }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        grid::{MemoryProvider, MemoryVariable},
        progress::{NoProgress, ProgressEvent, RecordingProgress},
    };
    use optional::some;

    fn make_provider() -> MemoryProvider {
        let var = || {
            MemoryVariable::from_fn(
                vec![0.0, 10.0, 20.0],
                (0..10).map(f64::from).collect(),
                (0..20).map(|x| 70.0 + f64::from(x)).collect(),
                3,
                |_, _, _| some(10.0),
            )
        };
        MemoryProvider::new(var(), var())
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_geometry() {
        let lats: Vec<f64> = (0..10).map(|i| -5.0 + 0.5 * f64::from(i)).collect();
        let lons: Vec<f64> = (0..10).map(|i| 74.16 + 0.08 * f64::from(i)).collect();
        let geo = GridGeometry::from_axes(&lats, &lons).unwrap();

        assert_eq!(geo.lat_origin, -5.0);
        assert_eq!(geo.lat_step, 0.5);
        assert_eq!(geo.n_lon, 10);
        assert_eq!(geo.locate(-4.2, 74.4), (2, 3));

        assert!(GridGeometry::from_axes(&lats[..1], &lons).is_err());
        assert!(GridGeometry::from_axes(&[1.0, 1.0], &lons).is_err());
    }

    #[test]
    fn test_locate_wraps_longitude() {
        let lats: Vec<f64> = (0..10).map(f64::from).collect();
        let lons: Vec<f64> = (0..360).map(|x| 70.0 + f64::from(x)).collect();
        let geo = GridGeometry::from_axes(&lats, &lons).unwrap();

        assert_eq!(geo.grid_longitude(69.0), 429.0);
        assert_eq!(geo.locate(2.4, 69.0), (2, 359));
        assert_eq!(geo.locate(2.6, -80.0), (3, 210));
    }

    #[test]
    fn test_cache_hit() {
        let mut cache = GridCache::new(make_provider().with_available(day(10)), 2);

        assert_eq!(cache.ensure_loaded(day(10), &mut NoProgress, true), Ok(day(10)));
        assert_eq!(cache.ensure_loaded(day(10), &mut NoProgress, true), Ok(day(10)));
        assert_eq!(cache.provider().open_count(), 2);
        assert_eq!(cache.provider().probed_dates(), vec![day(10)]);

        let session = cache.session().unwrap();
        assert_eq!(session.depth_levels(), &[0.0, 10.0, 20.0]);
        assert_eq!(session.day_index(), 2);
        assert_eq!(session.geometry().lon_origin, 70.0);
    }

    #[test]
    fn test_fallback_to_previous_day() {
        let mut cache = GridCache::new(make_provider().with_available(day(9)), 2);

        assert_eq!(cache.ensure_loaded(day(10), &mut NoProgress, true), Ok(day(9)));
        assert_eq!(cache.loaded_date(), Some(day(9)));
        assert_eq!(cache.provider().probed_dates(), vec![day(10), day(9)]);
    }

    #[test]
    fn test_nothing_available() {
        let mut cache = GridCache::new(make_provider().with_available(day(1)), 2);
        cache.ensure_loaded(day(1), &mut NoProgress, true).unwrap();
        assert!(cache.is_loaded());

        let result = cache.ensure_loaded(day(10), &mut NoProgress, true);
        assert_eq!(result, Err(AtlasError::DataUnavailable { date: day(10) }));
        assert!(!cache.is_loaded());
        assert_eq!(cache.loaded_date(), None);
    }

    #[test]
    fn test_unreachable_server() {
        let mut cache = GridCache::new(make_provider().with_unreachable(true), 2);

        let result = cache.ensure_loaded(day(10), &mut NoProgress, true);
        assert!(matches!(result, Err(AtlasError::DataAccess(_))));
        assert!(!cache.is_loaded());
        assert_eq!(cache.provider().open_count(), 0);
    }

    #[test]
    fn test_transport_failure_survives_missing_fallback() {
        let provider = make_provider().with_unreachable_date(day(10));
        let mut cache = GridCache::new(provider, 2);

        let result = cache.ensure_loaded(day(10), &mut NoProgress, true);
        assert_eq!(
            result,
            Err(AtlasError::DataAccess("connection refused".to_owned()))
        );
        assert_eq!(cache.provider().probed_dates(), vec![day(10), day(9)]);

        let provider = make_provider()
            .with_unreachable_date(day(10))
            .with_available(day(9));
        let mut cache = GridCache::new(provider, 2);
        assert_eq!(cache.ensure_loaded(day(10), &mut NoProgress, true), Ok(day(9)));
    }

    #[test]
    fn test_open_failure_clears() {
        let mut cache = GridCache::new(make_provider().with_broken(day(10)), 2);

        let result = cache.ensure_loaded(day(10), &mut NoProgress, true);
        assert!(matches!(result, Err(AtlasError::DataAccess(_))));
        assert!(!cache.is_loaded());
        assert_eq!(cache.provider().open_count(), 1);
    }

    #[test]
    fn test_progress_stages() {
        let mut cache = GridCache::new(make_provider().with_available(day(9)), 2);
        let progress = RecordingProgress::default();

        cache.ensure_loaded(day(10), &mut progress.clone(), false).unwrap();
        let events = progress.events();
        assert_eq!(events.first(), Some(&ProgressEvent::Start("Download RTOFS".to_owned())));
        assert_eq!(events.last(), Some(&ProgressEvent::End));
        assert_eq!(progress.percentages(), vec![30, 60, 80, 100]);

        // A failed load still ends the progress
        let progress = RecordingProgress::default();
        assert!(cache.ensure_loaded(day(20), &mut progress.clone(), false).is_err());
        assert_eq!(progress.percentages(), Vec::<u8>::new());
        assert_eq!(progress.events().last(), Some(&ProgressEvent::End));
    }
}
