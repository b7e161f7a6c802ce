use chrono::NaiveDateTime;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Kind of instrument, real or not, that produced a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
pub enum SensorType {
    /// Not known.
    #[strum(serialize = "Unknown")]
    Unknown,
    /// Built from a model or an atlas rather than measured.
    #[strum(serialize = "Synthetic")]
    Synthetic,
    /// Conductivity, temperature and depth probe.
    #[strum(serialize = "CTD")]
    Ctd,
    /// Expendable bathythermograph.
    #[strum(serialize = "XBT")]
    Xbt,
    /// Sound velocity probe.
    #[strum(serialize = "SVP")]
    Svp,
}

impl Default for SensorType {
    fn default() -> Self {
        SensorType::Unknown
    }
}

/// Source of a profile: the probe model, or the atlas it was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
pub enum ProbeType {
    /// Not known.
    #[strum(serialize = "Unknown")]
    Unknown,
    /// Global Real-Time Ocean Forecast System.
    #[strum(serialize = "RTOFS")]
    Rtofs,
    /// World Ocean Atlas 2009.
    #[strum(serialize = "WOA09")]
    Woa09,
    /// World Ocean Atlas 2013.
    #[strum(serialize = "WOA13")]
    Woa13,
}

impl Default for ProbeType {
    fn default() -> Self {
        ProbeType::Unknown
    }
}

/// Description of where a profile comes from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileMeta {
    sensor_type: SensorType,
    probe_type: ProbeType,
    /// Latitude and longitude.
    location: Option<(f64, f64)>,
    utc_time: Option<NaiveDateTime>,
    /// Label of the source the profile was read from.
    original_path: Option<String>,
}

impl ProfileMeta {
    /// Create a new object with default values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rtofs_atlas::{ProbeType, ProfileMeta, SensorType};
    ///
    /// let meta = ProfileMeta::new();
    /// assert_eq!(meta.sensor_type(), SensorType::Unknown);
    /// assert_eq!(meta.probe_type(), ProbeType::Unknown);
    /// assert!(meta.location().is_none());
    /// assert!(meta.utc_time().is_none());
    /// assert!(meta.original_path().is_none());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method for the sensor type.
    #[inline]
    pub fn with_sensor_type(self, sensor_type: SensorType) -> Self {
        Self {
            sensor_type,
            ..self
        }
    }

    /// Builder method for the probe type.
    #[inline]
    pub fn with_probe_type(self, probe_type: ProbeType) -> Self {
        Self { probe_type, ..self }
    }

    /// Builder method for the location as `(latitude, longitude)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rtofs_atlas::ProfileMeta;
    ///
    /// let meta = ProfileMeta::new().with_location((43.1, -70.8));
    /// assert_eq!(meta.location(), Some((43.1, -70.8)));
    ///
    /// let meta = meta.with_location(None);
    /// assert!(meta.location().is_none());
    /// ```
    #[inline]
    pub fn with_location<T>(self, location: T) -> Self
    where
        T: Into<Option<(f64, f64)>>,
    {
        Self {
            location: location.into(),
            ..self
        }
    }

    /// Builder method for the time of the profile, UTC.
    #[inline]
    pub fn with_utc_time<T>(self, utc_time: T) -> Self
    where
        T: Into<Option<NaiveDateTime>>,
    {
        Self {
            utc_time: utc_time.into(),
            ..self
        }
    }

    /// Builder method for the source label.
    #[inline]
    pub fn with_original_path<S>(self, path: S) -> Self
    where
        Option<String>: From<S>,
    {
        Self {
            original_path: Option::from(path),
            ..self
        }
    }

    /// The sensor type.
    #[inline]
    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    /// The probe type.
    #[inline]
    pub fn probe_type(&self) -> ProbeType {
        self.probe_type
    }

    /// Latitude and longitude.
    #[inline]
    pub fn location(&self) -> Option<(f64, f64)> {
        self.location
    }

    /// Latitude, if the location is known.
    #[inline]
    pub fn latitude(&self) -> Option<f64> {
        self.location.map(|(lat, _)| lat)
    }

    /// Longitude, if the location is known.
    #[inline]
    pub fn longitude(&self) -> Option<f64> {
        self.location.map(|(_, lon)| lon)
    }

    /// Time of the profile, UTC.
    #[inline]
    pub fn utc_time(&self) -> Option<NaiveDateTime> {
        self.utc_time
    }

    /// Label of the source the profile was read from.
    #[inline]
    pub fn original_path(&self) -> Option<&str> {
        self.original_path.as_deref()
    }
}
