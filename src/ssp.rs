//! Data types and methods to store a sound speed profile.

use crate::oceanography::{depth_to_pressure, sound_speed};
use itertools::izip;
use metfor::{Celsius, Meters, MetersPSec};
use optional::Optioned;

pub use self::{
    data_row::DataRow,
    meta::{ProbeType, ProfileMeta, SensorType},
};

/// A water column profile: depth, temperature, salinity and the sound speed derived from them.
///
/// The variables are stored in parallel vectors ordered by increasing depth. If a profile lacks
/// a variable, e.g. the speed has not been computed yet, that whole vector has length 0 instead
/// of being full of missing values.
#[derive(Clone, Debug, Default)]
pub struct SoundSpeedProfile {
    meta: ProfileMeta,

    depth: Vec<Optioned<Meters>>,
    temperature: Vec<Optioned<Celsius>>,
    salinity: Vec<Optioned<f64>>,
    speed: Vec<Optioned<MetersPSec>>,
}

macro_rules! make_profile_setter {
    ($(#[$attr:meta])* => $name:tt, $inner_type:tt, $p_var:ident) => {
        $(#[$attr])*
        pub fn $name(self, profile: Vec<Optioned<$inner_type>>) -> Self {
            Self {$p_var: profile, ..self}
        }
    };
}

impl SoundSpeedProfile {
    /// Create a new profile with default values. This is a proxy for default with a clearer
    /// name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rtofs_atlas::SoundSpeedProfile;
    ///
    /// let ssp = SoundSpeedProfile::new();
    /// assert!(ssp.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Self {
        SoundSpeedProfile::default()
    }

    /// Builder method for the metadata.
    #[inline]
    pub fn with_meta(self, meta: ProfileMeta) -> Self {
        Self { meta, ..self }
    }

    /// Get the metadata.
    #[inline]
    pub fn meta(&self) -> &ProfileMeta {
        &self.meta
    }

    make_profile_setter!(
        /// Builder method for the depth profile, shallow to deep.
        ///
        /// # Examples
        /// ```rust
        /// use rtofs_atlas::SoundSpeedProfile;
        /// use metfor::Meters;
        /// use optional::{some, Optioned};
        ///
        /// let data = vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 15.0, 20.0, 25.0];
        /// let depth_data: Vec<Optioned<Meters>> = data.into_iter()
        ///     .map(Meters)
        ///     .map(some)
        ///     .collect();
        ///
        /// let ssp = SoundSpeedProfile::new().with_depth_profile(depth_data);
        /// assert_eq!(ssp.len(), 10);
        /// ```
        #[inline]
        => with_depth_profile, Meters, depth
    );

    /// Get the depth profile.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rtofs_atlas::SoundSpeedProfile;
    /// # use rtofs_atlas::doctest::make_test_profile;
    ///
    /// let ssp = make_test_profile();
    /// for d in ssp.depth_profile() {
    ///     if let Some(d) = d.into_option() {
    ///         println!("{:?}", d);
    ///     } else {
    ///         println!("missing value!");
    ///     }
    /// }
    ///
    /// // Uninitialized profiles just return an empty slice.
    /// let ssp = SoundSpeedProfile::new();
    /// assert!(ssp.depth_profile().is_empty());
    /// ```
    #[inline]
    pub fn depth_profile(&self) -> &[Optioned<Meters>] {
        &self.depth
    }

    make_profile_setter!(
        /// Builder method for the in-situ temperature profile.
        ///
        /// See `with_depth_profile` for an example of usage, keeping in mind the units type may
        /// be different.
        #[inline]
        => with_temperature_profile, Celsius, temperature
    );

    /// Get the in-situ temperature profile.
    #[inline]
    pub fn temperature_profile(&self) -> &[Optioned<Celsius>] {
        &self.temperature
    }

    make_profile_setter!(
        /// Builder method for the salinity profile, PSU.
        #[inline]
        => with_salinity_profile, f64, salinity
    );

    /// Get the salinity profile.
    #[inline]
    pub fn salinity_profile(&self) -> &[Optioned<f64>] {
        &self.salinity
    }

    /// Get the sound speed profile. Empty until `calc_speed` has been called.
    #[inline]
    pub fn speed_profile(&self) -> &[Optioned<MetersPSec>] {
        &self.speed
    }

    /// Compute the sound speed at every depth from the temperature and salinity.
    ///
    /// Depths are converted to pressure at the latitude of the profile, or at the equator if
    /// the location is unknown. Rows missing any input get a missing speed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use rtofs_atlas::doctest::make_test_profile;
    /// let mut ssp = make_test_profile();
    /// ssp.calc_speed();
    ///
    /// assert_eq!(ssp.speed_profile().len(), ssp.len());
    /// assert!(ssp.speed_profile().iter().all(|s| s.is_some()));
    /// ```
    pub fn calc_speed(&mut self) {
        let lat = self.meta.latitude().unwrap_or(0.0);

        self.speed = izip!(&self.depth, &self.temperature, &self.salinity)
            .map(|(d, t, s)| {
                let (d, t, s) = (d.into_option()?, t.into_option()?, s.into_option()?);
                Some(sound_speed(s, t, depth_to_pressure(d, lat)))
            })
            .map(Optioned::from)
            .collect();
    }

    /// Number of rows, the length of the depth profile.
    #[inline]
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    /// True if there are no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    /// Get a row of data values from this profile.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metfor::Meters;
    /// # use rtofs_atlas::doctest::make_test_profile;
    ///
    /// let ssp = make_test_profile();
    /// let row = ssp.data_row(1).unwrap();
    /// assert_eq!(row.depth.unwrap(), Meters(10.0));
    ///
    /// assert!(ssp.data_row(100).is_none());
    /// ```
    #[inline]
    pub fn data_row(&self, idx: usize) -> Option<DataRow> {
        macro_rules! copy_to_result {
            ($result:ident, $field:ident, $idx:ident) => {
                match self.$field.get($idx) {
                    None => {}
                    Some(opt_val) => $result.$field = *opt_val,
                }
            };
        }

        if idx >= self.len() {
            return None;
        }

        let mut result = DataRow::default();

        copy_to_result!(result, depth, idx);
        copy_to_result!(result, temperature, idx);
        copy_to_result!(result, salinity, idx);
        copy_to_result!(result, speed, idx);

        Some(result)
    }

    /// Iterate over the rows from the surface down.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use rtofs_atlas::doctest::make_test_profile;
    /// let ssp = make_test_profile();
    ///
    /// let depths: Vec<f64> = ssp
    ///     .top_down()
    ///     .filter_map(|row| row.depth.into_option())
    ///     .map(|d| d.0)
    ///     .collect();
    /// assert_eq!(depths, vec![0.0, 10.0, 50.0, 100.0]);
    /// ```
    #[inline]
    pub fn top_down<'a>(&'a self) -> impl Iterator<Item = DataRow> + 'a {
        ProfileIterator {
            next_idx: 0,
            direction: 1,
            src: self,
        }
    }

    /// Iterate over the rows from the deepest up.
    #[inline]
    pub fn bottom_up<'a>(&'a self) -> impl Iterator<Item = DataRow> + 'a {
        ProfileIterator {
            next_idx: self.len() as isize - 1,
            direction: -1,
            src: self,
        }
    }
}

/// Iterator over the data rows of a profile, in either direction.
struct ProfileIterator<'a> {
    next_idx: isize,
    direction: isize, // +1 top down, -1 bottom up
    src: &'a SoundSpeedProfile,
}

impl<'a> Iterator for ProfileIterator<'a> {
    type Item = DataRow;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.next_idx < 0 {
            return None;
        }
        let result = self.src.data_row(self.next_idx as usize);
        self.next_idx += self.direction;
        result
    }
}

/// The profiles returned by a query.
#[derive(Clone, Debug, Default)]
pub struct ProfileList {
    profiles: Vec<SoundSpeedProfile>,
}

impl ProfileList {
    /// Create an empty list.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile at the end of the list.
    #[inline]
    pub fn append_profile(&mut self, profile: SoundSpeedProfile) {
        self.profiles.push(profile);
    }

    /// Number of profiles.
    #[inline]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// True if the list holds no profile.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Get a profile by index.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&SoundSpeedProfile> {
        self.profiles.get(idx)
    }

    /// Iterate over the profiles.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &SoundSpeedProfile> {
        self.profiles.iter()
    }
}

impl IntoIterator for ProfileList {
    type Item = SoundSpeedProfile;
    type IntoIter = std::vec::IntoIter<SoundSpeedProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.into_iter()
    }
}

#[doc(hidden)]
pub mod doctest {
    use super::*;

    pub fn make_test_profile() -> SoundSpeedProfile {
        use optional::some;

        let d = vec![
            some(Meters(0.0)),
            some(Meters(10.0)),
            some(Meters(50.0)),
            some(Meters(100.0)),
        ];
        let t = vec![
            some(Celsius(20.0)),
            some(Celsius(19.5)),
            some(Celsius(15.0)),
            some(Celsius(12.0)),
        ];
        let s = vec![some(35.0), some(35.1), some(35.2), some(35.2)];

        SoundSpeedProfile::new()
            .with_meta(ProfileMeta::new().with_location((30.0, -60.0)))
            .with_depth_profile(d)
            .with_temperature_profile(t)
            .with_salinity_profile(s)
    }
}


mod data_row;
mod meta;
