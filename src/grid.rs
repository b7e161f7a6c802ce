//! Access to the remote forecast grids.
//!
//! A [`GridProvider`] knows which forecast runs exist and opens the temperature and salinity
//! variables of a run. Each opened variable is a [`GridVariable`]: coordinate vectors plus
//! windowed reads of its `[time, level, latitude, longitude]` cube.
//!
//! Two providers ship with the crate:
//!   - [`OpendapProvider`] talks to the NOMADS server over HTTP, probing run files with `HEAD`
//!     requests and reading hyperslabs through OPeNDAP.
//!   - [`MemoryProvider`] serves grids held in memory. It is used for tests and benchmarks, and
//!     for serving grids obtained some other way.
use crate::error::Result;
use chrono::NaiveDate;
use std::{fmt, ops::Range};
use strum_macros::Display;

pub use self::{
    cube::Cube,
    memory::{MemoryProvider, MemoryVariable, WindowRead},
    opendap::{OpendapProvider, OpendapVariable},
};

/// Outcome of an availability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// Both variables of the run are on the server.
    Available,
    /// The server answered but at least one variable is not there (yet).
    Missing,
    /// The server could not be reached: DNS failure, connection refused, timeout...
    Unreachable(String),
}

impl Availability {
    /// True only for `Available`.
    #[inline]
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::Missing => write!(f, "missing"),
            Availability::Unreachable(reason) => write!(f, "unreachable ({})", reason),
        }
    }
}

/// The variables of a forecast run used to build a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum GridField {
    /// Potential temperature, degrees Celsius.
    #[strum(serialize = "temperature")]
    Temperature,
    /// Salinity, PSU.
    #[strum(serialize = "salinity")]
    Salinity,
}

/// The two variables of one forecast run.
#[derive(Debug, Clone)]
pub struct GridPair<V> {
    /// Potential temperature cube.
    pub temperature: V,
    /// Salinity cube.
    pub salinity: V,
}

impl<V> GridPair<V> {
    /// The variable holding `field`.
    #[inline]
    pub fn field(&self, field: GridField) -> &V {
        match field {
            GridField::Temperature => &self.temperature,
            GridField::Salinity => &self.salinity,
        }
    }
}

/// One opened variable of a forecast run.
pub trait GridVariable {
    /// Depth of each level in meters, shallow to deep.
    fn depths(&self) -> Result<Vec<f64>>;
    /// Latitude of each grid row, south to north.
    fn latitudes(&self) -> Result<Vec<f64>>;
    /// Longitude of each grid column, west to east starting at the grid origin.
    fn longitudes(&self) -> Result<Vec<f64>>;
    /// Read every level of the rows and columns in the given ranges at time step `day`.
    ///
    /// Missing values in the cube are returned as `none`.
    fn read_window(&self, day: usize, lats: Range<usize>, lons: Range<usize>) -> Result<Cube>;
}

/// A source of forecast runs, one per day.
pub trait GridProvider {
    /// The variable handle produced by `open`.
    type Variable: GridVariable;

    /// Cheap check that the run for `date` is on the server. Transport failures are reported as
    /// `Availability::Unreachable`, never as errors.
    fn probe_available(&self, date: NaiveDate) -> Availability;

    /// Open one variable of the run for `date`.
    fn open(&self, date: NaiveDate, field: GridField) -> Result<Self::Variable>;
}

mod cube;
mod memory;
mod opendap;
