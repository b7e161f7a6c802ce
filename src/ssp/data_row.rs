use metfor::{Celsius, Meters, MetersPSec};
use optional::Optioned;

/// A copy of a row of the profile data.
#[derive(Clone, Default, Copy, Debug, PartialEq)]
pub struct DataRow {
    /// Depth in meters
    pub depth: Optioned<Meters>,
    /// In-situ temperature in C
    pub temperature: Optioned<Celsius>,
    /// Salinity in PSU
    pub salinity: Optioned<f64>,
    /// Sound speed in m/s
    pub speed: Optioned<MetersPSec>,
}
