//! Seawater formulas needed to turn a model temperature/salinity column into a sound speed
//! profile.
//!
//! All formulas follow the UNESCO 1983 algorithms (Fofonoff & Millard, UNESCO Technical Papers
//! in Marine Science 44).
//!
//! # Units
//!
//! - Depth: meters, positive down
//! - Pressure: decibars, see [`Decibars`]
//! - Temperature: °C
//! - Salinity: practical salinity units (PSU), passed as plain `f64`
//! - Sound speed: m/s

use metfor::{Celsius, Meters, MetersPSec, Quantity};
use std::f64::consts::PI;

/// Sea pressure in decibars. One decibar is roughly one meter of seawater.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct Decibars(pub f64);

impl Decibars {
    /// Pressure in bars.
    #[inline]
    pub fn bars(self) -> f64 {
        self.0 / 10.0
    }
}

/// Pressure at depth using Saunders (1981).
pub fn depth_to_pressure(depth: Meters, latitude: f64) -> Decibars {
    let x = (latitude.abs() * PI / 180.0).sin();
    let c1 = 5.92e-3 + x * x * 5.25e-3;
    let d = depth.unpack();

    Decibars(((1.0 - c1) - ((1.0 - c1).powi(2) - 8.84e-6 * d).sqrt()) / 4.42e-6)
}

/// Adiabatic temperature gradient in °C per decibar (Bryden, 1973).
pub fn adiabatic_lapse_rate(salinity: f64, temperature: Celsius, pressure: Decibars) -> f64 {
    const A0: f64 = 3.5803e-5;
    const A1: f64 = 8.5258e-6;
    const A2: f64 = -6.836e-8;
    const A3: f64 = 6.6228e-10;

    const B0: f64 = 1.8932e-6;
    const B1: f64 = -4.2393e-8;

    const C0: f64 = 1.8741e-8;
    const C1: f64 = -6.7795e-10;
    const C2: f64 = 8.733e-12;
    const C3: f64 = -5.4481e-14;

    const D0: f64 = -1.1351e-10;
    const D1: f64 = 2.7759e-12;

    const E0: f64 = -4.6206e-13;
    const E1: f64 = 1.8676e-14;
    const E2: f64 = -2.1687e-16;

    let t = temperature.unpack();
    let p = pressure.0;
    let ds = salinity - 35.0;

    A0 + (A1 + (A2 + A3 * t) * t) * t
        + (B0 + B1 * t) * ds
        + ((C0 + (C1 + (C2 + C3 * t) * t) * t) + (D0 + D1 * t) * ds) * p
        + (E0 + (E1 + E2 * t) * t) * p * p
}

/// Potential temperature of a parcel at `pressure` brought adiabatically to `reference`.
///
/// Fourth order Runge-Kutta integration of the adiabatic lapse rate (Fofonoff, 1977).
pub fn potential_temperature(
    salinity: f64,
    temperature: Celsius,
    pressure: Decibars,
    reference: Decibars,
) -> Celsius {
    let sqrt2 = 2.0_f64.sqrt();
    let p = pressure.0;
    let del_p = reference.0 - p;
    let lapse = |t: f64, p: f64| adiabatic_lapse_rate(salinity, Celsius(t), Decibars(p));

    let mut del_th = del_p * lapse(temperature.unpack(), p);
    let mut th = temperature.unpack() + 0.5 * del_th;
    let mut q = del_th;

    del_th = del_p * lapse(th, p + 0.5 * del_p);
    th += (1.0 - 1.0 / sqrt2) * (del_th - q);
    q = (2.0 - sqrt2) * del_th + (-2.0 + 3.0 / sqrt2) * q;

    del_th = del_p * lapse(th, p + 0.5 * del_p);
    th += (1.0 + 1.0 / sqrt2) * (del_th - q);
    q = (2.0 + sqrt2) * del_th + (-2.0 - 3.0 / sqrt2) * q;

    del_th = del_p * lapse(th, p + del_p);

    Celsius(th + (del_th - 2.0 * q) / 6.0)
}

/// In-situ temperature at `pressure` of water whose potential temperature is referenced to
/// `reference`.
///
/// This is the potential temperature integration run backwards, from the reference surface down
/// to the actual pressure.
#[inline]
pub fn potential_to_insitu_temperature(
    salinity: f64,
    potential_temperature: Celsius,
    pressure: Decibars,
    reference: Decibars,
) -> Celsius {
    self::potential_temperature(salinity, potential_temperature, reference, pressure)
}

/// Speed of sound in seawater, Chen & Millero (1977) as adopted by UNESCO.
pub fn sound_speed(salinity: f64, temperature: Celsius, pressure: Decibars) -> MetersPSec {
    let t = temperature.unpack();
    let p = pressure.bars();
    let s = salinity;

    // Pure water
    const C00: f64 = 1402.388;
    const C01: f64 = 5.037_11;
    const C02: f64 = -5.808_52e-2;
    const C03: f64 = 3.3420e-4;
    const C04: f64 = -1.478_00e-6;
    const C05: f64 = 3.1464e-9;

    const C10: f64 = 0.153_563;
    const C11: f64 = 6.8982e-4;
    const C12: f64 = -8.1788e-6;
    const C13: f64 = 1.3621e-7;
    const C14: f64 = -6.1185e-10;

    const C20: f64 = 3.1260e-5;
    const C21: f64 = -1.7107e-6;
    const C22: f64 = 2.5974e-8;
    const C23: f64 = -2.5335e-10;
    const C24: f64 = 1.0405e-12;

    const C30: f64 = -9.7729e-9;
    const C31: f64 = 3.8504e-10;
    const C32: f64 = -2.3643e-12;

    let cw = ((((C32 * t + C31) * t + C30) * p
        + ((((C24 * t + C23) * t + C22) * t + C21) * t + C20))
        * p
        + ((((C14 * t + C13) * t + C12) * t + C11) * t + C10))
        * p
        + ((((C05 * t + C04) * t + C03) * t + C02) * t + C01) * t
        + C00;

    // Salinity terms
    const A00: f64 = 1.389;
    const A01: f64 = -1.262e-2;
    const A02: f64 = 7.164e-5;
    const A03: f64 = 2.006e-6;
    const A04: f64 = -3.21e-8;

    const A10: f64 = 9.4742e-5;
    const A11: f64 = -1.2580e-5;
    const A12: f64 = -6.4885e-8;
    const A13: f64 = 1.0507e-8;
    const A14: f64 = -2.0122e-10;

    const A20: f64 = -3.9064e-7;
    const A21: f64 = 9.1041e-9;
    const A22: f64 = -1.6002e-10;
    const A23: f64 = 7.988e-12;

    const A30: f64 = 1.100e-10;
    const A31: f64 = 6.649e-12;
    const A32: f64 = -3.389e-13;

    let a = ((((A32 * t + A31) * t + A30) * p + ((A23 * t + A22) * t + A21) * t + A20) * p
        + ((((A14 * t + A13) * t + A12) * t + A11) * t + A10))
        * p
        + (((A04 * t + A03) * t + A02) * t + A01) * t
        + A00;

    const B00: f64 = -1.922e-2;
    const B01: f64 = -4.42e-5;
    const B10: f64 = 7.3637e-5;
    const B11: f64 = 1.7945e-7;

    let b = B00 + B01 * t + (B10 + B11 * t) * p;

    const D00: f64 = 1.727e-3;
    const D10: f64 = -7.9836e-6;

    let d = D00 + D10 * p;

    MetersPSec(cw + a * s + b * s.powf(1.5) + d * s * s)
}
