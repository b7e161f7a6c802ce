use chrono::NaiveDate;
use optional::{none, some, Optioned};
use rtofs_atlas::{AtlasConfig, MemoryProvider, MemoryVariable, Rtofs};

pub const LAT_ORIGIN: f64 = 0.0;
pub const LON_ORIGIN: f64 = 70.0;
pub const N_LAT: usize = 20;
pub const N_LON: usize = 360;

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

pub fn latitudes() -> Vec<f64> {
    (0..N_LAT).map(|i| LAT_ORIGIN + i as f64).collect()
}

/// Longitudes of a 1 degree grid starting at `origin`.
pub fn longitudes(origin: f64) -> Vec<f64> {
    (0..N_LON).map(|i| origin + i as f64).collect()
}

/// Build a temperature and salinity pair on a 1 degree grid whose first column is at
/// `lon_origin`. `f(level, row, lon)` gives the potential temperature at a node, with `lon` the
/// node longitude in [0, 360); salinity is 35 wherever temperature is present.
pub fn make_grids<F>(depths: &[f64], lon_origin: f64, f: F) -> (MemoryVariable, MemoryVariable)
where
    F: Fn(usize, usize, f64) -> Optioned<f64> + Copy,
{
    let lons = longitudes(lon_origin);
    let lon_at = move |c: usize| (lon_origin + c as f64).rem_euclid(360.0);

    let temperature = MemoryVariable::from_fn(
        depths.to_vec(),
        latitudes(),
        lons.clone(),
        3,
        move |l, r, c| f(l, r, lon_at(c)),
    );
    let salinity = MemoryVariable::from_fn(depths.to_vec(), latitudes(), lons, 3, move |l, r, c| {
        if f(l, r, lon_at(c)).is_some() {
            some(35.0)
        } else {
            none()
        }
    });

    (temperature, salinity)
}

/// Ocean everywhere, colder with depth.
pub fn ocean(level: usize, _row: usize, _lon: f64) -> Optioned<f64> {
    some(20.0 - 2.0 * level as f64)
}

/// Land everywhere.
pub fn land(_level: usize, _row: usize, _lon: f64) -> Optioned<f64> {
    none()
}

pub fn make_provider<F>(depths: &[f64], f: F) -> MemoryProvider
where
    F: Fn(usize, usize, f64) -> Optioned<f64> + Copy,
{
    let (temperature, salinity) = make_grids(depths, LON_ORIGIN, f);
    MemoryProvider::new(temperature, salinity)
}

pub fn make_atlas(provider: MemoryProvider) -> Rtofs<MemoryProvider> {
    Rtofs::with_provider(AtlasConfig::default(), provider).unwrap()
}
