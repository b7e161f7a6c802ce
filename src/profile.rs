//! Build sound speed profiles from the samples found by the locator.
//!
//! RTOFS stores potential temperature referenced to 2000 dbar. Each sample is brought back to
//! in-situ temperature at the pressure of its depth before the sound speed is computed.

use crate::{
    error::{AtlasError, Result},
    locator::Located,
    oceanography::{depth_to_pressure, potential_to_insitu_temperature, Decibars},
    ssp::{ProbeType, ProfileList, ProfileMeta, SensorType, SoundSpeedProfile},
    utility::normalize_longitude,
};
use chrono::NaiveDate;
use metfor::{Celsius, Meters};
use optional::{some, Optioned};

/// Source label of a profile extracted from the run of `date`, e.g. `RTOFS_20240510`.
pub fn source_label(date: NaiveDate) -> String {
    format!("RTOFS_{}", date.format("%Y%m%d"))
}

/// Turn located samples into a list holding a single profile.
///
/// Pressures are computed at `query_lat`; `reference` is the reference pressure of the
/// potential temperatures. The profile is stamped with midnight UTC of `date`.
pub fn build_profiles(
    located: &Located,
    query_lat: f64,
    date: NaiveDate,
    reference: Decibars,
) -> Result<ProfileList> {
    if located.samples.is_empty() {
        return Err(AtlasError::NoDataAtLocation {
            lat: located.latitude,
            lon: normalize_longitude(located.longitude),
        });
    }

    let depth: Vec<Optioned<Meters>> = located.samples.iter().map(|s| some(s.depth)).collect();
    let salinity: Vec<Optioned<f64>> = located.samples.iter().map(|s| some(s.salinity)).collect();
    let temperature: Vec<Optioned<Celsius>> = located
        .samples
        .iter()
        .map(|s| {
            let pressure = depth_to_pressure(s.depth, query_lat);
            potential_to_insitu_temperature(s.salinity, s.potential_temperature, pressure, reference)
        })
        .map(some)
        .collect();

    let meta = ProfileMeta::new()
        .with_sensor_type(SensorType::Synthetic)
        .with_probe_type(ProbeType::Rtofs)
        .with_location((located.latitude, normalize_longitude(located.longitude)))
        .with_utc_time(date.and_hms_opt(0, 0, 0))
        .with_original_path(source_label(date));

    let mut profile = SoundSpeedProfile::new()
        .with_meta(meta)
        .with_depth_profile(depth)
        .with_temperature_profile(temperature)
        .with_salinity_profile(salinity);
    profile.calc_speed();

    let mut profiles = ProfileList::new();
    profiles.append_profile(profile);

    Ok(profiles)
}
