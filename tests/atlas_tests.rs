mod utils;

use metfor::{Meters, Quantity};
use optional::{none, some, Optioned};
use rtofs_atlas::{
    AtlasError, GridGeometry, MemoryProvider, ProbeType, ProgressEvent, RecordingProgress,
    SensorType, SoundSpeedProfile,
};
use utils::*;

fn first_profile(profiles: &rtofs_atlas::ProfileList) -> &SoundSpeedProfile {
    assert_eq!(profiles.len(), 1);
    profiles.get(0).unwrap()
}

fn depths_of(profile: &SoundSpeedProfile) -> Vec<f64> {
    profile
        .depth_profile()
        .iter()
        .map(|d| d.unwrap().unpack())
        .collect()
}

#[test]
fn test_locate_within_one_step() {
    let lats: Vec<f64> = (0..2250).map(|i| -78.64 + 0.08 * i as f64).collect();
    let lons: Vec<f64> = (0..4500).map(|i| 74.16 + 0.08 * i as f64).collect();
    let geo = GridGeometry::from_axes(&lats, &lons).unwrap();

    for &lat in &[-75.0, -33.3, 0.0, 12.345, 47.77, 89.0] {
        for &lon in &[-179.9, -70.0, 0.0, 74.16, 74.2, 120.5, 179.99, 359.0] {
            let (lat_idx, lon_idx) = geo.locate(lat, lon);
            assert!(lat_idx >= 0 && (lat_idx as usize) < lats.len());
            assert!(lon_idx >= 0 && (lon_idx as usize) <= lons.len());

            let node_lat = geo.lat_origin + lat_idx as f64 * geo.lat_step;
            let node_lon = geo.lon_origin + lon_idx as f64 * geo.lon_step;
            assert!((node_lat - lat).abs() <= geo.lat_step);
            assert!((node_lon - geo.grid_longitude(lon)).abs() <= geo.lon_step);
        }
    }
}

#[test]
fn test_split_window_scenario() {
    let mut rtofs = make_atlas(make_provider(&[0.0, 10.0], ocean).with_available(day(10)));

    let profiles = rtofs.query(2.4, 69.0, day(10)).unwrap().unwrap();
    let profile = first_profile(&profiles);
    assert_eq!(profile.meta().location(), Some((2.0, 69.0)));

    let reads = rtofs.provider().temperature().reads();
    assert_eq!(reads.len(), 2);
    assert_eq!(reads[0].lons, 357..360);
    assert_eq!(reads[1].lons, 0..2);
    assert_eq!(reads[0].lats, 0..5);
    assert_eq!(reads.iter().map(|r| r.lons.len()).sum::<usize>(), 5);
    assert!(reads.iter().all(|r| r.day == 2));

    assert_eq!(rtofs.provider().salinity().reads().len(), 2);
}

// Values only depend on the true position, so a grid whose seam is elsewhere reads the same
// neighborhood in one piece.
fn by_position(level: usize, row: usize, lon: f64) -> Optioned<f64> {
    // The central column is land below the surface
    if level > 0 && lon == 69.0 {
        return none();
    }
    some(10.0 + level as f64 + row as f64 / 10.0 + lon / 1000.0)
}

#[test]
fn test_split_window_matches_contiguous_read() {
    let depths = [0.0, 10.0, 20.0];

    let (temperature, salinity) = make_grids(&depths, LON_ORIGIN, by_position);
    let split = MemoryProvider::new(temperature, salinity).with_available(day(10));
    let mut split = make_atlas(split);

    let (temperature, salinity) = make_grids(&depths, 250.0, by_position);
    let contiguous = MemoryProvider::new(temperature, salinity).with_available(day(10));
    let mut contiguous = make_atlas(contiguous);

    let from_split = split.query(2.4, 69.3, day(10)).unwrap().unwrap();
    let from_contiguous = contiguous.query(2.4, 69.3, day(10)).unwrap().unwrap();

    assert_eq!(split.provider().temperature().reads().len(), 2);
    assert_eq!(contiguous.provider().temperature().reads().len(), 1);

    let a = first_profile(&from_split);
    let b = first_profile(&from_contiguous);
    assert_eq!(a.len(), 3);
    assert_eq!(a.meta().location(), Some((2.0, 69.0)));
    assert_eq!(a.meta().location(), b.meta().location());
    assert_eq!(a.temperature_profile(), b.temperature_profile());
    assert_eq!(a.salinity_profile(), b.salinity_profile());
    assert_eq!(a.speed_profile(), b.speed_profile());
}

#[test]
fn test_fully_masked_level_scenario() {
    let masked_bottom = |level: usize, _row: usize, _lon: f64| {
        if level == 2 {
            none()
        } else {
            some(15.0)
        }
    };
    let mut rtofs = make_atlas(make_provider(&[0.0, 50.0, 100.0], masked_bottom).with_available(day(10)));

    let profiles = rtofs.query(5.0, 100.0, day(10)).unwrap().unwrap();
    let profile = first_profile(&profiles);

    assert_eq!(depths_of(profile), vec![0.0, 50.0]);
}

#[test]
fn test_masked_level_does_not_stop_scan() {
    let gap = |level: usize, _row: usize, _lon: f64| {
        if level == 1 {
            none()
        } else {
            some(15.0 - level as f64)
        }
    };
    let mut rtofs = make_atlas(make_provider(&[0.0, 50.0, 100.0, 200.0], gap).with_available(day(10)));

    let profiles = rtofs.query(5.0, 100.0, day(10)).unwrap().unwrap();
    assert_eq!(depths_of(first_profile(&profiles)), vec![0.0, 100.0, 200.0]);
}

#[test]
fn test_cache_hit() {
    let mut rtofs = make_atlas(make_provider(&[0.0, 10.0], ocean).with_available(day(10)));

    assert!(rtofs.query(5.0, 100.0, day(10)).unwrap().is_some());
    let opens = rtofs.provider().open_count();
    assert_eq!(opens, 2);

    assert!(rtofs.query(6.0, 101.0, day(10)).unwrap().is_some());
    assert_eq!(rtofs.provider().open_count(), opens);
    assert_eq!(rtofs.provider().probed_dates(), vec![day(10)]);
}

#[test]
fn test_new_date_reloads() {
    let provider = make_provider(&[0.0, 10.0], ocean)
        .with_available(day(10))
        .with_available(day(11));
    let mut rtofs = make_atlas(provider);

    rtofs.query(5.0, 100.0, day(10)).unwrap().unwrap();
    rtofs.query(5.0, 100.0, day(11)).unwrap().unwrap();

    assert_eq!(rtofs.last_loaded_day(), Some(day(11)));
    assert_eq!(rtofs.provider().open_count(), 4);
}

#[test]
fn test_fallback_to_previous_day() {
    let mut rtofs = make_atlas(make_provider(&[0.0, 10.0], ocean).with_available(day(9)));

    let profiles = rtofs.query(5.0, 100.0, day(10)).unwrap().unwrap();
    assert_eq!(rtofs.last_loaded_day(), Some(day(9)));
    assert_eq!(rtofs.provider().probed_dates(), vec![day(10), day(9)]);

    let meta = first_profile(&profiles).meta();
    assert_eq!(meta.original_path(), Some("RTOFS_20240510"));
    assert_eq!(meta.utc_time(), day(10).and_hms_opt(0, 0, 0));
}

#[test]
fn test_no_run_available() {
    let mut rtofs = make_atlas(make_provider(&[0.0, 10.0], ocean).with_available(day(1)));
    rtofs.download(day(1)).unwrap();
    assert!(rtofs.is_present());

    assert!(rtofs.query(5.0, 100.0, day(10)).unwrap().is_none());
    assert!(!rtofs.is_present());
    assert_eq!(rtofs.last_loaded_day(), None);

    assert_eq!(
        rtofs.try_query(5.0, 100.0, day(10)).unwrap_err(),
        AtlasError::DataUnavailable { date: day(10) }
    );
}

#[test]
fn test_server_unreachable() {
    let provider = make_provider(&[0.0, 10.0], ocean)
        .with_available(day(10))
        .with_unreachable(true);
    let mut rtofs = make_atlas(provider);

    assert!(rtofs.query(5.0, 100.0, day(10)).unwrap().is_none());
    assert!(matches!(
        rtofs.try_query(5.0, 100.0, day(10)),
        Err(AtlasError::DataAccess(_))
    ));
    assert!(!rtofs.is_present());
}

#[test]
fn test_broken_run() {
    let mut rtofs = make_atlas(make_provider(&[0.0, 10.0], ocean).with_broken(day(10)));

    assert!(rtofs.query(5.0, 100.0, day(10)).unwrap().is_none());
    assert!(!rtofs.is_present());
}

#[test]
fn test_no_data_at_location_keeps_session() {
    let mut rtofs = make_atlas(make_provider(&[0.0, 10.0], land).with_available(day(10)));

    assert!(rtofs.query(5.0, 100.0, day(10)).unwrap().is_none());
    assert!(rtofs.is_present());
    assert_eq!(rtofs.last_loaded_day(), Some(day(10)));

    assert!(matches!(
        rtofs.try_query(5.0, 100.0, day(10)),
        Err(AtlasError::NoDataAtLocation { .. })
    ));
}

#[test]
fn test_invalid_position() {
    let mut rtofs = make_atlas(make_provider(&[0.0, 10.0], ocean).with_available(day(10)));

    assert!(matches!(
        rtofs.query(f64::NAN, 100.0, day(10)),
        Err(AtlasError::InvalidInput(_))
    ));
    assert!(matches!(
        rtofs.query(5.0, 400.0, day(10)),
        Err(AtlasError::InvalidInput(_))
    ));
}

#[test]
fn test_profile_content() {
    let mut rtofs = make_atlas(make_provider(&[0.0, 100.0, 1000.0], ocean).with_available(day(10)));

    let profiles = rtofs.query(5.2, -150.1, day(10)).unwrap().unwrap();
    let profile = first_profile(&profiles);
    let meta = profile.meta();

    assert_eq!(meta.sensor_type(), SensorType::Synthetic);
    assert_eq!(meta.probe_type(), ProbeType::Rtofs);
    assert_eq!(meta.location(), Some((5.0, -150.0)));

    assert_eq!(depths_of(profile), vec![0.0, 100.0, 1000.0]);
    assert!(profile.salinity_profile().iter().all(|s| *s == some(35.0)));
    assert_eq!(profile.speed_profile().len(), 3);

    let rows: Vec<_> = profile.top_down().collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].depth, some(Meters(1000.0)));
    assert!(rows.iter().all(|row| row.speed.is_some()));
}

#[test]
fn test_progress_stages() {
    let progress = RecordingProgress::default();
    let mut rtofs = make_atlas(make_provider(&[0.0, 10.0], ocean).with_available(day(10)))
        .with_progress(progress.clone());

    rtofs.query(5.0, 100.0, day(10)).unwrap().unwrap();

    assert_eq!(
        progress.events(),
        vec![
            ProgressEvent::Start("Download RTOFS".to_owned()),
            ProgressEvent::Update(30),
            ProgressEvent::Update(60),
            ProgressEvent::Update(80),
            ProgressEvent::Update(100),
            ProgressEvent::End,
            ProgressEvent::Start("Retrieve RTOFS data".to_owned()),
            ProgressEvent::Update(40),
            ProgressEvent::Update(70),
            ProgressEvent::Update(90),
            ProgressEvent::End,
        ]
    );
}

#[test]
fn test_progress_disabled_in_server_mode() {
    let progress = RecordingProgress::default();
    let config = rtofs_atlas::AtlasConfig {
        server_mode: true,
        ..rtofs_atlas::AtlasConfig::default()
    };
    let provider = make_provider(&[0.0, 10.0], ocean).with_available(day(10));
    let mut rtofs = rtofs_atlas::Rtofs::with_provider(config, provider)
        .unwrap()
        .with_progress(progress.clone());

    rtofs.query(5.0, 100.0, day(10)).unwrap().unwrap();
    assert!(progress.events().is_empty());
}

#[test]
fn test_clear_data() {
    let mut rtofs = make_atlas(make_provider(&[0.0, 10.0], ocean).with_available(day(10)));

    assert_eq!(rtofs.download(day(10)), Ok(day(10)));
    assert!(rtofs.is_present());

    rtofs.clear_data();
    assert!(!rtofs.is_present());
    assert_eq!(rtofs.last_loaded_day(), None);
    assert_eq!(rtofs.name(), "RTOFS");
    assert_eq!(rtofs.desc(), "Global Real-Time Ocean Forecast System");
}
