//! Small helpers shared by the grid and profile code.

/// Wrap a longitude into the range [-180, 180).
#[inline]
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Shift a longitude east by whole turns so it is not below the grid's origin. RTOFS longitudes
/// start around 74°E and run past 360.
#[inline]
pub fn longitude_east_of(lon: f64, origin: f64) -> f64 {
    if lon < origin {
        lon + 360.0
    } else {
        lon
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(0.0), 0.0);
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(429.0), 69.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert_eq!(normalize_longitude(-180.0), -180.0);
    }

    #[test]
    fn test_longitude_east_of() {
        assert_eq!(longitude_east_of(69.0, 70.0), 429.0);
        assert_eq!(longitude_east_of(-70.0, 74.16), 290.0);
        assert_eq!(longitude_east_of(75.0, 74.16), 75.0);
    }
}
