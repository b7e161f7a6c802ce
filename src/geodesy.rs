//! Distances between geographic positions on the WGS84 ellipsoid.
//!
//! Positions are given as longitude/latitude pairs in degrees, the same order the grid nodes are
//! stored in. Distances are in meters.

use metfor::Meters;
use std::f64::consts::PI;

const DTOR: f64 = PI / 180.0;

/// WGS84 semi-major axis in meters.
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis in meters.
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
/// Mean Earth radius for the spherical approximation.
const SPHERICAL_R: f64 = 6_371_008.8;

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1.0e-12;

/// Great-circle (haversine) distance on a sphere of mean Earth radius.
pub fn great_circle_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> Meters {
    let phi1 = lat1 * DTOR;
    let phi2 = lat2 * DTOR;
    let d_phi = (lat2 - lat1) * DTOR;
    let d_lambda = (lon2 - lon1) * DTOR;

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    Meters(SPHERICAL_R * c)
}

/// Ellipsoidal distance using Vincenty's inverse formula.
///
/// Vincenty's iteration does not converge for nearly antipodal points, in that case the
/// great-circle distance is returned instead.
pub fn distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> Meters {
    vincenty_inverse(lon1, lat1, lon2, lat2)
        .unwrap_or_else(|| great_circle_distance(lon1, lat1, lon2, lat2))
}

fn vincenty_inverse(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> Option<Meters> {
    if !(lon1.is_finite() && lat1.is_finite() && lon2.is_finite() && lat2.is_finite()) {
        return None;
    }

    let l = (lon2 - lon1) * DTOR;
    let u1 = ((1.0 - WGS84_F) * (lat1 * DTOR).tan()).atan();
    let u2 = ((1.0 - WGS84_F) * (lat2 * DTOR).tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();

        // Coincident points
        if sin_sigma == 0.0 {
            return Some(Meters(0.0));
        }

        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial line: cos_sq_alpha == 0
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));

        let lambda_prev = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        if (lambda - lambda_prev).abs() < CONVERGENCE {
            let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - WGS84_B.powi(2)) / WGS84_B.powi(2);
            let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = b
                * sin_sigma
                * (cos_2sigma_m
                    + b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));

            return Some(Meters(WGS84_B * a * (sigma - delta_sigma)));
        }
    }

    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utility::test_tools::approx_equal;
    use metfor::Quantity;

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(distance(-70.5, 43.1, -70.5, 43.1).unpack(), 0.0);
        assert_eq!(great_circle_distance(10.0, -5.0, 10.0, -5.0).unpack(), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude_at_equator() {
        // Meridian arc of the WGS84 ellipsoid from 0 to 1 degree is 110574.4 m
        let d = distance(0.0, 0.0, 0.0, 1.0).unpack();
        assert!(approx_equal(d, 110_574.4, 1.0), "d = {}", d);
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        // Equatorial arc is a * pi / 180
        let d = distance(0.0, 0.0, 1.0, 0.0).unpack();
        assert!(approx_equal(d, 111_319.49, 0.1), "d = {}", d);
    }

    #[test]
    fn test_longitude_wrap_is_seamless() {
        let d_east = distance(359.5, 10.0, 0.5, 10.0).unpack();
        let d_west = distance(-0.5, 10.0, 0.5, 10.0).unpack();
        assert!(approx_equal(d_east, d_west, 1.0e-6));
    }

    #[test]
    fn test_ellipsoid_close_to_sphere() {
        let d_ell = distance(-70.0, 42.0, -69.0, 43.0).unpack();
        let d_sph = great_circle_distance(-70.0, 42.0, -69.0, 43.0).unpack();
        assert!((d_ell - d_sph).abs() / d_sph < 0.005);
    }

    #[test]
    fn test_antipodal_falls_back() {
        let d = distance(0.0, 0.0, 180.0, 0.0).unpack();
        assert!(d.is_finite());
        assert!(d > 19_900_000.0);
    }
}
