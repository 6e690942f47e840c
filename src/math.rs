//! Rotation and angle helpers for the 3D camera and map views.

use nalgebra::{Matrix3, Vector3};
use std::f64::consts::FRAC_PI_2;

pub fn rotate_point_matrix(x: f64, y: f64, z: f64, rot: &Matrix3<f64>) -> (f64, f64, f64) {
    let v = rot * Vector3::new(x, y, z);
    (v.x, v.y, v.z)
}

pub fn rotation_from_drag(dx: f64, dy: f64) -> Matrix3<f64> {
    let rot_y = Matrix3::new(
        dx.cos(), 0.0, dx.sin(),
        0.0, 1.0, 0.0,
        -dx.sin(), 0.0, dx.cos(),
    );
    let rot_x = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, dy.cos(), -dy.sin(),
        0.0, dy.sin(), dy.cos(),
    );
    rot_x * rot_y
}

/// Camera rotation that centers the view on a given latitude/longitude (radians).
pub fn lat_lon_to_matrix(lat: f64, lon: f64) -> Matrix3<f64> {
    let lon = -lon - FRAC_PI_2;
    let (sl, cl) = (lat.sin(), lat.cos());
    let (sn, cn) = (lon.sin(), lon.cos());
    Matrix3::new(
        cn, 0.0, sn,
        sl * sn, cl, -sl * cn,
        -cl * sn, sl, cl * cn,
    )
}

/// Normalizes a longitude in degrees into (-180, 180].
pub fn wrap_lon_deg(mut lon: f64) -> f64 {
    while lon <= -180.0 {
        lon += 360.0;
    }
    while lon > 180.0 {
        lon -= 360.0;
    }
    lon
}

/// Normalizes an azimuth in degrees into [0, 360).
pub fn wrap_azimuth_deg(az: f64) -> f64 {
    az.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wrap_lon_stays_in_range() {
        assert_relative_eq!(wrap_lon_deg(190.0), -170.0);
        assert_relative_eq!(wrap_lon_deg(-190.0), 170.0);
        assert_relative_eq!(wrap_lon_deg(540.0), 180.0);
        assert_relative_eq!(wrap_lon_deg(-180.0), 180.0);
        assert_relative_eq!(wrap_lon_deg(45.0), 45.0);
    }

    #[test]
    fn wrap_azimuth_stays_in_range() {
        assert_relative_eq!(wrap_azimuth_deg(-90.0), 270.0);
        assert_relative_eq!(wrap_azimuth_deg(360.0), 0.0);
        assert_relative_eq!(wrap_azimuth_deg(725.0), 5.0);
    }

    #[test]
    fn drag_rotation_is_orthonormal() {
        let m = rotation_from_drag(0.3, -0.7);
        let should_be_identity = m * m.transpose();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(should_be_identity[(i, j)], expected, epsilon = 1e-12);
            }
        }
        assert_relative_eq!(m.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_drag_is_identity() {
        let m = rotation_from_drag(0.0, 0.0);
        let (x, y, z) = rotate_point_matrix(1.0, 2.0, 3.0, &m);
        assert_relative_eq!(x, 1.0);
        assert_relative_eq!(y, 2.0);
        assert_relative_eq!(z, 3.0);
    }

    #[test]
    fn lat_lon_matrix_centers_target() {
        // The surface point at (lat, lon) must land on the +z (towards the
        // viewer) axis after the camera rotation.
        let lat = 0.7_f64;
        let lon = -1.2_f64;
        let m = lat_lon_to_matrix(lat, lon);
        let (x, y, z) = rotate_point_matrix(
            lat.cos() * lon.cos(),
            lat.sin(),
            -lat.cos() * lon.sin(),
            &m,
        );
        assert_relative_eq!(x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(z, 1.0, epsilon = 1e-9);
    }
}
