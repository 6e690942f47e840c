//! SGP4 sampling over the epoch window and the TEME → Earth-fixed chain.

use crate::earth;
use crate::math::wrap_lon_deg;
use crate::time::{greenwich_mean_sidereal_time, EpochWindow};
use crate::tle::TleSatellite;
use chrono::{DateTime, Utc};

#[derive(Clone, Copy, Debug)]
pub struct SubPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_km: f64,
}

#[derive(Clone, Copy)]
pub struct TrackPoint {
    pub offset_s: f64,
    /// Inertial (TEME) position in km.
    pub teme_km: [f64; 3],
    pub sub: SubPoint,
}

/// One satellite's samples across the window. Samples where propagation
/// failed are simply absent.
#[derive(Clone)]
pub struct OrbitTrack {
    pub sat_index: usize,
    pub name: String,
    pub points: Vec<TrackPoint>,
}

impl OrbitTrack {
    /// The sample nearest to an offset into the window.
    pub fn point_near_offset(&self, offset_s: f64) -> Option<&TrackPoint> {
        if self.points.is_empty() {
            return None;
        }
        let idx = self.points.partition_point(|p| p.offset_s < offset_s);
        if idx == 0 {
            return self.points.first();
        }
        if idx >= self.points.len() {
            return self.points.last();
        }
        let before = &self.points[idx - 1];
        let after = &self.points[idx];
        if offset_s - before.offset_s <= after.offset_s - offset_s {
            Some(before)
        } else {
            Some(after)
        }
    }
}

/// TEME position in km at an absolute time.
pub fn position_at(sat: &TleSatellite, time: DateTime<Utc>) -> Result<[f64; 3], sgp4::Error> {
    let minutes_since_epoch = time.timestamp() as f64 / 60.0 - sat.epoch_minutes;
    let prediction = sat
        .constants
        .propagate(sgp4::MinutesSinceEpoch(minutes_since_epoch))?;
    Ok(prediction.position)
}

/// Rotates an inertial TEME position into the Earth-fixed frame.
pub fn teme_to_ecef(teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let (sin_g, cos_g) = gmst.sin_cos();
    [
        teme[0] * cos_g + teme[1] * sin_g,
        -teme[0] * sin_g + teme[1] * cos_g,
        teme[2],
    ]
}

/// Geodetic subpoint of an Earth-fixed position (WGS-84, iterative latitude).
pub fn ecef_to_geodetic(ecef: [f64; 3]) -> SubPoint {
    let [x, y, z] = ecef;
    let r_xy = (x * x + y * y).sqrt();
    let lon_deg = wrap_lon_deg(y.atan2(x).to_degrees());
    let e2 = earth::eccentricity_sq();
    let a = earth::EQUATORIAL_RADIUS_KM;

    if r_xy < 1e-6 {
        // On the polar axis the longitude is arbitrary and the iteration
        // below degenerates.
        return SubPoint {
            lat_deg: 90.0_f64.copysign(z),
            lon_deg: 0.0,
            alt_km: z.abs() - earth::polar_radius_km(),
        };
    }

    let mut lat = z.atan2(r_xy);
    for _ in 0..10 {
        let c = 1.0 / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();
        let next = (z + a * c * e2 * lat.sin()).atan2(r_xy);
        if (next - lat).abs() < 1e-10 {
            lat = next;
            break;
        }
        lat = next;
    }
    let c = 1.0 / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();
    let alt_km = r_xy / lat.cos() - a * c;

    SubPoint {
        lat_deg: lat.to_degrees(),
        lon_deg,
        alt_km,
    }
}

/// Subpoint of a TEME position at an absolute time.
pub fn subpoint_at(teme: [f64; 3], time: DateTime<Utc>) -> SubPoint {
    let gmst = greenwich_mean_sidereal_time(time);
    ecef_to_geodetic(teme_to_ecef(teme, gmst))
}

/// Samples every satellite across the window. Satellites that fail to
/// propagate at every sample (decayed, or an epoch far outside the window)
/// are dropped with a warning instead of aborting the run.
pub fn sample_tracks(satellites: &[TleSatellite], window: &EpochWindow) -> Vec<OrbitTrack> {
    let grid: Vec<(f64, DateTime<Utc>, f64)> = window
        .offsets()
        .map(|offset_s| {
            let time = window.time_at(offset_s);
            (offset_s, time, greenwich_mean_sidereal_time(time))
        })
        .collect();

    let mut tracks = Vec::with_capacity(satellites.len());
    for (sat_index, sat) in satellites.iter().enumerate() {
        let mut points = Vec::with_capacity(grid.len());
        let mut failed = 0usize;
        for &(offset_s, time, gmst) in &grid {
            match position_at(sat, time) {
                Ok(teme_km) => {
                    let sub = ecef_to_geodetic(teme_to_ecef(teme_km, gmst));
                    points.push(TrackPoint {
                        offset_s,
                        teme_km,
                        sub,
                    });
                }
                Err(_) => failed += 1,
            }
        }
        if points.is_empty() {
            tracing::warn!(
                "dropping {}: propagation failed across the whole window",
                sat.name
            );
            continue;
        }
        if failed > 0 {
            tracing::debug!("{}: {} of {} samples failed", sat.name, failed, grid.len());
        }
        tracks.push(OrbitTrack {
            sat_index,
            name: sat.name.clone(),
            points,
        });
    }
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tle::parse_tle_text;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn iss() -> TleSatellite {
        let feed = "ISS (ZARYA)\n\
            1 25544U 98067A   19343.69339541  .00001764  00000-0  40797-4 0  9009\n\
            2 25544  51.6439 211.2001 0007417  17.6667  85.6398 15.50103472202482\n";
        parse_tle_text(feed).unwrap().remove(0)
    }

    fn epoch_window(duration_s: f64, step_s: f64) -> EpochWindow {
        let sat = iss();
        let start = Utc
            .timestamp_opt((sat.epoch_minutes * 60.0) as i64, 0)
            .unwrap();
        EpochWindow {
            start,
            duration_s,
            step_s,
        }
    }

    #[test]
    fn ecef_rotation_at_zero_gmst_is_identity() {
        let p = teme_to_ecef([1.0, 2.0, 3.0], 0.0);
        assert_relative_eq!(p[0], 1.0);
        assert_relative_eq!(p[1], 2.0);
        assert_relative_eq!(p[2], 3.0);
    }

    #[test]
    fn ecef_rotation_quarter_turn() {
        let p = teme_to_ecef([1.0, 0.0, 0.0], std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(p[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], -1.0, epsilon = 1e-12);
        assert_relative_eq!(p[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn geodetic_subpoint_on_the_equator() {
        let sub = ecef_to_geodetic([7000.0, 0.0, 0.0]);
        assert_relative_eq!(sub.lat_deg, 0.0, epsilon = 1e-9);
        assert_relative_eq!(sub.lon_deg, 0.0, epsilon = 1e-9);
        assert_relative_eq!(sub.alt_km, 7000.0 - earth::EQUATORIAL_RADIUS_KM, epsilon = 1e-6);
    }

    #[test]
    fn geodetic_subpoint_at_the_pole() {
        let sub = ecef_to_geodetic([0.0, 0.0, 7000.0]);
        assert_relative_eq!(sub.lat_deg, 90.0, epsilon = 1e-9);
        assert_relative_eq!(sub.alt_km, 7000.0 - earth::polar_radius_km(), epsilon = 1e-6);
        let south = ecef_to_geodetic([0.0, 0.0, -7000.0]);
        assert_relative_eq!(south.lat_deg, -90.0, epsilon = 1e-9);
    }

    #[test]
    fn geodetic_latitude_exceeds_geocentric_at_mid_latitudes() {
        // Same geocentric angle of 45 degrees; the ellipsoid pushes the
        // geodetic latitude higher.
        let r = 7000.0 / 2.0_f64.sqrt();
        let sub = ecef_to_geodetic([r, 0.0, r]);
        assert!(sub.lat_deg > 45.0);
        assert!(sub.lat_deg < 45.5);
    }

    #[test]
    fn track_samples_the_whole_window() {
        let sat = iss();
        let window = epoch_window(5400.0, 60.0);
        let tracks = sample_tracks(std::slice::from_ref(&sat), &window);
        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert_eq!(track.points.len(), window.num_samples());
        for p in &track.points {
            assert!(
                (300.0..500.0).contains(&p.sub.alt_km),
                "ISS altitude out of band: {}",
                p.sub.alt_km
            );
            assert!(p.sub.lat_deg.abs() <= 52.0, "beyond inclination band");
        }
    }

    #[test]
    fn nearest_sample_lookup() {
        let sat = iss();
        let window = epoch_window(600.0, 60.0);
        let tracks = sample_tracks(std::slice::from_ref(&sat), &window);
        let track = &tracks[0];
        assert_relative_eq!(track.point_near_offset(0.0).unwrap().offset_s, 0.0);
        assert_relative_eq!(track.point_near_offset(89.0).unwrap().offset_s, 60.0);
        assert_relative_eq!(track.point_near_offset(91.0).unwrap().offset_s, 120.0);
        assert_relative_eq!(track.point_near_offset(1e9).unwrap().offset_s, 600.0);
    }
}
