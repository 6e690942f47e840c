//! Time and sidereal calculations.
//!
//! Provides Greenwich Mean Sidereal Time (GMST) for Earth-fixed positioning
//! and the epoch window the whole application samples satellites over.

use chrono::{DateTime, Duration, Timelike, Utc};

pub const SECONDS_PER_DAY: f64 = 86400.0;
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;
pub const GMST_BASE_DEG: f64 = 280.46061837;
pub const GMST_ROTATION_PER_DAY: f64 = 360.98564736629;
pub const GMST_CORRECTION: f64 = 0.000387933;

/// GMST in radians for a UTC timestamp (IAU 1982 polynomial).
pub fn greenwich_mean_sidereal_time(timestamp: DateTime<Utc>) -> f64 {
    let j2000 = DateTime::parse_from_rfc3339("2000-01-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let days_since_j2000 =
        (timestamp - j2000).num_milliseconds() as f64 / (1000.0 * SECONDS_PER_DAY);
    let centuries = days_since_j2000 / DAYS_PER_JULIAN_CENTURY;
    let gmst_degrees = GMST_BASE_DEG
        + GMST_ROTATION_PER_DAY * days_since_j2000
        + GMST_CORRECTION * centuries * centuries
        - centuries * centuries * centuries / 38_710_000.0;
    gmst_degrees.rem_euclid(360.0).to_radians()
}

/// The sampling window every view works against: a start instant, a total
/// duration and a fixed step. Satellite tracks, ground traces and sky passes
/// are all sampled on this grid.
#[derive(Clone, Copy, PartialEq)]
pub struct EpochWindow {
    pub start: DateTime<Utc>,
    pub duration_s: f64,
    pub step_s: f64,
}

impl EpochWindow {
    pub const DEFAULT_DURATION_S: f64 = 86400.0;
    pub const DEFAULT_STEP_S: f64 = 36.0;

    /// A 24 h window anchored at UTC midnight of the current day.
    pub fn starting_today() -> Self {
        let now = Utc::now();
        let start = now
            .with_hour(0)
            .and_then(|t| t.with_minute(0))
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        Self {
            start,
            duration_s: Self::DEFAULT_DURATION_S,
            step_s: Self::DEFAULT_STEP_S,
        }
    }

    pub fn num_samples(&self) -> usize {
        (self.duration_s / self.step_s).floor() as usize + 1
    }

    /// Sample offsets in seconds from the window start, inclusive of both ends
    /// of the grid.
    pub fn offsets(&self) -> impl Iterator<Item = f64> + '_ {
        let step = self.step_s;
        (0..self.num_samples()).map(move |i| i as f64 * step)
    }

    pub fn time_at(&self, offset_s: f64) -> DateTime<Utc> {
        self.start + Duration::milliseconds((offset_s * 1000.0) as i64)
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.time_at(self.duration_s)
    }

    pub fn clamp_offset(&self, offset_s: f64) -> f64 {
        offset_s.clamp(0.0, self.duration_s)
    }
}

impl Default for EpochWindow {
    fn default() -> Self {
        Self::starting_today()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gmst_at_j2000_epoch() {
        let t = DateTime::parse_from_rfc3339("2000-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_relative_eq!(
            greenwich_mean_sidereal_time(t),
            GMST_BASE_DEG.to_radians(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn gmst_repeats_after_a_sidereal_day() {
        let t = DateTime::parse_from_rfc3339("2022-12-18T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let sidereal_day = Duration::milliseconds(86_164_091);
        let a = greenwich_mean_sidereal_time(t);
        let b = greenwich_mean_sidereal_time(t + sidereal_day);
        assert_relative_eq!(a, b, epsilon = 1e-4);
    }

    #[test]
    fn gmst_advances_about_a_degree_per_four_minutes() {
        let t = DateTime::parse_from_rfc3339("2022-12-18T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let a = greenwich_mean_sidereal_time(t);
        let b = greenwich_mean_sidereal_time(t + Duration::minutes(4));
        let delta = (b - a).rem_euclid(2.0 * std::f64::consts::PI);
        assert_relative_eq!(delta.to_degrees(), 1.0027, epsilon = 1e-3);
    }

    #[test]
    fn window_sampling_grid() {
        let window = EpochWindow {
            start: DateTime::parse_from_rfc3339("2022-12-18T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            duration_s: 86400.0,
            step_s: 36.0,
        };
        assert_eq!(window.num_samples(), 2401);
        let offsets: Vec<f64> = window.offsets().collect();
        assert_relative_eq!(offsets[0], 0.0);
        assert_relative_eq!(offsets[1], 36.0);
        assert_relative_eq!(*offsets.last().unwrap(), 86400.0);
        assert_eq!(
            window.time_at(3600.0),
            DateTime::parse_from_rfc3339("2022-12-18T01:00:00Z").unwrap()
        );
        assert_eq!(window.end(), window.time_at(window.duration_s));
    }

    #[test]
    fn clamp_keeps_offsets_inside_the_window() {
        let window = EpochWindow {
            start: Utc::now(),
            duration_s: 7200.0,
            step_s: 30.0,
        };
        assert_relative_eq!(window.clamp_offset(-5.0), 0.0);
        assert_relative_eq!(window.clamp_offset(9000.0), 7200.0);
        assert_relative_eq!(window.clamp_offset(100.0), 100.0);
    }
}
