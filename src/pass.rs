use crate::earth;
use crate::math::wrap_azimuth_deg;
use crate::propagate::{position_at, teme_to_ecef};
use crate::time::{greenwich_mean_sidereal_time, EpochWindow};
use crate::tle::TleSatellite;

#[derive(Clone, PartialEq)]
pub struct GroundSite {
    pub name: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
}

impl Default for GroundSite {
    fn default() -> Self {
        // University Park, Nottingham.
        Self {
            name: "Nottingham".to_string(),
            lat_deg: 52.9388,
            lon_deg: -1.1981,
            alt_m: 50.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LookAngle {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct PassSample {
    pub offset_s: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

/// One interval during which the satellite stays above the site's horizon.
/// AOS/LOS offsets are refined below sample resolution; the trace keeps the
/// window-grid samples.
#[derive(Clone)]
pub struct SkyPass {
    pub aos_offset_s: f64,
    pub los_offset_s: f64,
    pub max_elevation_deg: f64,
    pub samples: Vec<PassSample>,
}

impl SkyPass {
    pub fn duration_s(&self) -> f64 {
        self.los_offset_s - self.aos_offset_s
    }
}

/// Earth-fixed position of the site on the WGS-84 ellipsoid.
pub fn site_ecef(site: &GroundSite) -> [f64; 3] {
    let lat = site.lat_deg.to_radians();
    let lon = site.lon_deg.to_radians();
    let alt_km = site.alt_m / 1000.0;
    let e2 = earth::eccentricity_sq();
    let c = 1.0 / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();
    let s = c * (1.0 - e2);
    let a = earth::EQUATORIAL_RADIUS_KM;
    [
        (a * c + alt_km) * lat.cos() * lon.cos(),
        (a * c + alt_km) * lat.cos() * lon.sin(),
        (a * s + alt_km) * lat.sin(),
    ]
}

/// Azimuth/elevation/range of an inertial satellite position as seen from
/// the site, via the topocentric south-east-zenith frame.
pub fn look_angle(
    site: &GroundSite,
    teme_km: [f64; 3],
    time: chrono::DateTime<chrono::Utc>,
) -> LookAngle {
    let gmst = greenwich_mean_sidereal_time(time);
    let sat = teme_to_ecef(teme_km, gmst);
    let obs = site_ecef(site);
    let rho = [sat[0] - obs[0], sat[1] - obs[1], sat[2] - obs[2]];
    let range_km = (rho[0] * rho[0] + rho[1] * rho[1] + rho[2] * rho[2]).sqrt();

    let lat = site.lat_deg.to_radians();
    let lon = site.lon_deg.to_radians();
    let south = lat.sin() * lon.cos() * rho[0] + lat.sin() * lon.sin() * rho[1] - lat.cos() * rho[2];
    let east = -lon.sin() * rho[0] + lon.cos() * rho[1];
    let up = lat.cos() * lon.cos() * rho[0] + lat.cos() * lon.sin() * rho[1] + lat.sin() * rho[2];

    let elevation_deg = if range_km < 1e-9 {
        90.0
    } else {
        (up / range_km).asin().to_degrees()
    };
    let azimuth_deg = wrap_azimuth_deg(east.atan2(-south).to_degrees());

    LookAngle {
        azimuth_deg,
        elevation_deg,
        range_km,
    }
}

/// Look angles on the window grid. Samples where propagation fails are
/// dropped, matching the track sampler.
pub fn sample_sky(site: &GroundSite, sat: &TleSatellite, window: &EpochWindow) -> Vec<PassSample> {
    window
        .offsets()
        .filter_map(|offset_s| {
            let time = window.time_at(offset_s);
            let teme = position_at(sat, time).ok()?;
            let look = look_angle(site, teme, time);
            Some(PassSample {
                offset_s,
                azimuth_deg: look.azimuth_deg,
                elevation_deg: look.elevation_deg,
            })
        })
        .collect()
}

fn above_horizon_runs(samples: &[PassSample]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    for (i, sample) in samples.iter().enumerate() {
        if sample.elevation_deg > 0.0 {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            runs.push((s, i - 1));
        }
    }
    if let Some(s) = start {
        // Still above the horizon at the window edge.
        runs.push((s, samples.len() - 1));
    }
    runs
}

/// Splits a sampled sky trace into passes. AOS/LOS sit on the sample grid;
/// `predict_passes` refines them.
pub fn segment_passes(samples: &[PassSample]) -> Vec<SkyPass> {
    above_horizon_runs(samples)
        .into_iter()
        .map(|(s, e)| {
            let trace = samples[s..=e].to_vec();
            let max_elevation_deg = trace
                .iter()
                .map(|p| p.elevation_deg)
                .fold(f64::MIN, f64::max);
            SkyPass {
                aos_offset_s: samples[s].offset_s,
                los_offset_s: samples[e].offset_s,
                max_elevation_deg,
                samples: trace,
            }
        })
        .collect()
}

fn elevation_at(
    site: &GroundSite,
    sat: &TleSatellite,
    window: &EpochWindow,
    offset_s: f64,
) -> Option<f64> {
    let time = window.time_at(offset_s);
    let teme = position_at(sat, time).ok()?;
    Some(look_angle(site, teme, time).elevation_deg)
}

/// Bisects the horizon crossing between an offset below and one above.
fn bisect_crossing(
    site: &GroundSite,
    sat: &TleSatellite,
    window: &EpochWindow,
    below_s: f64,
    above_s: f64,
) -> f64 {
    let mut below = below_s;
    let mut above = above_s;
    for _ in 0..15 {
        let mid = (below + above) * 0.5;
        match elevation_at(site, sat, window, mid) {
            Some(el) if el > 0.0 => above = mid,
            Some(_) => below = mid,
            None => break,
        }
    }
    (below + above) * 0.5
}

/// Full pass prediction for one satellite over the window, sorted by AOS.
pub fn predict_passes(site: &GroundSite, sat: &TleSatellite, window: &EpochWindow) -> Vec<SkyPass> {
    let samples = sample_sky(site, sat, window);
    let runs = above_horizon_runs(&samples);
    let mut passes = Vec::with_capacity(runs.len());
    for (s, e) in runs {
        let mut pass = SkyPass {
            aos_offset_s: samples[s].offset_s,
            los_offset_s: samples[e].offset_s,
            max_elevation_deg: samples[s..=e]
                .iter()
                .map(|p| p.elevation_deg)
                .fold(f64::MIN, f64::max),
            samples: samples[s..=e].to_vec(),
        };
        if s > 0 {
            pass.aos_offset_s =
                bisect_crossing(site, sat, window, samples[s - 1].offset_s, pass.aos_offset_s);
        }
        if e + 1 < samples.len() {
            pass.los_offset_s =
                bisect_crossing(site, sat, window, samples[e + 1].offset_s, pass.los_offset_s);
        }
        passes.push(pass);
    }
    tracing::debug!(
        "{}: {} passes over {} at up to {:.1} deg",
        sat.name,
        passes.len(),
        site.name,
        passes
            .iter()
            .map(|p| p.max_elevation_deg)
            .fold(f64::MIN, f64::max)
    );
    passes
}
