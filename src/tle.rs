//! Two-Line Element (TLE) ingestion.
//!
//! Fetches element-set feeds from CelesTrak and decodes them into one record
//! per satellite, ready for SGP4 propagation.

use crate::earth;
use crate::time::SECONDS_PER_DAY;
use sgp4::Constants;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TleGroup {
    Gps,
    Galileo,
    Glonass,
    Beidou,
    Sbas,
    Stations,
    Brightest,
    Weather,
    Noaa,
}

impl TleGroup {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gps => "GPS",
            Self::Galileo => "Galileo",
            Self::Glonass => "GLONASS",
            Self::Beidou => "Beidou",
            Self::Sbas => "SBAS",
            Self::Stations => "Stations",
            Self::Brightest => "100 Brightest",
            Self::Weather => "Weather",
            Self::Noaa => "NOAA",
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Self::Gps => "https://celestrak.org/NORAD/elements/gp.php?GROUP=gps-ops&FORMAT=tle",
            Self::Galileo => "https://celestrak.org/NORAD/elements/gp.php?GROUP=galileo&FORMAT=tle",
            Self::Glonass => "https://celestrak.org/NORAD/elements/gp.php?GROUP=glo-ops&FORMAT=tle",
            Self::Beidou => "https://celestrak.org/NORAD/elements/gp.php?GROUP=beidou&FORMAT=tle",
            Self::Sbas => "https://celestrak.org/NORAD/elements/gp.php?GROUP=sbas&FORMAT=tle",
            Self::Stations => "https://celestrak.org/NORAD/elements/gp.php?GROUP=stations&FORMAT=tle",
            Self::Brightest => "https://celestrak.org/NORAD/elements/gp.php?GROUP=visual&FORMAT=tle",
            Self::Weather => "https://celestrak.org/NORAD/elements/gp.php?GROUP=weather&FORMAT=tle",
            Self::Noaa => "https://celestrak.org/NORAD/elements/gp.php?GROUP=noaa&FORMAT=tle",
        }
    }

    pub const ALL: [TleGroup; 9] = [
        Self::Gps,
        Self::Galileo,
        Self::Glonass,
        Self::Beidou,
        Self::Sbas,
        Self::Stations,
        Self::Brightest,
        Self::Weather,
        Self::Noaa,
    ];
}

impl Default for TleGroup {
    fn default() -> Self {
        Self::Gps
    }
}

#[derive(Clone)]
pub struct TleSatellite {
    pub name: String,
    pub norad_id: u64,
    pub constants: Constants,
    /// TLE epoch in minutes since the Unix epoch.
    pub epoch_minutes: f64,
    pub inclination_deg: f64,
    pub mean_motion: f64,
}

#[derive(Clone)]
pub enum TleLoadState {
    NotLoaded,
    Loading,
    Loaded { satellites: Vec<TleSatellite> },
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TleError {
    #[error("request failed: {0}")]
    Http(#[from] Box<ureq::Error>),
    #[error("reading response failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("no usable TLE records in feed")]
    Empty,
}

pub fn datetime_to_minutes(dt: &sgp4::chrono::NaiveDateTime) -> f64 {
    dt.and_utc().timestamp() as f64 / 60.0
}

/// Circular-orbit altitude implied by a mean motion in revolutions per day.
pub fn mean_motion_to_altitude_km(n_revs_per_day: f64) -> f64 {
    let n_rad_s = n_revs_per_day * 2.0 * std::f64::consts::PI / SECONDS_PER_DAY;
    let a = (earth::MU_KM3_S2 / (n_rad_s * n_rad_s)).powf(1.0 / 3.0);
    a - earth::MEAN_RADIUS_KM
}

/// Decodes a 3LE feed (name line followed by the two element lines) into one
/// record per satellite. Malformed record triples are skipped; only a feed
/// that yields nothing at all is an error.
pub fn parse_tle_text(data: &str) -> Result<Vec<TleSatellite>, TleError> {
    let lines: Vec<&str> = data.lines().collect();
    let mut satellites = Vec::new();

    let mut i = 0;
    while i + 2 < lines.len() {
        let name_line = lines[i].trim();
        let line1 = lines[i + 1].trim();
        let line2 = lines[i + 2].trim();

        if !line1.starts_with('1') || !line2.starts_with('2') {
            i += 1;
            continue;
        }

        match sgp4::Elements::from_tle(
            Some(name_line.to_string()),
            line1.as_bytes(),
            line2.as_bytes(),
        ) {
            Ok(elements) => {
                if let Ok(constants) = Constants::from_elements(&elements) {
                    satellites.push(TleSatellite {
                        name: elements.object_name.clone().unwrap_or_default(),
                        norad_id: elements.norad_id,
                        epoch_minutes: datetime_to_minutes(&elements.datetime),
                        inclination_deg: elements.inclination,
                        mean_motion: elements.mean_motion,
                        constants,
                    });
                }
            }
            Err(e) => {
                tracing::debug!("skipping record {:?}: {}", name_line, e);
            }
        }

        i += 3;
    }

    if satellites.is_empty() {
        Err(TleError::Empty)
    } else {
        Ok(satellites)
    }
}

pub fn fetch_group(group: TleGroup) -> Result<Vec<TleSatellite>, TleError> {
    tracing::info!("fetching {} elements from CelesTrak", group.label());
    let response = ureq::get(group.url()).call().map_err(Box::new)?;
    let body = response.into_string()?;
    let satellites = parse_tle_text(&body)?;
    tracing::info!("decoded {} satellites for {}", satellites.len(), group.label());
    Ok(satellites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const FEED: &str = indoc! {"
        ISS (ZARYA)
        1 25544U 98067A   19343.69339541  .00001764  00000-0  40797-4 0  9009
        2 25544  51.6439 211.2001 0007417  17.6667  85.6398 15.50103472202482
        ZARYA AGAIN
        1 25544U 98067A   19343.69339541  .00001764  00000-0  40797-4 0  9009
        2 25544  51.6439 211.2001 0007417  17.6667  85.6398 15.50103472202482
    "};

    #[test]
    fn parses_one_record_per_name_element_triple() {
        let satellites = parse_tle_text(FEED).unwrap();
        assert_eq!(satellites.len(), 2);
        assert_eq!(satellites[0].name, "ISS (ZARYA)");
        assert_eq!(satellites[1].name, "ZARYA AGAIN");
        assert_eq!(satellites[0].norad_id, 25544);
        assert!((satellites[0].inclination_deg - 51.6439).abs() < 1e-6);
        assert!((satellites[0].mean_motion - 15.50103472).abs() < 1e-6);
        assert!(satellites[0].epoch_minutes > 0.0);
    }

    #[test]
    fn skips_a_corrupt_triple_and_keeps_the_rest() {
        // The middle record's line 1 is truncated.
        let feed = indoc! {"
            ISS (ZARYA)
            1 25544U 98067A   19343.69339541  .00001764  00000-0  40797-4 0  9009
            2 25544  51.6439 211.2001 0007417  17.6667  85.6398 15.50103472202482
            BROKEN
            1 25544U 98067A
            2 25544  51.6439 211.2001 0007417  17.6667  85.6398 15.50103472202482
            ZARYA AGAIN
            1 25544U 98067A   19343.69339541  .00001764  00000-0  40797-4 0  9009
            2 25544  51.6439 211.2001 0007417  17.6667  85.6398 15.50103472202482
        "};
        let satellites = parse_tle_text(feed).unwrap();
        assert_eq!(satellites.len(), 2);
        assert_eq!(satellites[0].name, "ISS (ZARYA)");
        assert_eq!(satellites[1].name, "ZARYA AGAIN");
    }

    #[test]
    fn empty_or_garbage_feed_is_an_error() {
        assert!(matches!(parse_tle_text(""), Err(TleError::Empty)));
        assert!(matches!(
            parse_tle_text("this is\nnot a\nTLE feed\nat all"),
            Err(TleError::Empty)
        ));
    }

    #[test]
    fn altitude_from_mean_motion() {
        // ISS: ~15.5 rev/day puts it in the 400 km band.
        let iss = mean_motion_to_altitude_km(15.50103472);
        assert!((400.0..450.0).contains(&iss), "got {iss}");
        // GPS: ~2.0057 rev/day sits near 20 200 km.
        let gps = mean_motion_to_altitude_km(2.0057);
        assert!((19500.0..20500.0).contains(&gps), "got {gps}");
    }

    #[test]
    fn every_group_has_a_celestrak_url() {
        for group in TleGroup::ALL {
            assert!(group.url().starts_with("https://celestrak.org/"));
            assert!(!group.label().is_empty());
        }
    }
}
