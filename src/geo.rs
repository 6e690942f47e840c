use std::path::PathBuf;

const COASTLINE_FILE: &str = "ne_110m_coastline.geojson";
const COASTLINE_URL: &str =
    "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_110m_coastline.geojson";

/// Coastline polylines as `[lon_deg, lat_deg]` pairs, ready for the map plot.
pub type Coastlines = Vec<Vec<[f64; 2]>>;

pub enum GeoLoadState {
    Loading,
    Loaded(Coastlines),
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("request failed: {0}")]
    Http(#[from] Box<ureq::Error>),
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad GeoJSON: {0}")]
    Shape(&'static str),
}

fn cache_dir() -> PathBuf {
    let base = std::env::var_os("HOME")
        .map(|h| PathBuf::from(h).join(".cache"))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("orbit-viz").join("geodata")
}

fn fetch_or_cache(filename: &str, url: &str) -> Result<String, GeoError> {
    let dir = cache_dir();
    let _ = std::fs::create_dir_all(&dir);
    let path = dir.join(filename);
    if path.exists() {
        tracing::debug!("using cached {}", path.display());
        return Ok(std::fs::read_to_string(&path)?);
    }
    tracing::info!("fetching {}", url);
    let resp = ureq::get(url).call().map_err(Box::new)?;
    let data = resp.into_string()?;
    let _ = std::fs::write(&path, &data);
    Ok(data)
}

fn extract_coord_line(arr: &serde_json::Value) -> Option<Vec<[f64; 2]>> {
    let points = arr.as_array()?;
    let coords: Vec<[f64; 2]> = points
        .iter()
        .filter_map(|p| {
            let pair = p.as_array()?;
            Some([pair.first()?.as_f64()?, pair.get(1)?.as_f64()?])
        })
        .collect();
    if coords.is_empty() {
        None
    } else {
        Some(coords)
    }
}

pub fn parse_coastlines(json: &str) -> Result<Coastlines, GeoError> {
    let v: serde_json::Value = serde_json::from_str(json)?;
    let features = v["features"].as_array().ok_or(GeoError::Shape("no features"))?;
    let mut polylines = Vec::new();
    for feat in features {
        let geom = &feat["geometry"];
        match geom["type"].as_str() {
            Some("LineString") => {
                if let Some(line) = extract_coord_line(&geom["coordinates"]) {
                    polylines.push(line);
                }
            }
            Some("MultiLineString") => {
                if let Some(arrs) = geom["coordinates"].as_array() {
                    for arr in arrs {
                        if let Some(line) = extract_coord_line(arr) {
                            polylines.push(line);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Ok(polylines)
}

/// Loads the Natural Earth coastline set, hitting the network only on a cold
/// cache.
pub fn load_coastlines() -> Result<Coastlines, GeoError> {
    let json = fetch_or_cache(COASTLINE_FILE, COASTLINE_URL)?;
    let coastlines = parse_coastlines(&json)?;
    tracing::info!("loaded {} coastline segments", coastlines.len());
    Ok(coastlines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn parses_line_and_multiline_features() {
        let json = indoc! {r#"
            {
              "type": "FeatureCollection",
              "features": [
                {
                  "type": "Feature",
                  "geometry": {
                    "type": "LineString",
                    "coordinates": [[-1.5, 52.9], [-1.1, 53.2], [-0.8, 53.5]]
                  }
                },
                {
                  "type": "Feature",
                  "geometry": {
                    "type": "MultiLineString",
                    "coordinates": [
                      [[10.0, 60.0], [11.0, 61.0]],
                      [[20.0, -30.0], [21.0, -31.0]]
                    ]
                  }
                },
                {
                  "type": "Feature",
                  "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
                }
              ]
            }
        "#};
        let lines = parse_coastlines(json).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 3);
        assert_eq!(lines[0][0], [-1.5, 52.9]);
        assert_eq!(lines[1], vec![[10.0, 60.0], [11.0, 61.0]]);
    }

    #[test]
    fn empty_collection_parses_to_no_lines() {
        let lines = parse_coastlines(r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn missing_features_is_an_error() {
        assert!(parse_coastlines(r#"{"type":"FeatureCollection"}"#).is_err());
        assert!(parse_coastlines("not json").is_err());
    }
}
