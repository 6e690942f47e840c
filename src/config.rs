//! Per-view settings and the view catalogue for the dock layout.

use nalgebra::Matrix3;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ViewKind {
    Orbit,
    GroundTrack,
    SkyPass,
}

impl ViewKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Orbit => "Orbit View",
            Self::GroundTrack => "Ground Track",
            Self::SkyPass => "Sky Pass",
        }
    }
}

#[derive(Clone)]
pub struct OrbitViewSettings {
    pub rotation: Matrix3<f64>,
    pub zoom: f64,
    pub show_graticule: bool,
    pub show_labels: bool,
}

impl Default for OrbitViewSettings {
    fn default() -> Self {
        Self {
            rotation: Matrix3::identity(),
            zoom: 1.0,
            show_graticule: true,
            show_labels: true,
        }
    }
}

#[derive(Clone)]
pub struct MapSettings {
    pub show_coastlines: bool,
    pub show_labels: bool,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            show_coastlines: true,
            show_labels: false,
        }
    }
}
