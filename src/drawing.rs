//! 2D and 3D drawing routines for the satellite views.
//!
//! Renders the wireframe orbit view, the ground-track map and the polar
//! sky-pass chart from egui_plot primitives. Handles camera rotation from
//! mouse drag, occlusion dimming behind the globe, and trace labelling.

use crate::config::{MapSettings, OrbitViewSettings};
use crate::earth;
use crate::math::{rotate_point_matrix, rotation_from_drag};
use crate::pass::SkyPass;
use crate::propagate::OrbitTrack;
use crate::time::EpochWindow;
use eframe::egui;
use egui_plot::{Line, LineStyle, Plot, PlotBounds, PlotPoint, PlotPoints, Points, Text};
use std::f64::consts::PI;

pub const NUM_TRACK_COLORS: usize = 31;

/// Jet-style color ramp cycling over `NUM_TRACK_COLORS` entries.
pub fn track_color(index: usize) -> egui::Color32 {
    let t = (index % NUM_TRACK_COLORS) as f64 / (NUM_TRACK_COLORS - 1) as f64;
    let r = (1.5 - (4.0 * t - 3.0).abs()).clamp(0.0, 1.0);
    let g = (1.5 - (4.0 * t - 2.0).abs()).clamp(0.0, 1.0);
    let b = (1.5 - (4.0 * t - 1.0).abs()).clamp(0.0, 1.0);
    egui::Color32::from_rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

pub fn dim_color(color: egui::Color32) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(
        (color.r() as f32 * 0.4) as u8,
        (color.g() as f32 * 0.4) as u8,
        (color.b() as f32 * 0.4) as u8,
        200,
    )
}

/// Inertial TEME position into the view frame: screen up follows the north
/// pole when the camera is untouched.
fn view_frame(p: [f64; 3]) -> [f64; 3] {
    [p[0], p[2], -p[1]]
}

/// Wireframe globe: meridians every 15 degrees and parallels every 15
/// degrees from -75 up to the pole, in the view frame.
fn graticule_lines() -> Vec<Vec<[f64; 3]>> {
    let r = earth::MEAN_RADIUS_KM;
    let mut lines = Vec::new();
    for lon_step in 0..12 {
        let lon = (lon_step as f64 * 15.0).to_radians();
        let pts = (0..=120)
            .map(|i| {
                let theta = i as f64 / 120.0 * 2.0 * PI;
                [
                    r * theta.cos() * lon.cos(),
                    r * theta.sin(),
                    r * theta.cos() * lon.sin(),
                ]
            })
            .collect();
        lines.push(pts);
    }
    for lat_step in -5i32..=6 {
        let lat = (f64::from(lat_step) * 15.0).to_radians();
        let pts = (0..=120)
            .map(|i| {
                let psi = i as f64 / 120.0 * 2.0 * PI;
                [
                    r * lat.cos() * psi.cos(),
                    r * lat.sin(),
                    r * lat.cos() * psi.sin(),
                ]
            })
            .collect();
        lines.push(pts);
    }
    lines
}

pub fn draw_orbit_view(
    ui: &mut egui::Ui,
    id: &str,
    tracks: &[OrbitTrack],
    settings: &mut OrbitViewSettings,
    snapshot_offset_s: f64,
    dark_mode: bool,
) {
    let size = ui.available_size();
    let plot = Plot::new(id)
        .data_aspect(1.0)
        .width(size.x)
        .height(size.y)
        .show_axes(false)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false);

    let max_radius = tracks
        .iter()
        .flat_map(|t| t.points.iter())
        .map(|p| {
            let [x, y, z] = p.teme_km;
            (x * x + y * y + z * z).sqrt()
        })
        .fold(earth::MEAN_RADIUS_KM * 1.5, f64::max);
    let margin = max_radius * 1.05 / settings.zoom;

    let grid_color = if dark_mode {
        egui::Color32::from_gray(80)
    } else {
        egui::Color32::from_gray(150)
    };
    let text_color = if dark_mode {
        egui::Color32::WHITE
    } else {
        egui::Color32::BLACK
    };
    let rotation = settings.rotation;
    let earth_r_sq = (earth::MEAN_RADIUS_KM * 0.95).powi(2);
    let show_graticule = settings.show_graticule;
    let show_labels = settings.show_labels;

    let response = plot.show(ui, |plot_ui| {
        plot_ui.set_plot_bounds(PlotBounds::from_min_max(
            [-margin, -margin],
            [margin, margin],
        ));

        if show_graticule {
            for line in graticule_lines() {
                let pts: Vec<[f64; 2]> = line
                    .iter()
                    .map(|&[x, y, z]| {
                        let (rx, ry, _) = rotate_point_matrix(x, y, z, &rotation);
                        [rx, ry]
                    })
                    .collect();
                plot_ui.line(Line::new("", PlotPoints::new(pts)).color(grid_color).width(0.4));
            }
        }

        for track in tracks {
            let color = track_color(track.sat_index);
            let mut bright: Vec<[f64; 2]> = Vec::new();
            let mut behind: Vec<[f64; 2]> = Vec::new();
            for p in &track.points {
                let [vx, vy, vz] = view_frame(p.teme_km);
                let (rx, ry, rz) = rotate_point_matrix(vx, vy, vz, &rotation);
                let occluded = rz < 0.0 && (rx * rx + ry * ry) < earth_r_sq;
                if occluded {
                    if !bright.is_empty() {
                        plot_ui.line(
                            Line::new("", PlotPoints::new(std::mem::take(&mut bright)))
                                .color(color)
                                .width(1.0),
                        );
                    }
                    behind.push([rx, ry]);
                } else {
                    if !behind.is_empty() {
                        plot_ui.line(
                            Line::new("", PlotPoints::new(std::mem::take(&mut behind)))
                                .color(dim_color(color))
                                .width(1.0),
                        );
                    }
                    bright.push([rx, ry]);
                }
            }
            if !bright.is_empty() {
                plot_ui.line(Line::new("", PlotPoints::new(bright)).color(color).width(1.0));
            }
            if !behind.is_empty() {
                plot_ui.line(
                    Line::new("", PlotPoints::new(behind))
                        .color(dim_color(color))
                        .width(1.0),
                );
            }

            if let Some(p) = track.point_near_offset(snapshot_offset_s) {
                let [vx, vy, vz] = view_frame(p.teme_km);
                let (rx, ry, _) = rotate_point_matrix(vx, vy, vz, &rotation);
                plot_ui.points(
                    Points::new("", PlotPoints::new(vec![[rx, ry]]))
                        .color(color)
                        .radius(3.0)
                        .filled(true),
                );
                if show_labels {
                    plot_ui.text(
                        Text::new(
                            "",
                            PlotPoint::new(rx, ry + margin * 0.02),
                            track.name.clone(),
                        )
                        .color(text_color),
                    );
                }
            }
        }
    });

    // Drag rotates the camera, scroll zooms.
    let resp = response.response;
    if resp.dragged() {
        let delta = resp.drag_delta();
        settings.rotation =
            rotation_from_drag(f64::from(delta.x) * 0.01, f64::from(delta.y) * 0.01)
                * settings.rotation;
    }
    if resp.hovered() {
        let scroll = f64::from(ui.input(|i| i.raw_scroll_delta.y));
        if scroll != 0.0 {
            settings.zoom = (settings.zoom * (1.0 + scroll * 0.002)).clamp(0.2, 200.0);
        }
    }
}

/// Breaks a lon/lat trace wherever it wraps across the antimeridian.
pub(crate) fn split_at_antimeridian(points: &[[f64; 2]]) -> Vec<Vec<[f64; 2]>> {
    let mut segments = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for &p in points {
        if let Some(last) = current.last() {
            if (p[0] - last[0]).abs() > 180.0 {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.push(p);
    }
    segments.push(current);
    segments.retain(|s| s.len() > 1);
    segments
}

pub fn draw_ground_track(
    ui: &mut egui::Ui,
    id: &str,
    tracks: &[OrbitTrack],
    coastlines: &[Vec<[f64; 2]>],
    settings: &MapSettings,
    snapshot_offset_s: f64,
    dark_mode: bool,
) {
    let size = ui.available_size();
    let plot = Plot::new(id)
        .width(size.x)
        .height(size.y)
        .include_x(-180.0)
        .include_x(180.0)
        .include_y(-90.0)
        .include_y(90.0)
        .show_axes([true, true]);

    let coast_color = if dark_mode {
        egui::Color32::from_gray(110)
    } else {
        egui::Color32::from_gray(90)
    };
    let text_color = if dark_mode {
        egui::Color32::WHITE
    } else {
        egui::Color32::BLACK
    };

    plot.show(ui, |plot_ui| {
        if settings.show_coastlines {
            for seg in coastlines {
                plot_ui.line(
                    Line::new("", PlotPoints::new(seg.clone()))
                        .color(coast_color)
                        .width(0.5),
                );
            }
        }

        plot_ui.line(
            Line::new("", PlotPoints::new(vec![[-180.0, 0.0], [180.0, 0.0]]))
                .color(egui::Color32::DARK_GRAY)
                .width(0.5),
        );
        plot_ui.line(
            Line::new("", PlotPoints::new(vec![[0.0, -90.0], [0.0, 90.0]]))
                .color(egui::Color32::DARK_GRAY)
                .width(0.5),
        );

        for track in tracks {
            let color = track_color(track.sat_index);
            let lonlat: Vec<[f64; 2]> = track
                .points
                .iter()
                .map(|p| [p.sub.lon_deg, p.sub.lat_deg])
                .collect();
            for seg in split_at_antimeridian(&lonlat) {
                plot_ui.line(Line::new("", PlotPoints::new(seg)).color(color).width(1.0));
            }

            if let Some(p) = track.point_near_offset(snapshot_offset_s) {
                plot_ui.points(
                    Points::new("", PlotPoints::new(vec![[p.sub.lon_deg, p.sub.lat_deg]]))
                        .color(color)
                        .radius(3.0)
                        .filled(true),
                );
                if settings.show_labels {
                    plot_ui.text(
                        Text::new(
                            "",
                            PlotPoint::new(p.sub.lon_deg, p.sub.lat_deg + 3.0),
                            track.name.clone(),
                        )
                        .color(text_color),
                    );
                }
            }
        }
    });
}

/// Azimuth/elevation to chart coordinates: north up, azimuth clockwise,
/// radius 90 - elevation.
pub(crate) fn polar_point(az_deg: f64, el_deg: f64) -> [f64; 2] {
    let radius = (90.0 - el_deg).clamp(0.0, 90.0);
    let az = az_deg.to_radians();
    [radius * az.sin(), radius * az.cos()]
}

pub fn draw_sky_pass(
    ui: &mut egui::Ui,
    id: &str,
    pass: Option<&SkyPass>,
    window: &EpochWindow,
    color: egui::Color32,
    dark_mode: bool,
) {
    let size = ui.available_size();
    let plot = Plot::new(id)
        .data_aspect(1.0)
        .width(size.x)
        .height(size.y)
        .show_axes(false)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false);

    let grid_color = if dark_mode {
        egui::Color32::from_gray(90)
    } else {
        egui::Color32::from_gray(150)
    };
    let text_color = if dark_mode {
        egui::Color32::WHITE
    } else {
        egui::Color32::BLACK
    };

    plot.show(ui, |plot_ui| {
        plot_ui.set_plot_bounds(PlotBounds::from_min_max([-110.0, -110.0], [110.0, 110.0]));

        for ring_el in [0.0_f64, 30.0, 60.0] {
            let radius = 90.0 - ring_el;
            let pts: Vec<[f64; 2]> = (0..=120)
                .map(|i| {
                    let a = i as f64 / 120.0 * 2.0 * PI;
                    [radius * a.sin(), radius * a.cos()]
                })
                .collect();
            plot_ui.line(
                Line::new("", PlotPoints::new(pts))
                    .color(grid_color)
                    .width(0.5)
                    .style(LineStyle::Dotted { spacing: 4.0 }),
            );
            if ring_el > 0.0 {
                plot_ui.text(
                    Text::new(
                        "",
                        PlotPoint::new(4.0, radius - 4.0),
                        format!("{ring_el:.0}°"),
                    )
                    .color(grid_color),
                );
            }
        }

        for k in 0..12 {
            let az = (f64::from(k) * 30.0).to_radians();
            plot_ui.line(
                Line::new(
                    "",
                    PlotPoints::new(vec![[0.0, 0.0], [90.0 * az.sin(), 90.0 * az.cos()]]),
                )
                .color(grid_color)
                .width(0.3),
            );
        }
        for (label, az_deg) in [("N", 0.0_f64), ("E", 90.0), ("S", 180.0), ("W", 270.0)] {
            let az = az_deg.to_radians();
            plot_ui.text(
                Text::new(
                    "",
                    PlotPoint::new(100.0 * az.sin(), 100.0 * az.cos()),
                    label,
                )
                .color(text_color),
            );
        }

        let Some(pass) = pass else {
            plot_ui.text(
                Text::new(
                    "",
                    PlotPoint::new(0.0, 0.0),
                    "no pass above the horizon in this window",
                )
                .color(text_color),
            );
            return;
        };

        let pts: Vec<[f64; 2]> = pass
            .samples
            .iter()
            .map(|s| polar_point(s.azimuth_deg, s.elevation_deg))
            .collect();
        plot_ui.line(
            Line::new("", PlotPoints::new(pts.clone()))
                .color(color)
                .width(1.5)
                .style(LineStyle::Dashed { length: 6.0 }),
        );
        if let (Some(first), Some(last)) = (pts.first(), pts.last()) {
            plot_ui.points(
                Points::new("", PlotPoints::new(vec![*first]))
                    .color(color)
                    .radius(3.0)
                    .filled(true),
            );
            plot_ui.points(
                Points::new("", PlotPoints::new(vec![*last]))
                    .color(dim_color(color))
                    .radius(3.0)
                    .filled(true),
            );
        }

        // HH:MM ticks roughly every 15 minutes of trace.
        let tick_every = ((900.0 / window.step_s).round() as usize).max(1);
        for (i, s) in pass.samples.iter().enumerate() {
            if i % tick_every != 0 && i != pass.samples.len() - 1 {
                continue;
            }
            let [x, y] = polar_point(s.azimuth_deg, s.elevation_deg);
            let stamp = window.time_at(s.offset_s).format("%H:%M").to_string();
            plot_ui.text(Text::new("", PlotPoint::new(x, y - 4.0), stamp).color(text_color));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn antimeridian_wrap_splits_the_trace() {
        let points = vec![
            [170.0, 10.0],
            [178.0, 12.0],
            [-178.0, 14.0],
            [-170.0, 16.0],
            [-165.0, 18.0],
        ];
        let segments = split_at_antimeridian(&points);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[1].len(), 3);
        assert_eq!(segments[0][1], [178.0, 12.0]);
        assert_eq!(segments[1][0], [-178.0, 14.0]);
    }

    #[test]
    fn contiguous_trace_stays_whole() {
        let points = vec![[0.0, 0.0], [10.0, 5.0], [20.0, 10.0]];
        let segments = split_at_antimeridian(&points);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 3);
    }

    #[test]
    fn single_points_produce_no_segments() {
        assert!(split_at_antimeridian(&[[0.0, 0.0]]).is_empty());
        assert!(split_at_antimeridian(&[]).is_empty());
    }

    #[test]
    fn polar_mapping_orientation() {
        // Zenith maps to the origin.
        let p = polar_point(123.0, 90.0);
        assert_relative_eq!(p[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(p[1], 0.0, epsilon = 1e-9);
        // Horizon north is straight up, horizon east to the right.
        let n = polar_point(0.0, 0.0);
        assert_relative_eq!(n[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(n[1], 90.0, epsilon = 1e-9);
        let e = polar_point(90.0, 0.0);
        assert_relative_eq!(e[0], 90.0, epsilon = 1e-9);
        assert_relative_eq!(e[1], 0.0, epsilon = 1e-9);
        // Below-horizon elevations clamp to the horizon ring.
        let clamped = polar_point(180.0, -20.0);
        assert_relative_eq!(clamped[1], -90.0, epsilon = 1e-9);
    }

    #[test]
    fn color_ramp_runs_blue_to_red() {
        let first = track_color(0);
        let last = track_color(NUM_TRACK_COLORS - 1);
        assert!(first.b() > first.r());
        assert!(last.r() > last.b());
        // Cycles instead of panicking past the palette end.
        assert_eq!(track_color(NUM_TRACK_COLORS), track_color(0));
    }

    #[test]
    fn dimmed_color_is_darker() {
        let c = track_color(5);
        let d = dim_color(c);
        assert!(d.r() <= c.r() && d.g() <= c.g() && d.b() <= c.b());
    }
}
