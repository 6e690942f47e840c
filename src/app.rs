//! Application shell and eframe integration.
//!
//! Owns the session state, drives the background TLE and coastline fetches,
//! rebuilds track and pass caches when their inputs change, and lays the
//! three views out in a dock next to the settings panel.

use crate::config::{MapSettings, OrbitViewSettings, ViewKind};
use crate::drawing::{draw_ground_track, draw_orbit_view, draw_sky_pass, track_color};
use crate::geo::{self, Coastlines, GeoError, GeoLoadState};
use crate::math::lat_lon_to_matrix;
use crate::pass::{predict_passes, GroundSite, SkyPass};
use crate::propagate::{sample_tracks, OrbitTrack};
use crate::time::EpochWindow;
use crate::tle::{self, TleError, TleGroup, TleLoadState, TleSatellite};
use eframe::egui;
use egui_dock::{DockArea, DockState, NodeIndex, TabViewer};
use std::sync::mpsc;

type FetchResult = (TleGroup, Result<Vec<TleSatellite>, TleError>);

pub struct App {
    dock_state: DockState<ViewKind>,
    session: SessionState,
}

struct SessionState {
    group: TleGroup,
    load_state: TleLoadState,
    fetch_tx: mpsc::Sender<FetchResult>,
    fetch_rx: mpsc::Receiver<FetchResult>,
    geo_state: GeoLoadState,
    geo_rx: Option<mpsc::Receiver<Result<Coastlines, GeoError>>>,
    window: EpochWindow,
    snapshot_offset_s: f64,
    site: GroundSite,
    selected_sat: usize,
    selected_pass: usize,
    orbit: OrbitViewSettings,
    map: MapSettings,
    dark_mode: bool,
    tracks: Vec<OrbitTrack>,
    passes: Vec<SkyPass>,
    tracks_dirty: bool,
    passes_dirty: bool,
}

impl App {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel();
        let (geo_tx, geo_rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = geo_tx.send(geo::load_coastlines());
        });

        let mut dock_state = DockState::new(vec![ViewKind::Orbit]);
        let surface = dock_state.main_surface_mut();
        let [_, right] = surface.split_right(NodeIndex::root(), 0.5, vec![ViewKind::GroundTrack]);
        let _ = surface.split_below(right, 0.55, vec![ViewKind::SkyPass]);

        let mut session = SessionState {
            group: TleGroup::default(),
            load_state: TleLoadState::NotLoaded,
            fetch_tx,
            fetch_rx,
            geo_state: GeoLoadState::Loading,
            geo_rx: Some(geo_rx),
            window: EpochWindow::default(),
            snapshot_offset_s: 0.0,
            site: GroundSite::default(),
            selected_sat: 0,
            selected_pass: 0,
            orbit: OrbitViewSettings::default(),
            map: MapSettings::default(),
            dark_mode: true,
            tracks: Vec::new(),
            passes: Vec::new(),
            tracks_dirty: false,
            passes_dirty: false,
        };
        session.start_fetch();

        Self {
            dock_state,
            session,
        }
    }
}

impl SessionState {
    fn satellites(&self) -> &[TleSatellite] {
        match &self.load_state {
            TleLoadState::Loaded { satellites } => satellites,
            _ => &[],
        }
    }

    fn start_fetch(&mut self) {
        self.load_state = TleLoadState::Loading;
        let tx = self.fetch_tx.clone();
        let group = self.group;
        std::thread::spawn(move || {
            let _ = tx.send((group, tle::fetch_group(group)));
        });
    }

    fn drain_channels(&mut self) {
        while let Ok((group, result)) = self.fetch_rx.try_recv() {
            if group != self.group {
                // Answer to a selection that has changed since.
                continue;
            }
            match result {
                Ok(satellites) => {
                    self.load_state = TleLoadState::Loaded { satellites };
                    self.selected_sat = 0;
                    self.selected_pass = 0;
                    self.tracks_dirty = true;
                }
                Err(e) => {
                    tracing::warn!("{} fetch failed: {e}", group.label());
                    self.load_state = TleLoadState::Failed(e.to_string());
                    self.tracks = Vec::new();
                    self.passes = Vec::new();
                }
            }
        }

        if let Some(result) = self.geo_rx.as_ref().and_then(|rx| rx.try_recv().ok()) {
            self.geo_state = match result {
                Ok(lines) => GeoLoadState::Loaded(lines),
                Err(e) => {
                    tracing::warn!("coastline load failed: {e}");
                    GeoLoadState::Failed(e.to_string())
                }
            };
            self.geo_rx = None;
        }
    }

    fn rebuild_caches(&mut self) {
        if self.tracks_dirty {
            self.tracks = sample_tracks(self.satellites(), &self.window);
            self.tracks_dirty = false;
            self.passes_dirty = true;
        }
        if self.passes_dirty {
            self.selected_sat = self
                .selected_sat
                .min(self.satellites().len().saturating_sub(1));
            let sat = self.satellites().get(self.selected_sat).cloned();
            self.passes = match sat {
                Some(sat) => predict_passes(&self.site, &sat, &self.window),
                None => Vec::new(),
            };
            self.selected_pass = self.selected_pass.min(self.passes.len().saturating_sub(1));
            self.passes_dirty = false;
        }
        self.snapshot_offset_s = self.window.clamp_offset(self.snapshot_offset_s);
    }

    fn show_settings(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Elements").strong());
        ui.horizontal(|ui| {
            let before = self.group;
            egui::ComboBox::from_id_salt("tle_group")
                .selected_text(self.group.label())
                .show_ui(ui, |ui| {
                    for group in TleGroup::ALL {
                        ui.selectable_value(&mut self.group, group, group.label());
                    }
                });
            if self.group != before {
                self.start_fetch();
            }
            if ui.button("Refetch").clicked() {
                self.start_fetch();
            }
        });
        match &self.load_state {
            TleLoadState::NotLoaded => {
                ui.label("not loaded");
            }
            TleLoadState::Loading => {
                ui.label(format!("fetching {}…", self.group.label()));
            }
            TleLoadState::Loaded { satellites } => {
                ui.label(format!("{} satellites", satellites.len()));
            }
            TleLoadState::Failed(msg) => {
                ui.colored_label(egui::Color32::LIGHT_RED, msg);
            }
        }
        ui.separator();

        ui.label(egui::RichText::new("Window").strong());
        ui.label(format!("start {}", self.window.start.format("%Y-%m-%d %H:%M UTC")));
        ui.horizontal(|ui| {
            ui.label("Hours:");
            let mut hours = self.window.duration_s / 3600.0;
            if ui
                .add(egui::DragValue::new(&mut hours).range(1.0..=72.0).speed(1.0))
                .changed()
            {
                self.window.duration_s = hours * 3600.0;
                self.tracks_dirty = true;
            }
            ui.label("Step:");
            if ui
                .add(
                    egui::DragValue::new(&mut self.window.step_s)
                        .range(6.0..=600.0)
                        .speed(2.0)
                        .suffix(" s"),
                )
                .changed()
            {
                self.tracks_dirty = true;
            }
        });
        ui.horizontal(|ui| {
            ui.label("Snapshot:");
            ui.add(
                egui::Slider::new(&mut self.snapshot_offset_s, 0.0..=self.window.duration_s)
                    .show_value(false),
            );
            ui.label(
                self.window
                    .time_at(self.snapshot_offset_s)
                    .format("%H:%M")
                    .to_string(),
            );
        });
        ui.separator();

        ui.label(egui::RichText::new("Orbit view").strong());
        ui.horizontal(|ui| {
            ui.checkbox(&mut self.orbit.show_graticule, "Graticule");
            ui.checkbox(&mut self.orbit.show_labels, "Labels");
        });
        ui.horizontal(|ui| {
            ui.label("Zoom:");
            ui.add(
                egui::DragValue::new(&mut self.orbit.zoom)
                    .range(0.2..=200.0)
                    .speed(0.05),
            );
            if ui.button("Reset view").clicked() {
                let defaults = OrbitViewSettings::default();
                self.orbit.rotation = defaults.rotation;
                self.orbit.zoom = defaults.zoom;
            }
        });
        ui.horizontal(|ui| {
            ui.label("Look at:");
            for (label, lat, lon) in [
                ("N", 90.0_f64, 0.0_f64),
                ("S", -90.0, 0.0),
                ("E", 0.0, 90.0),
                ("W", 0.0, -90.0),
            ] {
                if ui.button(label).clicked() {
                    self.orbit.rotation = lat_lon_to_matrix(lat.to_radians(), lon.to_radians());
                }
            }
        });
        ui.separator();

        ui.label(egui::RichText::new("Ground track").strong());
        ui.horizontal(|ui| {
            ui.checkbox(&mut self.map.show_coastlines, "Coastlines");
            ui.checkbox(&mut self.map.show_labels, "Labels");
        });
        if let GeoLoadState::Failed(msg) = &self.geo_state {
            ui.colored_label(egui::Color32::LIGHT_RED, format!("coastlines: {msg}"));
        }
        ui.separator();

        ui.label(egui::RichText::new("Ground site").strong());
        ui.horizontal(|ui| {
            ui.label("Name:");
            ui.text_edit_singleline(&mut self.site.name);
        });
        ui.horizontal(|ui| {
            ui.label("Lat:");
            if ui
                .add(
                    egui::DragValue::new(&mut self.site.lat_deg)
                        .range(-90.0..=90.0)
                        .speed(0.1)
                        .suffix("°"),
                )
                .changed()
            {
                self.passes_dirty = true;
            }
            ui.label("Lon:");
            if ui
                .add(
                    egui::DragValue::new(&mut self.site.lon_deg)
                        .range(-180.0..=180.0)
                        .speed(0.1)
                        .suffix("°"),
                )
                .changed()
            {
                self.passes_dirty = true;
            }
        });
        ui.horizontal(|ui| {
            ui.label("Alt:");
            if ui
                .add(
                    egui::DragValue::new(&mut self.site.alt_m)
                        .range(0.0..=9000.0)
                        .speed(10.0)
                        .suffix(" m"),
                )
                .changed()
            {
                self.passes_dirty = true;
            }
        });
        ui.separator();

        ui.label(egui::RichText::new("Sky pass").strong());
        let names: Vec<(usize, String)> = self
            .satellites()
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.name.clone()))
            .collect();
        let selected_name = names
            .get(self.selected_sat)
            .map(|(_, n)| n.clone())
            .unwrap_or_else(|| "—".to_string());
        let before = self.selected_sat;
        egui::ComboBox::from_id_salt("sky_sat")
            .selected_text(selected_name)
            .show_ui(ui, |ui| {
                for (i, name) in &names {
                    ui.selectable_value(&mut self.selected_sat, *i, name);
                }
            });
        if self.selected_sat != before {
            self.passes_dirty = true;
        }
        if let Some(sat) = self.satellites().get(self.selected_sat) {
            ui.label(format!(
                "inc {:.1}°  {:.2} rev/day  ~{:.0} km",
                sat.inclination_deg,
                sat.mean_motion,
                tle::mean_motion_to_altitude_km(sat.mean_motion),
            ));
        }
        let pass_labels: Vec<String> = self
            .passes
            .iter()
            .map(|p| {
                format!(
                    "{} – {}  max {:.0}°",
                    self.window.time_at(p.aos_offset_s).format("%H:%M"),
                    self.window.time_at(p.los_offset_s).format("%H:%M"),
                    p.max_elevation_deg,
                )
            })
            .collect();
        if pass_labels.is_empty() {
            ui.label("no passes in window");
        } else {
            let current = self.selected_pass.min(pass_labels.len() - 1);
            egui::ComboBox::from_id_salt("sky_pass")
                .selected_text(pass_labels[current].clone())
                .show_ui(ui, |ui| {
                    for (i, label) in pass_labels.iter().enumerate() {
                        ui.selectable_value(&mut self.selected_pass, i, label);
                    }
                });
        }
        ui.separator();

        ui.checkbox(&mut self.dark_mode, "Dark mode");
        let hash = env!("ORBIT_VIZ_GIT_HASH");
        let version = if hash.is_empty() {
            format!("orbit-viz {}", env!("CARGO_PKG_VERSION"))
        } else {
            format!("orbit-viz {} ({hash})", env!("CARGO_PKG_VERSION"))
        };
        ui.label(egui::RichText::new(version).weak());
    }
}

struct ViewTabs<'a> {
    session: &'a mut SessionState,
}

impl TabViewer for ViewTabs<'_> {
    type Tab = ViewKind;

    fn title(&mut self, tab: &mut Self::Tab) -> egui::WidgetText {
        tab.title().into()
    }

    fn ui(&mut self, ui: &mut egui::Ui, tab: &mut Self::Tab) {
        let s = &mut *self.session;
        match tab {
            ViewKind::Orbit => {
                if s.tracks.is_empty() {
                    ui.label("no TLE data loaded");
                }
                draw_orbit_view(
                    ui,
                    "orbit_view",
                    &s.tracks,
                    &mut s.orbit,
                    s.snapshot_offset_s,
                    s.dark_mode,
                );
            }
            ViewKind::GroundTrack => {
                let coastlines: &[Vec<[f64; 2]>] = match &s.geo_state {
                    GeoLoadState::Loaded(lines) => lines,
                    _ => &[],
                };
                draw_ground_track(
                    ui,
                    "ground_track",
                    &s.tracks,
                    coastlines,
                    &s.map,
                    s.snapshot_offset_s,
                    s.dark_mode,
                );
            }
            ViewKind::SkyPass => {
                match (
                    s.satellites().get(s.selected_sat).map(|x| x.name.clone()),
                    s.passes.get(s.selected_pass),
                ) {
                    (Some(name), Some(pass)) => {
                        ui.label(format!(
                            "{} over {}: {} – {}, max {:.0}°",
                            name,
                            s.site.name,
                            s.window.time_at(pass.aos_offset_s).format("%H:%M:%S"),
                            s.window.time_at(pass.los_offset_s).format("%H:%M:%S"),
                            pass.max_elevation_deg,
                        ));
                    }
                    (Some(name), None) => {
                        ui.label(format!("{} over {}: no pass in window", name, s.site.name));
                    }
                    _ => {
                        ui.label("no TLE data loaded");
                    }
                }
                let color = track_color(s.selected_sat);
                draw_sky_pass(
                    ui,
                    "sky_pass",
                    s.passes.get(s.selected_pass),
                    &s.window,
                    color,
                    s.dark_mode,
                );
            }
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.session.drain_channels();
        self.session.rebuild_caches();

        ctx.set_visuals(if self.session.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        egui::SidePanel::left("settings_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.session.show_settings(ui);
                });
            });

        DockArea::new(&mut self.dock_state)
            .style(egui_dock::Style::from_egui(ctx.style().as_ref()))
            .show(
                ctx,
                &mut ViewTabs {
                    session: &mut self.session,
                },
            );

        let busy = matches!(self.session.load_state, TleLoadState::Loading)
            || matches!(self.session.geo_state, GeoLoadState::Loading);
        if busy {
            ctx.request_repaint_after(std::time::Duration::from_millis(150));
        }
    }
}
